//! Working-directory ownership for one run.
//!
//! A `ProcessingResource` is created with a fresh directory and removes it when
//! dropped, whichever step failed, unless the caller asked to keep it.
use crate::acquisition::{list_acquisition_files, stage_files, StagedBatch};
use crate::config::{ExposureKind, RunConfig};
use crate::error::PipelineError;
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const WORK_DIR_PREFIX: &str = "specinti-";

/// Lifecycle of a processing resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    Created,
    Populating,
    Ready,
    Running,
    Cleaned,
    Retained,
}

/// A generated configuration document on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedDocument {
    pub path: PathBuf,
    pub stem: String,
}

/// The three documents specinti needs, in dependency order.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedDocuments {
    pub processing: GeneratedDocument,
    pub install_config: GeneratedDocument,
    pub ini: GeneratedDocument,
}

#[derive(Debug)]
pub struct ProcessingResource {
    dir: Option<TempDir>,
    path: PathBuf,
    retain: bool,
    state: ResourceState,
    config: RunConfig,
    batches: Vec<(ExposureKind, StagedBatch)>,
    documents: Option<GeneratedDocuments>,
}

impl ProcessingResource {
    /// Allocate a fresh working directory under `work_root` (or the system temp dir).
    pub fn create(work_root: Option<&Path>, retain: bool) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORK_DIR_PREFIX).keep(retain);
        let dir = match work_root {
            Some(root) => builder
                .tempdir_in(root)
                .with_context(|| format!("create working directory in {}", root.display()))?,
            None => builder.tempdir().context("create working directory")?,
        };
        let path = dir.path().to_path_buf();
        tracing::debug!(path = %path.display(), "created working directory");
        Ok(Self {
            dir: Some(dir),
            path,
            retain,
            state: ResourceState::Created,
            config: RunConfig::default(),
            batches: Vec::new(),
            documents: None,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> ResourceState {
        self.state
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut RunConfig {
        self.enter_populating();
        &mut self.config
    }

    pub fn batch(&self, kind: ExposureKind) -> Option<&StagedBatch> {
        self.batches
            .iter()
            .find(|(batch_kind, _)| *batch_kind == kind)
            .map(|(_, batch)| batch)
    }

    /// Locate acquisitions in `source` and stage them under the category prefix.
    ///
    /// An empty source directory is an error: every supplied category must
    /// contribute at least one exposure.
    pub fn stage(&mut self, kind: ExposureKind, source: &Path) -> Result<&StagedBatch> {
        self.enter_populating();
        let sources = list_acquisition_files(source)
            .with_context(|| format!("locate {kind:?} acquisitions"))?;
        if sources.is_empty() {
            return Err(PipelineError::NoAcquisitions(source.to_path_buf()).into());
        }
        let batch = stage_files(&sources, &self.path, kind.staging_prefix())
            .with_context(|| format!("stage {kind:?} acquisitions"))?;
        self.config.record_exposures(kind, &batch);
        self.batches.retain(|(batch_kind, _)| *batch_kind != kind);
        self.batches.push((kind, batch));
        let (_, batch) = self
            .batches
            .last()
            .ok_or_else(|| anyhow!("staged batch vanished"))?;
        Ok(batch)
    }

    /// Record the generated documents; the resource is ready to run.
    pub fn mark_ready(&mut self, documents: GeneratedDocuments) {
        self.documents = Some(documents);
        self.state = ResourceState::Ready;
    }

    /// Enter `Running`; only valid once every document exists.
    pub fn begin_run(&mut self) -> Result<&GeneratedDocuments> {
        if self.state != ResourceState::Ready {
            return Err(anyhow!(
                "cannot run from state {:?}; documents are not ready",
                self.state
            ));
        }
        self.state = ResourceState::Running;
        self.documents
            .as_ref()
            .ok_or_else(|| anyhow!("documents missing in ready state"))
    }

    /// Release the working directory now and report the terminal state.
    pub fn finish(mut self) -> ResourceState {
        self.release();
        self.state
    }

    fn enter_populating(&mut self) {
        if self.state == ResourceState::Created {
            self.state = ResourceState::Populating;
        }
    }

    fn release(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        if self.retain {
            // Built with `keep(true)`: dropping the handle leaves the directory.
            drop(dir);
            tracing::info!(path = %self.path.display(), "keeping working directory");
            self.state = ResourceState::Retained;
            return;
        }
        tracing::debug!(path = %self.path.display(), "cleaning up working directory");
        if let Err(err) = dir.close() {
            tracing::warn!(
                path = %self.path.display(),
                error = %err,
                "failed to remove working directory"
            );
        }
        self.state = ResourceState::Cleaned;
    }
}

impl Drop for ProcessingResource {
    fn drop(&mut self) {
        self.release();
    }
}
