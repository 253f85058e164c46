//! End-to-end run: stage, inspect, render, execute.
//!
//! The `ProcessingResource` is created first and owned by this function, so it
//! is released before any error reaches `main`.
use crate::cli::{Mode, RunArgs, SetupType, INSTALL_PATH_ENV};
use crate::config::{ExposureKind, TARGET_HEADER_KEY};
use crate::documents::{build_documents, BaseConfig};
use crate::error::PipelineError;
use crate::fits::{read_primary_header, require};
use crate::lock::InstallLock;
use crate::paths::InstallPaths;
use crate::resource::{GeneratedDocuments, ProcessingResource, ResourceState};
use crate::runner::{run_engine, verify_install, EngineOutcome};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Machine-readable description of a finished run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub install_path: PathBuf,
    pub working_directory: PathBuf,
    pub working_directory_state: ResourceState,
    pub setup_type: SetupType,
    pub mode: Mode,
    pub target: Option<serde_yaml::Value>,
    pub exposures: BTreeMap<ExposureKind, usize>,
    pub documents: GeneratedDocuments,
    pub dry_run: bool,
}

/// Resolve the install path: explicit flag, then environment.
pub fn resolve_install_path(explicit: Option<&Path>) -> Result<PathBuf> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => std::env::var_os(INSTALL_PATH_ENV)
            .map(PathBuf::from)
            .ok_or_else(|| {
                anyhow!("--specinti-install-path is required (or set {INSTALL_PATH_ENV})")
            })?,
    };
    let path = std::path::absolute(&path)
        .with_context(|| format!("resolve install path {}", path.display()))?;
    Ok(path)
}

/// Category directories requested on the command line, lights first.
fn requested_categories(args: &RunArgs) -> Vec<(ExposureKind, &Path)> {
    let optional = [
        (ExposureKind::Dark, args.src_dark_directory.as_deref()),
        (ExposureKind::Offset, args.src_offset_directory.as_deref()),
        (ExposureKind::SpecFlat, args.src_flat_directory.as_deref()),
        (ExposureKind::SpecCalib, args.src_calib_directory.as_deref()),
    ];
    let mut categories = vec![(ExposureKind::Light, args.src_light_directory.as_path())];
    categories.extend(
        optional
            .into_iter()
            .filter_map(|(kind, dir)| dir.map(|dir| (kind, dir))),
    );
    categories
}

/// Run the whole pipeline once.
pub fn run_pipeline(args: &RunArgs) -> Result<RunSummary> {
    let install = InstallPaths::new(resolve_install_path(args.specinti_install_path.as_deref())?);
    verify_install(&install)?;
    let base = match &args.base_conf {
        Some(path) => BaseConfig::File(path.clone()),
        None => BaseConfig::Builtin(args.setup_type),
    };
    tracing::info!(
        install = %install.root().display(),
        setup_type = args.setup_type.as_str(),
        mode = ?args.mode,
        dry_run = args.dry_run,
        "starting specinti run"
    );

    let mut resource = ProcessingResource::create(args.work_root.as_deref(), args.keep_work_dir)?;
    tracing::info!(path = %resource.directory().display(), "working directory");

    for (kind, source) in requested_categories(args) {
        resource
            .stage(kind, source)
            .with_context(|| format!("prepare {kind:?} exposures from {}", source.display()))?;
    }

    let first_light = resource
        .batch(ExposureKind::Light)
        .and_then(|batch| batch.first())
        .map(Path::to_path_buf)
        .ok_or_else(|| PipelineError::NoAcquisitions(args.src_light_directory.clone()))?;
    let header = read_primary_header(&first_light)?;
    let target = require(&header, &first_light, TARGET_HEADER_KEY)?.to_yaml();
    tracing::info!(object = ?target, "read target from first light");
    resource.config_mut().set_target(target);

    if let Some(response) = &args.instrument_response {
        if !response.is_file() {
            return Err(PipelineError::SourceNotFound(response.clone()).into());
        }
        let response = std::path::absolute(response)
            .with_context(|| format!("resolve {}", response.display()))?;
        resource.config_mut().set_instrument_response(&response);
    }

    let _lock = InstallLock::acquire(&install.lock_path())?;
    let documents = build_documents(resource.directory(), resource.config(), &install, &base)
        .context("generate specinti documents")?;
    resource.mark_ready(documents);

    let documents = resource.begin_run()?.clone();
    let outcome = run_engine(&install, &documents.install_config.stem, args.dry_run)?;

    let target = resource.config().target().cloned();
    let exposures = ExposureKind::ALL
        .into_iter()
        .map(|kind| (kind, resource.config().exposures(kind).count))
        .collect();
    let working_directory = resource.directory().to_path_buf();
    let working_directory_state = resource.finish();
    Ok(RunSummary {
        install_path: install.root().to_path_buf(),
        working_directory,
        working_directory_state,
        setup_type: args.setup_type,
        mode: args.mode,
        target,
        exposures,
        documents,
        dry_run: matches!(outcome, EngineOutcome::DryRun),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn categories_keep_lights_first_and_skip_unsupplied() {
        let args = RunArgs::try_parse_from([
            "specinti-runner",
            "--src-light-directory",
            "/data/lights",
            "--src-offset-directory",
            "/data/offsets",
            "--src-dark-directory",
            "/data/darks",
        ])
        .unwrap();
        let categories = requested_categories(&args);
        let kinds: Vec<_> = categories.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(
            kinds,
            vec![ExposureKind::Light, ExposureKind::Dark, ExposureKind::Offset]
        );
        assert_eq!(categories[2].1, Path::new("/data/offsets"));
    }

    #[test]
    fn explicit_install_path_is_made_absolute() {
        let resolved = resolve_install_path(Some(Path::new("relative/specinti"))).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("relative/specinti"));
    }
}
