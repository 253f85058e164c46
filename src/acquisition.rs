//! Acquisition discovery and staging.
//!
//! Acquisitions are located by their timestamped filename and copied into the
//! working directory under a canonical numbered name, which is what specinti
//! expects to find behind each prefix in the processing document.
use crate::error::PipelineError;
use anyhow::{Context, Result};
use regex::Regex;
use std::fs::{self, File, FileTimes};
use std::path::{Path, PathBuf};

/// `YYYYMMDDTHHMMSS.fits` as written by the acquisition software.
pub const ACQUISITION_FILENAME_PATTERN: &str =
    r"^\d{4}(0[1-9]|1[0-2])(0[1-9]|[12]\d|3[01])T([01]\d|2[0-3])[0-5]\d[0-5]\d\.fits$";

/// Result of staging one exposure category.
#[derive(Debug, Clone)]
pub struct StagedBatch {
    pub prefix: String,
    pub count: usize,
    pub files: Vec<PathBuf>,
}

impl StagedBatch {
    pub fn first(&self) -> Option<&Path> {
        self.files.first().map(PathBuf::as_path)
    }
}

/// List acquisition files directly inside `directory`.
///
/// Names are sorted so that staged indices follow acquisition time instead of
/// directory-listing order.
pub fn list_acquisition_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let pattern =
        Regex::new(ACQUISITION_FILENAME_PATTERN).expect("regex for acquisition filenames");
    let mut matched = Vec::new();
    for entry in
        fs::read_dir(directory).with_context(|| format!("read {}", directory.display()))?
    {
        let entry = entry.with_context(|| format!("read entry in {}", directory.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if pattern.is_match(name) {
            matched.push(path);
        }
    }
    matched.sort();
    tracing::debug!(
        directory = %directory.display(),
        matched = matched.len(),
        "listed acquisition files"
    );
    Ok(matched)
}

/// Copy `sources` into `destination` as `<prefix><index>.<ext>`.
///
/// Every source is checked before the first copy so a missing file aborts the
/// whole batch without leaving a partial sequence behind.
pub fn stage_files(sources: &[PathBuf], destination: &Path, prefix: &str) -> Result<StagedBatch> {
    if !destination.is_dir() {
        return Err(PipelineError::NotADirectory(destination.to_path_buf()).into());
    }
    if let Some(missing) = sources.iter().find(|source| !source.is_file()) {
        return Err(PipelineError::SourceNotFound(missing.clone()).into());
    }

    let mut files = Vec::with_capacity(sources.len());
    for (index, source) in sources.iter().enumerate() {
        let dest = destination.join(staged_file_name(prefix, index, source));
        copy_preserving_metadata(source, &dest)?;
        files.push(dest);
    }
    tracing::info!(prefix, count = files.len(), "staged acquisition files");
    Ok(StagedBatch {
        prefix: prefix.to_string(),
        count: files.len(),
        files,
    })
}

fn staged_file_name(prefix: &str, index: usize, source: &Path) -> String {
    match source.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!("{prefix}{index}.{ext}"),
        None => format!("{prefix}{index}"),
    }
}

fn copy_preserving_metadata(source: &Path, dest: &Path) -> Result<()> {
    // fs::copy carries permission bits; timestamps are restored by hand.
    fs::copy(source, dest)
        .with_context(|| format!("copy {} to {}", source.display(), dest.display()))?;
    let metadata =
        fs::metadata(source).with_context(|| format!("inspect {}", source.display()))?;
    let mut times = FileTimes::new();
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }
    let file = File::options()
        .write(true)
        .open(dest)
        .with_context(|| format!("open {}", dest.display()))?;
    file.set_times(times)
        .with_context(|| format!("set times on {}", dest.display()))?;
    Ok(())
}
