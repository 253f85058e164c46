//! CLI argument parsing for the specinti runner.
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;

/// Environment variable consulted when `--specinti-install-path` is absent.
pub const INSTALL_PATH_ENV: &str = "SPECINTI_INSTALL_PATH";

#[derive(Parser, Debug)]
#[command(
    name = "specinti-runner",
    version,
    about = "Stage FITS acquisitions and run specinti with generated configuration",
    after_help = "Examples:\n  specinti-runner --specinti-install-path /opt/specinti --src-light-directory ./lights\n  specinti-runner --specinti-install-path /opt/specinti --src-light-directory ./lights \\\n      --setup-type starex_2400 --mode science --dry-run"
)]
pub struct RunArgs {
    /// Directory where specinti is installed
    #[arg(long, value_name = "DIR")]
    pub specinti_install_path: Option<PathBuf>,

    /// Directory holding the light acquisitions (YYYYMMDDTHHMMSS.fits)
    #[arg(long, value_name = "DIR")]
    pub src_light_directory: PathBuf,

    /// Directory holding dark acquisitions
    #[arg(long, value_name = "DIR")]
    pub src_dark_directory: Option<PathBuf>,

    /// Directory holding offset (bias) acquisitions
    #[arg(long, value_name = "DIR")]
    pub src_offset_directory: Option<PathBuf>,

    /// Directory holding spectral flat (tungsten) acquisitions
    #[arg(long, value_name = "DIR")]
    pub src_flat_directory: Option<PathBuf>,

    /// Directory holding spectral calibration lamp acquisitions
    #[arg(long, value_name = "DIR")]
    pub src_calib_directory: Option<PathBuf>,

    /// Instrument response file referenced by the processing document
    #[arg(long, value_name = "FILE")]
    pub instrument_response: Option<PathBuf>,

    /// Instrument setup; selects the base specinti configuration
    #[arg(long, value_enum, default_value_t = SetupType::Alpy600)]
    pub setup_type: SetupType,

    /// Reduction mode
    #[arg(long, value_enum, default_value_t = Mode::Science)]
    pub mode: Mode,

    /// Base specinti configuration YAML used instead of the built-in one
    #[arg(long, value_name = "FILE")]
    pub base_conf: Option<PathBuf>,

    /// Parent directory for the per-run working directory (default: system temp dir)
    #[arg(long, value_name = "DIR")]
    pub work_root: Option<PathBuf>,

    /// Generate every document but do not execute specinti
    #[arg(long)]
    pub dry_run: bool,

    /// Keep the working directory and its intermediate files
    #[arg(long, alias = "debug-mode")]
    pub keep_work_dir: bool,

    /// Emit debug logging
    #[arg(long)]
    pub verbose: bool,

    /// Print a machine-readable JSON run summary on success
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize)]
pub enum SetupType {
    #[value(name = "alpy_600")]
    #[serde(rename = "alpy_600")]
    Alpy600,
    #[value(name = "starex_2400")]
    #[serde(rename = "starex_2400")]
    Starex2400,
}

impl SetupType {
    pub fn as_str(self) -> &'static str {
        match self {
            SetupType::Alpy600 => "alpy_600",
            SetupType::Starex2400 => "starex_2400",
        }
    }
}

/// Reduction mode.
///
/// * `raw`: calibrated spectrum with raw values, for diagnostics on actual ADUs
/// * `calibration`: calibration star images plus a reference spectrum produce
///   an instrument response file
/// * `science`: produces a spectrum
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Raw,
    Calibration,
    Science,
}
