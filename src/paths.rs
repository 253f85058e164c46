//! Typed paths into a specinti install directory.
use std::path::{Path, PathBuf};

pub const SPECINTI_BINARY: &str = "specinti";
pub const CONFIGURATION_DIR: &str = "_configuration";
pub const INSTALL_CONFIG_FILE: &str = "config.yaml";
pub const INI_FILE: &str = "specinti_ini.yaml";
pub const LOCK_FILE: &str = ".specinti-runner.lock";

/// Name of the processing document inside the working directory.
pub const PROCESSING_FILE: &str = "processing.yaml";

#[derive(Debug, Clone)]
pub struct InstallPaths {
    root: PathBuf,
}

impl InstallPaths {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the `specinti` executable path.
    pub fn binary_path(&self) -> PathBuf {
        self.root.join(SPECINTI_BINARY)
    }

    /// Return the `_configuration/` directory path.
    pub fn configuration_dir(&self) -> PathBuf {
        self.root.join(CONFIGURATION_DIR)
    }

    /// Return the `_configuration/config.yaml` path.
    pub fn install_config_path(&self) -> PathBuf {
        self.configuration_dir().join(INSTALL_CONFIG_FILE)
    }

    /// Return the `_configuration/specinti_ini.yaml` path.
    pub fn ini_path(&self) -> PathBuf {
        self.configuration_dir().join(INI_FILE)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.configuration_dir().join(LOCK_FILE)
    }
}

/// File stem as specinti expects it: no directory, no extension.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default()
}
