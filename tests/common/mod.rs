//! Shared test infrastructure for integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Acquisition directory, install directory and work root for one run.
pub struct RunFixture {
    pub root: TempDir,
}

impl RunFixture {
    pub fn create() -> Self {
        let root = tempfile::tempdir().expect("create fixture root");
        for dir in ["lights", "install", "work"] {
            fs::create_dir_all(root.path().join(dir)).expect("create fixture dir");
        }
        Self { root }
    }

    pub fn lights(&self) -> PathBuf {
        self.root.path().join("lights")
    }

    pub fn install(&self) -> PathBuf {
        self.root.path().join("install")
    }

    pub fn work_root(&self) -> PathBuf {
        self.root.path().join("work")
    }

    /// Write a minimal FITS file whose primary header carries `FIELD`.
    pub fn add_light(&self, name: &str, field: Option<&str>) -> PathBuf {
        let path = self.lights().join(name);
        write_fits(&path, field);
        path
    }

    /// Install a shell script as the `specinti` binary.
    #[cfg(unix)]
    pub fn install_engine(&self, body: &str) {
        use std::os::unix::fs::PermissionsExt;
        let path = self.install().join("specinti");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write engine script");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("make engine executable");
    }

    /// Install a non-executable placeholder, enough for dry runs.
    pub fn install_placeholder_engine(&self) {
        fs::write(self.install().join("specinti"), "placeholder").expect("write engine");
    }

    /// Entries left under the work root after a run.
    pub fn work_entries(&self) -> Vec<PathBuf> {
        let mut entries: Vec<_> = fs::read_dir(self.work_root())
            .expect("read work root")
            .map(|entry| entry.expect("read entry").path())
            .collect();
        entries.sort();
        entries
    }

    /// Base command line; `extra` is appended.
    pub fn run(&self, extra: &[&str]) -> Output {
        let bin = env!("CARGO_BIN_EXE_specinti-runner");
        Command::new(bin)
            .arg("--specinti-install-path")
            .arg(self.install())
            .arg("--src-light-directory")
            .arg(self.lights())
            .arg("--work-root")
            .arg(self.work_root())
            .args(extra)
            .env_remove("RUST_LOG")
            .env_remove("SPECINTI_INSTALL_PATH")
            .output()
            .expect("run specinti-runner")
    }
}

pub fn write_fits(path: &Path, field: Option<&str>) {
    let mut cards = vec![
        "SIMPLE  =                    T".to_string(),
        "BITPIX  =                   16".to_string(),
        "NAXIS   =                    0".to_string(),
    ];
    if let Some(field) = field {
        cards.push(format!("FIELD   = '{field}'"));
    }
    cards.push("END".to_string());
    let mut bytes = String::new();
    for card in cards {
        bytes.push_str(&format!("{card:<80}"));
    }
    while bytes.len() % 2880 != 0 {
        bytes.push(' ');
    }
    fs::write(path, bytes).expect("write fits");
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}
