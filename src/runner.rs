//! Invocation of the specinti reduction engine.
use crate::error::PipelineError;
use crate::paths::InstallPaths;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use std::time::Instant;

/// What happened when the engine was asked to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineOutcome {
    DryRun,
    Succeeded,
}

/// Check the install directory and locate the engine binary.
pub fn verify_install(paths: &InstallPaths) -> Result<PathBuf> {
    if !paths.root().is_dir() {
        return Err(PipelineError::InvalidInstallPath(paths.root().to_path_buf()).into());
    }
    let binary = paths.binary_path();
    if !binary.is_file() {
        return Err(PipelineError::BinaryNotFound(binary).into());
    }
    Ok(binary)
}

/// Run specinti against the install-config document named by `config_stem`.
///
/// The engine resolves the stem itself, relative to its install directory, so
/// the child runs with the install path as working directory.
pub fn run_engine(paths: &InstallPaths, config_stem: &str, dry_run: bool) -> Result<EngineOutcome> {
    let binary = verify_install(paths)?;
    if dry_run {
        tracing::info!(
            binary = %binary.display(),
            config = config_stem,
            "dry run: would run {} {}",
            binary.display(),
            config_stem
        );
        return Ok(EngineOutcome::DryRun);
    }

    tracing::info!(binary = %binary.display(), config = config_stem, "executing specinti");
    let start = Instant::now();
    let status = Command::new(&binary)
        .arg(config_stem)
        .current_dir(paths.root())
        .status()
        .with_context(|| format!("spawn {}", binary.display()))?;
    let elapsed_ms = start.elapsed().as_millis();

    if status.success() {
        tracing::info!(elapsed_ms, "specinti executed successfully");
        return Ok(EngineOutcome::Succeeded);
    }
    tracing::error!(elapsed_ms, status = %status, "specinti failed");
    Err(PipelineError::EngineFailed {
        code: failure_code(&status),
    }
    .into())
}

/// Exit code to propagate for a failed child; signals map to 1.
fn failure_code(status: &ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_install_directory_is_rejected() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let paths = InstallPaths::new(dir.path().join("absent"));
        let err = verify_install(&paths).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::InvalidInstallPath(_))
        ));
    }

    #[test]
    fn install_path_must_be_a_directory() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let file = dir.path().join("specinti-install");
        fs::write(&file, "").unwrap();
        let err = verify_install(&InstallPaths::new(file)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::InvalidInstallPath(_))
        ));
    }

    #[test]
    fn missing_binary_is_rejected() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = verify_install(&InstallPaths::new(dir.path().to_path_buf())).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::BinaryNotFound(path)) if path.ends_with("specinti")
        ));
    }

    #[test]
    fn dry_run_does_not_spawn() {
        let dir = tempfile::tempdir().expect("create temp dir");
        // Not executable: spawning it would fail, so success proves no spawn.
        fs::write(dir.path().join("specinti"), "not a program").unwrap();
        let paths = InstallPaths::new(dir.path().to_path_buf());
        let outcome = run_engine(&paths, "config", true).expect("dry run");
        assert_eq!(outcome, EngineOutcome::DryRun);
    }

    #[cfg(unix)]
    fn install_script(dir: &std::path::Path, body: &str) {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("specinti");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn engine_runs_in_install_dir_with_config_stem() {
        let dir = tempfile::tempdir().expect("create temp dir");
        install_script(dir.path(), "pwd > ran.txt\necho \"$@\" >> ran.txt");
        let paths = InstallPaths::new(dir.path().to_path_buf());
        let outcome = run_engine(&paths, "config", false).expect("run engine");
        assert_eq!(outcome, EngineOutcome::Succeeded);

        let ran = fs::read_to_string(dir.path().join("ran.txt")).unwrap();
        let mut lines = ran.lines();
        let cwd = fs::canonicalize(lines.next().unwrap()).unwrap();
        assert_eq!(cwd, fs::canonicalize(dir.path()).unwrap());
        assert_eq!(lines.next(), Some("config"));
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_an_engine_failure() {
        let dir = tempfile::tempdir().expect("create temp dir");
        install_script(dir.path(), "exit 2");
        let paths = InstallPaths::new(dir.path().to_path_buf());
        let err = run_engine(&paths, "config", false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::EngineFailed { code: 2 })
        ));
    }
}
