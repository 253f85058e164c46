//! Advisory lock serializing runs against one install directory.
//!
//! The install-side documents live at fixed paths, so two runs sharing an
//! install path would overwrite each other's configuration while specinti is
//! still reading it. The lock is held from the first install-side write until
//! the engine exits.
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct InstallLock {
    path: PathBuf,
    #[cfg_attr(not(unix), allow(dead_code))]
    file: File,
}

impl InstallLock {
    /// Acquire the lock at `path`, blocking while another run holds it.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let file = File::options()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .with_context(|| format!("open lock {}", path.display()))?;
        lock_exclusive(&file, path)?;
        tracing::debug!(path = %path.display(), "acquired install lock");
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }
}

impl Drop for InstallLock {
    fn drop(&mut self) {
        unlock(&self.file);
        tracing::debug!(path = %self.path.display(), "released install lock");
    }
}

#[cfg(unix)]
fn lock_exclusive(file: &File, path: &Path) -> Result<()> {
    use std::os::fd::AsRawFd;

    let fd = file.as_raw_fd();
    // SAFETY: fd is a valid descriptor owned by `file` for the whole call.
    if unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) } == 0 {
        return Ok(());
    }
    let err = std::io::Error::last_os_error();
    if err.kind() != std::io::ErrorKind::WouldBlock {
        return Err(err).with_context(|| format!("lock {}", path.display()));
    }
    tracing::info!(path = %path.display(), "install path busy, waiting for lock");
    // SAFETY: as above.
    if unsafe { libc::flock(fd, libc::LOCK_EX) } != 0 {
        return Err(std::io::Error::last_os_error())
            .with_context(|| format!("lock {}", path.display()));
    }
    Ok(())
}

#[cfg(unix)]
fn unlock(file: &File) {
    use std::os::fd::AsRawFd;

    // SAFETY: the descriptor is still open; closing it would release the lock anyway.
    unsafe {
        libc::flock(file.as_raw_fd(), libc::LOCK_UN);
    }
}

#[cfg(not(unix))]
fn lock_exclusive(_file: &File, _path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(not(unix))]
fn unlock(_file: &File) {}
