//! Failure kinds that decide how a run terminates.
//!
//! Everything else propagates as plain `anyhow` context; these variants are the
//! ones `main` inspects to pick an exit code.
use std::path::PathBuf;
use thiserror::Error;

/// Exit code for configuration, path and input errors.
pub const EXIT_INPUT_ERROR: u8 = 1;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid path (should be a directory): {}", .0.display())]
    InvalidInstallPath(PathBuf),

    #[error("specinti binary not found at: {}", .0.display())]
    BinaryNotFound(PathBuf),

    #[error("destination is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("source file does not exist: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("no acquisition files found in {}", .0.display())]
    NoAcquisitions(PathBuf),

    #[error("invalid FITS header in {}: {reason}", path.display())]
    InvalidHeader { path: PathBuf, reason: String },

    #[error("header key {key} missing from {}", path.display())]
    MissingHeaderKey { path: PathBuf, key: String },

    #[error("replacement for {token} collides with placeholder syntax: {value}")]
    ReservedToken { token: String, value: String },

    #[error("unresolved placeholder {token} in {document}")]
    UnresolvedPlaceholder { document: String, token: String },

    #[error("specinti failed with exit code {code}")]
    EngineFailed { code: i32 },
}

impl PipelineError {
    /// Process exit code for this failure.
    ///
    /// Engine failures propagate the child's own status; codes outside the
    /// portable `1..=255` range collapse to the generic input error code.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::EngineFailed { code } => u8::try_from(*code)
                .ok()
                .filter(|code| *code != 0)
                .unwrap_or(EXIT_INPUT_ERROR),
            _ => EXIT_INPUT_ERROR,
        }
    }
}

/// Exit code for an arbitrary pipeline error chain.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<PipelineError>())
        .map(PipelineError::exit_code)
        .unwrap_or(EXIT_INPUT_ERROR)
}
