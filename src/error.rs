//! Fatal error kinds raised while generating rules.
//!
//! These travel inside `anyhow::Error`; callers that need to tell them apart
//! use `err.downcast_ref::<GenerateError>()`. Plain file system failures are
//! reported as `anyhow` errors carrying the offending path.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    /// Invalid or missing configuration, detected before any work starts.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The resolver or inspector process failed.
    #[error("`{command}` failed with exit code {code:?}\n{stderr}")]
    Subprocess {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("download failed for {url}: {reason}")]
    Download { url: String, reason: String },

    /// The inspector ran but printed something we could not parse.
    #[error("malformed metadata for wheel {}: {reason}", path.display())]
    MetadataParse { path: PathBuf, reason: String },

    #[error("invalid wheel file name `{0}`")]
    InvalidWheelFilename(String),

    /// A locally built wheel with no remote URL and nowhere to vendor it.
    #[error("wheel `{0}` has no download link and no wheel directory is configured")]
    NoWheelSource(String),
}

impl GenerateError {
    pub fn config(message: impl Into<String>) -> Self {
        GenerateError::Config(message.into())
    }

    pub fn is_config(&self) -> bool {
        matches!(self, GenerateError::Config(_))
    }
}
