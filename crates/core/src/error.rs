//! Error types for slide-deck generation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or persisting a slide deck.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write a file.
    #[error("File system error: {0}")]
    IoError(#[from] std::io::Error),

    /// The output location is not writable.
    #[error("Permission denied: cannot write to {}", .0.display())]
    PermissionDenied(PathBuf),

    /// Not enough free space in the output directory.
    #[error("Insufficient disk space: {available} bytes available, {required} required")]
    InsufficientSpace {
        /// Bytes available to unprivileged users.
        available: u64,
        /// Configured minimum headroom.
        required: u64,
    },

    /// The input source format is not supported or could not be detected.
    #[error("Unsupported or unrecognized source format: {0}")]
    UnsupportedFormat(String),

    /// A single content element could not be rendered onto its slide.
    #[error("Render error: {0}")]
    RenderError(String),

    /// A font could not be applied.
    #[error("Font error: {0}")]
    FontError(String),

    /// Invalid generator configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The text-completion collaborator returned an error.
    #[error("Completion service error: {0}")]
    CompletionError(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML writing or parsing error (for PPTX).
    #[error("XML error: {0}")]
    XmlError(String),
}
