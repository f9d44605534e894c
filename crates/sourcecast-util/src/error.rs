//! Error types for sourcecast-util.

use std::io;
use std::path::PathBuf;

/// Failures of the converter layer.
///
/// These never reach callers of [`crate::transcode`]; the engine logs them and
/// hands back the original text instead.
#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    /// No converter exists for the requested pair.
    #[error("conversion from {from:?} to {to:?} is not supported")]
    Unsupported { from: String, to: String },

    /// Releasing the converter failed.
    #[error("failed to close converter: {0}")]
    Close(#[source] io::Error),
}

impl TranscodeError {
    pub fn unsupported(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::Unsupported {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Reasons a stream URL is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error("invalid url: not an HTTP address")]
    InvalidScheme,

    #[error("invalid url: missing port")]
    MissingPort,

    #[error("invalid url: missing host")]
    MissingHost,

    #[error("invalid url: mountpoint missing, or port number too long")]
    MalformedMount,

    /// The port text is not an integer in `1..=65535`.
    #[error("invalid url: port: {port} is {reason}")]
    InvalidPort { port: String, reason: &'static str },
}

/// A pid file operation failed.
///
/// Carries the error reported by the failing system call so callers can
/// inspect the original OS error code.
#[derive(Debug, thiserror::Error)]
#[error("pid file {}: {stage} failed: {source}", path.display())]
pub struct PidFileError {
    pub path: PathBuf,
    pub stage: &'static str,
    #[source]
    pub source: io::Error,
}

impl PidFileError {
    pub fn new(path: impl Into<PathBuf>, stage: &'static str, source: io::Error) -> Self {
        Self {
            path: path.into(),
            stage,
            source,
        }
    }

    /// The OS error code of the failing call, if any.
    pub fn raw_os_error(&self) -> Option<i32> {
        self.source.raw_os_error()
    }
}
