// ============================================================================
// squish-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error Types for the Compression Engine
//
// This module defines the error taxonomy of the engine. Errors fall into four
// behavioural groups:
//
// - Fatal input errors (MediaDecode, validation failures)
// - Recoverable per-preset errors (Encode, PlaybackBlocked)
// - Capability errors that route to the fallback compressor (SinkUnavailable)
// - Terminal errors (CompressionFailed, Cancelled)
//
// CompressionFailed keeps the error that ended the progressive search as its
// `source`, so callers can walk `std::error::Error::source()` down to the
// innermost cause.

use std::io;
use std::process::ExitStatus;
use thiserror::Error;

/// Error type for all fallible operations in squish-core.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The source could not be decoded or carries no usable video stream.
    #[error("Media decode error: {0}")]
    MediaDecode(String),

    /// One encode attempt failed. The search advances to the next preset.
    #[error("Encode error: {0}")]
    Encode(String),

    /// The host has no usable encoder. Routes to the fallback compressor.
    #[error("Encoding sink unavailable: {0}")]
    SinkUnavailable(String),

    /// Continuous playback could not be started for the source.
    #[error("Playback blocked: {0}")]
    PlaybackBlocked(String),

    /// Both the progressive search and the fallback compressor failed.
    #[error("Compression failed: {message} (fallback: {fallback_error})")]
    CompressionFailed {
        message: String,
        fallback_error: String,
        #[source]
        source: Box<CoreError>,
    },

    #[error("Quality ladder is empty")]
    EmptyLadder,

    #[error("Compression cancelled")]
    Cancelled,

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("File too large: {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("File is already under the target size ({size} <= {target} bytes)")]
    AlreadyUnderTarget { size: u64, target: u64 },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Required external command not found: {0}")]
    DependencyNotFound(String),

    #[error("Failed to start {0}: {1}")]
    CommandStart(String, #[source] io::Error),

    #[error("Failed waiting for {0}: {1}")]
    CommandWait(String, #[source] io::Error),

    #[error("{0} exited with {1}: {2}")]
    CommandFailed(String, ExitStatus, String),

    #[error("JSON parse error: {0}")]
    JsonParseError(String),
}

/// Result type for squish-core operations.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// True for errors the progressive search recovers from by moving on to
    /// the next preset.
    #[must_use]
    pub fn is_preset_recoverable(&self) -> bool {
        matches!(self, CoreError::Encode(_) | CoreError::PlaybackBlocked(_))
    }

    /// True for errors that must never be routed to the fallback compressor.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CoreError::MediaDecode(_)
                | CoreError::Cancelled
                | CoreError::UnsupportedMediaType(_)
                | CoreError::FileTooLarge { .. }
                | CoreError::Config(_)
        )
    }

    /// Returns the innermost error in the `source()` chain.
    pub fn root_cause(&self) -> &(dyn std::error::Error + 'static) {
        let mut current: &(dyn std::error::Error + 'static) = self;
        while let Some(next) = current.source() {
            current = next;
        }
        current
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::JsonParseError(err.to_string())
    }
}

// ---- Helper constructors for process errors ----

pub fn command_start_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandStart(cmd.into(), err)
}

pub fn command_wait_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandWait(cmd.into(), err)
}

pub fn command_failed_error(
    cmd: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed(cmd.into(), status, stderr.into())
}
