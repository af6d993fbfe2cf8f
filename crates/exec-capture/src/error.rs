//! Error types for captured process execution

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Unified error type for captured process execution
///
/// The type is `Clone` so that a cached wait outcome can be handed to every
/// caller of [`CapturedProcess::wait`](crate::CapturedProcess::wait).
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Failed to spawn a process
    #[error("failed to spawn process: {reason}")]
    SpawnFailed {
        /// The reason for the spawn failure
        reason: String,
    },

    /// Command not found
    #[error("command not found: {command}")]
    CommandNotFound {
        /// The command that was not found
        command: String,
    },

    /// The process was waited on before it was started
    #[error("process not started")]
    NotStarted,

    /// The process was started twice
    #[error("process already started")]
    AlreadyStarted,

    /// Writing captured output to a file failed
    #[error("failed to write {}: {reason}", path.display())]
    WriteFailed {
        /// The file that could not be written
        path: PathBuf,
        /// The reason for the write failure
        reason: String,
    },

    /// Invalid command configuration
    #[error("invalid command configuration: {reason}")]
    InvalidConfig {
        /// What was wrong with the configuration
        reason: String,
    },

    /// I/O error
    #[error(transparent)]
    Io(Arc<std::io::Error>),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

impl Error {
    /// Create a spawn failed error
    pub fn spawn_failed(reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            reason: reason.into(),
        }
    }

    /// Create a write failed error
    pub fn write_failed(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::WriteFailed {
            path: path.as_ref().to_owned(),
            reason: reason.into(),
        }
    }

    /// Classify an error returned while spawning `command`
    pub(crate) fn from_spawn(command: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::CommandNotFound {
                command: command.to_string(),
            },
            _ => Self::spawn_failed(format!("Failed to spawn {}: {}", command, err)),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
