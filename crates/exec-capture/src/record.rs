//! Structured execution records and the sinks that receive them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::error::Result;
use crate::handle::CapturedProcess;
use crate::process::{ExitStatus, NO_EXIT_CODE};

/// Separator placed between arguments in a record's `args` field
pub const ARG_SEPARATOR: &str = " |: ";

/// One structured description of a process execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// When the record was taken
    pub timestamp: DateTime<Utc>,
    /// The program that was launched
    pub path: String,
    /// Arguments, joined with [`ARG_SEPARATOR`]
    pub args: String,
    /// Absolute working directory of the process
    pub working_directory: String,
    /// Exit code, present for completed runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Trimmed stdout, present for completed runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    /// Trimmed stderr, present for completed runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    /// Error reported by start or wait, if any
    pub internal_error: Option<String>,
}

impl ExecutionRecord {
    /// Describe a process right after an attempt to start it
    pub fn started(process: &CapturedProcess, outcome: &Result<()>) -> Self {
        let command = process.command();
        Self {
            timestamp: Utc::now(),
            path: command.get_program().to_string_lossy().into_owned(),
            args: command
                .get_args()
                .iter()
                .map(|arg| arg.to_string_lossy())
                .collect::<Vec<_>>()
                .join(ARG_SEPARATOR),
            working_directory: process
                .work_dir()
                .map(|dir| dir.display().to_string())
                .unwrap_or_default(),
            exit_code: None,
            stdout: None,
            stderr: None,
            internal_error: outcome.as_ref().err().map(ToString::to_string),
        }
    }

    /// Describe a process after running it to completion
    pub fn finished(process: &CapturedProcess, outcome: &Result<ExitStatus>) -> Self {
        let started = outcome.as_ref().map(|_| ()).map_err(Clone::clone);
        Self {
            exit_code: Some(
                outcome
                    .as_ref()
                    .map(ExitStatus::exit_code)
                    .unwrap_or(NO_EXIT_CODE),
            ),
            stdout: Some(process.stdout().snapshot()),
            stderr: Some(process.stderr().snapshot()),
            ..Self::started(process, &started)
        }
    }

    /// Serialize the record as a single JSON line
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Receiver of execution records
///
/// Passed explicitly to the operations that log; use [`NoOpSink`] to log nothing.
pub trait LogSink: Send + Sync {
    /// Emit one record at `level` with a human readable `message`
    fn record(&self, level: Level, message: &str, record: &ExecutionRecord);
}

/// A sink that drops every record
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl LogSink for NoOpSink {
    fn record(&self, _level: Level, _message: &str, _record: &ExecutionRecord) {}
}

/// A sink that emits each record as a `tracing` event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

macro_rules! emit_record {
    ($level:expr, $message:expr, $record:expr) => {
        tracing::event!(
            $level,
            path = %$record.path,
            args = %$record.args,
            working_directory = %$record.working_directory,
            exitcode = $record.exit_code,
            stdout = $record.stdout.as_deref(),
            stderr = $record.stderr.as_deref(),
            internal_error = $record.internal_error.as_deref(),
            "{}",
            $message
        )
    };
}

impl LogSink for TracingSink {
    fn record(&self, level: Level, message: &str, record: &ExecutionRecord) {
        if level == Level::ERROR {
            emit_record!(Level::ERROR, message, record)
        } else if level == Level::WARN {
            emit_record!(Level::WARN, message, record)
        } else if level == Level::INFO {
            emit_record!(Level::INFO, message, record)
        } else if level == Level::DEBUG {
            emit_record!(Level::DEBUG, message, record)
        } else {
            emit_record!(Level::TRACE, message, record)
        }
    }
}

impl<S: LogSink + ?Sized> LogSink for &S {
    fn record(&self, level: Level, message: &str, record: &ExecutionRecord) {
        (**self).record(level, message, record)
    }
}
