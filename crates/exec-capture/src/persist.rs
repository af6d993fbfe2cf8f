//! Writing captured output to files

use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};
use crate::handle::CapturedProcess;
use crate::process::ExitStatus;

/// Suffix appended to the output path for the stderr file
pub const STDERR_SUFFIX: &str = ".err";

/// Append `text` and a newline to `path`, creating the file if needed
pub fn append_line(path: impl AsRef<Path>, text: &str) -> Result<()> {
    let path = path.as_ref();
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::write_failed(path, e.to_string()))?;
    writeln!(file, "{}", text).map_err(|e| Error::write_failed(path, e.to_string()))?;
    Ok(())
}

/// The sibling path that receives stderr: `path` with [`STDERR_SUFFIX`] appended
pub fn stderr_path(path: impl AsRef<Path>) -> PathBuf {
    let mut name = OsString::from(path.as_ref().as_os_str());
    name.push(STDERR_SUFFIX);
    PathBuf::from(name)
}

/// Outcome of writing a process's output to files
#[derive(Debug, Clone)]
pub struct Persisted {
    /// Result of writing stdout to the output path
    pub stdout: Result<()>,
    /// Result of writing stderr to the `.err` path, `None` when stderr was empty
    pub stderr: Option<Result<()>>,
}

impl Persisted {
    /// Write the trimmed stdout of `process` to `path`, and its trimmed stderr
    /// to the `.err` sibling when there is any.
    ///
    /// The second write is attempted even if the first one failed.
    pub fn write(process: &CapturedProcess, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let stdout = append_line(path, &process.stdout().snapshot());

        let errors = process.stderr().snapshot();
        let stderr = if errors.is_empty() {
            None
        } else {
            Some(append_line(stderr_path(path), &errors))
        };

        debug!(
            path = %path.display(),
            stdout_ok = stdout.is_ok(),
            stderr_written = stderr.is_some(),
            "persisted process output"
        );
        Self { stdout, stderr }
    }

    /// The first write error, if any
    pub fn into_result(self) -> Result<()> {
        self.stdout?;
        self.stderr.unwrap_or(Ok(()))
    }
}

/// Outcome of running a process and writing its output to files
#[derive(Debug, Clone)]
pub struct FileReport {
    /// What waiting for the process returned
    pub status: Result<ExitStatus>,
    /// What writing the output returned
    pub persisted: Persisted,
}

impl FileReport {
    /// The exit status, or the first error from waiting or writing
    pub fn into_result(self) -> Result<ExitStatus> {
        let status = self.status?;
        self.persisted.into_result()?;
        Ok(status)
    }
}
