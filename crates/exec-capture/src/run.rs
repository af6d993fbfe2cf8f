//! One-call entry points
//!
//! Each function builds a [`CapturedProcess`] from a program and its
//! arguments, optionally hiding its console window, and drives it.

use std::ffi::OsStr;
use std::path::Path;
use tracing::Level;

use crate::command::Command;
use crate::error::Result;
use crate::handle::CapturedProcess;
use crate::persist::FileReport;
use crate::process::ExitStatus;
use crate::record::LogSink;

fn build<I, S>(hide: bool, program: impl AsRef<OsStr>, args: I) -> CapturedProcess
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command.args(args);
    if hide {
        command.hide();
    }
    CapturedProcess::new(command)
}

/// Start a program without waiting for it
pub fn start<I, S>(hide: bool, program: impl AsRef<OsStr>, args: I) -> Result<CapturedProcess>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let process = build(hide, program, args);
    process.start()?;
    Ok(process)
}

/// Run a program to completion.
///
/// The handle is returned even when starting or waiting failed, so captured
/// output stays readable. A non-zero exit is not an error.
pub async fn run<I, S>(
    hide: bool,
    program: impl AsRef<OsStr>,
    args: I,
) -> (CapturedProcess, Result<ExitStatus>)
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let process = build(hide, program, args);
    let outcome = process.run().await;
    (process, outcome)
}

/// Start a program and log the launch to `sink`
pub fn start_to_log<I, S>(
    hide: bool,
    sink: &dyn LogSink,
    level: Level,
    message: &str,
    program: impl AsRef<OsStr>,
    args: I,
) -> Result<CapturedProcess>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let process = build(hide, program, args);
    process.start_to_log(sink, level, message)?;
    Ok(process)
}

/// Run a program to completion and log the run to `sink`.
///
/// Like [`run`], the handle is returned alongside the outcome.
pub async fn run_to_log<I, S>(
    hide: bool,
    sink: &dyn LogSink,
    level: Level,
    message: &str,
    program: impl AsRef<OsStr>,
    args: I,
) -> (CapturedProcess, Result<ExitStatus>)
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let process = build(hide, program, args);
    let outcome = process.run_to_log(sink, level, message).await;
    (process, outcome)
}

/// Run a program and write its output to `path` and `path.err`
pub async fn run_to_file<I, S>(
    hide: bool,
    path: impl AsRef<Path>,
    program: impl AsRef<OsStr>,
    args: I,
) -> Result<(CapturedProcess, FileReport)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let process = build(hide, program, args);
    let report = process.run_to_file(path).await?;
    Ok((process, report))
}

/// Run a program, log the run to `sink`, and write its output to files
pub async fn run_to_file_log<I, S>(
    hide: bool,
    path: impl AsRef<Path>,
    sink: &dyn LogSink,
    level: Level,
    message: &str,
    program: impl AsRef<OsStr>,
    args: I,
) -> (CapturedProcess, FileReport)
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let process = build(hide, program, args);
    let report = process.run_to_file_log(path, sink, level, message).await;
    (process, report)
}
