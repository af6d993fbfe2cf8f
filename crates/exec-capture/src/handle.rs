//! Process handle with captured output

use async_channel::Receiver;
use async_process::Child;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use tracing::{Level, debug, warn};

use crate::buffer::spawn_pump;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::gate::CompletionGate;
use crate::persist::{FileReport, Persisted};
use crate::process::{ExitStatus, NO_EXIT_CODE};
use crate::record::{ExecutionRecord, LogSink};
use crate::stream::{CapturedStream, StreamKind};

/// A process whose stdout and stderr are captured in memory
///
/// The handle is `Sync`: share it behind an `Arc` to read output or wait for
/// the process from several threads at once.
#[derive(Debug)]
pub struct CapturedProcess {
    command: Command,
    stdout: CapturedStream,
    stderr: CapturedStream,
    /// The running child, lent out to whoever is reaping it
    child: Mutex<Option<Child>>,
    pid: OnceLock<u32>,
    /// Closed once the matching pump has drained its pipe
    drains: Mutex<Vec<Receiver<()>>>,
    gate: CompletionGate<Result<ExitStatus>>,
}

/// Puts a lent-out child back into its slot, even if the reaping future is dropped
struct LentChild<'a> {
    slot: &'a Mutex<Option<Child>>,
    child: Option<Child>,
}

impl Drop for LentChild<'_> {
    fn drop(&mut self) {
        if let Some(child) = self.child.take() {
            *lock(self.slot) = Some(child);
        }
    }
}

/// Kill a child whose output cannot be captured and let async-process reap it
fn abandon(mut child: Child, program: &str) {
    if let Err(e) = child.kill() {
        warn!(
            pid = child.id(),
            program = %program,
            error = %e,
            "failed to kill process after output pump setup failed"
        );
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CapturedProcess {
    /// Create a handle for `command`. Nothing is launched until [`start`](Self::start).
    pub fn new(command: Command) -> Self {
        Self {
            command,
            stdout: CapturedStream::new(StreamKind::Stdout),
            stderr: CapturedStream::new(StreamKind::Stderr),
            child: Mutex::new(None),
            pid: OnceLock::new(),
            drains: Mutex::new(Vec::new()),
            gate: CompletionGate::new(),
        }
    }

    /// The command this handle launches
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Captured standard output
    pub fn stdout(&self) -> &CapturedStream {
        &self.stdout
    }

    /// Captured standard error
    pub fn stderr(&self) -> &CapturedStream {
        &self.stderr
    }

    /// Process id, once started
    pub fn pid(&self) -> Option<u32> {
        self.pid.get().copied()
    }

    /// Launch the process with both output streams captured.
    ///
    /// Returns as soon as the process is running; output accumulates in the
    /// background until it exits.
    pub fn start(&self) -> Result<()> {
        let mut slot = lock(&self.child);
        if slot.is_some() || self.pid.get().is_some() {
            return Err(Error::AlreadyStarted);
        }

        let program = self.command.get_program().to_string_lossy().into_owned();
        let mut child = self
            .command
            .prepare()
            .spawn()
            .map_err(|e| Error::from_spawn(&program, e))?;

        let pumps = [
            child
                .stdout
                .take()
                .map(|out| spawn_pump(StreamKind::Stdout.as_str(), out, self.stdout.buffer().clone())),
            child
                .stderr
                .take()
                .map(|err| spawn_pump(StreamKind::Stderr.as_str(), err, self.stderr.buffer().clone())),
        ];
        let mut drains = Vec::with_capacity(pumps.len());
        for pump in pumps.into_iter().flatten() {
            match pump {
                Ok(drained) => drains.push(drained),
                Err(e) => {
                    abandon(child, &program);
                    return Err(e);
                }
            }
        }

        let pid = child.id();
        debug!(pid, program = %program, dir = ?self.command.get_current_dir(), "process started");

        *lock(&self.drains) = drains;
        *slot = Some(child);
        let _ = self.pid.set(pid);
        Ok(())
    }

    /// Wait for the process to exit.
    ///
    /// Safe to call any number of times from any number of tasks or threads:
    /// the process is reaped once and every caller gets the same outcome.
    /// Once this returns, both captured streams are complete.
    pub async fn wait(&self) -> Result<ExitStatus> {
        self.gate.complete_with(|| self.reap()).await
    }

    /// Blocking form of [`wait`](Self::wait) for synchronous callers
    pub fn wait_blocking(&self) -> Result<ExitStatus> {
        futures_lite::future::block_on(self.wait())
    }

    async fn reap(&self) -> Result<ExitStatus> {
        let mut lent = LentChild {
            slot: &self.child,
            child: lock(&self.child).take(),
        };
        let Some(child) = lent.child.as_mut() else {
            return Err(Error::NotStarted);
        };

        let status = ExitStatus::from(child.status().await?);

        let drains = lock(&self.drains).clone();
        for drained in drains {
            // Only ever closed, never sent on.
            let _ = drained.recv().await;
        }

        debug!(pid = ?self.pid(), code = ?status.code, "process exited");
        Ok(status)
    }

    /// Start the process and wait for it to exit
    pub async fn run(&self) -> Result<ExitStatus> {
        self.start()?;
        self.wait().await
    }

    /// Whether the process has been waited on
    pub fn is_finished(&self) -> bool {
        self.gate.is_done()
    }

    /// Exit status, once the process has been waited on successfully
    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.gate.peek().and_then(|outcome| outcome.ok())
    }

    /// Exit code, or `-1` until the process has exited with a numeric status
    pub fn exit_code(&self) -> i32 {
        self.exit_status()
            .map(|status| status.exit_code())
            .unwrap_or(NO_EXIT_CODE)
    }

    /// The configured working directory, made absolute
    pub fn work_dir(&self) -> Result<PathBuf> {
        self.command.resolved_dir()
    }

    /// Run the process, then write its output to `path` (and `path.err`).
    ///
    /// Fails only if the process could not be started; wait and write
    /// outcomes are reported individually in the [`FileReport`].
    pub async fn run_to_file(&self, path: impl AsRef<Path>) -> Result<FileReport> {
        self.start()?;
        let status = self.wait().await;
        let persisted = Persisted::write(self, path);
        Ok(FileReport { status, persisted })
    }

    /// Start the process and send one record describing the launch to `sink`
    pub fn start_to_log(&self, sink: &dyn LogSink, level: Level, message: &str) -> Result<()> {
        let outcome = self.start();
        sink.record(level, message, &ExecutionRecord::started(self, &outcome));
        outcome
    }

    /// Run the process and send one record describing the run to `sink`
    pub async fn run_to_log(
        &self,
        sink: &dyn LogSink,
        level: Level,
        message: &str,
    ) -> Result<ExitStatus> {
        let outcome = self.run().await;
        sink.record(level, message, &ExecutionRecord::finished(self, &outcome));
        outcome
    }

    /// [`run_to_log`](Self::run_to_log) followed by writing the output to files.
    ///
    /// The files are written even when the run failed.
    pub async fn run_to_file_log(
        &self,
        path: impl AsRef<Path>,
        sink: &dyn LogSink,
        level: Level,
        message: &str,
    ) -> FileReport {
        let status = self.run_to_log(sink, level, message).await;
        let persisted = Persisted::write(self, path);
        FileReport { status, persisted }
    }
}
