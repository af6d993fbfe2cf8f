//! Process execution with in-memory output capture
//!
//! This crate launches a program, captures its stdout and stderr, and exposes
//! the captured text as trimmed strings. Each stream can be read whole
//! ([`CapturedStream::snapshot`]) or incrementally ([`CapturedStream::next`]),
//! and [`CapturedProcess::wait`] may be called any number of times from any
//! number of threads while reaping the process only once.
//!
//! ```no_run
//! use exec_capture::{CapturedProcess, Command};
//!
//! futures::executor::block_on(async {
//!     let process = CapturedProcess::new(Command::builder("git").arg("status").build());
//!     let status = process.run().await?;
//!     println!("{} -> {}", status.exit_code(), process.stdout().snapshot());
//!     Ok::<_, exec_capture::Error>(())
//! })?;
//! # Ok::<_, exec_capture::Error>(())
//! ```

#![warn(missing_docs)]

pub mod buffer;
pub mod command;
pub mod cursor;
pub mod error;
pub mod gate;
pub mod handle;
pub mod persist;
pub mod process;
pub mod record;
pub mod run;
pub mod stream;

pub use buffer::OutputBuffer;
pub use command::{Command, CommandBuilder, CommandSpec};
pub use cursor::Cursor;
pub use error::{Error, Result};
pub use gate::CompletionGate;
pub use handle::CapturedProcess;
pub use persist::{FileReport, Persisted, append_line, stderr_path};
pub use process::{ExitStatus, NO_EXIT_CODE};
pub use record::{ExecutionRecord, LogSink, NoOpSink, TracingSink};
pub use stream::{CapturedStream, StreamKind};
