//! Command type for describing the program to launch

use async_process::{Command as AsyncCommand, Stdio};
use serde::{Deserialize, Serialize};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// A command to be executed
///
/// This is a builder for creating commands that can be converted to `async_process::Command`
/// when needed. Unlike `AsyncCommand`, this type is `Clone` and can be reused multiple times.
#[derive(Debug, Clone)]
pub struct Command {
    /// The program to execute
    program: OsString,
    /// The arguments to pass to the program
    args: Vec<OsString>,
    /// Working directory for the command
    current_dir: Option<PathBuf>,
    /// Hide the console window (Windows only)
    hide_window: bool,
    /// Argument text appended verbatim to the command line (Windows only)
    raw_args: Option<OsString>,
}

impl Command {
    /// Create a new command for the given program
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            args: Vec::new(),
            current_dir: None,
            hide_window: false,
            raw_args: None,
        }
    }

    /// Add an argument to the command
    pub fn arg<S: AsRef<OsStr>>(&mut self, arg: S) -> &mut Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    /// Add multiple arguments to the command
    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self.arg(arg);
        }
        self
    }

    /// Set the working directory for the command
    pub fn current_dir<P: AsRef<Path>>(&mut self, dir: P) -> &mut Self {
        self.current_dir = Some(dir.as_ref().to_owned());
        self
    }

    /// Request that no console window is shown for the process.
    ///
    /// Only has an effect on Windows.
    pub fn hide(&mut self) -> &mut Self {
        self.hide_window = true;
        self
    }

    /// Append `text` verbatim to the command line instead of quoting it.
    ///
    /// Only has an effect on Windows, where programs parse their own command line.
    pub fn raw_args<S: AsRef<OsStr>>(&mut self, text: S) -> &mut Self {
        self.raw_args = Some(text.as_ref().to_owned());
        self
    }

    /// Get the program name
    pub fn get_program(&self) -> &OsStr {
        &self.program
    }

    /// Get the arguments
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Get the configured working directory
    pub fn get_current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// Whether a hidden window was requested
    pub fn is_hidden(&self) -> bool {
        self.hide_window
    }

    /// Get the raw argument text, if any
    pub fn get_raw_args(&self) -> Option<&OsStr> {
        self.raw_args.as_deref()
    }

    /// Resolve the working directory to an absolute path.
    ///
    /// An unset or empty directory resolves to the current directory of this process.
    pub fn resolved_dir(&self) -> Result<PathBuf> {
        let cwd = std::env::current_dir()?;
        Ok(match self.current_dir.as_deref() {
            None => cwd,
            Some(dir) if dir.as_os_str().is_empty() => cwd,
            Some(dir) if dir.is_absolute() => dir.to_path_buf(),
            Some(dir) => cwd.join(dir),
        })
    }

    /// Prepare this command for execution with both output streams piped
    pub(crate) fn prepare(&self) -> AsyncCommand {
        let mut cmd = AsyncCommand::new(&self.program);
        cmd.args(&self.args);

        if let Some(dir) = &self.current_dir {
            if !dir.as_os_str().is_empty() {
                cmd.current_dir(dir);
            }
        }

        #[cfg(windows)]
        {
            use async_process::windows::CommandExt;

            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            if self.hide_window {
                cmd.creation_flags(CREATE_NO_WINDOW);
            }
            if let Some(raw) = &self.raw_args {
                cmd.raw_arg(raw);
            }
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd
    }
}

/// Builder pattern helper
impl Command {
    /// Create a builder for this command (for chaining)
    pub fn builder<S: AsRef<OsStr>>(program: S) -> CommandBuilder {
        CommandBuilder(Command::new(program))
    }
}

/// Builder wrapper for more ergonomic command construction
pub struct CommandBuilder(Command);

impl CommandBuilder {
    /// Add an argument
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.0.arg(arg);
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.0.args(args);
        self
    }

    /// Set the working directory
    pub fn current_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.0.current_dir(dir);
        self
    }

    /// Hide the console window
    pub fn hide(mut self) -> Self {
        self.0.hide();
        self
    }

    /// Set raw argument text
    pub fn raw_args<S: AsRef<OsStr>>(mut self, text: S) -> Self {
        self.0.raw_args(text);
        self
    }

    /// Build the command
    pub fn build(self) -> Command {
        self.0
    }
}

/// Serializable description of a command, for loading from configuration files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// The program to execute
    pub program: String,
    /// Arguments passed to the program
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory, relative paths resolve against the current directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_dir: Option<PathBuf>,
    /// Hide the console window
    #[serde(default)]
    pub hide: bool,
    /// Raw command line text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_args: Option<String>,
}

impl CommandSpec {
    /// Parse a command description from JSON
    pub fn from_json(text: &str) -> Result<Self> {
        let spec: Self = serde_json::from_str(text).map_err(|e| Error::InvalidConfig {
            reason: e.to_string(),
        })?;
        if spec.program.trim().is_empty() {
            return Err(Error::InvalidConfig {
                reason: "program must not be empty".to_string(),
            });
        }
        Ok(spec)
    }
}

impl From<CommandSpec> for Command {
    fn from(spec: CommandSpec) -> Self {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        if let Some(dir) = &spec.current_dir {
            cmd.current_dir(dir);
        }
        if spec.hide {
            cmd.hide();
        }
        if let Some(raw) = &spec.raw_args {
            cmd.raw_args(raw);
        }
        cmd
    }
}
