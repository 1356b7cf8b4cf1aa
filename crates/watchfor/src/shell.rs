//! Turning a command line into a child process.
//!
//! Both the command probe and the follow-up runner go through [`Invocation`].
//! The default is to hand the whole line to the platform shell so pipes,
//! quoting and built-ins behave the way users expect from a terminal;
//! [`Invocation::Argv`] runs a program directly without a shell.

use std::fmt;

use tokio::process::Command;

use crate::error::{Result, WatchError};

/// A command interpreter and the flag that makes it run a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shell {
    program: String,
    flag: String,
}

impl Shell {
    /// Create a custom shell, e.g. `Shell::new("bash", "-c")`.
    pub fn new(program: impl Into<String>, flag: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            flag: flag.into(),
        }
    }

    /// `sh -c` on Unix, `cmd /C` on Windows.
    #[must_use]
    pub fn system() -> Self {
        if cfg!(windows) {
            Self::new("cmd", "/C")
        } else {
            Self::new("sh", "-c")
        }
    }

    /// Get the interpreter program.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::system()
    }
}

/// How a command line is executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Run the line through a shell interpreter.
    Shell {
        /// The command line.
        line: String,
        /// The interpreter.
        shell: Shell,
    },

    /// Run a program with explicit arguments, no shell involved.
    Argv(Vec<String>),
}

impl Invocation {
    /// Run `line` through the system shell.
    pub fn shell(line: impl Into<String>) -> Self {
        Self::Shell {
            line: line.into(),
            shell: Shell::system(),
        }
    }

    /// Run `line` through a specific shell.
    pub fn with_shell(line: impl Into<String>, shell: Shell) -> Self {
        Self::Shell {
            line: line.into(),
            shell,
        }
    }

    /// Run a program directly.
    pub fn argv<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Argv(args.into_iter().map(Into::into).collect())
    }

    /// Check whether there is anything to run.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Shell { line, .. } => line.trim().is_empty(),
            Self::Argv(args) => args.first().is_none_or(|p| p.is_empty()),
        }
    }

    /// Reject command lines that can never start.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(WatchError::invalid_command("command is empty"));
        }
        let has_nul = match self {
            Self::Shell { line, .. } => line.contains('\0'),
            Self::Argv(args) => args.iter().any(|a| a.contains('\0')),
        };
        if has_nul {
            return Err(WatchError::invalid_command("command contains null byte"));
        }
        Ok(())
    }

    /// Build the process for this invocation. Stdio is left to the caller.
    pub fn command(&self) -> Result<Command> {
        self.validate()?;
        let command = match self {
            Self::Shell { line, shell } => {
                let mut cmd = Command::new(&shell.program);
                cmd.arg(&shell.flag).arg(line);
                cmd
            }
            Self::Argv(args) => {
                let mut cmd = Command::new(&args[0]);
                cmd.args(&args[1..]);
                cmd
            }
        };
        Ok(command)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shell { line, .. } => f.write_str(line),
            Self::Argv(args) => f.write_str(&args.join(" ")),
        }
    }
}
