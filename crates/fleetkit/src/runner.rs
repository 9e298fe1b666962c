//! External command execution.
//!
//! The pool only sees the [`CommandRunner`] trait, so tests can substitute
//! a scripted runner for the real shell.

use std::process::{Command, ExitStatus, Stdio};

use crate::error::RunnerError;
use crate::types::CommandOutput;

/// Runs one shell command to completion.
///
/// Implementations must report a portable exit code; signal-vs-exit
/// extraction is their job, not the classifier's.
pub trait CommandRunner: Send + Sync {
    /// Run `command`, blocking until it exits.
    ///
    /// An `Err` means the process could not be started at all; a process
    /// that ran and failed is an `Ok` with a non-zero exit code.
    fn run(&self, command: &str) -> Result<CommandOutput, RunnerError>;
}

/// Runs commands through `sh -c`.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }
}

impl ShellRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different POSIX shell (must accept `-c`).
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str) -> Result<CommandOutput, RunnerError> {
        log::trace!("{} -c {}", self.shell, redact_password(command));

        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| RunnerError::Spawn {
                program: self.shell.clone(),
                source,
            })?;

        Ok(CommandOutput::from(output))
    }
}

/// Portable exit code for a finished process.
///
/// A process killed by a signal reports `128 + signal`, the shell convention.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}

/// Mask the value following `--ssh-password` for logging.
pub fn redact_password(command: &str) -> String {
    let mut redacted = Vec::new();
    let mut mask_next = false;
    for word in command.split(' ') {
        if mask_next {
            redacted.push(if word.is_empty() { "" } else { "********" });
            mask_next = false;
        } else {
            mask_next = word == "--ssh-password";
            redacted.push(word);
        }
    }
    redacted.join(" ")
}
