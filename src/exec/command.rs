// src/exec/command.rs

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// What to launch for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_directory: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_directory: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// A command that ran to a zero exit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Interleaved stdout and stderr, in the order chunks arrived.
    pub output: Vec<u8>,
}

impl CommandOutput {
    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

/// Why a single invocation failed. Never fatal to the dispatcher.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The process ran and terminated unsuccessfully. `code` is `None` when it
    /// was killed by a signal.
    #[error("{}", describe_exit(.code))]
    Exited { code: Option<i32>, output: Vec<u8> },

    #[error("I/O error while running command: {source}")]
    Io {
        #[source]
        source: io::Error,
        output: Vec<u8>,
    },
}

impl CommandError {
    /// Whatever output was captured before the failure.
    pub fn output(&self) -> &[u8] {
        match self {
            CommandError::Spawn { .. } => &[],
            CommandError::Exited { output, .. } | CommandError::Io { output, .. } => output,
        }
    }

    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(self.output()).into_owned()
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            CommandError::Exited { code, .. } => *code,
            _ => None,
        }
    }

    pub fn is_spawn_failure(&self) -> bool {
        matches!(self, CommandError::Spawn { .. })
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("command exited with status {code}"),
        None => "command terminated by signal".to_string(),
    }
}

pub type RunResult = std::result::Result<CommandOutput, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_program_and_args() {
        let spec = CommandSpec::new("make").with_args(["-C", "src", "all"]);
        assert_eq!(spec.to_string(), "make -C src all");
    }

    #[test]
    fn exit_error_message_carries_status() {
        let err = CommandError::Exited {
            code: Some(3),
            output: b"boom".to_vec(),
        };
        assert_eq!(err.to_string(), "command exited with status 3");
        assert_eq!(err.exit_code(), Some(3));
        assert_eq!(err.output_text(), "boom");
    }

    #[test]
    fn signal_termination_has_no_code() {
        let err = CommandError::Exited {
            code: None,
            output: Vec::new(),
        };
        assert_eq!(err.to_string(), "command terminated by signal");
        assert_eq!(err.exit_code(), None);
    }
}
