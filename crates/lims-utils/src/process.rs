use crate::errors::{Result, UtilsError};
use crate::parsers::split_command_line;
use log::debug;
use std::process::{Command, Stdio};

/// Captured result of a finished subprocess
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    pub fn has_stderr(&self) -> bool {
        !self.stderr.is_empty()
    }
}

/// Run a command line and capture both output streams.
///
/// With `split` the line is broken into words and executed directly;
/// otherwise it is handed to `sh -c` unchanged.
pub fn run_command(command_line: &str, split: bool) -> Result<CommandOutput> {
    let mut command = if split {
        let words = split_command_line(command_line)?;
        let (program, args) = words
            .split_first()
            .ok_or_else(|| UtilsError::Process("Empty command line".to_string()))?;
        let mut command = Command::new(program);
        command.args(args);
        command
    } else {
        let mut command = Command::new("sh");
        command.arg("-c").arg(command_line);
        command
    };

    debug!("Spawning: {:?}", command);

    let output = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| UtilsError::Process(format!("Failed to execute {}: {}", command_line, e)))?;

    Ok(CommandOutput {
        stdout: output.stdout,
        stderr: output.stderr,
        exit_code: output.status.code(),
    })
}
