use crate::errors::{Result, UtilsError};
use log::{debug, warn};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// A plain-text message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl MailMessage {
    /// RFC 5322 rendering with the headers a local MTA needs
    pub fn render(&self) -> String {
        format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{}\r\n",
            self.from,
            self.to.join(", "),
            self.subject,
            self.body.replace("\r\n", "\n").replace('\n', "\r\n"),
        )
    }
}

/// Trait for delivering mail so scripts can swap the transport in tests
pub trait Mailer {
    fn send(&self, message: &MailMessage) -> Result<()>;
}

/// Delivers through the local `sendmail` binary
#[derive(Debug, Clone)]
pub struct SendmailMailer {
    program: PathBuf,
}

impl Default for SendmailMailer {
    fn default() -> Self {
        Self {
            program: PathBuf::from("/usr/sbin/sendmail"),
        }
    }
}

impl SendmailMailer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Mailer for SendmailMailer {
    fn send(&self, message: &MailMessage) -> Result<()> {
        debug!(
            "Sending mail \"{}\" to {} via {}",
            message.subject,
            message.to.join(", "),
            self.program.display()
        );

        let mut child = Command::new(&self.program)
            .arg("-i")
            .arg("-f")
            .arg(&message.from)
            .args(&message.to)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                UtilsError::Mail(format!("Failed to run {}: {}", self.program.display(), e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(message.render().as_bytes())?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("sendmail exited with {}: {}", output.status, stderr.trim());
            return Err(UtilsError::Mail(format!(
                "sendmail exited with {}",
                output.status
            )));
        }
        Ok(())
    }
}
