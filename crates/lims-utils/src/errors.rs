use std::path::PathBuf;
use thiserror::Error;

/// Infrastructure-specific errors for lims-utils
#[derive(Error, Debug)]
pub enum UtilsError {
    #[error("Credentials error: {0}")]
    Credentials(#[from] CredentialsError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Mail error: {0}")]
    Mail(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Process error: {0}")]
    Process(String),
}

#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("{} must have permissions = 700", .0.display())]
    BadDirectoryPermissions(PathBuf),

    #[error("{} must have permissions = 600", .0.display())]
    BadFilePermissions(PathBuf),

    #[error("Credentials for {0} not found")]
    NotFound(String),

    #[error("Home directory could not be determined")]
    HomeDirectory,
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to parse: {0}")]
    InvalidFormat(String),

    #[error("Unterminated quote in: {0}")]
    UnterminatedQuote(String),
}

pub type Result<T> = std::result::Result<T, UtilsError>;
