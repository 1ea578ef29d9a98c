use crate::config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("API error: {0}")]
    Api(#[from] lims_api::ApiError),

    #[error("Element error: {0}")]
    Core(#[from] lims_core::CoreError),

    #[error("Utils error: {0}")]
    Utils(#[from] lims_utils::UtilsError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Invalid process URI: {0}")]
    InvalidProcessUri(String),
}

pub type Result<T> = std::result::Result<T, CliError>;
