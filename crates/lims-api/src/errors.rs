use thiserror::Error;

/// API-specific errors for lims-api
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Element error: {0}")]
    Core(#[from] lims_core::CoreError),

    #[error("Utils error: {0}")]
    Utils(#[from] lims_utils::UtilsError),

    #[error("Unsupported method \"{0}\"")]
    UnsupportedMethod(String),

    #[error("No LIMS session has been registered")]
    NotRegistered,

    #[error("API version detected is {0}; batch methods need v1.r13 or later")]
    BatchNotImplemented(String),

    #[error("Resource <{0}> has no uri attribute")]
    MissingUri(String),

    #[error("Invalid API version: {0}")]
    InvalidVersion(String),
}

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Access forbidden")]
    Forbidden,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Service unavailable")]
    ServiceUnavailable,

    #[error("Request timeout")]
    Timeout,

    #[error("HTTP error {status}: {message}")]
    HttpError { status: u16, message: String },

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ApiError>;
