use thiserror::Error;

/// Element model errors - no I/O dependencies
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("No element matches {0} and no location for a new element was given")]
    NotFound(String),

    #[error("Multiple elements match {0}")]
    AmbiguousMatch(String),

    #[error("Insert location {0} not found")]
    InsertLocationNotFound(String),

    #[error("Tag \"{0}\" is not in the form {{namespace}}local")]
    BadTagFormat(String),

    #[error("Invalid element path: {0}")]
    InvalidPath(String),

    #[error("Malformed XML: {0}")]
    MalformedXml(String),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
