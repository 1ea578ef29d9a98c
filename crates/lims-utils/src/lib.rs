//! # LIMS Utils
//!
//! Infrastructure utilities for the LIMS toolkit.
//! This crate contains the credentials file reader, subprocess execution,
//! mail delivery and other functions that touch the local system.

pub mod credentials;
pub mod errors;
pub mod host;
pub mod mail;
pub mod parsers;
pub mod process;

// Re-export common types for convenience
pub use credentials::*;
pub use errors::*;
pub use host::*;
pub use mail::*;
pub use parsers::*;
pub use process::*;
