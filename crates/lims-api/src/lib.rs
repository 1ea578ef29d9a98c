//! # LIMS API
//!
//! HTTP client for the LIMS REST API.
//! This crate turns `Element` payloads into authenticated GET/POST/PUT
//! requests, parses responses back into elements and handles registration
//! and API version discovery.

pub mod client;
pub mod errors;
pub mod session;
pub mod transport;

// Re-export common types for convenience
pub use client::*;
pub use errors::*;
pub use session::*;
pub use transport::*;

// Re-export core types that API consumers will need
pub use lims_core::{Element, UserDefinedFields};
