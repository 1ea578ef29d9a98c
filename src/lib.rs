//! Client library and script toolkit for a LIMS REST/XML API.
//!
//! The workspace crates are re-exported here; the `lims` binary built from
//! this package is a thin script on top of them.

pub mod cli;
pub mod commands;
pub mod display;

pub use lims_api::{ApiError, ApiVersion, LimsClient, Payload, Session};
pub use lims_cli::{Config, Script, ScriptArgs, Severity, ShellOptions};
pub use lims_core::{Element, UserDefinedFields};
pub use lims_utils::Credentials;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
