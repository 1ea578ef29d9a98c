//! # LIMS CLI
//!
//! Building blocks for command-line scripts that talk to a LIMS: argument
//! parsing with clap, console and file logging, shell execution, mail
//! notification and a controlled exit path. Session and EPP behaviour are
//! opted into through [`ScriptArgs`].

pub mod config;
pub mod epp;
pub mod errors;
pub mod logging;
pub mod script;
pub mod session;
pub mod severity;

pub use config::Config;
pub use epp::{EppArgs, ProcessErrorFlagger};
pub use errors::{CliError, Result};
pub use logging::{init_logging, Logging};
pub use script::{ExitContext, ExitHook, Script, ScriptArgs, ShellOptions};
pub use session::SessionArgs;
pub use severity::Severity;
