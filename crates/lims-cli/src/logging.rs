use crate::{CliError, Result};
use log::debug;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::reload;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Registry;

/// Environment variable holding a filter directive that replaces the default
pub const LOG_ENV: &str = "LIMS_LOG";

/// Scripts log at info; the client libraries only report problems
pub const DEFAULT_FILTER: &str = "info,lims_api=warn,lims_core=warn";

const LIBRARY_TARGETS: [&str; 2] = ["lims_api", "lims_core"];

/// Handle on the installed subscriber, used to raise library verbosity after
/// the command line has been parsed
pub struct Logging {
    base: String,
    handle: reload::Handle<EnvFilter, Registry>,
}

/// Install console logging on stderr, plus a plain-text copy in `log_file`.
///
/// `LIMS_LOG` overrides [`DEFAULT_FILTER`]. Records emitted through the `log`
/// facade are captured as well.
pub fn init_logging(log_file: Option<&Path>) -> Result<Logging> {
    let base = match std::env::var(LOG_ENV) {
        Ok(directive) if EnvFilter::try_new(&directive).is_ok() => directive,
        Ok(directive) => {
            eprintln!(
                "invalid {} directive ({}); using {}",
                LOG_ENV, directive, DEFAULT_FILTER
            );
            DEFAULT_FILTER.to_string()
        }
        Err(_) => DEFAULT_FILTER.to_string(),
    };

    let (filter, handle) = reload::Layer::new(build_filter(&base, false)?);

    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))?;

    debug!("Logging initialised with filter {}", base);
    Ok(Logging { base, handle })
}

impl Logging {
    /// Switch the client library targets to debug level
    pub fn set_library_debug(&self) -> Result<()> {
        let filter = build_filter(&self.base, true)?;
        self.handle
            .reload(filter)
            .map_err(|e| CliError::Logging(e.to_string()))?;
        debug!("Library debug logging enabled");
        Ok(())
    }
}

fn build_filter(base: &str, library_debug: bool) -> Result<EnvFilter> {
    EnvFilter::try_new(filter_directives(base, library_debug))
        .map_err(|e| CliError::Logging(e.to_string()))
}

/// Directive string for `base`, with the library targets forced to debug
/// when requested
pub fn filter_directives(base: &str, library_debug: bool) -> String {
    if !library_debug {
        return base.to_string();
    }

    let mut directives: Vec<String> = base
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .filter(|d| {
            let target = d.split('=').next().unwrap_or_default();
            !LIBRARY_TARGETS.contains(&target)
        })
        .map(str::to_string)
        .collect();
    directives.extend(LIBRARY_TARGETS.iter().map(|t| format!("{}=debug", t)));
    directives.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_unchanged_without_debug() {
        assert_eq!(filter_directives(DEFAULT_FILTER, false), DEFAULT_FILTER);
    }

    #[test]
    fn test_library_debug_replaces_library_levels() {
        assert_eq!(
            filter_directives(DEFAULT_FILTER, true),
            "info,lims_api=debug,lims_core=debug"
        );
        assert_eq!(
            filter_directives("warn,my_script=trace", true),
            "warn,my_script=trace,lims_api=debug,lims_core=debug"
        );
    }

    #[test]
    fn test_directives_parse() {
        assert!(build_filter(DEFAULT_FILTER, true).is_ok());
    }
}
