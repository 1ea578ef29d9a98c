use crate::{CliError, Result};
use lims_utils::DEFAULT_CREDENTIALS_FILE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding `lims.server`
pub const SERVER_ENV: &str = "LIMS_SERVER";
/// Environment variable overriding `lims.auth_file`
pub const AUTH_FILE_ENV: &str = "LIMS_AUTH_FILE";

/// Configuration-specific errors
///
/// # Variants
/// * `ConfigDirectory` - No per-user configuration directory could be determined
/// * `TomlError` - The config file is not valid TOML for this layout
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine the configuration directory")]
    ConfigDirectory,

    #[error("TOML parsing error in {path}: {message}")]
    TomlError { path: PathBuf, message: String },
}

/// `[lims]` section: which server to register with and where credentials live
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct LimsConfig {
    pub server: Option<String>,
    pub auth_file: Option<String>,
}

/// `[mail]` section: notification sender and recipients
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct MailConfig {
    pub from: Option<String>,
    #[serde(default)]
    pub to: Vec<String>,
}

/// `[log]` section
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct LogConfig {
    pub file: Option<PathBuf>,
}

/// Script configuration
///
/// # Fields
/// * `lims` - Server and credentials file
/// * `mail` - Notification settings used by `Script::email`
/// * `log` - Optional log file mirrored from the console
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub lims: LimsConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load `$XDG_CONFIG_HOME/lims/config.toml` when present, then apply
    /// environment overrides
    pub fn load() -> Result<Self> {
        let path = default_config_path()?;
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            log::debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(CliError::Io)?;
        toml::from_str(&content).map_err(|e| {
            ConfigError::TomlError {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Apply `LIMS_SERVER` / `LIMS_AUTH_FILE` through `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(server) = lookup(SERVER_ENV).filter(|s| !s.is_empty()) {
            self.lims.server = Some(server);
        }
        if let Some(auth_file) = lookup(AUTH_FILE_ENV).filter(|s| !s.is_empty()) {
            self.lims.auth_file = Some(auth_file);
        }
    }

    pub fn server(&self) -> Option<&str> {
        self.lims.server.as_deref()
    }

    /// Credentials file, `~/.geneus/gl_credentials.cfg` unless configured
    pub fn auth_file(&self) -> &str {
        self.lims
            .auth_file
            .as_deref()
            .unwrap_or(DEFAULT_CREDENTIALS_FILE)
    }
}

/// Get the path of the per-user config file
pub fn default_config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().ok_or(ConfigError::ConfigDirectory)?;
    Ok(dir.join("lims").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server(), None);
        assert_eq!(config.auth_file(), "~/.geneus/gl_credentials.cfg");
        assert!(config.mail.to.is_empty());
        assert!(config.log.file.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[lims]
server = "lims.example.org"

[mail]
from = "lims@example.org"
to = ["ops@example.org", "lab@example.org"]

[log]
file = "/var/log/lims/script.log"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.server(), Some("lims.example.org"));
        assert_eq!(config.auth_file(), DEFAULT_CREDENTIALS_FILE);
        assert_eq!(config.mail.from.as_deref(), Some("lims@example.org"));
        assert_eq!(config.mail.to.len(), 2);
        assert_eq!(
            config.log.file.as_deref(),
            Some(Path::new("/var/log/lims/script.log"))
        );
    }

    #[test]
    fn test_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[lims\nserver = 1").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(CliError::Config(ConfigError::TomlError { .. }))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.lims.server = Some("from-file".to_string());
        config.apply_env_overrides(|key| match key {
            SERVER_ENV => Some("from-env".to_string()),
            AUTH_FILE_ENV => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.server(), Some("from-env"));
        assert_eq!(config.auth_file(), DEFAULT_CREDENTIALS_FILE);
    }
}
