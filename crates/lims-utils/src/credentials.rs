use crate::errors::{CredentialsError, Result};
use crate::parsers::{CredentialsLineParser, Parser};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, error};
use std::fs;
use std::path::{Path, PathBuf};

/// Default location of the credentials file
pub const DEFAULT_CREDENTIALS_FILE: &str = "~/.geneus/gl_credentials.cfg";

/// Required permission bits for the credentials directory
pub const CREDENTIALS_DIR_MODE: u32 = 0o700;
/// Required permission bits for the credentials file
pub const CREDENTIALS_FILE_MODE: u32 = 0o600;

/// One server entry from the credentials file
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub server: String,
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("server", &self.server)
            .field("user", &self.user)
            .field("password", &"****")
            .finish()
    }
}

impl Credentials {
    pub fn new(
        server: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into(),
            user: user.into(),
            password: password.into(),
        }
    }

    /// Base64 `user:password` token for the HTTP Basic scheme
    pub fn auth_token(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.user, self.password))
    }
}

/// Expand a leading `~` to the user's home directory
pub fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => {
            let home = dirs::home_dir().ok_or(CredentialsError::HomeDirectory)?;
            Ok(home.join(rest.trim_start_matches('/')))
        }
        _ => Ok(PathBuf::from(path)),
    }
}

/// Reject credentials files readable by anyone but their owner.
///
/// The containing directory must be exactly `700` and the file exactly `600`.
#[cfg(unix)]
pub fn check_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let dir_mode = fs::metadata(&dir)?.permissions().mode() & 0o777;
    if dir_mode != CREDENTIALS_DIR_MODE {
        return Err(CredentialsError::BadDirectoryPermissions(dir).into());
    }

    let file_mode = fs::metadata(path)?.permissions().mode() & 0o777;
    if file_mode != CREDENTIALS_FILE_MODE {
        return Err(CredentialsError::BadFilePermissions(path.to_path_buf()).into());
    }

    Ok(())
}

#[cfg(not(unix))]
pub fn check_permissions(path: &Path) -> Result<()> {
    fs::metadata(path)?;
    Ok(())
}

/// Find the entry for `server` in credentials file content.
///
/// Comment (`#`) and blank lines are ignored. Malformed lines are logged and
/// skipped before any comparison; the first entry whose server matches wins.
pub fn find_credentials(content: &str, server: &str) -> Result<Credentials> {
    let parser = CredentialsLineParser;

    for (number, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match parser.parse(trimmed) {
            Ok(credentials) if credentials.server == server => return Ok(credentials),
            Ok(_) => {}
            Err(e) => error!("Skipping line {} of credentials file: {}", number + 1, e),
        }
    }

    Err(CredentialsError::NotFound(server.to_string()).into())
}

/// Read credentials for `server` from a permission-restricted file
pub fn load_credentials(path: &str, server: &str) -> Result<Credentials> {
    let path = expand_home(path)?;
    debug!("Reading credentials for {} from {}", server, path.display());
    check_permissions(&path)?;
    let content = fs::read_to_string(&path)?;
    find_credentials(&content, server)
}
