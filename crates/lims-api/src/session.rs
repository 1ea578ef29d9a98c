use crate::errors::{ApiError, Result};
use lims_utils::Credentials;
use std::fmt;

/// Port the LIMS API listens on
pub const DEFAULT_API_PORT: u16 = 8080;

/// Versionless API root for a server
pub fn api_root(server: &str) -> String {
    format!("http://{}:{}/api", server, DEFAULT_API_PORT)
}

/// API version advertised by the server, e.g. `v2` / `r21`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiVersion {
    /// Path segment appended to the API root, e.g. `v2`
    pub major_segment: String,
    pub major: u32,
    pub minor: u32,
}

impl ApiVersion {
    /// Parse the `major`/`minor` attributes of a `version` element
    pub fn parse(major: &str, minor: &str) -> Result<Self> {
        Ok(Self {
            major_segment: major.to_string(),
            major: parse_segment(major)?,
            minor: parse_segment(minor)?,
        })
    }

    /// Batch artifact endpoints exist from v1.r13 on
    pub fn supports_batch(&self) -> bool {
        !(self.major == 0 || (self.major == 1 && self.minor < 13))
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.r{}", self.major, self.minor)
    }
}

fn parse_segment(segment: &str) -> Result<u32> {
    segment
        .trim_start_matches(['v', 'r'])
        .parse()
        .map_err(|_| ApiError::InvalidVersion(segment.to_string()))
}

/// Connection state for one LIMS server
#[derive(Clone)]
pub struct Session {
    base_uri: String,
    credentials: Credentials,
    auth_token: String,
    api_version: Option<ApiVersion>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_uri", &self.base_uri)
            .field("credentials", &self.credentials)
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl Session {
    pub fn new(base_uri: impl Into<String>, credentials: Credentials) -> Self {
        let auth_token = credentials.auth_token();
        Self {
            base_uri: base_uri.into(),
            credentials,
            auth_token,
            api_version: None,
        }
    }

    pub fn with_api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = Some(version);
        self
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    pub fn api_version(&self) -> Option<&ApiVersion> {
        self.api_version.as_ref()
    }

    /// Append the negotiated major segment to the base URI
    pub(crate) fn negotiate(&mut self, version: ApiVersion) {
        self.base_uri = format!(
            "{}/{}",
            self.base_uri.trim_end_matches('/'),
            version.major_segment
        );
        self.api_version = Some(version);
    }

    /// Make `uri` absolute against the base URI unless it already is
    pub fn resolve(&self, uri: &str) -> String {
        if uri.starts_with(&self.base_uri) {
            uri.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_uri.trim_end_matches('/'),
                uri.trim_start_matches('/')
            )
        }
    }

    /// Fail with `BatchNotImplemented` unless the server is new enough
    pub fn require_batch(&self) -> Result<()> {
        match &self.api_version {
            Some(version) if version.supports_batch() => Ok(()),
            Some(version) => Err(ApiError::BatchNotImplemented(version.to_string())),
            None => Err(ApiError::BatchNotImplemented("unknown".to_string())),
        }
    }
}
