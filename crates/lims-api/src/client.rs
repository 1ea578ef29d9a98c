use crate::errors::{ApiError, HttpError, Result};
use crate::session::{api_root, ApiVersion, Session};
use crate::transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
use lims_core::{CoreError, Element, UserDefinedFields};
use lims_utils::load_credentials;
use log::{debug, error, info, trace};
use std::fmt;
use std::sync::Arc;

/// Body of an outgoing request
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    Empty,
    Text(&'a str),
    Element(&'a Element),
}

impl<'a> From<&'a Element> for Payload<'a> {
    fn from(element: &'a Element) -> Self {
        Payload::Element(element)
    }
}

impl<'a> From<&'a str> for Payload<'a> {
    fn from(text: &'a str) -> Self {
        Payload::Text(text)
    }
}

/// Client for one registered LIMS server
#[derive(Clone)]
pub struct LimsClient {
    session: Session,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for LimsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LimsClient")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl LimsClient {
    /// Create a client for an already versioned endpoint
    pub fn new(session: Session, transport: Arc<dyn Transport>) -> Self {
        debug!("Creating LimsClient");
        debug!("  Base URI: {}", session.base_uri());
        debug!("  User: {}", session.credentials().user);
        Self { session, transport }
    }

    /// Read credentials for `server` and negotiate the API version over HTTP
    pub fn register(server: &str, credentials_path: &str) -> Result<Self> {
        Self::register_with_transport(server, credentials_path, Arc::new(ReqwestTransport::new()))
    }

    /// Registration against a caller-supplied transport.
    ///
    /// The versionless API root is queried and the first advertised
    /// `version` decides the path segment appended to the base URI.
    pub fn register_with_transport(
        server: &str,
        credentials_path: &str,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        info!("Registering LIMS session for {}", server);
        let credentials = load_credentials(credentials_path, server)?;
        let mut client = Self::new(Session::new(api_root(server), credentials), transport);

        let versions = client.get("")?;
        let version = versions
            .child("version")
            .ok_or_else(|| ApiError::InvalidVersion("no version element in API root".to_string()))?;
        let major = version.get("major").unwrap_or_default();
        let minor = version.get("minor").unwrap_or_default();
        let version = ApiVersion::parse(major, minor)?;

        client.session.negotiate(version);
        info!(
            "Registered {} (API {})",
            client.session.base_uri(),
            client.session.api_version().map(ToString::to_string).unwrap_or_default()
        );
        Ok(client)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn base_uri(&self) -> &str {
        self.session.base_uri()
    }

    pub fn api_version(&self) -> Option<&ApiVersion> {
        self.session.api_version()
    }

    /// Send one request and parse the XML response.
    ///
    /// The method is validated before anything touches the network.
    pub fn request(&self, uri: &str, method: &str, payload: Payload<'_>) -> Result<Element> {
        let method: Method = method.parse()?;
        let url = self.session.resolve(uri);

        let mut headers = vec![(
            "Authorization".to_string(),
            format!("Basic {}", self.session.auth_token()),
        )];
        let body = match payload {
            Payload::Empty => None,
            Payload::Text(text) => Some(text.as_bytes().to_vec()),
            Payload::Element(element) => {
                headers.push(("Content-Type".to_string(), "application/xml".to_string()));
                Some(element.to_xml_bytes()?)
            }
        };

        debug!("HTTP {} request to: {}", method, url);
        trace!("Request headers:");
        trace!("  Authorization: Basic {}", mask(self.session.auth_token()));
        if let Some(body) = &body {
            trace!("Request body: {}", String::from_utf8_lossy(body));
        }

        let request = HttpRequest {
            method,
            url,
            headers,
            body,
        };
        let response = self.transport.execute(&request).map_err(|e| {
            error!("{} {} failed: {}", request.method, request.url, e);
            e
        })?;

        let response = self.handle_response(&request, response)?;
        trace!("Response body: {}", response.text());
        Ok(Element::parse(&response.body)?)
    }

    fn handle_response(&self, request: &HttpRequest, response: HttpResponse) -> Result<HttpResponse> {
        if response.is_success() {
            debug!("Request successful with status: {}", response.status);
            return Ok(response);
        }

        let error_text = response.text();
        error!(
            "{} {} failed with status: {}",
            request.method, request.url, response.status
        );
        error!("Error response body: {}", error_text);

        let api_error = match response.status {
            401 => {
                error!("Authentication failed (401 Unauthorized)");
                HttpError::AuthenticationFailed
            }
            403 => {
                error!("Access forbidden (403 Forbidden)");
                HttpError::Forbidden
            }
            404 => HttpError::NotFound(request.url.clone()),
            503 => {
                error!("Service unavailable (503)");
                HttpError::ServiceUnavailable
            }
            408 => {
                error!("Request timeout (408)");
                HttpError::Timeout
            }
            status => HttpError::HttpError {
                status,
                message: error_text,
            },
        };

        Err(ApiError::Http(api_error))
    }

    pub fn get(&self, uri: &str) -> Result<Element> {
        self.request(uri, "GET", Payload::Empty)
    }

    /// PUT a resource back to its own `uri`
    pub fn update(&self, resource: &Element) -> Result<Element> {
        let uri = resource
            .get("uri")
            .ok_or_else(|| ApiError::MissingUri(resource.tag().to_string()))?;
        self.request(uri, "PUT", Payload::Element(resource))
    }

    /// POST a new resource.
    ///
    /// Without an explicit collection the target is derived from the last
    /// segment of the tag's namespace, so `smp:samplecreation` goes to
    /// `/samples`.
    pub fn add_new(&self, resource: &Element, collection: Option<&str>) -> Result<Element> {
        let target = match collection {
            Some(collection) => collection.to_string(),
            None => default_collection(resource)?,
        };
        debug!("Adding new <{}> to {}", resource.local_name(), target);
        self.request(&target, "POST", Payload::Element(resource))
    }

    /// Fetch many artifacts in one round trip
    pub fn batch_retrieve<I, S>(&self, uris: I) -> Result<Vec<Element>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.session.require_batch()?;

        let mut links = Element::new("ri:links");
        for uri in uris {
            links.sub_element("link", None, &[("uri", uri.as_ref()), ("rel", "artifacts")]);
        }

        let response = self.request("artifacts/batch/retrieve", "POST", Payload::Element(&links))?;
        let artifact_tag = lims_core::expand_tag("art:artifact");
        Ok(response
            .descendants()
            .filter(|element| element.tag() == artifact_tag)
            .cloned()
            .collect())
    }

    /// Write many artifacts in one round trip and return the updated URIs
    pub fn batch_update(&self, artifacts: &[Element]) -> Result<Vec<String>> {
        self.session.require_batch()?;

        let mut details = Element::new("art:details");
        for artifact in artifacts {
            details.push(artifact.clone());
        }

        let response = self.request("artifacts/batch/update", "POST", Payload::Element(&details))?;
        let updated: Vec<String> = response
            .find_all("link")?
            .into_iter()
            .filter_map(|link| link.get("uri"))
            .map(|uri| {
                info!("Updated {}", uri);
                uri.to_string()
            })
            .collect();
        Ok(updated)
    }

    pub fn project_element(
        &self,
        name: &str,
        researcher_id: &str,
        open_date: Option<&str>,
        udfs: &UserDefinedFields,
    ) -> Element {
        lims_core::project_element(self.base_uri(), name, researcher_id, open_date, udfs)
    }

    pub fn container_element(
        &self,
        name: &str,
        container_type_id: &str,
        udfs: &UserDefinedFields,
    ) -> Element {
        lims_core::container_element(self.base_uri(), name, container_type_id, udfs)
    }

    pub fn sample_element(
        &self,
        name: &str,
        project_id: &str,
        container_id: &str,
        location: &str,
        date_received: Option<&str>,
        udfs: &UserDefinedFields,
    ) -> Element {
        lims_core::sample_element(
            self.base_uri(),
            name,
            project_id,
            container_id,
            location,
            date_received,
            udfs,
        )
    }
}

/// `/{last namespace segment}s` for a qualified resource tag
fn default_collection(resource: &Element) -> Result<String> {
    let namespace = resource
        .namespace()
        .ok_or_else(|| CoreError::BadTagFormat(resource.tag().to_string()))?;
    let kind = namespace
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|kind| !kind.is_empty())
        .ok_or_else(|| CoreError::BadTagFormat(resource.tag().to_string()))?;
    Ok(format!("/{}s", kind))
}

fn mask(secret: &str) -> String {
    if secret.len() > 8 {
        format!("{}...{}", &secret[..4], &secret[secret.len() - 4..])
    } else {
        "****".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_collection() {
        let sample = Element::new("smp:samplecreation");
        assert_eq!(default_collection(&sample).unwrap(), "/samples");

        let project = Element::new("prj:project");
        assert_eq!(default_collection(&project).unwrap(), "/projects");

        let bare = Element::new("sample");
        assert!(matches!(
            default_collection(&bare),
            Err(ApiError::Core(CoreError::BadTagFormat(_)))
        ));
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("YWxpY2U6c2VjcmV0"), "YWxp...cmV0");
        assert_eq!(mask("short"), "****");
    }
}
