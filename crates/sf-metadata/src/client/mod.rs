//! Metadata API client.

use busbar_sf_auth::Session;
use busbar_sf_client::{SfHttpClient, DEFAULT_API_VERSION};

use crate::error::Result;

mod deploy;

/// Salesforce Metadata API client bound to one session.
#[derive(Clone)]
pub struct MetadataClient {
    instance_url: String,
    session_id: String,
    api_version: String,
    http_client: SfHttpClient,
}

impl std::fmt::Debug for MetadataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataClient")
            .field("instance_url", &self.instance_url)
            .field("session_id", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl MetadataClient {
    /// Create a client for an authenticated session.
    pub fn new(session: &impl Session) -> Result<Self> {
        Ok(Self::from_parts(session.instance_url(), session.session_id())?
            .with_api_version(session.api_version()))
    }

    /// Create a client from an instance URL and session id.
    pub fn from_parts(
        instance_url: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            instance_url: instance_url.into().trim_end_matches('/').to_string(),
            session_id: session_id.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            http_client: SfHttpClient::default_client()?,
        })
    }

    /// Set the API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Set a custom HTTP client.
    pub fn with_http_client(mut self, client: SfHttpClient) -> Self {
        self.http_client = client;
        self
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Get the Metadata API SOAP endpoint URL.
    pub(crate) fn metadata_url(&self) -> String {
        format!("{}/services/Soap/m/{}", self.instance_url, self.api_version)
    }
}
