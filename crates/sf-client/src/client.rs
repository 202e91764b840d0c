//! HTTP client for SOAP endpoints.

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use tracing::{debug, info, instrument};

use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind, Result};

/// Raw outcome of a SOAP POST.
///
/// Any HTTP status is returned here; only failures to get a response at all
/// surface as [`Error`].
#[derive(Debug, Clone)]
pub struct SoapResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl SoapResponse {
    /// Returns true for statuses below 400.
    pub fn is_success(&self) -> bool {
        self.status < 400
    }

    /// Generic description used when a failing body carries no SOAP fault.
    ///
    /// The body is cut to its first 500 characters.
    pub fn error_snippet(&self) -> String {
        let snippet: String = self.body.chars().take(500).collect();
        format!(
            "HTTP Error {}. Response Text: {}...",
            self.status, snippet
        )
    }
}

/// HTTP client for Salesforce SOAP APIs.
#[derive(Debug, Clone)]
pub struct SfHttpClient {
    inner: reqwest::Client,
    config: ClientConfig,
}

impl SfHttpClient {
    /// Create a new HTTP client.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .gzip(config.accept_compressed)
            .deflate(config.accept_compressed)
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        Ok(Self { inner, config })
    }

    /// Create a new HTTP client with default configuration.
    pub fn default_client() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// POST a SOAP envelope and return the status and body.
    #[instrument(skip(self, envelope), fields(url = %url, action = soap_action))]
    pub async fn post_soap(
        &self,
        url: &str,
        soap_action: &str,
        envelope: String,
    ) -> Result<SoapResponse> {
        let action = HeaderValue::from_str(soap_action)
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        if self.config.enable_tracing {
            debug!(bytes = envelope.len(), "Sending SOAP request");
        }

        let response = self
            .inner
            .post(url)
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", action)
            .body(envelope)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        if self.config.enable_tracing {
            if status < 400 {
                debug!(status, bytes = body.len(), "Response received");
            } else {
                info!(status, bytes = body.len(), "Non-success response");
            }
        }

        Ok(SoapResponse { status, body })
    }
}
