//! Username/password login over the SOAP Partner API.

use busbar_sf_client::security::xml;
use busbar_sf_client::{soap, ClientConfig, SfHttpClient, DEFAULT_API_VERSION};
use tracing::{info, instrument, warn};

use crate::credentials::Credentials;
use crate::error::{Error, ErrorKind, Result};

/// Session returned by a successful login.
#[derive(Clone)]
pub struct LoginResult {
    /// Session id used as the SOAP `SessionHeader`.
    pub session_id: String,
    /// Full Partner API server URL returned by the login call.
    pub server_url: String,
    /// Origin of `server_url` (scheme, host and port).
    pub instance_url: String,
    /// Id of the authenticated user, when reported.
    pub user_id: Option<String>,
    /// Id of the organization, when reported.
    pub organization_id: Option<String>,
}

impl std::fmt::Debug for LoginResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResult")
            .field("session_id", &"[REDACTED]")
            .field("server_url", &self.server_url)
            .field("instance_url", &self.instance_url)
            .field("user_id", &self.user_id)
            .field("organization_id", &self.organization_id)
            .finish()
    }
}

/// Client for the Partner API `login` call.
#[derive(Debug, Clone)]
pub struct SoapLoginClient {
    http: SfHttpClient,
    login_url: String,
    api_version: String,
}

impl SoapLoginClient {
    /// Create a login client against the given login host.
    pub fn new(login_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: SfHttpClient::new(ClientConfig::default())?,
            login_url: login_url.into().trim_end_matches('/').to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        })
    }

    /// Set the API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Set a custom HTTP client.
    pub fn with_http_client(mut self, client: SfHttpClient) -> Self {
        self.http = client;
        self
    }

    /// API version sessions from this client are opened with.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Partner API endpoint.
    pub(crate) fn login_endpoint(&self) -> String {
        format!("{}/services/Soap/u/{}", self.login_url, self.api_version)
    }

    /// Log in with username and password.
    ///
    /// The security token, when present, is appended to the password.
    #[instrument(skip(self, credentials), fields(username = %credentials.username()))]
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResult> {
        credentials.validate()?;

        let envelope = login_envelope(credentials);
        let response = self
            .http
            .post_soap(&self.login_endpoint(), "login", envelope)
            .await?;

        if !response.is_success() {
            return Err(match soap::parse_fault(&response.body) {
                Some(fault) => {
                    warn!(code = %fault.fault_code, "Login rejected");
                    Error::new(ErrorKind::LoginFailed {
                        code: fault.fault_code,
                        message: fault.fault_string,
                    })
                }
                None => Error::new(ErrorKind::Http(response.error_snippet())),
            });
        }

        let session_id = soap::extract_element(&response.body, "sessionId")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                Error::new(ErrorKind::UnexpectedResponse("missing sessionId".to_string()))
            })?;
        let server_url = soap::extract_element(&response.body, "serverUrl").ok_or_else(|| {
            Error::new(ErrorKind::UnexpectedResponse("missing serverUrl".to_string()))
        })?;
        let instance_url = url::Url::parse(&server_url)?.origin().ascii_serialization();

        info!(instance_url = %instance_url, "Login succeeded");

        Ok(LoginResult {
            session_id,
            server_url,
            instance_url,
            user_id: soap::extract_element(&response.body, "userId"),
            organization_id: soap::extract_element(&response.body, "organizationId"),
        })
    }
}

fn login_envelope(credentials: &Credentials) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<env:Envelope xmlns:xsd="http://www.w3.org/2001/XMLSchema"
    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
    xmlns:env="http://schemas.xmlsoap.org/soap/envelope/"
    xmlns:urn="urn:partner.soap.sforce.com">
  <env:Body>
    <urn:login>
      <urn:username>{}</urn:username>
      <urn:password>{}{}</urn:password>
    </urn:login>
  </env:Body>
</env:Envelope>"#,
        xml::escape(credentials.username()),
        xml::escape(credentials.password()),
        xml::escape(credentials.security_token())
    )
}
