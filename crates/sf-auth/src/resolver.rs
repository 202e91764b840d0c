//! Credential source selection and session establishment.

use std::time::Duration;

use reqwest::header::HeaderMap;
use tracing::{debug, instrument, warn};

use crate::connection::ConnectionHandle;
use crate::credentials::Credentials;
use crate::crypto::{decrypt_credentials, EncryptionKey};
use crate::error::{Error, ErrorKind, Result};
use crate::login::SoapLoginClient;

/// Header carrying an encrypted credential blob.
pub const ENCRYPTED_CREDENTIALS_HEADER: &str = "x-salesforce-encrypted-credentials";

/// Header carrying plain JSON credentials.
pub const CREDENTIALS_HEADER: &str = "x-salesforce-credentials";

/// Upper bound on selecting credentials and logging in.
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(15);

/// Where the credentials for an invocation came from, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialSource {
    /// Encrypted blob passed as a call argument.
    ExplicitEncrypted,
    /// Plain credentials object passed as a call argument.
    ExplicitPlain,
    /// `X-Salesforce-Encrypted-Credentials` header.
    EncryptedHeader,
    /// `X-Salesforce-Credentials` header.
    PlainHeader,
    /// `USERNAME` / `PASSWORD` / `SECURITY_TOKEN` environment variables.
    Environment,
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CredentialSource::ExplicitEncrypted => "explicit encrypted credentials",
            CredentialSource::ExplicitPlain => "explicit credentials",
            CredentialSource::EncryptedHeader => "encrypted credentials header",
            CredentialSource::PlainHeader => "credentials header",
            CredentialSource::Environment => "environment",
        };
        f.write_str(name)
    }
}

/// Snapshot of the server-wide credential variables.
///
/// Captured once at startup and passed in, so resolution never reads
/// process state on its own.
#[derive(Clone, Default)]
pub struct Environment {
    username: Option<String>,
    password: Option<String>,
    security_token: Option<String>,
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field(
                "security_token",
                &self.security_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Environment {
    /// Read `USERNAME`, `PASSWORD` and `SECURITY_TOKEN` from the process.
    pub fn from_process() -> Self {
        Self::from_pairs(
            ["USERNAME", "PASSWORD", "SECURITY_TOKEN"]
                .into_iter()
                .filter_map(|key| std::env::var(key).ok().map(|value| (key, value))),
        )
    }

    /// Build from explicit key/value pairs. Unknown keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut env = Self::default();
        for (key, value) in pairs {
            match key.as_ref() {
                "USERNAME" => env.username = Some(value.into()),
                "PASSWORD" => env.password = Some(value.into()),
                "SECURITY_TOKEN" => env.security_token = Some(value.into()),
                _ => {}
            }
        }
        env
    }

    fn credentials(&self) -> Credentials {
        Credentials::new(
            self.username.clone().unwrap_or_default(),
            self.password.clone().unwrap_or_default(),
            self.security_token.clone().unwrap_or_default(),
        )
    }
}

/// Credential inputs carried by one invocation.
#[derive(Clone, Default)]
pub struct CredentialRequest {
    /// `_sf_encrypted_credentials` call argument.
    pub explicit_encrypted: Option<String>,
    /// `_sf_credentials` call argument.
    pub explicit_plain: Option<serde_json::Value>,
    /// Request headers.
    pub headers: HeaderMap,
}

impl std::fmt::Debug for CredentialRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRequest")
            .field("source", &self.source())
            .field("headers", &self.headers.len())
            .finish()
    }
}

impl CredentialRequest {
    /// Create an empty request; resolution will use the environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an explicit encrypted blob.
    pub fn with_explicit_encrypted(mut self, blob: impl Into<String>) -> Self {
        self.explicit_encrypted = Some(blob.into());
        self
    }

    /// Attach an explicit plain credentials object.
    pub fn with_explicit_plain(mut self, credentials: serde_json::Value) -> Self {
        self.explicit_plain = Some(credentials);
        self
    }

    /// Attach request headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// The highest-priority source present in this request.
    ///
    /// Empty values count as absent. With nothing present the environment is
    /// used, including when headers exist but neither credential header does.
    pub fn source(&self) -> CredentialSource {
        if self
            .explicit_encrypted
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
        {
            CredentialSource::ExplicitEncrypted
        } else if self.explicit_plain.as_ref().is_some_and(is_present) {
            CredentialSource::ExplicitPlain
        } else if self.header_present(ENCRYPTED_CREDENTIALS_HEADER) {
            CredentialSource::EncryptedHeader
        } else if self.header_present(CREDENTIALS_HEADER) {
            CredentialSource::PlainHeader
        } else {
            CredentialSource::Environment
        }
    }

    fn header_present(&self, name: &str) -> bool {
        self.headers
            .get(name)
            .is_some_and(|v| !v.as_bytes().iter().all(u8::is_ascii_whitespace))
    }

    fn header_str(&self, name: &str) -> Result<&str> {
        self.headers
            .get(name)
            .map(|v| v.to_str())
            .transpose()
            .map_err(|e| {
                Error::with_source(
                    ErrorKind::InvalidCredentials(format!("{} header is not valid text", name)),
                    e,
                )
            })
            .map(Option::unwrap_or_default)
    }
}

fn is_present(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::String(s) => !s.trim().is_empty(),
        serde_json::Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

/// Picks the credential source for a call and opens a session with it.
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    login: SoapLoginClient,
    key: Option<EncryptionKey>,
    environment: Environment,
    timeout: Duration,
}

impl CredentialResolver {
    /// Create a resolver with no encryption key and the default timeout.
    pub fn new(login: SoapLoginClient, environment: Environment) -> Self {
        Self {
            login,
            key: None,
            environment,
            timeout: DEFAULT_RESOLVE_TIMEOUT,
        }
    }

    /// Set the key used for encrypted sources.
    pub fn with_encryption_key(mut self, key: Option<EncryptionKey>) -> Self {
        self.key = key;
        self
    }

    /// Set the overall resolution timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Select the source and produce validated credentials, without any I/O.
    ///
    /// Only the chosen source is inspected; a failure here is never followed
    /// by a lower-priority source.
    pub fn select(&self, request: &CredentialRequest) -> Result<(CredentialSource, Credentials)> {
        let source = request.source();

        let credentials = match source {
            CredentialSource::ExplicitEncrypted => {
                let blob = request.explicit_encrypted.as_deref().unwrap_or_default();
                self.decrypt(blob)?
            }
            CredentialSource::ExplicitPlain => match request.explicit_plain.clone() {
                Some(serde_json::Value::String(json)) => Credentials::from_json(&json)?,
                Some(value) => Credentials::from_value(value)?,
                None => Credentials::new("", "", ""),
            },
            CredentialSource::EncryptedHeader => {
                self.decrypt(request.header_str(ENCRYPTED_CREDENTIALS_HEADER)?)?
            }
            CredentialSource::PlainHeader => {
                Credentials::from_json(request.header_str(CREDENTIALS_HEADER)?)?
            }
            CredentialSource::Environment => {
                if !request.headers.is_empty() {
                    warn!("Request headers carry no credentials; falling back to environment");
                }
                self.environment.credentials()
            }
        };

        credentials.validate()?;
        debug!(%source, "Credentials selected");
        Ok((source, credentials))
    }

    /// Resolve credentials and log in, bounded by the configured timeout.
    #[instrument(skip_all, fields(source = %request.source()))]
    pub async fn resolve(&self, request: &CredentialRequest) -> Result<ConnectionHandle> {
        let attempt = async {
            let (source, credentials) = self.select(request)?;
            let login = self.login.login(&credentials).await?;
            Ok(ConnectionHandle::from_login(
                login,
                &credentials,
                self.login.api_version(),
                source,
            ))
        };

        match tokio::time::timeout(self.timeout, attempt).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout = ?self.timeout, "Credential resolution timed out");
                Err(Error::new(ErrorKind::Timeout(self.timeout)))
            }
        }
    }

    fn decrypt(&self, blob: &str) -> Result<Credentials> {
        let key = self.key.as_ref().ok_or_else(|| Error::new(ErrorKind::MissingKey))?;
        decrypt_credentials(blob, key)
    }
}
