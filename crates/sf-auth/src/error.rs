//! Error types for sf-auth.
//!
//! Error messages are designed to avoid exposing sensitive credential data.

use std::time::Duration;

/// Result type alias for sf-auth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sf-auth operations.
///
/// Error messages are sanitized to prevent accidental credential exposure.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// Returns true when the credentials themselves were missing, malformed
    /// or undecryptable. Everything else is a failure to open a session.
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::InvalidCredentials(_)
                | ErrorKind::Decryption(_)
                | ErrorKind::MissingKey
                | ErrorKind::InvalidKey(_)
        )
    }
}

/// The kind of error that occurred.
///
/// Error messages avoid including credential values.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Credentials are missing a required field or could not be parsed.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Encrypted credentials could not be decrypted.
    #[error("Could not decrypt credentials: {0}")]
    Decryption(String),

    /// Encrypted credentials were supplied but no key is configured.
    #[error("Encrypted credentials supplied but no encryption key is configured")]
    MissingKey,

    /// The configured encryption key is malformed.
    #[error("Invalid encryption key: {0}")]
    InvalidKey(String),

    /// The login call returned a SOAP fault.
    #[error("Login failed: {code} - {message}")]
    LoginFailed { code: String, message: String },

    /// The login response was not understood.
    #[error("Unexpected login response: {0}")]
    UnexpectedResponse(String),

    /// Resolution did not finish in time.
    #[error("Connection attempt timed out after {0:?}")]
    Timeout(Duration),

    /// HTTP error during authentication.
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::with_source(ErrorKind::Http(err.to_string()), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        // serde_json messages can quote input; keep only the position.
        let message = format!("malformed JSON at line {} column {}", err.line(), err.column());
        Error::with_source(ErrorKind::Json(message), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::UnexpectedResponse(format!("bad server URL: {}", err)), err)
    }
}

impl From<busbar_sf_client::Error> for Error {
    fn from(err: busbar_sf_client::Error) -> Self {
        let kind = match &err.kind {
            busbar_sf_client::ErrorKind::Config(message) => ErrorKind::Config(message.clone()),
            other => ErrorKind::Http(other.to_string()),
        };
        Error::with_source(kind, err)
    }
}
