//! Username/password credentials.
//!
//! Debug output redacts the password and security token.

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::{Error, ErrorKind, Result};

/// Salesforce username/password credentials.
///
/// The security token may be empty for orgs that trust the caller's IP range.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default, alias = "securityToken")]
    security_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field(
                "security_token",
                &if self.security_token.is_empty() {
                    ""
                } else {
                    "[REDACTED]"
                },
            )
            .finish()
    }
}

impl Drop for Credentials {
    fn drop(&mut self) {
        self.password.zeroize();
        self.security_token.zeroize();
    }
}

impl Credentials {
    /// Create credentials from their parts.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        security_token: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            security_token: security_token.into(),
        }
    }

    /// Parse credentials from a JSON object.
    ///
    /// Accepts both `security_token` and `securityToken`.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json).map_err(|e| {
            Error::with_source(
                ErrorKind::InvalidCredentials("credentials are not valid JSON".to_string()),
                e,
            )
        })?;
        Self::from_value(value)
    }

    /// Build credentials from an already parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::new(ErrorKind::InvalidCredentials(
                "credentials must be a JSON object".to_string(),
            )));
        }
        serde_json::from_value(value).map_err(|e| {
            Error::with_source(
                ErrorKind::InvalidCredentials("credential fields must be strings".to_string()),
                e,
            )
        })
    }

    /// Username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Password.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Security token (possibly empty).
    pub fn security_token(&self) -> &str {
        &self.security_token
    }

    /// Require a username and password. The security token may be empty.
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(Error::new(ErrorKind::InvalidCredentials(
                "username is required".to_string(),
            )));
        }
        if self.password.is_empty() {
            return Err(Error::new(ErrorKind::InvalidCredentials(
                "password is required".to_string(),
            )));
        }
        Ok(())
    }
}
