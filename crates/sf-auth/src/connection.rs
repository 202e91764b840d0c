//! Per-invocation authenticated session.

use std::collections::HashMap;

use crate::credentials::Credentials;
use crate::login::LoginResult;
use crate::resolver::CredentialSource;

/// Trait for an authenticated Salesforce session.
pub trait Session: Send + Sync {
    /// Instance origin, e.g. `https://acme.my.salesforce.com`.
    fn instance_url(&self) -> &str;

    /// Session id sent in the SOAP `SessionHeader`.
    fn session_id(&self) -> &str;

    /// API version (e.g., "63.0").
    fn api_version(&self) -> &str;

    /// Returns true if the session appears to be valid (non-empty).
    fn is_valid(&self) -> bool {
        !self.instance_url().is_empty() && !self.session_id().is_empty()
    }
}

/// An authenticated session scoped to one tool invocation.
///
/// Holds a cache of object field descriptions keyed by object API name.
/// The cache has no expiry and is never shared between handles.
pub struct ConnectionHandle {
    session_id: String,
    instance_url: String,
    api_version: String,
    username: String,
    source: CredentialSource,
    object_fields: HashMap<String, serde_json::Value>,
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("session_id", &"[REDACTED]")
            .field("instance_url", &self.instance_url)
            .field("api_version", &self.api_version)
            .field("username", &self.username)
            .field("source", &self.source)
            .field("cached_objects", &self.object_fields.len())
            .finish()
    }
}

impl ConnectionHandle {
    /// Create a handle from raw session parts.
    pub fn new(
        session_id: impl Into<String>,
        instance_url: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            instance_url: instance_url.into().trim_end_matches('/').to_string(),
            api_version: api_version.into(),
            username: String::new(),
            source: CredentialSource::Environment,
            object_fields: HashMap::new(),
        }
    }

    pub(crate) fn from_login(
        login: LoginResult,
        credentials: &Credentials,
        api_version: &str,
        source: CredentialSource,
    ) -> Self {
        let mut handle = Self::new(login.session_id, login.instance_url, api_version);
        handle.username = credentials.username().to_string();
        handle.source = source;
        handle
    }

    /// Username the session was opened for.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Credential source that produced this session.
    pub fn source(&self) -> CredentialSource {
        self.source
    }

    /// Cached field description for an object, if already loaded.
    pub fn cached_fields(&self, object_name: &str) -> Option<&serde_json::Value> {
        self.object_fields.get(object_name)
    }

    /// Store the field description for an object.
    pub fn cache_fields(&mut self, object_name: impl Into<String>, fields: serde_json::Value) {
        self.object_fields.insert(object_name.into(), fields);
    }

    /// Return the cached description, loading it with `load` on first access.
    pub fn fields_or_insert_with<F>(&mut self, object_name: &str, load: F) -> &serde_json::Value
    where
        F: FnOnce() -> serde_json::Value,
    {
        self.object_fields
            .entry(object_name.to_string())
            .or_insert_with(load)
    }
}

impl Session for ConnectionHandle {
    fn instance_url(&self) -> &str {
        &self.instance_url
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }

    fn api_version(&self) -> &str {
        &self.api_version
    }
}
