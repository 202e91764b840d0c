//! # sf-auth
//!
//! Per-invocation Salesforce credential resolution.
//!
//! ## Security
//!
//! - Passwords, security tokens and session ids are redacted in Debug output
//! - Tracing skips credential parameters
//! - Error messages never include credential values
//! - Encrypted credentials use AES-256-GCM with a server-held key
//!
//! ## Credential sources
//!
//! Checked in this order, stopping at the first one present:
//!
//! 1. explicit encrypted credentials passed with the call
//! 2. explicit plain credentials passed with the call
//! 3. `X-Salesforce-Encrypted-Credentials` header
//! 4. `X-Salesforce-Credentials` header (JSON)
//! 5. `USERNAME` / `PASSWORD` / `SECURITY_TOKEN` from the environment
//!
//! ## Example
//!
//! ```rust,ignore
//! use busbar_sf_auth::{CredentialRequest, CredentialResolver, Environment, SoapLoginClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), busbar_sf_auth::Error> {
//!     let login = SoapLoginClient::new(busbar_sf_auth::PRODUCTION_LOGIN_URL)?;
//!     let resolver = CredentialResolver::new(login, Environment::from_process());
//!
//!     let handle = resolver.resolve(&CredentialRequest::default()).await?;
//!     println!("connected to {}", handle.instance_url());
//!     Ok(())
//! }
//! ```

mod connection;
mod credentials;
mod crypto;
mod error;
mod login;
mod resolver;

pub use connection::{ConnectionHandle, Session};
pub use credentials::Credentials;
pub use crypto::{decrypt_credentials, encrypt_credentials, EncryptionKey};
pub use error::{Error, ErrorKind, Result};
pub use login::{LoginResult, SoapLoginClient};
pub use resolver::{
    CredentialRequest, CredentialResolver, CredentialSource, Environment,
    CREDENTIALS_HEADER, DEFAULT_RESOLVE_TIMEOUT, ENCRYPTED_CREDENTIALS_HEADER,
};

/// Default Salesforce login URL for production.
pub const PRODUCTION_LOGIN_URL: &str = "https://login.salesforce.com";

/// Default Salesforce login URL for sandbox.
pub const SANDBOX_LOGIN_URL: &str = "https://test.salesforce.com";
