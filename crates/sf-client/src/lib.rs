//! # sf-client
//!
//! Core HTTP and SOAP plumbing shared by the Salesforce crates.
//!
//! This crate provides:
//! - [`SfHttpClient`], a thin reqwest wrapper that posts SOAP envelopes and
//!   hands back the raw status and body
//! - [`soap`] helpers for pulling values and faults out of SOAP responses
//! - [`security::xml`] escaping for any user text placed inside XML
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Application Layer                        │
//! │        (sf-auth SOAP login, sf-metadata deploy)             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SfHttpClient                             │
//! │  - Timeouts, user agent, compression                        │
//! │  - post_soap -> SoapResponse { status, body }               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Non-2xx responses are not errors at this layer. SOAP faults travel with
//! HTTP 500, so callers decide how to interpret the body.
//!
//! No retries are performed.

mod client;
mod config;
mod error;
pub mod security;
pub mod soap;

pub use client::{SfHttpClient, SoapResponse};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Error, ErrorKind, Result};
pub use soap::SoapFault;

/// Default Salesforce API version
pub const DEFAULT_API_VERSION: &str = "63.0";

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("busbar-sf-deploy/", env!("CARGO_PKG_VERSION"));
