//! # busbar-sf-deploy
//!
//! Turn structured change requests into Salesforce metadata deployments.
//!
//! Each tool call carries (or falls back to) its own credentials, so the
//! service keeps no state between calls.
//!
//! ## Security
//!
//! - Passwords, security tokens and session ids are redacted in Debug output
//! - Tracing skips credential parameters
//! - Error messages never include credential values
//!
//! ## Crates
//!
//! - **busbar-sf-client** - HTTP core, SOAP helpers, XML escaping
//! - **busbar-sf-auth** - Credential resolution, encryption, SOAP login
//! - **busbar-sf-metadata** - Package builder, profile merge, packager, deploy
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use busbar_sf_deploy::{ServiceConfig, ToolCall, ToolRegistry};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = ToolRegistry::from_config(&ServiceConfig::from_env()?)?;
//!
//!     let output = registry
//!         .call(ToolCall::new(
//!             "create_report_folder",
//!             json!({"developer_name": "Finance", "folder_label": "Finance Reports"}),
//!         ))
//!         .await?;
//!
//!     println!("{}", output.text);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod tools;

pub use busbar_sf_auth as auth;
pub use busbar_sf_client as client;
pub use busbar_sf_metadata as metadata;

pub use config::ServiceConfig;
pub use error::{PipelineError, ToolError};
pub use pipeline::{DeployOutcome, DeployPipeline};
pub use tools::{ToolCall, ToolDescriptor, ToolKind, ToolOutput, ToolRegistry};
