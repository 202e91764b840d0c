//! Service configuration from the process environment.

use std::time::Duration;

use busbar_sf_auth::{EncryptionKey, Environment, PRODUCTION_LOGIN_URL};
use busbar_sf_client::DEFAULT_API_VERSION;

use crate::error::ToolError;
use crate::tools::ToolKind;

pub const ENCRYPTION_KEY_VAR: &str = "ENCRYPTION_KEY";
pub const LOGIN_URL_VAR: &str = "SF_LOGIN_URL";
pub const API_VERSION_VAR: &str = "SF_API_VERSION";
pub const CONNECT_TIMEOUT_VAR: &str = "SF_CONNECT_TIMEOUT_SECS";
pub const ENABLED_TOOLS_VAR: &str = "SF_ENABLED_TOOLS";

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 15;

/// Everything the service reads from its environment, captured once at
/// startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub encryption_key: Option<EncryptionKey>,
    pub login_url: String,
    pub api_version: String,
    pub connect_timeout: Duration,
    /// `None` enables every tool.
    pub enabled_tools: Option<Vec<ToolKind>>,
    pub environment: Environment,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            encryption_key: None,
            login_url: PRODUCTION_LOGIN_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            enabled_tools: None,
            environment: Environment::default(),
        }
    }
}

impl ServiceConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ToolError> {
        Self::from_lookup(|name| std::env::var(name).ok(), Environment::from_process())
    }

    /// Read the configuration through `lookup`.
    pub fn from_lookup<F>(lookup: F, environment: Environment) -> Result<Self, ToolError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let encryption_key = get(ENCRYPTION_KEY_VAR)
            .map(|encoded| EncryptionKey::from_base64(&encoded))
            .transpose()
            .map_err(|e| ToolError::Config(format!("{}: {}", ENCRYPTION_KEY_VAR, e)))?;

        let connect_timeout = match get(CONNECT_TIMEOUT_VAR) {
            Some(secs) => secs.trim().parse::<u64>().map(Duration::from_secs).map_err(|_| {
                ToolError::Config(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    CONNECT_TIMEOUT_VAR, secs
                ))
            })?,
            None => Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        let enabled_tools = get(ENABLED_TOOLS_VAR)
            .map(|list| parse_tool_list(&list))
            .transpose()?;

        Ok(Self {
            encryption_key,
            login_url: get(LOGIN_URL_VAR).unwrap_or_else(|| PRODUCTION_LOGIN_URL.to_string()),
            api_version: get(API_VERSION_VAR).unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            connect_timeout,
            enabled_tools,
            environment,
        })
    }
}

/// Parse a comma separated list of tool names. Unknown names are an error.
fn parse_tool_list(list: &str) -> Result<Vec<ToolKind>, ToolError> {
    let mut tools = Vec::new();
    for name in list.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        let kind = ToolKind::from_name(name).ok_or_else(|| {
            ToolError::Config(format!("{} names unknown tool '{}'", ENABLED_TOOLS_VAR, name))
        })?;
        if !tools.contains(&kind) {
            tools.push(kind);
        }
    }
    Ok(tools)
}
