//! Error types for the deploy service.

use busbar_sf_metadata::DeployResult;

/// Errors returned to the caller of a tool instead of a result text.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Arguments or credentials were missing or malformed.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// No tool with this name is registered or enabled.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Service configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Failure of one pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Credentials were missing, invalid or undecryptable.
    #[error("{0}")]
    Credential(#[source] busbar_sf_auth::Error),

    /// Login failed or timed out.
    #[error("Connection failed: {0}")]
    Connection(#[source] busbar_sf_auth::Error),

    /// The package could not be built or archived. Nothing was sent.
    #[error("Package build failed: {0}")]
    PackageBuild(#[source] busbar_sf_metadata::Error),

    /// The platform returned a fault, or the deploy request never completed.
    #[error("Deployment failed: {message}")]
    DeployFault {
        fault_code: Option<String>,
        message: String,
        http_status: Option<u16>,
    },

    /// A blocking build task panicked or was cancelled.
    #[error("Build task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl PipelineError {
    /// A rejected deploy response.
    pub fn from_rejected(result: &DeployResult) -> Self {
        PipelineError::DeployFault {
            fault_code: result.fault_code.clone(),
            message: result.summary(),
            http_status: Some(result.http_status),
        }
    }
}

impl From<busbar_sf_auth::Error> for PipelineError {
    fn from(err: busbar_sf_auth::Error) -> Self {
        if err.is_credential_error() {
            PipelineError::Credential(err)
        } else {
            PipelineError::Connection(err)
        }
    }
}

impl From<busbar_sf_metadata::Error> for PipelineError {
    fn from(err: busbar_sf_metadata::Error) -> Self {
        if err.is_build_error() {
            PipelineError::PackageBuild(err)
        } else {
            PipelineError::DeployFault {
                fault_code: None,
                message: err.to_string(),
                http_status: None,
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
