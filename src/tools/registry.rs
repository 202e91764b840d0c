//! Tool registry: lookup, argument parsing and dispatch to the pipeline.

use busbar_sf_metadata::{ChangeRequest, ErrorKind};
use tracing::{instrument, warn};

use super::{ToolCall, ToolDescriptor, ToolKind, ToolOutput};
use crate::config::ServiceConfig;
use crate::error::{PipelineError, ToolError};
use crate::pipeline::DeployPipeline;

/// Enabled tools and the pipeline they run on.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    pipeline: DeployPipeline,
    enabled: Vec<ToolKind>,
}

impl ToolRegistry {
    /// Create a registry with every tool enabled.
    pub fn new(pipeline: DeployPipeline) -> Self {
        Self {
            pipeline,
            enabled: ToolKind::ALL.to_vec(),
        }
    }

    /// Create a registry from service configuration. `SF_ENABLED_TOOLS`
    /// restricts the enabled tools.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ToolError> {
        let registry = Self::new(DeployPipeline::from_config(config)?);
        Ok(match &config.enabled_tools {
            Some(tools) => registry.with_enabled(tools.clone()),
            None => registry,
        })
    }

    pub fn with_enabled(mut self, tools: Vec<ToolKind>) -> Self {
        self.enabled = tools;
        self
    }

    /// Enabled tools in declaration order.
    pub fn tools(&self) -> Vec<ToolDescriptor> {
        ToolKind::ALL
            .into_iter()
            .filter(|kind| self.enabled.contains(kind))
            .map(|kind| ToolDescriptor {
                name: kind.name(),
                description: kind.description(),
            })
            .collect()
    }

    pub fn lookup(&self, name: &str) -> Result<ToolKind, ToolError> {
        ToolKind::from_name(name)
            .filter(|kind| self.enabled.contains(kind))
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    /// Run a tool call.
    ///
    /// Unknown tools, unparseable arguments and bad credentials are returned
    /// as errors. Everything that fails after that is reported in the
    /// output text with `is_error` set.
    #[instrument(skip_all, fields(tool = %call.name))]
    pub async fn call(&self, call: ToolCall) -> Result<ToolOutput, ToolError> {
        let kind = self.lookup(&call.name).inspect_err(|_| {
            warn!("Unknown tool requested");
        })?;
        let (payload, credentials) = call.split()?;

        let request = ChangeRequest::from_payload(kind.family(), payload).map_err(|e| match e.kind
        {
            ErrorKind::InvalidPayload(message) => ToolError::InvalidParams(message),
            other => ToolError::InvalidParams(other.to_string()),
        })?;
        let subject = request.subject();

        match self.pipeline.run(request, &credentials).await {
            Ok(outcome) => Ok(ToolOutput::success(outcome.message())),
            Err(PipelineError::Credential(err)) => Err(ToolError::InvalidParams(err.to_string())),
            Err(err) => {
                warn!(error = %err, "Tool call failed");
                Ok(ToolOutput::error(format!("Error deploying {}: {}", subject, err)))
            }
        }
    }
}
