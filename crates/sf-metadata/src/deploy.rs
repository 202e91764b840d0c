//! Deploy options and results.

use serde::{Deserialize, Serialize};

/// Options sent with every deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOptions {
    /// Allow references to missing files in the zip.
    pub allow_missing_files: bool,
    /// Automatically update the package manifest.
    pub auto_update_package: bool,
    /// Validate only, don't actually deploy.
    pub check_only: bool,
    /// Ignore warnings during deployment.
    pub ignore_warnings: bool,
    /// Retrieve metadata after deploy.
    pub perform_retrieve: bool,
    /// Hard delete components (only in sandbox/DE orgs).
    pub purge_on_delete: bool,
    /// Rollback all changes if any component fails.
    pub rollback_on_error: bool,
    /// Deploy as a single package.
    pub single_package: bool,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            allow_missing_files: false,
            auto_update_package: false,
            check_only: false,
            ignore_warnings: false,
            perform_retrieve: false,
            purge_on_delete: false,
            rollback_on_error: true,
            single_package: true,
        }
    }
}

/// Outcome of a deploy submission.
///
/// `accepted` is true iff the HTTP status was below 400. Acceptance means
/// the platform queued the deploy, not that it succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployResult {
    pub accepted: bool,
    pub http_status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub async_process_id: Option<String>,
}

impl DeployResult {
    /// One-line description of the outcome.
    pub fn summary(&self) -> String {
        if self.accepted {
            match &self.async_process_id {
                Some(id) => format!(
                    "Deployment accepted (HTTP {}). Async process id: {}",
                    self.http_status, id
                ),
                None => format!("Deployment accepted (HTTP {})", self.http_status),
            }
        } else {
            match (&self.fault_code, &self.fault_message) {
                (Some(code), Some(message)) => format!("SOAP Fault: {} - {}", code, message),
                (_, Some(message)) => message.clone(),
                _ => format!("HTTP Error {}", self.http_status),
            }
        }
    }
}
