//! Tool definitions and the registry that dispatches calls to them.

use std::collections::HashMap;

use busbar_sf_auth::CredentialRequest;
use busbar_sf_metadata::TemplateFamily;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::error::ToolError;

mod registry;

pub use registry::ToolRegistry;

/// Call argument carrying an encrypted credential blob.
pub const ENCRYPTED_CREDENTIALS_ARG: &str = "_sf_encrypted_credentials";

/// Call argument carrying a plain credentials object.
pub const CREDENTIALS_ARG: &str = "_sf_credentials";

/// Every tool this service exposes. Each one builds and deploys one
/// template family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    CreateObject,
    CreateObjectWithFields,
    DeleteObjectFields,
    CreateTab,
    CreateCustomApp,
    CreateValidationRule,
    CreateCustomMetadataType,
    CreateReport,
    CreateReportFolder,
    CreateDashboardFolder,
}

impl ToolKind {
    pub const ALL: [ToolKind; 10] = [
        ToolKind::CreateObject,
        ToolKind::CreateObjectWithFields,
        ToolKind::DeleteObjectFields,
        ToolKind::CreateTab,
        ToolKind::CreateCustomApp,
        ToolKind::CreateValidationRule,
        ToolKind::CreateCustomMetadataType,
        ToolKind::CreateReport,
        ToolKind::CreateReportFolder,
        ToolKind::CreateDashboardFolder,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::CreateObject => "create_object",
            ToolKind::CreateObjectWithFields => "create_object_with_fields",
            ToolKind::DeleteObjectFields => "delete_object_fields",
            ToolKind::CreateTab => "create_tab",
            ToolKind::CreateCustomApp => "create_custom_app",
            ToolKind::CreateValidationRule => "create_validation_rule",
            ToolKind::CreateCustomMetadataType => "create_custom_metadata_type",
            ToolKind::CreateReport => "create_report",
            ToolKind::CreateReportFolder => "create_report_folder",
            ToolKind::CreateDashboardFolder => "create_dashboard_folder",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolKind::CreateObject => "Create a custom object",
            ToolKind::CreateObjectWithFields => {
                "Create a custom object with fields and grant the Admin profile access to them"
            }
            ToolKind::DeleteObjectFields => "Delete custom fields from an object",
            ToolKind::CreateTab => "Create a custom tab for an object, Visualforce page or URL",
            ToolKind::CreateCustomApp => "Create a Lightning application",
            ToolKind::CreateValidationRule => "Create a validation rule on an object",
            ToolKind::CreateCustomMetadataType => "Create a custom metadata type with fields",
            ToolKind::CreateReport => "Create a report in an existing report folder",
            ToolKind::CreateReportFolder => "Create a report folder",
            ToolKind::CreateDashboardFolder => "Create a dashboard folder",
        }
    }

    /// The package family this tool builds.
    pub fn family(&self) -> TemplateFamily {
        match self {
            ToolKind::CreateObject => TemplateFamily::Object,
            ToolKind::CreateObjectWithFields => TemplateFamily::ObjectWithFields,
            ToolKind::DeleteObjectFields => TemplateFamily::FieldDeletion,
            ToolKind::CreateTab => TemplateFamily::Tab,
            ToolKind::CreateCustomApp => TemplateFamily::CustomApp,
            ToolKind::CreateValidationRule => TemplateFamily::ValidationRule,
            ToolKind::CreateCustomMetadataType => TemplateFamily::CustomMetadataType,
            ToolKind::CreateReport => TemplateFamily::Report,
            ToolKind::CreateReportFolder => TemplateFamily::ReportFolder,
            ToolKind::CreateDashboardFolder => TemplateFamily::DashboardFolder,
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Name and description of a tool, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
}

/// One tool invocation.
#[derive(Clone, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default = "empty_arguments")]
    pub arguments: serde_json::Value,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn empty_arguments() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl std::fmt::Debug for ToolCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut headers: Vec<&str> = self.headers.keys().map(String::as_str).collect();
        headers.sort_unstable();
        f.debug_struct("ToolCall")
            .field("name", &self.name)
            .field("headers", &headers)
            .finish_non_exhaustive()
    }
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            arguments,
            headers: HashMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Split the arguments into the change payload and the credential
    /// inputs carried with the call.
    pub fn split(&self) -> Result<(serde_json::Value, CredentialRequest), ToolError> {
        let mut payload = match &self.arguments {
            serde_json::Value::Object(map) => map.clone(),
            _ => {
                return Err(ToolError::InvalidParams(
                    "arguments must be a JSON object".to_string(),
                ))
            }
        };

        let mut request = CredentialRequest::new().with_headers(self.header_map()?);
        match payload.remove(ENCRYPTED_CREDENTIALS_ARG) {
            Some(serde_json::Value::String(blob)) => {
                request = request.with_explicit_encrypted(blob);
            }
            Some(serde_json::Value::Null) | None => {}
            Some(_) => {
                return Err(ToolError::InvalidParams(format!(
                    "{} must be a string",
                    ENCRYPTED_CREDENTIALS_ARG
                )))
            }
        }
        if let Some(plain) = payload.remove(CREDENTIALS_ARG) {
            request = request.with_explicit_plain(plain);
        }

        Ok((serde_json::Value::Object(payload), request))
    }

    fn header_map(&self) -> Result<HeaderMap, ToolError> {
        let mut map = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ToolError::InvalidParams(format!("invalid header name '{}'", name)))?;
            let value = HeaderValue::from_str(value).map_err(|_| {
                ToolError::InvalidParams(format!("invalid value for header '{}'", name))
            })?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

/// Result text of a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use busbar_sf_auth::CredentialSource;
    use serde_json::json;

    #[test]
    fn test_tool_names_round_trip() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
            assert!(!kind.description().is_empty());
        }
        assert_eq!(ToolKind::from_name("run_soql"), None);
        assert_eq!(
            ToolKind::DeleteObjectFields.family(),
            TemplateFamily::FieldDeletion
        );
    }

    #[test]
    fn test_split_removes_credential_arguments() {
        let call = ToolCall::new(
            "create_tab",
            json!({
                "tab_api_name": "Docs",
                "_sf_encrypted_credentials": "blob",
                "_sf_credentials": {"username": "u", "password": "p"}
            }),
        );
        let (payload, request) = call.split().unwrap();
        assert_eq!(payload, json!({"tab_api_name": "Docs"}));
        assert_eq!(request.source(), CredentialSource::ExplicitEncrypted);
    }

    #[test]
    fn test_split_reads_headers() {
        let call = ToolCall::new("create_tab", json!({}))
            .with_header("X-Salesforce-Credentials", r#"{"username":"u","password":"p"}"#);
        let (_, request) = call.split().unwrap();
        assert_eq!(request.source(), CredentialSource::PlainHeader);
    }

    #[test]
    fn test_split_rejects_bad_input() {
        assert!(matches!(
            ToolCall::new("create_tab", json!("text")).split(),
            Err(ToolError::InvalidParams(_))
        ));
        assert!(matches!(
            ToolCall::new("create_tab", json!({"_sf_encrypted_credentials": 7})).split(),
            Err(ToolError::InvalidParams(_))
        ));
        assert!(matches!(
            ToolCall::new("create_tab", json!({}))
                .with_header("bad header", "x")
                .split(),
            Err(ToolError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_call_parses_without_arguments() {
        let call: ToolCall = serde_json::from_str(r#"{"name": "create_tab"}"#).unwrap();
        assert_eq!(call.arguments, json!({}));
        assert!(call.headers.is_empty());
    }
}
