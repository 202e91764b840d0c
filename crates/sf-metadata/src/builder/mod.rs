//! Package builders, one per template family.
//!
//! A builder turns a typed change request into a finished
//! [`PackageDescriptor`]: skeleton files rendered, profile entries merged,
//! manifests written and the placeholder check passed.

use busbar_sf_client::security::xml;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::error::{Error, ErrorKind, Result};
use crate::package::PackageDescriptor;
use crate::templates::TemplateFamily;

mod app;
mod deletion;
mod folder;
mod metadata_type;
mod object;
mod report;
mod tab;
mod validation_rule;

pub use app::AppRequest;
pub use deletion::{FieldDeletionRequest, FieldRef};
pub use folder::{FolderRequest, FolderShare};
pub use metadata_type::MetadataTypeRequest;
pub use object::ObjectRequest;
pub use report::{ReportFilter, ReportRequest};
pub use tab::{TabRequest, TabType};
pub use validation_rule::ValidationRuleRequest;

/// Writes one kind of change into a package.
pub(crate) trait PackageContent {
    /// Check the request before anything touches the filesystem.
    fn validate(&self) -> Result<()>;

    /// Render skeleton files and record manifest entries.
    fn write(&self, package: &mut PackageDescriptor) -> Result<()>;
}

/// A typed change request.
#[derive(Debug, Clone)]
pub enum ChangeRequest {
    Object(ObjectRequest),
    ObjectWithFields(ObjectRequest),
    FieldDeletion(FieldDeletionRequest),
    Tab(TabRequest),
    CustomApp(AppRequest),
    ValidationRule(ValidationRuleRequest),
    CustomMetadataType(MetadataTypeRequest),
    Report(ReportRequest),
    ReportFolder(FolderRequest),
    DashboardFolder(FolderRequest),
}

fn parse<T: DeserializeOwned>(payload: serde_json::Value) -> Result<T> {
    serde_json::from_value(payload)
        .map_err(|e| Error::with_source(ErrorKind::InvalidPayload(e.to_string()), e))
}

impl ChangeRequest {
    /// Parse a JSON payload into the request type for `family`.
    pub fn from_payload(family: TemplateFamily, payload: serde_json::Value) -> Result<Self> {
        if !payload.is_object() {
            return Err(Error::new(ErrorKind::InvalidPayload(
                "payload must be a JSON object".to_string(),
            )));
        }
        Ok(match family {
            TemplateFamily::Object => ChangeRequest::Object(parse(payload)?),
            TemplateFamily::ObjectWithFields => ChangeRequest::ObjectWithFields(parse(payload)?),
            TemplateFamily::FieldDeletion => ChangeRequest::FieldDeletion(parse(payload)?),
            TemplateFamily::Tab => ChangeRequest::Tab(parse(payload)?),
            TemplateFamily::CustomApp => ChangeRequest::CustomApp(parse(payload)?),
            TemplateFamily::ValidationRule => ChangeRequest::ValidationRule(parse(payload)?),
            TemplateFamily::CustomMetadataType => {
                ChangeRequest::CustomMetadataType(parse(payload)?)
            }
            TemplateFamily::Report => ChangeRequest::Report(parse(payload)?),
            TemplateFamily::ReportFolder => ChangeRequest::ReportFolder(parse(payload)?),
            TemplateFamily::DashboardFolder => ChangeRequest::DashboardFolder(parse(payload)?),
        })
    }

    pub fn family(&self) -> TemplateFamily {
        match self {
            ChangeRequest::Object(_) => TemplateFamily::Object,
            ChangeRequest::ObjectWithFields(_) => TemplateFamily::ObjectWithFields,
            ChangeRequest::FieldDeletion(_) => TemplateFamily::FieldDeletion,
            ChangeRequest::Tab(_) => TemplateFamily::Tab,
            ChangeRequest::CustomApp(_) => TemplateFamily::CustomApp,
            ChangeRequest::ValidationRule(_) => TemplateFamily::ValidationRule,
            ChangeRequest::CustomMetadataType(_) => TemplateFamily::CustomMetadataType,
            ChangeRequest::Report(_) => TemplateFamily::Report,
            ChangeRequest::ReportFolder(_) => TemplateFamily::ReportFolder,
            ChangeRequest::DashboardFolder(_) => TemplateFamily::DashboardFolder,
        }
    }

    /// Human-readable name of what the request changes.
    pub fn subject(&self) -> String {
        match self {
            ChangeRequest::Object(r) => format!("Custom Object '{}'", r.api_name),
            ChangeRequest::ObjectWithFields(r) => {
                format!("Custom Object '{}' with {} field(s)", r.api_name, r.fields.len())
            }
            ChangeRequest::FieldDeletion(r) => format!("Delete Object fields on '{}'", r.api_name),
            ChangeRequest::Tab(r) => format!("Custom Tab '{}'", r.tab_api_name),
            ChangeRequest::CustomApp(r) => format!("Custom Application '{}'", r.api_name),
            ChangeRequest::ValidationRule(r) => {
                format!("Validation Rule '{}' on '{}'", r.rule_name, r.object_name)
            }
            ChangeRequest::CustomMetadataType(r) => {
                format!("Custom Metadata Type '{}'", r.api_name)
            }
            ChangeRequest::Report(r) => format!("Report '{}'", r.member_name()),
            ChangeRequest::ReportFolder(r) => format!("Report folder '{}'", r.developer_name),
            ChangeRequest::DashboardFolder(r) => {
                format!("Dashboard folder '{}'", r.developer_name)
            }
        }
    }

    fn content(&self) -> &dyn PackageContent {
        match self {
            ChangeRequest::Object(r) | ChangeRequest::ObjectWithFields(r) => r,
            ChangeRequest::FieldDeletion(r) => r,
            ChangeRequest::Tab(r) => r,
            ChangeRequest::CustomApp(r) => r,
            ChangeRequest::ValidationRule(r) => r,
            ChangeRequest::CustomMetadataType(r) => r,
            ChangeRequest::Report(r) => r,
            ChangeRequest::ReportFolder(r) => r,
            ChangeRequest::DashboardFolder(r) => r,
        }
    }
}

/// Builds package directories for change requests.
#[derive(Debug, Clone)]
pub struct PackageBuilder {
    api_version: String,
}

impl PackageBuilder {
    pub fn new(api_version: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
        }
    }

    /// Parse `payload` for `family` and build its package.
    pub fn build(
        &self,
        family: TemplateFamily,
        payload: serde_json::Value,
    ) -> Result<PackageDescriptor> {
        let request = ChangeRequest::from_payload(family, payload)?;
        self.build_request(&request)
    }

    /// Build a package for an already parsed request.
    ///
    /// On any failure the partially written directory is removed.
    #[instrument(skip(self, request), fields(family = %request.family()))]
    pub fn build_request(&self, request: &ChangeRequest) -> Result<PackageDescriptor> {
        let content = request.content();
        content.validate()?;

        let mut package = PackageDescriptor::create(request.family(), &self.api_version)?;
        content.write(&mut package)?;
        package.finalize()?;

        debug!(
            path = %package.root().display(),
            members = package.manifest().entries().count(),
            "Package built"
        );
        Ok(package)
    }
}

/// API names are used as file names: letters, digits and underscores only.
pub(crate) fn validate_api_name(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::new(ErrorKind::InvalidPayload(format!(
            "{} is required",
            what
        ))));
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        || !xml::is_safe_file_name(value)
    {
        return Err(Error::new(ErrorKind::InvalidPayload(format!(
            "invalid {} '{}': use only letters, numbers, and underscores",
            what, value
        ))));
    }
    Ok(())
}

/// Collect the names of empty required values into one error.
pub(crate) fn require_all(values: &[(&str, &str)]) -> Result<()> {
    let missing: Vec<&str> = values
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::new(ErrorKind::InvalidPayload(format!(
            "missing required argument(s): {}",
            missing.join(", ")
        ))))
    }
}

/// `<name>value</name>` on its own line with escaped content.
pub(crate) fn element(indent: usize, name: &str, value: &str) -> String {
    format!(
        "{:indent$}<{name}>{}</{name}>\n",
        "",
        xml::escape(value),
        indent = indent,
        name = name
    )
}

/// Like [`element`], empty when `value` is missing or blank.
pub(crate) fn optional_element(indent: usize, name: &str, value: Option<&str>) -> String {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => element(indent, name, v),
        None => String::new(),
    }
}
