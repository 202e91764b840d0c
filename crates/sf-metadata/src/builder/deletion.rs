use serde::{Deserialize, Serialize};

use super::{validate_api_name, PackageContent};
use crate::error::{Error, ErrorKind, Result};
use crate::package::PackageDescriptor;

/// A field to delete, given either as a bare name or as `{"api_name": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldRef {
    Name(String),
    Spec { api_name: String },
}

impl FieldRef {
    pub fn api_name(&self) -> &str {
        match self {
            FieldRef::Name(name) => name,
            FieldRef::Spec { api_name } => api_name,
        }
    }
}

/// Delete custom fields from an object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDeletionRequest {
    /// Object the fields belong to.
    #[serde(alias = "object_name")]
    pub api_name: String,
    pub fields: Vec<FieldRef>,
}

impl PackageContent for FieldDeletionRequest {
    fn validate(&self) -> Result<()> {
        validate_api_name("api_name", &self.api_name)?;
        if self.fields.is_empty() {
            return Err(Error::new(ErrorKind::InvalidPayload(
                "fields must list at least one field".to_string(),
            )));
        }
        for field in &self.fields {
            validate_api_name("field api_name", field.api_name())?;
        }
        Ok(())
    }

    fn write(&self, package: &mut PackageDescriptor) -> Result<()> {
        let destructive = package.destructive_manifest_mut();
        for field in &self.fields {
            destructive.add(
                "CustomField",
                format!("{}.{}", self.api_name, field.api_name()),
            );
        }
        Ok(())
    }
}
