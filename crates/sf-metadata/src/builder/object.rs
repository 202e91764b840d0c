use std::collections::HashSet;

use busbar_sf_client::security::xml;
use serde::{Deserialize, Serialize};

use super::{require_all, validate_api_name, PackageContent};
use crate::error::{Error, ErrorKind, Result};
use crate::fields::{fields_xml, FieldSpec};
use crate::package::PackageDescriptor;

/// A custom object, optionally with fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectRequest {
    pub api_name: String,
    /// Singular label.
    #[serde(alias = "label")]
    pub name: String,
    pub plural_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl PackageContent for ObjectRequest {
    fn validate(&self) -> Result<()> {
        validate_api_name("api_name", &self.api_name)?;
        require_all(&[("name", &self.name), ("plural_name", &self.plural_name)])?;

        let mut seen = HashSet::new();
        for field in &self.fields {
            field.validate()?;
            if !seen.insert(field.api_name.as_str()) {
                return Err(Error::new(ErrorKind::InvalidField {
                    field: field.api_name.clone(),
                    reason: "listed more than once".to_string(),
                }));
            }
        }
        Ok(())
    }

    fn write(&self, package: &mut PackageDescriptor) -> Result<()> {
        package.write_skeleton(&[
            ("api_name", xml::escape(&self.api_name)),
            ("name", xml::escape(&self.name)),
            ("plural_name", xml::escape(&self.plural_name)),
            (
                "description",
                xml::escape(self.description.as_deref().unwrap_or_default()),
            ),
            ("fields", fields_xml(&self.fields, None)?),
        ])?;
        package.manifest_mut().add("CustomObject", &self.api_name);

        if !self.fields.is_empty() {
            package.update_profile(|profile| {
                for field in &self.fields {
                    profile.merge_field_permission(&self.api_name, &field.api_name)?;
                }
                Ok(())
            })?;
        }
        Ok(())
    }
}
