use busbar_sf_client::security::xml;
use serde::{Deserialize, Serialize};

use super::{optional_element, require_all, validate_api_name, PackageContent};
use crate::error::Result;
use crate::package::PackageDescriptor;

fn default_active() -> bool {
    true
}

/// A validation rule on an existing object.
///
/// Deployed as a partial object file that only carries `validationRules`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRuleRequest {
    #[serde(default)]
    pub object_name: String,
    #[serde(default)]
    pub rule_name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_condition_formula: String,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub error_display_field: Option<String>,
}

impl PackageContent for ValidationRuleRequest {
    fn validate(&self) -> Result<()> {
        require_all(&[
            ("object_name", &self.object_name),
            ("rule_name", &self.rule_name),
            ("error_condition_formula", &self.error_condition_formula),
            ("error_message", &self.error_message),
        ])?;
        validate_api_name("object_name", &self.object_name)?;
        validate_api_name("rule_name", &self.rule_name)?;
        if let Some(field) = self.error_display_field.as_deref().filter(|f| !f.is_empty()) {
            validate_api_name("error_display_field", field)?;
        }
        Ok(())
    }

    fn write(&self, package: &mut PackageDescriptor) -> Result<()> {
        package.write_skeleton(&[
            ("object_name", self.object_name.clone()),
            ("rule_name", xml::escape(&self.rule_name)),
            ("active", self.active.to_string()),
            (
                "description",
                optional_element(8, "description", self.description.as_deref()),
            ),
            (
                "error_condition_formula",
                xml::escape(&self.error_condition_formula),
            ),
            (
                "error_display_field",
                optional_element(8, "errorDisplayField", self.error_display_field.as_deref()),
            ),
            ("error_message", xml::escape(&self.error_message)),
        ])?;

        package.manifest_mut().add(
            "ValidationRule",
            format!("{}.{}", self.object_name, self.rule_name),
        );
        Ok(())
    }
}
