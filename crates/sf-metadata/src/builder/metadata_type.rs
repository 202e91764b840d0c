use busbar_sf_client::security::xml;
use serde::{Deserialize, Serialize};

use super::{optional_element, require_all, validate_api_name, PackageContent};
use crate::error::{Error, ErrorKind, Result};
use crate::fields::{fields_xml, FieldSpec, FieldType};
use crate::package::PackageDescriptor;

const FIELD_MANAGEABILITY: &str = "DeveloperControl";

/// A custom metadata type (`__mdt`) with its fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataTypeRequest {
    #[serde(default)]
    pub api_name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub plural_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl PackageContent for MetadataTypeRequest {
    fn validate(&self) -> Result<()> {
        let fields_marker = if self.fields.is_empty() { "" } else { "present" };
        require_all(&[
            ("api_name", &self.api_name),
            ("label", &self.label),
            ("plural_name", &self.plural_name),
            ("fields", fields_marker),
        ])?;
        validate_api_name("api_name", &self.api_name)?;
        if !self.api_name.ends_with("__mdt") {
            return Err(Error::new(ErrorKind::InvalidPayload(format!(
                "custom metadata type api_name '{}' must end with __mdt",
                self.api_name
            ))));
        }

        for field in &self.fields {
            field.validate()?;
            if field.field_type == FieldType::Lookup {
                return Err(Error::new(ErrorKind::InvalidField {
                    field: field.api_name.clone(),
                    reason: "Lookup fields are not supported on custom metadata types"
                        .to_string(),
                }));
            }
        }
        Ok(())
    }

    fn write(&self, package: &mut PackageDescriptor) -> Result<()> {
        package.write_skeleton(&[
            ("api_name", self.api_name.clone()),
            (
                "description",
                optional_element(4, "description", self.description.as_deref()),
            ),
            ("fields", fields_xml(&self.fields, Some(FIELD_MANAGEABILITY))?),
            ("label", xml::escape(&self.label)),
            ("plural_name", xml::escape(&self.plural_name)),
        ])?;
        package.manifest_mut().add("CustomObject", &self.api_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::PackageBuilder;
    use crate::error::ErrorKind;
    use crate::templates::TemplateFamily;
    use serde_json::json;

    #[test]
    fn test_metadata_type_package() {
        let package = PackageBuilder::new("63.0")
            .build(
                TemplateFamily::CustomMetadataType,
                json!({
                    "api_name": "Billing_Setting__mdt",
                    "label": "Billing Setting",
                    "plural_name": "Billing Settings",
                    "fields": [
                        {"label": "Endpoint", "api_name": "Endpoint__c", "type": "URL"},
                        {"label": "Enabled", "api_name": "Enabled__c", "type": "Checkbox", "defaultValue": true}
                    ]
                }),
            )
            .unwrap();

        assert!(package
            .manifest()
            .contains("CustomObject", "Billing_Setting__mdt"));
        let object = package
            .read_file("objects/Billing_Setting__mdt.object")
            .unwrap()
            .unwrap();
        assert_eq!(
            object
                .matches("<fieldManageability>DeveloperControl</fieldManageability>")
                .count(),
            2
        );
        assert!(object.contains("<visibility>Public</visibility>"));
        assert!(object.contains("<defaultValue>true</defaultValue>"));
    }

    #[test]
    fn test_metadata_type_rules() {
        let builder = PackageBuilder::new("63.0");

        let err = builder
            .build(
                TemplateFamily::CustomMetadataType,
                json!({"api_name": "Setting__c", "label": "S", "plural_name": "S",
                       "fields": [{"label": "A", "api_name": "A__c", "type": "Text"}]}),
            )
            .unwrap_err();
        assert!(err.to_string().contains("__mdt"));

        let err = builder
            .build(
                TemplateFamily::CustomMetadataType,
                json!({"api_name": "Setting__mdt", "label": "S", "plural_name": "S",
                       "fields": [{"label": "A", "api_name": "A__c", "type": "Lookup", "referenceTo": "Account"}]}),
            )
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidField { .. }));

        let err = builder
            .build(
                TemplateFamily::CustomMetadataType,
                json!({"api_name": "Setting__mdt"}),
            )
            .unwrap_err();
        assert!(err.to_string().contains("label, plural_name, fields"));
    }
}
