//! Custom field specifications and their metadata XML.

use busbar_sf_client::security::xml;
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind, Result};
use crate::templates::{render, FIELD_TEMPLATE};

/// Field data type.
///
/// Unrecognized type names map to [`FieldType::Number`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Text,
    Url,
    Checkbox,
    Lookup,
    Picklist,
    Number,
}

impl From<String> for FieldType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Text" => FieldType::Text,
            "URL" | "Url" => FieldType::Url,
            "Checkbox" => FieldType::Checkbox,
            "Lookup" => FieldType::Lookup,
            "Picklist" => FieldType::Picklist,
            _ => FieldType::Number,
        }
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        match value {
            FieldType::Text => "Text",
            FieldType::Url => "URL",
            FieldType::Checkbox => "Checkbox",
            FieldType::Lookup => "Lookup",
            FieldType::Picklist => "Picklist",
            FieldType::Number => "Number",
        }
        .to_string()
    }
}

/// A custom field to create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub label: String,
    pub api_name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, alias = "defaultValue", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    #[serde(default, alias = "referenceTo", skip_serializing_if = "Option::is_none")]
    pub reference_to: Option<String>,
    #[serde(default, alias = "relationshipLabel", skip_serializing_if = "Option::is_none")]
    pub relationship_label: Option<String>,
    #[serde(default, alias = "relationshipName", skip_serializing_if = "Option::is_none")]
    pub relationship_name: Option<String>,
    #[serde(default, alias = "picklistValues", skip_serializing_if = "Option::is_none")]
    pub picklist_values: Option<Vec<String>>,
}

impl FieldSpec {
    pub fn new(label: impl Into<String>, api_name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            label: label.into(),
            api_name: api_name.into(),
            field_type,
            default_value: None,
            reference_to: None,
            relationship_label: None,
            relationship_name: None,
            picklist_values: None,
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> Error {
        Error::new(ErrorKind::InvalidField {
            field: self.api_name.clone(),
            reason: reason.into(),
        })
    }

    /// Check the parts each field type requires.
    pub fn validate(&self) -> Result<()> {
        if self.api_name.trim().is_empty() {
            return Err(self.invalid("api_name is required"));
        }
        if !self
            .api_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(self.invalid("api_name may only contain letters, digits and underscores"));
        }
        if self.label.trim().is_empty() {
            return Err(self.invalid("label is required"));
        }

        match self.field_type {
            FieldType::Lookup => {
                if self.reference_to.as_deref().is_none_or(|r| r.trim().is_empty()) {
                    return Err(self.invalid("Lookup fields require referenceTo"));
                }
            }
            FieldType::Picklist => {
                let has_values = self
                    .picklist_values
                    .as_ref()
                    .is_some_and(|values| values.iter().any(|v| !v.trim().is_empty()));
                if !has_values {
                    return Err(self.invalid("Picklist fields require at least one value"));
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Lower-cased checkbox default. Anything missing reads as `false`.
    fn checkbox_default(&self) -> String {
        match &self.default_value {
            Some(serde_json::Value::Bool(b)) => b.to_string(),
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s.trim().to_lowercase(),
            _ => "false".to_string(),
        }
    }

    /// Type-specific elements, indented for a `<fields>` block.
    fn type_xml(&self) -> String {
        const INDENT: &str = "        ";
        let mut lines: Vec<String> = Vec::new();

        match self.field_type {
            FieldType::Text => {
                lines.push("<length>100</length>".to_string());
                lines.push("<type>Text</type>".to_string());
            }
            FieldType::Url => lines.push("<type>Url</type>".to_string()),
            FieldType::Checkbox => {
                lines.push(format!(
                    "<defaultValue>{}</defaultValue>",
                    xml::escape(&self.checkbox_default())
                ));
                lines.push("<type>Checkbox</type>".to_string());
            }
            FieldType::Lookup => {
                if let Some(reference) = &self.reference_to {
                    lines.push(format!("<referenceTo>{}</referenceTo>", xml::escape(reference)));
                }
                if let Some(label) = self.relationship_label.as_deref().filter(|s| !s.is_empty()) {
                    lines.push(format!(
                        "<relationshipLabel>{}</relationshipLabel>",
                        xml::escape(label)
                    ));
                }
                if let Some(name) = self.relationship_name.as_deref().filter(|s| !s.is_empty()) {
                    lines.push(format!(
                        "<relationshipName>{}</relationshipName>",
                        xml::escape(name)
                    ));
                }
                lines.push("<type>Lookup</type>".to_string());
            }
            FieldType::Picklist => {
                lines.push("<type>Picklist</type>".to_string());
                lines.push("<valueSet>".to_string());
                lines.push("    <restricted>true</restricted>".to_string());
                lines.push("    <valueSetDefinition>".to_string());
                lines.push("        <sorted>false</sorted>".to_string());
                for value in self.picklist_values.iter().flatten() {
                    let value = value.trim();
                    if value.is_empty() {
                        continue;
                    }
                    let escaped = xml::escape(value);
                    lines.push("        <value>".to_string());
                    lines.push(format!("            <fullName>{}</fullName>", escaped));
                    lines.push("            <default>false</default>".to_string());
                    lines.push(format!("            <label>{}</label>", escaped));
                    lines.push("        </value>".to_string());
                }
                lines.push("    </valueSetDefinition>".to_string());
                lines.push("</valueSet>".to_string());
            }
            FieldType::Number => {
                lines.push("<precision>18</precision>".to_string());
                lines.push("<scale>0</scale>".to_string());
                lines.push("<type>Number</type>".to_string());
            }
        }

        lines
            .iter()
            .map(|line| format!("{INDENT}{line}\n"))
            .collect()
    }

    /// Render the `<fields>` element.
    ///
    /// `manageability` is set for custom metadata type fields.
    pub fn to_xml(&self, manageability: Option<&str>) -> Result<String> {
        self.validate()?;
        let manageability = manageability
            .map(|m| {
                format!(
                    "        <fieldManageability>{}</fieldManageability>\n",
                    xml::escape(m)
                )
            })
            .unwrap_or_default();

        Ok(render(
            FIELD_TEMPLATE,
            &[
                ("api_name", xml::escape(&self.api_name)),
                ("name", xml::escape(&self.label)),
                ("manageability", manageability),
                ("type", self.type_xml()),
            ],
        ))
    }
}

/// Render a list of fields, one `<fields>` block each.
pub fn fields_xml(fields: &[FieldSpec], manageability: Option<&str>) -> Result<String> {
    fields
        .iter()
        .map(|field| field.to_xml(manageability))
        .collect()
}
