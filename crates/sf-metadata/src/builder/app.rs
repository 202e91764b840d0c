use std::collections::HashSet;

use busbar_sf_client::security::xml;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{element, optional_element, require_all, validate_api_name, PackageContent};
use crate::error::{Error, ErrorKind, Result};
use crate::package::PackageDescriptor;

/// A Lightning application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppRequest {
    pub api_name: String,
    pub label: String,
    #[serde(default)]
    pub nav_type: Option<String>,
    pub tabs: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub header_color: Option<String>,
    #[serde(default)]
    pub form_factors: Option<Vec<String>>,
    #[serde(default)]
    pub setup_experience: Option<String>,
}

impl AppRequest {
    /// `Standard` or `Console`; anything else falls back to `Standard`.
    pub fn nav_type(&self) -> &str {
        match self.nav_type.as_deref() {
            Some("Console") => "Console",
            Some("Standard") | None => "Standard",
            Some(other) => {
                warn!(nav_type = other, "Unknown nav_type, using Standard");
                "Standard"
            }
        }
    }

    /// Subset of `Small`/`Large`; anything else falls back to both.
    pub fn form_factors(&self) -> Vec<&str> {
        let requested: Vec<&str> = self
            .form_factors
            .iter()
            .flatten()
            .map(String::as_str)
            .collect();
        let valid = !requested.is_empty()
            && requested.iter().all(|f| matches!(*f, "Small" | "Large"));
        if valid {
            let mut seen = HashSet::new();
            let mut factors = requested;
            factors.retain(|f| seen.insert(*f));
            factors
        } else {
            if !requested.is_empty() {
                warn!(?requested, "Invalid form_factors, using Small and Large");
            }
            vec!["Small", "Large"]
        }
    }

    /// `all` or `none`; anything else falls back to `all`.
    pub fn setup_experience(&self) -> &str {
        match self.setup_experience.as_deref() {
            Some("none") => "none",
            _ => "all",
        }
    }
}

impl PackageContent for AppRequest {
    fn validate(&self) -> Result<()> {
        validate_api_name("api_name", &self.api_name)?;
        require_all(&[("label", &self.label)])?;
        if self.tabs.iter().all(|t| t.trim().is_empty()) {
            return Err(Error::new(ErrorKind::InvalidPayload(
                "tabs must list at least one tab".to_string(),
            )));
        }
        Ok(())
    }

    fn write(&self, package: &mut PackageDescriptor) -> Result<()> {
        let brand = match self.header_color.as_deref().map(str::trim) {
            Some(color) if !color.is_empty() => format!(
                "    <brand>\n{}        <shouldOverrideOrgTheme>true</shouldOverrideOrgTheme>\n    </brand>\n",
                element(8, "headerColor", color)
            ),
            _ => String::new(),
        };
        let form_factors: String = self
            .form_factors()
            .into_iter()
            .map(|f| element(4, "formFactors", f))
            .collect();
        let tabs: String = self
            .tabs
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(|t| element(4, "tabs", t))
            .collect();

        package.write_skeleton(&[
            ("api_name", self.api_name.clone()),
            ("brand", brand),
            (
                "description",
                optional_element(4, "description", self.description.as_deref()),
            ),
            ("form_factors", form_factors),
            ("label", xml::escape(&self.label)),
            ("nav_type", self.nav_type().to_string()),
            ("setup_experience", self.setup_experience().to_string()),
            ("tabs", tabs),
        ])?;

        package.manifest_mut().add("CustomApplication", &self.api_name);
        package.update_profile(|profile| {
            profile.merge_app_visibility(&self.api_name)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::PackageBuilder;
    use crate::profile::{ProfileDocument, ADMIN_PROFILE_PATH};
    use crate::templates::TemplateFamily;
    use serde_json::json;

    #[test]
    fn test_custom_app() {
        let package = PackageBuilder::new("63.0")
            .build(
                TemplateFamily::CustomApp,
                json!({
                    "api_name": "Billing",
                    "label": "Billing & Invoicing",
                    "nav_type": "Console",
                    "tabs": ["standard-Account", "Invoice__c"],
                    "header_color": "#0070D2",
                    "form_factors": ["Large"]
                }),
            )
            .unwrap();

        let app = package
            .read_file("applications/Billing.app")
            .unwrap()
            .unwrap();
        assert!(app.contains("<label>Billing &amp; Invoicing</label>"));
        assert!(app.contains("<navType>Console</navType>"));
        assert!(app.contains("<headerColor>#0070D2</headerColor>"));
        assert!(app.contains("<shouldOverrideOrgTheme>true</shouldOverrideOrgTheme>"));
        assert_eq!(app.matches("<formFactors>").count(), 1);
        assert_eq!(app.matches("<tabs>").count(), 2);
        assert!(app.contains("<setupExperience>all</setupExperience>"));

        assert!(package.manifest().contains("CustomApplication", "Billing"));
        let profile =
            ProfileDocument::parse(package.read_file(ADMIN_PROFILE_PATH).unwrap().unwrap())
                .unwrap();
        assert_eq!(profile.application_visibilities().unwrap(), vec!["Billing"]);
    }

    #[test]
    fn test_app_defaults_for_unknown_values() {
        let package = PackageBuilder::new("63.0")
            .build(
                TemplateFamily::CustomApp,
                json!({
                    "api_name": "Ops",
                    "label": "Ops",
                    "nav_type": "Sideways",
                    "tabs": ["Invoice__c"],
                    "form_factors": ["Watch"],
                    "setup_experience": "some"
                }),
            )
            .unwrap();

        let app = package.read_file("applications/Ops.app").unwrap().unwrap();
        assert!(app.contains("<navType>Standard</navType>"));
        assert!(app.contains("<formFactors>Small</formFactors>"));
        assert!(app.contains("<formFactors>Large</formFactors>"));
        assert!(app.contains("<setupExperience>all</setupExperience>"));
        assert!(!app.contains("<brand>"));
    }

    #[test]
    fn test_repeated_form_factors_are_listed_once() {
        let package = PackageBuilder::new("63.0")
            .build(
                TemplateFamily::CustomApp,
                json!({
                    "api_name": "Field",
                    "label": "Field",
                    "tabs": ["Invoice__c"],
                    "form_factors": ["Small", "Large", "Small"]
                }),
            )
            .unwrap();

        let app = package.read_file("applications/Field.app").unwrap().unwrap();
        assert_eq!(app.matches("<formFactors>Small</formFactors>").count(), 1);
        assert_eq!(app.matches("<formFactors>Large</formFactors>").count(), 1);
        assert!(
            app.find("<formFactors>Small</formFactors>")
                < app.find("<formFactors>Large</formFactors>")
        );
    }

    #[test]
    fn test_app_requires_tabs_and_clean_name() {
        let builder = PackageBuilder::new("63.0");
        assert!(builder
            .build(
                TemplateFamily::CustomApp,
                json!({"api_name": "Ops", "label": "Ops", "tabs": []})
            )
            .is_err());
        assert!(builder
            .build(
                TemplateFamily::CustomApp,
                json!({"api_name": "Ops App", "label": "Ops", "tabs": ["A"]})
            )
            .is_err());
    }
}
