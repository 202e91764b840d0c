use serde::{Deserialize, Serialize};

use super::{element, optional_element, require_all, validate_api_name, PackageContent};
use crate::error::{Error, ErrorKind, Result};
use crate::package::PackageDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TabType {
    CustomObject,
    VisualforcePage,
    Web,
}

/// A custom tab for an object, a Visualforce page or a web URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabRequest {
    pub tab_api_name: String,
    pub label: String,
    pub motif: String,
    pub tab_type: TabType,
    #[serde(default)]
    pub object_name: Option<String>,
    #[serde(default)]
    pub vf_page_name: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub url_encoding_key: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

fn invalid(message: &str) -> Error {
    Error::new(ErrorKind::InvalidPayload(message.to_string()))
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

impl PackageContent for TabRequest {
    fn validate(&self) -> Result<()> {
        validate_api_name("tab_api_name", &self.tab_api_name)?;
        require_all(&[("label", &self.label), ("motif", &self.motif)])?;

        match self.tab_type {
            TabType::CustomObject => {
                if is_blank(&self.object_name) {
                    return Err(invalid(
                        "object_name is required when tab_type is 'CustomObject'",
                    ));
                }
                if self.object_name.as_deref() != Some(self.tab_api_name.as_str()) {
                    return Err(invalid(
                        "For CustomObject tabs, tab_api_name must match object_name",
                    ));
                }
            }
            TabType::VisualforcePage if is_blank(&self.vf_page_name) => {
                return Err(invalid(
                    "vf_page_name is required when tab_type is 'VisualforcePage'",
                ));
            }
            TabType::Web if is_blank(&self.web_url) => {
                return Err(invalid("web_url is required when tab_type is 'Web'"));
            }
            _ => {}
        }
        Ok(())
    }

    fn write(&self, package: &mut PackageDescriptor) -> Result<()> {
        let custom_object = match self.tab_type {
            TabType::CustomObject => element(4, "customObject", "true"),
            _ => String::new(),
        };
        let page = match self.tab_type {
            TabType::VisualforcePage => optional_element(4, "page", self.vf_page_name.as_deref()),
            _ => String::new(),
        };
        let url = match self.tab_type {
            TabType::Web => format!(
                "{}{}",
                optional_element(4, "url", self.web_url.as_deref()),
                element(
                    4,
                    "urlEncodingKey",
                    self.url_encoding_key.as_deref().unwrap_or("UTF8")
                )
            ),
            _ => String::new(),
        };

        package.write_skeleton(&[
            ("tab_api_name", self.tab_api_name.clone()),
            ("custom_object", custom_object),
            (
                "description",
                optional_element(4, "description", self.description.as_deref()),
            ),
            ("label", element(4, "label", &self.label)),
            ("motif", element(4, "motif", &self.motif)),
            ("page", page),
            ("url", url),
        ])?;

        package.manifest_mut().add("CustomTab", &self.tab_api_name);
        package.update_profile(|profile| {
            profile.merge_tab_visibility(&self.tab_api_name)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::PackageBuilder;
    use crate::profile::{ProfileDocument, ADMIN_PROFILE_PATH};
    use crate::templates::TemplateFamily;
    use serde_json::{json, Value};

    fn web_tab() -> Value {
        json!({
            "tab_api_name": "Docs",
            "label": "Docs",
            "motif": "Custom20: Airplane",
            "tab_type": "Web",
            "web_url": "https://example.com/?a=1&b=2"
        })
    }

    #[test]
    fn test_web_tab() {
        let package = PackageBuilder::new("63.0")
            .build(TemplateFamily::Tab, web_tab())
            .unwrap();
        let tab = package.read_file("tabs/Docs.tab").unwrap().unwrap();

        assert!(tab.contains("<url>https://example.com/?a=1&amp;b=2</url>"));
        assert!(tab.contains("<urlEncodingKey>UTF8</urlEncodingKey>"));
        assert!(tab.contains("<motif>Custom20: Airplane</motif>"));
        assert!(!tab.contains("customObject"));
        assert!(!tab.contains("<description>"));

        assert!(package.manifest().contains("CustomTab", "Docs"));
        assert!(package.manifest().contains("Profile", "Admin"));
        let profile =
            ProfileDocument::parse(package.read_file(ADMIN_PROFILE_PATH).unwrap().unwrap())
                .unwrap();
        assert_eq!(profile.tab_visibilities().unwrap(), vec!["Docs"]);
    }

    #[test]
    fn test_object_tab_name_must_match_object() {
        let err = PackageBuilder::new("63.0")
            .build(
                TemplateFamily::Tab,
                json!({
                    "tab_api_name": "Invoice__c", "label": "Invoices", "motif": "Custom1: Heart",
                    "tab_type": "CustomObject", "object_name": "Payment__c"
                }),
            )
            .unwrap_err();
        assert!(err.to_string().contains("must match object_name"));

        let package = PackageBuilder::new("63.0")
            .build(
                TemplateFamily::Tab,
                json!({
                    "tab_api_name": "Invoice__c", "label": "Invoices", "motif": "Custom1: Heart",
                    "tab_type": "CustomObject", "object_name": "Invoice__c"
                }),
            )
            .unwrap();
        let tab = package.read_file("tabs/Invoice__c.tab").unwrap().unwrap();
        assert!(tab.contains("<customObject>true</customObject>"));
    }

    #[test]
    fn test_tab_type_requirements() {
        let mut payload = web_tab();
        payload["web_url"] = Value::Null;
        assert!(PackageBuilder::new("63.0")
            .build(TemplateFamily::Tab, payload)
            .is_err());

        let mut payload = web_tab();
        payload["tab_type"] = json!("VisualforcePage");
        assert!(PackageBuilder::new("63.0")
            .build(TemplateFamily::Tab, payload)
            .is_err());

        let mut payload = web_tab();
        payload["tab_type"] = json!("Flow");
        assert!(PackageBuilder::new("63.0")
            .build(TemplateFamily::Tab, payload)
            .is_err());
    }

    #[test]
    fn test_concurrent_tab_builds_use_distinct_directories() {
        let builder = PackageBuilder::new("63.0");
        let (a, b) = std::thread::scope(|s| {
            let a = s.spawn(|| builder.build(TemplateFamily::Tab, web_tab()).unwrap());
            let b = s.spawn(|| builder.build(TemplateFamily::Tab, web_tab()).unwrap());
            (a.join().unwrap(), b.join().unwrap())
        });
        assert_ne!(a.root(), b.root());
        assert!(!a.root().starts_with(b.root()) && !b.root().starts_with(a.root()));
    }

    #[test]
    fn test_concurrent_builds_of_different_tabs_stay_separate() {
        let builder = PackageBuilder::new("63.0");
        let tab = |name: &str| {
            let mut payload = web_tab();
            payload["tab_api_name"] = json!(name);
            payload["label"] = json!(name);
            payload
        };
        let (docs, news) = std::thread::scope(|s| {
            let docs = s.spawn(|| builder.build(TemplateFamily::Tab, tab("Docs")).unwrap());
            let news = s.spawn(|| builder.build(TemplateFamily::Tab, tab("News")).unwrap());
            (docs.join().unwrap(), news.join().unwrap())
        });
        assert_ne!(docs.root(), news.root());

        for (package, own, other) in [(&docs, "Docs", "News"), (&news, "News", "Docs")] {
            let tab_file = package
                .read_file(&format!("tabs/{own}.tab"))
                .unwrap()
                .unwrap();
            assert!(tab_file.contains(&format!("<label>{own}</label>")));
            assert!(!tab_file.contains(other));
            assert!(package
                .read_file(&format!("tabs/{other}.tab"))
                .unwrap()
                .is_none());

            let manifest = package.read_file("package.xml").unwrap().unwrap();
            assert!(manifest.contains(&format!("<members>{own}</members>")));
            assert!(!manifest.contains(other));

            let profile = package.read_file(ADMIN_PROFILE_PATH).unwrap().unwrap();
            assert!(!profile.contains(other));
        }
    }
}
