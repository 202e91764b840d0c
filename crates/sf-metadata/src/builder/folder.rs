use busbar_sf_client::security::xml;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{element, validate_api_name, PackageContent};
use crate::error::{Error, ErrorKind, Result};
use crate::package::PackageDescriptor;
use crate::templates::TemplateFamily;

fn default_access_type() -> String {
    "Private".to_string()
}

/// Who a folder is shared with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolderShare {
    #[serde(default, alias = "accessLevel")]
    pub access_level: Option<String>,
    #[serde(default, alias = "sharedTo")]
    pub shared_to: Option<String>,
    #[serde(default, alias = "sharedToType")]
    pub shared_to_type: Option<String>,
}

impl FolderShare {
    fn to_xml(&self) -> Option<String> {
        fn part(v: &Option<String>) -> Option<&str> {
            v.as_deref().map(str::trim).filter(|v| !v.is_empty())
        }
        match (
            part(&self.access_level),
            part(&self.shared_to),
            part(&self.shared_to_type),
        ) {
            (Some(level), Some(to), Some(to_type)) => Some(format!(
                "    <folderShares>\n{}{}{}    </folderShares>\n",
                element(8, "accessLevel", level),
                element(8, "sharedTo", to),
                element(8, "sharedToType", to_type)
            )),
            _ => None,
        }
    }
}

/// A report or dashboard folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderRequest {
    #[serde(default, alias = "folder_api_name")]
    pub developer_name: String,
    #[serde(default)]
    pub folder_label: Option<String>,
    #[serde(default = "default_access_type")]
    pub access_type: String,
    #[serde(default)]
    pub folder_shares: Vec<FolderShare>,
}

impl FolderRequest {
    pub fn label(&self) -> &str {
        self.folder_label
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(&self.developer_name)
    }
}

impl PackageContent for FolderRequest {
    fn validate(&self) -> Result<()> {
        validate_api_name("developer_name", &self.developer_name)
    }

    fn write(&self, package: &mut PackageDescriptor) -> Result<()> {
        let metadata_type = match package.family() {
            TemplateFamily::ReportFolder => "Report",
            TemplateFamily::DashboardFolder => "Dashboard",
            other => {
                return Err(Error::new(ErrorKind::Template(format!(
                    "folder request cannot be written into a {} package",
                    other
                ))))
            }
        };

        let mut shares = String::new();
        for share in &self.folder_shares {
            match share.to_xml() {
                Some(xml) => shares.push_str(&xml),
                None => warn!(
                    folder = %self.developer_name,
                    "Skipping folder share without accessLevel, sharedTo and sharedToType"
                ),
            }
        }

        package.write_skeleton(&[
            ("developer_name", self.developer_name.clone()),
            ("access_type", xml::escape(&self.access_type)),
            ("folder_shares", shares),
            ("folder_label", xml::escape(self.label())),
        ])?;

        package
            .manifest_mut()
            .add(metadata_type, &self.developer_name);
        Ok(())
    }
}
