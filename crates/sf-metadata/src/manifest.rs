//! Package manifest (package.xml / destructiveChanges.xml).

use std::collections::{BTreeMap, BTreeSet};

use busbar_sf_client::security::xml;

use crate::templates::{render, PACKAGE_TEMPLATE};

/// Set of `(metadata type, member)` pairs.
///
/// Types and members are kept sorted and deduplicated. All values are
/// escaped when rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageManifest {
    types: BTreeMap<String, BTreeSet<String>>,
}

impl PackageManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member. Returns false if it was already listed.
    pub fn add(&mut self, metadata_type: impl Into<String>, member: impl Into<String>) -> bool {
        self.types
            .entry(metadata_type.into())
            .or_default()
            .insert(member.into())
    }

    pub fn contains(&self, metadata_type: &str, member: &str) -> bool {
        self.types
            .get(metadata_type)
            .is_some_and(|members| members.contains(member))
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate over `(type, member)` pairs in sorted order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.types
            .iter()
            .flat_map(|(ty, members)| members.iter().map(move |m| (ty.as_str(), m.as_str())))
    }

    /// Members listed for a type.
    pub fn members(&self, metadata_type: &str) -> Vec<&str> {
        self.types
            .get(metadata_type)
            .map(|members| members.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Render the `<types>` blocks. Empty for an empty manifest.
    pub fn types_xml(&self) -> String {
        self.types
            .iter()
            .map(|(name, members)| {
                let members_xml = members
                    .iter()
                    .map(|m| format!("        <members>{}</members>\n", xml::escape(m)))
                    .collect::<String>();
                format!(
                    "    <types>\n{}        <name>{}</name>\n    </types>\n",
                    members_xml,
                    xml::escape(name)
                )
            })
            .collect()
    }

    /// Render a complete `<Package>` document from the manifest template.
    pub fn to_package_xml(&self, api_version: &str) -> String {
        render(
            PACKAGE_TEMPLATE,
            &[
                ("types", self.types_xml()),
                ("api_version", xml::escape(api_version)),
            ],
        )
    }
}
