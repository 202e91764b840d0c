//! Additive merging into the `Admin` profile document.
//!
//! Entries are keyed by their identifying child element (`field`, `tab`,
//! `application`). Re-adding a key is a no-op. Existing keys are read with
//! an XML reader so text elsewhere in the document never counts as a match.

use busbar_sf_client::security::xml;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use crate::error::{Error, ErrorKind, Result};
use crate::templates::PROFILE_TEMPLATE;

/// Package-relative path of the shared profile.
pub const ADMIN_PROFILE_PATH: &str = "profiles/Admin.profile";

/// Profile member name listed in the manifest.
pub const ADMIN_PROFILE: &str = "Admin";

const FIELD_PERMISSIONS: &str = "fieldPermissions";
const TAB_VISIBILITIES: &str = "tabVisibilities";
const APPLICATION_VISIBILITIES: &str = "applicationVisibilities";

/// A `Profile` XML document being merged into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDocument {
    xml: String,
}

#[derive(Debug, Default)]
struct CollectionScan {
    keys: Vec<String>,
    /// Byte offset just past the last `</collection>` at the top level.
    last_end: Option<usize>,
    /// Byte offset of `</Profile>`.
    root_close: Option<usize>,
}

impl Default for ProfileDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileDocument {
    /// A fresh profile from the profile template.
    pub fn new() -> Self {
        Self {
            xml: PROFILE_TEMPLATE.to_string(),
        }
    }

    /// Wrap an existing profile document. The root element must be `Profile`.
    pub fn parse(xml: impl Into<String>) -> Result<Self> {
        let xml = xml.into();
        let mut reader = Reader::from_str(&xml);
        loop {
            match reader.read_event()? {
                Event::Start(e) | Event::Empty(e) => {
                    if e.local_name().as_ref() != b"Profile" {
                        return Err(Error::new(ErrorKind::Xml(format!(
                            "expected a Profile document, found <{}>",
                            String::from_utf8_lossy(e.local_name().as_ref())
                        ))));
                    }
                    break;
                }
                Event::Eof => {
                    return Err(Error::new(ErrorKind::Xml(
                        "profile document has no root element".to_string(),
                    )))
                }
                _ => {}
            }
        }
        Ok(Self { xml })
    }

    /// Grant read and edit access to `object.field`.
    pub fn merge_field_permission(&mut self, object: &str, field: &str) -> Result<bool> {
        let key = format!("{}.{}", object, field);
        let block = format!(
            "    <fieldPermissions>\n        <editable>true</editable>\n        <field>{}</field>\n        <readable>true</readable>\n    </fieldPermissions>",
            xml::escape(&key)
        );
        self.merge(FIELD_PERMISSIONS, "field", &key, &block)
    }

    /// Make a tab visible by default.
    pub fn merge_tab_visibility(&mut self, tab: &str) -> Result<bool> {
        let block = format!(
            "    <tabVisibilities>\n        <tab>{}</tab>\n        <visibility>DefaultOn</visibility>\n    </tabVisibilities>",
            xml::escape(tab)
        );
        self.merge(TAB_VISIBILITIES, "tab", tab, &block)
    }

    /// Make an application visible and default.
    pub fn merge_app_visibility(&mut self, application: &str) -> Result<bool> {
        let block = format!(
            "    <applicationVisibilities>\n        <application>{}</application>\n        <default>true</default>\n        <visible>true</visible>\n    </applicationVisibilities>",
            xml::escape(application)
        );
        self.merge(APPLICATION_VISIBILITIES, "application", application, &block)
    }

    /// `Object.Field` keys with field permissions.
    pub fn field_permissions(&self) -> Result<Vec<String>> {
        Ok(self.scan(FIELD_PERMISSIONS, "field")?.keys)
    }

    /// Tabs with a visibility entry.
    pub fn tab_visibilities(&self) -> Result<Vec<String>> {
        Ok(self.scan(TAB_VISIBILITIES, "tab")?.keys)
    }

    /// Applications with a visibility entry.
    pub fn application_visibilities(&self) -> Result<Vec<String>> {
        Ok(self.scan(APPLICATION_VISIBILITIES, "application")?.keys)
    }

    /// Serialized document with template placeholders removed.
    pub fn to_xml(&self) -> String {
        let placeholders = [
            FIELD_PERMISSIONS,
            TAB_VISIBILITIES,
            APPLICATION_VISIBILITIES,
        ]
        .map(|c| format!("##{}##", c));

        self.xml
            .split_inclusive('\n')
            .filter(|line| !placeholders.iter().any(|p| line.trim() == p.as_str()))
            .collect()
    }

    fn merge(&mut self, collection: &str, key_element: &str, key: &str, block: &str) -> Result<bool> {
        let scan = self.scan(collection, key_element)?;
        if scan.keys.iter().any(|existing| existing == key) {
            debug!(collection, key, "Profile entry already present");
            return Ok(false);
        }

        let placeholder = format!("##{}##", collection);
        if let Some(idx) = self.xml.find(&placeholder) {
            let line_start = self.xml[..idx].rfind('\n').map_or(0, |i| i + 1);
            self.xml.insert_str(line_start, &format!("{}\n", block));
        } else if let Some(end) = scan.last_end {
            self.xml.insert_str(end, &format!("\n{}", block));
        } else if let Some(close) = scan.root_close {
            self.xml.insert_str(close, &format!("{}\n", block));
        } else {
            return Err(Error::new(ErrorKind::Xml(
                "profile document has no closing </Profile>".to_string(),
            )));
        }

        debug!(collection, key, "Profile entry added");
        Ok(true)
    }

    fn scan(&self, collection: &str, key_element: &str) -> Result<CollectionScan> {
        let mut reader = Reader::from_str(&self.xml);
        let mut scan = CollectionScan::default();
        let mut depth = 0usize;
        let mut in_collection = false;
        let mut in_key = false;
        let mut current = String::new();

        loop {
            let before = reader.buffer_position() as usize;
            match reader.read_event()? {
                Event::Start(e) => {
                    depth += 1;
                    let name = e.local_name();
                    if depth == 2 && name.as_ref() == collection.as_bytes() {
                        in_collection = true;
                    } else if depth == 3 && in_collection && name.as_ref() == key_element.as_bytes()
                    {
                        in_key = true;
                        current.clear();
                    }
                }
                Event::Text(t) if in_key => current.push_str(&t.unescape()?),
                Event::CData(c) if in_key => {
                    current.push_str(&String::from_utf8_lossy(&c.into_inner()))
                }
                Event::End(_) => {
                    if depth == 3 && in_key {
                        in_key = false;
                        scan.keys.push(current.trim().to_string());
                    } else if depth == 2 && in_collection {
                        in_collection = false;
                        scan.last_end = Some(reader.buffer_position() as usize);
                    } else if depth == 1 {
                        scan.root_close = Some(before);
                    }
                    depth = depth.saturating_sub(1);
                }
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(scan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXISTING: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Profile xmlns="http://soap.sforce.com/2006/04/metadata">
    <custom>false</custom>
    <description>Grants Invoice__c.Amount__c to everyone</description>
    <fieldPermissions>
        <editable>false</editable>
        <field>Account.Rating</field>
        <readable>true</readable>
    </fieldPermissions>
    <userLicense>Salesforce</userLicense>
</Profile>
"#;

    #[test]
    fn test_merge_is_idempotent() {
        let mut doc = ProfileDocument::new();
        assert!(doc.merge_field_permission("Invoice__c", "Amount__c").unwrap());
        assert!(!doc.merge_field_permission("Invoice__c", "Amount__c").unwrap());

        let xml = doc.to_xml();
        assert_eq!(xml.matches("<fieldPermissions>").count(), 1);
        assert!(xml.contains("<field>Invoice__c.Amount__c</field>"));
        assert!(xml.contains("<editable>true</editable>"));
    }

    #[test]
    fn test_placeholders_stripped_on_save() {
        let mut doc = ProfileDocument::new();
        doc.merge_tab_visibility("Invoice__c").unwrap();
        let xml = doc.to_xml();

        assert!(!xml.contains("##"));
        assert!(xml.contains("<visibility>DefaultOn</visibility>"));
        assert!(ProfileDocument::parse(xml).is_ok());
    }

    #[test]
    fn test_entries_keep_insertion_order_at_placeholder() {
        let mut doc = ProfileDocument::new();
        doc.merge_field_permission("Invoice__c", "A__c").unwrap();
        doc.merge_field_permission("Invoice__c", "B__c").unwrap();
        assert_eq!(
            doc.field_permissions().unwrap(),
            vec!["Invoice__c.A__c", "Invoice__c.B__c"]
        );
    }

    #[test]
    fn test_appends_after_existing_entries() {
        let mut doc = ProfileDocument::parse(EXISTING).unwrap();
        assert!(doc.merge_field_permission("Invoice__c", "Amount__c").unwrap());

        let xml = doc.to_xml();
        let added = xml.find("<field>Invoice__c.Amount__c</field>").unwrap();
        let existing = xml.find("<field>Account.Rating</field>").unwrap();
        let license = xml.find("<userLicense>").unwrap();
        assert!(existing < added && added < license);
    }

    #[test]
    fn test_inserts_before_root_close_when_collection_absent() {
        let mut doc = ProfileDocument::parse(EXISTING).unwrap();
        assert!(doc.merge_app_visibility("Billing").unwrap());

        let xml = doc.to_xml();
        let added = xml.find("<application>Billing</application>").unwrap();
        assert!(added > xml.find("<userLicense>").unwrap());
        assert!(added < xml.find("</Profile>").unwrap());
        assert_eq!(doc.application_visibilities().unwrap(), vec!["Billing"]);
    }

    #[test]
    fn test_keys_read_from_elements_not_text() {
        // The description mentions the key; only real entries count.
        let mut doc = ProfileDocument::parse(EXISTING).unwrap();
        assert!(doc.merge_field_permission("Invoice__c", "Amount__c").unwrap());
        assert!(!doc.merge_field_permission("Account", "Rating").unwrap());
    }

    #[test]
    fn test_escaped_keys_are_deduplicated() {
        let mut doc = ProfileDocument::new();
        assert!(doc.merge_tab_visibility("R&D").unwrap());
        assert!(doc.to_xml().contains("<tab>R&amp;D</tab>"));
        assert!(!doc.merge_tab_visibility("R&D").unwrap());
    }

    #[test]
    fn test_parse_rejects_other_documents() {
        let err = ProfileDocument::parse("<CustomObject/>").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Xml(_)));
    }
}
