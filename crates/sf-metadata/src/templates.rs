//! Template skeletons and `##name##` placeholder rendering.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub(crate) const PACKAGE_TEMPLATE: &str = include_str!("../templates/package.xml");
pub(crate) const FIELD_TEMPLATE: &str = include_str!("../templates/field.xml");
pub(crate) const PROFILE_TEMPLATE: &str = include_str!("../templates/profile.profile");

const OBJECT_TEMPLATE: &str = include_str!("../templates/object.object");
const TAB_TEMPLATE: &str = include_str!("../templates/tab.tab");
const APP_TEMPLATE: &str = include_str!("../templates/app.app");
const VALIDATION_RULE_TEMPLATE: &str = include_str!("../templates/validation_rule.object");
const METADATA_TYPE_TEMPLATE: &str = include_str!("../templates/metadata_type.object");
const REPORT_TEMPLATE: &str = include_str!("../templates/report.report");
const REPORT_FOLDER_TEMPLATE: &str = include_str!("../templates/report_folder.xml");
const DASHBOARD_FOLDER_TEMPLATE: &str = include_str!("../templates/dashboard_folder.xml");

/// A file in a family skeleton. Both the path and the contents may carry
/// placeholders.
#[derive(Debug, Clone, Copy)]
pub struct TemplateFile {
    pub path: &'static str,
    pub contents: &'static str,
}

/// Kind of change a package carries. Each family has its own skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateFamily {
    Object,
    ObjectWithFields,
    FieldDeletion,
    Tab,
    CustomApp,
    ValidationRule,
    CustomMetadataType,
    Report,
    ReportFolder,
    DashboardFolder,
}

impl TemplateFamily {
    pub const ALL: [TemplateFamily; 10] = [
        TemplateFamily::Object,
        TemplateFamily::ObjectWithFields,
        TemplateFamily::FieldDeletion,
        TemplateFamily::Tab,
        TemplateFamily::CustomApp,
        TemplateFamily::ValidationRule,
        TemplateFamily::CustomMetadataType,
        TemplateFamily::Report,
        TemplateFamily::ReportFolder,
        TemplateFamily::DashboardFolder,
    ];

    /// Short name used in temp directory prefixes and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateFamily::Object => "object",
            TemplateFamily::ObjectWithFields => "object_with_fields",
            TemplateFamily::FieldDeletion => "field_deletion",
            TemplateFamily::Tab => "tab",
            TemplateFamily::CustomApp => "custom_app",
            TemplateFamily::ValidationRule => "validation_rule",
            TemplateFamily::CustomMetadataType => "custom_metadata_type",
            TemplateFamily::Report => "report",
            TemplateFamily::ReportFolder => "report_folder",
            TemplateFamily::DashboardFolder => "dashboard_folder",
        }
    }

    /// Files copied into a fresh package directory for this family.
    ///
    /// `package.xml` (and `destructiveChanges.xml`) are rendered from the
    /// manifest when the build finishes and are not part of the skeleton.
    pub fn skeleton(&self) -> &'static [TemplateFile] {
        match self {
            TemplateFamily::Object | TemplateFamily::ObjectWithFields => &[TemplateFile {
                path: "objects/##api_name##.object",
                contents: OBJECT_TEMPLATE,
            }],
            TemplateFamily::FieldDeletion => &[],
            TemplateFamily::Tab => &[TemplateFile {
                path: "tabs/##tab_api_name##.tab",
                contents: TAB_TEMPLATE,
            }],
            TemplateFamily::CustomApp => &[TemplateFile {
                path: "applications/##api_name##.app",
                contents: APP_TEMPLATE,
            }],
            TemplateFamily::ValidationRule => &[TemplateFile {
                path: "objects/##object_name##.object",
                contents: VALIDATION_RULE_TEMPLATE,
            }],
            TemplateFamily::CustomMetadataType => &[TemplateFile {
                path: "objects/##api_name##.object",
                contents: METADATA_TYPE_TEMPLATE,
            }],
            TemplateFamily::Report => &[TemplateFile {
                path: "reports/##folder_name##/##report_name##.report",
                contents: REPORT_TEMPLATE,
            }],
            TemplateFamily::ReportFolder => &[TemplateFile {
                path: "reports/##developer_name##-meta.xml",
                contents: REPORT_FOLDER_TEMPLATE,
            }],
            TemplateFamily::DashboardFolder => &[TemplateFile {
                path: "dashboards/##developer_name##-meta.xml",
                contents: DASHBOARD_FOLDER_TEMPLATE,
            }],
        }
    }

    /// Every placeholder token that may appear in a package of this family.
    pub fn known_placeholders(&self) -> BTreeSet<String> {
        let mut tokens = BTreeSet::new();
        for file in self.skeleton() {
            tokens.extend(placeholders_in(file.path));
            tokens.extend(placeholders_in(file.contents));
        }
        for shared in [PACKAGE_TEMPLATE, FIELD_TEMPLATE, PROFILE_TEMPLATE] {
            tokens.extend(placeholders_in(shared));
        }
        tokens
    }
}

impl std::fmt::Display for TemplateFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Substitute `##name##` tokens in one pass.
///
/// Substituted values are never rescanned. Tokens without a value are left
/// in place for the exhaustion check to find. A line holding nothing but a
/// token whose value is empty is dropped.
pub(crate) fn render(template: &str, values: &[(&str, String)]) -> String {
    let lookup = |name: &str| {
        values
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    };

    let mut out = String::with_capacity(template.len());
    for line in template.split_inclusive('\n') {
        let trimmed = line.trim();
        if let Some(name) = sole_token(trimmed) {
            if let Some(value) = lookup(name) {
                if !value.is_empty() {
                    out.push_str(value.trim_end_matches('\n'));
                    if line.ends_with('\n') {
                        out.push('\n');
                    }
                }
                continue;
            }
        }
        render_inline(line, &lookup, &mut out);
    }
    out
}

fn render_inline<'a>(line: &str, lookup: &impl Fn(&str) -> Option<&'a str>, out: &mut String) {
    let mut rest = line;
    while let Some(start) = rest.find("##") {
        let after = &rest[start + 2..];
        match token_name(after) {
            Some(name) => {
                let token_len = name.len() + 4;
                out.push_str(&rest[..start]);
                match lookup(name) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&rest[start..start + token_len]),
                }
                rest = &rest[start + token_len..];
            }
            None => {
                out.push_str(&rest[..start + 2]);
                rest = after;
            }
        }
    }
    out.push_str(rest);
}

/// Name of a token starting right after an opening `##`, if well formed.
fn token_name(after_open: &str) -> Option<&str> {
    let end = after_open.find("##")?;
    let name = &after_open[..end];
    let mut chars = name.chars();
    let first = chars.next()?;
    if (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Some(name)
    } else {
        None
    }
}

fn sole_token(trimmed: &str) -> Option<&str> {
    let inner = trimmed.strip_prefix("##")?;
    let name = token_name(inner)?;
    (inner.len() == name.len() + 2).then_some(name)
}

/// All `##name##` tokens in a piece of text.
pub(crate) fn placeholders_in(text: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("##") {
        let after = &rest[start + 2..];
        match token_name(after) {
            Some(name) => {
                found.push(format!("##{}##", name));
                rest = &after[name.len() + 2..];
            }
            None => rest = after,
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_inline_tokens() {
        let out = render(
            "<label>##name##</label><plural>##plural_name##</plural>",
            &[("name", "Invoice".into()), ("plural_name", "Invoices".into())],
        );
        assert_eq!(out, "<label>Invoice</label><plural>Invoices</plural>");
    }

    #[test]
    fn test_render_does_not_rescan_values() {
        let out = render("<a>##x##</a>", &[("x", "##y##".into()), ("y", "nope".into())]);
        assert_eq!(out, "<a>##y##</a>");
    }

    #[test]
    fn test_render_drops_empty_block_lines() {
        let out = render(
            "<Root>\n##block##\n    <keep>1</keep>\n</Root>\n",
            &[("block", String::new())],
        );
        assert_eq!(out, "<Root>\n    <keep>1</keep>\n</Root>\n");
    }

    #[test]
    fn test_render_block_values_keep_their_indentation() {
        let out = render(
            "<Root>\n##block##\n</Root>\n",
            &[("block", "    <a/>\n    <b/>\n".into())],
        );
        assert_eq!(out, "<Root>\n    <a/>\n    <b/>\n</Root>\n");
    }

    #[test]
    fn test_unknown_tokens_survive() {
        let out = render("<a>##missing##</a> ## not a token", &[]);
        assert_eq!(out, "<a>##missing##</a> ## not a token");
    }

    #[test]
    fn test_placeholders_in() {
        assert_eq!(
            placeholders_in("objects/##api_name##.object ## ##x y## ##z##"),
            vec!["##api_name##".to_string(), "##z##".to_string()]
        );
    }

    #[test]
    fn test_every_family_knows_its_skeleton_tokens() {
        for family in TemplateFamily::ALL {
            let known = family.known_placeholders();
            assert!(known.contains("##types##"), "{family}");
            for file in family.skeleton() {
                for token in placeholders_in(file.contents) {
                    assert!(known.contains(&token), "{family}: {token}");
                }
            }
        }
        assert!(TemplateFamily::Tab
            .known_placeholders()
            .contains("##tab_api_name##"));
    }
}
