use busbar_sf_client::security::xml;
use serde::{Deserialize, Serialize};

use super::{element, require_all, validate_api_name, PackageContent};
use crate::error::Result;
use crate::package::PackageDescriptor;

fn default_format() -> String {
    "Tabular".to_string()
}

fn default_scope() -> String {
    "organization".to_string()
}

fn default_show_details() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportFilter {
    pub column: String,
    pub operator: String,
    pub value: String,
}

/// A report inside an existing report folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    pub report_name: String,
    #[serde(default)]
    pub folder_name: String,
    #[serde(default)]
    pub report_type: String,
    /// Display name; defaults to the report name.
    #[serde(default, alias = "display_name")]
    pub label: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub filters: Vec<ReportFilter>,
    #[serde(default, alias = "groupings_down")]
    pub groupings: Vec<String>,
    #[serde(default)]
    pub groupings_across: Vec<String>,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default = "default_show_details")]
    pub show_details: bool,
    #[serde(default)]
    pub time_frame_column: Option<String>,
    #[serde(default)]
    pub time_frame_interval: Option<String>,
}

impl ReportRequest {
    /// Report name without a trailing `.report`.
    pub fn base_name(&self) -> &str {
        self.report_name
            .strip_suffix(".report")
            .unwrap_or(&self.report_name)
    }

    /// Manifest member: `folder/report`.
    pub fn member_name(&self) -> String {
        format!("{}/{}", self.folder_name, self.base_name())
    }

    fn filter_xml(&self) -> String {
        if self.filters.is_empty() {
            return String::new();
        }
        let mut out = String::from("    <filter>\n");
        for filter in &self.filters {
            out.push_str("        <criteriaItems>\n");
            out.push_str(&element(12, "column", &filter.column));
            out.push_str(&element(12, "operator", &filter.operator));
            out.push_str(&element(12, "value", &filter.value));
            out.push_str("        </criteriaItems>\n");
        }
        out.push_str("    </filter>\n");
        out
    }

    fn time_frame_xml(&self) -> String {
        let column = self.time_frame_column.as_deref().map(str::trim);
        let interval = self.time_frame_interval.as_deref().map(str::trim);
        match (column, interval) {
            (Some(column), Some(interval)) if !column.is_empty() && !interval.is_empty() => {
                format!(
                    "    <timeFrameFilter>\n{}{}    </timeFrameFilter>\n",
                    element(8, "dateColumn", column),
                    element(8, "interval", interval)
                )
            }
            _ => String::new(),
        }
    }
}

fn wrapped(outer: &str, inner: &str, values: &[String]) -> String {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| format!("    <{outer}>\n{}    </{outer}>\n", element(8, inner, v)))
        .collect()
}

impl PackageContent for ReportRequest {
    fn validate(&self) -> Result<()> {
        require_all(&[
            ("report_name", &self.report_name),
            ("folder_name", &self.folder_name),
            ("report_type", &self.report_type),
        ])?;
        validate_api_name("report_name", self.base_name())?;
        validate_api_name("folder_name", &self.folder_name)?;
        Ok(())
    }

    fn write(&self, package: &mut PackageDescriptor) -> Result<()> {
        let label = self
            .label
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(self.base_name());

        package.write_skeleton(&[
            ("folder_name", self.folder_name.clone()),
            ("report_name", self.base_name().to_string()),
            ("columns", wrapped("columns", "field", &self.columns)),
            ("filter", self.filter_xml()),
            ("format", xml::escape(&self.format)),
            (
                "groupings_across",
                wrapped("groupingsAcross", "field", &self.groupings_across),
            ),
            (
                "groupings_down",
                wrapped("groupingsDown", "field", &self.groupings),
            ),
            ("label", xml::escape(label)),
            ("report_type", xml::escape(&self.report_type)),
            ("scope", xml::escape(&self.scope)),
            ("show_details", self.show_details.to_string()),
            ("time_frame_filter", self.time_frame_xml()),
        ])?;

        package.manifest_mut().add("Report", self.member_name());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::PackageBuilder;
    use crate::templates::TemplateFamily;
    use serde_json::json;

    #[test]
    fn test_report_package() {
        let package = PackageBuilder::new("63.0")
            .build(
                TemplateFamily::Report,
                json!({
                    "report_name": "Open_Invoices.report",
                    "folder_name": "Finance",
                    "report_type": "Invoice__c",
                    "columns": ["Name", "Amount__c"],
                    "filters": [{"column": "Amount__c", "operator": "greaterThan", "value": "100"}],
                    "groupings": ["Stage__c"],
                    "time_frame_column": "CreatedDate",
                    "time_frame_interval": "INTERVAL_CURFY"
                }),
            )
            .unwrap();

        assert!(package.manifest().contains("Report", "Finance/Open_Invoices"));
        let report = package
            .read_file("reports/Finance/Open_Invoices.report")
            .unwrap()
            .unwrap();
        assert_eq!(report.matches("<columns>").count(), 2);
        assert!(report.contains("<operator>greaterThan</operator>"));
        assert!(report.contains("<groupingsDown>\n        <field>Stage__c</field>"));
        assert!(!report.contains("<groupingsAcross>"));
        assert!(report.contains("<name>Open_Invoices</name>"));
        assert!(report.contains("<format>Tabular</format>"));
        assert!(report.contains("<scope>organization</scope>"));
        assert!(report.contains("<showDetails>true</showDetails>"));
        assert!(report.contains("<interval>INTERVAL_CURFY</interval>"));
    }

    #[test]
    fn test_time_frame_needs_both_parts() {
        let package = PackageBuilder::new("63.0")
            .build(
                TemplateFamily::Report,
                json!({
                    "report_name": "Summary",
                    "folder_name": "Finance",
                    "report_type": "Opportunity",
                    "label": "Pipeline Summary",
                    "format": "Summary",
                    "show_details": false,
                    "time_frame_column": "CloseDate"
                }),
            )
            .unwrap();
        let report = package
            .read_file("reports/Finance/Summary.report")
            .unwrap()
            .unwrap();
        assert!(!report.contains("<timeFrameFilter>"));
        assert!(!report.contains("<filter>"));
        assert!(report.contains("<name>Pipeline Summary</name>"));
        assert!(report.contains("<showDetails>false</showDetails>"));
    }

    #[test]
    fn test_report_requires_folder_and_type() {
        let err = PackageBuilder::new("63.0")
            .build(TemplateFamily::Report, json!({"report_name": "X"}))
            .unwrap_err();
        assert!(err.to_string().contains("folder_name, report_type"));
    }
}
