//! # busbar-sf-metadata
//!
//! Build Salesforce metadata packages from templates and deploy them
//! through the Metadata API.
//!
//! ## Features
//!
//! - **Templates** - Skeleton files per family with `##name##` placeholders
//! - **Profile merge** - Admin profile permissions added without duplicates
//! - **Packaging** - Deterministic zip archive, base64 encoded
//! - **Deploy** - SOAP `deploy` call with fault reporting
//!
//! ## Example
//!
//! ```rust,ignore
//! use busbar_sf_metadata::{package, DeployOptions, MetadataClient, PackageBuilder, TemplateFamily};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), busbar_sf_metadata::Error> {
//!     let built = PackageBuilder::new("63.0").build(
//!         TemplateFamily::ObjectWithFields,
//!         json!({
//!             "api_name": "Invoice__c",
//!             "name": "Invoice",
//!             "plural_name": "Invoices",
//!             "fields": [{"label": "Amount", "api_name": "Amount__c", "type": "Number"}]
//!         }),
//!     )?;
//!     let encoded = package(built)?;
//!
//!     let client = MetadataClient::from_parts("https://na1.salesforce.com", "00D...")?;
//!     let result = client.deploy(&encoded, DeployOptions::default()).await?;
//!     println!("{}", result.summary());
//!     Ok(())
//! }
//! ```

mod builder;
mod client;
mod deploy;
mod error;
mod fields;
mod manifest;
mod package;
mod packager;
mod profile;
mod templates;

pub use builder::{
    AppRequest, ChangeRequest, FieldDeletionRequest, FieldRef, FolderRequest, FolderShare,
    MetadataTypeRequest, ObjectRequest, PackageBuilder, ReportFilter, ReportRequest, TabRequest,
    TabType, ValidationRuleRequest,
};
pub use client::MetadataClient;
pub use deploy::{DeployOptions, DeployResult};
pub use error::{Error, ErrorKind, Result};
pub use fields::{fields_xml, FieldSpec, FieldType};
pub use manifest::PackageManifest;
pub use package::{PackageDescriptor, DESTRUCTIVE_CHANGES_XML, PACKAGE_XML};
pub use packager::{archive, package, EncodedPackage};
pub use profile::{ProfileDocument, ADMIN_PROFILE, ADMIN_PROFILE_PATH};
pub use templates::{TemplateFamily, TemplateFile};
