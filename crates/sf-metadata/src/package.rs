//! Package directories and the placeholder exhaustion check.

use std::fs;
use std::path::{Component, Path, PathBuf};

use busbar_sf_client::security::xml;
use tempfile::TempDir;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, ErrorKind, Result};
use crate::manifest::PackageManifest;
use crate::profile::{ProfileDocument, ADMIN_PROFILE, ADMIN_PROFILE_PATH};
use crate::templates::{placeholders_in, render, TemplateFamily};

pub const PACKAGE_XML: &str = "package.xml";
pub const DESTRUCTIVE_CHANGES_XML: &str = "destructiveChanges.xml";

/// A package directory under construction.
///
/// Owns a uniquely named temporary directory which is removed when the
/// descriptor is dropped.
#[derive(Debug)]
pub struct PackageDescriptor {
    dir: TempDir,
    family: TemplateFamily,
    api_version: String,
    manifest: PackageManifest,
    destructive: Option<PackageManifest>,
}

impl PackageDescriptor {
    /// Create an empty package directory named
    /// `sf_metadata_<family>_<timestamp>_<random>`.
    pub fn create(family: TemplateFamily, api_version: impl Into<String>) -> Result<Self> {
        let prefix = format!(
            "sf_metadata_{}_{}_",
            family,
            chrono::Utc::now().format("%Y%m%d%H%M%S%6f")
        );
        let dir = tempfile::Builder::new().prefix(&prefix).tempdir()?;
        debug!(family = %family, path = %dir.path().display(), "Package directory created");

        Ok(Self {
            dir,
            family,
            api_version: api_version.into(),
            manifest: PackageManifest::new(),
            destructive: None,
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn family(&self) -> TemplateFamily {
        self.family
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn manifest(&self) -> &PackageManifest {
        &self.manifest
    }

    pub fn manifest_mut(&mut self) -> &mut PackageManifest {
        &mut self.manifest
    }

    /// Members to delete, if this package deletes anything.
    pub fn destructive_manifest(&self) -> Option<&PackageManifest> {
        self.destructive.as_ref()
    }

    pub fn destructive_manifest_mut(&mut self) -> &mut PackageManifest {
        self.destructive.get_or_insert_with(PackageManifest::new)
    }

    /// Resolve a package-relative path, refusing anything that leaves the root.
    fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let path = Path::new(relative);
        let clean = path
            .components()
            .all(|c| matches!(c, Component::Normal(part) if part.to_str().is_some_and(xml::is_safe_file_name)));
        if relative.is_empty() || !clean {
            return Err(Error::new(ErrorKind::InvalidPayload(format!(
                "unsafe package path '{}'",
                relative
            ))));
        }
        Ok(self.dir.path().join(path))
    }

    /// Write a file, creating parent directories.
    pub fn write_file(&self, relative: &str, contents: &str) -> Result<()> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        debug!(file = relative, bytes = contents.len(), "Package file written");
        Ok(())
    }

    /// Read a file, or `None` if it does not exist.
    pub fn read_file(&self, relative: &str) -> Result<Option<String>> {
        let path = self.resolve(relative)?;
        match fs::read_to_string(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Copy the family skeleton into the package, substituting `values` in
    /// both paths and contents. Returns the rendered paths.
    pub fn write_skeleton(&self, values: &[(&str, String)]) -> Result<Vec<String>> {
        let mut written = Vec::new();
        for file in self.family.skeleton() {
            let path = render(file.path, values);
            if !placeholders_in(&path).is_empty() {
                return Err(Error::new(ErrorKind::UnresolvedPlaceholder {
                    placeholder: placeholders_in(&path).join(", "),
                    path,
                }));
            }
            self.write_file(&path, &render(file.contents, values))?;
            written.push(path);
        }
        Ok(written)
    }

    /// Load the `Admin` profile, apply `update` and save it back.
    ///
    /// The profile is created from the template on first use and listed in
    /// the manifest.
    pub fn update_profile<F>(&mut self, update: F) -> Result<()>
    where
        F: FnOnce(&mut ProfileDocument) -> Result<()>,
    {
        let mut doc = match self.read_file(ADMIN_PROFILE_PATH)? {
            Some(existing) => ProfileDocument::parse(existing)?,
            None => ProfileDocument::new(),
        };
        update(&mut doc)?;
        self.write_file(ADMIN_PROFILE_PATH, &doc.to_xml())?;
        self.manifest.add("Profile", ADMIN_PROFILE);
        Ok(())
    }

    /// Render the manifests and run the placeholder exhaustion check.
    pub fn finalize(&self) -> Result<()> {
        match &self.destructive {
            Some(destructive) => {
                self.write_file(
                    DESTRUCTIVE_CHANGES_XML,
                    &destructive.to_package_xml(&self.api_version),
                )?;
                self.write_file(
                    PACKAGE_XML,
                    &PackageManifest::new().to_package_xml(&self.api_version),
                )?;
            }
            None => {
                self.write_file(PACKAGE_XML, &self.manifest.to_package_xml(&self.api_version))?;
            }
        }
        self.ensure_no_placeholders()
    }

    /// Scan every file name and body for this family's placeholder tokens.
    pub fn ensure_no_placeholders(&self) -> Result<()> {
        let known = self.family.known_placeholders();

        for entry in WalkDir::new(self.root()).sort_by_file_name() {
            let entry = entry?;
            let relative = entry
                .path()
                .strip_prefix(self.root())
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/");

            let mut found: Vec<String> = placeholders_in(&relative)
                .into_iter()
                .filter(|token| known.contains(token))
                .collect();

            if entry.file_type().is_file() {
                let body = fs::read_to_string(entry.path())?;
                found.extend(
                    placeholders_in(&body)
                        .into_iter()
                        .filter(|token| known.contains(token)),
                );
            }

            if let Some(placeholder) = found.into_iter().next() {
                warn!(family = %self.family, file = %relative, %placeholder, "Unresolved placeholder");
                return Err(Error::new(ErrorKind::UnresolvedPlaceholder {
                    placeholder,
                    path: relative,
                }));
            }
        }
        Ok(())
    }
}
