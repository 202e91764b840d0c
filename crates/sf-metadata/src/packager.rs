//! Zip archiving and base64 encoding of package directories.

use std::io::{Cursor, Write};

use base64::{engine::general_purpose, Engine as _};
use tracing::{debug, instrument};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;
use crate::manifest::PackageManifest;
use crate::package::PackageDescriptor;
use crate::templates::TemplateFamily;

/// A package ready to deploy.
#[derive(Clone)]
pub struct EncodedPackage {
    pub family: TemplateFamily,
    pub manifest: PackageManifest,
    pub destructive: Option<PackageManifest>,
    /// Size of the zip archive in bytes.
    pub archive_len: usize,
    /// Base64 of the zip archive.
    pub zip_base64: String,
}

impl std::fmt::Debug for EncodedPackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedPackage")
            .field("family", &self.family)
            .field("manifest", &self.manifest)
            .field("destructive", &self.destructive)
            .field("archive_len", &self.archive_len)
            .field("zip_base64_len", &self.zip_base64.len())
            .finish()
    }
}

/// Zip every regular file under the package root.
///
/// Entry names are relative to the root with `/` separators, added in
/// sorted order.
pub fn archive(package: &PackageDescriptor) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(package.root()).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = match entry.path().strip_prefix(package.root()) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        zip.start_file(name.as_str(), options)?;
        zip.write_all(&std::fs::read(entry.path())?)?;
        debug!(entry = %name, "Archived");
    }

    Ok(zip.finish()?.into_inner())
}

/// Archive and encode a package, consuming it. The package directory is
/// removed on return.
#[instrument(skip(package), fields(family = %package.family()))]
pub fn package(package: PackageDescriptor) -> Result<EncodedPackage> {
    let bytes = archive(&package)?;
    debug!(bytes = bytes.len(), "Package archived");

    Ok(EncodedPackage {
        family: package.family(),
        manifest: package.manifest().clone(),
        destructive: package.destructive_manifest().cloned(),
        archive_len: bytes.len(),
        zip_base64: general_purpose::STANDARD.encode(&bytes),
    })
}
