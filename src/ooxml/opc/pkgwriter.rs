//! Package writer for OPC packages.
//!
//! Writes `[Content_Types].xml`, the package relationships and every part
//! still reachable from them, together with each part's relationships.

use crate::common::xml::escape_attr;
use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::error::Result;
use crate::ooxml::opc::package::OpcPackage;
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PACKAGE_URI, PackURI};
use crate::ooxml::opc::part::Part;
use crate::ooxml::opc::phys_pkg::PhysPkgWriter;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

pub struct PackageWriter;

impl PackageWriter {
    /// Serialize a package to container bytes.
    pub fn to_bytes(package: &OpcPackage) -> Result<Vec<u8>> {
        let reachable = package.reachable_partnames();
        let mut parts: Vec<&dyn Part> = package
            .iter_parts()
            .filter(|p| reachable.contains(p.partname().as_str()))
            .collect();
        parts.sort_by(|a, b| a.partname().cmp(b.partname()));

        let mut phys_writer = PhysPkgWriter::new();

        let cti = ContentTypesItem::from_parts(&parts);
        phys_writer.write(&Self::uri(CONTENT_TYPES_URI)?, cti.to_xml().as_bytes())?;

        let pkg_rels_uri = Self::uri(PACKAGE_URI)?.rels_uri();
        phys_writer.write(&pkg_rels_uri, package.rels().to_xml().as_bytes())?;

        for part in parts {
            phys_writer.write(part.partname(), &part.blob())?;
            if !part.rels().is_empty() {
                let rels_uri = part.partname().rels_uri();
                phys_writer.write(&rels_uri, part.rels().to_xml().as_bytes())?;
            }
        }

        phys_writer.finish()
    }

    /// Replace `path` with `bytes` through a temporary file in the same
    /// directory. Parent directories are created first.
    pub fn write_atomic(path: &Path, bytes: &[u8]) -> crate::common::Result<()> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => std::path::PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path)?;
        Ok(())
    }

    fn uri(s: &str) -> Result<PackURI> {
        PackURI::new(s).map_err(crate::ooxml::opc::error::OpcError::InvalidPackUri)
    }
}

/// Builder for `[Content_Types].xml`.
struct ContentTypesItem {
    defaults: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
}

impl ContentTypesItem {
    fn from_parts(parts: &[&dyn Part]) -> Self {
        let mut cti = Self {
            defaults: BTreeMap::new(),
            overrides: BTreeMap::new(),
        };
        cti.defaults
            .insert("rels".to_string(), ct::OPC_RELATIONSHIPS.to_string());
        cti.defaults.insert("xml".to_string(), ct::XML.to_string());

        for part in parts {
            let partname = part.partname();
            let ext = partname.ext().to_ascii_lowercase();
            let content_type = part.content_type();
            if Self::is_default_content_type(&ext, content_type) {
                cti.defaults.insert(ext, content_type.to_string());
            } else {
                cti.overrides
                    .insert(partname.to_string(), content_type.to_string());
            }
        }
        cti
    }

    fn is_default_content_type(ext: &str, content_type: &str) -> bool {
        matches!(
            (ext, content_type),
            ("rels", ct::OPC_RELATIONSHIPS)
                | ("xml", ct::XML)
                | ("png", "image/png")
                | ("jpg", "image/jpeg")
                | ("jpeg", "image/jpeg")
                | ("gif", "image/gif")
                | ("emf", "image/x-emf")
                | ("wmf", "image/x-wmf")
                | ("bmp", "image/bmp")
                | ("tiff", "image/tiff")
        )
    }

    fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(4096);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        );
        for (ext, content_type) in &self.defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape_attr(ext),
                escape_attr(content_type)
            ));
        }
        for (partname, content_type) in &self.overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape_attr(partname),
                escape_attr(content_type)
            ));
        }
        xml.push_str("</Types>");
        xml
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::part::BlobPart;

    #[test]
    fn test_content_types_xml() {
        let image = BlobPart::new(
            PackURI::new("/word/media/image1.png").unwrap(),
            "image/png".to_string(),
            vec![0x89, 0x50],
        );
        let doc = BlobPart::new(
            PackURI::new("/word/document.xml").unwrap(),
            ct::WML_DOCUMENT_MAIN.to_string(),
            Vec::new(),
        );
        let parts: Vec<&dyn Part> = vec![&image, &doc];
        let xml = ContentTypesItem::from_parts(&parts).to_xml();

        assert!(xml.contains(r#"<Default Extension="png" ContentType="image/png"/>"#));
        assert!(xml.contains(r#"<Override PartName="/word/document.xml""#));
        assert!(!xml.contains(r#"PartName="/word/media/image1.png""#));
    }

    #[test]
    fn test_write_atomic_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.bin");
        PackageWriter::write_atomic(&path, b"first").unwrap();
        PackageWriter::write_atomic(&path, b"second").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        // no temporary files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
