/// Package implementation for Word documents.
use crate::common::error::{Error, Result};
use crate::common::xml::{XmlDocument, XmlElement};
use crate::ooxml::docx::template;
use crate::ooxml::metadata::{self, CoreProperties};
use crate::ooxml::opc::constants::{content_type as ct, namespace, relationship_type as rt};
use crate::ooxml::opc::{OpcPackage, PackURI};
use crate::ooxml::{namespace_prefix, relationship_prefix, uri};
use std::path::Path;

/// Main part content types accepted as Word documents.
const MAIN_CONTENT_TYPES: &[&str] = &[
    ct::WML_DOCUMENT_MAIN,
    ct::WML_TEMPLATE_MAIN,
    ct::WML_DOCUMENT_MACRO,
];

/// Prefixes a part binds to the WordprocessingML and relationships
/// namespaces.
///
/// Markup is built and edited with `w:` and `r:`; existing elements go
/// through [`canonicalize`](Self::canonicalize) before an edit and
/// everything through [`conform`](Self::conform) after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Prefixes {
    pub wml: String,
    pub rel: String,
}

impl Prefixes {
    /// Prefixes declared on `root`, declaring the missing ones.
    pub(crate) fn of(root: &mut XmlElement) -> Self {
        Self {
            wml: namespace_prefix(root, namespace::WML_MAIN, "w"),
            rel: relationship_prefix(root),
        }
    }

    pub(crate) fn canonicalize(&self, element: &mut XmlElement) {
        element.rename_prefix(&self.wml, "w");
        element.rename_prefix(&self.rel, "r");
    }

    pub(crate) fn conform(&self, element: &mut XmlElement) {
        element.rename_prefix("w", &self.wml);
        element.rename_prefix("r", &self.rel);
    }
}

/// A Word (.docx) package.
///
/// Wraps an OPC package and exposes the main document part; the block,
/// table, style, hyperlink and header/footer operations live in sibling
/// modules as further `impl Package` blocks.
pub struct Package {
    /// The underlying OPC package
    opc: OpcPackage,
    /// Partname of `word/document.xml`
    main: PackURI,
}

impl Package {
    /// Open a .docx package from a file path.
    ///
    /// Fails with `NotFound` when the file is missing and
    /// `CorruptContainer` when it is not a Word document.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let opc = OpcPackage::open(path)?;
        Self::from_opc(opc)
    }

    /// Load a .docx package from in-memory bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_opc(OpcPackage::from_bytes(data)?)
    }

    fn from_opc(opc: OpcPackage) -> Result<Self> {
        let main = opc
            .main_partname()
            .map_err(|e| Error::corrupt(format!("main document part: {}", e)))?;
        let content_type = opc
            .part(&main)
            .map_err(|e| Error::corrupt(format!("main document part: {}", e)))?
            .content_type();
        if !MAIN_CONTENT_TYPES.contains(&content_type) {
            return Err(Error::corrupt(format!(
                "not a Word document (main part is {})",
                content_type
            )));
        }
        Ok(Self { opc, main })
    }

    /// A new document in its default template state.
    pub fn new() -> Result<Self> {
        let mut opc = OpcPackage::new();
        let main = uri("/word/document.xml")?;

        opc.add_xml_part(
            main.clone(),
            ct::WML_DOCUMENT_MAIN,
            XmlDocument::parse(template::default_document_xml().as_bytes())?,
        );
        opc.relate_to(&main, rt::OFFICE_DOCUMENT);

        for (partname, content_type, reltype, xml) in [
            (
                "/word/styles.xml",
                ct::WML_STYLES,
                rt::STYLES,
                template::default_styles_xml(),
            ),
            (
                "/word/settings.xml",
                ct::WML_SETTINGS,
                rt::SETTINGS,
                template::default_settings_xml(),
            ),
        ] {
            let partname = uri(partname)?;
            opc.add_xml_part(partname.clone(), content_type, XmlDocument::parse(xml.as_bytes())?);
            opc.relate_parts(&main, &partname, reltype)?;
        }

        let core = CoreProperties::new(None, chrono::Utc::now());
        metadata::add_property_parts(&mut opc, &core)?;

        Ok(Self { opc, main })
    }

    /// Write the document to `path`, creating parent directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.opc.save(path)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.opc.to_bytes()?)
    }

    #[inline]
    pub fn main_partname(&self) -> &PackURI {
        &self.main
    }

    #[inline]
    pub fn opc_package(&self) -> &OpcPackage {
        &self.opc
    }

    #[inline]
    pub fn opc_package_mut(&mut self) -> &mut OpcPackage {
        &mut self.opc
    }

    /// Parsed `word/document.xml`.
    pub fn document(&self) -> Result<&XmlDocument> {
        self.opc.xml(&self.main)
    }

    pub fn document_mut(&mut self) -> Result<&mut XmlDocument> {
        self.opc.xml_mut(&self.main)
    }

    /// The `w:body` element.
    pub fn body(&self) -> Result<&XmlElement> {
        self.document()?
            .root
            .child("body")
            .ok_or_else(|| Error::corrupt("document has no w:body"))
    }

    pub fn body_mut(&mut self) -> Result<&mut XmlElement> {
        self.document_mut()?
            .root
            .child_mut("body")
            .ok_or_else(|| Error::corrupt("document has no w:body"))
    }

    /// Prefixes of `word/document.xml`.
    pub(crate) fn prefixes(&mut self) -> Result<Prefixes> {
        Ok(Prefixes::of(&mut self.document_mut()?.root))
    }

    /// Partname of the part related to the main document by `reltype`, if
    /// there is exactly one.
    pub(crate) fn related_part(&self, reltype: &str) -> Option<PackURI> {
        let partname = self.opc.part_related_by(&self.main, reltype).ok()?;
        self.opc.contains_part(&partname).then_some(partname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_round_trip() {
        let pkg = Package::new().unwrap();
        assert_eq!(pkg.main_partname().as_str(), "/word/document.xml");
        assert!(pkg.related_part(rt::STYLES).is_some());

        let reopened = Package::from_bytes(pkg.to_bytes().unwrap()).unwrap();
        assert!(reopened.body().unwrap().child("sectPr").is_some());
    }

    #[test]
    fn test_open_rejects_other_formats() {
        let xlsx = crate::ooxml::xlsx::Package::new().unwrap();
        let err = Package::from_bytes(xlsx.to_bytes().unwrap()).err().unwrap();
        assert_eq!(err.code(), "CORRUPT_CONTAINER");
    }

    #[test]
    fn test_open_missing_file() {
        let err = Package::open("/definitely/not/here.docx").err().unwrap();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
