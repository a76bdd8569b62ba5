/// In-memory OPC package.
///
/// Holds every reachable part keyed by partname together with the package
/// relationship table. Format packages (`docx`, `xlsx`, `pptx`) wrap an
/// `OpcPackage` and navigate it through relationship ids.
use std::collections::{HashMap, HashSet};
use std::io::{Read, Seek};
use std::path::Path;

use crate::common::error::Result as DocResult;
use crate::common::xml::XmlDocument;
use crate::ooxml::opc::constants::relationship_type;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{PACKAGE_URI, PackURI};
use crate::ooxml::opc::part::{Part, PartFactory, XmlPart};
use crate::ooxml::opc::phys_pkg::PhysPkgReader;
use crate::ooxml::opc::pkgreader::PackageReader;
use crate::ooxml::opc::pkgwriter::PackageWriter;
use crate::ooxml::opc::rel::Relationships;

pub struct OpcPackage {
    rels: Relationships,
    parts: HashMap<String, Box<dyn Part>>,
}

impl OpcPackage {
    /// Create a new empty package.
    pub fn new() -> Self {
        Self {
            rels: Relationships::new(PACKAGE_URI.to_string()),
            parts: HashMap::new(),
        }
    }

    /// Open a package file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut phys_reader = PhysPkgReader::open(path)?;
        Self::from_phys_reader(&mut phys_reader)
    }

    /// Load a package from in-memory bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let mut phys_reader = PhysPkgReader::from_bytes(data)?;
        Self::from_phys_reader(&mut phys_reader)
    }

    fn from_phys_reader<R: Read + Seek>(phys_reader: &mut PhysPkgReader<R>) -> Result<Self> {
        let pkg_reader = PackageReader::from_phys_reader(phys_reader)?;
        Ok(Self::unmarshal(pkg_reader))
    }

    fn unmarshal(mut pkg_reader: PackageReader) -> Self {
        let mut package = Self::new();

        for srel in pkg_reader.take_pkg_srels() {
            let external = srel.is_external();
            package
                .rels
                .add_relationship(srel.reltype, srel.target_ref, srel.r_id, external);
        }

        for spart in pkg_reader.take_sparts() {
            let mut part = PartFactory::load(spart.partname, spart.content_type, spart.blob);
            for srel in spart.srels {
                let external = srel.is_external();
                part.rels_mut()
                    .add_relationship(srel.reltype, srel.target_ref, srel.r_id, external);
            }
            package.add_part(part);
        }

        package
    }

    /// Partname of the main document part (document.xml, workbook.xml,
    /// presentation.xml).
    pub fn main_partname(&self) -> Result<PackURI> {
        self.rels
            .part_with_reltype(relationship_type::OFFICE_DOCUMENT)?
            .target_partname()
    }

    pub fn part(&self, partname: &PackURI) -> Result<&dyn Part> {
        self.parts
            .get(partname.as_str())
            .map(|b| &**b as &dyn Part)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))
    }

    pub fn part_mut(&mut self, partname: &PackURI) -> Result<&mut dyn Part> {
        self.parts
            .get_mut(partname.as_str())
            .map(|b| &mut **b as &mut dyn Part)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))
    }

    pub fn xml_part(&self, partname: &PackURI) -> Result<&XmlPart> {
        self.part(partname)?
            .as_xml()
            .ok_or_else(|| OpcError::XmlError(format!("{} is not an XML part", partname)))
    }

    pub fn xml_part_mut(&mut self, partname: &PackURI) -> Result<&mut XmlPart> {
        self.part_mut(partname)?
            .as_xml_mut()
            .ok_or_else(|| OpcError::XmlError(format!("{} is not an XML part", partname)))
    }

    /// Parsed tree of an XML part.
    pub fn xml(&self, partname: &PackURI) -> DocResult<&XmlDocument> {
        self.xml_part(partname)?.document()
    }

    /// Mutable tree of an XML part; the part is re-serialized on save.
    pub fn xml_mut(&mut self, partname: &PackURI) -> DocResult<&mut XmlDocument> {
        self.xml_part_mut(partname)?.document_mut()
    }

    pub fn add_part(&mut self, part: Box<dyn Part>) {
        let partname = part.partname().to_string();
        self.parts.insert(partname, part);
    }

    /// Add a new XML part built from an element tree.
    pub fn add_xml_part(&mut self, partname: PackURI, content_type: &str, document: XmlDocument) {
        self.add_part(Box::new(XmlPart::from_document(
            partname,
            content_type,
            document,
        )));
    }

    pub fn remove_part(&mut self, partname: &PackURI) -> Option<Box<dyn Part>> {
        self.parts.remove(partname.as_str())
    }

    pub fn contains_part(&self, partname: &PackURI) -> bool {
        self.parts.contains_key(partname.as_str())
    }

    pub fn iter_parts(&self) -> impl Iterator<Item = &dyn Part> {
        self.parts.values().map(|b| &**b as &dyn Part)
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    pub fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }

    /// Relate the package itself to a part.
    pub fn relate_to(&mut self, partname: &PackURI, reltype: &str) -> String {
        self.rels.get_or_add(reltype, partname.membername())
    }

    /// Relate `source` to `target`, returning the relationship id.
    pub fn relate_parts(
        &mut self,
        source: &PackURI,
        target: &PackURI,
        reltype: &str,
    ) -> Result<String> {
        Ok(self.part_mut(source)?.relate_to(target, reltype))
    }

    /// Partname targeted by relationship `r_id` of part `source`.
    pub fn related_partname(&self, source: &PackURI, r_id: &str) -> Result<PackURI> {
        self.part(source)?.related_partname(r_id)
    }

    /// Partname of the single relationship of `reltype` from `source`.
    pub fn part_related_by(&self, source: &PackURI, reltype: &str) -> Result<PackURI> {
        self.part(source)?
            .rels()
            .part_with_reltype(reltype)?
            .target_partname()
    }

    /// First free partname for a template with a `%d` placeholder, e.g.
    /// `/ppt/slides/slide%d.xml`.
    pub fn next_partname(&self, template: &str) -> Result<PackURI> {
        let mut buf = itoa::Buffer::new();
        for n in 1u32..=10_000 {
            let candidate = template.replace("%d", buf.format(n));
            if !self.parts.contains_key(&candidate) {
                return PackURI::new(candidate).map_err(OpcError::InvalidPackUri);
            }
        }
        Err(OpcError::InvalidPackUri(format!(
            "no free partname for {}",
            template
        )))
    }

    /// Partnames reachable from the package relationships.
    pub fn reachable_partnames(&self) -> HashSet<String> {
        let mut visited = HashSet::new();
        let mut queue: Vec<PackURI> = self
            .rels
            .iter()
            .filter(|r| !r.is_external())
            .filter_map(|r| r.target_partname().ok())
            .collect();

        while let Some(partname) = queue.pop() {
            if !visited.insert(partname.to_string()) {
                continue;
            }
            if let Some(part) = self.parts.get(partname.as_str()) {
                queue.extend(
                    part.rels()
                        .iter()
                        .filter(|r| !r.is_external())
                        .filter_map(|r| r.target_partname().ok()),
                );
            }
        }
        visited
    }

    /// Drop parts no relationship chain reaches any more. Returns the
    /// number of parts removed.
    pub fn prune_unreachable(&mut self) -> usize {
        let reachable = self.reachable_partnames();
        let before = self.parts.len();
        self.parts.retain(|name, _| reachable.contains(name));
        let removed = before - self.parts.len();
        if removed > 0 {
            tracing::debug!(removed, "dropped unreachable parts");
        }
        removed
    }

    /// Serialize to container bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        PackageWriter::to_bytes(self)
    }

    /// Write the package to `path`, creating parent directories.
    ///
    /// The container is written to a sibling temporary file first and then
    /// renamed over the target, so a failure never leaves a partial file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> DocResult<()> {
        let bytes = self.to_bytes()?;
        PackageWriter::write_atomic(path.as_ref(), &bytes)
    }
}

impl Default for OpcPackage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::content_type as ct;
    use std::io::{Cursor, Write};
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn create_minimal_docx() -> Vec<u8> {
        let mut zip_data = Vec::new();
        {
            let cursor = Cursor::new(&mut zip_data);
            let mut writer = ZipWriter::new(cursor);
            let options = SimpleFileOptions::default();

            writer.start_file("[Content_Types].xml", options).unwrap();
            writer.write_all(br#"<?xml version="1.0"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#).unwrap();

            writer.start_file("_rels/.rels", options).unwrap();
            writer.write_all(br#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#).unwrap();

            writer.start_file("word/document.xml", options).unwrap();
            writer.write_all(br#"<?xml version="1.0"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>Test</w:t></w:r></w:p></w:body></w:document>"#).unwrap();

            // not referenced by any relationship
            writer.start_file("word/orphan.xml", options).unwrap();
            writer.write_all(b"<orphan/>").unwrap();

            writer.finish().unwrap();
        }
        zip_data
    }

    #[test]
    fn test_open_package() {
        let pkg = OpcPackage::from_bytes(create_minimal_docx()).unwrap();
        assert_eq!(pkg.part_count(), 1);

        let main = pkg.main_partname().unwrap();
        assert_eq!(main.as_str(), "/word/document.xml");
        assert_eq!(pkg.part(&main).unwrap().content_type(), ct::WML_DOCUMENT_MAIN);
        assert_eq!(pkg.xml(&main).unwrap().root.text(), "Test");
    }

    #[test]
    fn test_round_trip_and_prune() {
        let mut pkg = OpcPackage::from_bytes(create_minimal_docx()).unwrap();
        let main = pkg.main_partname().unwrap();

        let header = pkg.next_partname("/word/header%d.xml").unwrap();
        assert_eq!(header.as_str(), "/word/header1.xml");
        pkg.add_xml_part(
            header.clone(),
            ct::WML_HEADER,
            XmlDocument::parse(b"<w:hdr/>").unwrap(),
        );
        let r_id = pkg
            .relate_parts(&main, &header, relationship_type::HEADER)
            .unwrap();
        assert_eq!(r_id, "rId1");

        let reopened = OpcPackage::from_bytes(pkg.to_bytes().unwrap()).unwrap();
        assert!(reopened.contains_part(&header));
        assert_eq!(reopened.part(&header).unwrap().content_type(), ct::WML_HEADER);

        pkg.part_mut(&main).unwrap().rels_mut().remove(&r_id);
        assert_eq!(pkg.prune_unreachable(), 1);
        assert!(!pkg.contains_part(&header));
    }

    #[test]
    fn test_save_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested/deeper/out.docx");
        let pkg = OpcPackage::from_bytes(create_minimal_docx()).unwrap();
        pkg.save(&target).unwrap();

        let reopened = OpcPackage::open(&target).unwrap();
        assert_eq!(reopened.part_count(), 1);
    }

    #[test]
    fn test_open_errors() {
        assert!(matches!(
            OpcPackage::open("/no/such/file.pptx"),
            Err(OpcError::PackageNotFound(_))
        ));
        assert!(OpcPackage::from_bytes(b"not a zip".to_vec()).is_err());
    }
}
