use crate::common::error::Result as DocResult;
use crate::common::xml::XmlDocument;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::rel::Relationships;
use once_cell::unsync::OnceCell;
/// Package parts.
///
/// Parts are the fundamental units of content in an OPC package, each with
/// a unique partname, content type, and optional relationships. XML parts
/// keep their original bytes and are parsed into an element tree only on
/// first access, so parts an operation never touches are written back
/// unchanged.
use std::borrow::Cow;

/// Trait representing a part in an OPC package.
pub trait Part: Send {
    fn partname(&self) -> &PackURI;

    fn content_type(&self) -> &str;

    /// Serialized content as it will be written to the container.
    fn blob(&self) -> Cow<'_, [u8]>;

    fn rels(&self) -> &Relationships;

    fn rels_mut(&mut self) -> &mut Relationships;

    /// XML view of the part, if it is an XML part.
    fn as_xml(&self) -> Option<&XmlPart> {
        None
    }

    fn as_xml_mut(&mut self) -> Option<&mut XmlPart> {
        None
    }

    /// Id of a relationship of `reltype` to `target`, reusing an existing
    /// one.
    fn relate_to(&mut self, target: &PackURI, reltype: &str) -> String {
        let target_ref = target.relative_ref(self.partname().base_uri());
        self.rels_mut().get_or_add(reltype, &target_ref)
    }

    /// Id of an external relationship, reusing an existing one for the same
    /// URL.
    fn relate_to_ext(&mut self, target_url: &str, reltype: &str) -> String {
        self.rels_mut().get_or_add_ext_rel(reltype, target_url)
    }

    /// Partname targeted by an internal relationship id.
    fn related_partname(&self, r_id: &str) -> Result<PackURI> {
        self.rels()
            .get(r_id)
            .ok_or_else(|| {
                OpcError::RelationshipNotFound(format!("{} in {}", r_id, self.partname()))
            })?
            .target_partname()
    }
}

/// Binary part (images, embedded objects, printer settings, ...).
#[derive(Debug)]
pub struct BlobPart {
    partname: PackURI,
    content_type: String,
    blob: Vec<u8>,
    rels: Relationships,
}

impl BlobPart {
    pub fn new(partname: PackURI, content_type: String, blob: Vec<u8>) -> Self {
        let rels = Relationships::new(partname.base_uri().to_string());
        Self {
            partname,
            content_type,
            blob,
            rels,
        }
    }
}

impl Part for BlobPart {
    fn partname(&self) -> &PackURI {
        &self.partname
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn blob(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(&self.blob)
    }

    fn rels(&self) -> &Relationships {
        &self.rels
    }

    fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }
}

/// An XML part with lazily parsed, mutable content.
#[derive(Debug)]
pub struct XmlPart {
    partname: PackURI,
    content_type: String,
    xml_bytes: Vec<u8>,
    rels: Relationships,
    document: OnceCell<XmlDocument>,
    modified: bool,
}

impl XmlPart {
    /// Wrap serialized XML as read from the container.
    pub fn new(partname: PackURI, content_type: String, xml_bytes: Vec<u8>) -> Self {
        let rels = Relationships::new(partname.base_uri().to_string());
        Self {
            partname,
            content_type,
            xml_bytes,
            rels,
            document: OnceCell::new(),
            modified: false,
        }
    }

    /// Build a part from an element tree; it is serialized on save.
    pub fn from_document(partname: PackURI, content_type: &str, document: XmlDocument) -> Self {
        let mut part = Self::new(partname, content_type.to_string(), Vec::new());
        part.document = OnceCell::with_value(document);
        part.modified = true;
        part
    }

    /// Parsed element tree, parsing on first access.
    pub fn document(&self) -> DocResult<&XmlDocument> {
        self.document
            .get_or_try_init(|| XmlDocument::parse(&self.xml_bytes))
    }

    /// Mutable element tree; the part is re-serialized on save.
    pub fn document_mut(&mut self) -> DocResult<&mut XmlDocument> {
        self.document()?;
        self.modified = true;
        match self.document.get_mut() {
            Some(doc) => Ok(doc),
            None => Err(crate::common::Error::corrupt(format!(
                "{} could not be parsed",
                self.partname
            ))),
        }
    }

    #[inline]
    pub fn is_modified(&self) -> bool {
        self.modified
    }
}

impl Part for XmlPart {
    fn partname(&self) -> &PackURI {
        &self.partname
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn blob(&self) -> Cow<'_, [u8]> {
        match (self.modified, self.document.get()) {
            (true, Some(doc)) => Cow::Owned(doc.to_bytes()),
            _ => Cow::Borrowed(&self.xml_bytes),
        }
    }

    fn rels(&self) -> &Relationships {
        &self.rels
    }

    fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }

    fn as_xml(&self) -> Option<&XmlPart> {
        Some(self)
    }

    fn as_xml_mut(&mut self) -> Option<&mut XmlPart> {
        Some(self)
    }
}

/// Selects the part implementation from the content type.
pub struct PartFactory;

impl PartFactory {
    pub fn load(partname: PackURI, content_type: String, blob: Vec<u8>) -> Box<dyn Part> {
        if Self::is_xml_content_type(&content_type) {
            Box::new(XmlPart::new(partname, content_type, blob))
        } else {
            Box::new(BlobPart::new(partname, content_type, blob))
        }
    }

    #[inline]
    fn is_xml_content_type(content_type: &str) -> bool {
        content_type.ends_with("+xml") || content_type.ends_with("/xml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::xml::XmlElement;

    #[test]
    fn test_untouched_xml_part_keeps_bytes() {
        let partname = PackURI::new("/word/document.xml").unwrap();
        let xml = b"<root  a='1'><text>Hello</text></root>".to_vec();
        let part = XmlPart::new(partname, "application/xml".to_string(), xml.clone());

        assert_eq!(part.document().unwrap().root.text(), "Hello");
        assert_eq!(part.blob().as_ref(), xml.as_slice());
    }

    #[test]
    fn test_modified_xml_part_reserializes() {
        let partname = PackURI::new("/word/document.xml").unwrap();
        let mut part = XmlPart::new(partname, "application/xml".to_string(), b"<root/>".to_vec());
        part.document_mut().unwrap().root.push(XmlElement::new("child"));

        let blob = String::from_utf8(part.blob().into_owned()).unwrap();
        assert!(blob.ends_with("<root><child/></root>"));
    }

    #[test]
    fn test_relate_to_uses_relative_ref() {
        let mut part = XmlPart::new(
            PackURI::new("/ppt/slides/slide1.xml").unwrap(),
            "application/xml".to_string(),
            Vec::new(),
        );
        let layout = PackURI::new("/ppt/slideLayouts/slideLayout2.xml").unwrap();
        let r_id = part.relate_to(&layout, "layout");
        assert_eq!(part.rels().get(&r_id).unwrap().target_ref(), "../slideLayouts/slideLayout2.xml");
        assert_eq!(part.related_partname(&r_id).unwrap(), layout);
    }

    #[test]
    fn test_is_xml_content_type() {
        assert!(PartFactory::is_xml_content_type("application/xml"));
        assert!(PartFactory::is_xml_content_type(
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"
        ));
        assert!(!PartFactory::is_xml_content_type("image/png"));
    }
}
