//! Document property parts shared by the three formats.
//!
//! New packages get `docProps/core.xml` (Dublin Core metadata) and
//! `docProps/app.xml` (extended properties), both related from the package.

use crate::common::error::{Error, Result};
use crate::common::xml::{XmlDocument, XmlElement, escape_text};
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::opc::{OpcPackage, PackURI};
use chrono::{DateTime, SecondsFormat, Utc};

const CORE_PARTNAME: &str = "/docProps/core.xml";
const APP_PARTNAME: &str = "/docProps/app.xml";

/// Name written as creator and last editor of generated documents.
pub const GENERATOR: &str = "office-service";

/// Core properties of a newly created document.
#[derive(Debug, Clone)]
pub struct CoreProperties {
    pub title: Option<String>,
    pub creator: String,
    pub revision: u32,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl CoreProperties {
    pub fn new(title: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            title,
            creator: GENERATOR.to_string(),
            revision: 1,
            created: now,
            modified: now,
        }
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(1024);
        xml.push_str(
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
        );
        if let Some(title) = &self.title {
            xml.push_str("<dc:title>");
            xml.push_str(&escape_text(title));
            xml.push_str("</dc:title>");
        }
        let creator = escape_text(&self.creator);
        xml.push_str(&format!(
            "<dc:creator>{creator}</dc:creator><cp:lastModifiedBy>{creator}</cp:lastModifiedBy><cp:revision>{}</cp:revision>",
            self.revision
        ));
        xml.push_str(&format!(
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created><dcterms:modified xsi:type="dcterms:W3CDTF">{}</dcterms:modified>"#,
            w3cdtf(&self.created),
            w3cdtf(&self.modified)
        ));
        xml.push_str("</cp:coreProperties>");
        xml
    }
}

fn w3cdtf(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn partname(uri: &str) -> Result<PackURI> {
    PackURI::new(uri).map_err(Error::corrupt)
}

/// Extended properties written into new packages.
pub fn default_app_xml() -> &'static str {
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/common/app.xml"))
}

/// Office theme shared by new workbooks, presentations and notes masters.
pub fn default_theme_xml() -> &'static str {
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/common/theme1.xml"))
}

/// Add core and extended property parts to a package being built from
/// scratch.
pub fn add_property_parts(opc: &mut OpcPackage, core: &CoreProperties) -> Result<()> {
    let core_uri = partname(CORE_PARTNAME)?;
    opc.add_xml_part(
        core_uri.clone(),
        ct::OPC_CORE_PROPERTIES,
        XmlDocument::parse(core.to_xml().as_bytes())?,
    );
    opc.relate_to(&core_uri, rt::CORE_PROPERTIES);

    let app_uri = partname(APP_PARTNAME)?;
    opc.add_xml_part(
        app_uri.clone(),
        ct::OFC_EXTENDED_PROPERTIES,
        XmlDocument::parse(default_app_xml().as_bytes())?,
    );
    opc.relate_to(&app_uri, rt::EXTENDED_PROPERTIES);
    Ok(())
}

/// Stamp `dcterms:modified` and `cp:lastModifiedBy` on an existing core
/// properties part. Packages without one are left alone.
pub fn touch_modified(opc: &mut OpcPackage, now: DateTime<Utc>) -> Result<()> {
    let Ok(rel) = opc.rels().part_with_reltype(rt::CORE_PROPERTIES) else {
        return Ok(());
    };
    let core_uri = rel.target_partname()?;
    if !opc.contains_part(&core_uri) {
        return Ok(());
    }
    let root = &mut opc.xml_mut(&core_uri)?.root;

    let stamp = w3cdtf(&now);
    match root.child_mut("modified") {
        Some(modified) => modified.set_text(stamp),
        None => root.push(
            XmlElement::new("dcterms:modified")
                .with_attr("xsi:type", "dcterms:W3CDTF")
                .with_text(stamp),
        ),
    }
    if root.attr("xmlns:xsi").is_none() {
        root.set_attr("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance");
    }
    if root.attr("xmlns:dcterms").is_none() {
        root.set_attr("xmlns:dcterms", "http://purl.org/dc/terms/");
    }
    match root.child_mut("lastModifiedBy") {
        Some(by) => by.set_text(GENERATOR),
        None => root.push(XmlElement::new("cp:lastModifiedBy").with_text(GENERATOR)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_core_properties_xml() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let core = CoreProperties::new(Some("Q&A".to_string()), now);
        let xml = core.to_xml();
        assert!(xml.contains("<dc:title>Q&amp;A</dc:title>"));
        assert!(xml.contains(">2024-05-01T12:30:00Z</dcterms:created>"));

        let doc = XmlDocument::parse(xml.as_bytes()).unwrap();
        assert_eq!(doc.root.child("revision").unwrap().text(), "1");
    }

    #[test]
    fn test_add_and_touch() {
        let mut opc = OpcPackage::new();
        let then = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        add_property_parts(&mut opc, &CoreProperties::new(None, then)).unwrap();
        assert_eq!(opc.part_count(), 2);

        let later = Utc.with_ymd_and_hms(2021, 2, 3, 4, 5, 6).unwrap();
        touch_modified(&mut opc, later).unwrap();
        let core = opc.xml(&PackURI::new(CORE_PARTNAME).unwrap()).unwrap();
        assert_eq!(core.root.child("modified").unwrap().text(), "2021-02-03T04:05:06Z");
        assert_eq!(core.root.child("created").unwrap().text(), "2020-01-01T00:00:00Z");
    }
}
