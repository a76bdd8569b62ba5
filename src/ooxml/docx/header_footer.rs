//! Headers and footers of the first section.
//!
//! A section without its own default header (or footer) reference shows
//! the previous section's, Word's "link to previous". Unlinking adds a new
//! header part from the template and a `w:headerReference` pointing at it.

use crate::common::error::{Error, Result};
use crate::common::xml::{XmlDocument, XmlElement, XmlNode};
use crate::ooxml::docx::package::{Package, Prefixes};
use crate::ooxml::docx::paragraph::{new_paragraph, set_paragraph_text};
use crate::ooxml::docx::template;
use crate::ooxml::opc::PackURI;
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderFooterKind {
    Header,
    Footer,
}

impl HeaderFooterKind {
    fn reltype(self) -> &'static str {
        match self {
            HeaderFooterKind::Header => rt::HEADER,
            HeaderFooterKind::Footer => rt::FOOTER,
        }
    }

    fn content_type(self) -> &'static str {
        match self {
            HeaderFooterKind::Header => ct::WML_HEADER,
            HeaderFooterKind::Footer => ct::WML_FOOTER,
        }
    }

    fn partname_template(self) -> &'static str {
        match self {
            HeaderFooterKind::Header => "/word/header%d.xml",
            HeaderFooterKind::Footer => "/word/footer%d.xml",
        }
    }

    fn reference_name(self) -> &'static str {
        match self {
            HeaderFooterKind::Header => "headerReference",
            HeaderFooterKind::Footer => "footerReference",
        }
    }

    fn template_xml(self) -> &'static str {
        match self {
            HeaderFooterKind::Header => template::default_header_xml(),
            HeaderFooterKind::Footer => template::default_footer_xml(),
        }
    }
}

fn is_reference(e: &XmlElement) -> bool {
    e.is("headerReference") || e.is("footerReference")
}

/// Where the first section's `w:sectPr` lives.
#[derive(Clone, Copy)]
enum SectionLocation {
    /// Inside the `w:pPr` of the body child at this index
    Paragraph(usize),
    /// The body-level `w:sectPr` at this index
    Body(usize),
}

fn first_section(body: &XmlElement) -> Option<SectionLocation> {
    body.children.iter().enumerate().find_map(|(i, node)| match node {
        XmlNode::Element(e) if e.is("p") && e.path(&["pPr", "sectPr"]).is_some() => {
            Some(SectionLocation::Paragraph(i))
        },
        XmlNode::Element(e) if e.is("sectPr") => Some(SectionLocation::Body(i)),
        _ => None,
    })
}

fn section_mut(body: &mut XmlElement, location: SectionLocation) -> Option<&mut XmlElement> {
    let index = match location {
        SectionLocation::Paragraph(i) | SectionLocation::Body(i) => i,
    };
    let XmlNode::Element(e) = body.children.get_mut(index)? else {
        return None;
    };
    match location {
        SectionLocation::Paragraph(_) => e.path_mut(&["pPr", "sectPr"]),
        SectionLocation::Body(_) => Some(e),
    }
}

impl Package {
    /// First section properties, created at the end of the body when the
    /// document has none.
    fn first_section_mut(&mut self) -> Result<&mut XmlElement> {
        if first_section(self.body()?).is_none() {
            let mut sect_pr = XmlElement::new("w:sectPr");
            self.prefixes()?.conform(&mut sect_pr);
            self.body_mut()?.push(sect_pr);
        }
        let body = self.body_mut()?;
        let location = first_section(body);
        location
            .and_then(move |location| section_mut(body, location))
            .ok_or_else(|| Error::corrupt("section properties vanished"))
    }

    /// Partname of the first section's own default header/footer, if it has
    /// one that resolves to a part.
    fn own_definition(&mut self, kind: HeaderFooterKind) -> Result<Option<PackURI>> {
        let local = kind.reference_name();
        let sect_pr = self.first_section_mut()?;
        let Some(r_id) = sect_pr
            .children_named(local)
            .find(|r| r.attr_local("type") == Some("default"))
            .and_then(|r| r.attr_local("id"))
            .map(str::to_string)
        else {
            return Ok(None);
        };

        let main = self.main_partname().clone();
        let target = self
            .opc_package()
            .related_partname(&main, &r_id)
            .ok()
            .filter(|p| self.opc_package().contains_part(p));
        if target.is_none() {
            tracing::warn!(%r_id, "dangling header/footer reference dropped");
            self.first_section_mut()?.retain_elements(|e| {
                !(e.is(local) && e.attr_local("id") == Some(r_id.as_str()))
            });
        }
        Ok(target)
    }

    /// Add a header/footer part from the template and reference it as the
    /// first section's default.
    fn add_definition(&mut self, kind: HeaderFooterKind) -> Result<PackURI> {
        let partname = self
            .opc_package()
            .next_partname(kind.partname_template())?;
        let document = XmlDocument::parse(kind.template_xml().as_bytes())?;
        let main = self.main_partname().clone();

        let opc = self.opc_package_mut();
        opc.add_xml_part(partname.clone(), kind.content_type(), document);
        let r_id = opc.relate_parts(&main, &partname, kind.reltype())?;

        let mut reference = XmlElement::new(format!("w:{}", kind.reference_name()))
            .with_attr("w:type", "default")
            .with_attr("r:id", r_id.as_str());
        self.prefixes()?.conform(&mut reference);

        let sect_pr = self.first_section_mut()?;
        let index = sect_pr
            .children
            .iter()
            .position(|n| matches!(n, XmlNode::Element(e) if !is_reference(e)))
            .unwrap_or(sect_pr.children.len());
        sect_pr.insert(index, reference);

        tracing::debug!(part = %partname, %r_id, "header/footer definition added");
        Ok(partname)
    }

    /// Unlink the first section's header or footer from the previous
    /// section and make `text` its first paragraph's text.
    pub fn set_header_footer_text(&mut self, kind: HeaderFooterKind, text: &str) -> Result<()> {
        let partname = match self.own_definition(kind)? {
            Some(partname) => partname,
            None => self.add_definition(kind)?,
        };
        let root = &mut self.opc_package_mut().xml_mut(&partname)?.root;
        let prefixes = Prefixes::of(root);
        match root.child_mut("p") {
            Some(paragraph) => {
                prefixes.canonicalize(paragraph);
                set_paragraph_text(paragraph, text);
                prefixes.conform(paragraph);
            },
            None => {
                let mut paragraph = new_paragraph(text, None);
                prefixes.conform(&mut paragraph);
                root.push(paragraph);
            },
        }
        Ok(())
    }

    /// Text of the first paragraph of the first section's own header or
    /// footer.
    pub fn header_footer_text(&mut self, kind: HeaderFooterKind) -> Result<Option<String>> {
        let Some(partname) = self.own_definition(kind)? else {
            return Ok(None);
        };
        let root = &self.opc_package().xml(&partname)?.root;
        Ok(root
            .child("p")
            .map(crate::ooxml::docx::paragraph::paragraph_text))
    }
}
