//! Speaker notes.
//!
//! A slide's notes live in a notes slide part related to the slide. The
//! notes slide in turn needs the presentation's notes master, which new
//! presentations do not have until the first notes are written.

use super::package::{Package, PRESENTATION_ORDER, SlideRef};
use super::{shapes, template, text};
use crate::common::error::Result;
use crate::common::xml::{XmlDocument, XmlElement};
use crate::ooxml::metadata;
use crate::ooxml::opc::PackURI;
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::{qualified_name, relationship_prefix};
use tracing::debug;

/// Whether a shape is the notes body placeholder.
fn is_notes_body(shape: &XmlElement) -> bool {
    shape.is("sp") && shapes::placeholder_key(shape).is_some_and(|key| key.ph_type == "body")
}

impl Package {
    /// Notes slide of `slide`, if it has one.
    pub fn notes_slide(&self, slide: &SlideRef) -> Option<PackURI> {
        let opc = self.opc_package();
        opc.part_related_by(&slide.partname, rt::NOTES_SLIDE)
            .ok()
            .filter(|partname| opc.contains_part(partname))
    }

    /// Text of the notes body, empty when the slide has no notes.
    pub fn notes_text(&self, slide: &SlideRef) -> Result<String> {
        let Some(notes) = self.notes_slide(slide) else {
            return Ok(String::new());
        };
        Ok(shapes::shapes(self.shape_tree(&notes)?)
            .find(|s| is_notes_body(s))
            .and_then(shapes::shape_text)
            .unwrap_or_default())
    }

    /// Replace the whole notes text of a slide, creating the notes slide
    /// when needed.
    pub fn set_notes_text(&mut self, slide: &SlideRef, value: &str) -> Result<()> {
        let notes = self.ensure_notes_slide(slide)?;
        let tree = self.shape_tree_mut(&notes)?;
        if !tree.elements().any(is_notes_body) {
            let id = shapes::max_shape_id(tree) + 1;
            tree.push(notes_placeholder(id, value));
            return Ok(());
        }
        if let Some(body) = tree.elements_mut().find(|s| is_notes_body(s)) {
            shapes::set_shape_text(body, value);
        }
        Ok(())
    }

    fn ensure_notes_slide(&mut self, slide: &SlideRef) -> Result<PackURI> {
        if let Some(existing) = self.notes_slide(slide) {
            return Ok(existing);
        }
        let master = self.ensure_notes_master()?;

        let opc = self.opc_package_mut();
        let partname = opc.next_partname("/ppt/notesSlides/notesSlide%d.xml")?;
        opc.add_xml_part(
            partname.clone(),
            ct::PML_NOTES_SLIDE,
            XmlDocument::parse(template::default_notes_slide_xml().as_bytes())?,
        );
        opc.relate_parts(&partname, &master, rt::NOTES_MASTER)?;
        opc.relate_parts(&partname, &slide.partname, rt::SLIDE)?;
        opc.relate_parts(&slide.partname, &partname, rt::NOTES_SLIDE)?;
        debug!(slide = %slide.partname, partname = %partname, "created notes slide");
        Ok(partname)
    }

    /// The notes master, created with its own theme when missing.
    fn ensure_notes_master(&mut self) -> Result<PackURI> {
        let main = self.main_partname().clone();
        let opc = self.opc_package_mut();
        if let Ok(existing) = opc.part_related_by(&main, rt::NOTES_MASTER) {
            if opc.contains_part(&existing) {
                return Ok(existing);
            }
        }

        let partname = opc.next_partname("/ppt/notesMasters/notesMaster%d.xml")?;
        opc.add_xml_part(
            partname.clone(),
            ct::PML_NOTES_MASTER,
            XmlDocument::parse(template::default_notes_master_xml().as_bytes())?,
        );
        let theme = opc.next_partname("/ppt/theme/theme%d.xml")?;
        opc.add_xml_part(
            theme.clone(),
            ct::OFC_THEME,
            XmlDocument::parse(metadata::default_theme_xml().as_bytes())?,
        );
        opc.relate_parts(&partname, &theme, rt::THEME)?;
        let r_id = opc.relate_parts(&main, &partname, rt::NOTES_MASTER)?;

        let root = self.presentation_mut()?;
        let r_attr = format!("{}:id", relationship_prefix(root));
        let entry_name = qualified_name(root.prefix(), "notesMasterId");
        let list_name = qualified_name(root.prefix(), "notesMasterIdLst");
        let list = root.get_or_insert_ordered(&list_name, PRESENTATION_ORDER);
        list.remove_children("notesMasterId");
        list.push(XmlElement::new(entry_name).with_attr(&r_attr, r_id));
        debug!(partname = %partname, theme = %theme, "created notes master");
        Ok(partname)
    }
}

/// Notes body placeholder for notes slides that lack one.
fn notes_placeholder(id: u32, value: &str) -> XmlElement {
    XmlElement::new("p:sp")
        .with_child(
            XmlElement::new("p:nvSpPr")
                .with_child(
                    XmlElement::new("p:cNvPr")
                        .with_attr("id", id.to_string())
                        .with_attr("name", format!("Notes Placeholder {}", id.saturating_sub(1))),
                )
                .with_child(
                    XmlElement::new("p:cNvSpPr")
                        .with_child(XmlElement::new("a:spLocks").with_attr("noGrp", "1")),
                )
                .with_child(
                    XmlElement::new("p:nvPr").with_child(
                        XmlElement::new("p:ph")
                            .with_attr("type", "body")
                            .with_attr("idx", "1"),
                    ),
                ),
        )
        .with_child(XmlElement::new("p:spPr"))
        .with_child(text::new_body("p:txBody", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::Part;

    fn deck(slides: usize) -> (Package, Vec<SlideRef>) {
        let mut pkg = Package::new().unwrap();
        let layout = pkg.default_layout().unwrap();
        let refs = (0..slides).map(|_| pkg.add_slide(&layout).unwrap()).collect();
        (pkg, refs)
    }

    #[test]
    fn test_slide_without_notes() {
        let (pkg, slides) = deck(1);
        assert!(pkg.notes_slide(&slides[0]).is_none());
        assert_eq!(pkg.notes_text(&slides[0]).unwrap(), "");
    }

    #[test]
    fn test_set_notes_creates_master_once() {
        let (mut pkg, slides) = deck(2);
        pkg.set_notes_text(&slides[0], "first\nsecond").unwrap();
        pkg.set_notes_text(&slides[1], "other").unwrap();
        pkg.set_notes_text(&slides[0], "replaced").unwrap();

        let pkg = Package::from_bytes(pkg.to_bytes().unwrap()).unwrap();
        assert_eq!(pkg.notes_text(&slides[0]).unwrap(), "replaced");
        assert_eq!(pkg.notes_text(&slides[1]).unwrap(), "other");

        let opc = pkg.opc_package();
        let masters = opc
            .part(pkg.main_partname())
            .unwrap()
            .rels()
            .all_with_reltype(rt::NOTES_MASTER)
            .len();
        assert_eq!(masters, 1);
        let master = opc.part_related_by(pkg.main_partname(), rt::NOTES_MASTER).unwrap();
        let theme = opc.part_related_by(&master, rt::THEME).unwrap();
        assert_eq!(theme.as_str(), "/ppt/theme/theme2.xml");
        assert!(
            pkg.presentation()
                .unwrap()
                .path(&["notesMasterIdLst", "notesMasterId"])
                .is_some()
        );
    }

    #[test]
    fn test_notes_body_recreated() {
        let (mut pkg, slides) = deck(1);
        pkg.set_notes_text(&slides[0], "x").unwrap();
        let notes = pkg.notes_slide(&slides[0]).unwrap();
        pkg.shape_tree_mut(&notes)
            .unwrap()
            .retain_elements(|e| !is_notes_body(e));
        assert_eq!(pkg.notes_text(&slides[0]).unwrap(), "");

        pkg.set_notes_text(&slides[0], "back").unwrap();
        assert_eq!(pkg.notes_text(&slides[0]).unwrap(), "back");
    }
}
