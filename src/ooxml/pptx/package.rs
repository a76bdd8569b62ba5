/// Package implementation for PowerPoint presentations.
use super::shapes;
use super::template;
use crate::common::error::{Error, Result};
use crate::common::xml::{XmlDocument, XmlElement};
use crate::ooxml::metadata::{self, CoreProperties};
use crate::ooxml::opc::constants::{content_type as ct, namespace, relationship_type as rt};
use crate::ooxml::opc::{OpcPackage, PackURI};
use crate::ooxml::{qualified_name, relationship_attr, relationship_prefix, uri};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Main part content types accepted as presentations.
const MAIN_CONTENT_TYPES: &[&str] = &[
    ct::PML_PRESENTATION_MAIN,
    ct::PML_SLIDESHOW_MAIN,
    ct::PML_PRESENTATION_MACRO,
];

/// Child sequence of `CT_Presentation`.
pub(crate) const PRESENTATION_ORDER: &[&str] = &[
    "sldMasterIdLst",
    "notesMasterIdLst",
    "handoutMasterIdLst",
    "sldIdLst",
    "sldSz",
    "notesSz",
    "smartTags",
    "embeddedFontLst",
    "custShowLst",
    "photoAlbum",
    "custDataLst",
    "kinsoku",
    "defaultTextStyle",
    "modifyVerifier",
    "extLst",
];

/// Slide ids start here; lower values are reserved.
const MIN_SLIDE_ID: u32 = 256;

/// Layout new slides are created from ("Title and Content").
const DEFAULT_LAYOUT_INDEX: usize = 1;

/// One entry of the presentation's slide list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideRef {
    /// `p:sldId/@id`, unique within the presentation
    pub id: u32,
    /// Relationship from the presentation part to the slide part
    pub r_id: String,
    pub partname: PackURI,
}

/// A PowerPoint (.pptx) package.
pub struct Package {
    opc: OpcPackage,
    /// Partname of `ppt/presentation.xml`
    main: PackURI,
}

impl Package {
    /// Open a .pptx package from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_opc(OpcPackage::open(path)?)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_opc(OpcPackage::from_bytes(data)?)
    }

    fn from_opc(opc: OpcPackage) -> Result<Self> {
        let main = opc
            .main_partname()
            .map_err(|e| Error::corrupt(format!("main presentation part: {}", e)))?;
        let content_type = opc
            .part(&main)
            .map_err(|e| Error::corrupt(format!("main presentation part: {}", e)))?
            .content_type();
        if !MAIN_CONTENT_TYPES.contains(&content_type) {
            return Err(Error::corrupt(format!(
                "not a presentation (main part is {})",
                content_type
            )));
        }
        Ok(Self { opc, main })
    }

    /// A new, empty 4:3 presentation with one master, the standard
    /// layouts and a theme.
    pub fn new() -> Result<Self> {
        let mut opc = OpcPackage::new();
        let main = uri("/ppt/presentation.xml")?;
        opc.add_xml_part(
            main.clone(),
            ct::PML_PRESENTATION_MAIN,
            XmlDocument::parse(template::default_presentation_xml().as_bytes())?,
        );
        opc.relate_to(&main, rt::OFFICE_DOCUMENT);

        // The master must come first: the presentation template refers to
        // it as rId1, and the master's layout list to rId1..rId11.
        let master = uri("/ppt/slideMasters/slideMaster1.xml")?;
        opc.add_xml_part(
            master.clone(),
            ct::PML_SLIDE_MASTER,
            XmlDocument::parse(template::default_slide_master_xml().as_bytes())?,
        );
        opc.relate_parts(&main, &master, rt::SLIDE_MASTER)?;

        for (n, xml) in template::slide_layouts().iter().enumerate() {
            let layout = uri(&format!("/ppt/slideLayouts/slideLayout{}.xml", n + 1))?;
            opc.add_xml_part(
                layout.clone(),
                ct::PML_SLIDE_LAYOUT,
                XmlDocument::parse(xml.as_bytes())?,
            );
            opc.relate_parts(&master, &layout, rt::SLIDE_LAYOUT)?;
            opc.relate_parts(&layout, &master, rt::SLIDE_MASTER)?;
        }

        let theme = uri("/ppt/theme/theme1.xml")?;
        opc.add_xml_part(
            theme.clone(),
            ct::OFC_THEME,
            XmlDocument::parse(metadata::default_theme_xml().as_bytes())?,
        );
        opc.relate_parts(&master, &theme, rt::THEME)?;

        for (partname, content_type, reltype, xml) in [
            (
                "/ppt/presProps.xml",
                ct::PML_PRES_PROPS,
                rt::PRES_PROPS,
                template::default_pres_props_xml(),
            ),
            (
                "/ppt/viewProps.xml",
                ct::PML_VIEW_PROPS,
                rt::VIEW_PROPS,
                template::default_view_props_xml(),
            ),
            (
                "/ppt/tableStyles.xml",
                ct::PML_TABLE_STYLES,
                rt::TABLE_STYLES,
                template::default_table_styles_xml(),
            ),
        ] {
            let partname = uri(partname)?;
            opc.add_xml_part(partname.clone(), content_type, XmlDocument::parse(xml.as_bytes())?);
            opc.relate_parts(&main, &partname, reltype)?;
        }
        opc.relate_parts(&main, &theme, rt::THEME)?;

        let core = CoreProperties::new(None, chrono::Utc::now());
        metadata::add_property_parts(&mut opc, &core)?;

        Ok(Self { opc, main })
    }

    /// Write the presentation to `path`, creating parent directories.
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

    /// The `p:presentation` element.
    pub fn presentation(&self) -> Result<&XmlElement> {
        Ok(&self.opc.xml(&self.main)?.root)
    }

    pub(crate) fn presentation_mut(&mut self) -> Result<&mut XmlElement> {
        Ok(&mut self.opc.xml_mut(&self.main)?.root)
    }

    /// Slides in presentation order.
    pub fn slides(&self) -> Result<Vec<SlideRef>> {
        let Some(list) = self.presentation()?.child("sldIdLst") else {
            return Ok(Vec::new());
        };
        list.children_named("sldId")
            .map(|entry| -> Result<SlideRef> {
                let id = entry
                    .attr("id")
                    .and_then(|v| atoi_simd::parse::<u32>(v.as_bytes()).ok())
                    .ok_or_else(|| Error::corrupt("slide entry without a numeric id"))?;
                let r_id = relationship_attr(entry, "id")
                    .ok_or_else(|| Error::corrupt(format!("slide {} has no r:id", id)))?;
                Ok(SlideRef {
                    id,
                    r_id: r_id.to_string(),
                    partname: self.opc.related_partname(&self.main, r_id)?,
                })
            })
            .collect()
    }

    /// Resolve a 0-based slide index.
    pub fn slide(&self, index: i64) -> Result<SlideRef> {
        let slides = self.slides()?;
        usize::try_from(index)
            .ok()
            .and_then(|i| slides.get(i))
            .cloned()
            .ok_or(Error::OutOfRange {
                what: "slide",
                index,
                count: slides.len(),
            })
    }

    /// The `p:spTree` of a slide, layout, master or notes part.
    pub fn shape_tree(&self, partname: &PackURI) -> Result<&XmlElement> {
        self.opc
            .xml(partname)?
            .root
            .path(&["cSld", "spTree"])
            .ok_or_else(|| Error::corrupt(format!("{} has no shape tree", partname)))
    }

    pub(crate) fn shape_tree_mut(&mut self, partname: &PackURI) -> Result<&mut XmlElement> {
        self.opc
            .xml_mut(partname)?
            .root
            .path_mut(&["cSld", "spTree"])
            .ok_or_else(|| Error::corrupt(format!("{} has no shape tree", partname)))
    }

    fn first_master(&self) -> Result<PackURI> {
        let r_id = self
            .presentation()?
            .path(&["sldMasterIdLst", "sldMasterId"])
            .and_then(|e| relationship_attr(e, "id"))
            .ok_or_else(|| Error::corrupt("presentation has no slide master"))?;
        Ok(self.opc.related_partname(&self.main, r_id)?)
    }

    /// Layouts of the first slide master, in master order.
    pub fn slide_layouts(&self) -> Result<Vec<PackURI>> {
        let master = self.first_master()?;
        let root = &self.opc.xml(&master)?.root;
        let Some(list) = root.child("sldLayoutIdLst") else {
            return Ok(Vec::new());
        };
        list.children_named("sldLayoutId")
            .filter_map(|e| relationship_attr(e, "id"))
            .map(|r_id| -> Result<PackURI> { Ok(self.opc.related_partname(&master, r_id)?) })
            .collect()
    }

    /// The "Title and Content" layout, or the first layout when the master
    /// has only one.
    pub fn default_layout(&self) -> Result<PackURI> {
        let mut layouts = self.slide_layouts()?;
        if layouts.len() > DEFAULT_LAYOUT_INDEX {
            return Ok(layouts.swap_remove(DEFAULT_LAYOUT_INDEX));
        }
        warn!(
            layouts = layouts.len(),
            "master has no title and content layout, using its first layout"
        );
        layouts
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound("slide layout".to_string()))
    }

    /// Layout a slide was created from.
    pub fn layout_of(&self, slide: &SlideRef) -> Result<PackURI> {
        Ok(self.opc.part_related_by(&slide.partname, rt::SLIDE_LAYOUT)?)
    }

    /// `p:cSld/@name` of a layout.
    pub fn layout_name(&self, layout: &PackURI) -> Result<String> {
        Ok(self
            .opc
            .xml(layout)?
            .root
            .child("cSld")
            .and_then(|c| c.attr("name"))
            .unwrap_or_default()
            .to_string())
    }

    /// Master a layout belongs to.
    pub(crate) fn master_of(&self, layout: &PackURI) -> Result<PackURI> {
        Ok(self.opc.part_related_by(layout, rt::SLIDE_MASTER)?)
    }

    /// Append a slide built from `layout`, with empty copies of the
    /// layout's content placeholders.
    pub fn add_slide(&mut self, layout: &PackURI) -> Result<SlideRef> {
        let placeholders = shapes::clone_layout_placeholders(self.shape_tree(layout)?, 2);

        let mut doc = XmlDocument::parse(template::default_slide_xml().as_bytes())?;
        let tree = doc
            .root
            .path_mut(&["cSld", "spTree"])
            .ok_or_else(|| Error::corrupt("slide template has no shape tree"))?;
        for sp in placeholders {
            tree.push(sp);
        }

        let partname = self.opc.next_partname("/ppt/slides/slide%d.xml")?;
        self.opc.add_xml_part(partname.clone(), ct::PML_SLIDE, doc);
        self.opc.relate_parts(&partname, layout, rt::SLIDE_LAYOUT)?;
        let r_id = self.opc.relate_parts(&self.main, &partname, rt::SLIDE)?;

        let id = self
            .slides()?
            .iter()
            .map(|s| s.id + 1)
            .max()
            .unwrap_or(MIN_SLIDE_ID)
            .max(MIN_SLIDE_ID);
        let root = self.presentation_mut()?;
        let r_attr = format!("{}:id", relationship_prefix(root));
        let entry_name = qualified_name(root.prefix(), "sldId");
        let list_name = qualified_name(root.prefix(), "sldIdLst");
        root.get_or_insert_ordered(&list_name, PRESENTATION_ORDER).push(
            XmlElement::new(entry_name)
                .with_attr("id", id.to_string())
                .with_attr(&r_attr, r_id.as_str()),
        );
        debug!(partname = %partname, layout = %layout, id, "added slide");

        Ok(SlideRef { id, r_id, partname })
    }

    /// Remove a slide from the slide list, section lists and custom shows,
    /// and release its relationship. The slide part and its notes are
    /// dropped with it.
    pub fn delete_slide(&mut self, slide: &SlideRef) -> Result<()> {
        let id = slide.id.to_string();
        let root = self.presentation_mut()?;
        if let Some(list) = root.child_mut("sldIdLst") {
            list.retain_elements(|e| !(e.is("sldId") && e.attr("id") == Some(id.as_str())));
        }
        root.walk_mut(&mut |e: &mut XmlElement| {
            if e.is("section") {
                if let Some(list) = e.child_mut("sldIdLst") {
                    list.retain_elements(|s| s.attr("id") != Some(id.as_str()));
                }
            } else if e.is("custShow") {
                if let Some(list) = e.child_mut("sldLst") {
                    list.retain_elements(|s| relationship_attr(s, "id") != Some(slide.r_id.as_str()));
                }
            }
        });

        self.opc.part_mut(&self.main)?.rels_mut().remove(&slide.r_id);
        let dropped = self.opc.prune_unreachable();
        debug!(partname = %slide.partname, r_id = %slide.r_id, dropped, "deleted slide");
        Ok(())
    }

    /// Append a copy of `source`: a new slide on the same layout whose shape
    /// tree receives deep copies of every source shape.
    ///
    /// Layout placeholders that a copied placeholder replaces are removed,
    /// shape ids are renumbered, and relationships referenced by the copies
    /// are re-created on the new slide.
    pub fn duplicate_slide(&mut self, source: &SlideRef) -> Result<SlideRef> {
        let layout = self.layout_of(source)?;
        let source_root = &self.opc.xml(&source.partname)?.root;
        let declarations: Vec<(String, String)> = source_root
            .attrs
            .iter()
            .filter(|(k, _)| k.starts_with("xmlns"))
            .cloned()
            .collect();
        let r_prefix = declarations
            .iter()
            .find(|(_, v)| v == namespace::OFC_RELATIONSHIPS)
            .and_then(|(k, _)| k.strip_prefix("xmlns:"))
            .unwrap_or("r")
            .to_string();
        let mut copies: Vec<XmlElement> = shapes::shapes(self.shape_tree(&source.partname)?)
            .cloned()
            .collect();

        let copy = self.add_slide(&layout)?;

        // Relationships the copies point at, re-created on the new slide.
        let mut referenced = Vec::new();
        for element in &copies {
            for e in std::iter::once(element).chain(element.descendants()) {
                for (k, v) in &e.attrs {
                    if k.split_once(':').is_some_and(|(p, _)| p == r_prefix) {
                        referenced.push(v.clone());
                    }
                }
            }
        }
        let mut remap: HashMap<String, String> = HashMap::new();
        for old in referenced {
            if remap.contains_key(&old) {
                continue;
            }
            let Some(rel) = self.opc.part(&source.partname)?.rels().get(&old) else {
                warn!(r_id = %old, "copied shape refers to a missing relationship");
                continue;
            };
            let reltype = rel.reltype().to_string();
            let new_id = if rel.is_external() {
                let target = rel.target_ref().to_string();
                self.opc
                    .part_mut(&copy.partname)?
                    .relate_to_ext(&target, &reltype)
            } else {
                let target = rel.target_partname()?;
                self.opc.relate_parts(&copy.partname, &target, &reltype)?
            };
            remap.insert(old, new_id);
        }

        let mut next_id = shapes::max_shape_id(self.shape_tree(&copy.partname)?) + 1;
        let mut ids: HashMap<String, String> = HashMap::new();
        for element in &mut copies {
            element.walk_mut(&mut |e: &mut XmlElement| {
                if e.is("cNvPr") {
                    if let Some(old) = e.attr("id").map(str::to_string) {
                        let new = next_id.to_string();
                        next_id += 1;
                        e.set_attr("id", new.as_str());
                        ids.insert(old, new);
                    }
                }
                for (k, v) in e.attrs.iter_mut() {
                    if k.split_once(':').is_some_and(|(p, _)| p == r_prefix) {
                        if let Some(new) = remap.get(v.as_str()) {
                            *v = new.clone();
                        }
                    }
                }
            });
        }
        for element in &mut copies {
            element.walk_mut(&mut |e: &mut XmlElement| {
                if e.is("stCxn") || e.is("endCxn") {
                    if let Some(new) = e.attr("id").and_then(|old| ids.get(old)).cloned() {
                        e.set_attr("id", new);
                    }
                }
            });
        }

        let replaced: Vec<shapes::PlaceholderKey> =
            copies.iter().filter_map(shapes::placeholder_key).collect();
        let root = &mut self.opc.xml_mut(&copy.partname)?.root;
        for (k, v) in declarations {
            if root.attr(&k).is_none() {
                root.set_attr(&k, v);
            }
        }
        let tree = root
            .path_mut(&["cSld", "spTree"])
            .ok_or_else(|| Error::corrupt("new slide has no shape tree"))?;
        tree.retain_elements(|e| {
            shapes::placeholder_key(e).is_none_or(|key| !replaced.contains(&key))
        });
        let copied = copies.len();
        for element in copies {
            tree.push(element);
        }
        debug!(source = %source.partname, partname = %copy.partname, copied, "duplicated slide");

        Ok(copy)
    }
}
