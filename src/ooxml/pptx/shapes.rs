//! Shapes of a slide's shape tree (`p:spTree`).
//!
//! Readers classify shapes and resolve their geometry; builders produce the
//! `p:sp` and `p:graphicFrame` fragments for new autoshapes, tables and
//! placeholders cloned from a layout.

use super::text;
use crate::common::xml::XmlElement;

/// Elements of a shape tree that are shapes.
const SHAPE_ELEMENTS: &[&str] = &["sp", "grpSp", "graphicFrame", "cxnSp", "pic", "contentPart"];

/// Placeholder types a new slide does not inherit from its layout.
const UNCLONED_PLACEHOLDERS: &[&str] = &["dt", "ftr", "sldNum"];

const TABLE_URI: &str = "http://schemas.openxmlformats.org/drawingml/2006/table";
const CHART_URI: &str = "http://schemas.openxmlformats.org/drawingml/2006/chart";

/// Default table style of new presentations (Medium Style 2 - Accent 1).
const DEFAULT_TABLE_STYLE: &str = "{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}";

/// Request keys for autoshapes with their preset geometry and base name.
const AUTOSHAPES: &[(&str, &str, &str)] = &[
    ("rectangle", "rect", "Rectangle"),
    ("rounded_rectangle", "roundRect", "Rounded Rectangle"),
    ("oval", "ellipse", "Oval"),
    ("triangle", "triangle", "Isosceles Triangle"),
    ("diamond", "diamond", "Diamond"),
    ("pentagon", "homePlate", "Pentagon"),
    ("hexagon", "hexagon", "Hexagon"),
    ("cloud", "cloud", "Cloud"),
    ("star", "star5", "5-Point Star"),
    ("arrow_right", "rightArrow", "Right Arrow"),
    ("arrow_left", "leftArrow", "Left Arrow"),
];

/// Position and size in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds {
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
}

/// Placeholder identity: `type` (default `obj`) and `idx` (default 0).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderKey {
    pub ph_type: String,
    pub idx: u32,
}

/// Summary of one shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeInfo {
    pub name: String,
    pub shape_type: String,
    pub left: Option<i64>,
    pub top: Option<i64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub text: Option<String>,
    /// Rows and columns of a table
    pub table: Option<(usize, usize)>,
}

/// Preset geometry and base name for a shape key; unknown keys are
/// rectangles. Hyphens and case are ignored.
pub fn autoshape_preset(key: &str) -> (&'static str, &'static str) {
    let normalized = key.trim().to_lowercase().replace('-', "_");
    AUTOSHAPES
        .iter()
        .find(|(k, _, _)| *k == normalized)
        .map(|(_, prst, name)| (*prst, *name))
        .unwrap_or(("rect", "Rectangle"))
}

/// Request key for a preset geometry, when there is one.
fn autoshape_key(prst: &str) -> Option<&'static str> {
    AUTOSHAPES
        .iter()
        .find(|(_, p, _)| *p == prst)
        .map(|(key, _, _)| *key)
}

/// Top-level shapes of a shape tree, in z-order.
pub fn shapes(sp_tree: &XmlElement) -> impl Iterator<Item = &XmlElement> {
    sp_tree
        .elements()
        .filter(|e| SHAPE_ELEMENTS.contains(&e.local_name()))
}

/// The non-visual properties wrapper (`p:nvSpPr`, `p:nvPicPr`, ...).
fn non_visual(shape: &XmlElement) -> Option<&XmlElement> {
    shape.elements().find(|e| e.local_name().starts_with("nv"))
}

pub fn shape_name(shape: &XmlElement) -> String {
    non_visual(shape)
        .and_then(|nv| nv.child("cNvPr"))
        .and_then(|c| c.attr("name"))
        .unwrap_or_default()
        .to_string()
}

/// The `p:ph` element of a placeholder shape.
pub fn placeholder(shape: &XmlElement) -> Option<&XmlElement> {
    non_visual(shape)?.child("nvPr")?.child("ph")
}

pub fn placeholder_key(shape: &XmlElement) -> Option<PlaceholderKey> {
    let ph = placeholder(shape)?;
    Some(PlaceholderKey {
        ph_type: ph.attr("type").unwrap_or("obj").to_string(),
        idx: ph
            .attr("idx")
            .and_then(|v| atoi_simd::parse::<u32>(v.as_bytes()).ok())
            .unwrap_or(0),
    })
}

/// Master placeholder type a layout placeholder inherits from.
fn master_placeholder_type(ph_type: &str) -> &str {
    match ph_type {
        "title" | "ctrTitle" => "title",
        "dt" | "ftr" | "sldNum" => ph_type,
        _ => "body",
    }
}

/// Placeholder of `sp_tree` a placeholder with `key` inherits from.
///
/// Layouts match by `idx`; masters by type.
pub fn inherited_placeholder<'a>(
    sp_tree: &'a XmlElement,
    key: &PlaceholderKey,
    by_type: bool,
) -> Option<&'a XmlElement> {
    shapes(sp_tree).find(|shape| {
        let Some(candidate) = placeholder_key(shape) else {
            return false;
        };
        if by_type {
            master_placeholder_type(&candidate.ph_type) == master_placeholder_type(&key.ph_type)
        } else {
            candidate.idx == key.idx
        }
    })
}

/// `a:xfrm` (or `p:xfrm` of a graphic frame) of a shape.
fn transform(shape: &XmlElement) -> Option<&XmlElement> {
    match shape.local_name() {
        "graphicFrame" => shape.child("xfrm"),
        "grpSp" => shape.child("grpSpPr")?.child("xfrm"),
        _ => shape.child("spPr")?.child("xfrm"),
    }
}

/// Bounds stated on the shape itself.
pub fn own_bounds(shape: &XmlElement) -> Option<Bounds> {
    let xfrm = transform(shape)?;
    let off = xfrm.child("off")?;
    let ext = xfrm.child("ext")?;
    let value = |e: &XmlElement, name: &str| {
        e.attr(name)
            .and_then(|v| atoi_simd::parse::<i64>(v.as_bytes()).ok())
            .unwrap_or(0)
    };
    Some(Bounds {
        left: value(off, "x"),
        top: value(off, "y"),
        width: value(ext, "cx"),
        height: value(ext, "cy"),
    })
}

fn graphic_data_uri(frame: &XmlElement) -> Option<&str> {
    frame.path(&["graphic", "graphicData"])?.attr("uri")
}

fn table_element(frame: &XmlElement) -> Option<&XmlElement> {
    frame.path(&["graphic", "graphicData", "tbl"])
}

/// Kind tag of a shape.
pub fn shape_type(shape: &XmlElement) -> String {
    if placeholder(shape).is_some() {
        return "placeholder".to_string();
    }
    let tag = match shape.local_name() {
        "sp" => {
            let is_text_box = non_visual(shape)
                .and_then(|nv| nv.child("cNvSpPr"))
                .and_then(|c| c.attr("txBox"))
                .is_some_and(|v| v == "1" || v == "true");
            if is_text_box {
                "text_box"
            } else if let Some(prst) = shape
                .path(&["spPr", "prstGeom"])
                .and_then(|g| g.attr("prst"))
            {
                return autoshape_key(prst).unwrap_or(prst).to_string();
            } else if shape.path(&["spPr", "custGeom"]).is_some() {
                "freeform"
            } else {
                "text_box"
            }
        },
        "pic" => "picture",
        "grpSp" => "group",
        "cxnSp" => "connector",
        "graphicFrame" => match graphic_data_uri(shape) {
            Some(TABLE_URI) => "table",
            Some(CHART_URI) => "chart",
            _ => "graphic_frame",
        },
        other => other,
    };
    tag.to_string()
}

/// Text of a shape's text frame. Only `p:sp` shapes have one; a shape
/// without a body reads as empty.
pub fn shape_text(shape: &XmlElement) -> Option<String> {
    if !shape.is("sp") {
        return None;
    }
    Some(shape.child("txBody").map(text::body_text).unwrap_or_default())
}

/// Replace the text of an `sp`, adding a text body when it has none.
pub fn set_shape_text(shape: &mut XmlElement, value: &str) {
    match shape.child_mut("txBody") {
        Some(body) => text::set_body_text(body, value),
        None => {
            let name = format!("{}txBody", prefix_of(shape));
            shape.push(text::new_body(&name, value));
        },
    }
}

/// `p:` (or whatever the shape's prefix is) with the colon.
fn prefix_of(shape: &XmlElement) -> String {
    shape.prefix().map(|p| format!("{}:", p)).unwrap_or_default()
}

/// Describe a shape, taking placeholder geometry from `inherited` when
/// the shape states none.
pub fn shape_info(shape: &XmlElement, inherited: Option<Bounds>) -> ShapeInfo {
    let bounds = own_bounds(shape).or(inherited);
    let table = shape.is("graphicFrame").then(|| table_element(shape)).flatten().map(|tbl| {
        let rows = tbl.children_named("tr").count();
        let cols = tbl
            .child("tblGrid")
            .map(|grid| grid.children_named("gridCol").count())
            .unwrap_or(0);
        (rows, cols)
    });
    ShapeInfo {
        name: shape_name(shape),
        shape_type: shape_type(shape),
        left: bounds.map(|b| b.left),
        top: bounds.map(|b| b.top),
        width: bounds.map(|b| b.width),
        height: bounds.map(|b| b.height),
        text: shape_text(shape),
        table,
    }
}

/// Largest `cNvPr` id anywhere under `root`.
pub fn max_shape_id(root: &XmlElement) -> u32 {
    root.descendants()
        .into_iter()
        .filter(|e| e.is("cNvPr"))
        .filter_map(|e| e.attr("id"))
        .filter_map(|id| atoi_simd::parse::<u32>(id.as_bytes()).ok())
        .max()
        .unwrap_or(0)
}

fn xfrm(name: &str, bounds: Bounds) -> XmlElement {
    XmlElement::new(name)
        .with_child(
            XmlElement::new("a:off")
                .with_attr("x", bounds.left.to_string())
                .with_attr("y", bounds.top.to_string()),
        )
        .with_child(
            XmlElement::new("a:ext")
                .with_attr("cx", bounds.width.to_string())
                .with_attr("cy", bounds.height.to_string()),
        )
}

fn scheme_ref(name: &str, idx: &str, color: &str) -> XmlElement {
    XmlElement::new(name)
        .with_attr("idx", idx)
        .with_child(XmlElement::new("a:schemeClr").with_attr("val", color))
}

/// A preset-geometry autoshape styled like PowerPoint's defaults.
///
/// `fill` is an `RRGGBB` color.
pub fn new_autoshape(
    id: u32,
    key: &str,
    bounds: Bounds,
    text_value: &str,
    fill: Option<&str>,
) -> XmlElement {
    let (prst, base_name) = autoshape_preset(key);
    let mut sp_pr = XmlElement::new("p:spPr")
        .with_child(xfrm("a:xfrm", bounds))
        .with_child(
            XmlElement::new("a:prstGeom")
                .with_attr("prst", prst)
                .with_child(XmlElement::new("a:avLst")),
        );
    if let Some(rgb) = fill {
        sp_pr.push(
            XmlElement::new("a:solidFill")
                .with_child(XmlElement::new("a:srgbClr").with_attr("val", rgb)),
        );
    }

    let mut body = XmlElement::new("p:txBody")
        .with_child(
            XmlElement::new("a:bodyPr")
                .with_attr("rtlCol", "0")
                .with_attr("anchor", "ctr"),
        )
        .with_child(XmlElement::new("a:lstStyle"))
        .with_child(
            XmlElement::new("a:p").with_child(XmlElement::new("a:pPr").with_attr("algn", "ctr")),
        );
    if !text_value.is_empty() {
        text::set_body_text(&mut body, text_value);
    }

    XmlElement::new("p:sp")
        .with_child(
            XmlElement::new("p:nvSpPr")
                .with_child(
                    XmlElement::new("p:cNvPr")
                        .with_attr("id", id.to_string())
                        .with_attr("name", format!("{} {}", base_name, id.saturating_sub(1))),
                )
                .with_child(XmlElement::new("p:cNvSpPr"))
                .with_child(XmlElement::new("p:nvPr")),
        )
        .with_child(sp_pr)
        .with_child(
            XmlElement::new("p:style")
                .with_child(scheme_ref("a:lnRef", "1", "accent1"))
                .with_child(scheme_ref("a:fillRef", "3", "accent1"))
                .with_child(scheme_ref("a:effectRef", "2", "accent1"))
                .with_child(scheme_ref("a:fontRef", "minor", "lt1")),
        )
        .with_child(body)
}

/// Evenly split `total` EMU into `parts`, the last part taking the rest.
fn split(total: i64, parts: usize) -> Vec<i64> {
    let parts_i = parts.max(1) as i64;
    let each = total / parts_i;
    let mut sizes = vec![each; parts.max(1)];
    if let Some(last) = sizes.last_mut() {
        *last = total - each * (parts_i - 1);
    }
    sizes
}

/// A table graphic frame; `cells` is row-major and must match the grid.
pub fn new_table(id: u32, bounds: Bounds, cells: &[Vec<String>], cols: usize) -> XmlElement {
    let mut grid = XmlElement::new("a:tblGrid");
    for width in split(bounds.width, cols) {
        grid.push(XmlElement::new("a:gridCol").with_attr("w", width.to_string()));
    }

    let mut tbl = XmlElement::new("a:tbl")
        .with_child(
            XmlElement::new("a:tblPr")
                .with_attr("firstRow", "1")
                .with_attr("bandRow", "1")
                .with_child(XmlElement::new("a:tableStyleId").with_text(DEFAULT_TABLE_STYLE)),
        )
        .with_child(grid);
    for (row, height) in cells.iter().zip(split(bounds.height, cells.len())) {
        let mut tr = XmlElement::new("a:tr").with_attr("h", height.to_string());
        for col in 0..cols {
            let value = row.get(col).map(String::as_str).unwrap_or_default();
            tr.push(
                XmlElement::new("a:tc")
                    .with_child(text::new_body("a:txBody", value))
                    .with_child(XmlElement::new("a:tcPr")),
            );
        }
        tbl.push(tr);
    }

    XmlElement::new("p:graphicFrame")
        .with_child(
            XmlElement::new("p:nvGraphicFramePr")
                .with_child(
                    XmlElement::new("p:cNvPr")
                        .with_attr("id", id.to_string())
                        .with_attr("name", format!("Table {}", id.saturating_sub(1))),
                )
                .with_child(
                    XmlElement::new("p:cNvGraphicFramePr").with_child(
                        XmlElement::new("a:graphicFrameLocks").with_attr("noGrp", "1"),
                    ),
                )
                .with_child(XmlElement::new("p:nvPr")),
        )
        .with_child(xfrm("p:xfrm", bounds))
        .with_child(
            XmlElement::new("a:graphic").with_child(
                XmlElement::new("a:graphicData")
                    .with_attr("uri", TABLE_URI)
                    .with_child(tbl),
            ),
        )
}

fn placeholder_base_name(ph_type: &str) -> &'static str {
    match ph_type {
        "title" | "ctrTitle" => "Title",
        "subTitle" => "Subtitle",
        "body" => "Text Placeholder",
        "pic" => "Picture Placeholder",
        "tbl" => "Table Placeholder",
        "chart" => "Chart Placeholder",
        "media" => "Media Placeholder",
        "clipArt" => "ClipArt Placeholder",
        "dgm" => "SmartArt Placeholder",
        "sldImg" => "Slide Image Placeholder",
        _ => "Content Placeholder",
    }
}

/// Empty placeholders for a new slide, one per layout placeholder except
/// date, footer and slide number. Ids start at `first_id`.
pub fn clone_layout_placeholders(layout_tree: &XmlElement, first_id: u32) -> Vec<XmlElement> {
    let mut id = first_id;
    let mut out = Vec::new();
    for shape in shapes(layout_tree) {
        let Some(ph) = placeholder(shape) else {
            continue;
        };
        let ph_type = ph.attr("type").unwrap_or("obj");
        if UNCLONED_PLACEHOLDERS.contains(&ph_type) {
            continue;
        }

        let mut new_ph = XmlElement::new("p:ph");
        for attr in ["type", "orient", "sz", "idx"] {
            if let Some(value) = ph.attr(attr) {
                new_ph.set_attr(attr, value);
            }
        }
        let vertical = ph.attr("orient") == Some("vert");
        let name = format!(
            "{}{} {}",
            if vertical { "Vertical " } else { "" },
            placeholder_base_name(ph_type),
            id - 1
        );

        let mut sp = XmlElement::new("p:sp")
            .with_child(
                XmlElement::new("p:nvSpPr")
                    .with_child(
                        XmlElement::new("p:cNvPr")
                            .with_attr("id", id.to_string())
                            .with_attr("name", name),
                    )
                    .with_child(
                        XmlElement::new("p:cNvSpPr")
                            .with_child(XmlElement::new("a:spLocks").with_attr("noGrp", "1")),
                    )
                    .with_child(XmlElement::new("p:nvPr").with_child(new_ph)),
            )
            .with_child(XmlElement::new("p:spPr"));
        if matches!(ph_type, "title" | "ctrTitle" | "subTitle" | "body" | "obj") {
            sp.push(text::new_body("p:txBody", ""));
        }
        out.push(sp);
        id += 1;
    }
    out
}
