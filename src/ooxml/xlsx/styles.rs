//! Cell formatting records in `xl/styles.xml`.
//!
//! A cell's `s` attribute indexes `cellXfs`; each `xf` points into the
//! `fonts`, `fills` and number format tables. Formatting a cell derives a
//! new `xf` from the cell's current one, reusing any identical record
//! already present.

use super::number_format::{self, FIRST_CUSTOM_ID, ValueKind};
use super::qualified_name;
use crate::common::color::parse_argb;
use crate::common::error::{Error, Result};
use crate::common::xml::{XmlElement, XmlNode};
use std::collections::HashMap;

const STYLESHEET_ORDER: &[&str] = &[
    "numFmts",
    "fonts",
    "fills",
    "borders",
    "cellStyleXfs",
    "cellXfs",
    "cellStyles",
    "dxfs",
    "tableStyles",
    "colors",
    "extLst",
];

const FONT_ORDER: &[&str] = &[
    "b",
    "i",
    "strike",
    "condense",
    "extend",
    "outline",
    "shadow",
    "u",
    "vertAlign",
    "sz",
    "color",
    "name",
    "family",
    "charset",
    "scheme",
];

/// Largest font size Excel accepts, in points.
const MAX_FONT_SIZE: f64 = 409.0;

/// Formatting applied uniformly to a range of cells. `None` leaves the
/// attribute as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellFormat {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    /// Font size in points
    pub size: Option<f64>,
    /// Font color, `AARRGGBB` once validated
    pub color: Option<String>,
    /// Solid fill color, `AARRGGBB` once validated
    pub fill: Option<String>,
    pub number_format: Option<String>,
}

impl CellFormat {
    /// Normalize colors and check the font size.
    pub fn validated(mut self) -> Result<Self> {
        if let Some(size) = self.size
            && !(size > 0.0 && size <= MAX_FONT_SIZE)
        {
            return Err(Error::invalid(format!(
                "font size must be between 1 and {} points",
                MAX_FONT_SIZE
            )));
        }
        self.color = self.color.as_deref().map(parse_argb).transpose()?;
        self.fill = self.fill.as_deref().map(parse_argb).transpose()?;
        if self.number_format.as_deref() == Some("") {
            self.number_format = None;
        }
        Ok(self)
    }

    fn touches_font(&self) -> bool {
        self.bold.is_some() || self.italic.is_some() || self.size.is_some() || self.color.is_some()
    }

    pub fn is_empty(&self) -> bool {
        !self.touches_font() && self.fill.is_none() && self.number_format.is_none()
    }
}

/// Editing view over a parsed `styleSheet` root.
pub struct StyleSheet<'a> {
    root: &'a mut XmlElement,
    prefix: Option<String>,
    /// Base xf index -> derived xf index for the format being applied
    derived: HashMap<u32, u32>,
}

impl<'a> StyleSheet<'a> {
    pub fn new(root: &'a mut XmlElement) -> Self {
        let prefix = root.prefix().map(str::to_string);
        Self {
            root,
            prefix,
            derived: HashMap::new(),
        }
    }

    fn element(&self, local: &str) -> XmlElement {
        XmlElement::new(qualified_name(self.prefix.as_deref(), local))
    }

    /// Index of the `xf` equal to `base` with `format` applied.
    ///
    /// Results are cached per base index, so one `StyleSheet` must only be
    /// used with a single `format`.
    pub fn derive(&mut self, base: u32, format: &CellFormat) -> u32 {
        if let Some(&xf_id) = self.derived.get(&base) {
            return xf_id;
        }

        let mut xf = self.base_xf(base);
        if format.touches_font() {
            let font_id = attr_u32(&xf, "fontId");
            let font_id = self.font_id(font_id, format);
            xf.set_attr("fontId", font_id.to_string());
            xf.set_attr("applyFont", "1");
        }
        if let Some(argb) = &format.fill {
            let fill_id = self.fill_id(argb);
            xf.set_attr("fillId", fill_id.to_string());
            xf.set_attr("applyFill", "1");
        }
        if let Some(code) = &format.number_format {
            let num_fmt_id = self.num_fmt_id(code);
            xf.set_attr("numFmtId", num_fmt_id.to_string());
            xf.set_attr("applyNumberFormat", "1");
        }

        let xf_id = self.intern("cellXfs", xf);
        self.derived.insert(base, xf_id);
        xf_id
    }

    fn list(&mut self, name: &str) -> &mut XmlElement {
        let qualified = qualified_name(self.prefix.as_deref(), name);
        self.root.get_or_insert_ordered(&qualified, STYLESHEET_ORDER)
    }

    fn record(&self, list: &str, index: u32) -> Option<XmlElement> {
        self.root
            .child(list)?
            .elements()
            .nth(index as usize)
            .cloned()
    }

    fn base_xf(&self, base: u32) -> XmlElement {
        self.record("cellXfs", base)
            .or_else(|| self.record("cellXfs", 0))
            .unwrap_or_else(|| {
                self.element("xf")
                    .with_attr("numFmtId", "0")
                    .with_attr("fontId", "0")
                    .with_attr("fillId", "0")
                    .with_attr("borderId", "0")
                    .with_attr("xfId", "0")
            })
    }

    fn font_id(&mut self, base_font: u32, format: &CellFormat) -> u32 {
        let mut font = self
            .record("fonts", base_font)
            .unwrap_or_else(|| self.element("font"));

        for (local, value) in [("b", format.bold), ("i", format.italic)] {
            if let Some(on) = value {
                font.remove_children(local);
                if on {
                    font.insert_ordered(self.element(local), FONT_ORDER);
                }
            }
        }
        if let Some(size) = format.size {
            font.remove_children("sz");
            font.insert_ordered(
                self.element("sz").with_attr("val", format_size(size)),
                FONT_ORDER,
            );
        }
        if let Some(argb) = &format.color {
            font.remove_children("color");
            font.insert_ordered(
                self.element("color").with_attr("rgb", argb.as_str()),
                FONT_ORDER,
            );
        }
        self.intern("fonts", font)
    }

    fn fill_id(&mut self, argb: &str) -> u32 {
        let fill = self.element("fill").with_child(
            self.element("patternFill")
                .with_attr("patternType", "solid")
                .with_child(self.element("fgColor").with_attr("rgb", argb))
                .with_child(self.element("bgColor").with_attr("rgb", argb)),
        );
        self.intern("fills", fill)
    }

    fn num_fmt_id(&mut self, code: &str) -> u32 {
        if let Some(id) = number_format::builtin_format_id(code) {
            return id;
        }
        let existing = self.root.child("numFmts").and_then(|list| {
            list.children_named("numFmt")
                .find(|f| f.attr("formatCode") == Some(code))
                .map(|f| attr_u32(f, "numFmtId"))
        });
        if let Some(id) = existing {
            return id;
        }

        let next = self
            .root
            .child("numFmts")
            .map(|list| {
                list.children_named("numFmt")
                    .map(|f| attr_u32(f, "numFmtId") + 1)
                    .max()
                    .unwrap_or(FIRST_CUSTOM_ID)
            })
            .unwrap_or(FIRST_CUSTOM_ID)
            .max(FIRST_CUSTOM_ID);
        let record = self
            .element("numFmt")
            .with_attr("numFmtId", next.to_string())
            .with_attr("formatCode", code);
        let list = self.list("numFmts");
        list.push(record);
        let count = list.elements().count();
        list.set_attr("count", count.to_string());
        next
    }

    /// Index of an existing record equal to `record` in `list`, appending it
    /// when there is none. Keeps the list's `count` current.
    fn intern(&mut self, list_name: &str, record: XmlElement) -> u32 {
        let list = self.list(list_name);
        if let Some(pos) = list.elements().position(|e| same_record(e, &record)) {
            return pos as u32;
        }
        list.push(record);
        let count = list.elements().count();
        list.set_attr("count", count.to_string());
        (count - 1) as u32
    }
}

/// Display kind of every `cellXfs` entry, by index.
pub fn value_kinds(styles: &XmlElement) -> Vec<ValueKind> {
    let custom: HashMap<u32, &str> = styles
        .child("numFmts")
        .map(|list| {
            list.children_named("numFmt")
                .filter_map(|f| Some((attr_u32(f, "numFmtId"), f.attr("formatCode")?)))
                .collect()
        })
        .unwrap_or_default();

    let Some(xfs) = styles.child("cellXfs") else {
        return Vec::new();
    };
    xfs.elements()
        .map(|xf| {
            let id = attr_u32(xf, "numFmtId");
            let code = custom
                .get(&id)
                .copied()
                .or_else(|| number_format::builtin_format_code(id))
                .unwrap_or("General");
            number_format::classify(code)
        })
        .collect()
}

fn attr_u32(e: &XmlElement, name: &str) -> u32 {
    e.attr(name)
        .and_then(|v| atoi_simd::parse::<u32>(v.trim().as_bytes()).ok())
        .unwrap_or(0)
}

fn format_size(size: f64) -> String {
    if size.fract() == 0.0 {
        itoa::Buffer::new().format(size as i64).to_string()
    } else {
        size.to_string()
    }
}

/// Structural equality ignoring attribute order and whitespace-only text.
fn same_record(a: &XmlElement, b: &XmlElement) -> bool {
    if a.local_name() != b.local_name() || a.attrs.len() != b.attrs.len() {
        return false;
    }
    let same_attrs = a.attrs.iter().all(|(k, v)| b.attr(k) == Some(v.as_str()));
    if !same_attrs {
        return false;
    }
    let text = |e: &XmlElement| -> String {
        e.children
            .iter()
            .filter_map(|n| match n {
                XmlNode::Text(t) if !t.trim().is_empty() => Some(t.as_str()),
                _ => None,
            })
            .collect()
    };
    let mut a_children = a.elements();
    let mut b_children = b.elements();
    loop {
        match (a_children.next(), b_children.next()) {
            (None, None) => return text(a) == text(b),
            (Some(x), Some(y)) if same_record(x, y) => {},
            _ => return false,
        }
    }
}
