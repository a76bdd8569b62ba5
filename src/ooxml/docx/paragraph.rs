//! Paragraph and run content.
//!
//! Text reads the way Word displays it: `w:tab` as a tab, text-wrapping
//! breaks and carriage returns as newlines, page and column breaks as
//! nothing. Writing text converts tabs and newlines back into elements.

use crate::common::color::parse_rgb;
use crate::common::error::{Error, Result};
use crate::common::unit::pt_to_half_points;
use crate::common::xml::{XmlElement, XmlNode};

/// Child sequence of `w:pPr`.
pub const PPR_ORDER: &[&str] = &[
    "pStyle", "keepNext", "keepLines", "pageBreakBefore", "framePr", "widowControl", "numPr",
    "suppressLineNumbers", "pBdr", "shd", "tabs", "suppressAutoHyphens", "kinsoku", "wordWrap",
    "overflowPunct", "topLinePunct", "autoSpaceDE", "autoSpaceDN", "bidi", "adjustRightInd",
    "snapToGrid", "spacing", "ind", "contextualSpacing", "mirrorIndents", "suppressOverlap", "jc",
    "textDirection", "textAlignment", "textboxTightWrap", "outlineLvl", "divId", "cnfStyle", "rPr",
    "sectPr", "pPrChange",
];

/// Child sequence of `w:rPr`.
const RPR_ORDER: &[&str] = &[
    "rStyle", "rFonts", "b", "bCs", "i", "iCs", "caps", "smallCaps", "strike", "dstrike",
    "outline", "shadow", "emboss", "imprint", "noProof", "snapToGrid", "vanish", "webHidden",
    "color", "spacing", "w", "kern", "position", "sz", "szCs", "highlight", "u", "effect", "bdr",
    "shd", "fitText", "vertAlign", "rtl", "cs", "em", "lang", "eastAsianLayout", "specVanish",
    "oMath",
];

/// Text of a run.
pub fn run_text(run: &XmlElement) -> String {
    let mut text = String::new();
    for child in run.elements() {
        match child.local_name() {
            "t" => text.push_str(&child.text()),
            "tab" | "ptab" => text.push('\t'),
            "br" => {
                if matches!(child.attr_local("type"), None | Some("textWrapping")) {
                    text.push('\n');
                }
            },
            "cr" => text.push('\n'),
            "noBreakHyphen" => text.push('-'),
            _ => {},
        }
    }
    text
}

/// Replace the content of a run, keeping its properties.
pub fn set_run_text(run: &mut XmlElement, text: &str) {
    run.children
        .retain(|n| matches!(n, XmlNode::Element(e) if e.is("rPr")));
    for element in run_content(text) {
        run.push(element);
    }
}

/// A run holding `text`.
pub fn new_run(text: &str) -> XmlElement {
    let mut run = XmlElement::new("w:r");
    set_run_text(&mut run, text);
    run
}

/// `w:t`, `w:tab` and `w:br` elements spelling out `text`.
fn run_content(text: &str) -> Vec<XmlElement> {
    let mut elements = Vec::new();
    let mut pending = String::new();
    for ch in text.chars() {
        match ch {
            '\t' | '\n' | '\r' => {
                if !pending.is_empty() {
                    elements.push(text_element(&std::mem::take(&mut pending)));
                }
                elements.push(XmlElement::new(if ch == '\t' { "w:tab" } else { "w:br" }));
            },
            _ => pending.push(ch),
        }
    }
    if !pending.is_empty() {
        elements.push(text_element(&pending));
    }
    elements
}

pub(crate) fn text_element(text: &str) -> XmlElement {
    let mut t = XmlElement::new("w:t");
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        t.set_attr("xml:space", "preserve");
    }
    t.with_text(text)
}

/// Text of a paragraph, including runs nested in hyperlinks.
pub fn paragraph_text(paragraph: &XmlElement) -> String {
    let mut text = String::new();
    for child in paragraph.elements() {
        match child.local_name() {
            "r" => text.push_str(&run_text(child)),
            "hyperlink" => {
                for run in child.children_named("r") {
                    text.push_str(&run_text(run));
                }
            },
            _ => {},
        }
    }
    text
}

/// A new paragraph, optionally styled, with a single run when `text` is
/// not empty.
pub fn new_paragraph(text: &str, style_id: Option<&str>) -> XmlElement {
    let mut paragraph = XmlElement::new("w:p");
    if let Some(style_id) = style_id {
        set_paragraph_style(&mut paragraph, style_id);
    }
    if !text.is_empty() {
        paragraph.push(new_run(text));
    }
    paragraph
}

pub fn set_paragraph_style(paragraph: &mut XmlElement, style_id: &str) {
    if paragraph.position_of("pPr").is_none() {
        paragraph.insert(0, XmlElement::new("w:pPr"));
    }
    if let Some(ppr) = paragraph.child_mut("pPr") {
        ppr.get_or_insert_ordered("w:pStyle", PPR_ORDER)
            .set_attr("w:val", style_id);
    }
}

/// Replace everything but the paragraph properties with one run of `text`.
pub fn set_paragraph_text(paragraph: &mut XmlElement, text: &str) {
    paragraph
        .children
        .retain(|n| matches!(n, XmlNode::Element(e) if e.is("pPr")));
    if !text.is_empty() {
        paragraph.push(new_run(text));
    }
}

/// Replace `search` inside every direct run whose own text contains it.
///
/// A match spanning two runs is left alone. Returns the number of runs
/// changed, not the number of occurrences.
pub fn replace_in_runs(paragraph: &mut XmlElement, search: &str, replacement: &str) -> usize {
    if search.is_empty() || !paragraph_text(paragraph).contains(search) {
        return 0;
    }
    let mut changed = 0;
    for run in paragraph.children_named_mut("r") {
        let text = run_text(run);
        if text.contains(search) {
            set_run_text(run, &text.replace(search, replacement));
            changed += 1;
        }
    }
    changed
}

/// Formatting applied uniformly to runs. `None` fields are left as they
/// are.
#[derive(Debug, Clone, Default)]
pub struct RunFormat {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub hidden: Option<bool>,
    /// Normalized `RRGGBB`
    pub color: Option<String>,
    pub size_pt: Option<f64>,
    pub font_name: Option<String>,
}

impl RunFormat {
    /// Validate the color and size, normalizing the color.
    pub fn validated(mut self) -> Result<Self> {
        if let Some(color) = &self.color {
            self.color = Some(parse_rgb(color)?);
        }
        if let Some(size) = self.size_pt
            && !(size > 0.0 && size <= 1638.0)
        {
            return Err(Error::invalid(format!("font size {} out of range", size)));
        }
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.bold.is_none()
            && self.italic.is_none()
            && self.underline.is_none()
            && self.hidden.is_none()
            && self.color.is_none()
            && self.size_pt.is_none()
            && self.font_name.is_none()
    }

    /// Write the set fields into the run's `w:rPr`.
    pub fn apply(&self, run: &mut XmlElement) {
        if self.is_empty() {
            return;
        }
        if run.position_of("rPr").is_none() {
            run.insert(0, XmlElement::new("w:rPr"));
        }
        let Some(rpr) = run.child_mut("rPr") else {
            return;
        };

        if let Some(bold) = self.bold {
            set_toggle(rpr, "w:b", bold);
        }
        if let Some(italic) = self.italic {
            set_toggle(rpr, "w:i", italic);
        }
        if let Some(hidden) = self.hidden {
            set_toggle(rpr, "w:vanish", hidden);
        }
        if let Some(underline) = self.underline {
            rpr.get_or_insert_ordered("w:u", RPR_ORDER)
                .set_attr("w:val", if underline { "single" } else { "none" });
        }
        if let Some(color) = &self.color {
            let element = rpr.get_or_insert_ordered("w:color", RPR_ORDER);
            element.set_attr("w:val", color.as_str());
            for theme_attr in ["w:themeColor", "w:themeTint", "w:themeShade"] {
                element.remove_attr(theme_attr);
            }
        }
        if let Some(size) = self.size_pt {
            rpr.get_or_insert_ordered("w:sz", RPR_ORDER)
                .set_attr("w:val", pt_to_half_points(size).to_string());
        }
        if let Some(name) = &self.font_name {
            let fonts = rpr.get_or_insert_ordered("w:rFonts", RPR_ORDER);
            fonts.set_attr("w:ascii", name.as_str());
            fonts.set_attr("w:hAnsi", name.as_str());
        }
    }
}

/// On/off property: present without a value when on, `w:val="0"` when off.
fn set_toggle(rpr: &mut XmlElement, name: &str, on: bool) {
    let element = rpr.get_or_insert_ordered(name, RPR_ORDER);
    if on {
        element.remove_attr("w:val");
    } else {
        element.set_attr("w:val", "0");
    }
}
