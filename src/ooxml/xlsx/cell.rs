//! Values of `<c>` elements.
//!
//! A written value is either text (shared string) or a formula; text
//! starting with `=` is taken as a formula. Reading turns any stored value
//! into display text.

use super::number_format::{self, ValueKind};
use super::qualified_name;
use super::shared_strings::SharedStrings;
use crate::common::xml::XmlElement;

const CELL_ORDER: &[&str] = &["f", "v", "is", "extLst"];

/// Value to be stored in a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellInput<'a> {
    Text(&'a str),
    /// Formula text without the leading `=`
    Formula(&'a str),
}

impl<'a> CellInput<'a> {
    /// `=SUM(A1:A3)` is a formula, `=` alone and everything else is text.
    pub fn classify(value: &'a str) -> Self {
        match value.strip_prefix('=') {
            Some(formula) if !formula.is_empty() => CellInput::Formula(formula),
            _ => CellInput::Text(value),
        }
    }
}

/// Drop the stored value, keeping the cell's style.
pub fn clear_value(cell: &mut XmlElement) {
    for local in ["f", "v", "is"] {
        cell.remove_children(local);
    }
    cell.remove_attr("t");
}

/// Store a shared string index.
pub fn set_shared_string(cell: &mut XmlElement, index: usize) {
    clear_value(cell);
    cell.set_attr("t", "s");
    let v = XmlElement::new(qualified_name(cell.prefix(), "v"))
        .with_text(itoa::Buffer::new().format(index));
    cell.insert_ordered(v, CELL_ORDER);
}

/// Store a formula with no cached value.
pub fn set_formula(cell: &mut XmlElement, formula: &str) {
    clear_value(cell);
    let f = XmlElement::new(qualified_name(cell.prefix(), "f")).with_text(formula);
    cell.insert_ordered(f, CELL_ORDER);
}

/// Display text of a cell.
///
/// Formulas read as their cached value; a formula that was never
/// calculated reads as `=` followed by its text. `kinds` maps style
/// indexes to how numbers are displayed.
pub fn read_value(cell: &XmlElement, strings: &SharedStrings, kinds: &[ValueKind]) -> String {
    let cached = cell.child("v").map(XmlElement::text);
    let formula = cell.child("f").map(XmlElement::text);

    let t = cell.attr("t").unwrap_or("n");
    if t == "inlineStr" {
        return cell.child("is").map(inline_text).unwrap_or_default();
    }

    let Some(raw) = cached else {
        return match formula {
            Some(f) if !f.is_empty() => format!("={}", f),
            _ => String::new(),
        };
    };

    match t {
        "s" => atoi_simd::parse::<usize>(raw.trim().as_bytes())
            .ok()
            .and_then(|index| strings.get(index))
            .unwrap_or_default()
            .to_string(),
        "b" => (if raw.trim() == "1" { "True" } else { "False" }).to_string(),
        "str" | "e" => raw,
        _ => {
            if raw.trim().is_empty() {
                return String::new();
            }
            let kind = cell
                .attr("s")
                .and_then(|s| atoi_simd::parse::<usize>(s.as_bytes()).ok())
                .and_then(|s| kinds.get(s).copied())
                .unwrap_or(ValueKind::Number);
            number_format::render_number(&raw, kind)
        },
    }
}

fn inline_text(is: &XmlElement) -> String {
    if let Some(t) = is.child("t") {
        return t.text();
    }
    is.children_named("r")
        .filter_map(|r| r.child("t"))
        .map(XmlElement::text)
        .collect()
}
