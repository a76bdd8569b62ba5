//! Worksheet parts: the sparse cell grid, row records, merged ranges and
//! everything that moves when rows or columns are inserted.

use super::cell;
use super::formula::{self, Axis, Insertion};
use super::number_format::ValueKind;
use super::qualified_name;
use super::reference::{CellRef, RangeRef};
use super::shared_strings::SharedStrings;
use crate::common::error::{Error, Result};
use crate::common::xml::{XmlElement, XmlNode};
use std::collections::BTreeMap;

/// Child sequence of `CT_Worksheet`.
pub const WORKSHEET_ORDER: &[&str] = &[
    "sheetPr",
    "dimension",
    "sheetViews",
    "sheetFormatPr",
    "cols",
    "sheetData",
    "sheetCalcPr",
    "sheetProtection",
    "protectedRanges",
    "scenarios",
    "autoFilter",
    "sortState",
    "dataConsolidate",
    "customSheetViews",
    "mergeCells",
    "phoneticPr",
    "conditionalFormatting",
    "dataValidations",
    "hyperlinks",
    "printOptions",
    "pageMargins",
    "pageSetup",
    "headerFooter",
    "rowBreaks",
    "colBreaks",
    "customProperties",
    "cellWatches",
    "ignoredErrors",
    "smartTags",
    "drawing",
    "legacyDrawing",
    "legacyDrawingHF",
    "drawingHF",
    "picture",
    "oleObjects",
    "controls",
    "webPublishItems",
    "tableParts",
    "extLst",
];

/// Elements whose text is a formula.
const FORMULA_ELEMENTS: &[&str] = &["f", "formula", "formula1", "formula2"];

/// Editing view over a parsed `worksheet` root.
pub struct Worksheet<'a> {
    root: &'a mut XmlElement,
    prefix: Option<String>,
}

impl<'a> Worksheet<'a> {
    /// Wrap a worksheet, giving every row and cell an explicit position.
    pub fn new(root: &'a mut XmlElement) -> Self {
        let prefix = root.prefix().map(str::to_string);
        let mut sheet = Self { root, prefix };
        sheet.number_positions();
        sheet
    }

    fn name(&self, local: &str) -> String {
        qualified_name(self.prefix.as_deref(), local)
    }

    fn sheet_data(&mut self) -> &mut XmlElement {
        let name = self.name("sheetData");
        self.root.get_or_insert_ordered(&name, WORKSHEET_ORDER)
    }

    /// Rows and cells may omit `r`, meaning "next after the previous one".
    fn number_positions(&mut self) {
        let Some(sheet_data) = self.root.child_mut("sheetData") else {
            return;
        };
        let mut row_number = 0u32;
        for row in sheet_data.children_named_mut("row") {
            row_number = row_attr(row).unwrap_or(row_number + 1);
            if row.attr("r").is_none() {
                row.set_attr("r", row_number.to_string());
            }
            let mut col = 0u32;
            for c in row.children_named_mut("c") {
                col = cell_attr(c).map(|at| at.col).unwrap_or(col + 1);
                if c.attr("r").is_none() {
                    c.set_attr("r", CellRef::new(row_number, col).to_string());
                }
            }
        }
    }

    /// The `row` record for `row_number`, created in order when missing.
    pub fn row_mut(&mut self, row_number: u32) -> Result<&mut XmlElement> {
        let row_name = self.name("row");
        let sheet_data = self.sheet_data();
        let mut insert_at = sheet_data.children.len();
        for (i, node) in sheet_data.children.iter().enumerate() {
            if let XmlNode::Element(e) = node
                && e.is("row")
            {
                match row_attr(e) {
                    Some(r) if r == row_number => {
                        insert_at = usize::MAX;
                        break;
                    },
                    Some(r) if r > row_number => {
                        insert_at = i;
                        break;
                    },
                    _ => {},
                }
            }
        }
        if insert_at != usize::MAX {
            sheet_data.insert(
                insert_at,
                XmlElement::new(row_name).with_attr("r", row_number.to_string()),
            );
        }
        sheet_data
            .children_named_mut("row")
            .find(|e| row_attr(e) == Some(row_number))
            .ok_or_else(|| Error::corrupt(format!("row {} missing after insert", row_number)))
    }

    /// The `c` element at `at`, created in column order when missing.
    pub fn cell_mut(&mut self, at: CellRef) -> Result<&mut XmlElement> {
        let cell_name = self.name("c");
        let row = self.row_mut(at.row)?;
        let mut insert_at = row.children.len();
        for (i, node) in row.children.iter().enumerate() {
            if let XmlNode::Element(e) = node
                && e.is("c")
            {
                match cell_attr(e) {
                    Some(c) if c.col == at.col => {
                        insert_at = usize::MAX;
                        break;
                    },
                    Some(c) if c.col > at.col => {
                        insert_at = i;
                        break;
                    },
                    _ => {},
                }
            }
        }
        if insert_at != usize::MAX {
            row.insert(
                insert_at,
                XmlElement::new(cell_name).with_attr("r", at.to_string()),
            );
        }
        row.children_named_mut("c")
            .find(|e| cell_attr(e) == Some(at))
            .ok_or_else(|| Error::corrupt(format!("cell {} missing after insert", at)))
    }

    /// Existing cell at `at`, if any.
    pub fn existing_cell_mut(&mut self, at: CellRef) -> Option<&mut XmlElement> {
        self.root
            .child_mut("sheetData")?
            .children_named_mut("row")
            .find(|row| row_attr(row) == Some(at.row))?
            .children_named_mut("c")
            .find(|c| cell_attr(c) == Some(at))
    }

    pub fn hide_row(&mut self, row_number: u32) -> Result<()> {
        self.row_mut(row_number)?.set_attr("hidden", "1");
        Ok(())
    }

    /// Ranges listed under `mergeCells`. Unparsable entries are skipped.
    pub fn merged_ranges(&self) -> Vec<RangeRef> {
        self.root
            .child("mergeCells")
            .map(|list| {
                list.children_named("mergeCell")
                    .filter_map(|m| m.attr("ref"))
                    .filter_map(|r| RangeRef::parse(r).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Record a merged range and clear the values of its non-anchor cells.
    /// Merging a range that is already merged is a no-op; one that overlaps
    /// a different merged range is rejected before anything changes.
    pub fn merge(&mut self, range: RangeRef) -> Result<()> {
        let existing = self.merged_ranges();
        if existing.contains(&range) {
            return Ok(());
        }
        if let Some(other) = existing.iter().find(|m| m.intersects(&range)) {
            return Err(Error::invalid(format!(
                "range {} overlaps merged range {}",
                range, other
            )));
        }

        let anchor = range.start();
        for at in range.cells().filter(|at| *at != anchor) {
            if let Some(c) = self.existing_cell_mut(at) {
                cell::clear_value(c);
            }
        }

        let merge_cells_name = self.name("mergeCells");
        let merge_cell = XmlElement::new(self.name("mergeCell")).with_attr("ref", range.to_string());
        let list = self
            .root
            .get_or_insert_ordered(&merge_cells_name, WORKSHEET_ORDER);
        list.push(merge_cell);
        let count = list.children_named("mergeCell").count();
        list.set_attr("count", count.to_string());
        Ok(())
    }

    /// Set `dimension` to the bounding box of the present cells.
    pub fn refresh_dimension(&mut self) {
        let reference = match used_range(self.root) {
            Some(range) => range.to_string(),
            None => "A1".to_string(),
        };
        let name = self.name("dimension");
        self.root
            .get_or_insert_ordered(&name, WORKSHEET_ORDER)
            .set_attr("ref", reference);
    }

    pub fn set_tab_selected(&mut self, selected: bool) {
        let Some(view) = self.root.path_mut(&["sheetViews", "sheetView"]) else {
            return;
        };
        if selected {
            view.set_attr("tabSelected", "1");
        } else {
            view.remove_attr("tabSelected");
        }
    }

    /// Move everything at or after the insertion point of this sheet
    /// (named `sheet_name`) and rewrite its own formulas.
    pub fn insert(&mut self, ins: &Insertion, sheet_name: &str) {
        self.root.walk_mut(&mut |e: &mut XmlElement| {
            let local = e.local_name().to_string();
            match local.as_str() {
                "row" if ins.axis == Axis::Row => {
                    if let Some(shifted) = row_attr(e).and_then(|r| ins.shift(r)) {
                        e.set_attr("r", shifted.to_string());
                    }
                },
                "row" => {
                    // column span hints go stale
                    e.remove_attr("spans");
                },
                "c" => {
                    if let Some(shifted) = e.attr("r").and_then(|r| ins.shift_reference(r)) {
                        e.set_attr("r", shifted);
                    }
                },
                "col" if ins.axis == Axis::Col => {
                    for bound in ["min", "max"] {
                        let shifted = e
                            .attr(bound)
                            .and_then(|v| atoi_simd::parse::<u32>(v.as_bytes()).ok())
                            .and_then(|v| ins.shift(v));
                        if let Some(v) = shifted {
                            e.set_attr(bound, v.to_string());
                        }
                    }
                },
                local if FORMULA_ELEMENTS.contains(&local) => {
                    rewrite_text(e, |text| ins.shift_formula(text, sheet_name, Some(sheet_name)));
                },
                _ => {},
            }
            for attr in ["ref", "sqref"] {
                if let Some(shifted) = e.attr(attr).map(|v| ins.shift_sqref(v)) {
                    e.set_attr(attr, shifted);
                }
            }
            for attr in ["activeCell", "topLeftCell"] {
                if let Some(shifted) = e.attr(attr).and_then(|v| ins.shift_reference(v)) {
                    e.set_attr(attr, shifted);
                }
            }
        });
    }

    /// Rewrite references to sheet `target` in the formulas of this sheet
    /// (named `host`).
    pub fn shift_foreign_references(&mut self, ins: &Insertion, target: &str, host: &str) {
        self.root.walk_mut(&mut |e: &mut XmlElement| {
            if FORMULA_ELEMENTS.contains(&e.local_name()) {
                rewrite_text(e, |text| ins.shift_formula(text, target, Some(host)));
            }
        });
    }

    /// Rewrite qualified references after a sheet rename.
    pub fn rename_references(&mut self, old_name: &str, new_name: &str) {
        self.root.walk_mut(&mut |e: &mut XmlElement| {
            if FORMULA_ELEMENTS.contains(&e.local_name()) {
                rewrite_text(e, |text| formula::rename_sheet_references(text, old_name, new_name));
            }
        });
    }
}

/// Fail when `at` lies inside one of `merged` without being its anchor.
pub fn ensure_addressable(merged: &[RangeRef], at: CellRef) -> Result<()> {
    match merged.iter().find(|m| m.contains(at) && m.start() != at) {
        Some(range) => Err(Error::invalid(format!(
            "cell {} is covered by merged range {}; write to {} instead",
            at,
            range,
            range.start()
        ))),
        None => Ok(()),
    }
}

fn rewrite_text(e: &mut XmlElement, rewrite: impl FnOnce(&str) -> String) {
    let text = e.text();
    if text.is_empty() {
        return;
    }
    let rewritten = rewrite(&text);
    if rewritten != text {
        e.set_text(rewritten);
    }
}

fn row_attr(row: &XmlElement) -> Option<u32> {
    row.attr("r")
        .and_then(|r| atoi_simd::parse::<u32>(r.trim().as_bytes()).ok())
}

fn cell_attr(c: &XmlElement) -> Option<CellRef> {
    c.attr("r").and_then(|r| CellRef::parse(r).ok())
}

/// Every cell with its position, honoring implicit positions.
fn positioned_cells(root: &XmlElement) -> Vec<(CellRef, &XmlElement)> {
    let mut out = Vec::new();
    let Some(sheet_data) = root.child("sheetData") else {
        return out;
    };
    let mut row_number = 0u32;
    for row in sheet_data.children_named("row") {
        row_number = row_attr(row).unwrap_or(row_number + 1);
        let mut col = 0u32;
        for c in row.children_named("c") {
            col = cell_attr(c).map(|at| at.col).unwrap_or(col + 1);
            out.push((CellRef::new(row_number, col), c));
        }
    }
    out
}

/// Bounding box of the present cells.
pub fn used_range(root: &XmlElement) -> Option<RangeRef> {
    let cells = positioned_cells(root);
    let (first, _) = cells.first()?;
    let mut range = RangeRef::from_corners(*first, *first);
    for (at, _) in &cells {
        range = RangeRef::from_corners(
            CellRef::new(range.min_row.min(at.row), range.min_col.min(at.col)),
            CellRef::new(range.max_row.max(at.row), range.max_col.max(at.col)),
        );
    }
    Some(range)
}

/// Highest row and column holding a cell.
pub fn max_extent(root: &XmlElement) -> Option<(u32, u32)> {
    used_range(root).map(|range| (range.max_row, range.max_col))
}

/// Display text of every cell from `A1` to the last used row and column,
/// row-major, with empty strings for absent cells.
pub fn read_rows(
    root: &XmlElement,
    strings: &SharedStrings,
    kinds: &[ValueKind],
) -> Vec<Vec<String>> {
    let cells = positioned_cells(root);
    let mut values: BTreeMap<(u32, u32), String> = BTreeMap::new();
    let (mut max_row, mut max_col) = (0u32, 0u32);
    for (at, c) in cells {
        max_row = max_row.max(at.row);
        max_col = max_col.max(at.col);
        let value = cell::read_value(c, strings, kinds);
        if !value.is_empty() {
            values.insert((at.row, at.col), value);
        }
    }

    (1..=max_row)
        .map(|row| {
            (1..=max_col)
                .map(|col| values.remove(&(row, col)).unwrap_or_default())
                .collect()
        })
        .collect()
}

/// Whether the sheet state marks the sheet hidden.
pub fn is_hidden_state(state: Option<&str>) -> bool {
    matches!(state, Some("hidden" | "veryHidden"))
}
