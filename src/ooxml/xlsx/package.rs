/// Package implementation for Excel workbooks.
use super::cell::{self, CellInput};
use super::formula::{self, Axis, Insertion};
use super::qualified_name;
use super::reference::{CellRef, MAX_COL, MAX_ROW, RangeRef};
use super::shared_strings::{self, SharedStrings};
use super::styles::{self, CellFormat, StyleSheet};
use super::template;
use super::worksheet::{self, Worksheet};
use crate::common::error::{Error, Result};
use crate::common::xml::{XmlDocument, XmlElement};
use crate::ooxml::metadata::{self, CoreProperties};
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::opc::{OpcPackage, PackURI};
use crate::ooxml::{relationship_prefix, uri};
use std::path::Path;
use tracing::debug;

/// Main part content types accepted as workbooks.
const MAIN_CONTENT_TYPES: &[&str] = &[
    ct::SML_SHEET_MAIN,
    ct::SML_TEMPLATE_MAIN,
    ct::SML_SHEET_MACRO,
];

/// Child sequence of `CT_Workbook`.
const WORKBOOK_ORDER: &[&str] = &[
    "fileVersion",
    "fileSharing",
    "workbookPr",
    "workbookProtection",
    "bookViews",
    "sheets",
    "functionGroups",
    "externalReferences",
    "definedNames",
    "calcPr",
    "oleSize",
    "customWorkbookViews",
    "pivotCaches",
    "smartTagPr",
    "smartTagTypes",
    "webPublishing",
    "fileRecoveryPr",
    "webPublishObjects",
    "extLst",
];

/// Longest sheet name Excel accepts.
const MAX_SHEET_NAME_LEN: usize = 31;

/// Largest range `format_range` will touch cell by cell.
const MAX_FORMAT_CELLS: u64 = 1_000_000;

/// One entry of the workbook's sheet list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetInfo {
    pub name: String,
    pub sheet_id: u32,
    pub r_id: String,
    pub hidden: bool,
    /// Partname of the worksheet part
    pub partname: PackURI,
}

/// An Excel (.xlsx) package.
pub struct Package {
    opc: OpcPackage,
    /// Partname of `xl/workbook.xml`
    main: PackURI,
    /// Shared strings, loaded on first write
    strings: Option<SharedStrings>,
}

enum Stored<'a> {
    Shared(usize),
    Formula(&'a str),
}

impl Package {
    /// Open a .xlsx package from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_opc(OpcPackage::open(path)?)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_opc(OpcPackage::from_bytes(data)?)
    }

    fn from_opc(opc: OpcPackage) -> Result<Self> {
        let main = opc
            .main_partname()
            .map_err(|e| Error::corrupt(format!("main workbook part: {}", e)))?;
        let content_type = opc
            .part(&main)
            .map_err(|e| Error::corrupt(format!("main workbook part: {}", e)))?
            .content_type();
        if !MAIN_CONTENT_TYPES.contains(&content_type) {
            return Err(Error::corrupt(format!(
                "not an Excel workbook (main part is {})",
                content_type
            )));
        }
        Ok(Self {
            opc,
            main,
            strings: None,
        })
    }

    /// A new workbook holding one empty sheet named `Sheet`.
    pub fn new() -> Result<Self> {
        let mut opc = OpcPackage::new();
        let main = uri("/xl/workbook.xml")?;
        opc.add_xml_part(
            main.clone(),
            ct::SML_SHEET_MAIN,
            XmlDocument::parse(template::default_workbook_xml().as_bytes())?,
        );
        opc.relate_to(&main, rt::OFFICE_DOCUMENT);

        for (partname, content_type, reltype, xml) in [
            (
                "/xl/styles.xml",
                ct::SML_STYLES,
                rt::STYLES,
                template::default_styles_xml(),
            ),
            (
                "/xl/sharedStrings.xml",
                ct::SML_SHARED_STRINGS,
                rt::SHARED_STRINGS,
                template::default_shared_strings_xml(),
            ),
            (
                "/xl/theme/theme1.xml",
                ct::OFC_THEME,
                rt::THEME,
                metadata::default_theme_xml(),
            ),
        ] {
            let partname = uri(partname)?;
            opc.add_xml_part(partname.clone(), content_type, XmlDocument::parse(xml.as_bytes())?);
            opc.relate_parts(&main, &partname, reltype)?;
        }

        let core = CoreProperties::new(None, chrono::Utc::now());
        metadata::add_property_parts(&mut opc, &core)?;

        let mut pkg = Self {
            opc,
            main,
            strings: None,
        };
        let sheet = pkg.add_sheet("Sheet")?;
        Worksheet::new(pkg.worksheet_root_mut(&sheet)?).set_tab_selected(true);
        Ok(pkg)
    }

    /// Write the workbook to `path`.
    ///
    /// Fails with `InvalidArgument` when every sheet is hidden; a hidden
    /// active sheet is replaced by the first visible one.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.fix_active_tab()?;
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

    /// The parsed `workbook` root.
    pub fn workbook(&self) -> Result<&XmlElement> {
        Ok(&self.opc.xml(&self.main)?.root)
    }

    fn workbook_mut(&mut self) -> Result<&mut XmlElement> {
        Ok(&mut self.opc.xml_mut(&self.main)?.root)
    }

    /// Sheets in tab order.
    pub fn sheets(&self) -> Result<Vec<SheetInfo>> {
        let Some(list) = self.workbook()?.child("sheets") else {
            return Ok(Vec::new());
        };
        list.children_named("sheet")
            .map(|sheet| -> Result<SheetInfo> {
                let name = sheet
                    .attr("name")
                    .ok_or_else(|| Error::corrupt("sheet without a name"))?;
                let r_id = sheet
                    .attr_local("id")
                    .ok_or_else(|| Error::corrupt(format!("sheet {} has no r:id", name)))?;
                let partname = self.opc.related_partname(&self.main, r_id)?;
                Ok(SheetInfo {
                    name: name.to_string(),
                    sheet_id: sheet
                        .attr("sheetId")
                        .and_then(|v| atoi_simd::parse::<u32>(v.as_bytes()).ok())
                        .unwrap_or(0),
                    r_id: r_id.to_string(),
                    hidden: worksheet::is_hidden_state(sheet.attr("state")),
                    partname,
                })
            })
            .collect()
    }

    /// Look a sheet up by its exact name.
    pub fn sheet(&self, name: &str) -> Result<SheetInfo> {
        self.sheets()?
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::NotFound(format!("sheet '{}'", name)))
    }

    fn sheet_position(&self, name: &str) -> Result<(usize, Vec<SheetInfo>)> {
        let sheets = self.sheets()?;
        let index = sheets
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| Error::NotFound(format!("sheet '{}'", name)))?;
        Ok((index, sheets))
    }

    /// The parsed `worksheet` root of a sheet.
    pub fn worksheet_root(&self, sheet: &SheetInfo) -> Result<&XmlElement> {
        Ok(&self.opc.xml(&sheet.partname)?.root)
    }

    pub fn worksheet_root_mut(&mut self, sheet: &SheetInfo) -> Result<&mut XmlElement> {
        Ok(&mut self.opc.xml_mut(&sheet.partname)?.root)
    }

    /// Append a new empty sheet. A name already taken (ignoring case) gets
    /// the next free numeric suffix, so the returned name may differ.
    pub fn add_sheet(&mut self, name: &str) -> Result<SheetInfo> {
        validate_sheet_name(name)?;
        let existing = self.sheets()?;
        let names: Vec<&str> = existing.iter().map(|s| s.name.as_str()).collect();
        let name = avoid_duplicate_name(&names, name);
        let sheet_id = existing.iter().map(|s| s.sheet_id).max().unwrap_or(0) + 1;

        let partname = self.opc.next_partname("/xl/worksheets/sheet%d.xml")?;
        self.opc.add_xml_part(
            partname.clone(),
            ct::SML_WORKSHEET,
            XmlDocument::parse(template::default_worksheet_xml().as_bytes())?,
        );
        let r_id = self.opc.relate_parts(&self.main, &partname, rt::WORKSHEET)?;

        let root = self.workbook_mut()?;
        let r_attr = format!("{}:id", relationship_prefix(root));
        let sheet_name = qualified_name(root.prefix(), "sheet");
        let list_name = qualified_name(root.prefix(), "sheets");
        root.get_or_insert_ordered(&list_name, WORKBOOK_ORDER).push(
            XmlElement::new(sheet_name)
                .with_attr("name", name.as_str())
                .with_attr("sheetId", sheet_id.to_string())
                .with_attr(&r_attr, r_id.as_str()),
        );
        debug!(sheet = %name, partname = %partname, "added worksheet");

        Ok(SheetInfo {
            name,
            sheet_id,
            r_id,
            hidden: false,
            partname,
        })
    }

    /// Rename a sheet, rewriting qualified references to it in every
    /// formula and defined name.
    pub fn rename_sheet(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        let (index, sheets) = self.sheet_position(old_name)?;
        validate_sheet_name(new_name)?;
        if old_name == new_name {
            return Ok(());
        }
        let taken = sheets
            .iter()
            .enumerate()
            .any(|(i, s)| i != index && s.name.eq_ignore_ascii_case(new_name));
        if taken {
            return Err(Error::invalid(format!(
                "a sheet named '{}' already exists",
                new_name
            )));
        }

        self.with_sheet_element(index, |sheet| sheet.set_attr("name", new_name))?;
        for sheet in &sheets {
            Worksheet::new(self.worksheet_root_mut(sheet)?).rename_references(old_name, new_name);
        }
        self.rewrite_defined_names(|text| formula::rename_sheet_references(text, old_name, new_name))?;
        Ok(())
    }

    /// Remove a sheet and release its relationship. The last sheet of a
    /// workbook cannot be deleted.
    pub fn delete_sheet(&mut self, name: &str) -> Result<()> {
        let (index, sheets) = self.sheet_position(name)?;
        if sheets.len() == 1 {
            return Err(Error::invalid("a workbook must keep at least one sheet"));
        }
        let removed = &sheets[index];

        let root = self.workbook_mut()?;
        if let Some(list) = root.child_mut("sheets") {
            list.retain_elements(|s| !(s.is("sheet") && s.attr("name") == Some(name)));
        }

        if let Some(names) = root.child_mut("definedNames") {
            names.retain_elements(|n| local_sheet_id(n) != Some(index));
            for defined in names.children_named_mut("definedName") {
                if let Some(id) = local_sheet_id(defined)
                    && id > index
                {
                    defined.set_attr("localSheetId", (id - 1).to_string());
                }
            }
        }
        if root
            .child("definedNames")
            .is_some_and(|names| names.elements().next().is_none())
        {
            root.remove_children("definedNames");
        }

        let remaining = sheets.len() - 1;
        if let Some(view) = root.path_mut(&["bookViews", "workbookView"]) {
            for attr in ["activeTab", "firstSheet"] {
                let Some(current) = view
                    .attr(attr)
                    .and_then(|v| atoi_simd::parse::<usize>(v.as_bytes()).ok())
                else {
                    continue;
                };
                let shifted = if current > index { current - 1 } else { current };
                view.set_attr(attr, shifted.min(remaining - 1).to_string());
            }
        }

        self.opc.part_mut(&self.main)?.rels_mut().remove(&removed.r_id);
        debug!(sheet = name, partname = %removed.partname, "released worksheet");
        Ok(())
    }

    pub fn set_sheet_hidden(&mut self, name: &str, hidden: bool) -> Result<()> {
        let (index, _) = self.sheet_position(name)?;
        self.with_sheet_element(index, |sheet| {
            if hidden {
                sheet.set_attr("state", "hidden");
            } else {
                sheet.remove_attr("state");
            }
        })
    }

    fn with_sheet_element(&mut self, index: usize, f: impl FnOnce(&mut XmlElement)) -> Result<()> {
        let sheet = self
            .workbook_mut()?
            .child_mut("sheets")
            .and_then(|list| list.children_named_mut("sheet").nth(index))
            .ok_or_else(|| Error::corrupt("sheet list changed while editing"))?;
        f(sheet);
        Ok(())
    }

    /// Make sure the active tab points at a visible sheet.
    fn fix_active_tab(&mut self) -> Result<()> {
        let sheets = self.sheets()?;
        let first_visible = sheets
            .iter()
            .position(|s| !s.hidden)
            .ok_or_else(|| Error::invalid("at least one sheet must be visible"))?;

        let root = self.workbook_mut()?;
        let active = root
            .path(&["bookViews", "workbookView"])
            .and_then(|view| view.attr("activeTab"))
            .and_then(|v| atoi_simd::parse::<usize>(v.as_bytes()).ok())
            .unwrap_or(0);
        if sheets.get(active).is_some_and(|s| !s.hidden) {
            return Ok(());
        }

        let views = qualified_name(root.prefix(), "bookViews");
        let view_name = qualified_name(root.prefix(), "workbookView");
        let book_views = root.get_or_insert_ordered(&views, WORKBOOK_ORDER);
        if book_views.child("workbookView").is_none() {
            book_views.push(XmlElement::new(view_name));
        }
        if let Some(view) = book_views.child_mut("workbookView") {
            view.set_attr("activeTab", first_visible.to_string());
        }
        for (i, sheet) in sheets.iter().enumerate() {
            if i == first_visible || i == active {
                Worksheet::new(self.worksheet_root_mut(sheet)?).set_tab_selected(i == first_visible);
            }
        }
        Ok(())
    }

    fn rewrite_defined_names(&mut self, rewrite: impl Fn(&str) -> String) -> Result<()> {
        let root = self.workbook_mut()?;
        let Some(names) = root.child_mut("definedNames") else {
            return Ok(());
        };
        for defined in names.children_named_mut("definedName") {
            let text = defined.text();
            let rewritten = rewrite(&text);
            if rewritten != text {
                defined.set_text(rewritten);
            }
        }
        Ok(())
    }

    /// Flag the workbook for recalculation and drop the calculation chain,
    /// which no longer matches the stored formulas.
    pub fn mark_formulas_dirty(&mut self) -> Result<()> {
        let root = self.workbook_mut()?;
        let calc_pr = qualified_name(root.prefix(), "calcPr");
        root.get_or_insert_ordered(&calc_pr, WORKBOOK_ORDER)
            .set_attr("fullCalcOnLoad", "1");

        let rels = self.opc.part_mut(&self.main)?.rels_mut();
        let stale: Vec<String> = rels
            .all_with_reltype(rt::CALC_CHAIN)
            .into_iter()
            .map(|r| r.r_id().to_string())
            .collect();
        for r_id in stale {
            rels.remove(&r_id);
        }
        Ok(())
    }

    fn related_part(&self, reltype: &str) -> Option<PackURI> {
        let partname = self.opc.part_related_by(&self.main, reltype).ok()?;
        self.opc.contains_part(&partname).then_some(partname)
    }

    /// Partname of a workbook-level part, created from `xml` when missing.
    fn ensure_part(
        &mut self,
        reltype: &str,
        partname: &str,
        content_type: &str,
        xml: &str,
    ) -> Result<PackURI> {
        if let Some(existing) = self.related_part(reltype) {
            return Ok(existing);
        }
        let preferred = uri(partname)?;
        let partname = if self.opc.contains_part(&preferred) {
            self.opc.next_partname(&partname.replace(".xml", "%d.xml"))?
        } else {
            preferred
        };
        self.opc.add_xml_part(partname.clone(), content_type, XmlDocument::parse(xml.as_bytes())?);
        self.opc.relate_parts(&self.main, &partname, reltype)?;
        Ok(partname)
    }

    fn shared_strings_partname(&mut self) -> Result<PackURI> {
        self.ensure_part(
            rt::SHARED_STRINGS,
            "/xl/sharedStrings.xml",
            ct::SML_SHARED_STRINGS,
            template::default_shared_strings_xml(),
        )
    }

    fn styles_partname(&mut self) -> Result<PackURI> {
        self.ensure_part(
            rt::STYLES,
            "/xl/styles.xml",
            ct::SML_STYLES,
            template::default_styles_xml(),
        )
    }

    /// Index of `text` in the shared string table, appending it if new.
    pub fn intern_string(&mut self, text: &str) -> Result<usize> {
        let partname = self.shared_strings_partname()?;
        if self.strings.is_none() {
            let table = SharedStrings::from_root(&self.opc.xml(&partname)?.root);
            self.strings = Some(table);
        }
        let table = self.strings.get_or_insert_with(SharedStrings::new);

        let root = &mut self.opc.xml_mut(&partname)?.root;
        let index = match table.index_of(text) {
            Some(index) => index,
            None => {
                let mut item = shared_strings::item_element(text);
                if let Some(prefix) = root.prefix().map(str::to_string) {
                    item.walk_mut(&mut |e: &mut XmlElement| {
                        e.name = qualified_name(Some(&prefix), &e.name);
                    });
                }
                root.push(item);
                table.push(text)
            },
        };

        let count = root
            .attr("count")
            .and_then(|v| atoi_simd::parse::<usize>(v.as_bytes()).ok())
            .unwrap_or(0);
        root.set_attr("count", (count + 1).to_string());
        root.set_attr("uniqueCount", table.len().to_string());
        Ok(index)
    }

    /// Store values into cells. Text starting with `=` becomes a formula.
    ///
    /// A cell hidden inside a merged range only accepts an empty value,
    /// which leaves it as the merge left it; anything else is rejected
    /// before the workbook changes.
    pub fn write_cells(&mut self, sheet: &SheetInfo, cells: &[(CellRef, String)]) -> Result<()> {
        let cells: Vec<&(CellRef, String)> = {
            let merged = Worksheet::new(self.worksheet_root_mut(sheet)?).merged_ranges();
            let mut kept = Vec::with_capacity(cells.len());
            for entry in cells {
                match worksheet::ensure_addressable(&merged, entry.0) {
                    Ok(()) => kept.push(entry),
                    Err(_) if entry.1.is_empty() => {},
                    Err(e) => return Err(e),
                }
            }
            kept
        };

        let mut stored = Vec::with_capacity(cells.len());
        let mut has_formula = false;
        for (at, value) in cells {
            match CellInput::classify(value) {
                CellInput::Text(text) => stored.push((*at, Stored::Shared(self.intern_string(text)?))),
                CellInput::Formula(f) => {
                    has_formula = true;
                    stored.push((*at, Stored::Formula(f)));
                },
            }
        }

        let mut ws = Worksheet::new(self.worksheet_root_mut(sheet)?);
        for (at, value) in stored {
            let c = ws.cell_mut(at)?;
            match value {
                Stored::Shared(index) => cell::set_shared_string(c, index),
                Stored::Formula(f) => cell::set_formula(c, f),
            }
        }
        ws.refresh_dimension();

        if has_formula {
            self.mark_formulas_dirty()?;
        }
        Ok(())
    }

    /// Write `headers` into row 1 and data rows from row 2 on. Row 1 is
    /// left alone when there are no headers.
    pub fn write_table(
        &mut self,
        sheet: &SheetInfo,
        headers: &[String],
        rows: &[Vec<String>],
    ) -> Result<()> {
        let mut cells = row_cells(1, headers)?;
        let mut row_number = 2u32;
        for row in rows {
            cells.extend(row_cells(row_number, row)?);
            row_number = row_number
                .checked_add(1)
                .ok_or_else(|| Error::invalid("too many rows"))?;
        }
        self.write_cells(sheet, &cells)
    }

    /// Apply `format` to every cell of `range`, creating missing cells.
    /// With `hide_rows`, every row the range spans is hidden.
    pub fn format_range(
        &mut self,
        sheet: &SheetInfo,
        range: RangeRef,
        format: &CellFormat,
        hide_rows: bool,
    ) -> Result<()> {
        let format = format.clone().validated()?;
        if !format.is_empty() && range.cell_count() > MAX_FORMAT_CELLS {
            return Err(Error::invalid(format!(
                "range {} has more than {} cells",
                range, MAX_FORMAT_CELLS
            )));
        }

        let mut bases = Vec::new();
        {
            let mut ws = Worksheet::new(self.worksheet_root_mut(sheet)?);
            if !format.is_empty() {
                for at in range.cells() {
                    let c = ws.cell_mut(at)?;
                    let base = c
                        .attr("s")
                        .and_then(|v| atoi_simd::parse::<u32>(v.as_bytes()).ok())
                        .unwrap_or(0);
                    bases.push((at, base));
                }
            }
            if hide_rows {
                for row in range.min_row..=range.max_row {
                    ws.hide_row(row)?;
                }
            }
            ws.refresh_dimension();
        }
        if bases.is_empty() {
            return Ok(());
        }

        let styles_part = self.styles_partname()?;
        let assigned: Vec<(CellRef, u32)> = {
            let mut sheet_styles = StyleSheet::new(&mut self.opc.xml_mut(&styles_part)?.root);
            bases
                .into_iter()
                .map(|(at, base)| (at, sheet_styles.derive(base, &format)))
                .collect()
        };

        let mut ws = Worksheet::new(self.worksheet_root_mut(sheet)?);
        for (at, xf) in assigned {
            ws.cell_mut(at)?.set_attr("s", xf.to_string());
        }
        Ok(())
    }

    pub fn merge_cells(&mut self, sheet: &SheetInfo, range: RangeRef) -> Result<()> {
        let mut ws = Worksheet::new(self.worksheet_root_mut(sheet)?);
        ws.merge(range)?;
        ws.refresh_dimension();
        Ok(())
    }

    /// Insert blank rows or columns into `sheet`, moving cells and every
    /// reference to the moved cells throughout the workbook.
    pub fn insert(&mut self, sheet_name: &str, ins: Insertion) -> Result<()> {
        let (what, limit) = match ins.axis {
            Axis::Row => ("row", MAX_ROW),
            Axis::Col => ("column", MAX_COL),
        };
        if ins.at == 0 || ins.at > limit {
            return Err(Error::invalid(format!("{} index must be between 1 and {}", what, limit)));
        }
        if ins.count == 0 {
            return Err(Error::invalid("count must be at least 1"));
        }

        let (index, sheets) = self.sheet_position(sheet_name)?;
        let target = &sheets[index];
        if let Some((max_row, max_col)) = worksheet::max_extent(self.worksheet_root(target)?) {
            let last = match ins.axis {
                Axis::Row => max_row,
                Axis::Col => max_col,
            };
            if last >= ins.at && ins.shift(last).is_none() {
                return Err(Error::invalid(format!(
                    "inserting {} {}(s) would push cells off the sheet",
                    ins.count, what
                )));
            }
        }

        for sheet in &sheets {
            let mut ws = Worksheet::new(self.worksheet_root_mut(sheet)?);
            if sheet.name == target.name {
                ws.insert(&ins, &target.name);
                ws.refresh_dimension();
            } else {
                ws.shift_foreign_references(&ins, &target.name, &sheet.name);
            }
        }
        let target_name = target.name.clone();
        self.rewrite_defined_names(|text| ins.shift_formula(text, &target_name, None))?;
        self.mark_formulas_dirty()?;
        debug!(sheet = sheet_name, what, at = ins.at, count = ins.count, "shifted cells");
        Ok(())
    }

    /// Display text of every cell of `sheet`, see [`worksheet::read_rows`].
    pub fn read_sheet(&self, sheet: &SheetInfo) -> Result<Vec<Vec<String>>> {
        let strings = match self.related_part(rt::SHARED_STRINGS) {
            Some(partname) => SharedStrings::from_root(&self.opc.xml(&partname)?.root),
            None => SharedStrings::new(),
        };
        let kinds = match self.related_part(rt::STYLES) {
            Some(partname) => styles::value_kinds(&self.opc.xml(&partname)?.root),
            None => Vec::new(),
        };
        Ok(worksheet::read_rows(self.worksheet_root(sheet)?, &strings, &kinds))
    }
}

fn row_cells(row: u32, values: &[String]) -> Result<Vec<(CellRef, String)>> {
    if values.len() > MAX_COL as usize {
        return Err(Error::invalid(format!("a row holds at most {} values", MAX_COL)));
    }
    if row > MAX_ROW {
        return Err(Error::invalid(format!("a sheet holds at most {} rows", MAX_ROW)));
    }
    Ok(values
        .iter()
        .zip(1u32..)
        .map(|(value, col)| (CellRef::new(row, col), value.clone()))
        .collect())
}

fn local_sheet_id(defined: &XmlElement) -> Option<usize> {
    defined
        .attr("localSheetId")
        .and_then(|v| atoi_simd::parse::<usize>(v.as_bytes()).ok())
}

/// Reject names Excel refuses to open.
pub fn validate_sheet_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid("sheet name must not be empty"));
    }
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return Err(Error::invalid(format!(
            "sheet name '{}' is longer than {} characters",
            name, MAX_SHEET_NAME_LEN
        )));
    }
    if let Some(c) = name.chars().find(|c| "[]:*?/\\".contains(*c)) {
        return Err(Error::invalid(format!(
            "sheet name '{}' contains the invalid character '{}'",
            name, c
        )));
    }
    Ok(())
}

/// `name` itself when free, otherwise `name` followed by one more than the
/// highest numeric suffix already used with it.
fn avoid_duplicate_name(existing: &[&str], name: &str) -> String {
    let lower = name.to_lowercase();
    if !existing.iter().any(|n| n.to_lowercase() == lower) {
        return name.to_string();
    }
    let highest = existing
        .iter()
        .filter_map(|n| {
            let n = n.to_lowercase();
            let suffix = n.strip_prefix(&lower)?;
            if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            suffix.parse::<u64>().ok()
        })
        .max()
        .unwrap_or(0);
    format!("{}{}", name, highest + 1)
}
