//! Excel operations.

use super::models::*;
use super::{Service, resolve};
use crate::common::error::{Error, Result};
use crate::ooxml::xlsx::{Axis, CellFormat, Insertion, Package, SheetInfo};
use serde_json::{Map, Value, json};
use tracing::info;

fn row_text(rows: &[Vec<CellValue>]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| row.iter().map(CellValue::to_text).collect())
        .collect()
}

/// Write `headers` and `rows` into `sheet` and apply its visibility.
fn fill_sheet(
    book: &mut Package,
    sheet: &SheetInfo,
    headers: &[String],
    rows: &[Vec<CellValue>],
    hidden: bool,
) -> Result<()> {
    book.write_table(sheet, headers, &row_text(rows))?;
    if hidden {
        book.set_sheet_hidden(&sheet.name, true)?;
    }
    Ok(())
}

/// The first definition takes over the new workbook's default sheet.
pub fn create(svc: &Service, req: CreateExcelRequest) -> Result<Outcome> {
    svc.create(&req.file_path, |book: &mut Package| {
        for (i, def) in req.sheets.iter().enumerate() {
            let sheet = if i == 0 {
                let default = book
                    .sheets()?
                    .into_iter()
                    .next()
                    .ok_or_else(|| Error::corrupt("new workbook has no sheet"))?;
                book.rename_sheet(&default.name, &def.name)?;
                resolve::sheet(book, &def.name)?
            } else {
                book.add_sheet(&def.name)?
            };
            fill_sheet(book, &sheet, &def.headers, &def.rows, def.hidden)?;
        }
        Ok(())
    })?;
    info!(path = %req.file_path, sheets = req.sheets.len(), "excel workbook created");
    Ok(Outcome::message(format!("Created {}", req.file_path)))
}

/// Creates the sheet when the workbook has none of that name.
pub fn write_data(svc: &Service, req: WriteExcelDataRequest) -> Result<Outcome> {
    svc.edit(&req.file_path, |book: &mut Package| {
        let sheet = match resolve::sheet(book, &req.sheet_name) {
            Ok(sheet) => sheet,
            Err(Error::NotFound(_)) => book.add_sheet(&req.sheet_name)?,
            Err(e) => return Err(e),
        };
        fill_sheet(book, &sheet, &req.headers, &req.rows, req.hidden)
    })?;
    info!(
        path = %req.file_path,
        sheet = %req.sheet_name,
        rows = req.rows.len(),
        "excel data written"
    );
    Ok(Outcome::message(format!(
        "Data written to {} in {}",
        req.sheet_name, req.file_path
    )))
}

/// One named sheet or every sheet, in tab order.
pub fn read(svc: &Service, req: ReadExcelRequest) -> Result<Outcome> {
    let sheets = svc.read(&req.file_path, |book: &Package| {
        let targets = match &req.sheet_name {
            Some(name) => vec![resolve::sheet(book, name)?],
            None => book.sheets()?,
        };
        let mut sheets = Map::new();
        for sheet in targets {
            let content = SheetContent {
                rows: book.read_sheet(&sheet)?,
                hidden: sheet.hidden,
            };
            let value = serde_json::to_value(content).map_err(std::io::Error::from)?;
            sheets.insert(sheet.name, value);
        }
        Ok(sheets)
    })?;
    Ok(Outcome::with_data("OK", json!({ "sheets": Value::Object(sheets) })))
}

pub fn apply_formula(svc: &Service, req: ApplyFormulaRequest) -> Result<Outcome> {
    let cell = resolve::cell(&req.cell)?;
    svc.edit(&req.file_path, |book: &mut Package| {
        let sheet = resolve::sheet(book, &req.sheet_name)?;
        book.write_cells(&sheet, &[(cell, req.formula.clone())])
    })?;
    info!(path = %req.file_path, sheet = %req.sheet_name, %cell, "excel formula set");
    Ok(Outcome::message(format!(
        "Formula set in {}: {}",
        req.cell, req.formula
    )))
}

pub fn format_range(svc: &Service, req: FormatRangeRequest) -> Result<Outcome> {
    let range = resolve::range(&req.start_cell, req.end_cell.as_deref())?;
    let format = CellFormat {
        bold: req.bold,
        italic: req.italic,
        size: req.font_size.filter(|&size| size != 0.0),
        color: req.font_color.clone(),
        fill: req.fill_color.clone(),
        number_format: req.number_format.clone(),
    }
    .validated()?;
    let hide_rows = req.hidden == Some(true);

    svc.edit(&req.file_path, |book: &mut Package| {
        let sheet = resolve::sheet(book, &req.sheet_name)?;
        book.format_range(&sheet, range, &format, hide_rows)
    })?;

    let label = match req.end_cell.as_deref().filter(|e| !e.is_empty()) {
        Some(end) => format!("{}:{}", req.start_cell, end),
        None => req.start_cell.clone(),
    };
    info!(path = %req.file_path, sheet = %req.sheet_name, %range, hide_rows, "excel range formatted");
    Ok(Outcome::message(format!("Formatted range {}", label)))
}

pub fn merge_cells(svc: &Service, req: MergeCellsRequest) -> Result<Outcome> {
    let range = resolve::range(&req.start_cell, Some(&req.end_cell))?;
    svc.edit(&req.file_path, |book: &mut Package| {
        let sheet = resolve::sheet(book, &req.sheet_name)?;
        book.merge_cells(&sheet, range)
    })?;
    info!(path = %req.file_path, sheet = %req.sheet_name, %range, "excel cells merged");
    Ok(Outcome::message(format!(
        "Merged {}:{}",
        req.start_cell, req.end_cell
    )))
}

pub fn delete_sheet(svc: &Service, req: SheetOpRequest) -> Result<Outcome> {
    svc.edit(&req.file_path, |book: &mut Package| {
        resolve::sheet(book, &req.sheet_name)?;
        book.delete_sheet(&req.sheet_name)
    })?;
    info!(path = %req.file_path, sheet = %req.sheet_name, "excel sheet deleted");
    Ok(Outcome::message(format!("Deleted sheet '{}'", req.sheet_name)))
}

pub fn rename_sheet(svc: &Service, req: SheetOpRequest) -> Result<Outcome> {
    let new_name = svc.edit(&req.file_path, |book: &mut Package| {
        resolve::sheet(book, &req.sheet_name)?;
        let new_name = req
            .new_name
            .clone()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::invalid("new_name is required"))?;
        book.rename_sheet(&req.sheet_name, &new_name)?;
        Ok(new_name)
    })?;
    info!(path = %req.file_path, from = %req.sheet_name, to = %new_name, "excel sheet renamed");
    Ok(Outcome::message(format!(
        "Renamed '{}' -> '{}'",
        req.sheet_name, new_name
    )))
}

fn insert(svc: &Service, req: &InsertRowsColsRequest, axis: Axis) -> Result<()> {
    let at = u32::try_from(req.index)
        .ok()
        .filter(|&at| at >= 1)
        .ok_or_else(|| Error::invalid(format!("index must be at least 1, got {}", req.index)))?;
    svc.edit(&req.file_path, |book: &mut Package| {
        resolve::sheet(book, &req.sheet_name)?;
        book.insert(&req.sheet_name, Insertion {
            axis,
            at,
            count: req.count,
        })
    })?;
    info!(
        path = %req.file_path,
        sheet = %req.sheet_name,
        ?axis,
        at,
        count = req.count,
        "excel cells shifted"
    );
    Ok(())
}

pub fn insert_rows(svc: &Service, req: InsertRowsColsRequest) -> Result<Outcome> {
    insert(svc, &req, Axis::Row)?;
    Ok(Outcome::message(format!(
        "Inserted {} row(s) at index {}",
        req.count, req.index
    )))
}

pub fn insert_cols(svc: &Service, req: InsertRowsColsRequest) -> Result<Outcome> {
    insert(svc, &req, Axis::Col)?;
    Ok(Outcome::message(format!(
        "Inserted {} column(s) at index {}",
        req.count, req.index
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn text(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn values(values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|s| CellValue::Text(s.to_string())).collect()
    }

    fn sheet_def(name: &str, headers: &[&str], rows: &[&[&str]], hidden: bool) -> SheetData {
        SheetData {
            name: name.to_string(),
            headers: text(headers),
            rows: rows.iter().map(|r| values(r)).collect(),
            hidden,
        }
    }

    fn workbook(dir: &TempDir, sheets: Vec<SheetData>) -> (Service, String) {
        let svc = Service::new();
        let path = dir.path().join("book.xlsx").to_string_lossy().into_owned();
        create(
            &svc,
            CreateExcelRequest {
                file_path: path.clone(),
                sheets,
            },
        )
        .unwrap();
        (svc, path)
    }

    fn read_all(svc: &Service, path: &str) -> Value {
        read(
            svc,
            ReadExcelRequest {
                file_path: path.to_string(),
                sheet_name: None,
            },
        )
        .unwrap()
        .data
        .unwrap()
    }

    #[test]
    fn test_create_reuses_default_sheet() {
        let dir = TempDir::new().unwrap();
        let (svc, path) = workbook(
            &dir,
            vec![
                sheet_def("Data", &["A"], &[&["1"]], false),
                sheet_def("Secret", &[], &[&["x"]], true),
            ],
        );
        let data = read_all(&svc, &path);
        let names: Vec<&String> = data["sheets"].as_object().unwrap().keys().collect();
        assert_eq!(names, ["Data", "Secret"]);
        assert_eq!(data["sheets"]["Data"]["rows"], json!([["A"], ["1"]]));
        assert_eq!(data["sheets"]["Secret"]["hidden"], json!(true));
        assert_eq!(data["sheets"]["Secret"]["rows"], json!([[""], ["x"]]));
    }

    #[test]
    fn test_write_data_creates_sheet() {
        let dir = TempDir::new().unwrap();
        let (svc, path) = workbook(&dir, vec![sheet_def("Sheet1", &[], &[], false)]);
        let outcome = write_data(
            &svc,
            WriteExcelDataRequest {
                file_path: path.clone(),
                sheet_name: "New".to_string(),
                headers: text(&["X"]),
                rows: vec![vec![CellValue::Integer(5)]],
                hidden: false,
            },
        )
        .unwrap();
        assert_eq!(outcome.message, format!("Data written to New in {}", path));
        let data = read_all(&svc, &path);
        assert_eq!(data["sheets"]["New"]["rows"], json!([["X"], ["5"]]));
        assert_eq!(data["sheets"]["Sheet1"]["rows"], json!([]));
    }

    #[test]
    fn test_read_missing_sheet() {
        let dir = TempDir::new().unwrap();
        let (svc, path) = workbook(&dir, vec![]);
        let err = read(
            &svc,
            ReadExcelRequest {
                file_path: path,
                sheet_name: Some("Nope".to_string()),
            },
        )
        .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_formula_and_insert_rows() {
        let dir = TempDir::new().unwrap();
        let (svc, path) = workbook(&dir, vec![sheet_def("S", &["a", "b"], &[&["1", "2"]], false)]);
        apply_formula(
            &svc,
            ApplyFormulaRequest {
                file_path: path.clone(),
                sheet_name: "S".to_string(),
                cell: "C3".to_string(),
                formula: "=A3+B3".to_string(),
            },
        )
        .unwrap();
        let outcome = insert_rows(
            &svc,
            InsertRowsColsRequest {
                file_path: path.clone(),
                sheet_name: "S".to_string(),
                index: 2,
                count: 1,
            },
        )
        .unwrap();
        assert_eq!(outcome.message, "Inserted 1 row(s) at index 2");
        let data = read_all(&svc, &path);
        assert_eq!(data["sheets"]["S"]["rows"][3][2], json!("=A4+B4"));
        assert_eq!(data["sheets"]["S"]["rows"][2], json!(["1", "2", ""]));
    }

    #[test]
    fn test_insert_validation() {
        let dir = TempDir::new().unwrap();
        let (svc, path) = workbook(&dir, vec![sheet_def("S", &[], &[], false)]);
        let req = |sheet: &str, index: i64, count: u32| InsertRowsColsRequest {
            file_path: path.clone(),
            sheet_name: sheet.to_string(),
            index,
            count,
        };
        assert_eq!(insert_cols(&svc, req("Missing", 1, 1)).unwrap_err().code(), "NOT_FOUND");
        assert_eq!(insert_cols(&svc, req("S", 0, 1)).unwrap_err().code(), "INVALID_ARGUMENT");
        assert_eq!(insert_cols(&svc, req("S", 1, 0)).unwrap_err().code(), "INVALID_ARGUMENT");
    }

    #[test]
    fn test_sheet_operations() {
        let dir = TempDir::new().unwrap();
        let (svc, path) = workbook(
            &dir,
            vec![sheet_def("A", &[], &[], false), sheet_def("B", &[], &[], false)],
        );
        let op = |name: &str, new_name: Option<&str>| SheetOpRequest {
            file_path: path.clone(),
            sheet_name: name.to_string(),
            new_name: new_name.map(str::to_string),
        };
        assert_eq!(
            rename_sheet(&svc, op("A", Some("Alpha"))).unwrap().message,
            "Renamed 'A' -> 'Alpha'"
        );
        assert_eq!(rename_sheet(&svc, op("B", None)).unwrap_err().code(), "INVALID_ARGUMENT");
        assert_eq!(rename_sheet(&svc, op("Zed", Some("Z"))).unwrap_err().code(), "NOT_FOUND");
        assert_eq!(delete_sheet(&svc, op("B", None)).unwrap().message, "Deleted sheet 'B'");
        assert_eq!(delete_sheet(&svc, op("B", None)).unwrap_err().code(), "NOT_FOUND");

        let data = read_all(&svc, &path);
        let names: Vec<&String> = data["sheets"].as_object().unwrap().keys().collect();
        assert_eq!(names, ["Alpha"]);
    }

    #[test]
    fn test_format_and_merge() {
        let dir = TempDir::new().unwrap();
        let (svc, path) = workbook(&dir, vec![sheet_def("S", &["a", "b"], &[&["1", "2"]], false)]);
        let outcome = format_range(
            &svc,
            FormatRangeRequest {
                file_path: path.clone(),
                sheet_name: "S".to_string(),
                start_cell: "A1".to_string(),
                end_cell: Some("B2".to_string()),
                bold: Some(true),
                italic: None,
                font_size: Some(0.0),
                font_color: Some("#FF0000".to_string()),
                fill_color: None,
                number_format: None,
                hidden: Some(true),
            },
        )
        .unwrap();
        assert_eq!(outcome.message, "Formatted range A1:B2");

        let outcome = merge_cells(
            &svc,
            MergeCellsRequest {
                file_path: path.clone(),
                sheet_name: "S".to_string(),
                start_cell: "A1".to_string(),
                end_cell: "B1".to_string(),
            },
        )
        .unwrap();
        assert_eq!(outcome.message, "Merged A1:B1");

        let book = Package::open(&path).unwrap();
        let sheet = book.sheet("S").unwrap();
        let root = book.worksheet_root(&sheet).unwrap();
        assert_eq!(
            root.path(&["mergeCells", "mergeCell"]).unwrap().attr("ref"),
            Some("A1:B1")
        );
        let hidden_rows = root
            .child("sheetData")
            .unwrap()
            .children_named("row")
            .filter(|r| r.attr("hidden") == Some("1"))
            .count();
        assert_eq!(hidden_rows, 2);
    }

    fn merge(svc: &Service, path: &str, start: &str, end: &str) -> Result<Outcome> {
        merge_cells(
            svc,
            MergeCellsRequest {
                file_path: path.to_string(),
                sheet_name: "S".to_string(),
                start_cell: start.to_string(),
                end_cell: end.to_string(),
            },
        )
    }

    #[test]
    fn test_merged_followers_are_not_addressable() {
        let dir = TempDir::new().unwrap();
        let (svc, path) = workbook(&dir, vec![sheet_def("S", &["a", "b", "c"], &[], false)]);
        merge(&svc, &path, "A1", "B2").unwrap();
        let before = std::fs::read(&path).unwrap();

        let formula = |cell: &str| {
            apply_formula(
                &svc,
                ApplyFormulaRequest {
                    file_path: path.clone(),
                    sheet_name: "S".to_string(),
                    cell: cell.to_string(),
                    formula: "=1+1".to_string(),
                },
            )
        };
        let err = formula("B1").unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
        assert_eq!(std::fs::read(&path).unwrap(), before);

        let err = write_data(
            &svc,
            WriteExcelDataRequest {
                file_path: path.clone(),
                sheet_name: "S".to_string(),
                headers: text(&["x", "y"]),
                rows: vec![],
                hidden: false,
            },
        )
        .unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
        assert_eq!(std::fs::read(&path).unwrap(), before);

        // empty values over the followers leave the merge as it is
        write_data(
            &svc,
            WriteExcelDataRequest {
                file_path: path.clone(),
                sheet_name: "S".to_string(),
                headers: text(&["top", "", "c"]),
                rows: vec![values(&["", "", "z"])],
                hidden: false,
            },
        )
        .unwrap();
        formula("A1").unwrap();
        let data = read_all(&svc, &path);
        assert_eq!(
            data["sheets"]["S"]["rows"],
            json!([["=1+1", "", "c"], ["", "", "z"]])
        );
    }

    #[test]
    fn test_overlapping_merge_is_rejected() {
        let dir = TempDir::new().unwrap();
        let (svc, path) = workbook(
            &dir,
            vec![sheet_def("S", &["a", "b", "c"], &[&["1", "2", "3"], &["4", "5", "6"]], false)],
        );
        merge(&svc, &path, "A1", "B2").unwrap();
        let before = std::fs::read(&path).unwrap();

        let err = merge(&svc, &path, "B2", "C3").unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
        assert_eq!(std::fs::read(&path).unwrap(), before);

        assert_eq!(merge(&svc, &path, "B2", "A1").unwrap().message, "Merged B2:A1");
        merge(&svc, &path, "C1", "C3").unwrap();
        let book = Package::open(&path).unwrap();
        let root = book.worksheet_root(&book.sheet("S").unwrap()).unwrap();
        let refs: Vec<&str> = root
            .child("mergeCells")
            .unwrap()
            .children_named("mergeCell")
            .filter_map(|m| m.attr("ref"))
            .collect();
        assert_eq!(refs, ["A1:B2", "C1:C3"]);
    }

    #[test]
    fn test_bad_reference_is_rejected() {
        let dir = TempDir::new().unwrap();
        let (svc, path) = workbook(&dir, vec![]);
        let before = std::fs::read(&path).unwrap();
        let err = apply_formula(
            &svc,
            ApplyFormulaRequest {
                file_path: path.clone(),
                sheet_name: "Sheet".to_string(),
                cell: "1A".to_string(),
                formula: "=1".to_string(),
            },
        )
        .unwrap_err();
        assert_eq!(err.code(), "INVALID_REFERENCE");
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }
}
