//! Request and response bodies.
//!
//! One request type per operation. Field names and defaults are part of
//! the wire contract.

use crate::common::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of a successful operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub message: String,
    pub data: Option<Value>,
}

impl Outcome {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(message: impl Into<String>, data: Value) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
        }
    }

    /// Outcome carrying `value` as its data.
    pub fn serialized<T: Serialize>(message: impl Into<String>, value: &T) -> Result<Self> {
        let data = serde_json::to_value(value).map_err(std::io::Error::from)?;
        Ok(Self::with_data(message, data))
    }
}

fn default_one() -> u32 {
    1
}

fn default_heading_level() -> u8 {
    1
}

fn default_sheet_name() -> String {
    "Sheet1".to_string()
}

fn default_shape_type() -> String {
    "rectangle".to_string()
}

// Word

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWordRequest {
    pub file_path: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub paragraphs: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Heading {
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_heading_level")]
    pub level: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddWordContentRequest {
    pub file_path: String,
    #[serde(default)]
    pub paragraphs: Vec<String>,
    #[serde(default)]
    pub headings: Option<Vec<Heading>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchReplaceWordRequest {
    pub file_path: String,
    pub search: String,
    pub replace: String,
}

/// Requests that only name a file.
#[derive(Debug, Clone, Deserialize)]
pub struct FileRequest {
    pub file_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddWordTableRequest {
    pub file_path: String,
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
    #[serde(default)]
    pub style: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormatWordTextRequest {
    pub file_path: String,
    pub paragraph_index: i64,
    #[serde(default)]
    pub bold: Option<bool>,
    #[serde(default)]
    pub italic: Option<bool>,
    #[serde(default)]
    pub underline: Option<bool>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub font_size: Option<f64>,
    #[serde(default)]
    pub font_name: Option<String>,
    #[serde(default)]
    pub hidden: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddWordHyperlinkRequest {
    pub file_path: String,
    pub text: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteWordParagraphRequest {
    pub file_path: String,
    pub paragraph_index: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WordHeaderFooterRequest {
    pub file_path: String,
    #[serde(default)]
    pub header_text: Option<String>,
    #[serde(default)]
    pub footer_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordContent {
    pub paragraphs: Vec<String>,
    pub tables: Vec<Vec<Vec<String>>>,
}

// Excel

#[derive(Debug, Clone, Deserialize)]
pub struct SheetData {
    #[serde(default = "default_sheet_name")]
    pub name: String,
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<CellValue>>,
    #[serde(default)]
    pub hidden: bool,
}

/// A cell value as sent by clients: text, number or boolean.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Empty(()),
}

impl CellValue {
    /// Textual form stored in the sheet; booleans use `True`/`False`.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Integer(n) => itoa::Buffer::new().format(*n).to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Bool(true) => "True".to_string(),
            CellValue::Bool(false) => "False".to_string(),
            CellValue::Empty(()) => String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateExcelRequest {
    pub file_path: String,
    #[serde(default)]
    pub sheets: Vec<SheetData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WriteExcelDataRequest {
    pub file_path: String,
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<CellValue>>,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadExcelRequest {
    pub file_path: String,
    #[serde(default)]
    pub sheet_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplyFormulaRequest {
    pub file_path: String,
    pub sheet_name: String,
    pub cell: String,
    pub formula: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormatRangeRequest {
    pub file_path: String,
    pub sheet_name: String,
    pub start_cell: String,
    #[serde(default)]
    pub end_cell: Option<String>,
    #[serde(default)]
    pub bold: Option<bool>,
    #[serde(default)]
    pub italic: Option<bool>,
    #[serde(default)]
    pub font_size: Option<f64>,
    #[serde(default)]
    pub font_color: Option<String>,
    #[serde(default)]
    pub fill_color: Option<String>,
    #[serde(default)]
    pub number_format: Option<String>,
    #[serde(default)]
    pub hidden: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MergeCellsRequest {
    pub file_path: String,
    pub sheet_name: String,
    pub start_cell: String,
    pub end_cell: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SheetOpRequest {
    pub file_path: String,
    pub sheet_name: String,
    #[serde(default)]
    pub new_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsertRowsColsRequest {
    pub file_path: String,
    pub sheet_name: String,
    pub index: i64,
    #[serde(default = "default_one")]
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetContent {
    pub rows: Vec<Vec<String>>,
    pub hidden: bool,
}

// PowerPoint

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlideData {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePptxRequest {
    pub file_path: String,
    #[serde(default)]
    pub slides: Vec<SlideData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddSlideRequest {
    pub file_path: String,
    #[serde(flatten)]
    pub slide: SlideData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddPptxTableRequest {
    pub file_path: String,
    pub slide_index: i64,
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
    #[serde(default = "TableBounds::left")]
    pub left: f64,
    #[serde(default = "TableBounds::top")]
    pub top: f64,
    #[serde(default = "TableBounds::width")]
    pub width: f64,
    #[serde(default = "TableBounds::height")]
    pub height: f64,
}

/// Default table placement, in inches.
struct TableBounds;

impl TableBounds {
    fn left() -> f64 {
        1.0
    }
    fn top() -> f64 {
        2.0
    }
    fn width() -> f64 {
        8.0
    }
    fn height() -> f64 {
        3.0
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSlideRequest {
    pub file_path: String,
    pub slide_index: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Requests that address one slide and nothing else.
#[derive(Debug, Clone, Deserialize)]
pub struct SlideRequest {
    pub file_path: String,
    pub slide_index: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetNotesRequest {
    pub file_path: String,
    pub slide_index: i64,
    pub notes: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddShapeRequest {
    pub file_path: String,
    pub slide_index: i64,
    #[serde(default = "default_shape_type")]
    pub shape_type: String,
    #[serde(default = "ShapeBounds::left")]
    pub left: f64,
    #[serde(default = "ShapeBounds::top")]
    pub top: f64,
    #[serde(default = "ShapeBounds::width")]
    pub width: f64,
    #[serde(default = "ShapeBounds::height")]
    pub height: f64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub fill_color: Option<String>,
}

/// Default shape placement, in inches.
struct ShapeBounds;

impl ShapeBounds {
    fn left() -> f64 {
        1.0
    }
    fn top() -> f64 {
        1.0
    }
    fn width() -> f64 {
        3.0
    }
    fn height() -> f64 {
        1.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideText {
    pub slide_number: usize,
    pub text: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeSummary {
    pub name: String,
    pub shape_type: String,
    pub left: Option<i64>,
    pub top: Option<i64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_cols: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideInfo {
    pub slide_index: i64,
    pub shapes: Vec<ShapeSummary>,
    pub notes: String,
    pub layout_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let req: InsertRowsColsRequest =
            serde_json::from_value(json!({"file_path": "a.xlsx", "sheet_name": "S", "index": 2}))
                .unwrap();
        assert_eq!(req.count, 1);

        let req: AddShapeRequest =
            serde_json::from_value(json!({"file_path": "a.pptx", "slide_index": 0})).unwrap();
        assert_eq!(req.shape_type, "rectangle");
        assert_eq!((req.left, req.top, req.width, req.height), (1.0, 1.0, 3.0, 1.0));

        let req: AddPptxTableRequest =
            serde_json::from_value(json!({"file_path": "a.pptx", "slide_index": 0})).unwrap();
        assert_eq!((req.left, req.top, req.width, req.height), (1.0, 2.0, 8.0, 3.0));

        let req: CreateExcelRequest =
            serde_json::from_value(json!({"file_path": "a.xlsx", "sheets": [{}]})).unwrap();
        assert_eq!(req.sheets[0].name, "Sheet1");
        assert!(!req.sheets[0].hidden);
    }

    #[test]
    fn test_add_slide_fields_are_flat() {
        let req: AddSlideRequest =
            serde_json::from_value(json!({"file_path": "a.pptx", "title": "T"})).unwrap();
        assert_eq!(req.slide.title, "T");
        assert_eq!(req.slide.content, "");
    }

    #[test]
    fn test_heading_level_defaults_to_one() {
        let req: AddWordContentRequest = serde_json::from_value(json!({
            "file_path": "a.docx",
            "headings": [{"text": "Intro"}, {"text": "Deep", "level": 3}]
        }))
        .unwrap();
        let levels: Vec<u8> = req.headings.unwrap().iter().map(|h| h.level).collect();
        assert_eq!(levels, [1, 3]);
        assert!(req.paragraphs.is_empty());
    }

    #[test]
    fn test_cell_values_become_text() {
        let row: Vec<CellValue> = serde_json::from_value(json!(["a", 5, 2.5, true, null])).unwrap();
        let text: Vec<String> = row.iter().map(CellValue::to_text).collect();
        assert_eq!(text, ["a", "5", "2.5", "True", ""]);
    }

    #[test]
    fn test_shape_summary_omits_absent_fields() {
        let summary = ShapeSummary {
            name: "Oval 2".to_string(),
            shape_type: "oval".to_string(),
            left: Some(0),
            top: Some(0),
            width: None,
            height: None,
            text: None,
            table_rows: None,
            table_cols: None,
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert!(value.get("text").is_none());
        assert_eq!(value["width"], Value::Null);
    }
}
