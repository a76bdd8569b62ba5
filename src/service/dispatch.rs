//! Operation table.
//!
//! Maps `(family, operation)` to a handler that deserializes its typed
//! request from the JSON parameters and runs the engine. The table is
//! static; handlers share nothing but the [`Service`].

use super::models::Outcome;
use super::{Service, excel, powerpoint, word};
use crate::common::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info_span};

/// Document family addressed by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Word,
    Excel,
    Pptx,
}

impl Family {
    pub fn as_str(self) -> &'static str {
        match self {
            Family::Word => "word",
            Family::Excel => "excel",
            Family::Pptx => "pptx",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Family {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "word" => Ok(Family::Word),
            "excel" => Ok(Family::Excel),
            "pptx" => Ok(Family::Pptx),
            other => Err(Error::NotFound(format!("document family '{}'", other))),
        }
    }
}

pub type Handler = fn(&Service, Value) -> Result<Outcome>;

/// One entry of the operation table.
pub struct Operation {
    pub family: Family,
    pub name: &'static str,
    /// Whether the operation writes the file
    pub mutates: bool,
    pub handler: Handler,
}

impl Operation {
    /// Run the operation on `params`. Blocks on file I/O and the path lock.
    /// Engine events are recorded inside an `operation` span.
    pub fn run(&self, svc: &Service, params: Value) -> Result<Outcome> {
        let _span = info_span!(
            "operation",
            family = %self.family,
            name = self.name,
            mutates = self.mutates
        )
        .entered();
        let outcome = (self.handler)(svc, params);
        if let Err(e) = &outcome {
            debug!(code = e.code(), error = %e, "operation failed");
        }
        outcome
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.family, self.name)
    }
}

fn invoke<R: DeserializeOwned>(
    svc: &Service,
    params: Value,
    engine: fn(&Service, R) -> Result<Outcome>,
) -> Result<Outcome> {
    let request = serde_json::from_value(params)
        .map_err(|e| Error::invalid(format!("request body: {}", e)))?;
    engine(svc, request)
}

macro_rules! operation {
    ($family:ident, $name:literal, $mutates:literal, $engine:path) => {
        Operation {
            family: Family::$family,
            name: $name,
            mutates: $mutates,
            handler: |svc, params| invoke(svc, params, $engine),
        }
    };
}

pub static OPERATIONS: &[Operation] = &[
    operation!(Word, "create", true, word::create),
    operation!(Word, "add_content", true, word::add_content),
    operation!(Word, "search_replace", true, word::search_replace),
    operation!(Word, "read", false, word::read),
    operation!(Word, "add_table", true, word::add_table),
    operation!(Word, "format_text", true, word::format_text),
    operation!(Word, "add_hyperlink", true, word::add_hyperlink),
    operation!(Word, "delete_paragraph", true, word::delete_paragraph),
    operation!(Word, "add_page_break", true, word::add_page_break),
    operation!(Word, "header_footer", true, word::header_footer),
    operation!(Excel, "create", true, excel::create),
    operation!(Excel, "write_data", true, excel::write_data),
    operation!(Excel, "read", false, excel::read),
    operation!(Excel, "apply_formula", true, excel::apply_formula),
    operation!(Excel, "format_range", true, excel::format_range),
    operation!(Excel, "merge_cells", true, excel::merge_cells),
    operation!(Excel, "delete_sheet", true, excel::delete_sheet),
    operation!(Excel, "rename_sheet", true, excel::rename_sheet),
    operation!(Excel, "insert_rows", true, excel::insert_rows),
    operation!(Excel, "insert_cols", true, excel::insert_cols),
    operation!(Pptx, "create", true, powerpoint::create),
    operation!(Pptx, "add_slide", true, powerpoint::add_slide),
    operation!(Pptx, "read", false, powerpoint::read),
    operation!(Pptx, "add_table", true, powerpoint::add_table),
    operation!(Pptx, "update_slide", true, powerpoint::update_slide),
    operation!(Pptx, "delete_slide", true, powerpoint::delete_slide),
    operation!(Pptx, "duplicate_slide", true, powerpoint::duplicate_slide),
    operation!(Pptx, "set_notes", true, powerpoint::set_notes),
    operation!(Pptx, "get_slide_info", false, powerpoint::get_slide_info),
    operation!(Pptx, "add_shape", true, powerpoint::add_shape),
];

/// Look up an operation by family and name.
pub fn lookup(family: &str, name: &str) -> Option<&'static Operation> {
    let family = family.parse::<Family>().ok()?;
    OPERATIONS
        .iter()
        .find(|op| op.family == family && op.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_every_family_has_ten_operations() {
        for family in [Family::Word, Family::Excel, Family::Pptx] {
            assert_eq!(OPERATIONS.iter().filter(|op| op.family == family).count(), 10);
        }
        let unique: HashSet<(Family, &str)> = OPERATIONS.iter().map(|op| (op.family, op.name)).collect();
        assert_eq!(unique.len(), OPERATIONS.len());
    }

    #[test]
    fn test_lookup() {
        assert_eq!(format!("{:?}", lookup("excel", "merge_cells").unwrap()), "excel/merge_cells");
        assert!(!lookup("pptx", "read").unwrap().mutates);
        assert!(lookup("excel", "add_slide").is_none());
        assert!(lookup("visio", "read").is_none());
    }

    #[test]
    fn test_bad_body_is_invalid_argument() {
        let svc = Service::new();
        let op = lookup("word", "delete_paragraph").unwrap();
        let err = op.run(&svc, json!({"file_path": "x.docx"})).unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
        let err = op.run(&svc, json!([1, 2])).unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
    }

    #[test]
    fn test_non_mutating_operations_leave_files_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let svc = Service::new();
        let create = json!({"slides": [{"title": "t"}], "sheets": [], "paragraphs": ["p"]});
        for family in [Family::Word, Family::Excel, Family::Pptx] {
            let path = dir.path().join(format!("doc.{}", family));
            let mut params = create.clone();
            params["file_path"] = json!(path);
            lookup(family.as_str(), "create").unwrap().run(&svc, params).unwrap();
            let before = std::fs::read(&path).unwrap();

            let readers: Vec<&Operation> = OPERATIONS
                .iter()
                .filter(|op| op.family == family && !op.mutates)
                .collect();
            assert!(!readers.is_empty());
            for op in readers {
                op.run(&svc, json!({"file_path": path, "slide_index": 0})).unwrap();
                assert_eq!(std::fs::read(&path).unwrap(), before, "{:?}", op);
            }
        }
    }

    #[test]
    fn test_run_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.docx");
        let svc = Service::new();
        lookup("word", "create")
            .unwrap()
            .run(&svc, json!({"file_path": path, "paragraphs": ["x"]}))
            .unwrap();
        let outcome = lookup("word", "read")
            .unwrap()
            .run(&svc, json!({"file_path": path}))
            .unwrap();
        assert_eq!(outcome.data.unwrap()["paragraphs"], json!(["x"]));
    }
}
