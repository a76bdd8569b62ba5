//! Translate request addresses into document handles.
//!
//! Every bounds and name check of the engines happens here, before any
//! mutation. Nothing in this module changes a document.

use crate::common::error::{Error, Result};
use crate::ooxml::xlsx::{self, CellRef, RangeRef, SheetInfo};
use crate::ooxml::{docx, pptx};
use tracing::debug;

/// Check a signed request index against `count`.
pub fn index(what: &'static str, index: i64, count: usize) -> Result<usize> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < count)
        .ok_or(Error::OutOfRange { what, index, count })
}

/// Body paragraph index.
pub fn paragraph(doc: &docx::Package, index: i64) -> Result<usize> {
    let resolved = self::index("paragraph", index, doc.paragraph_count()?)?;
    debug!(index = resolved, "resolved paragraph");
    Ok(resolved)
}

/// Slide by 0-based position.
pub fn slide(prs: &pptx::Package, index: i64) -> Result<pptx::SlideRef> {
    let slide = prs.slide(index)?;
    debug!(index, partname = %slide.partname, "resolved slide");
    Ok(slide)
}

/// Sheet by exact, case-sensitive name.
pub fn sheet(book: &xlsx::Package, name: &str) -> Result<SheetInfo> {
    book.sheet(name)
}

pub fn cell(reference: &str) -> Result<CellRef> {
    CellRef::parse(reference)
}

/// `start` alone, or the rectangle between `start` and `end`.
pub fn range(start: &str, end: Option<&str>) -> Result<RangeRef> {
    let first = RangeRef::parse(start)?;
    match end.map(str::trim).filter(|e| !e.is_empty()) {
        Some(end) => {
            let last = RangeRef::parse(end)?;
            Ok(RangeRef::from_corners(first.start(), last.end()))
        },
        None => Ok(first),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_bounds() {
        assert_eq!(index("slide", 0, 2).unwrap(), 0);
        assert_eq!(index("slide", 1, 2).unwrap(), 1);
        for bad in [2, 7, -1, i64::MIN] {
            match index("slide", bad, 2).unwrap_err() {
                Error::OutOfRange { what, index, count } => {
                    assert_eq!((what, index, count), ("slide", bad, 2));
                },
                other => panic!("unexpected {:?}", other),
            }
        }
        assert!(index("paragraph", 0, 0).is_err());
    }

    #[test]
    fn test_range_forms() {
        let corners = |r: RangeRef| (r.min_row, r.min_col, r.max_row, r.max_col);
        assert_eq!(corners(range("A1", None).unwrap()), (1, 1, 1, 1));
        assert_eq!(corners(range("A1:C3", None).unwrap()), (1, 1, 3, 3));
        assert_eq!(corners(range("C3", Some("A1")).unwrap()), (1, 1, 3, 3));
        assert_eq!(range("B2", Some("D5")).unwrap().to_string(), "B2:D5");
        assert_eq!(range("B2", Some("")).unwrap().to_string(), "B2");
        assert_eq!(range("B2", None).unwrap().to_string(), "B2");
    }

    #[test]
    fn test_malformed_references() {
        for bad in ["", "A", "1A", "A1:B", "A1:B2:C3", "A0", "hello world"] {
            assert!(
                matches!(range(bad, None), Err(Error::InvalidReference(_))),
                "{} should be rejected",
                bad
            );
        }
        assert!(matches!(cell("ZZZZ1"), Err(Error::InvalidReference(_))));
    }

    #[test]
    fn test_sheet_lookup_is_case_sensitive() {
        let book = xlsx::Package::new().unwrap();
        assert_eq!(sheet(&book, "Sheet").unwrap().name, "Sheet");
        assert!(matches!(sheet(&book, "sheet"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_paragraph_and_slide() {
        let mut doc = docx::Package::new().unwrap();
        doc.add_paragraph("one", None).unwrap();
        assert_eq!(paragraph(&doc, 0).unwrap(), 0);
        assert!(matches!(paragraph(&doc, 1), Err(Error::OutOfRange { .. })));

        let prs = pptx::Package::new().unwrap();
        assert!(matches!(slide(&prs, 0), Err(Error::OutOfRange { count: 0, .. })));
    }
}
