//! Cell and range references in A1 notation.
//!
//! Rows and columns are 1-based. `$` markers are accepted and ignored when
//! resolving a position; formula rewriting keeps them (see `formula`).

use crate::common::error::{Error, Result};
use std::fmt;

/// Last row of a worksheet.
pub const MAX_ROW: u32 = 1_048_576;
/// Last column of a worksheet (`XFD`).
pub const MAX_COL: u32 = 16_384;

/// A single cell position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    #[inline]
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse `A1`, `$B$2` and the like.
    pub fn parse(input: &str) -> Result<Self> {
        let (row, col) = parse_a1(input.trim())
            .ok_or_else(|| Error::InvalidReference(input.to_string()))?;
        Ok(Self { row, col })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_to_letters(self.col), self.row)
    }
}

/// A rectangle of cells with normalized corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeRef {
    pub min_row: u32,
    pub min_col: u32,
    pub max_row: u32,
    pub max_col: u32,
}

impl RangeRef {
    /// Rectangle spanned by two corners given in any order.
    pub fn from_corners(a: CellRef, b: CellRef) -> Self {
        Self {
            min_row: a.row.min(b.row),
            min_col: a.col.min(b.col),
            max_row: a.row.max(b.row),
            max_col: a.col.max(b.col),
        }
    }

    /// Parse `A1` or `A1:C3`. A sheet qualifier is not accepted here.
    pub fn parse(input: &str) -> Result<Self> {
        let s = input.trim();
        let mut parts = s.split(':');
        let first = parts.next().unwrap_or_default();
        let second = parts.next();
        if parts.next().is_some() {
            return Err(Error::InvalidReference(input.to_string()));
        }

        let start = CellRef::parse(first).map_err(|_| Error::InvalidReference(input.to_string()))?;
        let end = match second {
            Some(cell) => {
                CellRef::parse(cell).map_err(|_| Error::InvalidReference(input.to_string()))?
            },
            None => start,
        };
        Ok(Self::from_corners(start, end))
    }

    #[inline]
    pub fn start(&self) -> CellRef {
        CellRef::new(self.min_row, self.min_col)
    }

    #[inline]
    pub fn end(&self) -> CellRef {
        CellRef::new(self.max_row, self.max_col)
    }

    #[inline]
    pub fn is_single(&self) -> bool {
        self.min_row == self.max_row && self.min_col == self.max_col
    }

    pub fn contains(&self, cell: CellRef) -> bool {
        (self.min_row..=self.max_row).contains(&cell.row)
            && (self.min_col..=self.max_col).contains(&cell.col)
    }

    pub fn intersects(&self, other: &RangeRef) -> bool {
        self.min_row <= other.max_row
            && other.min_row <= self.max_row
            && self.min_col <= other.max_col
            && other.min_col <= self.max_col
    }

    /// Every cell of the rectangle, row-major.
    pub fn cells(&self) -> impl Iterator<Item = CellRef> + use<> {
        let (min_col, max_col) = (self.min_col, self.max_col);
        (self.min_row..=self.max_row)
            .flat_map(move |row| (min_col..=max_col).map(move |col| CellRef::new(row, col)))
    }

    pub fn cell_count(&self) -> u64 {
        u64::from(self.max_row - self.min_row + 1) * u64::from(self.max_col - self.min_col + 1)
    }
}

impl fmt::Display for RangeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single() {
            write!(f, "{}", self.start())
        } else {
            write!(f, "{}:{}", self.start(), self.end())
        }
    }
}

/// Parse an A1 coordinate into `(row, col)`. Both `$` markers are optional;
/// anything after the row digits rejects the reference.
pub(crate) fn parse_a1(cell: &str) -> Option<(u32, u32)> {
    let rest = cell.strip_prefix('$').unwrap_or(cell);
    let letters_end = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    let (letters, rest) = rest.split_at(letters_end);
    if letters.is_empty() {
        return None;
    }
    let digits = rest.strip_prefix('$').unwrap_or(rest);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let col = letters_to_column(letters)?;
    let row = atoi_simd::parse::<u32>(digits.as_bytes()).ok()?;
    (1..=MAX_ROW).contains(&row).then_some((row, col))
}

/// Convert column letters (`A`, `AB`, case-insensitive) into a 1-based index.
pub fn letters_to_column(letters: &str) -> Option<u32> {
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let mut col: u32 = 0;
    for ch in letters.bytes() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = u32::from(ch.to_ascii_uppercase() - b'A' + 1);
        col = col.checked_mul(26)?.checked_add(digit)?;
    }
    (col <= MAX_COL).then_some(col)
}

/// Convert a 1-based column index to letters (1 -> A, 27 -> AA).
pub fn column_to_letters(mut col: u32) -> String {
    let mut buf = [0u8; 4];
    let mut pos = buf.len();
    while col > 0 && pos > 0 {
        col -= 1;
        pos -= 1;
        buf[pos] = b'A' + (col % 26) as u8;
        col /= 26;
    }
    String::from_utf8_lossy(&buf[pos..]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letters() {
        assert_eq!(column_to_letters(1), "A");
        assert_eq!(column_to_letters(26), "Z");
        assert_eq!(column_to_letters(27), "AA");
        assert_eq!(column_to_letters(16_384), "XFD");
        assert_eq!(letters_to_column("xfd"), Some(16_384));
        assert_eq!(letters_to_column("XFE"), None);
        assert_eq!(letters_to_column("AAAA"), None);
    }

    #[test]
    fn test_parse_cell() {
        assert_eq!(CellRef::parse("B3").unwrap(), CellRef::new(3, 2));
        assert_eq!(CellRef::parse("$c$10").unwrap(), CellRef::new(10, 3));
        for bad in ["", "A", "1", "A0", "A1B", "1A", "A-1", "Sheet1!A1"] {
            assert!(matches!(CellRef::parse(bad), Err(Error::InvalidReference(_))), "{bad}");
        }
    }

    #[test]
    fn test_parse_range_normalizes() {
        let range = RangeRef::parse("C3:A1").unwrap();
        assert_eq!(range.start(), CellRef::new(1, 1));
        assert_eq!(range.end(), CellRef::new(3, 3));
        assert_eq!(range.to_string(), "A1:C3");
        assert_eq!(range.cell_count(), 9);

        let single = RangeRef::parse("D4").unwrap();
        assert!(single.is_single());
        assert_eq!(single.to_string(), "D4");

        assert!(RangeRef::parse("A1:B2:C3").is_err());
        assert!(RangeRef::parse("A1:").is_err());
    }

    #[test]
    fn test_intersects() {
        let a = RangeRef::parse("A1:B2").unwrap();
        assert!(a.intersects(&RangeRef::parse("B2:C3").unwrap()));
        assert!(a.intersects(&RangeRef::parse("A1").unwrap()));
        assert!(!a.intersects(&RangeRef::parse("C1:D2").unwrap()));
        assert!(!a.intersects(&RangeRef::parse("A3").unwrap()));
    }

    #[test]
    fn test_cells_row_major() {
        let cells: Vec<String> = RangeRef::parse("A1:B2")
            .unwrap()
            .cells()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(cells, ["A1", "B1", "A2", "B2"]);
    }
}
