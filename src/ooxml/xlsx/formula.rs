//! Reference rewriting inside formula text.
//!
//! Formulas are scanned, not parsed: string literals, structured and
//! external `[...]` references and error literals are copied through, and
//! every A1 reference (`B3`, `$A$1:C4`, `A:C`, `2:5`, optionally
//! sheet-qualified) is handed to a rewrite callback.

use super::reference::{MAX_COL, MAX_ROW, column_to_letters, letters_to_column};

/// The dimension rows or columns are inserted along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Row,
    Col,
}

/// `count` blank rows or columns inserted before `at` (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Insertion {
    pub axis: Axis,
    pub at: u32,
    pub count: u32,
}

impl Insertion {
    /// New position of a row or column index on this insertion's axis.
    /// `None` when it is pushed off the sheet.
    pub fn shift(&self, value: u32) -> Option<u32> {
        let shifted = if value >= self.at {
            value.checked_add(self.count)?
        } else {
            value
        };
        let limit = match self.axis {
            Axis::Row => MAX_ROW,
            Axis::Col => MAX_COL,
        };
        (shifted <= limit).then_some(shifted)
    }

    fn shift_coord(&self, coord: Coord) -> Option<Coord> {
        Some(match (coord, self.axis) {
            (Coord::Cell { row, col, row_abs, col_abs }, Axis::Row) => Coord::Cell {
                row: self.shift(row)?,
                col,
                row_abs,
                col_abs,
            },
            (Coord::Cell { row, col, row_abs, col_abs }, Axis::Col) => Coord::Cell {
                row,
                col: self.shift(col)?,
                row_abs,
                col_abs,
            },
            (Coord::Row { row, abs }, Axis::Row) => Coord::Row {
                row: self.shift(row)?,
                abs,
            },
            (Coord::Col { col, abs }, Axis::Col) => Coord::Col {
                col: self.shift(col)?,
                abs,
            },
            (other, _) => other,
        })
    }

    /// Shift the coordinates of a reference like `A1` or `$B$2:C9`.
    /// Returns `#REF!` when a corner is pushed off the sheet and `None`
    /// when `text` is not a reference.
    pub fn shift_reference(&self, text: &str) -> Option<String> {
        let (reference, end) = parse_reference(text.as_bytes(), 0)?;
        if end != text.len() {
            return None;
        }
        Some(self.rewrite(&reference))
    }

    /// Shift every reference of a space separated `sqref` list.
    pub fn shift_sqref(&self, sqref: &str) -> String {
        sqref
            .split_ascii_whitespace()
            .map(|part| self.shift_reference(part).unwrap_or_else(|| part.to_string()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn rewrite(&self, reference: &Reference) -> String {
        let start = self.shift_coord(reference.start);
        let end = match reference.end {
            Some(end) => self.shift_coord(end).map(Some),
            None => Some(None),
        };
        match (start, end) {
            (Some(start), Some(end)) => Reference { start, end }.to_string(),
            _ => "#REF!".to_string(),
        }
    }

    /// Rewrite the references of `formula` that point at `target`.
    ///
    /// `host` is the sheet holding the formula; unqualified references
    /// resolve to it. Defined names have no host.
    pub fn shift_formula(&self, formula: &str, target: &str, host: Option<&str>) -> String {
        rewrite_references(formula, |sheet, reference| {
            let points_at_target = match sheet {
                Some(sheet) => sheet_part_matches(sheet, target),
                None => host == Some(target),
            };
            points_at_target.then(|| self.rewrite(reference))
        })
    }
}

/// Point qualified references at `old_name` to `new_name` instead.
pub fn rename_sheet_references(formula: &str, old_name: &str, new_name: &str) -> String {
    rewrite_references(formula, |sheet, reference| {
        let sheet = sheet?;
        sheet_part_matches(sheet, old_name)
            .then(|| format!("{}{}", format_sheet_prefix_for_formula(new_name), reference))
    })
}

/// Whether a sheet prefix as written in a formula (`Data`, `'My Sheet'`)
/// names `name`.
pub fn sheet_part_matches(sheet_part: &str, name: &str) -> bool {
    let trimmed = sheet_part.trim();
    if let Some(stripped) = trimmed.strip_prefix('\'')
        && let Some(inner) = stripped.strip_suffix('\'')
    {
        return inner.replace("''", "'") == name;
    }
    trimmed == name
}

/// `Name!` or `'Quoted Name'!` as needed to reference a sheet.
pub fn format_sheet_prefix_for_formula(sheet_name: &str) -> String {
    if sheet_name_needs_quoting_for_formula(sheet_name) {
        let escaped = sheet_name.replace('\'', "''");
        format!("'{escaped}'!")
    } else {
        format!("{sheet_name}!")
    }
}

fn sheet_name_needs_quoting_for_formula(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    let bytes = name.as_bytes();
    if bytes[0].is_ascii_digit() {
        return true;
    }
    if bytes.iter().any(|b| !(b.is_ascii_alphanumeric() || *b == b'_' || *b >= 0x80)) {
        return true;
    }
    // Names that read as a cell reference or a literal must be quoted
    if parse_reference(bytes, 0).is_some_and(|(_, end)| end == bytes.len()) {
        return true;
    }
    let upper = name.to_uppercase();
    matches!(
        upper.as_str(),
        "TRUE" | "FALSE" | "NULL" | "REF" | "DIV" | "NAME" | "NUM" | "VALUE" | "N/A"
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Coord {
    Cell {
        row: u32,
        col: u32,
        row_abs: bool,
        col_abs: bool,
    },
    Col {
        col: u32,
        abs: bool,
    },
    Row {
        row: u32,
        abs: bool,
    },
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dollar = |abs: bool| if abs { "$" } else { "" };
        match *self {
            Coord::Cell {
                row,
                col,
                row_abs,
                col_abs,
            } => write!(
                f,
                "{}{}{}{}",
                dollar(col_abs),
                column_to_letters(col),
                dollar(row_abs),
                row
            ),
            Coord::Col { col, abs } => write!(f, "{}{}", dollar(abs), column_to_letters(col)),
            Coord::Row { row, abs } => write!(f, "{}{}", dollar(abs), row),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Reference {
    start: Coord,
    end: Option<Coord>,
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.end {
            Some(end) => write!(f, "{}:{}", self.start, end),
            None => write!(f, "{}", self.start),
        }
    }
}

#[inline]
fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'$' | b'\\') || b >= 0x80
}

fn parse_coord(bytes: &[u8], mut pos: usize) -> Option<(Coord, usize)> {
    let col_abs = bytes.get(pos) == Some(&b'$');
    if col_abs {
        pos += 1;
    }
    let letters_start = pos;
    while bytes.get(pos).is_some_and(u8::is_ascii_alphabetic) {
        pos += 1;
    }
    let letters = &bytes[letters_start..pos];

    let row_abs = bytes.get(pos) == Some(&b'$');
    let digits_start = if row_abs { pos + 1 } else { pos };
    let mut digits_end = digits_start;
    while bytes.get(digits_end).is_some_and(u8::is_ascii_digit) {
        digits_end += 1;
    }
    let digits = &bytes[digits_start..digits_end];

    let col = if letters.is_empty() {
        None
    } else {
        Some(letters_to_column(std::str::from_utf8(letters).ok()?)?)
    };
    let row = if digits.is_empty() {
        None
    } else {
        let row = atoi_simd::parse::<u32>(digits).ok()?;
        if !(1..=MAX_ROW).contains(&row) {
            return None;
        }
        Some(row)
    };

    match (col, row) {
        (Some(col), Some(row)) => Some((
            Coord::Cell {
                row,
                col,
                row_abs,
                col_abs,
            },
            digits_end,
        )),
        (Some(col), None) if !row_abs => Some((Coord::Col { col, abs: col_abs }, pos)),
        (None, Some(row)) => Some((
            Coord::Row {
                row,
                abs: row_abs || col_abs,
            },
            digits_end,
        )),
        _ => None,
    }
}

/// Parse a reference starting at `pos`. Single column or row coordinates
/// only count as part of a range (`A:C`, `2:5`).
fn parse_reference(bytes: &[u8], pos: usize) -> Option<(Reference, usize)> {
    let (start, mut end_pos) = parse_coord(bytes, pos)?;
    let mut end = None;
    if bytes.get(end_pos) == Some(&b':')
        && let Some((second, after)) = parse_coord(bytes, end_pos + 1)
    {
        let same_kind = matches!(
            (start, second),
            (Coord::Cell { .. }, Coord::Cell { .. })
                | (Coord::Col { .. }, Coord::Col { .. })
                | (Coord::Row { .. }, Coord::Row { .. })
        );
        if same_kind {
            end = Some(second);
            end_pos = after;
        }
    }
    if end.is_none() && !matches!(start, Coord::Cell { .. }) {
        return None;
    }
    // LOG10( is a function call, A1B is a name
    match bytes.get(end_pos) {
        Some(&b) if is_word_byte(b) || b == b'(' => None,
        _ => Some((Reference { start, end }, end_pos)),
    }
}

/// Copy `formula`, replacing each reference for which `rewrite` returns a
/// value. `rewrite` receives the sheet prefix as written (without `!`).
fn rewrite_references(
    formula: &str,
    mut rewrite: impl FnMut(Option<&str>, &Reference) -> Option<String>,
) -> String {
    let bytes = formula.as_bytes();
    let mut out = String::with_capacity(formula.len() + 8);
    let mut copied = 0usize;
    let mut pos = 0usize;

    while pos < bytes.len() {
        match bytes[pos] {
            b'"' => pos = skip_quoted(bytes, pos, b'"'),
            b'[' => pos = skip_brackets(bytes, pos),
            b'#' => {
                pos += 1;
                while pos < bytes.len()
                    && (bytes[pos].is_ascii_alphanumeric()
                        || matches!(bytes[pos], b'/' | b'!' | b'?'))
                {
                    pos += 1;
                }
            },
            b'\'' => {
                let end = skip_quoted(bytes, pos, b'\'');
                if bytes.get(end) == Some(&b'!') {
                    let sheet = &formula[pos..end];
                    pos = handle_reference(
                        formula,
                        pos,
                        end + 1,
                        Some(sheet),
                        &mut rewrite,
                        &mut out,
                        &mut copied,
                    );
                } else {
                    pos = end;
                }
            },
            b if is_word_byte(b) => {
                let mut word_end = pos;
                while word_end < bytes.len() && is_word_byte(bytes[word_end]) {
                    word_end += 1;
                }
                if bytes.get(word_end) == Some(&b'!') {
                    let sheet = &formula[pos..word_end];
                    pos = handle_reference(
                        formula,
                        pos,
                        word_end + 1,
                        Some(sheet),
                        &mut rewrite,
                        &mut out,
                        &mut copied,
                    );
                } else {
                    let next =
                        handle_reference(formula, pos, pos, None, &mut rewrite, &mut out, &mut copied);
                    pos = if next == pos { word_end } else { next };
                }
            },
            _ => pos += 1,
        }
    }
    out.push_str(&formula[copied..]);
    out
}

/// Try a reference at `ref_start`; on a rewrite, flush the text before
/// `token_start` and emit the replacement. Returns where scanning resumes,
/// `token_start` when there was no reference and nothing to skip.
fn handle_reference(
    formula: &str,
    token_start: usize,
    ref_start: usize,
    sheet: Option<&str>,
    rewrite: &mut impl FnMut(Option<&str>, &Reference) -> Option<String>,
    out: &mut String,
    copied: &mut usize,
) -> usize {
    let Some((reference, end)) = parse_reference(formula.as_bytes(), ref_start) else {
        return if sheet.is_some() { ref_start } else { token_start };
    };
    if let Some(replacement) = rewrite(sheet, &reference) {
        out.push_str(&formula[*copied..token_start]);
        match sheet {
            // A replacement for a qualified reference keeps the prefix
            // unless it brings its own.
            Some(prefix) if !replacement.contains('!') => {
                out.push_str(prefix);
                out.push('!');
                out.push_str(&replacement);
            },
            _ => out.push_str(&replacement),
        }
        *copied = end;
    }
    end
}

/// Position after a quoted run starting at `pos`; a doubled quote is an
/// escaped quote.
fn skip_quoted(bytes: &[u8], pos: usize, quote: u8) -> usize {
    let mut cursor = pos + 1;
    while let Some(offset) = memchr::memchr(quote, &bytes[cursor..]) {
        let at = cursor + offset;
        if bytes.get(at + 1) == Some(&quote) {
            cursor = at + 2;
            continue;
        }
        return at + 1;
    }
    bytes.len()
}

fn skip_brackets(bytes: &[u8], pos: usize) -> usize {
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(pos) {
        match b {
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            },
            _ => {},
        }
    }
    bytes.len()
}
