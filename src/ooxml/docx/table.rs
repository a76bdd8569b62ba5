//! Word tables.

use crate::common::error::Result;
use crate::common::xml::XmlElement;
use crate::ooxml::docx::package::Package;
use crate::ooxml::docx::paragraph::{new_paragraph, paragraph_text};
use crate::ooxml::docx::styles::StyleKind;

/// Text width of a US Letter page with 1.25" side margins, in twips.
const DEFAULT_BLOCK_WIDTH: i64 = 8640;

/// Child sequence of `w:tblPr`.
const TBLPR_ORDER: &[&str] = &[
    "tblStyle", "tblpPr", "tblOverlap", "bidiVisual", "tblStyleRowBandSize",
    "tblStyleColBandSize", "tblW", "jc", "tblCellSpacing", "tblInd", "tblBorders", "shd",
    "tblLayout", "tblCellMar", "tblLook", "tblCaption", "tblDescription", "tblPrChange",
];

/// An empty `rows` x `cols` grid with equal column widths summing to
/// `width` twips. Every cell holds one empty paragraph.
pub fn new_table(rows: usize, cols: usize, width: i64) -> XmlElement {
    let cols = cols.max(1);
    let col_width = (width / cols as i64).to_string();

    let tbl_pr = XmlElement::new("w:tblPr")
        .with_child(
            XmlElement::new("w:tblW")
                .with_attr("w:type", "auto")
                .with_attr("w:w", "0"),
        )
        .with_child(
            XmlElement::new("w:tblLook")
                .with_attr("w:firstColumn", "1")
                .with_attr("w:firstRow", "1")
                .with_attr("w:lastColumn", "0")
                .with_attr("w:lastRow", "0")
                .with_attr("w:noHBand", "0")
                .with_attr("w:noVBand", "1")
                .with_attr("w:val", "04A0"),
        );

    let mut grid = XmlElement::new("w:tblGrid");
    for _ in 0..cols {
        grid.push(XmlElement::new("w:gridCol").with_attr("w:w", col_width.as_str()));
    }

    let mut tbl = XmlElement::new("w:tbl").with_child(tbl_pr).with_child(grid);
    for _ in 0..rows {
        let mut tr = XmlElement::new("w:tr");
        for _ in 0..cols {
            let tc_pr = XmlElement::new("w:tcPr").with_child(
                XmlElement::new("w:tcW")
                    .with_attr("w:type", "dxa")
                    .with_attr("w:w", col_width.as_str()),
            );
            tr.push(
                XmlElement::new("w:tc")
                    .with_child(tc_pr)
                    .with_child(XmlElement::new("w:p")),
            );
        }
        tbl.push(tr);
    }
    tbl
}

/// Replace the content of cell (`row`, `col`) with a single paragraph.
/// Cells outside the grid are ignored.
pub fn set_cell_text(tbl: &mut XmlElement, row: usize, col: usize, text: &str) {
    let Some(tc) = tbl
        .children_named_mut("tr")
        .nth(row)
        .and_then(|tr| tr.children_named_mut("tc").nth(col))
    else {
        return;
    };
    tc.retain_elements(|e| e.is("tcPr"));
    tc.push(new_paragraph(text, None));
}

fn set_table_style(tbl: &mut XmlElement, style_id: &str) {
    if let Some(tbl_pr) = tbl.child_mut("tblPr") {
        tbl_pr
            .get_or_insert_ordered("w:tblStyle", TBLPR_ORDER)
            .set_attr("w:val", style_id);
    }
}

fn cell_text(tc: &XmlElement) -> String {
    tc.children_named("p")
        .map(paragraph_text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text of a table, row-major.
///
/// A cell spanning several grid columns is repeated once per column and a
/// vertically merged continuation cell repeats the cell above, so every
/// row has one entry per grid column.
pub fn table_text(tbl: &XmlElement) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    for tr in tbl.children_named("tr") {
        let mut row: Vec<String> = Vec::new();
        for tc in tr.children_named("tc") {
            let tc_pr = tc.child("tcPr");
            let span = tc_pr
                .and_then(|p| p.child("gridSpan"))
                .and_then(|s| s.attr_local("val"))
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(1)
                .max(1);
            let continues = tc_pr
                .and_then(|p| p.child("vMerge"))
                .is_some_and(|v| matches!(v.attr_local("val"), None | Some("continue")));

            for _ in 0..span {
                let col = row.len();
                let text = match (continues, rows.last()) {
                    (true, Some(above)) => above.get(col).cloned().unwrap_or_default(),
                    _ => cell_text(tc),
                };
                row.push(text);
            }
        }
        rows.push(row);
    }
    rows
}

impl Package {
    /// Width available to block content in the last section, in twips.
    fn block_width(&self) -> Result<i64> {
        let body = self.body()?;
        let Some(sect_pr) = body.child("sectPr") else {
            return Ok(DEFAULT_BLOCK_WIDTH);
        };
        let twips = |el: Option<&XmlElement>, attr: &str| {
            el.and_then(|e| e.attr_local(attr))
                .and_then(|v| v.parse::<i64>().ok())
        };
        let page = sect_pr.child("pgSz");
        let margins = sect_pr.child("pgMar");
        Ok(
            match (twips(page, "w"), twips(margins, "left"), twips(margins, "right")) {
                (Some(w), Some(l), Some(r)) if w > l + r => w - l - r,
                _ => DEFAULT_BLOCK_WIDTH,
            },
        )
    }

    /// Append a table of `rows` x `cols` cells filled from `cells`
    /// (row-major; missing values stay empty, extra values are dropped).
    ///
    /// `style` is the UI name of a table style.
    pub fn add_table(
        &mut self,
        rows: usize,
        cols: usize,
        cells: &[Vec<String>],
        style: Option<&str>,
    ) -> Result<()> {
        let style_id = match style {
            Some(name) => self.style_id(name, StyleKind::Table)?,
            None => None,
        };

        let mut tbl = new_table(rows, cols, self.block_width()?);
        if let Some(style_id) = &style_id {
            set_table_style(&mut tbl, style_id);
        }
        for (r, values) in cells.iter().enumerate().take(rows) {
            for (c, value) in values.iter().enumerate().take(cols) {
                set_cell_text(&mut tbl, r, c, value);
            }
        }
        self.append_block(tbl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::xml::parse_fragment;

    #[test]
    fn test_new_table_grid() {
        let tbl = new_table(2, 3, 9000);
        let widths: Vec<&str> = tbl
            .child("tblGrid")
            .unwrap()
            .elements()
            .filter_map(|c| c.attr("w:w"))
            .collect();
        assert_eq!(widths, ["3000", "3000", "3000"]);
        assert_eq!(table_text(&tbl), vec![vec![String::new(); 3]; 2]);
    }

    #[test]
    fn test_add_table_with_style() {
        let mut pkg = Package::new().unwrap();
        let cells = vec![
            vec!["A".to_string(), "B".to_string()],
            vec!["1".to_string(), "2".to_string(), "dropped".to_string()],
        ];
        pkg.add_table(2, 2, &cells, Some("Table Grid")).unwrap();

        let tables = pkg.tables().unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(table_text(tables[0]), vec![vec!["A", "B"], vec!["1", "2"]]);
        assert_eq!(
            tables[0].path(&["tblPr", "tblStyle"]).unwrap().attr("w:val"),
            Some("TableGrid")
        );
        // 12240 page - 2 * 1800 margins, split in two
        assert_eq!(
            tables[0].path(&["tblGrid", "gridCol"]).unwrap().attr("w:w"),
            Some("4320")
        );
    }

    #[test]
    fn test_unknown_table_style() {
        let mut pkg = Package::new().unwrap();
        let err = pkg.add_table(1, 1, &[], Some("No Such Style")).unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
        assert!(pkg.tables().unwrap().is_empty());
    }

    #[test]
    fn test_table_text_spans_and_merges() {
        let tbl = parse_fragment(
            r#"<w:tbl><w:tblGrid><w:gridCol/><w:gridCol/></w:tblGrid>
            <w:tr><w:tc><w:tcPr><w:gridSpan w:val="2"/></w:tcPr><w:p><w:r><w:t>wide</w:t></w:r></w:p></w:tc></w:tr>
            <w:tr><w:tc><w:tcPr><w:vMerge w:val="restart"/></w:tcPr><w:p><w:r><w:t>tall</w:t></w:r></w:p></w:tc><w:tc><w:p/><w:p><w:r><w:t>x</w:t></w:r></w:p></w:tc></w:tr>
            <w:tr><w:tc><w:tcPr><w:vMerge/></w:tcPr><w:p/></w:tc><w:tc><w:p><w:r><w:t>y</w:t></w:r></w:p></w:tc></w:tr>
            </w:tbl>"#,
        )
        .unwrap();
        assert_eq!(
            table_text(&tbl),
            vec![
                vec!["wide", "wide"],
                vec!["tall", "\nx"],
                vec!["tall", "y"],
            ]
        );
    }
}
