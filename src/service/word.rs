//! Word operations.

use super::models::*;
use super::{Service, resolve};
use crate::common::error::{Error, Result};
use crate::ooxml::docx::table::table_text;
use crate::ooxml::docx::{HeaderFooterKind, Package, RunFormat};
use tracing::info;

/// Column and row count of a table built from `headers` and `rows`.
///
/// Columns follow the headers, else the first row, else 1.
pub fn table_shape(headers: &[String], rows: &[Vec<String>]) -> (usize, usize) {
    let cols = if headers.is_empty() {
        rows.first().map_or(1, Vec::len).max(1)
    } else {
        headers.len()
    };
    let header_rows = usize::from(!headers.is_empty());
    (header_rows + rows.len(), cols)
}

pub fn create(svc: &Service, req: CreateWordRequest) -> Result<Outcome> {
    svc.create(&req.file_path, |doc: &mut Package| {
        if let Some(title) = req.title.as_deref().filter(|t| !t.is_empty()) {
            doc.add_heading(title, 1)?;
        }
        for text in &req.paragraphs {
            doc.add_paragraph(text, None)?;
        }
        Ok(())
    })?;
    info!(path = %req.file_path, paragraphs = req.paragraphs.len(), "word document created");
    Ok(Outcome::message(format!("Created {}", req.file_path)))
}

/// Headings are appended first, then the plain paragraphs.
pub fn add_content(svc: &Service, req: AddWordContentRequest) -> Result<Outcome> {
    let headings = req.headings.as_deref().unwrap_or_default();
    svc.edit(&req.file_path, |doc: &mut Package| {
        for heading in headings {
            doc.add_heading(&heading.text, heading.level)?;
        }
        for text in &req.paragraphs {
            doc.add_paragraph(text, None)?;
        }
        Ok(())
    })?;
    info!(
        path = %req.file_path,
        headings = headings.len(),
        paragraphs = req.paragraphs.len(),
        "word content added"
    );
    Ok(Outcome::message(format!("Content added to {}", req.file_path)))
}

pub fn search_replace(svc: &Service, req: SearchReplaceWordRequest) -> Result<Outcome> {
    let count = svc.edit(&req.file_path, |doc: &mut Package| {
        doc.replace_text(&req.search, &req.replace)
    })?;
    info!(path = %req.file_path, count, "word search and replace");
    Ok(Outcome::message(format!("Replaced {} occurrence(s)", count)))
}

pub fn read(svc: &Service, req: FileRequest) -> Result<Outcome> {
    let content = svc.read(&req.file_path, |doc: &Package| {
        Ok(WordContent {
            paragraphs: doc.paragraph_texts()?,
            tables: doc.tables()?.into_iter().map(table_text).collect(),
        })
    })?;
    Outcome::serialized("OK", &content)
}

pub fn add_table(svc: &Service, req: AddWordTableRequest) -> Result<Outcome> {
    let (rows, cols) = table_shape(&req.headers, &req.rows);
    if rows == 0 {
        return Err(Error::invalid("a table needs headers or at least one row"));
    }
    let mut cells = Vec::with_capacity(rows);
    if !req.headers.is_empty() {
        cells.push(req.headers.clone());
    }
    cells.extend(req.rows.iter().cloned());

    svc.edit(&req.file_path, |doc: &mut Package| {
        doc.add_table(rows, cols, &cells, req.style.as_deref())
    })?;
    info!(path = %req.file_path, rows, cols, "word table added");
    Ok(Outcome::message(format!("Table added ({}x{})", rows, cols)))
}

pub fn format_text(svc: &Service, req: FormatWordTextRequest) -> Result<Outcome> {
    let format = RunFormat {
        bold: req.bold,
        italic: req.italic,
        underline: req.underline,
        hidden: req.hidden,
        color: req.color.clone(),
        size_pt: req.font_size,
        font_name: req.font_name.clone(),
    }
    .validated()?;

    let runs = svc.edit(&req.file_path, |doc: &mut Package| {
        let index = resolve::paragraph(doc, req.paragraph_index)?;
        doc.format_paragraph(index, &format)
    })?;
    info!(path = %req.file_path, paragraph = req.paragraph_index, runs, "word paragraph formatted");
    Ok(Outcome::message(format!("Formatted paragraph {}", req.paragraph_index)))
}

pub fn add_hyperlink(svc: &Service, req: AddWordHyperlinkRequest) -> Result<Outcome> {
    let r_id = svc.edit(&req.file_path, |doc: &mut Package| doc.add_hyperlink(&req.text, &req.url))?;
    info!(path = %req.file_path, url = %req.url, %r_id, "word hyperlink added");
    Ok(Outcome::message(format!("Hyperlink added: {}", req.text)))
}

pub fn delete_paragraph(svc: &Service, req: DeleteWordParagraphRequest) -> Result<Outcome> {
    svc.edit(&req.file_path, |doc: &mut Package| {
        let index = resolve::paragraph(doc, req.paragraph_index)?;
        doc.remove_paragraph(index).map(drop)
    })?;
    info!(path = %req.file_path, paragraph = req.paragraph_index, "word paragraph deleted");
    Ok(Outcome::message(format!("Deleted paragraph {}", req.paragraph_index)))
}

pub fn add_page_break(svc: &Service, req: FileRequest) -> Result<Outcome> {
    svc.edit(&req.file_path, |doc: &mut Package| doc.add_page_break())?;
    info!(path = %req.file_path, "word page break added");
    Ok(Outcome::message("Page break added"))
}

pub fn header_footer(svc: &Service, req: WordHeaderFooterRequest) -> Result<Outcome> {
    svc.edit(&req.file_path, |doc: &mut Package| {
        if let Some(text) = &req.header_text {
            doc.set_header_footer_text(HeaderFooterKind::Header, text)?;
        }
        if let Some(text) = &req.footer_text {
            doc.set_header_footer_text(HeaderFooterKind::Footer, text)?;
        }
        Ok(())
    })?;
    info!(
        path = %req.file_path,
        header = req.header_text.is_some(),
        footer = req.footer_text.is_some(),
        "word header/footer updated"
    );
    Ok(Outcome::message("Header/footer updated"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn fixture(dir: &TempDir, paragraphs: &[&str]) -> (Service, String) {
        let svc = Service::new();
        let path = dir.path().join("nested/doc.docx").to_string_lossy().into_owned();
        create(
            &svc,
            CreateWordRequest {
                file_path: path.clone(),
                title: None,
                paragraphs: strings(paragraphs),
            },
        )
        .unwrap();
        (svc, path)
    }

    fn read_content(svc: &Service, path: &str) -> WordContent {
        let outcome = read(svc, FileRequest { file_path: path.to_string() }).unwrap();
        assert_eq!(outcome.message, "OK");
        let data = outcome.data.unwrap();
        WordContent {
            paragraphs: serde_json::from_value(data["paragraphs"].clone()).unwrap(),
            tables: serde_json::from_value(data["tables"].clone()).unwrap(),
        }
    }

    #[test]
    fn test_table_shape() {
        let rows = vec![strings(&["1", "2", "3"])];
        assert_eq!(table_shape(&strings(&["A", "B"]), &rows), (2, 2));
        assert_eq!(table_shape(&[], &rows), (1, 3));
        assert_eq!(table_shape(&[], &[]), (0, 1));
        assert_eq!(table_shape(&[], &[vec![]]), (1, 1));
    }

    #[test]
    fn test_create_with_title() {
        let dir = TempDir::new().unwrap();
        let svc = Service::new();
        let path = dir.path().join("t.docx").to_string_lossy().into_owned();
        let outcome = create(
            &svc,
            CreateWordRequest {
                file_path: path.clone(),
                title: Some("Report".to_string()),
                paragraphs: strings(&["body"]),
            },
        )
        .unwrap();
        assert_eq!(outcome.message, format!("Created {}", path));
        assert_eq!(read_content(&svc, &path).paragraphs, ["Report", "body"]);
    }

    #[test]
    fn test_add_content_puts_headings_first() {
        let dir = TempDir::new().unwrap();
        let (svc, path) = fixture(&dir, &["intro"]);
        add_content(
            &svc,
            AddWordContentRequest {
                file_path: path.clone(),
                paragraphs: strings(&["p1", "p2"]),
                headings: Some(vec![Heading {
                    text: "H".to_string(),
                    level: 2,
                }]),
            },
        )
        .unwrap();
        assert_eq!(read_content(&svc, &path).paragraphs, ["intro", "H", "p1", "p2"]);
    }

    #[test]
    fn test_add_table_and_read_back() {
        let dir = TempDir::new().unwrap();
        let (svc, path) = fixture(&dir, &[]);
        let outcome = add_table(
            &svc,
            AddWordTableRequest {
                file_path: path.clone(),
                headers: strings(&["A", "B"]),
                rows: vec![strings(&["1", "2"]), strings(&["3", "4", "dropped"])],
                style: None,
            },
        )
        .unwrap();
        assert_eq!(outcome.message, "Table added (3x2)");
        assert_eq!(
            read_content(&svc, &path).tables,
            [vec![strings(&["A", "B"]), strings(&["1", "2"]), strings(&["3", "4"])]]
        );
    }

    #[test]
    fn test_format_out_of_range_keeps_file() {
        let dir = TempDir::new().unwrap();
        let (svc, path) = fixture(&dir, &["only"]);
        let before = std::fs::read(&path).unwrap();
        let err = format_text(
            &svc,
            FormatWordTextRequest {
                file_path: path.clone(),
                paragraph_index: 1,
                bold: Some(true),
                italic: None,
                underline: None,
                color: None,
                font_size: None,
                font_name: None,
                hidden: None,
            },
        )
        .unwrap_err();
        assert_eq!(err.code(), "OUT_OF_RANGE");
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_bad_color_rejected_before_open() {
        let dir = TempDir::new().unwrap();
        let svc = Service::new();
        let path = dir.path().join("missing.docx").to_string_lossy().into_owned();
        let err = format_text(
            &svc,
            FormatWordTextRequest {
                file_path: path,
                paragraph_index: 0,
                bold: None,
                italic: None,
                underline: None,
                color: Some("blue".to_string()),
                font_size: None,
                font_name: None,
                hidden: None,
            },
        )
        .unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
    }

    #[test]
    fn test_search_replace_and_delete() {
        let dir = TempDir::new().unwrap();
        let (svc, path) = fixture(&dir, &["foo bar", "keep", "foo"]);
        let outcome = search_replace(
            &svc,
            SearchReplaceWordRequest {
                file_path: path.clone(),
                search: "foo".to_string(),
                replace: "baz".to_string(),
            },
        )
        .unwrap();
        assert_eq!(outcome.message, "Replaced 2 occurrence(s)");

        delete_paragraph(
            &svc,
            DeleteWordParagraphRequest {
                file_path: path.clone(),
                paragraph_index: 1,
            },
        )
        .unwrap();
        assert_eq!(read_content(&svc, &path).paragraphs, ["baz bar", "baz"]);

        let err = delete_paragraph(
            &svc,
            DeleteWordParagraphRequest {
                file_path: path,
                paragraph_index: -1,
            },
        )
        .unwrap_err();
        assert_eq!(err.code(), "OUT_OF_RANGE");
    }

    #[test]
    fn test_hyperlink_break_and_header() {
        let dir = TempDir::new().unwrap();
        let (svc, path) = fixture(&dir, &[]);
        let outcome = add_hyperlink(
            &svc,
            AddWordHyperlinkRequest {
                file_path: path.clone(),
                text: "site".to_string(),
                url: "https://example.com".to_string(),
            },
        )
        .unwrap();
        assert_eq!(outcome.message, "Hyperlink added: site");
        add_page_break(&svc, FileRequest { file_path: path.clone() }).unwrap();
        header_footer(
            &svc,
            WordHeaderFooterRequest {
                file_path: path.clone(),
                header_text: Some("Top".to_string()),
                footer_text: None,
            },
        )
        .unwrap();

        let mut doc = Package::open(&path).unwrap();
        assert_eq!(doc.paragraph_texts().unwrap(), ["site", ""]);
        assert_eq!(
            doc.header_footer_text(HeaderFooterKind::Header).unwrap().as_deref(),
            Some("Top")
        );
        assert_eq!(doc.header_footer_text(HeaderFooterKind::Footer).unwrap(), None);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let svc = Service::new();
        let path = dir.path().join("nope.docx").to_string_lossy().into_owned();
        let err = read(&svc, FileRequest { file_path: path }).unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }
}
