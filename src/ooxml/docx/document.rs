//! Block-level content of the document body.
//!
//! Paragraphs and tables are the direct `w:p` / `w:tbl` children of
//! `w:body`; paragraphs nested in tables, text boxes or content controls
//! are not counted. New blocks go before the body's final `w:sectPr`.

use crate::common::error::{Error, Result};
use crate::common::xml::{XmlElement, XmlNode};
use crate::ooxml::docx::package::Package;
use crate::ooxml::docx::paragraph::{self, RunFormat, new_paragraph};
use crate::ooxml::docx::styles::StyleKind;

/// Highest heading level with a built-in style.
pub const MAX_HEADING_LEVEL: u8 = 9;

impl Package {
    /// Body paragraphs in document order.
    pub fn paragraphs(&self) -> Result<Vec<&XmlElement>> {
        Ok(self.body()?.children_named("p").collect())
    }

    pub fn paragraph_count(&self) -> Result<usize> {
        Ok(self.body()?.children_named("p").count())
    }

    /// Text of every body paragraph.
    pub fn paragraph_texts(&self) -> Result<Vec<String>> {
        Ok(self
            .paragraphs()?
            .into_iter()
            .map(paragraph::paragraph_text)
            .collect())
    }

    /// Body tables in document order.
    pub fn tables(&self) -> Result<Vec<&XmlElement>> {
        Ok(self.body()?.children_named("tbl").collect())
    }

    pub fn paragraph_mut(&mut self, index: usize) -> Result<&mut XmlElement> {
        let body = self.body_mut()?;
        let count = body.children_named("p").count();
        body.children_named_mut("p")
            .nth(index)
            .ok_or(Error::OutOfRange {
                what: "paragraph",
                index: index as i64,
                count,
            })
    }

    /// Detach the paragraph at `index` from the body. Later paragraphs move
    /// up by one.
    pub fn remove_paragraph(&mut self, index: usize) -> Result<XmlElement> {
        let body = self.body_mut()?;
        let positions: Vec<usize> = body
            .children
            .iter()
            .enumerate()
            .filter(|(_, n)| matches!(n, XmlNode::Element(e) if e.is("p")))
            .map(|(i, _)| i)
            .collect();
        let Some(&child_index) = positions.get(index) else {
            return Err(Error::OutOfRange {
                what: "paragraph",
                index: index as i64,
                count: positions.len(),
            });
        };
        match body.children.remove(child_index) {
            XmlNode::Element(p) => Ok(p),
            XmlNode::Text(_) => Err(Error::corrupt("paragraph position points at text")),
        }
    }

    /// Run-scoped search and replace over every body paragraph. Returns the
    /// number of runs changed.
    pub fn replace_text(&mut self, search: &str, replacement: &str) -> Result<usize> {
        if search.is_empty() {
            return Err(Error::invalid("search text must not be empty"));
        }
        let prefixes = self.prefixes()?;
        let mut changed = 0;
        for p in self.body_mut()?.children_named_mut("p") {
            if !paragraph::paragraph_text(p).contains(search) {
                continue;
            }
            prefixes.canonicalize(p);
            changed += paragraph::replace_in_runs(p, search, replacement);
            prefixes.conform(p);
        }
        Ok(changed)
    }

    /// Apply `format` to every run of the paragraph at `index`. Returns the
    /// number of runs formatted.
    pub fn format_paragraph(&mut self, index: usize, format: &RunFormat) -> Result<usize> {
        let prefixes = self.prefixes()?;
        let paragraph = self.paragraph_mut(index)?;
        prefixes.canonicalize(paragraph);
        let mut formatted = 0;
        for run in paragraph.children_named_mut("r") {
            format.apply(run);
            formatted += 1;
        }
        prefixes.conform(paragraph);
        Ok(formatted)
    }

    /// Append a paragraph or table to the end of the body.
    ///
    /// `block` is written with the `w:` prefix and takes the document's.
    pub fn append_block(&mut self, mut block: XmlElement) -> Result<()> {
        self.prefixes()?.conform(&mut block);
        let body = self.body_mut()?;
        match body.position_of("sectPr") {
            Some(index) => body.insert(index, block),
            None => body.push(block),
        }
        Ok(())
    }

    /// Append a paragraph of `text`, styled with the paragraph style whose UI
    /// name is `style`.
    pub fn add_paragraph(&mut self, text: &str, style: Option<&str>) -> Result<()> {
        let style_id = match style {
            Some(name) => self.style_id(name, StyleKind::Paragraph)?,
            None => None,
        };
        self.append_block(new_paragraph(text, style_id.as_deref()))
    }

    /// Append a heading: level 0 uses "Title", levels 1-9 "Heading N".
    ///
    /// A document whose style sheet lacks the heading style still gets the
    /// conventional style id, which Word renders as Normal.
    pub fn add_heading(&mut self, text: &str, level: u8) -> Result<()> {
        if level > MAX_HEADING_LEVEL {
            return Err(Error::invalid(format!(
                "heading level must be 0-{}, got {}",
                MAX_HEADING_LEVEL, level
            )));
        }
        let (name, fallback_id) = match level {
            0 => ("Title".to_string(), "Title".to_string()),
            n => (format!("Heading {}", n), format!("Heading{}", n)),
        };
        let style_id = match self.style_id(&name, StyleKind::Paragraph) {
            Ok(id) => id,
            Err(Error::InvalidArgument(reason)) => {
                tracing::warn!(style = %name, %reason, "heading style missing, using conventional id");
                Some(fallback_id)
            },
            Err(e) => return Err(e),
        };
        self.append_block(new_paragraph(text, style_id.as_deref()))
    }

    /// Append a paragraph holding only a page break.
    pub fn add_page_break(&mut self) -> Result<()> {
        let run = XmlElement::new("w:r").with_child(XmlElement::new("w:br").with_attr("w:type", "page"));
        self.append_block(XmlElement::new("w:p").with_child(run))
    }
}
