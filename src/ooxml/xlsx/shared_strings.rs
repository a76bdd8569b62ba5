//! Shared strings table (`xl/sharedStrings.xml`).
//!
//! Cells of type `s` store an index into this table. Reading resolves the
//! index to the concatenated text of the `si` item (plain `t` or rich text
//! runs, phonetic runs skipped); writing interns new strings at the end.

use crate::common::xml::XmlElement;
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct SharedStrings {
    /// The strings, in table order
    strings: Vec<String>,
    /// Reverse mapping from string to its first index
    string_to_index: HashMap<String, usize>,
}

impl SharedStrings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the table from a parsed `sst` root.
    pub fn from_root(sst: &XmlElement) -> Self {
        let mut table = Self::new();
        for si in sst.children_named("si") {
            let text = item_text(si);
            table.string_to_index.entry(text.clone()).or_insert(table.strings.len());
            table.strings.push(text);
        }
        table
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn index_of(&self, text: &str) -> Option<usize> {
        self.string_to_index.get(text).copied()
    }

    /// Record a new string and return its index. The caller appends the
    /// matching `si` element to the part.
    pub(crate) fn push(&mut self, text: &str) -> usize {
        let index = self.strings.len();
        self.strings.push(text.to_string());
        self.string_to_index.insert(text.to_string(), index);
        index
    }
}

/// Text of one `si` item.
fn item_text(si: &XmlElement) -> String {
    if let Some(t) = si.child("t") {
        return t.text();
    }
    let mut out = String::new();
    for run in si.children_named("r") {
        if let Some(t) = run.child("t") {
            out.push_str(&t.text());
        }
    }
    out
}

/// `si` element holding `text`.
pub(crate) fn item_element(text: &str) -> XmlElement {
    let mut t = XmlElement::new("t");
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        t.set_attr("xml:space", "preserve");
    }
    XmlElement::new("si").with_child(t.with_text(text))
}
