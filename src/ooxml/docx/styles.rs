//! Style lookup in `word/styles.xml`.
//!
//! Requests name styles the way the Word UI shows them ("Heading 1",
//! "Light Grid Accent 1"); a few built-ins are stored under a lower-case
//! internal name ("heading 1", "header").

use crate::common::error::{Error, Result};
use crate::common::xml::XmlElement;
use crate::ooxml::docx::package::Package;
use crate::ooxml::opc::constants::relationship_type as rt;

/// Kind of a style definition (`w:type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleKind {
    Paragraph,
    Character,
    Table,
}

impl StyleKind {
    fn as_str(self) -> &'static str {
        match self {
            StyleKind::Paragraph => "paragraph",
            StyleKind::Character => "character",
            StyleKind::Table => "table",
        }
    }
}

/// Internal name Word stores for a UI style name.
fn internal_name(ui_name: &str) -> String {
    match ui_name {
        "Caption" | "Footer" | "Header" => ui_name.to_ascii_lowercase(),
        _ => match ui_name.strip_prefix("Heading ") {
            Some(level) if level.len() == 1 && level.as_bytes()[0].is_ascii_digit() => {
                format!("heading {}", level)
            },
            _ => ui_name.to_string(),
        },
    }
}

fn style_kind(style: &XmlElement) -> &str {
    style.attr_local("type").unwrap_or("paragraph")
}

/// Resolved id of a style, or `None` for the default style of its kind
/// (which is applied by omitting the reference).
fn find_style_id(styles: &XmlElement, name: &str, kind: StyleKind) -> Result<Option<String>> {
    let wanted = internal_name(name);
    let by_name = styles.children_named("style").find(|s| {
        s.child("name")
            .and_then(|n| n.attr_local("val"))
            .is_some_and(|n| n == wanted)
    });
    let by_id = || {
        styles
            .children_named("style")
            .find(|s| s.attr_local("styleId") == Some(name))
    };
    let Some(style) = by_name.or_else(by_id) else {
        return Err(Error::invalid(format!("no style named '{}'", name)));
    };

    if style_kind(style) != kind.as_str() {
        return Err(Error::invalid(format!(
            "style '{}' is a {} style, not a {} style",
            name,
            style_kind(style),
            kind.as_str()
        )));
    }
    if style.attr_local("default") == Some("1") {
        return Ok(None);
    }
    Ok(style.attr_local("styleId").map(str::to_string))
}

impl Package {
    /// Id of the style with UI name `name` and the given kind.
    ///
    /// `Ok(None)` means the default style of that kind. A document without a
    /// styles part has no named styles.
    pub fn style_id(&self, name: &str, kind: StyleKind) -> Result<Option<String>> {
        let Some(styles_uri) = self.related_part(rt::STYLES) else {
            return Err(Error::invalid(format!(
                "no style named '{}' (document has no styles part)",
                name
            )));
        };
        let styles = self.opc_package().xml(&styles_uri)?;
        find_style_id(&styles.root, name, kind)
    }
}
