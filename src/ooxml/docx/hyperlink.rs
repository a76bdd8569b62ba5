/// Hyperlink support for DOCX documents.
///
/// The element tree has no notion of hyperlinks, so the link is written as
/// raw markup: an external relationship from the document part to the URL,
/// and a `w:hyperlink` carrying that relationship id around a run in the
/// "Hyperlink" character style.
use crate::common::error::{Error, Result};
use crate::common::xml::{XmlElement, escape_attr, escape_text, parse_fragment};
use crate::ooxml::docx::package::Package;
use crate::ooxml::opc::constants::relationship_type as rt;
use std::fmt::Write as FmtWrite;

/// Markup of a hyperlink run pointing at relationship `r_id`, in the
/// canonical `w:`/`r:` prefixes.
pub fn hyperlink_fragment(r_id: &str, text: &str) -> Result<XmlElement> {
    let mut xml = String::with_capacity(160 + text.len());
    write!(xml, r#"<w:hyperlink r:id="{}">"#, escape_attr(r_id))
        .map_err(|e| Error::corrupt(e.to_string()))?;
    xml.push_str(r#"<w:r><w:rPr><w:rStyle w:val="Hyperlink"/></w:rPr>"#);
    let space = if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        r#" xml:space="preserve""#
    } else {
        ""
    };
    write!(xml, "<w:t{}>{}</w:t>", space, escape_text(text))
        .map_err(|e| Error::corrupt(e.to_string()))?;
    xml.push_str("</w:r></w:hyperlink>");
    parse_fragment(&xml)
}

impl Package {
    /// Append a paragraph holding a single hyperlink to `url`. Returns the
    /// relationship id; an existing relationship to the same URL is reused.
    pub fn add_hyperlink(&mut self, text: &str, url: &str) -> Result<String> {
        if url.trim().is_empty() {
            return Err(Error::invalid("hyperlink url must not be empty"));
        }
        let main = self.main_partname().clone();
        let r_id = self
            .opc_package_mut()
            .part_mut(&main)?
            .relate_to_ext(url, rt::HYPERLINK);

        let link = hyperlink_fragment(&r_id, text)?;
        self.append_block(XmlElement::new("w:p").with_child(link))?;
        tracing::debug!(%r_id, url, "hyperlink relationship added");
        Ok(r_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::docx::paragraph::paragraph_text;

    #[test]
    fn test_fragment_escapes_text() {
        let link = hyperlink_fragment("rId9", "R&D <team>").unwrap();
        assert_eq!(link.attr("r:id"), Some("rId9"));
        assert_eq!(link.text(), "R&D <team>");
        assert_eq!(
            link.path(&["r", "rPr", "rStyle"]).unwrap().attr("w:val"),
            Some("Hyperlink")
        );
    }

    #[test]
    fn test_add_hyperlink_creates_external_relationship() {
        let mut pkg = Package::new().unwrap();
        let r_id = pkg.add_hyperlink("Example", "https://example.com/?q=1&x=2").unwrap();

        let main = pkg.main_partname().clone();
        let rel = pkg
            .opc_package()
            .part(&main)
            .unwrap()
            .rels()
            .get(&r_id)
            .unwrap()
            .clone();
        assert!(rel.is_external());
        assert_eq!(rel.target_ref(), "https://example.com/?q=1&x=2");

        let paragraphs = pkg.paragraphs().unwrap();
        assert_eq!(paragraph_text(paragraphs[0]), "Example");

        // survives a save/load cycle
        let reopened = Package::from_bytes(pkg.to_bytes().unwrap()).unwrap();
        assert_eq!(reopened.paragraph_texts().unwrap(), ["Example"]);
    }

    #[test]
    fn test_empty_url_rejected() {
        let mut pkg = Package::new().unwrap();
        assert!(pkg.add_hyperlink("x", " ").is_err());
    }
}
