//! Default parts of a new Word document.
//!
//! The XML lives under `resources/docx` and is embedded at compile time.

/// Empty body with a single US Letter section (1" top and bottom margins,
/// 1.25" side margins).
pub fn default_document_xml() -> &'static str {
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/docx/document.xml"))
}

/// Latent-free style sheet: Normal, Title, Heading 1-9, Hyperlink, Header,
/// Footer and a handful of built-in table styles.
pub fn default_styles_xml() -> &'static str {
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/docx/styles.xml"))
}

pub fn default_settings_xml() -> &'static str {
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/docx/settings.xml"))
}

/// Header part with one empty paragraph in the "Header" style.
pub fn default_header_xml() -> &'static str {
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/docx/header.xml"))
}

/// Footer part with one empty paragraph in the "Footer" style.
pub fn default_footer_xml() -> &'static str {
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/docx/footer.xml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::xml::XmlDocument;

    #[test]
    fn test_templates_parse() {
        for xml in [
            default_document_xml(),
            default_styles_xml(),
            default_settings_xml(),
            default_header_xml(),
            default_footer_xml(),
        ] {
            XmlDocument::parse(xml.as_bytes()).unwrap();
        }
    }
}
