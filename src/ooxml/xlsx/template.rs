//! Default parts of a new workbook.
//!
//! The XML lives under `resources/xlsx` and is embedded at compile time.

/// Workbook with an empty sheet list and full recalculation on load.
pub fn default_workbook_xml() -> &'static str {
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/xlsx/workbook.xml"))
}

/// Empty worksheet with default page margins.
pub fn default_worksheet_xml() -> &'static str {
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/xlsx/worksheet.xml"))
}

/// Calibri 11 default font, the two mandatory fills and one cell format.
pub fn default_styles_xml() -> &'static str {
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/xlsx/styles.xml"))
}

pub fn default_shared_strings_xml() -> &'static str {
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/xlsx/sharedStrings.xml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::xml::XmlDocument;

    #[test]
    fn test_templates_parse() {
        for xml in [
            default_workbook_xml(),
            default_worksheet_xml(),
            default_styles_xml(),
            default_shared_strings_xml(),
        ] {
            XmlDocument::parse(xml.as_bytes()).unwrap();
        }
    }
}
