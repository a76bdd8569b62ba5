//! DrawingML text bodies (`p:txBody`, `a:txBody`).
//!
//! A body holds `a:bodyPr`, `a:lstStyle` and one or more `a:p`
//! paragraphs. Text is read as paragraphs joined by `\n`; writing replaces
//! every paragraph with one paragraph per line.

use crate::common::xml::XmlElement;

/// Plain text of one `a:p`: runs, fields and line breaks.
pub fn paragraph_text(p: &XmlElement) -> String {
    let mut out = String::new();
    for child in p.elements() {
        match child.local_name() {
            "r" | "fld" => {
                if let Some(t) = child.child("t") {
                    out.push_str(&t.text());
                }
            },
            "br" => out.push('\n'),
            _ => {},
        }
    }
    out
}

/// Plain text of a text body.
pub fn body_text(tx_body: &XmlElement) -> String {
    tx_body
        .children_named("p")
        .map(paragraph_text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// DrawingML prefix in use inside `tx_body`.
fn drawing_prefix(tx_body: &XmlElement) -> String {
    tx_body
        .child("bodyPr")
        .and_then(XmlElement::prefix)
        .unwrap_or("a")
        .to_string()
}

fn paragraph(prefix: &str, line: &str) -> XmlElement {
    let p = XmlElement::new(format!("{}:p", prefix));
    if line.is_empty() {
        return p;
    }
    p.with_child(
        XmlElement::new(format!("{}:r", prefix))
            .with_child(XmlElement::new(format!("{}:rPr", prefix)).with_attr("lang", "en-US"))
            .with_child(XmlElement::new(format!("{}:t", prefix)).with_text(line)),
    )
}

/// Replace the paragraphs of `tx_body` with one paragraph per line of
/// `text`. Body and list style properties are kept.
pub fn set_body_text(tx_body: &mut XmlElement, text: &str) {
    let prefix = drawing_prefix(tx_body);
    tx_body.remove_children("p");
    for line in text.split('\n') {
        tx_body.push(paragraph(&prefix, line.trim_end_matches('\r')));
    }
}

/// A new text body named `name` (`p:txBody` or `a:txBody`) holding `text`.
pub fn new_body(name: &str, text: &str) -> XmlElement {
    let mut body = XmlElement::new(name)
        .with_child(XmlElement::new("a:bodyPr"))
        .with_child(XmlElement::new("a:lstStyle"));
    set_body_text(&mut body, text);
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::xml::parse_fragment;

    const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

    #[test]
    fn test_body_text() {
        let body = parse_fragment(&format!(
            r#"<p:txBody {NS}><a:bodyPr/><a:p><a:r><a:t>Hello </a:t></a:r><a:r><a:t>world</a:t></a:r><a:br/><a:fld type="slidenum"><a:t>3</a:t></a:fld></a:p><a:p/><a:p><a:r><a:t>end</a:t></a:r></a:p></p:txBody>"#
        ))
        .unwrap();
        assert_eq!(body_text(&body), "Hello world\n3\n\nend");
    }

    #[test]
    fn test_set_body_text_keeps_properties() {
        let mut body = parse_fragment(&format!(
            r#"<p:txBody {NS}><a:bodyPr anchor="ctr"/><a:lstStyle/><a:p><a:r><a:t>old</a:t></a:r></a:p></p:txBody>"#
        ))
        .unwrap();
        set_body_text(&mut body, "one\n\ntwo");
        assert_eq!(body_text(&body), "one\n\ntwo");
        assert_eq!(body.child("bodyPr").unwrap().attr("anchor"), Some("ctr"));
        assert_eq!(body.children_named("p").count(), 3);
    }

    #[test]
    fn test_new_body() {
        let body = new_body("a:txBody", "");
        assert_eq!(body_text(&body), "");
        assert_eq!(
            body.to_xml_string(),
            "<a:txBody><a:bodyPr/><a:lstStyle/><a:p/></a:txBody>"
        );
    }
}
