//! Mutable XML element tree.
//!
//! Parts are parsed into this tree only when an operation needs to change
//! them. Names are kept as written (`w:p`, `a:t`); lookups go by local
//! name so documents written with unusual prefixes still resolve. Comments,
//! processing instructions and the doctype are not preserved.

use super::escape::{escape_attr, escape_text, resolve_reference, unescape_xml};
use crate::common::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::fmt::Write as _;

/// Standard declaration written at the top of every serialized part.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Node in the element tree.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// Element with its qualified name, attributes in document order and
/// mixed content.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

/// Return the part of a qualified name after the prefix.
#[inline]
pub fn local_part(name: &str) -> &str {
    match name.rfind(':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder form of [`set_attr`](Self::set_attr).
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    #[inline]
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// Prefix of the element name, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.name.rfind(':').map(|pos| &self.name[..pos])
    }

    #[inline]
    pub fn is(&self, local: &str) -> bool {
        self.local_name() == local
    }

    /// Attribute value by qualified name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute value by local name, ignoring the prefix.
    pub fn attr_local(&self, local: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| local_part(k) == local)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|(k, _)| k == name)?;
        Some(self.attrs.remove(pos).1)
    }

    /// Child elements, skipping text nodes.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// Child elements with the given local name.
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |e| e.is(local))
    }

    pub fn children_named_mut<'a>(
        &'a mut self,
        local: &'a str,
    ) -> impl Iterator<Item = &'a mut XmlElement> {
        self.elements_mut().filter(move |e| e.is(local))
    }

    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.is(local))
    }

    pub fn child_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.is(local))
    }

    /// Follow a chain of local names through first matching children.
    pub fn path(&self, locals: &[&str]) -> Option<&XmlElement> {
        let mut cur = self;
        for local in locals {
            cur = cur.child(local)?;
        }
        Some(cur)
    }

    pub fn path_mut(&mut self, locals: &[&str]) -> Option<&mut XmlElement> {
        let mut cur = self;
        for local in locals {
            cur = cur.child_mut(local)?;
        }
        Some(cur)
    }

    /// Index into `children` of the element with the given local name.
    pub fn position_of(&self, local: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|n| matches!(n, XmlNode::Element(e) if e.is(local)))
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    pub fn insert(&mut self, index: usize, child: XmlElement) {
        let index = index.min(self.children.len());
        self.children.insert(index, XmlNode::Element(child));
    }

    /// Insert `child` respecting a schema sequence given as local names.
    ///
    /// The child goes before the first existing sibling that must follow it.
    /// Returns the index into `children` where it was placed.
    pub fn insert_ordered(&mut self, child: XmlElement, order: &[&str]) -> usize {
        let rank = |local: &str| order.iter().position(|o| *o == local);
        let index = match rank(child.local_name()) {
            Some(own) => self
                .children
                .iter()
                .position(|n| match n {
                    XmlNode::Element(e) => rank(e.local_name()).is_some_and(|r| r > own),
                    XmlNode::Text(_) => false,
                })
                .unwrap_or(self.children.len()),
            None => self.children.len(),
        };
        self.children.insert(index, XmlNode::Element(child));
        index
    }

    /// Existing child with the given local name, or a new one inserted in
    /// schema order.
    pub fn get_or_insert_ordered(&mut self, name: &str, order: &[&str]) -> &mut XmlElement {
        let local = local_part(name);
        let index = match self.position_of(local) {
            Some(i) => i,
            None => self.insert_ordered(XmlElement::new(name), order),
        };
        match &mut self.children[index] {
            XmlNode::Element(e) => e,
            // position_of and insert_ordered only ever point at elements
            XmlNode::Text(_) => unreachable!("element index points at text"),
        }
    }

    /// Remove every child element with the given local name.
    pub fn remove_children(&mut self, local: &str) -> usize {
        let before = self.children.len();
        self.children
            .retain(|n| !matches!(n, XmlNode::Element(e) if e.is(local)));
        before - self.children.len()
    }

    /// Keep only the child elements for which `keep` returns true. Text
    /// nodes are left alone.
    pub fn retain_elements(&mut self, mut keep: impl FnMut(&XmlElement) -> bool) {
        self.children.retain(|n| match n {
            XmlNode::Element(e) => keep(e),
            XmlNode::Text(_) => true,
        });
    }

    /// Concatenated text content of this element and its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(t) => out.push_str(t),
                XmlNode::Element(e) => e.collect_text(out),
            }
        }
    }

    /// Replace all content with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children.clear();
        let text = text.into();
        if !text.is_empty() {
            self.children.push(XmlNode::Text(text));
        }
    }

    /// First descendant (excluding self) with the given local name, in
    /// document order.
    pub fn find(&self, local: &str) -> Option<&XmlElement> {
        for e in self.elements() {
            if e.is(local) {
                return Some(e);
            }
            if let Some(found) = e.find(local) {
                return Some(found);
            }
        }
        None
    }

    pub fn find_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        for e in self.elements_mut() {
            if e.is(local) {
                return Some(e);
            }
            if let Some(found) = e.find_mut(local) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants (excluding self) in document order.
    pub fn descendants(&self) -> Vec<&XmlElement> {
        let mut out = Vec::new();
        self.collect_descendants(&mut out);
        out
    }

    fn collect_descendants<'a>(&'a self, out: &mut Vec<&'a XmlElement>) {
        for e in self.elements() {
            out.push(e);
            e.collect_descendants(out);
        }
    }

    /// Visit self and every descendant element, pre-order.
    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut XmlElement)) {
        f(self);
        for e in self.elements_mut() {
            e.walk_mut(f);
        }
    }

    /// Move element and attribute names from prefix `from` to `to` across
    /// the subtree. Namespace declarations are left as they are.
    pub fn rename_prefix(&mut self, from: &str, to: &str) {
        if from == to {
            return;
        }
        let rename = |name: &mut String| {
            if let Some(local) = name.strip_prefix(from).and_then(|r| r.strip_prefix(':')) {
                *name = format!("{}:{}", to, local);
            }
        };
        self.walk_mut(&mut |e: &mut XmlElement| {
            rename(&mut e.name);
            for (k, _) in &mut e.attrs {
                rename(k);
            }
        });
    }

    /// Serialize this element (no declaration).
    pub fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (k, v) in &self.attrs {
            let _ = write!(out, " {}=\"{}\"", k, escape_attr(v));
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for node in &self.children {
            match node {
                XmlNode::Text(t) => out.push_str(&escape_text(t)),
                XmlNode::Element(e) => e.write_to(out),
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }

    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }
}

/// A parsed XML part.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    pub root: XmlElement,
}

impl XmlDocument {
    pub fn new(root: XmlElement) -> Self {
        Self { root }
    }

    /// Parse a complete document.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let root = parse_root(bytes)?;
        Ok(Self { root })
    }

    /// Serialize with the standard declaration.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::with_capacity(4096);
        out.push_str(XML_DECLARATION);
        out.push('\n');
        self.root.write_to(&mut out);
        out.into_bytes()
    }
}

/// Parse a markup fragment with a single root element.
///
/// Prefixes do not need to be declared; the fragment is grafted into a
/// document that already declares them.
pub fn parse_fragment(xml: &str) -> Result<XmlElement> {
    parse_root(xml.as_bytes())
}

fn decode_str(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| Error::corrupt(format!("invalid UTF-8 in XML: {}", e)))
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement> {
    let name = decode_str(start.name().as_ref())?.to_string();
    let mut element = XmlElement::new(name);
    for attr in start.attributes().with_checks(false) {
        let attr = attr.map_err(|e| Error::corrupt(format!("bad attribute: {}", e)))?;
        let key = decode_str(attr.key.as_ref())?.to_string();
        let value = unescape_xml(decode_str(&attr.value)?);
        element.attrs.push((key, value));
    }
    Ok(element)
}

fn push_text(stack: &mut [XmlElement], text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(top) = stack.last_mut() {
        match top.children.last_mut() {
            Some(XmlNode::Text(prev)) => prev.push_str(text),
            _ => top.children.push(XmlNode::Text(text.to_string())),
        }
    }
}

fn parse_root(bytes: &[u8]) -> Result<XmlElement> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                stack.push(element_from_start(&e)?);
            },
            Event::Empty(e) => {
                let element = element_from_start(&e)?;
                match stack.last_mut() {
                    Some(parent) => parent.push(element),
                    None => root = Some(element),
                }
            },
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| Error::corrupt("unbalanced end tag"))?;
                match stack.last_mut() {
                    Some(parent) => parent.push(element),
                    None => root = Some(element),
                }
            },
            Event::Text(t) => {
                let raw = decode_str(&t)?;
                push_text(&mut stack, &unescape_xml(raw));
            },
            Event::CData(c) => {
                let raw = decode_str(&c)?;
                push_text(&mut stack, raw);
            },
            Event::GeneralRef(r) => {
                let name = decode_str(&r)?;
                match resolve_reference(name) {
                    Some(ch) => {
                        let mut buf = [0u8; 4];
                        push_text(&mut stack, ch.encode_utf8(&mut buf));
                    },
                    None => {
                        return Err(Error::corrupt(format!("unknown entity &{};", name)));
                    },
                }
            },
            Event::Eof => break,
            // declaration, comments, processing instructions, doctype
            _ => {},
        }
    }

    if !stack.is_empty() {
        return Err(Error::corrupt("unexpected end of XML"));
    }
    root.ok_or_else(|| Error::corrupt("XML has no root element"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_prefix() {
        let mut e = parse_fragment(
            r#"<w:p><w:r><w:rPr><w:rStyle w:val="x"/></w:rPr></w:r><wx:t r:id="1" w="y"/></w:p>"#,
        )
        .unwrap();
        e.rename_prefix("w", "ns0");
        e.rename_prefix("r", "rel");
        assert_eq!(
            e.to_xml_string(),
            r#"<ns0:p><ns0:r><ns0:rPr><ns0:rStyle ns0:val="x"/></ns0:rPr></ns0:r><wx:t rel:id="1" w="y"/></ns0:p>"#
        );
    }

    #[test]
    fn test_parse_and_serialize() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="urn:w"><w:body><w:p><w:r><w:t xml:space="preserve"> a &amp; b </w:t></w:r></w:p></w:body></w:document>"#;
        let doc = XmlDocument::parse(xml).unwrap();
        assert_eq!(doc.root.local_name(), "document");
        let t = doc.root.find("t").unwrap();
        assert_eq!(t.text(), " a & b ");
        assert_eq!(t.attr("xml:space"), Some("preserve"));

        let out = String::from_utf8(doc.to_bytes()).unwrap();
        assert!(out.starts_with(XML_DECLARATION));
        assert!(out.contains("<w:t xml:space=\"preserve\"> a &amp; b </w:t>"));
    }

    #[test]
    fn test_character_references_merge_into_text() {
        let doc = XmlDocument::parse(b"<a>x&#65;&lt;y</a>").unwrap();
        assert_eq!(doc.root.children.len(), 1);
        assert_eq!(doc.root.text(), "xA<y");
    }

    #[test]
    fn test_insert_ordered() {
        let mut rpr = parse_fragment("<w:rPr><w:b/><w:color w:val=\"FF0000\"/></w:rPr>").unwrap();
        let order = ["rFonts", "b", "i", "u", "color", "sz"];
        rpr.insert_ordered(XmlElement::new("w:i"), &order);
        rpr.insert_ordered(XmlElement::new("w:rFonts"), &order);
        rpr.insert_ordered(XmlElement::new("w:sz"), &order);
        let names: Vec<_> = rpr.elements().map(|e| e.local_name().to_string()).collect();
        assert_eq!(names, ["rFonts", "b", "i", "color", "sz"]);
    }

    #[test]
    fn test_unbalanced_is_corrupt() {
        let err = XmlDocument::parse(b"<a><b></a>").unwrap_err();
        assert!(matches!(err, Error::CorruptContainer(_)));
        assert!(XmlDocument::parse(b"").is_err());
    }

    #[test]
    fn test_attribute_escaping_round_trip() {
        let el = XmlElement::new("x").with_attr("v", "a\"<b>&");
        let back = parse_fragment(&el.to_xml_string()).unwrap();
        assert_eq!(back.attr("v"), Some("a\"<b>&"));
    }
}
