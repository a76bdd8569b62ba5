//! XML helpers shared by the format packages.

pub mod dom;
pub mod escape;

pub use dom::{XmlDocument, XmlElement, XmlNode, local_part, parse_fragment};
pub use escape::{escape_attr, escape_text, unescape_xml};
