//! Office Open XML packages.
//!
//! The three families share one container layer:
//!
//! 1. **OPC layer** (`opc`): ZIP container, parts, content types and
//!    relationships
//! 2. **Format packages**:
//!    - `docx`: Word documents
//!    - `xlsx`: Excel workbooks
//!    - `pptx`: PowerPoint presentations
//! 3. **`metadata`**: core and extended property parts
//!
//! Each format `Package` offers `open`, `new`, `save` and the tree
//! accessors the mutation engines need; anything not touched by an edit
//! is written back as it was read.
//!
//! # Example
//!
//! ```rust,no_run
//! use office_service::ooxml::docx::Package;
//!
//! let mut pkg = Package::new()?;
//! pkg.add_paragraph("Hello", None)?;
//! pkg.save("/tmp/hello.docx")?;
//! # Ok::<(), office_service::common::Error>(())
//! ```
pub mod docx;
pub mod metadata;
pub mod opc;
pub mod pptx;
pub mod xlsx;

pub use opc::{OpcPackage, PackURI};

use crate::common::error::{Error, Result};
use crate::common::xml::XmlElement;
use opc::constants::namespace;

/// Partname from an absolute part path such as `/xl/workbook.xml`.
pub(crate) fn uri(s: &str) -> Result<PackURI> {
    PackURI::new(s).map_err(Error::corrupt)
}

/// `local` in the namespace prefix of its parent, so new elements match
/// documents written with a differently prefixed main namespace.
pub(crate) fn qualified_name(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(p) => format!("{}:{}", p, local),
        None => local.to_string(),
    }
}

/// Prefix `root` binds to namespace `uri`. When none is bound, declares
/// `preferred` (or `preferred` plus a digit if that prefix is taken).
pub(crate) fn namespace_prefix(root: &mut XmlElement, uri: &str, preferred: &str) -> String {
    let declared = root.attrs.iter().find_map(|(k, v)| {
        k.strip_prefix("xmlns:")
            .filter(|_| v == uri)
            .map(str::to_string)
    });
    if let Some(prefix) = declared {
        return prefix;
    }
    let mut prefix = preferred.to_string();
    let mut n = 1;
    while root.attr(&format!("xmlns:{}", prefix)).is_some() {
        prefix = format!("{}{}", preferred, n);
        n += 1;
    }
    root.set_attr(&format!("xmlns:{}", prefix), uri);
    prefix
}

/// Prefix bound to the relationships namespace on `root`, declaring `r`
/// if none is.
pub(crate) fn relationship_prefix(root: &mut XmlElement) -> String {
    namespace_prefix(root, namespace::OFC_RELATIONSHIPS, "r")
}

/// Value of a relationship-id attribute (`r:id`, `r:embed`, ...) named
/// `local`, whatever prefix the relationships namespace is bound to.
pub(crate) fn relationship_attr<'a>(element: &'a XmlElement, local: &str) -> Option<&'a str> {
    element
        .attrs
        .iter()
        .find(|(k, _)| k.split_once(':').is_some_and(|(p, l)| l == local && p != "xmlns"))
        .map(|(_, v)| v.as_str())
}
