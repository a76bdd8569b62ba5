//! Word (.docx) documents.
//!
//! [`Package`] opens, creates and saves a document; the body, table, style,
//! hyperlink and header/footer operations are spread over the sibling
//! modules as `impl Package` blocks over the mutable element tree.

pub mod document;
pub mod header_footer;
pub mod hyperlink;
pub mod package;
pub mod paragraph;
pub mod styles;
pub mod table;
pub mod template;

pub use header_footer::HeaderFooterKind;
pub use package::Package;
pub use paragraph::RunFormat;
pub use styles::StyleKind;
