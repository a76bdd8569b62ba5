//! Excel (.xlsx) workbooks.
//!
//! [`Package`] owns the workbook part and the sheet list. Cell storage,
//! formatting records and reference rewriting live in the sibling modules
//! and work directly on the parsed parts.
//!
//! ```rust,no_run
//! use office_service::ooxml::xlsx::{CellRef, Package};
//!
//! let mut pkg = Package::open("book.xlsx")?;
//! let sheet = pkg.sheet("Data")?;
//! pkg.write_cells(&sheet, &[(CellRef::parse("B2")?, "=A2*2".to_string())])?;
//! pkg.save("book.xlsx")?;
//! # Ok::<(), office_service::common::Error>(())
//! ```

pub mod cell;
pub mod formula;
pub mod number_format;
pub mod package;
pub mod reference;
pub mod shared_strings;
pub mod styles;
pub mod template;
pub mod worksheet;

pub use cell::CellInput;
pub use formula::{Axis, Insertion};
pub use package::{Package, SheetInfo};
pub use reference::{CellRef, RangeRef};
pub use styles::CellFormat;

pub(crate) use super::qualified_name;
