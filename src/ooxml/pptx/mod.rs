//! PowerPoint (.pptx) presentations.
//!
//! [`Package`] owns the presentation part and its ordered slide list. Slide
//! content operations (placeholders, tables, autoshapes, notes) are further
//! `impl Package` blocks in `slide` and `notes`; `shapes` and `text` work on
//! single shape-tree elements.
//!
//! ```rust,no_run
//! use office_service::ooxml::pptx::Package;
//!
//! let mut pkg = Package::new()?;
//! let layout = pkg.default_layout()?;
//! let slide = pkg.add_slide(&layout)?;
//! pkg.set_title(&slide, "Quarterly review")?;
//! pkg.save("/tmp/review.pptx")?;
//! # Ok::<(), office_service::common::Error>(())
//! ```

pub mod notes;
pub mod package;
pub mod shapes;
pub mod slide;
pub mod template;
pub mod text;

pub use package::{Package, SlideRef};
pub use shapes::{Bounds, ShapeInfo};
