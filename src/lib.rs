//! office-service - create and edit Word, Excel and PowerPoint files
//!
//! Each request names a file and one mutation. The file is opened, the
//! mutation applied to its in-memory tree and the file written back, all
//! under a per-path lock. Nothing is kept between requests.
//!
//! # Layers
//!
//! - **`common`**: error taxonomy, XML element tree, units and colors
//! - **`ooxml`**: the container codec (OPC over ZIP) and the `.docx`,
//!   `.xlsx` and `.pptx` packages
//! - **`service`**: address resolution, the three mutation engines and the
//!   operation table
//! - **`server`**: HTTP/JSON transport and configuration
//!
//! # Example - Editing a workbook
//!
//! ```no_run
//! use office_service::service::{Service, excel, models::WriteExcelDataRequest};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let svc = Service::new();
//! let outcome = excel::write_data(
//!     &svc,
//!     WriteExcelDataRequest {
//!         file_path: "/tmp/report.xlsx".to_string(),
//!         sheet_name: "Totals".to_string(),
//!         headers: vec!["Region".to_string(), "Sales".to_string()],
//!         rows: vec![],
//!         hidden: false,
//!     },
//! )?;
//! println!("{}", outcome.message);
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Dispatching by name
//!
//! ```no_run
//! use office_service::service::{Service, dispatch};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let svc = Service::new();
//! let op = dispatch::lookup("word", "read").expect("known operation");
//! let outcome = op.run(&svc, json!({"file_path": "/tmp/notes.docx"}))?;
//! println!("{:?}", outcome.data);
//! # Ok(())
//! # }
//! ```

/// Shared building blocks: errors, XML tree, units, colors
pub mod common;

/// Office Open XML packages (.docx, .xlsx, .pptx)
pub mod ooxml;

/// Resolution, mutation engines and dispatch
pub mod service;

/// HTTP/JSON front end
pub mod server;

pub use common::{Error, Result};
