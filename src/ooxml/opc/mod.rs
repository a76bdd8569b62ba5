/// Open Packaging Conventions (OPC) implementation.
///
/// The container layer shared by the three document families:
///
/// - Package structure (parts, relationships)
/// - Content type management
/// - ZIP-based physical packaging
/// - Reachability-based saving: a part whose last relationship is released
///   is not written back

pub mod constants;
pub mod error;
pub mod package;
pub mod packuri;
pub mod part;
pub mod phys_pkg;
pub mod pkgreader;
pub mod pkgwriter;
pub mod rel;

// Re-export commonly used types
pub use package::OpcPackage;
pub use packuri::PackURI;
pub use part::{BlobPart, Part, XmlPart};
pub use rel::{Relationship, Relationships};
