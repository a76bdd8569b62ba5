//! Request handling: resolve, mutate, persist.
//!
//! A request opens its file, applies exactly one operation and saves it
//! back, all while holding the file's [`PathLocks`] entry. Nothing is kept
//! between requests. When the operation fails the document is dropped
//! unsaved, so the file on disk is untouched.

pub mod dispatch;
pub mod excel;
pub mod lock;
pub mod models;
pub mod powerpoint;
pub mod resolve;
pub mod word;

pub use dispatch::{Family, Operation};
pub use lock::{PathGuard, PathLocks};
pub use models::Outcome;

use crate::common::error::Result;
use crate::ooxml::{OpcPackage, docx, metadata, pptx, xlsx};
use std::path::Path;
use tracing::debug;

/// Open, create and save for one document format.
pub trait Document: Sized {
    /// Short format name used in log events.
    const KIND: &'static str;

    fn blank() -> Result<Self>;

    fn load(path: &Path) -> Result<Self>;

    fn persist(&mut self, path: &Path) -> Result<()>;

    fn opc_mut(&mut self) -> &mut OpcPackage;
}

impl Document for docx::Package {
    const KIND: &'static str = "word";

    fn blank() -> Result<Self> {
        docx::Package::new()
    }

    fn load(path: &Path) -> Result<Self> {
        docx::Package::open(path)
    }

    fn persist(&mut self, path: &Path) -> Result<()> {
        self.save(path)
    }

    fn opc_mut(&mut self) -> &mut OpcPackage {
        self.opc_package_mut()
    }
}

impl Document for xlsx::Package {
    const KIND: &'static str = "excel";

    fn blank() -> Result<Self> {
        xlsx::Package::new()
    }

    fn load(path: &Path) -> Result<Self> {
        xlsx::Package::open(path)
    }

    fn persist(&mut self, path: &Path) -> Result<()> {
        self.save(path)
    }

    fn opc_mut(&mut self) -> &mut OpcPackage {
        self.opc_package_mut()
    }
}

impl Document for pptx::Package {
    const KIND: &'static str = "pptx";

    fn blank() -> Result<Self> {
        pptx::Package::new()
    }

    fn load(path: &Path) -> Result<Self> {
        pptx::Package::open(path)
    }

    fn persist(&mut self, path: &Path) -> Result<()> {
        self.save(path)
    }

    fn opc_mut(&mut self) -> &mut OpcPackage {
        self.opc_package_mut()
    }
}

/// Shared state of the request handlers.
#[derive(Clone, Default)]
pub struct Service {
    locks: PathLocks,
}

impl Service {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn locks(&self) -> &PathLocks {
        &self.locks
    }

    /// Build a new document with `build` and write it to `path`, replacing
    /// any existing file.
    pub fn create<D: Document>(
        &self,
        path: &str,
        build: impl FnOnce(&mut D) -> Result<()>,
    ) -> Result<()> {
        let guard = self.locks.acquire(path)?;
        let mut doc = D::blank()?;
        build(&mut doc)?;
        doc.persist(guard.path())?;
        debug!(kind = D::KIND, path, "created");
        Ok(())
    }

    /// Load `path`, apply `mutate` and save. A failing `mutate` leaves the
    /// file as it was.
    pub fn edit<D: Document, T>(
        &self,
        path: &str,
        mutate: impl FnOnce(&mut D) -> Result<T>,
    ) -> Result<T> {
        let guard = self.locks.acquire(path)?;
        let mut doc = D::load(guard.path())?;
        let value = mutate(&mut doc)?;
        metadata::touch_modified(doc.opc_mut(), chrono::Utc::now())?;
        doc.persist(guard.path())?;
        debug!(kind = D::KIND, path, "saved");
        Ok(value)
    }

    /// Load `path` and inspect it without saving.
    pub fn read<D: Document, T>(&self, path: &str, view: impl FnOnce(&D) -> Result<T>) -> Result<T> {
        let guard = self.locks.acquire(path)?;
        let doc = D::load(guard.path())?;
        view(&doc)
    }
}
