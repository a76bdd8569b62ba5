//! Per-path mutual exclusion.
//!
//! Every request that touches a file holds the file's lock from open to
//! save, so two mutations of the same path never interleave. Distinct
//! paths proceed in parallel. Paths are compared in absolute form, so
//! `a/b.docx` and `./a/b.docx` share one lock.

use crate::common::error::Result;
use parking_lot::{Condvar, Mutex};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Set of paths currently held by some request.
#[derive(Clone, Default)]
pub struct PathLocks {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    held: Mutex<HashSet<PathBuf>>,
    released: Condvar,
}

/// Holds one path until dropped.
#[must_use = "the path is released as soon as the guard is dropped"]
pub struct PathGuard {
    inner: Arc<Inner>,
    path: PathBuf,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `path` is free, then hold it.
    pub fn acquire<P: AsRef<Path>>(&self, path: P) -> Result<PathGuard> {
        let path = std::path::absolute(path.as_ref())?;
        let mut held = self.inner.held.lock();
        while held.contains(&path) {
            debug!(path = %path.display(), "waiting for path lock");
            self.inner.released.wait(&mut held);
        }
        held.insert(path.clone());
        Ok(PathGuard {
            inner: Arc::clone(&self.inner),
            path,
        })
    }

    /// Number of paths currently held.
    pub fn held(&self) -> usize {
        self.inner.held.lock().len()
    }
}

impl PathGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PathGuard {
    fn drop(&mut self) {
        self.inner.held.lock().remove(&self.path);
        self.inner.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_guard_releases_on_drop() {
        let locks = PathLocks::new();
        {
            let guard = locks.acquire("/tmp/a.docx").unwrap();
            assert!(guard.path().is_absolute());
            assert_eq!(locks.held(), 1);
        }
        assert_eq!(locks.held(), 0);
    }

    #[test]
    fn test_relative_and_absolute_share_lock() {
        let locks = PathLocks::new();
        let cwd = std::env::current_dir().unwrap();
        let _guard = locks.acquire("report.xlsx").unwrap();
        let held = locks.inner.held.lock();
        assert!(held.contains(&cwd.join("report.xlsx")));
    }

    #[test]
    fn test_same_path_is_serialized() {
        let locks = PathLocks::new();
        let inside = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let locks = locks.clone();
                let inside = Arc::clone(&inside);
                let peak = Arc::clone(&peak);
                thread::spawn(move || {
                    let _guard = locks.acquire("/tmp/shared.pptx").unwrap();
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(10));
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(locks.held(), 0);
    }

    #[test]
    fn test_distinct_paths_do_not_block() {
        let locks = PathLocks::new();
        let _a = locks.acquire("/tmp/one.docx").unwrap();
        let _b = locks.acquire("/tmp/two.docx").unwrap();
        assert_eq!(locks.held(), 2);
    }
}
