//! Per-file serialization of store operations.
//!
//! Every store opened on the same path shares one mutex from a process-wide
//! registry, so read-modify-write cycles on a file never interleave inside
//! one process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

type Registry = Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Registry key: the path made absolute against the working directory
fn lock_key(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Handle on the shared mutex of one file
#[derive(Debug, Clone)]
pub struct FileLock {
    inner: Arc<Mutex<()>>,
}

impl FileLock {
    pub fn for_path(path: &Path) -> Self {
        let mut locks = registry().lock().unwrap_or_else(|e| e.into_inner());
        let inner = locks.entry(lock_key(path)).or_default().clone();
        Self { inner }
    }

    /// Block until this file is free. A panic in another holder does not
    /// poison the file for later callers.
    pub fn acquire(&self) -> MutexGuard<'_, ()> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether two handles guard the same file
    pub fn same_file(&self, other: &FileLock) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_path_shares_lock() {
        let a = FileLock::for_path(Path::new("lock-test/shared.xlsx"));
        let b = FileLock::for_path(Path::new("lock-test/shared.xlsx"));
        let c = FileLock::for_path(Path::new("lock-test/other.xlsx"));

        assert!(a.same_file(&b));
        assert!(!a.same_file(&c));
    }

    #[test]
    fn test_relative_and_absolute_paths_share_lock() {
        let relative = Path::new("lock-test/abs.xlsx");
        let absolute = std::env::current_dir().unwrap().join(relative);

        let a = FileLock::for_path(relative);
        let b = FileLock::for_path(&absolute);
        assert!(a.same_file(&b));
    }

    #[test]
    fn test_acquire_releases_on_drop() {
        let lock = FileLock::for_path(Path::new("lock-test/drop.xlsx"));
        {
            let _guard = lock.acquire();
        }
        let _again = lock.acquire();
    }
}
