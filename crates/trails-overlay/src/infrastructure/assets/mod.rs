//! File-backed asset provider for marker images.
//!
//! Marker images are referenced by path in the settings file.  The registry
//! checks that the file exists and hands out a stable opaque
//! [`AssetHandle`] per canonical path; decoding the image is left to
//! whatever display surface eventually draws it, via [`AssetRegistry::path_of`].
//! Relative references are resolved against the registry's base directory
//! (normally the directory holding the settings file).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};
use trails_core::{AssetHandle, AssetProvider};

#[derive(Default)]
struct Entries {
    by_path: HashMap<PathBuf, AssetHandle>,
    paths: Vec<PathBuf>,
}

pub struct AssetRegistry {
    base_dir: PathBuf,
    entries: Mutex<Entries>,
}

impl AssetRegistry {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            entries: Mutex::new(Entries::default()),
        }
    }

    /// The file behind a handle previously returned by `resolve`.
    pub fn path_of(&self, handle: AssetHandle) -> Option<PathBuf> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        usize::try_from(handle.0)
            .ok()
            .and_then(|idx| entries.paths.get(idx).cloned())
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .paths
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn locate(&self, reference: &str) -> Option<PathBuf> {
        let raw = Path::new(reference);
        let path = if raw.is_absolute() {
            raw.to_path_buf()
        } else {
            self.base_dir.join(raw)
        };
        match path.canonicalize() {
            Ok(p) if p.is_file() => Some(p),
            Ok(p) => {
                warn!(path = %p.display(), "marker asset is not a file");
                None
            }
            Err(e) => {
                warn!(path = %path.display(), "marker asset not found: {e}");
                None
            }
        }
    }
}

impl AssetProvider for AssetRegistry {
    fn resolve(&self, reference: &str) -> Option<AssetHandle> {
        let path = self.locate(reference)?;
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = entries.by_path.get(&path) {
            return Some(*handle);
        }
        let handle = AssetHandle(entries.paths.len() as u64);
        debug!(path = %path.display(), handle = handle.0, "marker asset registered");
        entries.by_path.insert(path.clone(), handle);
        entries.paths.push(path);
        Some(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("trails-assets-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    #[test]
    fn test_resolve_existing_file_returns_stable_handle() {
        // Arrange
        let dir = scratch_dir("stable");
        std::fs::write(dir.join("press.png"), b"png").expect("write asset");
        let registry = AssetRegistry::new(&dir);

        // Act
        let first = registry.resolve("press.png");
        let again = registry.resolve(dir.join("press.png").to_str().expect("utf-8 path"));

        // Assert
        assert_eq!(first, Some(AssetHandle(0)));
        assert_eq!(again, first);
        assert_eq!(registry.len(), 1);
        assert!(registry.path_of(AssetHandle(0)).is_some());
    }

    #[test]
    fn test_distinct_files_get_distinct_handles() {
        let dir = scratch_dir("distinct");
        std::fs::write(dir.join("a.png"), b"a").expect("write");
        std::fs::write(dir.join("b.png"), b"b").expect("write");
        let registry = AssetRegistry::new(&dir);

        assert_ne!(registry.resolve("a.png"), registry.resolve("b.png"));
    }

    #[test]
    fn test_missing_file_does_not_resolve() {
        let registry = AssetRegistry::new(scratch_dir("missing"));
        assert_eq!(registry.resolve("nope.png"), None);
        assert!(registry.is_empty());
        assert_eq!(registry.path_of(AssetHandle(3)), None);
    }
}
