//! Opaque handles to marker artwork.
//!
//! Marker images are loaded by an external asset layer before the session
//! starts.  The core only ever sees the [`AssetHandle`] returned by an
//! [`AssetProvider`]; it never touches file paths or pixel data, and it
//! compares handles by identity when composing frames.

use serde::Serialize;

/// Identity of a resolved, drawable asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AssetHandle(pub u64);

/// Resolves configured asset references (e.g. `"cursor/press.png"`) to handles.
///
/// Returns `None` when the reference cannot be resolved; configuration
/// loading turns that into a [`ConfigError::UnresolvedAsset`](crate::config::ConfigError).
pub trait AssetProvider: Send + Sync {
    fn resolve(&self, reference: &str) -> Option<AssetHandle>;
}
