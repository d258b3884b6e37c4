//! Asset pipeline: declarative manifest, external loaders, readiness tracking.
//!
//! Assets are identified by content hash once loaded. World content reads
//! them by manifest name through [`AssetItems`], never by raw file path.
//!
//! # Invariants
//! - Manifest names are unique; duplicates are rejected before any load starts.
//! - `ready` fires exactly once, after every declared entry resolved.
//! - A failed load still resolves its entry, and reading it yields an [`AssetError`].

pub mod file;
pub mod handle;
pub mod loader;
pub mod manifest;
pub mod registry;

pub use file::{FileLoadError, FileLoader};
pub use handle::{AssetDetail, AssetHandle, AssetId};
pub use loader::{AssetLoader, LoadCompletion, LoadMessage, LoaderSet};
pub use manifest::{AssetKind, Manifest, ManifestEntry, ManifestError, SourcePath};
pub use registry::{
    AssetError, AssetItems, LoadPolicy, LoadProgress, PROGRESS, READY, ResourceRegistry,
};

pub fn crate_info() -> &'static str {
    "experience-assets v0.1.0"
}
