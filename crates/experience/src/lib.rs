//! The experience: one composition root per session.
//!
//! [`SceneRoot`] owns the host, clock, viewport, asset registry and the
//! [`Stage`] (scene, camera, renderer, debug panel, world), and connects them
//! through event hubs. [`ExperienceSlot`] guarantees a single live root.
//!
//! # Invariants
//! - Resize handling is synchronous: the next render sees the new size.
//! - The world is built at most once, after the registry reports ready.
//! - `destroy` unsubscribes, cancels the pending frame and releases every
//!   resource exactly once.

mod config;
mod error;
mod root;
mod slot;
mod stage;

pub use config::{AssetsConfig, CameraConfig, ConfigError, ExperienceConfig, ViewportConfig};
pub use error::ExperienceError;
pub use root::{SceneRoot, file_loaders};
pub use slot::ExperienceSlot;
pub use stage::Stage;

pub fn crate_info() -> &'static str {
    "experience v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("experience"));
    }
}
