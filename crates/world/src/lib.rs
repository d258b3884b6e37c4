//! World content: the objects placed in the scene once every asset resolved.
//!
//! # Invariants
//! - Content is built at most once, from the ready item table.
//! - A missing or failed required asset fails the whole build before the
//!   scene is touched.
//! - Sub-objects update in declaration order: floor, fox, environment.

mod animation;
mod content;
mod environment;
mod error;
mod floor;
mod fox;

pub use animation::{AnimationAction, AnimationMixer};
pub use content::{FrameContext, WorldContent, WorldObject};
pub use environment::{ENVIRONMENT_MAP, Environment};
pub use error::WorldError;
pub use floor::{Floor, GRASS_COLOR, GRASS_NORMAL};
pub use fox::{FOX_CLIPS, FOX_MODEL, Fox};

/// Manifest names the world reads.
pub const REQUIRED_ASSETS: [&str; 4] = [ENVIRONMENT_MAP, GRASS_COLOR, GRASS_NORMAL, FOX_MODEL];

pub fn crate_info() -> &'static str {
    "experience-world v0.1.0"
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("world"));
    }
}
