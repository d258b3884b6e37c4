use experience_assets::ManifestError;
use experience_world::WorldError;

use crate::config::ConfigError;

/// Errors surfaced by the composition root.
#[derive(Debug, thiserror::Error)]
pub enum ExperienceError {
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("world unavailable: {0}")]
    World(#[from] WorldError),
    #[error("{0} accessed before assets were ready")]
    PrematureAccess(&'static str),
    #[error("experience has been destroyed")]
    Destroyed,
}
