use experience_assets::AssetError;

/// Why the world could not be built.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorldError {
    #[error("required asset unavailable: {0}")]
    Asset(#[from] AssetError),
    #[error("model '{name}' has {found} animation clip(s), needs {expected}")]
    MissingAnimations {
        name: String,
        expected: usize,
        found: usize,
    },
}
