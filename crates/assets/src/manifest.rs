use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Faces in a cube environment map.
pub const CUBE_FACES: usize = 6;

/// Which external loader handles an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Texture,
    #[serde(alias = "gltfModel", alias = "gltf_model")]
    Model,
    #[serde(alias = "cubeTexture", alias = "cube_texture", alias = "hdrTexture")]
    EnvironmentMap,
    #[serde(alias = "dracoGeometry")]
    CompressedGeometry,
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Texture => "texture",
            Self::Model => "model",
            Self::EnvironmentMap => "environment_map",
            Self::CompressedGeometry => "compressed_geometry",
        })
    }
}

/// One source file, or an ordered list (cube map faces).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourcePath {
    One(PathBuf),
    Many(Vec<PathBuf>),
}

impl SourcePath {
    pub fn paths(&self) -> Vec<&Path> {
        match self {
            Self::One(p) => vec![p.as_path()],
            Self::Many(list) => list.iter().map(PathBuf::as_path).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Declarative descriptor of one external asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(alias = "identifier")]
    pub name: String,
    #[serde(alias = "type")]
    pub kind: AssetKind,
    #[serde(alias = "sourcePath")]
    pub path: SourcePath,
}

impl ManifestEntry {
    pub fn new(name: impl Into<String>, kind: AssetKind, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kind,
            path: SourcePath::One(path.into()),
        }
    }

    pub fn with_sources<P: Into<PathBuf>>(
        name: impl Into<String>,
        kind: AssetKind,
        sources: impl IntoIterator<Item = P>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            path: SourcePath::Many(sources.into_iter().map(Into::into).collect()),
        }
    }

    pub fn sources(&self) -> Vec<&Path> {
        self.path.paths()
    }
}

/// Errors raised while declaring a manifest. All of them fail fast,
/// before any load is dispatched.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("duplicate manifest entry '{0}'")]
    DuplicateEntry(String),
    #[error("manifest entry #{index} has an empty name")]
    EmptyName { index: usize },
    #[error("invalid source for '{name}': {reason}")]
    InvalidSource { name: String, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validated, ordered list of entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new(entries: Vec<ManifestEntry>) -> Result<Self, ManifestError> {
        let mut seen = HashSet::new();
        for (index, entry) in entries.iter().enumerate() {
            if entry.name.trim().is_empty() {
                return Err(ManifestError::EmptyName { index });
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(ManifestError::DuplicateEntry(entry.name.clone()));
            }
            validate_sources(entry)?;
        }
        Ok(Self { entries })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a JSON array of entries.
    pub fn from_json_str(json: &str) -> Result<Self, ManifestError> {
        let entries: Vec<ManifestEntry> = serde_json::from_str(json)?;
        Self::new(entries)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate_sources(entry: &ManifestEntry) -> Result<(), ManifestError> {
    let invalid = |reason: String| ManifestError::InvalidSource {
        name: entry.name.clone(),
        reason,
    };
    let paths = entry.sources();
    if paths.is_empty() {
        return Err(invalid("no source paths".into()));
    }
    if paths.iter().any(|p| p.as_os_str().is_empty()) {
        return Err(invalid("empty source path".into()));
    }
    match entry.kind {
        AssetKind::EnvironmentMap if paths.len() != 1 && paths.len() != CUBE_FACES => Err(
            invalid(format!("expected 1 or {CUBE_FACES} faces, got {}", paths.len())),
        ),
        AssetKind::EnvironmentMap => Ok(()),
        _ if paths.len() > 1 => Err(invalid(format!(
            "{} takes a single source, got {}",
            entry.kind,
            paths.len()
        ))),
        _ => Ok(()),
    }
}
