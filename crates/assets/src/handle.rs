use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

use crate::manifest::AssetKind;

/// Content-addressed asset ID: the first eight bytes of a SHA-256 digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u64);

impl AssetId {
    /// Hash a sequence of byte chunks (e.g. the six faces of a cube map).
    pub fn from_chunks<'a>(chunks: impl IntoIterator<Item = &'a [u8]>) -> Self {
        let mut hasher = Sha256::new();
        for chunk in chunks {
            hasher.update((chunk.len() as u64).to_le_bytes());
            hasher.update(chunk);
        }
        let digest = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        Self(u64::from_le_bytes(bytes))
    }

    pub fn from_bytes(data: &[u8]) -> Self {
        Self::from_chunks([data])
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Loader-extracted metadata. Decoding the payload itself stays with the
/// rendering engine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AssetDetail {
    #[default]
    Opaque,
    Model {
        meshes: usize,
        animations: Vec<String>,
    },
    EnvironmentMap {
        faces: usize,
    },
}

/// A resolved asset as the rest of the framework sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetHandle {
    pub id: AssetId,
    pub kind: AssetKind,
    pub sources: Vec<PathBuf>,
    pub byte_len: u64,
    pub detail: AssetDetail,
}

impl AssetHandle {
    pub fn new(id: AssetId, kind: AssetKind) -> Self {
        Self {
            id,
            kind,
            sources: Vec::new(),
            byte_len: 0,
            detail: AssetDetail::Opaque,
        }
    }

    pub fn with_detail(mut self, detail: AssetDetail) -> Self {
        self.detail = detail;
        self
    }

    /// Animation clip names for model assets; empty for everything else.
    pub fn animations(&self) -> &[String] {
        match &self.detail {
            AssetDetail::Model { animations, .. } => animations,
            _ => &[],
        }
    }
}
