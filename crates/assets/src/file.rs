use std::path::{Path, PathBuf};

use crate::handle::{AssetDetail, AssetHandle, AssetId};
use crate::loader::{AssetLoader, LoadCompletion};
use crate::manifest::{AssetKind, ManifestEntry};

const GLB_MAGIC: u32 = 0x4654_6C67; // "glTF"
const GLB_JSON_CHUNK: u32 = 0x4E4F_534A; // "JSON"

/// Errors from reading an asset off disk.
#[derive(Debug, thiserror::Error)]
pub enum FileLoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("glTF parse error: {0}")]
    Gltf(String),
}

/// Loads manifest sources from a directory on a worker thread.
///
/// The loader does not decode images or meshes. It reads the bytes, hashes
/// them into an [`AssetId`] and extracts metadata where cheap: animation clip
/// names and mesh count for `.gltf`/`.glb` models, face count for
/// environment maps.
#[derive(Debug, Clone)]
pub struct FileLoader {
    root: PathBuf,
}

impl FileLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read and describe `entry` on the calling thread.
    pub fn read(&self, entry: &ManifestEntry) -> Result<AssetHandle, FileLoadError> {
        read_entry(&self.root, entry, None)
    }
}

impl AssetLoader for FileLoader {
    fn load(&self, entry: &ManifestEntry, completion: LoadCompletion) {
        let root = self.root.clone();
        let entry = entry.clone();
        spawn_or_fail(completion, |completion| {
            std::thread::Builder::new()
                .name(format!("asset-{}", entry.name))
                .spawn(move || match read_entry(&root, &entry, Some(&completion)) {
                    Ok(handle) => completion.succeed(handle),
                    Err(err) => completion.fail(err),
                })
                .map(drop)
        });
    }
}

/// Hand `completion` to `spawn`. If no worker starts, the attempt fails
/// instead of waiting on a completion that went down with the closure.
fn spawn_or_fail<F>(completion: LoadCompletion, spawn: F)
where
    F: FnOnce(LoadCompletion) -> std::io::Result<()>,
{
    let spare = completion.spare();
    if let Err(err) = spawn(completion) {
        tracing::error!(name = %spare.name(), %err, "failed to spawn asset worker");
        spare.fail(format!("cannot start asset worker: {err}"));
    }
}

fn read_entry(
    root: &Path,
    entry: &ManifestEntry,
    progress: Option<&LoadCompletion>,
) -> Result<AssetHandle, FileLoadError> {
    let sources = entry.sources();
    let total = sources.len() as u64;
    let mut chunks = Vec::with_capacity(sources.len());
    for (i, source) in sources.iter().enumerate() {
        let path = root.join(source);
        let bytes = std::fs::read(&path).map_err(|source| FileLoadError::Io { path, source })?;
        if let Some(completion) = progress {
            completion.progress(i as u64 + 1, Some(total));
        }
        chunks.push(bytes);
    }

    let detail = match (entry.kind, sources.first(), chunks.first()) {
        (AssetKind::Model, Some(path), Some(bytes)) => describe_model(path, bytes)?,
        (AssetKind::EnvironmentMap, ..) => AssetDetail::EnvironmentMap {
            faces: chunks.len(),
        },
        _ => AssetDetail::Opaque,
    };

    Ok(AssetHandle {
        id: AssetId::from_chunks(chunks.iter().map(Vec::as_slice)),
        kind: entry.kind,
        sources: sources.iter().map(|p| p.to_path_buf()).collect(),
        byte_len: chunks.iter().map(|c| c.len() as u64).sum(),
        detail,
    })
}

fn describe_model(path: &Path, bytes: &[u8]) -> Result<AssetDetail, FileLoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let json: serde_json::Value = match ext.as_deref() {
        Some("gltf") => {
            serde_json::from_slice(bytes).map_err(|e| FileLoadError::Gltf(e.to_string()))?
        }
        Some("glb") => {
            let chunk = glb_json_chunk(bytes)?;
            serde_json::from_slice(chunk).map_err(|e| FileLoadError::Gltf(e.to_string()))?
        }
        _ => return Ok(AssetDetail::Opaque),
    };

    let meshes = json
        .get("meshes")
        .and_then(|m| m.as_array())
        .map_or(0, Vec::len);
    let animations = json
        .get("animations")
        .and_then(|a| a.as_array())
        .map(|list| {
            list.iter()
                .enumerate()
                .map(|(i, anim)| {
                    anim.get("name")
                        .and_then(|n| n.as_str())
                        .map_or_else(|| format!("animation_{i}"), str::to_string)
                })
                .collect()
        })
        .unwrap_or_default();
    Ok(AssetDetail::Model { meshes, animations })
}

/// Slice out the JSON chunk of a binary glTF container.
fn glb_json_chunk(bytes: &[u8]) -> Result<&[u8], FileLoadError> {
    let word = |offset: usize| -> Result<u32, FileLoadError> {
        bytes
            .get(offset..offset + 4)
            .and_then(|b| b.try_into().ok())
            .map(u32::from_le_bytes)
            .ok_or_else(|| FileLoadError::Gltf("truncated GLB header".into()))
    };
    if word(0)? != GLB_MAGIC {
        return Err(FileLoadError::Gltf("missing glTF magic".into()));
    }
    let chunk_len = word(12)? as usize;
    if word(16)? != GLB_JSON_CHUNK {
        return Err(FileLoadError::Gltf("first chunk is not JSON".into()));
    }
    bytes
        .get(20..20 + chunk_len)
        .ok_or_else(|| FileLoadError::Gltf("truncated JSON chunk".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{LoadMessage, LoaderSet};
    use crate::manifest::Manifest;
    use crate::registry::{LoadPolicy, ResourceRegistry};
    use std::time::Duration;

    const FOX_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "meshes": [{ "name": "fox" }],
        "animations": [{ "name": "Survey" }, { "name": "Walk" }, { "name": "Run" }, {}]
    }"#;

    fn glb(json: &str) -> Vec<u8> {
        let mut padded = json.as_bytes().to_vec();
        while padded.len() % 4 != 0 {
            padded.push(b' ');
        }
        let total = 12 + 8 + padded.len();
        let mut out = Vec::new();
        out.extend_from_slice(&GLB_MAGIC.to_le_bytes());
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(padded.len() as u32).to_le_bytes());
        out.extend_from_slice(&GLB_JSON_CHUNK.to_le_bytes());
        out.extend_from_slice(&padded);
        out
    }

    #[test]
    fn reads_texture_and_hashes_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"not really a png").unwrap();
        std::fs::write(dir.path().join("b.png"), b"not really a png").unwrap();
        let loader = FileLoader::new(dir.path());

        let a = loader
            .read(&ManifestEntry::new("a", AssetKind::Texture, "a.png"))
            .unwrap();
        let b = loader
            .read(&ManifestEntry::new("b", AssetKind::Texture, "b.png"))
            .unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.byte_len, 16);
        assert_eq!(a.detail, AssetDetail::Opaque);
    }

    #[test]
    fn gltf_animations_are_extracted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Fox.gltf"), FOX_GLTF).unwrap();
        let handle = FileLoader::new(dir.path())
            .read(&ManifestEntry::new("foxModel", AssetKind::Model, "Fox.gltf"))
            .unwrap();
        assert_eq!(
            handle.animations(),
            ["Survey", "Walk", "Run", "animation_3"].map(String::from)
        );
        assert!(matches!(handle.detail, AssetDetail::Model { meshes: 1, .. }));
    }

    #[test]
    fn glb_json_chunk_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Fox.glb"), glb(FOX_GLTF)).unwrap();
        let handle = FileLoader::new(dir.path())
            .read(&ManifestEntry::new("foxModel", AssetKind::Model, "Fox.glb"))
            .unwrap();
        assert_eq!(handle.animations().len(), 4);
    }

    #[test]
    fn broken_glb_is_an_error() {
        assert!(glb_json_chunk(b"glTF").is_err());
        assert!(glb_json_chunk(&[0u8; 24]).is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileLoader::new(dir.path())
            .read(&ManifestEntry::new("a", AssetKind::Texture, "missing.png"))
            .unwrap_err();
        assert!(matches!(err, FileLoadError::Io { .. }));
        assert!(err.to_string().contains("missing.png"));
    }

    #[test]
    fn cube_map_counts_faces() {
        let dir = tempfile::tempdir().unwrap();
        let faces: Vec<String> = (0..6).map(|i| format!("{i}.jpg")).collect();
        for face in &faces {
            std::fs::write(dir.path().join(face), face.as_bytes()).unwrap();
        }
        let handle = FileLoader::new(dir.path())
            .read(&ManifestEntry::with_sources("env", AssetKind::EnvironmentMap, faces))
            .unwrap();
        assert_eq!(handle.detail, AssetDetail::EnvironmentMap { faces: 6 });
        assert_eq!(handle.sources.len(), 6);
    }

    #[test]
    fn worker_thread_reports_through_channel() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"pixels").unwrap();
        let manifest = Manifest::new(vec![
            ManifestEntry::new("a", AssetKind::Texture, "a.png"),
            ManifestEntry::new("b", AssetKind::Texture, "gone.png"),
        ])
        .unwrap();
        let loaders = LoaderSet::new().with(AssetKind::Texture, FileLoader::new(dir.path()));
        let policy = LoadPolicy {
            max_attempts: 1,
            timeout: None,
        };
        let mut reg: ResourceRegistry<()> =
            ResourceRegistry::new(manifest, loaders, policy, Duration::ZERO);

        let deadline = std::time::Instant::now() + Duration::from_secs(10);
        while !reg.is_ready() && std::time::Instant::now() < deadline {
            reg.poll(Duration::ZERO, &mut ());
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(reg.is_ready());
        assert!(reg.items().is_loaded("a"));
        assert!(reg.items().get("b").is_err());
    }

    #[test]
    fn spawn_failure_fails_the_attempt() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let completion = LoadCompletion::new("a".into(), 2, tx);
        spawn_or_fail(completion, |_| Err(std::io::Error::other("no threads")));
        let messages: Vec<LoadMessage> = rx.try_iter().collect();
        match messages.as_slice() {
            [LoadMessage::Finished { name, attempt: 2, result: Err(reason) }] => {
                assert_eq!(name, "a");
                assert!(reason.contains("no threads"));
            }
            other => panic!("unexpected messages: {other:?}"),
        }
    }

    #[test]
    fn started_worker_reports_once() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let completion = LoadCompletion::new("a".into(), 1, tx);
        spawn_or_fail(completion, |completion| {
            completion.fail("read error");
            Ok(())
        });
        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn progress_is_reported_per_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"pixels").unwrap();
        let (tx, rx) = crossbeam_channel::unbounded();
        let completion = LoadCompletion::new("a".into(), 1, tx);
        let entry = ManifestEntry::new("a", AssetKind::Texture, "a.png");
        read_entry(dir.path(), &entry, Some(&completion)).unwrap();
        let messages: Vec<LoadMessage> = rx.try_iter().collect();
        assert!(matches!(
            messages.as_slice(),
            [LoadMessage::Progress { loaded: 1, total: Some(1), .. }]
        ));
    }
}
