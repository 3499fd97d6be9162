//! Content addressing for published artifacts.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lf_core::{Error, Result};
use sha2::{Digest, Sha256};

use crate::manifest::Artifact;

/// The storage-publish collaborator.
///
/// `add_file` yields the content hash of one file; `add_directory` yields
/// the identifier of the whole published directory.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn add_file(&self, path: &Path) -> Result<String>;

    async fn add_directory(&self, dir: &Path, artifacts: &[Artifact]) -> Result<String>;
}

/// Local content store: hex SHA-256 of file bytes, and of the sorted
/// `name:hash` listing for directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256ContentStore;

#[async_trait]
impl ContentStore for Sha256ContentStore {
    async fn add_file(&self, path: &Path) -> Result<String> {
        let path: PathBuf = path.to_path_buf();
        tokio::task::spawn_blocking(move || hash_file(&path))
            .await
            .map_err(|e| Error::Internal(format!("hashing task failed: {e}")))?
    }

    async fn add_directory(&self, _dir: &Path, artifacts: &[Artifact]) -> Result<String> {
        let mut entries: Vec<(&str, &str)> = artifacts
            .iter()
            .map(|a| (a.name.as_str(), a.content_hash.as_str()))
            .collect();
        entries.sort_unstable();

        let mut hasher = Sha256::new();
        for (name, hash) in entries {
            hasher.update(name.as_bytes());
            hasher.update(b":");
            hasher.update(hash.as_bytes());
            hasher.update(b"\n");
        }
        Ok(hex::encode(hasher.finalize()))
    }
}

fn hash_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Stable artifact id: the first 32 hex chars of SHA-256 over the content hash.
pub fn artifact_id(content_hash: &str) -> String {
    let digest = hex::encode(Sha256::digest(content_hash.as_bytes()));
    digest[..32].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(name: &str, hash: &str) -> Artifact {
        Artifact {
            artifact_id: artifact_id(hash),
            name: name.into(),
            content_hash: hash.into(),
        }
    }

    #[tokio::test]
    async fn file_hash_is_sha256() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, b"abc").unwrap();
        let hash = Sha256ContentStore.add_file(&path).await.unwrap();
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let result = Sha256ContentStore.add_file(Path::new("/nonexistent/x")).await;
        assert!(matches!(result, Err(Error::Io { .. })));
    }

    #[tokio::test]
    async fn directory_id_ignores_order() {
        let a = [artifact("r1_v2.mp4", "aa"), artifact("r1_v3.mp4", "bb")];
        let b = [artifact("r1_v3.mp4", "bb"), artifact("r1_v2.mp4", "aa")];
        let store = Sha256ContentStore;
        let id_a = store.add_directory(Path::new("/o"), &a).await.unwrap();
        let id_b = store.add_directory(Path::new("/o"), &b).await.unwrap();
        assert_eq!(id_a, id_b);
        assert_eq!(id_a.len(), 64);

        let c = [artifact("r1_v2.mp4", "aa"), artifact("r1_v3.mp4", "cc")];
        assert_ne!(store.add_directory(Path::new("/o"), &c).await.unwrap(), id_a);
    }

    #[test]
    fn artifact_id_is_truncated_digest() {
        let id = artifact_id("ba7816bf");
        assert_eq!(id.len(), 32);
        assert_eq!(id, artifact_id("ba7816bf"));
        assert_ne!(id, artifact_id("ba7816bg"));
    }
}
