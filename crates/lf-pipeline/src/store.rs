//! Manifest persistence.
//!
//! Manifests are keyed by resource id. [`JsonManifestStore`] keeps one
//! `directory_{resourceId}.json` file per resource; [`MemoryManifestStore`]
//! is the in-process variant used by tests and dry runs.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use lf_core::{Error, ResourceId, Result};
use parking_lot::RwLock;

use crate::manifest::Manifest;

#[async_trait]
pub trait ManifestStore: Send + Sync {
    /// Insert or replace the manifest for its resource.
    async fn save(&self, manifest: &Manifest) -> Result<()>;

    /// Fails with [`Error::NotFound`] when nothing was saved for `id`.
    async fn get(&self, id: &ResourceId) -> Result<Manifest>;
}

#[derive(Debug, Clone)]
pub struct JsonManifestStore {
    dir: PathBuf,
}

impl JsonManifestStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: &ResourceId) -> PathBuf {
        self.dir.join(format!("directory_{id}.json"))
    }
}

#[async_trait]
impl ManifestStore for JsonManifestStore {
    async fn save(&self, manifest: &Manifest) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_vec_pretty(manifest)?;
        let path = self.path_for(&manifest.resource_id);
        // Write then rename so readers never see a partial record.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        tracing::debug!(path = %path.display(), "manifest saved");
        Ok(())
    }

    async fn get(&self, id: &ResourceId) -> Result<Manifest> {
        let path = self.path_for(id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::not_found("manifest", id))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryManifestStore {
    manifests: RwLock<HashMap<ResourceId, Manifest>>,
}

impl MemoryManifestStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.manifests.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifests.read().is_empty()
    }
}

#[async_trait]
impl ManifestStore for MemoryManifestStore {
    async fn save(&self, manifest: &Manifest) -> Result<()> {
        self.manifests
            .write()
            .insert(manifest.resource_id.clone(), manifest.clone());
        Ok(())
    }

    async fn get(&self, id: &ResourceId) -> Result<Manifest> {
        self.manifests
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found("manifest", id))
    }
}
