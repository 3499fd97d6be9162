//! Manifest assembly.
//!
//! Once a run's renditions are verified, the assembler renames every video
//! in the output directory to `{resourceId}_v{n}.mp4` (n from
//! [`FIRST_VIDEO_INDEX`], indices 0 and 1 being reserved for the master and
//! the low-definition preview), hashes each file through the
//! [`ContentStore`] and records the result as a [`Manifest`].
//!
//! Renaming is deterministic: files are ordered by the number embedded at
//! the end of their stem (so `_v10` follows `_v9`), then by name, and moved
//! in two phases through temporary names so no rename overwrites a sibling
//! that has not been moved yet.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lf_core::{Error, ResourceId, Result};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::content::{artifact_id, ContentStore};

/// First `_v{n}` index handed out to published videos.
pub const FIRST_VIDEO_INDEX: usize = 2;

/// Extensions treated as video renditions.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "m4v"];

/// Extension of the intermediate names used while renaming.
const RENAME_TMP_EXTENSION: &str = "lfrename";

/// One published file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub artifact_id: String,
    pub name: String,
    pub content_hash: String,
}

/// Output of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub resource_id: ResourceId,
    /// Content-addressed identifier of the whole output directory.
    pub content_id: String,
    /// Renamed video renditions, in index order.
    pub artifacts: Vec<Artifact>,
    /// Non-video files (poster, sprite, audio, subtitles), by name.
    #[serde(default)]
    pub assets: Vec<Artifact>,
    pub created_at: DateTime<Utc>,
}

/// Whether `path` carries a video extension.
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| VIDEO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Regular files directly inside `dir`, sorted by name.
fn regular_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            Error::Io {
                source: e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
            }
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Video files directly inside `dir`, in natural order.
pub fn video_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut videos: Vec<PathBuf> = regular_files(dir)?
        .into_iter()
        .filter(|p| is_video_file(p))
        .collect();
    videos.sort_by(|a, b| natural_cmp(a, b));
    Ok(videos)
}

/// Remove every video and leftover rename file directly inside `dir`.
///
/// Published names overlap the names the ladder writes, so a previous run's
/// renditions must be gone before a new run produces its own. Returns the
/// number of files removed; a missing directory removes nothing.
pub fn clear_videos(dir: &Path) -> Result<usize> {
    if !dir.is_dir() {
        return Ok(0);
    }
    let mut removed = 0;
    for path in regular_files(dir)? {
        if is_video_file(&path) || is_rename_leftover(&path) {
            std::fs::remove_file(&path)?;
            tracing::debug!(file = %file_name(&path), "removed stale output");
            removed += 1;
        }
    }
    Ok(removed)
}

fn is_rename_leftover(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(RENAME_TMP_EXTENSION)
}

/// Trailing number of a file stem: `r1_v12` -> 12.
fn trailing_number(path: &Path) -> Option<u64> {
    let stem = path.file_stem()?.to_str()?;
    let digits: String = stem
        .chars()
        .rev()
        .take_while(char::is_ascii_digit)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    digits.parse().ok()
}

/// Numbered files first by number, then everything by name.
fn natural_cmp(a: &Path, b: &Path) -> Ordering {
    match (trailing_number(a), trailing_number(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub struct ManifestAssembler {
    store: Arc<dyn ContentStore>,
    min_artifacts: usize,
}

impl ManifestAssembler {
    pub fn new(store: Arc<dyn ContentStore>, min_artifacts: usize) -> Self {
        Self {
            store,
            min_artifacts,
        }
    }

    /// Rename, hash and list the contents of `output_dir`.
    ///
    /// Fails with [`Error::ManifestIncomplete`] before touching anything
    /// when fewer than the minimum number of videos are present.
    pub async fn assemble(&self, output_dir: &Path, resource_id: &ResourceId) -> Result<Manifest> {
        let videos = video_files(output_dir)?;
        if videos.len() < self.min_artifacts {
            return Err(Error::ManifestIncomplete {
                found: videos.len(),
                required: self.min_artifacts,
            });
        }

        let renamed = rename_videos(output_dir, resource_id, &videos)?;

        let mut artifacts = Vec::with_capacity(renamed.len());
        for path in &renamed {
            artifacts.push(self.artifact(path).await?);
        }

        let mut assets = Vec::new();
        for path in regular_files(output_dir)? {
            if is_video_file(&path) {
                continue;
            }
            assets.push(self.artifact(&path).await?);
        }

        let all: Vec<Artifact> = artifacts.iter().chain(assets.iter()).cloned().collect();
        let content_id = self.store.add_directory(output_dir, &all).await?;

        tracing::info!(
            resource = %resource_id,
            content_id = %content_id,
            videos = artifacts.len(),
            assets = assets.len(),
            "manifest assembled"
        );

        Ok(Manifest {
            resource_id: resource_id.clone(),
            content_id,
            artifacts,
            assets,
            created_at: Utc::now(),
        })
    }

    async fn artifact(&self, path: &Path) -> Result<Artifact> {
        let content_hash = self.store.add_file(path).await?;
        Ok(Artifact {
            artifact_id: artifact_id(&content_hash),
            name: file_name(path),
            content_hash,
        })
    }
}

/// Move `videos` to `{id}_v{n}.mp4`, returning the new paths in order.
fn rename_videos(dir: &Path, id: &ResourceId, videos: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut staged = Vec::with_capacity(videos.len());
    for (i, video) in videos.iter().enumerate() {
        let tmp = dir.join(format!(".{id}_{i}.{RENAME_TMP_EXTENSION}"));
        if let Err(e) = std::fs::rename(video, &tmp) {
            restore_staged(&staged, videos);
            return Err(e.into());
        }
        staged.push(tmp);
    }

    let mut renamed = Vec::with_capacity(staged.len());
    for (i, tmp) in staged.iter().enumerate() {
        let target = dir.join(format!("{id}_v{}.mp4", FIRST_VIDEO_INDEX + i));
        if let Err(e) = std::fs::rename(tmp, &target) {
            restore_staged(&staged[i..], &videos[i..]);
            return Err(e.into());
        }
        tracing::debug!(from = %file_name(&videos[i]), to = %file_name(&target), "renamed");
        renamed.push(target);
    }
    Ok(renamed)
}

/// Move staged files back to their original names after a failed rename.
///
/// A file whose original name is taken again stays under its temporary
/// name and is logged; the next run's [`clear_videos`] removes it.
fn restore_staged(staged: &[PathBuf], originals: &[PathBuf]) {
    for (tmp, original) in staged.iter().zip(originals) {
        if original.exists() {
            tracing::warn!(file = %file_name(tmp), original = %file_name(original), "stranded rename file");
            continue;
        }
        if let Err(e) = std::fs::rename(tmp, original) {
            tracing::warn!(file = %file_name(tmp), original = %file_name(original), "stranded rename file: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Sha256ContentStore;
    use assert_matches::assert_matches;

    fn touch(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths.iter().map(|p| file_name(p)).collect()
    }

    fn assembler(min: usize) -> ManifestAssembler {
        ManifestAssembler::new(Arc::new(Sha256ContentStore), min)
    }

    #[test]
    fn natural_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["r1_v10.mp4", "r1_v9.mp4", "b.mp4", "r1_v3.mp4", "a.mp4", "x.m4a"] {
            touch(dir.path(), name, name);
        }
        let videos = video_files(dir.path()).unwrap();
        assert_eq!(
            names(&videos),
            vec!["r1_v3.mp4", "r1_v9.mp4", "r1_v10.mp4", "a.mp4", "b.mp4"]
        );
    }

    #[tokio::test]
    async fn too_few_videos_is_incomplete_and_untouched() {
        let dir = tempfile::tempdir().unwrap();
        for i in 3..7 {
            touch(dir.path(), &format!("r1_v{i}.mp4"), "x");
        }
        let result = assembler(5).assemble(dir.path(), &ResourceId::from("r1")).await;
        assert_matches!(result, Err(Error::ManifestIncomplete { found: 4, required: 5 }));
        assert!(dir.path().join("r1_v3.mp4").exists());
    }

    #[tokio::test]
    async fn renames_from_offset_without_clobbering() {
        let dir = tempfile::tempdir().unwrap();
        // r1_v3 must become r1_v2 while r1_v2's old content must not be lost.
        for i in 2..8 {
            touch(dir.path(), &format!("r1_v{i}.mp4"), &format!("tier{i}"));
        }
        touch(dir.path(), "poster.jpg", "jpg");
        touch(dir.path(), "r1_a1.m4a", "audio");

        let manifest = assembler(5)
            .assemble(dir.path(), &ResourceId::from("r1"))
            .await
            .unwrap();

        let artifact_names: Vec<_> = manifest.artifacts.iter().map(|a| a.name.clone()).collect();
        assert_eq!(
            artifact_names,
            vec!["r1_v2.mp4", "r1_v3.mp4", "r1_v4.mp4", "r1_v5.mp4", "r1_v6.mp4", "r1_v7.mp4"]
        );
        // Order preserved: the former v2 stays v2, the former v7 stays v7.
        assert_eq!(std::fs::read_to_string(dir.path().join("r1_v2.mp4")).unwrap(), "tier2");
        assert_eq!(std::fs::read_to_string(dir.path().join("r1_v7.mp4")).unwrap(), "tier7");

        let asset_names: Vec<_> = manifest.assets.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(asset_names, vec!["poster.jpg", "r1_a1.m4a"]);
        assert_eq!(manifest.content_id.len(), 64);
        assert!(manifest.artifacts.iter().all(|a| a.artifact_id.len() == 32));

        // No temporary names left behind.
        let leftovers = regular_files(dir.path())
            .unwrap()
            .into_iter()
            .filter(|p| is_rename_leftover(p))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn ladder_outputs_shift_down_to_offset() {
        let dir = tempfile::tempdir().unwrap();
        for i in 3..8 {
            touch(dir.path(), &format!("r1_v{i}.mp4"), &format!("tier{i}"));
        }
        let manifest = assembler(5)
            .assemble(dir.path(), &ResourceId::from("r1"))
            .await
            .unwrap();
        assert_eq!(manifest.artifacts.len(), 5);
        assert_eq!(manifest.artifacts[0].name, "r1_v2.mp4");
        assert_eq!(manifest.artifacts[4].name, "r1_v6.mp4");
        assert_eq!(std::fs::read_to_string(dir.path().join("r1_v2.mp4")).unwrap(), "tier3");
        assert!(!dir.path().join("r1_v7.mp4").exists());
    }

    #[test]
    fn clear_videos_keeps_assets() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["r1_v2.mp4", "r1_v7.mp4", ".r1_0.lfrename", "poster.jpg", "r1_a1.m4a"] {
            touch(dir.path(), name, name);
        }
        assert_eq!(clear_videos(dir.path()).unwrap(), 3);
        assert_eq!(
            names(&regular_files(dir.path()).unwrap()),
            vec!["poster.jpg", "r1_a1.m4a"]
        );
        assert_eq!(clear_videos(&dir.path().join("absent")).unwrap(), 0);
    }

    #[test]
    fn restore_moves_staged_files_back_unless_taken() {
        let dir = tempfile::tempdir().unwrap();
        let staged = [dir.path().join(".r1_0.lfrename"), dir.path().join(".r1_1.lfrename")];
        let originals = [dir.path().join("r1_v3.mp4"), dir.path().join("r1_v4.mp4")];
        touch(dir.path(), ".r1_0.lfrename", "tier3");
        touch(dir.path(), ".r1_1.lfrename", "tier4");
        touch(dir.path(), "r1_v4.mp4", "newer");

        restore_staged(&staged, &originals);

        assert_eq!(std::fs::read_to_string(&originals[0]).unwrap(), "tier3");
        assert!(!staged[0].exists());
        // r1_v4 was taken again, so its staged copy is left for cleanup.
        assert_eq!(std::fs::read_to_string(&originals[1]).unwrap(), "newer");
        assert!(staged[1].exists());
    }

    #[tokio::test]
    async fn identical_directories_share_content_id() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        for dir in [a.path(), b.path()] {
            for i in 3..8 {
                touch(dir, &format!("r1_v{i}.mp4"), &format!("tier{i}"));
            }
        }
        let ma = assembler(5).assemble(a.path(), &ResourceId::from("r1")).await.unwrap();
        let mb = assembler(5).assemble(b.path(), &ResourceId::from("r1")).await.unwrap();
        assert_eq!(ma.content_id, mb.content_id);
    }
}
