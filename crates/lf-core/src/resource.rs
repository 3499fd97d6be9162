//! The resource model: one source video and the filesystem layout derived
//! from it.
//!
//! Every path a pipeline run reads or writes is computed once here, from the
//! bucket mount and the resource's tracker/directory namespace, and then
//! threaded explicitly through the stage specifications.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::ids::ResourceId;
use crate::Error;

/// Suffix of the audio-stripped master written next to the source.
const MASTER_SUFFIX: &str = "_without_audio.mp4";
/// Suffix of the per-resource output directory.
const OUTPUT_DIR_SUFFIX: &str = "_ipfs";

/// A single source video submitted for transcoding.
///
/// Immutable for the lifetime of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Request-supplied identifier; the stem of every produced artifact.
    pub id: ResourceId,
    /// Source file name inside the source directory (e.g. `clip.mp4`).
    pub filename: String,
    /// Directory segment below the tracker namespace.
    pub source_directory: String,
    /// Logical namespace (bucket segment) the source lives under.
    pub tracker: String,
    /// Language tag used for subtitle artifacts.
    pub language: String,
    /// Optional subtitle file to convert to WebVTT.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<PathBuf>,
}

impl Resource {
    /// Create a resource with the default language and no subtitle.
    pub fn new(
        id: impl Into<ResourceId>,
        filename: impl Into<String>,
        source_directory: impl Into<String>,
        tracker: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            filename: filename.into(),
            source_directory: source_directory.into(),
            tracker: tracker.into(),
            language: "en".into(),
            subtitle: None,
        }
    }

    /// Builder: set the language tag.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Builder: attach a subtitle file.
    pub fn with_subtitle(mut self, subtitle: impl Into<PathBuf>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    /// Resolve the on-disk layout for this resource under `bucket_mount`.
    pub fn paths(&self, bucket_mount: &Path) -> ResourcePaths {
        let work_dir = bucket_mount
            .join(&self.tracker)
            .join(&self.source_directory);
        let source = work_dir.join(&self.filename);
        let master = work_dir.join(format!("{}{MASTER_SUFFIX}", self.id));
        let output_dir = work_dir.join(format!("{}{OUTPUT_DIR_SUFFIX}", self.id));
        ResourcePaths {
            work_dir,
            source,
            master,
            output_dir,
        }
    }
}

/// Filesystem layout of one resource's run.
///
/// Paths are namespaced by tracker, directory and resource id, so runs for
/// different resources never touch the same files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePaths {
    /// `{bucket}/{tracker}/{sourceDirectory}/`
    pub work_dir: PathBuf,
    /// The original upload.
    pub source: PathBuf,
    /// The audio-stripped master produced by the first stage.
    pub master: PathBuf,
    /// Directory that is published once the run completes.
    pub output_dir: PathBuf,
}

impl ResourcePaths {
    /// Path of a named file inside the output directory.
    pub fn output_file(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }
}

/// How the rendition ladder is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionKind {
    /// Encode every ladder tier locally with ffmpeg.
    #[default]
    Local,
    /// Hand the master off to the remote transcoding service in one pass.
    Remote,
}

impl fmt::Display for ExecutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

impl FromStr for ExecutionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            other => Err(Error::Validation(format!(
                "unknown execution kind '{other}' (expected local or remote)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Resource {
        Resource::new("r1", "clip.mp4", "uploads", "tracker-a")
    }

    #[test]
    fn paths_are_namespaced_by_resource() {
        let paths = sample().paths(Path::new("/mnt/bucket"));
        assert_eq!(paths.work_dir, PathBuf::from("/mnt/bucket/tracker-a/uploads"));
        assert_eq!(paths.source, PathBuf::from("/mnt/bucket/tracker-a/uploads/clip.mp4"));
        assert_eq!(
            paths.master,
            PathBuf::from("/mnt/bucket/tracker-a/uploads/r1_without_audio.mp4")
        );
        assert_eq!(paths.output_dir, PathBuf::from("/mnt/bucket/tracker-a/uploads/r1_ipfs"));
        assert_eq!(
            paths.output_file("poster.jpg"),
            PathBuf::from("/mnt/bucket/tracker-a/uploads/r1_ipfs/poster.jpg")
        );
    }

    #[test]
    fn different_resources_do_not_overlap() {
        let a = sample().paths(Path::new("/b"));
        let mut other = sample();
        other.id = ResourceId::from("r2");
        let b = other.paths(Path::new("/b"));
        assert_ne!(a.master, b.master);
        assert_ne!(a.output_dir, b.output_dir);
    }

    #[test]
    fn builders() {
        let r = sample().with_language("pt").with_subtitle("/subs/r1.srt");
        assert_eq!(r.language, "pt");
        assert_eq!(r.subtitle, Some(PathBuf::from("/subs/r1.srt")));
    }

    #[test]
    fn execution_kind_parse_and_display() {
        assert_eq!("local".parse::<ExecutionKind>().unwrap(), ExecutionKind::Local);
        assert_eq!("REMOTE".parse::<ExecutionKind>().unwrap(), ExecutionKind::Remote);
        assert!("hybrid".parse::<ExecutionKind>().is_err());
        assert_eq!(ExecutionKind::Remote.to_string(), "remote");
        assert_eq!(ExecutionKind::default(), ExecutionKind::Local);
    }
}
