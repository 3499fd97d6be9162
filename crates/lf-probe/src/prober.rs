//! The [`Prober`] trait defining the interface for media file probing.

use async_trait::async_trait;
use std::path::Path;

use crate::types::MediaProbe;

/// A media file prober capable of extracting metadata from video files.
///
/// Implementations must be safe to share across threads (`Send + Sync`) so
/// one instance can serve concurrent pipeline runs.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Human-readable name identifying this prober implementation.
    fn name(&self) -> &'static str;

    /// Probe a media file at the given path and extract metadata.
    ///
    /// Fails with [`lf_core::Error::Probe`] when the inspection tool cannot
    /// be spawned, exits unsuccessfully, or emits undecodable output.
    async fn probe(&self, path: &Path) -> lf_core::Result<MediaProbe>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    struct FixedProber(&'static str);

    #[async_trait]
    impl Prober for FixedProber {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn probe(&self, path: &Path) -> lf_core::Result<MediaProbe> {
            Ok(MediaProbe {
                file_path: path.to_path_buf(),
                duration: Some(self.0.to_string()),
                format_name: "mov,mp4,m4a,3gp,3g2,mj2".into(),
                stream_count: 1,
                streams: vec![],
            })
        }
    }

    #[tokio::test]
    async fn trait_objects_can_be_shared() {
        let prober: Arc<dyn Prober> = Arc::new(FixedProber("12.400000"));
        let probe = prober.probe(Path::new("/tmp/a.mp4")).await.unwrap();
        assert_eq!(probe.file_path, PathBuf::from("/tmp/a.mp4"));
        assert_eq!(probe.duration.as_deref(), Some("12.400000"));
        assert_eq!(prober.name(), "fixed");
    }
}
