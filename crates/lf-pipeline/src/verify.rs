//! Integrity verification of produced renditions.
//!
//! A rendition passes when its probed duration matches the source's. Any
//! probe failure on either side fails the check; callers of
//! [`IntegrityVerifier::verify`] cannot tell a probe failure from a
//! mismatch.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lf_core::config::{PipelineConfig, VerificationMode};
use lf_core::{Error, Result};
use lf_probe::{MediaProbe, Prober};

use crate::manifest::video_files;

/// How two probed durations are compared.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DurationComparison {
    /// The tool's duration strings must be identical.
    Exact,
    /// Parsed durations may differ by at most this many seconds.
    Tolerance(f64),
}

impl DurationComparison {
    pub fn from_config(config: &PipelineConfig) -> Self {
        match config.verification {
            VerificationMode::Exact => Self::Exact,
            VerificationMode::Tolerance => Self::Tolerance(config.tolerance_secs),
        }
    }
}

#[derive(Clone)]
pub struct IntegrityVerifier {
    prober: Arc<dyn Prober>,
    comparison: DurationComparison,
}

impl IntegrityVerifier {
    pub fn new(prober: Arc<dyn Prober>, comparison: DurationComparison) -> Self {
        Self { prober, comparison }
    }

    /// `true` only when both files probe and their durations match.
    pub async fn verify(&self, source: &Path, output: &Path) -> bool {
        self.check(source, output).await.is_ok()
    }

    /// Like [`verify`](Self::verify) but explains a failure as
    /// [`Error::VerificationFailed`].
    pub async fn check(&self, source: &Path, output: &Path) -> Result<()> {
        let fail = |reason: String| Error::verification(source, output, reason);

        let src = self
            .prober
            .probe(source)
            .await
            .map_err(|e| fail(format!("source probe failed: {e}")))?;
        let out = self
            .prober
            .probe(output)
            .await
            .map_err(|e| fail(format!("output probe failed: {e}")))?;

        self.compare(&src, &out).map_err(fail)
    }

    /// Check every video in `output_dir` against `source`.
    ///
    /// Returns the number of files checked; the first failure wins.
    pub async fn check_directory(&self, source: &Path, output_dir: &Path) -> Result<usize> {
        let videos: Vec<PathBuf> = video_files(output_dir)?;
        if videos.is_empty() {
            return Err(Error::verification(
                source,
                output_dir,
                "no video files to verify",
            ));
        }
        for video in &videos {
            self.check(source, video).await?;
            tracing::debug!(file = %video.display(), "duration verified");
        }
        Ok(videos.len())
    }

    fn compare(&self, src: &MediaProbe, out: &MediaProbe) -> std::result::Result<(), String> {
        let (Some(a), Some(b)) = (src.duration.as_deref(), out.duration.as_deref()) else {
            return Err("duration missing from probe output".into());
        };

        match self.comparison {
            DurationComparison::Exact if a == b => Ok(()),
            DurationComparison::Exact => Err(format!("duration {b} != source {a}")),
            DurationComparison::Tolerance(tolerance) => {
                let sa = src.duration_secs().map_err(|e| e.to_string())?;
                let sb = out.duration_secs().map_err(|e| e.to_string())?;
                if (sa - sb).abs() <= tolerance {
                    Ok(())
                } else {
                    Err(format!(
                        "duration {sb:.3}s differs from source {sa:.3}s by more than {tolerance}s"
                    ))
                }
            }
        }
    }
}
