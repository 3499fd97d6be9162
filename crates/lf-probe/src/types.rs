//! Core types for media probe results.

use std::path::PathBuf;

use lf_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Container and stream metadata for one file.
///
/// Derived fresh on every probe and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaProbe {
    /// Path to the probed file.
    pub file_path: PathBuf,
    /// Container duration in seconds, exactly as the tool printed it.
    pub duration: Option<String>,
    /// Container format name (e.g. `mov,mp4,m4a,3gp,3g2,mj2`).
    pub format_name: String,
    /// Number of streams the container declares.
    pub stream_count: u32,
    /// Per-stream details; attributes the tool omitted stay `None`.
    pub streams: Vec<StreamProbe>,
}

impl MediaProbe {
    /// The container duration as a decimal number of seconds.
    ///
    /// Fails with [`Error::Heuristic`] when the tool reported no duration or
    /// one that does not parse as a decimal.
    pub fn duration_secs(&self) -> Result<f64> {
        match self.duration.as_deref() {
            Some(raw) => parse_duration(raw),
            None => Err(Error::Heuristic(format!(
                "no duration reported for {}",
                self.file_path.display()
            ))),
        }
    }

    /// Streams whose `codec_type` is `video`.
    pub fn video_streams(&self) -> impl Iterator<Item = &StreamProbe> {
        self.streams
            .iter()
            .filter(|s| s.codec_type.as_deref() == Some("video"))
    }

    pub fn has_audio(&self) -> bool {
        self.streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some("audio"))
    }
}

/// One stream of a probed container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamProbe {
    /// `video`, `audio`, `subtitle`, `data`...
    pub codec_type: Option<String>,
    pub codec_name: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Stream duration as printed by the tool.
    pub duration: Option<String>,
}

/// Parse a duration string such as `"12.400000"` into seconds.
pub fn parse_duration(raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => Ok(secs),
        _ => Err(Error::Heuristic(format!(
            "duration '{raw}' is not a non-negative decimal"
        ))),
    }
}
