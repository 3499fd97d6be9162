//! Duration-driven choices for the poster and sprite stages.

use lf_core::Result;
use lf_probe::{parse_duration, MediaProbe};

/// Assets shorter than this take their poster from the first second.
const SHORT_ASSET_SECS: f64 = 5.0;

/// Seek position for the poster frame.
pub fn poster_timestamp(duration_secs: f64) -> &'static str {
    if duration_secs < SHORT_ASSET_SECS {
        "00:00:01"
    } else {
        "00:00:05"
    }
}

/// Column count of the thumbnail sprite.
///
/// `floor(d) / 5 / 2`, truncating at every division.
pub fn sprite_column_count(duration_secs: f64) -> i64 {
    let whole = duration_secs.floor() as i64;
    whole / 5 / 2
}

/// Heuristic results for one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurationHeuristics {
    pub poster_timestamp: String,
    pub sprite_columns: i64,
}

impl DurationHeuristics {
    /// Derive from a raw duration string; a non-decimal is a heuristic error.
    pub fn from_raw(raw: &str) -> Result<Self> {
        let secs = parse_duration(raw)?;
        Ok(Self::from_secs(secs))
    }

    pub fn from_secs(secs: f64) -> Self {
        Self {
            poster_timestamp: poster_timestamp(secs).to_string(),
            sprite_columns: sprite_column_count(secs),
        }
    }

    pub fn from_probe(probe: &MediaProbe) -> Result<Self> {
        probe.duration_secs().map(Self::from_secs)
    }
}
