//! Rendition ladder policy.
//!
//! The ladder is fixed policy, not computed: every tier pins CRF 20, a
//! 48-frame GOP, an even-width scale to its target height, and drops audio.
//! Tiers above 240p additionally cap the rate at the target bitrate with a
//! buffer of twice that.

use lf_av::actions::EncodeParams;
use lf_core::{ExecutionKind, ResourceId};
use serde::Serialize;

/// Constant rate factor used by every tier.
pub const CRF: u8 = 20;
/// GOP length (and minimum keyframe interval) used by every tier.
pub const GOP_SIZE: u32 = 48;

/// One row of the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenditionTier {
    pub name: &'static str,
    pub target_height: u32,
    pub video_bitrate_kbps: u32,
    pub max_bitrate_kbps: Option<u32>,
    pub buffer_size_kbps: Option<u32>,
    pub gop_size: u32,
    /// Suffix of the produced file; strictly increasing along the ladder.
    pub output_index: u32,
}

const fn uncapped(name: &'static str, height: u32, kbps: u32, index: u32) -> RenditionTier {
    RenditionTier {
        name,
        target_height: height,
        video_bitrate_kbps: kbps,
        max_bitrate_kbps: None,
        buffer_size_kbps: None,
        gop_size: GOP_SIZE,
        output_index: index,
    }
}

const fn capped(name: &'static str, height: u32, kbps: u32, index: u32) -> RenditionTier {
    RenditionTier {
        name,
        target_height: height,
        video_bitrate_kbps: kbps,
        max_bitrate_kbps: Some(kbps),
        buffer_size_kbps: Some(kbps * 2),
        gop_size: GOP_SIZE,
        output_index: index,
    }
}

/// Low-latency preview pair, run ahead of the ladder when enabled.
pub const PREVIEW_TIERS: [RenditionTier; 2] = [
    uncapped("90p", 90, 100, 1),
    uncapped("144p", 144, 300, 2),
];

/// The full ladder, ascending.
pub const LADDER: [RenditionTier; 5] = [
    uncapped("240p", 240, 120, 3),
    capped("360p", 360, 284, 4),
    capped("480p", 480, 341, 5),
    capped("720p", 720, 765, 6),
    capped("1080p", 1080, 1579, 7),
];

impl RenditionTier {
    pub fn encode_params(&self) -> EncodeParams {
        EncodeParams {
            height: self.target_height,
            bitrate_kbps: self.video_bitrate_kbps,
            max_bitrate_kbps: self.max_bitrate_kbps,
            buffer_size_kbps: self.buffer_size_kbps,
            gop_size: self.gop_size,
            crf: CRF,
        }
    }

    /// `{resourceId}_v{outputIndex}.mp4`
    pub fn output_name(&self, id: &ResourceId) -> String {
        format!("{id}_v{}.mp4", self.output_index)
    }
}

/// Selects which tiers run for an execution kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct LadderPolicy {
    pub preview: bool,
}

impl LadderPolicy {
    pub fn new(preview: bool) -> Self {
        Self { preview }
    }

    /// Tiers in ascending `output_index` order.
    ///
    /// Remote execution gets none: the remote service applies its own
    /// ladder from a profile file.
    pub fn tiers_for(&self, kind: ExecutionKind) -> Vec<RenditionTier> {
        match kind {
            ExecutionKind::Remote => Vec::new(),
            ExecutionKind::Local => {
                let mut tiers = Vec::with_capacity(PREVIEW_TIERS.len() + LADDER.len());
                if self.preview {
                    tiers.extend_from_slice(&PREVIEW_TIERS);
                }
                tiers.extend_from_slice(&LADDER);
                tiers
            }
        }
    }
}
