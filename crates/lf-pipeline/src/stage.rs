//! Typed stage specifications.
//!
//! Each variant carries its own argument struct with explicit input and
//! output paths, resolved once when the chain is built.

use std::fmt;
use std::path::{Path, PathBuf};

use lf_av::actions::{
    ConvertSubtitles, EncodeRendition, ExtractAudio, PosterFrame, RemoteHandoff, RemoveAudio,
    ThumbnailSprite, ToolAction, WebpPoster,
};
use lf_av::{StageRequest, ToolRegistry};
use lf_core::ResourceId;

use crate::ladder::RenditionTier;

/// Terminal stage: verify, assemble and store the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publish {
    pub output_dir: PathBuf,
    pub resource_id: ResourceId,
    /// Master every produced video is verified against.
    pub master: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageSpec {
    RemoveAudio(RemoveAudio),
    ExtractAudio(ExtractAudio),
    GeneratePoster(PosterFrame),
    GenerateWebpPoster(WebpPoster),
    GenerateThumbnailSprite(ThumbnailSprite),
    ConvertSubtitles(ConvertSubtitles),
    EncodeRendition {
        tier: RenditionTier,
        encode: EncodeRendition,
    },
    RemoteRenditionHandoff(RemoteHandoff),
    Publish(Publish),
}

impl StageSpec {
    /// Stable stage name used in logs, events and error reports.
    pub fn name(&self) -> String {
        match self {
            Self::RemoveAudio(_) => "removeAudio".into(),
            Self::ExtractAudio(_) => "extractAudio".into(),
            Self::GeneratePoster(_) => "generatePoster".into(),
            Self::GenerateWebpPoster(_) => "generateWebpPoster".into(),
            Self::GenerateThumbnailSprite(_) => "generateThumbnailSprite".into(),
            Self::ConvertSubtitles(_) => "convertSubtitles".into(),
            Self::EncodeRendition { tier, .. } => format!("encode:{}", tier.name),
            Self::RemoteRenditionHandoff(_) => "remoteRenditionHandoff".into(),
            Self::Publish(_) => "publish".into(),
        }
    }

    /// The external command behind this stage, if it has one.
    pub fn action(&self) -> Option<&dyn ToolAction> {
        match self {
            Self::RemoveAudio(a) => Some(a),
            Self::ExtractAudio(a) => Some(a),
            Self::GeneratePoster(a) => Some(a),
            Self::GenerateWebpPoster(a) => Some(a),
            Self::GenerateThumbnailSprite(a) => Some(a),
            Self::ConvertSubtitles(a) => Some(a),
            Self::EncodeRendition { encode, .. } => Some(encode),
            Self::RemoteRenditionHandoff(a) => Some(a),
            Self::Publish(_) => None,
        }
    }

    pub fn request(&self, tools: &ToolRegistry) -> Option<StageRequest> {
        self.action().map(|a| a.request(&self.name(), tools))
    }

    pub fn input(&self) -> &Path {
        match self {
            Self::Publish(p) => &p.master,
            other => other.action().map(|a| a.input()).unwrap_or(Path::new("")),
        }
    }

    pub fn output(&self) -> &Path {
        match self {
            Self::Publish(p) => &p.output_dir,
            other => other.action().map(|a| a.output()).unwrap_or(Path::new("")),
        }
    }

    /// Whether this stage produces a ladder rendition.
    pub fn is_rendition(&self) -> bool {
        matches!(
            self,
            Self::EncodeRendition { .. } | Self::RemoteRenditionHandoff(_)
        )
    }
}

impl fmt::Display for StageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GeneratePoster(p) => write!(f, "{}@{}", self.name(), p.timestamp),
            Self::GenerateThumbnailSprite(s) => {
                write!(f, "{}(columns={})", self.name(), s.columns)
            }
            _ => write!(f, "{}", self.name()),
        }
    }
}
