//! Pipeline chain builder.
//!
//! Turns a [`Resource`] and an [`ExecutionKind`] into the ordered list of
//! [`StageSpec`]s one run executes. Building does not start anything.
//!
//! Stage order for a local run:
//!
//! ```text
//! removeAudio -> extractAudio -> generatePoster -> [generateWebpPoster]
//!   -> [generateThumbnailSprite] -> [convertSubtitles]
//!   -> encode tiers (ascending output index) -> publish
//! ```
//!
//! A remote run replaces the encode tiers with a single
//! `remoteRenditionHandoff`. Every stage after `removeAudio` reads the
//! audio-stripped master it produced.

use std::path::PathBuf;

use lf_av::actions::{
    ConvertSubtitles, EncodeRendition, ExtractAudio, HandoffAddressing, PosterFrame,
    RemoteHandoff, RemoveAudio, ThumbnailSprite, WebpPoster,
};
use lf_core::config::{Config, RemoteConfig, RemoteMode};
use lf_core::{Error, ExecutionKind, Resource, Result};

use crate::heuristics::DurationHeuristics;
use crate::ladder::LadderPolicy;
use crate::stage::{Publish, StageSpec};

/// Poster frame file name inside the output directory.
pub const POSTER_FILE: &str = "poster.jpg";
/// Animated poster file name inside the output directory.
pub const WEBP_POSTER_FILE: &str = "poster.webp";
/// Sprite sheet file name inside the output directory.
pub const SPRITE_FILE: &str = "thumbspreview.png";

/// Optional stages and remote addressing.
#[derive(Debug, Clone)]
pub struct ChainOptions {
    pub preview_tier: bool,
    pub thumbs_preview: bool,
    pub webp_poster: bool,
    pub subtitles: bool,
    pub remote: RemoteConfig,
}

impl Default for ChainOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ChainOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            preview_tier: config.pipeline.preview_tier,
            thumbs_preview: config.pipeline.thumbs_preview,
            webp_poster: config.pipeline.webp_poster,
            subtitles: config.pipeline.subtitles,
            remote: config.remote.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChainBuilder {
    bucket_mount: PathBuf,
    options: ChainOptions,
}

impl ChainBuilder {
    pub fn new(bucket_mount: impl Into<PathBuf>, options: ChainOptions) -> Self {
        Self {
            bucket_mount: bucket_mount.into(),
            options,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.storage.bucket_mount.clone(),
            ChainOptions::from_config(config),
        )
    }

    /// Build the stage sequence for `resource`.
    ///
    /// `heuristics` come from probing the source; poster and sprite stages
    /// are parameterised by them.
    pub fn build(
        &self,
        resource: &Resource,
        kind: ExecutionKind,
        heuristics: &DurationHeuristics,
    ) -> Result<Vec<StageSpec>> {
        let paths = resource.paths(&self.bucket_mount);
        let master = paths.master.clone();
        let id = &resource.id;

        let mut chain = vec![
            StageSpec::RemoveAudio(RemoveAudio {
                input: paths.source.clone(),
                output: master.clone(),
            }),
            StageSpec::ExtractAudio(ExtractAudio {
                input: master.clone(),
                output: paths.output_file(&format!("{id}_a1.m4a")),
            }),
            StageSpec::GeneratePoster(PosterFrame {
                input: master.clone(),
                output: paths.output_file(POSTER_FILE),
                timestamp: heuristics.poster_timestamp.clone(),
            }),
        ];

        if self.options.webp_poster {
            chain.push(StageSpec::GenerateWebpPoster(WebpPoster {
                input: master.clone(),
                output: paths.output_file(WEBP_POSTER_FILE),
                duration: heuristics.poster_timestamp.clone(),
            }));
        }

        if self.options.thumbs_preview {
            chain.push(StageSpec::GenerateThumbnailSprite(ThumbnailSprite {
                input: master.clone(),
                output: paths.output_file(SPRITE_FILE),
                columns: heuristics.sprite_columns,
            }));
        }

        if self.options.subtitles {
            if let Some(subtitle) = &resource.subtitle {
                chain.push(StageSpec::ConvertSubtitles(ConvertSubtitles {
                    input: subtitle.clone(),
                    output: paths.output_file(&format!("{id}_{}.vtt", resource.language)),
                }));
            }
        }

        match kind {
            ExecutionKind::Local => {
                let policy = LadderPolicy::new(self.options.preview_tier);
                for tier in policy.tiers_for(kind) {
                    chain.push(StageSpec::EncodeRendition {
                        tier,
                        encode: EncodeRendition {
                            input: master.clone(),
                            output: paths.output_file(&tier.output_name(id)),
                            params: tier.encode_params(),
                        },
                    });
                }
            }
            ExecutionKind::Remote => {
                chain.push(StageSpec::RemoteRenditionHandoff(RemoteHandoff {
                    input: master.clone(),
                    recording_dir: paths.output_dir.clone(),
                    profile: self.options.remote.profile.clone(),
                    addressing: self.addressing()?,
                    stream_name: id.to_string(),
                }));
            }
        }

        chain.push(StageSpec::Publish(Publish {
            output_dir: paths.output_dir,
            resource_id: id.clone(),
            master,
        }));

        tracing::debug!(
            resource = %id,
            %kind,
            stages = chain.len(),
            "chain built"
        );
        Ok(chain)
    }

    fn addressing(&self) -> Result<HandoffAddressing> {
        let remote = &self.options.remote;
        match remote.mode {
            RemoteMode::Local => remote
                .orchestrator_addr
                .clone()
                .map(HandoffAddressing::Orchestrator)
                .ok_or_else(|| {
                    Error::Validation("remote.orchestrator_addr is required in local mode".into())
                }),
            RemoteMode::Remote => remote
                .webhook_url
                .clone()
                .map(|url| HandoffAddressing::Webhook {
                    url,
                    api_key: remote.api_key.clone(),
                })
                .ok_or_else(|| {
                    Error::Validation("remote.webhook_url is required in remote mode".into())
                }),
        }
    }
}
