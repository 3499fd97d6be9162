//! # lf-pipeline
//!
//! Orchestration of one resource's transcoding run.
//!
//! This crate provides:
//!
//! - **[`ChainBuilder`]** -- turns a resource and execution kind into the
//!   ordered [`StageSpec`] list (audio split, posters, sprite, subtitles,
//!   rendition ladder or remote handoff, publish).
//! - **[`LadderPolicy`]** -- the fixed rendition ladder and its tiers.
//! - **[`DurationHeuristics`]** -- poster timestamp and sprite column count
//!   from the probed duration.
//! - **[`IntegrityVerifier`]** -- duration comparison between the master and
//!   every produced rendition.
//! - **[`ManifestAssembler`]** -- renames, hashes and lists the output
//!   directory; [`ManifestStore`] persists the result.
//! - **[`PipelineExecutor`]** -- runs the chain stage by stage, halting on the
//!   first failure.

pub mod chain;
pub mod content;
pub mod context;
pub mod executor;
pub mod heuristics;
pub mod ladder;
pub mod manifest;
pub mod stage;
pub mod store;
pub mod verify;
pub mod wait;

// Re-export key types at the crate root.
pub use chain::{ChainBuilder, ChainOptions};
pub use content::{ContentStore, Sha256ContentStore};
pub use context::RunContext;
pub use executor::{PipelineExecutor, PipelineRun};
pub use heuristics::DurationHeuristics;
pub use ladder::{LadderPolicy, RenditionTier, LADDER, PREVIEW_TIERS};
pub use manifest::{Artifact, Manifest, ManifestAssembler};
pub use stage::{Publish, StageSpec};
pub use store::{JsonManifestStore, ManifestStore, MemoryManifestStore};
pub use verify::{DurationComparison, IntegrityVerifier};
pub use wait::{wait_for_directory, wait_for_videos};
