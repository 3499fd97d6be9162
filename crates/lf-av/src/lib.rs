//! # lf-av
//!
//! External tool plumbing for the ladderforge pipeline.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache paths to ffmpeg,
//!   ffprobe, thumbsgenerator and livepeer.
//! - **Command execution** ([`ToolCommand`]) -- async builder for helper
//!   invocations with a timeout, and for stage invocations with merged
//!   output capture.
//! - **Probe backend** ([`FfprobeProber`]) -- implements [`lf_probe::Prober`]
//!   by shelling out to ffprobe.
//! - **Stage actions** ([`actions`]) -- argument builders for every stage
//!   command.
//! - **Stage execution** ([`ProcessStageRunner`]) -- runs a stage, classifies
//!   its outcome and reports failures.

pub mod actions;
pub mod command;
pub mod probe;
pub mod runner;
pub mod tools;

// ---- Re-exports for convenience ----

pub use actions::ToolAction;
pub use command::{MergedOutput, ToolCommand, ToolOutput};
pub use probe::FfprobeProber;
pub use runner::{ProcessStageRunner, StageRequest, StageRunner};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};
