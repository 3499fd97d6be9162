//! Unified error type for the ladderforge pipeline.
//!
//! All crates funnel their failures into [`Error`]. The stage-level variants
//! ([`Error::SpawnFailure`], [`Error::NonZeroExit`]) mirror the outcome
//! classification of a single external-process invocation; the remaining
//! variants cover probing, heuristics, verification, and publication.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Unified error type covering all failure modes in ladderforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "manifest").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// Configuration or request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// (De)serialization of a persisted record failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An external tool could not be located or returned an error outside of
    /// a pipeline stage (version checks, probing).
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// The inspection tool was unavailable or produced undecodable output.
    #[error("Probe error: {0}")]
    Probe(String),

    /// A stage process could not be started (binary missing, permission denied).
    #[error("Stage [{stage}] failed to spawn: {message}")]
    SpawnFailure {
        /// Name of the stage whose process could not start.
        stage: String,
        /// Human-readable error description.
        message: String,
    },

    /// A stage process started but exited with a non-zero status.
    #[error("Stage [{stage}] exited with {}: {output}", format_code(.code))]
    NonZeroExit {
        /// Name of the stage that failed.
        stage: String,
        /// Exit code, when the process was not terminated by a signal.
        code: Option<i32>,
        /// Tail of the merged stdout/stderr stream.
        output: String,
    },

    /// A probed duration could not be interpreted as a decimal.
    #[error("Heuristic error: {0}")]
    Heuristic(String),

    /// Too few video artifacts exist to publish the output directory.
    #[error("Manifest incomplete: found {found} video files, need at least {required}")]
    ManifestIncomplete {
        /// Number of video files present.
        found: usize,
        /// Minimum number required before publication.
        required: usize,
    },

    /// A produced rendition does not match its source duration, or either
    /// side could not be probed.
    #[error("Verification failed for {} against {}: {reason}", .output_path.display(), .source_path.display())]
    VerificationFailed {
        /// The file the rendition was derived from.
        source_path: PathBuf,
        /// The produced rendition.
        output_path: PathBuf,
        /// Why verification failed.
        reason: String,
    },

    /// A bounded wait expired.
    #[error("Timed out after {after:?} waiting for {what}")]
    Timeout {
        /// What was being waited on.
        what: String,
        /// The configured limit.
        after: Duration,
    },

    /// A pipeline step failed for a reason other than its process outcome.
    #[error("Pipeline error [{step}]: {message}")]
    Pipeline {
        /// The pipeline step that failed.
        step: String,
        /// Human-readable error description.
        message: String,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn format_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "signal".to_string(),
    }
}

impl Error {
    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Pipeline`].
    pub fn pipeline(step: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Pipeline {
            step: step.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::VerificationFailed`].
    pub fn verification(
        source_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        reason: impl Into<String>,
    ) -> Self {
        Error::VerificationFailed {
            source_path: source_path.into(),
            output_path: output_path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error came from a stage process outcome.
    pub fn is_stage_failure(&self) -> bool {
        matches!(self, Error::SpawnFailure { .. } | Error::NonZeroExit { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Serialization(error.to_string())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
