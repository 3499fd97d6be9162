//! Records of external-process stage executions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::Error;

/// Classification of one stage process run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageOutcome {
    /// The process started and exited with status zero.
    Success,
    /// The process could not be started.
    SpawnFailure { message: String },
    /// The process started but exited unsuccessfully.
    NonZeroExit { code: Option<i32> },
}

impl StageOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Short label used in logs and events.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::SpawnFailure { .. } => "spawn_failure",
            Self::NonZeroExit { .. } => "non_zero_exit",
        }
    }
}

/// One external command execution, terminal once the process has exited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageInvocation {
    pub stage_name: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Program followed by its arguments.
    pub argv: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: StageOutcome,
    /// Merged stdout/stderr, kept for diagnostics.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output: String,
}

/// Lines of captured output carried into error messages.
const ERROR_TAIL_LINES: usize = 20;

impl StageInvocation {
    /// Wall-clock time between spawn and exit, in milliseconds.
    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    /// Convert a failed outcome into the matching [`Error`] variant.
    ///
    /// Returns `None` for successful invocations.
    pub fn error(&self) -> Option<Error> {
        match &self.outcome {
            StageOutcome::Success => None,
            StageOutcome::SpawnFailure { message } => Some(Error::SpawnFailure {
                stage: self.stage_name.clone(),
                message: message.clone(),
            }),
            StageOutcome::NonZeroExit { code } => Some(Error::NonZeroExit {
                stage: self.stage_name.clone(),
                code: *code,
                output: self.output_tail(ERROR_TAIL_LINES),
            }),
        }
    }

    /// The last `lines` lines of captured output.
    pub fn output_tail(&self, lines: usize) -> String {
        let all: Vec<&str> = self.output.lines().collect();
        let start = all.len().saturating_sub(lines);
        all[start..].join("\n")
    }
}
