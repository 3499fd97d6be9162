//! The command stage executor.
//!
//! A [`StageRunner`] runs one [`StageRequest`] to completion and classifies
//! the outcome into a [`StageInvocation`]. Failures are reported to the
//! configured [`ErrorSink`] before the invocation is handed back; nothing
//! is retried here.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use lf_core::{ErrorSink, StageInvocation, StageOutcome, TracingErrorSink};

use crate::command::ToolCommand;

/// A fully resolved external command for one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRequest {
    pub stage_name: String,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

impl StageRequest {
    /// Program followed by its arguments.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.program.to_string_lossy().into_owned());
        argv.extend(self.args.iter().cloned());
        argv
    }

    /// Shell-like rendering for logs and plans.
    pub fn command_line(&self) -> String {
        self.argv().join(" ")
    }

    fn to_command(&self) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.program.clone());
        cmd.args(self.args.iter().cloned());
        cmd
    }
}

/// Executes stage commands.
///
/// Implementations wait for the process to exit; stages of one run are
/// never overlapped by the caller.
#[async_trait]
pub trait StageRunner: Send + Sync {
    async fn run(&self, request: &StageRequest) -> StageInvocation;
}

/// [`StageRunner`] that spawns real processes.
#[derive(Clone)]
pub struct ProcessStageRunner {
    sink: Arc<dyn ErrorSink>,
}

impl ProcessStageRunner {
    pub fn new(sink: Arc<dyn ErrorSink>) -> Self {
        Self { sink }
    }
}

impl Default for ProcessStageRunner {
    fn default() -> Self {
        Self::new(Arc::new(TracingErrorSink))
    }
}

impl std::fmt::Debug for ProcessStageRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessStageRunner").finish_non_exhaustive()
    }
}

#[async_trait]
impl StageRunner for ProcessStageRunner {
    async fn run(&self, request: &StageRequest) -> StageInvocation {
        tracing::debug!(stage = %request.stage_name, "exec: {}", request.command_line());

        let started_at = Utc::now();
        let (outcome, output) = match request.to_command().run_merged().await {
            Ok(merged) if merged.status.success() => (StageOutcome::Success, merged.output),
            Ok(merged) => (
                StageOutcome::NonZeroExit {
                    code: merged.status.code(),
                },
                merged.output,
            ),
            Err(e) => (
                StageOutcome::SpawnFailure {
                    message: e.to_string(),
                },
                String::new(),
            ),
        };
        let finished_at = Utc::now();

        let invocation = StageInvocation {
            stage_name: request.stage_name.clone(),
            input_path: request.input_path.clone(),
            output_path: request.output_path.clone(),
            argv: request.argv(),
            started_at,
            finished_at,
            outcome,
            output,
        };

        if let Some(err) = invocation.error() {
            self.sink.report(&request.stage_name, &err);
        }

        invocation
    }
}
