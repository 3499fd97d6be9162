//! Pipeline executor: runs one resource's chain stage by stage, verifies
//! the renditions and publishes the manifest.
//!
//! Stages run strictly in order and never overlap. A failure at stage *k*
//! halts the run; nothing after it executes and nothing is published.
//! Produced files are left on disk either way.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use lf_core::config::Config;
use lf_core::events::EventPayload;
use lf_core::{Error, ExecutionKind, Resource, ResourceId, Result, RunId, StageInvocation};
use tracing::Instrument;

use crate::chain::ChainBuilder;
use crate::context::RunContext;
use crate::heuristics::DurationHeuristics;
use crate::manifest::{clear_videos, Manifest, ManifestAssembler};
use crate::stage::{Publish, StageSpec};
use crate::verify::{DurationComparison, IntegrityVerifier};
use crate::wait::wait_for_videos;

/// Record of one resource's run.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub run_id: RunId,
    pub resource_id: ResourceId,
    pub kind: ExecutionKind,
    /// Planned stage names, in execution order.
    pub stages: Vec<String>,
    /// Executed stage processes, in order.
    pub invocations: Vec<StageInvocation>,
    /// Number of videos that passed verification.
    pub verified: usize,
    /// Present once publication succeeded; `None` for dry runs.
    pub manifest: Option<Manifest>,
}

pub struct PipelineExecutor {
    ctx: RunContext,
    chain: ChainBuilder,
    verifier: IntegrityVerifier,
    assembler: ManifestAssembler,
    bucket_mount: PathBuf,
    /// Videos the remote handoff must deliver before the run continues.
    min_recordings: usize,
    output_wait: Duration,
    poll_interval: Duration,
}

impl PipelineExecutor {
    pub fn new(config: &Config, ctx: RunContext) -> Self {
        Self {
            chain: ChainBuilder::from_config(config),
            verifier: IntegrityVerifier::new(
                ctx.prober.clone(),
                DurationComparison::from_config(&config.pipeline),
            ),
            assembler: ManifestAssembler::new(
                ctx.content_store.clone(),
                config.pipeline.min_artifacts,
            ),
            bucket_mount: config.storage.bucket_mount.clone(),
            min_recordings: config.pipeline.min_artifacts,
            output_wait: config.pipeline.output_wait_timeout(),
            poll_interval: config.pipeline.output_poll_interval(),
            ctx,
        }
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// Probe the source and build its chain without running anything.
    pub async fn plan(&self, resource: &Resource, kind: ExecutionKind) -> Result<Vec<StageSpec>> {
        let source = resource.paths(&self.bucket_mount).source;
        let probe = self.ctx.prober.probe(&source).await?;
        let heuristics = DurationHeuristics::from_probe(&probe)?;
        self.chain.build(resource, kind, &heuristics)
    }

    /// Build the chain from an already known duration string.
    pub fn plan_with_duration(
        &self,
        resource: &Resource,
        kind: ExecutionKind,
        duration: &str,
    ) -> Result<Vec<StageSpec>> {
        let heuristics = DurationHeuristics::from_raw(duration)?;
        self.chain.build(resource, kind, &heuristics)
    }

    /// Run the whole chain for `resource`.
    pub async fn run(&self, resource: &Resource, kind: ExecutionKind) -> Result<PipelineRun> {
        let run_id = RunId::new();
        let span = tracing::info_span!("run", %run_id, resource = %resource.id, %kind);

        let result = self.run_inner(run_id, resource, kind).instrument(span).await;

        if let Err(e) = &result {
            self.ctx.events.broadcast(EventPayload::RunFailed {
                run_id,
                error: e.to_string(),
            });
        }
        result
    }

    async fn run_inner(
        &self,
        run_id: RunId,
        resource: &Resource,
        kind: ExecutionKind,
    ) -> Result<PipelineRun> {
        let chain = match self.plan(resource, kind).await {
            Ok(chain) => chain,
            // Heuristics parameterise the poster stage, which cannot run.
            Err(e @ Error::Heuristic(_)) => return Err(self.report("generatePoster", e)),
            Err(e) => return Err(self.report("plan", e)),
        };

        self.ctx.events.broadcast(EventPayload::RunStarted {
            run_id,
            resource_id: resource.id.clone(),
            kind,
            stages: chain.len(),
        });
        tracing::info!(stages = chain.len(), dry_run = self.ctx.dry_run, "run started");

        let mut run = PipelineRun {
            run_id,
            resource_id: resource.id.clone(),
            kind,
            stages: chain.iter().map(StageSpec::name).collect(),
            invocations: Vec::new(),
            verified: 0,
            manifest: None,
        };

        if !self.ctx.dry_run {
            let output_dir = resource.paths(&self.bucket_mount).output_dir;
            tokio::fs::create_dir_all(&output_dir)
                .await
                .map_err(|e| self.report("prepare", e.into()))?;
            // Renditions from an earlier attempt would be published again.
            let removed = clear_videos(&output_dir).map_err(|e| self.report("prepare", e))?;
            if removed > 0 {
                tracing::info!(removed, "cleared previous renditions");
            }
        }

        for (index, stage) in chain.iter().enumerate() {
            if self.ctx.cancellation.is_cancelled() {
                tracing::info!("Pipeline cancelled");
                return Err(Error::pipeline("executor", "cancelled"));
            }

            self.ctx.events.broadcast(EventPayload::StageStarted {
                run_id,
                stage: stage.name(),
                index,
            });
            tracing::info!("Starting: {stage}");
            let started = Instant::now();

            match stage {
                StageSpec::Publish(publish) => self.publish(run_id, publish, &mut run).await?,
                _ => self.execute_stage(stage, &mut run).await?,
            }

            let elapsed_ms = started.elapsed().as_millis() as i64;
            self.ctx.events.broadcast(EventPayload::StageFinished {
                run_id,
                stage: stage.name(),
                elapsed_ms,
                outcome: if self.ctx.dry_run { "skipped" } else { "success" }.into(),
            });
            tracing::info!(
                "[{}/{}] Completed: {} ({elapsed_ms} ms)",
                index + 1,
                chain.len(),
                stage.name()
            );
        }

        if let Some(manifest) = &run.manifest {
            self.ctx.events.broadcast(EventPayload::RunCompleted {
                run_id,
                content_id: manifest.content_id.clone(),
                artifacts: manifest.artifacts.len(),
            });
        }
        tracing::info!("run completed");
        Ok(run)
    }

    /// Run one external stage and confirm its declared output exists.
    async fn execute_stage(&self, stage: &StageSpec, run: &mut PipelineRun) -> Result<()> {
        let name = stage.name();
        let Some(request) = stage.request(&self.ctx.tools) else {
            return Ok(());
        };

        if self.ctx.dry_run {
            tracing::info!(stage = %name, "dry run: {}", request.command_line());
            return Ok(());
        }

        let invocation = self.ctx.runner.run(&request).await;
        let elapsed_ms = invocation.elapsed_ms();
        let failure = invocation.error();
        let outcome = invocation.outcome.label();
        run.invocations.push(invocation);
        if let Some(e) = failure {
            // Already reported by the runner.
            self.stage_failed(run.run_id, &name, elapsed_ms, outcome);
            return Err(e);
        }

        let started = Instant::now();
        let output = stage.output();
        let checked = if let StageSpec::RemoteRenditionHandoff(_) = stage {
            wait_for_videos(
                output,
                self.min_recordings,
                self.output_wait,
                self.poll_interval,
                &self.ctx.cancellation,
            )
            .await
            .map_err(|e| {
                let outcome = match e {
                    Error::Timeout { .. } => "timeout",
                    _ => "cancelled",
                };
                (e, outcome)
            })
        } else if tokio::fs::try_exists(output).await.unwrap_or(false) {
            Ok(())
        } else {
            let e = Error::pipeline(&name, format!("output missing: {}", output.display()));
            Err((e, "output_missing"))
        };

        if let Err((e, outcome)) = checked {
            let elapsed_ms = elapsed_ms + started.elapsed().as_millis() as i64;
            self.stage_failed(run.run_id, &name, elapsed_ms, outcome);
            return Err(self.report(&name, e));
        }
        Ok(())
    }

    fn stage_failed(&self, run_id: RunId, stage: &str, elapsed_ms: i64, outcome: &str) {
        self.ctx.events.broadcast(EventPayload::StageFinished {
            run_id,
            stage: stage.to_string(),
            elapsed_ms,
            outcome: outcome.into(),
        });
    }

    /// Verify every produced video, then assemble and store the manifest.
    async fn publish(&self, run_id: RunId, publish: &Publish, run: &mut PipelineRun) -> Result<()> {
        if self.ctx.dry_run {
            tracing::info!(
                output_dir = %publish.output_dir.display(),
                "dry run: would verify against {} and publish",
                publish.master.display()
            );
            return Ok(());
        }

        match self
            .verifier
            .check_directory(&publish.master, &publish.output_dir)
            .await
        {
            Ok(checked) => {
                self.ctx.events.broadcast(EventPayload::VerificationFinished {
                    run_id,
                    checked,
                    passed: true,
                });
                run.verified = checked;
            }
            Err(e) => {
                self.ctx.events.broadcast(EventPayload::VerificationFinished {
                    run_id,
                    checked: 0,
                    passed: false,
                });
                return Err(self.report("verify", e));
            }
        }

        let manifest = self
            .assembler
            .assemble(&publish.output_dir, &publish.resource_id)
            .await
            .map_err(|e| self.report("publish", e))?;
        self.ctx
            .manifests
            .save(&manifest)
            .await
            .map_err(|e| self.report("publish", e))?;

        run.manifest = Some(manifest);
        Ok(())
    }

    fn report(&self, context: &str, error: Error) -> Error {
        self.ctx.sink.report(context, &error);
        error
    }
}
