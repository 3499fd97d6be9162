//! Collaborators shared by every run an executor performs.

use std::sync::Arc;

use lf_av::{ProcessStageRunner, StageRunner, ToolRegistry};
use lf_core::events::EventBus;
use lf_core::{ErrorSink, TracingErrorSink};
use lf_probe::Prober;
use tokio_util::sync::CancellationToken;

use crate::content::{ContentStore, Sha256ContentStore};
use crate::store::{ManifestStore, MemoryManifestStore};

/// Context handed to the [`PipelineExecutor`](crate::PipelineExecutor).
///
/// Everything is reference counted so one context can back many concurrent
/// runs; no field holds per-run state.
#[derive(Clone)]
pub struct RunContext {
    /// Tool registry for resolving external program paths.
    pub tools: Arc<ToolRegistry>,
    /// Probe adapter used for heuristics and verification.
    pub prober: Arc<dyn Prober>,
    /// Executes stage commands.
    pub runner: Arc<dyn StageRunner>,
    /// Receives every failure before it is returned.
    pub sink: Arc<dyn ErrorSink>,
    /// Run and stage lifecycle events.
    pub events: Arc<EventBus>,
    pub content_store: Arc<dyn ContentStore>,
    pub manifests: Arc<dyn ManifestStore>,
    /// When `true`, stages are planned and logged but not spawned.
    pub dry_run: bool,
    /// Checked between stages; a running process is never interrupted.
    pub cancellation: CancellationToken,
}

impl RunContext {
    /// Create a context with process-backed stages, tracing error reports,
    /// SHA-256 content addressing and in-memory manifests.
    pub fn new(tools: Arc<ToolRegistry>, prober: Arc<dyn Prober>) -> Self {
        let sink: Arc<dyn ErrorSink> = Arc::new(TracingErrorSink);
        Self {
            tools,
            prober,
            runner: Arc::new(ProcessStageRunner::new(sink.clone())),
            sink,
            events: Arc::new(EventBus::default()),
            content_store: Arc::new(Sha256ContentStore),
            manifests: Arc::new(MemoryManifestStore::new()),
            dry_run: false,
            cancellation: CancellationToken::new(),
        }
    }

    /// Builder: replace the stage runner.
    pub fn with_runner(mut self, runner: Arc<dyn StageRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Builder: replace the error sink.
    ///
    /// The stage runner is not rebuilt; pass a runner wired to the same
    /// sink through [`with_runner`](Self::with_runner) when both matter.
    pub fn with_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }

    pub fn with_content_store(mut self, store: Arc<dyn ContentStore>) -> Self {
        self.content_store = store;
        self
    }

    pub fn with_manifest_store(mut self, store: Arc<dyn ManifestStore>) -> Self {
        self.manifests = store;
        self
    }

    /// Builder: set dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Builder: attach a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("prober", &self.prober.name())
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}
