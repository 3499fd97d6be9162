//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which lays out a bucket in a temp directory and
//! builds a [`RunContext`] whose prober and stage runner are fakes: the
//! runner writes each stage's declared output instead of spawning a tool,
//! and the prober reads durations back from file contents.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lf_av::{StageRequest, StageRunner, ToolRegistry};
use lf_core::config::Config;
use lf_core::events::EventBus;
use lf_core::{Error, ErrorSink, Resource, Result, StageInvocation, StageOutcome};
use lf_pipeline::{MemoryManifestStore, PipelineExecutor, RunContext};
use lf_probe::{MediaProbe, Prober};
use parking_lot::Mutex;

/// Duration every fake file reports unless its body says otherwise.
pub const SOURCE_DURATION: &str = "12.400000";

/// Prober that reads `duration=<value>` from a file body, defaulting to
/// [`SOURCE_DURATION`]. Missing files fail like a real probe would.
pub struct FakeProber;

#[async_trait]
impl Prober for FakeProber {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn probe(&self, path: &Path) -> Result<MediaProbe> {
        let body = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Probe(format!("{}: {e}", path.display())))?;
        let duration = body
            .strip_prefix("duration=")
            .map(|d| d.trim().to_string())
            .unwrap_or_else(|| SOURCE_DURATION.to_string());
        Ok(MediaProbe {
            file_path: path.to_path_buf(),
            duration: Some(duration),
            format_name: "mov,mp4,m4a,3gp,3g2,mj2".into(),
            stream_count: 1,
            streams: vec![],
        })
    }
}

/// Stage runner that materialises outputs.
#[derive(Default)]
pub struct FakeRunner {
    pub seen: Mutex<Vec<StageRequest>>,
    /// Stage name that exits non-zero.
    pub fail_on: Option<String>,
    /// Stage name whose output gets a different duration.
    pub drift_on: Option<String>,
    /// Simulated work per stage.
    pub delay: Duration,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeRunner {
    pub fn failing_on(stage: &str) -> Self {
        Self {
            fail_on: Some(stage.into()),
            ..Default::default()
        }
    }

    pub fn drifting_on(stage: &str) -> Self {
        Self {
            drift_on: Some(stage.into()),
            ..Default::default()
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    pub fn stage_names(&self) -> Vec<String> {
        self.seen.lock().iter().map(|r| r.stage_name.clone()).collect()
    }

    fn materialise(&self, request: &StageRequest) {
        let name = request.stage_name.as_str();
        if name == "remoteRenditionHandoff" {
            std::fs::create_dir_all(&request.output_path).unwrap();
            for i in 0..5 {
                let file = request.output_path.join(format!("{}_rec{i}.mp4", request.stage_name));
                std::fs::write(file, format!("recording {i}")).unwrap();
            }
            return;
        }
        let body = if self.drift_on.as_deref() == Some(name) {
            "duration=2.000000".to_string()
        } else {
            format!("{name} from {}", request.input_path.display())
        };
        std::fs::write(&request.output_path, body).unwrap();
    }
}

#[async_trait]
impl StageRunner for FakeRunner {
    async fn run(&self, request: &StageRequest) -> StageInvocation {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.seen.lock().push(request.clone());

        let started_at = chrono::Utc::now();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let outcome = if self.fail_on.as_deref() == Some(request.stage_name.as_str()) {
            StageOutcome::NonZeroExit { code: Some(1) }
        } else {
            self.materialise(request);
            StageOutcome::Success
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        StageInvocation {
            stage_name: request.stage_name.clone(),
            input_path: request.input_path.clone(),
            output_path: request.output_path.clone(),
            argv: request.argv(),
            started_at,
            finished_at: chrono::Utc::now(),
            outcome,
            output: "fake tool output".into(),
        }
    }
}

/// Error sink recording `context: error` lines.
#[derive(Default)]
pub struct RecordingSink(pub Mutex<Vec<String>>);

impl ErrorSink for RecordingSink {
    fn report(&self, context: &str, error: &Error) {
        self.0.lock().push(format!("{context}: {error}"));
    }
}

pub struct TestHarness {
    pub bucket: tempfile::TempDir,
    pub config: Config,
    pub runner: Arc<FakeRunner>,
    pub sink: Arc<RecordingSink>,
    pub events: Arc<EventBus>,
    pub manifests: Arc<MemoryManifestStore>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_runner(FakeRunner::default())
    }

    pub fn with_runner(runner: FakeRunner) -> Self {
        let bucket = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.bucket_mount = bucket.path().to_path_buf();
        config.remote.orchestrator_addr = Some("127.0.0.1:8935".into());
        config.pipeline.output_wait_timeout_secs = 1;
        config.pipeline.output_poll_interval_ms = 10;

        Self {
            bucket,
            config,
            runner: Arc::new(runner),
            sink: Arc::new(RecordingSink::default()),
            events: Arc::new(EventBus::default()),
            manifests: Arc::new(MemoryManifestStore::new()),
        }
    }

    /// Create `{bucket}/t/uploads/{id}.mp4` and return its resource.
    pub fn add_source(&self, id: &str) -> Resource {
        let resource = Resource::new(id, format!("{id}.mp4"), "uploads", "t");
        let source = resource.paths(self.bucket.path()).source;
        std::fs::create_dir_all(source.parent().unwrap()).unwrap();
        std::fs::write(&source, format!("duration={SOURCE_DURATION}")).unwrap();
        resource
    }

    pub fn output_dir(&self, resource: &Resource) -> PathBuf {
        resource.paths(self.bucket.path()).output_dir
    }

    pub fn context(&self) -> RunContext {
        RunContext::new(Arc::new(ToolRegistry::default()), Arc::new(FakeProber))
            .with_runner(self.runner.clone())
            .with_sink(self.sink.clone())
            .with_events(self.events.clone())
            .with_manifest_store(self.manifests.clone())
    }

    pub fn executor(&self) -> PipelineExecutor {
        PipelineExecutor::new(&self.config, self.context())
    }
}
