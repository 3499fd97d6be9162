use lf_core::{Error, ExecutionKind, Resource, ResourceId};
use lf_pipeline::{PipelineExecutor, PipelineRun};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// One queued resource.
#[derive(Debug, Clone)]
pub struct Job {
    pub resource: Resource,
    pub kind: ExecutionKind,
}

impl Job {
    pub fn new(resource: Resource, kind: ExecutionKind) -> Self {
        Self { resource, kind }
    }
}

/// Result of one job, in submission order.
#[derive(Debug)]
pub struct JobResult {
    pub resource_id: ResourceId,
    pub result: lf_core::Result<PipelineRun>,
}

/// Runs several resources' pipelines at once.
///
/// At most `concurrency` runs are in flight; stages inside a run stay
/// sequential. One failing resource does not stop the others.
pub struct BatchProcessor {
    executor: Arc<PipelineExecutor>,
    semaphore: Arc<Semaphore>,
}

impl BatchProcessor {
    pub fn new(executor: Arc<PipelineExecutor>, concurrency: usize) -> Self {
        Self {
            executor,
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    pub async fn run_all(&self, jobs: Vec<Job>) -> Vec<JobResult> {
        tracing::info!("Batch processor started with {} jobs", jobs.len());

        let handles: Vec<_> = jobs
            .into_iter()
            .map(|job| {
                let executor = self.executor.clone();
                let semaphore = self.semaphore.clone();
                let resource_id = job.resource.id.clone();
                let handle = tokio::spawn(async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|e| Error::Internal(format!("batch semaphore closed: {e}")))?;
                    tracing::info!("Processing resource {}", job.resource.id);
                    executor.run(&job.resource, job.kind).await
                });
                (resource_id, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (resource_id, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(Error::Internal(format!("run task failed: {e}"))),
            };
            match &result {
                Ok(run) => tracing::info!(
                    "Resource {} completed ({} stages)",
                    resource_id,
                    run.stages.len()
                ),
                Err(e) => tracing::error!("Resource {} failed: {}", resource_id, e),
            }
            results.push(JobResult { resource_id, result });
        }
        results
    }
}
