//! Bounded waits for externally produced output.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use lf_core::{Error, Result};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::manifest::is_video_file;

/// Poll every `interval` until `path` is a directory.
///
/// Fails with [`Error::Timeout`] once `timeout` has elapsed, or with a
/// `Pipeline` error if `cancellation` fires first. The path is always
/// checked at least once.
pub async fn wait_for_directory(
    path: &Path,
    timeout: Duration,
    interval: Duration,
    cancellation: &CancellationToken,
) -> Result<()> {
    poll_until(
        &format!("directory {}", path.display()),
        timeout,
        interval,
        cancellation,
        || is_directory(path),
    )
    .await
}

/// Poll every `interval` until `dir` holds at least `min` video files.
///
/// Same timeout and cancellation rules as [`wait_for_directory`]. A
/// directory that does not exist yet counts as empty.
pub async fn wait_for_videos(
    dir: &Path,
    min: usize,
    timeout: Duration,
    interval: Duration,
    cancellation: &CancellationToken,
) -> Result<()> {
    poll_until(
        &format!("{min} videos in {}", dir.display()),
        timeout,
        interval,
        cancellation,
        || async move { count_videos(dir).await >= min },
    )
    .await
}

async fn poll_until<F, Fut>(
    what: &str,
    timeout: Duration,
    interval: Duration,
    cancellation: &CancellationToken,
    mut ready: F,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if ready().await {
            return Ok(());
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(Error::Timeout {
                what: what.to_string(),
                after: timeout,
            });
        }

        let nap = interval.min(deadline - now);
        tokio::select! {
            _ = cancellation.cancelled() => {
                return Err(Error::pipeline("wait", format!("cancelled while waiting for {what}")));
            }
            _ = tokio::time::sleep(nap) => {}
        }
    }
}

async fn is_directory(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

async fn count_videos(dir: &Path) -> usize {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return 0;
    };
    let mut count = 0;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if is_file && is_video_file(&entry.path()) {
            count += 1;
        }
    }
    count
}
