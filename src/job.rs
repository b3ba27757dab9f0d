use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, PipelineError};

/// Simple pipeline input as handed over by the job scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingJob {
    pub source_url: String,
    pub owner_id: String,
    pub content_id: String,
    #[serde(default)]
    pub filter_name: Option<String>,
}

/// HLS pipeline input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HlsJob {
    pub source_url: String,
    pub content_id: String,
}

impl From<&ProcessingJob> for HlsJob {
    fn from(job: &ProcessingJob) -> Self {
        Self {
            source_url: job.source_url.clone(),
            content_id: job.content_id.clone(),
        }
    }
}

/// One produced rendition; `degraded` marks a pass-through copy made after the encoder failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenditionOutcome {
    pub name: String,
    pub path: PathBuf,
    pub degraded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleResult {
    pub high: RenditionOutcome,
    pub medium: RenditionOutcome,
    pub low: RenditionOutcome,
    /// May point at a file that was never created, see `thumbnail_generated`
    pub thumbnail_path: PathBuf,
    pub thumbnail_generated: bool,
    pub output_dir: PathBuf,
    pub processed_at: DateTime<Utc>,
}

/// A file to upload, keyed by its forward-slash path relative to the output directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFile {
    pub local_path: PathBuf,
    pub remote_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HlsResult {
    pub manifest_path: PathBuf,
    pub output_dir: PathBuf,
    pub thumbnail_path: PathBuf,
    pub thumbnail_generated: bool,
    pub files: Vec<UploadFile>,
    pub processed_at: DateTime<Utc>,
}

/// Cancellation and deadline shared by every step of one job
#[derive(Debug, Clone, Default)]
pub struct JobContext {
    cancel: CancellationToken,
    deadline: Option<(Instant, Duration)>,
}

impl JobContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an externally owned token, e.g. one cancelled on shutdown
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Deadlines too far out to represent are treated as no deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout).map(|at| (at, timeout));
        self
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drive `fut` until it finishes, the job is cancelled, or the deadline passes.
    /// The future is dropped on interruption, which kills any child spawned with `kill_on_drop`.
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let deadline = async {
            match self.deadline {
                Some((at, _)) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(PipelineError::Cancelled),
            _ = deadline => Err(PipelineError::Timeout(
                self.deadline.map(|(_, timeout)| timeout).unwrap_or_default(),
            )),
            result = fut => result,
        }
    }
}
