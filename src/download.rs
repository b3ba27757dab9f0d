use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, Url};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::DownloadConfig;
use crate::error::{Result, PipelineError};
use crate::job::JobContext;

/// Extension given to every downloaded source file
const SOURCE_EXTENSION: &str = "mp4";

/// Fetches source videos into a job's scratch directory
pub struct Downloader {
    client: Client,
    /// Longest wait for the response head or for the next body chunk
    idle_timeout: Duration,
    show_progress: bool,
}

impl Downloader {
    pub fn new(config: &DownloadConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout())
            .build()
            .map_err(|e| PipelineError::Download(format!("Cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            idle_timeout: config.timeout(),
            show_progress: config.show_progress,
        })
    }

    /// Download `source_url` to a new uniquely named file in `dest_dir`.
    /// Nothing is left behind on failure.
    pub async fn download(&self, source_url: &str, dest_dir: &Path, ctx: &JobContext) -> Result<PathBuf> {
        let url = Url::parse(source_url)
            .map_err(|e| PipelineError::Download(format!("Invalid source URL '{}': {}", source_url, e)))?;
        let dest = dest_dir.join(format!("{}.{}", Uuid::new_v4(), SOURCE_EXTENSION));

        info!("Downloading {} to {}", url, dest.display());

        let result = ctx.run(self.fetch(&url, &dest)).await;
        match result {
            Ok(bytes) => {
                info!("Downloaded {} bytes", bytes);
                Ok(dest)
            }
            Err(e) => {
                if let Err(rm) = fs::remove_file(&dest).await {
                    debug!("No partial download to remove at {}: {}", dest.display(), rm);
                }
                warn!("Download of {} failed: {}", url, e);
                Err(e)
            }
        }
    }

    async fn fetch(&self, url: &Url, dest: &Path) -> Result<u64> {
        match url.scheme() {
            "http" | "https" => self.fetch_http(url, dest).await,
            "file" => {
                let source = url
                    .to_file_path()
                    .map_err(|_| PipelineError::Download(format!("Invalid file URL: {}", url)))?;
                fs::copy(&source, dest)
                    .await
                    .map_err(|e| PipelineError::Download(format!("Cannot read {}: {}", source.display(), e)))
            }
            other => Err(PipelineError::Download(format!("Unsupported URL scheme: {}", other))),
        }
    }

    async fn fetch_http(&self, url: &Url, dest: &Path) -> Result<u64> {
        // A steady transfer may take arbitrarily long; only a quiet connection times out
        let mut response = self
            .idle(self.client.get(url.clone()).send())
            .await?
            .map_err(|e| PipelineError::Download(describe(&e)))?;

        if !response.status().is_success() {
            return Err(PipelineError::Download(format!(
                "Failed to download {}: HTTP {}",
                url,
                response.status()
            )));
        }

        let pb = self.progress_bar(response.content_length());
        let mut file = fs::File::create(dest).await?;
        let mut written = 0u64;

        while let Some(chunk) = self
            .idle(response.chunk())
            .await?
            .map_err(|e| PipelineError::Download(describe(&e)))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
            pb.set_position(written);
        }

        file.flush().await?;
        pb.finish_and_clear();
        Ok(written)
    }

    async fn idle<T, F: Future<Output = T>>(&self, fut: F) -> Result<T> {
        tokio::time::timeout(self.idle_timeout, fut).await.map_err(|_| {
            PipelineError::Download(format!(
                "Request timed out: no data for {}s",
                self.idle_timeout.as_secs()
            ))
        })
    }

    fn progress_bar(&self, length: Option<u64>) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(length.unwrap_or(0));
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        pb
    }
}

fn describe(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("Request timed out: {}", e)
    } else {
        format!("Request failed: {}", e)
    }
}
