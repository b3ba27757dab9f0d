use async_trait::async_trait;
use std::path::Path;
use std::process::Command;
use tracing::{info, debug};

use crate::config::MediaConfig;
use crate::error::{Result, PipelineError};
use crate::job::JobContext;
use crate::profile::TranscodeProfile;
use super::{FrameSize, MediaCommandBuilder, MediaInfo, MediaProcessorTrait};

/// Concrete implementation of media processor (FFmpeg-based)
pub struct FfmpegProcessor {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl FfmpegProcessor {
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(config.clone());

        Self {
            config,
            command_builder,
        }
    }
}

#[async_trait]
impl MediaProcessorTrait for FfmpegProcessor {
    async fn probe(&self, input_path: &Path, ctx: &JobContext) -> Result<MediaInfo> {
        debug!("Probing {}", input_path.display());

        let stdout = self
            .command_builder
            .probe(input_path)
            .execute_for_output(ctx)
            .await
            .map_err(|e| match e {
                PipelineError::Media(msg) => PipelineError::Probe(msg),
                other => other,
            })?;

        MediaInfo::from_ffprobe_json(&stdout)
    }

    async fn transcode(
        &self,
        input_path: &Path,
        output_path: &Path,
        profile: &TranscodeProfile,
        ctx: &JobContext,
    ) -> Result<()> {
        info!("Transcoding {} -> {} ({} {}@{})",
              input_path.display(), output_path.display(),
              profile.name, profile.resolution(), profile.bitrate);

        self.command_builder
            .transcode(input_path, output_path, profile)
            .execute(ctx)
            .await
    }

    async fn apply_filter(
        &self,
        input_path: &Path,
        output_path: &Path,
        chain: &str,
        ctx: &JobContext,
    ) -> Result<()> {
        info!("Applying filter chain '{}' to {}", chain, input_path.display());

        self.command_builder
            .filter(input_path, output_path, chain)
            .execute(ctx)
            .await
    }

    async fn extract_frame(
        &self,
        input_path: &Path,
        at_seconds: f64,
        output_path: &Path,
        size: FrameSize,
        ctx: &JobContext,
    ) -> Result<()> {
        debug!("Extracting frame at {}s -> {}", at_seconds, output_path.display());

        self.command_builder
            .frame(input_path, at_seconds, output_path, size)
            .execute(ctx)
            .await
    }

    async fn package_hls(
        &self,
        input_path: &Path,
        profile: &TranscodeProfile,
        out_dir: &Path,
        ctx: &JobContext,
    ) -> Result<()> {
        info!("Packaging HLS rendition {} into {}", profile.name, out_dir.display());

        self.command_builder
            .hls_rendition(input_path, profile, out_dir)
            .execute(ctx)
            .await?;

        info!("HLS rendition {} completed", profile.name);
        Ok(())
    }

    /// Check if media processor is available
    fn check_availability(&self) -> Result<()> {
        let output = Command::new(&self.config.binary_path)
            .arg("-version")
            .output()
            .map_err(|e| PipelineError::Media(format!("Media processor not found: {}", e)))?;

        if output.status.success() {
            info!("Media processor is available");
            Ok(())
        } else {
            Err(PipelineError::Media("Media processor version check failed".to_string()))
        }
    }

    /// Get media processor version information
    async fn get_version_info(&self) -> Result<String> {
        debug!("Getting media processor version information");

        let stdout = self
            .command_builder
            .version_check()
            .execute_for_output(&JobContext::new())
            .await?;

        let version_info = String::from_utf8_lossy(&stdout);
        // First line carries the version
        let first_line = version_info.lines().next().unwrap_or("Unknown version");
        Ok(first_line.to_string())
    }
}
