// Media processing seam
//
// Everything that touches the external encoding engine goes through
// MediaProcessorTrait:
// - Commands: ffmpeg/ffprobe argument builders and process execution
// - Processor: ffmpeg-backed implementation
// - Probe: ffprobe JSON parsing

pub mod commands;
pub mod probe;
pub mod processor;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

pub use commands::*;
pub use probe::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::Result;
use crate::job::JobContext;
use crate::profile::TranscodeProfile;

/// Main trait for media processing operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProcessorTrait: Send + Sync {
    /// Read container metadata
    async fn probe(&self, input_path: &Path, ctx: &JobContext) -> Result<MediaInfo>;

    /// Encode a fixed-size, fixed-bitrate rendition
    async fn transcode(
        &self,
        input_path: &Path,
        output_path: &Path,
        profile: &TranscodeProfile,
        ctx: &JobContext,
    ) -> Result<()>;

    /// Re-encode with a `-vf` filter chain
    async fn apply_filter(
        &self,
        input_path: &Path,
        output_path: &Path,
        chain: &str,
        ctx: &JobContext,
    ) -> Result<()>;

    /// Write one still frame
    async fn extract_frame(
        &self,
        input_path: &Path,
        at_seconds: f64,
        output_path: &Path,
        size: FrameSize,
        ctx: &JobContext,
    ) -> Result<()>;

    /// Write a VOD playlist and its segments for one profile into `out_dir`
    async fn package_hls(
        &self,
        input_path: &Path,
        profile: &TranscodeProfile,
        out_dir: &Path,
        ctx: &JobContext,
    ) -> Result<()>;

    /// Check if media processor is available
    fn check_availability(&self) -> Result<()>;

    /// Get media processor version information
    async fn get_version_info(&self) -> Result<String>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (FFmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Arc<dyn MediaProcessorTrait> {
        Arc::new(processor::FfmpegProcessor::new(config))
    }
}
