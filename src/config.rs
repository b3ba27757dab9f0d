use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::error::{Result, PipelineError};

fn default_scratch_root() -> PathBuf {
    std::env::temp_dir().join("reelpipe_processing")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub workspace: WorkspaceConfig,
    pub download: DownloadConfig,
    pub validation: ValidationConfig,
    pub media: MediaConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Process-wide scratch root; per-job directories are created below it
    pub root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Network timeout for fetching the source video
    pub timeout_secs: u64,
    /// User agent sent with source requests
    pub user_agent: String,
    /// Show a progress bar while downloading
    pub show_progress: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Maximum accepted file size in megabytes (1 MB = 1024 * 1024 bytes)
    pub max_size_mb: u64,
    /// Minimum accepted duration in seconds
    pub min_duration_secs: f64,
    /// Maximum accepted duration in seconds
    pub max_duration_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Path to ffprobe binary
    pub probe_path: String,
    /// x264 preset for fixed-bitrate renditions and filters
    pub preset: String,
    /// x264 preset for HLS packaging
    pub hls_preset: String,
    /// Output frame rate for fixed-bitrate renditions
    pub frame_rate: u32,
    /// AAC audio bitrate
    pub audio_bitrate: String,
    /// HLS segment duration in seconds
    pub segment_seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Upper bound on renditions encoded at the same time
    pub max_parallel_renditions: usize,
    /// Per-job deadline; no deadline when unset
    pub job_timeout_secs: Option<u64>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: default_scratch_root(),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("reelpipe/", env!("CARGO_PKG_VERSION")).to_string(),
            show_progress: false,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_size_mb: 100,
            min_duration_secs: 3.0,
            max_duration_secs: 180.0,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
            probe_path: "ffprobe".to_string(),
            preset: "fast".to_string(),
            hls_preset: "veryfast".to_string(),
            frame_rate: 30,
            audio_bitrate: "128k".to_string(),
            segment_seconds: 4,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_parallel_renditions: 2,
            job_timeout_secs: None,
        }
    }
}

impl DownloadConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ValidationConfig {
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(1024 * 1024)
    }
}

impl PipelineConfig {
    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout_secs.map(Duration::from_secs)
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| PipelineError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| PipelineError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| PipelineError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}
