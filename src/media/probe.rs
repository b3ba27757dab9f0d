//! ffprobe metadata parsing.

use serde::{Deserialize, Serialize};

use crate::error::{Result, PipelineError};

/// Container and primary video stream metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Duration in seconds
    pub duration: Option<f64>,
    /// File size in bytes
    pub size: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub codec: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

// ffprobe reports numbers as strings in the format section
#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

impl MediaInfo {
    /// Parse `ffprobe -print_format json -show_format -show_streams` output
    pub fn from_ffprobe_json(raw: &[u8]) -> Result<Self> {
        let probe: FfprobeOutput = serde_json::from_slice(raw)
            .map_err(|e| PipelineError::Probe(format!("Unreadable ffprobe output: {}", e)))?;

        let video = probe
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"));

        Ok(Self {
            duration: probe.format.duration.as_deref().and_then(|d| d.parse().ok()),
            size: probe.format.size.as_deref().and_then(|s| s.parse().ok()),
            width: video.and_then(|s| s.width),
            height: video.and_then(|s| s.height),
            codec: video.and_then(|s| s.codec_name.clone()),
        })
    }
}
