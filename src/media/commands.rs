use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::config::MediaConfig;
use crate::error::{Result, PipelineError};
use crate::job::JobContext;
use crate::profile::TranscodeProfile;

/// Abstract media processing command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    /// Copy audio stream
    pub fn copy_audio(self) -> Self {
        self.audio_codec("copy")
    }

    pub fn video_bitrate<S: Into<String>>(self, bitrate: S) -> Self {
        self.arg("-b:v").arg(bitrate)
    }

    pub fn audio_bitrate<S: Into<String>>(self, bitrate: S) -> Self {
        self.arg("-b:a").arg(bitrate)
    }

    pub fn preset<S: Into<String>>(self, preset: S) -> Self {
        self.arg("-preset").arg(preset)
    }

    pub fn crf(self, crf: u8) -> Self {
        self.arg("-crf").arg(crf.to_string())
    }

    pub fn frame_rate(self, fps: u32) -> Self {
        self.arg("-r").arg(fps.to_string())
    }

    /// Seek before the input so only the wanted frame is decoded
    pub fn seek(self, seconds: f64) -> Self {
        self.arg("-ss").arg(seconds.to_string())
    }

    /// Add video filter
    pub fn video_filter<S: Into<String>>(self, filter: S) -> Self {
        self.arg("-vf").arg(filter)
    }

    /// Execute the command, discarding its output
    pub async fn execute(&self, ctx: &JobContext) -> Result<()> {
        self.execute_for_output(ctx).await.map(|_| ())
    }

    /// Execute the command and return its stdout
    pub async fn execute_for_output(&self, ctx: &JobContext) -> Result<Vec<u8>> {
        debug!("Executing media processing command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let mut cmd = Command::new(&self.binary_path);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = ctx
            .run(async {
                cmd.output().await.map_err(|e| {
                    PipelineError::Media(format!("Failed to execute {}: {}", self.binary_path, e))
                })
            })
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::Media(format!(
                "{} failed: {}",
                self.description,
                stderr.trim()
            )));
        }

        Ok(output.stdout)
    }
}

/// Target size of an extracted frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSize {
    /// Exact width and height
    Exact { width: u32, height: u32 },
    /// Fixed width, height follows the source aspect ratio
    Width(u32),
}

impl FrameSize {
    pub fn scale_filter(&self) -> String {
        match self {
            FrameSize::Exact { width, height } => format!("scale={}:{}", width, height),
            FrameSize::Width(width) => format!("scale={}:-2", width),
        }
    }
}

/// Builder for the pipeline's ffmpeg/ffprobe invocations
pub struct MediaCommandBuilder {
    config: MediaConfig,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    /// Fixed-bitrate H.264/AAC rendition, letterboxed to the exact profile size
    pub fn transcode<P: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: P,
        profile: &TranscodeProfile,
    ) -> MediaCommand {
        let (w, h) = (profile.width, profile.height);
        MediaCommand::new(&self.config.binary_path, format!("Transcode to {}", profile.name))
            .overwrite()
            .input(input_path)
            .video_codec("libx264")
            .video_bitrate(profile.bitrate)
            .video_filter(format!(
                "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:black"
            ))
            .frame_rate(self.config.frame_rate)
            .audio_codec("aac")
            .audio_bitrate(&self.config.audio_bitrate)
            .preset(&self.config.preset)
            .output(output_path)
    }

    /// Apply a `-vf` chain, keeping the audio stream untouched
    pub fn filter<P: AsRef<Path>>(&self, input_path: P, output_path: P, chain: &str) -> MediaCommand {
        MediaCommand::new(&self.config.binary_path, "Visual filter")
            .overwrite()
            .input(input_path)
            .video_filter(chain)
            .video_codec("libx264") // Filters require re-encoding the video stream
            .preset(&self.config.preset)
            .copy_audio()
            .output(output_path)
    }

    /// Grab a single frame at `at_seconds`
    pub fn frame<P: AsRef<Path>>(
        &self,
        input_path: P,
        at_seconds: f64,
        output_path: P,
        size: FrameSize,
    ) -> MediaCommand {
        MediaCommand::new(&self.config.binary_path, format!("Frame at {}s", at_seconds))
            .overwrite()
            .seek(at_seconds)
            .input(input_path)
            .arg("-frames:v")
            .arg("1")
            .video_filter(size.scale_filter())
            .output(output_path)
    }

    /// One HLS rendition: `<name>.m3u8` plus `<name>_NNN.ts` segments in `out_dir`
    pub fn hls_rendition<P: AsRef<Path>>(
        &self,
        input_path: P,
        profile: &TranscodeProfile,
        out_dir: P,
    ) -> MediaCommand {
        let out_dir = out_dir.as_ref();
        let playlist = out_dir.join(format!("{}.m3u8", profile.name));
        let segments = out_dir.join(format!("{}_%03d.ts", profile.name));

        let mut cmd = MediaCommand::new(&self.config.binary_path, format!("HLS rendition {}", profile.name))
            .overwrite()
            .input(input_path)
            .video_codec("libx264");
        cmd = match profile.crf {
            Some(crf) => cmd.crf(crf),
            None => cmd.video_bitrate(profile.bitrate),
        };
        cmd.preset(&self.config.hls_preset)
            .video_filter(format!("scale=-2:{}", profile.height))
            .audio_codec("aac")
            .audio_bitrate(&self.config.audio_bitrate)
            .arg("-movflags").arg("+faststart")
            .arg("-hls_time").arg(self.config.segment_seconds.to_string())
            .arg("-hls_playlist_type").arg("vod")
            .arg("-hls_segment_filename").output(segments)
            .output(playlist)
    }

    /// Container and stream metadata as JSON
    pub fn probe<P: AsRef<Path>>(&self, input_path: P) -> MediaCommand {
        MediaCommand::new(&self.config.probe_path, "Probe")
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .output(input_path)
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.config.binary_path, "Version check")
            .arg("-version")
    }
}
