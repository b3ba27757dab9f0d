//! Reelpipe - Short-form video ingest pipeline
//!
//! Downloads uploaded clips, validates them, and produces either three fixed
//! MP4 renditions with an optional color filter or an adaptive-bitrate HLS
//! package with preview thumbnails, using ffmpeg and ffprobe.

pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod filter;
pub mod hls;
pub mod job;
pub mod media;
pub mod profile;
pub mod rendition;
pub mod thumbnail;
pub mod validate;
pub mod workflow;
pub mod workspace;
