use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Produce high/medium/low MP4 renditions and a poster thumbnail
    Process {
        /// Source video URL (http, https, file) or local path
        #[arg(short, long)]
        source: String,

        /// Content identifier the renditions belong to
        #[arg(long)]
        content_id: String,

        /// Owner of the content
        #[arg(long, default_value = "local")]
        owner_id: String,

        /// Visual filter (vintage, bright, noir, warm, cool, quebecois, none)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Package a source video as adaptive-bitrate HLS
    Hls {
        /// Source video URL (http, https, file) or local path
        #[arg(short, long)]
        source: String,

        /// Content identifier used in the output directory name
        #[arg(long)]
        content_id: String,
    },

    /// Probe a local file and report whether it would be accepted
    Probe {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// List available visual filters
    Filters,

    /// Write the default configuration to a file
    InitConfig {
        /// Output configuration file
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
}
