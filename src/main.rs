//! Reelpipe - Short-form video ingest pipeline
//!
//! Command line entry point: runs the simple or HLS pipeline on one source
//! and prints the result as JSON.

use anyhow::Result;
use clap::Parser;
use reqwest::Url;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use reelpipe::cli::{Args, Commands};
use reelpipe::config::Config;
use reelpipe::filter::VisualFilter;
use reelpipe::job::{HlsJob, ProcessingJob};
use reelpipe::workflow::Workflow;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    // Load configuration
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Filters => {
            println!("{:<12} {}", "Name", "Filter chain");
            println!("{}", "-".repeat(72));
            for filter in VisualFilter::ALL {
                println!("{:<12} {}", filter.name(), filter.chain());
            }
        }
        Commands::InitConfig { output } => {
            Config::default().save_to_file(&output)?;
            info!("Default configuration written to {}", output.display());
        }
        Commands::Probe { input } => {
            let workflow = Workflow::new(config)?;
            let verdict = workflow.inspect(&input, &workflow.job_context()).await?;
            println!("{}", serde_json::to_string_pretty(&verdict)?);
        }
        Commands::Process { source, content_id, owner_id, filter } => {
            let workflow = Workflow::new(config)?;
            log_media_version(&workflow).await;

            let job = ProcessingJob {
                source_url: source_url(&source)?,
                owner_id,
                content_id,
                filter_name: filter,
            };
            let ctx = workflow.job_context().with_cancel(shutdown_token());
            let result = workflow.process_simple(&job, &ctx).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Hls { source, content_id } => {
            let workflow = Workflow::new(config)?;
            log_media_version(&workflow).await;

            let job = HlsJob {
                source_url: source_url(&source)?,
                content_id,
            };
            let ctx = workflow.job_context().with_cancel(shutdown_token());
            let result = workflow.process_hls(&job, &ctx).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    info!("Reelpipe completed successfully");
    Ok(())
}

/// Token cancelled on Ctrl-C so running encoders are killed and output removed
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling job");
            trigger.cancel();
        }
    });
    token
}

/// Accept URLs as given and turn local paths into `file://` URLs
fn source_url(source: &str) -> Result<String> {
    if Url::parse(source).is_ok_and(|url| url.scheme().len() > 1) {
        return Ok(source.to_string());
    }
    let path = std::fs::canonicalize(source)
        .map_err(|e| anyhow::anyhow!("Cannot resolve source '{}': {}", source, e))?;
    let url = Url::from_file_path(&path)
        .map_err(|_| anyhow::anyhow!("Cannot convert {} to a file URL", path.display()))?;
    Ok(url.to_string())
}

async fn log_media_version(workflow: &Workflow) {
    match workflow.media().get_version_info().await {
        Ok(version) => info!("Using {}", version),
        Err(e) => warn!("Could not read encoder version: {}", e),
    }
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = std::env::current_dir()?.join(".reelpipe").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "reelpipe.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Console output goes to stderr so stdout stays valid JSON
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("reelpipe.log").display());

    Ok(())
}
