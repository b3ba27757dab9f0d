use chrono::Utc;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::download::Downloader;
use crate::error::{Result, PipelineError};
use crate::hls::{collect_artifacts_async, ManifestBuilder, MASTER_PLAYLIST, THUMBS_DIR};
use crate::job::{HlsJob, HlsResult, JobContext, ProcessingJob, RenditionOutcome, SimpleResult};
use crate::media::{MediaProcessorFactory, MediaProcessorTrait};
use crate::profile::{TranscodeProfile, HIGH, HLS_PROFILES, LOW, MEDIUM};
use crate::rendition::{FilterApplier, Renditioner};
use crate::thumbnail::{preview_path, ThumbnailGenerator};
use crate::validate::{Validator, Verdict};
use crate::workspace::{ScratchWorkspace, WorkspaceProvider};

pub struct Workflow {
    config: Config,
    media: Arc<dyn MediaProcessorTrait>,
    workspace: Arc<dyn WorkspaceProvider>,
    downloader: Downloader,
    validator: Validator,
    renditioner: Renditioner,
    filters: FilterApplier,
    thumbnails: ThumbnailGenerator,
}

impl Workflow {
    /// Workflow backed by ffmpeg and the configured scratch root
    pub fn new(config: Config) -> Result<Self> {
        let media = MediaProcessorFactory::create_processor(config.media.clone());
        let workspace = Arc::new(ScratchWorkspace::new(&config.workspace.root)?);

        // A missing encoder degrades renditions to copies instead of failing jobs
        if let Err(e) = media.check_availability() {
            warn!("{}; renditions will fall back to copies", e);
        }

        Self::with_components(config, media, workspace)
    }

    pub fn with_components(
        config: Config,
        media: Arc<dyn MediaProcessorTrait>,
        workspace: Arc<dyn WorkspaceProvider>,
    ) -> Result<Self> {
        let downloader = Downloader::new(&config.download)?;
        let validator = Validator::new(config.validation.clone());

        Ok(Self {
            renditioner: Renditioner::new(Arc::clone(&media)),
            filters: FilterApplier::new(Arc::clone(&media)),
            thumbnails: ThumbnailGenerator::new(Arc::clone(&media)),
            config,
            media,
            workspace,
            downloader,
            validator,
        })
    }

    pub fn media(&self) -> &Arc<dyn MediaProcessorTrait> {
        &self.media
    }

    /// Fresh job context carrying the configured per-job deadline
    pub fn job_context(&self) -> JobContext {
        match self.config.pipeline.job_timeout() {
            Some(timeout) => JobContext::new().with_timeout(timeout),
            None => JobContext::new(),
        }
    }

    /// Probe and validate a local file without processing it
    pub async fn inspect(&self, path: &Path, ctx: &JobContext) -> Result<Verdict> {
        if !path.is_file() {
            return Err(PipelineError::FileNotFound(path.display().to_string()));
        }
        self.validator.validate(self.media.as_ref(), path, ctx).await
    }

    /// Three-tier pipeline: filtered high rendition, medium and low derived
    /// from it, and a poster thumbnail. On error nothing from the job stays on disk.
    pub async fn process_simple(&self, job: &ProcessingJob, ctx: &JobContext) -> Result<SimpleResult> {
        info!("Processing content {} for owner {}", job.content_id, job.owner_id);

        let workspace = self.workspace.acquire(None)?;

        // Step 1: Fetch and validate the source
        let raw = self.downloader.download(&job.source_url, workspace.scratch_dir(), ctx).await?;
        self.validator.validate(self.media.as_ref(), &raw, ctx).await?;

        let id = workspace.id();
        let out_dir = workspace.output_dir();
        let high_path = out_dir.join(format!("{}_high.mp4", id));
        let medium_path = out_dir.join(format!("{}_med.mp4", id));
        let low_path = out_dir.join(format!("{}_low.mp4", id));
        let thumbnail_path = out_dir.join(format!("{}_thumb.jpg", id));
        let master = workspace.scratch_file("mp4");
        let filtered = workspace.scratch_file("mp4");

        // Step 2: Master at the top tier, then the color treatment
        let master_outcome = self.renditioner.render(&raw, &master, &HIGH, ctx).await?;
        let filter = self
            .filters
            .apply(&master, &filtered, job.filter_name.as_deref(), ctx)
            .await?;
        fs::copy(&filtered, &high_path).await?;
        info!(
            "High rendition ready with filter {}",
            filter.filter.map(|f| f.name()).unwrap_or("none")
        );
        let high = RenditionOutcome {
            name: HIGH.name.to_string(),
            path: high_path.clone(),
            degraded: master_outcome.degraded || filter.degraded,
        };

        // Step 3: Lower tiers from the filtered high output so all tiers share the treatment
        let mut derived = self
            .render_all(&high_path, vec![(MEDIUM, medium_path), (LOW, low_path)], ctx)
            .await?
            .into_iter();
        let (Some(medium), Some(low)) = (derived.next(), derived.next()) else {
            return Err(PipelineError::Media("Missing derived renditions".to_string()));
        };

        // Step 4: Poster frame, best effort
        let thumbnail_generated = self.thumbnails.poster(&high_path, &thumbnail_path, ctx).await?;

        remove_quietly(&[raw, master, filtered]).await;
        let output_dir = workspace.commit();

        info!("Content {} processed into {}", job.content_id, output_dir.display());
        Ok(SimpleResult {
            high,
            medium,
            low,
            thumbnail_path,
            thumbnail_generated,
            output_dir,
            processed_at: Utc::now(),
        })
    }

    /// Adaptive-bitrate pipeline: one HLS rendition per ladder step, master
    /// playlist, preview thumbnails and the upload list of the whole tree.
    pub async fn process_hls(&self, job: &HlsJob, ctx: &JobContext) -> Result<HlsResult> {
        info!("Packaging content {} as HLS", job.content_id);

        let workspace = self.workspace.acquire(Some(&format!("hls_{}", job.content_id)))?;

        let raw = self.downloader.download(&job.source_url, workspace.scratch_dir(), ctx).await?;
        self.validator.validate(self.media.as_ref(), &raw, ctx).await?;

        let base_dir = workspace.output_dir().to_path_buf();

        // Step 1: Renditions; any failure aborts the job
        for profile in &HLS_PROFILES {
            fs::create_dir_all(base_dir.join(profile.name)).await?;
        }
        let tasks = HLS_PROFILES
            .iter()
            .map(|profile| {
                let media = Arc::clone(&self.media);
                let input = raw.clone();
                let out_dir = base_dir.join(profile.name);
                let profile = *profile;
                let ctx = ctx.clone();
                async move { media.package_hls(&input, &profile, &out_dir, &ctx).await }
            })
            .collect();
        self.run_bounded(tasks).await?;

        // Step 2: Master playlist in ladder order
        let manifest_path = base_dir.join(MASTER_PLAYLIST);
        ManifestBuilder::from_profiles(&HLS_PROFILES)
            .write_to(&manifest_path)
            .await?;

        // Step 3: Preview thumbnails, best effort
        let thumbs_dir = base_dir.join(THUMBS_DIR);
        let previews = self.thumbnails.previews(&raw, &thumbs_dir, ctx).await?;
        let thumbnail_path = preview_path(&thumbs_dir, 0);
        let thumbnail_generated = previews.first() == Some(&thumbnail_path);

        // Step 4: Everything on disk goes into the upload list
        let files = collect_artifacts_async(base_dir).await?;

        remove_quietly(&[raw]).await;
        let output_dir = workspace.commit();

        info!("HLS package for {} ready with {} files", job.content_id, files.len());
        Ok(HlsResult {
            manifest_path,
            output_dir,
            thumbnail_path,
            thumbnail_generated,
            files,
            processed_at: Utc::now(),
        })
    }

    /// Render several independent profiles from one input on the bounded pool
    async fn render_all(
        &self,
        input: &Path,
        targets: Vec<(TranscodeProfile, PathBuf)>,
        ctx: &JobContext,
    ) -> Result<Vec<RenditionOutcome>> {
        let tasks = targets
            .into_iter()
            .map(|(profile, output)| {
                let renditioner = self.renditioner.clone();
                let input = input.to_path_buf();
                let ctx = ctx.clone();
                async move { renditioner.render(&input, &output, &profile, &ctx).await }
            })
            .collect();
        self.run_bounded(tasks).await
    }

    /// Run `tasks` with at most `max_parallel_renditions` in flight.
    /// Results keep the order of `tasks`; the first error aborts the rest.
    async fn run_bounded<T, F>(&self, tasks: Vec<F>) -> Result<Vec<T>>
    where
        T: Send + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.config.pipeline.max_parallel_renditions.max(1)));
        let mut set = JoinSet::new();
        let count = tasks.len();

        for (index, task) in tasks.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            set.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| PipelineError::Media("Rendition pool closed".to_string()))?;
                task.await.map(|value| (index, value))
            });
        }

        let mut results: Vec<Option<T>> = (0..count).map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined
                .map_err(|e| PipelineError::Media(format!("Rendition task failed: {}", e)))
                .and_then(|r| r)
            {
                Ok((index, value)) => results[index] = Some(value),
                Err(e) => {
                    // Abort the rest and wait so their children are killed before cleanup
                    set.shutdown().await;
                    return Err(e);
                }
            }
        }

        Ok(results.into_iter().flatten().collect())
    }
}

/// Delete intermediates; failures are logged and ignored
async fn remove_quietly(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = fs::remove_file(path).await {
            debug!("Cleanup of {} skipped: {}", path.display(), e);
        }
    }
}
