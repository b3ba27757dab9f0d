use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::Result;
use crate::job::JobContext;
use crate::media::{FrameSize, MediaProcessorTrait};

/// Frames taken for the simple pipeline's poster image
pub const POSTER_TIMESTAMPS: [f64; 1] = [1.0];
pub const POSTER_SIZE: FrameSize = FrameSize::Exact { width: 360, height: 640 };

/// Frames taken for HLS preview thumbnails
pub const PREVIEW_TIMESTAMPS: [f64; 3] = [0.0, 2.0, 4.0];
pub const PREVIEW_SIZE: FrameSize = FrameSize::Width(384);

/// Best-effort still frame extraction
pub struct ThumbnailGenerator {
    media: Arc<dyn MediaProcessorTrait>,
}

impl ThumbnailGenerator {
    pub fn new(media: Arc<dyn MediaProcessorTrait>) -> Self {
        Self { media }
    }

    /// Write a single poster frame to `output_path`. Returns whether the file
    /// exists afterwards; extraction errors other than interruption are swallowed.
    pub async fn poster(&self, video_path: &Path, output_path: &Path, ctx: &JobContext) -> Result<bool> {
        self.frame(video_path, POSTER_TIMESTAMPS[0], output_path, POSTER_SIZE, ctx)
            .await
    }

    /// Write `thumb-<index>.png` into `thumbs_dir` for each preview timestamp.
    /// Returns the files that were produced, in timestamp order.
    pub async fn previews(&self, video_path: &Path, thumbs_dir: &Path, ctx: &JobContext) -> Result<Vec<PathBuf>> {
        if let Err(e) = tokio::fs::create_dir_all(thumbs_dir).await {
            warn!("Cannot create {}: {}", thumbs_dir.display(), e);
            return Ok(Vec::new());
        }

        let mut produced = Vec::new();
        for (index, at) in PREVIEW_TIMESTAMPS.iter().enumerate() {
            let path = preview_path(thumbs_dir, index);
            if self.frame(video_path, *at, &path, PREVIEW_SIZE, ctx).await? {
                produced.push(path);
            }
        }

        info!("Generated {}/{} preview thumbnails", produced.len(), PREVIEW_TIMESTAMPS.len());
        Ok(produced)
    }

    async fn frame(
        &self,
        video_path: &Path,
        at_seconds: f64,
        output_path: &Path,
        size: FrameSize,
        ctx: &JobContext,
    ) -> Result<bool> {
        match self.media.extract_frame(video_path, at_seconds, output_path, size, ctx).await {
            Ok(()) => Ok(output_path.is_file()),
            Err(e) if e.is_interruption() => Err(e),
            Err(e) => {
                warn!("Thumbnail at {}s failed, continuing without it: {}", at_seconds, e);
                Ok(false)
            }
        }
    }
}

/// Path of the preview thumbnail with the given 0-based index
pub fn preview_path(thumbs_dir: &Path, index: usize) -> PathBuf {
    thumbs_dir.join(format!("thumb-{}.png", index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::media::MockMediaProcessorTrait;

    #[tokio::test]
    async fn test_poster_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("thumb.jpg");

        let mut media = MockMediaProcessorTrait::new();
        media
            .expect_extract_frame()
            .returning(|_, _, _, _, _| Err(PipelineError::Media("Frame at 1s failed".to_string())));

        let created = ThumbnailGenerator::new(Arc::new(media))
            .poster(Path::new("high.mp4"), &out, &JobContext::new())
            .await
            .unwrap();
        assert!(!created);
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_poster_uses_fixed_time_and_size() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("thumb.jpg");

        let mut media = MockMediaProcessorTrait::new();
        media
            .expect_extract_frame()
            .withf(|_, at, _, size, _| *at == 1.0 && *size == POSTER_SIZE)
            .times(1)
            .returning(|_, _, path, _, _| {
                std::fs::write(path, b"jpeg")?;
                Ok(())
            });

        let created = ThumbnailGenerator::new(Arc::new(media))
            .poster(Path::new("high.mp4"), &out, &JobContext::new())
            .await
            .unwrap();
        assert!(created);
    }

    #[tokio::test]
    async fn test_previews_keep_going_after_one_failure() {
        let dir = tempfile::tempdir().unwrap();
        let thumbs = dir.path().join("thumbs");

        let mut media = MockMediaProcessorTrait::new();
        media
            .expect_extract_frame()
            .times(3)
            .returning(|_, at, path, size, _| {
                assert_eq!(size, PREVIEW_SIZE);
                if at == 2.0 {
                    return Err(PipelineError::Media("seek past end".to_string()));
                }
                std::fs::write(path, b"png")?;
                Ok(())
            });

        let produced = ThumbnailGenerator::new(Arc::new(media))
            .previews(Path::new("raw.mp4"), &thumbs, &JobContext::new())
            .await
            .unwrap();
        assert_eq!(produced, vec![preview_path(&thumbs, 0), preview_path(&thumbs, 2)]);
        assert!(thumbs.join("thumb-0.png").is_file());
        assert!(!thumbs.join("thumb-1.png").exists());
    }
}
