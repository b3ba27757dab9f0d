//! Fixed-profile renditions and visual filters.
//!
//! Both steps prefer a finished job over a faithful encode: when the encoder
//! fails, the input is copied verbatim and the outcome is marked degraded.
//! Cancellation and deadline expiry are never converted into a copy.

use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::{info, warn};

use crate::error::Result;
use crate::filter::VisualFilter;
use crate::job::{JobContext, RenditionOutcome};
use crate::media::MediaProcessorTrait;
use crate::profile::TranscodeProfile;

#[derive(Clone)]
pub struct Renditioner {
    media: Arc<dyn MediaProcessorTrait>,
}

impl Renditioner {
    pub fn new(media: Arc<dyn MediaProcessorTrait>) -> Self {
        Self { media }
    }

    pub async fn render(
        &self,
        input_path: &Path,
        output_path: &Path,
        profile: &TranscodeProfile,
        ctx: &JobContext,
    ) -> Result<RenditionOutcome> {
        let degraded = match self.media.transcode(input_path, output_path, profile, ctx).await {
            Ok(()) => false,
            Err(e) if e.is_interruption() => return Err(e),
            Err(e) => {
                warn!("Transcode to {} failed, falling back to copy: {}", profile.name, e);
                fs::copy(input_path, output_path).await?;
                true
            }
        };

        Ok(RenditionOutcome {
            name: profile.name.to_string(),
            path: output_path.to_path_buf(),
            degraded,
        })
    }
}

/// Result of a filter step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Filter that was requested and recognized, if any
    pub filter: Option<VisualFilter>,
    /// The encoder failed and the input was copied instead
    pub degraded: bool,
}

#[derive(Clone)]
pub struct FilterApplier {
    media: Arc<dyn MediaProcessorTrait>,
}

impl FilterApplier {
    pub fn new(media: Arc<dyn MediaProcessorTrait>) -> Self {
        Self { media }
    }

    /// Apply the named filter. Absent, `none` and unknown names copy the input unchanged.
    pub async fn apply(
        &self,
        input_path: &Path,
        output_path: &Path,
        filter_name: Option<&str>,
        ctx: &JobContext,
    ) -> Result<FilterOutcome> {
        let Some(filter) = VisualFilter::from_name(filter_name) else {
            if let Some(name) = filter_name.filter(|n| !n.trim().eq_ignore_ascii_case("none")) {
                warn!("Unknown filter '{}', copying without treatment", name);
            }
            fs::copy(input_path, output_path).await?;
            return Ok(FilterOutcome { filter: None, degraded: false });
        };

        info!("Applying {} filter", filter.name());
        let degraded = match self.media.apply_filter(input_path, output_path, filter.chain(), ctx).await {
            Ok(()) => false,
            Err(e) if e.is_interruption() => return Err(e),
            Err(e) => {
                warn!("Filter {} failed, falling back to copy: {}", filter.name(), e);
                fs::copy(input_path, output_path).await?;
                true
            }
        };

        Ok(FilterOutcome { filter: Some(filter), degraded })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::media::MockMediaProcessorTrait;
    use crate::profile::{HIGH, MEDIUM};
    use assert_fs::prelude::*;

    fn source(dir: &assert_fs::TempDir) -> assert_fs::fixture::ChildPath {
        let file = dir.child("source.mp4");
        file.write_binary(b"\x00\x00\x00\x18ftypmp42 source bytes").unwrap();
        file
    }

    #[tokio::test]
    async fn test_successful_transcode_is_not_degraded() {
        let dir = assert_fs::TempDir::new().unwrap();
        let input = source(&dir);
        let output = dir.child("high.mp4");

        let mut media = MockMediaProcessorTrait::new();
        media
            .expect_transcode()
            .withf(|_, _, profile, _| profile.name == "high")
            .times(1)
            .returning(|_, out, _, _| {
                std::fs::write(out, b"encoded")?;
                Ok(())
            });

        let outcome = Renditioner::new(Arc::new(media))
            .render(input.path(), output.path(), &HIGH, &JobContext::new())
            .await
            .unwrap();
        assert!(!outcome.degraded);
        assert_eq!(outcome.name, "high");
        assert_eq!(std::fs::read(output.path()).unwrap(), b"encoded");
    }

    #[tokio::test]
    async fn test_encoder_failure_copies_and_flags() {
        let dir = assert_fs::TempDir::new().unwrap();
        let input = source(&dir);
        let output = dir.child("medium.mp4");

        let mut media = MockMediaProcessorTrait::new();
        media
            .expect_transcode()
            .returning(|_, _, _, _| Err(PipelineError::Media("ffmpeg: not found".to_string())));

        let outcome = Renditioner::new(Arc::new(media))
            .render(input.path(), output.path(), &MEDIUM, &JobContext::new())
            .await
            .unwrap();
        assert!(outcome.degraded);
        assert_eq!(std::fs::read(output.path()).unwrap(), std::fs::read(input.path()).unwrap());
    }

    #[tokio::test]
    async fn test_timeout_is_not_masked_by_copy() {
        let dir = assert_fs::TempDir::new().unwrap();
        let input = source(&dir);
        let output = dir.child("medium.mp4");

        let mut media = MockMediaProcessorTrait::new();
        media
            .expect_transcode()
            .returning(|_, _, _, _| Err(PipelineError::Timeout(std::time::Duration::from_secs(1))));

        let err = Renditioner::new(Arc::new(media))
            .render(input.path(), output.path(), &MEDIUM, &JobContext::new())
            .await
            .unwrap_err();
        assert!(err.is_interruption());
        assert!(!output.path().exists());
    }

    #[tokio::test]
    async fn test_no_filter_is_a_pure_copy() {
        let dir = assert_fs::TempDir::new().unwrap();
        let input = source(&dir);

        for (i, name) in [None, Some("none"), Some("sparkle")].into_iter().enumerate() {
            let output = dir.child(format!("filtered-{}.mp4", i));
            let mut media = MockMediaProcessorTrait::new();
            media.expect_apply_filter().times(0);

            let outcome = FilterApplier::new(Arc::new(media))
                .apply(input.path(), output.path(), name, &JobContext::new())
                .await
                .unwrap();
            assert_eq!(outcome, FilterOutcome { filter: None, degraded: false });
            assert_eq!(std::fs::read(output.path()).unwrap(), std::fs::read(input.path()).unwrap());
        }
    }

    #[tokio::test]
    async fn test_named_filter_passes_its_chain() {
        let dir = assert_fs::TempDir::new().unwrap();
        let input = source(&dir);

        for filter in VisualFilter::ALL {
            let output = dir.child(format!("{}.mp4", filter.name()));
            let expected = filter.chain();
            let mut media = MockMediaProcessorTrait::new();
            media
                .expect_apply_filter()
                .withf(move |_, _, chain, _| chain.to_string() == expected)
                .times(1)
                .returning(|_, out, _, _| {
                    std::fs::write(out, b"filtered")?;
                    Ok(())
                });

            let outcome = FilterApplier::new(Arc::new(media))
                .apply(input.path(), output.path(), Some(filter.name()), &JobContext::new())
                .await
                .unwrap();
            assert_eq!(outcome.filter, Some(filter));
            assert!(!outcome.degraded);
        }
    }

    #[tokio::test]
    async fn test_filter_failure_copies_and_flags() {
        let dir = assert_fs::TempDir::new().unwrap();
        let input = source(&dir);
        let output = dir.child("warm.mp4");

        let mut media = MockMediaProcessorTrait::new();
        media
            .expect_apply_filter()
            .returning(|_, _, _, _| Err(PipelineError::Media("Visual filter failed".to_string())));

        let outcome = FilterApplier::new(Arc::new(media))
            .apply(input.path(), output.path(), Some("warm"), &JobContext::new())
            .await
            .unwrap();
        assert!(outcome.degraded);
        assert_eq!(std::fs::read(output.path()).unwrap(), std::fs::read(input.path()).unwrap());
    }
}
