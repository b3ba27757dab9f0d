use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

use crate::config::ValidationConfig;
use crate::error::{Result, PipelineError};
use crate::job::JobContext;
use crate::media::{MediaInfo, MediaProcessorTrait};

/// Outcome of a successful validation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "camelCase")]
pub enum Verdict {
    /// Metadata was read and is within bounds
    Accepted(MediaInfo),
    /// Probing was impossible; the file is let through
    Unverified(String),
}

/// Size and duration acceptance rules
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Probe `path` and check it against the bounds. A missing or failing
    /// probe tool does not reject the file.
    pub async fn validate(
        &self,
        media: &dyn MediaProcessorTrait,
        path: &Path,
        ctx: &JobContext,
    ) -> Result<Verdict> {
        let info = match media.probe(path, ctx).await {
            Ok(info) => info,
            Err(e) if e.is_interruption() => return Err(e),
            Err(e) => {
                warn!("Probe failed, skipping validation for {}: {}", path.display(), e);
                return Ok(Verdict::Unverified(e.to_string()));
            }
        };

        self.check(&info)?;
        info!("Validated {} (duration {:?}s, size {:?} bytes)", path.display(), info.duration, info.size);
        Ok(Verdict::Accepted(info))
    }

    /// Apply the bounds to already probed metadata; absent fields are not checked
    pub fn check(&self, info: &MediaInfo) -> Result<()> {
        if let Some(size) = info.size {
            if size > self.config.max_size_bytes() {
                return Err(PipelineError::Validation(format!(
                    "File too large (max {}MB)",
                    self.config.max_size_mb
                )));
            }
        }

        if let Some(duration) = info.duration {
            if duration < self.config.min_duration_secs || duration > self.config.max_duration_secs {
                return Err(PipelineError::Validation(format!(
                    "Duration must be between {} and {} seconds",
                    self.config.min_duration_secs, self.config.max_duration_secs
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MockMediaProcessorTrait;

    const MB: u64 = 1024 * 1024;

    fn info(duration: f64, size_mb: u64) -> MediaInfo {
        MediaInfo {
            duration: Some(duration),
            size: Some(size_mb * MB),
            ..MediaInfo::default()
        }
    }

    fn message(result: Result<()>) -> String {
        match result {
            Err(PipelineError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_duration_bounds() {
        let validator = Validator::new(ValidationConfig::default());
        assert_eq!(
            message(validator.check(&info(2.0, 10))),
            "Duration must be between 3 and 180 seconds"
        );
        assert_eq!(
            message(validator.check(&info(181.0, 10))),
            "Duration must be between 3 and 180 seconds"
        );
        assert!(validator.check(&info(3.0, 10)).is_ok());
        assert!(validator.check(&info(180.0, 10)).is_ok());
    }

    #[test]
    fn test_size_bounds() {
        let validator = Validator::new(ValidationConfig::default());
        assert!(message(validator.check(&info(30.0, 101))).starts_with("File too large"));
        assert!(validator.check(&info(100.0, 99)).is_ok());
        assert!(validator.check(&info(100.0, 100)).is_ok());
    }

    #[test]
    fn test_verdict_serializes_with_status_tag() {
        let json = serde_json::to_value(Verdict::Accepted(info(12.0, 5))).unwrap();
        assert_eq!(json["status"], "accepted");
        assert_eq!(json["detail"]["duration"], 12.0);

        let json = serde_json::to_value(Verdict::Unverified("ffprobe missing".to_string())).unwrap();
        assert_eq!(json["status"], "unverified");
        assert_eq!(json["detail"], "ffprobe missing");
    }

    #[test]
    fn test_missing_fields_are_not_checked() {
        let validator = Validator::new(ValidationConfig::default());
        assert!(validator.check(&MediaInfo::default()).is_ok());
    }

    #[tokio::test]
    async fn test_probe_failure_fails_open() {
        let mut media = MockMediaProcessorTrait::new();
        media
            .expect_probe()
            .returning(|_, _| Err(PipelineError::Probe("ffprobe: not found".to_string())));

        let verdict = Validator::new(ValidationConfig::default())
            .validate(&media, Path::new("raw.mp4"), &JobContext::new())
            .await
            .unwrap();
        assert!(matches!(verdict, Verdict::Unverified(_)));
    }

    #[tokio::test]
    async fn test_probed_file_out_of_bounds_is_rejected() {
        let mut media = MockMediaProcessorTrait::new();
        media.expect_probe().returning(|_, _| Ok(info(200.0, 50)));

        let err = Validator::new(ValidationConfig::default())
            .validate(&media, Path::new("raw.mp4"), &JobContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_cancellation_is_not_swallowed() {
        let mut media = MockMediaProcessorTrait::new();
        media.expect_probe().returning(|_, _| Err(PipelineError::Cancelled));

        let err = Validator::new(ValidationConfig::default())
            .validate(&media, Path::new("raw.mp4"), &JobContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled));
    }
}
