//! Per-job scratch and output directories.
//!
//! Every job gets a uniquely named output directory and a sibling scratch
//! directory under one process-wide root. The scratch directory (raw download,
//! intermediates) is always removed when the [`JobWorkspace`] is dropped; the
//! output directory survives only if the job commits it.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, PipelineError};

/// Hands out isolated working areas to jobs
pub trait WorkspaceProvider: Send + Sync {
    /// Acquire a fresh workspace; `label` becomes part of the output directory name
    fn acquire(&self, label: Option<&str>) -> Result<JobWorkspace>;
}

/// Default provider backed by a directory on the local filesystem
#[derive(Debug, Clone)]
pub struct ScratchWorkspace {
    root: PathBuf,
}

impl ScratchWorkspace {
    /// Create the root if it does not exist yet
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root).map_err(|e| {
            PipelineError::Workspace(format!("Cannot create scratch root {}: {}", root.display(), e))
        })?;
        debug!("Scratch root ready at {}", root.display());
        Ok(Self { root })
    }
}

impl WorkspaceProvider for ScratchWorkspace {
    fn acquire(&self, label: Option<&str>) -> Result<JobWorkspace> {
        // Root may have been swept since start-up
        std::fs::create_dir_all(&self.root)?;

        let id = Uuid::new_v4();
        let dir_name = match label {
            Some(label) => format!("{}_{}", sanitize(label), id),
            None => id.to_string(),
        };
        let output_dir = self.root.join(dir_name);
        std::fs::create_dir(&output_dir).map_err(|e| {
            PipelineError::Workspace(format!("Cannot create {}: {}", output_dir.display(), e))
        })?;

        let scratch = match tempfile::Builder::new().prefix(".work-").tempdir_in(&self.root) {
            Ok(scratch) => scratch,
            Err(e) => {
                let _ = std::fs::remove_dir_all(&output_dir);
                return Err(PipelineError::Workspace(format!("Cannot create scratch directory: {}", e)));
            }
        };

        debug!("Acquired workspace {} (scratch {})", output_dir.display(), scratch.path().display());
        Ok(JobWorkspace {
            id,
            output_dir,
            scratch,
            committed: false,
        })
    }
}

/// Keep labels usable as a single path component
fn sanitize(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Scoped working area of one job
#[derive(Debug)]
pub struct JobWorkspace {
    id: Uuid,
    output_dir: PathBuf,
    scratch: TempDir,
    committed: bool,
}

impl JobWorkspace {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Where deliverables are written
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Where intermediates are written; never inside `output_dir`
    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    /// Fresh, collision-free file path in the scratch directory
    pub fn scratch_file(&self, extension: &str) -> PathBuf {
        self.scratch
            .path()
            .join(format!("{}.{}", Uuid::new_v4(), extension))
    }

    /// Keep the output directory; scratch is still removed on drop
    pub fn commit(mut self) -> PathBuf {
        self.committed = true;
        self.output_dir.clone()
    }
}

impl Drop for JobWorkspace {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match std::fs::remove_dir_all(&self.output_dir) {
            Ok(()) => info!("Discarded job output {}", self.output_dir.display()),
            Err(e) => debug!("Could not discard {}: {}", self.output_dir.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creates_missing_root() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let root = tmp.path().join("nested").join("scratch");
        let provider = ScratchWorkspace::new(&root).unwrap();
        assert!(root.is_dir());
        assert!(provider.acquire(None).is_ok());
    }

    #[test]
    fn test_workspaces_are_unique() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let provider = ScratchWorkspace::new(tmp.path()).unwrap();

        let a = provider.acquire(Some("post-1")).unwrap();
        let b = provider.acquire(Some("post-1")).unwrap();
        assert_ne!(a.output_dir(), b.output_dir());
        assert_ne!(a.scratch_dir(), b.scratch_dir());
        assert_ne!(a.scratch_file("mp4"), a.scratch_file("mp4"));
        assert!(!a.scratch_dir().starts_with(a.output_dir()));
        assert!(a
            .output_dir()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("post-1_"));
    }

    #[test]
    fn test_label_is_sanitized() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let provider = ScratchWorkspace::new(tmp.path()).unwrap();

        let ws = provider.acquire(Some("../evil/id")).unwrap();
        assert_eq!(ws.output_dir().parent().unwrap(), tmp.path());
    }

    #[test]
    fn test_drop_without_commit_removes_everything() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let provider = ScratchWorkspace::new(tmp.path()).unwrap();

        let ws = provider.acquire(None).unwrap();
        std::fs::write(ws.output_dir().join("partial.mp4"), b"x").unwrap();
        std::fs::write(ws.scratch_file("mp4"), b"raw").unwrap();
        drop(ws);

        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_commit_keeps_output_only() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let provider = ScratchWorkspace::new(tmp.path()).unwrap();

        let ws = provider.acquire(None).unwrap();
        let scratch = ws.scratch_dir().to_path_buf();
        std::fs::write(ws.output_dir().join("high.mp4"), b"x").unwrap();
        std::fs::write(ws.scratch_file("mp4"), b"raw").unwrap();

        let kept = ws.commit();
        assert!(kept.join("high.mp4").is_file());
        assert!(!scratch.exists());
    }
}
