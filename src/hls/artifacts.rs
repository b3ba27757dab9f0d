use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Result, PipelineError};
use crate::job::UploadFile;

/// List every regular file under `base_dir` with its forward-slash key relative to `base_dir`.
///
/// The walk is iterative and sorted by file name, so the list is stable for
/// a given tree.
pub fn collect_artifacts(base_dir: &Path) -> Result<Vec<UploadFile>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(base_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            PipelineError::Io(
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
            )
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = pathdiff::diff_paths(entry.path(), base_dir).ok_or_else(|| {
            PipelineError::Workspace(format!("{} is outside {}", entry.path().display(), base_dir.display()))
        })?;
        files.push(UploadFile {
            local_path: entry.path().to_path_buf(),
            remote_key: remote_key(&relative)?,
        });
    }

    debug!("Collected {} artifacts under {}", files.len(), base_dir.display());
    Ok(files)
}

/// Async wrapper running the walk on the blocking pool
pub async fn collect_artifacts_async(base_dir: PathBuf) -> Result<Vec<UploadFile>> {
    tokio::task::spawn_blocking(move || collect_artifacts(&base_dir))
        .await
        .map_err(|e| PipelineError::Workspace(format!("Artifact walk panicked: {}", e)))?
}

/// Join the normal components of a relative path with `/`
fn remote_key(relative: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            _ => {
                return Err(PipelineError::Workspace(format!(
                    "Unexpected path component in {}",
                    relative.display()
                )));
            }
        }
    }
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_keys_are_relative_and_forward_slashed() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("manifest.m3u8").write_str("#EXTM3U\n").unwrap();
        dir.child("360p/360p.m3u8").write_str("#EXTM3U\n").unwrap();
        dir.child("360p/360p_000.ts").write_binary(b"ts").unwrap();
        dir.child("thumbs/thumb-0.png").write_binary(b"png").unwrap();
        dir.child("empty").create_dir_all().unwrap();

        let files = collect_artifacts(dir.path()).unwrap();
        let keys: Vec<_> = files.iter().map(|f| f.remote_key.as_str()).collect();
        assert_eq!(
            keys,
            ["360p/360p.m3u8", "360p/360p_000.ts", "manifest.m3u8", "thumbs/thumb-0.png"]
        );
        for file in &files {
            assert_eq!(file.local_path, dir.path().join(&file.remote_key));
        }
    }

    #[test]
    fn test_deep_tree_matches_disk() {
        let dir = assert_fs::TempDir::new().unwrap();
        let mut expected = BTreeSet::new();
        let mut nested = String::new();
        for depth in 0..40 {
            nested.push_str(&format!("d{}/", depth));
            let key = format!("{}f{}.bin", nested, depth);
            dir.child(&key).write_binary(b"x").unwrap();
            expected.insert(key);
        }

        let keys: BTreeSet<_> = collect_artifacts(dir.path())
            .unwrap()
            .into_iter()
            .map(|f| f.remote_key)
            .collect();
        assert_eq!(keys, expected);
    }

    #[tokio::test]
    async fn test_empty_directory() {
        let dir = assert_fs::TempDir::new().unwrap();
        let files = collect_artifacts_async(dir.path().to_path_buf()).await.unwrap();
        assert!(files.is_empty());
    }
}
