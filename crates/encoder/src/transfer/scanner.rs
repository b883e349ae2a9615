use std::path::{Path, PathBuf};

use log::{debug, info};
use walkdir::WalkDir;

use super::error::TransferError;

/// A single file queued for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTask {
    pub local_path: PathBuf,
    pub remote_key: String,
}

/// Remote key for `path`: its location relative to `local_root`, joined with
/// `/` and placed under `target`.
pub fn remote_key_for(local_root: &Path, path: &Path, target: &str) -> String {
    let relative = path.strip_prefix(local_root).unwrap_or(path);
    let relative = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    let target = target.trim_end_matches('/');
    if target.is_empty() {
        relative
    } else {
        format!("{}/{}", target, relative)
    }
}

/// Recursively lists every regular file under `local_root`.
///
/// Directories are walked but never returned. The order of the returned
/// tasks carries no meaning.
pub fn discover_files(local_root: &Path, target: &str) -> Result<Vec<TransferTask>, TransferError> {
    let metadata = std::fs::metadata(local_root).map_err(|e| TransferError::MissingRoot {
        path: local_root.to_path_buf(),
        source: e,
    })?;
    if !metadata.is_dir() {
        return Err(TransferError::NotADirectory(local_root.to_path_buf()));
    }

    let mut tasks = Vec::new();
    for entry in WalkDir::new(local_root).min_depth(1) {
        let entry = entry.map_err(|e| TransferError::Discovery {
            path: local_root.to_path_buf(),
            source: e,
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let local_path = entry.into_path();
        let remote_key = remote_key_for(local_root, &local_path, target);
        debug!("Queued {} -> {}", local_path.display(), remote_key);
        tasks.push(TransferTask {
            local_path,
            remote_key,
        });
    }

    info!(
        "Discovered {} files to upload in {}",
        tasks.len(),
        local_root.display()
    );
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_scan_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let tasks = discover_files(temp_dir.path(), "out").unwrap();
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_scan_recurses_and_skips_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join("video/avc1")).unwrap();
        std::fs::create_dir_all(root.join("audio/empty")).unwrap();
        std::fs::write(root.join("stream.mpd"), b"<MPD/>").unwrap();
        std::fs::write(root.join("video/avc1/init.mp4"), b"init").unwrap();
        std::fs::write(root.join("video/avc1/seg-1.m4s"), b"seg").unwrap();

        let mut keys: Vec<String> = discover_files(root, "encoded/abc")
            .unwrap()
            .into_iter()
            .map(|t| t.remote_key)
            .collect();
        keys.sort();

        assert_eq!(
            keys,
            vec![
                "encoded/abc/stream.mpd",
                "encoded/abc/video/avc1/init.mp4",
                "encoded/abc/video/avc1/seg-1.m4s",
            ]
        );
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = discover_files(&temp_dir.path().join("absent"), "out").unwrap_err();
        assert!(matches!(err, TransferError::MissingRoot { .. }));
    }

    #[test]
    fn test_file_root_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("single.mp4");
        std::fs::write(&file, b"x").unwrap();
        let err = discover_files(&file, "out").unwrap_err();
        assert!(matches!(err, TransferError::NotADirectory(_)));
    }

    #[test]
    fn test_remote_key_for() {
        let root = Path::new("/stage/abc");
        let path = Path::new("/stage/abc/video/seg-1.m4s");
        assert_eq!(remote_key_for(root, path, "out"), "out/video/seg-1.m4s");
        assert_eq!(remote_key_for(root, path, "out/"), "out/video/seg-1.m4s");
        assert_eq!(remote_key_for(root, path, ""), "video/seg-1.m4s");
    }
}
