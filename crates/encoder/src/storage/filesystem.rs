use std::path::{Component, Path, PathBuf};

use log::debug;

use super::TransferStore;
use crate::error::StorageError;

/// Copy `src` to `dst` through a sibling temp file so readers never observe
/// a partially written object.
fn copy_atomically(src: &Path, dst: &Path) -> Result<(), StorageError> {
    if let Some(parent) = dst.parent() {
        ensure_directory(parent)?;
    }

    let file_name = dst
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "object".to_string());
    let tmp = dst.with_file_name(format!(".{}.{}.part", file_name, uuid::Uuid::new_v4()));

    if let Err(e) = std::fs::copy(src, &tmp) {
        let _ = std::fs::remove_file(&tmp);
        return Err(if e.kind() == std::io::ErrorKind::NotFound && !src.exists() {
            StorageError::ReadFile {
                path: src.to_path_buf(),
                source: e,
            }
        } else {
            StorageError::WriteFile {
                path: dst.to_path_buf(),
                source: e,
            }
        });
    }

    std::fs::rename(&tmp, dst).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        StorageError::WriteFile {
            path: dst.to_path_buf(),
            source: e,
        }
    })
}

fn ensure_directory(path: &Path) -> Result<(), StorageError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

/// `TransferStore` backed by a local directory tree. The first key segment
/// is the bucket, the rest is the object path inside it.
pub struct FilesystemStore {
    root: PathBuf,
}

impl FilesystemStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Maps a remote key onto a path under the root, refusing keys that could
    /// escape it.
    pub fn object_path(&self, remote_key: &str) -> Result<PathBuf, StorageError> {
        let invalid = |reason: &str| StorageError::InvalidKey {
            key: remote_key.to_string(),
            reason: reason.to_string(),
        };

        if remote_key.is_empty() {
            return Err(invalid("key is empty"));
        }
        if remote_key.contains('\\') {
            return Err(invalid("key contains a backslash"));
        }

        if remote_key.starts_with('/') {
            return Err(invalid("key must be relative"));
        }
        for segment in remote_key.split('/') {
            match segment {
                "" => return Err(invalid("key contains an empty segment")),
                "." => return Err(invalid("key contains '.' segment")),
                ".." => return Err(invalid("key contains '..' segment")),
                _ => {}
            }
        }

        let relative = Path::new(remote_key);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(invalid("key must be a plain relative path"));
        }

        Ok(self.root.join(relative))
    }
}

impl TransferStore for FilesystemStore {
    fn put(&self, local_path: &Path, remote_key: &str) -> Result<(), StorageError> {
        let destination = self.object_path(remote_key)?;
        copy_atomically(local_path, &destination)?;
        debug!("Stored {} as {}", local_path.display(), remote_key);
        Ok(())
    }

    fn get(&self, remote_key: &str, local_path: &Path) -> Result<(), StorageError> {
        let source = self.object_path(remote_key)?;
        if !source.is_file() {
            return Err(StorageError::NotFound(remote_key.to_string()));
        }
        copy_atomically(&source, local_path)?;
        debug!("Fetched {} into {}", remote_key, local_path.display());
        Ok(())
    }
}
