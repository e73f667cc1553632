//! Filesystem storage backed by `tokio::fs`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::trace;

use super::Storage;
use crate::error::{MemoError, Result};

/// Mode of persisted entries on unix.
#[cfg(unix)]
const ENTRY_MODE: u32 = 0o644;

/// Stores entries as plain files. Writes go through a temporary sibling file
/// that is renamed over the target once complete.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

impl FsStorage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Storage for FsStorage {
    async fn exists(&self, path: &Path) -> Result<bool> {
        tokio::fs::try_exists(path)
            .await
            .map_err(|e| MemoError::storage(path, e))
    }

    async fn read_text(&self, path: &Path) -> Result<String> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| MemoError::storage(path, e))
    }

    async fn write_text(&self, path: &Path, content: &str) -> Result<()> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&parent)
            .await
            .map_err(|e| MemoError::storage(&parent, e))?;

        let target = path.to_path_buf();
        let content = content.to_owned();
        tokio::task::spawn_blocking(move || persist_atomically(&parent, &target, &content))
            .await
            .map_err(|e| MemoError::storage(path, std::io::Error::other(e)))??;

        trace!("Wrote cache entry {}", path.display());
        Ok(())
    }

    async fn modified(&self, path: &Path) -> Result<SystemTime> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| MemoError::storage(path, e))?;
        metadata.modified().map_err(|e| MemoError::storage(path, e))
    }
}

fn persist_atomically(dir: &Path, target: &Path, content: &str) -> Result<()> {
    let mut temp_file = tempfile::Builder::new()
        .prefix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| MemoError::storage(dir, e))?;
    write_all(&mut temp_file, content).map_err(|e| MemoError::storage(target, e))?;
    // Temporary files are created owner-only.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp_file
            .as_file()
            .set_permissions(std::fs::Permissions::from_mode(ENTRY_MODE))
            .map_err(|e| MemoError::storage(target, e))?;
    }
    temp_file
        .persist(target)
        .map_err(|e| MemoError::storage(target, e.error))?;
    Ok(())
}

fn write_all(temp_file: &mut NamedTempFile, content: &str) -> std::io::Result<()> {
    temp_file.write_all(content.as_bytes())?;
    temp_file.flush()
}
