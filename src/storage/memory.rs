//! In-process storage, mainly for tests and embedding.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use async_trait::async_trait;

use super::Storage;
use crate::clock::{Clock, SystemClock};
use crate::error::{MemoError, Result};

#[derive(Debug, Clone)]
struct StoredText {
    content: String,
    modified: SystemTime,
}

/// Keeps entries in a map, stamping each write with the injected clock.
pub struct MemoryStorage {
    entries: Mutex<HashMap<PathBuf, StoredText>>,
    clock: Arc<dyn Clock>,
    operations: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    /// Creates an empty storage stamped by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty storage stamped by `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            operations: AtomicUsize::new(0),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Number of storage calls served so far, including failed ones.
    pub fn operations(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    /// Makes every following write fail with a permission error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Returns the raw content stored at `path`, bypassing the operation counter.
    pub fn peek(&self, path: &Path) -> Option<String> {
        self.entries().get(path).map(|stored| stored.content.clone())
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<PathBuf, StoredText>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lookup(&self, path: &Path) -> Result<StoredText> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        self.entries().get(path).cloned().ok_or_else(|| {
            MemoError::storage(path, io::Error::new(io::ErrorKind::NotFound, "no such entry"))
        })
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStorage")
            .field("entries", &self.len())
            .field("operations", &self.operations())
            .finish()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn exists(&self, path: &Path) -> Result<bool> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries().contains_key(path))
    }

    async fn read_text(&self, path: &Path) -> Result<String> {
        self.lookup(path).map(|stored| stored.content)
    }

    async fn write_text(&self, path: &Path, content: &str) -> Result<()> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(MemoError::storage(
                path,
                io::Error::new(io::ErrorKind::PermissionDenied, "writes disabled"),
            ));
        }

        let stored = StoredText {
            content: content.to_owned(),
            modified: self.clock.now(),
        };
        self.entries().insert(path.to_path_buf(), stored);
        Ok(())
    }

    async fn modified(&self, path: &Path) -> Result<SystemTime> {
        self.lookup(path).map(|stored| stored.modified)
    }
}
