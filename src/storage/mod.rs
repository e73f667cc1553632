//! Storage Module
//!
//! Text storage backends for cache entries. Freshness is derived from the
//! modification time each backend reports, never from file content.

mod fs;
mod memory;

use std::path::Path;
use std::time::SystemTime;

use async_trait::async_trait;

use crate::error::Result;

pub use fs::FsStorage;
pub use memory::MemoryStorage;

/// Where cache entries live.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Returns true when an entry exists at `path`.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Reads the whole entry as UTF-8 text.
    async fn read_text(&self, path: &Path) -> Result<String>;

    /// Replaces the entry at `path`, creating parent directories if absent.
    ///
    /// Readers must observe either the previous content or the new one, never a mix.
    async fn write_text(&self, path: &Path, content: &str) -> Result<()>;

    /// Time of the last write to `path`.
    async fn modified(&self, path: &Path) -> Result<SystemTime>;
}
