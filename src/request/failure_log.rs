//! Append-only log of failed requests, one JSON document per line.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::error::{MemoError, Result};

/// One failed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub url: String,
    pub attempt: u32,
    pub err: String,
    pub at: DateTime<Utc>,
}

impl FailureRecord {
    pub fn new(url: impl Into<String>, attempt: u32, err: &MemoError) -> Self {
        Self {
            url: url.into(),
            attempt,
            err: err.to_string(),
            at: Utc::now(),
        }
    }
}

// == Failure Log ==
#[derive(Debug, Clone)]
pub struct FailureLog {
    path: PathBuf,
}

impl FailureLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `record` as a single line, creating the file and its parent
    /// directories on first use.
    pub async fn append(&self, record: &FailureRecord) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MemoError::storage(parent, e))?;
        }

        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| MemoError::storage(&self.path, e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| MemoError::storage(&self.path, e))?;
        file.flush()
            .await
            .map_err(|e| MemoError::storage(&self.path, e))
    }

    /// Reads back every record; a missing log reads as empty.
    pub async fn read_all(&self) -> Result<Vec<FailureRecord>> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(MemoError::storage(&self.path, e)),
        };

        data.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(MemoError::from))
            .collect()
    }
}
