//! Memoize Config Module
//!
//! Per call-site configuration of a file-memoized function.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::key::{cache_path, derive_key};
use crate::error::{MemoError, Result};

/// Minimum number of explicitly supplied fields a config must carry.
pub const MIN_SUPPLIED_FIELDS: usize = 3;

// == Memoize Config ==
/// Options for one wrapped function.
///
/// Every field is optional so that the number of explicitly supplied fields
/// can be checked. Unknown keys are ignored when deserializing and are not
/// counted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoizeConfig {
    /// Prefix of the cache file names
    pub namespace: Option<String>,
    /// Directory holding the cache files
    pub folder: Option<PathBuf>,
    /// Staleness threshold in milliseconds
    pub max_age_ms: Option<u64>,
    /// Decode cached text as JSON on read (default false)
    pub is_json: Option<bool>,
    /// Serve stale entries and refresh them in the background (default false)
    pub is_lazy: Option<bool>,
    /// Bypass caching entirely (default false)
    pub is_disabled: Option<bool>,
}

impl MemoizeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age_ms = Some(max_age.as_millis().min(u64::MAX as u128) as u64);
        self
    }

    pub fn max_age_ms(mut self, max_age_ms: u64) -> Self {
        self.max_age_ms = Some(max_age_ms);
        self
    }

    pub fn json(mut self, is_json: bool) -> Self {
        self.is_json = Some(is_json);
        self
    }

    pub fn lazy(mut self, is_lazy: bool) -> Self {
        self.is_lazy = Some(is_lazy);
        self
    }

    pub fn disabled(mut self, is_disabled: bool) -> Self {
        self.is_disabled = Some(is_disabled);
        self
    }

    /// Number of fields that were explicitly supplied.
    pub fn supplied_fields(&self) -> usize {
        [
            self.namespace.is_some(),
            self.folder.is_some(),
            self.max_age_ms.is_some(),
            self.is_json.is_some(),
            self.is_lazy.is_some(),
            self.is_disabled.is_some(),
        ]
        .into_iter()
        .filter(|supplied| *supplied)
        .count()
    }

    pub fn is_disabled(&self) -> bool {
        self.is_disabled.unwrap_or(false)
    }

    // == Validate ==
    /// Checks the config without touching storage.
    ///
    /// Returns `Ok(None)` for a disabled config (no further validation), and
    /// the resolved policy otherwise.
    pub fn validate(&self) -> Result<Option<EntryPolicy>> {
        let supplied = self.supplied_fields();
        if supplied < MIN_SUPPLIED_FIELDS {
            return Err(MemoError::Configuration(format!(
                "at least {MIN_SUPPLIED_FIELDS} config properties must be specified, got {supplied}"
            )));
        }

        if self.is_disabled() {
            return Ok(None);
        }

        let namespace = self
            .namespace
            .clone()
            .ok_or_else(|| missing_field("namespace"))?;
        let folder = self.folder.clone().ok_or_else(|| missing_field("folder"))?;
        let max_age_ms = self.max_age_ms.ok_or_else(|| missing_field("maxAgeMs"))?;

        Ok(Some(EntryPolicy {
            namespace,
            folder,
            max_age: Duration::from_millis(max_age_ms),
            is_json: self.is_json.unwrap_or(false),
            is_lazy: self.is_lazy.unwrap_or(false),
        }))
    }
}

fn missing_field(name: &str) -> MemoError {
    MemoError::Configuration(format!("\"{name}\" is required unless caching is disabled"))
}

// == Entry Policy ==
/// A validated, enabled config.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryPolicy {
    pub namespace: String,
    pub folder: PathBuf,
    pub max_age: Duration,
    pub is_json: bool,
    pub is_lazy: bool,
}

impl EntryPolicy {
    /// Location of the entry for `args`.
    pub fn entry_path<A: Serialize + ?Sized>(&self, args: &A) -> Result<PathBuf> {
        let key = derive_key(args)?;
        Ok(cache_path(&self.folder, &self.namespace, &key))
    }

    /// An entry is stale once its age strictly exceeds `max_age`.
    pub fn is_stale(&self, age: Duration) -> bool {
        age > self.max_age
    }
}
