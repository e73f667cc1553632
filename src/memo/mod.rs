//! Memo Module
//!
//! File-backed memoization of async producers: key derivation, freshness
//! policy and the lazy stale-while-revalidate refresh.

mod config;
mod file;
mod key;
mod payload;
mod stats;


// Re-export public types
pub use config::{EntryPolicy, MemoizeConfig, MIN_SUPPLIED_FIELDS};
pub use file::{memoize_to_file, FileMemoizer, Memoized, RefreshErrorHook};
pub use key::{cache_path, derive_key, CACHE_FILE_EXTENSION, KEY_BYTES};
pub use payload::{decode, normalize, CachedValue};
pub use stats::MemoStats;
