//! File Memo - disk-backed memoization for async functions
//!
//! Persists producer results (typically HTTP responses) to a cache folder,
//! reuses them within a freshness window and can serve stale entries while
//! refreshing them in the background.

pub mod clock;
pub mod config;
pub mod error;
pub mod memo;
pub mod request;
pub mod storage;
pub mod tasks;
pub mod ttl;

pub use config::Config;
pub use error::{MemoError, Result};
pub use memo::{memoize_to_file, CachedValue, FileMemoizer, MemoizeConfig, Memoized};
pub use request::{Requester, RequestOptions};
