//! Background Tasks Module
//!
//! Contains work that runs detached from the call that triggered it.
//!
//! # Tasks
//! - Lazy refresh: rewrites a stale cache entry while the stale value is served

mod refresh;

pub use refresh::{spawn_refresh, RefreshTasks};
