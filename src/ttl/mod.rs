//! TTL Module
//!
//! Time-bounded in-memory memoization for cheap lookups that are called
//! often, such as reading the proxy list.

mod entry;
mod memoize;

pub use entry::TimedEntry;
pub use memoize::{memoize, TtlMemo};
