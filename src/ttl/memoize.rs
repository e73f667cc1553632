//! TTL Memoize Module
//!
//! Short-lived in-memory memoization keyed by serialized arguments,
//! independent of the file memoizer.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::trace;

use super::entry::TimedEntry;

type BoxedFn<A, V, E> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<V, E>> + Send + Sync>;

/// Wraps `func` so results are reused for `ttl` after they were computed.
pub fn memoize<A, V, E, F, Fut>(func: F, ttl: Duration) -> TtlMemo<A, V, E>
where
    A: 'static,
    V: 'static,
    E: 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
{
    TtlMemo {
        func: Arc::new(move |args: A| func(args).boxed()),
        ttl,
        entries: Arc::new(RwLock::new(HashMap::new())),
    }
}

// == TTL Memo ==
/// An async function whose successful results are cached in memory.
///
/// Failures are never cached. Concurrent calls for an uncached key may all
/// invoke the function.
pub struct TtlMemo<A, V, E> {
    func: BoxedFn<A, V, E>,
    ttl: Duration,
    entries: Arc<RwLock<HashMap<String, TimedEntry<V>>>>,
}

impl<A, V, E> Clone for TtlMemo<A, V, E> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
            ttl: self.ttl,
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<A, V, E> std::fmt::Debug for TtlMemo<A, V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlMemo").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl<A, V, E> TtlMemo<A, V, E>
where
    A: Serialize,
    V: Clone,
    E: From<serde_json::Error>,
{
    // == Call ==
    /// Returns the cached value for `args`, computing it if absent or expired.
    pub async fn call(&self, args: A) -> Result<V, E> {
        let key = serde_json::to_string(&args)?;

        if let Some(entry) = self.entries.read().await.get(&key) {
            if !entry.is_expired() {
                trace!("TTL memo hit for {}", key);
                return Ok(entry.value.clone());
            }
        }

        let value = (self.func)(args).await?;
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| !entry.is_expired());
        entries.insert(key, TimedEntry::new(value.clone(), self.ttl));
        Ok(value)
    }

    // == Purge Expired ==
    /// Removes all expired entries and returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        before - entries.len()
    }

    /// Drops every cached value.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
