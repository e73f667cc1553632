//! File Memoizer Module
//!
//! Wraps an async producer so its results are persisted to a cache folder and
//! reused while fresh.
//!
//! Each call walks the same steps: derive the entry path from the arguments,
//! populate the entry if it is absent, compare its age with `max_age`, refresh
//! it (synchronously, or in the background when lazy), then read it back.
//!
//! Concurrent calls for the same arguments are not coordinated. Two calls that
//! both find the entry absent both invoke the producer and the last write
//! wins. Concurrent lazy calls on a stale entry may schedule redundant
//! refreshes the same way.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use super::config::{EntryPolicy, MemoizeConfig};
use super::payload::{decode, normalize, CachedValue};
use super::stats::MemoStats;
use crate::clock::{Clock, SystemClock};
use crate::error::{MemoError, Result};
use crate::storage::{FsStorage, Storage};
use crate::tasks::{spawn_refresh, RefreshTasks};

/// Where an entry stands when a call starts. A freshly populated entry is
/// not re-checked for staleness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryState {
    Absent,
    Fresh,
    Stale,
}

/// Callback invoked with the entry path and the error of a failed background refresh.
pub type RefreshErrorHook = Arc<dyn Fn(&Path, &MemoError) + Send + Sync>;

// == File Memoizer ==
/// Creates memoized wrappers sharing one storage backend and clock.
#[derive(Debug)]
pub struct FileMemoizer<S = FsStorage, C = SystemClock> {
    storage: Arc<S>,
    clock: Arc<C>,
}

impl FileMemoizer {
    /// Memoizer writing to the local filesystem, timed by the system clock.
    pub fn new() -> Self {
        Self::with_backend(Arc::new(FsStorage::new()), Arc::new(SystemClock))
    }
}

impl Default for FileMemoizer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, C> Clone for FileMemoizer<S, C> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S: Storage, C: Clock> FileMemoizer<S, C> {
    pub fn with_backend(storage: Arc<S>, clock: Arc<C>) -> Self {
        Self { storage, clock }
    }

    // == Wrap ==
    /// Wraps `producer` according to `config`.
    ///
    /// Fails with [`MemoError::Configuration`] before any I/O when the config
    /// supplies fewer than three fields. A disabled config yields a
    /// pass-through wrapper that never touches storage.
    pub fn wrap<F>(&self, producer: F, config: MemoizeConfig) -> Result<Memoized<F, S, C>> {
        let policy = config.validate()?;
        match &policy {
            Some(policy) => debug!(
                namespace = %policy.namespace,
                folder = %policy.folder.display(),
                max_age_ms = policy.max_age.as_millis() as u64,
                lazy = policy.is_lazy,
                "Memoizing function to file"
            ),
            None => debug!("File memoization disabled, calls pass through"),
        }

        Ok(Memoized {
            producer: Arc::new(producer),
            policy: policy.map(Arc::new),
            storage: Arc::clone(&self.storage),
            clock: Arc::clone(&self.clock),
            refreshes: RefreshTasks::new(),
            stats: Arc::new(Mutex::new(MemoStats::new())),
            on_refresh_error: None,
        })
    }
}

/// Wraps `producer` with a filesystem-backed memoizer.
pub fn memoize_to_file<F>(producer: F, config: MemoizeConfig) -> Result<Memoized<F>> {
    FileMemoizer::new().wrap(producer, config)
}

// == Memoized ==
/// A producer wrapped with file memoization.
pub struct Memoized<F, S = FsStorage, C = SystemClock> {
    producer: Arc<F>,
    /// `None` when caching is disabled
    policy: Option<Arc<EntryPolicy>>,
    storage: Arc<S>,
    clock: Arc<C>,
    refreshes: RefreshTasks,
    stats: Arc<Mutex<MemoStats>>,
    on_refresh_error: Option<RefreshErrorHook>,
}

impl<F, S, C> Clone for Memoized<F, S, C> {
    fn clone(&self) -> Self {
        Self {
            producer: Arc::clone(&self.producer),
            policy: self.policy.clone(),
            storage: Arc::clone(&self.storage),
            clock: Arc::clone(&self.clock),
            refreshes: self.refreshes.clone(),
            stats: Arc::clone(&self.stats),
            on_refresh_error: self.on_refresh_error.clone(),
        }
    }
}

impl<F, S, C> std::fmt::Debug for Memoized<F, S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memoized")
            .field("policy", &self.policy)
            .field("pending_refreshes", &self.refreshes.pending())
            .finish_non_exhaustive()
    }
}

impl<F, S: Storage, C: Clock> Memoized<F, S, C> {
    /// Registers a callback for background refresh failures.
    pub fn on_refresh_error(
        mut self,
        hook: impl Fn(&Path, &MemoError) + Send + Sync + 'static,
    ) -> Self {
        self.on_refresh_error = Some(Arc::new(hook));
        self
    }

    /// The resolved policy, `None` for a pass-through wrapper.
    pub fn policy(&self) -> Option<&EntryPolicy> {
        self.policy.as_deref()
    }

    /// Where the entry for `args` lives, `None` for a pass-through wrapper.
    pub fn entry_path<A: Serialize + ?Sized>(&self, args: &A) -> Result<Option<PathBuf>> {
        self.policy
            .as_deref()
            .map(|policy| policy.entry_path(args))
            .transpose()
    }

    pub async fn stats(&self) -> MemoStats {
        self.stats.lock().await.clone()
    }

    /// Number of background refreshes still running.
    pub fn pending_refreshes(&self) -> usize {
        self.refreshes.pending()
    }

    /// Waits for every background refresh scheduled so far.
    pub async fn wait_for_refreshes(&self) {
        self.refreshes.wait_all().await;
    }

    // == Call ==
    /// Invokes the wrapped producer through the cache.
    ///
    /// Errors on this path (producer, storage, decoding) are returned as-is.
    /// Errors of a scheduled background refresh are only logged and reported
    /// to the [`on_refresh_error`](Self::on_refresh_error) hook.
    pub async fn call<A, Fut, R>(&self, args: A) -> Result<CachedValue>
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        A: Serialize + Clone + Send + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: Serialize + Send + 'static,
    {
        let Some(policy) = self.policy.as_deref() else {
            let output = (self.producer)(args).await.map_err(MemoError::Producer)?;
            return CachedValue::from_output(&output);
        };

        let path = policy.entry_path(&args)?;

        let state = if self.storage.exists(&path).await? {
            let modified = self.storage.modified(&path).await?;
            let age = self
                .clock
                .now()
                .duration_since(modified)
                .unwrap_or(Duration::ZERO);
            if policy.is_stale(age) {
                EntryState::Stale
            } else {
                EntryState::Fresh
            }
        } else {
            EntryState::Absent
        };

        match state {
            EntryState::Absent => {
                debug!("Cache miss for {}", path.display());
                populate(&*self.producer, &*self.storage, &path, args.clone()).await?;
                self.stats.lock().await.record_miss();
            }
            EntryState::Stale if !policy.is_lazy => {
                debug!("Refreshing stale entry {}", path.display());
                populate(&*self.producer, &*self.storage, &path, args.clone()).await?;
                self.stats.lock().await.record_sync_refresh();
            }
            EntryState::Stale => {}
            EntryState::Fresh => self.stats.lock().await.record_hit(),
        }

        let text = self.storage.read_text(&path).await?;

        if state == EntryState::Stale && policy.is_lazy {
            self.schedule_refresh(path.clone(), args);
            self.stats.lock().await.record_background_refresh();
        }

        decode(&path, text, policy.is_json)
    }

    fn schedule_refresh<A, Fut, R>(&self, path: PathBuf, args: A)
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        A: Serialize + Send + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: Serialize + Send + 'static,
    {
        let producer = Arc::clone(&self.producer);
        let storage = Arc::clone(&self.storage);
        let stats = Arc::clone(&self.stats);
        let hook = self.on_refresh_error.clone();
        let entry = path.clone();

        let refresh = async move {
            let result = populate(&*producer, &*storage, &entry, args).await;
            if let Err(e) = &result {
                stats.lock().await.record_background_failure();
                if let Some(hook) = hook {
                    hook(&entry, e);
                }
            }
            result
        };

        self.refreshes.track(spawn_refresh(path, refresh));
    }
}

/// Invokes the producer and persists its normalized output.
///
/// Nothing is written unless the producer succeeds and its output is storable.
async fn populate<F, A, Fut, R, S>(producer: &F, storage: &S, path: &Path, args: A) -> Result<()>
where
    F: Fn(A) -> Fut,
    Fut: Future<Output = anyhow::Result<R>>,
    R: Serialize,
    S: Storage + ?Sized,
{
    let output = producer(args).await.map_err(MemoError::Producer)?;
    let payload = normalize(&output)?;
    storage.write_text(path, &payload).await
}
