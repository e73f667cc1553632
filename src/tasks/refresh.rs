//! Background Refresh Task
//!
//! Fire-and-forget refreshes of stale cache entries. The caller never awaits
//! them and never sees their errors; failures end up in the logs.

use std::future::Future;
use std::mem;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Spawns `refresh` onto the runtime and logs its outcome.
///
/// The returned handle is the only way to observe completion. Dropping it
/// detaches the task, it keeps running to completion or failure either way.
///
/// # Example
/// ```ignore
/// let handle = spawn_refresh(path, async move { rewrite_entry().await });
/// // Later, when the result matters:
/// handle.await?;
/// ```
pub fn spawn_refresh<Fut>(path: PathBuf, refresh: Fut) -> JoinHandle<()>
where
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    debug!("Scheduling background refresh of {}", path.display());

    tokio::spawn(async move {
        match refresh.await {
            Ok(()) => info!("Background refresh of {} completed", path.display()),
            Err(e) => warn!(
                error = %e,
                path = %path.display(),
                "Background refresh failed, stale entry kept"
            ),
        }
    })
}

// == Refresh Tasks ==
/// Handles of the background refreshes spawned by one memoized function.
#[derive(Debug, Clone, Default)]
pub struct RefreshTasks {
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl RefreshTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remembers `handle`, forgetting refreshes that already finished.
    pub fn track(&self, handle: JoinHandle<()>) {
        let mut handles = self.handles();
        handles.retain(|handle| !handle.is_finished());
        handles.push(handle);
    }

    /// Number of refreshes that have not finished yet.
    pub fn pending(&self) -> usize {
        self.handles()
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Waits until every tracked refresh, including ones spawned meanwhile, is done.
    pub async fn wait_all(&self) {
        loop {
            let drained = mem::take(&mut *self.handles());
            if drained.is_empty() {
                break;
            }
            for handle in drained {
                if let Err(e) = handle.await {
                    warn!(error = %e, "Background refresh task did not finish cleanly");
                }
            }
        }
    }

    fn handles(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.handles
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
