/// Project identity and per-project indexing locks.
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex as TokioMutex;

/// Source type tag stored on every locally indexed chunk.
pub const SOURCE_TYPE_LOCAL: &str = "local";

/// Derive a project id from a human-supplied name: lowercase, with every
/// character outside `[a-z0-9]` replaced by `_`.
///
/// Deterministic but collision-prone; two distinct names can map to the
/// same id and the system does not detect that.
#[must_use]
pub fn project_id_from_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Registry of per-project mutexes.
///
/// Two concurrent indexing runs for the same project id would interleave
/// their batch writes and leave a mixture of old and new chunks; holding
/// the project's lock for the whole run serializes them. Distinct
/// projects index independently.
#[derive(Default)]
pub struct ProjectLocks {
    inner: TokioMutex<HashMap<String, Arc<TokioMutex<()>>>>,
}

impl ProjectLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch (creating if needed) the lock for a project id. The caller
    /// locks the returned mutex for the duration of its indexing run.
    ///
    /// The map keeps one entry per distinct project id ever indexed and
    /// is never pruned, so its size is bounded by the number of distinct
    /// projects seen by this process.
    pub async fn acquire(&self, project_id: &str) -> Arc<TokioMutex<()>> {
        let mut map = self.inner.lock().await;
        map.entry(project_id.to_string())
            .or_insert_with(|| Arc::new(TokioMutex::new(())))
            .clone()
    }
}
