// In-memory store for partially-completed tracking selections.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::db::SizeTier;
use crate::metrics;

/// A user's in-flight selection: the size they chose, awaiting a monster.
/// Process-local and non-durable; lost on restart, which the flow treats
/// as a recoverable user error.
#[derive(Debug, Clone, Copy)]
struct PendingSelection {
    size: SizeTier,
    inserted_at: Instant,
}

/// Thread-safe per-user session store for the two-step tracking flow.
///
/// Entries are keyed by user, so two users never interfere. A single user
/// double-submitting concurrently races last-write-wins on their own entry,
/// which is acceptable at human interaction latency. Abandoned entries are
/// overwritten by the next size selection or evicted once they outlive the
/// TTL.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<String, PendingSelection>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Store the user's size choice, replacing any stale pending entry.
    pub fn put_size(&self, user_id: &str, size: SizeTier) {
        let mut map = self.inner.lock().unwrap();
        map.insert(
            user_id.to_string(),
            PendingSelection {
                size,
                inserted_at: Instant::now(),
            },
        );
        metrics::PENDING_SELECTIONS.set(map.len() as i64);
    }

    /// The user's pending size choice, without consuming it. Expired
    /// entries are dropped and reported as absent.
    pub fn peek_size(&self, user_id: &str) -> Option<SizeTier> {
        let mut map = self.inner.lock().unwrap();
        match map.get(user_id) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.size),
            Some(_) => {
                map.remove(user_id);
                metrics::PENDING_SELECTIONS.set(map.len() as i64);
                None
            }
            None => None,
        }
    }

    /// Remove the user's pending entry, if any.
    pub fn clear(&self, user_id: &str) {
        let mut map = self.inner.lock().unwrap();
        map.remove(user_id);
        metrics::PENDING_SELECTIONS.set(map.len() as i64);
    }

    /// Drop everything older than the TTL.
    pub fn evict_expired(&self) {
        let mut map = self.inner.lock().unwrap();
        let ttl = self.ttl;
        map.retain(|_, entry| entry.inserted_at.elapsed() < ttl);
        metrics::PENDING_SELECTIONS.set(map.len() as i64);
    }

    /// Number of live pending selections (for tests/diagnostics).
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }
}

/// Spawn a background task that periodically sweeps expired selections,
/// so abandoned flows do not accumulate between accesses.
pub fn spawn_eviction_task(store: SessionStore, interval: Duration) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            store.evict_expired();
        }
    });
}
