//! Per-product mutual exclusion.
//!
//! All chain-mutating work for one product (history read, resolution,
//! recompute, persist) must be serialized, while unrelated products stay
//! fully independent. A single global lock would serialize every product
//! behind every other and is exactly the defect this registry avoids: each
//! product gets its own async mutex, created on first use.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-product async locks.
///
/// The outer mutex only guards the map itself and is held for the duration
/// of a lookup, never across an await on a product lock.
#[derive(Default)]
pub struct ProductLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ProductLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for a product, waiting until any in-flight
    /// submission for the same product completes.
    pub async fn acquire(&self, product_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            Arc::clone(
                map.entry(product_id.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        lock.lock_owned().await
    }

    /// Drop registry entries nobody currently holds or waits on. Called
    /// opportunistically so the map does not grow with every product ever
    /// seen.
    pub async fn purge_idle(&self) {
        let mut map = self.inner.lock().await;
        map.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    /// Number of tracked products (diagnostics).
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
