//! Per-product mutual exclusion.
//!
//! A review mutation and the recompute that follows it run while holding the
//! lock for the review's product, so two requests touching the same product
//! never interleave their read-modify-write of the aggregate.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use reviews_core::ProductId;

/// Async locks keyed by product.
///
/// Entries are created on demand and dropped again once nobody holds or
/// waits on them.
#[derive(Debug, Default)]
pub struct ProductLocks {
    locks: DashMap<ProductId, Arc<Mutex<()>>>,
}

impl ProductLocks {
    /// Create an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `product_id`.
    pub async fn lock(&self, product_id: ProductId) -> ProductGuard<'_> {
        let mutex = Arc::clone(self.locks.entry(product_id).or_default().value());
        let guard = mutex.lock_owned().await;

        ProductGuard {
            locks: self,
            product_id,
            guard: Some(guard),
        }
    }

    /// Number of products currently locked or waited on.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no product is currently locked or waited on.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Held lock on one product. Released on drop.
#[derive(Debug)]
pub struct ProductGuard<'a> {
    locks: &'a ProductLocks,
    product_id: ProductId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ProductGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map still references the mutex: nobody is waiting.
        self.locks
            .locks
            .remove_if(&self.product_id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
