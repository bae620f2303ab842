//! In-process single-flight [`ConfigCache`].

use async_trait::async_trait;
use dashmap::DashMap;
use gantry_kernel::plugin::{CacheError, CacheKey, CachedRow, ConfigCache, RowLoader};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::debug;

/// A loaded value and when it was loaded.
#[derive(Debug)]
struct Stamped {
    row: CachedRow,
    loaded_at: Instant,
}

type Cell = Arc<OnceCell<Stamped>>;

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from an already-loaded entry.
    pub hits: u64,
    /// Loader runs (one per single-flight load, successful or not).
    /// Callers that joined an in-flight load count as hits.
    pub loads: u64,
    /// Keys currently held.
    pub entries: usize,
}

/// [`ConfigCache`] backed by a `DashMap` of per-key once-cells.
///
/// Concurrent lookups of one key share a single loader run.  A failed load
/// leaves the cell empty, so the next lookup retries instead of caching the
/// failure.  Found rows expire after `ttl`, not-found results after
/// `neg_ttl`; `None` means never.
pub struct InMemoryConfigCache {
    entries: DashMap<CacheKey, Cell>,
    ttl: Option<Duration>,
    neg_ttl: Option<Duration>,
    hits: AtomicU64,
    loads: AtomicU64,
}

impl Default for InMemoryConfigCache {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryConfigCache {
    /// Cache whose entries never expire.
    pub fn new() -> Self {
        Self::with_ttl(None, None)
    }

    pub fn with_ttl(ttl: Option<Duration>, neg_ttl: Option<Duration>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            neg_ttl,
            hits: AtomicU64::new(0),
            loads: AtomicU64::new(0),
        }
    }

    fn is_expired(&self, stamped: &Stamped) -> bool {
        let ttl = if stamped.row.is_some() {
            self.ttl
        } else {
            self.neg_ttl
        };
        ttl.is_some_and(|ttl| stamped.loaded_at.elapsed() >= ttl)
    }

    /// The cell for `key`, replacing it first if its value expired.
    fn cell(&self, key: &CacheKey) -> Cell {
        let mut entry = self.entries.entry(key.clone()).or_default();
        if entry.value().get().is_some_and(|s| self.is_expired(s)) {
            debug!(cache_key = %key, "cached plugin row expired");
            *entry.value_mut() = Cell::default();
        }
        Arc::clone(entry.value())
    }

    /// Drop every entry.
    pub fn purge(&self) {
        self.entries.clear();
    }

    /// Remove expired entries, and empty ones no lookup is waiting on, to
    /// keep memory bounded.
    ///
    /// Call this periodically from a background task when TTLs are set.
    pub fn gc(&self) {
        self.entries.retain(|_, cell| match cell.get() {
            Some(stamped) => !self.is_expired(stamped),
            None => Arc::strong_count(cell) > 1,
        });
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }
}

#[async_trait]
impl ConfigCache for InMemoryConfigCache {
    async fn get_or_load(
        &self,
        key: &CacheKey,
        loader: RowLoader,
    ) -> Result<CachedRow, CacheError> {
        let cell = self.cell(key);

        if let Some(stamped) = cell.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(stamped.row.clone());
        }

        let loads = &self.loads;
        let ran_loader = AtomicBool::new(false);
        let loaded = cell
            .get_or_try_init(|| async {
                ran_loader.store(true, Ordering::Relaxed);
                loads.fetch_add(1, Ordering::Relaxed);
                let row = loader.await?;
                Ok::<_, CacheError>(Stamped {
                    row: row.map(Arc::new),
                    loaded_at: Instant::now(),
                })
            })
            .await;

        match loaded {
            Ok(stamped) => {
                if !ran_loader.load(Ordering::Relaxed) {
                    // Joined another caller's load.
                    self.hits.fetch_add(1, Ordering::Relaxed);
                }
                Ok(stamped.row.clone())
            }
            Err(err) => {
                self.entries.remove_if(key, |_, current| {
                    Arc::ptr_eq(current, &cell) && current.get().is_none()
                });
                Err(err)
            }
        }
    }

    async fn invalidate(&self, key: &CacheKey) {
        if self.entries.remove(key).is_some() {
            debug!(cache_key = %key, "cached plugin row invalidated");
        }
    }
}
