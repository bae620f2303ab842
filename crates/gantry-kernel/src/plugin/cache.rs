//! Shared cache contract.

use super::error::{CacheError, StoreError};
use super::types::{CacheKey, PluginConfigRow};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Value cached per key: the authoritative row, or `None` when no row exists
/// for the triple.
pub type CachedRow = Option<Arc<PluginConfigRow>>;

/// Deferred datastore load.  Only polled by the cache on a miss.
pub type RowLoader = BoxFuture<'static, Result<Option<PluginConfigRow>, StoreError>>;

/// Process-wide cache of resolved plugin rows.
///
/// Implementations must guarantee *single-flight* loading: while a load for
/// a key is in progress, concurrent callers for the same key wait for that
/// load instead of starting their own.
#[async_trait]
pub trait ConfigCache: Send + Sync {
    /// Return the cached value for `key`, running `loader` to fill it when
    /// the key is absent or expired.
    async fn get_or_load(&self, key: &CacheKey, loader: RowLoader) -> Result<CachedRow, CacheError>;

    /// Drop the cached value for `key`.  The next lookup reloads it.
    async fn invalidate(&self, key: &CacheKey);
}
