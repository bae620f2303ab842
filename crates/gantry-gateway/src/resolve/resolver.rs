//! Single-triple configuration lookup through the shared cache.

use futures::FutureExt;
use gantry_kernel::plugin::{
    ConfigCache, PluginConfig, PluginConfigRow, PluginFilter, PluginStore, ResolveError,
    StoreError,
};
use std::sync::Arc;
use tracing::{trace, warn};

/// Resolves the configuration stored for one `(api_id, consumer_id, name)`
/// triple.
///
/// Cheap to clone: both collaborators are shared.
#[derive(Clone)]
pub struct ConfigResolver {
    cache: Arc<dyn ConfigCache>,
    store: Arc<dyn PluginStore>,
}

impl ConfigResolver {
    pub fn new(cache: Arc<dyn ConfigCache>, store: Arc<dyn PluginStore>) -> Self {
        Self { cache, store }
    }

    /// Effective configuration of the triple.
    ///
    /// Returns `Ok(None)` when no row exists or the row is disabled.  A row
    /// with a null configuration resolves to an empty object.
    pub async fn resolve(
        &self,
        filter: PluginFilter,
    ) -> Result<Option<PluginConfig>, ResolveError> {
        let key = filter.cache_key();
        let loader = load_from_store(Arc::clone(&self.store), filter).boxed();

        let row = self.cache.get_or_load(&key, loader).await.map_err(|source| {
            warn!(cache_key = %key, error = %source, "plugin configuration lookup failed");
            ResolveError::Cache {
                key: key.to_string(),
                source,
            }
        })?;

        trace!(cache_key = %key, found = row.is_some(), "plugin configuration looked up");
        Ok(row
            .filter(|row| row.enabled)
            .map(|row| row.config.clone().unwrap_or_default()))
    }

    /// Evict the cached row of a triple, e.g. after it was written.
    pub async fn invalidate(&self, filter: &PluginFilter) {
        self.cache.invalidate(&filter.cache_key()).await;
    }
}

/// Query the datastore and keep the first row that exactly matches the
/// triple.  The store is asked for exactly this triple already; the match is
/// re-checked in case an implementation returns wider results.
async fn load_from_store(
    store: Arc<dyn PluginStore>,
    filter: PluginFilter,
) -> Result<Option<PluginConfigRow>, StoreError> {
    let rows = store.find_all(&filter).await?;
    Ok(rows.into_iter().find(|row| filter.matches(row)))
}
