//! In-memory [`PluginStore`] implementation.

use async_trait::async_trait;
use gantry_kernel::plugin::{PluginConfigRow, PluginFilter, PluginStore, StoreError};
use tokio::sync::RwLock;
use uuid::Uuid;

/// [`PluginStore`] backed by a `Vec` of rows.
///
/// Suitable for single-node deployments and tests.  At most one row is kept
/// per `(api_id, consumer_id, name)` triple.
#[derive(Default)]
pub struct InMemoryPluginStore {
    rows: RwLock<Vec<PluginConfigRow>>,
}

impl InMemoryPluginStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row; fails if the triple is already configured.
    pub async fn insert(&self, row: PluginConfigRow) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        let filter = row.filter();
        if rows.iter().any(|r| filter.matches(r)) {
            return Err(StoreError::Conflict(filter.cache_key().to_string()));
        }
        rows.push(row);
        Ok(())
    }

    /// Add a row, replacing the row previously stored for the same triple.
    pub async fn upsert(&self, row: PluginConfigRow) {
        let mut rows = self.rows.write().await;
        let filter = row.filter();
        match rows.iter_mut().find(|r| filter.matches(r)) {
            Some(existing) => *existing = row,
            None => rows.push(row),
        }
    }

    /// Remove a row by id, returning it.
    pub async fn remove(&self, id: Uuid) -> Option<PluginConfigRow> {
        let mut rows = self.rows.write().await;
        let index = rows.iter().position(|r| r.id == id)?;
        Some(rows.remove(index))
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl PluginStore for InMemoryPluginStore {
    async fn find_all(&self, filter: &PluginFilter) -> Result<Vec<PluginConfigRow>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows.iter().filter(|r| filter.matches(r)).cloned().collect())
    }
}
