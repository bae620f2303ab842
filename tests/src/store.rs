use async_trait::async_trait;
use gantry_kernel::plugin::{PluginConfigRow, PluginFilter, PluginStore, StoreError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// A mock plugin datastore.
///
/// It holds stubbed rows, records every filter it is queried with, and can
/// be told to fail or to answer slowly for specific triples.
#[derive(Clone, Default)]
pub struct MockPluginStore {
    rows: Arc<RwLock<Vec<PluginConfigRow>>>,
    failures: Arc<RwLock<HashMap<PluginFilter, StoreError>>>,
    delays: Arc<RwLock<HashMap<PluginFilter, Duration>>>,
    /// Track every filter passed to `find_all`
    pub query_history: Arc<RwLock<Vec<PluginFilter>>>,
}

impl MockPluginStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store holding `rows`.
    pub fn with_rows(rows: impl IntoIterator<Item = PluginConfigRow>) -> Self {
        Self {
            rows: Arc::new(RwLock::new(rows.into_iter().collect())),
            ..Self::default()
        }
    }

    pub async fn add_row(&self, row: PluginConfigRow) {
        self.rows.write().await.push(row);
    }

    /// Make queries for `filter` fail with `error`.
    pub async fn fail_on(&self, filter: PluginFilter, error: StoreError) {
        self.failures.write().await.insert(filter, error);
    }

    /// Make queries for `filter` take at least `delay`.
    pub async fn delay_on(&self, filter: PluginFilter, delay: Duration) {
        self.delays.write().await.insert(filter, delay);
    }

    /// Retrieve every filter queried so far, in call order.
    pub async fn history(&self) -> Vec<PluginFilter> {
        self.query_history.read().await.clone()
    }

    /// Total number of queries.
    pub async fn query_count(&self) -> usize {
        self.query_history.read().await.len()
    }

    /// Number of queries issued for one triple.
    pub async fn queries_for(&self, filter: &PluginFilter) -> usize {
        self.query_history
            .read()
            .await
            .iter()
            .filter(|f| *f == filter)
            .count()
    }
}

#[async_trait]
impl PluginStore for MockPluginStore {
    async fn find_all(&self, filter: &PluginFilter) -> Result<Vec<PluginConfigRow>, StoreError> {
        debug!(key = %filter.cache_key(), "mock store queried");
        self.query_history.write().await.push(filter.clone());

        let delay = self.delays.read().await.get(filter).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.failures.read().await.get(filter) {
            return Err(err.clone());
        }

        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect())
    }
}

#[macro_export]
macro_rules! assert_store_queried {
    ($store:expr, $expected_count:expr) => {
        let count = $store.query_count().await;
        assert_eq!(
            count, $expected_count,
            "Expected the plugin store to be queried {} times, but it was queried {} times",
            $expected_count, count
        );
    };
}
