//! Datastore contract.

use super::error::StoreError;
use super::types::{PluginConfigRow, PluginFilter};
use async_trait::async_trait;

/// Persistence layer holding plugin configuration rows.
///
/// Implementations must be `Send + Sync` so one store can be shared by every
/// in-flight request.
#[async_trait]
pub trait PluginStore: Send + Sync {
    /// Return every row matching `filter`.
    ///
    /// A failed query must be reported as `Err`, never as an empty result:
    /// callers treat an empty result as "not configured".
    async fn find_all(&self, filter: &PluginFilter) -> Result<Vec<PluginConfigRow>, StoreError>;
}
