//! Runtime configuration of a Gantry gateway instance.
//!
//! ```toml
//! [cache]
//! ttl_secs = 3600
//! neg_ttl_secs = 300
//!
//! [[plugins]]
//! name = "rate-limiting"
//!
//! [[plugins]]
//! name = "key-auth"
//! [plugins.schema]
//! no_consumer = true
//!
//! [[plugin_rows]]
//! api_id = "api1"
//! name = "rate-limiting"
//! config = { limit = 10 }
//! ```
//!
//! Scalar settings can be overridden from the environment when loading a
//! file, e.g. `GANTRY_CACHE__TTL_SECS=60`.

use crate::cache::InMemoryConfigCache;
use crate::error::GatewayResult;
use crate::store::InMemoryPluginStore;
use gantry_kernel::config::{Format, from_str, load_with_env};
use gantry_kernel::plugin::{LoadedPlugins, PluginConfigRow, PluginDefinition};
use serde::Deserialize;
use std::time::Duration;

/// Lifetimes of cached plugin rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CacheSettings {
    /// Seconds a found row stays cached; unset means until invalidated.
    #[serde(default)]
    pub ttl_secs: Option<u64>,
    /// Seconds a "no row" result stays cached; unset means until invalidated.
    #[serde(default)]
    pub neg_ttl_secs: Option<u64>,
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GantryConfig {
    #[serde(default)]
    pub cache: CacheSettings,
    /// Installed plugins in pipeline order.
    #[serde(default)]
    pub plugins: Vec<PluginDefinition>,
    /// Rows the in-memory store is seeded with.
    #[serde(default)]
    pub plugin_rows: Vec<PluginConfigRow>,
}

impl GantryConfig {
    /// Prefix of environment overrides applied by [`GantryConfig::load`].
    pub const ENV_PREFIX: &'static str = "GANTRY";

    /// Load from a file; the format follows the extension.  `GANTRY_`
    /// environment variables override file values.
    pub fn load(path: &str) -> GatewayResult<Self> {
        Ok(load_with_env(path, Self::ENV_PREFIX)?)
    }

    pub fn from_toml(content: &str) -> GatewayResult<Self> {
        Ok(from_str(content, Format::Toml)?)
    }

    /// The validated plugin list.
    pub fn loaded_plugins(&self) -> GatewayResult<LoadedPlugins> {
        Ok(LoadedPlugins::new(self.plugins.clone())?)
    }

    pub fn build_cache(&self) -> InMemoryConfigCache {
        InMemoryConfigCache::with_ttl(
            self.cache.ttl_secs.map(Duration::from_secs),
            self.cache.neg_ttl_secs.map(Duration::from_secs),
        )
    }

    /// An in-memory store holding the seed rows.
    ///
    /// Fails if two seed rows target the same triple.
    pub async fn build_store(&self) -> GatewayResult<InMemoryPluginStore> {
        let store = InMemoryPluginStore::new();
        for row in &self.plugin_rows {
            store.insert(row.clone()).await.map_err(|e| {
                crate::error::GatewayError::InvalidConfig(format!("seed row rejected: {e}"))
            })?;
        }
        Ok(store)
    }
}
