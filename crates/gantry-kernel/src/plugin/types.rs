//! Core data types for plugin configuration resolution.
//!
//! These types are shared by the resolver, the fallback loader, the iterator
//! and the external collaborators ([`PluginStore`](super::store::PluginStore),
//! [`ConfigCache`](super::cache::ConfigCache)) and carry no runtime
//! dependencies beyond `serde`, `uuid` and `std`.

use super::error::DefinitionError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::ops::Deref;
use uuid::Uuid;

/// Effective configuration object of one plugin.
pub type PluginConfig = serde_json::Map<String, serde_json::Value>;

// ─────────────────────────────────────────────────────────────────────────────
// Identifiers
// ─────────────────────────────────────────────────────────────────────────────

/// Stable identifier of an API entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiId(String);

impl ApiId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ApiId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Stable identifier of a Consumer entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsumerId(String);

impl ConsumerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConsumerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugin definitions
// ─────────────────────────────────────────────────────────────────────────────

/// Static schema metadata of a plugin type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSchema {
    /// The plugin cannot be configured per consumer.  Consumer-scoped rows
    /// are never looked up for it, even on authenticated requests.
    #[serde(default)]
    pub no_consumer: bool,
}

/// A plugin type installed on this gateway instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDefinition {
    pub name: String,
    #[serde(default)]
    pub schema: PluginSchema,
}

impl PluginDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: PluginSchema::default(),
        }
    }

    /// Builder helper: mark the plugin as not configurable per consumer.
    pub fn without_consumer(mut self) -> Self {
        self.schema.no_consumer = true;
        self
    }

    /// Whether consumer-scoped configuration rows apply to this plugin.
    pub fn allows_consumer(&self) -> bool {
        !self.schema.no_consumer
    }
}

/// Ordered sequence of installed plugins.
///
/// The order is the execution order of the whole pipeline.  Names are
/// guaranteed non-empty and unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedPlugins(Vec<PluginDefinition>);

impl LoadedPlugins {
    pub fn new(plugins: Vec<PluginDefinition>) -> Result<Self, DefinitionError> {
        let mut seen = HashSet::with_capacity(plugins.len());
        for plugin in &plugins {
            if plugin.name.trim().is_empty() {
                return Err(DefinitionError::EmptyPluginName);
            }
            if !seen.insert(plugin.name.as_str()) {
                return Err(DefinitionError::DuplicatePlugin(plugin.name.clone()));
            }
        }
        Ok(Self(plugins))
    }
}

impl Deref for LoadedPlugins {
    type Target = [PluginDefinition];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Persisted rows
// ─────────────────────────────────────────────────────────────────────────────

/// A persisted plugin configuration record.
///
/// `api_id`/`consumer_id` of `None` widen the scope of the row: a row with
/// neither is the global configuration of the plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginConfigRow {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub api_id: Option<ApiId>,
    #[serde(default)]
    pub consumer_id: Option<ConsumerId>,
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub config: Option<PluginConfig>,
}

fn default_enabled() -> bool {
    true
}

impl PluginConfigRow {
    /// Construct an enabled global row with no configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            api_id: None,
            consumer_id: None,
            name: name.into(),
            enabled: true,
            config: None,
        }
    }

    /// Builder helper: scope the row to an API.
    pub fn for_api(mut self, api_id: impl Into<ApiId>) -> Self {
        self.api_id = Some(api_id.into());
        self
    }

    /// Builder helper: scope the row to a Consumer.
    pub fn for_consumer(mut self, consumer_id: impl Into<ConsumerId>) -> Self {
        self.consumer_id = Some(consumer_id.into());
        self
    }

    /// Builder helper: set the configuration object.
    pub fn with_config(mut self, config: PluginConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Builder helper: set the enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The lookup triple this row is authoritative for.
    pub fn filter(&self) -> PluginFilter {
        PluginFilter {
            api_id: self.api_id.clone(),
            consumer_id: self.consumer_id.clone(),
            name: self.name.clone(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lookup triple
// ─────────────────────────────────────────────────────────────────────────────

/// Level of the specificity hierarchy a lookup triple targets.
///
/// Variants are declared from most to least specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Specificity {
    ApiConsumer,
    Consumer,
    Api,
    Global,
}

impl Specificity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Specificity::ApiConsumer => "api+consumer",
            Specificity::Consumer => "consumer",
            Specificity::Api => "api",
            Specificity::Global => "global",
        }
    }
}

/// One `(api_id, consumer_id, name)` lookup.
///
/// Used both as the datastore query filter and as the source of the
/// [`CacheKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PluginFilter {
    pub api_id: Option<ApiId>,
    pub consumer_id: Option<ConsumerId>,
    pub name: String,
}

impl PluginFilter {
    pub fn new(
        api_id: Option<ApiId>,
        consumer_id: Option<ConsumerId>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            api_id,
            consumer_id,
            name: name.into(),
        }
    }

    /// Exact match on all three components.  A `None` component only matches
    /// a row whose corresponding field is also `None`.
    pub fn matches(&self, row: &PluginConfigRow) -> bool {
        row.name == self.name && row.api_id == self.api_id && row.consumer_id == self.consumer_id
    }

    pub fn specificity(&self) -> Specificity {
        match (&self.api_id, &self.consumer_id) {
            (Some(_), Some(_)) => Specificity::ApiConsumer,
            (None, Some(_)) => Specificity::Consumer,
            (Some(_), None) => Specificity::Api,
            (None, None) => Specificity::Global,
        }
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::for_filter(self)
    }
}

/// Cache key of a lookup triple.
///
/// Derivation is deterministic: identical triples always produce identical
/// keys, which the single-flight contract of the cache relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(name: &str, api_id: Option<&ApiId>, consumer_id: Option<&ConsumerId>) -> Self {
        Self(format!(
            "plugins:{}:{}:{}",
            name,
            api_id.map(ApiId::as_str).unwrap_or_default(),
            consumer_id.map(ConsumerId::as_str).unwrap_or_default(),
        ))
    }

    pub fn for_filter(filter: &PluginFilter) -> Self {
        Self::new(
            &filter.name,
            filter.api_id.as_ref(),
            filter.consumer_id.as_ref(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
