//! Plugin configuration kernel contract.
//!
//! Types and traits shared by every component that takes part in resolving
//! the effective configuration of a plugin for one request.
//!
//! # Specificity hierarchy
//!
//! A plugin may be configured at four levels.  The most specific row wins:
//!
//! ```text
//! API + Consumer  >  Consumer only  >  API only  >  Global
//! ```

pub mod cache;
pub mod context;
pub mod error;
pub mod store;
pub mod types;

// ── Flat re-exports ────────────────────────────────────────────────────────

pub use cache::{CachedRow, ConfigCache, RowLoader};
pub use context::{Api, Consumer, PluginsForRequest, RequestContext, RequestPhase};
pub use error::{CacheError, DefinitionError, ResolveError, StoreError, TaskError};
pub use store::PluginStore;
pub use types::{
    ApiId, CacheKey, ConsumerId, LoadedPlugins, PluginConfig, PluginConfigRow, PluginDefinition,
    PluginFilter, PluginSchema, Specificity,
};
