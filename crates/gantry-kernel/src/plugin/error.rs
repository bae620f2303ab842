//! Error types for plugin configuration resolution.
//!
//! A plugin without an applicable configuration is *not* an error: it is the
//! valid "absent" outcome (`Ok(None)`).  Every variant here means the request
//! cannot be served with a trustworthy plugin configuration.
//!
//! All types are `Clone` so a single outcome can be handed out by the
//! concurrency harness and the shared cache without re-running the work.

use thiserror::Error;

/// Failure of the datastore collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    /// The query itself failed.
    #[error("plugin query failed: {0}")]
    Query(String),

    /// The datastore could not be reached.
    #[error("datastore unavailable: {0}")]
    Unavailable(String),

    /// A row already exists for the same `(api_id, consumer_id, name)` triple.
    #[error("plugin row already exists for {0}")]
    Conflict(String),
}

/// Failure of the shared cache collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum CacheError {
    /// The loader ran and the datastore failed.
    #[error("cache load failed: {0}")]
    Load(#[from] StoreError),

    /// The cache failed independently of the loader.
    #[error("cache failure: {0}")]
    Internal(String),
}

/// Failure of a unit of work started by the concurrency harness.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TaskError {
    /// The spawned task panicked or was cancelled.
    #[error("task did not complete: {0}")]
    Join(String),

    /// No operation was started at this index.
    #[error("no operation at index {0}")]
    OutOfRange(usize),
}

/// Failure to resolve the configuration of a plugin.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResolveError {
    #[error("failed to load plugin configuration '{key}': {source}")]
    Cache {
        key: String,
        #[source]
        source: CacheError,
    },

    #[error("lookup for plugin '{plugin}' failed: {source}")]
    Task {
        plugin: String,
        #[source]
        source: TaskError,
    },
}

/// Definition-time error in the list of loaded plugins.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum DefinitionError {
    #[error("plugin name cannot be empty")]
    EmptyPluginName,

    #[error("plugin '{0}' is loaded more than once")]
    DuplicatePlugin(String),
}
