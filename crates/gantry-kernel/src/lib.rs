//! `gantry-kernel`: data model and collaborator contracts for per-request
//! plugin configuration resolution.
//!
//! This crate defines *what* is resolved and *whom* the resolver talks to.
//! No concrete resolution logic lives here; that belongs in `gantry-gateway`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              gantry-kernel  (this crate)                    │
//! │  PluginDefinition / LoadedPlugins   PluginConfigRow         │
//! │  PluginFilter / CacheKey            RequestContext          │
//! │  PluginStore trait                  ConfigCache trait       │
//! └──────────────────────────┬──────────────────────────────────┘
//!                            │  depends on
//! ┌──────────────────────────▼──────────────────────────────────┐
//! │              gantry-gateway  (runtime crate)                │
//! │  ConfigResolver   FallbackLoader   run_parallel             │
//! │  PluginConfigIterator                                       │
//! │  InMemoryConfigCache / InMemoryPluginStore                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

// plugin module
pub mod plugin;
pub use plugin::*;

// config module
#[cfg(feature = "config")]
pub mod config;
