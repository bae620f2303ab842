//! `gantry-gateway`: per-request plugin configuration runtime.
//!
//! This crate provides the resolution machinery and reference
//! implementations of the contracts defined in `gantry-kernel::plugin`:
//!
//! | Kernel contract | Implementation |
//! |----------------|----------------|
//! | [`ConfigCache`] | [`cache::InMemoryConfigCache`] |
//! | [`PluginStore`] | [`store::InMemoryPluginStore`] |
//!
//! Resolution is layered, leaves first: [`resolve::run_parallel`] (fan-out
//! harness), [`resolve::ConfigResolver`] (one cached lookup),
//! [`resolve::FallbackLoader`] (specificity hierarchy for one plugin) and
//! [`iterator::PluginConfigIterator`] (the per-request sequence consumed by
//! the dispatcher).
//!
//! [`ConfigCache`]: gantry_kernel::plugin::ConfigCache
//! [`PluginStore`]: gantry_kernel::plugin::PluginStore
//!
//! # Quick start
//!
//! ```rust,no_run
//! use gantry_gateway::cache::InMemoryConfigCache;
//! use gantry_gateway::iterator::PluginConfigIterator;
//! use gantry_gateway::resolve::{ConfigResolver, FallbackLoader};
//! use gantry_gateway::store::InMemoryPluginStore;
//! use gantry_kernel::plugin::{
//!     Api, LoadedPlugins, PluginConfigRow, PluginDefinition, RequestContext, RequestPhase,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = InMemoryPluginStore::new();
//!     store.insert(PluginConfigRow::new("cors")).await.unwrap();
//!
//!     let loader = FallbackLoader::new(ConfigResolver::new(
//!         Arc::new(InMemoryConfigCache::new()),
//!         Arc::new(store),
//!     ));
//!     let plugins = LoadedPlugins::new(vec![PluginDefinition::new("cors")]).unwrap();
//!     let mut ctx = RequestContext::new("req-1").with_api(Api::new("api1", "orders"));
//!
//!     let mut it =
//!         PluginConfigIterator::for_phase(&loader, &plugins, &mut ctx, RequestPhase::Access);
//!     while let Some((plugin, config)) = it.next().await.unwrap() {
//!         println!("{} -> {:?}", plugin.name, config);
//!     }
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod iterator;
pub mod resolve;
pub mod store;

// Re-export the kernel plugin types for convenience.
pub use gantry_kernel::plugin;
