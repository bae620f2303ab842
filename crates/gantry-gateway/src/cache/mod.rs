//! [`ConfigCache`](gantry_kernel::plugin::ConfigCache) implementations.

mod memory;

pub use memory::{CacheStats, InMemoryConfigCache};
