//! Plugin configuration resolution.
//!
//! Leaves first:
//!
//! - [`parallel`]: concurrent fan-out with deferred blocking.
//! - [`resolver`]: one `(api, consumer, name)` lookup through the cache.
//! - [`fallback`]: the specificity hierarchy for one plugin.

pub mod fallback;
pub mod parallel;
pub mod resolver;

pub use fallback::{FallbackLoader, fallback_chain};
pub use parallel::{Operation, ParallelResults, Slot, run_parallel};
pub use resolver::ConfigResolver;
