//! [`PluginStore`](gantry_kernel::plugin::PluginStore) implementations.

mod memory;

pub use memory::InMemoryPluginStore;
