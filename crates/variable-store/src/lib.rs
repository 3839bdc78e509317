//! Bounded-memory variable cache shared across repeated dataset lookups.
//!
//! [`VariableStore`] lazily reads named variables from one or two backing
//! gridded datasets (a model dataset and an optional separate reference
//! dataset), caches fully- or partially-read arrays, and evicts cached
//! variables under a configured memory budget.

pub mod config;
pub mod store;

pub use config::StoreConfig;
pub use store::{CacheStats, VariableHandle, VariableStore};
