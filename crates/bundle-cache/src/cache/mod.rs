//! # Cache System
//!
//! This module provides the bundle response cache: one JSON record per bundle
//! URL in a key-value store, with HTTP freshness and revalidation semantics.

// Module declarations
mod manager;
pub mod providers;
mod types;
mod utils;

// Re-export primary types from our various modules
pub use manager::BundleCache;
pub use types::{CacheEntry, CacheLookup};
pub use utils::{conditional_headers, header_value, parse_max_age};

pub use providers::{FileStore, KeyValueStore, MemoryStore, StoreResult};
