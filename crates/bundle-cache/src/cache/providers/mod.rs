//! # Store Providers
//!
//! This module contains the storage port and its implementations.

// Re-export providers for easier access
pub use self::file::FileStore;
pub use self::memory::MemoryStore;
pub use self::provider::{KeyValueStore, StoreResult};

// Provider interface
pub mod provider;

// Individual provider implementations
pub mod file;
pub mod memory;
