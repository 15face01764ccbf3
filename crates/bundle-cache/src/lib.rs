//! # Bundle Cache
//!
//! A small persistent cache for the call object bundle, the text payload the
//! call client downloads before it can join a meeting.
//!
//! ## Features
//!
//! - One record per bundle URL, stored as JSON in a key-value store
//! - HTTP freshness from `cache-control: max-age`, with a fixed default
//! - Conditional revalidation through `ETag` / `Last-Modified` validators
//! - Self-healing reads: corrupt records are purged and reported as misses
//! - A loader that drives the full fetch-with-revalidation workflow

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod loader;

pub use cache::{
    BundleCache, CacheEntry, CacheLookup, FileStore, KeyValueStore, MemoryStore,
    conditional_headers, parse_max_age,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, LoaderConfig};
pub use error::{CacheError, LoadError};
pub use loader::{
    BundleFetcher, BundleLoader, BundleSource, FetchedBundle, HttpFetcher, LoadedBundle,
};
