//! # Bundle Cache
//!
//! The response cache proper. Each bundle URL owns at most one record in the
//! backing store. Reads never fail: a missing, unreadable or corrupt record is
//! a miss, and unusable records are purged on the way out. Writes surface
//! their errors so the caller knows the cache is cold.

use std::sync::Arc;

use reqwest::header::HeaderMap;
use tracing::{debug, warn};

use crate::cache::providers::KeyValueStore;
use crate::cache::types::{CacheEntry, CacheLookup};
use crate::cache::utils::conditional_headers;
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::CacheError;

#[derive(Clone)]
pub struct BundleCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    config: Arc<CacheConfig>,
}

impl BundleCache {
    /// Create a cache over `store`, using the wall clock
    pub fn new(store: Arc<dyn KeyValueStore>, config: CacheConfig) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            config: Arc::new(config),
        }
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Get configuration reference
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Store key for a bundle URL. The URL is used verbatim.
    pub fn cache_key(&self, url: &str) -> String {
        format!("{}{}", self.config.key_prefix, url)
    }

    /// Look up the bundle cached for `url`.
    ///
    /// With `ignore_expiry` a valid entry is always returned as fresh.
    pub async fn get(&self, url: &str, ignore_expiry: bool) -> CacheLookup {
        let key = self.cache_key(url);

        let raw = match self.store.read(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(url = %url, "Bundle cache miss");
                return CacheLookup::Miss;
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to read bundle cache entry");
                self.purge(&key).await;
                return CacheLookup::Miss;
            }
        };

        let entry = match CacheEntry::decode(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(url = %url, error = %e, "Corrupt bundle cache entry, purging");
                self.purge(&key).await;
                return CacheLookup::Miss;
            }
        };

        if ignore_expiry || !entry.is_expired_at(self.clock.now_ms()) {
            debug!(url = %url, size = entry.code.len(), "Bundle cache hit");
            return CacheLookup::Fresh(entry.code);
        }

        debug!(
            url = %url,
            expiry = entry.expiry,
            has_etag = entry.etag.is_some(),
            has_last_modified = entry.last_modified.is_some(),
            "Bundle cache entry is stale"
        );
        CacheLookup::Stale(conditional_headers(&entry))
    }

    /// Cache `code` for `url` with freshness and validators taken from `headers`.
    ///
    /// An empty body is not cached and nothing is written.
    pub async fn set(&self, url: &str, code: &str, headers: &HeaderMap) -> Result<(), CacheError> {
        if code.is_empty() {
            debug!(url = %url, "Empty bundle body, not caching");
            return Ok(());
        }

        let entry = CacheEntry::from_response(
            code,
            headers,
            self.clock.now_ms(),
            self.config.default_ttl,
        );
        let json = serde_json::to_string(&entry)?;

        if let Err(e) = self.store.write(&self.cache_key(url), json).await {
            warn!(url = %url, error = %e, "Failed to write bundle cache entry");
            return Err(e.into());
        }

        debug!(
            url = %url,
            size = entry.code.len(),
            expiry = entry.expiry,
            "Cached bundle"
        );
        Ok(())
    }

    /// Refresh the metadata of an existing entry after a `304 Not Modified`.
    ///
    /// The cached body is kept, freshness and validators come from `headers`.
    /// Returns the cached body.
    pub async fn renew(&self, url: &str, headers: &HeaderMap) -> Result<String, CacheError> {
        let CacheLookup::Fresh(code) = self.get(url, true).await else {
            return Err(CacheError::MissingCacheItem(url.to_owned()));
        };

        self.set(url, &code, headers).await?;
        debug!(url = %url, "Renewed bundle cache entry");
        Ok(code)
    }

    /// Drop the entry for `url`, if any
    pub async fn remove(&self, url: &str) -> Result<(), CacheError> {
        self.store.remove(&self.cache_key(url)).await?;
        Ok(())
    }

    /// Best-effort removal on the read path
    async fn purge(&self, key: &str) {
        if let Err(e) = self.store.remove(key).await {
            warn!(key = %key, error = %e, "Failed to purge bundle cache entry");
        }
    }
}
