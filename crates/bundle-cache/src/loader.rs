//! # Bundle Loader
//!
//! Drives the fetch-with-revalidation workflow on top of [`BundleCache`]:
//! serve fresh entries, revalidate stale ones with their validators, and
//! refresh the cache from `200` and `304` responses.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, info, warn};

use crate::cache::{BundleCache, CacheLookup};
use crate::config::LoaderConfig;
use crate::error::LoadError;

/// A response as seen by the loader
#[derive(Debug, Clone)]
pub struct FetchedBundle {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Empty for `304 Not Modified`
    pub body: String,
}

/// Performs the network request for a bundle
#[async_trait]
pub trait BundleFetcher: Send + Sync {
    /// GET `url` with the given extra (conditional) headers
    async fn fetch(&self, url: &str, conditional: &HeaderMap) -> Result<FetchedBundle, LoadError>;
}

/// Create a reqwest Client with the provided configuration
pub fn create_client(config: &LoaderConfig) -> Result<Client, LoadError> {
    let mut client_builder = Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(config.headers.clone())
        .redirect(if config.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        });

    if !config.timeout.is_zero() {
        client_builder = client_builder.timeout(config.timeout);
    }

    if !config.connect_timeout.is_zero() {
        client_builder = client_builder.connect_timeout(config.connect_timeout);
    }

    client_builder.build().map_err(LoadError::from)
}

/// [`BundleFetcher`] backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &LoaderConfig) -> Result<Self, LoadError> {
        Ok(Self {
            client: create_client(config)?,
        })
    }
}

#[async_trait]
impl BundleFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, conditional: &HeaderMap) -> Result<FetchedBundle, LoadError> {
        let parsed = Url::parse(url).map_err(|e| LoadError::UrlError(format!("{url}: {e}")))?;

        let response = self
            .client
            .get(parsed)
            .headers(conditional.clone())
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = if status == StatusCode::NOT_MODIFIED {
            String::new()
        } else {
            response.text().await?
        };

        debug!(url = %url, status = %status, size = body.len(), "Fetched bundle");
        Ok(FetchedBundle {
            status,
            headers,
            body,
        })
    }
}

/// Where a loaded bundle came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleSource {
    /// Served from a fresh cache entry without touching the network
    Cache,
    /// Cached body confirmed by a `304 Not Modified`
    Revalidated,
    /// Downloaded in full
    Network,
}

impl fmt::Display for BundleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BundleSource::Cache => "cache",
            BundleSource::Revalidated => "revalidated",
            BundleSource::Network => "network",
        };
        f.write_str(name)
    }
}

/// A bundle body together with its provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedBundle {
    pub code: String,
    pub source: BundleSource,
}

/// Loads bundles through the cache.
///
/// There is no request coalescing: concurrent loads of the same URL each go
/// to the network and the last write wins.
#[derive(Clone)]
pub struct BundleLoader {
    cache: BundleCache,
    fetcher: Arc<dyn BundleFetcher>,
}

impl BundleLoader {
    pub fn new(cache: BundleCache, fetcher: Arc<dyn BundleFetcher>) -> Self {
        Self { cache, fetcher }
    }

    pub fn cache(&self) -> &BundleCache {
        &self.cache
    }

    pub async fn load(&self, url: &str) -> Result<LoadedBundle, LoadError> {
        let validators = match self.cache.get(url, false).await {
            CacheLookup::Fresh(code) => {
                info!(url = %url, "Using cached bundle");
                return Ok(LoadedBundle {
                    code,
                    source: BundleSource::Cache,
                });
            }
            CacheLookup::Stale(validators) => validators,
            CacheLookup::Miss => HeaderMap::new(),
        };

        // A stale entry without validators cannot be revalidated
        if !validators.is_empty() {
            let fetched = self.fetcher.fetch(url, &validators).await?;

            if fetched.status != StatusCode::NOT_MODIFIED {
                return self.accept(url, fetched).await;
            }

            match self.cache.renew(url, &fetched.headers).await {
                Ok(code) => {
                    info!(url = %url, "Cached bundle revalidated");
                    return Ok(LoadedBundle {
                        code,
                        source: BundleSource::Revalidated,
                    });
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "Failed to renew cached bundle, refetching");
                }
            }
        }

        let fetched = self.fetcher.fetch(url, &HeaderMap::new()).await?;
        self.accept(url, fetched).await
    }

    /// Take a full response, caching it when possible
    async fn accept(&self, url: &str, fetched: FetchedBundle) -> Result<LoadedBundle, LoadError> {
        if !fetched.status.is_success() {
            return Err(LoadError::StatusCode(fetched.status));
        }

        // A cold cache is not fatal
        if let Err(e) = self.cache.set(url, &fetched.body, &fetched.headers).await {
            warn!(url = %url, error = %e, "Failed to cache bundle");
        }

        info!(url = %url, size = fetched.body.len(), "Downloaded bundle");
        Ok(LoadedBundle {
            code: fetched.body,
            source: BundleSource::Network,
        })
    }
}
