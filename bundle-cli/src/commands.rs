use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bundle_cache::{
    BundleCache, BundleLoader, CacheConfig, CacheLookup, FileStore, HttpFetcher, LoadedBundle,
    LoaderConfig,
};
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::AppError;

/// Default cache location under the system temp directory
pub fn default_cache_dir() -> PathBuf {
    std::env::temp_dir().join("callobj-bundle-cache")
}

pub struct CommandExecutor {
    loader: BundleLoader,
}

impl CommandExecutor {
    pub fn new(cache_dir: PathBuf, loader_config: &LoaderConfig) -> Result<Self, AppError> {
        info!(cache_dir = ?cache_dir, "Using bundle cache directory");

        let store = Arc::new(FileStore::new(cache_dir));
        let cache = BundleCache::new(store, CacheConfig::default());
        let fetcher = Arc::new(HttpFetcher::new(loader_config)?);

        Ok(Self {
            loader: BundleLoader::new(cache, fetcher),
        })
    }

    /// Load the bundle and write it to `output`, or stdout when none is given
    pub async fn fetch(&self, url: &str, output: Option<&Path>) -> Result<LoadedBundle, AppError> {
        let bundle = self.loader.load(url).await?;
        info!(url = %url, source = %bundle.source, size = bundle.code.len(), "Bundle loaded");

        match output {
            Some(path) => {
                tokio::fs::write(path, bundle.code.as_bytes()).await?;
                info!(path = ?path, "Bundle written");
            }
            None => {
                let mut stdout = tokio::io::stdout();
                stdout.write_all(bundle.code.as_bytes()).await?;
                stdout.flush().await?;
            }
        }

        Ok(bundle)
    }

    /// Human readable description of the cache state for `url`
    pub async fn inspect(&self, url: &str) -> String {
        describe(&self.loader.cache().get(url, false).await)
    }

    pub async fn purge(&self, url: &str) -> Result<(), AppError> {
        self.loader.cache().remove(url).await?;
        info!(url = %url, "Purged cached bundle");
        Ok(())
    }
}

fn describe(lookup: &CacheLookup) -> String {
    match lookup {
        CacheLookup::Miss => "miss".to_string(),
        CacheLookup::Fresh(code) => format!("fresh ({} bytes)", code.len()),
        CacheLookup::Stale(validators) if validators.is_empty() => {
            "stale (no validators)".to_string()
        }
        CacheLookup::Stale(validators) => {
            let mut out = String::from("stale");
            for (name, value) in validators {
                let _ = write!(out, "\n  {}: {}", name, value.to_str().unwrap_or("<binary>"));
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundle_cache::KeyValueStore;
    use reqwest::header::{CACHE_CONTROL, HeaderMap, HeaderValue};
    use tempfile::tempdir;

    const URL: &str = "https://example.com/bundle.js";

    fn seeded_cache(dir: &Path) -> BundleCache {
        BundleCache::new(Arc::new(FileStore::new(dir)), CacheConfig::default())
    }

    #[tokio::test]
    async fn test_inspect_and_purge() {
        let temp = tempdir().unwrap();
        let executor = CommandExecutor::new(temp.path().to_path_buf(), &LoaderConfig::default())
            .unwrap();

        assert_eq!(executor.inspect(URL).await, "miss");

        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=600"));
        seeded_cache(temp.path())
            .set(URL, "bundle()", &headers)
            .await
            .unwrap();
        assert_eq!(executor.inspect(URL).await, "fresh (8 bytes)");

        executor.purge(URL).await.unwrap();
        assert_eq!(executor.inspect(URL).await, "miss");
    }

    #[tokio::test]
    async fn test_fetch_fresh_entry_writes_output() {
        let temp = tempdir().unwrap();
        let cache_dir = temp.path().join("cache");
        seeded_cache(&cache_dir)
            .set(URL, "bundle()", &HeaderMap::new())
            .await
            .unwrap();

        let executor = CommandExecutor::new(cache_dir, &LoaderConfig::default()).unwrap();
        let output = temp.path().join("bundle.js");
        let bundle = executor.fetch(URL, Some(output.as_path())).await.unwrap();

        assert_eq!(bundle.source, bundle_cache::BundleSource::Cache);
        assert_eq!(std::fs::read_to_string(output).unwrap(), "bundle()");
    }

    #[tokio::test]
    async fn test_describe_stale() {
        let temp = tempdir().unwrap();
        let store = FileStore::new(temp.path());
        let cache = seeded_cache(temp.path());

        store
            .write(
                &cache.cache_key(URL),
                r#"{"code":"x","expiry":0,"etag":"\"v1\""}"#.to_string(),
            )
            .await
            .unwrap();
        assert_eq!(
            describe(&cache.get(URL, false).await),
            "stale\n  if-none-match: \"v1\""
        );

        assert_eq!(describe(&CacheLookup::Stale(HeaderMap::new())), "stale (no validators)");
    }
}
