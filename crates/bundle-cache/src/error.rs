use reqwest::StatusCode;

/// Errors surfaced by the write side of the bundle cache.
///
/// Read-side failures never show up here: they degrade to a cache miss.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Failed to serialize cache entry: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Missing cache item for {0}")]
    MissingCacheItem(String),
}

/// Errors produced while loading a bundle
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Server returned status code {0}")]
    StatusCode(StatusCode),

    #[error("Invalid URL: {0}")]
    UrlError(String),
}
