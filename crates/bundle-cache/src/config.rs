use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// Namespace for bundle records in a shared key-value store
pub const DEFAULT_KEY_PREFIX: &str = "callobj_bundle_";

/// Freshness window used when a response carries no usable `max-age`
pub const DEFAULT_TTL: Duration = Duration::from_millis(60_000);

const DEFAULT_USER_AGENT: &str = concat!("callobj-bundle/", env!("CARGO_PKG_VERSION"));

/// Configuration for the bundle cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Prefix prepended to the bundle URL to form the store key
    pub key_prefix: String,
    /// Freshness window when `cache-control` has no `max-age`
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_owned(),
            default_ttl: DEFAULT_TTL,
        }
    }
}

impl CacheConfig {
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }
}

/// Configurable options for the HTTP side of the bundle loader
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Overall timeout for a single request
    pub timeout: Duration,

    /// Connection timeout (time to establish initial connection)
    pub connect_timeout: Duration,

    /// Whether to follow redirects
    pub follow_redirects: bool,

    /// User agent string
    pub user_agent: String,

    /// Extra headers sent with every request
    pub headers: HeaderMap,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            follow_redirects: true,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers: HeaderMap::new(),
        }
    }
}

impl LoaderConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Merge extra headers; later values replace earlier ones with the same name
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        for (name, value) in headers.iter() {
            self.headers.insert(name.clone(), value.clone());
        }
        self
    }

    /// Add a single header, silently skipping names or values that are not valid
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }
}
