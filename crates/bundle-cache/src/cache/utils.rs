//! # Cache Utilities
//!
//! Header helpers shared by the cache and the loader.

use std::time::Duration;

use reqwest::header::{
    AsHeaderName, CACHE_CONTROL, HeaderMap, HeaderValue, IF_MODIFIED_SINCE, IF_NONE_MATCH,
};
use tracing::warn;

use super::types::CacheEntry;

/// Read a header as an owned string; values that are not visible ASCII count as absent
pub fn header_value<K: AsHeaderName>(headers: &HeaderMap, name: K) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Extract the `max-age` directive, in seconds, from a `cache-control` value.
///
/// Directive names match case-insensitively and the value may be quoted.
/// Negative, non-finite or unparsable values are ignored.
pub fn parse_max_age(cache_control: &str) -> Option<f64> {
    cache_control.split(',').find_map(|directive| {
        let (name, value) = directive.trim().split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("max-age") {
            return None;
        }

        let seconds: f64 = value.trim().trim_matches('"').parse().ok()?;
        (seconds.is_finite() && seconds >= 0.0).then_some(seconds)
    })
}

/// Absolute expiry for a response received at `now_ms`
pub(crate) fn expiry_from_headers(headers: &HeaderMap, now_ms: i64, default_ttl: Duration) -> i64 {
    let ttl_ms = header_value(headers, CACHE_CONTROL)
        .as_deref()
        .and_then(parse_max_age)
        .map(|seconds| (seconds * 1000.0).round() as i64)
        .unwrap_or_else(|| default_ttl.as_millis().min(i64::MAX as u128) as i64);

    now_ms.saturating_add(ttl_ms)
}

/// Conditional request headers built from an entry's validators
pub fn conditional_headers(entry: &CacheEntry) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let validators = [
        (IF_NONE_MATCH, entry.etag.as_deref()),
        (IF_MODIFIED_SINCE, entry.last_modified.as_deref()),
    ];

    for (name, value) in validators {
        let Some(value) = value else {
            continue;
        };
        match HeaderValue::from_str(value) {
            Ok(value) => {
                headers.insert(name, value);
            }
            Err(e) => {
                warn!(header = %name, error = %e, "Skipping unusable cached validator");
            }
        }
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(etag: Option<&str>, last_modified: Option<&str>) -> CacheEntry {
        CacheEntry {
            code: "code".to_string(),
            expiry: 0,
            etag: etag.map(str::to_string),
            last_modified: last_modified.map(str::to_string),
        }
    }

    #[test]
    fn test_parse_max_age() {
        assert_eq!(parse_max_age("max-age=60"), Some(60.0));
        assert_eq!(parse_max_age("public, max-age=3600"), Some(3600.0));
        assert_eq!(parse_max_age("Max-Age=5, must-revalidate"), Some(5.0));
        assert_eq!(parse_max_age("max-age=\"30\""), Some(30.0));
        assert_eq!(parse_max_age("max-age = 12 "), Some(12.0));
        assert_eq!(parse_max_age("max-age=1.5"), Some(1.5));
        assert_eq!(parse_max_age("max-age=0"), Some(0.0));
    }

    #[test]
    fn test_parse_max_age_rejects_invalid() {
        assert_eq!(parse_max_age(""), None);
        assert_eq!(parse_max_age("no-cache"), None);
        assert_eq!(parse_max_age("max-age=-1"), None);
        assert_eq!(parse_max_age("max-age=abc"), None);
        assert_eq!(parse_max_age("max-age=inf"), None);
        assert_eq!(parse_max_age("max-age=NaN"), None);
        assert_eq!(parse_max_age("max-age"), None);
    }

    #[test]
    fn test_parse_max_age_ignores_s_maxage() {
        assert_eq!(parse_max_age("s-maxage=600"), None);
        assert_eq!(parse_max_age("s-maxage=600, max-age=60"), Some(60.0));
    }

    #[test]
    fn test_parse_max_age_first_valid_wins() {
        assert_eq!(parse_max_age("max-age=bogus, max-age=10, max-age=20"), Some(10.0));
    }

    #[test]
    fn test_expiry_from_headers_default() {
        let headers = HeaderMap::new();
        let expiry = expiry_from_headers(&headers, 1_000, Duration::from_millis(60_000));
        assert_eq!(expiry, 61_000);
    }

    #[test]
    fn test_expiry_from_headers_max_age() {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=2.5"));
        let expiry = expiry_from_headers(&headers, 1_000, Duration::from_millis(60_000));
        assert_eq!(expiry, 3_500);
    }

    #[test]
    fn test_expiry_from_headers_saturates() {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=1e300"));
        let expiry = expiry_from_headers(&headers, 1_000, Duration::from_millis(60_000));
        assert_eq!(expiry, i64::MAX);
    }

    #[test]
    fn test_conditional_headers_both_validators() {
        let headers = conditional_headers(&entry(Some("\"v1\""), Some("Mon")));
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get(IF_NONE_MATCH).unwrap(), "\"v1\"");
        assert_eq!(headers.get(IF_MODIFIED_SINCE).unwrap(), "Mon");
    }

    #[test]
    fn test_conditional_headers_none() {
        assert!(conditional_headers(&entry(None, None)).is_empty());
    }

    #[test]
    fn test_conditional_headers_skips_invalid_value() {
        let headers = conditional_headers(&entry(Some("bad\nvalue"), Some("Mon")));
        assert_eq!(headers.len(), 1);
        assert!(headers.get(IF_NONE_MATCH).is_none());
    }
}
