//! # Cache Types
//!
//! This module defines the persisted record and the lookup outcome.

use std::time::Duration;

use reqwest::header::{ETAG, HeaderMap, LAST_MODIFIED};
use serde::{Deserialize, Deserializer, Serialize};

use super::utils::{expiry_from_headers, header_value};

/// A cached bundle, as persisted in the backing store.
///
/// The JSON shape is `{"code": ..., "expiry": ..., "etag"?: ..., "lastModified"?: ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Response body
    pub code: String,
    /// Epoch milliseconds after which the entry is stale
    #[serde(deserialize_with = "deserialize_expiry")]
    pub expiry: i64,
    /// ETag of the response that produced the entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Last-Modified of the response that produced the entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

/// Records written by other clients may carry a fractional expiry. Flooring keeps
/// `now > expiry` unchanged for integral `now`.
fn deserialize_expiry<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawExpiry {
        Millis(i64),
        Fractional(f64),
    }

    Ok(match RawExpiry::deserialize(deserializer)? {
        RawExpiry::Millis(ms) => ms,
        // `as` saturates out-of-range values
        RawExpiry::Fractional(ms) => ms.floor() as i64,
    })
}

/// Why a stored value was rejected on read
#[derive(Debug, thiserror::Error)]
pub(crate) enum InvalidEntry {
    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("record has an empty body")]
    EmptyCode,
}

impl CacheEntry {
    /// Build an entry for `code` from the headers of the response that delivered it
    pub fn from_response(code: &str, headers: &HeaderMap, now_ms: i64, default_ttl: Duration) -> Self {
        Self {
            code: code.to_owned(),
            expiry: expiry_from_headers(headers, now_ms, default_ttl),
            etag: header_value(headers, ETAG),
            last_modified: header_value(headers, LAST_MODIFIED),
        }
    }

    /// Decode and validate a stored record
    pub(crate) fn decode(raw: &str) -> Result<Self, InvalidEntry> {
        let entry: CacheEntry = serde_json::from_str(raw)?;
        if entry.code.is_empty() {
            return Err(InvalidEntry::EmptyCode);
        }
        Ok(entry)
    }

    /// Whether the entry is stale at `now_ms`; the expiry instant itself is still fresh
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms > self.expiry
    }
}

/// Outcome of a cache lookup
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    /// No usable entry; fetch unconditionally
    Miss,
    /// Entry is fresh (or expiry was ignored); serve the body
    Fresh(String),
    /// Entry is stale; revalidate with these conditional request headers.
    /// An empty map means there are no validators and the fetch is unconditional.
    Stale(HeaderMap),
}

impl CacheLookup {
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheLookup::Miss)
    }

    pub fn fresh_code(&self) -> Option<&str> {
        match self {
            CacheLookup::Fresh(code) => Some(code),
            _ => None,
        }
    }

    pub fn validators(&self) -> Option<&HeaderMap> {
        match self {
            CacheLookup::Stale(headers) => Some(headers),
            _ => None,
        }
    }
}
