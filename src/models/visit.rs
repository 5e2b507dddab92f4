// SPDX-License-Identifier: MIT

//! Wire and storage models.
//!
//! `StoredAuth`, `StoredViewHit` and `ImageCacheEntry` use the counter
//! service's camelCase field names on the wire so stored payloads stay
//! compatible with what the original deployment persisted.

use serde::{Deserialize, Serialize};

/// One recorded page visit as returned by the counter service.
///
/// No fixed schema is guaranteed: coordinate, timestamp, count and location
/// fields may appear under several alternative names, nested one level down,
/// or as a single combined string. Kept as an open string-keyed map and
/// probed field by field.
pub type VisitRecord = serde_json::Map<String, serde_json::Value>;

/// Cached credential for the authenticated views endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAuth {
    /// Opaque bearer token
    pub token: String,
    /// Expiry as epoch millis (normalized from seconds on load when needed)
    #[serde(rename = "expiresAt")]
    pub expires_at: i64,
}

/// Marker that a unique hit was already registered for a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredViewHit {
    /// True once the service confirmed a unique hit
    pub counted: bool,
    /// Epoch millis when the hit was stored
    pub ts: i64,
}

/// One hydrated image in the lightbox cache, keyed by source URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageCacheEntry {
    /// Embedded `data:` URL form of the image
    #[serde(rename = "dataUrl")]
    pub data_url: String,
    /// Original body size in bytes
    pub size: usize,
    /// Epoch millis when the entry was inserted (recency for eviction)
    pub ts: i64,
}
