// SPDX-License-Identifier: MIT

//! Image hydration cache for the gallery lightbox.
//!
//! Opportunistically fetches gallery images and embeds them as `data:` URLs
//! so a previously opened image keeps rendering offline. The cache lives
//! under one fixed store key and is trimmed to the newest entries on every
//! write. Oversized images and every kind of failure degrade to the original
//! URL; `resolve` never fails.

use crate::error::AppError;
use crate::models::ImageCacheEntry;
use crate::store::{keys, KeyValueStore};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::collections::HashMap;
use std::sync::Arc;

/// Bounded, recency-ordered image cache.
#[derive(Clone)]
pub struct ImageCache {
    http: reqwest::Client,
    store: Arc<dyn KeyValueStore>,
    /// Entries larger than this many bytes are never cached.
    max_item_bytes: usize,
    /// At most this many most-recent entries are retained.
    max_entries: usize,
}

impl ImageCache {
    pub fn new(store: Arc<dyn KeyValueStore>, max_item_bytes: usize, max_entries: usize) -> Self {
        Self {
            http: reqwest::Client::new(),
            store,
            max_item_bytes,
            max_entries,
        }
    }

    /// Resolve a displayable source for `url`: the cached embedded form if
    /// present, a freshly hydrated one when it fits the ceiling, or the
    /// original URL on oversize or any failure.
    pub async fn resolve(&self, url: &str) -> String {
        let mut cache = self.read_cache();
        if let Some(entry) = cache.get(url) {
            return entry.data_url.clone();
        }

        match self.hydrate(url).await {
            Ok(Some(entry)) => {
                let data_url = entry.data_url.clone();
                cache.insert(url.to_string(), entry);
                self.write_cache(cache);
                data_url
            }
            Ok(None) => {
                tracing::debug!(url, limit = self.max_item_bytes, "Image exceeds cache ceiling");
                url.to_string()
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "Image cache fetch failed");
                url.to_string()
            }
        }
    }

    /// Fetch `url` and embed it, or `Ok(None)` when the body exceeds the
    /// per-entry ceiling.
    async fn hydrate(&self, url: &str) -> Result<Option<ImageCacheEntry>, AppError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("image fetch: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Internal(anyhow::anyhow!(
                "image fetch: HTTP {}",
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("image body: {}", e)))?;

        if body.len() > self.max_item_bytes {
            return Ok(None);
        }

        Ok(Some(ImageCacheEntry {
            data_url: format!("data:{};base64,{}", content_type, BASE64.encode(&body)),
            size: body.len(),
            ts: chrono::Utc::now().timestamp_millis(),
        }))
    }

    /// Read the persisted cache, degrading to empty on any failure.
    fn read_cache(&self) -> HashMap<String, ImageCacheEntry> {
        let Some(raw) = self.store.get(keys::IMAGE_CACHE) else {
            return HashMap::new();
        };
        match serde_json::from_str(&raw) {
            Ok(cache) => cache,
            Err(e) => {
                tracing::warn!(error = %e, "Lightbox cache read failed");
                HashMap::new()
            }
        }
    }

    /// Persist the cache trimmed to the newest `max_entries` by timestamp.
    fn write_cache(&self, cache: HashMap<String, ImageCacheEntry>) {
        let mut entries: Vec<_> = cache.into_iter().collect();
        entries.sort_by(|a, b| b.1.ts.cmp(&a.1.ts));
        entries.truncate(self.max_entries);
        let trimmed: HashMap<_, _> = entries.into_iter().collect();

        match serde_json::to_string(&trimmed) {
            Ok(raw) => self.store.set(keys::IMAGE_CACHE, &raw),
            Err(e) => tracing::warn!(error = %e, "Lightbox cache write failed"),
        }
    }
}
