// SPDX-License-Identifier: MIT

//! Application configuration loaded from environment variables.

use std::env;

/// Image cache entry ceiling: larger fetches pass through uncached.
pub const DEFAULT_IMAGE_ITEM_BYTES: usize = 800 * 1024;

/// Image cache keeps at most this many most-recent entries.
pub const DEFAULT_IMAGE_MAX_ENTRIES: usize = 15;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the view-counter service
    pub counter_base_url: String,
    /// Analytics namespace (one deployment = one namespace)
    pub namespace: String,
    /// Path of the JSON file backing the local key-value store
    pub store_path: String,
    /// Per-entry byte ceiling for the image hydration cache
    pub image_item_bytes: usize,
    /// Maximum number of entries retained in the image hydration cache
    pub image_max_entries: usize,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            counter_base_url: "http://localhost:8787".to_string(),
            namespace: "test-namespace".to_string(),
            store_path: "geoviews-store.json".to_string(),
            image_item_bytes: DEFAULT_IMAGE_ITEM_BYTES,
            image_max_entries: DEFAULT_IMAGE_MAX_ENTRIES,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            counter_base_url: env::var("COUNTER_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("COUNTER_BASE_URL"))?,
            namespace: env::var("COUNTER_NAMESPACE").unwrap_or_else(|_| "portfolio".to_string()),
            store_path: env::var("STORE_PATH")
                .unwrap_or_else(|_| "geoviews-store.json".to_string()),
            image_item_bytes: env::var("IMAGE_ITEM_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_IMAGE_ITEM_BYTES),
            image_max_entries: env::var("IMAGE_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_IMAGE_MAX_ENTRIES),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
