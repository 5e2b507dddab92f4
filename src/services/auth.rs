// SPDX-License-Identifier: MIT

//! Credential cache over the injected key-value store.
//!
//! The counter service's login endpoint hands out an opaque bearer token
//! with an expiry that some deployments report in seconds and others in
//! millis. `load` validates expiry at read time and normalizes units, so an
//! expired or malformed entry is indistinguishable from an absent one.

use crate::models::StoredAuth;
use crate::store::{keys, KeyValueStore};
use std::sync::Arc;

/// Expiry values below this are assumed to be epoch seconds.
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// Normalize an expiry to epoch millis.
pub fn normalize_expiry(expires_at: i64) -> i64 {
    if expires_at < MILLIS_THRESHOLD {
        expires_at.saturating_mul(1000)
    } else {
        expires_at
    }
}

/// Persistent credential cache for one namespace.
#[derive(Clone)]
pub struct AuthCache {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl AuthCache {
    pub fn new(store: Arc<dyn KeyValueStore>, namespace: &str) -> Self {
        Self {
            store,
            key: keys::auth(namespace),
        }
    }

    /// Load the stored credential, or `None` if absent, malformed, or past
    /// its (normalized) expiry. The returned `expires_at` is always millis.
    pub fn load(&self) -> Option<StoredAuth> {
        let raw = self.store.get(&self.key)?;
        let parsed = match serde_json::from_str::<StoredAuth>(&raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Auth cache read failed");
                return None;
            }
        };
        if parsed.token.is_empty() || parsed.expires_at == 0 {
            return None;
        }
        let expires_at = normalize_expiry(parsed.expires_at);
        if expires_at <= chrono::Utc::now().timestamp_millis() {
            return None;
        }
        Some(StoredAuth {
            token: parsed.token,
            expires_at,
        })
    }

    /// Persist a credential as handed out by the login endpoint.
    pub fn save(&self, token: &str, expires_at: i64) {
        let payload = StoredAuth {
            token: token.to_string(),
            expires_at,
        };
        match serde_json::to_string(&payload) {
            Ok(raw) => self.store.set(&self.key, &raw),
            Err(e) => tracing::warn!(error = %e, "Auth cache write failed"),
        }
    }

    /// Drop the stored credential.
    pub fn clear(&self) {
        self.store.remove(&self.key);
    }

    /// Milliseconds until `expires_at` (millis), clamped at zero.
    pub fn millis_to_expiry(expires_at: i64) -> u64 {
        (expires_at - chrono::Utc::now().timestamp_millis()).max(0) as u64
    }
}
