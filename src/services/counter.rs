// SPDX-License-Identifier: MIT

//! View-counter service client.
//!
//! Handles:
//! - Hit registration and aggregate count fetches
//! - Password login for the authenticated views endpoint
//! - Detailed visit listing with bearer auth (401 maps to `Unauthorized`)

use crate::error::AppError;
use crate::models::{project_view_points, StoredViewHit, ViewPoint};
use crate::services::AuthCache;
use crate::store::{keys, KeyValueStore};
use serde::Deserialize;
use std::sync::Arc;

/// Low-level HTTP client for the counter service.
#[derive(Clone)]
pub struct CounterClient {
    http: reqwest::Client,
    base_url: String,
}

impl CounterClient {
    /// Create a new client against a fixed base URL.
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn page_url(&self, endpoint: &str, namespace: &str, page: &str) -> String {
        format!(
            "{}/{}?namespace={}&page={}",
            self.base_url,
            endpoint,
            urlencoding::encode(namespace),
            urlencoding::encode(page)
        )
    }

    /// Read-only aggregate count. Safe to repeat.
    pub async fn fetch_count(
        &self,
        namespace: &str,
        page: &str,
    ) -> Result<CountResponse, AppError> {
        let url = self.page_url("count", namespace, page);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::CounterApi(e.to_string()))?;
        self.check_response_json(response).await
    }

    /// Register a visit. The caller records `unique` locally so this is not
    /// repeated for the same browser/page pair.
    pub async fn register_hit(
        &self,
        namespace: &str,
        page: &str,
    ) -> Result<HitResponse, AppError> {
        let url = self.page_url("hit", namespace, page);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::CounterApi(e.to_string()))?;
        self.check_response_json(response).await
    }

    /// Exchange the admin password for a bearer token.
    ///
    /// A non-2xx response means bad credentials.
    pub async fn login(&self, password: &str) -> Result<LoginResponse, AppError> {
        let url = format!("{}/login", self.base_url);
        let body = serde_json::json!({ "password": password });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::CounterApi(format!("Login request failed: {}", e)))?;

        self.check_response_json(response).await
    }

    /// Fetch the detailed visit list. Requires a bearer token; a 401 is
    /// surfaced as `AppError::Unauthorized`.
    pub async fn fetch_views(
        &self,
        namespace: &str,
        page: &str,
        token: &str,
    ) -> Result<ViewsResponse, AppError> {
        let url = self.page_url("views", namespace, page);
        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::CounterApi(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Check response status and parse the JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();

            // Token invalid or expired - caller must clear cached credential
            if status.as_u16() == 401 {
                return Err(AppError::Unauthorized);
            }

            let body = response.text().await.unwrap_or_default();
            return Err(AppError::CounterApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::CounterApi(format!("JSON parse error: {}", e)))
    }
}

/// Response of `GET /count`.
#[derive(Debug, Clone, Deserialize)]
pub struct CountResponse {
    /// Absent or non-numeric counts are treated as "no update".
    pub count: Option<u64>,
}

/// Response of `GET /hit`.
#[derive(Debug, Clone, Deserialize)]
pub struct HitResponse {
    pub count: Option<u64>,
    /// True when this request registered a new unique visit.
    #[serde(default)]
    pub unique: bool,
}

/// Response of `POST /login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    /// Epoch seconds or millis; normalized by the credential cache.
    #[serde(rename = "expiresAt")]
    pub expires_at: i64,
}

/// Response of `GET /views`.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewsResponse {
    pub namespace: Option<String>,
    pub page: Option<String>,
    #[serde(default)]
    pub views: Vec<serde_json::Value>,
}

// ─────────────────────────────────────────────────────────────────────────────
// ViewCounterService - refresh policy over the client and the hit ledger
// ─────────────────────────────────────────────────────────────────────────────

/// High-level counter service combining the HTTP client with the local
/// hit-deduplication ledger.
#[derive(Clone)]
pub struct ViewCounterService {
    client: CounterClient,
    store: Arc<dyn KeyValueStore>,
    namespace: String,
}

impl ViewCounterService {
    pub fn new(client: CounterClient, store: Arc<dyn KeyValueStore>, namespace: &str) -> Self {
        Self {
            client,
            store,
            namespace: namespace.to_string(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    // ─── Hit ledger ──────────────────────────────────────────────────────────

    /// True if a unique hit was already registered for `page` from this
    /// profile. A malformed stored value counts as absent.
    pub fn has_stored_hit(&self, page: &str) -> bool {
        let Some(raw) = self.store.get(&keys::hit(&self.namespace, page)) else {
            return false;
        };
        match serde_json::from_str::<StoredViewHit>(&raw) {
            Ok(hit) => hit.counted,
            Err(e) => {
                tracing::warn!(page, error = %e, "Hit marker unreadable, treating as absent");
                false
            }
        }
    }

    /// Persist the "already counted" marker for `page`.
    pub fn store_hit(&self, page: &str) {
        let marker = StoredViewHit {
            counted: true,
            ts: chrono::Utc::now().timestamp_millis(),
        };
        match serde_json::to_string(&marker) {
            Ok(raw) => self.store.set(&keys::hit(&self.namespace, page), &raw),
            Err(e) => tracing::warn!(page, error = %e, "Hit marker serialization failed"),
        }
    }

    // ─── Refresh policy ──────────────────────────────────────────────────────

    /// Refresh the aggregate count for `page`.
    ///
    /// If a hit marker exists only the count is fetched. Otherwise a hit is
    /// registered first (persisting the marker only when the service reports
    /// `unique: true`), and the count fetch runs afterward regardless of the
    /// hit's outcome. Returns `None` when nothing usable came back, so the
    /// caller keeps its prior value.
    pub async fn refresh_count(&self, page: &str) -> Option<u64> {
        let mut count = None;

        if !self.has_stored_hit(page) {
            match self.client.register_hit(&self.namespace, page).await {
                Ok(hit) => {
                    if hit.unique {
                        self.store_hit(page);
                    }
                    count = hit.count;
                }
                Err(e) => tracing::warn!(page, error = %e, "Hit registration failed"),
            }
        }

        match self.client.fetch_count(&self.namespace, page).await {
            Ok(response) => {
                if response.count.is_some() {
                    count = response.count;
                }
            }
            Err(e) => tracing::warn!(page, error = %e, "Count fetch failed"),
        }

        count
    }

    // ─── Authenticated views ─────────────────────────────────────────────────

    /// Fetch and project the detailed visit list for `page`.
    ///
    /// A 401 clears the cached credential before the error is surfaced, so
    /// the UI-gating state can react immediately.
    pub async fn fetch_view_points(
        &self,
        page: &str,
        token: &str,
        auth: &AuthCache,
    ) -> Result<Vec<ViewPoint>, AppError> {
        let data = match self.client.fetch_views(&self.namespace, page, token).await {
            Ok(data) => data,
            Err(e) if e.is_auth_error() => {
                tracing::info!(page, "Views fetch rejected, clearing cached credential");
                auth.clear();
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        Ok(project_view_points(&data.views))
    }

    /// Access to the underlying HTTP client (login flow).
    pub fn client(&self) -> &CounterClient {
        &self.client
    }
}
