// SPDX-License-Identifier: MIT

//! Analytics session state machine.
//!
//! The framework-effect soup of the original client is rewritten as explicit
//! transitions on a single `Session` value, triggered by well-defined events:
//! view changed, details opened/closed, login, logout, auth expiry. Each
//! transition's side effects are fixed and idempotent:
//!
//! - view changed: cancel in-flight work, refresh the count (hit-dedup
//!   policy), then refresh details if the panel is open
//! - details opened: fetch and project the visit list
//! - login: exchange password for a token, persist it, arm the expiry timer
//! - auth rejected (401) or expired: drop token state and cached credential
//!
//! Every network operation is tied to the cancellation flag of the logical
//! UI state that started it; the flag is replaced (and the predecessor
//! triggered) whenever that state changes, and every commit checks the flag
//! first, so a stale response can never update fresh state. There is no
//! retry: failures log and leave the `"---"` / empty-list placeholder until
//! the next state change.

use crate::error::{AppError, Result};
use crate::models::ViewPoint;
use crate::services::{normalize_expiry, AuthCache, MarkerLayer, ViewCounterService};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Generic failure message for the details panel.
const DETAILS_ERROR: &str = "Unable to load view details.";

/// Cancellation flag for one logical UI state.
///
/// Cloned into every operation started under that state; commits check it
/// before touching session state.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One viewer session: per-page counts, the detail panel, and auth gating.
pub struct Session {
    counter: ViewCounterService,
    auth: AuthCache,

    page: String,
    counts: HashMap<String, u64>,

    token: Option<String>,
    /// Normalized expiry (epoch millis) of the active token.
    auth_expires_at: Option<i64>,

    details_open: bool,
    details_error: Option<String>,
    view_points: Vec<ViewPoint>,
    markers: MarkerLayer,

    page_epoch: CancelFlag,
    details_epoch: CancelFlag,
    auth_epoch: CancelFlag,
}

impl Session {
    /// Create a session, reconstructing the credential from the store.
    ///
    /// Callers in an async context should follow up with
    /// [`Session::arm_auth_expiry`] so the persisted credential is cleared
    /// when its remaining lifetime runs out.
    pub fn new(counter: ViewCounterService, auth: AuthCache, initial_page: &str) -> Self {
        let stored = auth.load();
        if stored.is_some() {
            tracing::debug!("Restored cached credential");
        }

        Self {
            counter,
            auth,
            page: initial_page.to_string(),
            counts: HashMap::new(),
            token: stored.as_ref().map(|a| a.token.clone()),
            auth_expires_at: stored.map(|a| a.expires_at),
            details_open: false,
            details_error: None,
            view_points: Vec::new(),
            markers: MarkerLayer::default(),
            page_epoch: CancelFlag::new(),
            details_epoch: CancelFlag::new(),
            auth_epoch: CancelFlag::new(),
        }
    }

    // ─── Events ──────────────────────────────────────────────────────────────

    /// The selected page view changed.
    pub async fn set_page(&mut self, page: &str) {
        self.page_epoch.cancel();
        self.page_epoch = CancelFlag::new();
        self.details_epoch.cancel();
        self.details_epoch = CancelFlag::new();
        self.page = page.to_string();

        let epoch = self.page_epoch.clone();
        let count = self.counter.refresh_count(page).await;
        if epoch.is_cancelled() {
            return;
        }
        if let Some(count) = count {
            self.counts.insert(page.to_string(), count);
        }

        if self.details_open {
            self.refresh_details().await;
        }
    }

    /// The details panel was opened.
    pub async fn open_details(&mut self) {
        self.details_epoch.cancel();
        self.details_epoch = CancelFlag::new();
        self.details_open = true;
        self.refresh_details().await;
    }

    /// The details panel was closed; in-flight detail fetches must not
    /// commit afterwards.
    pub fn close_details(&mut self) {
        self.details_epoch.cancel();
        self.details_epoch = CancelFlag::new();
        self.details_open = false;
        self.details_error = None;
    }

    /// Exchange the admin password for a bearer token.
    pub async fn login(&mut self, password: &str) -> Result<()> {
        if password.trim().is_empty() {
            return Err(AppError::BadRequest("Password is required".to_string()));
        }

        let response = self.counter.client().login(password).await?;
        let expires_at = normalize_expiry(response.expires_at);

        self.auth.save(&response.token, expires_at);
        self.auth_epoch.cancel();
        self.auth_epoch = CancelFlag::new();
        self.token = Some(response.token);
        self.auth_expires_at = Some(expires_at);
        self.arm_auth_expiry();

        tracing::info!(expires_at, "Login succeeded");
        Ok(())
    }

    /// Drop the credential and its persisted copy.
    pub fn logout(&mut self) {
        self.auth_epoch.cancel();
        self.auth_epoch = CancelFlag::new();
        self.token = None;
        self.auth_expires_at = None;
        self.auth.clear();
    }

    // ─── Derived state ───────────────────────────────────────────────────────

    /// Count label for the current page: the fetched count, or `"---"`
    /// while unknown or after a failed refresh.
    pub fn count_label(&self) -> String {
        match self.counts.get(&self.page) {
            Some(count) => count.to_string(),
            None => "---".to_string(),
        }
    }

    /// True while a non-expired token is held.
    pub fn is_authenticated(&self) -> bool {
        match (&self.token, self.auth_expires_at) {
            (Some(_), Some(expires_at)) => expires_at > chrono::Utc::now().timestamp_millis(),
            _ => false,
        }
    }

    pub fn page(&self) -> &str {
        &self.page
    }

    pub fn view_points(&self) -> &[ViewPoint] {
        &self.view_points
    }

    pub fn markers(&self) -> &MarkerLayer {
        &self.markers
    }

    /// Marker interaction goes through the session so the shared selection
    /// stays the single source of highlight state.
    pub fn markers_mut(&mut self) -> &mut MarkerLayer {
        &mut self.markers
    }

    pub fn details_error(&self) -> Option<&str> {
        self.details_error.as_deref()
    }

    // ─── Internals ───────────────────────────────────────────────────────────

    /// Fetch and commit the detail panel contents for the current page.
    async fn refresh_details(&mut self) {
        self.expire_auth_if_due();

        let Some(token) = self.token.clone() else {
            self.view_points.clear();
            self.markers = MarkerLayer::default();
            self.details_error = Some(DETAILS_ERROR.to_string());
            return;
        };

        let epoch = self.details_epoch.clone();
        match self
            .counter
            .fetch_view_points(&self.page, &token, &self.auth)
            .await
        {
            Ok(points) => {
                if epoch.is_cancelled() {
                    return;
                }
                self.view_points = points;
                self.markers = MarkerLayer::build(&self.view_points);
                self.markers.ensure_selection();
                self.details_error = None;
            }
            Err(e) => {
                if epoch.is_cancelled() {
                    return;
                }
                if e.is_auth_error() {
                    // The service already cleared the persisted credential;
                    // drop the in-memory copy so the UI gate closes too.
                    self.auth_epoch.cancel();
                    self.auth_epoch = CancelFlag::new();
                    self.token = None;
                    self.auth_expires_at = None;
                } else {
                    tracing::warn!(page = %self.page, error = %e, "Views request failed");
                }
                self.view_points.clear();
                self.markers = MarkerLayer::default();
                self.details_error = Some(DETAILS_ERROR.to_string());
            }
        }
    }

    /// Drop the token if its expiry has passed since the last event.
    fn expire_auth_if_due(&mut self) {
        if let Some(expires_at) = self.auth_expires_at {
            if expires_at <= chrono::Utc::now().timestamp_millis() {
                tracing::info!("Cached credential expired");
                self.logout();
            }
        }
    }

    /// Arm a deferred clear of the persisted credential, timed to the
    /// token's remaining lifetime. Cancelled (via the auth epoch) by any
    /// later login or logout. Must run inside a tokio runtime.
    pub fn arm_auth_expiry(&self) {
        let Some(expires_at) = self.auth_expires_at else {
            return;
        };
        let remaining = AuthCache::millis_to_expiry(expires_at);
        let auth = self.auth.clone();
        let epoch = self.auth_epoch.clone();

        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(remaining)).await;
            if epoch.is_cancelled() {
                return;
            }
            tracing::info!("Credential lifetime elapsed, clearing stored auth");
            auth.clear();
        });
    }
}
