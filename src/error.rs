// SPDX-License-Identifier: MIT

//! Application error types.
//!
//! Nothing in this crate is fatal: every failure degrades to an empty or
//! "unknown" result at the call site. The variants exist so callers can tell
//! the one case that must update gating state (a rejected credential) apart
//! from generic failures that are only logged.

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The counter service rejected the bearer token (HTTP 401).
    ///
    /// Callers clear the cached credential before surfacing this.
    #[error("Authentication rejected")]
    Unauthorized,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Counter API error: {0}")]
    CounterApi(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True if this error invalidates the cached credential.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, AppError::Unauthorized)
    }
}

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, AppError>;
