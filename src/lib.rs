// SPDX-License-Identifier: MIT

//! Geoviews: view-analytics ingestion and geo-normalization client.
//!
//! Client-side pipeline for a page-view counter service: hit registration
//! with local deduplication, credential caching for the authenticated visit
//! log, normalization of loosely-shaped geolocation records into map-ready
//! points, marker grouping, and an opportunistic image hydration cache.

pub mod config;
pub mod error;
pub mod geo;
pub mod models;
pub mod services;
pub mod session;
pub mod store;

pub use error::{AppError, Result};
pub use session::{CancelFlag, Session};
