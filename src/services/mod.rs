// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod auth;
pub mod counter;
pub mod images;
pub mod markers;

pub use auth::{normalize_expiry, AuthCache};
pub use counter::{CounterClient, ViewCounterService};
pub use images::ImageCache;
pub use markers::{MarkerGroup, MarkerLayer};
