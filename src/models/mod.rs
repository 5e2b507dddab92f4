// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod view_point;
pub mod visit;

pub use view_point::{project_view_points, ViewPoint};
pub use visit::{ImageCacheEntry, StoredAuth, StoredViewHit, VisitRecord};
