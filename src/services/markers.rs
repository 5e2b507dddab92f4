// SPDX-License-Identifier: MIT

//! Marker layer state for the geo-traffic map.
//!
//! Points are grouped by coordinates formatted to 6 decimal places, so
//! grouping is exact-match stacking, not proximity clustering. One marker is
//! rendered per group; clicking a stacked marker cycles through its
//! co-located points in insertion order. The selected point id is shared
//! between the marker layer and the side-panel list so both highlight from
//! one piece of state.
//!
//! Rebuilds discard all groups rather than diffing. Marker counts are small
//! and refreshes only happen on a new analytics fetch.

use crate::models::ViewPoint;
use std::collections::HashMap;

/// One rendered marker: every point sharing a rounded coordinate.
#[derive(Debug, Clone)]
pub struct MarkerGroup {
    key: String,
    points: Vec<ViewPoint>,
    /// Rotation position for the next click on this marker.
    next: usize,
}

impl MarkerGroup {
    /// Grouping key, `"<lat>,<lon>"` at 6 decimal places.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Anchor latitude (first point in the group).
    pub fn lat(&self) -> f64 {
        self.points[0].lat
    }

    /// Anchor longitude (first point in the group).
    pub fn lon(&self) -> f64 {
        self.points[0].lon
    }

    pub fn points(&self) -> &[ViewPoint] {
        &self.points
    }

    /// Number of stacked points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Grouping key for a point's coordinates.
fn coord_key(lat: f64, lon: f64) -> String {
    format!("{:.6},{:.6}", lat, lon)
}

/// Interactive marker layer derived from the current view point batch.
#[derive(Debug, Clone, Default)]
pub struct MarkerLayer {
    groups: Vec<MarkerGroup>,
    by_key: HashMap<String, usize>,
    selected: Option<String>,
}

impl MarkerLayer {
    /// Build the layer from a projected batch, discarding any prior state.
    pub fn build(points: &[ViewPoint]) -> Self {
        let mut groups: Vec<MarkerGroup> = Vec::new();
        let mut by_key = HashMap::new();

        for point in points {
            let key = coord_key(point.lat, point.lon);
            match by_key.get(&key) {
                Some(&idx) => {
                    let group: &mut MarkerGroup = &mut groups[idx];
                    group.points.push(point.clone());
                }
                None => {
                    by_key.insert(key.clone(), groups.len());
                    groups.push(MarkerGroup {
                        key,
                        points: vec![point.clone()],
                        next: 0,
                    });
                }
            }
        }

        Self {
            groups,
            by_key,
            selected: None,
        }
    }

    /// Markers in first-insertion order.
    pub fn groups(&self) -> &[MarkerGroup] {
        &self.groups
    }

    /// Handle a click on the marker at `key`.
    ///
    /// Selects the group's current point, then advances the rotation index
    /// so the next click on the same marker picks the following co-located
    /// point, wrapping around. Returns the newly selected id.
    pub fn click(&mut self, key: &str) -> Option<&str> {
        let idx = *self.by_key.get(key)?;
        let group = &mut self.groups[idx];
        let id = group.points[group.next].id.clone();
        if group.points.len() > 1 {
            group.next = (group.next + 1) % group.points.len();
        }
        self.selected = Some(id);
        self.selected.as_deref()
    }

    /// Select a point directly (side-panel list click).
    ///
    /// Returns false if the id is not part of the current batch.
    pub fn select(&mut self, id: &str) -> bool {
        let known = self
            .groups
            .iter()
            .any(|g| g.points.iter().any(|p| p.id == id));
        if known {
            self.selected = Some(id.to_string());
        }
        known
    }

    /// Ensure something is selected once points exist: keeps the current
    /// selection when still present, otherwise falls back to the first point.
    pub fn ensure_selection(&mut self) {
        let still_present = self
            .selected
            .as_deref()
            .map(|id| self.groups.iter().any(|g| g.points.iter().any(|p| p.id == id)))
            .unwrap_or(false);
        if !still_present {
            self.selected = self
                .groups
                .first()
                .map(|g| g.points[0].id.clone());
        }
    }

    /// The shared selected-point id, if any.
    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// True when the marker at `key` contains the selected point
    /// (highlight state for the marker element).
    pub fn is_active(&self, key: &str) -> bool {
        let Some(selected) = self.selected.as_deref() else {
            return false;
        };
        self.by_key
            .get(key)
            .map(|&idx| self.groups[idx].points.iter().any(|p| p.id == selected))
            .unwrap_or(false)
    }
}
