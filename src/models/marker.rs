// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Marker data structures.
//!
//! This module defines the pins placed on a map, their category and the
//! form payload used to create or edit them.

use crate::util::geometry::clamp_percent;
use crate::util::time::deserialize_millis;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Base URL of the placeholder image service used when a marker has no image.
pub const PLACEHOLDER_IMAGE_BASE: &str = "https://picsum.photos/seed";

/// A position on the map as percentages (0.0 to 100.0) of its width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

impl Coordinates {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Create coordinates clamped into `[0, 100]` on both axes.
    pub fn clamped(x: f64, y: f64) -> Self {
        Self {
            x: clamp_percent(x),
            y: clamp_percent(y),
        }
    }

    /// Return a copy of these coordinates clamped into range.
    pub fn clamp(self) -> Self {
        Self::clamped(self.x, self.y)
    }
}

/// Category of a marker. Only affects how the marker is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarkerType {
    #[default]
    Info,
    Warning,
    Place,
    Shop,
}

impl MarkerType {
    pub const ALL: [MarkerType; 4] = [
        MarkerType::Info,
        MarkerType::Warning,
        MarkerType::Place,
        MarkerType::Shop,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MarkerType::Info => "Info",
            MarkerType::Warning => "Warning",
            MarkerType::Place => "Place",
            MarkerType::Shop => "Shop",
        }
    }
}

/// A labeled point of interest on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub id: String,
    pub coords: Coordinates,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub marker_type: MarkerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(deserialize_with = "deserialize_millis")]
    pub created_at: i64,
}

/// User-editable marker fields, as submitted by the add/edit form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerDraft {
    pub title: String,
    pub description: String,
    pub marker_type: MarkerType,
    /// Empty means "no image supplied".
    pub image_url: String,
}

impl MarkerDraft {
    #[cfg(test)]
    pub fn new(title: impl Into<String>, marker_type: MarkerType) -> Self {
        Self {
            title: title.into(),
            marker_type,
            ..Default::default()
        }
    }

    #[cfg(test)]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[cfg(test)]
    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = image_url.into();
        self
    }

    /// Prefill a draft from an existing marker, for the edit form.
    pub fn from_marker(marker: &Marker) -> Self {
        Self {
            title: marker.title.clone(),
            description: marker.description.clone(),
            marker_type: marker.marker_type,
            image_url: marker.image_url.clone().unwrap_or_default(),
        }
    }

    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

/// Placeholder image URL for a marker created without one.
pub fn placeholder_image_url(seed: &str) -> String {
    format!("{}/{}/400/300", PLACEHOLDER_IMAGE_BASE, seed)
}

/// Check a marker list loaded from outside the store: every marker needs a
/// non-empty id and title, and ids must be unique.
pub fn check_markers(markers: &[Marker]) -> Result<(), String> {
    let mut seen = HashSet::new();
    for (index, marker) in markers.iter().enumerate() {
        if marker.id.trim().is_empty() {
            return Err(format!("marker {} has an empty id", index));
        }
        if marker.title.trim().is_empty() {
            return Err(format!("marker '{}' has an empty title", marker.id));
        }
        if !seen.insert(marker.id.as_str()) {
            return Err(format!("duplicate marker id '{}'", marker.id));
        }
    }
    Ok(())
}

/// The two sample markers shown when nothing has been saved yet.
pub fn default_markers() -> Vec<Marker> {
    vec![
        Marker {
            id: "sample-1".to_string(),
            coords: Coordinates::new(30.0, 40.0),
            title: "Main Entrance".to_string(),
            description: "Start your visit here.".to_string(),
            marker_type: MarkerType::Info,
            image_url: Some(placeholder_image_url("sample-1")),
            created_at: 0,
        },
        Marker {
            id: "sample-2".to_string(),
            coords: Coordinates::new(70.0, 25.0),
            title: "Steep Stairs".to_string(),
            description: "Watch your step, no handrail.".to_string(),
            marker_type: MarkerType::Warning,
            image_url: Some(placeholder_image_url("sample-2")),
            created_at: 0,
        },
    ]
}
