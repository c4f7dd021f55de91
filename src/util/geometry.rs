// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! Marker positions are stored as percentages (0.0 to 100.0) of the map
//! image width and height. This module converts between those and
//! positions inside the displayed map rectangle.

use crate::models::marker::Coordinates;

/// Upper bound of a percentage coordinate.
pub const PERCENT_MAX: f64 = 100.0;

/// Clamp a single percentage value into `[0, 100]`. NaN maps to 0.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, PERCENT_MAX)
}

/// Convert an offset inside a displayed map of the given size into
/// percentage coordinates, clamped to the map.
pub fn to_percent(offset_x: f64, offset_y: f64, width: f64, height: f64) -> Coordinates {
    if width <= 0.0 || height <= 0.0 {
        return Coordinates::new(0.0, 0.0);
    }
    Coordinates::clamped(
        offset_x / width * PERCENT_MAX,
        offset_y / height * PERCENT_MAX,
    )
}

/// Convert percentage coordinates into an offset inside a displayed map.
pub fn from_percent(coords: &Coordinates, width: f64, height: f64) -> (f64, f64) {
    (
        coords.x / PERCENT_MAX * width,
        coords.y / PERCENT_MAX * height,
    )
}
