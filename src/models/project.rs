// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project document.
//!
//! The portable representation of a whole annotated map: the background
//! map reference and every marker on it.

use super::marker::Marker;
use crate::util::time::deserialize_millis;
use serde::{Deserialize, Serialize};

/// Current project file format version.
pub const PROJECT_VERSION: &str = "1.0";

/// Complete project data for export and import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    #[serde(default = "default_version")]
    pub version: String,
    /// Export time in milliseconds since the Unix epoch.
    #[serde(default, deserialize_with = "deserialize_millis")]
    pub timestamp: i64,
    #[serde(default)]
    pub map_url: Option<String>,
    pub markers: Vec<Marker>,
}

fn default_version() -> String {
    PROJECT_VERSION.to_string()
}

impl ProjectDocument {
    /// Create a document stamped with the current format version.
    pub fn new(timestamp: i64, map_url: Option<String>, markers: Vec<Marker>) -> Self {
        Self {
            version: PROJECT_VERSION.to_string(),
            timestamp,
            map_url,
            markers,
        }
    }
}
