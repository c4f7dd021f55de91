// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types for the marker store, project files and durable storage.

use thiserror::Error;

/// Errors returned by marker operations on the state store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The marker title was empty or whitespace only.
    #[error("Marker title must not be empty")]
    Validation,

    /// No marker with this id exists.
    #[error("Marker not found: {0}")]
    NotFound(String),
}

/// Errors that can occur when importing or exporting a project document.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// The input is not valid JSON.
    #[error("Failed to parse project file: {0}")]
    Parse(#[source] serde_json::Error),

    /// The input is JSON but does not have the project shape.
    #[error("Invalid project file: {0}")]
    Shape(String),

    /// Reading or writing the project file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the durable key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to (de)serialize stored value: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
