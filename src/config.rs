// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application configuration.
//!
//! Settings are read from `config.yaml` in the platform config directory
//! (e.g. `~/.config/mapmark/config.yaml`). Every field is optional and a
//! missing or unreadable file means defaults.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Filter string understood by `env_logger`.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: LogLevel,

    /// Delay between the last marker change and the auto-save write.
    pub autosave_debounce_ms: u64,

    /// Number of undo steps kept.
    pub max_undo_depth: usize,

    /// Override of the directory holding saved markers and map.
    pub storage_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            autosave_debounce_ms: 500,
            max_undo_depth: 50,
            storage_dir: None,
        }
    }
}

impl AppConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mapmark").join("config.yaml"))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Load from the default path, falling back to defaults.
    ///
    /// Runs before the logger is configured, so problems are returned as
    /// a message for the caller to log.
    pub fn load_or_default() -> (Self, Option<String>) {
        let Some(path) = Self::default_path() else {
            return (Self::default(), None);
        };
        if !path.exists() {
            return (Self::default(), None);
        }

        match Self::load_from(&path) {
            Ok(config) => (config, None),
            Err(e) => (
                Self::default(),
                Some(format!("Ignoring config file {}: {}", path.display(), e)),
            ),
        }
    }
}
