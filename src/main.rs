// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! MapMark - map annotation tool
//!
//! A cross-platform desktop application for placing labeled markers on a
//! map image, with undo, auto-save and JSON project import/export.

mod app;
mod config;
mod context;
mod error;
mod io;
mod models;
mod state;
mod ui;
mod util;

use anyhow::Result;
use app::MapMarkApp;
use config::AppConfig;

fn main() -> Result<()> {
    let (config, config_warning) = AppConfig::load_or_default();

    // Initialize logging; RUST_LOG still takes precedence
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_filter()),
    )
    .init();

    if let Some(warning) = config_warning {
        log::warn!("{}", warning);
    }

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 600.0])
            .with_drag_and_drop(true)
            .with_title("MapMark"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "MapMark",
        options,
        Box::new(move |_cc| Ok(Box::new(MapMarkApp::new(&config)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
