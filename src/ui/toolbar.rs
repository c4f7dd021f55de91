// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar with map, undo and zoom controls and the save indicator.

use crate::io::persistence::SaveStatus;
use crate::ui::canvas::Viewport;

/// Result of toolbar interaction.
pub enum ToolbarAction {
    None,
    UploadMap,
    RemoveMap,
    Undo,
    ZoomIn,
    ZoomOut,
    ResetZoom,
}

/// Display the toolbar.
pub fn show(
    ui: &mut egui::Ui,
    has_map: bool,
    can_undo: bool,
    viewport: &Viewport,
    save_status: SaveStatus,
) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        if ui.button("🗺 Upload Map").clicked() {
            action = ToolbarAction::UploadMap;
        }
        if ui.add_enabled(has_map, egui::Button::new("✖ Remove Map")).clicked() {
            action = ToolbarAction::RemoveMap;
        }

        ui.separator();

        if ui
            .add_enabled(can_undo, egui::Button::new("↶ Undo"))
            .on_hover_text("Ctrl+Z")
            .clicked()
        {
            action = ToolbarAction::Undo;
        }

        ui.separator();

        if ui.button("➖").on_hover_text("Zoom out").clicked() {
            action = ToolbarAction::ZoomOut;
        }
        if ui
            .button(format!("{:.0}%", viewport.zoom() * 100.0))
            .on_hover_text("Reset zoom")
            .clicked()
        {
            action = ToolbarAction::ResetZoom;
        }
        if ui.button("➕").on_hover_text("Zoom in").clicked() {
            action = ToolbarAction::ZoomIn;
        }

        ui.separator();

        let hint = if has_map {
            "Click the map to add a marker, click a marker to select it"
        } else {
            "Upload or drop an image to use as the map"
        };
        ui.label(egui::RichText::new(hint).italics().weak());

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let color = match save_status {
                SaveStatus::Failed => egui::Color32::from_rgb(220, 60, 60),
                _ => egui::Color32::from_gray(160),
            };
            ui.label(egui::RichText::new(save_status.label()).color(color));
        });
    });

    action
}
