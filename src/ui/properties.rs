// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Marker list and details panel.
//!
//! Lists all markers and shows the details of the selected one, with
//! buttons to edit or delete it.

use crate::io::media::ImageSource;
use crate::models::marker::Marker;
use crate::ui::canvas::marker_color;

/// Result of panel interaction.
pub enum PropertiesAction {
    None,
    SelectMarker(String),
    EditMarker(String),
    DeleteMarker(String),
}

/// Display the panel contents.
pub fn show(ui: &mut egui::Ui, markers: &[Marker], selected: Option<&str>) -> PropertiesAction {
    let mut action = PropertiesAction::None;

    ui.heading(format!("Markers ({})", markers.len()));
    ui.separator();

    egui::ScrollArea::vertical()
        .id_source("marker_list")
        .max_height(ui.available_height() * 0.5)
        .show(ui, |ui| {
            if markers.is_empty() {
                ui.label(egui::RichText::new("Click on the map to add a marker").weak());
            }
            for marker in markers {
                let is_selected = selected == Some(marker.id.as_str());
                ui.horizontal(|ui| {
                    ui.colored_label(marker_color(marker.marker_type), "●");
                    if ui.selectable_label(is_selected, &marker.title).clicked() {
                        action = PropertiesAction::SelectMarker(marker.id.clone());
                    }
                });
            }
        });

    let Some(marker) = selected.and_then(|id| markers.iter().find(|m| m.id == id)) else {
        return action;
    };

    ui.separator();
    ui.heading(&marker.title);
    ui.label(
        egui::RichText::new(marker.marker_type.label())
            .color(marker_color(marker.marker_type)),
    );
    ui.label(format!("Position: {:.1}%, {:.1}%", marker.coords.x, marker.coords.y));
    if !marker.description.is_empty() {
        ui.add_space(4.0);
        ui.label(&marker.description);
    }
    if let Some(ref image_url) = marker.image_url {
        ui.add_space(4.0);
        ui.label(egui::RichText::new(image_summary(image_url)).weak());
    }

    ui.add_space(8.0);
    ui.horizontal(|ui| {
        if ui.button("✏ Edit").clicked() {
            action = PropertiesAction::EditMarker(marker.id.clone());
        }
        if ui.button("🗑 Delete").clicked() {
            action = PropertiesAction::DeleteMarker(marker.id.clone());
        }
    });

    action
}

/// Short description of an image reference; data URIs can be megabytes.
fn image_summary(image_url: &str) -> String {
    match ImageSource::classify(image_url) {
        ImageSource::Embedded => "Image: embedded".to_string(),
        _ if image_url.chars().count() > 48 => {
            let head: String = image_url.chars().take(45).collect();
            format!("Image: {}...", head)
        }
        _ => format!("Image: {}", image_url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_summary() {
        assert_eq!(image_summary("data:image/png;base64,AAAA"), "Image: embedded");
        assert_eq!(image_summary("https://a.b/c.png"), "Image: https://a.b/c.png");

        let long = format!("https://example.com/{}", "x".repeat(100));
        let summary = image_summary(&long);
        assert!(summary.ends_with("..."));
        assert_eq!(summary.chars().count(), "Image: ".len() + 45 + 3);
    }
}
