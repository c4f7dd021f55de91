// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Map canvas.
//!
//! Displays the background map at the current zoom, draws the marker pins
//! on top of it and turns clicks into "place marker here" or "select this
//! marker" actions.

use crate::models::marker::{Coordinates, Marker, MarkerType};
use crate::util::geometry::{from_percent, to_percent};

/// Pin radius in screen points.
const PIN_RADIUS: f32 = 8.0;

/// Result of canvas interaction.
pub enum CanvasAction {
    None,
    PlaceMarker(Coordinates),
    SelectMarker(String),
    Deselect,
}

/// Zoom state of the map view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    zoom: f32,
}

impl Viewport {
    pub const MIN_ZOOM: f32 = 0.25;
    pub const MAX_ZOOM: f32 = 4.0;
    const STEP: f32 = 1.25;

    pub fn new() -> Self {
        Self { zoom: 1.0 }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom * Self::STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom / Self::STEP);
    }

    pub fn reset(&mut self) {
        self.zoom = 1.0;
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);
    }

    /// Size of the map on screen: fitted into `available`, then zoomed.
    pub fn display_size(&self, image_size: (u32, u32), available: egui::Vec2) -> egui::Vec2 {
        let (img_width, img_height) = image_size;
        if img_width == 0 || img_height == 0 || available.x <= 0.0 || available.y <= 0.0 {
            return egui::Vec2::ZERO;
        }

        let img_aspect = img_width as f32 / img_height as f32;
        let available_aspect = available.x / available.y;

        let fitted = if img_aspect > available_aspect {
            // Image is wider - fit to width
            egui::vec2(available.x, available.x / img_aspect)
        } else {
            // Image is taller - fit to height
            egui::vec2(available.y * img_aspect, available.y)
        };

        fitted * self.zoom
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

/// Pin colour per marker category.
pub fn marker_color(marker_type: MarkerType) -> egui::Color32 {
    match marker_type {
        MarkerType::Info => egui::Color32::from_rgb(59, 130, 246),
        MarkerType::Warning => egui::Color32::from_rgb(234, 88, 12),
        MarkerType::Place => egui::Color32::from_rgb(22, 163, 74),
        MarkerType::Shop => egui::Color32::from_rgb(147, 51, 234),
    }
}

/// Display the map and markers and handle mouse interactions.
pub fn show(
    ui: &mut egui::Ui,
    markers: &[Marker],
    selected: Option<&str>,
    map_texture: Option<&egui::TextureHandle>,
    image_size: Option<(u32, u32)>,
    viewport: &Viewport,
    notice: Option<&str>,
) -> CanvasAction {
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);

    let (Some(texture), Some(image_size)) = (map_texture, image_size) else {
        show_placeholder(ui, notice);
        return CanvasAction::None;
    };

    let available = ui.available_size();
    let display_size = viewport.display_size(image_size, available);

    egui::ScrollArea::both()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            let (image_rect, response) = ui.allocate_exact_size(display_size, egui::Sense::click());
            let painter = ui.painter_at(image_rect);

            painter.image(
                texture.id(),
                image_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );

            let pins: Vec<(&Marker, egui::Pos2)> = markers
                .iter()
                .map(|m| (m, pin_position(&m.coords, image_rect)))
                .collect();

            let hovered = response
                .hover_pos()
                .and_then(|pos| hit_test(&pins, pos))
                .map(|m| m.id.as_str());

            for (marker, pos) in &pins {
                let is_selected = selected == Some(marker.id.as_str());
                let is_hovered = hovered == Some(marker.id.as_str());
                draw_pin(&painter, marker, *pos, is_selected || is_hovered);
            }

            if response.clicked() {
                if let Some(pos) = response.interact_pointer_pos() {
                    if let Some(marker) = hit_test(&pins, pos) {
                        return CanvasAction::SelectMarker(marker.id.clone());
                    }
                    // Convert screen coordinates to map percentages
                    let coords = to_percent(
                        (pos.x - image_rect.min.x) as f64,
                        (pos.y - image_rect.min.y) as f64,
                        image_rect.width() as f64,
                        image_rect.height() as f64,
                    );
                    return CanvasAction::PlaceMarker(coords);
                }
            }

            if response.secondary_clicked() {
                return CanvasAction::Deselect;
            }

            CanvasAction::None
        })
        .inner
}

fn show_placeholder(ui: &mut egui::Ui, notice: Option<&str>) {
    egui::Frame::canvas(ui.style()).show(ui, |ui| {
        ui.set_min_size(ui.available_size());
        ui.centered_and_justified(|ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(20.0);
                ui.heading(
                    egui::RichText::new("MapMark")
                        .size(32.0)
                        .color(egui::Color32::from_gray(200)),
                );
                ui.add_space(20.0);
                let message = notice.unwrap_or("Upload or drop a map image to begin");
                ui.label(egui::RichText::new(message).color(egui::Color32::from_gray(180)));
                ui.add_space(10.0);
                ui.label(
                    egui::RichText::new("File → Upload Map...")
                        .weak()
                        .color(egui::Color32::from_gray(130)),
                );
            });
        });
    });
}

fn pin_position(coords: &Coordinates, image_rect: egui::Rect) -> egui::Pos2 {
    let (x, y) = from_percent(
        coords,
        image_rect.width() as f64,
        image_rect.height() as f64,
    );
    egui::pos2(image_rect.min.x + x as f32, image_rect.min.y + y as f32)
}

/// Topmost marker under `pos`, if any.
fn hit_test<'a>(pins: &[(&'a Marker, egui::Pos2)], pos: egui::Pos2) -> Option<&'a Marker> {
    pins.iter()
        .rev()
        .find(|(_, pin)| pin.distance(pos) <= PIN_RADIUS + 2.0)
        .map(|(marker, _)| *marker)
}

fn draw_pin(painter: &egui::Painter, marker: &Marker, pos: egui::Pos2, highlighted: bool) {
    let color = marker_color(marker.marker_type);
    let radius = if highlighted { PIN_RADIUS + 2.0 } else { PIN_RADIUS };

    painter.circle_filled(pos, radius, color);
    painter.circle_stroke(pos, radius, egui::Stroke::new(2.0, egui::Color32::WHITE));

    if highlighted {
        let label_pos = pos - egui::vec2(0.0, radius + 4.0);
        let galley = painter.layout_no_wrap(
            marker.title.clone(),
            egui::FontId::proportional(14.0),
            egui::Color32::WHITE,
        );
        let text_rect = egui::Align2::CENTER_BOTTOM
            .anchor_size(label_pos, galley.size())
            .expand(4.0);
        painter.rect_filled(text_rect, 4.0, egui::Color32::from_black_alpha(200));
        painter.galley(text_rect.min + egui::vec2(4.0, 4.0), galley, egui::Color32::WHITE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_is_clamped() {
        let mut viewport = Viewport::new();
        for _ in 0..20 {
            viewport.zoom_in();
        }
        assert_eq!(viewport.zoom(), Viewport::MAX_ZOOM);

        for _ in 0..40 {
            viewport.zoom_out();
        }
        assert_eq!(viewport.zoom(), Viewport::MIN_ZOOM);

        viewport.reset();
        assert_eq!(viewport.zoom(), 1.0);
    }

    #[test]
    fn test_display_size_fits_then_zooms() {
        let mut viewport = Viewport::new();
        let available = egui::vec2(800.0, 800.0);

        // Wide image fits to width
        let size = viewport.display_size((1600, 800), available);
        assert_eq!(size, egui::vec2(800.0, 400.0));

        // Tall image fits to height
        let size = viewport.display_size((400, 1600), available);
        assert_eq!(size, egui::vec2(200.0, 800.0));

        viewport.set_zoom(2.0);
        let size = viewport.display_size((1600, 800), available);
        assert_eq!(size, egui::vec2(1600.0, 800.0));
    }

    #[test]
    fn test_display_size_degenerate() {
        let viewport = Viewport::new();
        assert_eq!(
            viewport.display_size((0, 100), egui::vec2(100.0, 100.0)),
            egui::Vec2::ZERO
        );
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let markers = crate::models::marker::default_markers();
        let rect = egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(100.0, 100.0));
        let pins: Vec<(&Marker, egui::Pos2)> = vec![
            (&markers[0], pin_position(&markers[0].coords, rect)),
            (&markers[1], egui::pos2(30.0, 40.0)),
        ];

        let hit = hit_test(&pins, egui::pos2(31.0, 41.0)).unwrap();
        assert_eq!(hit.id, "sample-2");
        assert!(hit_test(&pins, egui::pos2(90.0, 90.0)).is_none());
    }
}
