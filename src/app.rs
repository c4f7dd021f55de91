// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module contains the main application structure that implements
//! the egui::App trait. It owns the [`AppContext`] and turns clicks, key
//! presses, dialogs and dropped files into store operations, then draws
//! the UI components from the resulting state.

use crate::config::AppConfig;
use crate::context::AppContext;
use crate::io::media::{self, ImageSource, LoadedImage};
use crate::io::persistence::SaveStatus;
use crate::io::serialization;
use crate::ui::canvas::{self, Viewport};
use crate::ui::marker_form::{self, FormAction, FormMode, MarkerForm};
use crate::ui::{properties, toolbar};
use crate::util::time::now_millis;
use anyhow::{anyhow, Context as _, Result};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::time::{Duration, Instant};

/// Map image decoded on a background thread.
struct LoadedMap {
    reference: String,
    result: Result<LoadedImage, String>,
}

/// Main application state.
pub struct MapMarkApp {
    /// Markers, map and auto-save
    context: AppContext,

    /// Zoom of the map view
    viewport: Viewport,

    /// Id of the marker shown in the details panel
    selected_marker: Option<String>,

    /// Open add/edit form
    form: Option<MarkerForm>,

    /// Loaded map texture for display
    map_texture: Option<egui::TextureHandle>,

    /// Map dimensions (width, height)
    map_size: Option<(u32, u32)>,

    /// Map reference the texture or notice was produced for
    displayed_map: Option<String>,

    /// Shown instead of the map when it cannot be displayed
    map_notice: Option<String>,

    /// Receiver for background map decoding
    image_loader: Option<Receiver<LoadedMap>>,

    /// Loading state message
    loading_message: Option<String>,
}

impl MapMarkApp {
    /// Create the application, restoring the last saved state.
    pub fn new(config: &AppConfig) -> Self {
        Self {
            context: AppContext::open(config),
            viewport: Viewport::new(),
            selected_marker: None,
            form: None,
            map_texture: None,
            map_size: None,
            displayed_map: None,
            map_notice: None,
            image_loader: None,
            loading_message: None,
        }
    }

    /// Start decoding the map if the store's map reference changed.
    fn sync_map_texture(&mut self) {
        if self.context.map_reference() == self.displayed_map.as_deref() {
            return;
        }

        self.displayed_map = self.context.map_reference().map(str::to_string);
        self.map_texture = None;
        self.map_size = None;
        self.map_notice = None;
        self.image_loader = None;
        self.loading_message = None;

        let Some(reference) = self.displayed_map.clone() else {
            return;
        };

        if ImageSource::classify(&reference) == ImageSource::Remote {
            self.map_notice = Some(format!("Remote map images are not displayed:\n{}", reference));
            return;
        }

        let (sender, receiver) = channel();
        self.image_loader = Some(receiver);
        self.loading_message = Some("Loading map...".to_string());

        // Spawn background thread for decoding
        std::thread::spawn(move || {
            let result = media::load_reference(&reference).map_err(|e| format!("{:#}", e));
            let _ = sender.send(LoadedMap { reference, result });
        });
    }

    /// Check for a finished background decode and upload the texture.
    fn poll_image_loader(&mut self, ctx: &egui::Context) {
        let Some(ref receiver) = self.image_loader else {
            return;
        };
        let Ok(loaded) = receiver.try_recv() else {
            return;
        };

        self.image_loader = None;
        self.loading_message = None;

        if self.displayed_map.as_deref() != Some(loaded.reference.as_str()) {
            // Superseded by a newer map
            return;
        }

        match loaded.result {
            Ok(image) => {
                let size = [image.width as usize, image.height as usize];
                let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &image.pixels);
                let texture = ctx.load_texture("map_image", color_image, egui::TextureOptions::LINEAR);

                self.map_texture = Some(texture);
                self.map_size = Some((image.width, image.height));
                log::info!("Map loaded ({}x{})", image.width, image.height);
            }
            Err(e) => {
                log::error!("Failed to load map: {}", e);
                self.map_notice = Some(format!("The map image could not be loaded:\n{}", e));
            }
        }
    }

    fn upload_map(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", media::IMAGE_EXTENSIONS)
            .pick_file()
        else {
            return;
        };

        match media::file_to_data_uri(&path) {
            Ok(uri) => {
                self.context.set_map_reference(Some(uri));
                self.viewport.reset();
                log::info!("Uploaded map {}", path.display());
            }
            Err(e) => show_error("Upload failed", &format!("{:#}", e)),
        }
    }

    fn remove_map(&mut self) {
        self.context.set_map_reference(None);
    }

    fn import_project(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Map project", &["json"])
            .pick_file()
        else {
            return;
        };

        match self.context.import_project_file(&path) {
            Ok(()) => self.after_import(),
            Err(e) => show_error("Import failed", &e.to_string()),
        }
    }

    fn export_project(&self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Map project", &["json"])
            .set_file_name(serialization::default_file_name(now_millis()))
            .save_file()
        else {
            return;
        };

        if let Err(e) = self.context.export_project_file(&path) {
            show_error("Export failed", &e.to_string());
        }
    }

    fn after_import(&mut self) {
        self.selected_marker = None;
        self.form = None;
        self.viewport.reset();
    }

    /// Dropped images become the map, dropped `.json` files are imported.
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().next() else {
            return;
        };

        if let Err(e) = self.handle_dropped_file(&file) {
            show_error("Could not open dropped file", &format!("{:#}", e));
        }
    }

    fn handle_dropped_file(&mut self, file: &egui::DroppedFile) -> Result<()> {
        let path = file
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from(&file.name));
        let bytes = match (&file.bytes, &file.path) {
            (Some(bytes), _) => bytes.to_vec(),
            (None, Some(path)) => std::fs::read(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
            (None, None) => return Err(anyhow!("Dropped file has no data")),
        };

        if is_project_path(&path) {
            let json = String::from_utf8(bytes).context("Project file is not UTF-8")?;
            self.context.import_project_json(&json)?;
            self.after_import();
            log::info!("Imported dropped project {}", path.display());
        } else if media::is_image_path(&path) {
            let uri = media::to_data_uri(media::mime_for_path(&path), &bytes);
            self.context.set_map_reference(Some(uri));
            self.viewport.reset();
            log::info!("Loaded dropped map {}", path.display());
        } else {
            return Err(anyhow!("Unsupported file type: {}", path.display()));
        }
        Ok(())
    }

    fn open_edit_form(&mut self, id: &str) {
        if let Some(marker) = self.context.marker(id) {
            self.form = Some(MarkerForm::edit(marker));
        }
    }

    fn submit_form(&mut self) {
        let Some(form) = self.form.as_mut() else {
            return;
        };

        let draft = form.draft.clone();
        let result = match &form.mode {
            FormMode::Add(coords) => self.context.add_marker(*coords, draft),
            FormMode::Edit(id) => self.context.edit_marker(id, draft).map(|_| id.clone()),
        };

        match result {
            Ok(id) => {
                self.selected_marker = Some(id);
                self.form = None;
            }
            Err(e) => form.error = Some(e.to_string()),
        }
    }

    fn pick_form_image(&mut self) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", media::IMAGE_EXTENSIONS)
            .pick_file()
        else {
            return;
        };

        match media::file_to_data_uri(&path) {
            Ok(uri) => {
                form.draft.image_url = uri;
                form.error = None;
            }
            Err(e) => form.error = Some(format!("{:#}", e)),
        }
    }

    fn delete_marker(&mut self, id: &str) {
        match self.context.delete_marker(id) {
            Ok(()) => {
                if self.selected_marker.as_deref() == Some(id) {
                    self.selected_marker = None;
                }
            }
            Err(e) => log::warn!("{}", e),
        }
    }

    fn undo(&mut self) {
        if self.context.undo() {
            // The selected marker may not exist in the restored list.
            if let Some(ref id) = self.selected_marker {
                if self.context.marker(id).is_none() {
                    self.selected_marker = None;
                }
            }
        }
    }

    /// Run the auto-save and make sure we wake up for pending writes.
    fn poll_persistence(&mut self, ctx: &egui::Context) {
        let persistence = self.context.persistence();
        persistence.poll();

        match persistence.next_deadline() {
            Some(deadline) => {
                ctx.request_repaint_after(deadline.saturating_duration_since(Instant::now()));
            }
            None if persistence.status() == SaveStatus::Saving => {
                ctx.request_repaint_after(Duration::from_millis(100));
            }
            None => {}
        }
    }
}

fn is_project_path(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Blocking error notification.
fn show_error(title: &str, message: &str) {
    log::error!("{}: {}", title, message);
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Error)
        .set_title(title)
        .set_description(message)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}

impl eframe::App for MapMarkApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for completed map decoding
        self.poll_image_loader(ctx);

        // Request repaint if still loading (to update spinner)
        if self.loading_message.is_some() {
            ctx.request_repaint();
        }

        self.handle_dropped_files(ctx);

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Upload Map...").clicked() {
                        self.upload_map();
                        ui.close_menu();
                    }
                    let has_map = self.context.map_reference().is_some();
                    if ui.add_enabled(has_map, egui::Button::new("Remove Map")).clicked() {
                        self.remove_map();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Import Project...").clicked() {
                        self.import_project();
                        ui.close_menu();
                    }
                    if ui.button("Export Project...").clicked() {
                        self.export_project();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Edit", |ui| {
                    let can_undo = self.context.can_undo() && self.form.is_none();
                    if ui.add_enabled(can_undo, egui::Button::new("Undo (Ctrl+Z)")).clicked() {
                        self.undo();
                        ui.close_menu();
                    }

                    ui.separator();

                    let selected = self.selected_marker.clone();
                    if ui
                        .add_enabled(selected.is_some(), egui::Button::new("Edit Selected..."))
                        .clicked()
                    {
                        if let Some(ref id) = selected {
                            self.open_edit_form(id);
                        }
                        ui.close_menu();
                    }
                    if ui
                        .add_enabled(selected.is_some(), egui::Button::new("Delete Selected"))
                        .clicked()
                    {
                        if let Some(ref id) = selected {
                            self.delete_marker(id);
                        }
                        ui.close_menu();
                    }
                });

                ui.menu_button("View", |ui| {
                    if ui.button("Zoom In").clicked() {
                        self.viewport.zoom_in();
                        ui.close_menu();
                    }
                    if ui.button("Zoom Out").clicked() {
                        self.viewport.zoom_out();
                        ui.close_menu();
                    }
                    if ui.button("Reset Zoom").clicked() {
                        self.viewport.reset();
                        ui.close_menu();
                    }
                });
            });
        });

        // Toolbar
        let toolbar_action = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| {
                toolbar::show(
                    ui,
                    self.context.map_reference().is_some(),
                    self.context.can_undo() && self.form.is_none(),
                    &self.viewport,
                    self.context.save_status(),
                )
            })
            .inner;

        match toolbar_action {
            toolbar::ToolbarAction::UploadMap => self.upload_map(),
            toolbar::ToolbarAction::RemoveMap => self.remove_map(),
            toolbar::ToolbarAction::Undo => self.undo(),
            toolbar::ToolbarAction::ZoomIn => self.viewport.zoom_in(),
            toolbar::ToolbarAction::ZoomOut => self.viewport.zoom_out(),
            toolbar::ToolbarAction::ResetZoom => self.viewport.reset(),
            toolbar::ToolbarAction::None => {}
        }

        // Marker panel (right side)
        let properties_action = egui::SidePanel::right("markers")
            .default_width(260.0)
            .show(ctx, |ui| {
                properties::show(
                    ui,
                    self.context.markers(),
                    self.selected_marker.as_deref(),
                )
            })
            .inner;

        match properties_action {
            properties::PropertiesAction::SelectMarker(id) => self.selected_marker = Some(id),
            properties::PropertiesAction::EditMarker(id) => self.open_edit_form(&id),
            properties::PropertiesAction::DeleteMarker(id) => self.delete_marker(&id),
            properties::PropertiesAction::None => {}
        }

        // Keyboard shortcuts are off while the form is open or a text field has focus
        if self.form.is_none() && !ctx.wants_keyboard_input() {
            if ctx.input(|i| i.modifiers.command && i.key_pressed(egui::Key::Z)) {
                self.undo();
            }

            if ctx.input(|i| i.key_pressed(egui::Key::Delete)) {
                if let Some(id) = self.selected_marker.clone() {
                    self.delete_marker(&id);
                }
            }

            if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
                self.selected_marker = None;
            }
        }

        // Main canvas (center)
        let canvas_action = egui::CentralPanel::default()
            .show(ctx, |ui| {
                if let Some(ref message) = self.loading_message {
                    ui.centered_and_justified(|ui| {
                        ui.vertical_centered(|ui| {
                            ui.add_space(20.0);
                            ui.spinner();
                            ui.add_space(10.0);
                            ui.label(
                                egui::RichText::new(message)
                                    .size(16.0)
                                    .color(egui::Color32::from_gray(200)),
                            );
                        });
                    });
                    canvas::CanvasAction::None
                } else {
                    canvas::show(
                        ui,
                        self.context.markers(),
                        self.selected_marker.as_deref(),
                        self.map_texture.as_ref(),
                        self.map_size,
                        &self.viewport,
                        self.map_notice.as_deref(),
                    )
                }
            })
            .inner;

        match canvas_action {
            canvas::CanvasAction::PlaceMarker(coords) if self.form.is_none() => {
                log::debug!("Placing marker at ({:.1}, {:.1})", coords.x, coords.y);
                self.form = Some(MarkerForm::add(coords));
            }
            canvas::CanvasAction::SelectMarker(id) => self.selected_marker = Some(id),
            canvas::CanvasAction::Deselect => self.selected_marker = None,
            _ => {}
        }

        // Add/edit form
        if let Some(form) = self.form.as_mut() {
            match marker_form::show(ctx, form) {
                FormAction::Submit => self.submit_form(),
                FormAction::Cancel => self.form = None,
                FormAction::PickImage => self.pick_form_image(),
                FormAction::None => {}
            }
        }

        self.sync_map_texture();
        self.poll_persistence(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        // Pending debounced writes must land before the process exits.
        self.context.flush();
    }
}
