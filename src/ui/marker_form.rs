// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Add/edit marker dialog.

use crate::models::marker::{Coordinates, Marker, MarkerDraft, MarkerType};

/// What the form will do on submit.
#[derive(Debug, Clone, PartialEq)]
pub enum FormMode {
    Add(Coordinates),
    Edit(String),
}

/// Open marker form and its in-progress values.
#[derive(Debug, Clone)]
pub struct MarkerForm {
    pub mode: FormMode,
    pub draft: MarkerDraft,
    /// Validation or upload error shown under the fields
    pub error: Option<String>,
}

impl MarkerForm {
    pub fn add(coords: Coordinates) -> Self {
        Self {
            mode: FormMode::Add(coords),
            draft: MarkerDraft::default(),
            error: None,
        }
    }

    /// The image field starts empty, so submitting without a new image
    /// keeps the marker's current one.
    pub fn edit(marker: &Marker) -> Self {
        let mut draft = MarkerDraft::from_marker(marker);
        draft.image_url.clear();
        Self {
            mode: FormMode::Edit(marker.id.clone()),
            draft,
            error: None,
        }
    }

    fn title(&self) -> &'static str {
        match self.mode {
            FormMode::Add(_) => "Add Marker",
            FormMode::Edit(_) => "Edit Marker",
        }
    }
}

/// Result of form interaction.
pub enum FormAction {
    None,
    Submit,
    Cancel,
    PickImage,
}

/// Display the form as a centered window.
pub fn show(ctx: &egui::Context, form: &mut MarkerForm) -> FormAction {
    let mut action = FormAction::None;

    egui::Window::new(form.title())
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
        .show(ctx, |ui| {
            egui::Grid::new("marker_form_grid")
                .num_columns(2)
                .spacing([8.0, 6.0])
                .show(ui, |ui| {
                    ui.label("Title");
                    let title = ui.add(
                        egui::TextEdit::singleline(&mut form.draft.title)
                            .hint_text("Required"),
                    );
                    if title.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        action = FormAction::Submit;
                    }
                    ui.end_row();

                    ui.label("Description");
                    ui.add(
                        egui::TextEdit::multiline(&mut form.draft.description).desired_rows(3),
                    );
                    ui.end_row();

                    ui.label("Type");
                    egui::ComboBox::from_label("")
                        .selected_text(form.draft.marker_type.label())
                        .show_ui(ui, |ui| {
                            for marker_type in MarkerType::ALL {
                                ui.selectable_value(
                                    &mut form.draft.marker_type,
                                    marker_type,
                                    marker_type.label(),
                                );
                            }
                        });
                    ui.end_row();

                    ui.label("Image");
                    ui.horizontal(|ui| {
                        let hint = match form.mode {
                            FormMode::Add(_) => "URL, or leave empty for a placeholder",
                            FormMode::Edit(_) => "URL, or leave empty to keep current",
                        };
                        ui.add(
                            egui::TextEdit::singleline(&mut form.draft.image_url).hint_text(hint),
                        );
                        if ui.button("Upload...").clicked() {
                            action = FormAction::PickImage;
                        }
                    });
                    ui.end_row();
                });

            if let Some(ref error) = form.error {
                ui.add_space(4.0);
                ui.colored_label(egui::Color32::from_rgb(220, 60, 60), error);
            }

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Save").clicked() {
                    action = FormAction::Submit;
                }
                if ui.button("Cancel").clicked() {
                    action = FormAction::Cancel;
                }
            });
        });

    if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        action = FormAction::Cancel;
    }

    action
}
