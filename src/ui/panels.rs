use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – plot controls
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Data");
    ui.separator();

    if ui.button("Load CSV…").clicked() {
        open_file_dialog(state);
    }

    match &state.source {
        Some(path) => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            ui.label(RichText::new(name).strong())
                .on_hover_text(path.display().to_string());
        }
        None if state.dataset.is_some() => {
            ui.label("(in-memory dataset)");
        }
        None => {
            ui.label("No dataset loaded.");
        }
    }

    if !state.trace_summary.is_empty() {
        ui.add_space(4.0);
        trace_table(ui, state);
    }

    ui.add_space(8.0);
    ui.heading("Plot");
    ui.separator();

    let inputs = &mut state.inputs;
    ui.checkbox(&mut inputs.use_filter, "Use Savitzky-Golay Filter");
    ui.add_enabled(
        inputs.use_filter,
        egui::Checkbox::new(&mut inputs.show_raw, "Plot Raw Data"),
    );

    ui.add_space(4.0);
    egui::Grid::new("plot_inputs")
        .num_columns(3)
        .spacing([6.0, 4.0])
        .show(ui, |ui: &mut Ui| {
            ui.label("Window Length:");
            number_field(ui, &mut inputs.window_length);
            ui.end_row();

            ui.label("Polynomial Order:");
            number_field(ui, &mut inputs.polyorder);
            ui.end_row();

            ui.label("Wavelength Range:");
            number_field(ui, &mut inputs.x_min);
            number_field(ui, &mut inputs.x_max);
            ui.end_row();

            ui.label("ΔA Range:");
            number_field(ui, &mut inputs.y_min);
            number_field(ui, &mut inputs.y_max);
            ui.end_row();
        });

    ui.add_space(8.0);
    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Plot Data").clicked() {
            if let Err(err) = state.plot() {
                debug_assert_eq!(state.notice.as_ref(), Some(&err));
            }
        }
        let can_save = state.can_export();
        if ui
            .add_enabled(can_save, egui::Button::new("Save Plot…"))
            .clicked()
        {
            save_file_dialog(state);
        }
    });
}

fn number_field(ui: &mut Ui, text: &mut String) {
    ui.add(egui::TextEdit::singleline(text).desired_width(64.0));
}

fn trace_table(ui: &mut Ui, state: &AppState) {
    TableBuilder::new(ui)
        .striped(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::exact(28.0)) // index
        .column(Column::remainder().at_least(60.0)) // delay
        .column(Column::auto()) // points
        .max_scroll_height(160.0)
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("#");
            });
            header.col(|ui| {
                ui.strong("Delay");
            });
            header.col(|ui| {
                ui.strong("Points");
            });
        })
        .body(|mut body| {
            for (i, summary) in state.trace_summary.iter().enumerate() {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(format!("{}", i + 1));
                    });
                    row.col(|ui| match &summary.label {
                        Some(label) => {
                            ui.label(label);
                        }
                        None => {
                            ui.label(RichText::new("no label").color(Color32::RED))
                                .on_hover_text("Signal header needs a delay after a comma, e.g. \"Signal, 5ps\"");
                        }
                    });
                    row.col(|ui| {
                        ui.label(summary.points.to_string());
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Load CSV…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.can_export(), egui::Button::new("Save Plot…"))
                .clicked()
            {
                save_file_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Quit").clicked() {
                ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
            }
        });

        ui.separator();

        if let Some(msg) = &state.status_message {
            ui.label(msg);
        }
    });
}

// ---------------------------------------------------------------------------
// Blocking notice
// ---------------------------------------------------------------------------

/// Show the pending error / warning until the user acknowledges it.
pub fn notice_modal(ctx: &egui::Context, state: &mut AppState) {
    let Some(notice) = &state.notice else {
        return;
    };

    let title_color = if notice.is_warning() {
        Color32::from_rgb(0xd0, 0x90, 0x00)
    } else {
        Color32::RED
    };
    let title = notice.title();
    let message = notice.to_string();

    let response = egui::Modal::new(egui::Id::new("notice")).show(ctx, |ui: &mut Ui| {
        ui.set_max_width(360.0);
        ui.label(RichText::new(title).heading().color(title_color));
        ui.add_space(6.0);
        ui.label(message);
        ui.add_space(10.0);
        ui.vertical_centered(|ui: &mut Ui| ui.button("OK").clicked()).inner
    });

    if response.inner || response.should_close() {
        state.dismiss_notice();
    }
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Load transient-absorbance CSV")
        .add_filter("CSV files", &["csv"])
        .pick_file();

    if let Some(path) = file {
        if let Err(err) = state.load_dataset(&path) {
            debug_assert_eq!(state.notice.as_ref(), Some(&err));
        }
    }
}

pub fn save_file_dialog(state: &mut AppState) {
    if !state.can_export() {
        return;
    }

    let stem = state
        .source
        .as_deref()
        .and_then(|p| p.file_stem())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "plot".into());

    let file = rfd::FileDialog::new()
        .set_title("Save plot")
        .set_file_name(format!("{stem}.png"))
        .add_filter("PNG files", &["png"])
        .add_filter("SVG files", &["svg"])
        .save_file();

    if let Some(path) = file {
        if let Err(err) = state.export(&path) {
            debug_assert_eq!(state.notice.as_ref(), Some(&err));
        }
    }
}
