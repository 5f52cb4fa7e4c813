use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::clean::CurrencyConversion;
use crate::data::loader::{DataSource, EXPORT_MIME};
use crate::data::analysis::CorrelationMethod;
use crate::data::model::ColumnType;
use crate::state::{AppState, Page, StatusKind};

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu, page navigation and status line.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open CSV…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let loaded = state.store.is_loaded();
            if ui
                .add_enabled(loaded, egui::Button::new("Download modified CSV…"))
                .clicked()
            {
                save_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        for page in Page::ALL {
            if ui.selectable_label(state.page == page, page.title()).clicked() {
                state.page = page;
            }
        }

        ui.separator();

        if let Some(ds) = state.dataset() {
            ui.label(format!(
                "{}: {} rows × {} columns",
                state.store.source_name().unwrap_or("dataset"),
                ds.len(),
                ds.width()
            ));
        }

        ui.separator();

        if let Some(status) = &state.status {
            let color = match status.kind {
                StatusKind::Success => Color32::from_rgb(60, 170, 90),
                StatusKind::Warning => Color32::from_rgb(220, 160, 40),
                StatusKind::Error => Color32::RED,
            };
            ui.label(RichText::new(&status.text).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Load your CSV file")
        .add_filter("CSV", &["csv"])
        .add_filter("All files", &["*"])
        .pick_file();

    if let Some(path) = file {
        match DataSource::from_path(&path) {
            Ok(source) => state.open_source(&source),
            Err(e) => state.report_error(&anyhow::Error::new(e).context(format!("reading {}", path.display()))),
        }
    }
}

pub fn save_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Download modified DataFrame")
        .set_file_name(state.settings.export_file_name.as_str())
        .add_filter(EXPORT_MIME, &["csv"])
        .save_file();

    if let Some(path) = file {
        if let Err(e) = state.export_to(&path) {
            state.report_error(&e);
        }
    }
}

// ---------------------------------------------------------------------------
// Left side panel – operation controls
// ---------------------------------------------------------------------------

/// Render the left options panel for the current page.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Options");
    ui.separator();

    if !state.store.is_loaded() {
        ui.label("No dataset loaded.");
        if ui.button("Open CSV…").clicked() {
            open_file_dialog(state);
        }
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| match state.page {
            Page::Cleaning => cleaning_controls(ui, state),
            Page::Analysis => analysis_controls(ui, state),
            Page::Summary => {
                ui.label("Read-only overview of the loaded table.");
            }
        });
}

/// Combo box over `options`; returns whether the selection changed.
fn column_combo(
    ui: &mut Ui,
    id: &str,
    selected: &mut Option<String>,
    options: &[String],
) -> bool {
    let mut changed = false;
    egui::ComboBox::from_id_salt(id)
        .selected_text(selected.clone().unwrap_or_default())
        .show_ui(ui, |ui: &mut Ui| {
            for option in options {
                let is_selected = selected.as_deref() == Some(option.as_str());
                if ui.selectable_label(is_selected, option).clicked() && !is_selected {
                    *selected = Some(option.clone());
                    changed = true;
                }
            }
        });
    changed
}

fn cleaning_controls(ui: &mut Ui, state: &mut AppState) {
    let (all, numeric) = match state.dataset() {
        Some(ds) => (ds.column_names(), ds.numeric_column_names()),
        None => return,
    };

    ui.strong("Replace missing values with the mean");
    column_combo(ui, "impute_column", &mut state.cleaning.impute_column, &numeric);
    if ui.button("Fix data").clicked() {
        state.impute();
    }

    ui.separator();

    ui.strong("Change column type");
    column_combo(ui, "type_column", &mut state.cleaning.type_column, &all);
    egui::ComboBox::from_id_salt("target_type")
        .selected_text(state.cleaning.target_type.label())
        .show_ui(ui, |ui: &mut Ui| {
            for kind in ColumnType::ALL {
                ui.selectable_value(&mut state.cleaning.target_type, kind, kind.label());
            }
        });
    if ui.button("Change type").clicked() {
        state.change_type();
    }

    ui.separator();

    ui.strong("Convert currency");
    column_combo(ui, "currency_column", &mut state.cleaning.currency_column, &numeric);
    egui::ComboBox::from_id_salt("conversion")
        .selected_text(state.cleaning.conversion.to_string())
        .show_ui(ui, |ui: &mut Ui| {
            for conversion in CurrencyConversion::ALL {
                ui.selectable_value(&mut state.cleaning.conversion, conversion, conversion.to_string());
            }
        });
    ui.label(format!("Rate: {}", state.settings.exchange_rate));
    if ui.button("Convert").clicked() {
        state.convert_currency();
    }

    ui.separator();

    ui.strong("Limit age range");
    column_combo(ui, "clamp_column", &mut state.cleaning.clamp_column, &numeric);
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Min");
        ui.add(egui::DragValue::new(&mut state.cleaning.bounds.min).range(0.0..=f64::MAX));
        ui.label("Max");
        ui.add(egui::DragValue::new(&mut state.cleaning.bounds.max).range(0.0..=f64::MAX));
    });
    if ui.button("Apply limit").clicked() {
        state.clamp();
    }
}

fn analysis_controls(ui: &mut Ui, state: &mut AppState) {
    let numeric = match state.dataset() {
        Some(ds) => ds.numeric_column_names(),
        None => return,
    };
    let mut changed = false;
    let ctl = &mut state.analysis;

    ui.strong("Target column");
    changed |= column_combo(ui, "target_column", &mut ctl.target_column, &numeric);
    ui.separator();

    changed |= ui.checkbox(&mut ctl.show_central, "Central tendency").changed();
    changed |= ui.checkbox(&mut ctl.show_dispersion, "Dispersion").changed();

    changed |= ui.checkbox(&mut ctl.show_histograms, "Histograms").changed();
    if ctl.show_histograms {
        ui.indent("histogram_columns", |ui: &mut Ui| {
            for name in &numeric {
                let mut checked = ctl.histogram_columns.contains(name);
                if ui.checkbox(&mut checked, name).changed() {
                    if checked {
                        ctl.histogram_columns.push(name.clone());
                    } else {
                        ctl.histogram_columns.retain(|c| c != name);
                    }
                    changed = true;
                }
            }
        });
    }

    changed |= ui.checkbox(&mut ctl.show_outliers, "Outliers").changed();
    if ctl.show_outliers {
        ui.horizontal(|ui: &mut Ui| {
            ui.label("IQR factor");
            changed |= ui
                .add(egui::DragValue::new(&mut ctl.outlier_factor).speed(0.1).range(0.0..=10.0))
                .changed();
        });
    }

    changed |= ui.checkbox(&mut ctl.show_box_plot, "Box plot").changed();
    changed |= ui.checkbox(&mut ctl.show_correlation, "Correlation matrix").changed();
    changed |= ui.checkbox(&mut ctl.show_pairs, "Scatter matrix").changed();

    changed |= ui.checkbox(&mut ctl.show_correlation_test, "Correlation test").changed();
    if ctl.show_correlation_test {
        egui::ComboBox::from_id_salt("correlation_method")
            .selected_text(ctl.method.name())
            .show_ui(ui, |ui: &mut Ui| {
                for method in CorrelationMethod::ALL {
                    changed |= ui.selectable_value(&mut ctl.method, method, method.name()).changed();
                }
            });
    }

    if changed {
        state.invalidate_analysis();
    }
}
