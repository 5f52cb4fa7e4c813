use eframe::egui::{self, RichText, ScrollArea, Ui};

use crate::color::ColorMap;
use crate::data::model::Dataset;
use crate::data::summary;
use crate::state::{AppState, Page};
use crate::ui::{heatmap, panels, plot, table};

/// Render the central panel for the current page.
pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading(state.page.title());
    ui.separator();

    if !state.store.is_loaded() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Load your CSV file  (File → Open CSV…)");
        });
        return;
    }

    if state.page == Page::Analysis {
        state.refresh_analysis();
    }

    let mut download = false;
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            let Some(ds) = state.store.dataset() else {
                return;
            };
            ui.strong("DataFrame");
            table::dataset_table(ui, "dataset", ds);
            if ds.is_empty() {
                ui.label("The file has a header but no rows.");
            }
            ui.add_space(8.0);

            match state.page {
                Page::Cleaning => {
                    overview(ui, ds, state.settings.preview_rows);
                    ui.add_space(8.0);
                    download = ui.button("Download modified DataFrame").clicked();
                }
                Page::Analysis => analysis_sections(ui, state, ds),
                Page::Summary => overview(ui, ds, state.settings.preview_rows),
            }
        });

    if download {
        panels::save_file_dialog(state);
    }
}

// ---------------------------------------------------------------------------
// Overview (head / tail / describe / nulls / info)
// ---------------------------------------------------------------------------

fn overview(ui: &mut Ui, ds: &Dataset, preview_rows: usize) {
    let names = ds.column_names();

    ui.strong("First rows");
    table::rows_table(ui, "head", &names, &summary::head(ds, preview_rows));
    ui.add_space(8.0);

    ui.strong("Last rows");
    table::rows_table(ui, "tail", &names, &summary::tail(ds, preview_rows));
    ui.add_space(8.0);

    ui.strong("Description");
    table::describe_table(ui, "describe", &summary::describe(ds));
    ui.add_space(8.0);

    ui.strong("Missing values");
    let missing: Vec<(String, String)> = summary::missing_counts(ds)
        .into_iter()
        .map(|(name, n)| (name, n.to_string()))
        .collect();
    table::key_value_table(ui, "missing", &missing);
    ui.add_space(8.0);

    ui.strong("Info");
    ui.label(RichText::new(summary::info(ds).to_string()).monospace());
}

// ---------------------------------------------------------------------------
// Analysis sections
// ---------------------------------------------------------------------------

fn section_error(ui: &mut Ui, message: &str) {
    ui.label(RichText::new(message).color(egui::Color32::RED));
}

fn analysis_sections(ui: &mut Ui, state: &AppState, ds: &Dataset) {
    let ctl = &state.analysis;
    let cache = &state.cache;
    let colors = ColorMap::new(&ds.numeric_column_names());
    let target = ctl.target_column.as_deref().unwrap_or_default();

    if let Some(central) = &cache.central {
        ui.heading("Central tendency");
        table::stat_table(ui, "central", central);
        ui.add_space(8.0);
    }

    if let Some(result) = &cache.dispersion {
        ui.heading(format!("Dispersion of {target}"));
        match result {
            Ok(d) => table::key_value_table(
                ui,
                "dispersion",
                &[
                    ("standard deviation".to_owned(), table::format_value(d.std_dev)),
                    ("variance".to_owned(), table::format_value(d.variance)),
                    ("range".to_owned(), table::format_value(d.range)),
                ],
            ),
            Err(e) => section_error(ui, e),
        }
        ui.add_space(8.0);
    }

    if let Some(result) = &cache.histograms {
        ui.heading("Histograms of the numeric variables");
        match result {
            Ok(hists) if hists.is_empty() => {
                ui.label(
                    RichText::new("Select at least one column to draw histograms.")
                        .color(egui::Color32::from_rgb(220, 160, 40)),
                );
            }
            Ok(hists) => plot::histogram_row(ui, hists, &colors),
            Err(e) => section_error(ui, e),
        }
        ui.add_space(8.0);
    }

    if let Some(result) = &cache.outliers {
        ui.heading(format!("Outliers of {target}"));
        match result {
            Ok(values) if values.is_empty() => {
                ui.label("No outliers.");
            }
            Ok(values) => {
                let entries: Vec<(String, String)> = values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), v.to_string()))
                    .collect();
                table::key_value_table(ui, "outliers", &entries);
            }
            Err(e) => section_error(ui, e),
        }
        ui.add_space(8.0);
    }

    if let Some(result) = &cache.box_plot {
        ui.heading(format!("Box plot of {target}"));
        match result {
            Ok(Some(stats)) => plot::box_plot(ui, target, stats, colors.color_for(target)),
            Ok(None) => {
                ui.label("No values to plot.");
            }
            Err(e) => section_error(ui, e),
        }
        ui.add_space(8.0);
    }

    if let Some(matrix) = &cache.correlation {
        ui.heading("Correlation matrix");
        heatmap::correlation_heatmap(ui, matrix);
        table::correlation_table(ui, "correlation", matrix);
        ui.add_space(8.0);
    }

    if let Some(grid) = &cache.pairs {
        ui.heading("Scatter matrix");
        plot::pair_grid(ui, grid, &colors);
        ui.add_space(8.0);
    }

    if let Some(result) = &cache.correlation_test {
        ui.heading(format!("Correlation test ({})", ctl.method.name()));
        match result {
            Ok(matrix) => table::correlation_table(ui, "correlation_test", matrix),
            Err(e) => section_error(ui, e),
        }
    }
}
