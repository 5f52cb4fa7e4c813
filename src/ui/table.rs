use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::analysis::{CorrelationMatrix, StatTable};
use crate::data::model::{Dataset, Value};
use crate::data::summary::{Description, DESCRIBE_ROWS};

const ROW_HEIGHT: f32 = 18.0;
const HEADER_HEIGHT: f32 = 22.0;

/// Four decimals, `NaN` for undefined statistics.
pub fn format_value(value: Option<f64>) -> String {
    value.map_or_else(|| "NaN".to_owned(), |v| format!("{v:.4}"))
}

/// Shared table frame: an index column plus `columns` data columns.
fn table(ui: &mut Ui, columns: usize, max_height: f32) -> TableBuilder<'_> {
    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::auto().at_least(40.0))
        .columns(Column::auto().at_least(70.0).clip(true), columns)
        .min_scrolled_height(0.0)
        .max_scroll_height(max_height)
}

// ---------------------------------------------------------------------------
// Dataset rows
// ---------------------------------------------------------------------------

/// The whole dataset, virtualised so only visible rows are laid out.
pub fn dataset_table(ui: &mut Ui, id: &str, dataset: &Dataset) {
    let names = dataset.column_names();
    ui.push_id(id, |ui: &mut Ui| {
        egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
            table(ui, names.len(), 320.0)
                .header(HEADER_HEIGHT, |mut header| {
                    header.col(|_| {});
                    for name in &names {
                        header.col(|ui: &mut Ui| {
                            ui.strong(name);
                        });
                    }
                })
                .body(|body| {
                    body.rows(ROW_HEIGHT, dataset.len(), |mut row| {
                        let index = row.index();
                        row.col(|ui: &mut Ui| {
                            ui.weak(index.to_string());
                        });
                        for value in dataset.row(index) {
                            row.col(|ui: &mut Ui| {
                                cell(ui, &value);
                            });
                        }
                    });
                });
        });
    });
}

/// A handful of indexed rows (head / tail previews).
pub fn rows_table(ui: &mut Ui, id: &str, names: &[String], rows: &[(usize, Vec<Value>)]) {
    ui.push_id(id, |ui: &mut Ui| {
        egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
            table(ui, names.len(), 200.0)
                .header(HEADER_HEIGHT, |mut header| {
                    header.col(|_| {});
                    for name in names {
                        header.col(|ui: &mut Ui| {
                            ui.strong(name);
                        });
                    }
                })
                .body(|mut body| {
                    for (index, values) in rows {
                        body.row(ROW_HEIGHT, |mut row| {
                            row.col(|ui: &mut Ui| {
                                ui.weak(index.to_string());
                            });
                            for value in values {
                                row.col(|ui: &mut Ui| {
                                    cell(ui, value);
                                });
                            }
                        });
                    }
                });
        });
    });
}

fn cell(ui: &mut Ui, value: &Value) {
    match value {
        Value::Missing => {
            ui.weak(value.to_string());
        }
        other => {
            ui.label(other.to_string());
        }
    }
}

// ---------------------------------------------------------------------------
// Statistics tables
// ---------------------------------------------------------------------------

/// Generic labelled matrix: one row per `row_labels`, one column per
/// `col_labels`.
fn matrix_table(
    ui: &mut Ui,
    id: &str,
    row_labels: &[String],
    col_labels: &[String],
    value: impl Fn(usize, usize) -> String,
) {
    ui.push_id(id, |ui: &mut Ui| {
        egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
            table(ui, col_labels.len(), 300.0)
                .header(HEADER_HEIGHT, |mut header| {
                    header.col(|_| {});
                    for name in col_labels {
                        header.col(|ui: &mut Ui| {
                            ui.strong(name);
                        });
                    }
                })
                .body(|mut body| {
                    for (r, label) in row_labels.iter().enumerate() {
                        body.row(ROW_HEIGHT, |mut row| {
                            row.col(|ui: &mut Ui| {
                                ui.strong(label);
                            });
                            for c in 0..col_labels.len() {
                                row.col(|ui: &mut Ui| {
                                    ui.label(value(r, c));
                                });
                            }
                        });
                    }
                });
        });
    });
}

/// statistic × column
pub fn stat_table(ui: &mut Ui, id: &str, stats: &StatTable) {
    let rows: Vec<String> = stats.keys().cloned().collect();
    let cols: Vec<String> = stats
        .values()
        .next()
        .map(|m| m.keys().cloned().collect())
        .unwrap_or_default();
    matrix_table(ui, id, &rows, &cols, |r, c| {
        format_value(stats[&rows[r]].get(&cols[c]).copied().flatten())
    });
}

/// `describe()` layout: statistics down, columns across.
pub fn describe_table(ui: &mut Ui, id: &str, description: &[Description]) {
    let rows: Vec<String> = DESCRIBE_ROWS.iter().map(|s| s.to_string()).collect();
    let cols: Vec<String> = description.iter().map(|d| d.column.clone()).collect();
    matrix_table(ui, id, &rows, &cols, |r, c| format_value(description[c].values[r]));
}

pub fn correlation_table(ui: &mut Ui, id: &str, matrix: &CorrelationMatrix) {
    let names = &matrix.columns;
    matrix_table(ui, id, names, names, |r, c| {
        format_value(matrix.get(&names[r], &names[c]))
    });
}

/// Two-column name → value listing.
pub fn key_value_table(ui: &mut Ui, id: &str, entries: &[(String, String)]) {
    egui::Grid::new(id)
        .striped(true)
        .num_columns(2)
        .show(ui, |ui: &mut Ui| {
            for (key, value) in entries {
                ui.strong(key);
                ui.label(value);
                ui.end_row();
            }
        });
}
