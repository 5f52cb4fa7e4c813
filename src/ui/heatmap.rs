use eframe::egui::{self, Ui};

use crate::color::{contrast_text, diverging};
use crate::data::analysis::CorrelationMatrix;

const CELL_SIZE: f32 = 56.0;
const LABEL_WIDTH: f32 = 140.0;
const HEADER_HEIGHT: f32 = 40.0;

/// Annotated correlation heatmap, one coloured cell per column pair.
pub fn correlation_heatmap(ui: &mut Ui, matrix: &CorrelationMatrix) {
    let n = matrix.columns.len();
    if n == 0 {
        ui.label("No numeric columns.");
        return;
    }

    egui::ScrollArea::both()
        .id_salt("correlation_heatmap_scroll")
        .show(ui, |ui: &mut Ui| {
            let (rect, _response) = ui.allocate_exact_size(
                egui::vec2(
                    LABEL_WIDTH + n as f32 * CELL_SIZE + 10.0,
                    HEADER_HEIGHT + n as f32 * CELL_SIZE + 10.0,
                ),
                egui::Sense::hover(),
            );
            let painter = ui.painter();
            let text_color = ui.visuals().text_color();

            for (j, name) in matrix.columns.iter().enumerate() {
                painter.text(
                    rect.min
                        + egui::vec2(
                            LABEL_WIDTH + j as f32 * CELL_SIZE + CELL_SIZE / 2.0,
                            HEADER_HEIGHT - 6.0,
                        ),
                    egui::Align2::CENTER_BOTTOM,
                    name.chars().take(12).collect::<String>(),
                    egui::FontId::proportional(11.0),
                    text_color,
                );
            }

            for (i, row_name) in matrix.columns.iter().enumerate() {
                painter.text(
                    rect.min
                        + egui::vec2(
                            LABEL_WIDTH - 8.0,
                            HEADER_HEIGHT + i as f32 * CELL_SIZE + CELL_SIZE / 2.0,
                        ),
                    egui::Align2::RIGHT_CENTER,
                    row_name.chars().take(24).collect::<String>(),
                    egui::FontId::proportional(11.0),
                    text_color,
                );

                for (j, &value) in matrix.values[i].iter().enumerate() {
                    let cell_rect = egui::Rect::from_min_size(
                        rect.min
                            + egui::vec2(
                                LABEL_WIDTH + j as f32 * CELL_SIZE,
                                HEADER_HEIGHT + i as f32 * CELL_SIZE,
                            ),
                        egui::vec2(CELL_SIZE, CELL_SIZE),
                    );
                    let fill = diverging(value);
                    painter.rect_filled(cell_rect.shrink(1.0), 2.0, fill);

                    let label = value.map_or_else(|| "NaN".to_owned(), |v| format!("{v:.2}"));
                    let color = if value.is_some() {
                        contrast_text(fill)
                    } else {
                        text_color
                    };
                    painter.text(
                        cell_rect.center(),
                        egui::Align2::CENTER_CENTER,
                        label,
                        egui::FontId::proportional(12.0),
                        color,
                    );
                }
            }
        });
}
