use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, Plot, PlotPoints, Points};

use crate::color::ColorMap;
use crate::data::analysis::{BoxPlotStats, Histogram, PairCell, PairGrid};

const PAIR_CELL_SIZE: f32 = 150.0;

// ---------------------------------------------------------------------------
// Histograms
// ---------------------------------------------------------------------------

fn histogram_bars(hist: &Histogram) -> Vec<Bar> {
    let width = hist.bin_width();
    hist.counts
        .iter()
        .zip(&hist.edges)
        .map(|(&count, &left)| Bar::new(left + width / 2.0, count as f64).width(width))
        .collect()
}

/// Histograms side by side, each overlaid with its density curve.
pub fn histogram_row(ui: &mut Ui, histograms: &[Histogram], colors: &ColorMap) {
    if histograms.is_empty() {
        return;
    }
    ui.columns(histograms.len(), |columns: &mut [Ui]| {
        for (ui, hist) in columns.iter_mut().zip(histograms) {
            let color = colors.color_for(&hist.column);
            ui.label(format!("Histogram of {}", hist.column));
            Plot::new(("histogram", &hist.column))
                .height(240.0)
                .legend(Legend::default())
                .x_axis_label(hist.column.as_str())
                .y_axis_label("Count")
                .allow_drag(false)
                .allow_scroll(false)
                .show(ui, |plot_ui| {
                    plot_ui.bar_chart(
                        BarChart::new(histogram_bars(hist))
                            .color(color.linear_multiply(0.6))
                            .name(&hist.column),
                    );
                    if !hist.density.is_empty() {
                        let points: PlotPoints = hist.density.iter().copied().collect();
                        plot_ui.line(Line::new(points).color(color).width(2.0).name("KDE"));
                    }
                });
        }
    });
}

// ---------------------------------------------------------------------------
// Box plot
// ---------------------------------------------------------------------------

/// Horizontal box-and-whisker plot with fliers drawn as points.
pub fn box_plot(ui: &mut Ui, column: &str, stats: &BoxPlotStats, color: Color32) {
    let q = stats.quartiles;
    let spread = BoxSpread::new(stats.whisker_low, q.q1, q.median, q.q3, stats.whisker_high);
    let elem = BoxElem::new(0.0, spread).name(column).fill(color.linear_multiply(0.3));

    Plot::new(("box_plot", column))
        .height(180.0)
        .x_axis_label(column)
        .show_y(false)
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.box_plot(BoxPlot::new(vec![elem]).horizontal().color(color).name(column));
            if !stats.fliers.is_empty() {
                let points: PlotPoints = stats.fliers.iter().map(|&v| [v, 0.0]).collect();
                plot_ui.points(Points::new(points).radius(3.0).color(color).name("outliers"));
            }
        });
}

// ---------------------------------------------------------------------------
// Pair grid
// ---------------------------------------------------------------------------

/// Scatter matrix: histograms on the diagonal, scatter plots elsewhere.
pub fn pair_grid(ui: &mut Ui, grid: &PairGrid, colors: &ColorMap) {
    let n = grid.columns.len();
    if n == 0 {
        ui.label("No numeric columns.");
        return;
    }

    eframe::egui::ScrollArea::both()
        .id_salt("pair_grid_scroll")
        .show(ui, |ui: &mut Ui| {
            eframe::egui::Grid::new("pair_grid")
                .spacing([4.0, 4.0])
                .show(ui, |ui: &mut Ui| {
                    for (row, cells) in grid.cells.iter().enumerate() {
                        for (col, pair_cell) in cells.iter().enumerate() {
                            let mut plot = Plot::new(("pair", row, col))
                                .width(PAIR_CELL_SIZE)
                                .height(PAIR_CELL_SIZE)
                                .allow_drag(false)
                                .allow_zoom(false)
                                .allow_scroll(false)
                                .allow_boxed_zoom(false);
                            if row == n - 1 {
                                plot = plot.x_axis_label(grid.columns[col].as_str());
                            }
                            if col == 0 {
                                plot = plot.y_axis_label(grid.columns[row].as_str());
                            }
                            let color = colors.color_for(&grid.columns[col]);

                            plot.show(ui, |plot_ui| match pair_cell {
                                PairCell::Histogram(hist) => {
                                    plot_ui.bar_chart(
                                        BarChart::new(histogram_bars(hist)).color(color),
                                    );
                                }
                                PairCell::Scatter(points) => {
                                    let points: PlotPoints = points.iter().copied().collect();
                                    plot_ui.points(Points::new(points).radius(2.0).color(color));
                                }
                                PairCell::Empty => {}
                            });
                        }
                        ui.end_row();
                    }
                });
        });
}
