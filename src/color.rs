use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            to_color32(rgb)
        })
        .collect()
}

fn to_color32(rgb: Srgb) -> Color32 {
    let rgb: Srgb<u8> = rgb.into_format();
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

// ---------------------------------------------------------------------------
// Diverging map for correlation heatmaps
// ---------------------------------------------------------------------------

const COOL: (u8, u8, u8) = (59, 76, 192);
const NEUTRAL: (u8, u8, u8) = (221, 221, 221);
const WARM: (u8, u8, u8) = (180, 4, 38);

fn linear(c: (u8, u8, u8)) -> LinSrgb {
    Srgb::new(c.0, c.1, c.2).into_format::<f32>().into_linear()
}

/// Blue → grey → red for values in `[-1, 1]`; values outside are clamped,
/// `None` (undefined coefficient) is transparent.
pub fn diverging(value: Option<f64>) -> Color32 {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return Color32::TRANSPARENT;
    };
    let v = v.clamp(-1.0, 1.0) as f32;
    let mixed = if v < 0.0 {
        linear(NEUTRAL).mix(linear(COOL), -v)
    } else {
        linear(NEUTRAL).mix(linear(WARM), v)
    };
    to_color32(Srgb::from_linear(mixed))
}

/// Text colour that stays readable on top of `background`.
pub fn contrast_text(background: Color32) -> Color32 {
    let luma = 0.299 * background.r() as f32
        + 0.587 * background.g() as f32
        + 0.114 * background.b() as f32;
    if luma > 140.0 {
        Color32::BLACK
    } else {
        Color32::WHITE
    }
}

// ---------------------------------------------------------------------------
// Color mapping: column name → Color32
// ---------------------------------------------------------------------------

/// Maps numeric column names to distinct colours so a column keeps its
/// colour across every chart.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map for the given columns, in order.
    pub fn new(columns: &[String]) -> Self {
        let palette = generate_palette(columns.len());
        let mapping = columns.iter().cloned().zip(palette).collect();

        ColorMap {
            mapping,
            default_color: Color32::LIGHT_BLUE,
        }
    }

    /// Look up the colour for a given column.
    pub fn color_for(&self, column: &str) -> Color32 {
        self.mapping
            .get(column)
            .copied()
            .unwrap_or(self.default_color)
    }
}
