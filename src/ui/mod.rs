//! egui rendering. Every widget reads from or writes to [`crate::state::AppState`];
//! no data logic lives here.

pub mod heatmap;
pub mod pages;
pub mod panels;
pub mod plot;
pub mod table;
