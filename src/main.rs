mod app;
mod color;
mod config;
mod data;
mod error;
mod state;
mod ui;

use app::TidyPandaApp;
use config::Settings;
use eframe::egui;

fn main() -> eframe::Result {
    let settings_path = Settings::path();
    let loaded = Settings::load_from(&settings_path);
    let settings = loaded.as_ref().cloned().unwrap_or_default();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&settings.log_level))
        .init();

    if let Err(e) = &loaded {
        log::error!("Ignoring settings file: {e:#}");
    }
    log::debug!("Settings: {settings:?}");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 840.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Tidy Panda – CSV Cleaning & Analysis",
        options,
        Box::new(|_cc| Ok(Box::new(TidyPandaApp::new(settings)))),
    )
}
