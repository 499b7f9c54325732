mod app;
mod color;
mod data;
mod error;
mod export;
mod figure;
mod state;
mod ui;

use app::TaPlotterApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 700.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Data Plotter with Savitzky-Golay Filter",
        options,
        Box::new(|_cc| Ok(Box::new(TaPlotterApp::default()))),
    )
}
