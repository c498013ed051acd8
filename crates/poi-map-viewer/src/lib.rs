//! POI Map Viewer - Application Library
//!
//! Wires the overlay engine to a walkers slippy map inside an eframe window.

mod app;
mod logging;

pub use app::PoiMapViewerApp;
pub use logging::setup_logging;

/// Open the native window and run the app until it is closed
pub fn run_native(app_name: &str) -> eframe::Result<()> {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_title(app_name),
        ..Default::default()
    };

    eframe::run_native(
        app_name,
        native_options,
        Box::new(|cc| Ok(Box::new(PoiMapViewerApp::new(cc)))),
    )
}
