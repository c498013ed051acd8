#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use poi_map_viewer::{run_native, setup_logging};

fn main() -> eframe::Result<()> {
    setup_logging();

    // Tile probes and downloads run on this runtime
    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };
    let _guard = rt.enter();

    run_native("POI Map Viewer")
}
