use tracing_subscriber::prelude::*;

/// Initialize logging with sensible defaults. Must run before anything logs.
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;

    if std::env::var("RUST_LOG").is_err() {
        // Safety: single-threaded at startup
        unsafe {
            if cfg!(debug_assertions) {
                std::env::set_var(
                    "RUST_LOG",
                    "debug,eframe::native=warn,hyper_util=info,walkers=info,egui::context=warn,reqwest::connect=info",
                );
            } else {
                std::env::set_var("RUST_LOG", "info,eframe=warn");
            }
        }
    }

    let fmt_layer = fmt::layer().with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(fmt_layer).init();

    tracing::info!(
        "Logging initialized ({} {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
}
