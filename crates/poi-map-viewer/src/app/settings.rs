use crate::app::tiles::TilesProvider;
use clap::Parser;
use poi_overlay::{EngineConfig, GeoCoord, lat_lon};
use std::path::PathBuf;

/// Environment variable consulted when `--api-key` is not given
pub const API_KEY_ENV: &str = "POI_MAP_API_KEY";

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// POI Map Viewer - Interactive map of points of interest with a pinned detail popover
pub struct Settings {
    /// JSON file with the entities to show (array, or object with an "entities" array)
    #[clap(short, long, value_name = "FILE")]
    pub entities: Option<PathBuf>,

    /// Map tile provider
    #[clap(short, long, value_enum, default_value_t = TilesProvider::OpenStreetMap)]
    pub tiles: TilesProvider,

    /// Tile provider API key (falls back to the POI_MAP_API_KEY environment variable)
    #[clap(long)]
    pub api_key: Option<String>,

    /// Latitude of the user focus coordinate
    #[clap(long, requires = "focus_lon", allow_hyphen_values = true)]
    pub focus_lat: Option<f64>,

    /// Longitude of the user focus coordinate
    #[clap(long, requires = "focus_lat", allow_hyphen_values = true)]
    pub focus_lon: Option<f64>,

    /// Zoom used around the fallback center when nothing else is known
    #[clap(long)]
    pub default_zoom: Option<f64>,

    /// Initial zoom when a focus coordinate is given
    #[clap(long)]
    pub focus_zoom: Option<f64>,

    /// Zoom used for a single entity, or for an empty list around the focus
    #[clap(long)]
    pub close_zoom: Option<f64>,

    /// Clear the selection every time the entity list is reloaded
    #[clap(long, default_value = "false")]
    pub reset_selection_on_refresh: bool,

    /// Reload the entity file whenever it changes on disk
    #[clap(short, long, default_value = "false")]
    pub watch: bool,

    /// Hide the +/- zoom buttons
    #[clap(long, default_value = "false")]
    pub no_zoom_buttons: bool,
}

impl Settings {
    pub fn from_cli() -> Self {
        match Settings::try_parse() {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }

    pub fn focus(&self) -> Option<GeoCoord> {
        match (self.focus_lat, self.focus_lon) {
            (Some(lat), Some(lon)) => Some(lat_lon(lat, lon)),
            _ => None,
        }
    }

    /// Credential from the command line, then from the environment. May be empty.
    pub fn api_key(&self) -> String {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .unwrap_or_default()
    }

    pub fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::default();
        if let Some(zoom) = self.default_zoom {
            config.default_zoom = zoom;
        }
        if let Some(zoom) = self.focus_zoom {
            config.focus_zoom = zoom;
        }
        if let Some(zoom) = self.close_zoom {
            config.close_zoom = zoom;
        }
        config.preserve_selection = !self.reset_selection_on_refresh;
        config.controls.zoom_buttons = !self.no_zoom_buttons;
        config
    }
}
