use crate::provider::InteractionControls;
use crate::types::{GeoCoord, lat_lon};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Engine configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineConfig {
    /// Where the map looks when neither entities nor a focus coordinate are known.
    /// Default: Bandung city center
    pub fallback_center: GeoCoord,
    /// Wide zoom used with the fallback center
    pub default_zoom: f64,
    /// Initial zoom when the map is created around a known focus coordinate
    pub focus_zoom: f64,
    /// Zoom forced when framing a single entity or an empty list with a focus
    pub close_zoom: f64,
    /// Keep the selection across a marker rebuild when the selected id is still
    /// present. When false every rebuild clears the selection.
    pub preserve_selection: bool,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub controls: InteractionControls,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fallback_center: lat_lon(-6.9175, 107.6191),
            default_zoom: 12.0,
            focus_zoom: 14.0,
            close_zoom: 15.0,
            preserve_selection: true,
            controls: InteractionControls::default(),
        }
    }
}

impl EngineConfig {
    /// Initial (center, zoom) for a new surface
    pub fn initial_view(&self, focus: Option<GeoCoord>) -> (GeoCoord, f64) {
        match focus {
            Some(focus) => (focus, self.focus_zoom),
            None => (self.fallback_center, self.default_zoom),
        }
    }
}
