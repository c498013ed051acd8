//! Tier → pin visual mapping

/// Plain RGB color, independent of any UI toolkit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// How a pin should look. Providers translate this into their native marker icon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerIcon {
    pub fill: Rgb,
    pub label: &'static str,
    /// Relative size, 1.0 being the provider's default pin
    pub scale: f32,
}

/// Pin used for absent tiers and values outside 0..=4
pub const FALLBACK_ICON: MarkerIcon = MarkerIcon {
    fill: Rgb(97, 97, 97),
    label: "Unknown",
    scale: 0.9,
};

/// Default tier styling.
///
/// Total over every input: 0 is "unclassified", 1-4 are ranked categories, and
/// anything else (including `None`) gets [`FALLBACK_ICON`]. Tiers are not validated
/// beyond that membership check.
pub fn default_tier_icon(tier: Option<i64>) -> MarkerIcon {
    match tier {
        Some(0) => MarkerIcon {
            fill: Rgb(158, 158, 158),
            label: "Unclassified",
            scale: 1.0,
        },
        Some(1) => MarkerIcon {
            fill: Rgb(46, 125, 50),
            label: "Tier 1",
            scale: 1.2,
        },
        Some(2) => MarkerIcon {
            fill: Rgb(21, 101, 192),
            label: "Tier 2",
            scale: 1.1,
        },
        Some(3) => MarkerIcon {
            fill: Rgb(249, 168, 37),
            label: "Tier 3",
            scale: 1.0,
        },
        Some(4) => MarkerIcon {
            fill: Rgb(198, 40, 40),
            label: "Tier 4",
            scale: 1.0,
        },
        _ => FALLBACK_ICON,
    }
}
