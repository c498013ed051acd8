//! Point-of-interest entities as supplied by the data collaborator

use crate::types::{GeoCoord, lat_lon};
use crate::utils;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable identity of an [`Entity`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A point of interest. The engine never mutates these; a refresh replaces the whole list.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Entity {
    pub id: EntityId,
    pub latitude: f64,
    pub longitude: f64,
    /// Ordinal classification (0 = unclassified, 1-4 = ranked). Any other value,
    /// or none at all, is still accepted and styled with the fallback pin.
    #[cfg_attr(feature = "serde", serde(default))]
    pub tier: Option<i64>,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub address: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub code: Option<String>,
    /// Free-form numeric metadata shown in the popover
    #[cfg_attr(feature = "serde", serde(default))]
    pub metrics: BTreeMap<String, f64>,
}

impl Entity {
    /// Minimal entity, mostly useful for tests and demos
    pub fn new(id: u64, name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: EntityId(id),
            latitude,
            longitude,
            tier: None,
            name: name.into(),
            address: String::new(),
            code: None,
            metrics: BTreeMap::new(),
        }
    }

    pub fn with_tier(mut self, tier: i64) -> Self {
        self.tier = Some(tier);
        self
    }

    pub fn position(&self) -> GeoCoord {
        lat_lon(self.latitude, self.longitude)
    }

    pub fn has_valid_position(&self) -> bool {
        utils::is_valid_coord(self.position())
    }
}
