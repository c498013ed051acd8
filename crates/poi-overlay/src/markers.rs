//! Marker synchronizer
//!
//! Mirrors the entity list as provider pins. There is no diffing: every sync
//! removes all previous pins before creating the new ones, so a frame can never
//! show a pin from both the old and the new list.

use crate::config::EngineConfig;
use crate::entity::{Entity, EntityId};
use crate::provider::{MapSurface, MarkerId, MarkerOptions};
use crate::style::MarkerIcon;
use crate::types::{GeoBounds, GeoCoord};

/// How the view should be positioned after a sync
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Framing {
    FitBounds(GeoBounds),
    Center { center: GeoCoord, zoom: f64 },
}

/// Result of one [`MarkerSynchronizer::sync`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncOutcome {
    /// Pins created
    pub placed: usize,
    /// Entities skipped because of an invalid position
    pub skipped: usize,
    pub framing: Framing,
}

#[derive(Debug, Clone, Copy)]
struct PlacedPin {
    marker: MarkerId,
    entity: EntityId,
}

/// Owns the MarkerSet of one surface
#[derive(Debug, Default)]
pub struct MarkerSynchronizer {
    pins: Vec<PlacedPin>,
}

impl MarkerSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    /// Entity ids in pin order
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.pins.iter().map(|pin| pin.entity)
    }

    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.pins.iter().any(|pin| pin.entity == id)
    }

    /// Resolve a clicked pin to its entity. Pins from an earlier sync resolve to `None`.
    pub fn entity_for_marker(&self, marker: MarkerId) -> Option<EntityId> {
        self.pins
            .iter()
            .find(|pin| pin.marker == marker)
            .map(|pin| pin.entity)
    }

    /// Remove every pin this synchronizer created
    pub fn clear<S: MapSurface + ?Sized>(&mut self, surface: &mut S) {
        for pin in self.pins.drain(..) {
            surface.remove_marker(pin.marker);
        }
    }

    /// Replace the pin set with one pin per entity and frame the view.
    ///
    /// Entities with invalid coordinates get no pin and do not take part in framing.
    pub fn sync<S: MapSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        entities: &[Entity],
        style: &dyn Fn(Option<i64>) -> MarkerIcon,
        focus: Option<GeoCoord>,
        config: &EngineConfig,
    ) -> SyncOutcome {
        profiling::scope!("MarkerSynchronizer::sync");

        let removed = self.pins.len();
        self.clear(surface);

        let mut skipped = 0;
        let mut placed_positions = Vec::with_capacity(entities.len());
        for entity in entities {
            if !entity.has_valid_position() {
                tracing::warn!(
                    "Skipping entity {} '{}' with invalid position ({}, {})",
                    entity.id,
                    entity.name,
                    entity.latitude,
                    entity.longitude
                );
                skipped += 1;
                continue;
            }
            let marker = surface.add_marker(MarkerOptions {
                position: entity.position(),
                icon: style(entity.tier),
                title: entity.name.clone(),
            });
            self.pins.push(PlacedPin {
                marker,
                entity: entity.id,
            });
            placed_positions.push(entity.position());
        }

        let framing = frame_for(&placed_positions, focus, config);
        apply_framing(surface, &framing);

        tracing::debug!(
            "Synced markers: removed {}, placed {}, skipped {}, framing {:?}",
            removed,
            self.pins.len(),
            skipped,
            framing
        );

        SyncOutcome {
            placed: self.pins.len(),
            skipped,
            framing,
        }
    }

    /// Re-frame the view for the current pins without rebuilding them
    pub fn reframe<S: MapSurface + ?Sized>(
        &self,
        surface: &mut S,
        entities: &[Entity],
        focus: Option<GeoCoord>,
        config: &EngineConfig,
    ) -> Framing {
        let positions: Vec<GeoCoord> = entities
            .iter()
            .filter(|entity| self.contains_entity(entity.id) && entity.has_valid_position())
            .map(Entity::position)
            .collect();
        let framing = frame_for(&positions, focus, config);
        apply_framing(surface, &framing);
        framing
    }
}

/// Decide the view for a set of pin positions.
///
/// Several distinct positions fit their bounds; a single position (or several
/// identical ones) is centered at the close zoom; no positions fall back to the
/// focus coordinate at close zoom, then to the configured fallback at wide zoom.
pub fn frame_for(positions: &[GeoCoord], focus: Option<GeoCoord>, config: &EngineConfig) -> Framing {
    let bounds: GeoBounds = positions.iter().copied().collect();
    match (bounds.center(), focus) {
        (Some(center), _) if bounds.is_degenerate() => Framing::Center {
            center,
            zoom: config.close_zoom,
        },
        (Some(_), _) => Framing::FitBounds(bounds),
        (None, Some(focus)) => Framing::Center {
            center: focus,
            zoom: config.close_zoom,
        },
        (None, None) => Framing::Center {
            center: config.fallback_center,
            zoom: config.default_zoom,
        },
    }
}

fn apply_framing<S: MapSurface + ?Sized>(surface: &mut S, framing: &Framing) {
    match framing {
        Framing::FitBounds(bounds) => surface.fit_bounds(bounds),
        Framing::Center { center, zoom } => surface.set_view(*center, *zoom),
    }
}
