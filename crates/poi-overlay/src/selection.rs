//! Selection and popover position tracker
//!
//! Holds at most one selected entity and its projected pixel position. While a
//! selection is active the tracker keeps one listener for each
//! [`ViewportEventKind`]; they are removed as soon as the selection is cleared.

use crate::entity::{Entity, EntityId};
use crate::projection::ProjectionCapable;
use crate::provider::{ListenerId, MapSurface, ViewportEventKind};
use crate::types::PixelPosition;

/// What a [`SelectionTracker::recompute`] produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Refresh {
    /// Nothing selected, or no projection available
    Hidden,
    Shown(PixelPosition),
    /// The selected id is not in the entity list any more. The position is
    /// already hidden; the caller should [`clear`](SelectionTracker::clear) so the
    /// listeners are released.
    Stale(EntityId),
}

#[derive(Debug, Default)]
pub struct SelectionTracker {
    selected: Option<EntityId>,
    position: Option<PixelPosition>,
    listeners: Vec<ListenerId>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<EntityId> {
        self.selected
    }

    /// Where the popover goes, in container pixels. `None` hides it.
    pub fn position(&self) -> Option<PixelPosition> {
        self.position
    }

    pub fn is_active(&self) -> bool {
        self.selected.is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Whether a viewport notification belongs to this tracker
    pub fn accepts(&self, listener: ListenerId) -> bool {
        self.listeners.contains(&listener)
    }

    /// Select an entity. Subscribes to viewport changes if a surface is given and
    /// the tracker is not subscribed yet. The position is hidden until the next
    /// [`recompute`](SelectionTracker::recompute).
    pub fn select<S: MapSurface + ?Sized>(&mut self, surface: Option<&mut S>, id: EntityId) {
        if self.selected != Some(id) {
            tracing::debug!("Selected entity {}", id);
            self.position = None;
        }
        self.selected = Some(id);
        if let Some(surface) = surface {
            self.subscribe(surface);
        }
    }

    /// Make sure the three viewport listeners exist while a selection is active.
    /// Used when the surface appears after the selection was made.
    pub fn subscribe<S: MapSurface + ?Sized>(&mut self, surface: &mut S) {
        if self.selected.is_none() || !self.listeners.is_empty() {
            return;
        }
        self.listeners = ViewportEventKind::ALL
            .iter()
            .map(|kind| surface.add_listener(*kind))
            .collect();
        tracing::trace!("Subscribed {} viewport listeners", self.listeners.len());
    }

    /// Drop the selection and every listener. Without a surface the handles are
    /// simply forgotten (the surface that issued them is gone).
    pub fn clear<S: MapSurface + ?Sized>(&mut self, surface: Option<&mut S>) {
        if let Some(id) = self.selected.take() {
            tracing::debug!("Cleared selection {}", id);
        }
        self.position = None;
        let listeners = std::mem::take(&mut self.listeners);
        if let Some(surface) = surface {
            for listener in listeners {
                surface.remove_listener(listener);
            }
        }
    }

    /// Recompute the popover position from the current selection and projection
    pub fn recompute(&mut self, entities: &[Entity], projection: &dyn ProjectionCapable) -> Refresh {
        let Some(id) = self.selected else {
            self.position = None;
            return Refresh::Hidden;
        };
        let Some(entity) = entities.iter().find(|entity| entity.id == id) else {
            tracing::debug!("Selection {} is stale", id);
            self.position = None;
            return Refresh::Stale(id);
        };
        self.position = projection
            .project_to_container_pixel(entity.position())
            .ok();
        match self.position {
            Some(position) => Refresh::Shown(position),
            None => Refresh::Hidden,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::{NoSurface, ProjectionAdapter};
    use crate::provider::MapEvent;
    use crate::testing::FakeSurface;
    use crate::types::lat_lon;

    fn entities() -> Vec<Entity> {
        vec![
            Entity::new(1, "one", -6.92, 107.61),
            Entity::new(2, "two", -6.93, 107.62),
        ]
    }

    fn attached_surface() -> (FakeSurface, ProjectionAdapter) {
        let mut surface = FakeSurface::new(lat_lon(-6.92, 107.61), 12.0);
        let mut adapter = ProjectionAdapter::attach(&mut surface);
        surface.complete_attachment();
        surface.drain_events();
        adapter.on_attached(adapter.overlay());
        (surface, adapter)
    }

    #[test]
    fn test_listeners_scoped_to_active_selection() {
        let mut surface = FakeSurface::new(lat_lon(0.0, 0.0), 5.0);
        let mut tracker = SelectionTracker::new();

        tracker.select(Some(&mut surface), EntityId(1));
        assert_eq!(surface.listener_count(), 3);
        assert_eq!(tracker.listener_count(), 3);

        // Switching selection keeps the same three listeners
        tracker.select(Some(&mut surface), EntityId(2));
        assert_eq!(surface.listener_count(), 3);

        tracker.clear(Some(&mut surface));
        assert_eq!(surface.listener_count(), 0);
        assert!(!tracker.is_active());
        assert_eq!(tracker.position(), None);
    }

    #[test]
    fn test_nothing_selected_is_hidden() {
        let (surface, adapter) = attached_surface();
        let mut tracker = SelectionTracker::new();
        assert_eq!(
            tracker.recompute(&entities(), &adapter.bind(&surface)),
            Refresh::Hidden
        );
    }

    #[test]
    fn test_projection_unavailable_hides_popover() {
        let mut surface = FakeSurface::new(lat_lon(-6.92, 107.61), 12.0);
        let adapter = ProjectionAdapter::attach(&mut surface);
        let mut tracker = SelectionTracker::new();
        tracker.select(Some(&mut surface), EntityId(1));

        assert_eq!(
            tracker.recompute(&entities(), &adapter.bind(&surface)),
            Refresh::Hidden
        );
        assert_eq!(tracker.recompute(&entities(), &NoSurface), Refresh::Hidden);
        assert_eq!(tracker.position(), None);
    }

    #[test]
    fn test_shown_position_tracks_viewport() {
        let (mut surface, adapter) = attached_surface();
        let mut tracker = SelectionTracker::new();
        tracker.select(Some(&mut surface), EntityId(1));

        let Refresh::Shown(first) = tracker.recompute(&entities(), &adapter.bind(&surface)) else {
            panic!("expected a position");
        };
        assert_eq!(first, PixelPosition::new(400.0, 300.0));

        surface.pan_to(lat_lon(-6.91, 107.60));
        let events = surface.drain_events();
        assert!(events.iter().all(|event| match event {
            MapEvent::Viewport { listener, .. } => tracker.accepts(*listener),
            _ => false,
        }));
        let Refresh::Shown(second) = tracker.recompute(&entities(), &adapter.bind(&surface)) else {
            panic!("expected a position");
        };
        assert_ne!(first, second);
        assert_eq!(tracker.position(), Some(second));
    }

    #[test]
    fn test_absent_selection_is_stale_not_a_panic() {
        let (mut surface, adapter) = attached_surface();
        let mut tracker = SelectionTracker::new();
        tracker.select(Some(&mut surface), EntityId(42));

        assert_eq!(
            tracker.recompute(&entities(), &adapter.bind(&surface)),
            Refresh::Stale(EntityId(42))
        );
        assert_eq!(tracker.position(), None);

        tracker.clear(Some(&mut surface));
        assert_eq!(surface.listener_count(), 0);
    }
}
