//! Viewport projection adapter
//!
//! Wraps the provider's overlay attachment behind [`ProjectionCapable`]. The
//! adapter is bound to exactly one surface and only becomes ready when the
//! provider reports [`MapEvent::OverlayAttached`](crate::MapEvent::OverlayAttached)
//! for its overlay; until then every query answers [`Unavailable::NotReady`].

use crate::provider::{MapSurface, OverlayId};
use crate::types::{GeoCoord, PixelPosition};
use crate::utils;

/// Why a projection could not be produced. A normal transient state, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unavailable {
    /// The provider has not attached the overlay yet
    NotReady,
    /// The adapter was detached from its surface
    Detached,
    InvalidCoordinate,
}

/// Geo → container pixel conversion
pub trait ProjectionCapable {
    /// Project through the current viewport transform. Never cached.
    fn project_to_container_pixel(&self, coord: GeoCoord) -> Result<PixelPosition, Unavailable>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdapterState {
    Pending,
    Ready,
    Detached,
}

/// Projection capability of one map surface
#[derive(Debug)]
pub struct ProjectionAdapter {
    overlay: OverlayId,
    state: AdapterState,
}

impl ProjectionAdapter {
    /// Ask the surface to attach an overlay. The adapter starts pending.
    pub fn attach<S: MapSurface + ?Sized>(surface: &mut S) -> Self {
        let overlay = surface.attach_overlay();
        tracing::debug!("Requested projection overlay {:?}", overlay);
        Self {
            overlay,
            state: AdapterState::Pending,
        }
    }

    pub fn overlay(&self) -> OverlayId {
        self.overlay
    }

    pub fn is_ready(&self) -> bool {
        self.state == AdapterState::Ready
    }

    /// Handle the provider's attached notification. Returns true if this made
    /// the adapter ready; notifications for other overlays, or arriving after
    /// detach, are ignored.
    pub fn on_attached(&mut self, overlay: OverlayId) -> bool {
        if overlay != self.overlay || self.state != AdapterState::Pending {
            return false;
        }
        tracing::debug!("Projection overlay {:?} attached", overlay);
        self.state = AdapterState::Ready;
        true
    }

    /// Release readiness and the provider attachment
    pub fn detach<S: MapSurface + ?Sized>(&mut self, surface: &mut S) {
        if self.state != AdapterState::Detached {
            surface.detach_overlay(self.overlay);
            self.state = AdapterState::Detached;
        }
    }

    /// Pair the adapter with the surface it belongs to
    pub fn bind<'a, S: MapSurface + ?Sized>(&'a self, surface: &'a S) -> BoundProjection<'a, S> {
        BoundProjection {
            adapter: self,
            surface,
        }
    }
}

/// A [`ProjectionAdapter`] borrowed together with its surface
pub struct BoundProjection<'a, S: MapSurface + ?Sized> {
    adapter: &'a ProjectionAdapter,
    surface: &'a S,
}

impl<S: MapSurface + ?Sized> ProjectionCapable for BoundProjection<'_, S> {
    fn project_to_container_pixel(&self, coord: GeoCoord) -> Result<PixelPosition, Unavailable> {
        match self.adapter.state {
            AdapterState::Pending => return Err(Unavailable::NotReady),
            AdapterState::Detached => return Err(Unavailable::Detached),
            AdapterState::Ready => {}
        }
        if !utils::is_valid_coord(coord) {
            return Err(Unavailable::InvalidCoordinate);
        }
        self.surface
            .overlay_projection(self.adapter.overlay, coord)
            .ok_or(Unavailable::NotReady)
    }
}

/// Stand-in used while no surface exists
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSurface;

impl ProjectionCapable for NoSurface {
    fn project_to_container_pixel(&self, _coord: GeoCoord) -> Result<PixelPosition, Unavailable> {
        Err(Unavailable::Detached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSurface;
    use crate::types::lat_lon;

    #[test]
    fn test_queries_before_attach_are_rejected() {
        let mut surface = FakeSurface::new(lat_lon(-6.92, 107.61), 12.0);
        let adapter = ProjectionAdapter::attach(&mut surface);

        // The surface could project already, the adapter must still refuse
        let projection = adapter.bind(&surface);
        assert_eq!(
            projection.project_to_container_pixel(lat_lon(-6.92, 107.61)),
            Err(Unavailable::NotReady)
        );
    }

    #[test]
    fn test_ready_after_attached_notification() {
        let mut surface = FakeSurface::new(lat_lon(-6.92, 107.61), 12.0);
        let mut adapter = ProjectionAdapter::attach(&mut surface);
        surface.complete_attachment();

        assert!(!adapter.on_attached(OverlayId(9999)));
        assert!(adapter.on_attached(adapter.overlay()));
        assert!(!adapter.on_attached(adapter.overlay()));

        let px = adapter
            .bind(&surface)
            .project_to_container_pixel(lat_lon(-6.92, 107.61))
            .unwrap();
        assert_eq!(px, PixelPosition::new(400.0, 300.0));
    }

    #[test]
    fn test_projection_is_stable_without_viewport_change() {
        let mut surface = FakeSurface::new(lat_lon(-6.92, 107.61), 12.0);
        let mut adapter = ProjectionAdapter::attach(&mut surface);
        surface.complete_attachment();
        adapter.on_attached(adapter.overlay());

        let coord = lat_lon(-6.93, 107.63);
        let a = adapter.bind(&surface).project_to_container_pixel(coord);
        let b = adapter.bind(&surface).project_to_container_pixel(coord);
        assert!(a.is_ok());
        assert_eq!(a, b);
    }

    #[test]
    fn test_projection_follows_viewport_without_caching() {
        let mut surface = FakeSurface::new(lat_lon(-6.92, 107.61), 12.0);
        let mut adapter = ProjectionAdapter::attach(&mut surface);
        surface.complete_attachment();
        adapter.on_attached(adapter.overlay());

        let coord = lat_lon(-6.93, 107.63);
        let before = adapter.bind(&surface).project_to_container_pixel(coord).unwrap();
        surface.pan_to(lat_lon(-6.95, 107.65));
        let after = adapter.bind(&surface).project_to_container_pixel(coord).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn test_invalid_coordinate_and_detach() {
        let mut surface = FakeSurface::new(lat_lon(0.0, 0.0), 3.0);
        let mut adapter = ProjectionAdapter::attach(&mut surface);
        surface.complete_attachment();
        adapter.on_attached(adapter.overlay());

        assert_eq!(
            adapter
                .bind(&surface)
                .project_to_container_pixel(lat_lon(f64::NAN, 0.0)),
            Err(Unavailable::InvalidCoordinate)
        );

        adapter.detach(&mut surface);
        assert!(!adapter.is_ready());
        assert!(!adapter.on_attached(adapter.overlay()));
        assert_eq!(
            adapter
                .bind(&surface)
                .project_to_container_pixel(lat_lon(0.0, 0.0)),
            Err(Unavailable::Detached)
        );
    }

    #[test]
    fn test_no_surface_is_unavailable() {
        assert_eq!(
            NoSurface.project_to_container_pixel(lat_lon(0.0, 0.0)),
            Err(Unavailable::Detached)
        );
    }
}
