//! Contract with the external mapping provider
//!
//! The engine never draws anything itself. It talks to the provider through these
//! traits: a [`MapProvider`] builds one [`MapSurface`] per engine, and the surface
//! owns pins, the view, the projection overlay and viewport listeners.
//!
//! Asynchronous provider notifications are not callbacks into the engine. The
//! surface queues them as [`MapEvent`]s and the engine drains the queue with
//! [`MapSurface::drain_events`]; each event names the handle (overlay, listener or
//! marker) it belongs to, so events for handles the engine already released are
//! simply ignored.

use crate::Result;
use crate::style::MarkerIcon;
use crate::types::{GeoBounds, GeoCoord, PixelPosition};

/// Handle of a pin created with [`MapSurface::add_marker`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerId(pub u64);

/// Handle of a viewport listener; pass it back to [`MapSurface::remove_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Handle of a projection overlay attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayId(pub u64);

/// Viewport-change notifications the provider can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewportEventKind {
    /// The view settled after a pan or zoom gesture
    Idle,
    ZoomChanged,
    CenterChanged,
}

impl ViewportEventKind {
    pub const ALL: [ViewportEventKind; 3] = [
        ViewportEventKind::Idle,
        ViewportEventKind::ZoomChanged,
        ViewportEventKind::CenterChanged,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ZoomChanged => "zoom_changed",
            Self::CenterChanged => "center_changed",
        }
    }
}

/// Notification queued by a surface for the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapEvent {
    /// The overlay is attached to the live surface; projection is now possible
    OverlayAttached(OverlayId),
    /// The viewport changed; only emitted for registered listeners
    Viewport {
        listener: ListenerId,
        kind: ViewportEventKind,
    },
    /// The user clicked a pin
    MarkerClicked(MarkerId),
}

/// Interaction controls requested when the surface is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionControls {
    /// Show +/- zoom buttons over the map
    pub zoom_buttons: bool,
    /// Show the tile attribution line
    pub attribution: bool,
}

impl Default for InteractionControls {
    fn default() -> Self {
        Self {
            zoom_buttons: true,
            attribution: true,
        }
    }
}

/// Map construction parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceOptions {
    pub center: GeoCoord,
    pub zoom: f64,
    pub controls: InteractionControls,
}

/// Pin construction parameters
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerOptions {
    pub position: GeoCoord,
    pub icon: MarkerIcon,
    pub title: String,
}

/// Where the map gets mounted
pub trait RenderTarget {
    /// Whether a map can be mounted here right now. `Err` explains why not.
    fn check_mountable(&self) -> std::result::Result<(), String>;
}

/// Factory for live map surfaces
pub trait MapProvider {
    /// Loaded provider runtime, shared by every surface on the thread
    type Runtime: 'static;
    type Target: RenderTarget + ?Sized;
    type Surface: MapSurface;

    fn create_surface(
        &mut self,
        runtime: &Self::Runtime,
        target: &Self::Target,
        options: &SurfaceOptions,
    ) -> Result<Self::Surface>;
}

/// One live map instance
pub trait MapSurface {
    /// Create a pin. Clicks on it arrive as [`MapEvent::MarkerClicked`].
    fn add_marker(&mut self, options: MarkerOptions) -> MarkerId;

    /// Remove a pin. Unknown handles are ignored.
    fn remove_marker(&mut self, marker: MarkerId);

    fn marker_count(&self) -> usize;

    /// Move and zoom the view so that `bounds` is fully visible
    fn fit_bounds(&mut self, bounds: &GeoBounds);

    fn set_view(&mut self, center: GeoCoord, zoom: f64);

    fn center(&self) -> GeoCoord;

    fn zoom(&self) -> f64;

    /// Start attaching a projection overlay. Readiness is signalled later with
    /// [`MapEvent::OverlayAttached`], never synchronously.
    fn attach_overlay(&mut self) -> OverlayId;

    fn detach_overlay(&mut self, overlay: OverlayId);

    /// Project through an attached overlay using the current view transform.
    /// `None` when the overlay is unknown or not attached yet.
    fn overlay_projection(&self, overlay: OverlayId, coord: GeoCoord) -> Option<PixelPosition>;

    fn add_listener(&mut self, kind: ViewportEventKind) -> ListenerId;

    /// Unknown handles are ignored
    fn remove_listener(&mut self, listener: ListenerId);

    fn listener_count(&self) -> usize;

    /// Take every queued notification, oldest first
    fn drain_events(&mut self) -> Vec<MapEvent>;
}
