//! Walkers-backed map provider
//!
//! Adapts a walkers [`Map`] to the engine's provider contract. Viewport changes
//! are detected by comparing consecutive frames and queued as events; the
//! projection overlay counts as attached once the map has been laid out.

use crate::app::plugin::{FrameReport, PinPlugin, PinSprite, ViewSnapshot};
use crate::app::tiles::TileRuntime;
use poi_overlay::{
    GeoBounds, GeoCoord, InteractionControls, ListenerId, MapEvent, MapProvider, MapSurface,
    MarkerId, MarkerOptions, OverlayId, PixelPosition, RenderTarget, SurfaceOptions,
    ViewportEventKind,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use walkers::{HttpTiles, Map, MapMemory};

/// Zoom that roughly fits `bounds` into a typical window
pub fn fit_zoom(bounds: &GeoBounds) -> f64 {
    let Some((lat_span, lon_span)) = bounds.span() else {
        return 12.0;
    };
    let max_span = lat_span.abs().max(lon_span.abs());
    if max_span > 0.0 {
        let zoom_estimate = (4.0 * 360.0 / max_span).log2();
        (zoom_estimate - 0.5).clamp(1.0, 18.0)
    } else {
        12.0
    }
}

/// The map area of the central panel
pub struct MapArea {
    pub size: egui::Vec2,
}

impl RenderTarget for MapArea {
    fn check_mountable(&self) -> Result<(), String> {
        if self.size.x >= 1.0 && self.size.y >= 1.0 {
            Ok(())
        } else {
            Err(format!(
                "map area is {:.0}x{:.0} points",
                self.size.x, self.size.y
            ))
        }
    }
}

pub struct WalkersProvider {
    ctx: egui::Context,
}

impl WalkersProvider {
    pub fn new(ctx: egui::Context) -> Self {
        Self { ctx }
    }
}

impl MapProvider for WalkersProvider {
    type Runtime = TileRuntime;
    type Target = MapArea;
    type Surface = WalkersSurface;

    fn create_surface(
        &mut self,
        runtime: &TileRuntime,
        _target: &MapArea,
        options: &SurfaceOptions,
    ) -> poi_overlay::Result<WalkersSurface> {
        let tiles = HttpTiles::new(runtime.source(), self.ctx.clone());
        let mut surface = WalkersSurface {
            tiles,
            memory: MapMemory::default(),
            controls: options.controls,
            attribution: runtime.provider.attribution_text(),
            center: options.center,
            zoom: options.zoom,
            next_handle: 1,
            pins: Vec::new(),
            pending_overlays: Vec::new(),
            live_overlays: Vec::new(),
            listeners: Vec::new(),
            events: Vec::new(),
            view: None,
            moving: false,
            report: Arc::new(RwLock::new(FrameReport::default())),
        };
        surface.set_view(options.center, options.zoom);
        tracing::debug!("Created walkers surface with {}", runtime.provider.name());
        Ok(surface)
    }
}

pub struct WalkersSurface {
    tiles: HttpTiles,
    memory: MapMemory,
    controls: InteractionControls,
    attribution: &'static str,
    center: GeoCoord,
    zoom: f64,
    next_handle: u64,
    pins: Vec<PinSprite>,
    pending_overlays: Vec<OverlayId>,
    live_overlays: Vec<OverlayId>,
    listeners: Vec<(ListenerId, ViewportEventKind)>,
    events: Vec<MapEvent>,
    view: Option<ViewSnapshot>,
    /// The view changed in the previous frame; an idle event is due once it stops
    moving: bool,
    /// Shared with the plugin of the current frame
    report: Arc<RwLock<FrameReport>>,
}

impl WalkersSurface {
    fn handle(&mut self) -> u64 {
        let id = self.next_handle;
        self.next_handle += 1;
        id
    }

    fn notify(&mut self, kind: ViewportEventKind) {
        for (listener, registered) in &self.listeners {
            if *registered == kind {
                self.events.push(MapEvent::Viewport {
                    listener: *listener,
                    kind,
                });
            }
        }
    }

    /// Draw the map with its pins and controls. Returns the map's screen rect.
    pub fn show(&mut self, ui: &mut egui::Ui) -> egui::Rect {
        profiling::scope!("WalkersSurface::show");

        let plugin = PinPlugin::new(self.pins.clone(), self.report.clone());
        let my_position = walkers::lat_lon(self.center.y(), self.center.x());
        let map = Map::new(Some(&mut self.tiles), &mut self.memory, my_position).with_plugin(plugin);
        let rect = ui.add(map).rect;

        if self.controls.zoom_buttons {
            self.zoom_buttons(ui, rect);
        }
        if self.controls.attribution {
            ui.painter().text(
                rect.center_bottom() + egui::vec2(0.0, -5.0),
                egui::Align2::CENTER_BOTTOM,
                self.attribution,
                egui::FontId::proportional(10.0),
                egui::Color32::from_black_alpha(180),
            );
        }

        self.end_frame();
        rect
    }

    fn zoom_buttons(&mut self, ui: &mut egui::Ui, rect: egui::Rect) {
        let size = egui::vec2(32.0, 32.0);
        let origin = rect.left_top() + egui::vec2(10.0, 10.0);
        let plus = egui::Rect::from_min_size(origin, size);
        let minus = egui::Rect::from_min_size(origin + egui::vec2(0.0, size.y + 4.0), size);

        if ui.put(plus, egui::Button::new("➕")).clicked() {
            let _ = self.memory.zoom_in();
        }
        if ui.put(minus, egui::Button::new("➖")).clicked() {
            let _ = self.memory.zoom_out();
        }
    }

    /// Turn what the plugin saw this frame into queued events
    fn end_frame(&mut self) {
        // Use try_write for non-blocking UI polling.
        let report = match self.report.try_write() {
            Ok(mut report) => std::mem::take(&mut *report),
            Err(_) => return,
        };

        if let Some(view) = report.view {
            let (center_changed, zoom_changed) = match self.view {
                Some(previous) => (
                    previous.center != view.center || previous.size != view.size,
                    previous.zoom != view.zoom,
                ),
                None => (false, false),
            };
            self.view = Some(view);
            self.center = view.center;
            self.zoom = view.zoom;

            // The overlay can project once the map has a layout
            for overlay in self.pending_overlays.drain(..) {
                self.live_overlays.push(overlay);
                self.events.push(MapEvent::OverlayAttached(overlay));
            }

            if zoom_changed {
                self.notify(ViewportEventKind::ZoomChanged);
            }
            if center_changed {
                self.notify(ViewportEventKind::CenterChanged);
            }
            if center_changed || zoom_changed {
                self.moving = true;
            } else if self.moving {
                self.moving = false;
                self.notify(ViewportEventKind::Idle);
            }
        }

        if let Some(marker) = report.clicked
            && self.pins.iter().any(|pin| pin.marker == marker)
        {
            self.events.push(MapEvent::MarkerClicked(marker));
        }
    }
}

impl MapSurface for WalkersSurface {
    fn add_marker(&mut self, options: MarkerOptions) -> MarkerId {
        let marker = MarkerId(self.handle());
        self.pins.push(PinSprite {
            marker,
            position: options.position,
            icon: options.icon,
            title: options.title,
        });
        marker
    }

    fn remove_marker(&mut self, marker: MarkerId) {
        self.pins.retain(|pin| pin.marker != marker);
    }

    fn marker_count(&self) -> usize {
        self.pins.len()
    }

    fn fit_bounds(&mut self, bounds: &GeoBounds) {
        if let Some(center) = bounds.center() {
            self.set_view(center, fit_zoom(bounds));
        }
    }

    fn set_view(&mut self, center: GeoCoord, zoom: f64) {
        self.center = center;
        self.zoom = zoom;
        self.memory
            .center_at(walkers::lat_lon(center.y(), center.x()));
        let _ = self.memory.set_zoom(zoom);
    }

    fn center(&self) -> GeoCoord {
        self.center
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn attach_overlay(&mut self) -> OverlayId {
        let overlay = OverlayId(self.handle());
        self.pending_overlays.push(overlay);
        overlay
    }

    fn detach_overlay(&mut self, overlay: OverlayId) {
        self.pending_overlays.retain(|o| *o != overlay);
        self.live_overlays.retain(|o| *o != overlay);
    }

    fn overlay_projection(&self, overlay: OverlayId, coord: GeoCoord) -> Option<PixelPosition> {
        if !self.live_overlays.contains(&overlay) {
            return None;
        }
        self.view.map(|view| view.project(coord))
    }

    fn add_listener(&mut self, kind: ViewportEventKind) -> ListenerId {
        let listener = ListenerId(self.handle());
        self.listeners.push((listener, kind));
        listener
    }

    fn remove_listener(&mut self, listener: ListenerId) {
        self.listeners.retain(|(id, _)| *id != listener);
    }

    fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn drain_events(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.events)
    }
}
