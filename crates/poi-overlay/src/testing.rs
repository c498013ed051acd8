//! In-memory provider used by the unit tests
//!
//! The fake surface is an 800x600 container with a linear projection:
//! one degree is `2^zoom` pixels and the view center sits at (400, 300).

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::LoadError;
use crate::loader::{LoadCompletion, PendingLoad, RuntimeLoader};
use crate::provider::{
    ListenerId, MapEvent, MapProvider, MapSurface, MarkerId, MarkerOptions, OverlayId,
    RenderTarget, SurfaceOptions, ViewportEventKind,
};
use crate::style::MarkerIcon;
use crate::types::{GeoBounds, GeoCoord, PixelPosition};

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 600.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FakeRuntime;

pub struct FakeLoader {
    preloaded: bool,
    credential: bool,
    injections: Cell<usize>,
    completions: RefCell<Vec<LoadCompletion<FakeRuntime>>>,
}

impl FakeLoader {
    pub fn new() -> Self {
        Self {
            preloaded: false,
            credential: true,
            injections: Cell::new(0),
            completions: RefCell::new(Vec::new()),
        }
    }

    /// Loader whose runtime is already present on the page
    pub fn preloaded() -> Self {
        Self {
            preloaded: true,
            ..Self::new()
        }
    }

    pub fn without_credential(mut self) -> Self {
        self.credential = false;
        self
    }

    pub fn injections(&self) -> usize {
        self.injections.get()
    }

    pub fn complete_all(&self, result: Result<FakeRuntime, LoadError>) {
        for completion in self.completions.borrow_mut().drain(..) {
            completion.complete(result.clone());
        }
    }

    /// Drop every in-flight completion without reporting
    pub fn abandon_all(&self) {
        self.completions.borrow_mut().clear();
    }
}

impl RuntimeLoader for FakeLoader {
    type Runtime = FakeRuntime;

    fn resource_id(&self) -> &'static str {
        "fake-provider-runtime"
    }

    fn requires_credential(&self) -> bool {
        self.credential
    }

    fn existing(&self) -> Option<FakeRuntime> {
        self.preloaded.then_some(FakeRuntime)
    }

    fn inject(&self, _key: &str) -> PendingLoad<FakeRuntime> {
        self.injections.set(self.injections.get() + 1);
        let (completion, pending) = PendingLoad::channel();
        self.completions.borrow_mut().push(completion);
        pending
    }
}

pub struct FakeTarget {
    mountable: bool,
}

impl FakeTarget {
    pub fn mountable() -> Self {
        Self { mountable: true }
    }

    pub fn unmountable() -> Self {
        Self { mountable: false }
    }
}

impl RenderTarget for FakeTarget {
    fn check_mountable(&self) -> Result<(), String> {
        if self.mountable {
            Ok(())
        } else {
            Err("container has zero size".to_string())
        }
    }
}

/// Resource counters shared by the provider and every surface it created
#[derive(Debug, Default)]
pub struct SurfaceLog {
    pub live_markers: usize,
    pub live_listeners: usize,
    pub detached_overlays: usize,
}

#[derive(Default)]
pub struct FakeProvider {
    created: usize,
    log: Rc<RefCell<SurfaceLog>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn surfaces_created(&self) -> usize {
        self.created
    }

    pub fn surface_log(&self) -> Rc<RefCell<SurfaceLog>> {
        Rc::clone(&self.log)
    }
}

impl MapProvider for FakeProvider {
    type Runtime = FakeRuntime;
    type Target = FakeTarget;
    type Surface = FakeSurface;

    fn create_surface(
        &mut self,
        _runtime: &FakeRuntime,
        _target: &FakeTarget,
        options: &SurfaceOptions,
    ) -> crate::Result<FakeSurface> {
        self.created += 1;
        let mut surface = FakeSurface::new(options.center, options.zoom);
        surface.log = Rc::clone(&self.log);
        Ok(surface)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceOp {
    Add(MarkerId),
    Remove(MarkerId),
}

struct FakeOverlay {
    id: OverlayId,
    announced: bool,
    detached: bool,
}

pub struct FakeSurface {
    center: GeoCoord,
    zoom: f64,
    next_handle: u64,
    markers: Vec<(MarkerId, MarkerOptions)>,
    overlays: Vec<FakeOverlay>,
    listeners: Vec<(ListenerId, ViewportEventKind)>,
    events: Vec<MapEvent>,
    ops: Vec<SurfaceOp>,
    fitted: Option<GeoBounds>,
    log: Rc<RefCell<SurfaceLog>>,
}

impl FakeSurface {
    pub fn new(center: GeoCoord, zoom: f64) -> Self {
        Self {
            center,
            zoom,
            next_handle: 1,
            markers: Vec::new(),
            overlays: Vec::new(),
            listeners: Vec::new(),
            events: Vec::new(),
            ops: Vec::new(),
            fitted: None,
            log: Rc::default(),
        }
    }

    fn handle(&mut self) -> u64 {
        let id = self.next_handle;
        self.next_handle += 1;
        id
    }

    fn notify(&mut self, kinds: &[ViewportEventKind]) {
        for kind in kinds {
            for (listener, registered) in &self.listeners {
                if registered == kind {
                    self.events.push(MapEvent::Viewport {
                        listener: *listener,
                        kind: *kind,
                    });
                }
            }
        }
    }

    /// The provider finished attaching every pending overlay
    pub fn complete_attachment(&mut self) {
        for overlay in &mut self.overlays {
            if !overlay.announced && !overlay.detached {
                overlay.announced = true;
                self.events.push(MapEvent::OverlayAttached(overlay.id));
            }
        }
    }

    /// User drag
    pub fn pan_to(&mut self, center: GeoCoord) {
        self.center = center;
        self.notify(&[ViewportEventKind::CenterChanged, ViewportEventKind::Idle]);
    }

    /// User scroll zoom
    pub fn zoom_to(&mut self, zoom: f64) {
        self.zoom = zoom;
        self.notify(&[ViewportEventKind::ZoomChanged, ViewportEventKind::Idle]);
    }

    /// User click on the pin carrying `title`
    pub fn click_title(&mut self, title: &str) {
        if let Some(marker) = self.marker_for_title(title) {
            self.events.push(MapEvent::MarkerClicked(marker));
        }
    }

    pub fn fitted_bounds(&self) -> Option<GeoBounds> {
        self.fitted
    }

    pub fn marker_for_title(&self, title: &str) -> Option<MarkerId> {
        self.markers
            .iter()
            .find(|(_, options)| options.title == title)
            .map(|(id, _)| *id)
    }

    pub fn icon_for_title(&self, title: &str) -> Option<MarkerIcon> {
        self.markers
            .iter()
            .find(|(_, options)| options.title == title)
            .map(|(_, options)| options.icon)
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }
}

impl MapSurface for FakeSurface {
    fn add_marker(&mut self, options: MarkerOptions) -> MarkerId {
        let id = MarkerId(self.handle());
        self.markers.push((id, options));
        self.ops.push(SurfaceOp::Add(id));
        self.log.borrow_mut().live_markers += 1;
        id
    }

    fn remove_marker(&mut self, marker: MarkerId) {
        let before = self.markers.len();
        self.markers.retain(|(id, _)| *id != marker);
        if self.markers.len() < before {
            self.ops.push(SurfaceOp::Remove(marker));
            self.log.borrow_mut().live_markers -= 1;
        }
    }

    fn marker_count(&self) -> usize {
        self.markers.len()
    }

    fn fit_bounds(&mut self, bounds: &GeoBounds) {
        let (Some(center), Some((lat_span, lon_span))) = (bounds.center(), bounds.span()) else {
            return;
        };
        let max_span = lat_span.max(lon_span);
        self.fitted = Some(*bounds);
        self.center = center;
        self.zoom = if max_span > 0.0 {
            ((4.0 * 360.0 / max_span).log2() - 0.5).clamp(1.0, 18.0)
        } else {
            12.0
        };
        self.notify(&ViewportEventKind::ALL);
    }

    fn set_view(&mut self, center: GeoCoord, zoom: f64) {
        self.center = center;
        self.zoom = zoom;
        self.notify(&ViewportEventKind::ALL);
    }

    fn center(&self) -> GeoCoord {
        self.center
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn attach_overlay(&mut self) -> OverlayId {
        let id = OverlayId(self.handle());
        self.overlays.push(FakeOverlay {
            id,
            announced: false,
            detached: false,
        });
        id
    }

    fn detach_overlay(&mut self, overlay: OverlayId) {
        if let Some(found) = self
            .overlays
            .iter_mut()
            .find(|o| o.id == overlay && !o.detached)
        {
            found.detached = true;
            self.log.borrow_mut().detached_overlays += 1;
        }
    }

    fn overlay_projection(&self, overlay: OverlayId, coord: GeoCoord) -> Option<PixelPosition> {
        self.overlays
            .iter()
            .find(|o| o.id == overlay && !o.detached)?;
        let scale = 2f64.powf(self.zoom);
        let x = (coord.x() - self.center.x()) * scale + WIDTH / 2.0;
        let y = (self.center.y() - coord.y()) * scale + HEIGHT / 2.0;
        Some(PixelPosition::new(x as f32, y as f32))
    }

    fn add_listener(&mut self, kind: ViewportEventKind) -> ListenerId {
        let id = ListenerId(self.handle());
        self.listeners.push((id, kind));
        self.log.borrow_mut().live_listeners += 1;
        id
    }

    fn remove_listener(&mut self, listener: ListenerId) {
        let before = self.listeners.len();
        self.listeners.retain(|(id, _)| *id != listener);
        if self.listeners.len() < before {
            self.log.borrow_mut().live_listeners -= 1;
        }
    }

    fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn drain_events(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.events)
    }
}
