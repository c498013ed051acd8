//! Overlay engine facade
//!
//! [`OverlayEngine`] is the component boundary: it takes the entity list, an
//! optional focus coordinate and a tier styling function, and exposes the
//! selection and popover position. Nothing it does can fail across that
//! boundary; problems end up in [`EngineStatus`] for inline display.

use crate::config::EngineConfig;
use crate::entity::{Entity, EntityId};
use crate::lifecycle::{LifecycleState, MapLifecycle};
use crate::loader::{self, LoadStatus, ReadySignal, RuntimeLoader};
use crate::markers::MarkerSynchronizer;
use crate::projection::NoSurface;
use crate::provider::{MapEvent, MapProvider, MapSurface};
use crate::selection::{Refresh, SelectionTracker};
use crate::style::{MarkerIcon, default_tier_icon};
use crate::types::{GeoCoord, PixelPosition};
use crate::{ConfigError, EngineError};

type StyleFn = Box<dyn Fn(Option<i64>) -> MarkerIcon>;

/// What the host should show about the map itself
#[derive(Debug, Clone, PartialEq)]
pub enum EngineStatus {
    /// Not mounted
    Idle,
    /// Waiting for the provider runtime
    Loading,
    /// Runtime loaded, waiting for a mountable render target
    WaitingForTarget(String),
    Ready,
    /// Unrecoverable until the next mount
    Failed(EngineError),
}

impl EngineStatus {
    /// Inline status text, if there is anything worth telling the user
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Idle | Self::Ready => None,
            Self::Loading => Some("Loading map…".to_string()),
            Self::WaitingForTarget(reason) => Some(format!("Map cannot be shown: {reason}")),
            Self::Failed(err) => Some(err.to_string()),
        }
    }
}

pub struct OverlayEngine<P: MapProvider> {
    config: EngineConfig,
    provider: P,
    styler: StyleFn,
    lifecycle: MapLifecycle<P::Surface>,
    markers: MarkerSynchronizer,
    selection: SelectionTracker,
    entities: Vec<Entity>,
    focus: Option<GeoCoord>,
    signal: Option<ReadySignal<P::Runtime>>,
    failure: Option<EngineError>,
    target_problem: Option<String>,
    markers_dirty: bool,
}

impl<P: MapProvider> OverlayEngine<P> {
    pub fn new(provider: P, config: EngineConfig) -> Self {
        Self {
            config,
            provider,
            styler: Box::new(default_tier_icon),
            lifecycle: MapLifecycle::new(),
            markers: MarkerSynchronizer::new(),
            selection: SelectionTracker::new(),
            entities: Vec::new(),
            focus: None,
            signal: None,
            failure: None,
            target_problem: None,
            markers_dirty: true,
        }
    }

    /// Replace the tier styling function. Takes effect on the next marker sync.
    pub fn with_styler(mut self, styler: impl Fn(Option<i64>) -> MarkerIcon + 'static) -> Self {
        self.styler = Box::new(styler);
        self.markers_dirty = true;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn surface(&self) -> Option<&P::Surface> {
        self.lifecycle.surface()
    }

    pub fn surface_mut(&mut self) -> Option<&mut P::Surface> {
        self.lifecycle.surface_mut()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn focus(&self) -> Option<GeoCoord> {
        self.focus
    }

    /// Request the provider runtime and start the lifecycle. Credential problems
    /// are recorded once and not retried.
    pub fn mount<L>(&mut self, loader: &L, key: &str)
    where
        L: RuntimeLoader<Runtime = P::Runtime>,
    {
        self.lifecycle.reset();
        if self.signal.is_some() {
            return;
        }
        self.failure = None;
        match loader::ensure_provider_loaded(loader, key) {
            Ok(signal) => self.signal = Some(signal),
            Err(err) => {
                tracing::error!("Cannot mount map: {}", err);
                self.failure = Some(err);
            }
        }
    }

    /// Tear down the surface and drop the loader hook. A load that completes
    /// afterwards never reaches this engine.
    pub fn unmount(&mut self) {
        self.lifecycle.destroy(&mut self.markers, &mut self.selection);
        self.signal = None;
        self.target_problem = None;
        self.markers_dirty = true;
    }

    pub fn status(&self) -> EngineStatus {
        if let Some(err) = &self.failure {
            return EngineStatus::Failed(err.clone());
        }
        match self.lifecycle.state() {
            LifecycleState::Ready => EngineStatus::Ready,
            LifecycleState::Destroyed => EngineStatus::Idle,
            LifecycleState::Uninitialized | LifecycleState::Initializing => {
                match (&self.signal, &self.target_problem) {
                    (None, _) => EngineStatus::Idle,
                    (Some(_), Some(reason)) => EngineStatus::WaitingForTarget(reason.clone()),
                    (Some(_), None) => EngineStatus::Loading,
                }
            }
        }
    }

    /// Replace the entity list. Pins are rebuilt as soon as a surface exists.
    pub fn set_entities(&mut self, entities: Vec<Entity>) {
        self.entities = entities;
        self.markers_dirty = true;
        self.sync_markers();
    }

    /// Update the user focus coordinate. A live surface is re-framed; it is
    /// never rebuilt for a focus change.
    pub fn set_focus(&mut self, focus: Option<GeoCoord>) {
        if self.focus == focus {
            return;
        }
        self.focus = focus;
        if let Some(surface) = self.lifecycle.surface_mut() {
            self.markers
                .reframe(surface, &self.entities, self.focus, &self.config);
        }
    }

    /// Advance loading and initialization, then handle queued provider events.
    /// Call once per UI turn with the current render target.
    pub fn update(&mut self, target: &P::Target) {
        if self.failure.is_some() || self.lifecycle.state() == LifecycleState::Destroyed {
            return;
        }
        let Some(signal) = &self.signal else {
            return;
        };

        match signal.poll() {
            LoadStatus::Loading => return,
            LoadStatus::Failed(err) => {
                self.failure = Some(err.into());
                self.signal = None;
                return;
            }
            LoadStatus::Ready(runtime) => {
                if self.lifecycle.state() == LifecycleState::Uninitialized {
                    self.initialize(&runtime, target);
                }
            }
        }

        if self.markers_dirty {
            self.sync_markers();
        }
        self.process_events();
    }

    fn initialize(&mut self, runtime: &P::Runtime, target: &P::Target) {
        let result = self.lifecycle.initialize(
            &mut self.provider,
            runtime,
            target,
            self.focus,
            &self.config,
        );
        match result {
            Ok(true) => {
                self.target_problem = None;
                self.markers_dirty = true;
                if let Some(surface) = self.lifecycle.surface_mut() {
                    self.selection.subscribe(surface);
                }
            }
            Ok(false) => {}
            Err(EngineError::Configuration(ConfigError::InvalidRenderTarget(reason))) => {
                if self.target_problem.as_ref() != Some(&reason) {
                    tracing::error!("Invalid render target: {}", reason);
                }
                self.target_problem = Some(reason);
            }
            Err(err) => {
                tracing::error!("Map surface creation failed: {}", err);
                self.failure = Some(err);
            }
        }
    }

    fn sync_markers(&mut self) {
        let Some(surface) = self.lifecycle.surface_mut() else {
            return;
        };
        self.markers.sync(
            surface,
            &self.entities,
            self.styler.as_ref(),
            self.focus,
            &self.config,
        );
        self.markers_dirty = false;

        match self.selection.selected() {
            Some(id) if self.config.preserve_selection && self.markers.contains_entity(id) => {
                self.refresh_popover();
            }
            Some(_) => self.selection.clear(self.lifecycle.surface_mut()),
            None => {}
        }
    }

    /// Drain the surface's notification queue
    pub fn process_events(&mut self) {
        let events = match self.lifecycle.surface_mut() {
            Some(surface) => surface.drain_events(),
            None => return,
        };
        for event in events {
            self.handle_event(event);
        }
    }

    pub fn handle_event(&mut self, event: MapEvent) {
        match event {
            MapEvent::OverlayAttached(overlay) => {
                if self.lifecycle.on_overlay_attached(overlay) {
                    self.refresh_popover();
                }
            }
            MapEvent::Viewport { listener, kind } => {
                if self.selection.accepts(listener) {
                    tracing::trace!("Viewport {} -> reprojecting popover", kind.name());
                    self.refresh_popover();
                }
            }
            MapEvent::MarkerClicked(marker) => match self.markers.entity_for_marker(marker) {
                Some(id) => self.select(id),
                None => tracing::debug!("Ignoring click on stale marker {:?}", marker),
            },
        }
    }

    /// Select an entity and position the popover over its pin
    pub fn select(&mut self, id: EntityId) {
        self.selection.select(self.lifecycle.surface_mut(), id);
        self.refresh_popover();
    }

    /// Close the popover (clears the selection)
    pub fn close_popover(&mut self) {
        self.selection.clear(self.lifecycle.surface_mut());
    }

    pub fn selection(&self) -> Option<EntityId> {
        self.selection.selected()
    }

    pub fn selected_entity(&self) -> Option<&Entity> {
        let id = self.selection.selected()?;
        self.entities.iter().find(|entity| entity.id == id)
    }

    /// Popover anchor in container pixels; `None` means hidden
    pub fn popover_position(&self) -> Option<PixelPosition> {
        self.selection.position()
    }

    fn refresh_popover(&mut self) {
        let refresh = match self.lifecycle.projection() {
            Some(projection) => self.selection.recompute(&self.entities, &projection),
            None => self.selection.recompute(&self.entities, &NoSurface),
        };
        if let Refresh::Stale(_) = refresh {
            self.selection.clear(self.lifecycle.surface_mut());
        }
    }
}

impl<P: MapProvider> Drop for OverlayEngine<P> {
    fn drop(&mut self) {
        self.unmount();
    }
}
