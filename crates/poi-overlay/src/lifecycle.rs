//! Map lifecycle manager
//!
//! Owns the single map surface of an engine and the projection adapter bound to
//! it. States move `Uninitialized -> Initializing -> Ready -> Destroyed`; a
//! destroyed manager can be [`reset`](MapLifecycle::reset) for a fresh mount.

use crate::config::EngineConfig;
use crate::markers::MarkerSynchronizer;
use crate::projection::{BoundProjection, ProjectionAdapter};
use crate::provider::{MapProvider, MapSurface, OverlayId, RenderTarget, SurfaceOptions};
use crate::selection::SelectionTracker;
use crate::types::GeoCoord;
use crate::{ConfigError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initializing,
    Ready,
    Destroyed,
}

pub struct MapLifecycle<S: MapSurface> {
    state: LifecycleState,
    surface: Option<S>,
    adapter: Option<ProjectionAdapter>,
}

impl<S: MapSurface> Default for MapLifecycle<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: MapSurface> MapLifecycle<S> {
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Uninitialized,
            surface: None,
            adapter: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    pub fn adapter(&self) -> Option<&ProjectionAdapter> {
        self.adapter.as_ref()
    }

    /// The live projection, if a surface exists
    pub fn projection(&self) -> Option<BoundProjection<'_, S>> {
        match (&self.adapter, &self.surface) {
            (Some(adapter), Some(surface)) => Some(adapter.bind(surface)),
            _ => None,
        }
    }

    /// Create the surface. Only acts from `Uninitialized`; any other state is a
    /// no-op returning `Ok(false)`.
    ///
    /// An unmountable target aborts with [`ConfigError::InvalidRenderTarget`] and
    /// leaves the manager `Uninitialized` so a later call can retry.
    pub fn initialize<P>(
        &mut self,
        provider: &mut P,
        runtime: &P::Runtime,
        target: &P::Target,
        focus: Option<GeoCoord>,
        config: &EngineConfig,
    ) -> Result<bool>
    where
        P: MapProvider<Surface = S>,
    {
        if self.state != LifecycleState::Uninitialized || self.surface.is_some() {
            return Ok(false);
        }
        if let Err(reason) = target.check_mountable() {
            return Err(ConfigError::InvalidRenderTarget(reason).into());
        }

        self.state = LifecycleState::Initializing;
        let (center, zoom) = config.initial_view(focus);
        let options = SurfaceOptions {
            center,
            zoom,
            controls: config.controls,
        };

        let mut surface = match provider.create_surface(runtime, target, &options) {
            Ok(surface) => surface,
            Err(err) => {
                self.state = LifecycleState::Uninitialized;
                return Err(err);
            }
        };
        self.adapter = Some(ProjectionAdapter::attach(&mut surface));
        self.surface = Some(surface);
        self.state = LifecycleState::Ready;
        tracing::info!(
            "Map surface ready at ({:.4}, {:.4}) zoom {:.1}",
            center.y(),
            center.x(),
            zoom
        );
        Ok(true)
    }

    /// Forward the provider's attached notification to the adapter
    pub fn on_overlay_attached(&mut self, overlay: OverlayId) -> bool {
        self.adapter
            .as_mut()
            .is_some_and(|adapter| adapter.on_attached(overlay))
    }

    /// Tear everything down: detach the adapter, remove every pin, drop the
    /// selection's viewport listeners, then release the surface. Idempotent.
    pub fn destroy(&mut self, markers: &mut MarkerSynchronizer, selection: &mut SelectionTracker) {
        if let Some(mut surface) = self.surface.take() {
            if let Some(adapter) = self.adapter.as_mut() {
                adapter.detach(&mut surface);
            }
            markers.clear(&mut surface);
            selection.clear(Some(&mut surface));
            tracing::info!("Map surface destroyed");
        } else {
            selection.clear(None::<&mut S>);
        }
        self.adapter = None;
        self.state = LifecycleState::Destroyed;
    }

    /// Allow a destroyed manager to initialize again
    pub fn reset(&mut self) {
        if self.state == LifecycleState::Destroyed {
            self.state = LifecycleState::Uninitialized;
        }
    }
}
