//! POI Overlay - Viewport-synchronized marker and popover engine
//!
//! This library keeps a set of point-of-interest pins and a single detail popover in
//! sync with a live map surface owned by an external mapping provider. The provider
//! draws the map; this crate decides what is drawn on top of it and where.
//!
//! # Architecture
//!
//! - **[`loader`]**: Loads the provider runtime exactly once per UI thread
//! - **[`ProjectionAdapter`]**: Lifecycle-safe geo → container pixel projection
//! - **[`MapLifecycle`]**: Creates and tears down the single map surface
//! - **[`MarkerSynchronizer`]**: Rebuilds the pin set from the entity list
//! - **[`SelectionTracker`]**: Keeps the popover pinned across viewport changes
//! - **[`OverlayEngine`]**: Facade wiring the above behind one component boundary
//!
//! The provider is reached only through the traits in [`provider`], so the engine
//! runs unchanged against a real slippy map or an in-memory fake.
//!
//! # Event model
//!
//! Everything happens on one thread. Provider notifications (overlay attached,
//! viewport changed, pin clicked) are queued by the surface as [`MapEvent`]s and
//! drained by the engine; nothing is recomputed unless such an event arrives.

mod config;
mod engine;
mod entity;
mod lifecycle;
pub mod loader;
mod markers;
mod projection;
pub mod provider;
mod selection;
mod style;
mod types;
pub mod utils;

#[cfg(test)]
mod testing;

// Public API exports
pub use config::EngineConfig;
pub use engine::{EngineStatus, OverlayEngine};
pub use entity::{Entity, EntityId};
pub use lifecycle::{LifecycleState, MapLifecycle};
pub use loader::{LoadCompletion, LoadStatus, PendingLoad, ReadySignal, RuntimeLoader};
pub use markers::{Framing, MarkerSynchronizer, SyncOutcome};
pub use projection::{BoundProjection, NoSurface, ProjectionAdapter, ProjectionCapable, Unavailable};
pub use provider::{
    InteractionControls, ListenerId, MapEvent, MapProvider, MapSurface, MarkerId, MarkerOptions,
    OverlayId, RenderTarget, SurfaceOptions, ViewportEventKind,
};
pub use selection::{Refresh, SelectionTracker};
pub use style::{MarkerIcon, Rgb, default_tier_icon};
pub use types::{GeoBounds, GeoCoord, PixelPosition, lat_lon};

/// Configuration problems. Reported once, never retried automatically.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Map provider credential is missing or empty")]
    MissingCredential,

    #[error("Invalid render target: {0}")]
    InvalidRenderTarget(String),

    #[error("Resource '{0}' is already registered with a different runtime type")]
    ConflictingResource(&'static str),
}

/// Failures while bringing the provider runtime in.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider rejected the request: {0}")]
    Rejected(String),

    #[error("Loader was dropped before completing")]
    Cancelled,
}

/// Error types for the engine
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Map failed to load: {0}")]
    Load(#[from] LoadError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
