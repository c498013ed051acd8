//! Tile providers and the runtime loader behind them
//!
//! For the walkers map the "provider runtime" is a usable tile source. Keyless
//! providers are available immediately; keyed ones are brought in by fetching a
//! single probe tile, so a wrong key shows up as a load failure instead of a
//! map full of broken tiles.

use poi_overlay::{LoadError, PendingLoad, RuntimeLoader};
use walkers::TileId;
use walkers::sources::{Attribution, TileSource};

/// Available map tile providers
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum TilesProvider {
    OpenStreetMap,
    ThunderforestCycle,
    ThunderforestTransport,
}

impl TilesProvider {
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenStreetMap => "OpenStreetMap",
            Self::ThunderforestCycle => "Thunderforest OpenCycleMap",
            Self::ThunderforestTransport => "Thunderforest Transport",
        }
    }

    /// Loader resource identifier, one per provider
    pub fn resource_id(&self) -> &'static str {
        match self {
            Self::OpenStreetMap => "tiles-openstreetmap",
            Self::ThunderforestCycle => "tiles-thunderforest-cycle",
            Self::ThunderforestTransport => "tiles-thunderforest-transport",
        }
    }

    pub fn requires_key(&self) -> bool {
        !matches!(self, Self::OpenStreetMap)
    }

    pub fn url(&self, zoom: u8, x: u32, y: u32, key: &str) -> String {
        match self {
            Self::OpenStreetMap => format!("https://tile.openstreetmap.org/{zoom}/{x}/{y}.png"),
            Self::ThunderforestCycle => {
                format!("https://tile.thunderforest.com/cycle/{zoom}/{x}/{y}.png?apikey={key}")
            }
            Self::ThunderforestTransport => {
                format!("https://tile.thunderforest.com/transport/{zoom}/{x}/{y}.png?apikey={key}")
            }
        }
    }

    pub fn attribution_text(&self) -> &'static str {
        match self {
            Self::OpenStreetMap => "© OpenStreetMap contributors",
            Self::ThunderforestCycle | Self::ThunderforestTransport => {
                "Maps © Thunderforest, Data © OpenStreetMap contributors"
            }
        }
    }

    fn attribution_url(&self) -> &'static str {
        match self {
            Self::OpenStreetMap => "https://www.openstreetmap.org/copyright",
            Self::ThunderforestCycle | Self::ThunderforestTransport => {
                "https://www.thunderforest.com/"
            }
        }
    }

    pub fn max_zoom(&self) -> u8 {
        match self {
            Self::OpenStreetMap => 19,
            Self::ThunderforestCycle | Self::ThunderforestTransport => 22,
        }
    }
}

/// Loaded tile runtime: a provider plus the key it was verified with
#[derive(Clone, Debug, PartialEq)]
pub struct TileRuntime {
    pub provider: TilesProvider,
    key: String,
}

impl TileRuntime {
    pub fn source(&self) -> KeyedTiles {
        KeyedTiles {
            provider: self.provider,
            key: self.key.clone(),
        }
    }
}

/// walkers tile source for any [`TilesProvider`]
pub struct KeyedTiles {
    provider: TilesProvider,
    key: String,
}

impl TileSource for KeyedTiles {
    fn tile_url(&self, tile_id: TileId) -> String {
        self.provider
            .url(tile_id.zoom, tile_id.x, tile_id.y, &self.key)
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: self.provider.attribution_text(),
            url: self.provider.attribution_url(),
            logo_light: None,
            logo_dark: None,
        }
    }

    fn max_zoom(&self) -> u8 {
        self.provider.max_zoom()
    }
}

pub struct TileRuntimeLoader {
    provider: TilesProvider,
    /// Repainted when a load finishes so the engine gets polled
    ctx: Option<egui::Context>,
}

impl TileRuntimeLoader {
    pub fn new(provider: TilesProvider, ctx: Option<egui::Context>) -> Self {
        Self { provider, ctx }
    }
}

impl RuntimeLoader for TileRuntimeLoader {
    type Runtime = TileRuntime;

    fn resource_id(&self) -> &'static str {
        self.provider.resource_id()
    }

    fn requires_credential(&self) -> bool {
        self.provider.requires_key()
    }

    fn existing(&self) -> Option<TileRuntime> {
        (!self.provider.requires_key()).then(|| TileRuntime {
            provider: self.provider,
            key: String::new(),
        })
    }

    fn inject(&self, key: &str) -> PendingLoad<TileRuntime> {
        let (completion, pending) = PendingLoad::channel();
        let runtime = TileRuntime {
            provider: self.provider,
            key: key.to_string(),
        };
        let url = self.provider.url(0, 0, 0, key);
        let ctx = self.ctx.clone();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let result = probe(&url).await.map(|()| runtime);
                    completion.complete(result);
                    if let Some(ctx) = ctx {
                        ctx.request_repaint();
                    }
                });
            }
            Err(e) => completion.complete(Err(LoadError::Network(format!(
                "No async runtime to fetch tiles on: {e}"
            )))),
        }
        pending
    }
}

/// Fetch one tile and map the outcome to a load result
async fn probe(url: &str) -> Result<(), LoadError> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .user_agent(concat!("poi-map-viewer/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| LoadError::Network(format!("Failed to create HTTP client: {}", e)))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| LoadError::Network(format!("Request failed: {}", e)))?;

    check_status(response.status().as_u16())
}

/// Credential problems are rejections; everything else unsuccessful is a network failure
fn check_status(status: u16) -> Result<(), LoadError> {
    match status {
        200..=299 => Ok(()),
        401 | 403 => Err(LoadError::Rejected(format!(
            "HTTP {status}, check the API key"
        ))),
        _ => Err(LoadError::Network(format!("HTTP {status} from tile server"))),
    }
}
