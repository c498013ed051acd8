//! Application module
//!
//! Full-screen walkers map with pins for every entity, a popover pinned to the
//! selected one, and a toggleable sidebar with the entity list and details.

mod data;
mod plugin;
pub(crate) mod settings;
mod surface;
mod tiles;
mod ui_panels;

use crate::app::data::{DataError, FileWatch};
use crate::app::settings::Settings;
use crate::app::surface::{MapArea, WalkersProvider};
use crate::app::tiles::{TileRuntimeLoader, TilesProvider};
use crate::app::ui_panels::{SidebarModel, UiAction};
use eframe::egui;
use poi_overlay::{EngineStatus, OverlayEngine};
use std::path::PathBuf;
use std::time::Duration;

/// Main application structure
pub struct PoiMapViewerApp {
    engine: OverlayEngine<WalkersProvider>,
    loader: TileRuntimeLoader,
    tiles: TilesProvider,
    api_key: String,

    /// Entity source file, if any
    entities_path: Option<PathBuf>,
    watch: Option<FileWatch>,
    /// Last failed reload; the previous entity list stays on the map
    data_error: Option<DataError>,

    sidebar_open: bool,
}

impl PoiMapViewerApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings = Settings::from_cli();

        let provider = WalkersProvider::new(cc.egui_ctx.clone());
        let mut engine = OverlayEngine::new(provider, settings.engine_config());
        engine.set_focus(settings.focus());

        let loader = TileRuntimeLoader::new(settings.tiles, Some(cc.egui_ctx.clone()));
        let api_key = settings.api_key();
        engine.mount(&loader, &api_key);

        let watch = match (&settings.entities, settings.watch) {
            (Some(path), true) => {
                let ctx = cc.egui_ctx.clone();
                FileWatch::new(path, move || ctx.request_repaint())
                    .map_err(|err| tracing::error!("{}", err))
                    .ok()
            }
            _ => None,
        };

        let mut app = Self {
            engine,
            loader,
            tiles: settings.tiles,
            api_key,
            entities_path: settings.entities.clone(),
            watch,
            data_error: None,
            sidebar_open: true,
        };
        app.reload_entities();

        tracing::info!(
            "Initialized with {} entities, tiles: {}",
            app.engine.entities().len(),
            app.tiles.name()
        );
        app
    }

    /// Re-read the entity file and hand the whole list to the engine
    fn reload_entities(&mut self) {
        let Some(path) = &self.entities_path else {
            return;
        };
        match data::load_entities(path) {
            Ok(entities) => {
                self.data_error = None;
                self.engine.set_entities(entities);
            }
            Err(err) => {
                tracing::error!("{}", err);
                self.data_error = Some(err);
            }
        }
    }

    fn remount(&mut self) {
        tracing::info!("Remounting map");
        self.engine.unmount();
        self.engine.mount(&self.loader, &self.api_key);
    }

    fn apply(&mut self, action: UiAction) {
        match action {
            UiAction::Select(id) => self.engine.select(id),
            UiAction::ClosePopover => self.engine.close_popover(),
            UiAction::Reload => self.reload_entities(),
            UiAction::RetryMap => self.remount(),
        }
    }
}

#[profiling::all_functions]
impl eframe::App for PoiMapViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.watch.as_ref().is_some_and(FileWatch::poll) {
            self.reload_entities();
        }

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.engine.close_popover();
        }
        if ctx.input(|i| i.key_pressed(egui::Key::F5)) {
            self.reload_entities();
        }

        let mut actions = Vec::new();

        if self.sidebar_open {
            let model = SidebarModel {
                entities: self.engine.entities(),
                selected: self.engine.selected_entity(),
                status: self.engine.status(),
                data_error: self.data_error.as_ref(),
                source: self.entities_path.as_deref(),
                tiles_name: self.tiles.name(),
            };
            actions.extend(ui_panels::render_sidebar(ctx, &model));
        }

        // Central panel: Map view (full screen)
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                profiling::scope!("map_panel");

                let area = MapArea {
                    size: ui.available_size(),
                };
                self.engine.update(&area);

                if let Some(surface) = self.engine.surface_mut() {
                    let map_rect = surface.show(ui);
                    self.engine.process_events();

                    let close = match (self.engine.popover_position(), self.engine.selected_entity())
                    {
                        (Some(position), Some(entity)) => {
                            ui_panels::popover(ui, map_rect, position, entity)
                        }
                        _ => false,
                    };
                    if close {
                        actions.push(UiAction::ClosePopover);
                    }
                }

                if let Some(message) = self.engine.status().message() {
                    ui_panels::status_banner(ui, &message);
                }

                ui_panels::sidebar_toggle_button(ui, &mut self.sidebar_open);
            });

        for action in actions {
            self.apply(action);
        }

        if self.engine.status() == EngineStatus::Loading {
            ctx.request_repaint_after(Duration::from_millis(200));
        }
    }
}
