//! Walkers plugin drawing the pins and reporting the frame's viewport
//!
//! The walkers projector only exists while the map is being laid out, so the
//! plugin records what the surface needs afterwards (view snapshot, clicked pin)
//! into a shared [`FrameReport`].

use egui::{Color32, Pos2, Stroke};
use poi_overlay::{GeoCoord, MarkerIcon, MarkerId, PixelPosition, lat_lon, utils};
use std::sync::Arc;
use tokio::sync::RwLock;
use walkers::{Plugin, Projector};

/// Pin radius in points at icon scale 1.0
const PIN_RADIUS: f32 = 7.0;

/// How far from a pin center a click still selects it
const HIT_RADIUS: f32 = 12.0;

/// Everything needed to draw one pin
#[derive(Debug, Clone, PartialEq)]
pub struct PinSprite {
    pub marker: MarkerId,
    pub position: GeoCoord,
    pub icon: MarkerIcon,
    pub title: String,
}

/// The map viewport as laid out in the last frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSnapshot {
    /// Map container size in points
    pub size: egui::Vec2,
    pub center: GeoCoord,
    pub zoom: f64,
}

impl ViewSnapshot {
    /// Position of `coord` relative to the container's top-left corner
    pub fn project(&self, coord: GeoCoord) -> PixelPosition {
        let (x, y) = utils::world_pixel(coord, self.zoom);
        let (cx, cy) = utils::world_pixel(self.center, self.zoom);
        PixelPosition::new(
            (x - cx) as f32 + self.size.x / 2.0,
            (y - cy) as f32 + self.size.y / 2.0,
        )
    }
}

/// Written by the plugin, taken by the surface once the frame is done
#[derive(Debug, Default)]
pub struct FrameReport {
    pub view: Option<ViewSnapshot>,
    pub clicked: Option<MarkerId>,
}

/// Closest pin within [`HIT_RADIUS`] of the pointer
pub fn hit_test(pins: &[(MarkerId, Pos2)], pointer: Pos2) -> Option<MarkerId> {
    pins.iter()
        .map(|(marker, pos)| (*marker, pos.distance(pointer)))
        .filter(|(_, distance)| *distance <= HIT_RADIUS)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(marker, _)| marker)
}

pub fn icon_color(icon: &MarkerIcon) -> Color32 {
    Color32::from_rgb(icon.fill.0, icon.fill.1, icon.fill.2)
}

pub struct PinPlugin {
    pins: Vec<PinSprite>,
    report: Arc<RwLock<FrameReport>>,
}

impl PinPlugin {
    pub fn new(pins: Vec<PinSprite>, report: Arc<RwLock<FrameReport>>) -> Self {
        Self { pins, report }
    }
}

impl Plugin for PinPlugin {
    fn run(
        self: Box<Self>,
        ui: &mut egui::Ui,
        response: &egui::Response,
        projector: &Projector,
        map_memory: &walkers::MapMemory,
    ) {
        profiling::scope!("PinPlugin::run");

        let painter = ui.painter();
        let rect = response.rect;

        let screen: Vec<(MarkerId, Pos2)> = self
            .pins
            .iter()
            .map(|pin| {
                let v = projector.project(walkers::lat_lon(pin.position.y(), pin.position.x()));
                (pin.marker, Pos2::new(v.x, v.y))
            })
            .collect();

        for (pin, (_, pos)) in self.pins.iter().zip(&screen) {
            if !rect.expand(PIN_RADIUS * 2.0).contains(*pos) {
                continue;
            }
            let radius = PIN_RADIUS * pin.icon.scale;
            painter.circle(
                *pos,
                radius,
                icon_color(&pin.icon),
                Stroke::new(1.5, Color32::WHITE),
            );
        }

        // Hover title
        if let Some(hover) = response.hover_pos()
            && let Some(marker) = hit_test(&screen, hover)
            && let Some(((_, pos), pin)) = screen.iter().zip(&self.pins).find(|((m, _), _)| *m == marker)
        {
            painter.text(
                *pos + egui::vec2(0.0, -PIN_RADIUS * pin.icon.scale - 4.0),
                egui::Align2::CENTER_BOTTOM,
                &pin.title,
                egui::FontId::proportional(13.0),
                ui.visuals().strong_text_color(),
            );
        }

        let clicked = if response.clicked() {
            response
                .interact_pointer_pos()
                .and_then(|pointer| hit_test(&screen, pointer))
        } else {
            None
        };

        let center = projector.unproject(rect.center().to_vec2());
        let view = ViewSnapshot {
            size: rect.size(),
            center: lat_lon(center.y(), center.x()),
            zoom: map_memory.zoom(),
        };

        // Use try_write for non-blocking UI updates.
        if let Ok(mut report) = self.report.try_write() {
            report.view = Some(view);
            if clicked.is_some() {
                report.clicked = clicked;
            }
        }
    }
}
