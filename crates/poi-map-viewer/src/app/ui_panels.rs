//! UI panels for the application
//!
//! Sidebar with the entity list and the selected entity's details, the popover
//! pinned over the selected pin, and the inline status banner.

use crate::app::data::DataError;
use crate::app::plugin::icon_color;
use egui::{Color32, RichText, Ui};
use poi_overlay::{EngineStatus, Entity, EntityId, PixelPosition, default_tier_icon};
use std::path::Path;

/// Gap between the pin center and the popover's bottom edge
const POPOVER_OFFSET: f32 = 14.0;

/// Something the user asked for in the sidebar or popover
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiAction {
    Select(EntityId),
    ClosePopover,
    Reload,
    RetryMap,
}

/// Read-only view of the app state the sidebar renders
pub struct SidebarModel<'a> {
    pub entities: &'a [Entity],
    pub selected: Option<&'a Entity>,
    pub status: EngineStatus,
    pub data_error: Option<&'a DataError>,
    pub source: Option<&'a Path>,
    pub tiles_name: &'static str,
}

/// Render the sidebar toggle button (overlaid on top-right of map)
pub fn sidebar_toggle_button(ui: &mut Ui, open: &mut bool) {
    let button_size = egui::vec2(40.0, 40.0);
    let margin = 10.0;

    let rect = ui.max_rect();
    let button_pos = rect.right_top() + egui::vec2(-button_size.x - margin, margin);
    let button_rect = egui::Rect::from_min_size(button_pos, button_size);

    let response = ui.allocate_rect(button_rect, egui::Sense::click());
    if response.clicked() {
        *open = !*open;
    }

    let bg_color = if response.hovered() {
        ui.visuals().widgets.hovered.bg_fill
    } else {
        ui.visuals().widgets.inactive.bg_fill
    };
    ui.painter().rect_filled(button_rect, 5.0, bg_color);

    let icon = if *open { "✕" } else { "☰" };
    ui.painter().text(
        button_rect.center(),
        egui::Align2::CENTER_CENTER,
        icon,
        egui::FontId::proportional(20.0),
        ui.visuals().text_color(),
    );
}

/// Render the sidebar (side on landscape, bottom on portrait)
pub fn render_sidebar(ctx: &egui::Context, model: &SidebarModel<'_>) -> Option<UiAction> {
    let screen_size = ctx.viewport_rect().size();
    let mut action = None;

    if screen_size.y > screen_size.x {
        egui::TopBottomPanel::bottom("main_sidebar")
            .default_height(280.0)
            .min_height(180.0)
            .max_height(ctx.viewport_rect().height() * 0.6)
            .resizable(true)
            .show(ctx, |ui| action = render_sidebar_content(ui, model));
    } else {
        egui::SidePanel::right("main_sidebar")
            .default_width(300.0)
            .min_width(260.0)
            .max_width(450.0)
            .resizable(true)
            .show(ctx, |ui| action = render_sidebar_content(ui, model));
    }
    action
}

fn render_sidebar_content(ui: &mut Ui, model: &SidebarModel<'_>) -> Option<UiAction> {
    let mut action = None;

    ui.horizontal(|ui| {
        if ui
            .add_enabled(model.source.is_some(), egui::Button::new("🔄 Reload"))
            .clicked()
        {
            action = Some(UiAction::Reload);
        }
        if matches!(model.status, EngineStatus::Failed(_)) && ui.button("🗺 Retry map").clicked() {
            action = Some(UiAction::RetryMap);
        }
    });

    if let Some(message) = model.status.message() {
        let color = match model.status {
            EngineStatus::Failed(_) => Color32::RED,
            _ => ui.visuals().warn_fg_color,
        };
        ui.label(RichText::new(message).color(color));
    }
    if let Some(err) = model.data_error {
        ui.label(RichText::new(format!("⚠ {}", err)).color(Color32::RED));
    }

    ui.separator();

    // Details of the selection
    ui.label(RichText::new("📍 Selected").strong());
    ui.add_space(4.0);
    match model.selected {
        Some(entity) => {
            entity_details(ui, entity, "sidebar_details_grid");
            if ui.button("Close").clicked() {
                action = Some(UiAction::ClosePopover);
            }
        }
        None => {
            ui.label(RichText::new("Click a pin or a list entry").weak());
        }
    }

    ui.add_space(8.0);
    ui.separator();

    ui.label(RichText::new(format!("📂 Entities ({})", model.entities.len())).strong());
    if let Some(source) = model.source {
        ui.label(RichText::new(source.display().to_string()).small().weak());
    }
    ui.add_space(4.0);

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .max_height(ui.available_height() - 30.0)
        .show(ui, |ui| {
            let selected = model.selected.map(|entity| entity.id);
            for entity in model.entities {
                let icon = default_tier_icon(entity.tier);
                ui.horizontal(|ui| {
                    ui.label(RichText::new("●").color(icon_color(&icon)));
                    if ui
                        .selectable_label(selected == Some(entity.id), &entity.name)
                        .clicked()
                    {
                        action = Some(UiAction::Select(entity.id));
                    }
                });
            }
        });

    ui.separator();
    ui.label(RichText::new(format!("Tiles: {}", model.tiles_name)).small().weak());

    action
}

/// Name, address, code, tier and metrics of one entity
pub fn entity_details(ui: &mut Ui, entity: &Entity, grid_id: &str) {
    egui::Grid::new(grid_id)
        .num_columns(2)
        .spacing([12.0, 4.0])
        .show(ui, |ui| {
            ui.label("Name:");
            ui.label(RichText::new(&entity.name).strong());
            ui.end_row();

            if !entity.address.is_empty() {
                ui.label("Address:");
                ui.label(&entity.address);
                ui.end_row();
            }

            if let Some(code) = &entity.code {
                ui.label("Code:");
                ui.label(RichText::new(code).monospace());
                ui.end_row();
            }

            let icon = default_tier_icon(entity.tier);
            ui.label("Tier:");
            ui.label(RichText::new(icon.label).color(icon_color(&icon)));
            ui.end_row();

            for (name, value) in &entity.metrics {
                ui.label(format!("{}:", name));
                ui.label(RichText::new(format_metric(*value)).strong());
                ui.end_row();
            }
        });
}

/// Integers without decimals, everything else with two
pub fn format_metric(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

/// Draw the popover above the pin at `position` (container pixels of `map_rect`).
/// Returns true when the user closed it.
pub fn popover(ui: &mut Ui, map_rect: egui::Rect, position: PixelPosition, entity: &Entity) -> bool {
    let anchor = map_rect.min + egui::vec2(position.x, position.y - POPOVER_OFFSET);
    if !map_rect.contains(anchor) {
        return false;
    }

    let mut close = false;
    egui::Area::new(egui::Id::new("poi_popover"))
        .fixed_pos(anchor)
        .pivot(egui::Align2::CENTER_BOTTOM)
        .order(egui::Order::Foreground)
        .constrain(false)
        .show(ui.ctx(), |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.set_max_width(260.0);
                ui.horizontal(|ui| {
                    ui.label(RichText::new(&entity.name).strong());
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("✕").clicked() {
                            close = true;
                        }
                    });
                });
                ui.separator();
                entity_details(ui, entity, "popover_details_grid");
            });
        });
    close
}

/// Status message centered over the map
pub fn status_banner(ui: &mut Ui, message: &str) {
    let rect = ui.max_rect();
    let banner_size = egui::vec2(rect.width().min(420.0), 44.0);
    let banner_rect = egui::Rect::from_min_size(
        rect.center_top() + egui::vec2(-banner_size.x / 2.0, 20.0),
        banner_size,
    );
    ui.painter()
        .rect_filled(banner_rect, 10.0, Color32::from_black_alpha(180));
    ui.painter().text(
        banner_rect.center(),
        egui::Align2::CENTER_CENTER,
        message,
        egui::FontId::proportional(15.0),
        Color32::WHITE,
    );
}
