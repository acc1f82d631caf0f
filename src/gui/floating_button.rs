use eframe::egui;

use super::{dialog_viewport, QuickApp};
use crate::floating::{self, DragRelease};
use crate::settings::parse_color;

impl QuickApp {
    /// The round button that fills the main viewport.
    pub(super) fn floating_button_ui(&mut self, ctx: &egui::Context) {
        let (outer, monitor) = ctx.input(|i| (i.viewport().outer_rect, i.viewport().monitor_size));
        if let Some(size) = monitor {
            self.screen = Some(egui::Rect::from_min_size(egui::Pos2::ZERO, size));
        }
        self.button_rect = outer;

        let cfg = self.store.config().floating_button.clone();
        let size = cfg.size as f32;
        if !self.positioned {
            if let Some(screen) = self.screen {
                let pos = floating::initial_position(screen, egui::vec2(size, size));
                ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(pos));
                self.positioned = true;
            }
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                let response = ui.allocate_rect(rect, egui::Sense::click_and_drag());
                self.hovered = response.hovered();

                let global = |local: egui::Pos2| match outer {
                    Some(o) => o.min + local.to_vec2(),
                    None => local,
                };
                if response.drag_started() {
                    if let (Some(p), Some(o)) = (response.interact_pointer_pos(), outer) {
                        self.drag.press(global(p), o.min);
                    }
                }
                if response.dragged() {
                    if let Some(p) = response.interact_pointer_pos() {
                        if let Some(pos) = self.drag.drag_to(global(p)) {
                            ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(pos));
                        }
                    }
                }
                if ui.input(|i| i.pointer.primary_released()) {
                    match self.drag.release() {
                        DragRelease::Dropped => {
                            if let (Some(o), Some(screen)) = (outer, self.screen) {
                                let pos = floating::snap_to_edges(
                                    o.min,
                                    o.size(),
                                    screen,
                                    cfg.snap_margin as f32,
                                );
                                ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(pos));
                            }
                        }
                        DragRelease::Click => self.toggle_panel(),
                        DragRelease::Ignored => {}
                    }
                }
                // A click without movement never starts an egui drag.
                if response.clicked() && !self.drag.is_dragging() {
                    self.toggle_panel();
                }
                if response.secondary_clicked() {
                    self.button_menu_open = !self.button_menu_open;
                }

                let style = &cfg.style;
                let bg = if self.hovered {
                    &style.hover_background
                } else {
                    &style.background
                };
                let fill = parse_color(bg).unwrap_or(egui::Color32::from_rgb(79, 124, 255));
                let opacity = floating::opacity(self.hovered, cfg.idle_opacity, cfg.active_opacity);
                let painter = ui.painter();
                painter.circle_filled(
                    rect.center(),
                    rect.width().min(rect.height()) / 2.0,
                    fill.gamma_multiply(opacity),
                );
                let text_color = parse_color(&style.color).unwrap_or(egui::Color32::WHITE);
                painter.text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    "Q",
                    egui::FontId::proportional(style.font_size),
                    text_color.gamma_multiply(opacity),
                );
            });
    }

    /// Right-click menu of the floating button.
    pub(super) fn button_menu_ui(&mut self, ctx: &egui::Context) {
        let mut about = false;
        let mut save = false;
        let mut quit = false;
        let close = dialog_viewport(ctx, "button_menu", "Quick Panel", [200.0, 130.0], |ui| {
            ui.vertical_centered_justified(|ui| {
                about = ui.button("About").clicked();
                save = ui.button("Save now").clicked();
                quit = ui.button("Quit").clicked();
            });
        });
        if close || about || save || quit {
            self.button_menu_open = false;
        }
        if about {
            self.about_open = true;
        }
        if save {
            self.save_now();
        }
        if quit {
            ctx.send_viewport_cmd_to(egui::ViewportId::ROOT, egui::ViewportCommand::Close);
        }
    }
}
