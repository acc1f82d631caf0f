use eframe::egui;

use super::{IconTarget, PromptPurpose, QuickApp, PANEL_TITLE};
use crate::action_tree::{self, GridLayout, PanelPath, MAX_PANEL_DEPTH};
use crate::actions::{Action, NewActionType};
use crate::floating;
use crate::settings::{parse_border, parse_color};

const NAME_CHARS: usize = 12;

enum PanelOp {
    Activate(usize),
    Back,
    Add(NewActionType),
    Rename(usize),
    ChangeIcon(usize),
    Edit(usize),
    Copy(usize),
    Cut(usize),
    Delete(usize),
    Move(usize, usize),
    Paste,
    SaveNow,
    Reload,
    Backups,
    BackupInfo,
    CleanBackups,
    Close,
}

/// Resolved colours of the action buttons.
struct ButtonColors {
    fill: egui::Color32,
    hover_fill: egui::Color32,
    pressed_fill: egui::Color32,
    text: egui::Color32,
    border: egui::Stroke,
    hover_border: egui::Color32,
    rounding: f32,
    font_size: f32,
}

impl ButtonColors {
    fn from_config(style: &crate::settings::ActionButtonStyle) -> Self {
        let (width, color) =
            parse_border(&style.border).unwrap_or((1.0, egui::Color32::from_gray(90)));
        Self {
            fill: parse_color(&style.background_color).unwrap_or(egui::Color32::from_gray(45)),
            hover_fill: parse_color(&style.hover_background_color)
                .unwrap_or(egui::Color32::from_gray(60)),
            pressed_fill: parse_color(&style.pressed_background_color)
                .unwrap_or(egui::Color32::from_gray(30)),
            text: parse_color(&style.color).unwrap_or(egui::Color32::WHITE),
            border: egui::Stroke::new(width, color),
            hover_border: parse_color(&style.hover_border_color).unwrap_or(color),
            rounding: style.border_radius,
            font_size: style.font_size,
        }
    }
}

fn short_name(name: &str) -> String {
    if name.chars().count() <= NAME_CHARS {
        name.to_string()
    } else {
        let mut s: String = name.chars().take(NAME_CHARS - 1).collect();
        s.push('…');
        s
    }
}

/// "Actions > Tools > Text" for the panel at `path`.
fn breadcrumb(root: &[Action], path: &PanelPath) -> String {
    let mut parts = vec!["Actions".to_string()];
    let mut current = PanelPath::root();
    for &idx in &path.0 {
        if let Some(a) = action_tree::get(root, &current, idx) {
            parts.push(a.name.clone());
        }
        current = current.child(idx);
    }
    parts.join(" > ")
}

fn dashed_rect(painter: &egui::Painter, rect: egui::Rect, stroke: egui::Stroke) {
    let pts = [
        rect.left_top(),
        rect.right_top(),
        rect.right_bottom(),
        rect.left_bottom(),
        rect.left_top(),
    ];
    painter.extend(egui::Shape::dashed_line(&pts, stroke, 5.0, 4.0));
}

impl QuickApp {
    pub(super) fn panel_ui(&mut self, ctx: &egui::Context) {
        let path = self.current_panel();
        let Some(items) = action_tree::panel(self.store.actions(), &path).map(|l| l.to_vec()) else {
            tracing::warn!("panel {path} no longer exists");
            self.panel_stack = vec![PanelPath::root()];
            return;
        };
        let panel_cfg = self.store.config().action_panel.clone();
        let buttons_cfg = self.store.config().action_buttons.clone();
        let colors = ButtonColors::from_config(&buttons_cfg.style);
        let grid = GridLayout::new(panel_cfg.columns, buttons_cfg.size, buttons_cfg.spacing);
        let icon_px = (buttons_cfg.size * 0.45).max(8.0) as u32;
        let textures: Vec<Option<egui::TextureId>> = items
            .iter()
            .map(|a| self.icon_texture(ctx, &a.icon_path, icon_px))
            .collect();
        let title = breadcrumb(self.store.actions(), &path);
        let panel_fill = parse_color(&panel_cfg.background_color);
        let error_line = self.error.as_ref().map(|(m, _)| m.clone());
        let paste_label = self.clipboard.describe();

        let size = egui::vec2(panel_cfg.width, panel_cfg.height);
        let mut builder = egui::ViewportBuilder::default()
            .with_title(PANEL_TITLE)
            .with_inner_size(size)
            .with_always_on_top();
        if let (Some(button), Some(screen)) = (self.button_rect, self.screen) {
            builder = builder.with_position(floating::panel_position(button, size, screen));
        }

        let mut ops: Vec<PanelOp> = Vec::new();
        let grid_drag = &mut self.grid_drag;
        let toasts = &mut self.toasts;
        let is_root = path.is_root();
        ctx.show_viewport_immediate(
            egui::ViewportId::from_hash_of("action_panel"),
            builder,
            |ctx, _class| {
                let mut frame = egui::Frame::central_panel(&ctx.style());
                if let Some(fill) = panel_fill {
                    frame = frame.fill(fill);
                }
                egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        if !is_root && ui.button("⬅").on_hover_text("Back").clicked() {
                            ops.push(PanelOp::Back);
                        }
                        ui.strong(title.as_str());
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.menu_button("⚙", |ui| {
                                if ui.button("Save now").clicked() {
                                    ops.push(PanelOp::SaveNow);
                                    ui.close_menu();
                                }
                                if ui.button("Reload from disk").clicked() {
                                    ops.push(PanelOp::Reload);
                                    ui.close_menu();
                                }
                                if ui.button("Load backup...").clicked() {
                                    ops.push(PanelOp::Backups);
                                    ui.close_menu();
                                }
                                ui.separator();
                                let label = match &paste_label {
                                    Some(d) => format!("Paste ({d})"),
                                    None => "Paste".to_string(),
                                };
                                if ui
                                    .add_enabled(paste_label.is_some(), egui::Button::new(label))
                                    .clicked()
                                {
                                    ops.push(PanelOp::Paste);
                                    ui.close_menu();
                                }
                                ui.separator();
                                if ui.button("Backup info").clicked() {
                                    ops.push(PanelOp::BackupInfo);
                                    ui.close_menu();
                                }
                                if ui.button("Clean backups").clicked() {
                                    ops.push(PanelOp::CleanBackups);
                                    ui.close_menu();
                                }
                            });
                            ui.menu_button("+", |ui| {
                                for t in NewActionType::ALL {
                                    if ui.button(t.label()).clicked() {
                                        ops.push(PanelOp::Add(t));
                                        ui.close_menu();
                                    }
                                }
                            });
                        });
                    });
                    ui.separator();

                    egui::ScrollArea::vertical().show(ui, |ui| {
                        let count = items.len();
                        let total = count + grid.placeholders(count);
                        let rows = grid.rows(total).max(1);
                        let columns = grid.columns as f32;
                        let grid_size = egui::vec2(
                            columns * (grid.cell.x + grid.spacing) - grid.spacing,
                            rows as f32 * (grid.cell.y + grid.spacing) - grid.spacing,
                        );
                        let (grid_rect, _) = ui.allocate_exact_size(grid_size, egui::Sense::hover());
                        let origin = grid_rect.min;
                        let pointer = ui.input(|i| i.pointer.interact_pos());
                        let drop_target = (*grid_drag).and_then(|_| {
                            pointer
                                .filter(|p| grid_rect.contains(*p))
                                .and_then(|p| grid.index_at(p, origin, count))
                        });

                        for (i, action) in items.iter().enumerate() {
                            let rect = egui::Rect::from_min_size(grid.cell_origin(origin, i), grid.cell);
                            let resp = ui
                                .interact(rect, ui.id().with(("action_button", i)), egui::Sense::click_and_drag())
                                .on_hover_text(action.summary());

                            let hovered =
                                resp.hovered() || (drop_target == Some(i) && *grid_drag != Some(i));
                            let fill = if resp.is_pointer_button_down_on() {
                                colors.pressed_fill
                            } else if hovered {
                                colors.hover_fill
                            } else {
                                colors.fill
                            };
                            let mut stroke = colors.border;
                            if hovered {
                                stroke.color = colors.hover_border;
                            }
                            let fade = if action.enabled { 1.0 } else { 0.4 };
                            let painter = ui.painter();
                            painter.rect(rect, colors.rounding, fill.gamma_multiply(fade), stroke);

                            let icon_rect = egui::Rect::from_center_size(
                                rect.center() - egui::vec2(0.0, colors.font_size * 0.6),
                                egui::Vec2::splat(icon_px as f32),
                            );
                            match textures.get(i).copied().flatten() {
                                Some(tex) => {
                                    painter.image(
                                        tex,
                                        icon_rect,
                                        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                                        egui::Color32::WHITE.gamma_multiply(fade),
                                    );
                                }
                                None => {
                                    painter.text(
                                        icon_rect.center(),
                                        egui::Align2::CENTER_CENTER,
                                        action.type_icon(),
                                        egui::FontId::proportional(icon_px as f32 * 0.8),
                                        colors.text.gamma_multiply(fade),
                                    );
                                }
                            }
                            painter.text(
                                egui::pos2(rect.center().x, rect.max.y - colors.font_size),
                                egui::Align2::CENTER_CENTER,
                                short_name(&action.name),
                                egui::FontId::proportional(colors.font_size),
                                colors.text.gamma_multiply(fade),
                            );

                            if resp.drag_started() {
                                *grid_drag = Some(i);
                            }
                            if resp.clicked() {
                                ops.push(PanelOp::Activate(i));
                            }
                            resp.context_menu(|ui| {
                                let entries = [
                                    ("Rename", PanelOp::Rename(i)),
                                    ("Change icon", PanelOp::ChangeIcon(i)),
                                    ("Edit", PanelOp::Edit(i)),
                                    ("Copy", PanelOp::Copy(i)),
                                    ("Cut", PanelOp::Cut(i)),
                                    ("Delete", PanelOp::Delete(i)),
                                ];
                                for (label, op) in entries {
                                    if ui.button(label).clicked() {
                                        ops.push(op);
                                        ui.close_menu();
                                    }
                                }
                            });
                        }

                        let placeholder = egui::Stroke::new(1.0, colors.border.color.gamma_multiply(0.6));
                        for i in count..total {
                            let rect = egui::Rect::from_min_size(grid.cell_origin(origin, i), grid.cell);
                            dashed_rect(ui.painter(), rect, placeholder);
                        }
                        if count == 0 {
                            ui.label("Empty panel. Use + to add an action.");
                        }

                        if let Some(from) = *grid_drag {
                            if ui.input(|i| i.pointer.any_released()) {
                                if let Some(to) = drop_target {
                                    if to != from {
                                        ops.push(PanelOp::Move(from, to));
                                    }
                                }
                                *grid_drag = None;
                            }
                        }
                    });

                    if let Some(err) = &error_line {
                        ui.separator();
                        ui.colored_label(egui::Color32::from_rgb(220, 80, 80), err.as_str());
                    }
                });

                toasts.show(ctx);
                if ctx.input(|i| i.viewport().close_requested() || i.key_pressed(egui::Key::Escape)) {
                    ops.push(PanelOp::Close);
                }
            },
        );

        for op in ops {
            self.apply_panel_op(&path, &items, op);
        }
    }

    fn apply_panel_op(&mut self, path: &PanelPath, items: &[Action], op: PanelOp) {
        let item = |idx: usize| items.get(idx).cloned();
        match op {
            PanelOp::Activate(idx) => self.activate(path, idx),
            PanelOp::Back => {
                if self.panel_stack.len() > 1 {
                    self.panel_stack.pop();
                }
            }
            PanelOp::Add(kind) => self.start_add(path, kind),
            PanelOp::Rename(idx) => {
                if let Some(a) = item(idx) {
                    self.prompt.open(
                        "Rename action",
                        "Name",
                        &a.name,
                        PromptPurpose::Rename { id: a.id.clone() },
                    );
                }
            }
            PanelOp::ChangeIcon(idx) => {
                if let Some(a) = item(idx) {
                    self.icon_picker.open(IconTarget::Action { id: a.id });
                }
            }
            PanelOp::Edit(idx) => {
                if let Some(a) = item(idx) {
                    self.edit_dialog.open(&a, &self.store);
                }
            }
            PanelOp::Copy(idx) => {
                if let Some(a) = item(idx) {
                    self.info(format!("Copied '{}'", a.name));
                    let source = action_tree::panel_id(self.store.actions(), path).map(str::to_string);
                    self.clipboard.copy(source.as_deref(), a);
                }
            }
            PanelOp::Cut(idx) => {
                let source = action_tree::panel_id(self.store.actions(), path).map(str::to_string);
                if let Some(removed) = self.mutate_tree(|root| action_tree::remove(root, path, idx)) {
                    self.info(format!("Cut '{}'", removed.name));
                    self.clipboard.cut(source.as_deref(), removed);
                }
            }
            PanelOp::Delete(idx) => {
                if let Some(removed) = self.mutate_tree(|root| action_tree::remove(root, path, idx)) {
                    tracing::info!("deleted action '{}' from {path}", removed.name);
                    self.info(format!("Deleted '{}'", removed.name));
                }
            }
            PanelOp::Move(from, to) => {
                self.mutate_tree(|root| Ok(action_tree::move_action(root, path, from, to)));
            }
            PanelOp::Paste => {
                let target = action_tree::panel_id(self.store.actions(), path).map(str::to_string);
                match self.clipboard.paste_into(target.as_deref()) {
                    Ok(action) => self.add_action(path, action),
                    Err(e) => self.set_error(format!("{e:#}")),
                }
            }
            PanelOp::SaveNow => self.save_now(),
            PanelOp::Reload => self.reload_config(),
            PanelOp::Backups => {
                let mut dialog = std::mem::take(&mut self.backup_dialog);
                dialog.open(self);
                self.backup_dialog = dialog;
            }
            PanelOp::BackupInfo => {
                let info = self.store.backup_info();
                self.info(format!(
                    "{} backup(s), {:.2} MB of {} MB in {}",
                    info.total_files,
                    info.total_size_mb,
                    info.max_size_mb,
                    info.dir.display()
                ));
            }
            PanelOp::CleanBackups => {
                let removed = self.store.manual_cleanup_backups();
                self.info(format!("Removed {removed} old backup(s)"));
            }
            PanelOp::Close => {
                self.panel_open = false;
                self.grid_drag = None;
            }
        }
    }

    fn start_add(&mut self, path: &PanelPath, kind: NewActionType) {
        match kind {
            NewActionType::InputOutput => self.io_dialog.open(path.clone()),
            NewActionType::QuickSend => self.prompt.open(
                "New quick send action",
                kind.prompt(),
                "",
                PromptPurpose::NewQuickSendAction { path: path.clone() },
            ),
            NewActionType::Panel if path.depth() + 1 >= MAX_PANEL_DEPTH => {
                self.set_error(format!("maximum panel depth of {MAX_PANEL_DEPTH} reached"));
            }
            _ => self.prompt.open(
                &format!("New action: {}", kind.label()),
                kind.prompt(),
                "",
                PromptPurpose::NewAction {
                    kind,
                    path: path.clone(),
                },
            ),
        }
    }
}
