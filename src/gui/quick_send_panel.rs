use eframe::egui;

use super::{PromptPurpose, QuickApp, QUICK_SEND_TITLE};
use crate::floating;
use crate::launcher::Job;
use crate::quick_send::{ItemRef, QuickSendItem, QuickSendStore, Selection};

const SIZE: egui::Vec2 = egui::vec2(380.0, 480.0);

/// An item being edited in place.
struct ItemEdit {
    at: ItemRef,
    content: String,
    caption: String,
    tooltip: String,
}

impl ItemEdit {
    fn new(at: ItemRef, item: QuickSendItem) -> Self {
        Self {
            at,
            content: item.key,
            caption: item.text,
            tooltip: item.tooltip.unwrap_or_default(),
        }
    }
}

/// Editing state of the quick send window.
pub struct QuickSendView {
    selection: Selection,
    query: String,
    new_content: String,
    target: Option<String>,
    editing: Option<ItemEdit>,
}

impl Default for QuickSendView {
    fn default() -> Self {
        Self {
            selection: Selection::All,
            query: String::new(),
            new_content: String::new(),
            target: None,
            editing: None,
        }
    }
}

impl QuickSendView {
    /// Reset for a fresh showing, preselecting `file` when it exists.
    pub fn open(&mut self, file: Option<String>, store: &QuickSendStore) {
        self.selection = match file {
            Some(f) if store.has_file(&f) => Selection::File(f),
            Some(f) => {
                tracing::warn!("quick send file '{f}' not found, showing all");
                Selection::All
            }
            None => Selection::All,
        };
        self.query.clear();
        self.editing = None;
        self.target = None;
    }

    pub fn select(&mut self, file: &str) {
        self.selection = Selection::File(file.to_string());
        self.target = None;
    }
}

enum QsOp {
    Send(String),
    Delete(ItemRef),
    Move(ItemRef, usize),
    StartEdit(ItemRef, QuickSendItem),
    SaveEdit,
    Add,
    NewFile,
    SaveAll,
}

impl QuickApp {
    pub(super) fn quick_send_ui(&mut self, ctx: &egui::Context) {
        let rows: Vec<(ItemRef, QuickSendItem)> = self
            .quick_send
            .filter(&self.quick_send_view.selection, &self.quick_send_view.query)
            .into_iter()
            .map(|(r, item)| (r, item.clone()))
            .collect();
        let files = self.quick_send.files().to_vec();
        let unreadable: Vec<String> = self.quick_send.unreadable().map(str::to_string).collect();
        let counts: Vec<usize> = files
            .iter()
            .map(|f| self.quick_send.items(&Selection::File(f.clone())).len())
            .collect();

        let mut builder = egui::ViewportBuilder::default()
            .with_title(QUICK_SEND_TITLE)
            .with_inner_size(SIZE)
            .with_always_on_top();
        if let (Some(button), Some(screen)) = (self.button_rect, self.screen) {
            builder = builder.with_position(floating::panel_position(button, SIZE, screen));
        }

        let mut ops: Vec<QsOp> = Vec::new();
        let mut close = false;
        let view = &mut self.quick_send_view;
        let toasts = &mut self.toasts;
        ctx.show_viewport_immediate(
            egui::ViewportId::from_hash_of("quick_send"),
            builder,
            |ctx, _class| {
                egui::TopBottomPanel::bottom("quick_send_add").show(ctx, |ui| {
                    ui.add_space(4.0);
                    ui.add(
                        egui::TextEdit::multiline(&mut view.new_content)
                            .hint_text("Content to add")
                            .desired_rows(2)
                            .desired_width(f32::INFINITY),
                    );
                    ui.horizontal(|ui| {
                        let label = view.target.clone().unwrap_or_else(|| "(current)".into());
                        egui::ComboBox::from_id_source("quick_send_target")
                            .selected_text(label)
                            .show_ui(ui, |ui| {
                                ui.selectable_value(&mut view.target, None, "(current)");
                                for f in &files {
                                    ui.selectable_value(&mut view.target, Some(f.clone()), f.as_str());
                                }
                            });
                        if ui.button("Add").clicked() {
                            ops.push(QsOp::Add);
                        }
                        if ui.button("Save").clicked() {
                            ops.push(QsOp::SaveAll);
                        }
                    });
                    ui.add_space(4.0);
                });

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        let current = match &view.selection {
                            Selection::All => "All".to_string(),
                            Selection::File(f) => f.clone(),
                        };
                        egui::ComboBox::from_id_source("quick_send_file")
                            .selected_text(current)
                            .show_ui(ui, |ui| {
                                ui.selectable_value(&mut view.selection, Selection::All, "All");
                                for (f, n) in files.iter().zip(&counts) {
                                    ui.selectable_value(
                                        &mut view.selection,
                                        Selection::File(f.clone()),
                                        format!("{f} ({n})"),
                                    );
                                }
                            });
                        if ui.button("New file").clicked() {
                            ops.push(QsOp::NewFile);
                        }
                    });
                    if !unreadable.is_empty() {
                        ui.colored_label(
                            ui.visuals().warn_fg_color,
                            format!("Could not read: {}", unreadable.join(", ")),
                        );
                    }
                    ui.add(
                        egui::TextEdit::singleline(&mut view.query)
                            .hint_text("Search")
                            .desired_width(f32::INFINITY),
                    );
                    ui.separator();

                    let reorder = view.query.trim().is_empty();
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        if rows.is_empty() {
                            ui.label("Nothing here yet.");
                        }
                        for (r, item) in &rows {
                            let editing = view
                                .editing
                                .as_ref()
                                .map(|e| e.at == *r)
                                .unwrap_or(false);
                            if editing {
                                if let Some(edit) = view.editing.as_mut() {
                                    ui.label("Content");
                                    ui.add(
                                        egui::TextEdit::multiline(&mut edit.content)
                                            .desired_rows(2)
                                            .desired_width(f32::INFINITY),
                                    );
                                    ui.horizontal(|ui| {
                                        ui.label("Caption");
                                        ui.text_edit_singleline(&mut edit.caption);
                                    });
                                    ui.horizontal(|ui| {
                                        ui.label("Tooltip");
                                        ui.text_edit_singleline(&mut edit.tooltip);
                                    });
                                }
                                ui.horizontal(|ui| {
                                    if ui.button("Save").clicked() {
                                        ops.push(QsOp::SaveEdit);
                                    }
                                    if ui.button("Cancel").clicked() {
                                        view.editing = None;
                                    }
                                });
                                ui.separator();
                                continue;
                            }
                            ui.horizontal(|ui| {
                                let hover = item.tooltip.clone().unwrap_or_else(|| item.key.clone());
                                let resp = ui
                                    .add_sized(
                                        [ui.available_width() - 60.0, 24.0],
                                        egui::Button::new(item.text.as_str()),
                                    )
                                    .on_hover_text(hover);
                                if resp.clicked() {
                                    ops.push(QsOp::Send(item.key.clone()));
                                }
                                resp.context_menu(|ui| {
                                    if ui.button("Edit").clicked() {
                                        ops.push(QsOp::StartEdit(r.clone(), item.clone()));
                                        ui.close_menu();
                                    }
                                    if ui.button("Delete").clicked() {
                                        ops.push(QsOp::Delete(r.clone()));
                                        ui.close_menu();
                                    }
                                });
                                ui.add_enabled_ui(reorder, |ui| {
                                    if ui.small_button("⬆").clicked() && r.index > 0 {
                                        ops.push(QsOp::Move(r.clone(), r.index - 1));
                                    }
                                    if ui.small_button("⬇").clicked() {
                                        ops.push(QsOp::Move(r.clone(), r.index + 1));
                                    }
                                });
                            });
                        }
                    });
                });

                toasts.show(ctx);
                if ctx.input(|i| i.viewport().close_requested()) {
                    close = true;
                }
            },
        );

        for op in ops {
            self.apply_quick_send_op(op);
        }
        if close {
            self.close_quick_send();
        }
    }

    fn apply_quick_send_op(&mut self, op: QsOp) {
        match op {
            QsOp::Send(text) => self.run_job(Job::Snippet(text)),
            QsOp::Delete(r) => {
                if let Err(e) = self.quick_send.delete_item(&r.file, r.index) {
                    self.set_error(format!("{e:#}"));
                }
            }
            QsOp::Move(r, to) => {
                if let Err(e) = self.quick_send.move_item(&r.file, r.index, to) {
                    self.set_error(format!("{e:#}"));
                }
            }
            QsOp::StartEdit(r, item) => {
                self.quick_send_view.editing = Some(ItemEdit::new(r, item));
            }
            QsOp::SaveEdit => {
                if let Some(edit) = self.quick_send_view.editing.take() {
                    let at = &edit.at;
                    let saved = self
                        .quick_send
                        .edit_content(&at.file, at.index, &edit.content)
                        .and_then(|()| {
                            self.quick_send
                                .edit_item(&at.file, at.index, &edit.caption, &edit.tooltip)
                        });
                    if let Err(e) = saved {
                        self.set_error(format!("{e:#}"));
                        self.quick_send_view.editing = Some(edit);
                    }
                }
            }
            QsOp::Add => {
                let view = &self.quick_send_view;
                match self
                    .quick_send
                    .add_item(view.target.as_deref(), &view.selection, &view.new_content)
                {
                    Ok(file) => {
                        self.quick_send_view.new_content.clear();
                        self.info(format!("Added to {file}"));
                    }
                    Err(e) => self.set_error(format!("{e:#}")),
                }
            }
            QsOp::NewFile => self.prompt.open(
                "New quick send file",
                "File name",
                "",
                PromptPurpose::NewQuickSendFile,
            ),
            QsOp::SaveAll => {
                let n = self.quick_send.save_all();
                self.info(format!("Saved {n} file(s)"));
            }
        }
    }
}
