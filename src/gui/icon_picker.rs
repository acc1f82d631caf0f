use eframe::egui;

use super::{dialog_viewport, QuickApp};
use crate::action_tree;

const PREVIEW: u32 = 32;
const COLUMNS: usize = 6;

/// Where the chosen icon goes.
#[derive(Debug, Clone, PartialEq)]
pub enum IconTarget {
    /// The action with this id.
    Action { id: String },
    EditDialog,
}

/// Grid of the SVG icons found in the `svg/` directory.
#[derive(Default)]
pub struct IconPicker {
    pub open: bool,
    target: Option<IconTarget>,
    icons: Vec<String>,
    filter: String,
}

impl IconPicker {
    pub fn open(&mut self, target: IconTarget) {
        self.target = Some(target);
        self.icons.clear();
        self.filter.clear();
        self.open = true;
    }

    pub fn ui(&mut self, ctx: &egui::Context, app: &mut QuickApp) {
        if !self.open {
            return;
        }
        if self.icons.is_empty() {
            self.icons = app.icons.available_icons();
        }
        let filter = self.filter.to_lowercase();
        let visible: Vec<String> = self
            .icons
            .iter()
            .filter(|n| filter.is_empty() || n.to_lowercase().contains(&filter))
            .cloned()
            .collect();
        let textures: Vec<(String, Option<egui::TextureId>)> = visible
            .into_iter()
            .map(|n| {
                let tex = app.icon_texture(ctx, &n, PREVIEW);
                (n, tex)
            })
            .collect();

        let mut chosen: Option<String> = None;
        let mut cancel = false;
        let filter_text = &mut self.filter;
        let empty = self.icons.is_empty();
        let dir = app.store.paths().svg_dir.display().to_string();
        let close = dialog_viewport(ctx, "icon_picker", "Choose icon", [420.0, 420.0], |ui| {
            ui.horizontal(|ui| {
                ui.label("Filter");
                ui.text_edit_singleline(filter_text);
            });
            if empty {
                ui.label(format!("No SVG icons found in {dir}"));
            }
            egui::ScrollArea::vertical().max_height(300.0).show(ui, |ui| {
                egui::Grid::new("icon_picker_grid")
                    .spacing([6.0, 6.0])
                    .show(ui, |ui| {
                        for (i, (name, tex)) in textures.iter().enumerate() {
                            let size = egui::vec2(PREVIEW as f32, PREVIEW as f32);
                            let resp = match tex {
                                Some(id) => ui.add(egui::ImageButton::new((*id, size))),
                                None => ui.add_sized(size + egui::vec2(8.0, 8.0), egui::Button::new("?")),
                            };
                            if resp.on_hover_text(name.as_str()).clicked() {
                                chosen = Some(name.clone());
                            }
                            if (i + 1) % COLUMNS == 0 {
                                ui.end_row();
                            }
                        }
                    });
            });
            ui.separator();
            ui.horizontal(|ui| {
                if ui.button("No icon").clicked() {
                    chosen = Some(String::new());
                }
                if ui.button("Cancel").clicked() {
                    cancel = true;
                }
            });
        });

        if let Some(icon) = chosen {
            match self.target.take() {
                Some(IconTarget::Action { id }) => {
                    app.mutate_tree(|root| {
                        let action = action_tree::get_by_id_mut(root, &id)
                            .ok_or_else(|| anyhow::anyhow!("the action no longer exists"))?;
                        action.icon_path = icon;
                        Ok(())
                    });
                }
                Some(IconTarget::EditDialog) => app.edit_dialog.set_icon(&icon),
                None => {}
            }
            self.open = false;
        } else if cancel || close {
            self.target = None;
            self.open = false;
        }
    }
}
