use eframe::egui;
use egui_extras::{Column, TableBuilder};

use super::{dialog_viewport, QuickApp};
use crate::config_store::BackupInfo;

/// Lists configuration backups and manages the size limit.
#[derive(Default)]
pub struct BackupDialog {
    pub open: bool,
    info: Option<BackupInfo>,
    limit_mb: u64,
    confirm: Option<String>,
}

impl BackupDialog {
    pub fn open(&mut self, app: &QuickApp) {
        self.refresh(app);
        self.confirm = None;
        self.open = true;
    }

    fn refresh(&mut self, app: &QuickApp) {
        let info = app.store.backup_info();
        self.limit_mb = info.max_size_mb;
        self.info = Some(info);
    }

    pub fn ui(&mut self, ctx: &egui::Context, app: &mut QuickApp) {
        if !self.open {
            return;
        }
        if self.info.is_none() {
            self.refresh(app);
        }
        let Some(info) = self.info.as_ref() else {
            return;
        };
        let mut load: Option<String> = None;
        let mut ask: Option<String> = None;
        let mut cancel_confirm = false;
        let mut clean = false;
        let mut apply_limit = false;
        let mut refresh = false;
        let mut done = false;
        let confirm = self.confirm.clone();
        let limit = &mut self.limit_mb;

        let close = dialog_viewport(ctx, "backups", "Configuration backups", [560.0, 440.0], |ui| {
            ui.label(format!("Folder: {}", info.dir.display()));
            ui.label(format!(
                "{} file(s), {:.2} MB of {} MB",
                info.total_files, info.total_size_mb, info.max_size_mb
            ));
            ui.horizontal(|ui| {
                ui.label("Size limit (MB)");
                ui.add(egui::DragValue::new(limit).clamp_range(1..=1024));
                if ui.button("Apply").clicked() {
                    apply_limit = true;
                }
                if ui.button("Clean now").clicked() {
                    clean = true;
                }
                if ui.button("Refresh").clicked() {
                    refresh = true;
                }
            });
            ui.separator();

            if let Some(name) = &confirm {
                ui.label(format!(
                    "Load {name}? The current configuration is backed up first."
                ));
                ui.horizontal(|ui| {
                    if ui.button("Load").clicked() {
                        load = Some(name.clone());
                    }
                    if ui.button("Cancel").clicked() {
                        cancel_confirm = true;
                    }
                });
                ui.separator();
            }

            if info.files.is_empty() {
                ui.label("No backups yet.");
            } else {
                TableBuilder::new(ui)
                    .striped(true)
                    .max_scroll_height(260.0)
                    .column(Column::remainder().at_least(200.0))
                    .column(Column::auto().at_least(70.0))
                    .column(Column::auto().at_least(130.0))
                    .column(Column::auto())
                    .header(20.0, |mut header| {
                        header.col(|ui| {
                            ui.strong("File");
                        });
                        header.col(|ui| {
                            ui.strong("Size");
                        });
                        header.col(|ui| {
                            ui.strong("Modified");
                        });
                        header.col(|_| {});
                    })
                    .body(|mut body| {
                        for file in &info.files {
                            body.row(20.0, |mut row| {
                                row.col(|ui| {
                                    ui.label(file.name.as_str());
                                });
                                row.col(|ui| {
                                    ui.label(format!("{:.1} KB", file.size_kb));
                                });
                                row.col(|ui| {
                                    ui.label(file.modified.as_str());
                                });
                                row.col(|ui| {
                                    if ui.small_button("Load").clicked() {
                                        ask = Some(file.name.clone());
                                    }
                                });
                            });
                        }
                    });
            }
            ui.separator();
            if ui.button("Close").clicked() {
                done = true;
            }
        });

        if let Some(name) = ask {
            self.confirm = Some(name);
        }
        if cancel_confirm {
            self.confirm = None;
        }
        if let Some(name) = load {
            app.load_backup(&name);
            self.confirm = None;
            refresh = true;
        }
        if apply_limit {
            let mb = self.limit_mb;
            match app.store.set_backup_limit(mb) {
                Ok(removed) => {
                    app.autosave.touch(std::time::Instant::now());
                    app.info(format!("Backup limit set to {mb} MB, removed {removed} file(s)"));
                }
                Err(e) => app.set_error(format!("{e:#}")),
            }
            refresh = true;
        }
        if clean {
            let removed = app.store.manual_cleanup_backups();
            app.info(format!("Removed {removed} old backup(s)"));
            refresh = true;
        }
        if refresh {
            self.refresh(app);
        }
        if done || close {
            self.open = false;
            self.info = None;
        }
    }
}
