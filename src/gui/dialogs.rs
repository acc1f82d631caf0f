use eframe::egui;

use super::{dialog_viewport, IconTarget, QuickApp};
use crate::action_tree::{self, PanelPath, MAX_PANEL_DEPTH};
use crate::actions::exec::split_args;
use crate::actions::keys::parse_sequence;
use crate::actions::script::{DEFAULT_TEMPLATE, TEMPLATES};
use crate::actions::{Action, ActionKind, InputSource, NewActionType, OutputTarget};
use crate::config_store::ConfigStore;
use crate::hotkey::parse_hotkey;
use crate::launcher::{Job, ScriptJob};

/// What the single-value prompt is collecting.
#[derive(Debug, Clone)]
pub enum PromptPurpose {
    NewAction { kind: NewActionType, path: PanelPath },
    Rename { id: String },
    ManualInput(ScriptJob),
    NewQuickSendFile,
    NewQuickSendAction { path: PanelPath },
}

impl PromptPurpose {
    fn multiline(&self) -> bool {
        matches!(
            self,
            PromptPurpose::ManualInput(_)
                | PromptPurpose::NewAction {
                    kind: NewActionType::Text,
                    ..
                }
        )
    }
}

#[derive(Default)]
pub struct PromptDialog {
    pub open: bool,
    title: String,
    label: String,
    value: String,
    purpose: Option<PromptPurpose>,
    focus: bool,
}

impl PromptDialog {
    pub fn open(&mut self, title: &str, label: &str, initial: &str, purpose: PromptPurpose) {
        self.title = title.to_string();
        self.label = label.to_string();
        self.value = initial.to_string();
        self.purpose = Some(purpose);
        self.focus = true;
        self.open = true;
    }

    pub fn ui(&mut self, ctx: &egui::Context, app: &mut QuickApp) {
        if !self.open {
            return;
        }
        let multiline = self.purpose.as_ref().map(|p| p.multiline()).unwrap_or(false);
        let height = if multiline { 240.0 } else { 120.0 };
        let mut ok = false;
        let mut cancel = false;
        let close = dialog_viewport(ctx, "prompt", &self.title, [380.0, height], |ui| {
            ui.label(self.label.as_str());
            let resp = if multiline {
                ui.add(
                    egui::TextEdit::multiline(&mut self.value)
                        .desired_rows(6)
                        .desired_width(f32::INFINITY),
                )
            } else {
                let resp = ui.add(
                    egui::TextEdit::singleline(&mut self.value).desired_width(f32::INFINITY),
                );
                if resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    ok = true;
                }
                resp
            };
            if self.focus {
                resp.request_focus();
                self.focus = false;
            }
            ui.horizontal(|ui| {
                if ui.button("OK").clicked() {
                    ok = true;
                }
                if ui.button("Cancel").clicked() {
                    cancel = true;
                }
            });
            if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                cancel = true;
            }
        });
        if ok {
            if let Some(purpose) = self.purpose.take() {
                if let Err(purpose) = apply_prompt(purpose, &self.value, app) {
                    // keep the dialog so the value can be corrected
                    self.purpose = Some(purpose);
                    return;
                }
            }
            self.open = false;
        } else if cancel || close {
            self.purpose = None;
            self.open = false;
        }
    }
}

/// Carry out a confirmed prompt. An invalid value hands the purpose back.
fn apply_prompt(
    purpose: PromptPurpose,
    value: &str,
    app: &mut QuickApp,
) -> Result<(), PromptPurpose> {
    let trimmed = value.trim();
    match purpose {
        PromptPurpose::ManualInput(mut job) => {
            job.manual_input = Some(value.to_string());
            app.run_job(Job::Script(job));
        }
        purpose if trimmed.is_empty() => {
            app.set_error("A value is required");
            return Err(purpose);
        }
        PromptPurpose::NewAction { kind, path } => {
            if kind == NewActionType::Panel && path.depth() + 1 >= MAX_PANEL_DEPTH {
                app.set_error(format!("maximum panel depth of {MAX_PANEL_DEPTH} reached"));
                return Ok(());
            }
            if kind == NewActionType::Key {
                if let Err(e) = parse_sequence(trimmed) {
                    app.set_error(format!("Invalid key sequence: {e:#}"));
                    return Err(PromptPurpose::NewAction { kind, path });
                }
            }
            if let Some(action) = kind.build(trimmed) {
                app.add_action(&path, action);
            }
        }
        PromptPurpose::Rename { id } => {
            let name = trimmed.to_string();
            app.mutate_tree(|root| {
                let action = action_tree::get_by_id_mut(root, &id)
                    .ok_or_else(|| anyhow::anyhow!("the action no longer exists"))?;
                action.name = name;
                Ok(())
            });
        }
        PromptPurpose::NewQuickSendFile => match app.quick_send.create_file(trimmed) {
            Ok(()) => app.quick_send_view.select(trimmed),
            Err(e) => {
                app.set_error(format!("{e:#}"));
                return Err(PromptPurpose::NewQuickSendFile);
            }
        },
        PromptPurpose::NewQuickSendAction { path } => {
            match app.quick_send.create_for_action(trimmed) {
                Ok(stem) => {
                    let action = Action::new(
                        trimmed,
                        ActionKind::QuickSend {
                            filename: stem,
                            description: String::new(),
                        },
                    );
                    app.add_action(&path, action);
                }
                Err(e) => app.set_error(format!("Failed to create quick send file: {e:#}")),
            }
        }
    }
    Ok(())
}

/// Edit every field of an existing action.
#[derive(Default)]
pub struct EditActionDialog {
    pub open: bool,
    draft: Option<Action>,
    args: String,
    script: String,
    script_dirty: bool,
}

impl EditActionDialog {
    /// Start editing a copy of `action`. The copy is written back by id.
    pub fn open(&mut self, action: &Action, store: &ConfigStore) {
        self.args.clear();
        self.script.clear();
        self.script_dirty = false;
        match &action.kind {
            ActionKind::Program { args, .. } => {
                self.args = shlex::try_join(args.iter().map(String::as_str))
                    .unwrap_or_else(|_| args.join(" "));
            }
            ActionKind::InputOutput { script_file, .. } if !script_file.is_empty() => {
                match store.read_script(script_file) {
                    Ok(text) => self.script = text,
                    Err(e) => tracing::warn!("failed to read script {script_file}: {e:#}"),
                }
            }
            _ => {}
        }
        self.draft = Some(action.clone());
        self.open = true;
    }

    pub fn set_icon(&mut self, icon: &str) {
        if let Some(draft) = self.draft.as_mut() {
            draft.icon_path = icon.to_string();
        }
    }

    pub fn ui(&mut self, ctx: &egui::Context, app: &mut QuickApp) {
        if !self.open {
            return;
        }
        let Some(draft) = self.draft.as_mut() else {
            self.open = false;
            return;
        };
        let files = app.quick_send.files().to_vec();
        let mut save = false;
        let mut cancel = false;
        let mut pick_icon = false;
        let title = format!("Edit {}", draft.kind.label());
        let args = &mut self.args;
        let script = &mut self.script;
        let script_dirty = &mut self.script_dirty;
        let close = dialog_viewport(ctx, "edit_action", &title, [460.0, 520.0], |ui| {
            egui::Grid::new("edit_action_grid")
                .num_columns(2)
                .spacing([8.0, 6.0])
                .show(ui, |ui| {
                    ui.label("Name");
                    ui.text_edit_singleline(&mut draft.name);
                    ui.end_row();

                    ui.label("Icon");
                    ui.horizontal(|ui| {
                        ui.text_edit_singleline(&mut draft.icon_path);
                        if ui.button("Choose...").clicked() {
                            pick_icon = true;
                        }
                    });
                    ui.end_row();

                    ui.label("Hotkey");
                    ui.add(
                        egui::TextEdit::singleline(&mut draft.hotkey).hint_text("ctrl+alt+1"),
                    );
                    ui.end_row();

                    ui.label("Enabled");
                    ui.checkbox(&mut draft.enabled, "");
                    ui.end_row();

                    match &mut draft.kind {
                        ActionKind::Key { command } => {
                            ui.label("Keys");
                            ui.text_edit_singleline(command);
                            ui.end_row();
                        }
                        ActionKind::Program { command, .. } => {
                            ui.label("Program");
                            ui.text_edit_singleline(command);
                            ui.end_row();
                            ui.label("Arguments");
                            ui.text_edit_singleline(args);
                            ui.end_row();
                        }
                        ActionKind::Url { url } => {
                            ui.label("URL");
                            ui.text_edit_singleline(url);
                            ui.end_row();
                        }
                        ActionKind::Text { text } => {
                            ui.label("Text");
                            ui.text_edit_multiline(text);
                            ui.end_row();
                        }
                        ActionKind::Panel { actions } => {
                            ui.label("Contents");
                            ui.label(format!("{} action(s)", actions.len()));
                            ui.end_row();
                        }
                        ActionKind::InputOutput {
                            script_file,
                            input_source,
                            output_target,
                            description,
                        } => {
                            ui.label("Description");
                            ui.text_edit_singleline(description);
                            ui.end_row();
                            ui.label("Input");
                            source_combo(ui, "edit_input", input_source);
                            ui.end_row();
                            ui.label("Output");
                            target_combo(ui, "edit_output", output_target);
                            ui.end_row();
                            ui.label("Script file");
                            ui.label(script_file.as_str());
                            ui.end_row();
                        }
                        ActionKind::QuickSend {
                            filename,
                            description,
                        } => {
                            ui.label("File");
                            egui::ComboBox::from_id_source("edit_quick_send_file")
                                .selected_text(filename.as_str())
                                .show_ui(ui, |ui| {
                                    for f in &files {
                                        ui.selectable_value(filename, f.clone(), f.as_str());
                                    }
                                });
                            ui.end_row();
                            ui.label("Description");
                            ui.text_edit_singleline(description);
                            ui.end_row();
                        }
                        ActionKind::Unknown { type_name, .. } => {
                            ui.label("Type");
                            ui.label(format!("Unsupported action type '{type_name}'"));
                            ui.end_row();
                        }
                    }
                });

            if matches!(draft.kind, ActionKind::InputOutput { .. }) {
                ui.separator();
                ui.label("Script");
                egui::ScrollArea::vertical().max_height(220.0).show(ui, |ui| {
                    let resp = ui.add(
                        egui::TextEdit::multiline(script)
                            .code_editor()
                            .desired_rows(12)
                            .desired_width(f32::INFINITY),
                    );
                    if resp.changed() {
                        *script_dirty = true;
                    }
                });
            }

            ui.separator();
            ui.horizontal(|ui| {
                if ui.button("Save").clicked() {
                    save = true;
                }
                if ui.button("Cancel").clicked() {
                    cancel = true;
                }
            });
        });

        if pick_icon {
            app.icon_picker.open(IconTarget::EditDialog);
        }
        if save && self.save(app) {
            self.close();
        } else if cancel || close {
            self.close();
        }
    }

    fn close(&mut self) {
        self.open = false;
        self.draft = None;
    }

    /// Validate and write the draft back. Returns false when it was rejected.
    fn save(&mut self, app: &mut QuickApp) -> bool {
        let Some(mut draft) = self.draft.clone() else {
            return true;
        };
        draft.name = draft.name.trim().to_string();
        draft.hotkey = draft.hotkey.trim().to_string();
        if draft.name.is_empty() {
            app.set_error("Name must not be empty");
            return false;
        }
        if !draft.hotkey.is_empty() && parse_hotkey(&draft.hotkey).is_none() {
            app.set_error(format!("Invalid hotkey '{}'", draft.hotkey));
            return false;
        }
        match &mut draft.kind {
            ActionKind::Key { command } => {
                if let Err(e) = parse_sequence(command) {
                    app.set_error(format!("Invalid key sequence: {e:#}"));
                    return false;
                }
            }
            ActionKind::Program { args, .. } => *args = split_args(&self.args),
            ActionKind::InputOutput { script_file, .. } if self.script_dirty => {
                if let Err(e) = app.store.write_script(script_file, &self.script) {
                    app.set_error(format!("Failed to save script: {e:#}"));
                    return false;
                }
            }
            _ => {}
        }
        app.mutate_tree(|root| action_tree::replace_by_id(root, draft))
            .is_some()
    }
}

fn source_combo(ui: &mut egui::Ui, id: &str, value: &mut InputSource) {
    egui::ComboBox::from_id_source(id)
        .selected_text(value.label())
        .show_ui(ui, |ui| {
            for s in InputSource::ALL {
                ui.selectable_value(value, s, s.label());
            }
        });
}

fn target_combo(ui: &mut egui::Ui, id: &str, value: &mut OutputTarget) {
    egui::ComboBox::from_id_source(id)
        .selected_text(value.label())
        .show_ui(ui, |ui| {
            for t in OutputTarget::ALL {
                ui.selectable_value(value, t, t.label());
            }
        });
}

/// Creates an input/output action together with its script file.
pub struct InputOutputDialog {
    pub open: bool,
    path: PanelPath,
    name: String,
    description: String,
    input: InputSource,
    output: OutputTarget,
    script: String,
}

impl Default for InputOutputDialog {
    fn default() -> Self {
        Self {
            open: false,
            path: PanelPath::root(),
            name: String::new(),
            description: String::new(),
            input: InputSource::default(),
            output: OutputTarget::default(),
            script: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl InputOutputDialog {
    pub fn open(&mut self, path: PanelPath) {
        *self = Self {
            open: true,
            path,
            ..Self::default()
        };
    }

    pub fn ui(&mut self, ctx: &egui::Context, app: &mut QuickApp) {
        if !self.open {
            return;
        }
        let mut create = false;
        let mut cancel = false;
        let close = dialog_viewport(ctx, "io_action", "New input/output action", [520.0, 560.0], |ui| {
            egui::Grid::new("io_action_grid")
                .num_columns(2)
                .spacing([8.0, 6.0])
                .show(ui, |ui| {
                    ui.label("Name");
                    ui.text_edit_singleline(&mut self.name);
                    ui.end_row();
                    ui.label("Description");
                    ui.text_edit_singleline(&mut self.description);
                    ui.end_row();
                    ui.label("Input");
                    source_combo(ui, "io_input", &mut self.input);
                    ui.end_row();
                    ui.label("Output");
                    target_combo(ui, "io_output", &mut self.output);
                    ui.end_row();
                });
            ui.separator();
            ui.horizontal(|ui| {
                ui.label("Template:");
                for (label, body) in TEMPLATES {
                    if ui.button(label).clicked() {
                        self.script = body.to_string();
                    }
                }
            });
            egui::ScrollArea::vertical().max_height(320.0).show(ui, |ui| {
                ui.add(
                    egui::TextEdit::multiline(&mut self.script)
                        .code_editor()
                        .desired_rows(16)
                        .desired_width(f32::INFINITY),
                );
            });
            ui.separator();
            ui.horizontal(|ui| {
                if ui.button("Create").clicked() {
                    create = true;
                }
                if ui.button("Cancel").clicked() {
                    cancel = true;
                }
            });
        });
        if create && self.create(app) {
            self.open = false;
        } else if cancel || close {
            self.open = false;
        }
    }

    fn create(&mut self, app: &mut QuickApp) -> bool {
        let name = self.name.trim();
        if name.is_empty() {
            app.set_error("Name must not be empty");
            return false;
        }
        if !self.script.contains("def process") {
            app.set_error("The script needs a process(input_text, input_source, output_target) function");
            return false;
        }
        let mut action = Action::new(
            name,
            ActionKind::InputOutput {
                script_file: String::new(),
                input_source: self.input,
                output_target: self.output,
                description: self.description.trim().to_string(),
            },
        );
        let file = match app.store.create_script(name, &action.id, &self.script) {
            Ok(f) => f,
            Err(e) => {
                app.set_error(format!("Failed to create script: {e:#}"));
                return false;
            }
        };
        if let ActionKind::InputOutput { script_file, .. } = &mut action.kind {
            *script_file = file;
        }
        app.add_action(&self.path, action);
        true
    }
}

/// Shows script output for the `window` output target.
#[derive(Default)]
pub struct ResultWindow {
    pub open: bool,
    title: String,
    text: String,
}

impl ResultWindow {
    pub fn open(&mut self, title: &str, text: &str) {
        self.title = title.to_string();
        self.text = text.to_string();
        self.open = true;
    }

    pub fn ui(&mut self, ctx: &egui::Context) {
        if !self.open {
            return;
        }
        let mut done = false;
        let text = &self.text;
        let close = dialog_viewport(ctx, "result_window", &self.title, [480.0, 360.0], |ui| {
            egui::ScrollArea::vertical().max_height(270.0).show(ui, |ui| {
                ui.add(
                    egui::TextEdit::multiline(&mut text.as_str())
                        .desired_width(f32::INFINITY)
                        .desired_rows(12),
                );
            });
            ui.horizontal(|ui| {
                if ui.button("Copy").clicked() {
                    ui.ctx().output_mut(|o| o.copied_text = text.clone());
                }
                if ui.button("Close").clicked() {
                    done = true;
                }
            });
        });
        if done || close {
            self.open = false;
        }
    }
}
