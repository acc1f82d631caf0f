mod backup_dialog;
mod dialogs;
mod floating_button;
mod icon_picker;
mod panel;
mod quick_send_panel;

pub use backup_dialog::BackupDialog;
pub use dialogs::{EditActionDialog, InputOutputDialog, PromptDialog, PromptPurpose, ResultWindow};
pub use icon_picker::{IconPicker, IconTarget};
pub use quick_send_panel::QuickSendView;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use eframe::egui;
use egui_toast::{Toast, ToastKind, ToastOptions, Toasts};

use crate::action_tree::{self, ActionClipboard, PanelPath};
use crate::actions::Action;
use crate::autosave::SaveDebouncer;
use crate::config_store::ConfigStore;
use crate::floating::{self, DragTracker};
use crate::foreground::{self, ForegroundTracker};
use crate::hotkey::{HotkeyBindings, HotkeyManager, HotkeyTarget};
use crate::icons::IconManager;
use crate::launcher::{dispatch, Dispatch, ExecEvent, Job, PasteBackQueue, SystemDesktop};
use crate::actions::script::ScriptRunner;
use crate::quick_send::QuickSendStore;

pub const APP_TITLE: &str = "Quick Panel";
pub const PANEL_TITLE: &str = "Quick Panel - Actions";
pub const QUICK_SEND_TITLE: &str = "Quick Panel - Quick Send";

const TOAST_SECS: f64 = 3.0;
/// Upper bound between frames so background work keeps running while idle.
const IDLE_REPAINT: Duration = Duration::from_millis(100);

fn push_toast(toasts: &mut Toasts, kind: ToastKind, text: impl Into<String>) {
    let text: String = text.into();
    toasts.add(Toast {
        text: text.into(),
        kind,
        options: ToastOptions::default().duration_in_seconds(TOAST_SECS),
    });
}

/// Show `add_contents` in its own always-on-top window. Returns `true` when
/// the user asked to close it.
pub(crate) fn dialog_viewport(
    ctx: &egui::Context,
    id: &str,
    title: &str,
    size: [f32; 2],
    add_contents: impl FnOnce(&mut egui::Ui),
) -> bool {
    let mut close = false;
    ctx.show_viewport_immediate(
        egui::ViewportId::from_hash_of(id),
        egui::ViewportBuilder::default()
            .with_title(title)
            .with_inner_size(size)
            .with_always_on_top(),
        |ctx, class| {
            if class == egui::ViewportClass::Embedded {
                let mut open = true;
                egui::Window::new(title)
                    .open(&mut open)
                    .show(ctx, |ui| add_contents(ui));
                close = !open;
            } else {
                egui::CentralPanel::default().show(ctx, |ui| add_contents(ui));
                close = ctx.input(|i| i.viewport().close_requested());
            }
        },
    );
    close
}

/// The floating button application.
pub struct QuickApp {
    store: ConfigStore,
    autosave: SaveDebouncer,
    quick_send: QuickSendStore,
    icons: IconManager,
    textures: HashMap<String, egui::TextureHandle>,
    hotkeys: HotkeyManager,
    desktop: SystemDesktop,
    queue: PasteBackQueue,
    clipboard: ActionClipboard,
    toasts: Toasts,
    error: Option<(String, Instant)>,

    // floating button
    drag: DragTracker,
    hovered: bool,
    positioned: bool,
    button_rect: Option<egui::Rect>,
    screen: Option<egui::Rect>,
    last_guard: Instant,
    last_fg_poll: Instant,
    button_menu_open: bool,
    about_open: bool,

    // panels
    panel_open: bool,
    panel_stack: Vec<PanelPath>,
    grid_drag: Option<usize>,
    quick_send_open: bool,
    quick_send_view: QuickSendView,
    reopen_quick_send: bool,

    // dialogs
    prompt: PromptDialog,
    edit_dialog: EditActionDialog,
    io_dialog: InputOutputDialog,
    icon_picker: IconPicker,
    backup_dialog: BackupDialog,
    result_window: ResultWindow,
}

impl QuickApp {
    pub fn new(store: ConfigStore, quick_send: QuickSendStore, mut hotkeys: HotkeyManager) -> Self {
        let cfg = store.config();
        let autosave = SaveDebouncer::new(Duration::from_millis(cfg.action_panel.autosave_delay_ms));
        let runner = ScriptRunner::from_config(&cfg.scripts);
        let tracker = ForegroundTracker::new(&[APP_TITLE, PANEL_TITLE, QUICK_SEND_TITLE]);
        let desktop = SystemDesktop::new(tracker, runner, store.paths().base.clone());
        let icons = IconManager::new(store.paths().svg_dir.clone());
        hotkeys.start_listener();
        let now = Instant::now();

        Self {
            store,
            autosave,
            quick_send,
            icons,
            textures: HashMap::new(),
            hotkeys,
            desktop,
            queue: PasteBackQueue::new(),
            clipboard: ActionClipboard::default(),
            toasts: Toasts::new().anchor(egui::Align2::RIGHT_TOP, [10.0, 10.0]),
            error: None,
            drag: DragTracker::default(),
            hovered: false,
            positioned: false,
            button_rect: None,
            screen: None,
            last_guard: now,
            last_fg_poll: now,
            button_menu_open: false,
            about_open: false,
            panel_open: false,
            panel_stack: vec![PanelPath::root()],
            grid_drag: None,
            quick_send_open: false,
            quick_send_view: QuickSendView::default(),
            reopen_quick_send: false,
            prompt: PromptDialog::default(),
            edit_dialog: EditActionDialog::default(),
            io_dialog: InputOutputDialog::default(),
            icon_picker: IconPicker::default(),
            backup_dialog: BackupDialog::default(),
            result_window: ResultWindow::default(),
        }
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        tracing::error!("{msg}");
        push_toast(&mut self.toasts, ToastKind::Error, msg.clone());
        self.error = Some((msg, Instant::now()));
    }

    pub fn info(&mut self, msg: impl Into<String>) {
        push_toast(&mut self.toasts, ToastKind::Info, msg);
    }

    fn current_panel(&self) -> PanelPath {
        self.panel_stack.last().cloned().unwrap_or_default()
    }

    /// Apply `f` to the action tree, then schedule a save and refresh the
    /// hotkeys. Errors are reported in the UI.
    pub(crate) fn mutate_tree<T>(
        &mut self,
        f: impl FnOnce(&mut Vec<Action>) -> anyhow::Result<T>,
    ) -> Option<T> {
        match f(self.store.actions_mut()) {
            Ok(v) => {
                self.autosave.touch(Instant::now());
                self.refresh_hotkeys();
                Some(v)
            }
            Err(e) => {
                self.set_error(format!("{e:#}"));
                None
            }
        }
    }

    fn refresh_hotkeys(&mut self) {
        self.hotkeys
            .rebind(HotkeyBindings::from_config(self.store.config()));
    }

    pub(crate) fn add_action(&mut self, path: &PanelPath, action: Action) {
        let name = action.name.clone();
        if self
            .mutate_tree(|root| action_tree::add(root, path, action))
            .is_some()
        {
            tracing::info!("added action '{name}' to {path}");
        }
    }

    pub fn toggle_panel(&mut self) {
        self.panel_open = !self.panel_open;
        self.panel_stack = vec![PanelPath::root()];
        self.grid_drag = None;
        tracing::debug!(open = self.panel_open, "toggle panel");
    }

    /// Run the action at `idx` of the panel `path`.
    pub(crate) fn activate(&mut self, path: &PanelPath, idx: usize) {
        let Some(action) = action_tree::get(self.store.actions(), path, idx).cloned() else {
            return;
        };
        match dispatch(&action, path, idx, &self.store.paths().script_dir) {
            Dispatch::OpenPanel(child) => {
                self.panel_open = true;
                if self.panel_stack.last() != Some(path) {
                    self.panel_stack = vec![PanelPath::root()];
                    let mut p = PanelPath::root();
                    for &i in &path.0 {
                        p = p.child(i);
                        self.panel_stack.push(p.clone());
                    }
                }
                self.panel_stack.push(child);
            }
            Dispatch::OpenQuickSend(file) => self.open_quick_send(Some(file)),
            Dispatch::Run(job) => self.run_job(job),
            Dispatch::NeedsInput(job) => {
                self.prompt.open(
                    &format!("Input for {}", action.name),
                    "Text to process",
                    "",
                    PromptPurpose::ManualInput(job),
                );
            }
            Dispatch::Disabled => self.info(format!("'{}' is disabled", action.name)),
            Dispatch::Unsupported => self.set_error(format!("'{}' has an unsupported type", action.name)),
            Dispatch::Blocked(msg) => self.set_error(msg),
        }
    }

    /// Hide our windows and hand `job` to the paste-back queue.
    pub(crate) fn run_job(&mut self, job: Job) {
        self.panel_open = false;
        if matches!(job, Job::Snippet(_)) {
            self.reopen_quick_send = self.quick_send_open;
        }
        self.quick_send_open = false;
        self.queue.enqueue(job, Instant::now());
    }

    pub(crate) fn open_quick_send(&mut self, file: Option<String>) {
        self.quick_send.reload();
        self.quick_send_view.open(file, &self.quick_send);
        self.quick_send_open = true;
    }

    fn close_quick_send(&mut self) {
        let saved = self.quick_send.save_all();
        tracing::debug!("quick send closed, saved {saved} file(s)");
        self.quick_send_open = false;
    }

    pub fn save_now(&mut self) {
        self.autosave.flush();
        match self.store.save(true) {
            Ok(_) => self.info("Configuration saved"),
            Err(e) => self.set_error(format!("Failed to save configuration: {e:#}")),
        }
    }

    pub fn reload_config(&mut self) {
        match self.store.reload() {
            Ok(()) => {
                self.autosave.flush();
                self.panel_stack = vec![PanelPath::root()];
                self.refresh_hotkeys();
                self.info("Configuration reloaded");
            }
            Err(e) => self.set_error(format!("Failed to reload configuration: {e:#}")),
        }
    }

    pub(crate) fn load_backup(&mut self, name: &str) {
        match self.store.load_backup(name) {
            Ok(()) => {
                self.autosave.flush();
                self.panel_stack = vec![PanelPath::root()];
                self.refresh_hotkeys();
                self.info(format!("Loaded backup {name}"));
            }
            Err(e) => self.set_error(format!("Failed to load backup: {e:#}")),
        }
    }

    /// Texture for an SVG icon at `size` pixels, rendered on first use.
    pub(crate) fn icon_texture(
        &mut self,
        ctx: &egui::Context,
        name: &str,
        size: u32,
    ) -> Option<egui::TextureId> {
        if name.trim().is_empty() {
            return None;
        }
        let key = format!("{name}_{size}x{size}");
        if let Some(tex) = self.textures.get(&key) {
            return Some(tex.id());
        }
        let icon = self.icons.get(name, size)?;
        let image = egui::ColorImage::from_rgba_premultiplied(
            [icon.width as usize, icon.height as usize],
            &icon.rgba,
        );
        let tex = ctx.load_texture(key.clone(), image, egui::TextureOptions::LINEAR);
        let id = tex.id();
        self.textures.insert(key, tex);
        Some(id)
    }

    fn poll_background(&mut self, ctx: &egui::Context, now: Instant) {
        if now.duration_since(self.last_fg_poll) >= foreground::POLL_INTERVAL {
            self.desktop.foreground.poll();
            self.last_fg_poll = now;
        }

        for target in self.hotkeys.take_events() {
            match target {
                HotkeyTarget::TogglePanel => self.toggle_panel(),
                HotkeyTarget::Action(id) => {
                    match action_tree::find_by_id(self.store.actions(), &id) {
                        Some((path, idx)) => self.activate(&path, idx),
                        None => tracing::warn!("hotkey for unknown action {id}"),
                    }
                }
            }
        }

        let events = self.queue.poll(now, &mut self.desktop);
        for ev in events {
            match ev {
                ExecEvent::Done(what) => tracing::debug!("done: {what}"),
                ExecEvent::ShowResult { title, text } => self.result_window.open(&title, &text),
                ExecEvent::Failed(msg) => self.set_error(msg),
            }
        }
        if self.reopen_quick_send && self.queue.is_empty() {
            self.reopen_quick_send = false;
            self.quick_send_open = true;
        }

        if self.autosave.due(now) {
            if let Err(e) = self.store.save(false) {
                self.set_error(format!("Autosave failed: {e:#}"));
            }
        }

        if let Some((_, t)) = &self.error {
            if t.elapsed().as_secs_f64() >= TOAST_SECS {
                self.error = None;
            }
        }

        let mut wait = IDLE_REPAINT;
        for deadline in [self.queue.next_deadline(), self.autosave.deadline()]
            .into_iter()
            .flatten()
        {
            wait = wait.min(deadline.saturating_duration_since(now));
        }
        ctx.request_repaint_after(wait);
    }

    fn guard_position(&mut self, ctx: &egui::Context, now: Instant) {
        if now.duration_since(self.last_guard) < floating::GUARD_INTERVAL || self.drag.is_dragging()
        {
            return;
        }
        self.last_guard = now;
        if let (Some(rect), Some(screen)) = (self.button_rect, self.screen) {
            let pos = floating::ensure_in_screen(rect.min, rect.size(), screen);
            if pos != rect.min {
                ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(pos));
            }
        }
    }

    fn about_ui(&mut self, ctx: &egui::Context) {
        let close = dialog_viewport(ctx, "about", "About", [320.0, 140.0], |ui| {
            ui.heading(APP_TITLE);
            ui.label("A floating button with a panel of quick actions.");
            ui.label("Custom actions, icons and hotkeys.");
            ui.label(format!("Version {}", env!("CARGO_PKG_VERSION")));
        });
        if close {
            self.about_open = false;
        }
    }
}

impl eframe::App for QuickApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.poll_background(ctx, now);
        self.floating_button_ui(ctx);
        self.guard_position(ctx, now);

        if self.button_menu_open {
            self.button_menu_ui(ctx);
        }
        if self.about_open {
            self.about_ui(ctx);
        }
        if self.panel_open {
            self.panel_ui(ctx);
        }
        if self.quick_send_open {
            self.quick_send_ui(ctx);
        }

        let mut prompt = std::mem::take(&mut self.prompt);
        prompt.ui(ctx, self);
        self.prompt = prompt;

        let mut edit = std::mem::take(&mut self.edit_dialog);
        edit.ui(ctx, self);
        self.edit_dialog = edit;

        let mut io = std::mem::take(&mut self.io_dialog);
        io.ui(ctx, self);
        self.io_dialog = io;

        let mut picker = std::mem::take(&mut self.icon_picker);
        picker.ui(ctx, self);
        self.icon_picker = picker;

        let mut backups = std::mem::take(&mut self.backup_dialog);
        backups.ui(ctx, self);
        self.backup_dialog = backups;

        let mut result = std::mem::take(&mut self.result_window);
        result.ui(ctx);
        self.result_window = result;
    }

    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        [0.0, 0.0, 0.0, 0.0]
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.autosave.flush();
        if let Err(e) = self.store.save(true) {
            tracing::error!("failed to save config on exit: {e:#}");
        }
        self.quick_send.save_all();
        tracing::info!("exiting");
    }
}
