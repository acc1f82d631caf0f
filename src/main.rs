#![cfg_attr(feature = "windows_gui", windows_subsystem = "windows")]

use quick_panel::config_store::ConfigStore;
use quick_panel::gui::{QuickApp, APP_TITLE};
use quick_panel::hotkey::{HotkeyBindings, HotkeyManager};
use quick_panel::logging;
use quick_panel::paths::AppPaths;
use quick_panel::quick_send::QuickSendStore;

use eframe::egui;

fn main() -> anyhow::Result<()> {
    let paths = AppPaths::from_env();
    paths.ensure_dirs()?;
    let _log_guard = logging::init(
        logging::debug_flag(&paths.config_file),
        Some(paths.log_file.clone()),
    );
    tracing::info!("starting in {}", paths.base.display());
    let store = ConfigStore::open(paths.clone())?;

    let quick_send = QuickSendStore::open(&paths.quick_send_dir)?;
    let hotkeys = HotkeyManager::new(HotkeyBindings::from_config(store.config()));

    let size = store.config().floating_button.size as f32;
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(APP_TITLE)
            .with_inner_size([size, size])
            .with_decorations(false)
            .with_transparent(true)
            .with_resizable(false)
            .with_always_on_top(),
        ..Default::default()
    };

    let app = QuickApp::new(store, quick_send, hotkeys);
    eframe::run_native(
        APP_TITLE,
        native_options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::light());
            Box::new(app)
        }),
    )
    .map_err(|e| anyhow::anyhow!("failed to run the UI: {e}"))?;
    Ok(())
}
