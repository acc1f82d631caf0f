use std::path::{Path, PathBuf};

/// Environment variable overriding the base directory.
pub const HOME_ENV: &str = "QUICK_PANEL_HOME";

pub const CONFIG_FILE: &str = "config.json";
pub const BACKUP_DIR: &str = "config_backups";
pub const SCRIPT_DIR: &str = "input_output_actions";
pub const QUICK_SEND_DIR: &str = "quick_send";
pub const SVG_DIR: &str = "svg";
pub const LOG_DIR: &str = "logs";
pub const LOG_FILE: &str = "quick_panel.log";

/// Every location the application reads or writes, derived from one base
/// directory.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub base: PathBuf,
    pub config_file: PathBuf,
    pub backup_dir: PathBuf,
    pub script_dir: PathBuf,
    pub quick_send_dir: PathBuf,
    pub svg_dir: PathBuf,
    pub log_file: PathBuf,
}

impl AppPaths {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            config_file: base.join(CONFIG_FILE),
            backup_dir: base.join(BACKUP_DIR),
            script_dir: base.join(SCRIPT_DIR),
            quick_send_dir: base.join(QUICK_SEND_DIR),
            svg_dir: base.join(SVG_DIR),
            log_file: base.join(LOG_DIR).join(LOG_FILE),
            base,
        }
    }

    /// `$QUICK_PANEL_HOME` when set, otherwise the working directory.
    pub fn from_env() -> Self {
        let base = std::env::var_os(HOME_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        Self::new(base)
    }

    pub fn ensure_dirs(&self) -> anyhow::Result<()> {
        for dir in [
            &self.base,
            &self.backup_dir,
            &self.script_dir,
            &self.quick_send_dir,
            &self.svg_dir,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        if let Some(parent) = self.log_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}
