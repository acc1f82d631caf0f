use crate::actions::{Action, ActionKind};
use crate::paths::AppPaths;
use crate::settings::Config;
use anyhow::Context;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const BACKUP_PREFIX: &str = "config_backup_";

#[derive(Debug, Clone, PartialEq)]
pub struct BackupFile {
    pub name: String,
    pub size_kb: f64,
    pub modified: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackupInfo {
    pub dir: PathBuf,
    pub total_files: usize,
    pub total_size_mb: f64,
    pub max_size_mb: u64,
    pub files: Vec<BackupFile>,
}

/// Owns the loaded [`Config`] and everything written next to it: the config
/// file itself, its rolling backups and the input/output scripts.
pub struct ConfigStore {
    paths: AppPaths,
    config: Config,
    /// Canonical form of what is on disk.
    snapshot: String,
    modified: bool,
    max_backup_bytes: u64,
}

impl ConfigStore {
    pub fn open(paths: AppPaths) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&paths.backup_dir)
            .with_context(|| format!("create {}", paths.backup_dir.display()))?;
        std::fs::create_dir_all(&paths.script_dir)
            .with_context(|| format!("create {}", paths.script_dir.display()))?;

        let exists = paths.config_file.exists();
        let config = if exists {
            match std::fs::read_to_string(&paths.config_file)
                .map_err(anyhow::Error::from)
                .and_then(|c| Config::from_json(&c))
            {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::error!(
                        "failed to load {}: {e}; using defaults",
                        paths.config_file.display()
                    );
                    Config::default()
                }
            }
        } else {
            Config::default()
        };

        let snapshot = config.canonical()?;
        let max_backup_bytes = config.backups.max_size_mb.max(1) * 1024 * 1024;
        let mut store = Self {
            paths,
            config,
            snapshot,
            modified: false,
            max_backup_bytes,
        };
        if !exists {
            store.save(true)?;
            tracing::info!("created default config at {}", store.paths.config_file.display());
        }
        Ok(store)
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Mutable access; the store is marked modified.
    pub fn config_mut(&mut self) -> &mut Config {
        self.modified = true;
        &mut self.config
    }

    pub fn actions(&self) -> &[Action] {
        &self.config.actions
    }

    pub fn actions_mut(&mut self) -> &mut Vec<Action> {
        self.modified = true;
        &mut self.config.actions
    }

    pub fn replace_actions(&mut self, actions: Vec<Action>) {
        self.config.actions = actions;
        self.modified = true;
    }

    pub fn mark_modified(&mut self) {
        self.modified = true;
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Write the config to disk.
    ///
    /// Without `force` nothing happens unless the config was marked modified
    /// and its content differs from what was last saved. Returns whether the
    /// file was written.
    pub fn save(&mut self, force: bool) -> anyhow::Result<bool> {
        let current = self.config.canonical()?;
        if !force && (!self.modified || current == self.snapshot) {
            tracing::debug!("config unchanged, skipping save");
            self.modified = false;
            return Ok(false);
        }

        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if self.paths.config_file.exists() && current != self.snapshot {
            if let Err(e) = self.create_backup() {
                tracing::warn!("failed to back up config: {e}");
            }
        }

        let json = self.config.to_pretty_json()?;
        std::fs::write(&self.paths.config_file, json)
            .with_context(|| format!("write {}", self.paths.config_file.display()))?;
        self.snapshot = current;
        self.modified = false;
        tracing::info!("config saved to {}", self.paths.config_file.display());
        Ok(true)
    }

    /// Look up a value by dotted path, e.g. `action_panel.columns`.
    pub fn get_value(&self, path: &str) -> Option<Value> {
        let root = serde_json::to_value(&self.config).ok()?;
        let mut current = &root;
        for key in path.split('.') {
            current = current.as_object()?.get(key)?;
        }
        Some(current.clone())
    }

    /// Set a value by dotted path, creating intermediate objects.
    pub fn set_value(&mut self, path: &str, value: Value) -> anyhow::Result<()> {
        let mut root = serde_json::to_value(&self.config)?;
        let keys: Vec<&str> = path.split('.').filter(|k| !k.is_empty()).collect();
        let Some((last, parents)) = keys.split_last() else {
            anyhow::bail!("empty config key");
        };
        let mut current = &mut root;
        for key in parents {
            let obj = current
                .as_object_mut()
                .ok_or_else(|| anyhow::anyhow!("'{key}' is not inside an object"))?;
            current = obj
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Default::default()));
            if !current.is_object() {
                *current = Value::Object(Default::default());
            }
        }
        current
            .as_object_mut()
            .ok_or_else(|| anyhow::anyhow!("cannot set '{path}'"))?
            .insert(last.to_string(), value);
        self.config = serde_json::from_value(root)
            .with_context(|| format!("invalid value for '{path}'"))?;
        self.modified = true;
        Ok(())
    }

    fn create_backup(&self) -> anyhow::Result<PathBuf> {
        std::fs::create_dir_all(&self.paths.backup_dir)?;
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let mut path = self.paths.backup_dir.join(format!("{BACKUP_PREFIX}{stamp}.json"));
        let mut n = 1;
        while path.exists() {
            path = self
                .paths
                .backup_dir
                .join(format!("{BACKUP_PREFIX}{stamp}_{n}.json"));
            n += 1;
        }
        std::fs::copy(&self.paths.config_file, &path)
            .with_context(|| format!("copy config to {}", path.display()))?;
        tracing::info!("config backed up to {}", path.display());
        self.cleanup_old_backups();
        Ok(path)
    }

    /// Backup files, oldest first.
    pub fn backup_files(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(&self.paths.backup_dir) else {
            return Vec::new();
        };
        let mut files: Vec<(SystemTime, PathBuf)> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with(BACKUP_PREFIX) && n.ends_with(".json"))
                    .unwrap_or(false)
            })
            .map(|p| {
                let mtime = std::fs::metadata(&p)
                    .and_then(|m| m.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                (mtime, p)
            })
            .collect();
        files.sort();
        files.into_iter().map(|(_, p)| p).collect()
    }

    /// Total size of all backups in bytes.
    pub fn backup_size(&self) -> u64 {
        self.backup_files()
            .iter()
            .filter_map(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .sum()
    }

    /// Delete the oldest backups until the total fits the limit.
    pub fn cleanup_old_backups(&self) -> usize {
        let mut removed = 0;
        let mut files = self.backup_files();
        let mut total = self.backup_size();
        while total > self.max_backup_bytes && !files.is_empty() {
            let oldest = files.remove(0);
            let len = std::fs::metadata(&oldest).map(|m| m.len()).unwrap_or(0);
            match std::fs::remove_file(&oldest) {
                Ok(()) => {
                    tracing::info!("removed old backup {}", oldest.display());
                    total = total.saturating_sub(len);
                    removed += 1;
                }
                Err(e) => {
                    tracing::warn!("failed to remove backup {}: {e}", oldest.display());
                    break;
                }
            }
        }
        removed
    }

    pub fn backup_limit_mb(&self) -> u64 {
        self.max_backup_bytes / (1024 * 1024)
    }

    /// Change the backup size limit and enforce it straight away.
    pub fn set_backup_limit(&mut self, mb: u64) -> anyhow::Result<usize> {
        if mb == 0 {
            anyhow::bail!("backup limit must be at least 1 MB");
        }
        self.max_backup_bytes = mb * 1024 * 1024;
        if self.config.backups.max_size_mb != mb {
            self.config.backups.max_size_mb = mb;
            self.modified = true;
        }
        Ok(self.cleanup_old_backups())
    }

    pub fn manual_cleanup_backups(&self) -> usize {
        let removed = self.cleanup_old_backups();
        tracing::info!("manual backup cleanup removed {removed} file(s)");
        removed
    }

    pub fn backup_info(&self) -> BackupInfo {
        let files: Vec<BackupFile> = self
            .backup_files()
            .iter()
            .filter_map(|p| {
                let meta = std::fs::metadata(p).ok()?;
                let modified = meta
                    .modified()
                    .map(|t| {
                        chrono::DateTime::<chrono::Local>::from(t)
                            .format("%Y-%m-%d %H:%M:%S")
                            .to_string()
                    })
                    .unwrap_or_default();
                Some(BackupFile {
                    name: p.file_name()?.to_string_lossy().into_owned(),
                    size_kb: meta.len() as f64 / 1024.0,
                    modified,
                })
            })
            .collect();
        BackupInfo {
            dir: self.paths.backup_dir.clone(),
            total_files: files.len(),
            total_size_mb: self.backup_size() as f64 / (1024.0 * 1024.0),
            max_size_mb: self.backup_limit_mb(),
            files,
        }
    }

    /// Replace the current config with the backup `name`.
    ///
    /// `name` must be one of the files listed by [`Self::backup_files`]. The
    /// current config, unsaved edits included, is backed up once first, so
    /// loading a backup can itself be undone.
    pub fn load_backup(&mut self, name: &str) -> anyhow::Result<()> {
        if name.contains(|c| c == '/' || c == '\\') || name.contains("..") {
            anyhow::bail!("invalid backup name {name}");
        }
        let path = self
            .backup_files()
            .into_iter()
            .find(|p| p.file_name().and_then(|n| n.to_str()) == Some(name))
            .ok_or_else(|| anyhow::anyhow!("backup {name} does not exist"))?;
        let content =
            std::fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        let value: Value =
            serde_json::from_str(&content).with_context(|| format!("parse {name}"))?;
        if !value.is_object() {
            anyhow::bail!("backup {name} is not a config object");
        }
        let restored: Config = serde_json::from_value(value)?;

        let current = self.config.to_pretty_json()?;
        std::fs::write(&self.paths.config_file, current)
            .with_context(|| format!("write {}", self.paths.config_file.display()))?;
        self.create_backup()?;

        self.config = restored;
        self.snapshot = self.config.canonical()?;
        self.max_backup_bytes = self.config.backups.max_size_mb.max(1) * 1024 * 1024;
        self.save(true)?;
        tracing::info!("config restored from {name}");
        Ok(())
    }

    /// Re-read `config.json`, discarding unsaved changes.
    pub fn reload(&mut self) -> anyhow::Result<()> {
        let content = std::fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("read {}", self.paths.config_file.display()))?;
        self.config = Config::from_json(&content)?;
        self.snapshot = self.config.canonical()?;
        self.modified = false;
        Ok(())
    }

    pub fn create_script(&self, name: &str, id: &str, content: &str) -> anyhow::Result<String> {
        let short: String = id.chars().take(8).collect();
        let file = format!("{}_{short}.py", clean_filename(name));
        let path = self.script_path(&file);
        std::fs::write(&path, content).with_context(|| format!("write {}", path.display()))?;
        tracing::info!("script created: {}", path.display());
        Ok(file)
    }

    pub fn script_path(&self, file: &str) -> PathBuf {
        self.paths.script_dir.join(file)
    }

    pub fn read_script(&self, file: &str) -> anyhow::Result<String> {
        let path = self.script_path(file);
        std::fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))
    }

    pub fn write_script(&self, file: &str, content: &str) -> anyhow::Result<()> {
        let path = self.script_path(file);
        std::fs::write(&path, content).with_context(|| format!("write {}", path.display()))
    }

    pub fn delete_script(&self, file: &str) -> anyhow::Result<bool> {
        let path = self.script_path(file);
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&path).with_context(|| format!("delete {}", path.display()))?;
        tracing::info!("script deleted: {}", path.display());
        Ok(true)
    }

    pub fn list_scripts(&self) -> Vec<String> {
        let mut out: Vec<String> = std::fs::read_dir(&self.paths.script_dir)
            .into_iter()
            .flatten()
            .flatten()
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .filter(|n| is_script_name(n))
            .collect();
        out.sort();
        out
    }

    pub fn svg_icons(&self) -> Vec<String> {
        list_svg_stems(&self.paths.svg_dir)
    }

    pub fn create_action(&self, name: &str, kind: ActionKind) -> Action {
        Action::new(name, kind)
    }
}

fn is_script_name(name: &str) -> bool {
    let Some(stem) = name.strip_suffix(".py") else {
        return false;
    };
    if stem.starts_with("io_action_") {
        return true;
    }
    match stem.rsplit_once('_') {
        Some((_, id)) => {
            id.len() == 8 && id.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        }
        None => false,
    }
}

pub(crate) fn list_svg_stems(dir: &Path) -> Vec<String> {
    let mut out: Vec<String> = std::fs::read_dir(dir)
        .into_iter()
        .flatten()
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.extension()
                .map(|e| e.eq_ignore_ascii_case("svg"))
                .unwrap_or(false)
        })
        .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
        .collect();
    out.sort();
    out
}

/// File-system safe version of an action name, at most 15 characters.
pub fn clean_filename(name: &str) -> String {
    let mut out = String::new();
    for ch in name.chars() {
        let bad = ch.is_whitespace() || matches!(ch, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*');
        let ch = if bad { '_' } else { ch };
        if ch == '_' && out.ends_with('_') {
            continue;
        }
        out.push(ch);
    }
    let trimmed: String = out.trim_matches('_').chars().take(15).collect();
    if trimmed.is_empty() {
        "action".into()
    } else {
        trimmed
    }
}
