use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// One sendable snippet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuickSendItem {
    /// Content that gets sent.
    #[serde(default)]
    pub key: String,
    /// Button caption.
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    /// Fields written by other tools, saved back as they were.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QuickSendItem {
    pub fn new(key: &str, text: &str) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
            tooltip: None,
            extra: Map::new(),
        }
    }

    fn matches(&self, needle: &str) -> bool {
        self.key.to_lowercase().contains(needle)
            || self.text.to_lowercase().contains(needle)
            || self
                .tooltip
                .as_deref()
                .map(|t| t.to_lowercase().contains(needle))
                .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    File(String),
}

/// Position of an item in its file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRef {
    pub file: String,
    pub index: usize,
}

pub const DEFAULT_CAPTION: &str = "Send";

/// The snippet files under `quick_send/`, each a JSON list of items.
///
/// A file that cannot be parsed is listed as unreadable and never written,
/// so fixing it by hand loses nothing.
pub struct QuickSendStore {
    dir: PathBuf,
    files: Vec<String>,
    data: HashMap<String, Vec<QuickSendItem>>,
    unreadable: BTreeSet<String>,
}

impl QuickSendStore {
    pub fn open(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        let mut store = Self {
            dir,
            files: Vec::new(),
            data: HashMap::new(),
            unreadable: BTreeSet::new(),
        };
        if store.scan_files().is_empty() {
            store.create_samples()?;
        }
        store.reload();
        Ok(store)
    }

    fn scan_files(&self) -> Vec<String> {
        let mut files: Vec<String> = std::fs::read_dir(&self.dir)
            .into_iter()
            .flatten()
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().map(|e| e == "json").unwrap_or(false))
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        files.sort();
        files
    }

    fn create_samples(&self) -> anyhow::Result<()> {
        let contacts = vec![
            QuickSendItem::new("support@example.com", "Support mail"),
            QuickSendItem::new("+1 555 0100", "Office phone"),
            QuickSendItem::new("221B Baker Street, London", "Address"),
        ];
        let replies = vec![
            QuickSendItem::new("Thanks, I'll get back to you shortly.", "Thanks"),
            QuickSendItem::new("Best regards", "Sign-off"),
        ];
        write_items(&self.dir.join("contacts.json"), &contacts)?;
        write_items(&self.dir.join("replies.json"), &replies)?;
        tracing::info!("created sample quick send files in {}", self.dir.display());
        Ok(())
    }

    /// Re-read every file from disk.
    pub fn reload(&mut self) {
        let scanned = self.scan_files();
        self.data.clear();
        self.unreadable.clear();
        self.files.clear();
        for name in scanned {
            let path = self.file_path(&name);
            match std::fs::read_to_string(&path)
                .map_err(anyhow::Error::from)
                .and_then(|c| Ok(serde_json::from_str::<Vec<QuickSendItem>>(&c)?))
            {
                Ok(items) => {
                    self.data.insert(name.clone(), items);
                    self.files.push(name);
                }
                Err(e) => {
                    tracing::warn!("failed to load {}, leaving it untouched: {e}", path.display());
                    self.unreadable.insert(name);
                }
            }
        }
    }

    /// Files on disk that could not be parsed.
    pub fn unreadable(&self) -> impl Iterator<Item = &str> {
        self.unreadable.iter().map(String::as_str)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn has_file(&self, name: &str) -> bool {
        self.data.contains_key(name)
    }

    pub fn file_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Items of the selection, tagged with where they live.
    pub fn items(&self, selection: &Selection) -> Vec<(ItemRef, &QuickSendItem)> {
        let names: Vec<&String> = match selection {
            Selection::All => self.files.iter().collect(),
            Selection::File(name) => self.files.iter().filter(|f| *f == name).collect(),
        };
        names
            .into_iter()
            .flat_map(|name| {
                self.data
                    .get(name)
                    .into_iter()
                    .flatten()
                    .enumerate()
                    .map(move |(index, item)| {
                        (
                            ItemRef {
                                file: name.clone(),
                                index,
                            },
                            item,
                        )
                    })
            })
            .collect()
    }

    /// Case-insensitive search on content, caption and tooltip.
    pub fn filter(&self, selection: &Selection, query: &str) -> Vec<(ItemRef, &QuickSendItem)> {
        let needle = query.trim().to_lowercase();
        let items = self.items(selection);
        if needle.is_empty() {
            return items;
        }
        items
            .into_iter()
            .filter(|(_, item)| item.matches(&needle))
            .collect()
    }

    /// Append `content` and save the file it went into.
    ///
    /// `target` wins when it names an existing file; otherwise the selected
    /// file is used, or the first file when everything is shown.
    pub fn add_item(
        &mut self,
        target: Option<&str>,
        selection: &Selection,
        content: &str,
    ) -> anyhow::Result<String> {
        let content = content.trim();
        if content.is_empty() {
            anyhow::bail!("content must not be empty");
        }
        let file = match (target, selection) {
            (Some(t), _) if self.has_file(t) => t.to_string(),
            (_, Selection::File(name)) if self.has_file(name) => name.clone(),
            (_, Selection::All) => self
                .files
                .first()
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no quick send files"))?,
            (_, Selection::File(name)) => anyhow::bail!("unknown file '{name}'"),
        };
        if let Some(items) = self.data.get_mut(&file) {
            items.push(QuickSendItem::new(content, DEFAULT_CAPTION));
        }
        self.save(&file)?;
        Ok(file)
    }

    /// Replace the content that gets sent.
    pub fn edit_content(&mut self, file: &str, index: usize, content: &str) -> anyhow::Result<()> {
        let content = content.trim();
        if content.is_empty() {
            anyhow::bail!("content must not be empty");
        }
        let item = self
            .data
            .get_mut(file)
            .and_then(|items| items.get_mut(index))
            .ok_or_else(|| anyhow::anyhow!("no item {index} in '{file}'"))?;
        item.key = content.to_string();
        self.save(file)
    }

    /// Change caption and tooltip. An empty tooltip removes it.
    pub fn edit_item(
        &mut self,
        file: &str,
        index: usize,
        caption: &str,
        tooltip: &str,
    ) -> anyhow::Result<()> {
        let caption = caption.trim();
        if caption.is_empty() {
            anyhow::bail!("caption must not be empty");
        }
        let item = self
            .data
            .get_mut(file)
            .and_then(|items| items.get_mut(index))
            .ok_or_else(|| anyhow::anyhow!("no item {index} in '{file}'"))?;
        item.text = caption.to_string();
        let tooltip = tooltip.trim();
        item.tooltip = (!tooltip.is_empty()).then(|| tooltip.to_string());
        self.save(file)
    }

    pub fn delete_item(&mut self, file: &str, index: usize) -> anyhow::Result<QuickSendItem> {
        let items = self
            .data
            .get_mut(file)
            .ok_or_else(|| anyhow::anyhow!("unknown file '{file}'"))?;
        if index >= items.len() {
            anyhow::bail!("no item {index} in '{file}'");
        }
        let removed = items.remove(index);
        self.save(file)?;
        Ok(removed)
    }

    /// Move an item within its file.
    pub fn move_item(&mut self, file: &str, from: usize, to: usize) -> anyhow::Result<bool> {
        let items = self
            .data
            .get_mut(file)
            .ok_or_else(|| anyhow::anyhow!("unknown file '{file}'"))?;
        if from == to || from >= items.len() || to >= items.len() {
            return Ok(false);
        }
        let item = items.remove(from);
        items.insert(to, item);
        self.save(file)?;
        Ok(true)
    }

    pub fn create_file(&mut self, name: &str) -> anyhow::Result<()> {
        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("file name must not be empty");
        }
        if self.has_file(name) || self.unreadable.contains(name) {
            anyhow::bail!("file '{name}' already exists");
        }
        write_items(&self.file_path(name), &[])?;
        self.files.push(name.to_string());
        self.files.sort();
        self.data.insert(name.to_string(), Vec::new());
        tracing::info!("created quick send file {name}.json");
        Ok(())
    }

    pub fn save(&self, file: &str) -> anyhow::Result<()> {
        if self.unreadable.contains(file) {
            anyhow::bail!("'{file}' could not be read and is left as it is");
        }
        let items = self
            .data
            .get(file)
            .ok_or_else(|| anyhow::anyhow!("unknown file '{file}'"))?;
        write_items(&self.file_path(file), items)
    }

    /// Save every loaded file, returning how many were written. Unreadable
    /// files are skipped.
    pub fn save_all(&self) -> usize {
        self.files
            .iter()
            .filter(|f| match self.save(f) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("failed to save quick send file {f}: {e}");
                    false
                }
            })
            .count()
    }

    /// Create an empty file for a new quick send action and return its stem.
    pub fn create_for_action(&mut self, display_name: &str) -> anyhow::Result<String> {
        let stem = unique_filename(&self.dir, display_name);
        self.create_file(&stem)?;
        Ok(stem)
    }
}

fn write_items(path: &Path, items: &[QuickSendItem]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(items)?;
    std::fs::write(path, json).with_context(|| format!("write {}", path.display()))
}

static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w-]").expect("valid regex"));

/// A file stem derived from `display_name` that is not yet taken in `dir`.
pub fn unique_filename(dir: &Path, display_name: &str) -> String {
    let cleaned = UNSAFE_CHARS
        .replace_all(display_name.trim(), "_")
        .trim_matches('_')
        .to_string();
    let base = if cleaned.is_empty() {
        format!(
            "quick_send_{}",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        )
    } else {
        cleaned
    };
    let mut candidate = base.clone();
    let mut n = 1;
    while dir.join(format!("{candidate}.json")).exists() {
        candidate = format!("{base}_{n}");
        n += 1;
    }
    candidate
}
