//! Operations on the nested action tree.
//!
//! The tree is the root `Vec<Action>` of the config. Panel actions own child
//! lists and are addressed by a [`PanelPath`] of indices from the root.

use crate::actions::{new_id, Action};
use eframe::egui::{Pos2, Vec2};
use std::fmt;

/// Number of panel levels, including the root.
pub const MAX_PANEL_DEPTH: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PanelPath(pub Vec<usize>);

impl PanelPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Level of the panel; the root is level 0.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn parent(&self) -> Option<PanelPath> {
        if self.0.is_empty() {
            None
        } else {
            Some(PanelPath(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Path of the sub-panel at `idx` of this panel, without validation.
    pub fn child(&self, idx: usize) -> PanelPath {
        let mut v = self.0.clone();
        v.push(idx);
        PanelPath(v)
    }
}

impl fmt::Display for PanelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "root");
        }
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        write!(f, "root/{}", parts.join("/"))
    }
}

pub fn panel<'a>(root: &'a [Action], path: &PanelPath) -> Option<&'a [Action]> {
    let mut current = root;
    for &idx in &path.0 {
        current = current.get(idx)?.children()?.as_slice();
    }
    Some(current)
}

pub fn panel_mut<'a>(root: &'a mut Vec<Action>, path: &PanelPath) -> Option<&'a mut Vec<Action>> {
    let mut current = root;
    for &idx in &path.0 {
        current = current.get_mut(idx)?.children_mut()?;
    }
    Some(current)
}

/// Locate an action anywhere in the tree.
pub fn find_by_id(root: &[Action], id: &str) -> Option<(PanelPath, usize)> {
    fn walk(list: &[Action], id: &str, path: &PanelPath) -> Option<(PanelPath, usize)> {
        for (i, a) in list.iter().enumerate() {
            if a.id == id {
                return Some((path.clone(), i));
            }
            if let Some(children) = a.children() {
                if let Some(found) = walk(children, id, &path.child(i)) {
                    return Some(found);
                }
            }
        }
        None
    }
    walk(root, id, &PanelPath::root())
}

pub fn get<'a>(root: &'a [Action], path: &PanelPath, idx: usize) -> Option<&'a Action> {
    panel(root, path)?.get(idx)
}

/// The action with `id`, wherever it sits now.
pub fn get_by_id_mut<'a>(root: &'a mut Vec<Action>, id: &str) -> Option<&'a mut Action> {
    let (path, idx) = find_by_id(root, id)?;
    panel_mut(root, &path)?.get_mut(idx)
}

/// Id of the panel action that owns the list at `path`. `None` for the root.
pub fn panel_id<'a>(root: &'a [Action], path: &PanelPath) -> Option<&'a str> {
    let (&idx, parent) = path.0.split_last()?;
    let owner = get(root, &PanelPath(parent.to_vec()), idx)?;
    Some(owner.id.as_str())
}

pub fn add(root: &mut Vec<Action>, path: &PanelPath, action: Action) -> anyhow::Result<usize> {
    let list = panel_mut(root, path).ok_or_else(|| anyhow::anyhow!("no panel at {path}"))?;
    list.push(action);
    Ok(list.len() - 1)
}

pub fn remove(root: &mut Vec<Action>, path: &PanelPath, idx: usize) -> anyhow::Result<Action> {
    let list = panel_mut(root, path).ok_or_else(|| anyhow::anyhow!("no panel at {path}"))?;
    if idx >= list.len() {
        anyhow::bail!("index {idx} out of range in {path}");
    }
    Ok(list.remove(idx))
}

pub fn replace(
    root: &mut Vec<Action>,
    path: &PanelPath,
    idx: usize,
    action: Action,
) -> anyhow::Result<()> {
    let list = panel_mut(root, path).ok_or_else(|| anyhow::anyhow!("no panel at {path}"))?;
    let slot = list
        .get_mut(idx)
        .ok_or_else(|| anyhow::anyhow!("index {idx} out of range in {path}"))?;
    *slot = action;
    Ok(())
}

/// Write back an edited copy of the action with the same id.
///
/// A sub-panel keeps the children it has in the tree now, so changes made
/// to them while the copy was out are not undone.
pub fn replace_by_id(root: &mut Vec<Action>, mut action: Action) -> anyhow::Result<()> {
    let slot = get_by_id_mut(root, &action.id)
        .ok_or_else(|| anyhow::anyhow!("action '{}' no longer exists", action.name))?;
    if let (Some(live), Some(children)) = (slot.children_mut(), action.children_mut()) {
        *children = std::mem::take(live);
    }
    *slot = action;
    Ok(())
}

/// Drag-and-drop reorder: the dragged item and the drop target trade places.
pub fn move_action(root: &mut Vec<Action>, path: &PanelPath, from: usize, to: usize) -> bool {
    let Some(list) = panel_mut(root, path) else {
        return false;
    };
    if from == to || from >= list.len() || to >= list.len() {
        return false;
    }
    list.swap(from, to);
    true
}

/// Path of the sub-panel held by the item at `idx`.
pub fn child_path(root: &[Action], path: &PanelPath, idx: usize) -> anyhow::Result<PanelPath> {
    let action = get(root, path, idx)
        .ok_or_else(|| anyhow::anyhow!("index {idx} out of range in {path}"))?;
    if !action.is_panel() {
        anyhow::bail!("'{}' is not a panel", action.name);
    }
    if path.depth() + 1 >= MAX_PANEL_DEPTH {
        anyhow::bail!("maximum panel depth of {MAX_PANEL_DEPTH} reached");
    }
    Ok(path.child(idx))
}

/// `(hotkey, action id)` of every enabled action with a hotkey.
pub fn collect_hotkeys(root: &[Action]) -> Vec<(String, String)> {
    let mut out = Vec::new();
    fn walk(list: &[Action], out: &mut Vec<(String, String)>) {
        for a in list {
            if a.enabled && !a.hotkey.trim().is_empty() {
                out.push((a.hotkey.trim().to_string(), a.id.clone()));
            }
            if let Some(children) = a.children() {
                walk(children, out);
            }
        }
    }
    walk(root, &mut out);
    out
}

pub fn regenerate_ids(action: &mut Action) {
    action.id = new_id();
    if let Some(children) = action.children_mut() {
        for child in children {
            regenerate_ids(child);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipMode {
    Copy,
    Cut,
}

#[derive(Debug, Clone)]
struct ClipEntry {
    action: Action,
    /// Id of the panel action the entry came from, `None` for the root.
    source: Option<String>,
    mode: ClipMode,
}

/// Copy/cut/paste buffer for actions.
///
/// A cut removes the item from its panel immediately; the caller does the
/// removal and hands the removed action to [`ActionClipboard::cut`].
/// Panels are identified by the id of their owning action (see
/// [`panel_id`]) so reordering the tree does not confuse the source.
#[derive(Debug, Default)]
pub struct ActionClipboard {
    entry: Option<ClipEntry>,
}

impl ActionClipboard {
    pub fn copy(&mut self, source: Option<&str>, action: Action) {
        self.entry = Some(ClipEntry {
            action,
            source: source.map(str::to_string),
            mode: ClipMode::Copy,
        });
    }

    pub fn cut(&mut self, source: Option<&str>, action: Action) {
        self.entry = Some(ClipEntry {
            action,
            source: source.map(str::to_string),
            mode: ClipMode::Cut,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }

    pub fn mode(&self) -> Option<ClipMode> {
        self.entry.as_ref().map(|e| e.mode)
    }

    pub fn describe(&self) -> Option<String> {
        self.entry.as_ref().map(|e| match e.mode {
            ClipMode::Copy => format!("copy: {}", e.action.name),
            ClipMode::Cut => format!("cut: {}", e.action.name),
        })
    }

    /// The action to insert into the panel owned by `target`, with fresh ids.
    pub fn paste_into(&mut self, target: Option<&str>) -> anyhow::Result<Action> {
        let Some(entry) = self.entry.as_ref() else {
            anyhow::bail!("clipboard is empty");
        };
        if entry.mode == ClipMode::Cut && entry.source.as_deref() == target {
            anyhow::bail!("cannot paste a cut action into the panel it came from");
        }
        let mut action = entry.action.clone();
        regenerate_ids(&mut action);
        if entry.mode == ClipMode::Cut {
            self.entry = None;
        }
        Ok(action)
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}

/// Geometry of the action grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub columns: usize,
    pub cell: Vec2,
    pub spacing: f32,
}

impl GridLayout {
    pub fn new(columns: usize, cell: f32, spacing: f32) -> Self {
        Self {
            columns: columns.max(1),
            cell: Vec2::splat(cell),
            spacing,
        }
    }

    pub fn rows(&self, count: usize) -> usize {
        count.div_ceil(self.columns)
    }

    /// Top-left corner of cell `idx`.
    pub fn cell_origin(&self, origin: Pos2, idx: usize) -> Pos2 {
        let row = idx / self.columns;
        let col = idx % self.columns;
        origin
            + Vec2::new(
                col as f32 * (self.cell.x + self.spacing),
                row as f32 * (self.cell.y + self.spacing),
            )
    }

    /// Index of the cell under `pos` among `count` items.
    pub fn index_at(&self, pos: Pos2, origin: Pos2, count: usize) -> Option<usize> {
        if count == 0 {
            return None;
        }
        let rows = self.rows(count);
        let width = self.columns as f32 * (self.cell.x + self.spacing);
        let height = rows as f32 * (self.cell.y + self.spacing);
        let x = (pos.x - origin.x).clamp(0.0, (width - 1.0).max(0.0));
        let y = (pos.y - origin.y).clamp(0.0, (height - 1.0).max(0.0));
        let col = ((x / (self.cell.x + self.spacing)) as usize).min(self.columns - 1);
        let row = ((y / (self.cell.y + self.spacing)) as usize).min(rows - 1);
        Some((row * self.columns + col).min(count - 1))
    }

    /// Empty cells needed to complete the last row.
    pub fn placeholders(&self, count: usize) -> usize {
        let rem = count % self.columns;
        if rem == 0 {
            0
        } else {
            self.columns - rem
        }
    }
}
