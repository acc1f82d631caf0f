use crate::actions::Action;
use crate::hotkey::{parse_hotkey, Hotkey};
use eframe::egui::Color32;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TOGGLE_HOTKEY: &str = "ctrl+alt+q";

/// The whole `config.json` document.
///
/// Every section carries `#[serde(default)]` so a partial file is merged over
/// the defaults. Keys this version does not know about are kept in `extra`
/// and written back unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub floating_button: FloatingButtonConfig,
    pub action_panel: ActionPanelConfig,
    pub action_buttons: ActionButtonsConfig,
    pub hotkeys: HotkeysConfig,
    pub scripts: ScriptsConfig,
    pub backups: BackupConfig,
    /// When enabled the application initialises the logger at debug level.
    pub debug_logging: bool,
    pub actions: Vec<Action>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            floating_button: FloatingButtonConfig::default(),
            action_panel: ActionPanelConfig::default(),
            action_buttons: ActionButtonsConfig::default(),
            hotkeys: HotkeysConfig::default(),
            scripts: ScriptsConfig::default(),
            backups: BackupConfig::default(),
            debug_logging: false,
            actions: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FloatingButtonConfig {
    pub size: u32,
    pub snap_margin: i32,
    pub idle_opacity: f32,
    pub active_opacity: f32,
    pub style: ButtonStyle,
}

impl Default for FloatingButtonConfig {
    fn default() -> Self {
        Self {
            size: 60,
            snap_margin: 10,
            idle_opacity: 0.6,
            active_opacity: 1.0,
            style: ButtonStyle::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ButtonStyle {
    pub background: String,
    pub hover_background: String,
    pub color: String,
    pub font_size: f32,
    pub font_weight: u32,
}

impl Default for ButtonStyle {
    fn default() -> Self {
        Self {
            background: "qlineargradient(x1:0, y1:0, x2:1, y2:1, stop:0 #4f7cff, stop:1 #6ce0ff)"
                .into(),
            hover_background:
                "qlineargradient(x1:0, y1:0, x2:1, y2:1, stop:0 #608cff, stop:1 #7cf0ff)".into(),
            color: "white".into(),
            font_size: 20.0,
            font_weight: 700,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ActionPanelConfig {
    pub width: f32,
    pub height: f32,
    pub columns: usize,
    pub background_color: String,
    /// Quiet period before edits to the action tree are written to disk.
    pub autosave_delay_ms: u64,
}

impl Default for ActionPanelConfig {
    fn default() -> Self {
        Self {
            width: 380.0,
            height: 300.0,
            columns: 4,
            background_color: "rgba(240, 240, 240, 0.95)".into(),
            autosave_delay_ms: 1500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ActionButtonsConfig {
    pub size: f32,
    pub spacing: f32,
    pub style: ActionButtonStyle,
}

impl Default for ActionButtonsConfig {
    fn default() -> Self {
        Self {
            size: 66.0,
            spacing: 10.0,
            style: ActionButtonStyle::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ActionButtonStyle {
    pub background_color: String,
    pub border: String,
    pub border_radius: f32,
    pub font_size: f32,
    pub color: String,
    pub hover_background_color: String,
    pub hover_border_color: String,
    pub pressed_background_color: String,
}

impl Default for ActionButtonStyle {
    fn default() -> Self {
        Self {
            background_color: "#f8fbff".into(),
            border: "1px solid #ddd".into(),
            border_radius: 12.0,
            font_size: 9.0,
            color: "#333".into(),
            hover_background_color: "#e6f0ff".into(),
            hover_border_color: "#4f7cff".into(),
            pressed_background_color: "#e0f0ff".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HotkeysConfig {
    pub toggle_panel: String,
}

impl Default for HotkeysConfig {
    fn default() -> Self {
        Self {
            toggle_panel: DEFAULT_TOGGLE_HOTKEY.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScriptsConfig {
    /// Interpreter used for input/output scripts.
    pub python: String,
    pub timeout_secs: u64,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            python: default_python().into(),
            timeout_secs: 30,
        }
    }
}

fn default_python() -> &'static str {
    if cfg!(target_os = "windows") {
        "python"
    } else {
        "python3"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackupConfig {
    pub max_size_mb: u64,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self { max_size_mb: 20 }
    }
}

impl Config {
    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_pretty_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Serialised form with sorted keys, used to detect real changes.
    pub fn canonical(&self) -> anyhow::Result<String> {
        // serde_json::Value keeps object keys in a BTreeMap, which sorts them.
        let value = serde_json::to_value(self)?;
        Ok(serde_json::to_string(&value)?)
    }

    pub fn toggle_hotkey(&self) -> Hotkey {
        match parse_hotkey(&self.hotkeys.toggle_panel) {
            Some(k) => k,
            None => {
                tracing::warn!(
                    "provided hotkey string '{}' is invalid; using default {}",
                    self.hotkeys.toggle_panel,
                    DEFAULT_TOGGLE_HOTKEY
                );
                parse_hotkey(DEFAULT_TOGGLE_HOTKEY).unwrap_or_default()
            }
        }
    }
}

static HEX_IN_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#[0-9a-fA-F]{3,8}\b").expect("valid regex"));

/// Parse a colour string from the config into an egui colour.
///
/// Gradient definitions are reduced to their first colour stop.
pub fn parse_color(s: &str) -> Option<Color32> {
    let s = s.trim();
    let lower = s.to_ascii_lowercase();
    if lower.starts_with("qlineargradient") || lower.starts_with("qradialgradient") {
        let m = HEX_IN_TEXT.find(s)?;
        return parse_hex(m.as_str());
    }
    if s.starts_with('#') {
        return parse_hex(s);
    }
    if let Some(inner) = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))
        .and_then(|r| r.strip_suffix(')'))
    {
        let parts: Vec<&str> = inner.split(',').map(|p| p.trim()).collect();
        if parts.len() != 3 && parts.len() != 4 {
            return None;
        }
        let r: u8 = parts[0].parse().ok()?;
        let g: u8 = parts[1].parse().ok()?;
        let b: u8 = parts[2].parse().ok()?;
        let a = match parts.get(3) {
            None => 255,
            Some(a) if a.contains('.') => {
                let f: f32 = a.parse().ok()?;
                (f.clamp(0.0, 1.0) * 255.0).round() as u8
            }
            Some(a) => {
                let v: u32 = a.parse().ok()?;
                // A bare "1" or "0" is a CSS-style fraction.
                if v <= 1 {
                    (v * 255) as u8
                } else {
                    v.min(255) as u8
                }
            }
        };
        return Some(Color32::from_rgba_unmultiplied(r, g, b, a));
    }
    match lower.as_str() {
        "white" => Some(Color32::WHITE),
        "black" => Some(Color32::BLACK),
        "red" => Some(Color32::RED),
        "green" => Some(Color32::GREEN),
        "blue" => Some(Color32::BLUE),
        "gray" | "grey" => Some(Color32::GRAY),
        "transparent" => Some(Color32::TRANSPARENT),
        _ => None,
    }
}

fn parse_hex(s: &str) -> Option<Color32> {
    let hex = s.strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok();
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => Some(Color32::from_rgb(
            digit(0)? * 17,
            digit(1)? * 17,
            digit(2)? * 17,
        )),
        6 => Some(Color32::from_rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color32::from_rgba_unmultiplied(
            byte(0)?,
            byte(2)?,
            byte(4)?,
            byte(6)?,
        )),
        _ => None,
    }
}

/// Width and colour of a CSS-like border such as `1px solid #ddd`.
pub fn parse_border(s: &str) -> Option<(f32, Color32)> {
    let mut width = None;
    let mut color = None;
    for part in s.split_whitespace() {
        if let Some(px) = part.strip_suffix("px") {
            width = px.parse::<f32>().ok();
        } else if let Some(c) = parse_color(part) {
            color = Some(c);
        }
    }
    Some((width.unwrap_or(1.0), color?))
}
