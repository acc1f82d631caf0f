use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

pub mod exec;
pub mod keys;
pub mod script;

/// A single configured behaviour bound to one panel button.
///
/// Serialized as one flat JSON object: the shared fields, the `type` tag and
/// the kind's own fields side by side. Keys this build does not know about
/// are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub id: String,
    pub name: String,
    /// SVG icon name or path. Empty means the type glyph is shown.
    pub icon_path: String,
    pub hotkey: String,
    pub created_at: String,
    pub enabled: bool,
    pub kind: ActionKind,
    pub extra: Map<String, Value>,
}

const COMMON_KEYS: [&str; 6] = ["id", "name", "icon_path", "hotkey", "created_at", "enabled"];

const KNOWN_TYPES: [&str; 7] = [
    "key",
    "program",
    "url",
    "text",
    "panel",
    "input_output",
    "quick_send",
];

fn take_field<T, E>(map: &mut Map<String, Value>, key: &str) -> Result<Option<T>, E>
where
    T: serde::de::DeserializeOwned,
    E: serde::de::Error,
{
    match map.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => serde_json::from_value(v)
            .map(Some)
            .map_err(|e| E::custom(format!("field `{key}`: {e}"))),
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut map = Map::<String, Value>::deserialize(deserializer)?;
        let id = take_field::<_, D::Error>(&mut map, "id")?.unwrap_or_else(new_id);
        let name = take_field::<_, D::Error>(&mut map, "name")?.unwrap_or_default();
        let icon_path = take_field::<_, D::Error>(&mut map, "icon_path")?.unwrap_or_default();
        let hotkey = take_field::<_, D::Error>(&mut map, "hotkey")?.unwrap_or_default();
        let created_at = take_field::<_, D::Error>(&mut map, "created_at")?.unwrap_or_default();
        let enabled = take_field::<_, D::Error>(&mut map, "enabled")?.unwrap_or_else(default_enabled);

        let type_name = map
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let (kind, extra) = if KNOWN_TYPES.contains(&type_name.as_str()) {
            let kind = ActionKind::deserialize(Value::Object(map.clone()))
                .map_err(D::Error::custom)?;
            // Whatever the kind did not claim is carried along untouched.
            if let Ok(Value::Object(own)) = serde_json::to_value(&kind) {
                for key in own.keys() {
                    map.remove(key);
                }
            }
            map.remove("type");
            (kind, map)
        } else {
            map.remove("type");
            (
                ActionKind::Unknown {
                    type_name,
                    fields: map,
                },
                Map::new(),
            )
        };

        Ok(Self {
            id,
            name,
            icon_path,
            hotkey,
            created_at,
            enabled,
            kind,
            extra,
        })
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = self.extra.clone();
        match &self.kind {
            ActionKind::Unknown { type_name, fields } => {
                map.extend(fields.clone());
                if !type_name.is_empty() {
                    map.insert("type".into(), Value::String(type_name.clone()));
                }
            }
            kind => match serde_json::to_value(kind).map_err(S::Error::custom)? {
                Value::Object(own) => map.extend(own),
                _ => return Err(S::Error::custom("action kind is not an object")),
            },
        }
        let common = [
            Value::String(self.id.clone()),
            Value::String(self.name.clone()),
            Value::String(self.icon_path.clone()),
            Value::String(self.hotkey.clone()),
            Value::String(self.created_at.clone()),
            Value::Bool(self.enabled),
        ];
        for (key, value) in COMMON_KEYS.iter().zip(common) {
            map.insert((*key).to_string(), value);
        }
        map.serialize(serializer)
    }
}

fn default_enabled() -> bool {
    true
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    /// Simulated key sequence, see [`keys::parse_sequence`].
    Key {
        #[serde(default)]
        command: String,
    },
    Program {
        #[serde(default)]
        command: String,
        #[serde(default)]
        args: Vec<String>,
    },
    Url {
        #[serde(default)]
        url: String,
    },
    Text {
        #[serde(default)]
        text: String,
    },
    /// Nested sub-panel owning its own list of actions.
    Panel {
        #[serde(default)]
        actions: Vec<Action>,
    },
    InputOutput {
        #[serde(default)]
        script_file: String,
        #[serde(default)]
        input_source: InputSource,
        #[serde(default)]
        output_target: OutputTarget,
        #[serde(default)]
        description: String,
    },
    QuickSend {
        #[serde(default)]
        filename: String,
        #[serde(default)]
        description: String,
    },
    /// A type this build cannot run. The tag and every field are kept so the
    /// action survives a save unchanged.
    #[serde(skip)]
    Unknown {
        type_name: String,
        fields: Map<String, Value>,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InputSource {
    #[default]
    Clipboard,
    Selection,
    Manual,
    None,
}

impl InputSource {
    pub const ALL: [InputSource; 4] = [
        InputSource::Clipboard,
        InputSource::Selection,
        InputSource::Manual,
        InputSource::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InputSource::Clipboard => "clipboard",
            InputSource::Selection => "selection",
            InputSource::Manual => "manual",
            InputSource::None => "none",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InputSource::Clipboard => "Clipboard",
            InputSource::Selection => "Selected text",
            InputSource::Manual => "Manual input",
            InputSource::None => "No input",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputTarget {
    #[default]
    Text,
    Url,
    Clipboard,
    File,
    Window,
}

impl OutputTarget {
    pub const ALL: [OutputTarget; 5] = [
        OutputTarget::Text,
        OutputTarget::Url,
        OutputTarget::Clipboard,
        OutputTarget::File,
        OutputTarget::Window,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputTarget::Text => "text",
            OutputTarget::Url => "url",
            OutputTarget::Clipboard => "clipboard",
            OutputTarget::File => "file",
            OutputTarget::Window => "window",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OutputTarget::Text => "Type as text",
            OutputTarget::Url => "Open as URL",
            OutputTarget::Clipboard => "Copy to clipboard",
            OutputTarget::File => "Save to file",
            OutputTarget::Window => "Show in window",
        }
    }
}

/// Kinds offered by the "add action" menu, in menu order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewActionType {
    Key,
    Program,
    Url,
    Text,
    InputOutput,
    QuickSend,
    Panel,
}

impl NewActionType {
    pub const ALL: [NewActionType; 7] = [
        NewActionType::Key,
        NewActionType::Program,
        NewActionType::Url,
        NewActionType::Text,
        NewActionType::InputOutput,
        NewActionType::QuickSend,
        NewActionType::Panel,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            NewActionType::Key => "Simulate keys",
            NewActionType::Program => "Run program",
            NewActionType::Url => "Open URL",
            NewActionType::Text => "Send text",
            NewActionType::InputOutput => "Input/output script",
            NewActionType::QuickSend => "Quick send",
            NewActionType::Panel => "Sub panel",
        }
    }

    /// Prompt shown when asking for the single value the type needs.
    pub fn prompt(&self) -> &'static str {
        match self {
            NewActionType::Key => {
                "Key sequence, e.g. ctrl+c, wait(500), \"text\", enter"
            }
            NewActionType::Program => "Program or file path",
            NewActionType::Url => "URL",
            NewActionType::Text => "Text to send",
            NewActionType::InputOutput => "Action name",
            NewActionType::QuickSend => "Quick send name",
            NewActionType::Panel => "Sub panel name",
        }
    }

    /// Build the action for a single prompted value. Input/output and quick
    /// send actions need files on disk and are created by the config store.
    pub fn build(&self, value: &str) -> Option<Action> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        let kind = match self {
            NewActionType::Key => ActionKind::Key {
                command: value.into(),
            },
            NewActionType::Program => ActionKind::Program {
                command: value.into(),
                args: Vec::new(),
            },
            NewActionType::Url => ActionKind::Url { url: value.into() },
            NewActionType::Text => ActionKind::Text { text: value.into() },
            NewActionType::Panel => {
                return Some(Action::new(value, ActionKind::Panel { actions: Vec::new() }))
            }
            NewActionType::InputOutput | NewActionType::QuickSend => return None,
        };
        Some(Action::new(self.label(), kind))
    }
}

impl Action {
    /// Create an action with a fresh id and creation timestamp.
    pub fn new(name: &str, kind: ActionKind) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            icon_path: String::new(),
            hotkey: String::new(),
            created_at: chrono::Local::now().to_rfc3339(),
            enabled: true,
            kind,
            extra: Map::new(),
        }
    }

    pub fn is_panel(&self) -> bool {
        matches!(self.kind, ActionKind::Panel { .. })
    }

    pub fn children(&self) -> Option<&Vec<Action>> {
        match &self.kind {
            ActionKind::Panel { actions } => Some(actions),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Action>> {
        match &mut self.kind {
            ActionKind::Panel { actions } => Some(actions),
            _ => None,
        }
    }

    /// Glyph drawn on buttons without an icon.
    pub fn type_icon(&self) -> &'static str {
        match self.kind {
            ActionKind::Key { .. } => "⌨",
            ActionKind::Program { .. } => "▶",
            ActionKind::Url { .. } => "🌐",
            ActionKind::Text { .. } => "✎",
            ActionKind::Panel { .. } => "📁",
            ActionKind::InputOutput { .. } => "⚙",
            ActionKind::QuickSend { .. } => "✉",
            ActionKind::Unknown { .. } => "?",
        }
    }

    /// One-line summary used for tooltips.
    pub fn summary(&self) -> String {
        match &self.kind {
            ActionKind::Key { command } => format!("Keys: {command}"),
            ActionKind::Program { command, args } if args.is_empty() => {
                format!("Run: {command}")
            }
            ActionKind::Program { command, args } => format!("Run: {command} {}", args.join(" ")),
            ActionKind::Url { url } => format!("Open: {url}"),
            ActionKind::Text { text } => format!("Send: {text}"),
            ActionKind::Panel { actions } => format!("Panel ({} actions)", actions.len()),
            ActionKind::InputOutput {
                script_file,
                input_source,
                output_target,
                ..
            } => format!(
                "Script {script_file} ({} → {})",
                input_source.as_str(),
                output_target.as_str()
            ),
            ActionKind::QuickSend { filename, .. } => format!("Quick send: {filename}"),
            ActionKind::Unknown { type_name, .. } => format!("Unsupported action type '{type_name}'"),
        }
    }
}

impl ActionKind {
    pub fn type_name(&self) -> &str {
        match self {
            ActionKind::Key { .. } => "key",
            ActionKind::Program { .. } => "program",
            ActionKind::Url { .. } => "url",
            ActionKind::Text { .. } => "text",
            ActionKind::Panel { .. } => "panel",
            ActionKind::InputOutput { .. } => "input_output",
            ActionKind::QuickSend { .. } => "quick_send",
            ActionKind::Unknown { type_name, .. } => type_name,
        }
    }

    /// Human readable name of the kind.
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::Key { .. } => NewActionType::Key.label(),
            ActionKind::Program { .. } => NewActionType::Program.label(),
            ActionKind::Url { .. } => NewActionType::Url.label(),
            ActionKind::Text { .. } => NewActionType::Text.label(),
            ActionKind::Panel { .. } => NewActionType::Panel.label(),
            ActionKind::InputOutput { .. } => NewActionType::InputOutput.label(),
            ActionKind::QuickSend { .. } => NewActionType::QuickSend.label(),
            ActionKind::Unknown { .. } => "Unsupported",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.kind.type_name())
    }
}
