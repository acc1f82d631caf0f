use std::collections::HashSet;
use std::fmt;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

use crate::action_tree::collect_hotkeys;
use crate::settings::Config;

/// Keys the hotkey parser and matcher understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// `A`-`Z` or `0`-`9`, stored upper case.
    Char(char),
    F(u8),
    Space,
    Tab,
    Enter,
    Escape,
    Delete,
    Backspace,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Left,
    Right,
    Up,
    Down,
    CapsLock,
    Ctrl,
    Shift,
    Alt,
    Win,
}

impl Key {
    pub fn is_modifier(&self) -> bool {
        matches!(self, Key::Ctrl | Key::Shift | Key::Alt | Key::Win)
    }

    fn name(&self) -> String {
        match self {
            Key::Char(c) => c.to_ascii_lowercase().to_string(),
            Key::F(n) => format!("f{n}"),
            Key::Space => "space".into(),
            Key::Tab => "tab".into(),
            Key::Enter => "enter".into(),
            Key::Escape => "esc".into(),
            Key::Delete => "delete".into(),
            Key::Backspace => "backspace".into(),
            Key::Insert => "insert".into(),
            Key::Home => "home".into(),
            Key::End => "end".into(),
            Key::PageUp => "pageup".into(),
            Key::PageDown => "pagedown".into(),
            Key::Left => "left".into(),
            Key::Right => "right".into(),
            Key::Up => "up".into(),
            Key::Down => "down".into(),
            Key::CapsLock => "capslock".into(),
            Key::Ctrl => "ctrl".into(),
            Key::Shift => "shift".into(),
            Key::Alt => "alt".into(),
            Key::Win => "win".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hotkey {
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub win: bool,
}

impl Default for Hotkey {
    fn default() -> Self {
        Self {
            key: Key::Char('Q'),
            ctrl: true,
            shift: false,
            alt: true,
            win: false,
        }
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            write!(f, "ctrl+")?;
        }
        if self.shift {
            write!(f, "shift+")?;
        }
        if self.alt {
            write!(f, "alt+")?;
        }
        if self.win {
            write!(f, "win+")?;
        }
        write!(f, "{}", self.key.name())
    }
}

/// Parse a hotkey string like "ctrl+alt+q" into a [`Hotkey`].
pub fn parse_hotkey(s: &str) -> Option<Hotkey> {
    let mut ctrl = false;
    let mut shift = false;
    let mut alt = false;
    let mut win = false;
    let mut key: Option<Key> = None;

    for part in s.split('+') {
        let upper = part.trim().to_ascii_uppercase();
        match upper.as_str() {
            "CTRL" | "CONTROL" => ctrl = true,
            "SHIFT" => shift = true,
            "ALT" => alt = true,
            "WIN" | "WINDOWS" | "SUPER" | "META" | "CMD" => win = true,
            "" => {}
            _ => {
                // a second non-modifier key is not a valid chord
                if key.is_some() {
                    return None;
                }
                key = Some(parse_key(&upper)?);
            }
        }
    }

    key.map(|k| Hotkey {
        key: k,
        ctrl,
        shift,
        alt,
        win,
    })
}

fn parse_key(upper: &str) -> Option<Key> {
    match upper {
        "SPACE" => Some(Key::Space),
        "TAB" => Some(Key::Tab),
        "ENTER" | "RETURN" => Some(Key::Enter),
        "ESC" | "ESCAPE" => Some(Key::Escape),
        "DELETE" | "DEL" => Some(Key::Delete),
        "BACKSPACE" => Some(Key::Backspace),
        "INSERT" | "INS" => Some(Key::Insert),
        "CAPSLOCK" => Some(Key::CapsLock),
        "HOME" => Some(Key::Home),
        "END" => Some(Key::End),
        "PAGEUP" => Some(Key::PageUp),
        "PAGEDOWN" => Some(Key::PageDown),
        "LEFT" | "LEFTARROW" => Some(Key::Left),
        "RIGHT" | "RIGHTARROW" => Some(Key::Right),
        "UP" | "UPARROW" => Some(Key::Up),
        "DOWN" | "DOWNARROW" => Some(Key::Down),
        _ if upper.len() > 1 && upper.starts_with('F') => match upper[1..].parse::<u8>() {
            Ok(n) if (1..=24).contains(&n) => Some(Key::F(n)),
            _ => None,
        },
        _ => {
            let mut chars = upper.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphanumeric() => Some(Key::Char(c)),
                _ => None,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HotkeyTarget {
    TogglePanel,
    /// Run the action with this id.
    Action(String),
}

/// Every registered chord and what it triggers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HotkeyBindings {
    entries: Vec<(Hotkey, HotkeyTarget)>,
}

impl HotkeyBindings {
    /// The panel toggle plus the hotkey of every enabled action in the tree.
    pub fn from_config(cfg: &Config) -> Self {
        let mut bindings = Self::default();
        bindings.insert(cfg.toggle_hotkey(), HotkeyTarget::TogglePanel);
        for (text, id) in collect_hotkeys(&cfg.actions) {
            match parse_hotkey(&text) {
                Some(hk) => {
                    bindings.insert(hk, HotkeyTarget::Action(id));
                }
                None => tracing::warn!("invalid hotkey '{text}' on action {id}"),
            }
        }
        bindings
    }

    /// Register a chord. The first registration of a chord wins.
    pub fn insert(&mut self, hotkey: Hotkey, target: HotkeyTarget) -> bool {
        if let Some((_, existing)) = self.entries.iter().find(|(hk, _)| *hk == hotkey) {
            tracing::warn!("hotkey {hotkey} already bound to {existing:?}, ignoring {target:?}");
            return false;
        }
        tracing::info!("registered hotkey {hotkey} -> {target:?}");
        self.entries.push((hotkey, target));
        true
    }

    pub fn target_of(&self, hotkey: &Hotkey) -> Option<&HotkeyTarget> {
        self.entries
            .iter()
            .find(|(hk, _)| hk == hotkey)
            .map(|(_, t)| t)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Tracks pressed keys and reports a binding when its chord goes down.
///
/// A chord fires once when its main key is pressed with exactly the bound
/// modifiers held. Auto-repeat presses of a held key do not fire again.
#[derive(Debug, Default)]
pub struct ChordMatcher {
    bindings: HotkeyBindings,
    held: HashSet<Key>,
}

impl ChordMatcher {
    pub fn new(bindings: HotkeyBindings) -> Self {
        Self {
            bindings,
            held: HashSet::new(),
        }
    }

    pub fn set_bindings(&mut self, bindings: HotkeyBindings) {
        self.bindings = bindings;
    }

    pub fn press(&mut self, key: Key) -> Option<HotkeyTarget> {
        if !self.held.insert(key) || key.is_modifier() {
            return None;
        }
        let chord = Hotkey {
            key,
            ctrl: self.held.contains(&Key::Ctrl),
            shift: self.held.contains(&Key::Shift),
            alt: self.held.contains(&Key::Alt),
            win: self.held.contains(&Key::Win),
        };
        let target = self.bindings.target_of(&chord).cloned();
        if let Some(t) = &target {
            tracing::debug!("hotkey {chord} matched {t:?}");
        }
        target
    }

    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
    }
}

/// Global hotkey registration for the toggle chord and per-action chords.
pub struct HotkeyManager {
    matcher: Arc<Mutex<ChordMatcher>>,
    tx: Sender<HotkeyTarget>,
    rx: Receiver<HotkeyTarget>,
    started: bool,
}

impl HotkeyManager {
    pub fn new(bindings: HotkeyBindings) -> Self {
        let (tx, rx) = channel();
        Self {
            matcher: Arc::new(Mutex::new(ChordMatcher::new(bindings))),
            tx,
            rx,
            started: false,
        }
    }

    /// Replace the bindings; a running listener picks them up immediately.
    pub fn rebind(&self, bindings: HotkeyBindings) {
        match self.matcher.lock() {
            Ok(mut m) => m.set_bindings(bindings),
            Err(e) => tracing::error!("hotkey matcher lock poisoned: {e}"),
        }
    }

    /// Targets fired since the last call.
    pub fn take_events(&self) -> Vec<HotkeyTarget> {
        self.rx.try_iter().collect()
    }

    /// Sender side of the event channel, for injecting events.
    pub fn sender(&self) -> Sender<HotkeyTarget> {
        self.tx.clone()
    }

    pub fn is_listening(&self) -> bool {
        self.started
    }

    #[cfg(target_os = "windows")]
    pub fn start_listener(&mut self) {
        use rdev::{listen, EventType};
        use std::thread;
        use std::time::Duration;

        if self.started {
            return;
        }
        self.started = true;
        let matcher = self.matcher.clone();
        let tx = self.tx.clone();
        tracing::debug!("starting global hotkey listener");
        thread::spawn(move || loop {
            let matcher = matcher.clone();
            let tx = tx.clone();
            let result = listen(move |event| {
                let Ok(mut m) = matcher.lock() else {
                    return;
                };
                match event.event_type {
                    EventType::KeyPress(k) => {
                        if let Some(key) = from_rdev(k) {
                            if let Some(target) = m.press(key) {
                                let _ = tx.send(target);
                            }
                        }
                    }
                    EventType::KeyRelease(k) => {
                        if let Some(key) = from_rdev(k) {
                            m.release(key);
                        }
                    }
                    _ => {}
                }
            });

            match result {
                Ok(()) => tracing::warn!("hotkey listener exited unexpectedly, restarting shortly"),
                Err(e) => tracing::warn!("hotkey listener failed: {:?}, retrying shortly", e),
            }
            thread::sleep(Duration::from_millis(500));
        });
    }

    #[cfg(not(target_os = "windows"))]
    pub fn start_listener(&mut self) {
        tracing::info!("global hotkeys are only available on Windows");
    }
}

/// Windows virtual-key codes of F13 to F24.
const VK_F13: u32 = 0x7C;
const VK_F24: u32 = 0x87;

/// F13 to F24 from a raw virtual-key code. The hook reports these keys
/// without a name of their own.
pub fn function_key_from_vk(vk: u32) -> Option<Key> {
    (VK_F13..=VK_F24)
        .contains(&vk)
        .then(|| Key::F((vk - VK_F13 + 13) as u8))
}

#[cfg(target_os = "windows")]
fn from_rdev(k: rdev::Key) -> Option<Key> {
    use rdev::Key as R;
    let key = match k {
        R::ControlLeft | R::ControlRight => Key::Ctrl,
        R::ShiftLeft | R::ShiftRight => Key::Shift,
        R::Alt | R::AltGr => Key::Alt,
        R::MetaLeft | R::MetaRight => Key::Win,
        R::Space => Key::Space,
        R::Tab => Key::Tab,
        R::Return => Key::Enter,
        R::Escape => Key::Escape,
        R::Delete => Key::Delete,
        R::Backspace => Key::Backspace,
        R::Insert => Key::Insert,
        R::Home => Key::Home,
        R::End => Key::End,
        R::PageUp => Key::PageUp,
        R::PageDown => Key::PageDown,
        R::LeftArrow => Key::Left,
        R::RightArrow => Key::Right,
        R::UpArrow => Key::Up,
        R::DownArrow => Key::Down,
        R::CapsLock => Key::CapsLock,
        R::F1 => Key::F(1),
        R::F2 => Key::F(2),
        R::F3 => Key::F(3),
        R::F4 => Key::F(4),
        R::F5 => Key::F(5),
        R::F6 => Key::F(6),
        R::F7 => Key::F(7),
        R::F8 => Key::F(8),
        R::F9 => Key::F(9),
        R::F10 => Key::F(10),
        R::F11 => Key::F(11),
        R::F12 => Key::F(12),
        R::Unknown(vk) => return function_key_from_vk(vk),
        R::Num0 => Key::Char('0'),
        R::Num1 => Key::Char('1'),
        R::Num2 => Key::Char('2'),
        R::Num3 => Key::Char('3'),
        R::Num4 => Key::Char('4'),
        R::Num5 => Key::Char('5'),
        R::Num6 => Key::Char('6'),
        R::Num7 => Key::Char('7'),
        R::Num8 => Key::Char('8'),
        R::Num9 => Key::Char('9'),
        R::KeyA => Key::Char('A'),
        R::KeyB => Key::Char('B'),
        R::KeyC => Key::Char('C'),
        R::KeyD => Key::Char('D'),
        R::KeyE => Key::Char('E'),
        R::KeyF => Key::Char('F'),
        R::KeyG => Key::Char('G'),
        R::KeyH => Key::Char('H'),
        R::KeyI => Key::Char('I'),
        R::KeyJ => Key::Char('J'),
        R::KeyK => Key::Char('K'),
        R::KeyL => Key::Char('L'),
        R::KeyM => Key::Char('M'),
        R::KeyN => Key::Char('N'),
        R::KeyO => Key::Char('O'),
        R::KeyP => Key::Char('P'),
        R::KeyQ => Key::Char('Q'),
        R::KeyR => Key::Char('R'),
        R::KeyS => Key::Char('S'),
        R::KeyT => Key::Char('T'),
        R::KeyU => Key::Char('U'),
        R::KeyV => Key::Char('V'),
        R::KeyW => Key::Char('W'),
        R::KeyX => Key::Char('X'),
        R::KeyY => Key::Char('Y'),
        R::KeyZ => Key::Char('Z'),
        _ => return None,
    };
    Some(key)
}
