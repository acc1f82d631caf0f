use anyhow::Context;
use std::time::Duration;

#[cfg(target_os = "windows")]
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS, KEYEVENTF_KEYUP,
    KEYEVENTF_UNICODE, VIRTUAL_KEY,
};

/// One step of a key sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyStep {
    /// Keys pressed together, in order, released in reverse. A single key is a
    /// chord of one.
    Chord(Vec<u16>),
    /// Literal text typed as unicode input.
    Text(String),
    Wait(Duration),
}

/// Parse a key specification string.
///
/// Supported forms (comma-separated steps):
/// - Chords: `ctrl+c`, `alt+tab`, `ctrl+shift+t`
/// - Single keys: `f5`, `enter`, `space`
/// - Quoted text: `"hello world"` or `'hello'`
/// - Text prefix: `text:hello world` (or `type:hello world`)
/// - Delays: `wait(500)` in milliseconds
///
/// Commas inside quotes belong to the text. A malformed `wait(...)` is
/// skipped with a warning; an unknown key name is an error.
pub fn parse_sequence(spec: &str) -> anyhow::Result<Vec<KeyStep>> {
    let mut steps = Vec::new();
    for raw in split_steps(spec) {
        let step = raw.trim();
        if step.is_empty() {
            continue;
        }

        if let Some(inner) = strip_prefix_ci(step, "wait(").and_then(|s| s.strip_suffix(')')) {
            match inner.trim().parse::<u64>() {
                Ok(ms) => steps.push(KeyStep::Wait(Duration::from_millis(ms))),
                Err(_) => tracing::warn!("invalid delay '{step}', expected wait(milliseconds)"),
            }
            continue;
        }

        if let Some(text) = unquote(step) {
            steps.push(KeyStep::Text(text.to_string()));
            continue;
        }

        if let Some(text) = strip_prefix_ci(step, "text:").or_else(|| strip_prefix_ci(step, "type:"))
        {
            steps.push(KeyStep::Text(text.trim().to_string()));
            continue;
        }

        let vks = step
            .split('+')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(parse_vk)
            .collect::<anyhow::Result<Vec<_>>>()?;
        if !vks.is_empty() {
            steps.push(KeyStep::Chord(vks));
        }
    }
    Ok(steps)
}

/// Split on commas that are not inside single or double quotes.
fn split_steps(spec: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, ch) in spec.char_indices() {
        match (quote, ch) {
            (None, '"') | (None, '\'') => {
                // Only an opening quote at the start of a step counts, so
                // apostrophes inside words do not swallow the rest.
                if spec[start..i].trim().is_empty() {
                    quote = Some(ch);
                }
            }
            (Some(q), c) if c == q => quote = None,
            (None, ',') => {
                out.push(&spec[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&spec[start..]);
    out
}

fn unquote(step: &str) -> Option<&str> {
    if step.len() >= 2
        && ((step.starts_with('"') && step.ends_with('"'))
            || (step.starts_with('\'') && step.ends_with('\'')))
    {
        Some(&step[1..step.len() - 1])
    } else {
        None
    }
}

/// Send a key specification string via Win32 `SendInput`.
pub fn send(spec: &str) -> anyhow::Result<()> {
    let spec = spec.trim();
    if spec.is_empty() {
        anyhow::bail!("empty key spec");
    }
    let steps = parse_sequence(spec)?;

    #[cfg(not(target_os = "windows"))]
    {
        let _ = steps;
        anyhow::bail!("keys action is only supported on Windows");
    }

    #[cfg(target_os = "windows")]
    {
        for step in steps {
            match step {
                KeyStep::Chord(vks) => send_chord(&vks).context("send keys")?,
                KeyStep::Text(text) => send_text(&text).context("send text")?,
                KeyStep::Wait(d) => std::thread::sleep(d),
            }
        }
        Ok(())
    }
}

/// Type `text` into the focused window as unicode key events.
pub fn type_text(text: &str) -> anyhow::Result<()> {
    #[cfg(not(target_os = "windows"))]
    {
        let _ = text;
        anyhow::bail!("sending text is only supported on Windows");
    }

    #[cfg(target_os = "windows")]
    {
        send_text(text).context("send text")
    }
}

#[cfg(target_os = "windows")]
fn send_chord(vks: &[u16]) -> anyhow::Result<()> {
    // key down in order
    for &vk in vks {
        send_vk(VIRTUAL_KEY(vk), KEYBD_EVENT_FLAGS(0))?;
    }

    // key up in reverse order
    for &vk in vks.iter().rev() {
        send_vk(VIRTUAL_KEY(vk), KEYEVENTF_KEYUP)?;
    }

    Ok(())
}

#[cfg(target_os = "windows")]
fn send_vk(vk: VIRTUAL_KEY, flags: KEYBD_EVENT_FLAGS) -> anyhow::Result<()> {
    unsafe {
        let input = INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: vk,
                    wScan: 0,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        };
        let sent = SendInput(&[input], std::mem::size_of::<INPUT>() as i32);
        if sent == 0 {
            anyhow::bail!("SendInput returned 0");
        }
    }
    Ok(())
}

#[cfg(target_os = "windows")]
fn send_text(text: &str) -> anyhow::Result<()> {
    if text.is_empty() {
        return Ok(());
    }

    // UTF-16 units so characters outside the BMP go out as surrogate pairs.
    for code in text.encode_utf16() {
        unsafe {
            let mut down = INPUT {
                r#type: INPUT_KEYBOARD,
                Anonymous: INPUT_0 {
                    ki: KEYBDINPUT {
                        wVk: VIRTUAL_KEY(0),
                        wScan: code,
                        dwFlags: KEYEVENTF_UNICODE,
                        time: 0,
                        dwExtraInfo: 0,
                    },
                },
            };

            let sent = SendInput(&[down], std::mem::size_of::<INPUT>() as i32);
            if sent == 0 {
                anyhow::bail!("SendInput returned 0");
            }

            down.Anonymous.ki.dwFlags = KEYBD_EVENT_FLAGS(KEYEVENTF_UNICODE.0 | KEYEVENTF_KEYUP.0);
            let sent = SendInput(&[down], std::mem::size_of::<INPUT>() as i32);
            if sent == 0 {
                anyhow::bail!("SendInput returned 0");
            }
        }
    }

    Ok(())
}

/// Map a key name to its Windows virtual-key code.
pub fn parse_vk(token: &str) -> anyhow::Result<u16> {
    let t = token.trim();
    if t.is_empty() {
        anyhow::bail!("empty key token");
    }
    let lower = t.to_ascii_lowercase();

    let code = match lower.as_str() {
        // modifiers
        "ctrl" | "control" => 0x11,
        "shift" => 0x10,
        "alt" => 0x12,
        "win" | "windows" | "lwin" | "cmd" => 0x5B,

        // common keys
        "enter" | "return" => 0x0D,
        "tab" => 0x09,
        "esc" | "escape" => 0x1B,
        "space" => 0x20,
        "backspace" | "bksp" => 0x08,
        "delete" | "del" => 0x2E,
        "insert" | "ins" => 0x2D,
        "home" => 0x24,
        "end" => 0x23,
        "pageup" | "pgup" => 0x21,
        "pagedown" | "pgdn" => 0x22,
        "up" => 0x26,
        "down" => 0x28,
        "left" => 0x25,
        "right" => 0x27,
        "capslock" => 0x14,
        "printscreen" | "prtsc" => 0x2C,
        "pause" => 0x13,
        "numlock" => 0x90,
        "scrolllock" => 0x91,
        "apps" | "menu" => 0x5D,
        "volumemute" => 0xAD,
        "volumedown" => 0xAE,
        "volumeup" => 0xAF,
        "playpause" => 0xB3,
        "nexttrack" => 0xB0,
        "prevtrack" => 0xB1,
        "plus" => 0xBB,
        "comma" => 0xBC,
        "minus" => 0xBD,
        "period" => 0xBE,
        _ => {
            // function keys: F1..F24
            if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u16>().ok()) {
                if (1..=24).contains(&n) {
                    return Ok(0x6F + n); // VK_F1=0x70
                }
            }
            // numpad digits
            if let Some(n) = lower.strip_prefix("num").and_then(|n| n.parse::<u16>().ok()) {
                if n <= 9 {
                    return Ok(0x60 + n);
                }
            }
            // single ASCII letter/digit
            let mut chars = t.chars();
            if let (Some(ch), None) = (chars.next(), chars.next()) {
                if ch.is_ascii_alphabetic() {
                    return Ok(ch.to_ascii_uppercase() as u16);
                }
                if ch.is_ascii_digit() {
                    return Ok(ch as u16);
                }
            }
            anyhow::bail!("unknown key token '{t}'");
        }
    };
    Ok(code)
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() < prefix.len() || !s.is_char_boundary(prefix.len()) {
        return None;
    }
    if s[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}
