//! Remembers which window had focus before the panel appeared so actions can
//! be delivered back to it.

use std::time::Duration;

/// How often the foreground window is sampled.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Snapshot of a top-level window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    /// Raw `HWND` value.
    pub handle: isize,
    pub title: String,
    pub visible: bool,
    pub pid: u32,
}

/// Whether `info` is a candidate for paste-back.
pub fn should_track(info: &WindowInfo, own_pid: u32, own_titles: &[&str]) -> bool {
    if info.handle == 0 || !info.visible || info.pid == own_pid {
        return false;
    }
    let title = info.title.trim();
    if title.is_empty() {
        return false;
    }
    !own_titles
        .iter()
        .any(|own| !own.is_empty() && title.contains(own))
}

#[derive(Debug, Clone)]
pub struct ForegroundTracker {
    own_pid: u32,
    own_titles: Vec<String>,
    last: Option<WindowInfo>,
}

impl ForegroundTracker {
    pub fn new(own_titles: &[&str]) -> Self {
        Self {
            own_pid: std::process::id(),
            own_titles: own_titles.iter().map(|s| s.to_string()).collect(),
            last: None,
        }
    }

    /// Record `info` if it qualifies. Returns whether it was recorded.
    pub fn observe(&mut self, info: WindowInfo) -> bool {
        let titles: Vec<&str> = self.own_titles.iter().map(String::as_str).collect();
        if !should_track(&info, self.own_pid, &titles) {
            return false;
        }
        if self.last.as_ref().map(|l| l.handle) != Some(info.handle) {
            tracing::debug!(title = %info.title, "foreground window changed");
        }
        self.last = Some(info);
        true
    }

    /// Sample the current foreground window.
    pub fn poll(&mut self) {
        if let Some(info) = current_foreground() {
            self.observe(info);
        }
    }

    pub fn last(&self) -> Option<&WindowInfo> {
        self.last.as_ref()
    }

    /// Bring the recorded window back to the front.
    pub fn switch_to_previous(&self) -> bool {
        match &self.last {
            Some(info) => activate(info.handle),
            None => false,
        }
    }
}

#[cfg(target_os = "windows")]
pub fn current_foreground() -> Option<WindowInfo> {
    use windows::Win32::UI::WindowsAndMessaging::{
        GetForegroundWindow, GetWindowTextW, GetWindowThreadProcessId, IsWindowVisible,
    };
    unsafe {
        let hwnd = GetForegroundWindow();
        if hwnd.0.is_null() {
            return None;
        }
        let mut buf = [0u16; 512];
        let len = GetWindowTextW(hwnd, &mut buf).max(0) as usize;
        let title = String::from_utf16_lossy(&buf[..len]);
        let mut pid = 0u32;
        GetWindowThreadProcessId(hwnd, Some(&mut pid));
        Some(WindowInfo {
            handle: hwnd.0 as isize,
            title,
            visible: IsWindowVisible(hwnd).as_bool(),
            pid,
        })
    }
}

#[cfg(not(target_os = "windows"))]
pub fn current_foreground() -> Option<WindowInfo> {
    None
}

/// Restore the window if minimised and bring it to the foreground.
#[cfg(target_os = "windows")]
pub fn activate(handle: isize) -> bool {
    use windows::Win32::Foundation::HWND;
    use windows::Win32::UI::WindowsAndMessaging::{
        IsIconic, IsWindow, SetForegroundWindow, ShowWindow, SW_RESTORE,
    };
    let hwnd = HWND(handle as *mut core::ffi::c_void);
    unsafe {
        if !IsWindow(hwnd).as_bool() {
            tracing::debug!("previous window no longer exists");
            return false;
        }
        if IsIconic(hwnd).as_bool() {
            let _ = ShowWindow(hwnd, SW_RESTORE);
        }
        SetForegroundWindow(hwnd).as_bool()
    }
}

#[cfg(not(target_os = "windows"))]
pub fn activate(_handle: isize) -> bool {
    false
}
