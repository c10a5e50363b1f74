//! Game window management.
//!
//! Locates the game window by title, reads its screen rectangle and
//! manages foreground focus.

use windows::Win32::Foundation::{BOOL, HWND, LPARAM, RECT};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetForegroundWindow, GetWindowRect, GetWindowTextLengthW, GetWindowTextW,
    GetWindowThreadProcessId, IsWindowVisible, SetForegroundWindow,
};

use super::WindowRect;
use crate::error::{Error, Result};

struct TitleSearch<'a> {
    title: &'a str,
    found: Vec<HWND>,
}

/// Find every visible top-level window whose title contains `title`.
pub fn find_windows_by_title(title: &str) -> Result<Vec<HWND>> {
    let mut search = TitleSearch {
        title,
        found: Vec::new(),
    };

    // SAFETY: EnumWindows calls the callback synchronously for each top-level
    // window; the LPARAM points at `search`, which outlives the call.
    unsafe {
        EnumWindows(
            Some(enum_callback),
            LPARAM(&mut search as *mut TitleSearch as isize),
        )
    }
    .map_err(|e| Error::Attach(format!("EnumWindows failed: {}", e)))?;

    Ok(search.found)
}

unsafe extern "system" fn enum_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
    // SAFETY: lparam was created from a live `&mut TitleSearch` above.
    let search = unsafe { &mut *(lparam.0 as *mut TitleSearch) };

    if !unsafe { IsWindowVisible(hwnd) }.as_bool() {
        return BOOL(1);
    }

    let len = unsafe { GetWindowTextLengthW(hwnd) };
    if len <= 0 {
        return BOOL(1);
    }

    let mut buffer = vec![0u16; len as usize + 1];
    let copied = unsafe { GetWindowTextW(hwnd, &mut buffer) };
    let text = String::from_utf16_lossy(&buffer[..copied.max(0) as usize]);
    if text.contains(search.title) {
        search.found.push(hwnd);
    }
    BOOL(1) // Continue enumeration
}

/// Outer window rectangle in screen coordinates (borders included).
pub fn window_rect(hwnd: HWND) -> Result<WindowRect> {
    let mut rect = RECT::default();
    // SAFETY: GetWindowRect writes into a caller-owned RECT.
    unsafe { GetWindowRect(hwnd, &mut rect) }
        .map_err(|e| Error::Attach(format!("GetWindowRect failed: {}", e)))?;

    Ok(WindowRect {
        left: rect.left,
        top: rect.top,
        right: rect.right,
        bottom: rect.bottom,
    })
}

/// Process ID owning the window.
pub fn window_pid(hwnd: HWND) -> Result<u32> {
    let mut pid: u32 = 0;
    // SAFETY: GetWindowThreadProcessId writes the PID into a local.
    unsafe { GetWindowThreadProcessId(hwnd, Some(&mut pid)) };
    if pid == 0 {
        return Err(Error::Attach("Window has no owning process".to_string()));
    }
    Ok(pid)
}

/// Bring the given window to the foreground.
pub fn ensure_foreground(hwnd: HWND) {
    // SAFETY: SetForegroundWindow is safe to call with a valid HWND.
    // It may fail silently if the calling process doesn't have permission,
    // in which case injected keys go to whichever window has focus.
    unsafe {
        let _ = SetForegroundWindow(hwnd);
    }
}

/// Check whether the given window currently has foreground focus.
pub fn is_foreground(hwnd: HWND) -> bool {
    // SAFETY: GetForegroundWindow is always safe to call.
    let fg = unsafe { GetForegroundWindow() };
    fg == hwnd
}
