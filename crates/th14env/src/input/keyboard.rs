//! SendInput-backed key injection.

use std::thread;
use std::time::Duration;

use tracing::debug;
use windows::Win32::Foundation::HWND;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    INPUT, INPUT_0, INPUT_KEYBOARD, KEYBD_EVENT_FLAGS, KEYBDINPUT, KEYEVENTF_EXTENDEDKEY,
    KEYEVENTF_KEYUP, MAPVK_VK_TO_VSC, MapVirtualKeyW, SendInput, VIRTUAL_KEY,
};

use super::{Key, KeyInjector};
use crate::error::{Error, Result};
use crate::process::window;

/// Injects keys into whichever window has focus; `focus` targets the game
#[derive(Debug)]
pub struct SendInputKeyboard {
    hwnd: HWND,
    focus_settle: Duration,
}

impl SendInputKeyboard {
    pub fn new(hwnd: HWND) -> Self {
        Self {
            hwnd,
            focus_settle: Duration::from_millis(200),
        }
    }

    pub fn with_focus_settle(mut self, settle: Duration) -> Self {
        self.focus_settle = settle;
        self
    }

    fn send(&self, key: Key, up: bool) -> Result<()> {
        let vk = key.virtual_key();
        // SAFETY: MapVirtualKeyW is a pure table lookup.
        let scan = unsafe { MapVirtualKeyW(u32::from(vk), MAPVK_VK_TO_VSC) } as u16;

        let mut flags = KEYBD_EVENT_FLAGS(0);
        if key.is_extended() {
            flags |= KEYEVENTF_EXTENDEDKEY;
        }
        if up {
            flags |= KEYEVENTF_KEYUP;
        }

        let input = INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VIRTUAL_KEY(vk),
                    wScan: scan,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        };

        // SAFETY: one fully initialized INPUT with its exact size.
        let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
        if sent != 1 {
            return Err(Error::Input(format!(
                "SendInput rejected {} {}",
                key,
                if up { "up" } else { "down" }
            )));
        }
        Ok(())
    }
}

impl KeyInjector for SendInputKeyboard {
    fn key_down(&mut self, key: Key) -> Result<()> {
        self.send(key, false)
    }

    fn key_up(&mut self, key: Key) -> Result<()> {
        self.send(key, true)
    }

    fn focus(&mut self) -> Result<()> {
        if window::is_foreground(self.hwnd) {
            return Ok(());
        }
        debug!("Bringing game window to the foreground");
        window::ensure_foreground(self.hwnd);
        thread::sleep(self.focus_settle);
        Ok(())
    }
}
