//! Locating and controlling the game process.
//!
//! Only one controller may hold a given game process: the debug attachment
//! used to freeze it is exclusive at the OS level, so a second controller's
//! `suspend` fails. This is a hard single-owner constraint, not something
//! guarded by locks here.

mod gate;
#[cfg(target_os = "windows")]
mod handle;
#[cfg(target_os = "windows")]
pub mod window;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::memory::layout::{screen, target};

pub use gate::ExecutionControl;
#[cfg(target_os = "windows")]
pub use gate::DebugGate;
#[cfg(target_os = "windows")]
pub use handle::{AttachedGame, ProcessHandle, attach};

/// Where the game's playfield sits inside its window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameGeometry {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl Default for FrameGeometry {
    fn default() -> Self {
        Self {
            left: screen::FRAME_LEFT,
            top: screen::FRAME_TOP,
            width: screen::FRAME_WIDTH,
            height: screen::FRAME_HEIGHT,
        }
    }
}

/// What to look for when attaching
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachConfig {
    pub window_title: String,
    pub module_name: String,
    /// Expected outer window size (borders included)
    pub window_width: u32,
    pub window_height: u32,
    pub frame: FrameGeometry,
}

impl Default for AttachConfig {
    fn default() -> Self {
        Self {
            window_title: target::WINDOW_TITLE.to_string(),
            module_name: target::MODULE_NAME.to_string(),
            window_width: screen::WINDOW_WIDTH,
            window_height: screen::WINDOW_HEIGHT,
            frame: FrameGeometry::default(),
        }
    }
}

/// Screen-space window rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl WindowRect {
    pub fn width(&self) -> u32 {
        (self.right - self.left).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.bottom - self.top).max(0) as u32
    }
}

/// Pick the single window matching the title; zero or several is an error
pub fn select_single_window<T>(title: &str, mut candidates: Vec<T>) -> Result<T> {
    match candidates.len() {
        1 => Ok(candidates.remove(0)),
        0 => Err(Error::Attach(format!(
            "Cannot find a window with title: {}",
            title
        ))),
        n => Err(Error::Attach(format!(
            "Found {} windows with title '{}', expected exactly one",
            n, title
        ))),
    }
}

/// Capture coordinates are hardcoded against one window size
pub fn validate_window_size(rect: &WindowRect, config: &AttachConfig) -> Result<()> {
    if rect.width() != config.window_width || rect.height() != config.window_height {
        return Err(Error::Attach(format!(
            "Invalid window resolution: {}x{} (launch the game at {}x{})",
            rect.width(),
            rect.height(),
            config.window_width,
            config.window_height
        )));
    }
    Ok(())
}

/// Find the loaded module whose file name matches, ignoring case and directory.
///
/// Paths use Windows separators, so this does not rely on `std::path`.
pub fn find_module<'a, I>(module_name: &str, modules: I) -> Option<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    modules.into_iter().position(|path| {
        path.rsplit(['\\', '/'])
            .next()
            .is_some_and(|name| name.eq_ignore_ascii_case(module_name))
    })
}
