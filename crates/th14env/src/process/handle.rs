//! Attaching to the running game.

use std::ffi::c_void;

use tracing::{debug, info};
use windows::Win32::Foundation::{BOOL, CloseHandle, HANDLE, HMODULE, HWND};
use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;
use windows::Win32::System::ProcessStatus::{EnumProcessModules, GetModuleFileNameExW};
use windows::Win32::System::Threading::{
    OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
};

use super::{
    AttachConfig, DebugGate, WindowRect, find_module, select_single_window,
    validate_window_size, window,
};
use crate::capture::{CaptureRegion, ScreenCapturer};
use crate::error::{Error, Result};
use crate::input::SendInputKeyboard;
use crate::memory::ReadMemory;

/// Read/query rights over the game process.
///
/// The handle is closed on drop.
#[derive(Debug)]
pub struct ProcessHandle {
    pub pid: u32,
    pub base_address: u64,
    pub hwnd: HWND,
    handle: HANDLE,
}

impl ProcessHandle {
    /// Open the process owning `hwnd` and resolve the base of `module_name`
    pub fn open(hwnd: HWND, module_name: &str) -> Result<Self> {
        let pid = window::window_pid(hwnd)?;

        // SAFETY: OpenProcess returns an owned handle or an error.
        let handle = unsafe {
            OpenProcess(
                PROCESS_QUERY_INFORMATION | PROCESS_VM_READ,
                BOOL::from(false),
                pid,
            )
        }
        .map_err(|e| Error::Attach(format!("Failed to open process {}: {}", pid, e)))?;

        let mut process = Self {
            pid,
            base_address: 0,
            hwnd,
            handle,
        };
        process.base_address = process.module_base(module_name)?;
        Ok(process)
    }

    fn module_base(&self, module_name: &str) -> Result<u64> {
        let mut modules = [HMODULE::default(); 1024];
        let mut needed: u32 = 0;
        // SAFETY: the buffer size passed matches `modules`.
        unsafe {
            EnumProcessModules(
                self.handle,
                modules.as_mut_ptr(),
                std::mem::size_of_val(&modules) as u32,
                &mut needed,
            )
        }
        .map_err(|e| Error::Attach(format!("EnumProcessModules failed: {}", e)))?;

        let count = (needed as usize / std::mem::size_of::<HMODULE>()).min(modules.len());
        let paths: Vec<String> = modules[..count]
            .iter()
            .map(|module| {
                let mut buffer = [0u16; 260];
                // SAFETY: writes at most buffer.len() UTF-16 units.
                let len = unsafe { GetModuleFileNameExW(self.handle, *module, &mut buffer) };
                String::from_utf16_lossy(&buffer[..len as usize])
            })
            .collect();

        let index = find_module(module_name, paths.iter().map(String::as_str)).ok_or_else(
            || Error::Attach(format!("Module {} not found in process {}", module_name, self.pid)),
        )?;

        Ok(modules[index].0 as u64)
    }
}

impl ReadMemory for ProcessHandle {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; size];
        let mut bytes_read = 0usize;
        // SAFETY: the destination buffer holds `size` bytes.
        unsafe {
            ReadProcessMemory(
                self.handle,
                address as *const c_void,
                buffer.as_mut_ptr().cast(),
                size,
                Some(&mut bytes_read),
            )
        }
        .map_err(|e| Error::MemoryRead {
            address,
            message: format!("{} (process may have exited)", e),
        })?;

        if bytes_read != size {
            return Err(Error::MemoryRead {
                address,
                message: format!("short read: {} of {} bytes", bytes_read, size),
            });
        }
        Ok(buffer)
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        // SAFETY: the handle was opened by OpenProcess and is closed once.
        unsafe {
            let _ = CloseHandle(self.handle);
        }
        debug!("Closed handle to process {}", self.pid);
    }
}

/// Everything needed to drive one attached game session
pub struct AttachedGame {
    pub process: ProcessHandle,
    pub gate: DebugGate,
    pub keyboard: SendInputKeyboard,
    pub screen: ScreenCapturer,
}

/// Locate the game window, validate it and open the process behind it
pub fn attach(config: &AttachConfig) -> Result<AttachedGame> {
    let hwnd = select_single_window(
        &config.window_title,
        window::find_windows_by_title(&config.window_title)?,
    )?;
    info!("Found game window: {:?}", hwnd);

    let rect: WindowRect = window::window_rect(hwnd)?;
    validate_window_size(&rect, config)?;

    let process = ProcessHandle::open(hwnd, &config.module_name)?;
    info!(
        "Attached to {} (pid: {}, base: {:#x})",
        config.module_name, process.pid, process.base_address
    );

    let region = CaptureRegion::from_window(&rect, &config.frame);
    debug!("Capture region: {:?}", region);

    Ok(AttachedGame {
        gate: DebugGate::new(process.pid),
        keyboard: SendInputKeyboard::new(hwnd),
        screen: ScreenCapturer::new(region),
        process,
    })
}
