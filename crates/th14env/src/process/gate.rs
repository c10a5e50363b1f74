//! Global pause over the game's threads.

use crate::error::Result;

/// Suspend/resume control over the foreign process.
///
/// Implementations are idempotent: suspending an already suspended process
/// (or resuming a running one) is a no-op.
pub trait ExecutionControl {
    fn suspend(&mut self) -> Result<()>;
    fn resume(&mut self) -> Result<()>;
    fn is_suspended(&self) -> bool;
}

impl<G: ExecutionControl + ?Sized> ExecutionControl for &mut G {
    fn suspend(&mut self) -> Result<()> {
        (**self).suspend()
    }

    fn resume(&mut self) -> Result<()> {
        (**self).resume()
    }

    fn is_suspended(&self) -> bool {
        (**self).is_suspended()
    }
}

#[cfg(target_os = "windows")]
pub use debug::DebugGate;

#[cfg(target_os = "windows")]
mod debug {
    use tracing::{debug, warn};
    use windows::Win32::Foundation::BOOL;
    use windows::Win32::System::Diagnostics::Debug::{
        DebugActiveProcess, DebugActiveProcessStop, DebugSetProcessKillOnExit,
    };

    use super::ExecutionControl;
    use crate::error::{Error, Result};

    /// Freezes the game by attaching as its debugger.
    ///
    /// While attached, the pending attach events hold every thread of the
    /// target; detaching releases them.
    #[derive(Debug)]
    pub struct DebugGate {
        pid: u32,
        suspended: bool,
    }

    impl DebugGate {
        pub fn new(pid: u32) -> Self {
            Self {
                pid,
                suspended: false,
            }
        }
    }

    impl ExecutionControl for DebugGate {
        fn suspend(&mut self) -> Result<()> {
            if self.suspended {
                return Ok(());
            }
            // SAFETY: DebugActiveProcess only takes a process ID.
            unsafe { DebugActiveProcess(self.pid) }.map_err(|e| {
                Error::Gate(format!("DebugActiveProcess({}) failed: {}", self.pid, e))
            })?;
            // The game must survive this process exiting while attached
            // SAFETY: applies to the calling thread's debug attachment.
            if let Err(e) = unsafe { DebugSetProcessKillOnExit(BOOL::from(false)) } {
                warn!("DebugSetProcessKillOnExit failed: {}", e);
            }
            self.suspended = true;
            Ok(())
        }

        fn resume(&mut self) -> Result<()> {
            if !self.suspended {
                return Ok(());
            }
            // SAFETY: DebugActiveProcessStop only takes a process ID.
            unsafe { DebugActiveProcessStop(self.pid) }.map_err(|e| {
                Error::Gate(format!(
                    "DebugActiveProcessStop({}) failed: {}",
                    self.pid, e
                ))
            })?;
            self.suspended = false;
            Ok(())
        }

        fn is_suspended(&self) -> bool {
            self.suspended
        }
    }

    impl Drop for DebugGate {
        fn drop(&mut self) {
            if self.suspended {
                debug!("Releasing debug attachment on drop");
                if let Err(e) = self.resume() {
                    warn!("Failed to resume game on drop: {}", e);
                }
            }
        }
    }
}
