use std::sync::atomic::{AtomicBool, Ordering};

/// Set from the Ctrl+C handler, polled between steps.
///
/// Commands never stop mid-step: the game is suspended between steps, so
/// stopping there leaves it in a state `close` can clean up.
pub struct ShutdownSignal {
    shutdown: AtomicBool,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self {
            shutdown: AtomicBool::new(false),
        }
    }

    pub fn trigger(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
