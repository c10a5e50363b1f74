use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to attach to game: {0}")]
    Attach(String),

    #[error("Failed to read process memory at address {address:#x}: {message}")]
    MemoryRead { address: u64, message: String },

    #[error("Script '{script}' did not reach its expected state after {attempts} attempts")]
    ScriptTimeout { script: &'static str, attempts: u32 },

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Tick counter did not advance by {ticks} within {waited:?}")]
    TickStalled { ticks: u32, waited: Duration },

    #[error("Execution gate failed: {0}")]
    Gate(String),

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Key injection failed: {0}")]
    Input(String),

    #[error("Frame capture failed: {0}")]
    Capture(String),

    #[error("Environment is closed")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error came from an unreadable foreign address
    pub fn is_memory_read(&self) -> bool {
        matches!(self, Error::MemoryRead { .. })
    }

    /// Errors that leave the session in a state no automatic retry can fix
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Attach(_)
                | Error::Configuration(_)
                | Error::ScriptTimeout { .. }
                | Error::TickStalled { .. }
                | Error::Closed
        )
    }
}
