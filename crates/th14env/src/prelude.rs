//! Prelude module for convenient imports
//!
//! ```ignore
//! use th14env::prelude::*;
//! ```
//!
//! Brings the environment, its configuration, actions and the seam traits
//! into scope.

// Environment
pub use crate::config::{EnvConfig, ObservationMode};
pub use crate::env::{Action, ActionKind, Environment, Observation, RewardSpec, Step};

// Error handling
pub use crate::error::{Error, Result};

// Telemetry
pub use crate::telemetry::{GameState, Snapshot, TelemetryKey};

// Seams
pub use crate::capture::FrameSource;
pub use crate::input::KeyInjector;
pub use crate::memory::ReadMemory;
pub use crate::process::{AttachConfig, ExecutionControl};

#[cfg(target_os = "windows")]
pub use crate::env::GameEnv;
