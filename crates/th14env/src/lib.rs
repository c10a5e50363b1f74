//! # th14env
//!
//! Reinforcement-learning environment over a running copy of Touhou 14
//! (Double Dealing Character), driven entirely from outside the process.
//!
//! This crate provides:
//! - Process discovery and memory reads, including multi-level pointer chains
//! - A typed registry of in-game telemetry
//! - Lockstep control: the game is suspended between steps and only runs
//!   inside waits on its own tick counter
//! - Key injection with persistent held-key state, and playfield capture
//! - Scripted menu navigation (enter practice, retry, skip dialog, quit)
//! - A `reset`/`step`/`close` adapter with pluggable reward strategies
//!
//! Only the OS-facing pieces are Windows-specific; everything above them is
//! generic over small traits ([`ReadMemory`], [`ExecutionControl`],
//! [`KeyInjector`], [`FrameSource`]).

pub mod capture;
pub mod clock;
pub mod config;
pub mod env;
pub mod error;
pub mod input;
pub mod memory;
pub mod prelude;
pub mod process;
pub mod scene;
pub mod telemetry;

#[cfg(test)]
mod testing;

pub use capture::{Frame, FrameHistory, FrameSource, FrameStack, GrayFrame};
pub use clock::TickClock;
pub use config::{EnvConfig, EnvConfigBuilder, ObservationMode, ScriptTiming};
pub use env::{
    Action, ActionKind, ActionSpace, EnvParts, Environment, Observation, ObservationSpace,
    RewardSpec, RewardStrategy, Step,
};
pub use error::{Error, Result};
pub use input::{InputActuator, Key, KeyInjector, Movement};
pub use memory::{OffsetSpec, ReadMemory};
pub use process::{AttachConfig, ExecutionControl};
pub use scene::Controller;
pub use telemetry::{GameState, Snapshot, Telemetry, TelemetryKey};

#[cfg(target_os = "windows")]
pub use env::GameEnv;
#[cfg(target_os = "windows")]
pub use process::{AttachedGame, attach};
