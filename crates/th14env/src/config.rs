//! Environment configuration.
//!
//! ## Example
//!
//! ```ignore
//! use th14env::config::{EnvConfig, ObservationMode};
//!
//! let config = EnvConfig::builder()
//!     .n_frame_stack(4)
//!     .downsize_ratio(0.5)
//!     .observation(ObservationMode::FramesWithPlayer)
//!     .build()?;
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::env::{ActionKind, RewardSpec};
use crate::error::{Error, Result};

/// What `reset`/`step` return as the observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationMode {
    /// Stacked grayscale frames only
    #[default]
    Frames,
    /// Frames plus the player position
    FramesWithPlayer,
    /// Frames plus player and boss positions
    FramesWithPlayerAndBoss,
}

/// Bounded retry for a polling script: at most `max_retry` samples,
/// one every `interval_ticks` game ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollBudget {
    pub max_retry: u32,
    pub interval_ticks: u32,
}

/// Empirically chosen script constants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptTiming {
    /// Rough upper bound on dialog length, in polls
    pub dialog_max_retry: u32,
    pub dialog_poll_ticks: u32,
    /// Consecutive "not in dialog" polls needed before leaving a dialog;
    /// absorbs flicker during the close animation
    pub dialog_debounce: u32,
    pub reset_max_retry: u32,
    pub reset_poll_ticks: u32,
    /// Wall-clock ceiling for a single tick wait, in case the game halts
    pub spin_ceiling_ms: u64,
    /// Pause after focusing the window before injecting keys
    pub focus_settle_ms: u64,
}

impl Default for ScriptTiming {
    fn default() -> Self {
        Self {
            dialog_max_retry: 180,
            dialog_poll_ticks: 5,
            dialog_debounce: 3,
            reset_max_retry: 60,
            reset_poll_ticks: 5,
            spin_ceiling_ms: 10_000,
            focus_settle_ms: 200,
        }
    }
}

impl ScriptTiming {
    pub fn dialog_budget(&self) -> PollBudget {
        PollBudget {
            max_retry: self.dialog_max_retry,
            interval_ticks: self.dialog_poll_ticks,
        }
    }

    pub fn reset_budget(&self) -> PollBudget {
        PollBudget {
            max_retry: self.reset_max_retry,
            interval_ticks: self.reset_poll_ticks,
        }
    }

    pub fn spin_ceiling(&self) -> Duration {
        Duration::from_millis(self.spin_ceiling_ms)
    }

    pub fn focus_settle(&self) -> Duration {
        Duration::from_millis(self.focus_settle_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dialog_debounce == 0 {
            return Err(Error::Configuration(
                "dialog_debounce must be at least 1".to_string(),
            ));
        }
        if self.dialog_max_retry == 0 || self.reset_max_retry == 0 {
            return Err(Error::Configuration(
                "retry budgets must be at least 1".to_string(),
            ));
        }
        if self.spin_ceiling_ms == 0 {
            return Err(Error::Configuration(
                "spin_ceiling_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for the environment adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    /// Logical frames per step, and depth of the observation stack
    pub n_frame_stack: usize,
    /// Frame downsize ratio, 0 < r <= 1
    pub downsize_ratio: f32,
    /// Lives that may be lost before the episode is truncated
    pub max_lost_lives: i32,
    /// Log `{action, reward}` for every step
    pub debug: bool,
    /// Also append the debug records as JSON lines under this directory
    pub step_log_dir: Option<PathBuf>,
    pub observation: ObservationMode,
    pub action: ActionKind,
    pub reward: RewardSpec,
    pub timing: ScriptTiming,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            n_frame_stack: 4,
            downsize_ratio: 1.0,
            max_lost_lives: 2,
            debug: false,
            step_log_dir: None,
            observation: ObservationMode::default(),
            action: ActionKind::default(),
            reward: RewardSpec::default(),
            timing: ScriptTiming::default(),
        }
    }
}

impl EnvConfig {
    /// Create a new configuration builder
    pub fn builder() -> EnvConfigBuilder {
        EnvConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_frame_stack < 1 {
            return Err(Error::Configuration(format!(
                "n_frame_stack must be at least 1, got {}",
                self.n_frame_stack
            )));
        }
        if !(self.downsize_ratio > 0.0 && self.downsize_ratio <= 1.0) {
            return Err(Error::Configuration(format!(
                "downsize_ratio must be in (0, 1], got {}",
                self.downsize_ratio
            )));
        }
        if self.max_lost_lives < 0 {
            return Err(Error::Configuration(format!(
                "max_lost_lives must be non-negative, got {}",
                self.max_lost_lives
            )));
        }
        self.reward.validate()?;
        self.timing.validate()
    }
}

/// Builder for EnvConfig
#[derive(Debug, Clone, Default)]
pub struct EnvConfigBuilder {
    n_frame_stack: Option<usize>,
    downsize_ratio: Option<f32>,
    max_lost_lives: Option<i32>,
    debug: Option<bool>,
    step_log_dir: Option<PathBuf>,
    observation: Option<ObservationMode>,
    action: Option<ActionKind>,
    reward: Option<RewardSpec>,
    timing: Option<ScriptTiming>,
}

impl EnvConfigBuilder {
    pub fn n_frame_stack(mut self, depth: usize) -> Self {
        self.n_frame_stack = Some(depth);
        self
    }

    pub fn downsize_ratio(mut self, ratio: f32) -> Self {
        self.downsize_ratio = Some(ratio);
        self
    }

    pub fn max_lost_lives(mut self, lives: i32) -> Self {
        self.max_lost_lives = Some(lives);
        self
    }

    /// Enable the per-step `{action, reward}` log
    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = Some(enabled);
        self
    }

    pub fn step_log_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.step_log_dir = Some(path.into());
        self
    }

    pub fn observation(mut self, mode: ObservationMode) -> Self {
        self.observation = Some(mode);
        self
    }

    pub fn action(mut self, kind: ActionKind) -> Self {
        self.action = Some(kind);
        self
    }

    pub fn reward(mut self, reward: RewardSpec) -> Self {
        self.reward = Some(reward);
        self
    }

    pub fn timing(mut self, timing: ScriptTiming) -> Self {
        self.timing = Some(timing);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<EnvConfig> {
        let default = EnvConfig::default();
        let config = EnvConfig {
            n_frame_stack: self.n_frame_stack.unwrap_or(default.n_frame_stack),
            downsize_ratio: self.downsize_ratio.unwrap_or(default.downsize_ratio),
            max_lost_lives: self.max_lost_lives.unwrap_or(default.max_lost_lives),
            debug: self.debug.unwrap_or(default.debug),
            step_log_dir: self.step_log_dir.or(default.step_log_dir),
            observation: self.observation.unwrap_or(default.observation),
            action: self.action.unwrap_or(default.action),
            reward: self.reward.unwrap_or(default.reward),
            timing: self.timing.unwrap_or(default.timing),
        };
        config.validate()?;
        Ok(config)
    }
}
