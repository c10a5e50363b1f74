//! The reset/step/close adapter over a running game.
//!
//! ## Example
//!
//! ```ignore
//! use th14env::{Action, EnvConfig, GameEnv};
//!
//! let mut env = GameEnv::attach(&Default::default(), EnvConfig::default())?;
//! let (observation, info) = env.reset()?;
//! loop {
//!     let step = env.step(&Action::Discrete(0))?;
//!     if step.terminated || step.truncated {
//!         env.reset()?;
//!     }
//! }
//! ```

mod action;
mod observation;
pub mod reward;
mod step_log;

use chrono::Local;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::capture::{FrameHistory, FrameSource, preprocess};
use crate::config::EnvConfig;
use crate::error::{Error, Result};
use crate::input::KeyInjector;
use crate::memory::ReadMemory;
use crate::process::ExecutionControl;
use crate::scene::Controller;
use crate::telemetry::{GameState, Snapshot, Telemetry};

pub use action::{Action, ActionDecoder, ActionKind, ActionSpace};
pub use observation::{Observation, ObservationSpace};
pub use reward::{RewardContext, RewardSpec, RewardStrategy};
pub use step_log::{StepLog, StepRecord};

/// The OS-facing pieces an environment is assembled from
pub struct EnvParts<R, G, K, F> {
    pub reader: R,
    pub base_address: u64,
    pub gate: G,
    pub keyboard: K,
    pub frames: F,
}

/// Result of one `step`
#[derive(Debug, Clone, Serialize)]
pub struct Step {
    pub observation: Observation,
    pub reward: f64,
    /// The game left the playing state
    pub terminated: bool,
    /// More lives were lost than the configuration allows
    pub truncated: bool,
    pub info: Snapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Open,
    Closed,
}

pub struct Environment<R, G, K, F>
where
    R: ReadMemory,
    G: ExecutionControl,
    K: KeyInjector,
    F: FrameSource,
{
    controller: Controller<R, G, K>,
    frames: F,
    config: EnvConfig,
    decoder: ActionDecoder,
    reward: Box<dyn RewardStrategy>,
    history: FrameHistory,
    last_info: Snapshot,
    initial_lives: i32,
    episode: u64,
    episode_steps: u64,
    step_log: Option<StepLog>,
    phase: Phase,
}

impl<R, G, K, F> Environment<R, G, K, F>
where
    R: ReadMemory,
    G: ExecutionControl,
    K: KeyInjector,
    F: FrameSource,
{
    /// Drive the game from the title screen into play and capture the
    /// first frame. The game is left suspended.
    pub fn new(parts: EnvParts<R, G, K, F>, config: EnvConfig) -> Result<Self> {
        config.validate()?;
        let EnvParts {
            reader,
            base_address,
            gate,
            keyboard,
            mut frames,
        } = parts;

        let telemetry = Telemetry::new(reader, base_address);
        let mut controller = Controller::new(telemetry, gate, keyboard, config.timing.clone());
        let (history, last_info, step_log) =
            match Self::start(&mut controller, &mut frames, &config) {
                Ok(started) => started,
                Err(e) => {
                    if let Err(release) = controller.release_all() {
                        warn!("Failed to release keys after a failed start: {}", release);
                    }
                    return Err(e);
                }
            };

        info!(
            "Environment ready ({} frames per step, {:?} actions)",
            config.n_frame_stack, config.action
        );

        Ok(Self {
            controller,
            frames,
            decoder: ActionDecoder::new(config.action),
            reward: config.reward.build(),
            initial_lives: last_info.lives,
            history,
            last_info,
            episode: 0,
            episode_steps: 0,
            step_log,
            phase: Phase::Open,
            config,
        })
    }

    /// Everything after the controller exists that can fail and leave keys held
    fn start(
        controller: &mut Controller<R, G, K>,
        frames: &mut F,
        config: &EnvConfig,
    ) -> Result<(FrameHistory, Snapshot, Option<StepLog>)> {
        controller.init()?;

        let first = preprocess(&frames.capture()?, config.downsize_ratio);
        let history = FrameHistory::new(config.n_frame_stack, first);
        let last_info = Snapshot::capture(controller.telemetry())?;

        let step_log = match &config.step_log_dir {
            Some(dir) if config.debug => {
                let mut log = StepLog::new(dir);
                let path = log.start()?;
                info!("Logging steps to {}", path.display());
                Some(log)
            }
            _ => None,
        };
        Ok((history, last_info, step_log))
    }

    fn ensure_open(&self) -> Result<()> {
        match self.phase {
            Phase::Open => Ok(()),
            Phase::Closed => Err(Error::Closed),
        }
    }

    fn capture_frame(&mut self) -> Result<()> {
        let frame = preprocess(&self.frames.capture()?, self.config.downsize_ratio);
        self.history.push(frame);
        Ok(())
    }

    fn observe(&self, snapshot: &Snapshot) -> Observation {
        Observation::build(self.config.observation, self.history.stack(), snapshot)
    }

    /// Start a new episode from wherever the game currently is
    pub fn reset(&mut self) -> Result<(Observation, Snapshot)> {
        self.ensure_open()?;
        self.controller.release_all()?;

        match self.controller.telemetry().game_state()? {
            GameState::EndOfRun => self.controller.reset_from_end_of_run()?,
            _ => self.controller.force_reset()?,
        }

        let first = preprocess(&self.frames.capture()?, self.config.downsize_ratio);
        self.history.fill(first);

        let info = Snapshot::capture(self.controller.telemetry())?;
        self.initial_lives = info.lives;
        self.reward.reset(&info);
        self.decoder.reset();
        self.episode += 1;
        self.episode_steps = 0;
        self.last_info = info.clone();

        debug!("Episode {} started with {} lives", self.episode, info.lives);
        Ok((self.observe(&info), info))
    }

    /// Hold `action` for `n_frame_stack` logical frames
    pub fn step(&mut self, action: &Action) -> Result<Step> {
        self.ensure_open()?;
        let (movement, slow) = self.decoder.decode(action)?;

        for _ in 0..self.config.n_frame_stack {
            self.controller.act(movement, slow)?;
            if self.controller.telemetry().game_state()? != GameState::Playing {
                break;
            }
            if self.controller.telemetry().in_dialog()? {
                self.controller.skip_dialog()?;
            }
            self.capture_frame()?;
        }

        let info = Snapshot::capture(self.controller.telemetry())?;
        let terminated = !info.is_playing();
        let truncated = i64::from(info.lives)
            < i64::from(self.initial_lives) - i64::from(self.config.max_lost_lives);
        self.episode_steps += 1;

        let reward = self.reward.reward(&RewardContext {
            previous: &self.last_info,
            current: &info,
            movement,
            slow,
            terminated,
            truncated,
            episode_steps: self.episode_steps,
        });

        if self.config.debug {
            info!(target: "th14env::step", ?action, reward, "step");
            if let Some(log) = &self.step_log {
                log.append(&StepRecord {
                    timestamp: Local::now(),
                    episode: self.episode,
                    step: self.episode_steps,
                    action,
                    reward,
                    terminated,
                    truncated,
                })?;
            }
        }

        self.last_info = info.clone();
        Ok(Step {
            observation: self.observe(&info),
            reward,
            terminated,
            truncated,
            info,
        })
    }

    /// Let the game run `ticks` ticks without touching the keys, then read
    /// all telemetry
    pub fn idle(&mut self, ticks: u32) -> Result<Snapshot> {
        self.ensure_open()?;
        self.controller.wait_ticks(ticks)?;
        Snapshot::capture(self.controller.telemetry())
    }

    /// Back the game out to the title screen and let it run freely.
    /// Closing twice is a no-op.
    ///
    /// The process handle, debugger attachment and keyboard are owned by
    /// the environment and released when it is dropped; after `close` they
    /// are no longer used.
    pub fn close(&mut self) -> Result<()> {
        if self.phase == Phase::Closed {
            return Ok(());
        }
        self.phase = Phase::Closed;
        let cleaned = self.controller.cleanup();
        let resumed = self.controller.resume();
        cleaned?;
        resumed?;
        info!("Environment closed");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.phase == Phase::Closed
    }

    pub fn action_space(&self) -> ActionSpace {
        self.config.action.space()
    }

    pub fn observation_space(&self) -> ObservationSpace {
        ObservationSpace::new(self.config.observation, self.history.stack().shape())
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn controller(&self) -> &Controller<R, G, K> {
        &self.controller
    }

    /// Snapshot as of the last `reset` or `step`
    pub fn last_info(&self) -> &Snapshot {
        &self.last_info
    }

    pub fn episode_steps(&self) -> u64 {
        self.episode_steps
    }
}

impl<R, G, K, F> Drop for Environment<R, G, K, F>
where
    R: ReadMemory,
    G: ExecutionControl,
    K: KeyInjector,
    F: FrameSource,
{
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close environment cleanly: {}", e);
        }
    }
}

#[cfg(target_os = "windows")]
mod attached {
    use super::*;
    use crate::capture::ScreenCapturer;
    use crate::input::SendInputKeyboard;
    use crate::process::{AttachConfig, DebugGate, ProcessHandle, attach};

    /// Environment over a live game process
    pub type GameEnv = Environment<ProcessHandle, DebugGate, SendInputKeyboard, ScreenCapturer>;

    impl GameEnv {
        /// Find the game window, open the process and start an environment on it
        pub fn attach(attach_config: &AttachConfig, config: EnvConfig) -> Result<Self> {
            let game = attach(attach_config)?;
            let base_address = game.process.base_address;
            let keyboard = game
                .keyboard
                .with_focus_settle(config.timing.focus_settle());
            Environment::new(
                EnvParts {
                    reader: game.process,
                    base_address,
                    gate: game.gate,
                    keyboard,
                    frames: game.screen,
                },
                config,
            )
        }
    }
}

#[cfg(target_os = "windows")]
pub use attached::GameEnv;
