//! Scripted transitions between game screens.
//!
//! [`Controller`] owns everything needed to drive the game: telemetry, the
//! execution gate, the key actuator and the tick clock. Every public
//! operation starts and ends with the game suspended; the game only runs
//! inside tick waits.

mod debounce;
pub mod script;

use tracing::{debug, info, warn};

use crate::clock::TickClock;
use crate::config::{PollBudget, ScriptTiming};
use crate::error::{Error, Result};
use crate::input::{InputActuator, Key, KeyInjector, Movement};
use crate::memory::ReadMemory;
use crate::process::ExecutionControl;
use crate::telemetry::{GameState, Telemetry};

pub use debounce::Debounce;
pub use script::ScriptStep;

pub struct Controller<R, G, K> {
    telemetry: Telemetry<R>,
    gate: G,
    actuator: InputActuator<K>,
    clock: TickClock,
    timing: ScriptTiming,
}

impl<R, G, K> Controller<R, G, K>
where
    R: ReadMemory,
    G: ExecutionControl,
    K: KeyInjector,
{
    pub fn new(telemetry: Telemetry<R>, gate: G, keyboard: K, timing: ScriptTiming) -> Self {
        Self {
            telemetry,
            gate,
            actuator: InputActuator::new(keyboard),
            clock: TickClock::new(timing.spin_ceiling()),
            timing,
        }
    }

    pub fn telemetry(&self) -> &Telemetry<R> {
        &self.telemetry
    }

    pub fn gate(&self) -> &G {
        &self.gate
    }

    pub fn actuator(&self) -> &InputActuator<K> {
        &self.actuator
    }

    pub fn timing(&self) -> &ScriptTiming {
        &self.timing
    }

    pub fn suspend(&mut self) -> Result<()> {
        self.gate.suspend()
    }

    pub fn resume(&mut self) -> Result<()> {
        self.gate.resume()
    }

    /// Run `op`, then suspend the game whether or not `op` succeeded
    fn guarded<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let result = op(self);
        let suspended = self.gate.suspend();
        let value = result?;
        suspended?;
        Ok(value)
    }

    pub fn wait_ticks(&mut self, ticks: u32) -> Result<()> {
        self.clock.wait_ticks(&self.telemetry, &mut self.gate, ticks)
    }

    pub fn release_all(&mut self) -> Result<()> {
        self.actuator.release_all()
    }

    /// Press and release one key with a tick after each edge
    pub fn tap(&mut self, key: Key) -> Result<()> {
        if self.actuator.release(key)? {
            self.wait_ticks(1)?;
        }
        self.actuator.press(key)?;
        self.wait_ticks(1)?;
        self.actuator.release(key)?;
        self.wait_ticks(1)
    }

    /// Re-arm the always-on fire key after a script touched the keyboard
    pub fn resume_shooting(&mut self) -> Result<()> {
        self.actuator.release(Key::SHOOT)?;
        self.wait_ticks(1)?;
        self.actuator.press(Key::SHOOT)?;
        Ok(())
    }

    /// One logical frame of play: hold the keys for one tick
    pub fn act(&mut self, movement: Movement, slow: bool) -> Result<()> {
        self.guarded(|c| {
            c.gate.resume()?;
            c.actuator.press(Key::SHOOT)?;
            c.actuator.set_movement(movement)?;
            c.actuator.set_slow(slow)?;
            c.wait_ticks(1)
        })
    }

    pub fn run(&mut self, steps: &[ScriptStep]) -> Result<()> {
        for step in steps {
            match *step {
                ScriptStep::Tap(key) => self.tap(key)?,
                ScriptStep::Wait(ticks) => self.wait_ticks(ticks)?,
            }
        }
        Ok(())
    }

    /// Sample `done` once every `budget.interval_ticks` until it reports
    /// true. Returns the number of samples taken.
    fn poll(
        &mut self,
        script: &'static str,
        budget: PollBudget,
        mut done: impl FnMut(&Telemetry<R>) -> Result<bool>,
    ) -> Result<u32> {
        for attempt in 1..=budget.max_retry {
            let started = self.telemetry.tick()?;
            if done(&self.telemetry)? {
                debug!("'{}' settled after {} polls", script, attempt);
                return Ok(attempt);
            }
            self.clock
                .wait_since(&self.telemetry, &mut self.gate, started, budget.interval_ticks)?;
        }
        Err(Error::ScriptTimeout {
            script,
            attempts: budget.max_retry,
        })
    }

    fn await_playing(&mut self, script: &'static str) -> Result<u32> {
        let budget = self.timing.reset_budget();
        self.poll(script, budget, |telemetry| {
            Ok(telemetry.game_state()? == GameState::Playing)
        })
    }

    /// Title screen to a running spell card practice
    pub fn init(&mut self) -> Result<()> {
        info!("Entering spell card practice from the title screen");
        self.guarded(|c| {
            c.actuator.focus()?;
            c.actuator.release_all()?;
            c.run(script::TITLE_TO_PRACTICE)?;
            c.resume_shooting()
        })
    }

    /// Retry from the end-of-run menu
    pub fn reset_from_end_of_run(&mut self) -> Result<()> {
        debug!("Retrying from the end-of-run menu");
        self.guarded(|c| {
            c.actuator.release_all()?;
            c.run(script::RETRY_FROM_END_OF_RUN)?;
            c.await_playing("reset_from_end_of_run")?;
            c.resume_shooting()
        })
    }

    /// Restart through the pause menu from any other state
    pub fn force_reset(&mut self) -> Result<()> {
        debug!("Restarting through the pause menu");
        self.guarded(|c| {
            c.actuator.release_all()?;
            c.run(script::RESTART_FROM_PLAY)?;
            c.await_playing("force_reset")?;
            c.resume_shooting()
        })
    }

    /// Hold the skip key until the dialog flag has been clear for
    /// `dialog_debounce` consecutive polls
    pub fn skip_dialog(&mut self) -> Result<()> {
        debug!("Skipping dialog");
        self.guarded(|c| {
            c.actuator.release_all()?;
            c.wait_ticks(c.timing.dialog_poll_ticks)?;
            c.actuator.press(Key::SKIP)?;

            let budget = c.timing.dialog_budget();
            let mut closed = Debounce::new(c.timing.dialog_debounce);
            let polled = c.poll("skip_dialog", budget, |telemetry| {
                Ok(closed.observe(!telemetry.in_dialog()?))
            });
            if polled.is_err() {
                // Leave the skip key up even when giving up
                if let Err(e) = c.actuator.release(Key::SKIP) {
                    warn!("Failed to release skip key: {}", e);
                }
            }
            polled?;

            c.actuator.release(Key::SKIP)?;
            c.resume_shooting()
        })
    }

    /// Leave whatever screen the game is on and back out to the title
    pub fn cleanup(&mut self) -> Result<()> {
        info!("Returning the game to the title screen");
        self.guarded(|c| {
            c.actuator.focus()?;
            c.gate.resume()?;
            c.actuator.release_all()?;
            c.wait_ticks(60)?;

            let state = c.telemetry.game_state()?;
            let quit = match state {
                GameState::Paused => script::QUIT_FROM_PAUSE,
                GameState::EndOfRun => script::QUIT_FROM_END_OF_RUN,
                _ => script::QUIT_FROM_PLAY,
            };
            debug!("Quitting from {:?}", state);
            c.run(quit)?;
            c.run(script::BACK_TO_TITLE)
        })
    }
}
