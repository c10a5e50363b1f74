//! Waiting on the game's own tick counter.
//!
//! The game runs on its own wall clock; the only time base shared with the
//! controller is the resident global tick counter. Waits resume the game,
//! busy-poll the counter and suspend again before returning.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{Error, Result};
use crate::memory::ReadMemory;
use crate::process::ExecutionControl;
use crate::telemetry::Telemetry;

#[derive(Debug, Clone, Copy)]
pub struct TickClock {
    spin_ceiling: Duration,
}

impl TickClock {
    pub fn new(spin_ceiling: Duration) -> Self {
        Self { spin_ceiling }
    }

    /// Let the game run for at least `ticks` ticks, leaving it suspended.
    ///
    /// Only forward movement of the counter counts, so a counter that is
    /// re-based mid-wait cannot end the wait early.
    pub fn wait_ticks<R, G>(&self, telemetry: &Telemetry<R>, gate: &mut G, ticks: u32) -> Result<()>
    where
        R: ReadMemory,
        G: ExecutionControl,
    {
        gate.resume()?;
        let waited = self.spin(telemetry, ticks);
        let suspended = gate.suspend();
        waited?;
        suspended
    }

    /// Wait until `ticks` ticks have passed since `start`; returns
    /// immediately (still suspended) if they already have.
    pub fn wait_since<R, G>(
        &self,
        telemetry: &Telemetry<R>,
        gate: &mut G,
        start: i32,
        ticks: u32,
    ) -> Result<()>
    where
        R: ReadMemory,
        G: ExecutionControl,
    {
        let elapsed = telemetry.tick()?.wrapping_sub(start).max(0) as u32;
        let remaining = ticks.saturating_sub(elapsed);
        if remaining == 0 {
            return Ok(());
        }
        self.wait_ticks(telemetry, gate, remaining)
    }

    fn spin<R: ReadMemory>(&self, telemetry: &Telemetry<R>, ticks: u32) -> Result<()> {
        let started = Instant::now();
        let mut last = telemetry.tick()?;
        let mut elapsed: u32 = 0;

        while elapsed < ticks {
            let now = telemetry.tick()?;
            if now > last {
                elapsed = elapsed.saturating_add(now.wrapping_sub(last) as u32);
            } else if now < last {
                debug!("Tick counter moved backwards: {} -> {}", last, now);
            }
            last = now;

            if elapsed < ticks && started.elapsed() > self.spin_ceiling {
                return Err(Error::TickStalled {
                    ticks,
                    waited: started.elapsed(),
                });
            }
            std::hint::spin_loop();
        }
        Ok(())
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}
