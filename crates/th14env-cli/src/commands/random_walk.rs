//! Random-action smoke test against a live game.

use anyhow::Result;
use rand::Rng;
use th14env::{Environment, ExecutionControl, FrameSource, KeyInjector, ReadMemory};
use tracing::info;

use crate::shutdown::ShutdownSignal;

pub fn run<R, G, K, F>(
    env: &mut Environment<R, G, K, F>,
    episodes: u32,
    shutdown: &ShutdownSignal,
) -> Result<()>
where
    R: ReadMemory,
    G: ExecutionControl,
    K: KeyInjector,
    F: FrameSource,
{
    let space = env.action_space();
    let mut rng = rand::thread_rng();

    for episode in 1..=episodes {
        if shutdown.is_shutdown() {
            break;
        }
        env.reset()?;
        let mut total = 0.0;
        let mut steps = 0u64;

        loop {
            if shutdown.is_shutdown() {
                info!("Stopping mid-episode");
                return Ok(());
            }
            let action = space.sample(|| rng.gen_range(0.0..1.0));
            let step = env.step(&action)?;
            total += step.reward;
            steps += 1;

            if step.terminated || step.truncated {
                info!(
                    "Episode {}: {} steps, return {:.1} ({})",
                    episode,
                    steps,
                    total,
                    if step.truncated { "truncated" } else { "terminated" }
                );
                break;
            }
        }
    }
    Ok(())
}
