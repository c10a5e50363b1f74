//! Telemetry monitor.

use anyhow::Result;
use th14env::{Environment, ExecutionControl, FrameSource, KeyInjector, ReadMemory};
use tracing::info;

use crate::shutdown::ShutdownSignal;

/// Let the game run untouched and log every telemetry key each interval
pub fn run<R, G, K, F>(
    env: &mut Environment<R, G, K, F>,
    interval_ticks: u32,
    shutdown: &ShutdownSignal,
) -> Result<()>
where
    R: ReadMemory,
    G: ExecutionControl,
    K: KeyInjector,
    F: FrameSource,
{
    info!("Monitoring every {} ticks (Ctrl+C to stop)", interval_ticks);
    while !shutdown.is_shutdown() {
        let snapshot = env.idle(interval_ticks.max(1))?;
        info!(
            tick = snapshot.global_timer,
            state = ?snapshot.state(),
            "{}",
            serde_json::Value::Object(snapshot.to_info())
        );
    }
    Ok(())
}
