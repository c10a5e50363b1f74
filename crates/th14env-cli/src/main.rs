use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
mod commands;
mod settings;
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
mod shutdown;

use cli::Args;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("th14env=info".parse()?))
        .init();

    let args = Args::parse();
    let settings = settings::load_or_default(args.config.as_deref())?;

    run(args, settings)
}

#[cfg(target_os = "windows")]
fn run(args: Args, settings: settings::Settings) -> Result<()> {
    use std::sync::Arc;

    use th14env::GameEnv;
    use tracing::info;

    use crate::cli::Command;
    use crate::shutdown::ShutdownSignal;

    let shutdown = Arc::new(ShutdownSignal::new());
    let shutdown_ctrlc = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal, stopping...");
        shutdown_ctrlc.trigger();
    })?;

    info!("th14env {}", env!("CARGO_PKG_VERSION"));
    let mut env = GameEnv::attach(&settings.attach, settings.env)?;

    let outcome = match args.command {
        Command::Monitor { interval_ticks } => {
            commands::monitor::run(&mut env, interval_ticks, &shutdown)
        }
        Command::RandomWalk { episodes } => {
            commands::random_walk::run(&mut env, episodes, &shutdown)
        }
        Command::Check { steps } => commands::check::run(&mut env, steps),
    };

    let closed = env.close();
    outcome?;
    closed?;
    Ok(())
}

#[cfg(not(target_os = "windows"))]
fn run(_args: Args, _settings: settings::Settings) -> Result<()> {
    anyhow::bail!("th14env drives the game through Win32 APIs and only runs on Windows")
}
