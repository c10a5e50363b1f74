use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "th14env")]
#[command(version, about = "Touhou 14 reinforcement-learning environment")]
pub struct Args {
    /// TOML file with `[attach]` and `[env]` tables
    #[arg(short, long, global = true, env = "TH14ENV_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Enter practice, then log telemetry until Ctrl+C
    Monitor {
        /// Game ticks between telemetry dumps
        #[arg(long, default_value_t = 30)]
        interval_ticks: u32,
    },
    /// Play uniformly random actions
    RandomWalk {
        #[arg(long, default_value_t = 2)]
        episodes: u32,
    },
    /// Exercise reset/step and verify the environment contract
    Check {
        /// Steps to take after reset; cycles through the discrete actions
        #[arg(long, default_value_t = 8)]
        steps: u32,
    },
}
