//! Environment contract check.

use anyhow::{Result, bail};
use th14env::{
    Action, ActionKind, ActionSpace, Environment, ExecutionControl, FrameSource, KeyInjector,
    ObservationSpace, ReadMemory, Step,
};
use tracing::{info, warn};

/// Info keys every step must report, advisory ones included
const INFO_KEYS: [&str; 15] = [
    "score",
    "lives",
    "life_fragments",
    "bombs",
    "bomb_fragments",
    "power",
    "game_state",
    "in_dialog",
    "global_timer",
    "bonus_count",
    "piv",
    "graze",
    "boss_hp",
    "player_position",
    "boss_position",
];

/// Action for step `index`, cycling through the discrete encoding
fn action_for(kind: ActionKind, index: usize) -> Action {
    let discrete = index % 10;
    match kind {
        ActionKind::Discrete => Action::Discrete(discrete),
        ActionKind::MultiDiscrete => Action::MultiDiscrete([discrete / 5, discrete % 5]),
        ActionKind::Continuous => {
            let axes = [[0.0, 0.0], [-1.0, 0.0], [1.0, 0.0], [0.0, 1.0], [0.0, -1.0]];
            Action::Continuous(axes[discrete % 5].to_vec())
        }
        ActionKind::ContinuousScalar => Action::Continuous(vec![discrete as f32 + 0.5]),
    }
}

/// Contract violations in one step's output
pub fn violations(expected: &ObservationSpace, step: &Step) -> Vec<String> {
    let mut problems = Vec::new();

    let shape = step.observation.frames.shape();
    if shape != expected.frames {
        problems.push(format!(
            "frame stack shape {:?}, expected {:?}",
            shape, expected.frames
        ));
    }
    let positions = step.observation.positions().len();
    if positions != expected.positions {
        problems.push(format!(
            "{} position values, expected {}",
            positions, expected.positions
        ));
    }
    if !step.reward.is_finite() {
        problems.push(format!("reward {} is not finite", step.reward));
    }

    let info = step.info.to_info();
    for key in INFO_KEYS {
        if !info.contains_key(key) {
            problems.push(format!("info is missing '{}'", key));
        }
    }
    problems
}

pub fn run<R, G, K, F>(env: &mut Environment<R, G, K, F>, steps: u32) -> Result<()>
where
    R: ReadMemory,
    G: ExecutionControl,
    K: KeyInjector,
    F: FrameSource,
{
    let kind = env.config().action;
    match env.action_space() {
        ActionSpace::Discrete { n } => info!("Action space: discrete({})", n),
        space => info!("Action space: {}", serde_json::to_string(&space)?),
    }

    env.reset()?;
    let expected = env.observation_space();
    info!("Observation space: {:?}", expected);

    let mut failures = 0;
    for index in 0..steps as usize {
        let action = action_for(kind, index);
        let step = env.step(&action)?;
        for problem in violations(&expected, &step) {
            warn!("Step {} ({:?}): {}", index, action, problem);
            failures += 1;
        }
        if step.terminated || step.truncated {
            info!("Episode ended at step {}, resetting", index);
            env.reset()?;
        }
    }

    if failures > 0 {
        bail!("Contract check failed with {} violations", failures);
    }
    info!("Contract check passed ({} steps)", steps);
    Ok(())
}
