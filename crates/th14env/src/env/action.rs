//! Agent actions and their decoding into held keys.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::input::Movement;

const MOVES: usize = 5;
/// Continuous components inside ±this are "no movement"
const DEADZONE: f32 = 0.5;

/// How the agent encodes its action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// One integer in `0..10`: movement `a % 5`, slow when `a >= 5`
    #[default]
    Discrete,
    /// `[slow, move]` with `slow` in `0..2` and `move` in `0..5`
    MultiDiscrete,
    /// `[horizontal, vertical]`, each in `[-1, 1]`
    Continuous,
    /// One float in `[0, 10]`, floored onto the discrete encoding
    ContinuousScalar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Discrete(usize),
    MultiDiscrete([usize; 2]),
    Continuous(Vec<f32>),
}

/// Shape of the action space, for agents that size their output from it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionSpace {
    Discrete { n: usize },
    MultiDiscrete { nvec: Vec<usize> },
    Box { low: Vec<f32>, high: Vec<f32> },
}

impl ActionKind {
    pub fn space(self) -> ActionSpace {
        match self {
            Self::Discrete => ActionSpace::Discrete { n: MOVES * 2 },
            Self::MultiDiscrete => ActionSpace::MultiDiscrete {
                nvec: vec![2, MOVES],
            },
            Self::Continuous => ActionSpace::Box {
                low: vec![-1.0, -1.0],
                high: vec![1.0, 1.0],
            },
            Self::ContinuousScalar => ActionSpace::Box {
                low: vec![0.0],
                high: vec![(MOVES * 2) as f32],
            },
        }
    }
}

impl ActionSpace {
    /// A uniformly random valid action from `unit`, a source of values in `[0, 1)`
    pub fn sample(&self, mut unit: impl FnMut() -> f32) -> Action {
        let pick = |n: usize, u: f32| ((u * n as f32) as usize).min(n - 1);
        match self {
            Self::Discrete { n } => Action::Discrete(pick(*n, unit())),
            Self::MultiDiscrete { nvec } => {
                let slow = pick(nvec[0], unit());
                let movement = pick(nvec[1], unit());
                Action::MultiDiscrete([slow, movement])
            }
            Self::Box { low, high } => Action::Continuous(
                low.iter()
                    .zip(high)
                    .map(|(lo, hi)| lo + (hi - lo) * unit())
                    .collect(),
            ),
        }
    }
}

/// Decodes actions of one kind; the continuous 2-D decoding alternates
/// which axis wins from step to step, so it carries a counter.
#[derive(Debug, Clone)]
pub struct ActionDecoder {
    kind: ActionKind,
    steps: u64,
}

impl ActionDecoder {
    pub fn new(kind: ActionKind) -> Self {
        Self { kind, steps: 0 }
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn reset(&mut self) {
        self.steps = 0;
    }

    /// Map an action onto `(movement, slow)`, rejecting out-of-range values
    pub fn decode(&mut self, action: &Action) -> Result<(Movement, bool)> {
        let decoded = match (self.kind, action) {
            (ActionKind::Discrete, Action::Discrete(index)) => decode_discrete(*index)?,
            (ActionKind::MultiDiscrete, Action::MultiDiscrete([slow, movement])) => {
                let slow = match slow {
                    0 => false,
                    1 => true,
                    other => {
                        return Err(Error::InvalidAction(format!(
                            "slow {} should be 0 or 1",
                            other
                        )));
                    }
                };
                (Movement::from_index(*movement)?, slow)
            }
            (ActionKind::Continuous, Action::Continuous(values)) => {
                let [horizontal, vertical] = finite_components::<2>(values)?;
                (self.decode_planar(horizontal, vertical), false)
            }
            (ActionKind::ContinuousScalar, Action::Continuous(values)) => {
                let [x] = finite_components::<1>(values)?;
                decode_discrete(scalar_index(x)?)?
            }
            (kind, action) => {
                return Err(Error::InvalidAction(format!(
                    "{:?} is not a {:?} action",
                    action, kind
                )));
            }
        };
        self.steps += 1;
        Ok(decoded)
    }

    /// Even steps give the vertical axis priority, odd steps the horizontal
    fn decode_planar(&self, horizontal: f32, vertical: f32) -> Movement {
        let horizontal = if horizontal < -DEADZONE {
            Movement::Left
        } else if horizontal > DEADZONE {
            Movement::Right
        } else {
            Movement::None
        };
        let vertical = if vertical < -DEADZONE {
            Movement::Down
        } else if vertical > DEADZONE {
            Movement::Up
        } else {
            Movement::None
        };

        let (first, second) = if self.steps % 2 == 0 {
            (vertical, horizontal)
        } else {
            (horizontal, vertical)
        };
        if first != Movement::None { first } else { second }
    }
}

fn decode_discrete(index: usize) -> Result<(Movement, bool)> {
    if index >= MOVES * 2 {
        return Err(Error::InvalidAction(format!(
            "action {} should be 0 - {}",
            index,
            MOVES * 2 - 1
        )));
    }
    Ok((Movement::from_index(index % MOVES)?, index >= MOVES))
}

/// Floor onto `0..10`; the closed upper bound maps to the last index
fn scalar_index(x: f32) -> Result<usize> {
    let n = (MOVES * 2) as f32;
    if !(0.0..=n).contains(&x) {
        return Err(Error::InvalidAction(format!(
            "scalar action {} should be in [0, {}]",
            x, n
        )));
    }
    Ok((x.floor() as usize).min(MOVES * 2 - 1))
}

fn finite_components<const N: usize>(values: &[f32]) -> Result<[f32; N]> {
    let components: [f32; N] = values.try_into().map_err(|_| {
        Error::InvalidAction(format!(
            "expected {} components, got {}",
            N,
            values.len()
        ))
    })?;
    if components.iter().any(|v| !v.is_finite()) {
        return Err(Error::InvalidAction(format!(
            "non-finite component in {:?}",
            values
        )));
    }
    Ok(components)
}
