use serde::Serialize;

use crate::capture::FrameStack;
use crate::config::ObservationMode;
use crate::telemetry::Snapshot;

/// What the agent sees after `reset` and each `step`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub frames: FrameStack,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_position: Option<[f32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boss_position: Option<[f32; 2]>,
}

impl Observation {
    /// Positions that failed to read are reported as the origin
    pub fn build(mode: ObservationMode, frames: FrameStack, snapshot: &Snapshot) -> Self {
        let player = || Some(snapshot.player_position.unwrap_or_default());
        let boss = || Some(snapshot.boss_position.unwrap_or_default());
        let (player_position, boss_position) = match mode {
            ObservationMode::Frames => (None, None),
            ObservationMode::FramesWithPlayer => (player(), None),
            ObservationMode::FramesWithPlayerAndBoss => (player(), boss()),
        };
        Self {
            frames,
            player_position,
            boss_position,
        }
    }

    /// Positions flattened in order: player x, y, then boss x, y
    pub fn positions(&self) -> Vec<f32> {
        self.player_position
            .into_iter()
            .chain(self.boss_position)
            .flatten()
            .collect()
    }
}

/// Shape of observations for a given mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObservationSpace {
    /// `[depth, height, width]`
    pub frames: [usize; 3],
    /// Length of [`Observation::positions`]
    pub positions: usize,
}

impl ObservationSpace {
    pub fn new(mode: ObservationMode, frames: [usize; 3]) -> Self {
        let positions = match mode {
            ObservationMode::Frames => 0,
            ObservationMode::FramesWithPlayer => 2,
            ObservationMode::FramesWithPlayerAndBoss => 4,
        };
        Self { frames, positions }
    }
}
