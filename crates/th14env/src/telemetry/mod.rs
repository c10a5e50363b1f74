//! Named, typed values read from the game's memory.

mod snapshot;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};
use tracing::warn;

use crate::error::Result;
use crate::memory::layout::{boss, globals, player, timer};
use crate::memory::{OffsetSpec, ReadMemory};

pub use snapshot::Snapshot;

/// In-game dialog flag value meaning "dialog on screen"
pub const DIALOG_ACTIVE: i32 = -1;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, IntoStaticStr, Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TelemetryKey {
    Score,
    Lives,
    LifeFragments,
    Bombs,
    BombFragments,
    BonusCount,
    Power,
    Piv,
    Graze,
    GameState,
    InDialog,
    GlobalTimer,
    PlayerPosX,
    PlayerPosY,
    BossHp,
    BossPosX,
    BossPosY,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Signed little-endian i32, also for conceptually unsigned fields so
    /// sentinel values like `-1` survive
    Int,
    /// IEEE-754 single precision
    Float,
}

/// How a failed read of a key is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criticality {
    /// Drives control flow or reward; read failures propagate
    Critical,
    /// Informational; read failures become an absent value
    Advisory,
}

impl TelemetryKey {
    pub fn spec(self) -> OffsetSpec {
        match self {
            Self::Score => globals::SCORE,
            Self::Lives => globals::LIVES,
            Self::LifeFragments => globals::LIFE_FRAGMENTS,
            Self::Bombs => globals::BOMBS,
            Self::BombFragments => globals::BOMB_FRAGMENTS,
            Self::BonusCount => globals::BONUS_COUNT,
            Self::Power => globals::POWER,
            Self::Piv => globals::PIV,
            Self::Graze => globals::GRAZE,
            Self::GameState => globals::GAME_STATE,
            Self::InDialog => globals::IN_DIALOG,
            Self::GlobalTimer => timer::GLOBAL_TIMER,
            Self::PlayerPosX => player::POS_X,
            Self::PlayerPosY => player::POS_Y,
            Self::BossHp => boss::HP,
            Self::BossPosX => boss::POS_X,
            Self::BossPosY => boss::POS_Y,
        }
    }

    pub fn kind(self) -> ValueKind {
        match self {
            Self::PlayerPosX | Self::PlayerPosY | Self::BossPosX | Self::BossPosY => {
                ValueKind::Float
            }
            _ => ValueKind::Int,
        }
    }

    pub fn criticality(self) -> Criticality {
        match self {
            Self::BonusCount
            | Self::Piv
            | Self::Graze
            | Self::BossHp
            | Self::PlayerPosX
            | Self::PlayerPosY
            | Self::BossPosX
            | Self::BossPosY => Criticality::Advisory,
            _ => Criticality::Critical,
        }
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TelemetryValue {
    Int(i32),
    Float(f32),
}

impl TelemetryValue {
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Int(v) => v,
            Self::Float(v) => v as i32,
        }
    }

    pub fn as_f32(self) -> f32 {
        match self {
            Self::Int(v) => v as f32,
            Self::Float(v) => v,
        }
    }
}

/// Run status reported by the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum GameState {
    Paused,
    EndOfRun,
    Playing,
    /// Any other value, seen briefly during menu transitions
    Other(i32),
}

impl GameState {
    pub fn from_raw(value: i32) -> Self {
        match value {
            0 => Self::Paused,
            1 => Self::EndOfRun,
            2 => Self::Playing,
            other => Self::Other(other),
        }
    }

    pub fn raw(self) -> i32 {
        match self {
            Self::Paused => 0,
            Self::EndOfRun => 1,
            Self::Playing => 2,
            Self::Other(v) => v,
        }
    }
}

/// Decodes registry keys against one attached process
#[derive(Debug)]
pub struct Telemetry<R> {
    reader: R,
    base_address: u64,
}

impl<R: ReadMemory> Telemetry<R> {
    pub fn new(reader: R, base_address: u64) -> Self {
        Self {
            reader,
            base_address,
        }
    }

    /// Absolute address a key currently resolves to
    pub fn address_of(&self, key: TelemetryKey) -> Result<u64> {
        key.spec().resolve(&self.reader, self.base_address)
    }

    /// Read and decode a key, propagating read failures
    pub fn read(&self, key: TelemetryKey) -> Result<TelemetryValue> {
        let address = self.address_of(key)?;
        Ok(match key.kind() {
            ValueKind::Int => TelemetryValue::Int(self.reader.read_i32(address)?),
            ValueKind::Float => TelemetryValue::Float(self.reader.read_f32(address)?),
        })
    }

    pub fn read_i32(&self, key: TelemetryKey) -> Result<i32> {
        self.read(key).map(TelemetryValue::as_i32)
    }

    pub fn read_f32(&self, key: TelemetryKey) -> Result<f32> {
        self.read(key).map(TelemetryValue::as_f32)
    }

    /// Read a key, absorbing failures into `None`
    ///
    /// Reads of advisory fields may legitimately fail in the last frames
    /// before the process exits or while the boss list is empty.
    pub fn read_advisory(&self, key: TelemetryKey) -> Option<TelemetryValue> {
        match self.read(key) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Telemetry '{}' unavailable: {}", key, e);
                None
            }
        }
    }

    pub fn game_state(&self) -> Result<GameState> {
        self.read_i32(TelemetryKey::GameState)
            .map(GameState::from_raw)
    }

    pub fn in_dialog(&self) -> Result<bool> {
        Ok(self.read_i32(TelemetryKey::InDialog)? == DIALOG_ACTIVE)
    }

    /// Current value of the game's global tick counter
    pub fn tick(&self) -> Result<i32> {
        self.read_i32(TelemetryKey::GlobalTimer)
    }
}
