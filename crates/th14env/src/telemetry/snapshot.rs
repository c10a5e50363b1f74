use serde::{Deserialize, Serialize};

use super::{GameState, Telemetry, TelemetryKey, TelemetryValue, DIALOG_ACTIVE};
use crate::error::Result;
use crate::memory::ReadMemory;

/// All telemetry keys at one instant.
///
/// Critical fields are plain values; advisory fields are `None` when the
/// read failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub score: i32,
    pub lives: i32,
    pub life_fragments: i32,
    pub bombs: i32,
    pub bomb_fragments: i32,
    pub power: i32,
    pub game_state: i32,
    pub in_dialog: i32,
    pub global_timer: i32,
    pub bonus_count: Option<i32>,
    pub piv: Option<i32>,
    pub graze: Option<i32>,
    pub boss_hp: Option<i32>,
    pub player_position: Option<[f32; 2]>,
    pub boss_position: Option<[f32; 2]>,
}

impl Snapshot {
    pub fn capture<R: ReadMemory>(telemetry: &Telemetry<R>) -> Result<Self> {
        let int = |key| telemetry.read_i32(key);
        let advisory_int = |key| telemetry.read_advisory(key).map(TelemetryValue::as_i32);
        let position = |x: TelemetryKey, y: TelemetryKey| -> Option<[f32; 2]> {
            let x = telemetry.read_advisory(x)?.as_f32();
            let y = telemetry.read_advisory(y)?.as_f32();
            Some([x, y])
        };

        Ok(Self {
            score: int(TelemetryKey::Score)?,
            lives: int(TelemetryKey::Lives)?,
            life_fragments: int(TelemetryKey::LifeFragments)?,
            bombs: int(TelemetryKey::Bombs)?,
            bomb_fragments: int(TelemetryKey::BombFragments)?,
            power: int(TelemetryKey::Power)?,
            game_state: int(TelemetryKey::GameState)?,
            in_dialog: int(TelemetryKey::InDialog)?,
            global_timer: int(TelemetryKey::GlobalTimer)?,
            bonus_count: advisory_int(TelemetryKey::BonusCount),
            piv: advisory_int(TelemetryKey::Piv),
            graze: advisory_int(TelemetryKey::Graze),
            boss_hp: advisory_int(TelemetryKey::BossHp),
            player_position: position(TelemetryKey::PlayerPosX, TelemetryKey::PlayerPosY),
            boss_position: position(TelemetryKey::BossPosX, TelemetryKey::BossPosY),
        })
    }

    pub fn state(&self) -> GameState {
        GameState::from_raw(self.game_state)
    }

    pub fn is_playing(&self) -> bool {
        self.state() == GameState::Playing
    }

    pub fn in_dialog(&self) -> bool {
        self.in_dialog == DIALOG_ACTIVE
    }

    /// Flat key/value view for loggers and external consumers
    pub fn to_info(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MockMemoryBuilder;

    const BASE: u64 = 0x40_0000;

    fn globals_only() -> MockMemoryBuilder {
        MockMemoryBuilder::new()
            .write_i32(BASE + 0xF5830, 123_450)
            .write_i32(BASE + 0xF5864, 2)
            .write_i32(BASE + 0xF5868, 1)
            .write_i32(BASE + 0xF5870, 3)
            .write_i32(BASE + 0xF5874, 4)
            .write_i32(BASE + 0xF5858, 100)
            .write_i32(BASE + 0xF7AC8, 2)
            .write_i32(BASE + 0xF7BA8, 0)
            .write_u32(BASE + 0xDB520, 0x0100_0000)
            .write_i32(0x0100_0000 + 0x191E0, 5000)
    }

    #[test]
    fn test_capture_with_missing_advisory_fields() {
        let telemetry = Telemetry::new(globals_only().build(), BASE);
        let snapshot = Snapshot::capture(&telemetry).unwrap();

        assert_eq!(snapshot.score, 123_450);
        assert_eq!(snapshot.lives, 2);
        assert_eq!(snapshot.global_timer, 5000);
        assert!(snapshot.is_playing());
        assert!(!snapshot.in_dialog());
        assert_eq!(snapshot.boss_hp, None);
        assert_eq!(snapshot.player_position, None);
        assert_eq!(snapshot.piv, None);
    }

    #[test]
    fn test_capture_fails_on_missing_critical_field() {
        let reader = MockMemoryBuilder::new()
            .write_i32(BASE + 0xF5830, 0)
            .build();
        let telemetry = Telemetry::new(reader, BASE);
        assert!(Snapshot::capture(&telemetry).unwrap_err().is_memory_read());
    }

    #[test]
    fn test_capture_positions() {
        let reader = globals_only()
            .write_u32(BASE + 0xDB67C, 0x0200_0000)
            .write_f32(0x0200_05E0, 10.0)
            .write_f32(0x0200_05E4, 380.0)
            .build();
        let snapshot = Snapshot::capture(&Telemetry::new(reader, BASE)).unwrap();
        assert_eq!(snapshot.player_position, Some([10.0, 380.0]));
        assert_eq!(snapshot.boss_position, None);
    }

    #[test]
    fn test_info_contains_every_field() {
        let info = Snapshot::default().to_info();
        for key in [
            "score",
            "lives",
            "life_fragments",
            "bombs",
            "bomb_fragments",
            "power",
            "game_state",
            "in_dialog",
            "boss_hp",
            "player_position",
        ] {
            assert!(info.contains_key(key), "missing {key}");
        }
        assert!(info["boss_hp"].is_null());
    }
}
