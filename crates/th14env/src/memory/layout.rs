//! Memory and screen layout constants for Touhou 14 (Double Dealing Character) v1.00b
//!
//! All offsets are relative to the base address of `th14.exe`. Values are
//! 32-bit little-endian integers unless noted as floats.

use super::OffsetSpec;

/// Executable module and window identification
pub mod target {
    pub const MODULE_NAME: &str = "th14.exe";
    pub const WINDOW_TITLE: &str = "Double Dealing Character. ver 1.00b";
}

/// Player resources and run status (static globals)
pub mod globals {
    use super::OffsetSpec;

    pub const SCORE: OffsetSpec = OffsetSpec::Direct(0xF5830);
    pub const GRAZE: OffsetSpec = OffsetSpec::Direct(0xF5840);
    pub const PIV: OffsetSpec = OffsetSpec::Direct(0xF584C);
    pub const POWER: OffsetSpec = OffsetSpec::Direct(0xF5858);
    pub const LIVES: OffsetSpec = OffsetSpec::Direct(0xF5864);
    /// 3 life fragments = 1 life
    pub const LIFE_FRAGMENTS: OffsetSpec = OffsetSpec::Direct(0xF5868);
    pub const BOMBS: OffsetSpec = OffsetSpec::Direct(0xF5870);
    /// 8 bomb fragments = 1 bomb
    pub const BOMB_FRAGMENTS: OffsetSpec = OffsetSpec::Direct(0xF5874);
    pub const BONUS_COUNT: OffsetSpec = OffsetSpec::Direct(0xF5894);
    /// 0 = paused, 1 = end of run, 2 = playing
    pub const GAME_STATE: OffsetSpec = OffsetSpec::Direct(0xF7AC8);
    /// -1 while a dialog is on screen
    pub const IN_DIALOG: OffsetSpec = OffsetSpec::Direct(0xF7BA8);
}

/// Game-loop object holding the global tick counter
pub mod timer {
    use super::OffsetSpec;

    const GAME_THREAD: OffsetSpec = OffsetSpec::Direct(0xDB520);
    pub const GLOBAL_TIMER: OffsetSpec = OffsetSpec::chain(&GAME_THREAD, 0x191E0);
}

/// Player object (positions are f32)
pub mod player {
    use super::OffsetSpec;

    const PLAYER: OffsetSpec = OffsetSpec::Direct(0xDB67C);
    pub const POS_X: OffsetSpec = OffsetSpec::chain(&PLAYER, 0x5E0);
    pub const POS_Y: OffsetSpec = OffsetSpec::chain(&PLAYER, 0x5E4);
}

/// Boss object, reached through the enemy manager's linked list
/// (`.val` at +0x0, `.next` at +0x4).
///
/// Only meaningful in Spell Card practice, where the first enemy is the boss.
pub mod boss {
    use super::OffsetSpec;

    const ENEMY_MANAGER: OffsetSpec = OffsetSpec::Direct(0xDB544);
    const LIST_HEAD: OffsetSpec = OffsetSpec::chain(&ENEMY_MANAGER, 0xD0);
    const FIRST_NODE: OffsetSpec = OffsetSpec::chain(&LIST_HEAD, 0x4);
    const SECOND_NODE: OffsetSpec = OffsetSpec::chain(&FIRST_NODE, 0x4);
    const BOSS: OffsetSpec = OffsetSpec::chain(&SECOND_NODE, 0x0);

    /// Start of the enemy's embedded state block
    const STATE: u64 = 0x11F0;

    pub const HP: OffsetSpec = OffsetSpec::chain(&BOSS, STATE + 0x3F74);
    pub const POS_X: OffsetSpec = OffsetSpec::chain(&BOSS, STATE + 0x44);
    pub const POS_Y: OffsetSpec = OffsetSpec::chain(&BOSS, STATE + 0x48);
}

/// Window geometry at the supported 640x480 client resolution.
///
/// The outer size includes the window borders (measured on Windows 11 at
/// 100% scaling); capture coordinates are screen-absolute and derived from it.
pub mod screen {
    pub const WINDOW_WIDTH: u32 = 646;
    pub const WINDOW_HEIGHT: u32 = 509;
    /// Playfield size in pixels
    pub const FRAME_WIDTH: u32 = 384;
    pub const FRAME_HEIGHT: u32 = 448;
    /// Playfield origin relative to the window's top-left corner
    pub const FRAME_LEFT: i32 = 35;
    pub const FRAME_TOP: i32 = 42;
}
