//! Fixed key sequences for menu navigation.
//!
//! Wait lengths are game ticks, found by trial against the game's menu
//! animations. Each tap costs two ticks on top of the listed waits.

use crate::input::Key;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptStep {
    /// Press, wait one tick, release, wait one tick
    Tap(Key),
    /// Let the game run this many ticks
    Wait(u32),
}

use Key::{Down, Escape, Q, R, Up, Z};
use ScriptStep::{Tap, Wait};

/// Title screen (or the attract demo) to the first spell card, running
pub const TITLE_TO_PRACTICE: &[ScriptStep] = &[
    // The title screen falls into a demo after idling; leave it first
    Tap(Down),
    Tap(Escape),
    Wait(180),
    // Cursor to "Quit", then three down wraps to "Spell Card Practice"
    Tap(Down),
    Tap(Escape),
    Tap(Down),
    Tap(Down),
    Tap(Down),
    Tap(Z),
    Wait(60),
    // Character, shot type, then the card
    Tap(Z),
    Wait(60),
    Tap(Down),
    Wait(60),
    Tap(Z),
    Wait(60),
    Tap(Z),
    Wait(150),
];

/// "Retry" on the end-of-run menu
pub const RETRY_FROM_END_OF_RUN: &[ScriptStep] =
    &[Tap(Escape), Wait(30), Tap(Up), Wait(30), Tap(Z), Wait(30)];

/// Pause, then the pause menu's restart shortcut
pub const RESTART_FROM_PLAY: &[ScriptStep] = &[Tap(Escape), Wait(30), Tap(R), Wait(30)];

pub const QUIT_FROM_PAUSE: &[ScriptStep] = &[Tap(Q)];

pub const QUIT_FROM_END_OF_RUN: &[ScriptStep] = &[Tap(Escape), Wait(30), Tap(Z)];

pub const QUIT_FROM_PLAY: &[ScriptStep] = &[Tap(Escape), Wait(30), Tap(Q)];

/// Practice menus back out to the title screen
pub const BACK_TO_TITLE: &[ScriptStep] = &[
    Wait(120),
    Tap(Escape),
    Wait(60),
    Tap(Escape),
    Wait(60),
    Tap(Escape),
    Wait(60),
];

/// Minimum ticks a script lets the game run
pub fn duration(steps: &[ScriptStep]) -> u32 {
    steps
        .iter()
        .map(|step| match step {
            Tap(_) => 2,
            Wait(ticks) => *ticks,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration() {
        assert_eq!(duration(RETRY_FROM_END_OF_RUN), 96);
        assert_eq!(duration(RESTART_FROM_PLAY), 64);
        assert_eq!(duration(BACK_TO_TITLE), 306);
    }

    #[test]
    fn test_title_to_practice_taps() {
        let taps: Vec<Key> = TITLE_TO_PRACTICE
            .iter()
            .filter_map(|step| match step {
                Tap(key) => Some(*key),
                Wait(_) => None,
            })
            .collect();
        assert_eq!(
            taps,
            vec![Down, Escape, Down, Escape, Down, Down, Down, Z, Z, Down, Z, Z]
        );
    }
}
