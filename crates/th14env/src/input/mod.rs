//! Keyboard actuation.
//!
//! [`InputActuator`] owns the pressed/released state of every key it has
//! ever touched and only injects an event when that state actually changes:
//! the game reads a redundant key-up as a fresh press on some screens.

#[cfg(target_os = "windows")]
mod keyboard;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, IntoEnumIterator};
use tracing::debug;

use crate::error::{Error, Result};

#[cfg(target_os = "windows")]
pub use keyboard::SendInputKeyboard;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount, Display)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Shift,
    Z,
    Ctrl,
    Escape,
    R,
    Q,
}

impl Key {
    /// Fire, and confirm in menus
    pub const SHOOT: Key = Key::Z;
    /// Focused (slow) movement
    pub const SLOW: Key = Key::Shift;
    /// Fast-forward through dialog
    pub const SKIP: Key = Key::Ctrl;

    /// Windows virtual-key code
    pub fn virtual_key(self) -> u16 {
        match self {
            Self::Left => 0x25,
            Self::Up => 0x26,
            Self::Right => 0x27,
            Self::Down => 0x28,
            Self::Shift => 0x10,
            Self::Ctrl => 0x11,
            Self::Escape => 0x1B,
            Self::Z => 0x5A,
            Self::R => 0x52,
            Self::Q => 0x51,
        }
    }

    /// Arrow keys live on the extended part of the keyboard
    pub fn is_extended(self) -> bool {
        matches!(self, Self::Left | Self::Right | Self::Up | Self::Down)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Movement direction; at most one arrow key is held at a time
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumIter, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum Movement {
    #[default]
    None,
    Left,
    Right,
    Up,
    Down,
}

impl Movement {
    pub const ARROWS: [Key; 4] = [Key::Left, Key::Right, Key::Up, Key::Down];

    /// 0 = none, 1 = left, 2 = right, 3 = up, 4 = down
    pub fn from_index(index: usize) -> Result<Self> {
        Self::iter()
            .nth(index)
            .ok_or_else(|| Error::InvalidAction(format!("move {} should be 0 - 4", index)))
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn key(self) -> Option<Key> {
        match self {
            Self::None => None,
            Self::Left => Some(Key::Left),
            Self::Right => Some(Key::Right),
            Self::Up => Some(Key::Up),
            Self::Down => Some(Key::Down),
        }
    }
}

/// OS key-injection primitive
pub trait KeyInjector {
    fn key_down(&mut self, key: Key) -> Result<()>;
    fn key_up(&mut self, key: Key) -> Result<()>;

    /// Make the game window receive injected keys
    fn focus(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<K: KeyInjector + ?Sized> KeyInjector for &mut K {
    fn key_down(&mut self, key: Key) -> Result<()> {
        (**self).key_down(key)
    }

    fn key_up(&mut self, key: Key) -> Result<()> {
        (**self).key_up(key)
    }

    fn focus(&mut self) -> Result<()> {
        (**self).focus()
    }
}

/// Persistent key-state machine scoped to one attached session
#[derive(Debug)]
pub struct InputActuator<K> {
    injector: K,
    held: [bool; Key::COUNT],
}

impl<K: KeyInjector> InputActuator<K> {
    pub fn new(injector: K) -> Self {
        Self {
            injector,
            held: [false; Key::COUNT],
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held[key.index()]
    }

    pub fn held_keys(&self) -> Vec<Key> {
        Key::iter().filter(|k| self.is_held(*k)).collect()
    }

    /// Press `key` unless already held. Returns whether an event was sent.
    pub fn press(&mut self, key: Key) -> Result<bool> {
        if self.is_held(key) {
            return Ok(false);
        }
        self.injector.key_down(key)?;
        self.held[key.index()] = true;
        Ok(true)
    }

    /// Release `key` if held. Returns whether an event was sent.
    pub fn release(&mut self, key: Key) -> Result<bool> {
        if !self.is_held(key) {
            return Ok(false);
        }
        self.injector.key_up(key)?;
        self.held[key.index()] = false;
        Ok(true)
    }

    /// Hold exactly the arrow key for `movement`
    pub fn set_movement(&mut self, movement: Movement) -> Result<()> {
        let wanted = movement.key();
        for key in Movement::ARROWS {
            if Some(key) == wanted {
                self.press(key)?;
            } else {
                self.release(key)?;
            }
        }
        Ok(())
    }

    pub fn set_slow(&mut self, slow: bool) -> Result<()> {
        if slow {
            self.press(Key::SLOW)?;
        } else {
            self.release(Key::SLOW)?;
        }
        Ok(())
    }

    /// Release every key regardless of bookkeeping.
    ///
    /// Recovers from aborted operations that left the recorded state out of
    /// sync with what the OS believes is held.
    pub fn release_all(&mut self) -> Result<()> {
        debug!("Releasing all keys");
        for key in Key::iter() {
            self.injector.key_up(key)?;
            self.held[key.index()] = false;
        }
        Ok(())
    }

    pub fn focus(&mut self) -> Result<()> {
        self.injector.focus()
    }

    pub fn injector(&self) -> &K {
        &self.injector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct RecordingInjector {
        events: Vec<(Key, bool)>,
    }

    impl KeyInjector for RecordingInjector {
        fn key_down(&mut self, key: Key) -> Result<()> {
            self.events.push((key, true));
            Ok(())
        }

        fn key_up(&mut self, key: Key) -> Result<()> {
            self.events.push((key, false));
            Ok(())
        }
    }

    fn actuator() -> InputActuator<RecordingInjector> {
        InputActuator::new(RecordingInjector::default())
    }

    #[test]
    fn test_press_is_idempotent() {
        let mut act = actuator();
        assert!(act.press(Key::Z).unwrap());
        assert!(!act.press(Key::Z).unwrap());
        assert!(act.release(Key::Z).unwrap());
        assert!(!act.release(Key::Z).unwrap());
        assert_eq!(
            act.injector().events,
            vec![(Key::Z, true), (Key::Z, false)]
        );
    }

    #[test]
    fn test_repeated_set_movement_emits_once() {
        let mut act = actuator();
        act.set_movement(Movement::Left).unwrap();
        act.set_movement(Movement::Left).unwrap();
        act.set_movement(Movement::Left).unwrap();
        assert_eq!(act.injector().events, vec![(Key::Left, true)]);
    }

    #[test]
    fn test_set_movement_diff() {
        let mut act = actuator();
        act.set_movement(Movement::Left).unwrap();
        act.set_movement(Movement::Up).unwrap();
        act.set_movement(Movement::None).unwrap();
        assert_eq!(
            act.injector().events,
            vec![
                (Key::Left, true),
                (Key::Left, false),
                (Key::Up, true),
                (Key::Up, false),
            ]
        );
        assert!(act.held_keys().is_empty());
    }

    #[test]
    fn test_set_slow() {
        let mut act = actuator();
        act.set_slow(true).unwrap();
        act.set_slow(true).unwrap();
        act.set_slow(false).unwrap();
        act.set_slow(false).unwrap();
        assert_eq!(
            act.injector().events,
            vec![(Key::Shift, true), (Key::Shift, false)]
        );
    }

    #[test]
    fn test_release_all_is_unconditional() {
        let mut act = actuator();
        act.press(Key::Down).unwrap();
        act.release_all().unwrap();

        let released: Vec<_> = act.injector().events[1..].to_vec();
        assert_eq!(released.len(), Key::COUNT);
        assert!(released.iter().all(|(_, down)| !down));
        assert!(!act.is_held(Key::Down));

        // A second call still emits the full set
        act.release_all().unwrap();
        assert_eq!(act.injector().events.len(), 1 + 2 * Key::COUNT);
    }

    #[test]
    fn test_movement_from_index() {
        assert_eq!(Movement::from_index(0).unwrap(), Movement::None);
        assert_eq!(Movement::from_index(4).unwrap(), Movement::Down);
        assert!(Movement::from_index(5).is_err());
        assert_eq!(Movement::Right.index(), 2);
    }

    #[test]
    fn test_failed_injection_keeps_state() {
        struct Failing;
        impl KeyInjector for Failing {
            fn key_down(&mut self, _key: Key) -> Result<()> {
                Err(Error::Input("SendInput blocked".into()))
            }
            fn key_up(&mut self, _key: Key) -> Result<()> {
                Ok(())
            }
        }

        let mut act = InputActuator::new(Failing);
        assert!(act.press(Key::Left).is_err());
        assert!(!act.is_held(Key::Left));
    }
}
