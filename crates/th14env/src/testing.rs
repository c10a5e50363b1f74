//! In-process stand-in for the game.
//!
//! One shared state drives every OS seam: memory reads, the execution gate,
//! key injection and frame capture. The tick counter advances by one on each
//! read of it while the game is resumed, so tick waits terminate without a
//! real clock.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::rc::Rc;

use crate::capture::{Frame, FrameSource};
use crate::env::EnvParts;
use crate::error::{Error, Result};
use crate::input::{Key, KeyInjector};
use crate::memory::{OffsetSpec, ReadMemory};
use crate::process::ExecutionControl;
use crate::telemetry::{GameState, Telemetry, TelemetryKey};

pub const SIM_BASE: u64 = 0x0040_0000;
pub const SIM_FRAME_WIDTH: u32 = 8;
pub const SIM_FRAME_HEIGHT: u32 = 6;
const HEAP_START: u64 = 0x1000_0000;
const HEAP_BLOCK: u64 = 0x0010_0000;
const START_TICK: i32 = 1000;

type TickHook = Box<dyn FnMut(&mut SimState, i32)>;
type KeyHook = Box<dyn FnMut(&mut SimState, Key, bool)>;

pub struct SimState {
    memory: BTreeMap<u64, u8>,
    next_block: u64,
    timer_address: u64,
    suspended: bool,
    frozen: bool,
    alive: bool,
    resume_calls: usize,
    focus_calls: usize,
    captures: usize,
    events: Vec<(Key, bool)>,
    scripted: HashMap<u64, VecDeque<i32>>,
    reads: HashMap<u64, usize>,
    tick_hooks: Vec<TickHook>,
    key_hooks: Vec<KeyHook>,
}

impl SimState {
    fn new() -> Self {
        let mut state = Self {
            memory: BTreeMap::new(),
            next_block: 0,
            timer_address: 0,
            suspended: false,
            frozen: false,
            alive: true,
            resume_calls: 0,
            focus_calls: 0,
            captures: 0,
            events: Vec::new(),
            scripted: HashMap::new(),
            reads: HashMap::new(),
            tick_hooks: Vec::new(),
            key_hooks: Vec::new(),
        };
        state.timer_address = state.address_of(TelemetryKey::GlobalTimer);
        state.set(TelemetryKey::GlobalTimer, START_TICK);
        state
    }

    /// Address of a key, allocating pointer targets on first use
    pub fn address_of(&mut self, key: TelemetryKey) -> u64 {
        self.allocate(&key.spec())
    }

    fn allocate(&mut self, spec: &OffsetSpec) -> u64 {
        match spec {
            OffsetSpec::Direct(offset) => SIM_BASE + offset,
            OffsetSpec::Chain { base, offset } => {
                let slot = self.allocate(base);
                let pointer = match self.word(slot) {
                    Some(bytes) => u64::from(u32::from_le_bytes(bytes)),
                    None => {
                        let block = HEAP_START + self.next_block * HEAP_BLOCK;
                        self.next_block += 1;
                        self.write(slot, (block as u32).to_le_bytes());
                        block
                    }
                };
                pointer + offset
            }
        }
    }

    fn word(&self, address: u64) -> Option<[u8; 4]> {
        let mut bytes = [0u8; 4];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = *self.memory.get(&(address + i as u64))?;
        }
        Some(bytes)
    }

    fn write(&mut self, address: u64, bytes: [u8; 4]) {
        for (i, byte) in bytes.into_iter().enumerate() {
            self.memory.insert(address + i as u64, byte);
        }
    }

    pub fn set(&mut self, key: TelemetryKey, value: i32) {
        let address = self.address_of(key);
        self.write(address, value.to_le_bytes());
    }

    pub fn set_f32(&mut self, key: TelemetryKey, value: f32) {
        let address = self.address_of(key);
        self.write(address, value.to_le_bytes());
    }

    pub fn get(&mut self, key: TelemetryKey) -> i32 {
        let address = self.address_of(key);
        self.word(address).map(i32::from_le_bytes).unwrap_or_default()
    }

    pub fn tick(&self) -> i32 {
        self.word(self.timer_address)
            .map(i32::from_le_bytes)
            .unwrap_or_default()
    }

    fn advance(&mut self) {
        let tick = self.tick() + 1;
        self.write(self.timer_address, tick.to_le_bytes());

        let mut hooks = std::mem::take(&mut self.tick_hooks);
        for hook in hooks.iter_mut() {
            hook(self, tick);
        }
        hooks.append(&mut self.tick_hooks);
        self.tick_hooks = hooks;
    }

    fn key_event(&mut self, key: Key, down: bool) {
        self.events.push((key, down));
        let mut hooks = std::mem::take(&mut self.key_hooks);
        for hook in hooks.iter_mut() {
            hook(self, key, down);
        }
        hooks.append(&mut self.key_hooks);
        self.key_hooks = hooks;
    }

    fn read(&mut self, address: u64, size: usize) -> Result<Vec<u8>> {
        if !self.alive {
            return Err(Error::MemoryRead {
                address,
                message: "process has exited".to_string(),
            });
        }
        *self.reads.entry(address).or_default() += 1;

        if address == self.timer_address && !self.suspended && !self.frozen {
            self.advance();
        }
        let scripted = self.scripted.get_mut(&address).and_then(VecDeque::pop_front);
        if let Some(value) = scripted {
            self.write(address, value.to_le_bytes());
        }

        (0..size as u64)
            .map(|i| {
                self.memory
                    .get(&(address + i))
                    .copied()
                    .ok_or_else(|| Error::MemoryRead {
                        address,
                        message: format!("address {:#x} is not mapped", address + i),
                    })
            })
            .collect()
    }
}

/// Cloneable handle to one simulated game
#[derive(Clone)]
pub struct SimGame {
    state: Rc<RefCell<SimState>>,
}

impl SimGame {
    /// Only the tick counter is mapped
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(SimState::new())),
        }
    }

    /// A spell card in progress with every telemetry key mapped
    pub fn playing() -> Self {
        let sim = Self::new();
        for (key, value) in [
            (TelemetryKey::Score, 0),
            (TelemetryKey::Lives, 3),
            (TelemetryKey::LifeFragments, 0),
            (TelemetryKey::Bombs, 3),
            (TelemetryKey::BombFragments, 0),
            (TelemetryKey::BonusCount, 0),
            (TelemetryKey::Power, 100),
            (TelemetryKey::Piv, 10_000),
            (TelemetryKey::Graze, 0),
            (TelemetryKey::GameState, GameState::Playing.raw()),
            (TelemetryKey::InDialog, 0),
            (TelemetryKey::BossHp, 1500),
        ] {
            sim.set(key, value);
        }
        sim.set_f32(TelemetryKey::PlayerPosX, 0.0);
        sim.set_f32(TelemetryKey::PlayerPosY, 400.0);
        sim.set_f32(TelemetryKey::BossPosX, 0.0);
        sim.set_f32(TelemetryKey::BossPosY, 100.0);
        sim
    }

    pub fn telemetry(&self) -> Telemetry<SimGame> {
        Telemetry::new(self.clone(), SIM_BASE)
    }

    pub fn parts(&self) -> EnvParts<SimGame, SimGame, SimGame, SimGame> {
        EnvParts {
            reader: self.clone(),
            base_address: SIM_BASE,
            gate: self.clone(),
            keyboard: self.clone(),
            frames: self.clone(),
        }
    }

    pub fn set(&self, key: TelemetryKey, value: i32) {
        self.state.borrow_mut().set(key, value);
    }

    pub fn set_f32(&self, key: TelemetryKey, value: f32) {
        self.state.borrow_mut().set_f32(key, value);
    }

    pub fn get(&self, key: TelemetryKey) -> i32 {
        self.state.borrow_mut().get(key)
    }

    /// Make a key's address unreadable
    pub fn unmap(&self, key: TelemetryKey) {
        let mut state = self.state.borrow_mut();
        let address = state.address_of(key);
        for i in 0..4 {
            state.memory.remove(&(address + i));
        }
    }

    /// Every read fails from now on
    pub fn kill(&self) {
        self.state.borrow_mut().alive = false;
    }

    /// The counter stops advancing even while resumed
    pub fn freeze_clock(&self) {
        self.state.borrow_mut().frozen = true;
    }

    /// Values returned by successive reads of `key`, before falling back to
    /// whatever was last written
    pub fn script_reads(&self, key: TelemetryKey, values: impl IntoIterator<Item = i32>) {
        let mut state = self.state.borrow_mut();
        let address = state.address_of(key);
        state
            .scripted
            .entry(address)
            .or_default()
            .extend(values);
    }

    pub fn read_count(&self, key: TelemetryKey) -> usize {
        let mut state = self.state.borrow_mut();
        let address = state.address_of(key);
        state.reads.get(&address).copied().unwrap_or_default()
    }

    pub fn on_tick(&self, hook: impl FnMut(&mut SimState, i32) + 'static) {
        self.state.borrow_mut().tick_hooks.push(Box::new(hook));
    }

    pub fn on_key(&self, hook: impl FnMut(&mut SimState, Key, bool) + 'static) {
        self.state.borrow_mut().key_hooks.push(Box::new(hook));
    }

    pub fn tick(&self) -> i32 {
        self.state.borrow().tick()
    }

    pub fn is_suspended(&self) -> bool {
        self.state.borrow().suspended
    }

    /// Live references to the shared game, this one included
    pub fn handles(&self) -> usize {
        Rc::strong_count(&self.state)
    }

    pub fn resume_count(&self) -> usize {
        self.state.borrow().resume_calls
    }

    pub fn focus_count(&self) -> usize {
        self.state.borrow().focus_calls
    }

    pub fn capture_count(&self) -> usize {
        self.state.borrow().captures
    }

    pub fn events(&self) -> Vec<(Key, bool)> {
        self.state.borrow().events.clone()
    }

    pub fn clear_events(&self) {
        self.state.borrow_mut().events.clear();
    }

    /// Number of key-down events sent for `key`
    pub fn presses(&self, key: Key) -> usize {
        self.state
            .borrow()
            .events
            .iter()
            .filter(|(k, down)| *k == key && *down)
            .count()
    }
}

impl ReadMemory for SimGame {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        self.state.borrow_mut().read(address, size)
    }
}

impl ExecutionControl for SimGame {
    fn suspend(&mut self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.suspended = true;
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.resume_calls += 1;
        state.suspended = false;
        Ok(())
    }

    fn is_suspended(&self) -> bool {
        self.state.borrow().suspended
    }
}

impl KeyInjector for SimGame {
    fn key_down(&mut self, key: Key) -> Result<()> {
        self.state.borrow_mut().key_event(key, true);
        Ok(())
    }

    fn key_up(&mut self, key: Key) -> Result<()> {
        self.state.borrow_mut().key_event(key, false);
        Ok(())
    }

    fn focus(&mut self) -> Result<()> {
        self.state.borrow_mut().focus_calls += 1;
        Ok(())
    }
}

impl FrameSource for SimGame {
    /// Uniform frame whose gray level is the current tick modulo 256
    fn capture(&mut self) -> Result<Frame> {
        let mut state = self.state.borrow_mut();
        if !state.alive {
            return Err(Error::Capture("window is gone".to_string()));
        }
        state.captures += 1;
        let level = state.tick().rem_euclid(256) as u8;
        Ok(Frame::filled(
            SIM_FRAME_WIDTH,
            SIM_FRAME_HEIGHT,
            [level, level, level],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_advances_only_when_resumed() {
        let mut sim = SimGame::playing();
        let telemetry = sim.telemetry();

        sim.suspend().unwrap();
        let a = telemetry.tick().unwrap();
        let b = telemetry.tick().unwrap();
        assert_eq!(a, b);

        sim.resume().unwrap();
        let c = telemetry.tick().unwrap();
        assert_eq!(c, b + 1);
    }

    #[test]
    fn test_chains_resolve_through_allocated_pointers() {
        let sim = SimGame::playing();
        let telemetry = sim.telemetry();
        assert_eq!(telemetry.read_i32(TelemetryKey::BossHp).unwrap(), 1500);
        assert_eq!(telemetry.read_f32(TelemetryKey::PlayerPosY).unwrap(), 400.0);
        assert_eq!(telemetry.read_i32(TelemetryKey::Lives).unwrap(), 3);
    }

    #[test]
    fn test_scripted_reads_then_fallback() {
        let sim = SimGame::playing();
        let telemetry = sim.telemetry();
        sim.script_reads(TelemetryKey::InDialog, [-1, 0]);
        assert_eq!(telemetry.read_i32(TelemetryKey::InDialog).unwrap(), -1);
        assert_eq!(telemetry.read_i32(TelemetryKey::InDialog).unwrap(), 0);
        assert_eq!(telemetry.read_i32(TelemetryKey::InDialog).unwrap(), 0);
        assert_eq!(sim.read_count(TelemetryKey::InDialog), 3);
    }

    #[test]
    fn test_tick_hooks_see_new_tick() {
        let mut sim = SimGame::playing();
        let start = sim.tick();
        sim.on_tick(move |state, tick| {
            if tick == start + 2 {
                state.set(TelemetryKey::GameState, GameState::EndOfRun.raw());
            }
        });
        sim.resume().unwrap();
        let telemetry = sim.telemetry();
        telemetry.tick().unwrap();
        assert_eq!(telemetry.game_state().unwrap(), GameState::Playing);
        telemetry.tick().unwrap();
        assert_eq!(telemetry.game_state().unwrap(), GameState::EndOfRun);
    }
}
