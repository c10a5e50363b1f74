//! Pluggable reward strategies.
//!
//! A strategy sees the snapshots before and after a step plus the decoded
//! action, and may keep state across steps (dwell counters, repeat
//! counters). [`RewardSpec`] is the serializable description a strategy is
//! built from.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::input::Movement;
use crate::telemetry::Snapshot;

/// Boss HP jumps larger than this are a phase change, not damage
pub const BOSS_HP_RESET_THRESHOLD: i32 = 100;

const LIFE_FRAGMENTS_PER_LIFE: f64 = 3.0;
const BOMB_FRAGMENTS_PER_BOMB: f64 = 8.0;

/// Everything a strategy may look at for one step
#[derive(Debug, Clone, Copy)]
pub struct RewardContext<'a> {
    pub previous: &'a Snapshot,
    pub current: &'a Snapshot,
    pub movement: Movement,
    pub slow: bool,
    pub terminated: bool,
    pub truncated: bool,
    /// Steps taken this episode, including this one
    pub episode_steps: u64,
}

pub trait RewardStrategy {
    fn name(&self) -> &'static str;

    /// Start of an episode
    fn reset(&mut self, _baseline: &Snapshot) {}

    fn reward(&mut self, ctx: &RewardContext<'_>) -> f64;
}

/// Weighted resource value; the reward is its change over a step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceWeights {
    pub score: f64,
    pub life: f64,
    pub bomb: f64,
    pub power: f64,
}

impl Default for ResourceWeights {
    fn default() -> Self {
        Self {
            score: 1.0,
            life: 200_000.0,
            bomb: 100_000.0,
            power: 1_000.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResourceDelta {
    weights: ResourceWeights,
}

impl ResourceDelta {
    pub fn new(weights: ResourceWeights) -> Self {
        Self { weights }
    }

    /// Fragments count as fractions of whole lives and bombs
    pub fn value(&self, s: &Snapshot) -> f64 {
        let lives = f64::from(s.lives) + f64::from(s.life_fragments) / LIFE_FRAGMENTS_PER_LIFE;
        let bombs = f64::from(s.bombs) + f64::from(s.bomb_fragments) / BOMB_FRAGMENTS_PER_BOMB;
        f64::from(s.score) * self.weights.score
            + lives * self.weights.life
            + bombs * self.weights.bomb
            + f64::from(s.power) * self.weights.power
    }
}

impl RewardStrategy for ResourceDelta {
    fn name(&self) -> &'static str {
        "resource"
    }

    fn reward(&mut self, ctx: &RewardContext<'_>) -> f64 {
        self.value(ctx.current) - self.value(ctx.previous)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossRewardConfig {
    /// Reward per point of boss HP removed
    pub damage_scale: f64,
    pub reset_threshold: i32,
    /// Subtracted per life lost
    pub life_loss_penalty: f64,
    /// Paid on a clear, scaled down linearly with the steps it took
    pub clear_bonus: f64,
    pub time_limit_steps: u64,
    /// Floor of the clear bonus scale once the time limit has passed
    pub min_bonus_fraction: f64,
}

impl Default for BossRewardConfig {
    fn default() -> Self {
        Self {
            damage_scale: 1.0,
            reset_threshold: BOSS_HP_RESET_THRESHOLD,
            life_loss_penalty: 100.0,
            clear_bonus: 1_000.0,
            time_limit_steps: 1_000,
            min_bonus_fraction: 0.1,
        }
    }
}

/// Damage dealt to the boss, minus deaths, plus a bonus for clearing
#[derive(Debug, Clone)]
pub struct BossDamage {
    config: BossRewardConfig,
}

impl BossDamage {
    pub fn new(config: BossRewardConfig) -> Self {
        Self { config }
    }

    fn damage(&self, previous: Option<i32>, current: Option<i32>) -> f64 {
        let (Some(previous), Some(current)) = (previous, current) else {
            return 0.0;
        };
        // Garbage when no boss is present
        let damage = i64::from(previous) - i64::from(current);
        if damage <= 0 || damage > i64::from(self.config.reset_threshold) {
            return 0.0;
        }
        damage as f64 * self.config.damage_scale
    }

    fn clear_bonus(&self, steps: u64) -> f64 {
        let limit = self.config.time_limit_steps.max(1) as f64;
        let scale = (1.0 - steps as f64 / limit).max(self.config.min_bonus_fraction);
        self.config.clear_bonus * scale
    }
}

impl RewardStrategy for BossDamage {
    fn name(&self) -> &'static str {
        "boss"
    }

    fn reward(&mut self, ctx: &RewardContext<'_>) -> f64 {
        let mut reward = self.damage(ctx.previous.boss_hp, ctx.current.boss_hp);

        let lives_lost = (i64::from(ctx.previous.lives) - i64::from(ctx.current.lives)).max(0);
        reward -= lives_lost as f64 * self.config.life_loss_penalty;

        if ctx.terminated && !ctx.truncated && lives_lost == 0 {
            reward += self.clear_bonus(ctx.episode_steps);
        }
        reward
    }
}

/// Player-position rectangle in playfield coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

impl Zone {
    pub fn contains(&self, [x, y]: [f32; 2]) -> bool {
        (self.x_min..=self.x_max).contains(&x) && (self.y_min..=self.y_max).contains(&y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafeZoneConfig {
    pub zone: Zone,
    /// Steps allowed inside the zone before the penalty starts
    pub grace_steps: u32,
    pub penalty: f64,
}

impl Default for SafeZoneConfig {
    fn default() -> Self {
        // Bottom strip of the playfield, where bullets are thinnest
        Self {
            zone: Zone {
                x_min: -192.0,
                x_max: 192.0,
                y_min: 400.0,
                y_max: 448.0,
            },
            grace_steps: 10,
            penalty: 1.0,
        }
    }
}

/// Penalizes camping in one spot of the playfield
#[derive(Debug, Clone)]
pub struct SafeZonePenalty {
    config: SafeZoneConfig,
    dwell: u32,
}

impl SafeZonePenalty {
    pub fn new(config: SafeZoneConfig) -> Self {
        Self { config, dwell: 0 }
    }
}

impl RewardStrategy for SafeZonePenalty {
    fn name(&self) -> &'static str {
        "safe_zone"
    }

    fn reset(&mut self, _baseline: &Snapshot) {
        self.dwell = 0;
    }

    fn reward(&mut self, ctx: &RewardContext<'_>) -> f64 {
        let inside = ctx
            .current
            .player_position
            .is_some_and(|position| self.config.zone.contains(position));
        if !inside {
            self.dwell = 0;
            return 0.0;
        }
        self.dwell += 1;
        if self.dwell > self.config.grace_steps {
            -self.config.penalty
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InactivityConfig {
    /// Identical consecutive actions tolerated before the penalty starts
    pub repeat_limit: u32,
    pub penalty: f64,
}

impl Default for InactivityConfig {
    fn default() -> Self {
        Self {
            repeat_limit: 20,
            penalty: 0.5,
        }
    }
}

/// Penalizes holding still or repeating the same action for long stretches
#[derive(Debug, Clone)]
pub struct InactivityPenalty {
    config: InactivityConfig,
    last: Option<(Movement, bool)>,
    repeats: u32,
}

impl InactivityPenalty {
    pub fn new(config: InactivityConfig) -> Self {
        Self {
            config,
            last: None,
            repeats: 0,
        }
    }
}

impl RewardStrategy for InactivityPenalty {
    fn name(&self) -> &'static str {
        "inactivity"
    }

    fn reset(&mut self, _baseline: &Snapshot) {
        self.last = None;
        self.repeats = 0;
    }

    fn reward(&mut self, ctx: &RewardContext<'_>) -> f64 {
        let action = (ctx.movement, ctx.slow);
        if self.last == Some(action) || ctx.movement == Movement::None {
            self.repeats += 1;
        } else {
            self.repeats = 0;
        }
        self.last = Some(action);

        if self.repeats > self.config.repeat_limit {
            -self.config.penalty
        } else {
            0.0
        }
    }
}

/// Sum of several strategies
pub struct Composite {
    terms: Vec<Box<dyn RewardStrategy>>,
}

impl Composite {
    pub fn new(terms: Vec<Box<dyn RewardStrategy>>) -> Self {
        Self { terms }
    }
}

impl RewardStrategy for Composite {
    fn name(&self) -> &'static str {
        "sum"
    }

    fn reset(&mut self, baseline: &Snapshot) {
        for term in &mut self.terms {
            term.reset(baseline);
        }
    }

    fn reward(&mut self, ctx: &RewardContext<'_>) -> f64 {
        self.terms.iter_mut().map(|term| term.reward(ctx)).sum()
    }
}

/// Serializable choice of reward strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RewardSpec {
    Resource(ResourceWeights),
    Boss(BossRewardConfig),
    SafeZone(SafeZoneConfig),
    Inactivity(InactivityConfig),
    Sum { terms: Vec<RewardSpec> },
}

impl Default for RewardSpec {
    fn default() -> Self {
        Self::Resource(ResourceWeights::default())
    }
}

impl RewardSpec {
    pub fn build(&self) -> Box<dyn RewardStrategy> {
        match self {
            Self::Resource(weights) => Box::new(ResourceDelta::new(*weights)),
            Self::Boss(config) => Box::new(BossDamage::new(*config)),
            Self::SafeZone(config) => Box::new(SafeZonePenalty::new(*config)),
            Self::Inactivity(config) => Box::new(InactivityPenalty::new(*config)),
            Self::Sum { terms } => {
                Box::new(Composite::new(terms.iter().map(RewardSpec::build).collect()))
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Boss(config) if config.reset_threshold <= 0 => Err(Error::Configuration(
                "boss reset_threshold must be positive".to_string(),
            )),
            Self::SafeZone(config)
                if config.zone.x_min > config.zone.x_max || config.zone.y_min > config.zone.y_max =>
            {
                Err(Error::Configuration(
                    "safe zone bounds are inverted".to_string(),
                ))
            }
            Self::Sum { terms } if terms.is_empty() => Err(Error::Configuration(
                "reward sum needs at least one term".to_string(),
            )),
            Self::Sum { terms } => terms.iter().try_for_each(RewardSpec::validate),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Snapshot {
        Snapshot {
            score: 1_000,
            lives: 3,
            bombs: 2,
            power: 150,
            game_state: 2,
            boss_hp: Some(1_500),
            player_position: Some([0.0, 200.0]),
            ..Default::default()
        }
    }

    fn ctx<'a>(previous: &'a Snapshot, current: &'a Snapshot) -> RewardContext<'a> {
        RewardContext {
            previous,
            current,
            movement: Movement::Left,
            slow: false,
            terminated: false,
            truncated: false,
            episode_steps: 1,
        }
    }

    fn resource(previous: &Snapshot, current: &Snapshot) -> f64 {
        ResourceDelta::new(ResourceWeights::default()).reward(&ctx(previous, current))
    }

    #[test]
    fn test_identical_snapshots_give_zero() {
        let s = snapshot();
        assert_eq!(resource(&s, &s), 0.0);
        let mut boss = BossDamage::new(BossRewardConfig::default());
        assert_eq!(boss.reward(&ctx(&s, &s)), 0.0);
    }

    #[test]
    fn test_life_fragments_equal_whole_life() {
        let previous = snapshot();
        let fragments = Snapshot {
            life_fragments: 3,
            ..snapshot()
        };
        let extra_life = Snapshot {
            lives: 4,
            ..snapshot()
        };
        let a = resource(&previous, &fragments);
        let b = resource(&previous, &extra_life);
        assert!((a - b).abs() < 1e-6);
        assert!((a - 200_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_bomb_fragments_and_score() {
        let previous = snapshot();
        let current = Snapshot {
            score: 1_500,
            bomb_fragments: 4,
            ..snapshot()
        };
        assert!((resource(&previous, &current) - 50_500.0).abs() < 1e-6);
    }

    #[test]
    fn test_boss_hp_reset_is_ignored() {
        let mut boss = BossDamage::new(BossRewardConfig::default());
        let previous = Snapshot {
            boss_hp: Some(9_999),
            ..snapshot()
        };
        let current = Snapshot {
            boss_hp: Some(0),
            ..snapshot()
        };
        assert_eq!(boss.reward(&ctx(&previous, &current)), 0.0);

        // Refill for the next phase
        assert_eq!(boss.reward(&ctx(&current, &previous)), 0.0);
    }

    #[test]
    fn test_boss_damage_and_life_loss() {
        let mut boss = BossDamage::new(BossRewardConfig::default());
        let previous = snapshot();
        let hit = Snapshot {
            boss_hp: Some(1_460),
            ..snapshot()
        };
        assert_eq!(boss.reward(&ctx(&previous, &hit)), 40.0);

        let died = Snapshot {
            lives: 2,
            boss_hp: Some(1_460),
            ..snapshot()
        };
        assert_eq!(boss.reward(&ctx(&previous, &died)), 40.0 - 100.0);
    }

    #[test]
    fn test_boss_hp_extremes_do_not_overflow() {
        let mut boss = BossDamage::new(BossRewardConfig::default());
        let previous = Snapshot {
            boss_hp: Some(2_000_000_000),
            lives: i32::MAX,
            ..snapshot()
        };
        let current = Snapshot {
            boss_hp: Some(-2_000_000_000),
            lives: i32::MIN,
            ..snapshot()
        };
        let reward = boss.reward(&ctx(&previous, &current));
        assert!(reward.is_finite());
        assert!(reward < 0.0);

        let current = Snapshot {
            boss_hp: Some(i32::MIN),
            ..snapshot()
        };
        let previous = Snapshot {
            boss_hp: Some(i32::MAX),
            ..snapshot()
        };
        assert_eq!(boss.reward(&ctx(&previous, &current)), 0.0);
    }

    #[test]
    fn test_boss_missing_hp_is_neutral() {
        let mut boss = BossDamage::new(BossRewardConfig::default());
        let previous = snapshot();
        let current = Snapshot {
            boss_hp: None,
            ..snapshot()
        };
        assert_eq!(boss.reward(&ctx(&previous, &current)), 0.0);
    }

    #[test]
    fn test_clear_bonus_decays_with_steps() {
        let mut boss = BossDamage::new(BossRewardConfig::default());
        let s = snapshot();
        let clear = |steps| RewardContext {
            terminated: true,
            episode_steps: steps,
            ..ctx(&s, &s)
        };
        assert!((boss.reward(&clear(0)) - 1_000.0).abs() < 1e-9);
        assert!((boss.reward(&clear(250)) - 750.0).abs() < 1e-9);
        assert!((boss.reward(&clear(5_000)) - 100.0).abs() < 1e-9);

        let truncated = RewardContext {
            truncated: true,
            ..clear(0)
        };
        assert_eq!(boss.reward(&truncated), 0.0);
    }

    #[test]
    fn test_safe_zone_penalty_after_grace() {
        let config = SafeZoneConfig {
            grace_steps: 2,
            ..Default::default()
        };
        let mut zone = SafeZonePenalty::new(config);
        let s = snapshot();
        let camping = Snapshot {
            player_position: Some([0.0, 420.0]),
            ..snapshot()
        };

        let rewards: Vec<f64> = (0..4).map(|_| zone.reward(&ctx(&s, &camping))).collect();
        assert_eq!(rewards, vec![0.0, 0.0, -1.0, -1.0]);

        assert_eq!(zone.reward(&ctx(&s, &s)), 0.0);
        assert_eq!(zone.reward(&ctx(&s, &camping)), 0.0);
    }

    #[test]
    fn test_inactivity_counts_repeats() {
        let mut idle = InactivityPenalty::new(InactivityConfig {
            repeat_limit: 1,
            penalty: 0.5,
        });
        let s = snapshot();
        let same = ctx(&s, &s);
        assert_eq!(idle.reward(&same), 0.0);
        assert_eq!(idle.reward(&same), 0.0);
        assert_eq!(idle.reward(&same), -0.5);

        let moved = RewardContext {
            movement: Movement::Right,
            ..same
        };
        assert_eq!(idle.reward(&moved), 0.0);

        idle.reset(&s);
        let still = RewardContext {
            movement: Movement::None,
            ..same
        };
        assert_eq!(idle.reward(&still), 0.0);
        assert_eq!(idle.reward(&still), -0.5);
    }

    #[test]
    fn test_sum_from_spec() {
        let spec: RewardSpec = serde_json::from_str(
            r#"{"kind": "sum", "terms": [{"kind": "resource"}, {"kind": "boss", "damage_scale": 2.0}]}"#,
        )
        .unwrap();
        assert!(spec.validate().is_ok());

        let mut strategy = spec.build();
        assert_eq!(strategy.name(), "sum");
        let previous = snapshot();
        let current = Snapshot {
            score: 1_010,
            boss_hp: Some(1_490),
            ..snapshot()
        };
        assert!((strategy.reward(&ctx(&previous, &current)) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_specs() {
        assert!(RewardSpec::Sum { terms: vec![] }.validate().is_err());
        let boss = RewardSpec::Boss(BossRewardConfig {
            reset_threshold: 0,
            ..Default::default()
        });
        assert!(boss.validate().is_err());
    }
}
