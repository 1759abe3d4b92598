//! Boss construction, frenzy timing, and weighted pattern selection.

use kraken_arena_core::Pattern;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::Rules;

/// Weighted selection table for area patterns.
const PATTERN_TABLE: [(Pattern, u32); 5] = [
    (Pattern::Bind, 15),
    (Pattern::Swipe, 20),
    (Pattern::Projectile, 25),
    (Pattern::Aoe, 20),
    (Pattern::Ink, 20),
];

/// Seconds before the first pattern cast of a round.
const FIRST_PATTERN_DELAY: f32 = 5.0;

/// Health pools per round.
const HP_TABLE: [u32; 8] = [
    5_000, 8_000, 11_000, 15_000, 19_000, 23_000, 27_000, 32_000,
];

/// Finishing-strike thresholds per round.
const SMITE_TABLE: [u32; 8] = [500, 500, 1_000, 1_000, 1_500, 1_500, 2_000, 2_000];

/// Periodic-attack base damage per round.
const DAMAGE_TABLE: [f32; 8] = [90.0, 105.0, 120.0, 140.0, 155.0, 170.0, 185.0, 200.0];

/// Authoritative boss state rebuilt at the start of every round.
#[derive(Clone, Debug)]
pub(crate) struct Boss {
    /// Health pool for the round.
    pub(crate) max_hp: f32,
    /// Current health, never negative.
    pub(crate) hp: f32,
    /// Raw damage of the periodic attack before mitigation and frenzy.
    pub(crate) base_damage: f32,
    /// Health level at or below which a finishing strike connects.
    pub(crate) smite_threshold: f32,
    /// Whether frenzy is active.
    pub(crate) frenzy: bool,
    /// Seconds until the next periodic attack.
    pub(crate) attack_timer: f32,
    /// Seconds until the next pattern cast.
    pub(crate) pattern_timer: f32,
}

impl Boss {
    /// Builds the boss scaled to the provided one-based round number.
    pub(crate) fn for_round(round: u32, rules: &Rules) -> Self {
        let index = round.clamp(1, 8) as usize - 1;
        Self {
            max_hp: HP_TABLE[index] as f32,
            hp: HP_TABLE[index] as f32,
            base_damage: DAMAGE_TABLE[index],
            smite_threshold: SMITE_TABLE[index] as f32,
            frenzy: false,
            attack_timer: rules.boss_attack_interval,
            pattern_timer: FIRST_PATTERN_DELAY,
        }
    }

    /// Raw outgoing damage including the frenzy amplification.
    pub(crate) fn outgoing_damage(&self, rules: &Rules) -> f32 {
        if self.frenzy {
            self.base_damage * (1.0 + rules.frenzy_damage_bonus)
        } else {
            self.base_damage
        }
    }

    /// Seconds between periodic attacks, shortened under frenzy.
    pub(crate) fn attack_interval(&self, rules: &Rules) -> f32 {
        if self.frenzy {
            rules.boss_attack_interval / (1.0 + rules.frenzy_haste)
        } else {
            rules.boss_attack_interval
        }
    }

    /// Seconds between pattern casts, shortened under frenzy.
    pub(crate) fn pattern_interval(&self, rules: &Rules) -> f32 {
        if self.frenzy {
            rules.frenzy_pattern_interval
        } else {
            rules.pattern_interval
        }
    }
}

/// Draws one pattern from the weighted table.
pub(crate) fn pick_pattern(rng: &mut ChaCha8Rng) -> Pattern {
    let total: u32 = PATTERN_TABLE.iter().map(|(_, weight)| weight).sum();
    let mut roll = rng.gen::<f64>() * f64::from(total);
    for (pattern, weight) in PATTERN_TABLE {
        roll -= f64::from(weight);
        if roll <= 0.0 {
            return pattern;
        }
    }
    PATTERN_TABLE[PATTERN_TABLE.len() - 1].0
}
