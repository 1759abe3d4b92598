#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Bot agent system that drives non-human combatants.
//!
//! The agent reads the same public snapshot presentation consumes and
//! expresses every decision as ordinary [`Command`] values tagged with
//! synthetic latency, for the driver to push through the world's queue. It
//! holds no privileged state: what it cannot see in the snapshot, it cannot
//! act on.

use std::collections::BTreeMap;
use std::time::Duration;

use kraken_arena_core::{
    Command, Controller, GameSnapshot, ItemId, ItemSlot, Phase, PlayerId, PlayerSnapshot,
    SkillSlot, Vec2,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Boss health margin above the smite threshold at which bots pre-commit
/// their strike, absorbing queue latency.
const SMITE_SAFETY_MARGIN: f32 = 190.0;

/// Seconds between movement-intent transmissions.
const TRANSMIT_CADENCE: f32 = 0.05;

/// Minimum direction change worth retransmitting.
const TRANSMIT_EPSILON: f32 = 0.02;

/// Fixed shopping list walked most-wanted first.
const SHOP_PRIORITY: [ItemId; 5] = [
    ItemId::TideBoots,
    ItemId::RapidGloves,
    ItemId::IronBlade,
    ItemId::GuardPlate,
    ItemId::LeviathanCore,
];

/// Purchases attempted per shop phase.
const SHOP_BUY_LIMIT: usize = 2;

/// Configuration parameters required to construct the bot agent.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided jitter seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }
}

/// A command paired with the synthetic latency it should be enqueued with.
#[derive(Clone, Debug, PartialEq)]
pub struct Dispatch {
    /// The intent to enqueue.
    pub command: Command,
    /// Simulated network delay before the command arrives.
    pub latency: Duration,
}

#[derive(Clone, Debug)]
struct Mind {
    round_seen: u32,
    wander_target: Vec2,
    move_timer: f32,
    transmit_timer: f32,
    sent_direction: Vec2,
    think_timer: f32,
    smite_requested: bool,
    shopped: bool,
}

impl Mind {
    fn new() -> Self {
        Self {
            round_seen: 0,
            wander_target: Vec2::new(960.0, 780.0),
            move_timer: 0.0,
            transmit_timer: 0.0,
            sent_direction: Vec2::ZERO,
            think_timer: 0.8,
            smite_requested: false,
            shopped: false,
        }
    }
}

/// Pure system that synthesizes commands for bot-controlled combatants.
#[derive(Debug)]
pub struct BotAgent {
    rng: ChaCha8Rng,
    minds: BTreeMap<PlayerId, Mind>,
}

impl BotAgent {
    /// Creates a new agent using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            minds: BTreeMap::new(),
        }
    }

    /// Consumes the snapshot and emits command dispatches for every bot.
    ///
    /// The output buffer is appended to, never cleared, so one buffer can
    /// collect dispatches across systems.
    pub fn handle(&mut self, snapshot: &GameSnapshot, dt: Duration, out: &mut Vec<Dispatch>) {
        let dt = dt.as_secs_f32();
        let rng = &mut self.rng;
        let minds = &mut self.minds;

        for player in &snapshot.players {
            if player.controller != Controller::Bot {
                continue;
            }
            let mind = minds.entry(player.id).or_insert_with(Mind::new);

            if mind.round_seen != snapshot.round {
                mind.round_seen = snapshot.round;
                mind.smite_requested = false;
                mind.shopped = false;
                mind.move_timer = 0.0;
                mind.think_timer = 0.6 + rng.gen::<f32>() * 0.5;
            }

            match snapshot.phase {
                Phase::Battle if player.alive => {
                    battle_pass(rng, mind, snapshot, player, dt, out);
                }
                Phase::Shop => {
                    if !mind.shopped {
                        mind.shopped = true;
                        shop_pass(rng, player, out);
                    }
                }
                _ => {}
            }
        }
    }
}

fn battle_pass(
    rng: &mut ChaCha8Rng,
    mind: &mut Mind,
    snapshot: &GameSnapshot,
    player: &PlayerSnapshot,
    dt: f32,
    out: &mut Vec<Dispatch>,
) {
    // Periodic randomized wander target.
    mind.move_timer -= dt;
    if mind.move_timer <= 0.0 {
        mind.move_timer = 0.8 + rng.gen::<f32>() * 0.9;
        mind.wander_target = Vec2::new(
            520.0 + rng.gen::<f32>() * 880.0,
            700.0 + rng.gen::<f32>() * 220.0,
        );
    }

    // Movement intents ride the same throttled cadence an input adapter
    // uses, and only when the direction meaningfully changed.
    mind.transmit_timer -= dt;
    if mind.transmit_timer <= 0.0 {
        mind.transmit_timer = TRANSMIT_CADENCE;
        let direction = (mind.wander_target - player.position).normalized();
        if (direction - mind.sent_direction).length() > TRANSMIT_EPSILON {
            mind.sent_direction = direction;
            out.push(Dispatch {
                command: Command::Move {
                    player: player.id,
                    direction,
                },
                latency: jitter_ms(rng, 10.0, 25.0),
            });
        }
    }

    // Commit the reserved strike as soon as the boss drops near the
    // threshold; the margin covers damage landing while the command flies.
    if !mind.smite_requested
        && !player.smite_used
        && snapshot.boss.hp <= snapshot.boss.smite_threshold + SMITE_SAFETY_MARGIN
    {
        mind.smite_requested = true;
        out.push(Dispatch {
            command: Command::Smite { player: player.id },
            latency: jitter_ms(rng, 15.0, 65.0),
        });
    }

    // Jittered skill decisions: sustain when hurting, burst when the boss
    // is low, otherwise the default slot.
    mind.think_timer -= dt;
    if mind.think_timer <= 0.0 {
        mind.think_timer = 0.8 + rng.gen::<f32>() * 1.2;
        let hp_fraction = player.hp / player.max_hp.max(1.0);
        let boss_fraction = snapshot.boss.hp / snapshot.boss.max_hp.max(1.0);

        let slot = if hp_fraction < 0.55 && slot_ready(player, SkillSlot::Second) {
            Some(SkillSlot::Second)
        } else if boss_fraction < 0.45 && slot_ready(player, SkillSlot::Third) {
            Some(SkillSlot::Third)
        } else if slot_ready(player, SkillSlot::First) {
            Some(SkillSlot::First)
        } else {
            None
        };

        if let Some(slot) = slot {
            out.push(Dispatch {
                command: Command::CastSkill {
                    player: player.id,
                    slot,
                },
                latency: jitter_ms(rng, 8.0, 30.0),
            });
        }
    }
}

fn shop_pass(rng: &mut ChaCha8Rng, player: &PlayerSnapshot, out: &mut Vec<Dispatch>) {
    // Walk the priority list, simulating the ledger locally so at most two
    // affordable, slot-fitting purchases are requested.
    let mut gold = player.gold;
    let mut normal_slots = player.inventory.normal.len();
    let mut boots_taken = player.inventory.boots.is_some();
    let mut ultimate_taken = player.inventory.ultimate.is_some();
    let mut bought = 0;

    for item in SHOP_PRIORITY {
        if bought >= SHOP_BUY_LIMIT {
            break;
        }
        if gold < item.cost() {
            continue;
        }
        let fits = match item.slot() {
            ItemSlot::Normal => normal_slots < 4,
            ItemSlot::Boots => !boots_taken,
            ItemSlot::Ultimate => !ultimate_taken,
        };
        if !fits {
            continue;
        }

        gold = gold - item.cost() + item.refund();
        match item.slot() {
            ItemSlot::Normal => normal_slots += 1,
            ItemSlot::Boots => boots_taken = true,
            ItemSlot::Ultimate => ultimate_taken = true,
        }
        bought += 1;
        out.push(Dispatch {
            command: Command::BuyItem {
                player: player.id,
                item,
            },
            latency: jitter_ms(rng, 20.0, 40.0),
        });
    }
}

fn slot_ready(player: &PlayerSnapshot, slot: SkillSlot) -> bool {
    player
        .skills
        .get(slot.index())
        .map_or(false, |skill| skill.remaining <= 0.0)
}

fn jitter_ms(rng: &mut ChaCha8Rng, base: f32, spread: f32) -> Duration {
    Duration::from_secs_f32((base + rng.gen::<f32>() * spread) / 1_000.0)
}
