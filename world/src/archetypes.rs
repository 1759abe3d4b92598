//! Archetype kits: stat hooks, attack transforms, and skill casts.
//!
//! Kits are stateless; every per-combatant variable lives in the
//! [`KitState`] bag owned by the player record. The world drives the hooks
//! in a fixed order each tick and applies the returned outcomes, so kit
//! code never touches the boss, the queue, or other players directly.

use kraken_arena_core::{Archetype, PlayerColor, SkillSlot, Stats, Vec2};

/// Stack ceiling for the wand kit.
const WAND_STACK_CAP: u32 = 25;
/// Focus-charge ceiling for the bow kit.
const BOW_FOCUS_CAP: u32 = 8;
/// Speed above which crossbow momentum accrues.
const MOMENTUM_SPEED_GATE: f32 = 120.0;

const STANCE_ASSAULT_BURST: PlayerColor = PlayerColor::from_rgb(0xff, 0xb3, 0x5e);
const STANCE_GUARD_BURST: PlayerColor = PlayerColor::from_rgb(0x8d, 0xb3, 0xff);
const WAND_INFUSION_BURST: PlayerColor = PlayerColor::from_rgb(0xab, 0x95, 0xff);
const BOW_FOCUS_BURST: PlayerColor = PlayerColor::from_rgb(0x9f, 0xd8, 0xff);
const BOOMERANG_HUNT_BURST: PlayerColor = PlayerColor::from_rgb(0xff, 0xb9, 0x6e);
const CROSSBOW_RELOAD_BURST: PlayerColor = PlayerColor::from_rgb(0x9b, 0xf8, 0xf1);

/// Static definition of one active-skill slot.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SkillDef {
    /// Display name of the skill.
    pub(crate) name: &'static str,
    /// Cooldown armed after a successful cast, in seconds.
    pub(crate) cooldown: f32,
}

/// Looks up the static kit definition for a slot.
pub(crate) fn skill_def(archetype: Archetype, slot: SkillSlot) -> SkillDef {
    let (name, cooldown) = match (archetype, slot) {
        (Archetype::Stance, SkillSlot::First) => ("Assault Order", 12.0),
        (Archetype::Stance, SkillSlot::Second) => ("Iron Formation", 14.0),
        (Archetype::Stance, SkillSlot::Third) => ("Stance Breaker", 20.0),
        (Archetype::Wand, SkillSlot::First) => ("Arc Barrage", 10.0),
        (Archetype::Wand, SkillSlot::Second) => ("Mana Infusion", 16.0),
        (Archetype::Wand, SkillSlot::Third) => ("Overcharge Burst", 22.0),
        (Archetype::Boomerang, SkillSlot::First) => ("Return Throw", 11.0),
        (Archetype::Boomerang, SkillSlot::Second) => ("Hunter's Instinct", 15.0),
        (Archetype::Boomerang, SkillSlot::Third) => ("Score Awakening", 24.0),
        (Archetype::Bow, SkillSlot::First) => ("Piercing Arrow", 9.0),
        (Archetype::Bow, SkillSlot::Second) => ("Focused Volley", 14.0),
        (Archetype::Bow, SkillSlot::Third) => ("Arrow Storm", 20.0),
        (Archetype::Crossbow, SkillSlot::First) => ("Rhythm Break", 8.0),
        (Archetype::Crossbow, SkillSlot::Second) => ("Mobile Reload", 13.0),
        (Archetype::Crossbow, SkillSlot::Third) => ("Siege Conversion", 21.0),
    };
    SkillDef { name, cooldown }
}

/// Flat bonuses a kit contributes during derived-stat recomputation.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct BonusStats {
    pub(crate) attack: f32,
    pub(crate) magic: f32,
    pub(crate) armor: f32,
    pub(crate) attack_speed: f32,
    pub(crate) move_speed: f32,
    pub(crate) bind_immune: bool,
}

/// Side notices raised by kit hooks, surfaced through the feed and events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum KitNotice {
    /// The stance kit swapped its active stance.
    StanceShifted {
        /// Whether the new stance is assault.
        assault: bool,
    },
    /// The wand kit reached a stack milestone.
    StacksReached(u32),
    /// The boomerang kit gained permanent growth.
    GrowthGained(u32),
    /// The crossbow kit landed a perfect-rhythm cast.
    PerfectVolley,
}

/// Immutable caster context handed to skill casts.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CastContext {
    /// Derived stats at cast time.
    pub(crate) stats: Stats,
    /// Health ceiling of the caster.
    pub(crate) max_hp: f32,
    /// Current total score of the caster.
    pub(crate) score: u32,
}

/// Everything a skill cast asks the world to apply.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct CastOutcome {
    /// Boss damage with the label attached to the tracer effect.
    pub(crate) boss_damage: Option<(f32, &'static str)>,
    /// Health restored to the caster.
    pub(crate) heal: f32,
    /// Caster displacement, clamped into the arena by the world.
    pub(crate) displacement: Option<Vec2>,
    /// Whether the normal-attack cooldown resets immediately.
    pub(crate) reset_attack_cooldown: bool,
    /// Burst effect color spawned at the caster.
    pub(crate) burst: Option<PlayerColor>,
    /// Side notice raised by the cast.
    pub(crate) notice: Option<KitNotice>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StanceMode {
    Assault,
    Guard,
}

#[derive(Clone, Debug)]
pub(crate) struct StanceState {
    mode: StanceMode,
    mode_timer: f32,
    lock: Option<StanceMode>,
    lock_timer: f32,
}

#[derive(Clone, Debug)]
pub(crate) struct WandState {
    stacks: u32,
    haste_timer: f32,
}

#[derive(Clone, Debug)]
pub(crate) struct BoomerangState {
    growth: u32,
    hunt_timer: f32,
}

#[derive(Clone, Debug)]
pub(crate) struct BowState {
    focus: u32,
}

#[derive(Clone, Debug)]
pub(crate) struct CrossbowState {
    beat: u32,
    momentum: f32,
    stationary: f32,
    rush_timer: f32,
    bastion_timer: f32,
}

/// Per-combatant kit state bag, opaque to everything but this module.
#[derive(Clone, Debug)]
pub(crate) enum KitState {
    Stance(StanceState),
    Wand(WandState),
    Boomerang(BoomerangState),
    Bow(BowState),
    Crossbow(CrossbowState),
}

impl KitState {
    /// Fresh state for a newly equipped kit.
    pub(crate) fn new(archetype: Archetype) -> Self {
        match archetype {
            Archetype::Stance => Self::Stance(StanceState {
                mode: StanceMode::Assault,
                mode_timer: 5.0,
                lock: None,
                lock_timer: 0.0,
            }),
            Archetype::Wand => Self::Wand(WandState {
                stacks: 0,
                haste_timer: 0.0,
            }),
            Archetype::Boomerang => Self::Boomerang(BoomerangState {
                growth: 0,
                hunt_timer: 0.0,
            }),
            Archetype::Bow => Self::Bow(BowState { focus: 0 }),
            Archetype::Crossbow => Self::Crossbow(CrossbowState {
                beat: 0,
                momentum: 0.0,
                stationary: 0.0,
                rush_timer: 0.0,
                bastion_timer: 0.0,
            }),
        }
    }

    /// Re-arms round-scoped timers. Long-lived resources (wand stacks,
    /// boomerang growth, the active stance) persist across rounds.
    pub(crate) fn round_start(&mut self) {
        match self {
            Self::Stance(state) => {
                state.mode_timer = 5.0;
                state.lock = None;
                state.lock_timer = 0.0;
            }
            Self::Wand(state) => state.haste_timer = 0.0,
            Self::Boomerang(state) => state.hunt_timer = 0.0,
            Self::Bow(state) => state.focus = 0,
            Self::Crossbow(state) => {
                state.beat = 0;
                state.momentum = 0.0;
                state.stationary = 0.0;
                state.rush_timer = 0.0;
                state.bastion_timer = 0.0;
            }
        }
    }

    /// Per-tick hook; `speed` is the caster's current velocity magnitude.
    pub(crate) fn update(&mut self, dt: f32, speed: f32) -> Option<KitNotice> {
        match self {
            Self::Stance(state) => {
                if state.lock_timer > 0.0 {
                    state.lock_timer -= dt;
                    if state.lock_timer <= 0.0 {
                        state.lock = None;
                        state.lock_timer = 0.0;
                        state.mode_timer = 4.2;
                    }
                    return None;
                }
                state.mode_timer -= dt;
                if state.mode_timer <= 0.0 {
                    state.mode = match state.mode {
                        StanceMode::Assault => StanceMode::Guard,
                        StanceMode::Guard => StanceMode::Assault,
                    };
                    state.mode_timer = 5.0;
                    return Some(KitNotice::StanceShifted {
                        assault: state.mode == StanceMode::Assault,
                    });
                }
                None
            }
            Self::Wand(state) => {
                state.haste_timer = (state.haste_timer - dt).max(0.0);
                None
            }
            Self::Boomerang(state) => {
                state.hunt_timer = (state.hunt_timer - dt).max(0.0);
                None
            }
            Self::Bow(_) => None,
            Self::Crossbow(state) => {
                if speed > MOMENTUM_SPEED_GATE {
                    state.momentum = (state.momentum + dt * 0.9).min(1.0);
                    state.stationary = 0.0;
                } else {
                    state.momentum = (state.momentum - dt * 0.55).max(0.0);
                    state.stationary += dt;
                }
                state.rush_timer = (state.rush_timer - dt).max(0.0);
                state.bastion_timer = (state.bastion_timer - dt).max(0.0);
                None
            }
        }
    }

    /// Flat stat bonuses for the current tick.
    pub(crate) fn bonus_stats(&self) -> BonusStats {
        match self {
            Self::Stance(state) => {
                let mut bonus = BonusStats::default();
                match state.lock.unwrap_or(state.mode) {
                    StanceMode::Assault => bonus.attack += 20.0,
                    StanceMode::Guard => bonus.armor += 16.0,
                }
                match state.lock {
                    Some(StanceMode::Assault) => {
                        bonus.attack += 24.0;
                        bonus.attack_speed += 0.22;
                    }
                    Some(StanceMode::Guard) => {
                        bonus.armor += 24.0;
                        bonus.move_speed += 30.0;
                    }
                    None => {}
                }
                bonus
            }
            Self::Wand(state) => BonusStats {
                magic: state.stacks as f32 * 1.6,
                attack_speed: if state.haste_timer > 0.0 { 0.15 } else { 0.0 },
                ..BonusStats::default()
            },
            Self::Boomerang(state) => {
                let hunting = state.hunt_timer > 0.0;
                BonusStats {
                    attack: state.growth as f32 * 16.0,
                    attack_speed: state.growth as f32 * 0.05 + if hunting { 0.22 } else { 0.0 },
                    move_speed: if hunting { 90.0 } else { 0.0 },
                    ..BonusStats::default()
                }
            }
            Self::Bow(_) => BonusStats::default(),
            Self::Crossbow(state) => BonusStats {
                armor: if state.bastion_timer > 0.0 { 20.0 } else { 0.0 },
                attack_speed: if state.rush_timer > 0.0 { 0.1 } else { 0.0 },
                move_speed: if state.rush_timer > 0.0 { 120.0 } else { 0.0 },
                ..BonusStats::default()
            },
        }
    }

    /// Transforms one normal attack; `base_attack_speed` is the unmodified
    /// rules value the bow kit measures its haste against.
    pub(crate) fn transform_attack(
        &mut self,
        base: f32,
        stats: &Stats,
        base_attack_speed: f32,
    ) -> (f32, Option<KitNotice>) {
        match self {
            Self::Stance(_) | Self::Boomerang(_) => (base, None),
            Self::Wand(state) => {
                state.stacks = (state.stacks + 1).min(WAND_STACK_CAP);
                let notice = (state.stacks > 0 && state.stacks % 5 == 0)
                    .then_some(KitNotice::StacksReached(state.stacks));
                (
                    base + state.stacks as f32 * 2.2 + stats.magic * 0.08,
                    notice,
                )
            }
            Self::Bow(state) => {
                let haste_gain = (stats.attack_speed - base_attack_speed).max(0.0);
                let mut damage = base + haste_gain * 52.0;
                if state.focus > 0 {
                    state.focus -= 1;
                    damage += stats.magic * 0.35 + 40.0;
                }
                (damage, None)
            }
            Self::Crossbow(state) => {
                state.beat = (state.beat + 1) % 3;
                let mut damage = base + state.momentum * 24.0;
                if state.stationary > 1.2 {
                    damage += 18.0;
                }
                if state.beat == 0 {
                    damage *= 1.35;
                }
                (damage, None)
            }
        }
    }

    /// Reaction to a scoring event.
    pub(crate) fn score_changed(&mut self) -> Option<KitNotice> {
        match self {
            Self::Boomerang(state) => {
                state.growth += 1;
                Some(KitNotice::GrowthGained(state.growth))
            }
            _ => None,
        }
    }

    /// Executes a skill cast and reports what the world should apply.
    pub(crate) fn cast(&mut self, slot: SkillSlot, ctx: &CastContext) -> CastOutcome {
        match self {
            Self::Stance(state) => match slot {
                SkillSlot::First => {
                    state.mode = StanceMode::Assault;
                    state.lock = Some(StanceMode::Assault);
                    state.lock_timer = 4.0;
                    state.mode_timer = 5.0;
                    CastOutcome {
                        burst: Some(STANCE_ASSAULT_BURST),
                        ..CastOutcome::default()
                    }
                }
                SkillSlot::Second => {
                    state.mode = StanceMode::Guard;
                    state.lock = Some(StanceMode::Guard);
                    state.lock_timer = 4.0;
                    state.mode_timer = 5.0;
                    CastOutcome {
                        heal: ctx.max_hp * 0.12 + ctx.stats.armor * 1.6,
                        burst: Some(STANCE_GUARD_BURST),
                        ..CastOutcome::default()
                    }
                }
                SkillSlot::Third => {
                    let damage = match state.lock.unwrap_or(state.mode) {
                        StanceMode::Assault => {
                            ctx.stats.attack * 2.2 + ctx.stats.magic * 0.8
                        }
                        StanceMode::Guard => ctx.stats.attack * 1.4 + ctx.stats.armor * 6.2,
                    };
                    CastOutcome {
                        boss_damage: Some((damage, "Stance Breaker")),
                        ..CastOutcome::default()
                    }
                }
            },
            Self::Wand(state) => match slot {
                SkillSlot::First => {
                    let per_bolt = ctx.stats.attack * 0.35
                        + ctx.stats.magic * 0.52
                        + state.stacks as f32 * 1.4;
                    CastOutcome {
                        boss_damage: Some((per_bolt * 4.0, "Arc Barrage")),
                        ..CastOutcome::default()
                    }
                }
                SkillSlot::Second => {
                    state.stacks = (state.stacks + 4).min(WAND_STACK_CAP);
                    state.haste_timer = 6.0;
                    CastOutcome {
                        heal: 220.0 + ctx.stats.magic * 0.35,
                        burst: Some(WAND_INFUSION_BURST),
                        ..CastOutcome::default()
                    }
                }
                SkillSlot::Third => {
                    let consumed = state.stacks;
                    state.stacks = 0;
                    CastOutcome {
                        boss_damage: Some((
                            ctx.stats.magic * 1.1 + consumed as f32 * 48.0,
                            "Overcharge Burst",
                        )),
                        ..CastOutcome::default()
                    }
                }
            },
            Self::Boomerang(state) => match slot {
                SkillSlot::First => CastOutcome {
                    boss_damage: Some((
                        (ctx.stats.attack * 0.95 + state.growth as f32 * 13.0) * 2.0,
                        "Return Throw",
                    )),
                    ..CastOutcome::default()
                },
                SkillSlot::Second => {
                    state.hunt_timer = 6.0;
                    CastOutcome {
                        heal: 150.0 + state.growth as f32 * 12.0,
                        burst: Some(BOOMERANG_HUNT_BURST),
                        ..CastOutcome::default()
                    }
                }
                SkillSlot::Third => CastOutcome {
                    boss_damage: Some((
                        ctx.stats.attack * 1.3
                            + ctx.score as f32 * 160.0
                            + state.growth as f32 * 95.0,
                        "Score Awakening",
                    )),
                    ..CastOutcome::default()
                },
            },
            Self::Bow(state) => match slot {
                SkillSlot::First => CastOutcome {
                    boss_damage: Some((
                        ctx.stats.attack + ctx.stats.attack_speed * 115.0,
                        "Piercing Arrow",
                    )),
                    ..CastOutcome::default()
                },
                SkillSlot::Second => {
                    state.focus = (state.focus + 5).min(BOW_FOCUS_CAP);
                    CastOutcome {
                        burst: Some(BOW_FOCUS_BURST),
                        ..CastOutcome::default()
                    }
                }
                SkillSlot::Third => {
                    let per_arrow =
                        ctx.stats.attack * 0.45 + ctx.stats.attack_speed * 28.0;
                    CastOutcome {
                        boss_damage: Some((per_arrow * 6.0, "Arrow Storm")),
                        ..CastOutcome::default()
                    }
                }
            },
            Self::Crossbow(state) => match slot {
                SkillSlot::First => {
                    let perfect = state.beat == 2;
                    let damage = ctx.stats.attack * if perfect { 2.2 } else { 1.2 }
                        + state.momentum * if perfect { 140.0 } else { 90.0 };
                    state.beat = 0;
                    CastOutcome {
                        boss_damage: Some((damage, "Rhythm Break")),
                        notice: perfect.then_some(KitNotice::PerfectVolley),
                        ..CastOutcome::default()
                    }
                }
                SkillSlot::Second => {
                    state.rush_timer = 3.0;
                    state.momentum = (state.momentum + 0.5).min(1.0);
                    CastOutcome {
                        reset_attack_cooldown: true,
                        displacement: Some(Vec2::new(0.0, -120.0)),
                        burst: Some(CROSSBOW_RELOAD_BURST),
                        ..CastOutcome::default()
                    }
                }
                SkillSlot::Third => {
                    let damage = ctx.stats.attack * 1.2
                        + state.momentum * 220.0
                        + ctx.stats.move_speed * 0.25;
                    state.momentum *= 0.4;
                    state.bastion_timer = 4.0;
                    CastOutcome {
                        boss_damage: Some((damage, "Siege Conversion")),
                        ..CastOutcome::default()
                    }
                }
            },
        }
    }
}
