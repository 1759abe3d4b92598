#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Kraken Arena engine.
//!
//! This crate defines the message surface that connects input adapters, the
//! authoritative world, and pure systems. Adapters and agents submit
//! [`Command`] values through the world's queue, the world drains and applies
//! them deterministically, then broadcasts [`Event`] values and read-only
//! snapshots. Systems consume snapshots and respond exclusively with new
//! command batches.

use serde::{Deserialize, Serialize};

/// Canonical banner pushed onto the feed when a simulation boots.
pub const WELCOME_BANNER: &str = "Welcome to Kraken Arena.";

/// Unique identifier assigned to a combatant.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PlayerId(u32);

impl PlayerId {
    /// Creates a new player identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Visual tag applied to a combatant, consumed only by presentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl PlayerColor {
    /// Creates a new color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Two-dimensional vector measured in arena units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal component.
    pub x: f32,
    /// Vertical component.
    pub y: f32,
}

impl Vec2 {
    /// Origin vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Creates a vector from explicit components.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean length of the vector.
    #[must_use]
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Returns the unit-length vector, or zero when the input is degenerate.
    #[must_use]
    pub fn normalized(self) -> Self {
        let length = self.length();
        if length <= 1e-4 {
            return Self::ZERO;
        }
        Self {
            x: self.x / length,
            y: self.y / length,
        }
    }

    /// Dot product with another vector.
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

/// Phases the simulation cycles through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Combat phase where the boss is active and damage is resolved.
    Battle,
    /// Purchase phase between battle rounds.
    Shop,
    /// Terminal phase after a winner has been declared.
    GameOver,
}

/// Who is steering a combatant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Controller {
    /// Driven by an external input adapter.
    Human,
    /// Driven by the bot agent system.
    Bot,
}

/// One of the three independently cooled active-skill slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillSlot {
    /// Default slot, typically the archetype's bread-and-butter cast.
    First,
    /// Sustain slot.
    Second,
    /// Burst slot.
    Third,
}

impl SkillSlot {
    /// Every slot in casting-priority order.
    pub const ALL: [Self; 3] = [Self::First, Self::Second, Self::Third];

    /// Dense index of the slot, usable for cooldown tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
            Self::Third => 2,
        }
    }
}

/// Fixed ability kits a combatant can equip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    /// Alternates between assault and guard stances on a timer.
    Stance,
    /// Builds magic stacks with every attack and spends them for burst.
    Wand,
    /// Grows permanently stronger with every score event.
    Boomerang,
    /// Converts attack speed into flat on-hit damage.
    Bow,
    /// Rhythm shooter that converts movement momentum into damage.
    Crossbow,
}

impl Archetype {
    /// Every selectable archetype.
    pub const ALL: [Self; 5] = [
        Self::Stance,
        Self::Wand,
        Self::Boomerang,
        Self::Bow,
        Self::Crossbow,
    ];

    /// Display name shown by presentation layers.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Stance => "Stanceshifter",
            Self::Wand => "Arc Wand",
            Self::Boomerang => "Boomerang",
            Self::Bow => "Longbow",
            Self::Crossbow => "Crossbow",
        }
    }

    /// One-line description of the kit's identity.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Stance => "Cycles assault and guard stances on a timer",
            Self::Wand => "Stacks arcane charges for compounding power",
            Self::Boomerang => "Grows sharply with every scored point",
            Self::Bow => "Turns attack speed into raw arrow damage",
            Self::Crossbow => "Rhythm volleys fed by movement momentum",
        }
    }
}

/// Inventory slot categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemSlot {
    /// Stackable slot holding up to four items.
    Normal,
    /// Singleton footwear slot.
    Boots,
    /// Singleton keystone slot.
    Ultimate,
}

/// Flat stat deltas granted by an equipped item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemStats {
    /// Flat attack added.
    pub attack: f32,
    /// Flat magic added.
    pub magic: f32,
    /// Flat armor added.
    pub armor: f32,
    /// Attack-speed multiplier contribution.
    pub attack_speed: f32,
    /// Flat movement speed added.
    pub move_speed: f32,
}

/// Immutable catalog of purchasable items.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemId {
    /// Flat attack blade.
    IronBlade,
    /// Flat magic rod.
    ArcaneRod,
    /// Flat armor plate.
    GuardPlate,
    /// Attack-speed gloves.
    RapidGloves,
    /// Movement and attack-speed boots.
    TideBoots,
    /// Armor keystone that grants bind immunity.
    VeteranAegis,
    /// Hybrid keystone with an instant gold refund.
    LeviathanCore,
}

impl ItemId {
    /// Every purchasable item in catalog order.
    pub const ALL: [Self; 7] = [
        Self::IronBlade,
        Self::ArcaneRod,
        Self::GuardPlate,
        Self::RapidGloves,
        Self::TideBoots,
        Self::VeteranAegis,
        Self::LeviathanCore,
    ];

    /// Inventory slot the item occupies.
    #[must_use]
    pub const fn slot(self) -> ItemSlot {
        match self {
            Self::IronBlade | Self::ArcaneRod | Self::GuardPlate | Self::RapidGloves => {
                ItemSlot::Normal
            }
            Self::TideBoots => ItemSlot::Boots,
            Self::VeteranAegis | Self::LeviathanCore => ItemSlot::Ultimate,
        }
    }

    /// Gold price charged at purchase time.
    #[must_use]
    pub const fn cost(self) -> u32 {
        match self {
            Self::IronBlade => 1_600,
            Self::ArcaneRod => 1_700,
            Self::GuardPlate => 1_800,
            Self::RapidGloves => 2_000,
            Self::TideBoots => 1_500,
            Self::VeteranAegis => 4_300,
            Self::LeviathanCore => 4_700,
        }
    }

    /// Gold credited back immediately after a successful purchase.
    #[must_use]
    pub const fn refund(self) -> u32 {
        match self {
            Self::LeviathanCore => 600,
            _ => 0,
        }
    }

    /// Stat deltas the item contributes while equipped.
    #[must_use]
    pub const fn stats(self) -> ItemStats {
        match self {
            Self::IronBlade => ItemStats {
                attack: 24.0,
                magic: 0.0,
                armor: 0.0,
                attack_speed: 0.0,
                move_speed: 0.0,
            },
            Self::ArcaneRod => ItemStats {
                attack: 0.0,
                magic: 22.0,
                armor: 0.0,
                attack_speed: 0.0,
                move_speed: 0.0,
            },
            Self::GuardPlate => ItemStats {
                attack: 0.0,
                magic: 0.0,
                armor: 18.0,
                attack_speed: 0.0,
                move_speed: 0.0,
            },
            Self::RapidGloves => ItemStats {
                attack: 0.0,
                magic: 0.0,
                armor: 0.0,
                attack_speed: 0.18,
                move_speed: 0.0,
            },
            Self::TideBoots => ItemStats {
                attack: 0.0,
                magic: 0.0,
                armor: 0.0,
                attack_speed: 0.06,
                move_speed: 60.0,
            },
            Self::VeteranAegis => ItemStats {
                attack: 0.0,
                magic: 0.0,
                armor: 35.0,
                attack_speed: 0.0,
                move_speed: 0.0,
            },
            Self::LeviathanCore => ItemStats {
                attack: 35.0,
                magic: 35.0,
                armor: 0.0,
                attack_speed: 0.0,
                move_speed: 0.0,
            },
        }
    }

    /// Whether the item's passive blocks the bind status entirely.
    #[must_use]
    pub const fn grants_bind_immunity(self) -> bool {
        matches!(self, Self::VeteranAegis)
    }

    /// Display name shown in shop listings.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::IronBlade => "Iron Blade",
            Self::ArcaneRod => "Arcane Rod",
            Self::GuardPlate => "Guard Plate",
            Self::RapidGloves => "Rapid Gloves",
            Self::TideBoots => "Tide Boots",
            Self::VeteranAegis => "Veteran's Aegis",
            Self::LeviathanCore => "Leviathan Core",
        }
    }

    /// One-line shop description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::IronBlade => "Attack +24",
            Self::ArcaneRod => "Magic +22",
            Self::GuardPlate => "Armor +18",
            Self::RapidGloves => "Attack speed +18%",
            Self::TideBoots => "Move speed +60, attack speed +6%",
            Self::VeteranAegis => "Armor +35, immune to bind",
            Self::LeviathanCore => "Attack/magic +35, instant 600g refund",
        }
    }
}

/// Area patterns the boss can cast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pattern {
    /// Roots one random target unless it is immune.
    Bind,
    /// Heavy sweep across every living player.
    Swipe,
    /// Heavy bolt at one random target.
    Projectile,
    /// Moderate burst across every living player.
    Aoe,
    /// Blinds every living player and deals chip damage.
    Ink,
}

impl Pattern {
    /// Display label used by the feed and HUD.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bind => "Bind",
            Self::Swipe => "Swipe",
            Self::Projectile => "Projectile",
            Self::Aoe => "AoE",
            Self::Ink => "Ink",
        }
    }
}

/// How a scoring point was earned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreKind {
    /// A regular attack or skill reduced the boss to zero.
    LastHit,
    /// The reserved finishing strike converted the remaining health.
    Smite,
}

/// Why a battle round ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundEndReason {
    /// The boss was reduced to zero health.
    BossDefeated,
    /// Every combatant fell before the boss did.
    AllPlayersDown,
    /// The round timer expired.
    TimeExpired,
}

/// Why the declared winner won.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VictoryReason {
    /// Reached the score threshold mid-game.
    ScoreThreshold,
    /// Led the standings when the round limit was reached.
    FinalStandings,
}

/// Commands that express every permissible player intent.
///
/// Each command names the combatant it acts for. Simulated latency is not
/// part of the payload; it is supplied when the command is enqueued and only
/// affects when the command becomes visible to the drain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Replaces the combatant's movement intent with the given direction.
    Move {
        /// Acting combatant.
        player: PlayerId,
        /// Desired direction; normalized on receipt.
        direction: Vec2,
    },
    /// Replaces the combatant's aim override.
    Aim {
        /// Acting combatant.
        player: PlayerId,
        /// Desired aim direction; normalized on receipt.
        direction: Vec2,
        /// Whether the override takes precedence over auto-aim.
        manual: bool,
    },
    /// Toggles the continuous-attack desire.
    AttackIntent {
        /// Acting combatant.
        player: PlayerId,
        /// Whether the attack trigger is held.
        pressed: bool,
    },
    /// Attempts the reserved finishing strike.
    Smite {
        /// Acting combatant.
        player: PlayerId,
    },
    /// Attempts a shop purchase.
    BuyItem {
        /// Acting combatant.
        player: PlayerId,
        /// Catalog entry to purchase.
        item: ItemId,
    },
    /// Swaps the combatant's ability kit.
    SelectArchetype {
        /// Acting combatant.
        player: PlayerId,
        /// Kit to equip.
        archetype: Archetype,
    },
    /// Attempts an active-skill cast.
    CastSkill {
        /// Acting combatant.
        player: PlayerId,
        /// Slot to cast.
        slot: SkillSlot,
    },
}

impl Command {
    /// Combatant the command acts for.
    #[must_use]
    pub const fn player(&self) -> PlayerId {
        match self {
            Self::Move { player, .. }
            | Self::Aim { player, .. }
            | Self::AttackIntent { player, .. }
            | Self::Smite { player }
            | Self::BuyItem { player, .. }
            | Self::SelectArchetype { player, .. }
            | Self::CastSkill { player, .. } => *player,
        }
    }
}

/// Events broadcast by the world after each tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// A battle round began with a freshly built boss.
    RoundStarted {
        /// One-based round number.
        round: u32,
        /// Health pool of the round's boss.
        boss_max_hp: u32,
    },
    /// The purchase phase opened.
    ShopOpened {
        /// Round that just concluded.
        round: u32,
    },
    /// A battle round concluded and gold was settled.
    RoundEnded {
        /// One-based round number.
        round: u32,
        /// Terminal condition that ended the round.
        reason: RoundEndReason,
    },
    /// A winner was declared and the simulation became terminal.
    GameEnded {
        /// Winning combatant.
        winner: PlayerId,
        /// How the victory was decided.
        reason: VictoryReason,
    },
    /// The boss entered or left frenzy; emitted once per transition.
    FrenzyChanged {
        /// Whether frenzy is now active.
        active: bool,
    },
    /// The boss cast an area pattern.
    PatternCast {
        /// Pattern that was selected.
        pattern: Pattern,
    },
    /// A bind pattern fizzled against an immune target.
    BindResisted {
        /// Immune combatant.
        player: PlayerId,
    },
    /// A combatant fell for the remainder of the round.
    PlayerDowned {
        /// Fallen combatant.
        player: PlayerId,
    },
    /// A scoring point was awarded.
    ScoreAwarded {
        /// Scoring combatant.
        player: PlayerId,
        /// How the point was earned.
        kind: ScoreKind,
    },
    /// The reserved finishing strike was consumed.
    SmiteUsed {
        /// Acting combatant.
        player: PlayerId,
        /// Whether the strike connected and felled the boss.
        connected: bool,
    },
    /// A shop purchase succeeded.
    ItemPurchased {
        /// Buying combatant.
        player: PlayerId,
        /// Purchased catalog entry.
        item: ItemId,
        /// Gold credited back instantly, zero for most items.
        refund: u32,
    },
    /// A combatant swapped ability kits.
    ArchetypeSelected {
        /// Acting combatant.
        player: PlayerId,
        /// Kit now equipped.
        archetype: Archetype,
    },
    /// An active skill was cast.
    SkillCast {
        /// Casting combatant.
        player: PlayerId,
        /// Slot that was cast.
        slot: SkillSlot,
        /// Health restored by the cast, when it healed.
        healed: Option<u32>,
    },
    /// An ink-afflicted normal attack went wide.
    AttackMissed {
        /// Attacking combatant.
        player: PlayerId,
    },
    /// A stance archetype swapped between assault and guard.
    StanceShifted {
        /// Shifting combatant.
        player: PlayerId,
        /// Whether the new stance is assault.
        assault: bool,
    },
    /// A wand archetype reached a stack milestone.
    StacksReached {
        /// Stacking combatant.
        player: PlayerId,
        /// Current stack count.
        stacks: u32,
    },
    /// A boomerang archetype gained permanent growth.
    GrowthGained {
        /// Growing combatant.
        player: PlayerId,
        /// Total growth after the gain.
        growth: u32,
    },
}

/// Derived combat statistics recomputed by the world every tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Effective attack.
    pub attack: f32,
    /// Effective magic.
    pub magic: f32,
    /// Effective armor.
    pub armor: f32,
    /// Attacks per second, floor-clamped by the rules.
    pub attack_speed: f32,
    /// Seconds between normal attacks.
    pub attack_interval: f32,
    /// Movement speed in arena units per second.
    pub move_speed: f32,
    /// Whether crowd-control immunity is active.
    pub bind_immune: bool,
}

/// Read-only view of a combatant's equipped items.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryView {
    /// Stackable slot contents, at most four entries.
    pub normal: Vec<ItemId>,
    /// Footwear slot occupant.
    pub boots: Option<ItemId>,
    /// Keystone slot occupant.
    pub ultimate: Option<ItemId>,
}

/// Read-only view of one active-skill slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillView {
    /// Slot the view describes.
    pub slot: SkillSlot,
    /// Display name of the archetype's skill in this slot.
    pub name: String,
    /// Defined cooldown in seconds.
    pub cooldown: f32,
    /// Seconds remaining until the slot is castable again.
    pub remaining: f32,
}

/// Immutable public view of a single combatant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Unique identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Visual tag.
    pub color: PlayerColor,
    /// Who steers the combatant.
    pub controller: Controller,
    /// Equipped ability kit.
    pub archetype: Archetype,
    /// Whether the combatant is still standing this round.
    pub alive: bool,
    /// Current health.
    pub hp: f32,
    /// Health ceiling.
    pub max_hp: f32,
    /// Arena position.
    pub position: Vec2,
    /// Seconds of movement-disabling bind remaining.
    pub bind: f32,
    /// Seconds of miss-inducing ink remaining.
    pub ink: f32,
    /// Derived statistics for the current tick.
    pub stats: Stats,
    /// Equipped items.
    pub inventory: InventoryView,
    /// The three skill slots with their cooldown state.
    pub skills: Vec<SkillView>,
    /// Points earned by last hits.
    pub last_hit_score: u32,
    /// Points earned by finishing strikes.
    pub smite_score: u32,
    /// Total score.
    pub score: u32,
    /// Server time in seconds at which the current score was reached.
    pub score_time: Option<f32>,
    /// Gold on hand.
    pub gold: u32,
    /// Whether the reserved strike was spent this round.
    pub smite_used: bool,
    /// Boss damage dealt this round.
    pub round_damage: f32,
}

/// Immutable public view of the boss.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BossSnapshot {
    /// Current health, never negative.
    pub hp: f32,
    /// Health pool for the round.
    pub max_hp: f32,
    /// Health level at or below which a finishing strike connects.
    pub smite_threshold: f32,
    /// Whether frenzy is active.
    pub frenzy: bool,
}

/// Kinds of transient visual effects owned by the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Normal-attack tracer.
    Shot,
    /// Skill projectile tracer.
    SkillShot,
    /// Radial burst around the caster.
    SkillBurst,
    /// Finishing-strike beam.
    SmiteCast,
}

/// Transient visual descriptor decayed and pruned by the simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectSnapshot {
    /// Shape of the effect.
    pub kind: EffectKind,
    /// Seconds until the effect is pruned.
    pub ttl: f32,
    /// Origin point.
    pub from: Vec2,
    /// Destination point for directed effects.
    pub to: Option<Vec2>,
    /// Tint, normally the owning combatant's color.
    pub color: PlayerColor,
    /// Optional caption, e.g. a skill name.
    pub label: Option<String>,
}

/// One line of the capped, most-recent-first event log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedEntry {
    /// Monotonically increasing entry identifier.
    pub id: u64,
    /// Server time of the entry in seconds, rounded to two decimals.
    pub at: f32,
    /// Human-readable message.
    pub message: String,
}

/// Declared winner of the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    /// Winning combatant.
    pub player: PlayerId,
    /// How the victory was decided.
    pub reason: VictoryReason,
}

/// Complete read-only snapshot emitted once per tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Active phase.
    pub phase: Phase,
    /// One-based round number.
    pub round: u32,
    /// Seconds remaining in the active phase.
    pub phase_remaining: f32,
    /// Seconds of simulated time elapsed since construction.
    pub server_time: f32,
    /// Score required for an immediate win.
    pub score_to_win: u32,
    /// Round count after which final standings decide the winner.
    pub max_rounds: u32,
    /// Boss view.
    pub boss: BossSnapshot,
    /// Per-combatant public views in roster order.
    pub players: Vec<PlayerSnapshot>,
    /// Capped most-recent-first event log.
    pub feed: Vec<FeedEntry>,
    /// Live transient effects.
    pub effects: Vec<EffectSnapshot>,
    /// Declared winner once the simulation is terminal.
    pub winner: Option<Winner>,
}

impl GameSnapshot {
    /// Finds a combatant view by identifier.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&PlayerSnapshot> {
        self.players.iter().find(|player| player.id == id)
    }
}
