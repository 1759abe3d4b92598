use std::time::Duration;

use kraken_arena_core::{Command, Event, GameSnapshot, Phase, PlayerId, SkillSlot, Vec2};
use kraken_arena_world::{self as world, query, Setup, World};

#[test]
fn scripted_sessions_replay_identically() {
    let first = scripted_session(0x5eed);
    let second = scripted_session(0x5eed);

    assert_eq!(first.0, second.0, "event streams diverged");
    assert_eq!(first.1, second.1, "final snapshots diverged");
}

#[test]
fn full_sessions_run_to_a_winner_without_input() {
    let mut arena = World::new(Setup {
        seed: 77,
        ..Setup::default()
    });
    let mut events = Vec::new();

    let mut guard = 0_u32;
    while query::phase(&arena) != Phase::GameOver {
        world::tick(&mut arena, Duration::from_millis(50), &mut events);
        guard += 1;
        assert!(guard < 40_000, "session failed to terminate");
    }

    let snapshot = query::snapshot(&arena);
    let winner = snapshot.winner.expect("terminal phase declares a winner");
    assert!(snapshot
        .players
        .iter()
        .any(|player| player.id == winner.player));
    assert_eq!(
        events
            .iter()
            .filter(|event| matches!(event, Event::GameEnded { .. }))
            .count(),
        1,
        "exactly one winner declaration"
    );
}

#[test]
fn hp_and_gold_invariants_hold_through_a_full_session() {
    let setup = Setup {
        seed: 101,
        ..Setup::default()
    };
    let max_gold = setup.rules.max_gold;
    let mut arena = World::new(setup);
    let mut events = Vec::new();

    let mut guard = 0_u32;
    while query::phase(&arena) != Phase::GameOver {
        world::tick(&mut arena, Duration::from_millis(50), &mut events);
        guard += 1;
        assert!(guard < 40_000, "session failed to terminate");

        if guard % 20 == 0 {
            let snapshot = query::snapshot(&arena);
            assert!(snapshot.boss.hp >= 0.0);
            for player in &snapshot.players {
                assert!(player.hp >= 0.0, "{name} hp negative", name = player.name);
                assert!(
                    player.hp <= player.max_hp,
                    "{name} hp above cap",
                    name = player.name
                );
                assert!(player.gold <= max_gold);
                for skill in &player.skills {
                    assert!(skill.remaining >= 0.0);
                    assert!(skill.remaining <= skill.cooldown);
                }
            }
        }
    }
}

fn scripted_session(seed: u64) -> (Vec<Event>, GameSnapshot) {
    let mut arena = World::new(Setup {
        seed,
        ..Setup::default()
    });
    let mut events = Vec::new();

    for (delay_ticks, latency_ms, command) in script() {
        for _ in 0..delay_ticks {
            world::tick(&mut arena, Duration::from_millis(50), &mut events);
        }
        world::enqueue(&mut arena, command, Duration::from_millis(latency_ms));
    }
    for _ in 0..600 {
        world::tick(&mut arena, Duration::from_millis(50), &mut events);
    }

    (events, query::snapshot(&arena))
}

fn script() -> Vec<(u32, u64, Command)> {
    let first = PlayerId::new(0);
    let second = PlayerId::new(1);
    let third = PlayerId::new(2);

    vec![
        (
            0,
            40,
            Command::Move {
                player: first,
                direction: Vec2::new(1.0, 0.3),
            },
        ),
        (
            2,
            10,
            Command::AttackIntent {
                player: second,
                pressed: false,
            },
        ),
        (
            1,
            80,
            Command::CastSkill {
                player: third,
                slot: SkillSlot::First,
            },
        ),
        (
            3,
            0,
            Command::AttackIntent {
                player: second,
                pressed: true,
            },
        ),
        (
            1,
            25,
            Command::CastSkill {
                player: first,
                slot: SkillSlot::Second,
            },
        ),
        (
            4,
            120,
            Command::Move {
                player: third,
                direction: Vec2::new(-0.5, 0.2),
            },
        ),
        (2, 15, Command::Smite { player: second }),
        (
            1,
            60,
            Command::CastSkill {
                player: second,
                slot: SkillSlot::Third,
            },
        ),
        (
            5,
            90,
            Command::Aim {
                player: first,
                direction: Vec2::new(0.2, -1.0),
                manual: true,
            },
        ),
    ]
}
