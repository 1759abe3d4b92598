use std::time::Duration;

use kraken_arena_core::{Controller, Event, GameSnapshot, Phase};
use kraken_arena_system_bot::{BotAgent, Config, Dispatch};
use kraken_arena_world::{self as world, query, Setup, World};

#[test]
fn bot_driven_sessions_terminate_and_replay_identically() {
    let first = run_session(9);
    let second = run_session(9);

    assert_eq!(first.0, second.0, "event streams diverged");
    assert_eq!(first.1, second.1, "final snapshots diverged");
    assert!(first.1.winner.is_some());
}

#[test]
fn bots_act_exclusively_through_the_queue() {
    let (events, snapshot) = run_session(21);

    // Everything bots did is visible as ordinary command outcomes.
    assert!(
        events
            .iter()
            .any(|event| matches!(event, Event::SkillCast { .. })),
        "bots never cast a skill"
    );
    assert!(
        events
            .iter()
            .any(|event| matches!(event, Event::ItemPurchased { .. })),
        "bots never shopped"
    );
    assert!(
        events
            .iter()
            .any(|event| matches!(event, Event::SmiteUsed { .. })),
        "bots never attempted the finishing strike"
    );
    assert_eq!(snapshot.phase, Phase::GameOver);
}

fn run_session(seed: u64) -> (Vec<Event>, GameSnapshot) {
    let mut setup = Setup {
        seed,
        ..Setup::default()
    };
    for spec in &mut setup.roster {
        spec.controller = Controller::Bot;
    }

    let mut arena = World::new(setup);
    let mut bots = BotAgent::new(Config::new(seed.wrapping_add(1)));
    let dt = Duration::from_millis(50);
    let mut events = Vec::new();
    let mut dispatches: Vec<Dispatch> = Vec::new();

    let mut guard = 0_u32;
    loop {
        let snapshot = query::snapshot(&arena);
        if snapshot.phase == Phase::GameOver {
            return (events, snapshot);
        }
        guard += 1;
        assert!(guard < 40_000, "session failed to terminate");

        dispatches.clear();
        bots.handle(&snapshot, dt, &mut dispatches);
        for dispatch in dispatches.drain(..) {
            world::enqueue(&mut arena, dispatch.command, dispatch.latency);
        }
        world::tick(&mut arena, dt, &mut events);
    }
}
