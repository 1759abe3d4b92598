#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line driver for Kraken Arena.
//!
//! Boots a fully bot-controlled fight, pumps the bot agent's command
//! dispatches through the world's queue, advances the simulation on a fixed
//! step, and streams the feed until a winner is declared.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, info};

use kraken_arena_core::{Controller, Event, GameSnapshot, Phase};
use kraken_arena_system_bot::{BotAgent, Config as BotConfig, Dispatch};
use kraken_arena_world::{self as world, query, Setup, World};

/// Mixed into the world seed so the bot jitter stream stays independent.
const BOT_SEED_SALT: u64 = 0x0b07_a6e7_71d3_55aa;

/// Simulated-time ceiling; a healthy fight ends well before this.
const MAX_SIMULATED_SECS: f32 = 3_600.0;

/// Headless Kraken Arena boss-fight simulation.
#[derive(Debug, Parser)]
#[command(name = "kraken-arena")]
struct Args {
    /// Seed shared by the simulation and the bot agent.
    #[arg(long, default_value_t = 0xc0ffee)]
    seed: u64,

    /// Fixed tick step in milliseconds.
    #[arg(long, default_value_t = 16, value_parser = clap::value_parser!(u64).range(1..=100))]
    dt_ms: u64,

    /// Suppress the live feed stream.
    #[arg(long)]
    quiet: bool,

    /// Print the final snapshot as JSON after the result.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut setup = Setup {
        seed: args.seed,
        ..Setup::default()
    };
    // Headless runs have nobody at the controls; let the agent drive
    // every roster slot.
    for spec in &mut setup.roster {
        spec.controller = Controller::Bot;
    }

    let mut arena = World::new(setup);
    let mut bots = BotAgent::new(BotConfig::new(args.seed ^ BOT_SEED_SALT));

    let dt = Duration::from_millis(args.dt_ms);
    let mut events: Vec<Event> = Vec::new();
    let mut dispatches: Vec<Dispatch> = Vec::new();
    let mut last_feed_id = 0;

    info!(seed = args.seed, dt_ms = args.dt_ms, "kraken-arena headless driver ready");

    let last = loop {
        let snapshot = query::snapshot(&arena);

        if !args.quiet {
            last_feed_id = print_fresh_feed(&snapshot, last_feed_id);
        }
        if snapshot.phase == Phase::GameOver {
            break snapshot;
        }
        if snapshot.server_time > MAX_SIMULATED_SECS {
            bail!("simulation did not terminate within the time ceiling");
        }

        dispatches.clear();
        bots.handle(&snapshot, dt, &mut dispatches);
        for dispatch in dispatches.drain(..) {
            world::enqueue(&mut arena, dispatch.command, dispatch.latency);
        }

        events.clear();
        world::tick(&mut arena, dt, &mut events);
        for event in &events {
            trace_event(event);
        }
    };

    print_result(&last);
    if args.json {
        let encoded =
            serde_json::to_string_pretty(&last).context("encoding the final snapshot")?;
        println!("{encoded}");
    }
    Ok(())
}

/// Prints feed entries newer than `after`, oldest first, and returns the
/// newest identifier seen.
fn print_fresh_feed(snapshot: &GameSnapshot, after: u64) -> u64 {
    let mut newest = after;
    for entry in snapshot.feed.iter().rev() {
        if entry.id > after {
            println!("[{at:7.2}] {message}", at = entry.at, message = entry.message);
            newest = newest.max(entry.id);
        }
    }
    newest
}

fn print_result(snapshot: &GameSnapshot) {
    match snapshot.winner {
        Some(winner) => {
            let name = snapshot
                .player(winner.player)
                .map_or("unknown", |player| player.name.as_str());
            println!();
            println!("Winner: {name} ({reason:?})", reason = winner.reason);
        }
        None => println!("No winner declared."),
    }

    println!("Final standings after round {round}:", round = snapshot.round);
    for player in &snapshot.players {
        println!(
            "  {name:<12} score {score} (last hits {last_hits}, smites {smites})  gold {gold}",
            name = player.name,
            score = player.score,
            last_hits = player.last_hit_score,
            smites = player.smite_score,
            gold = player.gold,
        );
    }
}

fn trace_event(event: &Event) {
    match event {
        Event::RoundStarted { round, boss_max_hp } => {
            info!(round, boss_max_hp, "round.started");
        }
        Event::ShopOpened { round } => info!(round, "shop.opened"),
        Event::RoundEnded { round, reason } => {
            info!(round, ?reason, "round.ended");
        }
        Event::FrenzyChanged { active } => info!(active, "boss.frenzy"),
        Event::GameEnded { winner, reason } => {
            info!(winner = winner.get(), ?reason, "game.ended");
        }
        other => debug!(?other, "event"),
    }
}
