#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs the OpenDungeons simulation headless.
//!
//! The adapter loads a level (or builds the two-keeper demo map), drives the
//! turn scheduler for the requested number of turns and reports the published
//! events, either as JSON lines on stdout or as per-turn log summaries.

mod demo;
mod level_file;

use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use opendungeons_core::{NotificationQueue, SimulationConfig};
use opendungeons_system_scheduler::{Config, TurnScheduler};
use opendungeons_world::{query, World};

/// Runs the authoritative dungeon simulation without a renderer.
#[derive(Debug, Parser)]
#[command(name = "opendungeons", version, about)]
struct Cli {
    /// Number of turns to simulate.
    #[arg(long, default_value_t = 100)]
    turns: u64,
    /// Seed of every random stream in the simulation.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Width of the demo map, ignored when a level is loaded.
    #[arg(long, default_value_t = 24, value_parser = clap::value_parser!(u32).range(i64::from(demo::MIN_SIZE)..))]
    width: u32,
    /// Height of the demo map, ignored when a level is loaded.
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u32).range(i64::from(demo::MIN_SIZE)..))]
    height: u32,
    /// TOML file overriding the default simulation tuning.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Level snapshot to start from instead of the demo map.
    #[arg(long)]
    load: Option<PathBuf>,
    /// Where to write a level snapshot once the last turn completed.
    #[arg(long)]
    save: Option<PathBuf>,
    /// Prints every published event as a JSON line.
    #[arg(long)]
    json: bool,
}

/// Entry point for the OpenDungeons command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => level_file::load_config(path)?,
        None => SimulationConfig::default(),
    };
    let (level, opening) = match &cli.load {
        Some(path) => (level_file::load_level(path)?, Vec::new()),
        None => (
            demo::level(cli.width, cli.height),
            demo::opening_orders(cli.width, cli.height),
        ),
    };

    let mut world = World::from_level(&level, config).context("failed to build the world")?;
    let mut scheduler = TurnScheduler::new(Config::new(cli.seed));
    for order in opening {
        if let Err(error) = scheduler.submit(&mut world, order) {
            tracing::warn!(%error, "opening order rejected");
        }
    }

    let mut queue = NotificationQueue::new();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for _ in 0..cli.turns {
        let summary = scheduler
            .run_turn(&mut world, &mut queue)
            .context("turn aborted")?;
        if cli.json {
            for event in queue.drain() {
                let line = serde_json::to_string(&event).context("failed to encode event")?;
                writeln!(out, "{line}").context("failed to write event")?;
            }
        } else {
            let _ = queue.drain().count();
            tracing::info!(
                turn = summary.turn,
                events = summary.events,
                spawned = summary.spawned,
                creatures = summary.creatures_ticked,
                corpses = summary.corpses,
                "turn finished"
            );
        }
    }

    for seat in query::seat_ids(&world) {
        if let Some(view) = query::seat(&world, seat) {
            let population = query::population(&world, seat);
            tracing::info!(
                seat = seat.get(),
                gold = view.gold,
                mana = view.mana,
                claimed = view.claimed_tiles,
                creatures = population.total,
                workers = population.workers,
                goals = ?view.goals,
                "final standing"
            );
        }
    }

    if let Some(path) = &cli.save {
        level_file::save_level(&query::export_level(&world), path)?;
        tracing::info!(path = %path.display(), "level saved");
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
}
