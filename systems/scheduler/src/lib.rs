#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Turn scheduler driving the authoritative simulation one turn at a time.
//!
//! A turn runs strictly in order: deferred deletions, building and seat
//! upkeep, temple and portal spawns, then the creature pass in registry
//! insertion order. Every event generated along the way, including those of
//! player commands submitted since the previous turn, is published to the
//! [`NotificationSink`] once the turn completed.

use opendungeons_core::{Command, CommandError, Event, NotificationError, NotificationSink};
use opendungeons_system_creature_ai::{self as creature_ai, CreatureAi, Tick};
use opendungeons_system_spawning::{self as spawning, Spawning};
use opendungeons_world::{apply, query, World};
use thiserror::Error;

/// Mixed into the seed of the spawning stream so it differs from the agent's.
const SPAWNING_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

/// Configuration parameters required to construct the scheduler.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided random seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Failures aborting the publication of a turn.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The sink refused an event; the remaining events of the turn are dropped.
    #[error("failed to publish the events of turn {turn}")]
    Notification {
        /// Turn whose events were being published.
        turn: u64,
        /// Failure reported by the sink.
        #[source]
        source: NotificationError,
    },
}

/// Statistics describing a completed turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TurnSummary {
    /// Number of the turn that ran.
    pub turn: u64,
    /// Events published to the sink.
    pub events: usize,
    /// Creatures created by temples and portals.
    pub spawned: usize,
    /// Living creatures that received an agent tick.
    pub creatures_ticked: usize,
    /// Creatures whose tick hit the transition cap.
    pub exhausted: usize,
    /// Dead creatures whose death counter advanced.
    pub corpses: usize,
}

/// Orchestrates the systems over the world, one turn at a time.
#[derive(Debug)]
pub struct TurnScheduler {
    agent: CreatureAi,
    spawning: Spawning,
    pending: Vec<Event>,
    commands: Vec<Command>,
}

impl TurnScheduler {
    /// Creates a new scheduler whose systems are seeded from the configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            agent: CreatureAi::new(creature_ai::Config::new(config.rng_seed)),
            spawning: Spawning::new(spawning::Config::new(config.rng_seed ^ SPAWNING_STREAM)),
            pending: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Applies a player command between turns.
    ///
    /// Accepted commands mutate the world immediately; their events are
    /// published with the next turn.
    pub fn submit(&mut self, world: &mut World, command: Command) -> Result<(), CommandError> {
        apply(world, command, &mut self.pending)
    }

    /// Number of events waiting for the next publication.
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.pending.len()
    }

    /// Runs one full turn and publishes its events in generation order.
    pub fn run_turn(
        &mut self,
        world: &mut World,
        sink: &mut dyn NotificationSink,
    ) -> Result<TurnSummary, SchedulerError> {
        let span = tracing::info_span!("turn", turn = query::turn(world) + 1);
        let _entered = span.enter();

        let mut events = std::mem::take(&mut self.pending);
        let mut summary = TurnSummary::default();

        let _ = run_step(world, Command::BeginTurn, &mut events);
        let _ = run_step(world, Command::Upkeep, &mut events);
        summary.turn = query::turn(world);

        self.spawning.handle(world, &mut self.commands);
        for command in self.commands.drain(..) {
            if run_step(world, command, &mut events) {
                summary.spawned += 1;
            }
        }

        for id in query::creature_ids(world) {
            let Some(creature) = query::creature(world, id) else {
                continue;
            };
            if creature.alive {
                let _ = run_step(world, Command::CreatureUpkeep { creature: id }, &mut events);
                match self.agent.handle(world, id, &mut events) {
                    Tick::Settled => summary.creatures_ticked += 1,
                    Tick::Exhausted => {
                        summary.creatures_ticked += 1;
                        summary.exhausted += 1;
                    }
                    Tick::Skipped => {}
                }
            } else {
                let _ = run_step(world, Command::DecayCorpse { creature: id }, &mut events);
                summary.corpses += 1;
            }
        }

        let turn = summary.turn;
        for event in events {
            sink.publish(event)
                .map_err(|source| SchedulerError::Notification { turn, source })?;
            summary.events += 1;
        }

        tracing::debug!(
            events = summary.events,
            spawned = summary.spawned,
            creatures = summary.creatures_ticked,
            "turn completed"
        );
        Ok(summary)
    }
}

impl Default for TurnScheduler {
    fn default() -> Self {
        Self::new(Config::new(0))
    }
}

/// Applies a system command. Rejections are logged by the world.
fn run_step(world: &mut World, command: Command, events: &mut Vec<Event>) -> bool {
    apply(world, command, events).is_ok()
}
