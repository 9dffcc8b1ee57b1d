#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system rolling dungeon temple and portal spawns.

use std::collections::BTreeMap;

use opendungeons_core::{Command, RoomKind, SeatId};
use opendungeons_world::{
    query::{self, Population},
    World,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Exponent of the portal attraction curve.
const PORTAL_CURVE: f64 = 1.5;

/// Configuration parameters required to construct the spawning system.
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

/// System that turns open spawn windows into spawn commands.
#[derive(Debug)]
pub struct Spawning {
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Rolls every spawn window opened by this turn's upkeep.
    ///
    /// Temples produce a worker while the seat stays under the worker cap.
    /// Portals attract a random fighter with a probability that falls as the
    /// seat's population approaches the maximum.
    pub fn handle(&mut self, world: &World, out: &mut Vec<Command>) {
        let config = query::config(world);
        let tuning = &config.spawning;
        let fighters: Vec<&str> = config
            .creatures
            .iter()
            .filter(|definition| !definition.is_worker)
            .map(|definition| definition.class_name.as_str())
            .collect();

        let mut populations: BTreeMap<SeatId, Population> = BTreeMap::new();
        for opportunity in query::spawn_opportunities(world) {
            let population = populations
                .entry(opportunity.seat)
                .or_insert_with(|| query::population(world, opportunity.seat));

            match opportunity.kind {
                RoomKind::DungeonTemple => {
                    if population.workers >= tuning.temple_worker_cap {
                        continue;
                    }
                    population.workers += 1;
                    population.total += 1;
                    out.push(Command::SpawnCreature {
                        building: opportunity.building,
                        class: tuning.worker_class.clone(),
                    });
                }
                RoomKind::Portal => {
                    let chance = portal_probability(population.total, tuning.max_population);
                    if !self.rng.gen_bool(chance) || fighters.is_empty() {
                        continue;
                    }
                    let class = fighters[self.rng.gen_range(0..fighters.len())];
                    tracing::debug!(
                        seat = opportunity.seat.get(),
                        class,
                        chance,
                        "portal attracted a creature"
                    );
                    population.total += 1;
                    out.push(Command::SpawnCreature {
                        building: opportunity.building,
                        class: class.to_owned(),
                    });
                }
                _ => {}
            }
        }
    }
}

/// Probability that a portal attracts a creature: `((max - pop) / max)^1.5`.
///
/// The result is zero once the population reaches the maximum.
#[must_use]
pub fn portal_probability(population: u32, max_population: u32) -> f64 {
    if max_population == 0 {
        return 0.0;
    }
    let room = f64::from(max_population.saturating_sub(population));
    (room / f64::from(max_population)).powf(PORTAL_CURVE)
}

#[cfg(test)]
mod tests {
    use super::portal_probability;

    #[test]
    fn probability_vanishes_at_full_population() {
        assert_eq!(portal_probability(15, 15), 0.0);
        assert_eq!(portal_probability(40, 15), 0.0);
        assert_eq!(portal_probability(0, 0), 0.0);
    }

    #[test]
    fn probability_falls_as_population_grows() {
        assert_eq!(portal_probability(0, 15), 1.0);
        let quarter = portal_probability(3, 4);
        assert!((quarter - 0.125).abs() < 1e-12);
        let mut previous = 1.0;
        for population in 1..=15 {
            let chance = portal_probability(population, 15);
            assert!(chance < previous);
            previous = chance;
        }
    }
}
