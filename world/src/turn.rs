//! Turn bookkeeping: deferred deletions, upkeep, spawning and corpse decay.

use std::collections::{BTreeMap, BTreeSet};

use opendungeons_core::{
    Animation, BuildingId, BuildingKind, CommandError, CreatureId, CreatureSound, EntityRef,
    Event, GoalKind, GoalStatus, RoomKind, SeatId, TileCoord,
};

use crate::{
    admits,
    buildings::{Damageable, TileCoverage, Upkeepable},
    creatures::CreatureSeed,
    visibility, PendingDeletion, World,
};

impl World {
    /// Advances the turn counter and reaps creatures queued in earlier turns.
    pub(crate) fn begin_turn(&mut self, out_events: &mut Vec<Event>) {
        self.turn = self.turn.saturating_add(1);
        out_events.push(Event::TurnStarted { turn: self.turn });

        let turn = self.turn;
        let (due, pending): (Vec<PendingDeletion>, Vec<PendingDeletion>) = self
            .deletions
            .drain(..)
            .partition(|deletion| deletion.queued_turn < turn);
        self.deletions = pending;

        for deletion in due {
            let Some(creature) = self.creatures.remove(deletion.creature) else {
                continue;
            };
            debug_assert!(!creature.is_alive(), "only corpses are queued for deletion");
            if let Some(tile) = self.grid.tile_mut(creature.tile) {
                tile.occupants.retain(|occupant| *occupant != creature.id);
            }
            out_events.push(Event::CreatureRemoved {
                creature: creature.id,
            });
        }
    }

    /// Runs building, trap and seat upkeep for the current turn.
    pub(crate) fn upkeep(&mut self, out_events: &mut Vec<Event>) {
        for id in self.buildings.ids() {
            self.upkeep_building(id, out_events);
        }

        self.count_claimed_tiles();
        let income = self.config.economy.mana_per_claimed_tile;
        let max_mana = self.config.economy.max_mana;
        for seat in self.seats.iter_mut() {
            seat.accrue_mana(f64::from(seat.claimed_tiles) * income, max_mana);
            seat.settle_gold();
        }

        self.evaluate_goals(out_events);
    }

    fn upkeep_building(&mut self, id: BuildingId, out_events: &mut Vec<Event>) {
        let Some(building) = self.buildings.get_mut(id) else {
            return;
        };
        let report = building.upkeep(&self.config);
        let seat = building.seat;
        let destroyed = building.is_empty();

        if !report.removed_tiles.is_empty() {
            for &coord in &report.removed_tiles {
                if let Some(tile) = self.grid.tile_mut(coord) {
                    tile.building = None;
                }
            }
            if let Some(entry) = self.seats.get_mut(seat) {
                entry.gold -= i64::from(report.lost_gold);
            }
            for creature in &report.evicted {
                if let Some(creature) = self.creatures.get_mut(*creature) {
                    creature.home = None;
                }
            }

            if destroyed {
                self.demolish(id);
            } else {
                self.refresh_active_spots(id);
            }
            tracing::debug!(building = id.get(), destroyed, "building lost tiles");
            out_events.push(Event::BuildingTilesRemoved {
                building: id,
                tiles: report.removed_tiles,
                destroyed,
            });
        }

        if report.loaded && !destroyed {
            self.fire_cannon(id, out_events);
        }
    }

    /// Removes an empty building and every reference creatures hold to it.
    fn demolish(&mut self, id: BuildingId) {
        let Some(building) = self.buildings.remove(id) else {
            return;
        };
        for user in building.users {
            if let Some(creature) = self.creatures.get_mut(user) {
                if creature.job_room == Some(id) {
                    creature.job_room = None;
                }
                if creature.eat_room == Some(id) {
                    creature.eat_room = None;
                }
            }
        }
        for creature in self.creature_ids_with_home(id) {
            if let Some(creature) = self.creatures.get_mut(creature) {
                creature.home = None;
            }
        }
    }

    fn creature_ids_with_home(&self, id: BuildingId) -> Vec<CreatureId> {
        self.creatures
            .iter()
            .filter(|creature| creature.home.map(|home| home.building) == Some(id))
            .map(|creature| creature.id)
            .collect()
    }

    /// Shoots the first hostile creature visible from any tile of the trap.
    fn fire_cannon(&mut self, id: BuildingId, out_events: &mut Vec<Event>) {
        let Some(trap) = self.buildings.get(id) else {
            return;
        };
        let seat = trap.seat;
        let range = self.config.traps.cannon_range;
        let visible: BTreeSet<TileCoord> = trap
            .covered_tiles()
            .into_iter()
            .flat_map(|tile| visibility::visible_tiles(&self.grid, tile, range))
            .collect();

        let target = self.creatures.iter().find(|creature| {
            creature.is_alive()
                && !creature.held
                && !self.allied(creature.seat, seat)
                && visible.contains(&creature.tile)
        });
        let Some(target) = target.map(|creature| creature.id) else {
            return;
        };

        let damage = self.config.traps.cannon_damage;
        let reload = self.config.traps.cannon_reload;
        if let Some(trap) = self.buildings.get_mut(id) {
            trap.reload(reload);
        }
        out_events.push(Event::ObjectAnimationState {
            entity: EntityRef::Trap(id),
            animation: Animation::Attack,
            looped: false,
        });

        let Some(creature) = self.creatures.get_mut(target) else {
            return;
        };
        let at = creature.tile;
        let _ = creature.take_damage(damage, at);
        let dead = creature.hp <= 0.0;
        let snapshot = creature.snapshot();
        out_events.push(Event::CreatureRefreshed { creature: snapshot });
        if dead {
            self.kill(target, out_events);
        }
    }

    fn evaluate_goals(&mut self, out_events: &mut Vec<Event>) {
        let mut temples: BTreeMap<SeatId, usize> = BTreeMap::new();
        for building in self.buildings.iter() {
            if building.is_room(RoomKind::DungeonTemple) {
                *temples.entry(building.seat).or_default() += 1;
            }
        }

        let mut changes = Vec::new();
        for seat in self.seats.iter() {
            let hostiles_alive = self
                .creatures
                .iter()
                .any(|creature| creature.is_alive() && !self.allied(creature.seat, seat.id));
            for (index, (goal, status)) in seat.goals.iter().enumerate() {
                if *status != GoalStatus::Active {
                    continue;
                }
                let next = match goal {
                    GoalKind::ClaimTiles(count) if seat.claimed_tiles >= *count => {
                        GoalStatus::Completed
                    }
                    GoalKind::MineGold(amount) if seat.gold >= *amount => GoalStatus::Completed,
                    GoalKind::ProtectDungeonTemple if !temples.contains_key(&seat.id) => {
                        GoalStatus::Failed
                    }
                    GoalKind::KillAllEnemies if !hostiles_alive => GoalStatus::Completed,
                    _ => GoalStatus::Active,
                };
                if next != GoalStatus::Active {
                    changes.push((seat.id, index, *goal, next));
                }
            }
        }

        for (seat, index, goal, status) in changes {
            if let Some(entry) = self.seats.get_mut(seat) {
                if let Some(slot) = entry.goals.get_mut(index) {
                    slot.1 = status;
                }
            }
            tracing::info!(seat = seat.get(), ?goal, ?status, "goal status changed");
            out_events.push(Event::GoalStatusChanged { seat, goal, status });
        }
    }

    /// Creates a creature of the provided class on a temple or portal.
    pub(crate) fn spawn_creature(
        &mut self,
        id: BuildingId,
        class: &str,
        out_events: &mut Vec<Event>,
    ) -> Result<(), CommandError> {
        let building = self
            .buildings
            .get(id)
            .ok_or(CommandError::UnknownBuilding(id))?;
        let tiles = building.covered_tiles();
        let anchor = tiles.first().copied().unwrap_or(TileCoord::new(0, 0));
        if !matches!(
            building.kind,
            BuildingKind::Room(RoomKind::DungeonTemple | RoomKind::Portal)
        ) {
            return Err(CommandError::InvalidTarget(anchor));
        }
        let seat = building.seat;
        let definition = self
            .config
            .definition(class)
            .cloned()
            .ok_or_else(|| CommandError::UnknownClass(class.to_owned()))?;
        let tile = tiles
            .iter()
            .copied()
            .find(|coord| {
                self.grid
                    .tile(*coord)
                    .map_or(false, |tile| admits(&definition, tile))
            })
            .ok_or(CommandError::InvalidTarget(anchor))?;

        let creature = self.insert_creature(
            definition,
            CreatureSeed {
                name: String::new(),
                seat,
                tile,
                level: 1,
                hp: None,
                weapon_left: None,
                weapon_right: None,
            },
        );
        if let Some(building) = self.buildings.get_mut(id) {
            building.consume_spawn();
        }

        let Some(snapshot) = self.creatures.get(creature).map(|entry| entry.snapshot()) else {
            return Ok(());
        };
        tracing::debug!(creature = creature.get(), class, seat = seat.get(), "creature spawned");
        out_events.push(Event::CreatureAdded { creature: snapshot });
        out_events.push(Event::CreatureSound {
            creature,
            sound: CreatureSound::Spawn,
        });
        Ok(())
    }

    pub(crate) fn creature_upkeep(&mut self, id: CreatureId) -> Result<(), CommandError> {
        let creature = self
            .creatures
            .get_mut(id)
            .ok_or(CommandError::UnknownCreature(id))?;
        if !creature.is_alive() {
            return Err(CommandError::Dead(id));
        }
        creature.upkeep(&self.config);
        Ok(())
    }

    /// Counts down a corpse and queues it for deletion once the delay elapsed.
    pub(crate) fn decay_corpse(&mut self, id: CreatureId) -> Result<(), CommandError> {
        let creature = self
            .creatures
            .get_mut(id)
            .ok_or(CommandError::UnknownCreature(id))?;
        let Some(counter) = creature.death_counter.as_mut() else {
            return Ok(());
        };
        *counter = counter.saturating_sub(1);
        if *counter > 0 || self.deletions.iter().any(|entry| entry.creature == id) {
            return Ok(());
        }

        self.deletions.push(PendingDeletion {
            creature: id,
            queued_turn: self.turn,
        });
        Ok(())
    }
}
