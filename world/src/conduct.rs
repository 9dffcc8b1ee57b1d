//! Commands issued on behalf of creatures by their agents.

use opendungeons_core::{
    Animation, AttackRoll, BuildingId, CommandError, CreatureAction, CreatureId, CreatureSound,
    EntityRef, Event, RoomKind, SeatId, TileCoord, TileKind,
};

use crate::{
    admits,
    buildings::{Damageable, TileCoverage},
    creatures::{Creature, Home},
    World,
};

impl World {
    /// Resolves a creature that is alive and standing in the dungeon.
    fn active(&self, id: CreatureId) -> Result<&Creature, CommandError> {
        let creature = self
            .creatures
            .get(id)
            .ok_or(CommandError::UnknownCreature(id))?;
        if !creature.is_alive() {
            return Err(CommandError::Dead(id));
        }
        if creature.held {
            return Err(CommandError::Held(id));
        }
        Ok(creature)
    }

    fn active_mut(&mut self, id: CreatureId) -> Result<&mut Creature, CommandError> {
        let _ = self.active(id)?;
        self.creatures
            .get_mut(id)
            .ok_or(CommandError::UnknownCreature(id))
    }

    pub(crate) fn push_action(
        &mut self,
        id: CreatureId,
        action: CreatureAction,
    ) -> Result<(), CommandError> {
        self.active_mut(id)?.actions.push(action);
        Ok(())
    }

    pub(crate) fn pop_action(&mut self, id: CreatureId) -> Result<(), CommandError> {
        if self.active_mut(id)?.actions.pop().is_none() {
            tracing::warn!(creature = id.get(), "refused to pop the idle bottom of the action stack");
        }
        Ok(())
    }

    /// Drops everything in progress in favour of a priority action.
    pub(crate) fn interrupt(
        &mut self,
        id: CreatureId,
        action: CreatureAction,
        out_events: &mut Vec<Event>,
    ) -> Result<(), CommandError> {
        let creature = self.active_mut(id)?;
        creature.actions.clear();
        creature.destinations.clear();
        creature.actions.push(action);
        self.leave_rooms(id);

        if action == CreatureAction::Flee {
            self.set_animation(id, Animation::Flee, true, out_events);
        }
        Ok(())
    }

    pub(crate) fn set_destinations(
        &mut self,
        id: CreatureId,
        path: Vec<TileCoord>,
    ) -> Result<(), CommandError> {
        if let Some(outside) = path.iter().find(|coord| !self.grid.contains(**coord)) {
            return Err(CommandError::OutOfBounds(*outside));
        }
        let creature = self.active_mut(id)?;
        creature.destinations = path.into();
        Ok(())
    }

    /// Moves the creature onto the next waypoint.
    ///
    /// A blocked waypoint clears the whole queue so the agent plans again.
    pub(crate) fn step_creature(
        &mut self,
        id: CreatureId,
        out_events: &mut Vec<Event>,
    ) -> Result<(), CommandError> {
        let creature = self.active(id)?;
        let Some(&next) = creature.destinations.front() else {
            return Ok(());
        };
        let from = creature.tile;
        let enterable = self
            .grid
            .tile(next)
            .map_or(false, |tile| admits(&creature.definition, tile));
        if !from.is_adjacent(next) || !enterable {
            if let Some(creature) = self.creatures.get_mut(id) {
                creature.destinations.clear();
            }
            return Err(CommandError::InvalidTarget(next));
        }

        let snapshot = {
            let creature = self.active_mut(id)?;
            let _ = creature.destinations.pop_front();
            creature.tile = next;
            creature.snapshot()
        };
        if let Some(tile) = self.grid.tile_mut(from) {
            tile.occupants.retain(|occupant| *occupant != id);
        }
        if let Some(tile) = self.grid.tile_mut(next) {
            tile.occupants.push(id);
        }

        self.set_animation(id, Animation::Walk, true, out_events);
        out_events.push(Event::CreatureRefreshed { creature: snapshot });
        Ok(())
    }

    /// Digs an adjacent wall marked by the creature's seat.
    pub(crate) fn dig_tile(
        &mut self,
        id: CreatureId,
        coord: TileCoord,
        out_events: &mut Vec<Event>,
    ) -> Result<(), CommandError> {
        let creature = self.active(id)?;
        let tile = self
            .grid
            .tile(coord)
            .ok_or(CommandError::OutOfBounds(coord))?;
        if creature.dig_rate <= 0.0
            || !creature.tile.is_adjacent(coord)
            || !tile.dig_marks.contains(&creature.seat)
            || !self.is_diggable_for(tile, creature.seat)
        {
            return Err(CommandError::InvalidTarget(coord));
        }

        let kind = tile.kind;
        let rate = if kind == TileKind::Claimed {
            creature.dig_rate * self.config.rules.claimed_wall_dig_factor
        } else {
            creature.dig_rate
        };

        let removed = self.grid.dig_out(coord, rate);
        let fullness = self.grid.tile(coord).map_or(0.0, |tile| tile.fullness);
        let gold_per_fullness = self.config.economy.gold_per_fullness;
        let experience = removed * self.config.rules.dig_experience;
        let rules = self.config.rules.clone();

        let creature = self.active_mut(id)?;
        if kind == TileKind::Gold {
            let mined = (removed * gold_per_fullness).round() as u32;
            let capacity = creature.definition.max_gold_carried;
            creature.gold = creature.gold.saturating_add(mined).min(capacity);
        }
        let _ = creature.award_experience(experience, &rules);

        out_events.push(Event::TileFullnessChanged {
            tile: coord,
            fullness,
        });
        self.set_animation(id, Animation::Dig, true, out_events);
        out_events.push(Event::CreatureSound {
            creature: id,
            sound: CreatureSound::Dig,
        });
        Ok(())
    }

    /// Applies the creature's claim rate to its own tile or an adjacent wall.
    pub(crate) fn claim_tile(
        &mut self,
        id: CreatureId,
        coord: TileCoord,
        out_events: &mut Vec<Event>,
    ) -> Result<(), CommandError> {
        let creature = self.active(id)?;
        let tile = self
            .grid
            .tile(coord)
            .ok_or(CommandError::OutOfBounds(coord))?;
        let seat = creature.seat;
        let claimable_kind = matches!(tile.kind, TileKind::Dirt | TileKind::Claimed);
        let settled = tile.claimed >= 1.0 && tile.owner.map_or(false, |owner| self.allied(owner, seat));
        let floor = tile.coord == creature.tile && tile.is_walkable();
        let wall = creature.tile.is_adjacent(coord) && tile.is_diggable_wall();
        if creature.claim_rate <= 0.0 || !claimable_kind || settled || !(floor || wall) {
            return Err(CommandError::InvalidTarget(coord));
        }

        let rate = creature.claim_rate;
        let seats = &self.seats;
        let outcome = self
            .grid
            .claim(coord, seat, rate, |first, second| seats.allied(first, second));
        let experience = rate * self.config.rules.claim_experience;
        let rules = self.config.rules.clone();
        let _ = self.active_mut(id)?.award_experience(experience, &rules);

        self.set_animation(id, Animation::Claim, true, out_events);
        if outcome.changed() {
            if let Some(tile) = self.grid.tile(coord) {
                out_events.push(Event::TileClaimed {
                    tile: coord,
                    seat: tile.owner.unwrap_or(seat),
                    kind: tile.kind,
                });
            }
        }
        Ok(())
    }

    /// Moves carried gold into the treasury the creature stands on.
    pub(crate) fn deposit_gold(
        &mut self,
        id: CreatureId,
        building: BuildingId,
        out_events: &mut Vec<Event>,
    ) -> Result<(), CommandError> {
        let creature = self.active(id)?;
        let (seat, tile, carried) = (creature.seat, creature.tile, creature.gold);
        self.own_room(building, seat, tile, RoomKind::Treasury)?;
        if carried == 0 {
            return Ok(());
        }

        let per_tile = self.config.economy.treasury_gold_per_tile;
        let deposited = match self.buildings.get_mut(building) {
            Some(treasury) if treasury.treasury_space(per_tile) > 0 => {
                treasury.deposit(carried, per_tile)
            }
            _ => return Err(CommandError::RoomFull(building)),
        };
        if let Some(creature) = self.creatures.get_mut(id) {
            creature.gold -= deposited;
        }
        if let Some(entry) = self.seats.get_mut(seat) {
            entry.gold += i64::from(deposited);
        }

        out_events.push(Event::GoldDeposited {
            seat,
            tile,
            amount: deposited,
        });
        Ok(())
    }

    /// Checks that the building is a room of the given kind owned by the seat
    /// and covering `tile`.
    fn own_room(
        &self,
        id: BuildingId,
        seat: SeatId,
        tile: TileCoord,
        kind: RoomKind,
    ) -> Result<(), CommandError> {
        let building = self
            .buildings
            .get(id)
            .ok_or(CommandError::UnknownBuilding(id))?;
        if building.seat != seat {
            return Err(CommandError::NotOwner { seat });
        }
        if !building.is_room(kind) || !building.covers(tile) {
            return Err(CommandError::InvalidTarget(tile));
        }
        Ok(())
    }

    /// Assigns a bed of the creature's footprint in an owned dormitory.
    pub(crate) fn claim_bed(&mut self, id: CreatureId, building: BuildingId) -> Result<(), CommandError> {
        let creature = self.active(id)?;
        let (seat, width, height) = (
            creature.seat,
            creature.definition.bed_width,
            creature.definition.bed_height,
        );
        if creature.home.map(|home| home.building) == Some(building) {
            return Ok(());
        }
        let dormitory = self
            .buildings
            .get(building)
            .ok_or(CommandError::UnknownBuilding(building))?;
        if dormitory.seat != seat {
            return Err(CommandError::NotOwner { seat });
        }
        if !dormitory.is_room(RoomKind::Dormitory) {
            return Err(CommandError::InvalidTarget(creature.tile));
        }

        self.release_home(id);
        let anchor = self
            .buildings
            .get_mut(building)
            .and_then(|dormitory| dormitory.assign_bed(id, width, height))
            .ok_or(CommandError::RoomFull(building))?;
        if let Some(creature) = self.creatures.get_mut(id) {
            creature.home = Some(Home { building, anchor });
        }
        Ok(())
    }

    /// Regenerates the creature while it lies on its bed.
    pub(crate) fn rest(&mut self, id: CreatureId, out_events: &mut Vec<Event>) -> Result<(), CommandError> {
        let creature = self.active(id)?;
        let tile = creature.tile;
        let in_bed = creature.home.map_or(false, |home| {
            self.buildings
                .get(home.building)
                .and_then(|dormitory| dormitory.bed_of(id))
                .map_or(false, |bed| bed.tiles.contains(&tile))
        });
        if !in_bed {
            return Err(CommandError::InvalidTarget(tile));
        }

        self.active_mut(id)?.rest();
        self.set_animation(id, Animation::Sleep, true, out_events);
        Ok(())
    }

    /// Registers the creature as a user of a training hall or hatchery.
    pub(crate) fn join_room(&mut self, id: CreatureId, building: BuildingId) -> Result<(), CommandError> {
        let creature = self.active(id)?;
        let (seat, tile) = (creature.seat, creature.tile);
        let room = self
            .buildings
            .get(building)
            .ok_or(CommandError::UnknownBuilding(building))?;
        if room.seat != seat {
            return Err(CommandError::NotOwner { seat });
        }
        let kind = room.room_kind();
        if !matches!(kind, Some(RoomKind::TrainingHall | RoomKind::Hatchery)) {
            return Err(CommandError::InvalidTarget(tile));
        }

        let joined = self
            .buildings
            .get_mut(building)
            .map_or(false, |room| room.add_user(id));
        if !joined {
            return Err(CommandError::RoomFull(building));
        }

        let previous = {
            let creature = self.active_mut(id)?;
            let slot = if kind == Some(RoomKind::TrainingHall) {
                &mut creature.job_room
            } else {
                &mut creature.eat_room
            };
            slot.replace(building)
        };
        if let Some(previous) = previous.filter(|previous| *previous != building) {
            if let Some(room) = self.buildings.get_mut(previous) {
                let _ = room.remove_user(id);
            }
        }
        Ok(())
    }

    pub(crate) fn leave_room(&mut self, id: CreatureId, building: BuildingId) -> Result<(), CommandError> {
        let creature = self
            .creatures
            .get_mut(id)
            .ok_or(CommandError::UnknownCreature(id))?;
        if creature.job_room == Some(building) {
            creature.job_room = None;
        }
        if creature.eat_room == Some(building) {
            creature.eat_room = None;
        }
        let room = self
            .buildings
            .get_mut(building)
            .ok_or(CommandError::UnknownBuilding(building))?;
        let _ = room.remove_user(id);
        Ok(())
    }

    /// Trains inside the creature's job room.
    pub(crate) fn work(&mut self, id: CreatureId, out_events: &mut Vec<Event>) -> Result<(), CommandError> {
        let creature = self.active(id)?;
        let tile = creature.tile;
        let inside = creature
            .job_room
            .map_or(false, |room| self.building_covers(room, tile));
        if !inside {
            return Err(CommandError::InvalidTarget(tile));
        }

        let rules = self.config.rules.clone();
        let creature = self.active_mut(id)?;
        creature.awakeness = (creature.awakeness - rules.train_awakeness_cost).max(0.0);
        let _ = creature.award_experience(rules.train_experience, &rules);
        self.set_animation(id, Animation::Train, true, out_events);
        Ok(())
    }

    /// Eats inside the creature's hatchery.
    pub(crate) fn eat(&mut self, id: CreatureId, out_events: &mut Vec<Event>) -> Result<(), CommandError> {
        let creature = self.active(id)?;
        let tile = creature.tile;
        let inside = creature
            .eat_room
            .map_or(false, |room| self.building_covers(room, tile));
        if !inside {
            return Err(CommandError::InvalidTarget(tile));
        }

        let portion = self.config.rules.eat_per_turn;
        let creature = self.active_mut(id)?;
        creature.hunger = (creature.hunger - portion).max(0.0);
        self.set_animation(id, Animation::Eat, true, out_events);
        Ok(())
    }

    /// Strikes a hostile creature or structure within weapon range.
    ///
    /// Damage is `weapon * ln(ln(level + 1) + 1) * hit - defense_roll² * defense`,
    /// never negative.
    pub(crate) fn attack(
        &mut self,
        attacker: CreatureId,
        target: EntityRef,
        roll: AttackRoll,
        out_events: &mut Vec<Event>,
    ) -> Result<(), CommandError> {
        let creature = self.active(attacker)?;
        let (seat, origin, level) = (creature.seat, creature.tile, creature.level);
        let range = creature.weapon_range();
        let strength = creature.weapon_damage() * (f64::from(level) + 1.0).ln().ln_1p();
        let hit = roll.hit.clamp(0.0, 1.0);
        let defense_roll = roll.defense.clamp(0.0, 0.4);
        let rules = self.config.rules.clone();

        match target {
            EntityRef::Creature(victim) => {
                let defender = self
                    .creatures
                    .get(victim)
                    .ok_or(CommandError::UnknownCreature(victim))?;
                if !defender.is_alive() {
                    return Err(CommandError::Dead(victim));
                }
                let at = defender.tile;
                if defender.held
                    || victim == attacker
                    || self.allied(defender.seat, seat)
                    || origin.manhattan_distance(at) > range
                {
                    return Err(CommandError::InvalidTarget(at));
                }

                let damage = (strength * hit - defense_roll * defense_roll * defender.defense()).max(0.0);
                let victim_level = f64::from(defender.level);
                let attacker_level = f64::from(level);

                let (dead, snapshot) = {
                    let Some(defender) = self.creatures.get_mut(victim) else {
                        return Err(CommandError::UnknownCreature(victim));
                    };
                    let _ = defender.take_damage(damage, at);
                    let _ = defender.award_experience(
                        damage * rules.defend_experience * attacker_level / victim_level.max(1.0),
                        &rules,
                    );
                    (defender.hp <= 0.0, defender.snapshot())
                };
                let _ = self.active_mut(attacker)?.award_experience(
                    damage * rules.attack_experience * victim_level / attacker_level.max(1.0),
                    &rules,
                );

                self.announce_strike(attacker, out_events);
                out_events.push(Event::CreatureRefreshed { creature: snapshot });
                if dead {
                    self.kill(victim, out_events);
                }
            }
            EntityRef::Room(building) | EntityRef::Trap(building) => {
                let structure = self
                    .buildings
                    .get(building)
                    .ok_or(CommandError::UnknownBuilding(building))?;
                if self.allied(structure.seat, seat) {
                    return Err(CommandError::InvalidTarget(origin));
                }
                let at = structure
                    .covered_tiles()
                    .into_iter()
                    .filter(|tile| origin.manhattan_distance(*tile) <= range)
                    .min_by_key(|tile| origin.manhattan_distance(*tile))
                    .ok_or(CommandError::InvalidTarget(origin))?;

                let damage = (strength * hit - defense_roll * defense_roll * structure.defense()).max(0.0);
                if let Some(structure) = self.buildings.get_mut(building) {
                    let _ = structure.take_damage(damage, at);
                }
                let _ = self
                    .active_mut(attacker)?
                    .award_experience(damage * rules.attack_experience, &rules);
                self.announce_strike(attacker, out_events);
            }
            EntityRef::Tile(tile) => return Err(CommandError::InvalidTarget(tile)),
        }
        Ok(())
    }

    fn announce_strike(&mut self, attacker: CreatureId, out_events: &mut Vec<Event>) {
        if let Some(creature) = self.creatures.get_mut(attacker) {
            creature.animation = Animation::Idle;
        }
        self.set_animation(attacker, Animation::Attack, false, out_events);
        out_events.push(Event::CreatureSound {
            creature: attacker,
            sound: CreatureSound::Attack,
        });
    }
}
