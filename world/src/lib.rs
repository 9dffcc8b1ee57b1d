#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for the OpenDungeons simulation.
//!
//! The world owns the tile grid, the seats, every creature and every
//! structure. It is mutated exclusively through [`apply`], which validates a
//! [`Command`] and reports the resulting [`Event`] values, and it is read
//! through the functions of the [`query`] module.

mod buildings;
mod conduct;
mod creatures;
mod grid;
mod navigation;
mod player;
pub mod query;
mod seats;
mod turn;
mod visibility;

use opendungeons_core::{
    Animation, BuildingId, BuildingKind, Command, CommandError, CreatureDefinition, CreatureId,
    CreatureSound, EntityRef, Event, Level, SeatId, SimulationConfig, TileCoord, TileKind,
};
use thiserror::Error;

use crate::{
    buildings::{BuildingRegistry, TileCoverage},
    creatures::{Creature, CreatureRegistry, CreatureSeed},
    grid::{Grid, Tile},
    seats::{Seat, SeatRegistry},
};

/// Reasons a level cannot be turned into a world.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum WorldError {
    /// The level has no tiles.
    #[error("level dimensions {width}x{height} contain no tiles")]
    EmptyGrid {
        /// Declared number of columns.
        width: u32,
        /// Declared number of rows.
        height: u32,
    },
    /// Two seats share an identifier.
    #[error("seat {0:?} is declared more than once")]
    DuplicateSeat(SeatId),
    /// An entry references a seat the level does not declare.
    #[error("seat {0:?} is referenced but not declared")]
    UnknownSeat(SeatId),
    /// An entry lies outside the grid.
    #[error("tile {0:?} lies outside the level")]
    OutOfBounds(TileCoord),
    /// A creature uses a class without definition.
    #[error("creature class '{0}' is not defined")]
    UnknownClass(String),
    /// A structure covers no tile.
    #[error("structure {0:?} covers no tile")]
    EmptyBuilding(BuildingKind),
    /// Two structures cover the same tile.
    #[error("tile {0:?} is covered by more than one structure")]
    OverlappingBuildings(TileCoord),
}

/// Creature queued for removal from the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PendingDeletion {
    creature: CreatureId,
    queued_turn: u64,
}

/// Represents the authoritative OpenDungeons world state.
#[derive(Clone, Debug)]
pub struct World {
    config: SimulationConfig,
    turn: u64,
    grid: Grid,
    seats: SeatRegistry,
    creatures: CreatureRegistry,
    buildings: BuildingRegistry,
    deletions: Vec<PendingDeletion>,
}

impl World {
    /// Builds a world from the semantic content of a level.
    pub fn from_level(level: &Level, config: SimulationConfig) -> Result<Self, WorldError> {
        if level.width == 0 || level.height == 0 {
            return Err(WorldError::EmptyGrid {
                width: level.width,
                height: level.height,
            });
        }

        let mut world = Self {
            grid: Grid::new(
                level.width,
                level.height,
                level.default_kind,
                level.default_fullness,
            ),
            config,
            turn: 0,
            seats: SeatRegistry::default(),
            creatures: CreatureRegistry::new(),
            buildings: BuildingRegistry::new(),
            deletions: Vec::new(),
        };

        for seat in &level.seats {
            if !world.seats.insert(Seat::from_level(seat)) {
                return Err(WorldError::DuplicateSeat(seat.id));
            }
        }

        for tile in &level.tiles {
            if !world.grid.contains(tile.coord) {
                return Err(WorldError::OutOfBounds(tile.coord));
            }
            if let Some(owner) = tile.owner {
                if !world.seats.contains(owner) {
                    return Err(WorldError::UnknownSeat(owner));
                }
            }
            world
                .grid
                .set_tile(tile.coord, tile.kind, tile.fullness, tile.owner);
        }

        for building in &level.buildings {
            world.load_building(building.kind, building.seat, &building.tiles)?;
        }

        for entry in &level.creatures {
            if !world.seats.contains(entry.seat) {
                return Err(WorldError::UnknownSeat(entry.seat));
            }
            if !world.grid.contains(entry.tile) {
                return Err(WorldError::OutOfBounds(entry.tile));
            }
            let definition = world
                .config
                .definition(&entry.class)
                .cloned()
                .ok_or_else(|| WorldError::UnknownClass(entry.class.clone()))?;
            let _ = world.insert_creature(
                definition,
                CreatureSeed {
                    name: entry.name.clone(),
                    seat: entry.seat,
                    tile: entry.tile,
                    level: entry.level,
                    hp: entry.hp,
                    weapon_left: entry.weapon_left.clone(),
                    weapon_right: entry.weapon_right.clone(),
                },
            );
        }

        world.grid.rebuild_regions();
        for id in world.buildings.ids() {
            world.refresh_active_spots(id);
        }
        world.stock_treasuries();
        world.count_claimed_tiles();

        tracing::debug!(
            width = level.width,
            height = level.height,
            seats = level.seats.len(),
            creatures = level.creatures.len(),
            "world loaded"
        );
        Ok(world)
    }

    fn load_building(
        &mut self,
        kind: BuildingKind,
        seat: SeatId,
        tiles: &[TileCoord],
    ) -> Result<(), WorldError> {
        if !self.seats.contains(seat) {
            return Err(WorldError::UnknownSeat(seat));
        }
        if tiles.is_empty() {
            return Err(WorldError::EmptyBuilding(kind));
        }

        let mut covered = tiles.to_vec();
        covered.sort_unstable();
        covered.dedup();
        for &coord in &covered {
            match self.grid.tile(coord) {
                None => return Err(WorldError::OutOfBounds(coord)),
                Some(tile) if tile.building.is_some() => {
                    return Err(WorldError::OverlappingBuildings(coord));
                }
                Some(_) => {}
            }
        }

        let id = self.buildings.insert(kind, seat, &covered, &self.config);
        self.cover_tiles(id, &covered);
        Ok(())
    }

    fn cover_tiles(&mut self, id: BuildingId, tiles: &[TileCoord]) {
        for &coord in tiles {
            if let Some(tile) = self.grid.tile_mut(coord) {
                tile.building = Some(id);
            }
        }
    }

    /// Moves the starting gold of every seat into its treasuries.
    fn stock_treasuries(&mut self) {
        let per_tile = self.config.economy.treasury_gold_per_tile;
        for seat in self.seats.iter() {
            let mut remaining = u32::try_from(seat.gold.max(0)).unwrap_or(u32::MAX);
            for building in self.buildings.iter_mut() {
                if building.seat == seat.id && remaining > 0 {
                    remaining -= building.deposit(remaining, per_tile);
                }
            }
        }
    }

    fn insert_creature(&mut self, definition: CreatureDefinition, seed: CreatureSeed) -> CreatureId {
        let id = self.creatures.allocate_id();
        let mut creature = Creature::new(id, definition, seed, &self.config.rules);
        if creature.name.is_empty() {
            creature.name = format!("{}{}", creature.definition.class_name, id.get());
        }
        if let Some(tile) = self.grid.tile_mut(creature.tile) {
            tile.occupants.push(id);
        }
        self.creatures.push(creature);
        id
    }

    fn refresh_active_spots(&mut self, id: BuildingId) {
        let grid = &self.grid;
        if let Some(building) = self.buildings.get_mut(id) {
            building.refresh_active_spots(|coord| grid.tile(coord).map_or(false, |tile| !tile.is_ground()));
        }
    }

    /// Counts every claimed tile per owner. Claimed walls count alongside
    /// claimed floor.
    fn count_claimed_tiles(&mut self) {
        for seat in self.seats.iter_mut() {
            seat.claimed_tiles = 0;
        }
        for tile in self.grid.tiles() {
            if tile.kind != TileKind::Claimed {
                continue;
            }
            if let Some(seat) = tile.owner.and_then(|owner| self.seats.get_mut(owner)) {
                seat.claimed_tiles += 1;
            }
        }
    }

    fn allied(&self, first: SeatId, second: SeatId) -> bool {
        self.seats.allied(first, second)
    }

    /// Walls the seat may dig: dirt and gold, plus claimed walls of hostile seats.
    fn is_diggable_for(&self, tile: &Tile, seat: SeatId) -> bool {
        if !tile.is_diggable_wall() {
            return false;
        }
        match (tile.kind, tile.owner) {
            (TileKind::Claimed, Some(owner)) => !self.allied(owner, seat),
            _ => true,
        }
    }

    /// Takes gold from the seat and from its treasuries.
    fn spend_gold(&mut self, seat: SeatId, amount: i64) {
        if let Some(entry) = self.seats.get_mut(seat) {
            entry.gold -= amount;
        }
        let mut remaining = u32::try_from(amount.max(0)).unwrap_or(u32::MAX);
        for building in self.buildings.iter_mut() {
            if building.seat == seat && remaining > 0 {
                remaining -= building.withdraw(remaining);
            }
        }
    }

    fn set_animation(
        &mut self,
        id: CreatureId,
        animation: Animation,
        looped: bool,
        out_events: &mut Vec<Event>,
    ) {
        if let Some(creature) = self.creatures.get_mut(id) {
            if creature.animation != animation {
                creature.animation = animation;
                out_events.push(Event::ObjectAnimationState {
                    entity: EntityRef::Creature(id),
                    animation,
                    looped,
                });
            }
        }
    }

    /// Unregisters the creature from its job and eat rooms.
    fn leave_rooms(&mut self, id: CreatureId) {
        let Some(creature) = self.creatures.get_mut(id) else {
            return;
        };
        let rooms = [creature.job_room.take(), creature.eat_room.take()];
        for room in rooms.into_iter().flatten() {
            if let Some(building) = self.buildings.get_mut(room) {
                let _ = building.remove_user(id);
            }
        }
    }

    fn release_home(&mut self, id: CreatureId) {
        let Some(home) = self.creatures.get_mut(id).and_then(|creature| creature.home.take()) else {
            return;
        };
        if let Some(building) = self.buildings.get_mut(home.building) {
            let _ = building.release_bed(id);
        }
    }

    /// Marks the creature dead and frees everything it held on to.
    fn kill(&mut self, id: CreatureId, out_events: &mut Vec<Event>) {
        let delay = self.config.rules.death_delay_turns;
        let Some(creature) = self.creatures.get_mut(id) else {
            return;
        };
        if !creature.is_alive() {
            return;
        }
        creature.death_counter = Some(delay);
        creature.actions.clear();
        creature.destinations.clear();
        creature.gold = 0;
        let snapshot = creature.snapshot();

        self.leave_rooms(id);
        self.release_home(id);
        tracing::debug!(creature = id.get(), "creature died");

        self.set_animation(id, Animation::Die, false, out_events);
        out_events.push(Event::CreatureSound {
            creature: id,
            sound: CreatureSound::Die,
        });
        out_events.push(Event::CreatureRefreshed { creature: snapshot });
    }

    fn building_covers(&self, id: BuildingId, coord: TileCoord) -> bool {
        self.buildings
            .get(id)
            .map_or(false, |building| building.covers(coord))
    }
}

/// Returns whether a creature of the provided class may stand on the tile.
fn admits(definition: &CreatureDefinition, tile: &Tile) -> bool {
    tile.is_ground() && tile.kind != TileKind::Empty && definition.speed_on(tile.kind) > 0.0
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Rejected commands leave the world untouched and report why through the
/// returned [`CommandError`].
pub fn apply(
    world: &mut World,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<(), CommandError> {
    let result = match command {
        Command::MarkTilesForDigging {
            tiles,
            marked,
            seat,
        } => world.mark_tiles_for_digging(&tiles, marked, seat),
        Command::BuildRoom { tiles, kind, seat } => world.build_room(&tiles, kind, seat, out_events),
        Command::BuildTrap { tiles, kind, seat } => world.build_trap(&tiles, kind, seat, out_events),
        Command::DropCreature {
            creature,
            tile,
            seat,
        } => world.drop_creature(creature, tile, seat, out_events),
        Command::PickUpCreature { creature, seat } => {
            world.pick_up_creature(creature, seat, out_events)
        }
        Command::BeginTurn => {
            world.begin_turn(out_events);
            Ok(())
        }
        Command::Upkeep => {
            world.upkeep(out_events);
            Ok(())
        }
        Command::SpawnCreature { building, class } => {
            world.spawn_creature(building, &class, out_events)
        }
        Command::CreatureUpkeep { creature } => world.creature_upkeep(creature),
        Command::DecayCorpse { creature } => world.decay_corpse(creature),
        Command::PushAction { creature, action } => world.push_action(creature, action),
        Command::PopAction { creature } => world.pop_action(creature),
        Command::Interrupt { creature, action } => world.interrupt(creature, action, out_events),
        Command::SetDestinations { creature, path } => world.set_destinations(creature, path),
        Command::StepCreature { creature } => world.step_creature(creature, out_events),
        Command::DigTile { creature, tile } => world.dig_tile(creature, tile, out_events),
        Command::ClaimTile { creature, tile } => world.claim_tile(creature, tile, out_events),
        Command::DepositGold { creature, building } => {
            world.deposit_gold(creature, building, out_events)
        }
        Command::ClaimBed { creature, building } => world.claim_bed(creature, building),
        Command::Rest { creature } => world.rest(creature, out_events),
        Command::JoinRoom { creature, building } => world.join_room(creature, building),
        Command::LeaveRoom { creature, building } => world.leave_room(creature, building),
        Command::Work { creature } => world.work(creature, out_events),
        Command::Eat { creature } => world.eat(creature, out_events),
        Command::Attack {
            attacker,
            target,
            roll,
        } => world.attack(attacker, target, roll, out_events),
    };

    if let Err(error) = &result {
        tracing::debug!(%error, "command rejected");
    }
    result
}
