//! Query functions that provide read-only access to the world state.

use std::collections::BTreeSet;

use opendungeons_core::{
    BuildingId, BuildingKind, CreatureAction, CreatureDefinition, CreatureId, GoalKind,
    GoalStatus, Level, LevelBuilding, LevelCreature, LevelSeat, LevelTile, Passability, RoomKind,
    SeatId, SimulationConfig, TileCoord, TileKind, Weapon,
};

use crate::{
    admits,
    buildings::{Building, TileCoverage},
    creatures::Creature,
    grid::Tile,
    navigation, visibility, World,
};

/// Read-only description of a tile.
#[derive(Clone, Debug, PartialEq)]
pub struct TileView {
    /// Location of the tile.
    pub coord: TileCoord,
    /// Material of the tile.
    pub kind: TileKind,
    /// Wall thickness; zero for ground.
    pub fullness: f64,
    /// Strength of the current owner's claim.
    pub claimed: f64,
    /// Seat owning the tile.
    pub owner: Option<SeatId>,
    /// Structure covering the tile.
    pub building: Option<BuildingId>,
    /// Creatures standing on the tile.
    pub occupants: Vec<CreatureId>,
}

impl TileView {
    fn from_tile(tile: &Tile) -> Self {
        Self {
            coord: tile.coord,
            kind: tile.kind,
            fullness: tile.fullness,
            claimed: tile.claimed,
            owner: tile.owner,
            building: tile.building,
            occupants: tile.occupants.clone(),
        }
    }

    /// Reports whether no wall stands on the tile.
    #[must_use]
    pub fn is_ground(&self) -> bool {
        self.fullness <= 0.0
    }
}

/// Read-only description of a creature.
#[derive(Clone, Debug, PartialEq)]
pub struct CreatureView {
    /// Identifier of the creature.
    pub id: CreatureId,
    /// Unique display name.
    pub name: String,
    /// Template the creature was created from.
    pub definition: CreatureDefinition,
    /// Owning seat.
    pub seat: SeatId,
    /// Tile the creature stands on.
    pub tile: TileCoord,
    /// Current hit points.
    pub hp: f64,
    /// Maximum hit points.
    pub max_hp: f64,
    /// Experience level.
    pub level: u32,
    /// Experience accumulated toward the next level.
    pub experience: f64,
    /// Hunger between 0 and 100.
    pub hunger: f64,
    /// Awakeness between 0 and 100.
    pub awakeness: f64,
    /// Gold carried.
    pub gold: u32,
    /// Fullness removed per dig.
    pub dig_rate: f64,
    /// Claim progress per claim.
    pub claim_rate: f64,
    /// Action stack from bottom to top.
    pub actions: Vec<CreatureAction>,
    /// Remaining waypoints.
    pub destinations: Vec<TileCoord>,
    /// Dormitory and anchor tile of the creature's bed.
    pub home: Option<(BuildingId, TileCoord)>,
    /// Training hall the creature uses.
    pub job_room: Option<BuildingId>,
    /// Hatchery the creature uses.
    pub eat_room: Option<BuildingId>,
    /// Weapon held in the left hand.
    pub weapon_left: Option<Weapon>,
    /// Weapon held in the right hand.
    pub weapon_right: Option<Weapon>,
    /// Longest reach among the weapons held.
    pub weapon_range: u32,
    /// Whether the creature is alive.
    pub alive: bool,
    /// Whether the creature is held in a hand.
    pub held: bool,
}

impl CreatureView {
    fn from_creature(creature: &Creature) -> Self {
        Self {
            id: creature.id,
            name: creature.name.clone(),
            definition: creature.definition.clone(),
            seat: creature.seat,
            tile: creature.tile,
            hp: creature.hp,
            max_hp: creature.max_hp,
            level: creature.level,
            experience: creature.experience,
            hunger: creature.hunger,
            awakeness: creature.awakeness,
            gold: creature.gold,
            dig_rate: creature.dig_rate,
            claim_rate: creature.claim_rate,
            actions: creature.actions.as_slice().to_vec(),
            destinations: creature.destinations.iter().copied().collect(),
            home: creature.home.map(|home| (home.building, home.anchor)),
            job_room: creature.job_room,
            eat_room: creature.eat_room,
            weapon_left: creature.weapon_left.clone(),
            weapon_right: creature.weapon_right.clone(),
            weapon_range: creature.weapon_range(),
            alive: creature.is_alive(),
            held: creature.held,
        }
    }

    /// Action currently executed.
    #[must_use]
    pub fn current_action(&self) -> CreatureAction {
        self.actions.last().copied().unwrap_or(CreatureAction::Idle)
    }

    /// Reports whether the creature digs, claims and carries gold.
    #[must_use]
    pub fn is_worker(&self) -> bool {
        self.definition.is_worker
    }
}

/// Read-only description of a room or trap.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildingView {
    /// Identifier of the structure.
    pub id: BuildingId,
    /// Type of the structure.
    pub kind: BuildingKind,
    /// Owning seat.
    pub seat: SeatId,
    /// Covered tiles in row-major order.
    pub tiles: Vec<TileCoord>,
    /// Tiles where users can work.
    pub active_spots: Vec<TileCoord>,
    /// Creatures currently using the room.
    pub users: Vec<CreatureId>,
    /// Maximum number of simultaneous users.
    pub capacity: usize,
    /// Gold stored in a treasury.
    pub stored_gold: u32,
    /// Gold a treasury can still accept.
    pub free_gold_space: u32,
    /// Number of beds placed in a dormitory.
    pub beds: usize,
}

impl BuildingView {
    fn from_building(building: &Building, per_tile: u32) -> Self {
        Self {
            id: building.id,
            kind: building.kind,
            seat: building.seat,
            tiles: building.covered_tiles(),
            active_spots: building.active_spots.clone(),
            users: building.users.clone(),
            capacity: building.capacity(),
            stored_gold: building.treasury_stored(),
            free_gold_space: building.treasury_space(per_tile),
            beds: match &building.state {
                crate::buildings::RoomState::Dormitory { beds } => beds.len(),
                _ => 0,
            },
        }
    }

    /// Reports whether another user can join the room.
    #[must_use]
    pub fn has_free_spot(&self) -> bool {
        self.users.len() < self.capacity
    }
}

/// Read-only description of a seat.
#[derive(Clone, Debug, PartialEq)]
pub struct SeatView {
    /// Identifier of the seat.
    pub id: SeatId,
    /// Alliance of the seat.
    pub team: u32,
    /// Gold held.
    pub gold: i64,
    /// Mana held.
    pub mana: f64,
    /// Gold variation measured at the last upkeep.
    pub gold_delta: i64,
    /// Mana variation measured at the last upkeep.
    pub mana_delta: f64,
    /// Number of claimed tiles owned.
    pub claimed_tiles: u32,
    /// Goals and their status.
    pub goals: Vec<(GoalKind, GoalStatus)>,
    /// Creatures held in the seat's hand.
    pub hand: Vec<CreatureId>,
}

/// A temple or portal whose spawn window is open this turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnOpportunity {
    /// Room offering the spawn.
    pub building: BuildingId,
    /// Seat owning the room.
    pub seat: SeatId,
    /// Temple or portal.
    pub kind: RoomKind,
}

/// Head count of a seat's living creatures.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Population {
    /// All living creatures.
    pub total: u32,
    /// Living workers.
    pub workers: u32,
}

/// Number of turns started so far.
#[must_use]
pub fn turn(world: &World) -> u64 {
    world.turn
}

/// Configuration the world was created with.
#[must_use]
pub fn config(world: &World) -> &SimulationConfig {
    &world.config
}

/// Width and height of the grid in tiles.
#[must_use]
pub fn dimensions(world: &World) -> (u32, u32) {
    world.grid.dimensions()
}

/// Describes the tile at `coord`, or `None` outside the grid.
#[must_use]
pub fn tile(world: &World, coord: TileCoord) -> Option<TileView> {
    world.grid.tile(coord).map(TileView::from_tile)
}

/// Cardinal neighbours of a tile that lie inside the grid.
#[must_use]
pub fn neighbors(world: &World, coord: TileCoord) -> Vec<TileCoord> {
    world.grid.neighbors(coord).collect()
}

/// Reports whether the seat marked the tile for digging.
#[must_use]
pub fn is_marked(world: &World, coord: TileCoord, seat: SeatId) -> bool {
    world
        .grid
        .tile(coord)
        .map_or(false, |tile| tile.dig_marks.contains(&seat))
}

/// Reports whether creatures of the seat may dig the tile.
#[must_use]
pub fn is_diggable_for(world: &World, coord: TileCoord, seat: SeatId) -> bool {
    world
        .grid
        .tile(coord)
        .map_or(false, |tile| world.is_diggable_for(tile, seat))
}

/// Reports whether two seats are allied.
#[must_use]
pub fn allied(world: &World, first: SeatId, second: SeatId) -> bool {
    world.allied(first, second)
}

/// Diggable tiles marked by the seat, in row-major order.
#[must_use]
pub fn marked_tiles(world: &World, seat: SeatId) -> Vec<TileCoord> {
    world
        .grid
        .tiles()
        .filter(|tile| tile.dig_marks.contains(&seat) && world.is_diggable_for(tile, seat))
        .map(|tile| tile.coord)
        .collect()
}

/// Tiles the seat's workers can claim next, in row-major order.
///
/// Floor tiles must border ground already claimed by the seat. Wall tiles
/// must be dirt or hostile claimed walls bordering such ground.
#[must_use]
pub fn claimable_tiles(world: &World, seat: SeatId, walls: bool) -> Vec<TileCoord> {
    world
        .grid
        .tiles()
        .filter(|tile| {
            let shape = if walls {
                tile.is_diggable_wall()
            } else {
                tile.is_walkable() && tile.building.is_none()
            };
            let settled = tile.claimed >= 1.0
                && tile.owner.map_or(false, |owner| world.allied(owner, seat));
            shape
                && matches!(tile.kind, TileKind::Dirt | TileKind::Claimed)
                && !settled
                && world.grid.neighbors(tile.coord).any(|neighbor| {
                    world
                        .grid
                        .tile(neighbor)
                        .map_or(false, |next| next.is_ground() && next.is_claimed_by(seat))
                })
        })
        .map(|tile| tile.coord)
        .collect()
}

/// Identifiers of every creature in registry insertion order.
#[must_use]
pub fn creature_ids(world: &World) -> Vec<CreatureId> {
    world.creatures.ids()
}

/// Describes a creature.
#[must_use]
pub fn creature(world: &World, id: CreatureId) -> Option<CreatureView> {
    world.creatures.get(id).map(CreatureView::from_creature)
}

/// Identifiers of the creatures standing on a tile.
#[must_use]
pub fn creatures_at(world: &World, coord: TileCoord) -> Vec<CreatureId> {
    world
        .grid
        .tile(coord)
        .map(|tile| tile.occupants.clone())
        .unwrap_or_default()
}

/// Living creatures of the seat.
#[must_use]
pub fn population(world: &World, seat: SeatId) -> Population {
    world
        .creatures
        .iter()
        .filter(|creature| creature.seat == seat && creature.is_alive())
        .fold(Population::default(), |mut population, creature| {
            population.total += 1;
            if creature.is_worker() {
                population.workers += 1;
            }
            population
        })
}

/// Identifiers of every seat in ascending order.
#[must_use]
pub fn seat_ids(world: &World) -> Vec<SeatId> {
    world.seats.iter().map(|seat| seat.id).collect()
}

/// Describes a seat.
#[must_use]
pub fn seat(world: &World, id: SeatId) -> Option<SeatView> {
    world.seats.get(id).map(|seat| SeatView {
        id: seat.id,
        team: seat.team,
        gold: seat.gold,
        mana: seat.mana,
        gold_delta: seat.gold_delta,
        mana_delta: seat.mana_delta,
        claimed_tiles: seat.claimed_tiles,
        goals: seat.goals.clone(),
        hand: seat.hand.clone(),
    })
}

/// Describes every structure in identifier order.
#[must_use]
pub fn buildings(world: &World) -> Vec<BuildingView> {
    let per_tile = world.config.economy.treasury_gold_per_tile;
    world
        .buildings
        .iter()
        .map(|building| BuildingView::from_building(building, per_tile))
        .collect()
}

/// Describes a structure.
#[must_use]
pub fn building(world: &World, id: BuildingId) -> Option<BuildingView> {
    let per_tile = world.config.economy.treasury_gold_per_tile;
    world
        .buildings
        .get(id)
        .map(|building| BuildingView::from_building(building, per_tile))
}

/// Structure covering the tile.
#[must_use]
pub fn building_at(world: &World, coord: TileCoord) -> Option<BuildingId> {
    world.grid.tile(coord).and_then(|tile| tile.building)
}

/// Temples and portals whose spawn window opened during this turn's upkeep.
#[must_use]
pub fn spawn_opportunities(world: &World) -> Vec<SpawnOpportunity> {
    world
        .buildings
        .iter()
        .filter(|building| building.spawn_ready())
        .filter_map(|building| {
            building.room_kind().map(|kind| SpawnOpportunity {
                building: building.id,
                seat: building.seat,
                kind,
            })
        })
        .collect()
}

/// Searches a path between two tiles under the provided movement rule.
///
/// Walkable searches between disconnected regions fail without exploring
/// the grid.
#[must_use]
pub fn find_path(
    world: &World,
    start: TileCoord,
    goal: TileCoord,
    passability: Passability,
    seat: SeatId,
) -> Vec<TileCoord> {
    let grid = &world.grid;
    match passability {
        Passability::Impassable => Vec::new(),
        Passability::Walkable => {
            if !grid.same_region(start, goal) {
                return Vec::new();
            }
            navigation::find_path(grid, start, goal, Tile::is_walkable)
        }
        Passability::Flyable => navigation::find_path(grid, start, goal, |tile| {
            tile.is_ground() && tile.kind != TileKind::Empty
        }),
        Passability::Diggable => navigation::find_path(grid, start, goal, |tile| {
            tile.is_walkable() || world.is_diggable_for(tile, seat)
        }),
    }
}

/// Searches a path the creature can travel with its own terrain speeds.
#[must_use]
pub fn creature_path(world: &World, id: CreatureId, goal: TileCoord) -> Vec<TileCoord> {
    let Some(creature) = world.creatures.get(id) else {
        return Vec::new();
    };
    let definition = &creature.definition;
    let ground_only = definition.move_speed_water <= 0.0 && definition.move_speed_lava <= 0.0;
    if ground_only {
        return find_path(world, creature.tile, goal, Passability::Walkable, creature.seat);
    }
    navigation::find_path(&world.grid, creature.tile, goal, |tile| admits(definition, tile))
}

/// Reports whether the creature may stand on the tile.
#[must_use]
pub fn can_enter(world: &World, id: CreatureId, coord: TileCoord) -> bool {
    match (world.creatures.get(id), world.grid.tile(coord)) {
        (Some(creature), Some(tile)) => admits(&creature.definition, tile),
        _ => false,
    }
}

/// Tiles visible from `origin` within `radius`, in row-major order.
#[must_use]
pub fn visible_tiles(world: &World, origin: TileCoord, radius: u32) -> Vec<TileCoord> {
    visibility::visible_tiles(&world.grid, origin, radius)
}

/// Living hostile creatures standing on tiles the creature can see.
#[must_use]
pub fn visible_hostiles(world: &World, id: CreatureId) -> Vec<CreatureId> {
    let Some(observer) = world.creatures.get(id) else {
        return Vec::new();
    };
    let seen: BTreeSet<TileCoord> = visibility::visible_tiles(
        &world.grid,
        observer.tile,
        observer.definition.sight_radius,
    )
    .into_iter()
    .collect();

    world
        .creatures
        .iter()
        .filter(|other| {
            other.is_alive()
                && !other.held
                && !world.allied(other.seat, observer.seat)
                && seen.contains(&other.tile)
        })
        .map(|other| other.id)
        .collect()
}

/// Hostile structures covering tiles the creature can see.
#[must_use]
pub fn visible_hostile_buildings(world: &World, id: CreatureId) -> Vec<BuildingId> {
    let Some(observer) = world.creatures.get(id) else {
        return Vec::new();
    };
    let mut found = BTreeSet::new();
    for coord in visibility::visible_tiles(&world.grid, observer.tile, observer.definition.sight_radius) {
        let Some(building) = world.grid.tile(coord).and_then(|tile| tile.building) else {
            continue;
        };
        let hostile = world
            .buildings
            .get(building)
            .map_or(false, |entry| !world.allied(entry.seat, observer.seat));
        if hostile {
            let _ = found.insert(building);
        }
    }
    found.into_iter().collect()
}

/// Dead creatures waiting for removal at the start of a later turn.
#[must_use]
pub fn pending_deletions(world: &World) -> Vec<CreatureId> {
    world
        .deletions
        .iter()
        .map(|deletion| deletion.creature)
        .collect()
}

/// Captures the semantic content of the world as a level.
#[must_use]
pub fn export_level(world: &World) -> Level {
    let (width, height) = world.grid.dimensions();
    Level {
        width,
        height,
        default_kind: TileKind::Dirt,
        default_fullness: 100.0,
        seats: world
            .seats
            .iter()
            .map(|seat| LevelSeat {
                id: seat.id,
                team: seat.team,
                color: seat.color,
                gold: seat.gold,
                mana: seat.mana,
                goals: seat.goals.iter().map(|(goal, _)| *goal).collect(),
            })
            .collect(),
        tiles: world
            .grid
            .tiles()
            .map(|tile| LevelTile {
                coord: tile.coord,
                kind: tile.kind,
                fullness: tile.fullness,
                owner: tile.owner,
            })
            .collect(),
        creatures: world
            .creatures
            .iter()
            .filter(|creature| creature.is_alive())
            .map(|creature| LevelCreature {
                class: creature.definition.class_name.clone(),
                name: creature.name.clone(),
                tile: creature.tile,
                seat: creature.seat,
                weapon_left: creature.weapon_left.clone(),
                weapon_right: creature.weapon_right.clone(),
                hp: Some(creature.hp),
                level: creature.level,
            })
            .collect(),
        buildings: world
            .buildings
            .iter()
            .map(|building| LevelBuilding {
                kind: building.kind,
                seat: building.seat,
                tiles: building.covered_tiles(),
            })
            .collect(),
    }
}
