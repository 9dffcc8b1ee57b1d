#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the OpenDungeons simulation.
//!
//! This crate defines the message surface that connects the command layer,
//! the authoritative world, and the simulation systems. Callers submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then reports [`Event`] values
//! that are published in order to a [`NotificationSink`]. Systems query
//! immutable snapshots and respond exclusively with new commands.

mod command;
mod config;
mod event;
mod level;
mod notification;

pub use command::{AttackRoll, Command, CommandError};
pub use config::{CreatureDefinition, Economy, Rules, SimulationConfig, SpawnTuning, TrapTuning};
pub use event::{Animation, CreatureSnapshot, CreatureSound, Event};
pub use level::{Level, LevelBuilding, LevelCreature, LevelSeat, LevelTile};
pub use notification::{NotificationError, NotificationQueue, NotificationSink};

use serde::{Deserialize, Serialize};

/// Location of a single grid tile expressed as x and y coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    y: u32,
    x: u32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { y, x }
    }

    /// Zero-based column of the tile.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row of the tile.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Computes the Manhattan distance between two tile coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: TileCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Squared Euclidean distance between two tile coordinates.
    #[must_use]
    pub fn distance_squared(self, other: TileCoord) -> u64 {
        let dx = u64::from(self.x.abs_diff(other.x));
        let dy = u64::from(self.y.abs_diff(other.y));
        dx * dx + dy * dy
    }

    /// Reports whether the two coordinates share an edge.
    #[must_use]
    pub fn is_adjacent(self, other: TileCoord) -> bool {
        self.manhattan_distance(other) == 1
    }
}

/// Unique identifier assigned to a seat (a participating faction).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeatId(u32);

impl SeatId {
    /// Creates a new seat identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a creature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CreatureId(u32);

impl CreatureId {
    /// Creates a new creature identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a room or trap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildingId(u32);

impl BuildingId {
    /// Creates a new building identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Material of a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Void outside the playable dungeon.
    Empty,
    /// Soft earth that workers can dig and claim.
    Dirt,
    /// Gold vein; digging it yields gold.
    Gold,
    /// Bedrock that can never be dug.
    Rock,
    /// Water; only creatures with a water speed can cross it.
    Water,
    /// Lava; only creatures with a lava speed can cross it.
    Lava,
    /// Tile fully owned by a seat, either a floor or a fortified wall.
    Claimed,
}

impl TileKind {
    /// Reports whether the material is a liquid.
    #[must_use]
    pub const fn is_liquid(self) -> bool {
        matches!(self, Self::Water | Self::Lava)
    }
}

/// Movement rule applied when evaluating whether a tile may be entered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Passability {
    /// Ground tiles that are not liquid.
    Walkable,
    /// Every ground tile, liquids included.
    Flyable,
    /// Walkable ground plus walls the seat is allowed to dig through.
    Diggable,
    /// Nothing may be entered.
    Impassable,
}

/// Types of rooms that can cover claimed tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomKind {
    /// Heart of a dungeon; periodically spawns workers.
    DungeonTemple,
    /// Gateway that attracts fighters while the population is low.
    Portal,
    /// Stores gold up to a per-tile capacity.
    Treasury,
    /// Provides beds for creatures.
    Dormitory,
    /// Feeds hungry creatures.
    Hatchery,
    /// Lets fighters train for experience.
    TrainingHall,
}

impl RoomKind {
    /// Reports whether players may construct the room with a build command.
    #[must_use]
    pub const fn is_buildable(self) -> bool {
        !matches!(self, Self::DungeonTemple | Self::Portal)
    }
}

/// Types of traps that can be placed on claimed tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrapKind {
    /// Fires at hostile creatures within range.
    Cannon,
}

/// Discriminates between the structure families tracked by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingKind {
    /// A room with room-specific behaviour.
    Room(RoomKind),
    /// A trap.
    Trap(TrapKind),
}

/// Reference to any simulated entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityRef {
    /// A creature.
    Creature(CreatureId),
    /// A room.
    Room(BuildingId),
    /// A trap.
    Trap(BuildingId),
    /// A tile.
    Tile(TileCoord),
}

/// Behaviour states stacked on a creature's action stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreatureAction {
    /// Decide what to do next.
    Idle,
    /// Follow the destination queue.
    WalkToTile,
    /// Claim floor tiles.
    ClaimTile,
    /// Claim wall tiles next to owned floor.
    ClaimWallTile,
    /// Dig tiles marked by the controlling seat.
    DigTile,
    /// Carry gold to a treasury.
    DepositGold,
    /// Look for a bed in a dormitory.
    FindHome,
    /// Rest in the creature's bed.
    Sleep,
    /// Work in a job room.
    Job,
    /// Eat in a hatchery.
    Eat,
    /// Strike the provided target once.
    AttackObject {
        /// Entity receiving the blow.
        target: EntityRef,
    },
    /// Engage the nearest reachable enemy.
    Fight,
    /// Run away from hostiles.
    Flee,
}

/// Weapon held in one of a creature's hands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    /// Display name of the weapon.
    pub name: String,
    /// Base damage dealt per strike.
    pub damage: f64,
    /// Reach measured in tiles.
    pub range: u32,
    /// Defense bonus granted while held.
    pub defense: f64,
}

/// Objective tracked for a seat.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum GoalKind {
    /// Own at least the given number of claimed tiles.
    ClaimTiles(u32),
    /// Hold at least the given amount of gold.
    MineGold(i64),
    /// Keep at least one dungeon temple standing.
    ProtectDungeonTemple,
    /// Leave no living creature of a hostile seat.
    KillAllEnemies,
}

/// Progress of a seat goal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoalStatus {
    /// Still being evaluated.
    Active,
    /// Achieved.
    Completed,
    /// Can no longer be achieved.
    Failed,
}
