//! Commands that express every permissible world mutation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    BuildingId, CreatureAction, CreatureId, EntityRef, RoomKind, SeatId, TileCoord, TrapKind,
};

/// Dice thrown by the attacker for a single strike.
///
/// Systems own the random number generators; the world only applies the
/// outcome so that replays stay deterministic.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackRoll {
    /// Uniform draw in `[0, 1)` scaling the attacker's damage.
    pub hit: f64,
    /// Uniform draw in `[0, 0.4)` whose square scales the target's defense.
    pub defense: f64,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Marks or unmarks wall tiles for digging on behalf of a seat.
    MarkTilesForDigging {
        /// Tiles affected by the request.
        tiles: Vec<TileCoord>,
        /// `true` to set the mark, `false` to clear it.
        marked: bool,
        /// Seat placing the marks.
        seat: SeatId,
    },
    /// Constructs a room over claimed tiles.
    BuildRoom {
        /// Tiles the room should cover.
        tiles: Vec<TileCoord>,
        /// Type of room.
        kind: RoomKind,
        /// Seat paying for the room.
        seat: SeatId,
    },
    /// Constructs a trap over claimed tiles.
    BuildTrap {
        /// Tiles the trap should cover.
        tiles: Vec<TileCoord>,
        /// Type of trap.
        kind: TrapKind,
        /// Seat paying for the trap.
        seat: SeatId,
    },
    /// Drops a creature held in a seat's hand onto a tile.
    DropCreature {
        /// Creature being dropped.
        creature: CreatureId,
        /// Destination tile.
        tile: TileCoord,
        /// Seat whose hand holds the creature.
        seat: SeatId,
    },
    /// Picks a creature up into a seat's hand.
    PickUpCreature {
        /// Creature being lifted.
        creature: CreatureId,
        /// Seat performing the pick up.
        seat: SeatId,
    },
    /// Starts a new turn and processes the deferred deletion queue.
    BeginTurn,
    /// Runs building and seat upkeep for the current turn.
    Upkeep,
    /// Spawns a creature of the provided class at a temple or portal.
    SpawnCreature {
        /// Room producing the creature.
        building: BuildingId,
        /// Class name of the creature definition to instantiate.
        class: String,
    },
    /// Applies the per-turn healing, awakeness and hunger updates.
    CreatureUpkeep {
        /// Creature receiving the update.
        creature: CreatureId,
    },
    /// Advances the death countdown of a dead creature.
    DecayCorpse {
        /// Dead creature.
        creature: CreatureId,
    },
    /// Pushes an action on top of a creature's action stack.
    PushAction {
        /// Creature receiving the action.
        creature: CreatureId,
        /// Action suspending the current one.
        action: CreatureAction,
    },
    /// Pops the top action of a creature's action stack.
    PopAction {
        /// Creature whose stack shrinks.
        creature: CreatureId,
    },
    /// Clears a creature's action stack and pushes a priority action.
    Interrupt {
        /// Creature being interrupted.
        creature: CreatureId,
        /// Action replacing everything in progress.
        action: CreatureAction,
    },
    /// Replaces a creature's destination queue.
    SetDestinations {
        /// Creature receiving the waypoints.
        creature: CreatureId,
        /// Waypoints in travel order, excluding the current tile.
        path: Vec<TileCoord>,
    },
    /// Moves a creature to the next waypoint of its destination queue.
    StepCreature {
        /// Creature taking a step.
        creature: CreatureId,
    },
    /// Digs an adjacent tile marked by the creature's seat.
    DigTile {
        /// Digging creature.
        creature: CreatureId,
        /// Wall tile being dug.
        tile: TileCoord,
    },
    /// Applies the creature's claim rate to a tile.
    ClaimTile {
        /// Claiming creature.
        creature: CreatureId,
        /// Tile being claimed.
        tile: TileCoord,
    },
    /// Deposits carried gold into a treasury the creature stands on.
    DepositGold {
        /// Creature carrying gold.
        creature: CreatureId,
        /// Treasury receiving the gold.
        building: BuildingId,
    },
    /// Assigns a dormitory bed to the creature.
    ClaimBed {
        /// Creature looking for a home.
        creature: CreatureId,
        /// Dormitory that should host the bed.
        building: BuildingId,
    },
    /// Regenerates HP and awakeness while the creature lies in its bed.
    Rest {
        /// Sleeping creature.
        creature: CreatureId,
    },
    /// Registers the creature as a user of a room.
    JoinRoom {
        /// Creature entering the room.
        creature: CreatureId,
        /// Room being joined.
        building: BuildingId,
    },
    /// Unregisters the creature from a room.
    LeaveRoom {
        /// Creature leaving the room.
        creature: CreatureId,
        /// Room being left.
        building: BuildingId,
    },
    /// Trains in the creature's job room.
    Work {
        /// Training creature.
        creature: CreatureId,
    },
    /// Eats in the creature's hatchery.
    Eat {
        /// Eating creature.
        creature: CreatureId,
    },
    /// Strikes a target once.
    Attack {
        /// Creature dealing the blow.
        attacker: CreatureId,
        /// Entity receiving the blow.
        target: EntityRef,
        /// Dice thrown for the strike.
        roll: AttackRoll,
    },
}

/// Reasons the world may reject a command. No state is mutated on rejection.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CommandError {
    /// The referenced seat does not exist.
    #[error("seat {0:?} does not exist")]
    UnknownSeat(SeatId),
    /// The referenced creature does not exist.
    #[error("creature {0:?} does not exist")]
    UnknownCreature(CreatureId),
    /// The referenced building does not exist.
    #[error("building {0:?} does not exist")]
    UnknownBuilding(BuildingId),
    /// No creature definition carries the provided class name.
    #[error("creature class '{0}' is not defined")]
    UnknownClass(String),
    /// The tile lies outside the grid.
    #[error("tile {0:?} lies outside the grid")]
    OutOfBounds(TileCoord),
    /// The request did not reference any tile.
    #[error("no tiles were provided")]
    NoTiles,
    /// The tile cannot host a structure for the seat.
    #[error("tile {0:?} cannot be built on")]
    TileNotBuildable(TileCoord),
    /// The room type may only be placed by the level.
    #[error("room {0:?} cannot be built by players")]
    RoomNotBuildable(RoomKind),
    /// The seat cannot pay for the request.
    #[error("insufficient gold: {required} required, {available} available")]
    InsufficientGold {
        /// Gold required by the request.
        required: i64,
        /// Gold held by the seat.
        available: i64,
    },
    /// The room has no free capacity.
    #[error("building {0:?} has no free capacity")]
    RoomFull(BuildingId),
    /// The entity belongs to another seat.
    #[error("seat {seat:?} does not control the target")]
    NotOwner {
        /// Seat attempting the request.
        seat: SeatId,
    },
    /// The creature is not held in the seat's hand.
    #[error("creature {0:?} is not held")]
    NotHeld(CreatureId),
    /// The creature is held in a hand and cannot act.
    #[error("creature {0:?} is held")]
    Held(CreatureId),
    /// The creature is dead.
    #[error("creature {0:?} is dead")]
    Dead(CreatureId),
    /// The target cannot be acted upon from the creature's position.
    #[error("target {0:?} is not valid for the action")]
    InvalidTarget(TileCoord),
}
