//! Events broadcast by the world after processing commands.

use serde::{Deserialize, Serialize};

use crate::{
    BuildingId, CreatureId, EntityRef, GoalKind, GoalStatus, RoomKind, SeatId, TileCoord,
    TileKind, TrapKind,
};

/// Immutable description of a creature carried by replication events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreatureSnapshot {
    /// Identifier of the creature.
    pub id: CreatureId,
    /// Class name of the creature's definition.
    pub class: String,
    /// Unique display name.
    pub name: String,
    /// Owning seat.
    pub seat: SeatId,
    /// Tile the creature occupies.
    pub tile: TileCoord,
    /// Current hit points.
    pub hp: f64,
    /// Maximum hit points.
    pub max_hp: f64,
    /// Experience level.
    pub level: u32,
}

/// Animation requested from the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Animation {
    /// Standing still.
    Idle,
    /// Walking between tiles.
    Walk,
    /// Digging a wall.
    Dig,
    /// Claiming a tile.
    Claim,
    /// Striking a target.
    Attack,
    /// Sleeping in a bed.
    Sleep,
    /// Eating.
    Eat,
    /// Training in a job room.
    Train,
    /// Fleeing.
    Flee,
    /// Dying.
    Die,
}

/// Sound requested from the audio layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreatureSound {
    /// A creature struck a target.
    Attack,
    /// A creature dug into a wall.
    Dig,
    /// A creature died.
    Die,
    /// A creature was picked up.
    Pickup,
    /// A creature was dropped.
    Drop,
    /// A creature entered the dungeon.
    Spawn,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// A new turn started.
    TurnStarted {
        /// Number of the turn.
        turn: u64,
    },
    /// The fullness of a tile changed.
    TileFullnessChanged {
        /// Tile that changed.
        tile: TileCoord,
        /// Fullness after the change.
        fullness: f64,
    },
    /// The owner or kind of a tile changed through claiming.
    TileClaimed {
        /// Tile that changed.
        tile: TileCoord,
        /// Seat owning the tile after the change.
        seat: SeatId,
        /// Kind of the tile after the change.
        kind: TileKind,
    },
    /// A creature entered the world.
    CreatureAdded {
        /// Snapshot of the new creature.
        creature: CreatureSnapshot,
    },
    /// A creature left the world for good.
    CreatureRemoved {
        /// Identifier of the removed creature.
        creature: CreatureId,
    },
    /// Replicated state of a creature changed.
    CreatureRefreshed {
        /// Snapshot after the change.
        creature: CreatureSnapshot,
    },
    /// An entity changed animation.
    ObjectAnimationState {
        /// Animated entity.
        entity: EntityRef,
        /// Requested animation.
        animation: Animation,
        /// Whether the animation loops.
        looped: bool,
    },
    /// A room was constructed.
    RoomBuilt {
        /// Identifier of the room.
        building: BuildingId,
        /// Type of room.
        kind: RoomKind,
        /// Owning seat.
        seat: SeatId,
        /// Covered tiles.
        tiles: Vec<TileCoord>,
    },
    /// A trap was constructed.
    TrapBuilt {
        /// Identifier of the trap.
        building: BuildingId,
        /// Type of trap.
        kind: TrapKind,
        /// Owning seat.
        seat: SeatId,
        /// Covered tiles.
        tiles: Vec<TileCoord>,
    },
    /// Gold was deposited into a treasury.
    GoldDeposited {
        /// Seat receiving the gold.
        seat: SeatId,
        /// Treasury tile where the deposit happened.
        tile: TileCoord,
        /// Amount deposited.
        amount: u32,
    },
    /// A creature triggered a sound.
    CreatureSound {
        /// Creature producing the sound.
        creature: CreatureId,
        /// Sound to play.
        sound: CreatureSound,
    },
    /// Tiles of a building were destroyed.
    BuildingTilesRemoved {
        /// Building losing the tiles.
        building: BuildingId,
        /// Tiles no longer covered.
        tiles: Vec<TileCoord>,
        /// Whether the building was deleted because it covers nothing.
        destroyed: bool,
    },
    /// A seat goal changed status.
    GoalStatusChanged {
        /// Seat owning the goal.
        seat: SeatId,
        /// Goal that changed.
        goal: GoalKind,
        /// Status after the change.
        status: GoalStatus,
    },
}
