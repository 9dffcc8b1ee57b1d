//! Semantic content of a level: the initial grid, seats, creatures and structures.

use serde::{Deserialize, Serialize};

use crate::{BuildingKind, GoalKind, SeatId, TileCoord, TileKind, Weapon};

/// Complete description of a dungeon consumed once at session start.
///
/// Tiles that are not listed explicitly use `default_kind` and
/// `default_fullness`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Level {
    /// Number of tile columns.
    pub width: u32,
    /// Number of tile rows.
    pub height: u32,
    /// Material of unlisted tiles.
    pub default_kind: TileKind,
    /// Fullness of unlisted tiles.
    pub default_fullness: f64,
    /// Participating seats.
    pub seats: Vec<LevelSeat>,
    /// Explicit tile overrides.
    pub tiles: Vec<LevelTile>,
    /// Creatures present at start.
    pub creatures: Vec<LevelCreature>,
    /// Rooms and traps present at start.
    pub buildings: Vec<LevelBuilding>,
}

impl Level {
    /// Creates a level filled with solid dirt.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            default_kind: TileKind::Dirt,
            default_fullness: 100.0,
            seats: Vec::new(),
            tiles: Vec::new(),
            creatures: Vec::new(),
            buildings: Vec::new(),
        }
    }

    /// Adds a seat belonging to the provided team.
    #[must_use]
    pub fn with_seat(mut self, id: SeatId, team: u32, gold: i64) -> Self {
        self.seats.push(LevelSeat {
            id,
            team,
            color: id.get(),
            gold,
            mana: 0.0,
            goals: Vec::new(),
        });
        self
    }

    /// Overrides a single tile.
    #[must_use]
    pub fn with_tile(
        mut self,
        coord: TileCoord,
        kind: TileKind,
        fullness: f64,
        owner: Option<SeatId>,
    ) -> Self {
        self.tiles.push(LevelTile {
            coord,
            kind,
            fullness,
            owner,
        });
        self
    }

    /// Overrides every tile of the rectangle spanning `from` to `to` inclusive.
    #[must_use]
    pub fn with_area(
        mut self,
        from: TileCoord,
        to: TileCoord,
        kind: TileKind,
        fullness: f64,
        owner: Option<SeatId>,
    ) -> Self {
        for y in from.y().min(to.y())..=from.y().max(to.y()) {
            for x in from.x().min(to.x())..=from.x().max(to.x()) {
                self = self.with_tile(TileCoord::new(x, y), kind, fullness, owner);
            }
        }
        self
    }

    /// Adds a creature at full health.
    #[must_use]
    pub fn with_creature(mut self, class: &str, seat: SeatId, tile: TileCoord) -> Self {
        let name = format!("{class}{}", self.creatures.len() + 1);
        self.creatures.push(LevelCreature {
            class: class.to_owned(),
            name,
            tile,
            seat,
            weapon_left: None,
            weapon_right: None,
            hp: None,
            level: 1,
        });
        self
    }

    /// Adds a structure.
    #[must_use]
    pub fn with_building(mut self, kind: BuildingKind, seat: SeatId, tiles: Vec<TileCoord>) -> Self {
        self.buildings.push(LevelBuilding { kind, seat, tiles });
        self
    }
}

/// Seat entry of a level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelSeat {
    /// Identifier of the seat.
    pub id: SeatId,
    /// Alliance; seats sharing a team are allied.
    pub team: u32,
    /// Display color index.
    pub color: u32,
    /// Starting gold.
    pub gold: i64,
    /// Starting mana.
    pub mana: f64,
    /// Goals the seat pursues.
    pub goals: Vec<GoalKind>,
}

/// Tile entry of a level: `x, y, kind, fullness[, owner]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelTile {
    /// Location of the tile.
    pub coord: TileCoord,
    /// Material of the tile.
    pub kind: TileKind,
    /// Wall thickness.
    pub fullness: f64,
    /// Owning seat of claimed tiles.
    pub owner: Option<SeatId>,
}

/// Creature entry of a level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelCreature {
    /// Class name of the creature's definition.
    pub class: String,
    /// Unique display name.
    pub name: String,
    /// Tile the creature stands on.
    pub tile: TileCoord,
    /// Owning seat.
    pub seat: SeatId,
    /// Weapon in the left hand; the class default when absent.
    pub weapon_left: Option<Weapon>,
    /// Weapon in the right hand.
    pub weapon_right: Option<Weapon>,
    /// Hit points; full health when absent.
    pub hp: Option<f64>,
    /// Experience level.
    pub level: u32,
}

/// Structure entry of a level: `kind, seat, tileCount, (x, y)*`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelBuilding {
    /// Type of the structure.
    pub kind: BuildingKind,
    /// Owning seat.
    pub seat: SeatId,
    /// Covered tiles.
    pub tiles: Vec<TileCoord>,
}
