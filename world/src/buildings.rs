//! Rooms and traps covering claimed tiles.

use std::collections::BTreeMap;

use opendungeons_core::{
    BuildingId, BuildingKind, CreatureId, RoomKind, SeatId, SimulationConfig, TileCoord, TrapKind,
};

/// Structures that occupy a set of tiles.
pub(crate) trait TileCoverage {
    /// Tiles covered by the structure in row-major order.
    fn covered_tiles(&self) -> Vec<TileCoord>;

    /// Reports whether the structure covers the tile.
    fn covers(&self, tile: TileCoord) -> bool;
}

/// Entities that lose hit points when struck.
pub(crate) trait Damageable {
    /// Flat reduction applied to incoming strikes.
    fn defense(&self) -> f64;

    /// Applies damage at the provided location and returns the amount applied.
    fn take_damage(&mut self, amount: f64, at: TileCoord) -> f64;
}

/// Entities advanced once per turn.
pub(crate) trait Upkeepable {
    /// Summary of what changed during the upkeep.
    type Report;

    /// Advances the entity by one turn.
    fn upkeep(&mut self, config: &SimulationConfig) -> Self::Report;
}

/// A bed placed in a dormitory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Bed {
    pub(crate) creature: CreatureId,
    pub(crate) anchor: TileCoord,
    pub(crate) tiles: Vec<TileCoord>,
}

/// Behaviour specific to a kind of structure.
#[derive(Clone, Debug)]
pub(crate) enum RoomState {
    /// Rooms without internal state.
    Plain,
    /// Gold stored on each tile.
    Treasury { stored: BTreeMap<TileCoord, u32> },
    /// Beds assigned to creatures.
    Dormitory { beds: Vec<Bed> },
    /// Temples and portals waiting for their next spawn window.
    Spawner { countdown: u32, ready: bool },
    /// Cannon waiting for its next shot.
    Cannon { reload: u32 },
}

/// What happened to a building during upkeep.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct BuildingUpkeep {
    pub(crate) removed_tiles: Vec<TileCoord>,
    pub(crate) lost_gold: u32,
    pub(crate) evicted: Vec<CreatureId>,
    pub(crate) loaded: bool,
}

/// Authoritative state of a room or trap.
#[derive(Clone, Debug)]
pub(crate) struct Building {
    pub(crate) id: BuildingId,
    pub(crate) kind: BuildingKind,
    pub(crate) seat: SeatId,
    tiles: BTreeMap<TileCoord, f64>,
    pub(crate) active_spots: Vec<TileCoord>,
    pub(crate) users: Vec<CreatureId>,
    pub(crate) state: RoomState,
}

impl Building {
    pub(crate) fn new(
        id: BuildingId,
        kind: BuildingKind,
        seat: SeatId,
        tiles: &[TileCoord],
        config: &SimulationConfig,
    ) -> Self {
        let tile_hp = match kind {
            BuildingKind::Room(_) => config.economy.room_tile_hp,
            BuildingKind::Trap(_) => config.economy.trap_tile_hp,
        };
        let state = match kind {
            BuildingKind::Room(RoomKind::Treasury) => RoomState::Treasury {
                stored: tiles.iter().map(|tile| (*tile, 0)).collect(),
            },
            BuildingKind::Room(RoomKind::Dormitory) => RoomState::Dormitory { beds: Vec::new() },
            BuildingKind::Room(RoomKind::DungeonTemple) => RoomState::Spawner {
                countdown: config.spawning.temple_countdown,
                ready: false,
            },
            BuildingKind::Room(RoomKind::Portal) => RoomState::Spawner {
                countdown: config.spawning.portal_countdown,
                ready: false,
            },
            BuildingKind::Room(RoomKind::Hatchery | RoomKind::TrainingHall) => RoomState::Plain,
            BuildingKind::Trap(TrapKind::Cannon) => RoomState::Cannon {
                reload: config.traps.cannon_reload,
            },
        };

        Self {
            id,
            kind,
            seat,
            tiles: tiles.iter().map(|tile| (*tile, tile_hp)).collect(),
            active_spots: Vec::new(),
            users: Vec::new(),
            state,
        }
    }

    pub(crate) fn room_kind(&self) -> Option<RoomKind> {
        match self.kind {
            BuildingKind::Room(kind) => Some(kind),
            BuildingKind::Trap(_) => None,
        }
    }

    pub(crate) fn is_room(&self, kind: RoomKind) -> bool {
        self.room_kind() == Some(kind)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Number of creatures that may use the room at once.
    pub(crate) fn capacity(&self) -> usize {
        match self.room_kind() {
            Some(RoomKind::TrainingHall | RoomKind::Hatchery) => self.active_spots.len(),
            _ => 0,
        }
    }

    /// Registers a user if the room has a free spot.
    pub(crate) fn add_user(&mut self, creature: CreatureId) -> bool {
        if self.users.contains(&creature) {
            return true;
        }
        if self.users.len() >= self.capacity() {
            return false;
        }
        self.users.push(creature);
        true
    }

    pub(crate) fn remove_user(&mut self, creature: CreatureId) -> bool {
        let before = self.users.len();
        self.users.retain(|user| *user != creature);
        before != self.users.len()
    }

    /// Recomputes the active spots from the room shape and the surrounding walls.
    ///
    /// A tile is active when its eight neighbours all belong to the room, or
    /// when a wall borders one side and the room continues on both sides
    /// perpendicular to that wall.
    pub(crate) fn refresh_active_spots<F>(&mut self, is_wall: F)
    where
        F: Fn(TileCoord) -> bool,
    {
        let inside = |coord: Option<TileCoord>| coord.map_or(false, |coord| self.tiles.contains_key(&coord));
        let wall = |coord: Option<TileCoord>| coord.map_or(false, &is_wall);

        let mut spots = Vec::new();
        for &tile in self.tiles.keys() {
            let surrounded = (-1..=1)
                .flat_map(|dy| (-1..=1).map(move |dx| (dx, dy)))
                .filter(|&(dx, dy)| dx != 0 || dy != 0)
                .all(|(dx, dy)| inside(offset(tile, dx, dy)));

            let against_wall = [(0, -1), (1, 0), (0, 1), (-1, 0)].iter().any(|&(dx, dy)| {
                wall(offset(tile, dx, dy))
                    && inside(offset(tile, dy, dx))
                    && inside(offset(tile, -dy, -dx))
            });

            if surrounded || against_wall {
                spots.push(tile);
            }
        }
        self.active_spots = spots;
    }

    /// Free gold capacity of a treasury.
    pub(crate) fn treasury_space(&self, per_tile: u32) -> u32 {
        match &self.state {
            RoomState::Treasury { stored } => stored
                .values()
                .map(|amount| per_tile.saturating_sub(*amount))
                .sum(),
            _ => 0,
        }
    }

    pub(crate) fn treasury_stored(&self) -> u32 {
        match &self.state {
            RoomState::Treasury { stored } => stored.values().sum(),
            _ => 0,
        }
    }

    /// Fills treasury tiles in row-major order and returns the amount stored.
    pub(crate) fn deposit(&mut self, amount: u32, per_tile: u32) -> u32 {
        let RoomState::Treasury { stored } = &mut self.state else {
            return 0;
        };
        let mut remaining = amount;
        for held in stored.values_mut() {
            if remaining == 0 {
                break;
            }
            let accepted = per_tile.saturating_sub(*held).min(remaining);
            *held += accepted;
            remaining -= accepted;
        }
        amount - remaining
    }

    /// Empties treasury tiles in row-major order and returns the amount taken.
    pub(crate) fn withdraw(&mut self, amount: u32) -> u32 {
        let RoomState::Treasury { stored } = &mut self.state else {
            return 0;
        };
        let mut remaining = amount;
        for held in stored.values_mut() {
            if remaining == 0 {
                break;
            }
            let taken = (*held).min(remaining);
            *held -= taken;
            remaining -= taken;
        }
        amount - remaining
    }

    pub(crate) fn bed_of(&self, creature: CreatureId) -> Option<&Bed> {
        match &self.state {
            RoomState::Dormitory { beds } => beds.iter().find(|bed| bed.creature == creature),
            _ => None,
        }
    }

    /// Places a bed with the given footprint, trying both orientations.
    ///
    /// Returns the anchor tile of the new bed, or `None` when no free area of
    /// the dormitory fits the footprint.
    pub(crate) fn assign_bed(
        &mut self,
        creature: CreatureId,
        width: u32,
        height: u32,
    ) -> Option<TileCoord> {
        let RoomState::Dormitory { beds } = &self.state else {
            return None;
        };
        if let Some(bed) = beds.iter().find(|bed| bed.creature == creature) {
            return Some(bed.anchor);
        }

        let mut orientations = vec![(width.max(1), height.max(1))];
        if width != height {
            orientations.push((height.max(1), width.max(1)));
        }

        let occupied = |coord: &TileCoord| beds.iter().any(|bed| bed.tiles.contains(coord));
        let placement = self.tiles.keys().find_map(|&anchor| {
            orientations.iter().find_map(|&(span_x, span_y)| {
                let footprint: Option<Vec<TileCoord>> = (0..span_y)
                    .flat_map(|dy| (0..span_x).map(move |dx| (dx, dy)))
                    .map(|(dx, dy)| {
                        let x = anchor.x().checked_add(dx)?;
                        let y = anchor.y().checked_add(dy)?;
                        let coord = TileCoord::new(x, y);
                        (self.tiles.contains_key(&coord) && !occupied(&coord)).then_some(coord)
                    })
                    .collect();
                footprint.map(|tiles| (anchor, tiles))
            })
        });

        let (anchor, tiles) = placement?;
        if let RoomState::Dormitory { beds } = &mut self.state {
            beds.push(Bed {
                creature,
                anchor,
                tiles,
            });
        }
        Some(anchor)
    }

    pub(crate) fn release_bed(&mut self, creature: CreatureId) -> bool {
        match &mut self.state {
            RoomState::Dormitory { beds } => {
                let before = beds.len();
                beds.retain(|bed| bed.creature != creature);
                before != beds.len()
            }
            _ => false,
        }
    }

    pub(crate) fn spawn_ready(&self) -> bool {
        matches!(self.state, RoomState::Spawner { ready: true, .. })
    }

    pub(crate) fn consume_spawn(&mut self) {
        if let RoomState::Spawner { ready, .. } = &mut self.state {
            *ready = false;
        }
    }

    pub(crate) fn reload(&mut self, turns: u32) {
        if let RoomState::Cannon { reload } = &mut self.state {
            *reload = turns;
        }
    }
}

impl TileCoverage for Building {
    fn covered_tiles(&self) -> Vec<TileCoord> {
        self.tiles.keys().copied().collect()
    }

    fn covers(&self, tile: TileCoord) -> bool {
        self.tiles.contains_key(&tile)
    }
}

impl Damageable for Building {
    fn defense(&self) -> f64 {
        0.0
    }

    fn take_damage(&mut self, amount: f64, at: TileCoord) -> f64 {
        match self.tiles.get_mut(&at) {
            Some(hp) if amount > 0.0 => {
                *hp -= amount;
                amount
            }
            _ => 0.0,
        }
    }
}

impl Upkeepable for Building {
    type Report = BuildingUpkeep;

    fn upkeep(&mut self, config: &SimulationConfig) -> BuildingUpkeep {
        let mut report = BuildingUpkeep::default();

        let destroyed: Vec<TileCoord> = self
            .tiles
            .iter()
            .filter(|(_, hp)| **hp <= 0.0)
            .map(|(tile, _)| *tile)
            .collect();
        for tile in &destroyed {
            let _ = self.tiles.remove(tile);
        }

        match &mut self.state {
            RoomState::Treasury { stored } => {
                for tile in &destroyed {
                    report.lost_gold += stored.remove(tile).unwrap_or(0);
                }
            }
            RoomState::Dormitory { beds } => {
                beds.retain(|bed| {
                    let broken = bed.tiles.iter().any(|tile| destroyed.contains(tile));
                    if broken {
                        report.evicted.push(bed.creature);
                    }
                    !broken
                });
            }
            RoomState::Spawner { countdown, ready } => {
                let period = match self.kind {
                    BuildingKind::Room(RoomKind::Portal) => config.spawning.portal_countdown,
                    _ => config.spawning.temple_countdown,
                };
                if *countdown == 0 {
                    *countdown = period;
                    *ready = true;
                } else {
                    *countdown -= 1;
                    *ready = false;
                }
            }
            RoomState::Cannon { reload } => {
                *reload = reload.saturating_sub(1);
                report.loaded = *reload == 0;
            }
            RoomState::Plain => {}
        }

        report.removed_tiles = destroyed;
        report
    }
}

fn offset(coord: TileCoord, dx: i64, dy: i64) -> Option<TileCoord> {
    let x = u32::try_from(i64::from(coord.x()) + dx).ok()?;
    let y = u32::try_from(i64::from(coord.y()) + dy).ok()?;
    Some(TileCoord::new(x, y))
}

/// Registry that stores buildings and manages identifier allocation.
#[derive(Clone, Debug)]
pub(crate) struct BuildingRegistry {
    entries: BTreeMap<BuildingId, Building>,
    next_id: BuildingId,
}

impl BuildingRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_id: BuildingId::new(0),
        }
    }

    pub(crate) fn insert(
        &mut self,
        kind: BuildingKind,
        seat: SeatId,
        tiles: &[TileCoord],
        config: &SimulationConfig,
    ) -> BuildingId {
        let id = self.next_id;
        self.next_id = BuildingId::new(id.get().saturating_add(1));
        let _ = self
            .entries
            .insert(id, Building::new(id, kind, seat, tiles, config));
        id
    }

    pub(crate) fn get(&self, id: BuildingId) -> Option<&Building> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: BuildingId) -> Option<&mut Building> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: BuildingId) -> Option<Building> {
        self.entries.remove(&id)
    }

    pub(crate) fn ids(&self) -> Vec<BuildingId> {
        self.entries.keys().copied().collect()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Building> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Building> {
        self.entries.values_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: u32, y0: u32, x1: u32, y1: u32) -> Vec<TileCoord> {
        (y0..=y1)
            .flat_map(|y| (x0..=x1).map(move |x| TileCoord::new(x, y)))
            .collect()
    }

    fn room(kind: RoomKind, tiles: &[TileCoord]) -> Building {
        Building::new(
            BuildingId::new(0),
            BuildingKind::Room(kind),
            SeatId::new(1),
            tiles,
            &SimulationConfig::default(),
        )
    }

    #[test]
    fn open_three_by_three_room_has_one_active_spot() {
        let mut hall = room(RoomKind::TrainingHall, &rect(1, 1, 3, 3));
        hall.refresh_active_spots(|_| false);
        assert_eq!(hall.active_spots, vec![TileCoord::new(2, 2)]);
        assert_eq!(hall.capacity(), 1);
    }

    #[test]
    fn walled_room_gains_wall_side_spots() {
        let tiles = rect(1, 1, 3, 3);
        let mut hall = room(RoomKind::TrainingHall, &tiles);
        hall.refresh_active_spots(|coord| !tiles.contains(&coord));
        assert_eq!(
            hall.active_spots,
            vec![
                TileCoord::new(2, 1),
                TileCoord::new(1, 2),
                TileCoord::new(2, 2),
                TileCoord::new(3, 2),
                TileCoord::new(2, 3),
            ]
        );
    }

    #[test]
    fn users_are_bounded_by_capacity() {
        let mut hall = room(RoomKind::TrainingHall, &rect(1, 1, 3, 3));
        hall.refresh_active_spots(|_| false);
        assert!(hall.add_user(CreatureId::new(1)));
        assert!(hall.add_user(CreatureId::new(1)));
        assert!(!hall.add_user(CreatureId::new(2)));
        assert!(hall.remove_user(CreatureId::new(1)));
        assert!(hall.add_user(CreatureId::new(2)));
    }

    #[test]
    fn bed_falls_back_to_rotated_footprint() {
        let mut dormitory = room(RoomKind::Dormitory, &rect(0, 0, 0, 1));
        let anchor = dormitory.assign_bed(CreatureId::new(7), 2, 1);
        assert_eq!(anchor, Some(TileCoord::new(0, 0)));
        let bed = dormitory.bed_of(CreatureId::new(7)).expect("bed");
        assert_eq!(bed.tiles, vec![TileCoord::new(0, 0), TileCoord::new(0, 1)]);
        assert_eq!(dormitory.assign_bed(CreatureId::new(8), 1, 1), None);
    }

    #[test]
    fn treasury_respects_per_tile_capacity() {
        let mut treasury = room(RoomKind::Treasury, &rect(0, 0, 1, 0));
        assert_eq!(treasury.deposit(1_500, 1_000), 1_500);
        assert_eq!(treasury.treasury_space(1_000), 500);
        assert_eq!(treasury.deposit(900, 1_000), 500);
        assert_eq!(treasury.withdraw(2_500), 2_000);
        assert_eq!(treasury.treasury_stored(), 0);
    }

    #[test]
    fn upkeep_removes_destroyed_tiles_and_loses_their_gold() {
        let config = SimulationConfig::default();
        let mut treasury = room(RoomKind::Treasury, &rect(0, 0, 1, 0));
        let _ = treasury.deposit(1_200, config.economy.treasury_gold_per_tile);
        let _ = treasury.take_damage(config.economy.room_tile_hp, TileCoord::new(1, 0));

        let report = treasury.upkeep(&config);
        assert_eq!(report.removed_tiles, vec![TileCoord::new(1, 0)]);
        assert_eq!(report.lost_gold, 200);
        assert_eq!(treasury.covered_tiles(), vec![TileCoord::new(0, 0)]);
        assert!(!treasury.covers(TileCoord::new(1, 0)));
    }

    #[test]
    fn temple_becomes_ready_when_countdown_expires() {
        let mut config = SimulationConfig::default();
        config.spawning.temple_countdown = 1;
        let mut temple = Building::new(
            BuildingId::new(3),
            BuildingKind::Room(RoomKind::DungeonTemple),
            SeatId::new(1),
            &rect(0, 0, 0, 0),
            &config,
        );
        let _ = temple.upkeep(&config);
        assert!(!temple.spawn_ready());
        let _ = temple.upkeep(&config);
        assert!(temple.spawn_ready());
        let _ = temple.upkeep(&config);
        assert!(!temple.spawn_ready());
    }

    #[test]
    fn registry_allocates_sequential_identifiers() {
        let config = SimulationConfig::default();
        let mut registry = BuildingRegistry::new();
        let first = registry.insert(
            BuildingKind::Trap(TrapKind::Cannon),
            SeatId::new(1),
            &rect(0, 0, 0, 0),
            &config,
        );
        let second = registry.insert(
            BuildingKind::Room(RoomKind::Hatchery),
            SeatId::new(1),
            &rect(2, 2, 2, 2),
            &config,
        );
        assert_eq!(first, BuildingId::new(0));
        assert_eq!(second, BuildingId::new(1));
        assert_eq!(registry.ids(), vec![first, second]);
    }
}
