//! Dense tile storage with dig, claim and connectivity bookkeeping.

use std::collections::{BTreeSet, VecDeque};

use opendungeons_core::{BuildingId, CreatureId, SeatId, TileCoord, TileKind};

/// Authoritative state of a single tile.
#[derive(Clone, Debug)]
pub(crate) struct Tile {
    pub(crate) coord: TileCoord,
    pub(crate) kind: TileKind,
    pub(crate) fullness: f64,
    pub(crate) claimed: f64,
    pub(crate) owner: Option<SeatId>,
    pub(crate) building: Option<BuildingId>,
    pub(crate) occupants: Vec<CreatureId>,
    pub(crate) dig_marks: BTreeSet<SeatId>,
    region: u32,
}

impl Tile {
    fn new(coord: TileCoord, kind: TileKind, fullness: f64) -> Self {
        Self {
            coord,
            kind,
            fullness: fullness.clamp(0.0, 100.0),
            claimed: 0.0,
            owner: None,
            building: None,
            occupants: Vec::new(),
            dig_marks: BTreeSet::new(),
            region: NO_REGION,
        }
    }

    /// Ground tiles have no wall left standing on them.
    pub(crate) fn is_ground(&self) -> bool {
        self.fullness <= 0.0
    }

    /// Ground that creatures can stand on without swimming or flying.
    pub(crate) fn is_walkable(&self) -> bool {
        self.is_ground() && !self.kind.is_liquid() && self.kind != TileKind::Empty
    }

    /// Wall made of a material that can be dug at all.
    pub(crate) fn is_diggable_wall(&self) -> bool {
        !self.is_ground() && matches!(self.kind, TileKind::Dirt | TileKind::Gold | TileKind::Claimed)
    }

    pub(crate) fn is_claimed_by(&self, seat: SeatId) -> bool {
        self.kind == TileKind::Claimed && self.owner == Some(seat)
    }
}

const NO_REGION: u32 = 0;

/// Result of a claim attempt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct ClaimOutcome {
    /// The tile changed owner because a hostile claim drove it below zero.
    pub(crate) owner_changed: bool,
    /// The tile became fully claimed.
    pub(crate) completed: bool,
}

impl ClaimOutcome {
    pub(crate) fn changed(self) -> bool {
        self.owner_changed || self.completed
    }
}

/// Fixed-size grid of tiles stored in row-major order.
#[derive(Clone, Debug)]
pub(crate) struct Grid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
    next_region: u32,
}

impl Grid {
    pub(crate) fn new(width: u32, height: u32, kind: TileKind, fullness: f64) -> Self {
        let mut tiles = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                tiles.push(Tile::new(TileCoord::new(x, y), kind, fullness));
            }
        }
        Self {
            width,
            height,
            tiles,
            next_region: NO_REGION + 1,
        }
    }

    pub(crate) fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub(crate) fn len(&self) -> usize {
        self.tiles.len()
    }

    pub(crate) fn index(&self, coord: TileCoord) -> Option<usize> {
        if coord.x() < self.width && coord.y() < self.height {
            let row = usize::try_from(coord.y()).ok()?;
            let column = usize::try_from(coord.x()).ok()?;
            let width = usize::try_from(self.width).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }

    pub(crate) fn contains(&self, coord: TileCoord) -> bool {
        self.index(coord).is_some()
    }

    pub(crate) fn tile(&self, coord: TileCoord) -> Option<&Tile> {
        self.index(coord).map(|index| &self.tiles[index])
    }

    pub(crate) fn tile_mut(&mut self, coord: TileCoord) -> Option<&mut Tile> {
        self.index(coord).map(move |index| &mut self.tiles[index])
    }

    pub(crate) fn tile_at_index(&self, index: usize) -> &Tile {
        &self.tiles[index]
    }

    pub(crate) fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// Overrides the material of a tile during level loading.
    pub(crate) fn set_tile(
        &mut self,
        coord: TileCoord,
        kind: TileKind,
        fullness: f64,
        owner: Option<SeatId>,
    ) {
        if let Some(tile) = self.tile_mut(coord) {
            tile.kind = kind;
            tile.fullness = fullness.clamp(0.0, 100.0);
            tile.owner = owner;
            tile.claimed = if kind == TileKind::Claimed && owner.is_some() {
                1.0
            } else {
                0.0
            };
            if tile.kind == TileKind::Claimed && tile.owner.is_none() {
                tile.kind = TileKind::Dirt;
            }
        }
    }

    /// Cardinal neighbours of a tile that lie inside the grid.
    pub(crate) fn neighbors(&self, coord: TileCoord) -> impl Iterator<Item = TileCoord> {
        neighbors(coord, self.width, self.height)
    }

    /// Removes up to `rate` fullness from the tile and returns the amount removed.
    ///
    /// Tiles that are already ground are left untouched.
    pub(crate) fn dig_out(&mut self, coord: TileCoord, rate: f64) -> f64 {
        let Some(index) = self.index(coord) else {
            return 0.0;
        };

        let tile = &mut self.tiles[index];
        if tile.is_ground() || rate <= 0.0 {
            return 0.0;
        }

        let removed = rate.min(tile.fullness);
        tile.fullness -= removed;
        if tile.fullness <= 0.0 {
            tile.fullness = 0.0;
            tile.dig_marks.clear();
            if tile.kind == TileKind::Claimed {
                tile.kind = TileKind::Dirt;
                tile.owner = None;
                tile.claimed = 0.0;
            }
            self.open_region(index);
        }
        removed
    }

    /// Applies a claim of strength `rate` on behalf of `seat`.
    ///
    /// Allied owners accumulate toward 1.0; everybody else erodes the current
    /// owner's hold and takes the tile over once it drops to zero or below.
    pub(crate) fn claim<F>(
        &mut self,
        coord: TileCoord,
        seat: SeatId,
        rate: f64,
        allied: F,
    ) -> ClaimOutcome
    where
        F: Fn(SeatId, SeatId) -> bool,
    {
        let mut outcome = ClaimOutcome::default();
        let Some(tile) = self.tile_mut(coord) else {
            return outcome;
        };

        let friendly = tile.owner.map_or(false, |owner| allied(owner, seat));
        if friendly {
            tile.claimed += rate;
        } else {
            tile.claimed -= rate;
            if tile.claimed <= 0.0 {
                tile.claimed = -tile.claimed;
                if tile.claimed == 0.0 {
                    tile.claimed = 0.0;
                }
                tile.owner = Some(seat);
                if tile.kind == TileKind::Claimed {
                    tile.kind = TileKind::Dirt;
                }
                outcome.owner_changed = true;
            }
        }

        let owned = tile.owner.map_or(false, |owner| allied(owner, seat));
        if owned && tile.claimed >= 1.0 {
            tile.claimed = 1.0;
            if tile.kind != TileKind::Claimed || tile.owner != Some(seat) {
                outcome.completed = true;
            }
            tile.kind = TileKind::Claimed;
            tile.owner = Some(seat);
        }

        outcome
    }

    /// Reports whether both tiles belong to the same walkable region.
    pub(crate) fn same_region(&self, first: TileCoord, second: TileCoord) -> bool {
        match (self.tile(first), self.tile(second)) {
            (Some(a), Some(b)) => a.region != NO_REGION && a.region == b.region,
            _ => false,
        }
    }

    /// Recomputes every walkable region with a breadth-first flood fill.
    pub(crate) fn rebuild_regions(&mut self) {
        for tile in &mut self.tiles {
            tile.region = NO_REGION;
        }
        self.next_region = NO_REGION + 1;

        let mut queue = VecDeque::new();
        for start in 0..self.tiles.len() {
            if self.tiles[start].region != NO_REGION || !self.tiles[start].is_walkable() {
                continue;
            }

            let region = self.allocate_region();
            self.tiles[start].region = region;
            queue.push_back(start);

            while let Some(current) = queue.pop_front() {
                let coord = self.tiles[current].coord;
                for neighbor in neighbors(coord, self.width, self.height) {
                    let Some(index) = self.index(neighbor) else {
                        continue;
                    };
                    let tile = &mut self.tiles[index];
                    if tile.region != NO_REGION || !tile.is_walkable() {
                        continue;
                    }
                    tile.region = region;
                    queue.push_back(index);
                }
            }
        }
    }

    /// Merges a freshly opened tile into the regions of its neighbours.
    fn open_region(&mut self, index: usize) {
        if !self.tiles[index].is_walkable() {
            return;
        }

        let coord = self.tiles[index].coord;
        let mut touching: Vec<u32> = neighbors(coord, self.width, self.height)
            .filter_map(|neighbor| self.tile(neighbor))
            .map(|tile| tile.region)
            .filter(|region| *region != NO_REGION)
            .collect();
        touching.sort_unstable();
        touching.dedup();

        let Some(&target) = touching.first() else {
            let region = self.allocate_region();
            self.tiles[index].region = region;
            return;
        };

        self.tiles[index].region = target;
        if touching.len() > 1 {
            let merged = &touching[1..];
            for tile in &mut self.tiles {
                if merged.contains(&tile.region) {
                    tile.region = target;
                }
            }
        }
    }

    fn allocate_region(&mut self) -> u32 {
        let region = self.next_region;
        self.next_region = self.next_region.saturating_add(1);
        region
    }
}

pub(crate) fn neighbors(coord: TileCoord, width: u32, height: u32) -> impl Iterator<Item = TileCoord> {
    let mut candidates = [None; 4];
    let mut count = 0;

    if let Some(y) = coord.y().checked_sub(1) {
        candidates[count] = Some(TileCoord::new(coord.x(), y));
        count += 1;
    }

    if let Some(x) = coord.x().checked_add(1) {
        if x < width {
            candidates[count] = Some(TileCoord::new(x, coord.y()));
            count += 1;
        }
    }

    if let Some(y) = coord.y().checked_add(1) {
        if y < height {
            candidates[count] = Some(TileCoord::new(coord.x(), y));
            count += 1;
        }
    }

    if let Some(x) = coord.x().checked_sub(1) {
        candidates[count] = Some(TileCoord::new(x, coord.y()));
        count += 1;
    }

    candidates.into_iter().take(count).flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only_self(a: SeatId, b: SeatId) -> bool {
        a == b
    }

    fn open_grid(width: u32, height: u32) -> Grid {
        let mut grid = Grid::new(width, height, TileKind::Dirt, 0.0);
        grid.rebuild_regions();
        grid
    }

    #[test]
    fn tile_outside_bounds_is_absent() {
        let grid = open_grid(3, 3);
        assert!(grid.tile(TileCoord::new(3, 0)).is_none());
        assert!(grid.tile(TileCoord::new(0, 3)).is_none());
        assert!(grid.tile(TileCoord::new(2, 2)).is_some());
    }

    #[test]
    fn corner_has_two_neighbors() {
        let grid = open_grid(3, 3);
        let corner: Vec<_> = grid.neighbors(TileCoord::new(0, 0)).collect();
        assert_eq!(corner, vec![TileCoord::new(1, 0), TileCoord::new(0, 1)]);
        assert_eq!(grid.neighbors(TileCoord::new(1, 1)).count(), 4);
    }

    #[test]
    fn digging_ground_is_a_no_op() {
        let mut grid = open_grid(2, 2);
        let coord = TileCoord::new(1, 1);
        assert_eq!(grid.dig_out(coord, 10.0), 0.0);
        let tile = grid.tile(coord).expect("tile");
        assert_eq!(tile.fullness, 0.0);
        assert_eq!(tile.kind, TileKind::Dirt);
    }

    #[test]
    fn digging_clamps_at_zero_and_reports_removed_amount() {
        let mut grid = Grid::new(3, 1, TileKind::Dirt, 15.0);
        let coord = TileCoord::new(1, 0);
        assert_eq!(grid.dig_out(coord, 10.0), 10.0);
        assert_eq!(grid.dig_out(coord, 10.0), 5.0);
        assert_eq!(grid.tile(coord).expect("tile").fullness, 0.0);
        assert_eq!(grid.dig_out(coord, 10.0), 0.0);
    }

    #[test]
    fn opening_a_wall_merges_regions() {
        let mut grid = open_grid(3, 1);
        grid.set_tile(TileCoord::new(1, 0), TileKind::Dirt, 20.0, None);
        grid.rebuild_regions();
        assert!(!grid.same_region(TileCoord::new(0, 0), TileCoord::new(2, 0)));

        let _ = grid.dig_out(TileCoord::new(1, 0), 5.0);
        assert!(!grid.same_region(TileCoord::new(0, 0), TileCoord::new(2, 0)));

        let _ = grid.dig_out(TileCoord::new(1, 0), 50.0);
        assert!(grid.same_region(TileCoord::new(0, 0), TileCoord::new(2, 0)));
    }

    #[test]
    fn neutral_tile_claim_progresses_to_completion() {
        let mut grid = open_grid(1, 1);
        let coord = TileCoord::new(0, 0);
        let seat = SeatId::new(1);

        let first = grid.claim(coord, seat, 0.3, only_self);
        assert!(first.owner_changed);
        assert!((grid.tile(coord).expect("tile").claimed - 0.3).abs() < 1e-9);

        let _ = grid.claim(coord, seat, 0.3, only_self);
        assert!((grid.tile(coord).expect("tile").claimed - 0.6).abs() < 1e-9);

        let third = grid.claim(coord, seat, 0.3, only_self);
        assert!(!third.completed);
        let tile = grid.tile(coord).expect("tile");
        assert!((tile.claimed - 0.9).abs() < 1e-9);
        assert_eq!(tile.kind, TileKind::Dirt);

        let fourth = grid.claim(coord, seat, 0.3, only_self);
        assert!(fourth.completed);
        let tile = grid.tile(coord).expect("tile");
        assert_eq!(tile.claimed, 1.0);
        assert_eq!(tile.kind, TileKind::Claimed);
        assert_eq!(tile.owner, Some(seat));
    }

    #[test]
    fn hostile_claim_erodes_then_flips_ownership() {
        let mut grid = open_grid(1, 1);
        let coord = TileCoord::new(0, 0);
        let first = SeatId::new(1);
        let second = SeatId::new(2);
        grid.set_tile(coord, TileKind::Claimed, 0.0, Some(first));

        let outcome = grid.claim(coord, second, 0.4, only_self);
        assert!(!outcome.changed());
        let tile = grid.tile(coord).expect("tile");
        assert_eq!(tile.owner, Some(first));
        assert!((tile.claimed - 0.6).abs() < 1e-9);

        let _ = grid.claim(coord, second, 0.4, only_self);
        let outcome = grid.claim(coord, second, 0.4, only_self);
        assert!(outcome.owner_changed);
        let tile = grid.tile(coord).expect("tile");
        assert_eq!(tile.owner, Some(second));
        assert_eq!(tile.kind, TileKind::Dirt);
        assert!((tile.claimed - 0.2).abs() < 1e-9);
    }

    #[test]
    fn exact_zero_flip_yields_positive_zero() {
        let mut grid = open_grid(1, 1);
        let coord = TileCoord::new(0, 0);
        grid.set_tile(coord, TileKind::Dirt, 0.0, Some(SeatId::new(1)));

        let outcome = grid.claim(coord, SeatId::new(2), 0.0, only_self);
        assert!(outcome.owner_changed);
        let claimed = grid.tile(coord).expect("tile").claimed;
        assert_eq!(claimed, 0.0);
        assert!(claimed.is_sign_positive());
    }

    #[test]
    fn allied_claim_supports_owner() {
        let mut grid = open_grid(1, 1);
        let coord = TileCoord::new(0, 0);
        grid.set_tile(coord, TileKind::Dirt, 0.0, Some(SeatId::new(1)));
        let team = |a: SeatId, b: SeatId| a.get() % 2 == b.get() % 2;

        let _ = grid.claim(coord, SeatId::new(3), 0.5, team);
        let tile = grid.tile(coord).expect("tile");
        assert_eq!(tile.owner, Some(SeatId::new(1)));
        assert!((tile.claimed - 0.5).abs() < 1e-9);
    }
}
