//! A* path search over the tile grid.

use std::{cmp::Reverse, collections::BinaryHeap};

use opendungeons_core::TileCoord;

use crate::grid::{Grid, Tile};

/// Searches the shortest 4-directional path from `start` to `goal`.
///
/// The returned path contains both endpoints. An empty path is returned when
/// either endpoint lies outside the grid or when the goal cannot be reached.
/// Neighbours are admitted through `passable`; the start tile itself is never
/// tested so creatures can always leave the tile they stand on. Nodes sharing
/// the lowest estimate are expanded in insertion order which keeps the result
/// reproducible.
pub(crate) fn find_path<F>(
    grid: &Grid,
    start: TileCoord,
    goal: TileCoord,
    mut passable: F,
) -> Vec<TileCoord>
where
    F: FnMut(&Tile) -> bool,
{
    let (Some(start_index), Some(goal_index)) = (grid.index(start), grid.index(goal)) else {
        return Vec::new();
    };

    if start_index == goal_index {
        return vec![start];
    }

    if !passable(grid.tile_at_index(goal_index)) {
        return Vec::new();
    }

    let count = grid.len();
    let mut cost = vec![u32::MAX; count];
    let mut came_from: Vec<Option<usize>> = vec![None; count];
    let mut closed = vec![false; count];
    let mut open = BinaryHeap::new();
    let mut sequence: u64 = 0;

    cost[start_index] = 0;
    open.push(Reverse((start.manhattan_distance(goal), sequence, start_index)));

    while let Some(Reverse((_, _, current))) = open.pop() {
        if closed[current] {
            continue;
        }
        closed[current] = true;

        if current == goal_index {
            return reconstruct(grid, &came_from, goal_index);
        }

        let coord = grid.tile_at_index(current).coord;
        let next_cost = cost[current].saturating_add(1);
        for neighbor in grid.neighbors(coord) {
            let Some(index) = grid.index(neighbor) else {
                continue;
            };
            if closed[index] || next_cost >= cost[index] {
                continue;
            }
            if !passable(grid.tile_at_index(index)) {
                continue;
            }

            cost[index] = next_cost;
            came_from[index] = Some(current);
            sequence = sequence.saturating_add(1);
            let estimate = next_cost.saturating_add(neighbor.manhattan_distance(goal));
            open.push(Reverse((estimate, sequence, index)));
        }
    }

    Vec::new()
}

fn reconstruct(grid: &Grid, came_from: &[Option<usize>], goal_index: usize) -> Vec<TileCoord> {
    let mut path = vec![grid.tile_at_index(goal_index).coord];
    let mut cursor = goal_index;
    while let Some(previous) = came_from[cursor] {
        path.push(grid.tile_at_index(previous).coord);
        cursor = previous;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use opendungeons_core::TileKind;
    use proptest::prelude::*;

    use super::*;

    fn walkable(tile: &Tile) -> bool {
        tile.is_walkable()
    }

    fn grid_from_walls(width: u32, height: u32, walls: &[bool]) -> Grid {
        let mut grid = Grid::new(width, height, TileKind::Dirt, 0.0);
        for y in 0..height {
            for x in 0..width {
                let index = (y * width + x) as usize;
                if walls.get(index).copied().unwrap_or(false) {
                    grid.set_tile(TileCoord::new(x, y), TileKind::Rock, 100.0, None);
                }
            }
        }
        grid
    }

    fn bfs_distance(grid: &Grid, start: TileCoord, goal: TileCoord) -> Option<usize> {
        let mut distances = vec![usize::MAX; grid.len()];
        let start_index = grid.index(start)?;
        distances[start_index] = 0;
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            let distance = distances[grid.index(current)?];
            if current == goal {
                return Some(distance);
            }
            for neighbor in grid.neighbors(current) {
                let index = grid.index(neighbor)?;
                if distances[index] == usize::MAX && grid.tile_at_index(index).is_walkable() {
                    distances[index] = distance + 1;
                    queue.push_back(neighbor);
                }
            }
        }
        None
    }

    #[test]
    fn path_includes_both_endpoints() {
        let grid = grid_from_walls(5, 1, &[]);
        let path = find_path(&grid, TileCoord::new(0, 0), TileCoord::new(4, 0), walkable);
        assert_eq!(path.first(), Some(&TileCoord::new(0, 0)));
        assert_eq!(path.last(), Some(&TileCoord::new(4, 0)));
        assert_eq!(path.len(), 5);
    }

    #[test]
    fn path_detours_around_walls() {
        #[rustfmt::skip]
        let walls = [
            false, true,  false,
            false, true,  false,
            false, false, false,
        ];
        let grid = grid_from_walls(3, 3, &walls);
        let path = find_path(&grid, TileCoord::new(0, 0), TileCoord::new(2, 0), walkable);
        assert_eq!(path.len(), 7);
        for pair in path.windows(2) {
            assert!(pair[0].is_adjacent(pair[1]));
        }
    }

    #[test]
    fn out_of_bounds_endpoints_yield_empty_path() {
        let grid = grid_from_walls(3, 3, &[]);
        assert!(find_path(&grid, TileCoord::new(0, 0), TileCoord::new(9, 9), walkable).is_empty());
        assert!(find_path(&grid, TileCoord::new(9, 9), TileCoord::new(0, 0), walkable).is_empty());
    }

    #[test]
    fn enclosed_goal_is_unreachable() {
        #[rustfmt::skip]
        let walls = [
            false, true,  false,
            true,  true,  false,
            false, false, false,
        ];
        let grid = grid_from_walls(3, 3, &walls);
        assert!(find_path(&grid, TileCoord::new(2, 2), TileCoord::new(0, 0), walkable).is_empty());
    }

    #[test]
    fn repeated_searches_return_identical_paths() {
        let grid = grid_from_walls(6, 6, &[]);
        let first = find_path(&grid, TileCoord::new(0, 0), TileCoord::new(5, 5), walkable);
        let second = find_path(&grid, TileCoord::new(0, 0), TileCoord::new(5, 5), walkable);
        assert_eq!(first, second);
    }

    proptest! {
        #[test]
        fn path_length_matches_breadth_first_distance(
            walls in proptest::collection::vec(prop::bool::weighted(0.3), 64),
            start in 0usize..64,
            goal in 0usize..64,
        ) {
            let grid = grid_from_walls(8, 8, &walls);
            let start = TileCoord::new((start % 8) as u32, (start / 8) as u32);
            let goal = TileCoord::new((goal % 8) as u32, (goal / 8) as u32);
            prop_assume!(grid.tile(start).map_or(false, Tile::is_walkable));

            let path = find_path(&grid, start, goal, walkable);
            match bfs_distance(&grid, start, goal) {
                Some(distance) => prop_assert_eq!(path.len(), distance + 1),
                None => prop_assert!(path.is_empty()),
            }
        }
    }
}
