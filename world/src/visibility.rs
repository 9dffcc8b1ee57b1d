//! Occlusion-aware line of sight.

use opendungeons_core::TileCoord;

use crate::grid::Grid;

/// Collects every tile visible from `origin` within `radius` tiles.
///
/// A tile is visible when it lies within the Euclidean radius and every tile
/// strictly between it and the origin is ground. Walls therefore show up at
/// the edge of what a creature sees but hide what lies behind them. Tiles are
/// reported in row-major order.
pub(crate) fn visible_tiles(grid: &Grid, origin: TileCoord, radius: u32) -> Vec<TileCoord> {
    if !grid.contains(origin) {
        return Vec::new();
    }

    let (width, height) = grid.dimensions();
    let radius_squared = u64::from(radius) * u64::from(radius);
    let min_x = origin.x().saturating_sub(radius);
    let min_y = origin.y().saturating_sub(radius);
    let max_x = origin.x().saturating_add(radius).min(width.saturating_sub(1));
    let max_y = origin.y().saturating_add(radius).min(height.saturating_sub(1));

    let mut visible = Vec::new();
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let target = TileCoord::new(x, y);
            if origin.distance_squared(target) > radius_squared {
                continue;
            }
            if line_is_clear(grid, origin, target) {
                visible.push(target);
            }
        }
    }
    visible
}

/// Walks the Bresenham line between two tiles and checks the tiles in between.
pub(crate) fn line_is_clear(grid: &Grid, from: TileCoord, to: TileCoord) -> bool {
    let (mut x, mut y) = (i64::from(from.x()), i64::from(from.y()));
    let (end_x, end_y) = (i64::from(to.x()), i64::from(to.y()));
    let dx = (end_x - x).abs();
    let dy = -(end_y - y).abs();
    let step_x = if x < end_x { 1 } else { -1 };
    let step_y = if y < end_y { 1 } else { -1 };
    let mut error = dx + dy;

    loop {
        if x == end_x && y == end_y {
            return true;
        }

        let doubled = 2 * error;
        if doubled >= dy {
            error += dy;
            x += step_x;
        }
        if doubled <= dx {
            error += dx;
            y += step_y;
        }

        if x == end_x && y == end_y {
            return true;
        }

        let (Ok(column), Ok(row)) = (u32::try_from(x), u32::try_from(y)) else {
            return false;
        };
        match grid.tile(TileCoord::new(column, row)) {
            Some(tile) if tile.is_ground() => {}
            _ => return false,
        }
    }
}
