//! Outward ring search for free cells around a position.

use crate::state::{Grid, Position, Tile};

/// Cells at Chebyshev distance `radius` from `origin`, clockwise from the top-left corner.
fn ring(origin: Position, radius: i32) -> Vec<Position> {
    if radius == 0 {
        return vec![origin];
    }
    let mut cells = Vec::with_capacity(8 * radius as usize);
    for dx in -radius..radius {
        cells.push(origin.offset(dx, -radius));
    }
    for dy in -radius..radius {
        cells.push(origin.offset(radius, dy));
    }
    for dx in (-radius + 1..=radius).rev() {
        cells.push(origin.offset(dx, radius));
    }
    for dy in (-radius + 1..=radius).rev() {
        cells.push(origin.offset(-radius, dy));
    }
    cells
}

/// Finds up to `count` distinct cells accepted by `accept`, nearest rings first.
///
/// Rings grow until they cover the whole grid, so a shorter result means the
/// grid has no further acceptable cell.
pub fn find_free_cells(
    grid: &Grid,
    origin: Position,
    count: usize,
    accept: impl Fn(&Tile) -> bool,
) -> Vec<Position> {
    let mut found = Vec::with_capacity(count);
    if count == 0 {
        return found;
    }

    let max_radius = grid.width().max(grid.height()) as i32;
    for radius in 0..=max_radius {
        for position in ring(origin, radius) {
            if grid.tile(position).is_some_and(&accept) {
                found.push(position);
                if found.len() == count {
                    return found;
                }
            }
        }
    }
    found
}
