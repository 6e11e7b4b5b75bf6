//! Budget-bounded path search over the grid.
//!
//! Uniform-cost expansion over the four orthogonal neighbours. A cell can be
//! entered when it is in bounds, walkable (not a wall or closed door) and
//! unoccupied; entering costs the terrain's movement cost. Branches whose
//! accumulated cost exceeds the budget are dropped and every cell is settled
//! at most once, so zero-cost terrain cannot loop.
//!
//! Frontier ties are broken by lowest cost first, then by insertion order.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::state::{Grid, Position, TileKind};

/// Every affordable destination mapped to the full path (start..=end) reaching it.
pub type ReachableSet = HashMap<Position, Vec<Position>>;

/// Cheapest path between two cells; empty with zero cost when unreachable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathResult {
    pub path: Vec<Position>,
    pub cost: u32,
}

impl PathResult {
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}

/// Planning switches for the search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PathOptions {
    /// Treat closed doors as open ones (entered at open-door cost).
    pub doors_passable: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FrontierEntry {
    cost: u32,
    sequence: u64,
    position: Position,
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the cheapest, oldest entry pops first.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct SearchTree {
    start: Position,
    /// Settled cells with their cost and predecessor, in settlement order.
    settled: Vec<(Position, u32)>,
    came_from: HashMap<Position, Position>,
    costs: HashMap<Position, u32>,
}

impl SearchTree {
    fn path_to(&self, end: Position) -> Vec<Position> {
        let mut path = vec![end];
        let mut cursor = end;
        while let Some(previous) = self.came_from.get(&cursor) {
            path.push(*previous);
            cursor = *previous;
        }
        path.reverse();
        path
    }
}

fn entry_cost(grid: &Grid, position: Position, options: PathOptions) -> Option<u32> {
    let tile = grid.tile(position)?;
    if tile.is_occupied() {
        return None;
    }
    match tile.kind {
        TileKind::DoorClosed if options.doors_passable => TileKind::DoorOpen.movement_cost(),
        kind => kind.movement_cost(),
    }
}

fn search(
    budget: u32,
    grid: &Grid,
    start: Position,
    target: Option<Position>,
    options: PathOptions,
) -> SearchTree {
    let mut tree = SearchTree {
        start,
        settled: Vec::new(),
        came_from: HashMap::new(),
        costs: HashMap::new(),
    };
    if !grid.contains(start) {
        return tree;
    }

    let mut frontier = BinaryHeap::new();
    let mut finalized = HashSet::new();
    let mut sequence = 0u64;

    tree.costs.insert(start, 0);
    frontier.push(FrontierEntry {
        cost: 0,
        sequence,
        position: start,
    });

    while let Some(FrontierEntry { cost, position, .. }) = frontier.pop() {
        if !finalized.insert(position) {
            continue;
        }
        tree.settled.push((position, cost));
        if target == Some(position) {
            break;
        }

        for neighbor in position.neighbors() {
            if finalized.contains(&neighbor) {
                continue;
            }
            let Some(step) = entry_cost(grid, neighbor, options) else {
                continue;
            };
            let next_cost = cost + step;
            if next_cost > budget {
                continue;
            }
            if tree
                .costs
                .get(&neighbor)
                .is_some_and(|known| *known <= next_cost)
            {
                continue;
            }
            tree.costs.insert(neighbor, next_cost);
            tree.came_from.insert(neighbor, position);
            sequence += 1;
            frontier.push(FrontierEntry {
                cost: next_cost,
                sequence,
                position: neighbor,
            });
        }
    }

    tree
}

/// All destinations affordable within `budget` from `start`, each with its path.
///
/// The start cell itself is not a destination.
pub fn reachable_set(budget: u32, grid: &Grid, start: Position) -> ReachableSet {
    reachable_set_with(budget, grid, start, PathOptions::default())
}

/// [`reachable_set`] with planning options.
pub fn reachable_set_with(
    budget: u32,
    grid: &Grid,
    start: Position,
    options: PathOptions,
) -> ReachableSet {
    let tree = search(budget, grid, start, None, options);
    tree.settled
        .iter()
        .filter(|(position, _)| *position != tree.start)
        .map(|(position, _)| (*position, tree.path_to(*position)))
        .collect()
}

/// Cheapest path from `start` to `end` costing at most `budget`.
pub fn shortest_path(budget: u32, grid: &Grid, start: Position, end: Position) -> PathResult {
    shortest_path_with(budget, grid, start, end, PathOptions::default())
}

/// [`shortest_path`] with planning options.
pub fn shortest_path_with(
    budget: u32,
    grid: &Grid,
    start: Position,
    end: Position,
    options: PathOptions,
) -> PathResult {
    if start == end {
        return PathResult::default();
    }
    let tree = search(budget, grid, start, Some(end), options);
    match tree.settled.last() {
        Some((position, cost)) if *position == end => PathResult {
            path: tree.path_to(end),
            cost: *cost,
        },
        _ => PathResult::default(),
    }
}

/// Sum of entry costs along `path`, skipping the start cell.
pub fn path_cost(grid: &Grid, path: &[Position]) -> Option<u32> {
    path.iter().skip(1).try_fold(0u32, |total, position| {
        let kind = grid.kind(*position)?;
        Some(total + kind.movement_cost()?)
    })
}
