//! Seating players, fixing the turn order and resolving random items.

use std::collections::BTreeSet;

use rand::RngCore;
use rand::seq::SliceRandom;

use crate::state::{GamePhase, Grid, ItemKind, Player, PlayerId, PlayerSpec, Position, TurnPhase};

use super::{ActionError, GameEngine, SetupError};

/// Result of a successful session setup.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SetupOutcome {
    pub turn_order: Vec<PlayerId>,
    /// Home cell of every seated player, in turn order.
    pub homes: Vec<(PlayerId, Position)>,
    /// Random placeholders and the unique item each turned into.
    pub resolved_items: Vec<(Position, ItemKind)>,
}

/// Picks one starting point per player, uniformly without replacement.
///
/// Unused starting points are cleared from the grid; chosen ones keep their
/// marker so the map still shows where players spawned.
pub fn place_starting_positions(
    grid: &mut Grid,
    players: usize,
    rng: &mut dyn RngCore,
) -> Result<Vec<Position>, SetupError> {
    let mut candidates = grid.positions_with(ItemKind::StartingPoint);
    if candidates.len() < players {
        return Err(SetupError::NotEnoughStartingPoints {
            needed: players,
            available: candidates.len(),
        });
    }

    candidates.shuffle(rng);
    let unused = candidates.split_off(players);
    for position in unused {
        grid.set_item(position, None);
    }
    Ok(candidates)
}

/// Orders players by speed, fastest first.
///
/// Players sharing a speed are shuffled among themselves, which gives every
/// ordering within the group the same chance.
pub fn establish_turn_order(
    players: impl IntoIterator<Item = (PlayerId, u32)>,
    rng: &mut dyn RngCore,
) -> Vec<PlayerId> {
    let mut entries: Vec<(PlayerId, u32)> = players.into_iter().collect();
    entries.shuffle(rng);
    // Stable sort keeps the shuffled order inside each speed group.
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.into_iter().map(|(id, _)| id).collect()
}

/// Replaces every random placeholder with a unique item absent from the map.
fn resolve_random_items(grid: &mut Grid, rng: &mut dyn RngCore) -> Vec<(Position, ItemKind)> {
    let mut present: BTreeSet<ItemKind> = grid
        .cells()
        .filter_map(|(_, tile)| tile.item)
        .filter(|item| item.is_unique())
        .collect();

    let mut resolved = Vec::new();
    for position in grid.positions_with(ItemKind::RandomItem) {
        let available: Vec<ItemKind> = ItemKind::UNIQUE
            .iter()
            .copied()
            .filter(|item| !present.contains(item))
            .collect();
        match available.choose(rng) {
            Some(item) => {
                grid.set_item(position, Some(*item));
                present.insert(*item);
                resolved.push((position, *item));
            }
            None => {
                grid.set_item(position, None);
            }
        }
    }
    resolved
}

impl<'a> GameEngine<'a> {
    /// Seats the roster and starts the session.
    ///
    /// Validates the roster before touching the grid, so a failed setup leaves
    /// the instance in its `Setup` phase and can be retried.
    pub fn setup(&mut self, roster: Vec<PlayerSpec>) -> Result<SetupOutcome, ActionError> {
        if self.instance.phase != GamePhase::Setup {
            return Err(SetupError::AlreadyStarted.into());
        }
        if roster.is_empty() {
            return Err(SetupError::NoPlayers.into());
        }
        let mut seen = BTreeSet::new();
        for spec in &roster {
            if !seen.insert(spec.id) {
                return Err(SetupError::DuplicatePlayer(spec.id).into());
            }
        }

        let homes = place_starting_positions(&mut self.instance.grid, roster.len(), self.rng)?;
        let resolved_items = resolve_random_items(&mut self.instance.grid, self.rng);

        let order = establish_turn_order(
            roster.iter().map(|spec| (spec.id, spec.attributes.speed)),
            self.rng,
        );

        let mut seated = Vec::with_capacity(roster.len());
        for (spec, home) in roster.into_iter().zip(homes) {
            let id = spec.id;
            self.instance.seat(Player::from_spec(spec, home), home);
            seated.push((id, home));
        }
        seated.sort_by_key(|(id, _)| order.iter().position(|entry| entry == id));

        self.instance.set_turn_order(order.clone());
        self.instance.turn_phase = TurnPhase::AwaitingStart;
        self.instance.phase = GamePhase::Playing;

        tracing::info!(
            target: "game_core::engine",
            room = %self.instance.room_id,
            players = order.len(),
            first = ?order.first(),
            "session set up"
        );

        Ok(SetupOutcome {
            turn_order: order,
            homes: seated,
            resolved_items,
        })
    }
}
