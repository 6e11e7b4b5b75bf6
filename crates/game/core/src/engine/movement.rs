//! Path planning and step-by-step move replay.
//!
//! A move is planned once with [`GameEngine::plan_move`] and then replayed
//! one cell at a time with [`GameEngine::step`], so the room worker can pace
//! the replay. [`GameEngine::move_to`] runs the whole replay at once.

use crate::pathfinding::{ReachableSet, reachable_set, shortest_path};
use crate::rng::roll_percent;
use crate::state::{ItemKind, PlayerId, Position};

use super::{ActionError, GameEngine, GameOver, GameOverReason, MoveError, PickupOutcome};

/// Effect of entering one cell.
#[derive(Clone, Debug, PartialEq)]
pub struct StepOutcome {
    pub player: PlayerId,
    pub position: Position,
    pub remaining_budget: u32,
    /// The player slipped on ice; the move ends here.
    pub slipped: bool,
    pub pickup: Option<PickupOutcome>,
    pub game_over: Option<GameOver>,
}

impl StepOutcome {
    /// True when the rest of the planned path must be dropped.
    pub fn halts(&self) -> bool {
        self.slipped
            || self.game_over.is_some()
            || matches!(self.pickup, Some(PickupOutcome::InventoryFull { .. }))
    }
}

/// State after a move has finished.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveSummary {
    pub player: PlayerId,
    pub position: Position,
    pub remaining_budget: u32,
    pub slipped: bool,
    pub available: ReachableSet,
}

/// Complete result of [`GameEngine::move_to`].
#[derive(Clone, Debug, PartialEq)]
pub struct MoveOutcome {
    pub steps: Vec<StepOutcome>,
    pub summary: MoveSummary,
}

impl MoveOutcome {
    pub fn game_over(&self) -> Option<&GameOver> {
        self.steps.iter().find_map(|step| step.game_over.as_ref())
    }
}

/// A debug relocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Teleport {
    pub player: PlayerId,
    pub from: Position,
    pub to: Position,
}

impl<'a> GameEngine<'a> {
    /// Cells to enter, in order, to reach `end` within the remaining budget.
    pub fn plan_move(&self, player: PlayerId, end: Position) -> Result<Vec<Position>, ActionError> {
        self.require_acting(player)?;
        self.require_no_pending_pickup(player)?;
        if self.instance.in_combat() {
            return Err(ActionError::CombatInProgress);
        }

        let start = self
            .instance
            .position_of(player)
            .ok_or(ActionError::UnknownPlayer(player))?;
        let result = shortest_path(self.instance.movement_budget, &self.instance.grid, start, end);
        if result.is_empty() {
            return Err(MoveError::Unreachable { from: start, to: end }.into());
        }
        Ok(result.path.into_iter().skip(1).collect())
    }

    /// Enters the orthogonally adjacent cell `next`.
    ///
    /// Applies in order: the slip roll on ice, the terrain cost, the
    /// relocation, the item pickup and the objective check.
    pub fn step(&mut self, player: PlayerId, next: Position) -> Result<StepOutcome, ActionError> {
        self.require_acting(player)?;
        self.require_no_pending_pickup(player)?;
        if self.instance.in_combat() {
            return Err(ActionError::CombatInProgress);
        }

        let from = self
            .instance
            .position_of(player)
            .ok_or(ActionError::UnknownPlayer(player))?;
        if !from.is_adjacent(next) {
            return Err(MoveError::NotAdjacent { from, to: next }.into());
        }
        let tile = self
            .instance
            .grid
            .tile(next)
            .ok_or(MoveError::Blocked(next))?;
        let cost = match tile.kind.movement_cost() {
            Some(cost) if !tile.is_occupied() => cost,
            _ => return Err(MoveError::Blocked(next).into()),
        };
        let budget = self.instance.movement_budget;
        if cost > budget {
            return Err(MoveError::OverBudget {
                position: next,
                cost,
                budget,
            }
            .into());
        }

        let kind = tile.kind;
        let slipped = kind.is_slippery() && roll_percent(self.rng, self.config.slip_chance);
        self.instance.movement_budget = if slipped { 0 } else { budget - cost };
        self.instance.relocate(player, next);

        let pickup = match self.instance.grid.item(next) {
            Some(item) if item.is_collectible() => Some(self.collect_item(player, next, item)),
            _ => None,
        };
        let game_over = self.check_objective(player);

        tracing::trace!(
            target: "game_core::engine",
            room = %self.instance.room_id,
            %player,
            position = %next,
            remaining = self.instance.movement_budget,
            slipped,
            "step"
        );

        Ok(StepOutcome {
            player,
            position: next,
            remaining_budget: self.instance.movement_budget,
            slipped,
            pickup,
            game_over,
        })
    }

    /// Summarizes the player's situation once a move is over.
    pub fn finish_move(&self, player: PlayerId, slipped: bool) -> Result<MoveSummary, ActionError> {
        self.require_player(player)?;
        let position = self
            .instance
            .position_of(player)
            .ok_or(ActionError::UnknownPlayer(player))?;
        let remaining_budget = self.instance.movement_budget;
        Ok(MoveSummary {
            player,
            position,
            remaining_budget,
            slipped,
            available: reachable_set(remaining_budget, &self.instance.grid, position),
        })
    }

    /// Plans and replays a whole move without pacing.
    pub fn move_to(&mut self, player: PlayerId, end: Position) -> Result<MoveOutcome, ActionError> {
        let path = self.plan_move(player, end)?;
        let mut steps = Vec::with_capacity(path.len());
        let mut slipped = false;
        for next in path {
            let step = self.step(player, next)?;
            let halts = step.halts();
            slipped |= step.slipped;
            steps.push(step);
            if halts {
                break;
            }
        }
        let summary = self.finish_move(player, slipped)?;
        Ok(MoveOutcome { steps, summary })
    }

    /// Moves a player anywhere legal, ignoring turn and budget. Debug only.
    pub fn teleport(&mut self, player: PlayerId, to: Position) -> Result<Teleport, ActionError> {
        if !self.instance.debug {
            return Err(MoveError::DebugDisabled.into());
        }
        self.require_playing()?;
        self.require_player(player)?;
        if !self.instance.grid.is_free(to) {
            return Err(MoveError::Blocked(to).into());
        }
        let from = self
            .instance
            .position_of(player)
            .ok_or(ActionError::UnknownPlayer(player))?;
        self.instance.relocate(player, to);

        tracing::debug!(
            target: "game_core::engine",
            room = %self.instance.room_id,
            %player,
            %from,
            %to,
            "teleported"
        );
        Ok(Teleport { player, from, to })
    }

    /// Flips the room's debug flag, returning the new value.
    pub fn toggle_debug(&mut self) -> bool {
        self.instance.debug = !self.instance.debug;
        self.instance.debug
    }

    /// Ends the session if the player carries the objective flag on its home cell.
    pub(super) fn check_objective(&mut self, player: PlayerId) -> Option<GameOver> {
        let coord = self.instance.coord(player)?;
        let at_home = coord.position == coord.player.home;
        if at_home && coord.player.inventory.contains(ItemKind::FlagA) {
            return Some(self.finish(Some(player), GameOverReason::Objective));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::engine::test_support::{Fixture, attrs};

    fn walker(layout: &str, speed: u32) -> Fixture {
        let mut fixture = Fixture::new(
            layout,
            &[
                (1, Position::new(0, 0), attrs(4, 4, 4, speed)),
                (2, Position::new(4, 1), attrs(4, 4, 4, 1)),
            ],
        );
        fixture.start();
        fixture
    }

    #[test]
    fn move_spends_terrain_cost() {
        let mut fixture = walker(
            "
            .~...
            .....
            ",
            4,
        );

        let outcome = fixture.engine().move_to(PlayerId(1), Position::new(3, 0)).unwrap();

        assert_eq!(outcome.steps.len(), 3);
        assert_eq!(outcome.summary.position, Position::new(3, 0));
        assert_eq!(outcome.summary.remaining_budget, 0);
        assert!(!outcome.summary.slipped);
        assert_eq!(fixture.instance.player_at(Position::new(3, 0)), Some(PlayerId(1)));
        assert!(fixture.instance.grid.is_free(Position::new(0, 0)));
    }

    #[test]
    fn unaffordable_target_is_rejected_without_changes() {
        let mut fixture = walker(
            "
            .....
            .....
            ",
            2,
        );
        let error = fixture
            .engine()
            .move_to(PlayerId(1), Position::new(4, 0))
            .unwrap_err();

        assert!(matches!(error, ActionError::Move(MoveError::Unreachable { .. })));
        assert_eq!(fixture.instance.position_of(PlayerId(1)), Some(Position::new(0, 0)));
        assert_eq!(fixture.instance.movement_budget, 2);
    }

    #[test]
    fn non_holder_move_is_an_ownership_violation() {
        let mut fixture = walker(".....\n.....", 3);
        let error = fixture
            .engine()
            .move_to(PlayerId(2), Position::new(3, 1))
            .unwrap_err();
        assert!(error.is_ownership_violation());
        assert_eq!(fixture.instance.position_of(PlayerId(2)), Some(Position::new(4, 1)));
    }

    #[test]
    fn pickup_with_room_grows_inventory_and_clears_cell() {
        let mut fixture = walker(".w...\n.....", 3);

        let outcome = fixture.engine().move_to(PlayerId(1), Position::new(2, 0)).unwrap();

        let player = fixture.instance.player(PlayerId(1)).unwrap();
        assert_eq!(player.inventory.items(), &[ItemKind::Sword]);
        assert_eq!(fixture.instance.grid.item(Position::new(1, 0)), None);
        assert_eq!(outcome.steps.len(), 2);
        assert!(player.stats.items_collected.contains(&ItemKind::Sword));
    }

    #[test]
    fn full_inventory_stops_move_on_item() {
        let mut fixture = walker(".w...\n.....", 3);
        {
            let inventory = &mut fixture.instance.player_mut(PlayerId(1)).unwrap().inventory;
            inventory.push(ItemKind::Shield).unwrap();
            inventory.push(ItemKind::Boots).unwrap();
        }

        let outcome = fixture.engine().move_to(PlayerId(1), Position::new(3, 0)).unwrap();

        let player = fixture.instance.player(PlayerId(1)).unwrap();
        assert_eq!(player.inventory.items(), &[ItemKind::Shield, ItemKind::Boots]);
        assert_eq!(fixture.instance.grid.item(Position::new(1, 0)), Some(ItemKind::Sword));
        assert_eq!(outcome.summary.position, Position::new(1, 0));
        assert!(fixture.instance.pending_pickup.is_some());

        let error = fixture
            .engine()
            .move_to(PlayerId(1), Position::new(2, 0))
            .unwrap_err();
        assert_eq!(error, ActionError::PickupPending(PlayerId(1)));
    }

    #[test]
    fn certain_slip_zeroes_budget_on_ice() {
        let mut fixture = walker(".*...\n.....", 4);
        fixture.config = GameConfig {
            slip_chance: 100,
            ..GameConfig::deterministic()
        };

        let outcome = fixture.engine().move_to(PlayerId(1), Position::new(3, 0)).unwrap();

        assert_eq!(outcome.steps.len(), 1);
        assert!(outcome.summary.slipped);
        assert_eq!(outcome.summary.position, Position::new(1, 0));
        assert_eq!(outcome.summary.remaining_budget, 0);
        assert!(outcome.summary.available.is_empty());
    }

    #[test]
    fn carrying_flag_home_wins() {
        let mut fixture = walker(".F...\n.....", 4);

        fixture.engine().move_to(PlayerId(1), Position::new(1, 0)).unwrap();
        let outcome = fixture.engine().move_to(PlayerId(1), Position::new(0, 0)).unwrap();

        let game_over = outcome.game_over().unwrap();
        assert_eq!(game_over.winner, Some(PlayerId(1)));
        assert_eq!(game_over.reason, GameOverReason::Objective);
        assert_eq!(game_over.statistics.flag_holders, 1);
    }

    #[test]
    fn teleport_requires_debug_and_a_free_cell() {
        let mut fixture = walker(".....\n.#...", 1);

        let error = fixture
            .engine()
            .teleport(PlayerId(2), Position::new(3, 0))
            .unwrap_err();
        assert_eq!(error, ActionError::Move(MoveError::DebugDisabled));

        assert!(fixture.engine().toggle_debug());
        let error = fixture
            .engine()
            .teleport(PlayerId(2), Position::new(1, 1))
            .unwrap_err();
        assert_eq!(error, ActionError::Move(MoveError::Blocked(Position::new(1, 1))));

        // Out of turn and beyond any budget.
        let teleport = fixture.engine().teleport(PlayerId(2), Position::new(3, 0)).unwrap();
        assert_eq!(teleport.from, Position::new(4, 1));
        assert_eq!(fixture.instance.player_at(Position::new(3, 0)), Some(PlayerId(2)));
    }
}
