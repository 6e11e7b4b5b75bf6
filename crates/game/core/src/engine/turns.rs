//! Turn sequencing, quitting and clock handling.

use crate::pathfinding::{ReachableSet, reachable_set};
use crate::state::{PlayerId, Position, TurnPhase};

use super::{ActionError, GameEngine, GameOver};

/// Budget and options handed to a player whose turn just started.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnStart {
    pub player: PlayerId,
    pub budget: u32,
    pub action_points: u32,
    pub reachable: ReachableSet,
}

/// Result of ending a turn.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnChange {
    pub previous: PlayerId,
    /// Set when the previous holder left the session with its turn.
    pub removed: Option<PlayerId>,
    /// Items a removed holder carried and where they landed.
    pub dropped: Vec<(crate::state::ItemKind, Position)>,
    pub next: Option<PlayerId>,
    pub game_over: Option<GameOver>,
}

/// Result of a player leaving the session.
#[derive(Clone, Debug, PartialEq)]
pub struct QuitOutcome {
    pub player: PlayerId,
    /// Fighters of the engagement that was cancelled by the departure.
    pub ended_combat: Option<[PlayerId; 2]>,
    /// Items the player carried and where they landed.
    pub dropped: Vec<(crate::state::ItemKind, Position)>,
    /// New turn holder when the leaving player held the turn.
    pub next: Option<PlayerId>,
    pub game_over: Option<GameOver>,
}

/// A clock that ran out during [`GameEngine::tick_clocks`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockExpiry {
    /// The turn holder ran out of time.
    Turn(PlayerId),
    /// The fighter expected to act ran out of time.
    Combat(PlayerId),
}

impl<'a> GameEngine<'a> {
    /// Starts the holder's turn: budget from speed, one action point, fresh clock.
    pub fn start_turn(&mut self, player: PlayerId) -> Result<TurnStart, ActionError> {
        self.require_turn_holder(player)?;
        if self.instance.turn_phase == TurnPhase::Acting {
            return Err(ActionError::TurnAlreadyStarted(player));
        }

        let (speed, position) = {
            let coord = self
                .instance
                .coord(player)
                .ok_or(ActionError::UnknownPlayer(player))?;
            (coord.player.effective_attributes().speed, coord.position)
        };

        let instance = &mut *self.instance;
        instance.turn_phase = TurnPhase::Acting;
        instance.movement_budget = speed;
        instance.action_points = crate::config::GameConfig::ACTION_POINTS_PER_TURN;
        instance.turn_clock.restart();
        instance.statistics.turns += 1;

        tracing::debug!(
            target: "game_core::engine",
            room = %instance.room_id,
            %player,
            budget = speed,
            "turn started"
        );

        Ok(TurnStart {
            player,
            budget: speed,
            action_points: instance.action_points,
            reachable: reachable_set(speed, &instance.grid, position),
        })
    }

    /// Ends the holder's turn; a final end removes the holder from the session.
    ///
    /// A pending pickup is abandoned and the item stays on its cell.
    pub fn end_turn(
        &mut self,
        player: PlayerId,
        is_final: bool,
    ) -> Result<TurnChange, ActionError> {
        self.require_turn_holder(player)?;
        if self.instance.in_combat() {
            return Err(ActionError::CombatInProgress);
        }

        self.instance.pending_pickup = None;
        self.reset_turn_resources();

        let (removed, dropped, next) = if is_final {
            let dropped = self.depart(player);
            (Some(player), dropped, self.instance.current_player())
        } else {
            (None, Vec::new(), self.instance.advance_turn())
        };

        tracing::debug!(
            target: "game_core::engine",
            room = %self.instance.room_id,
            previous = %player,
            next = ?next,
            is_final,
            "turn ended"
        );

        let game_over = self.check_last_player_standing();
        Ok(TurnChange {
            previous: player,
            removed,
            dropped,
            next,
            game_over,
        })
    }

    /// Removes a player from the session whether or not it holds the turn.
    pub fn quit(&mut self, player: PlayerId) -> Result<QuitOutcome, ActionError> {
        self.require_playing()?;
        self.require_player(player)?;

        let fighting = self
            .instance
            .combat
            .as_ref()
            .is_some_and(|combat| combat.involves(player));
        let ended_combat = fighting.then(|| self.finish_combat());

        let held_turn = self.instance.is_turn_holder(player);
        if held_turn {
            self.reset_turn_resources();
        }
        let dropped = self.depart(player);
        let next = if held_turn {
            self.instance.current_player()
        } else {
            None
        };

        tracing::info!(
            target: "game_core::engine",
            room = %self.instance.room_id,
            %player,
            held_turn,
            remaining = self.instance.player_count(),
            "player left"
        );

        let game_over = self.check_last_player_standing();
        Ok(QuitOutcome {
            player,
            ended_combat,
            dropped,
            next,
            game_over,
        })
    }

    /// Destinations the player could reach with `budget` from its cell.
    pub fn available_moves(
        &self,
        player: PlayerId,
        budget: u32,
    ) -> Result<ReachableSet, ActionError> {
        self.require_turn_holder(player)?;
        let position = self
            .instance
            .position_of(player)
            .ok_or(ActionError::UnknownPlayer(player))?;
        Ok(reachable_set(budget, &self.instance.grid, position))
    }

    /// Advances the running clock by one second.
    ///
    /// Only one clock runs at a time: an engagement pauses the turn clock.
    pub fn tick_clocks(&mut self) -> Option<ClockExpiry> {
        if !self.instance.is_playing() {
            return None;
        }
        if let Some(combat) = &self.instance.combat {
            let fighter = combat.current_fighter();
            if self.instance.combat_clock.tick() {
                return Some(ClockExpiry::Combat(fighter));
            }
        }
        let holder = self.instance.current_player()?;
        if self.instance.turn_clock.tick() {
            return Some(ClockExpiry::Turn(holder));
        }
        None
    }

    fn reset_turn_resources(&mut self) {
        let instance = &mut *self.instance;
        instance.movement_budget = 0;
        instance.action_points = 0;
        instance.turn_clock.reset();
        instance.turn_clock.pause();
    }

    /// Takes a player off the board, dropping what it carried around its cell.
    fn depart(&mut self, player: PlayerId) -> Vec<(crate::state::ItemKind, Position)> {
        let Some(position) = self.instance.position_of(player) else {
            return Vec::new();
        };
        let items = self
            .instance
            .player_mut(player)
            .map(|p| p.inventory.take_all())
            .unwrap_or_default();
        self.instance.remove_player(player);
        self.scatter_items(position, items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::GameOverReason;
    use crate::engine::test_support::{Fixture, attrs};
    use crate::state::{GamePhase, ItemKind};

    fn three_players() -> Fixture {
        Fixture::new(
            ".....",
            &[
                (1, Position::new(0, 0), attrs(4, 4, 4, 3)),
                (2, Position::new(2, 0), attrs(4, 4, 4, 2)),
                (3, Position::new(4, 0), attrs(4, 4, 4, 1)),
            ],
        )
    }

    #[test]
    fn start_turn_grants_speed_budget_and_one_action() {
        let mut fixture = three_players();
        fixture.instance.movement_budget = 17;
        fixture.instance.action_points = 0;
        fixture
            .instance
            .player_mut(PlayerId(1))
            .unwrap()
            .inventory
            .push(ItemKind::Boots)
            .unwrap();

        let start = fixture.engine().start_turn(PlayerId(1)).unwrap();

        assert_eq!(start.budget, 5);
        assert_eq!(fixture.instance.movement_budget, 5);
        assert_eq!(fixture.instance.action_points, 1);
        assert!(!fixture.instance.turn_clock.is_paused());
        assert!(start.reachable.contains_key(&Position::new(1, 0)));
    }

    #[test]
    fn non_holder_cannot_start_or_end_turn() {
        let mut fixture = three_players();
        let error = fixture.engine().start_turn(PlayerId(2)).unwrap_err();
        assert!(error.is_ownership_violation());
        let error = fixture.engine().end_turn(PlayerId(3), false).unwrap_err();
        assert!(error.is_ownership_violation());
        assert_eq!(fixture.instance.current_player(), Some(PlayerId(1)));
    }

    #[test]
    fn end_turn_cycles_through_players() {
        let mut fixture = three_players();
        for expected in [2, 3, 1] {
            let holder = fixture.start();
            let change = fixture.engine().end_turn(holder, false).unwrap();
            assert_eq!(change.next, Some(PlayerId(expected)));
        }
    }

    #[test]
    fn final_end_turn_removes_holder() {
        let mut fixture = three_players();
        fixture.start();

        let change = fixture.engine().end_turn(PlayerId(1), true).unwrap();

        assert_eq!(change.removed, Some(PlayerId(1)));
        assert_eq!(change.next, Some(PlayerId(2)));
        assert!(fixture.instance.grid.is_free(Position::new(0, 0)));
        assert!(!fixture.instance.contains_player(PlayerId(1)));
        assert!(change.game_over.is_none());
    }

    #[test]
    fn quitting_out_of_turn_keeps_holder() {
        let mut fixture = three_players();
        fixture.start();

        let outcome = fixture.engine().quit(PlayerId(3)).unwrap();

        assert_eq!(outcome.next, None);
        assert_eq!(fixture.instance.current_player(), Some(PlayerId(1)));
        assert_eq!(fixture.instance.turn_phase, TurnPhase::Acting);
    }

    #[test]
    fn quitting_holder_advances_and_drops_items() {
        let mut fixture = three_players();
        fixture.start();
        fixture
            .instance
            .player_mut(PlayerId(1))
            .unwrap()
            .inventory
            .push(ItemKind::FlagA)
            .unwrap();

        let outcome = fixture.engine().quit(PlayerId(1)).unwrap();

        assert_eq!(outcome.next, Some(PlayerId(2)));
        assert_eq!(outcome.dropped, vec![(ItemKind::FlagA, Position::new(0, 0))]);
        assert_eq!(fixture.instance.grid.item(Position::new(0, 0)), Some(ItemKind::FlagA));
        assert_eq!(fixture.instance.turn_phase, TurnPhase::AwaitingStart);
    }

    #[test]
    fn last_player_standing_wins() {
        let mut fixture = Fixture::new(
            "...",
            &[
                (1, Position::new(0, 0), attrs(4, 4, 4, 3)),
                (2, Position::new(2, 0), attrs(4, 4, 4, 2)),
            ],
        );

        let outcome = fixture.engine().quit(PlayerId(1)).unwrap();
        let game_over = outcome.game_over.unwrap();

        assert_eq!(game_over.winner, Some(PlayerId(2)));
        assert_eq!(game_over.reason, GameOverReason::LastPlayerStanding);
        assert_eq!(game_over.roster, vec![PlayerId(2)]);
        assert_eq!(fixture.instance.phase, GamePhase::Ended);

        let error = fixture.engine().start_turn(PlayerId(2)).unwrap_err();
        assert_eq!(error, ActionError::NotPlaying);
    }

    #[test]
    fn turn_clock_expiry_is_reported_once() {
        let mut fixture = three_players();
        fixture.start();
        let seconds = fixture.config.turn_seconds;

        let expiries: Vec<_> = (0..seconds + 5)
            .filter_map(|_| fixture.engine().tick_clocks())
            .collect();

        assert_eq!(expiries, vec![ClockExpiry::Turn(PlayerId(1))]);
    }
}
