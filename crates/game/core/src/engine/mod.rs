//! Rule engine for a single room.
//!
//! [`GameEngine`] borrows an instance, the rule configuration and a random
//! generator for the duration of one request. Operations are grouped by
//! concern in the submodules, each adding an `impl GameEngine` block:
//!
//! - [`setup`]: seating players and fixing the turn order
//! - [`turns`]: turn sequencing, quitting, clocks
//! - [`movement`]: path planning and step-by-step replay
//! - [`door`]: door interaction
//! - [`inventory`]: item pickup and the keep/drop choice
//! - [`combat`]: engagements, attacks, escapes and deaths
//!
//! Every operation validates ownership before touching state; a rejected
//! request returns an [`ActionError`] and leaves the instance unchanged.

mod combat;
mod door;
mod errors;
mod inventory;
mod movement;
mod scatter;
mod setup;
mod turns;

use rand::RngCore;

pub use combat::{AttackOutcome, CombatStart, DeathOutcome, EscapeOutcome};
pub use door::DoorToggle;
pub use errors::{ActionError, CombatError, DoorError, InventoryError, MoveError, SetupError};
pub use inventory::{InventoryUpdate, PickupOutcome};
pub use movement::{MoveOutcome, MoveSummary, StepOutcome, Teleport};
pub use scatter::find_free_cells;
pub use setup::{SetupOutcome, establish_turn_order, place_starting_positions};
pub use turns::{ClockExpiry, QuitOutcome, TurnChange, TurnStart};

use crate::config::GameConfig;
use crate::state::{FinalStatistics, GameInstance, GamePhase, PlayerId, TurnPhase};

/// Why a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GameOverReason {
    /// The winner carried the objective flag back home.
    Objective,
    /// The winner reached the required number of combat victories.
    Victories,
    /// At most one player is left in the room.
    LastPlayerStanding,
}

/// Final result of a session.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameOver {
    pub winner: Option<PlayerId>,
    pub reason: GameOverReason,
    pub statistics: FinalStatistics,
    /// Players still seated, in turn order.
    pub roster: Vec<PlayerId>,
}

/// Applies rule operations to one borrowed [`GameInstance`].
pub struct GameEngine<'a> {
    instance: &'a mut GameInstance,
    config: &'a GameConfig,
    rng: &'a mut dyn RngCore,
}

impl<'a> GameEngine<'a> {
    pub fn new(
        instance: &'a mut GameInstance,
        config: &'a GameConfig,
        rng: &'a mut dyn RngCore,
    ) -> Self {
        Self {
            instance,
            config,
            rng,
        }
    }

    pub fn instance(&self) -> &GameInstance {
        self.instance
    }

    pub fn config(&self) -> &GameConfig {
        self.config
    }

    fn require_playing(&self) -> Result<(), ActionError> {
        if self.instance.phase == GamePhase::Playing {
            Ok(())
        } else {
            Err(ActionError::NotPlaying)
        }
    }

    fn require_player(&self, player: PlayerId) -> Result<(), ActionError> {
        if self.instance.contains_player(player) {
            Ok(())
        } else {
            Err(ActionError::UnknownPlayer(player))
        }
    }

    fn require_turn_holder(&self, player: PlayerId) -> Result<(), ActionError> {
        self.require_playing()?;
        self.require_player(player)?;
        if self.instance.is_turn_holder(player) {
            Ok(())
        } else {
            Err(ActionError::NotTurnHolder(player))
        }
    }

    /// Turn holder whose turn has started.
    fn require_acting(&self, player: PlayerId) -> Result<(), ActionError> {
        self.require_turn_holder(player)?;
        if self.instance.turn_phase == TurnPhase::Acting {
            Ok(())
        } else {
            Err(ActionError::TurnNotStarted(player))
        }
    }

    fn require_no_pending_pickup(&self, player: PlayerId) -> Result<(), ActionError> {
        match self.instance.pending_pickup {
            Some(pending) if pending.player == player => Err(ActionError::PickupPending(player)),
            _ => Ok(()),
        }
    }

    /// Ends the session and produces the final statistics.
    fn finish(&mut self, winner: Option<PlayerId>, reason: GameOverReason) -> GameOver {
        let instance = &mut *self.instance;
        instance.phase = GamePhase::Ended;
        instance.winner = winner;
        instance.turn_clock.pause();
        instance.combat_clock.pause();
        instance.pending_pickup = None;

        let statistics = instance.statistics.summarize(
            &instance.grid,
            instance
                .players()
                .map(|coord| (coord.player.id, coord.player.name.as_str(), &coord.player.stats)),
        );

        tracing::info!(
            target: "game_core::engine",
            room = %instance.room_id,
            winner = ?winner,
            ?reason,
            "session ended"
        );

        GameOver {
            winner,
            reason,
            statistics,
            roster: instance.turn_order().to_vec(),
        }
    }

    /// Ends the session when at most one player remains.
    fn check_last_player_standing(&mut self) -> Option<GameOver> {
        if self.instance.phase != GamePhase::Playing || self.instance.player_count() > 1 {
            return None;
        }
        let winner = self.instance.turn_order().first().copied();
        Some(self.finish(winner, GameOverReason::LastPlayerStanding))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Shared fixtures for engine tests.
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::config::GameConfig;
    use crate::state::{
        Attributes, DiceKind, GameInstance, Grid, PlayerId, PlayerSpec, Position, RoomId,
    };

    use super::GameEngine;

    pub struct Fixture {
        pub instance: GameInstance,
        pub config: GameConfig,
        pub rng: StdRng,
    }

    impl Fixture {
        /// Seats players on the given cells (in turn order) without randomness.
        pub fn new(layout: &str, players: &[(u32, Position, Attributes)]) -> Self {
            let config = GameConfig::deterministic();
            let grid = Grid::parse(layout).unwrap();
            let mut instance = GameInstance::new(RoomId::from("test-room"), grid, &config);
            for (id, position, attributes) in players {
                let spec = PlayerSpec::human(PlayerId(*id), format!("p{id}"), *attributes);
                instance.seat(crate::state::Player::from_spec(spec, *position), *position);
            }
            instance.set_turn_order(players.iter().map(|(id, ..)| PlayerId(*id)).collect());
            instance.phase = crate::state::GamePhase::Playing;
            Self {
                instance,
                config,
                rng: StdRng::seed_from_u64(42),
            }
        }

        pub fn engine(&mut self) -> GameEngine<'_> {
            GameEngine::new(&mut self.instance, &self.config, &mut self.rng)
        }

        /// Starts the current holder's turn.
        pub fn start(&mut self) -> PlayerId {
            let holder = self.instance.current_player().unwrap();
            self.engine().start_turn(holder).unwrap();
            holder
        }
    }

    pub fn attrs(health: u32, attack: u32, defense: u32, speed: u32) -> Attributes {
        Attributes::new(health, attack, defense, speed, DiceKind::Attack)
    }
}
