//! Error types for engine operations.
//!
//! Every rejected request leaves the instance untouched. Callers decide how
//! loudly to report a rejection; see [`ActionError::is_ownership_violation`].

use crate::state::{PlayerId, Position};

/// Errors surfaced by any engine operation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("session is not in progress")]
    NotPlaying,

    #[error("player {0} is not seated in this room")]
    UnknownPlayer(PlayerId),

    #[error("player {0} does not hold the turn")]
    NotTurnHolder(PlayerId),

    #[error("turn of player {0} has not started")]
    TurnNotStarted(PlayerId),

    #[error("turn of player {0} has already started")]
    TurnAlreadyStarted(PlayerId),

    #[error("player {0} must resolve a pending item pickup first")]
    PickupPending(PlayerId),

    #[error("an engagement is in progress")]
    CombatInProgress,

    #[error(transparent)]
    Move(#[from] MoveError),

    #[error(transparent)]
    Door(#[from] DoorError),

    #[error(transparent)]
    Combat(#[from] CombatError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Setup(#[from] SetupError),
}

impl ActionError {
    /// True when the requester simply isn't entitled to act right now.
    ///
    /// These are dropped silently by the room worker: no event, no error.
    pub fn is_ownership_violation(&self) -> bool {
        matches!(
            self,
            ActionError::UnknownPlayer(_)
                | ActionError::NotTurnHolder(_)
                | ActionError::Combat(CombatError::NotFighter(_))
                | ActionError::Combat(CombatError::NotFighterTurn(_))
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("no affordable path from {from} to {to}")]
    Unreachable { from: Position, to: Position },

    #[error("step from {from} to {to} is not orthogonal")]
    NotAdjacent { from: Position, to: Position },

    #[error("cell {0} cannot be entered")]
    Blocked(Position),

    #[error("entering {position} costs {cost}, only {budget} left")]
    OverBudget {
        position: Position,
        cost: u32,
        budget: u32,
    },

    #[error("teleport requires debug mode")]
    DebugDisabled,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DoorError {
    #[error("no action points left")]
    NoActionPoints,

    #[error("cell {0} is not a door")]
    NotADoor(Position),

    #[error("door {door} is not next to {player_at}")]
    NotAdjacent { player_at: Position, door: Position },

    #[error("door {0} is blocked by a player")]
    Blocked(Position),
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CombatError {
    #[error("no engagement in progress")]
    NoCombat,

    #[error("an engagement is already in progress")]
    AlreadyInCombat,

    #[error("player {0} is not part of the engagement")]
    NotFighter(PlayerId),

    #[error("it is not the turn of fighter {0}")]
    NotFighterTurn(PlayerId),

    #[error("a player cannot engage itself")]
    SelfTarget,

    #[error("players {0} and {1} are not adjacent")]
    NotAdjacent(PlayerId, PlayerId),

    #[error("no action points left")]
    NoActionPoints,

    #[error("fighter {0} has no escape tokens left")]
    NoEscapeTokens(PlayerId),
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    #[error("player {0} has no pending pickup")]
    NothingPending(PlayerId),

    #[error("kept and dropped items do not match the carried items plus the pending one")]
    InvalidSelection,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    #[error("session has already been set up")]
    AlreadyStarted,

    #[error("roster is empty")]
    NoPlayers,

    #[error("player {0} appears twice in the roster")]
    DuplicatePlayer(PlayerId),

    #[error("{needed} players need starting points, map has {available}")]
    NotEnoughStartingPoints { needed: usize, available: usize },
}
