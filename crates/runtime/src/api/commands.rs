//! Inbound room commands and their outcomes.

use serde::{Deserialize, Serialize};

use game_core::{ItemKind, PlayerId, PlayerSpec, Position};

/// A request routed to a room worker.
///
/// `player` is always the requester; the worker checks that it is entitled
/// to act before touching the instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomCommand {
    Setup {
        roster: Vec<PlayerSpec>,
    },
    StartTurn {
        player: PlayerId,
    },
    Move {
        player: PlayerId,
        to: Position,
    },
    EndTurn {
        player: PlayerId,
        is_final: bool,
    },
    InteractDoor {
        player: PlayerId,
        door: Position,
    },
    GetAvailableMoves {
        player: PlayerId,
        budget: u32,
    },
    StartCombat {
        player: PlayerId,
        target: PlayerId,
    },
    Attack {
        player: PlayerId,
        target: PlayerId,
    },
    Escape {
        player: PlayerId,
    },
    Teleport {
        player: PlayerId,
        to: Position,
    },
    UpdateInventory {
        player: PlayerId,
        keep: Vec<ItemKind>,
        dropped: ItemKind,
    },
    Quit {
        player: PlayerId,
    },
    ToggleDebug,
    /// Stops the running engagement without a winner (organizer command).
    EndCombat,
}

impl RoomCommand {
    /// Requesting player, if the command has one.
    pub fn player(&self) -> Option<PlayerId> {
        match self {
            RoomCommand::Setup { .. } | RoomCommand::ToggleDebug | RoomCommand::EndCombat => {
                None
            }
            RoomCommand::StartTurn { player }
            | RoomCommand::Move { player, .. }
            | RoomCommand::EndTurn { player, .. }
            | RoomCommand::InteractDoor { player, .. }
            | RoomCommand::GetAvailableMoves { player, .. }
            | RoomCommand::StartCombat { player, .. }
            | RoomCommand::Attack { player, .. }
            | RoomCommand::Escape { player }
            | RoomCommand::Teleport { player, .. }
            | RoomCommand::UpdateInventory { player, .. }
            | RoomCommand::Quit { player } => Some(*player),
        }
    }
}

/// How a room worker handled a command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandOutcome {
    /// The command changed the instance; matching events were published.
    Applied,
    /// Destinations answering `GetAvailableMoves`, sorted.
    AvailableMoves(Vec<Position>),
    /// The requester was not entitled to act; nothing happened.
    Ignored,
    /// The command broke a rule; nothing happened.
    Rejected { reason: String },
}

impl CommandOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(
            self,
            CommandOutcome::Applied | CommandOutcome::AvailableMoves(_)
        )
    }
}
