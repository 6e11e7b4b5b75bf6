//! Cloneable façade for issuing commands to one room.
//!
//! [`RoomHandle`] hides channel plumbing and offers async helpers for every
//! room command. A handle outlives its worker: once the room finishes, every
//! call fails with [`RuntimeError::RoomClosed`].
use tokio::sync::{mpsc, oneshot};

use game_core::{GameInstance, ItemKind, PlayerId, PlayerSpec, Position, RoomId};

use super::commands::{CommandOutcome, RoomCommand};
use super::errors::{Result, RuntimeError};
use crate::workers::RoomMessage;

/// Client-facing handle to interact with a room worker.
#[derive(Clone, Debug)]
pub struct RoomHandle {
    room_id: RoomId,
    command_tx: mpsc::Sender<RoomMessage>,
}

impl RoomHandle {
    pub(crate) fn new(room_id: RoomId, command_tx: mpsc::Sender<RoomMessage>) -> Self {
        Self {
            room_id,
            command_tx,
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// True once the worker has stopped.
    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }

    /// Completes when the worker stops.
    pub async fn closed(&self) {
        self.command_tx.closed().await
    }

    /// Sends a command and waits for the worker's verdict.
    pub async fn execute(&self, command: RoomCommand) -> Result<CommandOutcome> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(RoomMessage::Command {
                command,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RuntimeError::RoomClosed(self.room_id.clone()))?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Clone of the room's current instance.
    pub async fn snapshot(&self) -> Result<GameInstance> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(RoomMessage::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| RuntimeError::RoomClosed(self.room_id.clone()))?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    pub async fn setup(&self, roster: Vec<PlayerSpec>) -> Result<CommandOutcome> {
        self.execute(RoomCommand::Setup { roster }).await
    }

    pub async fn start_turn(&self, player: PlayerId) -> Result<CommandOutcome> {
        self.execute(RoomCommand::StartTurn { player }).await
    }

    /// Moves along the cheapest path; resolves once the replay has finished.
    pub async fn move_to(&self, player: PlayerId, to: Position) -> Result<CommandOutcome> {
        self.execute(RoomCommand::Move { player, to }).await
    }

    pub async fn end_turn(&self, player: PlayerId, is_final: bool) -> Result<CommandOutcome> {
        self.execute(RoomCommand::EndTurn { player, is_final }).await
    }

    pub async fn interact_door(&self, player: PlayerId, door: Position) -> Result<CommandOutcome> {
        self.execute(RoomCommand::InteractDoor { player, door }).await
    }

    pub async fn available_moves(&self, player: PlayerId, budget: u32) -> Result<CommandOutcome> {
        self.execute(RoomCommand::GetAvailableMoves { player, budget })
            .await
    }

    pub async fn start_combat(&self, player: PlayerId, target: PlayerId) -> Result<CommandOutcome> {
        self.execute(RoomCommand::StartCombat { player, target }).await
    }

    pub async fn attack(&self, player: PlayerId, target: PlayerId) -> Result<CommandOutcome> {
        self.execute(RoomCommand::Attack { player, target }).await
    }

    pub async fn escape(&self, player: PlayerId) -> Result<CommandOutcome> {
        self.execute(RoomCommand::Escape { player }).await
    }

    pub async fn teleport(&self, player: PlayerId, to: Position) -> Result<CommandOutcome> {
        self.execute(RoomCommand::Teleport { player, to }).await
    }

    pub async fn update_inventory(
        &self,
        player: PlayerId,
        keep: Vec<ItemKind>,
        dropped: ItemKind,
    ) -> Result<CommandOutcome> {
        self.execute(RoomCommand::UpdateInventory {
            player,
            keep,
            dropped,
        })
        .await
    }

    pub async fn quit(&self, player: PlayerId) -> Result<CommandOutcome> {
        self.execute(RoomCommand::Quit { player }).await
    }

    pub async fn toggle_debug(&self) -> Result<CommandOutcome> {
        self.execute(RoomCommand::ToggleDebug).await
    }

    pub async fn end_combat(&self) -> Result<CommandOutcome> {
        self.execute(RoomCommand::EndCombat).await
    }
}
