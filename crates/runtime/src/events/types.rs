//! Typed payloads published on each topic.
//!
//! Every payload is emitted by a room worker after the corresponding engine
//! operation succeeded; rejected operations never produce events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use game_core::{FinalStatistics, GameOverReason, ItemKind, PlayerId, Position, TileKind};

/// Session lifecycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    GameStarted {
        turn_order: Vec<PlayerId>,
        homes: Vec<(PlayerId, Position)>,
    },
    PlayerLeft {
        player: PlayerId,
        dropped: Vec<(ItemKind, Position)>,
    },
    DebugToggled {
        enabled: bool,
    },
    GameEnded {
        winner: Option<PlayerId>,
        reason: GameOverReason,
        statistics: FinalStatistics,
        roster: Vec<PlayerId>,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    },
}

/// Turn sequencing and movement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TurnEvent {
    TurnStarted {
        player: PlayerId,
        budget: u32,
        action_points: u32,
        available: Vec<Position>,
    },
    TurnChanged {
        previous: PlayerId,
        next: Option<PlayerId>,
        removed: Option<PlayerId>,
    },
    TurnExpired {
        player: PlayerId,
    },
    PositionUpdated {
        player: PlayerId,
        position: Position,
        remaining_budget: u32,
    },
    MoveCompleted {
        player: PlayerId,
        position: Position,
        remaining_budget: u32,
        available: Vec<Position>,
        slipped: bool,
    },
    DoorToggled {
        player: PlayerId,
        position: Position,
        kind: TileKind,
    },
    Teleported {
        player: PlayerId,
        from: Position,
        to: Position,
    },
}

/// Engagements between two fighters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    Started {
        initiator: PlayerId,
        target: PlayerId,
        first: PlayerId,
    },
    Attacked {
        attacker: PlayerId,
        defender: PlayerId,
        attack_roll: u32,
        defense_roll: u32,
        hit: bool,
        defender_health: u32,
        next_fighter: Option<PlayerId>,
    },
    Escaped {
        fighter: PlayerId,
        success: bool,
        tokens_left: u32,
        next_fighter: Option<PlayerId>,
    },
    Ended {
        fighters: [PlayerId; 2],
    },
    PlayerKilled {
        killer: PlayerId,
        victim: PlayerId,
        killer_wins: u32,
        respawn: Position,
    },
}

/// Items changing hands or cells.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemEvent {
    PickedUp {
        player: PlayerId,
        item: ItemKind,
        position: Position,
    },
    /// Inventory was full; the player has to choose what to keep.
    ChoiceRequired {
        player: PlayerId,
        item: ItemKind,
        carried: Vec<ItemKind>,
    },
    Replaced {
        player: PlayerId,
        kept: Vec<ItemKind>,
        dropped: ItemKind,
        position: Position,
    },
    Dropped {
        player: PlayerId,
        item: ItemKind,
        position: Position,
    },
}
