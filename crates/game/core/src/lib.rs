//! Rules and data types of the tactical grid game.
//!
//! `game-core` is pure and synchronous: it owns no timers, threads or I/O.
//! A [`GameInstance`] holds everything one room mutates, and every mutation
//! goes through a short-lived [`GameEngine`] that borrows the instance, the
//! [`GameConfig`] and a random generator. The runtime crate drives these
//! operations from one worker per room.
pub mod config;
pub mod engine;
pub mod pathfinding;
pub mod rng;
pub mod state;

pub use config::GameConfig;
pub use engine::{
    ActionError, AttackOutcome, ClockExpiry, CombatError, CombatStart, DeathOutcome, DoorError,
    DoorToggle, EscapeOutcome, GameEngine, GameOver, GameOverReason, InventoryError,
    InventoryUpdate, MoveError, MoveOutcome, MoveSummary, PickupOutcome, QuitOutcome, SetupError,
    SetupOutcome, StepOutcome, Teleport, TurnChange, TurnStart,
};
pub use pathfinding::{PathOptions, PathResult, ReachableSet};
pub use state::{
    AgentProfile, Attributes, Bonus, CombatState, Countdown, DiceKind, FinalStatistics,
    GameInstance, GamePhase, GameStatistics, Grid, GridError, Inventory, ItemKind,
    PendingPickup, Player, PlayerCoord, PlayerId, PlayerSpec, PlayerStats, PlayerSummary,
    Position, RoomId, TemplateId, Tile, TileKind, TurnPhase,
};
