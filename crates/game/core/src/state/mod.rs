//! Session state: grid, players, engagement and bookkeeping.
//!
//! Everything a room mutates lives in [`GameInstance`]; the other types are
//! its building blocks.
mod clock;
mod combat;
mod common;
mod grid;
mod instance;
mod player;
mod profile;
mod stats;

pub use clock::Countdown;
pub use combat::CombatState;
pub use common::{PlayerId, Position, RoomId, TemplateId};
pub use grid::{Grid, GridError, ItemKind, Tile, TileKind};
pub use instance::{GameInstance, GamePhase, PendingPickup, TurnPhase};
pub use player::{Attributes, Bonus, DiceKind, Inventory, Player, PlayerCoord, PlayerSpec};
pub use profile::AgentProfile;
pub use stats::{FinalStatistics, GameStatistics, PlayerStats, PlayerSummary};
