//! Public API surface for driving rooms.
//!
//! Re-exports the room handle, the command types and the error types.
mod commands;
mod errors;
mod handle;

pub use commands::{CommandOutcome, RoomCommand};
pub use errors::{Result, RuntimeError, TemplateError};
pub use handle::RoomHandle;
