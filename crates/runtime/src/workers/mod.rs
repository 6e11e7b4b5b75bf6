//! Worker tasks that back the runtime orchestration.
//!
//! One [`RoomWorker`] runs per room and owns that room's instance.

mod room;

pub use room::{RoomMessage, RoomWorker};
