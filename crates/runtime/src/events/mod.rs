//! Room events and the topic bus that fans them out.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{CombatEvent, ItemEvent, SessionEvent, TurnEvent};
