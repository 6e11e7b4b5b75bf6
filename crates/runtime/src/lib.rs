//! Runtime orchestration for concurrent game rooms.
//!
//! This crate wires the synchronous rules in `game-core` into tokio tasks:
//! one worker per room owns that room's instance, commands reach it through
//! a [`RoomHandle`], and every effect is published on a topic [`EventBus`].
//! Consumers embed [`Runtime`] to open rooms, look them up through the
//! [`SessionRegistry`] and subscribe to events.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides the topic-based event bus
//! - [`registry`] tracks live rooms and the players bound to them
//! - [`templates`] serves the read-only maps rooms are created from
//! - [`agent`] decides for virtual players
//! - `workers` keeps background tasks internal to the crate
pub mod agent;
pub mod api;
pub mod events;
pub mod registry;
pub mod runtime;
pub mod templates;

mod workers;

pub use agent::{AgentStep, AutonomousAgent};
pub use api::{CommandOutcome, Result, RoomCommand, RoomHandle, RuntimeError, TemplateError};
pub use events::{CombatEvent, Event, EventBus, ItemEvent, SessionEvent, Topic, TurnEvent};
pub use registry::SessionRegistry;
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use templates::{InMemoryTemplateStore, MapTemplate, TemplateStore};
