//! Small behavior tree library for turn-based decision making.
//!
//! A tree is evaluated once per decision and every node answers immediately,
//! so there is no `Running` status and no per-node memory between ticks.
//! Nodes read and write a caller-defined context (the blackboard).
//!
//! - [`Behavior`]: the node trait
//! - [`Status`]: `Success` or `Failure`
//! - composites: [`Sequence`], [`Selector`]
//! - decorators: [`Inverter`], [`AlwaysSucceed`]
//! - closure leaves: [`Condition`], [`Action`]
//!
//! The [`builder`] functions return boxed nodes so trees can be written as
//! nested calls.

pub mod behavior;
pub mod builder;
pub mod composite;
pub mod decorator;
pub mod leaf;
pub mod status;

pub use behavior::Behavior;
pub use composite::{Selector, Sequence};
pub use decorator::{AlwaysSucceed, Inverter};
pub use leaf::{Action, Condition};
pub use status::Status;
