//! The node trait.

use crate::Status;

/// A node evaluated against a mutable context `C`.
///
/// Nodes are `Send + Sync` so a built tree can be shared by the tasks that
/// drive it; per-decision state belongs in the context, never in the node.
pub trait Behavior<C>: Send + Sync {
    fn tick(&self, ctx: &mut C) -> Status;
}

impl<C> Behavior<C> for Box<dyn Behavior<C>> {
    #[inline]
    fn tick(&self, ctx: &mut C) -> Status {
        (**self).tick(ctx)
    }
}
