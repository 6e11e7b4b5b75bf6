//! Leaf nodes built from closures.

use std::marker::PhantomData;

use crate::{Behavior, Status};

/// Succeeds when the predicate holds; never mutates the context.
pub struct Condition<C, F> {
    predicate: F,
    _context: PhantomData<fn(&C)>,
}

impl<C, F> Condition<C, F>
where
    F: Fn(&C) -> bool + Send + Sync,
{
    pub fn new(predicate: F) -> Self {
        Self {
            predicate,
            _context: PhantomData,
        }
    }
}

impl<C, F> Behavior<C> for Condition<C, F>
where
    F: Fn(&C) -> bool + Send + Sync,
{
    fn tick(&self, ctx: &mut C) -> Status {
        (self.predicate)(ctx).into()
    }
}

/// Runs a closure that may change the context and reports its own status.
pub struct Action<C, F> {
    run: F,
    _context: PhantomData<fn(&mut C)>,
}

impl<C, F> Action<C, F>
where
    F: Fn(&mut C) -> Status + Send + Sync,
{
    pub fn new(run: F) -> Self {
        Self {
            run,
            _context: PhantomData,
        }
    }
}

impl<C, F> Behavior<C> for Action<C, F>
where
    F: Fn(&mut C) -> Status + Send + Sync,
{
    fn tick(&self, ctx: &mut C) -> Status {
        (self.run)(ctx)
    }
}
