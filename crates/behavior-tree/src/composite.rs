//! Nodes that run several children.

use crate::{Behavior, Status};

/// Runs children left to right, stopping at the first failure.
///
/// An empty sequence succeeds.
pub struct Sequence<C> {
    children: Vec<Box<dyn Behavior<C>>>,
}

impl<C> Sequence<C> {
    pub fn new(children: Vec<Box<dyn Behavior<C>>>) -> Self {
        Self { children }
    }
}

impl<C> Behavior<C> for Sequence<C> {
    fn tick(&self, ctx: &mut C) -> Status {
        for child in &self.children {
            if child.tick(ctx).is_failure() {
                return Status::Failure;
            }
        }
        Status::Success
    }
}

/// Runs children left to right, stopping at the first success.
///
/// An empty selector fails. Children are listed in priority order, so the
/// first applicable one wins.
pub struct Selector<C> {
    children: Vec<Box<dyn Behavior<C>>>,
}

impl<C> Selector<C> {
    pub fn new(children: Vec<Box<dyn Behavior<C>>>) -> Self {
        Self { children }
    }
}

impl<C> Behavior<C> for Selector<C> {
    fn tick(&self, ctx: &mut C) -> Status {
        for child in &self.children {
            if child.tick(ctx).is_success() {
                return Status::Success;
            }
        }
        Status::Failure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Action, Condition};

    fn push(tag: &'static str, status: Status) -> Box<dyn Behavior<Vec<&'static str>>> {
        Box::new(Action::new(move |log: &mut Vec<&'static str>| {
            log.push(tag);
            status
        }))
    }

    #[test]
    fn sequence_stops_at_first_failure() {
        let tree = Sequence::new(vec![
            push("a", Status::Success),
            push("b", Status::Failure),
            push("c", Status::Success),
        ]);
        let mut log = Vec::new();
        assert_eq!(tree.tick(&mut log), Status::Failure);
        assert_eq!(log, ["a", "b"]);
    }

    #[test]
    fn selector_stops_at_first_success() {
        let tree = Selector::new(vec![
            push("a", Status::Failure),
            push("b", Status::Success),
            push("c", Status::Success),
        ]);
        let mut log = Vec::new();
        assert_eq!(tree.tick(&mut log), Status::Success);
        assert_eq!(log, ["a", "b"]);
    }

    #[test]
    fn empty_composites() {
        let mut log: Vec<&'static str> = Vec::new();
        assert!(Sequence::new(Vec::new()).tick(&mut log).is_success());
        assert!(Selector::new(Vec::new()).tick(&mut log).is_failure());
    }

    #[test]
    fn guarded_branch() {
        let tree = Selector::new(vec![
            Box::new(Sequence::new(vec![
                Box::new(Condition::new(|log: &Vec<&'static str>| log.is_empty())),
                push("first", Status::Success),
            ])),
            push("fallback", Status::Success),
        ]);
        let mut log = Vec::new();
        tree.tick(&mut log);
        tree.tick(&mut log);
        assert_eq!(log, ["first", "fallback"]);
    }
}
