//! Blackboard the agent's behavior tree reads and writes.

use rand::Rng;
use rand::rngs::StdRng;

use behavior_tree::Status;
use game_core::pathfinding::{ReachableSet, path_cost, reachable_set};
use game_core::{AgentProfile, GameInstance, Grid, PlayerId, Position, TileKind};

use super::AgentStep;

/// What the agent remembers between decisions of the same turn.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TurnMemory {
    /// Player the memory belongs to.
    pub player: Option<PlayerId>,
    /// Decisions taken outside engagements this turn.
    pub decisions: u32,
    /// Rolled once per turn.
    pub exploring: Option<bool>,
    /// A random move was already made this turn.
    pub wandered: bool,
}

impl TurnMemory {
    pub fn for_player(player: PlayerId) -> Self {
        Self {
            player: Some(player),
            ..Self::default()
        }
    }
}

/// Context for one decision of one virtual player.
///
/// Holds a snapshot of the room so the tree can be evaluated without
/// borrowing the worker; the chosen step is written back with [`decide`].
///
/// [`decide`]: AgentContext::decide
pub struct AgentContext {
    /// The player making the decision.
    pub me: PlayerId,
    pub instance: GameInstance,
    pub memory: TurnMemory,
    pub rng: StdRng,
    decision: Option<AgentStep>,
}

impl AgentContext {
    pub fn new(me: PlayerId, instance: GameInstance, memory: TurnMemory, rng: StdRng) -> Self {
        Self {
            me,
            instance,
            memory,
            rng,
            decision: None,
        }
    }

    /// Records the chosen step.
    pub fn decide(&mut self, step: AgentStep) -> Status {
        self.decision = Some(step);
        Status::Success
    }

    pub fn take_decision(&mut self) -> Option<AgentStep> {
        self.decision.take()
    }

    pub fn position(&self) -> Option<Position> {
        self.instance.position_of(self.me)
    }

    pub fn profile(&self) -> AgentProfile {
        self.instance
            .player(self.me)
            .and_then(|player| player.profile)
            .unwrap_or(AgentProfile::Aggressive)
    }

    pub fn budget(&self) -> u32 {
        self.instance.movement_budget
    }

    pub fn has_action_point(&self) -> bool {
        self.instance.action_points > 0
    }

    pub fn is_turn_holder(&self) -> bool {
        self.instance.is_turn_holder(self.me)
    }

    /// Other players orthogonally next to this one, lowest id first.
    pub fn adjacent_opponents(&self) -> Vec<PlayerId> {
        let Some(position) = self.position() else {
            return Vec::new();
        };
        let mut opponents: Vec<PlayerId> = self
            .instance
            .players()
            .filter(|coord| coord.player.id != self.me && coord.position.is_adjacent(position))
            .map(|coord| coord.player.id)
            .collect();
        opponents.sort();
        opponents
    }

    /// Grid with every closed door treated as open.
    pub fn planning_grid(&self) -> Grid {
        self.instance.grid.with_doors_open()
    }

    /// Destinations affordable right now on the real grid.
    pub fn reachable(&self) -> ReachableSet {
        match self.position() {
            Some(position) => reachable_set(self.budget(), &self.instance.grid, position),
            None => ReachableSet::new(),
        }
    }

    /// Planning-grid cost of a path, start cell excluded.
    pub fn planned_cost(&self, planning: &Grid, path: &[Position]) -> u32 {
        path_cost(planning, path).unwrap_or(u32::MAX)
    }

    /// Rolls a percentage chance with the decision's generator.
    pub fn roll(&mut self, chance: u32) -> bool {
        self.rng.gen_range(0..100) < chance
    }

    /// Next step along a path planned on the doors-open grid.
    ///
    /// A closed door right ahead is opened when an action point is left.
    /// Otherwise the agent walks as far as the real grid and its budget
    /// allow, stopping short of the first closed door or occupied cell.
    pub fn advance_along(&self, path: &[Position]) -> Option<AgentStep> {
        let grid = &self.instance.grid;
        let mut budget = self.budget();
        let mut furthest = None;

        for (index, cell) in path.iter().enumerate().skip(1) {
            let Some(kind) = grid.kind(*cell) else {
                break;
            };
            if kind == TileKind::DoorClosed {
                if index == 1 && self.has_action_point() && grid.occupant(*cell).is_none() {
                    return Some(AgentStep::OpenDoor(*cell));
                }
                break;
            }
            let Some(cost) = kind.movement_cost() else {
                break;
            };
            if cost > budget || !grid.is_free(*cell) {
                break;
            }
            budget -= cost;
            furthest = Some(*cell);
        }

        furthest.map(AgentStep::Move)
    }
}
