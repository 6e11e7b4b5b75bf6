//! Decision making for virtual players.
//!
//! [`AutonomousAgent`] evaluates one behavior tree per decision. The room
//! worker asks for one [`AgentStep`] at a time, applies it like any other
//! command and asks again after the next thinking pause, until the agent
//! ends its turn. Branches, highest priority first:
//!
//! 1. fighting on its own turn: escape when defensive and just hit, else attack
//! 2. a pending full-inventory pickup: keep the best items
//! 3. exploration roll: one random move, then end the turn
//! 4. carry the objective flag home
//! 5. seek the most wanted reachable item
//! 6. chase the nearest player, opening doors on the way
//! 7. engage an adjacent player
//! 8. one random move, then end the turn
mod context;
mod nodes;

pub use context::{AgentContext, TurnMemory};
pub use nodes::MAX_DECISIONS_PER_TURN;

use behavior_tree::Behavior;
use behavior_tree::builder::{inverter, selector, sequence};
use game_core::{AgentProfile, ItemKind, PlayerId, Position};

use crate::api::RoomCommand;
use nodes::*;

/// One action chosen by the agent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AgentStep {
    Move(Position),
    OpenDoor(Position),
    Engage(PlayerId),
    Attack(PlayerId),
    Escape,
    UpdateInventory { keep: Vec<ItemKind>, dropped: ItemKind },
    EndTurn,
}

impl AgentStep {
    /// The room command carrying out this step for `player`.
    pub fn into_command(self, player: PlayerId) -> RoomCommand {
        match self {
            AgentStep::Move(to) => RoomCommand::Move { player, to },
            AgentStep::OpenDoor(door) => RoomCommand::InteractDoor { player, door },
            AgentStep::Engage(target) => RoomCommand::StartCombat { player, target },
            AgentStep::Attack(target) => RoomCommand::Attack { player, target },
            AgentStep::Escape => RoomCommand::Escape { player },
            AgentStep::UpdateInventory { keep, dropped } => RoomCommand::UpdateInventory {
                player,
                keep,
                dropped,
            },
            AgentStep::EndTurn => RoomCommand::EndTurn {
                player,
                is_final: false,
            },
        }
    }
}

/// Chooses what to keep when `pending` does not fit.
///
/// The worst carried item by profile priority is swapped out only if
/// `pending` outranks it; otherwise `pending` is left behind.
pub fn resolve_inventory(
    profile: AgentProfile,
    carried: &[ItemKind],
    pending: ItemKind,
) -> (Vec<ItemKind>, ItemKind) {
    let worst = carried
        .iter()
        .copied()
        .enumerate()
        .max_by_key(|(_, item)| profile.rank(*item).unwrap_or(usize::MAX));

    match worst {
        Some((index, worst)) if profile.prefers(pending, worst) => {
            let mut keep = carried.to_vec();
            keep[index] = pending;
            (keep, worst)
        }
        _ => (carried.to_vec(), pending),
    }
}

fn node(behavior: impl Behavior<AgentContext> + 'static) -> Box<dyn Behavior<AgentContext>> {
    Box::new(behavior)
}

/// Behavior-tree driven decision maker shared by every room.
pub struct AutonomousAgent {
    tree: Box<dyn Behavior<AgentContext>>,
    exploration_chance: u32,
}

impl AutonomousAgent {
    pub fn new(exploration_chance: u32) -> Self {
        let fight = sequence(vec![
            node(IsFighterTurn),
            selector(vec![
                sequence(vec![node(ShouldEscape), node(TryEscape)]),
                node(AttackOpponent),
            ]),
        ]);
        let explore = sequence(vec![
            node(IsExploring),
            selector(vec![
                sequence(vec![inverter(node(HasWandered)), node(Wander)]),
                node(EndTurn),
            ]),
        ]);

        let tree = selector(vec![
            fight,
            sequence(vec![node(HasPendingPickup), node(ResolvePickup)]),
            sequence(vec![node(OutOfPatience), node(EndTurn)]),
            explore,
            node(ReturnFlag),
            node(SeekItem),
            sequence(vec![inverter(node(AdjacentOpponent)), node(ChasePlayer)]),
            sequence(vec![node(AdjacentOpponent), node(HasActionPoint), node(Engage)]),
            sequence(vec![node(AdjacentOpponent), node(EndTurn)]),
            sequence(vec![inverter(node(HasWandered)), node(Wander)]),
            node(EndTurn),
        ]);

        Self {
            tree,
            exploration_chance,
        }
    }

    /// Picks the next step for `ctx.me`.
    ///
    /// Updates the turn memory in `ctx`; the caller keeps it for the next
    /// decision of the same turn.
    pub fn decide(&self, ctx: &mut AgentContext) -> AgentStep {
        let fighting = ctx
            .instance
            .combat
            .as_ref()
            .is_some_and(|combat| combat.involves(ctx.me));
        if !fighting {
            if ctx.memory.player != Some(ctx.me) {
                ctx.memory = TurnMemory::for_player(ctx.me);
            }
            ctx.memory.decisions += 1;
            if ctx.memory.exploring.is_none() {
                let exploring = ctx.roll(self.exploration_chance);
                ctx.memory.exploring = Some(exploring);
            }
        }

        self.tree.tick(ctx);
        let step = ctx.take_decision().unwrap_or(AgentStep::EndTurn);
        tracing::debug!(target: "runtime::agent", player = %ctx.me, ?step, "decided");
        step
    }
}
