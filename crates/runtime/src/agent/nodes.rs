//! Leaf nodes of the agent's behavior tree.
//!
//! Conditions only read the context. Actions write a decision through
//! [`AgentContext::decide`] and fail when they have nothing to offer, which
//! lets the enclosing selector fall through to the next branch.

use rand::Rng;

use behavior_tree::{Behavior, Status};
use game_core::pathfinding::reachable_set;
use game_core::{GameConfig, ItemKind, Position};

use super::context::AgentContext;
use super::{AgentStep, resolve_inventory};

/// Decisions per turn before the agent gives up and ends it.
pub const MAX_DECISIONS_PER_TURN: u32 = 24;

// ============================================================================
// Conditions
// ============================================================================

/// This player is fighting and it is its turn to act.
pub struct IsFighterTurn;

impl Behavior<AgentContext> for IsFighterTurn {
    fn tick(&self, ctx: &mut AgentContext) -> Status {
        ctx.instance
            .combat
            .as_ref()
            .is_some_and(|combat| combat.is_turn_of(ctx.me))
            .into()
    }
}

/// Defensive fighter that was just hit and still holds an escape token.
pub struct ShouldEscape;

impl Behavior<AgentContext> for ShouldEscape {
    fn tick(&self, ctx: &mut AgentContext) -> Status {
        let Some(combat) = ctx.instance.combat.as_ref() else {
            return Status::Failure;
        };
        (ctx.profile().escapes_when_attacked()
            && combat.last_attacked() == Some(ctx.me)
            && combat.escape_tokens(ctx.me).is_some_and(|tokens| tokens > 0))
        .into()
    }
}

/// This player has to choose what to keep after a full-inventory pickup.
pub struct HasPendingPickup;

impl Behavior<AgentContext> for HasPendingPickup {
    fn tick(&self, ctx: &mut AgentContext) -> Status {
        ctx.instance
            .pending_pickup
            .is_some_and(|pending| pending.player == ctx.me)
            .into()
    }
}

/// The turn has seen too many decisions already.
pub struct OutOfPatience;

impl Behavior<AgentContext> for OutOfPatience {
    fn tick(&self, ctx: &mut AgentContext) -> Status {
        (ctx.memory.decisions > MAX_DECISIONS_PER_TURN).into()
    }
}

/// The exploration roll for this turn came up.
pub struct IsExploring;

impl Behavior<AgentContext> for IsExploring {
    fn tick(&self, ctx: &mut AgentContext) -> Status {
        ctx.memory.exploring.unwrap_or(false).into()
    }
}

pub struct HasWandered;

impl Behavior<AgentContext> for HasWandered {
    fn tick(&self, ctx: &mut AgentContext) -> Status {
        ctx.memory.wandered.into()
    }
}

pub struct AdjacentOpponent;

impl Behavior<AgentContext> for AdjacentOpponent {
    fn tick(&self, ctx: &mut AgentContext) -> Status {
        (!ctx.adjacent_opponents().is_empty()).into()
    }
}

pub struct HasActionPoint;

impl Behavior<AgentContext> for HasActionPoint {
    fn tick(&self, ctx: &mut AgentContext) -> Status {
        ctx.has_action_point().into()
    }
}

// ============================================================================
// Actions
// ============================================================================

pub struct AttackOpponent;

impl Behavior<AgentContext> for AttackOpponent {
    fn tick(&self, ctx: &mut AgentContext) -> Status {
        let opponent = ctx
            .instance
            .combat
            .as_ref()
            .and_then(|combat| combat.opponent_of(ctx.me));
        match opponent {
            Some(opponent) => ctx.decide(AgentStep::Attack(opponent)),
            None => Status::Failure,
        }
    }
}

pub struct TryEscape;

impl Behavior<AgentContext> for TryEscape {
    fn tick(&self, ctx: &mut AgentContext) -> Status {
        ctx.decide(AgentStep::Escape)
    }
}

/// Keeps the best items by profile priority.
pub struct ResolvePickup;

impl Behavior<AgentContext> for ResolvePickup {
    fn tick(&self, ctx: &mut AgentContext) -> Status {
        let Some(pending) = ctx.instance.pending_pickup else {
            return Status::Failure;
        };
        let Some(carried) = ctx
            .instance
            .player(ctx.me)
            .map(|player| player.inventory.items().to_vec())
        else {
            return Status::Failure;
        };
        let (keep, dropped) = resolve_inventory(ctx.profile(), &carried, pending.item);
        ctx.decide(AgentStep::UpdateInventory { keep, dropped })
    }
}

pub struct EndTurn;

impl Behavior<AgentContext> for EndTurn {
    fn tick(&self, ctx: &mut AgentContext) -> Status {
        if !ctx.is_turn_holder() {
            return Status::Failure;
        }
        ctx.decide(AgentStep::EndTurn)
    }
}

/// Random affordable destination on the real grid.
pub struct Wander;

impl Behavior<AgentContext> for Wander {
    fn tick(&self, ctx: &mut AgentContext) -> Status {
        let mut destinations: Vec<Position> = ctx.reachable().into_keys().collect();
        if destinations.is_empty() {
            return Status::Failure;
        }
        destinations.sort();
        let pick = destinations[ctx.rng.gen_range(0..destinations.len())];
        ctx.memory.wandered = true;
        tracing::trace!(target: "runtime::agent", player = %ctx.me, %pick, "wandering");
        ctx.decide(AgentStep::Move(pick))
    }
}

/// Carries the objective flag back home.
pub struct ReturnFlag;

impl Behavior<AgentContext> for ReturnFlag {
    fn tick(&self, ctx: &mut AgentContext) -> Status {
        let Some(player) = ctx.instance.player(ctx.me) else {
            return Status::Failure;
        };
        if !player.inventory.contains(ItemKind::FlagA) {
            return Status::Failure;
        }
        let home = player.home;
        let Some(position) = ctx.position() else {
            return Status::Failure;
        };
        let planning = ctx.planning_grid();
        let horizon = search_horizon(&planning);
        let Some(path) = reachable_set(horizon, &planning, position).remove(&home) else {
            return Status::Failure;
        };
        match ctx.advance_along(&path) {
            Some(step) => ctx.decide(step),
            None => Status::Failure,
        }
    }
}

/// Heads for the most wanted item reachable this turn.
///
/// Reachability is computed on the doors-open planning grid. With a full
/// inventory only items outranking the worst carried one qualify.
pub struct SeekItem;

impl Behavior<AgentContext> for SeekItem {
    fn tick(&self, ctx: &mut AgentContext) -> Status {
        let Some(position) = ctx.position() else {
            return Status::Failure;
        };
        let Some(player) = ctx.instance.player(ctx.me) else {
            return Status::Failure;
        };
        let profile = ctx.profile();
        let carried = player.inventory.items().to_vec();
        let full = carried.len() >= GameConfig::INVENTORY_CAPACITY;
        let worst = carried
            .iter()
            .copied()
            .max_by_key(|item| profile.rank(*item).unwrap_or(usize::MAX));

        let planning = ctx.planning_grid();
        let reachable = reachable_set(ctx.budget(), &planning, position);

        let mut candidates: Vec<(usize, u32, Position, Vec<Position>)> = reachable
            .into_iter()
            .filter_map(|(cell, path)| {
                let item = ctx.instance.grid.item(cell)?;
                if !item.is_collectible() || carried.contains(&item) {
                    return None;
                }
                let rank = profile.rank(item)?;
                if full && !worst.is_some_and(|worst| profile.prefers(item, worst)) {
                    return None;
                }
                let cost = ctx.planned_cost(&planning, &path);
                Some((rank, cost, cell, path))
            })
            .collect();
        candidates.sort_by(|a, b| (a.0, a.1, a.2).cmp(&(b.0, b.1, b.2)));

        for (_, _, cell, path) in candidates {
            if let Some(step) = ctx.advance_along(&path) {
                tracing::trace!(
                    target: "runtime::agent",
                    player = %ctx.me,
                    goal = %cell,
                    "seeking item"
                );
                return ctx.decide(step);
            }
        }
        Status::Failure
    }
}

/// Walks towards a free cell next to the nearest other player.
pub struct ChasePlayer;

impl Behavior<AgentContext> for ChasePlayer {
    fn tick(&self, ctx: &mut AgentContext) -> Status {
        let Some(position) = ctx.position() else {
            return Status::Failure;
        };
        let planning = ctx.planning_grid();
        let reachable = reachable_set(search_horizon(&planning), &planning, position);

        let mut best: Option<(u32, Position, &Vec<Position>)> = None;
        for coord in ctx.instance.players() {
            if coord.player.id == ctx.me {
                continue;
            }
            for neighbor in coord.position.neighbors() {
                let Some(path) = reachable.get(&neighbor) else {
                    continue;
                };
                let cost = ctx.planned_cost(&planning, path);
                let closer = best.is_none_or(|(best_cost, best_cell, _)| {
                    (cost, neighbor) < (best_cost, best_cell)
                });
                if closer {
                    best = Some((cost, neighbor, path));
                }
            }
        }

        let Some((_, target, path)) = best else {
            return Status::Failure;
        };
        match ctx.advance_along(path) {
            Some(step) => {
                tracing::trace!(target: "runtime::agent", player = %ctx.me, %target, "chasing");
                ctx.decide(step)
            }
            None => Status::Failure,
        }
    }
}

pub struct Engage;

impl Behavior<AgentContext> for Engage {
    fn tick(&self, ctx: &mut AgentContext) -> Status {
        match ctx.adjacent_opponents().first() {
            Some(target) => ctx.decide(AgentStep::Engage(*target)),
            None => Status::Failure,
        }
    }
}

/// Budget large enough to cover any path on the grid.
fn search_horizon(grid: &game_core::Grid) -> u32 {
    (grid.len() as u32).saturating_mul(2)
}
