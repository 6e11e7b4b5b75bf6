//! Room worker that owns one authoritative [`GameInstance`].
//!
//! Receives [`RoomMessage`]s from [`RoomHandle`](crate::RoomHandle)s, applies
//! them through [`GameEngine`] and publishes the resulting events. The same
//! task ticks the room's clocks, paces move replays and drives virtual
//! players after a thinking pause, so nothing else ever touches the instance.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{self, Instant, MissedTickBehavior, Sleep};
use tracing::{debug, info, trace};

use game_core::{
    ActionError, ClockExpiry, GameEngine, GameInstance, GameOver, GamePhase, ItemKind,
    PickupOutcome, Player, PlayerId, PlayerSpec, Position, TurnPhase,
};

use crate::agent::{AgentContext, AutonomousAgent, TurnMemory};
use crate::api::{CommandOutcome, RoomCommand};
use crate::events::{CombatEvent, Event, EventBus, ItemEvent, SessionEvent, TurnEvent};
use crate::registry::PlayerDirectory;
use crate::runtime::RuntimeConfig;

type Applied = std::result::Result<CommandOutcome, ActionError>;

/// Messages accepted by a room worker.
#[derive(Debug)]
pub enum RoomMessage {
    /// Apply a command and report how it went.
    Command {
        command: RoomCommand,
        reply: oneshot::Sender<CommandOutcome>,
    },
    /// Query the current instance (read-only).
    Snapshot { reply: oneshot::Sender<GameInstance> },
}

/// A virtual player waiting out its thinking pause.
struct Thinking {
    player: PlayerId,
    delay: Pin<Box<Sleep>>,
}

/// Background task that runs one room from setup to game end.
pub struct RoomWorker {
    instance: GameInstance,
    config: Arc<RuntimeConfig>,
    agent: Arc<AutonomousAgent>,
    rng: StdRng,
    command_rx: mpsc::Receiver<RoomMessage>,
    event_bus: EventBus,
    directory: PlayerDirectory,
    shutdown: watch::Receiver<bool>,
    thinking: Option<Thinking>,
    memory: TurnMemory,
    started_at: Option<DateTime<Utc>>,
}

impl RoomWorker {
    pub fn new(
        instance: GameInstance,
        config: Arc<RuntimeConfig>,
        agent: Arc<AutonomousAgent>,
        rng: StdRng,
        command_rx: mpsc::Receiver<RoomMessage>,
        event_bus: EventBus,
        directory: PlayerDirectory,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            instance,
            config,
            agent,
            rng,
            command_rx,
            event_bus,
            directory,
            shutdown,
            thinking: None,
            memory: TurnMemory::default(),
            started_at: None,
        }
    }

    /// Main worker loop; returns once the game ended, every handle was
    /// dropped or the runtime shuts down.
    pub async fn run(mut self) {
        let period = self.config.tick_interval;
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(target: "runtime::room", room = %self.instance.room_id, "room worker started");

        loop {
            tokio::select! {
                changed = self.shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                message = self.command_rx.recv() => match message {
                    Some(message) => self.handle_message(message).await,
                    None => break,
                },
                _ = ticker.tick() => self.on_tick().await,
                player = thinking_done(&mut self.thinking) => self.on_thinking_done(player).await,
            }

            if self.instance.phase == GamePhase::Ended || *self.shutdown.borrow() {
                break;
            }
        }

        info!(
            target: "runtime::room",
            room = %self.instance.room_id,
            phase = ?self.instance.phase,
            "room worker stopped"
        );
    }

    async fn handle_message(&mut self, message: RoomMessage) {
        match message {
            RoomMessage::Command { command, reply } => {
                let outcome = self.apply(command).await;
                if reply.send(outcome).is_err() {
                    debug!(target: "runtime::room", "command reply channel closed");
                }
            }
            RoomMessage::Snapshot { reply } => {
                if reply.send(self.instance.clone()).is_err() {
                    debug!(target: "runtime::room", "snapshot reply channel closed");
                }
            }
        }
    }

    fn engine(&mut self) -> GameEngine<'_> {
        GameEngine::new(&mut self.instance, &self.config.game_config, &mut self.rng)
    }

    /// Applies one command and reschedules the agent.
    ///
    /// Requests from players who may not act right now are dropped silently;
    /// other rule violations are reported back but change nothing.
    async fn apply(&mut self, command: RoomCommand) -> CommandOutcome {
        let requester = command.player();
        let result = match command {
            RoomCommand::Setup { roster } => self.setup(roster),
            RoomCommand::StartTurn { player } => self.start_turn(player),
            RoomCommand::Move { player, to } => self.move_player(player, to).await,
            RoomCommand::EndTurn { player, is_final } => self.end_turn(player, is_final),
            RoomCommand::InteractDoor { player, door } => self.interact_door(player, door),
            RoomCommand::GetAvailableMoves { player, budget } => {
                self.available_moves(player, budget)
            }
            RoomCommand::StartCombat { player, target } => self.start_combat(player, target),
            RoomCommand::Attack { player, target } => self.attack(player, target),
            RoomCommand::Escape { player } => self.escape(player),
            RoomCommand::Teleport { player, to } => self.teleport(player, to),
            RoomCommand::UpdateInventory {
                player,
                keep,
                dropped,
            } => self.update_inventory(player, keep, dropped),
            RoomCommand::Quit { player } => self.quit(player),
            RoomCommand::ToggleDebug => self.toggle_debug(),
            RoomCommand::EndCombat => self.end_combat(),
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(error) if error.is_ownership_violation() => {
                debug!(
                    target: "runtime::room",
                    room = %self.instance.room_id,
                    player = ?requester,
                    %error,
                    "ignored command"
                );
                CommandOutcome::Ignored
            }
            Err(error) => {
                debug!(
                    target: "runtime::room",
                    room = %self.instance.room_id,
                    player = ?requester,
                    %error,
                    "rejected command"
                );
                CommandOutcome::Rejected {
                    reason: error.to_string(),
                }
            }
        };

        self.schedule_agent();
        outcome
    }

    // ========================================================================
    // Command handlers
    // ========================================================================

    fn setup(&mut self, roster: Vec<PlayerSpec>) -> Applied {
        let outcome = self.engine().setup(roster)?;
        self.started_at = Some(Utc::now());
        self.publish_session(SessionEvent::GameStarted {
            turn_order: outcome.turn_order,
            homes: outcome.homes,
        });
        Ok(CommandOutcome::Applied)
    }

    fn start_turn(&mut self, player: PlayerId) -> Applied {
        let start = self.engine().start_turn(player)?;
        if self.is_virtual(player) {
            self.memory = TurnMemory::for_player(player);
        }
        self.publish_turn(TurnEvent::TurnStarted {
            player,
            budget: start.budget,
            action_points: start.action_points,
            available: sorted(start.reachable.into_keys()),
        });
        Ok(CommandOutcome::Applied)
    }

    /// Replays a move one cell at a time with the configured delay between
    /// steps; the room handles nothing else until the replay is over.
    async fn move_player(&mut self, player: PlayerId, to: Position) -> Applied {
        let path = self.engine().plan_move(player, to)?;
        let total = path.len();
        let mut slipped = false;

        for (index, next) in path.into_iter().enumerate() {
            let step = self.engine().step(player, next)?;
            slipped |= step.slipped;
            self.publish_turn(TurnEvent::PositionUpdated {
                player,
                position: step.position,
                remaining_budget: step.remaining_budget,
            });
            if let Some(pickup) = step.pickup {
                self.publish_pickup(player, pickup);
            }
            if let Some(game_over) = step.game_over.clone() {
                self.finish_game(game_over);
                return Ok(CommandOutcome::Applied);
            }
            if step.halts() {
                break;
            }
            if index + 1 < total && !self.pause_between_steps().await {
                debug!(target: "runtime::room", %player, "move replay cancelled by shutdown");
                break;
            }
        }

        let summary = self.engine().finish_move(player, slipped)?;
        self.publish_turn(TurnEvent::MoveCompleted {
            player,
            position: summary.position,
            remaining_budget: summary.remaining_budget,
            available: sorted(summary.available.into_keys()),
            slipped: summary.slipped,
        });
        Ok(CommandOutcome::Applied)
    }

    /// Sleeps for one step delay; false when the runtime started shutting down.
    async fn pause_between_steps(&mut self) -> bool {
        let delay = self.config.step_delay;
        tokio::select! {
            _ = time::sleep(delay) => true,
            _ = self.shutdown.changed() => false,
        }
    }

    fn end_turn(&mut self, player: PlayerId, is_final: bool) -> Applied {
        let change = self.engine().end_turn(player, is_final)?;
        if let Some(removed) = change.removed {
            self.directory.unbind(&self.instance.room_id, removed);
            self.publish_session(SessionEvent::PlayerLeft {
                player: removed,
                dropped: change.dropped.clone(),
            });
            self.publish_drops(removed, &change.dropped);
        }
        self.publish_turn(TurnEvent::TurnChanged {
            previous: change.previous,
            next: change.next,
            removed: change.removed,
        });
        if let Some(game_over) = change.game_over {
            self.finish_game(game_over);
        }
        Ok(CommandOutcome::Applied)
    }

    fn interact_door(&mut self, player: PlayerId, door: Position) -> Applied {
        let toggle = self.engine().interact_door(player, door)?;
        self.publish_turn(TurnEvent::DoorToggled {
            player,
            position: toggle.position,
            kind: toggle.kind,
        });
        Ok(CommandOutcome::Applied)
    }

    fn available_moves(&mut self, player: PlayerId, budget: u32) -> Applied {
        let reachable = self.engine().available_moves(player, budget)?;
        Ok(CommandOutcome::AvailableMoves(sorted(reachable.into_keys())))
    }

    fn start_combat(&mut self, player: PlayerId, target: PlayerId) -> Applied {
        let start = self.engine().start_combat(player, target)?;
        self.publish_combat(CombatEvent::Started {
            initiator: start.initiator,
            target: start.target,
            first: start.first,
        });
        Ok(CommandOutcome::Applied)
    }

    fn attack(&mut self, player: PlayerId, target: PlayerId) -> Applied {
        let outcome = self.engine().attack(player, target)?;
        self.publish_combat(CombatEvent::Attacked {
            attacker: outcome.attacker,
            defender: outcome.defender,
            attack_roll: outcome.attack_roll,
            defense_roll: outcome.defense_roll,
            hit: outcome.hit,
            defender_health: outcome.defender_health,
            next_fighter: outcome.next_fighter,
        });

        if let Some(death) = outcome.death {
            self.publish_combat(CombatEvent::PlayerKilled {
                killer: death.killer,
                victim: death.victim,
                killer_wins: death.killer_wins,
                respawn: death.respawn,
            });
            self.publish_combat(CombatEvent::Ended {
                fighters: [death.killer, death.victim],
            });
            self.publish_drops(death.victim, &death.dropped);
            if let Some(next) = death.next_turn {
                self.publish_turn(TurnEvent::TurnChanged {
                    previous: death.victim,
                    next: Some(next),
                    removed: None,
                });
            }
            if let Some(game_over) = death.game_over {
                self.finish_game(game_over);
            }
        }
        Ok(CommandOutcome::Applied)
    }

    fn escape(&mut self, player: PlayerId) -> Applied {
        let fighters = self.instance.combat.as_ref().map(|combat| combat.fighters());
        let outcome = self.engine().escape(player)?;
        self.publish_combat(CombatEvent::Escaped {
            fighter: outcome.fighter,
            success: outcome.success,
            tokens_left: outcome.tokens_left,
            next_fighter: outcome.next_fighter,
        });
        if let (true, Some(fighters)) = (outcome.success, fighters) {
            self.publish_combat(CombatEvent::Ended { fighters });
        }
        Ok(CommandOutcome::Applied)
    }

    fn end_combat(&mut self) -> Applied {
        let fighters = self.engine().end_combat()?;
        self.publish_combat(CombatEvent::Ended { fighters });
        Ok(CommandOutcome::Applied)
    }

    fn teleport(&mut self, player: PlayerId, to: Position) -> Applied {
        let teleport = self.engine().teleport(player, to)?;
        self.publish_turn(TurnEvent::Teleported {
            player,
            from: teleport.from,
            to: teleport.to,
        });
        Ok(CommandOutcome::Applied)
    }

    fn update_inventory(
        &mut self,
        player: PlayerId,
        keep: Vec<ItemKind>,
        dropped: ItemKind,
    ) -> Applied {
        let pending = self.instance.pending_pickup.map(|pending| pending.item);
        let update = self.engine().update_inventory(player, keep, dropped)?;

        if pending.is_some_and(|pending| update.replaced(pending)) {
            self.publish_item(ItemEvent::Replaced {
                player,
                kept: update.kept.clone(),
                dropped: update.dropped,
                position: update.position,
            });
        } else {
            self.publish_item(ItemEvent::Dropped {
                player,
                item: update.dropped,
                position: update.position,
            });
        }
        if let Some(game_over) = update.game_over {
            self.finish_game(game_over);
        }
        Ok(CommandOutcome::Applied)
    }

    fn quit(&mut self, player: PlayerId) -> Applied {
        let outcome = self.engine().quit(player)?;
        if let Some(fighters) = outcome.ended_combat {
            self.publish_combat(CombatEvent::Ended { fighters });
        }
        self.directory.unbind(&self.instance.room_id, player);
        self.publish_session(SessionEvent::PlayerLeft {
            player,
            dropped: outcome.dropped.clone(),
        });
        self.publish_drops(player, &outcome.dropped);
        if outcome.next.is_some() {
            self.publish_turn(TurnEvent::TurnChanged {
                previous: player,
                next: outcome.next,
                removed: Some(player),
            });
        }
        if let Some(game_over) = outcome.game_over {
            self.finish_game(game_over);
        }
        Ok(CommandOutcome::Applied)
    }

    fn toggle_debug(&mut self) -> Applied {
        let enabled = self.engine().toggle_debug();
        info!(
            target: "runtime::room",
            room = %self.instance.room_id,
            enabled,
            "debug mode toggled"
        );
        self.publish_session(SessionEvent::DebugToggled { enabled });
        Ok(CommandOutcome::Applied)
    }

    // ========================================================================
    // Clocks
    // ========================================================================

    async fn on_tick(&mut self) {
        let Some(expiry) = self.engine().tick_clocks() else {
            return;
        };

        match expiry {
            ClockExpiry::Turn(player) => {
                info!(
                    target: "runtime::room",
                    room = %self.instance.room_id,
                    %player,
                    "turn clock expired"
                );
                self.publish_turn(TurnEvent::TurnExpired { player });
                self.apply(RoomCommand::EndTurn {
                    player,
                    is_final: false,
                })
                .await;
            }
            ClockExpiry::Combat(player) => {
                let Some(target) = self
                    .instance
                    .combat
                    .as_ref()
                    .and_then(|combat| combat.opponent_of(player))
                else {
                    return;
                };
                debug!(
                    target: "runtime::room",
                    room = %self.instance.room_id,
                    %player,
                    "combat clock expired, attacking"
                );
                self.apply(RoomCommand::Attack { player, target }).await;
            }
        }
    }

    // ========================================================================
    // Virtual players
    // ========================================================================

    fn is_virtual(&self, player: PlayerId) -> bool {
        self.instance.player(player).is_some_and(Player::is_virtual)
    }

    /// The virtual player expected to act next, if any.
    fn actor_to_drive(&self) -> Option<PlayerId> {
        if !self.instance.is_playing() {
            return None;
        }
        let actor = if let Some(combat) = &self.instance.combat {
            combat.current_fighter()
        } else if let Some(pending) = self.instance.pending_pickup {
            pending.player
        } else {
            self.instance.current_player()?
        };
        self.is_virtual(actor).then_some(actor)
    }

    /// Arms the thinking pause for the next virtual actor.
    ///
    /// A pause already running for the same actor is kept; a pause for
    /// anyone else is dropped, which cancels it.
    fn schedule_agent(&mut self) {
        let Some(actor) = self.actor_to_drive() else {
            if let Some(thinking) = self.thinking.take() {
                trace!(target: "runtime::agent", player = %thinking.player, "thinking cancelled");
            }
            return;
        };
        if self
            .thinking
            .as_ref()
            .is_some_and(|thinking| thinking.player == actor)
        {
            return;
        }

        let delay = self.thinking_delay();
        trace!(target: "runtime::agent", player = %actor, ?delay, "thinking");
        self.thinking = Some(Thinking {
            player: actor,
            delay: Box::pin(time::sleep(delay)),
        });
    }

    fn thinking_delay(&mut self) -> Duration {
        let min = self.config.think_min.as_millis() as u64;
        let max = self.config.think_max.as_millis() as u64;
        if max <= min {
            return self.config.think_min;
        }
        Duration::from_millis(self.rng.gen_range(min..=max))
    }

    async fn on_thinking_done(&mut self, player: PlayerId) {
        self.thinking = None;
        if self.actor_to_drive() != Some(player) {
            self.schedule_agent();
            return;
        }

        let awaiting_start = self.instance.combat.is_none()
            && self.instance.pending_pickup.is_none()
            && self.instance.turn_phase == TurnPhase::AwaitingStart;
        let command = if awaiting_start {
            RoomCommand::StartTurn { player }
        } else {
            let rng = StdRng::seed_from_u64(self.rng.next_u64());
            let memory = std::mem::take(&mut self.memory);
            let mut ctx = AgentContext::new(player, self.instance.clone(), memory, rng);
            let step = self.agent.decide(&mut ctx);
            self.memory = ctx.memory;
            step.into_command(player)
        };

        let outcome = self.apply(command).await;
        if !outcome.is_applied() {
            debug!(target: "runtime::agent", %player, ?outcome, "agent step not applied");
        }
    }

    // ========================================================================
    // Events
    // ========================================================================

    fn finish_game(&mut self, game_over: GameOver) {
        self.thinking = None;
        let ended_at = Utc::now();
        info!(
            target: "runtime::room",
            room = %self.instance.room_id,
            winner = ?game_over.winner,
            reason = ?game_over.reason,
            turns = game_over.statistics.turns,
            "game ended"
        );
        self.publish_session(SessionEvent::GameEnded {
            winner: game_over.winner,
            reason: game_over.reason,
            statistics: game_over.statistics,
            roster: game_over.roster,
            started_at: self.started_at.unwrap_or(ended_at),
            ended_at,
        });
    }

    fn publish_pickup(&self, player: PlayerId, pickup: PickupOutcome) {
        match pickup {
            PickupOutcome::PickedUp { item, position } => {
                self.publish_item(ItemEvent::PickedUp {
                    player,
                    item,
                    position,
                });
            }
            PickupOutcome::InventoryFull { pending } => {
                let carried = self
                    .instance
                    .player(player)
                    .map(|record| record.inventory.items().to_vec())
                    .unwrap_or_default();
                self.publish_item(ItemEvent::ChoiceRequired {
                    player,
                    item: pending.item,
                    carried,
                });
            }
        }
    }

    fn publish_drops(&self, player: PlayerId, dropped: &[(ItemKind, Position)]) {
        for (item, position) in dropped {
            self.publish_item(ItemEvent::Dropped {
                player,
                item: *item,
                position: *position,
            });
        }
    }

    fn publish_session(&self, event: SessionEvent) {
        self.event_bus.publish(Event::Session {
            room: self.instance.room_id.clone(),
            event,
        });
    }

    fn publish_turn(&self, event: TurnEvent) {
        self.event_bus.publish(Event::Turn {
            room: self.instance.room_id.clone(),
            event,
        });
    }

    fn publish_combat(&self, event: CombatEvent) {
        self.event_bus.publish(Event::Combat {
            room: self.instance.room_id.clone(),
            event,
        });
    }

    fn publish_item(&self, event: ItemEvent) {
        self.event_bus.publish(Event::Item {
            room: self.instance.room_id.clone(),
            event,
        });
    }
}

/// Resolves when the armed thinking pause elapses; pending forever otherwise.
async fn thinking_done(thinking: &mut Option<Thinking>) -> PlayerId {
    match thinking {
        Some(thinking) => {
            thinking.delay.as_mut().await;
            thinking.player
        }
        None => std::future::pending().await,
    }
}

fn sorted(positions: impl Iterator<Item = Position>) -> Vec<Position> {
    let mut positions: Vec<Position> = positions.collect();
    positions.sort();
    positions
}
