//! High-level runtime orchestrator.
//!
//! The runtime owns the session registry, the shared event bus and the
//! shutdown signal every room worker listens to, and exposes a builder-based
//! API for composing them.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};

use game_core::{GameConfig, PlayerId, PlayerSpec, RoomId, TemplateId};

use crate::api::{CommandOutcome, Result, RoomHandle, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::registry::SessionRegistry;
use crate::templates::{InMemoryTemplateStore, TemplateStore};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub game_config: GameConfig,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// Pause between two cells of a replayed move.
    pub step_delay: Duration,
    /// Period of the room clock; one tick is one second of game time.
    pub tick_interval: Duration,
    /// Shortest thinking pause of a virtual player.
    pub think_min: Duration,
    /// Longest thinking pause of a virtual player.
    pub think_max: Duration,
    /// Seed for every room's generator; entropy when unset.
    pub rng_seed: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            game_config: GameConfig::default(),
            event_buffer_size: 256,
            command_buffer_size: 32,
            step_delay: Duration::from_millis(150),
            tick_interval: Duration::from_secs(1),
            think_min: Duration::from_millis(400),
            think_max: Duration::from_millis(1200),
            rng_seed: None,
        }
    }
}

/// Main runtime that hosts every room.
///
/// Design: rooms are independent workers; the runtime only wires them to the
/// registry, the event bus and the shutdown signal.
pub struct Runtime {
    config: Arc<RuntimeConfig>,
    registry: Arc<SessionRegistry>,
    event_bus: EventBus,
    shutdown_tx: watch::Sender<bool>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Registry of live rooms; cheap to clone and share with transports.
    pub fn registry(&self) -> Arc<SessionRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Subscribe to events from a specific topic, across all rooms.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Creates the room if needed, sets it up and binds the roster to it.
    ///
    /// A rejected setup (e.g. too few starting points) leaves the room open
    /// in its setup phase with no players bound; the outcome is returned
    /// alongside the handle.
    pub async fn open_room(
        &self,
        room_id: RoomId,
        template_id: TemplateId,
        roster: Vec<PlayerSpec>,
    ) -> Result<(RoomHandle, CommandOutcome)> {
        let handle = self
            .registry
            .ensure_instance(room_id.clone(), template_id)
            .await?;
        let players: Vec<PlayerId> = roster.iter().map(|spec| spec.id).collect();
        let outcome = handle.setup(roster).await?;
        if outcome.is_applied() {
            self.registry.bind_players(&room_id, players);
        }
        Ok((handle, outcome))
    }

    /// Signals every room worker to stop and waits for them.
    pub async fn shutdown(self) -> Result<()> {
        // Err only when no worker is listening.
        let _ = self.shutdown_tx.send(true);

        for task in self.registry.take_tasks() {
            task.await.map_err(RuntimeError::WorkerJoin)?;
        }

        tracing::info!(target: "runtime", "runtime shut down");
        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    templates: Option<Arc<dyn TemplateStore>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            templates: None,
        }
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn game_config(mut self, game_config: GameConfig) -> Self {
        self.config.game_config = game_config;
        self
    }

    /// Template source rooms are created from; an empty in-memory store by default.
    pub fn templates(mut self, store: Arc<dyn TemplateStore>) -> Self {
        self.templates = Some(store);
        self
    }

    pub fn build(self) -> Runtime {
        let config = Arc::new(self.config);
        let event_bus = EventBus::with_capacity(config.event_buffer_size);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let templates = self
            .templates
            .unwrap_or_else(|| Arc::new(InMemoryTemplateStore::new()));

        let registry = Arc::new(SessionRegistry::new(
            Arc::clone(&config),
            templates,
            event_bus.clone(),
            shutdown_rx,
        ));

        Runtime {
            config,
            registry,
            event_bus,
            shutdown_tx,
        }
    }
}
