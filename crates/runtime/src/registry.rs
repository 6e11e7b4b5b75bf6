//! Directory of live rooms.
//!
//! The registry maps room ids to the handles of their workers and player ids
//! to the room they play in. A room disappears from the registry as soon as
//! its worker stops, so lookups for finished rooms return `None`.
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use game_core::{GameInstance, PlayerId, RoomId, TemplateId};

use crate::agent::AutonomousAgent;
use crate::api::{Result, RoomHandle, RuntimeError};
use crate::events::EventBus;
use crate::runtime::RuntimeConfig;
use crate::templates::TemplateStore;
use crate::workers::RoomWorker;

struct RoomEntry {
    handle: RoomHandle,
    /// Taken by [`SessionRegistry::take_tasks`] on shutdown.
    task: Option<JoinHandle<()>>,
}

/// Player-to-room bindings, shared with room workers so departures unbind.
#[derive(Clone, Default)]
pub(crate) struct PlayerDirectory(Arc<RwLock<HashMap<PlayerId, RoomId>>>);

impl PlayerDirectory {
    fn room_of(&self, player: PlayerId) -> Option<RoomId> {
        self.0.read().get(&player).cloned()
    }

    fn bind(&self, room_id: &RoomId, players: impl IntoIterator<Item = PlayerId>) {
        let mut bindings = self.0.write();
        for player in players {
            bindings.insert(player, room_id.clone());
        }
    }

    /// Drops `player`'s binding if it still points at `room_id`.
    pub(crate) fn unbind(&self, room_id: &RoomId, player: PlayerId) {
        let mut bindings = self.0.write();
        if bindings.get(&player) == Some(room_id) {
            bindings.remove(&player);
        }
    }

    fn forget_room(&self, room_id: &RoomId) {
        self.0.write().retain(|_, room| room != room_id);
    }
}

/// Owns every room worker spawned by the runtime.
pub struct SessionRegistry {
    rooms: RwLock<HashMap<RoomId, RoomEntry>>,
    players: PlayerDirectory,
    templates: Arc<dyn TemplateStore>,
    config: Arc<RuntimeConfig>,
    agent: Arc<AutonomousAgent>,
    event_bus: EventBus,
    shutdown: watch::Receiver<bool>,
    seeds: Mutex<StdRng>,
}

impl SessionRegistry {
    pub(crate) fn new(
        config: Arc<RuntimeConfig>,
        templates: Arc<dyn TemplateStore>,
        event_bus: EventBus,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let seeds = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let agent = Arc::new(AutonomousAgent::new(
            config.game_config.exploration_chance,
        ));

        Self {
            rooms: RwLock::new(HashMap::new()),
            players: PlayerDirectory::default(),
            templates,
            config,
            agent,
            event_bus,
            shutdown,
            seeds: Mutex::new(seeds),
        }
    }

    /// Returns the room's handle, creating the room from `template_id` first
    /// if it does not exist yet.
    ///
    /// The template is fetched only when the room is created; the room gets
    /// its own copy of the grid.
    pub async fn ensure_instance(
        self: &Arc<Self>,
        room_id: RoomId,
        template_id: TemplateId,
    ) -> Result<RoomHandle> {
        if let Some(handle) = self.get_by_room(&room_id) {
            return Ok(handle);
        }

        let template = self
            .templates
            .fetch(&template_id)
            .await?
            .ok_or_else(|| RuntimeError::TemplateNotFound(template_id.clone()))?;

        let mut rooms = self.rooms.write();
        // Another caller may have created the room while the template loaded.
        if let Some(entry) = rooms.get(&room_id).filter(|entry| !entry.handle.is_closed()) {
            return Ok(entry.handle.clone());
        }

        let instance = GameInstance::new(
            room_id.clone(),
            template.grid.clone(),
            &self.config.game_config,
        );
        let (command_tx, command_rx) = mpsc::channel(self.config.command_buffer_size);
        let rng = StdRng::seed_from_u64(self.seeds.lock().next_u64());
        let worker = RoomWorker::new(
            instance,
            Arc::clone(&self.config),
            Arc::clone(&self.agent),
            rng,
            command_rx,
            self.event_bus.clone(),
            self.players.clone(),
            self.shutdown.clone(),
        );

        let registry = Arc::downgrade(self);
        let finished = room_id.clone();
        let task = tokio::spawn(async move {
            worker.run().await;
            if let Some(registry) = registry.upgrade() {
                registry.release(&finished);
            }
        });

        let handle = RoomHandle::new(room_id.clone(), command_tx);
        rooms.insert(
            room_id.clone(),
            RoomEntry {
                handle: handle.clone(),
                task: Some(task),
            },
        );

        tracing::info!(
            target: "runtime::registry",
            room = %room_id,
            template = %template_id,
            rooms = rooms.len(),
            "room created"
        );
        Ok(handle)
    }

    /// Handle of a live room.
    pub fn get_by_room(&self, room_id: &RoomId) -> Option<RoomHandle> {
        self.rooms
            .read()
            .get(room_id)
            .filter(|entry| !entry.handle.is_closed())
            .map(|entry| entry.handle.clone())
    }

    /// Handle of the live room `player` is bound to.
    pub fn get_by_player_id(&self, player: PlayerId) -> Option<RoomHandle> {
        let room_id = self.players.room_of(player)?;
        self.get_by_room(&room_id)
    }

    /// Associates players with a room for [`get_by_player_id`](Self::get_by_player_id).
    ///
    /// The room's worker drops a binding when that player leaves the game.
    pub fn bind_players(&self, room_id: &RoomId, players: impl IntoIterator<Item = PlayerId>) {
        self.players.bind(room_id, players);
    }

    /// Forgets a room and its player bindings.
    ///
    /// The worker keeps running until its last handle is dropped.
    pub fn remove(&self, room_id: &RoomId) -> Option<RoomHandle> {
        let entry = self.rooms.write().remove(room_id)?;
        self.players.forget_room(room_id);
        tracing::debug!(target: "runtime::registry", room = %room_id, "room removed");
        Some(entry.handle)
    }

    pub fn room_count(&self) -> usize {
        self.rooms
            .read()
            .values()
            .filter(|entry| !entry.handle.is_closed())
            .count()
    }

    pub fn room_ids(&self) -> Vec<RoomId> {
        let mut ids: Vec<RoomId> = self
            .rooms
            .read()
            .iter()
            .filter(|(_, entry)| !entry.handle.is_closed())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Drops a room whose worker has stopped.
    fn release(&self, room_id: &RoomId) {
        let released = {
            let mut rooms = self.rooms.write();
            let stopped = rooms
                .get(room_id)
                .is_some_and(|entry| entry.handle.is_closed());
            stopped && rooms.remove(room_id).is_some()
        };
        if released {
            self.players.forget_room(room_id);
            tracing::debug!(target: "runtime::registry", room = %room_id, "room released");
        }
    }

    pub(crate) fn take_tasks(&self) -> Vec<JoinHandle<()>> {
        self.rooms
            .write()
            .values_mut()
            .filter_map(|entry| entry.task.take())
            .collect()
    }
}
