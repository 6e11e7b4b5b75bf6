//! Topic-based event bus shared by every room.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use game_core::RoomId;

use super::types::{CombatEvent, ItemEvent, SessionEvent, TurnEvent};

/// Topics for event routing.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Session start, departures and the final summary.
    Session,
    /// Turn changes, movement and doors.
    Turn,
    /// Engagements.
    Combat,
    /// Pickups, drops and replacements.
    Item,
}

/// Event wrapper carrying the room it happened in and the typed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Session { room: RoomId, event: SessionEvent },
    Turn { room: RoomId, event: TurnEvent },
    Combat { room: RoomId, event: CombatEvent },
    Item { room: RoomId, event: ItemEvent },
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Session { .. } => Topic::Session,
            Event::Turn { .. } => Topic::Turn,
            Event::Combat { .. } => Topic::Combat,
            Event::Item { .. } => Topic::Item,
        }
    }

    pub fn room(&self) -> &RoomId {
        match self {
            Event::Session { room, .. }
            | Event::Turn { room, .. }
            | Event::Combat { room, .. }
            | Event::Item { room, .. } => room,
        }
    }
}

/// Topic-based event bus.
///
/// Channels are created up front, one per topic, so publishing never locks.
/// Events are best-effort: with no subscriber on a topic they are dropped.
#[derive(Clone)]
pub struct EventBus {
    session: broadcast::Sender<Event>,
    turn: broadcast::Sender<Event>,
    combat: broadcast::Sender<Event>,
    item: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Creates a bus whose topics each buffer `capacity` events per subscriber.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            session: broadcast::channel(capacity).0,
            turn: broadcast::channel(capacity).0,
            combat: broadcast::channel(capacity).0,
            item: broadcast::channel(capacity).0,
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Session => &self.session,
            Topic::Turn => &self.turn,
            Topic::Combat => &self.combat,
            Topic::Item => &self.item,
        }
    }

    /// Publish an event to its corresponding topic.
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            tracing::trace!(target: "runtime::events", ?topic, "no subscribers");
        }
    }

    /// Subscribe to a specific topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }

    /// Subscribe to several topics at once.
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> Vec<broadcast::Receiver<Event>> {
        topics.iter().map(|topic| self.subscribe(*topic)).collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn_event(room: &str) -> Event {
        Event::Turn {
            room: RoomId::from(room),
            event: TurnEvent::TurnExpired {
                player: game_core::PlayerId(1),
            },
        }
    }

    #[tokio::test]
    async fn subscribers_only_see_their_topic() {
        let bus = EventBus::with_capacity(8);
        let mut turns = bus.subscribe(Topic::Turn);
        let mut combat = bus.subscribe(Topic::Combat);

        bus.publish(turn_event("alpha"));

        let received = turns.recv().await.unwrap();
        assert_eq!(received.room(), &RoomId::from("alpha"));
        assert_eq!(received.topic(), Topic::Turn);
        assert!(combat.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        let bus = EventBus::new();
        bus.publish(turn_event("alpha"));
    }
}
