//! Mutable state of one room's session.

use std::collections::BTreeMap;

use crate::config::GameConfig;

use super::{
    CombatState, Countdown, GameStatistics, Grid, ItemKind, Player, PlayerCoord, PlayerId,
    Position, RoomId,
};

/// Lifecycle of the session as a whole.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GamePhase {
    /// Grid copied, players not yet seated.
    Setup,
    Playing,
    Ended,
}

/// Progress of the current turn holder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TurnPhase {
    AwaitingStart,
    Acting,
}

/// Item a player stepped on with a full inventory, waiting for a keep/drop choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PendingPickup {
    pub player: PlayerId,
    pub position: Position,
    pub item: ItemKind,
}

/// Everything a room owns while a session runs.
///
/// Players are keyed by id; the turn sequence is a separate list of ids so
/// removing a player never shifts unrelated entries out from under an index.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameInstance {
    pub room_id: RoomId,
    pub grid: Grid,
    players: BTreeMap<PlayerId, PlayerCoord>,
    turn_order: Vec<PlayerId>,
    turn_index: usize,
    pub turn_phase: TurnPhase,
    pub movement_budget: u32,
    pub action_points: u32,
    pub combat: Option<CombatState>,
    pub turn_clock: Countdown,
    pub combat_clock: Countdown,
    pub statistics: GameStatistics,
    pub debug: bool,
    pub pending_pickup: Option<PendingPickup>,
    pub phase: GamePhase,
    pub winner: Option<PlayerId>,
}

impl GameInstance {
    /// Creates an unseated instance that exclusively owns `grid`.
    pub fn new(room_id: RoomId, grid: Grid, config: &GameConfig) -> Self {
        Self {
            room_id,
            grid,
            players: BTreeMap::new(),
            turn_order: Vec::new(),
            turn_index: 0,
            turn_phase: TurnPhase::AwaitingStart,
            movement_budget: 0,
            action_points: 0,
            combat: None,
            turn_clock: Countdown::new(config.turn_seconds),
            combat_clock: Countdown::new(config.combat_seconds),
            statistics: GameStatistics::default(),
            debug: false,
            pending_pickup: None,
            phase: GamePhase::Setup,
            winner: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id).map(|coord| &coord.player)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id).map(|coord| &mut coord.player)
    }

    pub fn coord(&self, id: PlayerId) -> Option<&PlayerCoord> {
        self.players.get(&id)
    }

    pub fn position_of(&self, id: PlayerId) -> Option<Position> {
        self.players.get(&id).map(|coord| coord.position)
    }

    /// Players in id order.
    pub fn players(&self) -> impl Iterator<Item = &PlayerCoord> + '_ {
        self.players.values()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn contains_player(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    pub fn player_at(&self, position: Position) -> Option<PlayerId> {
        self.grid.occupant(position)
    }

    pub fn turn_order(&self) -> &[PlayerId] {
        &self.turn_order
    }

    pub fn current_player(&self) -> Option<PlayerId> {
        self.turn_order.get(self.turn_index).copied()
    }

    pub fn is_turn_holder(&self, id: PlayerId) -> bool {
        self.current_player() == Some(id)
    }

    pub fn in_combat(&self) -> bool {
        self.combat.is_some()
    }

    /// Seats a player and marks its cell occupied.
    pub(crate) fn seat(&mut self, player: Player, position: Position) {
        let id = player.id;
        self.grid.set_occupant(position, Some(id));
        self.players.insert(id, PlayerCoord { player, position });
        self.record_visit(id, position);
    }

    pub(crate) fn set_turn_order(&mut self, order: Vec<PlayerId>) {
        self.turn_order = order;
        self.turn_index = 0;
        self.turn_phase = TurnPhase::AwaitingStart;
    }

    /// Moves the turn to the next player in the sequence.
    pub(crate) fn advance_turn(&mut self) -> Option<PlayerId> {
        if self.turn_order.is_empty() {
            self.turn_index = 0;
            return None;
        }
        self.turn_index = (self.turn_index + 1) % self.turn_order.len();
        self.turn_phase = TurnPhase::AwaitingStart;
        self.current_player()
    }

    /// Removes a player from the grid, roster and turn sequence.
    ///
    /// Returns the removed record and whether that player held the turn. When
    /// it did, the index already points at the following player.
    pub(crate) fn remove_player(&mut self, id: PlayerId) -> Option<(PlayerCoord, bool)> {
        let coord = self.players.remove(&id)?;
        if self.grid.occupant(coord.position) == Some(id) {
            self.grid.set_occupant(coord.position, None);
        }

        let mut held_turn = false;
        if let Some(index) = self.turn_order.iter().position(|entry| *entry == id) {
            held_turn = index == self.turn_index;
            self.turn_order.remove(index);
            if index < self.turn_index {
                self.turn_index -= 1;
            }
            if self.turn_order.is_empty() {
                self.turn_index = 0;
            } else {
                self.turn_index %= self.turn_order.len();
            }
            if held_turn {
                self.turn_phase = TurnPhase::AwaitingStart;
            }
        }

        if self.pending_pickup.is_some_and(|pending| pending.player == id) {
            self.pending_pickup = None;
        }

        Some((coord, held_turn))
    }

    /// Moves a player to `to`, keeping grid occupancy in sync.
    pub(crate) fn relocate(&mut self, id: PlayerId, to: Position) -> bool {
        let Some(from) = self.position_of(id) else {
            return false;
        };
        if self.grid.occupant(from) == Some(id) {
            self.grid.set_occupant(from, None);
        }
        self.grid.set_occupant(to, Some(id));
        if let Some(coord) = self.players.get_mut(&id) {
            coord.position = to;
        }
        self.record_visit(id, to);
        true
    }

    fn record_visit(&mut self, id: PlayerId, position: Position) {
        self.statistics.record_visit(position);
        if let Some(player) = self.player_mut(id) {
            player.stats.tiles_visited.insert(position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Attributes, PlayerSpec, TileKind};

    fn seated(ids: &[u32]) -> GameInstance {
        let config = GameConfig::default();
        let mut instance = GameInstance::new(
            RoomId::from("room"),
            Grid::filled(5, 1, TileKind::Floor),
            &config,
        );
        for (x, id) in ids.iter().enumerate() {
            let spec = PlayerSpec::human(PlayerId(*id), format!("p{id}"), Attributes::default());
            let home = Position::new(x as i32, 0);
            instance.seat(Player::from_spec(spec, home), home);
        }
        instance.set_turn_order(ids.iter().copied().map(PlayerId).collect());
        instance
    }

    #[test]
    fn removing_earlier_player_keeps_current_holder() {
        let mut instance = seated(&[1, 2, 3]);
        instance.advance_turn();
        assert_eq!(instance.current_player(), Some(PlayerId(2)));

        let (_, held) = instance.remove_player(PlayerId(1)).unwrap();
        assert!(!held);
        assert_eq!(instance.current_player(), Some(PlayerId(2)));
        assert!(instance.grid.is_free(Position::new(0, 0)));
    }

    #[test]
    fn removing_holder_hands_turn_to_next_player() {
        let mut instance = seated(&[1, 2, 3]);
        instance.advance_turn();
        instance.advance_turn();

        let (_, held) = instance.remove_player(PlayerId(3)).unwrap();
        assert!(held);
        assert_eq!(instance.current_player(), Some(PlayerId(1)));
    }

    #[test]
    fn removing_last_player_leaves_empty_order() {
        let mut instance = seated(&[1]);
        instance.remove_player(PlayerId(1));
        assert_eq!(instance.current_player(), None);
        assert_eq!(instance.advance_turn(), None);
    }

    #[test]
    fn relocate_moves_occupancy() {
        let mut instance = seated(&[1]);
        assert!(instance.relocate(PlayerId(1), Position::new(4, 0)));
        assert_eq!(instance.player_at(Position::new(4, 0)), Some(PlayerId(1)));
        assert_eq!(instance.player_at(Position::new(0, 0)), None);
        assert_eq!(instance.statistics.tiles_visited.len(), 2);
    }
}
