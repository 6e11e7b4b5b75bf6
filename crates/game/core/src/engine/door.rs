use crate::state::{PlayerId, Position, TileKind};

use super::{ActionError, DoorError, GameEngine};

/// A door that changed state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DoorToggle {
    pub player: PlayerId,
    pub position: Position,
    /// Terrain after the toggle.
    pub kind: TileKind,
}

impl<'a> GameEngine<'a> {
    /// Opens or closes a door next to the player, spending its action point.
    pub fn interact_door(
        &mut self,
        player: PlayerId,
        door: Position,
    ) -> Result<DoorToggle, ActionError> {
        self.require_acting(player)?;
        self.require_no_pending_pickup(player)?;
        if self.instance.in_combat() {
            return Err(ActionError::CombatInProgress);
        }
        if self.instance.action_points == 0 {
            return Err(DoorError::NoActionPoints.into());
        }

        let player_at = self
            .instance
            .position_of(player)
            .ok_or(ActionError::UnknownPlayer(player))?;
        let tile = self
            .instance
            .grid
            .tile(door)
            .filter(|tile| tile.kind.is_door())
            .ok_or(DoorError::NotADoor(door))?;
        if !player_at.is_adjacent(door) {
            return Err(DoorError::NotAdjacent { player_at, door }.into());
        }
        if tile.is_occupied() {
            return Err(DoorError::Blocked(door).into());
        }

        let kind = tile.kind.toggled();
        self.instance.grid.set_kind(door, kind);
        self.instance.action_points -= 1;
        self.instance.statistics.record_door(door);

        tracing::debug!(
            target: "game_core::engine",
            room = %self.instance.room_id,
            %player,
            %door,
            %kind,
            "door toggled"
        );

        Ok(DoorToggle {
            player,
            position: door,
            kind,
        })
    }
}
