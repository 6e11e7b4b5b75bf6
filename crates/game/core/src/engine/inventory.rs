//! Item pickup and the keep/drop choice on a full inventory.

use crate::config::GameConfig;
use crate::state::{ItemKind, PendingPickup, PlayerId, Position};

use super::{ActionError, GameEngine, GameOver, InventoryError};

/// What happened when a player stepped on an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickupOutcome {
    PickedUp { item: ItemKind, position: Position },
    /// The item stays on the cell until the player picks what to keep.
    InventoryFull { pending: PendingPickup },
}

/// Result of resolving a pending pickup.
#[derive(Clone, Debug, PartialEq)]
pub struct InventoryUpdate {
    pub player: PlayerId,
    pub kept: Vec<ItemKind>,
    /// Item left on the player's cell.
    pub dropped: ItemKind,
    pub position: Position,
    pub game_over: Option<GameOver>,
}

impl InventoryUpdate {
    /// True when the player swapped a carried item for the pending one.
    pub fn replaced(&self, pending: ItemKind) -> bool {
        self.dropped != pending
    }
}

impl<'a> GameEngine<'a> {
    pub(super) fn collect_item(
        &mut self,
        player: PlayerId,
        position: Position,
        item: ItemKind,
    ) -> PickupOutcome {
        let pushed = match self.instance.player_mut(player) {
            Some(record) => record.inventory.push(item).is_ok(),
            None => false,
        };

        if !pushed {
            let pending = PendingPickup {
                player,
                position,
                item,
            };
            self.instance.pending_pickup = Some(pending);
            return PickupOutcome::InventoryFull { pending };
        }

        self.instance.grid.set_item(position, None);
        self.record_collected(player, item);
        PickupOutcome::PickedUp { item, position }
    }

    fn record_collected(&mut self, player: PlayerId, item: ItemKind) {
        if matches!(item, ItemKind::FlagA | ItemKind::FlagB) {
            self.instance.statistics.flag_holders.insert(player);
        }
        if let Some(record) = self.instance.player_mut(player) {
            record.stats.items_collected.insert(item);
        }
    }

    /// Resolves a pending pickup.
    ///
    /// `keep` plus `dropped` must be exactly the carried items plus the
    /// pending one; `dropped` is left on the player's cell.
    pub fn update_inventory(
        &mut self,
        player: PlayerId,
        keep: Vec<ItemKind>,
        dropped: ItemKind,
    ) -> Result<InventoryUpdate, ActionError> {
        self.require_playing()?;
        self.require_player(player)?;
        let pending = self
            .instance
            .pending_pickup
            .filter(|pending| pending.player == player)
            .ok_or(InventoryError::NothingPending(player))?;

        let carried = self
            .instance
            .player(player)
            .map(|record| record.inventory.items().to_vec())
            .ok_or(ActionError::UnknownPlayer(player))?;
        if keep.len() > GameConfig::INVENTORY_CAPACITY {
            return Err(InventoryError::InvalidSelection.into());
        }
        let mut offered: Vec<ItemKind> = carried.iter().copied().chain([pending.item]).collect();
        let mut chosen: Vec<ItemKind> = keep.iter().copied().chain([dropped]).collect();
        offered.sort();
        chosen.sort();
        if offered != chosen {
            return Err(InventoryError::InvalidSelection.into());
        }

        if let Some(record) = self.instance.player_mut(player) {
            record.inventory.take_all();
            for item in &keep {
                // Capacity was checked above.
                let _ = record.inventory.push(*item);
            }
        }
        self.instance.grid.set_item(pending.position, Some(dropped));
        self.instance.pending_pickup = None;
        if dropped != pending.item {
            self.record_collected(player, pending.item);
        }

        tracing::debug!(
            target: "game_core::engine",
            room = %self.instance.room_id,
            %player,
            kept = ?keep,
            %dropped,
            "inventory updated"
        );

        let game_over = self.check_objective(player);
        Ok(InventoryUpdate {
            player,
            kept: keep,
            dropped,
            position: pending.position,
            game_over,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::{Fixture, attrs};

    fn full_handed() -> Fixture {
        let mut fixture = Fixture::new(
            ".a..\n....",
            &[
                (1, Position::new(0, 0), attrs(4, 4, 4, 3)),
                (2, Position::new(3, 1), attrs(4, 4, 4, 2)),
            ],
        );
        fixture.start();
        let inventory = &mut fixture.instance.player_mut(PlayerId(1)).unwrap().inventory;
        inventory.push(ItemKind::Sword).unwrap();
        inventory.push(ItemKind::Potion).unwrap();
        fixture.engine().move_to(PlayerId(1), Position::new(1, 0)).unwrap();
        fixture
    }

    #[test]
    fn swapping_leaves_dropped_item_on_cell() {
        let mut fixture = full_handed();

        let update = fixture
            .engine()
            .update_inventory(
                PlayerId(1),
                vec![ItemKind::Amulet, ItemKind::Sword],
                ItemKind::Potion,
            )
            .unwrap();

        assert!(update.replaced(ItemKind::Amulet));
        let player = fixture.instance.player(PlayerId(1)).unwrap();
        assert_eq!(player.inventory.items(), &[ItemKind::Amulet, ItemKind::Sword]);
        assert_eq!(fixture.instance.grid.item(Position::new(1, 0)), Some(ItemKind::Potion));
        assert!(fixture.instance.pending_pickup.is_none());
    }

    #[test]
    fn declining_keeps_inventory() {
        let mut fixture = full_handed();

        let update = fixture
            .engine()
            .update_inventory(
                PlayerId(1),
                vec![ItemKind::Sword, ItemKind::Potion],
                ItemKind::Amulet,
            )
            .unwrap();

        assert!(!update.replaced(ItemKind::Amulet));
        let player = fixture.instance.player(PlayerId(1)).unwrap();
        assert_eq!(player.inventory.items(), &[ItemKind::Sword, ItemKind::Potion]);
        assert_eq!(fixture.instance.grid.item(Position::new(1, 0)), Some(ItemKind::Amulet));
    }

    #[test]
    fn selection_must_match_offered_items() {
        let mut fixture = full_handed();

        let error = fixture
            .engine()
            .update_inventory(
                PlayerId(1),
                vec![ItemKind::Shield, ItemKind::Sword],
                ItemKind::Potion,
            )
            .unwrap_err();

        assert_eq!(error, ActionError::Inventory(InventoryError::InvalidSelection));
        assert!(fixture.instance.pending_pickup.is_some());
        let player = fixture.instance.player(PlayerId(1)).unwrap();
        assert_eq!(player.inventory.items(), &[ItemKind::Sword, ItemKind::Potion]);
    }

    #[test]
    fn other_players_have_nothing_pending() {
        let mut fixture = full_handed();
        let error = fixture
            .engine()
            .update_inventory(PlayerId(2), vec![], ItemKind::Amulet)
            .unwrap_err();
        assert_eq!(error, ActionError::Inventory(InventoryError::NothingPending(PlayerId(2))));
    }
}
