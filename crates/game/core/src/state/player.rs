//! Players, their attributes and inventories.

use arrayvec::ArrayVec;

use crate::config::GameConfig;

use super::{AgentProfile, ItemKind, PlayerId, PlayerStats, Position};

/// Which attribute a player's bonus die favours.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DiceKind {
    /// Large die on attack rolls, small die on defense rolls.
    #[default]
    Attack,
    /// Large die on defense rolls, small die on attack rolls.
    Defense,
}

impl DiceKind {
    pub fn favours_attack(self) -> bool {
        matches!(self, DiceKind::Attack)
    }

    pub fn favours_defense(self) -> bool {
        matches!(self, DiceKind::Defense)
    }
}

/// Combat-relevant attributes of a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attributes {
    pub health: u32,
    pub attack: u32,
    pub defense: u32,
    pub speed: u32,
    pub dice: DiceKind,
}

impl Attributes {
    pub const fn new(health: u32, attack: u32, defense: u32, speed: u32, dice: DiceKind) -> Self {
        Self {
            health,
            attack,
            defense,
            speed,
            dice,
        }
    }

    pub fn with_bonus(self, bonus: Bonus) -> Self {
        Self {
            health: self.health + bonus.health,
            attack: self.attack + bonus.attack,
            defense: self.defense + bonus.defense,
            speed: self.speed + bonus.speed,
            dice: self.dice,
        }
    }
}

impl Default for Attributes {
    fn default() -> Self {
        Self::new(4, 4, 4, 4, DiceKind::Attack)
    }
}

/// Additive attribute bonus granted by carried items.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Bonus {
    pub health: u32,
    pub attack: u32,
    pub defense: u32,
    pub speed: u32,
}

impl Bonus {
    pub const NONE: Self = Self {
        health: 0,
        attack: 0,
        defense: 0,
        speed: 0,
    };

    pub const fn health(amount: u32) -> Self {
        Self {
            health: amount,
            ..Self::NONE
        }
    }

    pub const fn attack(amount: u32) -> Self {
        Self {
            attack: amount,
            ..Self::NONE
        }
    }

    pub const fn defense(amount: u32) -> Self {
        Self {
            defense: amount,
            ..Self::NONE
        }
    }

    pub const fn speed(amount: u32) -> Self {
        Self {
            speed: amount,
            ..Self::NONE
        }
    }
}

impl std::ops::Add for Bonus {
    type Output = Bonus;

    fn add(self, rhs: Bonus) -> Bonus {
        Bonus {
            health: self.health + rhs.health,
            attack: self.attack + rhs.attack,
            defense: self.defense + rhs.defense,
            speed: self.speed + rhs.speed,
        }
    }
}

/// Ordered inventory with a fixed capacity.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Inventory {
    items: ArrayVec<ItemKind, { GameConfig::INVENTORY_CAPACITY }>,
}

impl Inventory {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.is_full()
    }

    pub fn contains(&self, item: ItemKind) -> bool {
        self.items.contains(&item)
    }

    pub fn items(&self) -> &[ItemKind] {
        &self.items
    }

    /// Appends an item, handing it back when the inventory is full.
    pub fn push(&mut self, item: ItemKind) -> Result<(), ItemKind> {
        self.items.try_push(item).map_err(|err| err.element())
    }

    /// Removes the first occurrence of `item`.
    pub fn remove(&mut self, item: ItemKind) -> bool {
        match self.items.iter().position(|carried| *carried == item) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }

    /// Empties the inventory, returning the items in carry order.
    pub fn take_all(&mut self) -> Vec<ItemKind> {
        self.items.drain(..).collect()
    }

    pub fn bonus(&self) -> Bonus {
        self.items
            .iter()
            .fold(Bonus::NONE, |acc, item| acc + item.bonus())
    }
}

/// Roster entry used to seat a player when a session is set up.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerSpec {
    pub id: PlayerId,
    pub name: String,
    pub attributes: Attributes,
    /// Present for virtual players.
    #[cfg_attr(feature = "serde", serde(default))]
    pub profile: Option<AgentProfile>,
}

impl PlayerSpec {
    pub fn human(id: PlayerId, name: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            id,
            name: name.into(),
            attributes,
            profile: None,
        }
    }

    pub fn virtual_player(
        id: PlayerId,
        name: impl Into<String>,
        attributes: Attributes,
        profile: AgentProfile,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            attributes,
            profile: Some(profile),
        }
    }
}

/// A seated player.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Base attributes, never modified by combat.
    pub attributes: Attributes,
    /// Combat-modified attributes; only set while fighting.
    pub current: Option<Attributes>,
    pub inventory: Inventory,
    pub wins: u32,
    /// Starting cell, fixed when the session starts.
    pub home: Position,
    pub stats: PlayerStats,
    pub profile: Option<AgentProfile>,
}

impl Player {
    pub fn from_spec(spec: PlayerSpec, home: Position) -> Self {
        Self {
            id: spec.id,
            name: spec.name,
            attributes: spec.attributes,
            current: None,
            inventory: Inventory::empty(),
            wins: 0,
            home,
            stats: PlayerStats::default(),
            profile: spec.profile,
        }
    }

    pub fn is_virtual(&self) -> bool {
        self.profile.is_some()
    }

    /// Base attributes plus the bonuses of carried items.
    pub fn effective_attributes(&self) -> Attributes {
        self.attributes.with_bonus(self.inventory.bonus())
    }

    /// Attributes used in a fight: the combat snapshot if any, else effective ones.
    pub fn combat_attributes(&self) -> Attributes {
        self.current.unwrap_or_else(|| self.effective_attributes())
    }

    pub fn reset_current(&mut self) {
        self.current = None;
    }
}

/// A player together with its position on the grid.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerCoord {
    pub player: Player,
    pub position: Position,
}
