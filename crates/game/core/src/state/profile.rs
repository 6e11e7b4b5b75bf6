use strum::{Display, EnumIter};

use super::ItemKind;

/// Behaviour profile of a virtual player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum AgentProfile {
    /// Always attacks when fighting, favours offensive items.
    Aggressive,
    /// Tries to escape after being hit, favours protective items.
    Defensive,
}

impl AgentProfile {
    /// Items worth seeking, most wanted first.
    pub fn item_priority(self) -> &'static [ItemKind] {
        match self {
            AgentProfile::Aggressive => &[
                ItemKind::FlagA,
                ItemKind::Sword,
                ItemKind::Amulet,
                ItemKind::Boots,
                ItemKind::Potion,
                ItemKind::Shield,
                ItemKind::FlagB,
            ],
            AgentProfile::Defensive => &[
                ItemKind::FlagA,
                ItemKind::Shield,
                ItemKind::Potion,
                ItemKind::Amulet,
                ItemKind::Boots,
                ItemKind::Sword,
                ItemKind::FlagB,
            ],
        }
    }

    /// Position of `item` in the priority list (0 = most wanted).
    pub fn rank(self, item: ItemKind) -> Option<usize> {
        self.item_priority().iter().position(|wanted| *wanted == item)
    }

    /// True if `candidate` is strictly preferred over `carried`.
    pub fn prefers(self, candidate: ItemKind, carried: ItemKind) -> bool {
        match (self.rank(candidate), self.rank(carried)) {
            (Some(candidate), Some(carried)) => candidate < carried,
            (Some(_), None) => true,
            _ => false,
        }
    }

    /// Whether a fighter with this profile tries to escape after being hit.
    pub fn escapes_when_attacked(self) -> bool {
        matches!(self, AgentProfile::Defensive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn every_profile_ranks_every_collectible_unique_item() {
        for profile in AgentProfile::iter() {
            for item in ItemKind::UNIQUE {
                assert!(profile.rank(item).is_some(), "{profile} misses {item}");
            }
            assert_eq!(profile.rank(ItemKind::StartingPoint), None);
        }
    }

    #[test]
    fn profiles_disagree_on_weapons() {
        assert!(AgentProfile::Aggressive.prefers(ItemKind::Sword, ItemKind::Shield));
        assert!(AgentProfile::Defensive.prefers(ItemKind::Shield, ItemKind::Sword));
        assert!(!AgentProfile::Defensive.prefers(ItemKind::Shield, ItemKind::Shield));
    }
}
