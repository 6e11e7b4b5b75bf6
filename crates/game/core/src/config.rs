/// Game configuration constants and tunable rule parameters.
///
/// Probabilities are expressed as integer percentages so that rolls stay
/// exact and easy to reason about in tests.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameConfig {
    /// Escape tokens granted to each fighter when an engagement starts.
    pub escape_tokens: u32,
    /// Chance (0-100) that an escape attempt succeeds.
    pub escape_chance: u32,
    /// Chance (0-100) that stepping onto ice ends the move.
    pub slip_chance: u32,
    /// Attack and defense penalty for fighters standing on ice.
    pub ice_penalty: u32,
    /// Health removed by a successful attack.
    pub attack_damage: u32,
    /// Combat victories needed to win the session.
    pub wins_to_win: u32,
    /// Bonus die size for the attribute favoured by a player's dice.
    pub favoured_die: u32,
    /// Bonus die size for the attribute not favoured by a player's dice.
    pub regular_die: u32,
    /// Seconds a player has to finish a turn.
    pub turn_seconds: u32,
    /// Seconds a fighter has to act before an automatic attack.
    pub combat_seconds: u32,
    /// Chance (0-100) that a virtual player makes an exploratory random move.
    pub exploration_chance: u32,
}

impl GameConfig {
    // ===== compile-time constants used as type parameters =====
    /// Items a player can carry at once.
    pub const INVENTORY_CAPACITY: usize = 2;
    /// Action points granted at the start of every turn.
    pub const ACTION_POINTS_PER_TURN: u32 = 1;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_ESCAPE_TOKENS: u32 = 2;
    pub const DEFAULT_ESCAPE_CHANCE: u32 = 30;
    pub const DEFAULT_SLIP_CHANCE: u32 = 10;
    pub const DEFAULT_ICE_PENALTY: u32 = 2;
    pub const DEFAULT_ATTACK_DAMAGE: u32 = 1;
    pub const DEFAULT_WINS_TO_WIN: u32 = 3;
    pub const DEFAULT_TURN_SECONDS: u32 = 30;
    pub const DEFAULT_COMBAT_SECONDS: u32 = 5;
    pub const DEFAULT_EXPLORATION_CHANCE: u32 = 10;

    pub fn new() -> Self {
        Self {
            escape_tokens: Self::DEFAULT_ESCAPE_TOKENS,
            escape_chance: Self::DEFAULT_ESCAPE_CHANCE,
            slip_chance: Self::DEFAULT_SLIP_CHANCE,
            ice_penalty: Self::DEFAULT_ICE_PENALTY,
            attack_damage: Self::DEFAULT_ATTACK_DAMAGE,
            wins_to_win: Self::DEFAULT_WINS_TO_WIN,
            favoured_die: 6,
            regular_die: 4,
            turn_seconds: Self::DEFAULT_TURN_SECONDS,
            combat_seconds: Self::DEFAULT_COMBAT_SECONDS,
            exploration_chance: Self::DEFAULT_EXPLORATION_CHANCE,
        }
    }

    /// Configuration without random slips or exploration, used by scenario tests.
    pub fn deterministic() -> Self {
        Self {
            slip_chance: 0,
            exploration_chance: 0,
            ..Self::new()
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}
