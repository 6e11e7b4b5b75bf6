use super::PlayerId;

/// Transient duel between exactly two players of a room.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatState {
    fighters: [PlayerId; 2],
    /// Index into `fighters` of the fighter expected to act.
    turn: usize,
    escape_tokens: [u32; 2],
    /// Fighter hit by the most recent successful attack.
    last_attacked: Option<PlayerId>,
}

impl CombatState {
    /// Creates an engagement; `first` acts first and must be one of the fighters.
    pub fn new(fighters: [PlayerId; 2], first: PlayerId, escape_tokens: u32) -> Self {
        let turn = usize::from(fighters[1] == first && fighters[0] != first);
        Self {
            fighters,
            turn,
            escape_tokens: [escape_tokens; 2],
            last_attacked: None,
        }
    }

    pub fn fighters(&self) -> [PlayerId; 2] {
        self.fighters
    }

    pub fn involves(&self, player: PlayerId) -> bool {
        self.fighters.contains(&player)
    }

    fn slot(&self, player: PlayerId) -> Option<usize> {
        self.fighters.iter().position(|fighter| *fighter == player)
    }

    pub fn current_fighter(&self) -> PlayerId {
        self.fighters[self.turn]
    }

    pub fn is_turn_of(&self, player: PlayerId) -> bool {
        self.current_fighter() == player
    }

    pub fn opponent_of(&self, player: PlayerId) -> Option<PlayerId> {
        self.slot(player).map(|slot| self.fighters[1 - slot])
    }

    pub fn pass_turn(&mut self) {
        self.turn = 1 - self.turn;
    }

    pub fn escape_tokens(&self, player: PlayerId) -> Option<u32> {
        self.slot(player).map(|slot| self.escape_tokens[slot])
    }

    /// Spends one escape token; false when the fighter has none left.
    pub fn consume_escape_token(&mut self, player: PlayerId) -> bool {
        match self.slot(player) {
            Some(slot) if self.escape_tokens[slot] > 0 => {
                self.escape_tokens[slot] -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn last_attacked(&self) -> Option<PlayerId> {
        self.last_attacked
    }

    pub fn mark_attacked(&mut self, player: PlayerId) {
        self.last_attacked = Some(player);
    }
}
