//! Engagements between two adjacent players.
//!
//! An engagement pauses the turn clock and runs its own combat clock. The
//! fighters alternate; each may attack or, while it holds escape tokens, try
//! to escape. Combat attributes live in [`Player::current`] for the duration
//! of the engagement and are cleared whenever it ends, however it ends.
//!
//! [`Player::current`]: crate::state::Player::current

use crate::rng::{roll_die, roll_percent};
use crate::state::{Attributes, CombatState, ItemKind, PlayerId, Position, Tile};

use super::{ActionError, CombatError, GameEngine, GameOver, GameOverReason, find_free_cells};

/// A started engagement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CombatStart {
    pub initiator: PlayerId,
    pub target: PlayerId,
    /// Fighter that acts first.
    pub first: PlayerId,
    /// Combat attributes of the initiator and the target.
    pub attributes: [(PlayerId, Attributes); 2],
}

/// Result of an attack.
#[derive(Clone, Debug, PartialEq)]
pub struct AttackOutcome {
    pub attacker: PlayerId,
    pub defender: PlayerId,
    pub attack_roll: u32,
    pub defense_roll: u32,
    pub hit: bool,
    /// Defender health after the attack.
    pub defender_health: u32,
    /// Fighter expected to act next; `None` once the engagement is over.
    pub next_fighter: Option<PlayerId>,
    pub death: Option<DeathOutcome>,
}

/// Result of an escape attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EscapeOutcome {
    pub fighter: PlayerId,
    pub success: bool,
    pub tokens_left: u32,
    /// Fighter expected to act next; `None` once the engagement is over.
    pub next_fighter: Option<PlayerId>,
}

/// Consequences of a fighter being killed.
#[derive(Clone, Debug, PartialEq)]
pub struct DeathOutcome {
    pub killer: PlayerId,
    pub victim: PlayerId,
    pub killer_wins: u32,
    pub died_at: Position,
    /// Items scattered around the death cell.
    pub dropped: Vec<(ItemKind, Position)>,
    pub respawn: Position,
    /// New turn holder when the victim held the turn.
    pub next_turn: Option<PlayerId>,
    pub game_over: Option<GameOver>,
}

impl<'a> GameEngine<'a> {
    /// Engages an adjacent player, spending the initiator's action point.
    pub fn start_combat(
        &mut self,
        initiator: PlayerId,
        target: PlayerId,
    ) -> Result<CombatStart, ActionError> {
        self.require_acting(initiator)?;
        self.require_no_pending_pickup(initiator)?;
        if self.instance.in_combat() {
            return Err(CombatError::AlreadyInCombat.into());
        }
        if initiator == target {
            return Err(CombatError::SelfTarget.into());
        }
        self.require_player(target)?;
        let (Some(from), Some(to)) = (
            self.instance.position_of(initiator),
            self.instance.position_of(target),
        ) else {
            return Err(ActionError::UnknownPlayer(target));
        };
        if !from.is_adjacent(to) {
            return Err(CombatError::NotAdjacent(initiator, target).into());
        }
        if self.instance.action_points == 0 {
            return Err(CombatError::NoActionPoints.into());
        }

        self.instance.action_points -= 1;
        self.instance.turn_clock.pause();

        let initiator_attributes = self.enter_combat(initiator, from);
        let target_attributes = self.enter_combat(target, to);

        let first = if target_attributes.speed > initiator_attributes.speed {
            target
        } else {
            initiator
        };
        self.instance.combat = Some(CombatState::new(
            [initiator, target],
            first,
            self.config.escape_tokens,
        ));
        self.instance.combat_clock.restart();

        tracing::debug!(
            target: "game_core::engine",
            room = %self.instance.room_id,
            %initiator,
            %target,
            %first,
            "combat started"
        );

        Ok(CombatStart {
            initiator,
            target,
            first,
            attributes: [(initiator, initiator_attributes), (target, target_attributes)],
        })
    }

    /// Snapshots combat attributes, applying the ice penalty once.
    fn enter_combat(&mut self, fighter: PlayerId, position: Position) -> Attributes {
        let on_ice = self
            .instance
            .grid
            .kind(position)
            .is_some_and(|kind| kind.is_slippery());
        let penalty = self.config.ice_penalty;
        let Some(player) = self.instance.player_mut(fighter) else {
            return Attributes::default();
        };
        player.stats.combats += 1;
        if let Some(current) = player.current {
            return current;
        }
        let mut current = player.effective_attributes();
        if on_ice {
            current.attack = current.attack.saturating_sub(penalty);
            current.defense = current.defense.saturating_sub(penalty);
        }
        player.current = Some(current);
        current
    }

    fn require_fighter_turn(&self, fighter: PlayerId) -> Result<&CombatState, ActionError> {
        self.require_playing()?;
        let combat = self.instance.combat.as_ref().ok_or(CombatError::NoCombat)?;
        if !combat.involves(fighter) {
            return Err(CombatError::NotFighter(fighter).into());
        }
        if !combat.is_turn_of(fighter) {
            return Err(CombatError::NotFighterTurn(fighter).into());
        }
        Ok(combat)
    }

    /// Rolls an attack of `attacker` against `defender`.
    pub fn attack(
        &mut self,
        attacker: PlayerId,
        defender: PlayerId,
    ) -> Result<AttackOutcome, ActionError> {
        let combat = self.require_fighter_turn(attacker)?;
        if combat.opponent_of(attacker) != Some(defender) {
            return Err(CombatError::NotFighter(defender).into());
        }

        let attacking = self.fighter_attributes(attacker)?;
        let defending = self.fighter_attributes(defender)?;

        let attack_die = if attacking.dice.favours_attack() {
            self.config.favoured_die
        } else {
            self.config.regular_die
        };
        let defense_die = if defending.dice.favours_defense() {
            self.config.favoured_die
        } else {
            self.config.regular_die
        };
        let attack_roll = roll_die(self.rng, attack_die);
        let defense_roll = roll_die(self.rng, defense_die);
        let hit = attacking.attack + attack_roll > defending.defense + defense_roll;

        let mut defender_health = defending.health;
        if hit {
            let damage = defending.health.min(self.config.attack_damage);
            defender_health -= damage;
            if let Some(player) = self.instance.player_mut(defender) {
                if let Some(current) = player.current.as_mut() {
                    current.health = defender_health;
                }
                player.stats.health_lost += damage;
            }
            if let Some(player) = self.instance.player_mut(attacker) {
                player.stats.health_dealt += damage;
            }
            if let Some(combat) = self.instance.combat.as_mut() {
                combat.mark_attacked(defender);
            }
        }

        tracing::debug!(
            target: "game_core::engine",
            room = %self.instance.room_id,
            %attacker,
            %defender,
            attack_roll,
            defense_roll,
            hit,
            defender_health,
            "attack"
        );

        if hit && defender_health == 0 {
            let death = self.handle_death(attacker, defender);
            return Ok(AttackOutcome {
                attacker,
                defender,
                attack_roll,
                defense_roll,
                hit,
                defender_health,
                next_fighter: None,
                death: Some(death),
            });
        }

        let next_fighter = self.pass_combat_turn();
        Ok(AttackOutcome {
            attacker,
            defender,
            attack_roll,
            defense_roll,
            hit,
            defender_health,
            next_fighter,
            death: None,
        })
    }

    /// Spends an escape token and tries to leave the engagement.
    pub fn escape(&mut self, fighter: PlayerId) -> Result<EscapeOutcome, ActionError> {
        let combat = self.require_fighter_turn(fighter)?;
        if combat.escape_tokens(fighter).unwrap_or(0) == 0 {
            return Err(CombatError::NoEscapeTokens(fighter).into());
        }

        let tokens_left = match self.instance.combat.as_mut() {
            Some(combat) => {
                combat.consume_escape_token(fighter);
                combat.escape_tokens(fighter).unwrap_or(0)
            }
            None => 0,
        };
        let success = roll_percent(self.rng, self.config.escape_chance);

        tracing::debug!(
            target: "game_core::engine",
            room = %self.instance.room_id,
            %fighter,
            success,
            tokens_left,
            "escape attempt"
        );

        let next_fighter = if success {
            if let Some(player) = self.instance.player_mut(fighter) {
                player.stats.escapes += 1;
            }
            self.finish_combat();
            None
        } else {
            self.pass_combat_turn()
        };

        Ok(EscapeOutcome {
            fighter,
            success,
            tokens_left,
            next_fighter,
        })
    }

    /// Ends the running engagement without a winner.
    pub fn end_combat(&mut self) -> Result<[PlayerId; 2], ActionError> {
        self.require_playing()?;
        if !self.instance.in_combat() {
            return Err(CombatError::NoCombat.into());
        }
        Ok(self.finish_combat())
    }

    /// Clears the engagement, resets both fighters and resumes the turn clock.
    pub(super) fn finish_combat(&mut self) -> [PlayerId; 2] {
        let Some(combat) = self.instance.combat.take() else {
            return [Default::default(); 2];
        };
        let fighters = combat.fighters();
        for fighter in fighters {
            if let Some(player) = self.instance.player_mut(fighter) {
                player.reset_current();
            }
        }
        self.instance.combat_clock.reset();
        self.instance.combat_clock.pause();
        self.instance.turn_clock.resume();

        tracing::debug!(
            target: "game_core::engine",
            room = %self.instance.room_id,
            fighters = ?fighters,
            "combat ended"
        );
        fighters
    }

    fn pass_combat_turn(&mut self) -> Option<PlayerId> {
        let combat = self.instance.combat.as_mut()?;
        combat.pass_turn();
        let next = combat.current_fighter();
        self.instance.combat_clock.restart();
        Some(next)
    }

    fn fighter_attributes(&self, fighter: PlayerId) -> Result<Attributes, ActionError> {
        self.instance
            .player(fighter)
            .map(|player| player.combat_attributes())
            .ok_or(ActionError::UnknownPlayer(fighter))
    }

    fn handle_death(&mut self, killer: PlayerId, victim: PlayerId) -> DeathOutcome {
        let killer_wins = match self.instance.player_mut(killer) {
            Some(player) => {
                player.wins += 1;
                player.stats.victories += 1;
                player.wins
            }
            None => 0,
        };

        let (died_at, home, items) = match self.instance.coord(victim) {
            Some(coord) => (
                coord.position,
                coord.player.home,
                coord.player.inventory.items().to_vec(),
            ),
            None => (Position::ORIGIN, Position::ORIGIN, Vec::new()),
        };
        if let Some(player) = self.instance.player_mut(victim) {
            player.stats.defeats += 1;
            player.inventory.take_all();
        }

        self.finish_combat();

        // The victim leaves first so its death cell can take a dropped item.
        let respawn = self.respawn_cell(victim, died_at, home);
        self.instance.relocate(victim, respawn);
        let dropped = self.scatter_items(died_at, items);

        let next_turn = if self.instance.is_turn_holder(victim) {
            self.instance.movement_budget = 0;
            self.instance.action_points = 0;
            self.instance.turn_clock.reset();
            self.instance.turn_clock.pause();
            self.instance.advance_turn()
        } else {
            None
        };

        tracing::info!(
            target: "game_core::engine",
            room = %self.instance.room_id,
            %killer,
            %victim,
            killer_wins,
            %respawn,
            "player killed"
        );

        let game_over = (killer_wins >= self.config.wins_to_win)
            .then(|| self.finish(Some(killer), GameOverReason::Victories));

        DeathOutcome {
            killer,
            victim,
            killer_wins,
            died_at,
            dropped,
            respawn,
            next_turn,
            game_over,
        }
    }

    /// Home when free, else the nearest free cell around home, else where it died.
    fn respawn_cell(&self, victim: PlayerId, died_at: Position, home: Position) -> Position {
        let grid = &self.instance.grid;
        let home_available = grid
            .tile(home)
            .is_some_and(|tile| {
                tile.kind.is_walkable() && tile.occupant.is_none_or(|id| id == victim)
            });
        if home_available {
            return home;
        }
        find_free_cells(grid, home, 1, Tile::is_free)
            .first()
            .copied()
            .unwrap_or(died_at)
    }

    /// Places items on distinct free cells around `origin`.
    ///
    /// Empty cells are used first, then cells holding only a starting-point
    /// marker. Items are lost only when the grid has no free cell left.
    pub(super) fn scatter_items(
        &mut self,
        origin: Position,
        items: Vec<ItemKind>,
    ) -> Vec<(ItemKind, Position)> {
        if items.is_empty() {
            return Vec::new();
        }
        let grid = &self.instance.grid;
        let mut cells = find_free_cells(grid, origin, items.len(), |tile| {
            tile.is_free() && tile.item.is_none()
        });
        if cells.len() < items.len() {
            let markers = find_free_cells(grid, origin, items.len() - cells.len(), |tile| {
                tile.is_free() && tile.item == Some(ItemKind::StartingPoint)
            });
            cells.extend(markers);
        }
        if cells.len() < items.len() {
            tracing::warn!(
                target: "game_core::engine",
                room = %self.instance.room_id,
                %origin,
                wanted = items.len(),
                found = cells.len(),
                "no free cell left to drop items"
            );
        }

        let mut dropped = Vec::with_capacity(cells.len());
        for (item, cell) in items.into_iter().zip(cells) {
            self.instance.grid.set_item(cell, Some(item));
            dropped.push((item, cell));
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::engine::test_support::{Fixture, attrs};
    use crate::state::{DiceKind, GamePhase};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn duel(layout: &str, first: Attributes, second: Attributes) -> Fixture {
        let mut fixture = Fixture::new(
            layout,
            &[
                (1, Position::new(0, 0), first),
                (2, Position::new(1, 0), second),
            ],
        );
        fixture.start();
        fixture
    }

    /// Attacker that always hits a defenseless target.
    fn brute() -> Attributes {
        Attributes::new(4, 20, 0, 4, DiceKind::Attack)
    }

    fn glass(health: u32) -> Attributes {
        Attributes::new(health, 0, 0, 1, DiceKind::Attack)
    }

    #[test]
    fn ending_an_engagement_restores_both_fighters() {
        let mut fixture = duel("*...", attrs(4, 5, 3, 3), attrs(4, 4, 4, 3));
        assert_eq!(
            fixture.engine().end_combat().unwrap_err(),
            ActionError::Combat(CombatError::NoCombat)
        );

        fixture.engine().start_combat(PlayerId(1), PlayerId(2)).unwrap();
        let fighters = fixture.engine().end_combat().unwrap();

        assert_eq!(fighters, [PlayerId(1), PlayerId(2)]);
        assert!(!fixture.instance.in_combat());
        assert!(fixture.instance.combat_clock.is_paused());
        assert!(!fixture.instance.turn_clock.is_paused());
        for id in fighters {
            let player = fixture.instance.player(id).unwrap();
            assert_eq!(player.current, None);
            assert_eq!(player.stats.victories, 0);
        }
    }

    #[test]
    fn faster_fighter_acts_first_and_ties_go_to_initiator() {
        let mut fixture = duel("....", attrs(4, 4, 4, 2), attrs(4, 4, 4, 5));
        let start = fixture.engine().start_combat(PlayerId(1), PlayerId(2)).unwrap();
        assert_eq!(start.first, PlayerId(2));

        let mut fixture = duel("....", attrs(4, 4, 4, 3), attrs(4, 4, 4, 3));
        let start = fixture.engine().start_combat(PlayerId(1), PlayerId(2)).unwrap();
        assert_eq!(start.first, PlayerId(1));
        assert!(fixture.instance.turn_clock.is_paused());
        assert!(!fixture.instance.combat_clock.is_paused());
        assert_eq!(fixture.instance.action_points, 0);
    }

    #[test]
    fn ice_penalty_applies_to_combat_attributes_only() {
        let mut fixture = duel("*...", attrs(4, 5, 1, 3), attrs(4, 4, 4, 3));

        let start = fixture.engine().start_combat(PlayerId(1), PlayerId(2)).unwrap();

        let (_, on_ice) = start.attributes[0];
        assert_eq!(on_ice.attack, 3);
        assert_eq!(on_ice.defense, 0);
        let player = fixture.instance.player(PlayerId(1)).unwrap();
        assert_eq!(player.attributes.attack, 5);
    }

    #[test]
    fn engagement_requires_adjacency_and_turn() {
        let mut fixture = Fixture::new(
            "....",
            &[
                (1, Position::new(0, 0), attrs(4, 4, 4, 3)),
                (2, Position::new(2, 0), attrs(4, 4, 4, 3)),
            ],
        );
        fixture.start();

        let error = fixture.engine().start_combat(PlayerId(1), PlayerId(2)).unwrap_err();
        assert_eq!(error, ActionError::Combat(CombatError::NotAdjacent(PlayerId(1), PlayerId(2))));

        let error = fixture.engine().start_combat(PlayerId(2), PlayerId(1)).unwrap_err();
        assert!(error.is_ownership_violation());
        assert!(!fixture.instance.in_combat());
        assert_eq!(fixture.instance.action_points, 1);
    }

    #[test]
    fn only_the_fighter_on_turn_may_attack() {
        let mut fixture = duel("....", brute(), glass(3));
        fixture.engine().start_combat(PlayerId(1), PlayerId(2)).unwrap();

        let error = fixture.engine().attack(PlayerId(2), PlayerId(1)).unwrap_err();
        assert!(error.is_ownership_violation());

        let outcome = fixture.engine().attack(PlayerId(1), PlayerId(2)).unwrap();
        assert!(outcome.hit);
        assert_eq!(outcome.defender_health, 2);
        assert_eq!(outcome.next_fighter, Some(PlayerId(2)));
        assert!(fixture.instance.combat.as_ref().unwrap().is_turn_of(PlayerId(2)));
    }

    #[test]
    fn current_attributes_reset_after_escape() {
        let mut fixture = duel("....", attrs(4, 4, 4, 3), attrs(4, 4, 4, 3));
        fixture.config.escape_chance = 100;
        fixture.engine().start_combat(PlayerId(1), PlayerId(2)).unwrap();
        fixture.instance.player_mut(PlayerId(1)).unwrap().current.as_mut().unwrap().health = 1;

        let outcome = fixture.engine().escape(PlayerId(1)).unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.tokens_left, 1);
        assert!(!fixture.instance.in_combat());
        assert!(!fixture.instance.turn_clock.is_paused());
        for id in [PlayerId(1), PlayerId(2)] {
            let player = fixture.instance.player(id).unwrap();
            assert_eq!(player.current, None);
            assert_eq!(player.combat_attributes(), player.effective_attributes());
        }
        assert_eq!(fixture.instance.player(PlayerId(1)).unwrap().stats.escapes, 1);
    }

    #[test]
    fn escape_without_tokens_always_fails() {
        let mut fixture = duel("....", attrs(4, 4, 4, 3), attrs(4, 4, 4, 3));
        fixture.config = GameConfig {
            escape_chance: 0,
            ..GameConfig::deterministic()
        };
        fixture.engine().start_combat(PlayerId(1), PlayerId(2)).unwrap();

        // Both fighters burn their tokens on failed escapes.
        for _ in 0..4 {
            let fighter = fixture.instance.combat.as_ref().unwrap().current_fighter();
            let outcome = fixture.engine().escape(fighter).unwrap();
            assert!(!outcome.success);
        }

        for _ in 0..3 {
            let fighter = fixture.instance.combat.as_ref().unwrap().current_fighter();
            let error = fixture.engine().escape(fighter).unwrap_err();
            assert_eq!(error, ActionError::Combat(CombatError::NoEscapeTokens(fighter)));
            let combat = fixture.instance.combat.as_ref().unwrap();
            assert_eq!(combat.escape_tokens(fighter), Some(0));
            assert!(combat.is_turn_of(fighter));
        }
    }

    #[test]
    fn escape_success_rate_matches_configured_chance() {
        let config = GameConfig::default();
        let mut successes = 0;
        let trials = 20_000;
        let mut rng = StdRng::seed_from_u64(2024);
        for _ in 0..trials {
            let mut fixture = duel("....", attrs(4, 4, 4, 3), attrs(4, 4, 4, 3));
            fixture.config = config.clone();
            fixture.engine().start_combat(PlayerId(1), PlayerId(2)).unwrap();
            let outcome = GameEngine::new(&mut fixture.instance, &fixture.config, &mut rng)
                .escape(PlayerId(1))
                .unwrap();
            successes += u32::from(outcome.success);
        }
        let rate = f64::from(successes) / f64::from(trials);
        assert!((rate - 0.30).abs() < 0.02, "rate {rate}");
    }

    #[test]
    fn death_scatters_items_and_respawns_victim_at_home() {
        let mut fixture = duel(
            "
            .....
            .....
            ",
            brute(),
            glass(1),
        );
        fixture.instance.player_mut(PlayerId(2)).unwrap().home = Position::new(4, 1);
        {
            let inventory = &mut fixture.instance.player_mut(PlayerId(2)).unwrap().inventory;
            inventory.push(ItemKind::Sword).unwrap();
            inventory.push(ItemKind::FlagA).unwrap();
        }
        fixture.engine().start_combat(PlayerId(1), PlayerId(2)).unwrap();

        let outcome = fixture.engine().attack(PlayerId(1), PlayerId(2)).unwrap();
        let death = outcome.death.unwrap();

        assert_eq!(death.killer_wins, 1);
        assert_eq!(death.respawn, Position::new(4, 1));
        assert_eq!(death.dropped.len(), 2);
        for (item, cell) in &death.dropped {
            assert_eq!(fixture.instance.grid.item(*cell), Some(*item));
            assert_ne!(*cell, Position::new(0, 0));
        }
        assert_eq!(death.next_turn, None);
        assert!(death.game_over.is_none());

        let victim = fixture.instance.player(PlayerId(2)).unwrap();
        assert!(victim.inventory.is_empty());
        assert_eq!(victim.current, None);
        assert_eq!(fixture.instance.player_at(Position::new(4, 1)), Some(PlayerId(2)));
        assert_eq!(fixture.instance.player(PlayerId(1)).unwrap().current, None);
        assert!(!fixture.instance.in_combat());
    }

    #[test]
    fn crowded_death_still_finds_a_cell() {
        // Everything near the death cell is a wall or taken; one floor cell is far away.
        let mut fixture = Fixture::new(
            "
            ..#####
            ..#####
            #######
            ######.
            ",
            &[
                (1, Position::new(0, 0), brute()),
                (2, Position::new(1, 0), glass(1)),
                (3, Position::new(0, 1), attrs(4, 4, 4, 1)),
                (4, Position::new(1, 1), attrs(4, 4, 4, 1)),
            ],
        );
        fixture.start();
        fixture
            .instance
            .player_mut(PlayerId(2))
            .unwrap()
            .inventory
            .push(ItemKind::Shield)
            .unwrap();
        fixture.engine().start_combat(PlayerId(1), PlayerId(2)).unwrap();

        let death = fixture.engine().attack(PlayerId(1), PlayerId(2)).unwrap().death.unwrap();

        assert_eq!(death.dropped, vec![(ItemKind::Shield, Position::new(6, 3))]);
        // Home (its own death cell) is still available to the victim.
        assert_eq!(death.respawn, Position::new(1, 0));
    }

    /// Four players boxed into the top-left corner, one far cell at (6, 3).
    fn boxed_in(far_cell: char) -> Fixture {
        let layout = format!(
            "
            ..#####
            ..#####
            #######
            ######{far_cell}
            "
        );
        let mut fixture = Fixture::new(
            &layout,
            &[
                (1, Position::new(0, 0), brute()),
                (2, Position::new(1, 0), glass(1)),
                (3, Position::new(0, 1), attrs(4, 4, 4, 1)),
                (4, Position::new(1, 1), attrs(4, 4, 4, 1)),
            ],
        );
        fixture.start();
        fixture
    }

    #[test]
    fn drops_fall_back_to_starting_point_cells() {
        let mut fixture = boxed_in('S');
        fixture
            .instance
            .player_mut(PlayerId(2))
            .unwrap()
            .inventory
            .push(ItemKind::Shield)
            .unwrap();
        fixture.engine().start_combat(PlayerId(1), PlayerId(2)).unwrap();

        let death = fixture.engine().attack(PlayerId(1), PlayerId(2)).unwrap().death.unwrap();

        assert_eq!(death.dropped, vec![(ItemKind::Shield, Position::new(6, 3))]);
        assert_eq!(fixture.instance.grid.item(Position::new(6, 3)), Some(ItemKind::Shield));
        assert!(fixture.instance.grid.positions_with(ItemKind::StartingPoint).is_empty());
    }

    #[test]
    fn vacated_death_cell_takes_the_drop() {
        let mut fixture = boxed_in('.');
        {
            let victim = fixture.instance.player_mut(PlayerId(2)).unwrap();
            victim.home = Position::new(6, 3);
            victim.inventory.push(ItemKind::FlagA).unwrap();
        }
        fixture.engine().start_combat(PlayerId(1), PlayerId(2)).unwrap();

        let death = fixture.engine().attack(PlayerId(1), PlayerId(2)).unwrap().death.unwrap();

        assert_eq!(death.respawn, Position::new(6, 3));
        assert_eq!(death.dropped, vec![(ItemKind::FlagA, Position::new(1, 0))]);
        assert_eq!(fixture.instance.player_at(Position::new(1, 0)), None);
        assert_eq!(fixture.instance.grid.item(Position::new(1, 0)), Some(ItemKind::FlagA));
    }

    #[test]
    fn killing_the_turn_holder_passes_the_turn() {
        let mut fixture = duel("....", glass(1), brute());
        // The faster target strikes first.
        fixture.engine().start_combat(PlayerId(1), PlayerId(2)).unwrap();

        let death = fixture.engine().attack(PlayerId(2), PlayerId(1)).unwrap().death.unwrap();

        assert_eq!(death.next_turn, Some(PlayerId(2)));
        assert_eq!(fixture.instance.current_player(), Some(PlayerId(2)));
    }

    #[test]
    fn third_victory_ends_the_session() {
        let mut fixture = duel("....", brute(), glass(1));
        fixture.instance.player_mut(PlayerId(1)).unwrap().wins = 2;
        fixture.engine().start_combat(PlayerId(1), PlayerId(2)).unwrap();

        let death = fixture.engine().attack(PlayerId(1), PlayerId(2)).unwrap().death.unwrap();

        let game_over = death.game_over.unwrap();
        assert_eq!(game_over.winner, Some(PlayerId(1)));
        assert_eq!(game_over.reason, GameOverReason::Victories);
        assert_eq!(fixture.instance.phase, GamePhase::Ended);
    }

    #[test]
    fn health_never_drops_below_zero() {
        let mut fixture = duel("....", brute(), glass(1));
        fixture.config.attack_damage = 5;
        fixture.engine().start_combat(PlayerId(1), PlayerId(2)).unwrap();

        let outcome = fixture.engine().attack(PlayerId(1), PlayerId(2)).unwrap();

        assert_eq!(outcome.defender_health, 0);
        let death = outcome.death.unwrap();
        assert_eq!(fixture.instance.player(PlayerId(1)).unwrap().stats.health_dealt, 1);
        assert_eq!(death.victim, PlayerId(2));
    }
}
