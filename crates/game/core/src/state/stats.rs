//! Running statistics aggregated over a session.

use std::collections::{BTreeSet, HashSet};

use super::{Grid, ItemKind, PlayerId, Position};

/// Per-player counters.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerStats {
    pub combats: u32,
    pub escapes: u32,
    pub victories: u32,
    pub defeats: u32,
    pub health_lost: u32,
    pub health_dealt: u32,
    pub items_collected: BTreeSet<ItemKind>,
    pub tiles_visited: HashSet<Position>,
}

/// Room-wide counters.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameStatistics {
    pub turns: u32,
    pub doors_toggled: HashSet<Position>,
    pub tiles_visited: HashSet<Position>,
    pub flag_holders: BTreeSet<PlayerId>,
}

impl GameStatistics {
    pub fn record_visit(&mut self, position: Position) {
        self.tiles_visited.insert(position);
    }

    pub fn record_door(&mut self, position: Position) {
        self.doors_toggled.insert(position);
    }

    /// Produces the end-of-game summary for the given roster.
    pub fn summarize<'a>(
        &self,
        grid: &Grid,
        players: impl IntoIterator<Item = (PlayerId, &'a str, &'a PlayerStats)>,
    ) -> FinalStatistics {
        let walkable = grid.count_where(|tile| tile.kind.is_walkable());
        let doors = grid.count_where(|tile| tile.kind.is_door());
        let walkable_total = walkable.max(1) as f64;

        let players = players
            .into_iter()
            .map(|(id, name, stats)| PlayerSummary {
                id,
                name: name.to_owned(),
                combats: stats.combats,
                escapes: stats.escapes,
                victories: stats.victories,
                defeats: stats.defeats,
                health_lost: stats.health_lost,
                health_dealt: stats.health_dealt,
                items_collected: stats.items_collected.len() as u32,
                tiles_visited_percent: percent(stats.tiles_visited.len(), walkable_total),
            })
            .collect();

        FinalStatistics {
            players,
            turns: self.turns,
            doors_toggled_percent: if doors == 0 {
                0.0
            } else {
                percent(self.doors_toggled.len(), doors as f64)
            },
            tiles_visited_percent: percent(self.tiles_visited.len(), walkable_total),
            flag_holders: self.flag_holders.len() as u32,
        }
    }
}

fn percent(count: usize, total: f64) -> f64 {
    (count as f64 / total * 100.0).min(100.0)
}

/// Per-player line of the final statistics.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub name: String,
    pub combats: u32,
    pub escapes: u32,
    pub victories: u32,
    pub defeats: u32,
    pub health_lost: u32,
    pub health_dealt: u32,
    pub items_collected: u32,
    pub tiles_visited_percent: f64,
}

/// Statistics published when a session ends.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FinalStatistics {
    pub players: Vec<PlayerSummary>,
    pub turns: u32,
    pub doors_toggled_percent: f64,
    pub tiles_visited_percent: f64,
    pub flag_holders: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentages_use_walkable_tiles_and_doors() {
        let grid = Grid::parse("..|#").unwrap();
        let mut statistics = GameStatistics::default();
        statistics.record_visit(Position::new(0, 0));
        statistics.record_door(Position::new(2, 0));

        let mut stats = PlayerStats::default();
        stats.tiles_visited.insert(Position::new(0, 0));
        stats.tiles_visited.insert(Position::new(1, 0));

        let summary = statistics.summarize(&grid, [(PlayerId(1), "p1", &stats)]);

        // Only the two floor tiles are walkable.
        assert_eq!(summary.tiles_visited_percent, 50.0);
        assert_eq!(summary.doors_toggled_percent, 100.0);
        assert_eq!(summary.players[0].tiles_visited_percent, 100.0);
    }
}
