//! Headless demo: rooms full of virtual players that play to the end.
use std::collections::HashSet;

use anyhow::{Context, Result, bail};
use tokio::sync::broadcast::error::RecvError;

use game_core::{AgentProfile, Attributes, DiceKind, PlayerId, PlayerSpec, RoomId, TemplateId};
use runtime::{Event, InMemoryTemplateStore, MapTemplate, Runtime, SessionEvent, Topic};

use crate::config::ServerConfig;

pub const ARENA_ID: &str = "arena";

/// Built-in map with every tile kind, four starting points and the flag.
const ARENA: &str = "
    S..#....S
    .w.|..?..
    ..~~#.*..
    .#..F..h.
    ...#..~..
    S..p...bS
";

/// Built-in templates plus those found in `TEMPLATE_DIR`.
pub fn load_templates(config: &ServerConfig) -> Result<InMemoryTemplateStore> {
    let store = InMemoryTemplateStore::new();
    store.insert(MapTemplate::from_layout(ARENA_ID, "Arena", ARENA).context("built-in arena")?);

    if let Some(dir) = &config.template_dir {
        let loaded = store
            .load_dir(dir)
            .with_context(|| format!("loading templates from {}", dir.display()))?;
        tracing::info!(dir = %dir.display(), loaded, "templates loaded");
    }
    Ok(store)
}

/// Two aggressive and two defensive virtual players for room `index`.
pub fn roster(index: usize) -> Vec<PlayerSpec> {
    let base = (index as u32 + 1) * 10;
    let specs = [
        ("Brute", 5, 5, 3, 3, DiceKind::Attack, AgentProfile::Aggressive),
        ("Warden", 6, 3, 5, 2, DiceKind::Defense, AgentProfile::Defensive),
        ("Scout", 4, 4, 3, 5, DiceKind::Attack, AgentProfile::Aggressive),
        ("Sentinel", 5, 3, 4, 4, DiceKind::Defense, AgentProfile::Defensive),
    ];

    specs
        .into_iter()
        .enumerate()
        .map(|(offset, (name, health, attack, defense, speed, dice, profile))| {
            PlayerSpec::virtual_player(
                PlayerId(base + offset as u32 + 1),
                format!("{name}-{index}"),
                Attributes::new(health, attack, defense, speed, dice),
                profile,
            )
        })
        .collect()
}

/// Opens the configured rooms and waits until every one of them has ended.
pub async fn run(runtime: &Runtime, config: &ServerConfig) -> Result<()> {
    let mut session = runtime.subscribe(Topic::Session);
    let template = TemplateId::new(config.template_id.as_str());

    let mut open = HashSet::new();
    for index in 0..config.room_count {
        let room_id = RoomId::new(format!("room-{index}"));
        let (_, outcome) = runtime
            .open_room(room_id.clone(), template.clone(), roster(index))
            .await
            .with_context(|| format!("opening {room_id}"))?;
        if !outcome.is_applied() {
            bail!("setup of {room_id} failed: {outcome:?}");
        }
        tracing::info!(room = %room_id, %template, "room opened");
        open.insert(room_id);
    }

    while !open.is_empty() {
        match session.recv().await {
            Ok(Event::Session {
                room,
                event: SessionEvent::GameEnded {
                    winner,
                    reason,
                    statistics,
                    ..
                },
            }) => {
                let summary = serde_json::to_string(&statistics)?;
                tracing::info!(
                    %room,
                    winner = ?winner,
                    reason = ?reason,
                    statistics = %summary,
                    "game ended"
                );
                open.remove(&room);
            }
            Ok(Event::Session {
                room,
                event: SessionEvent::PlayerLeft { player, .. },
            }) => {
                tracing::info!(%room, %player, "player left");
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "session events lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_core::ItemKind;

    #[test]
    fn arena_seats_four_players() {
        let template = MapTemplate::from_layout(ARENA_ID, "Arena", ARENA).unwrap();
        let starts = template.grid.positions_with(ItemKind::StartingPoint);
        assert_eq!(starts.len(), 4);
        assert_eq!(roster(0).len(), 4);
    }

    #[test]
    fn rosters_do_not_share_player_ids() {
        let first: HashSet<PlayerId> = roster(0).iter().map(|spec| spec.id).collect();
        let second: HashSet<PlayerId> = roster(1).iter().map(|spec| spec.id).collect();
        assert!(first.is_disjoint(&second));
    }

    #[test]
    fn template_dir_adds_to_the_arena() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("duel.json"),
            r#"{"id": "duel", "name": "Duel", "layout": ["S..S"]}"#,
        )
        .unwrap();
        let config = ServerConfig {
            template_dir: Some(dir.path().to_path_buf()),
            ..ServerConfig::default()
        };

        let store = load_templates(&config).unwrap();
        assert_eq!(store.len(), 2);
    }
}
