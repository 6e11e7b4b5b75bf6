//! End-to-end tests driving rooms through the runtime with paused time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use game_core::{
    AgentProfile, Attributes, DiceKind, GameConfig, GameOverReason, PlayerId, PlayerSpec,
    Position, RoomId, TemplateId, TileKind,
};
use runtime::{
    CombatEvent, CommandOutcome, Event, InMemoryTemplateStore, MapTemplate, RoomHandle, Runtime,
    RuntimeConfig, RuntimeError, SessionEvent, Topic, TurnEvent,
};

const CORRIDOR: &str = "
    S...S
    .....
    .|...
";

fn runtime() -> Runtime {
    let store = InMemoryTemplateStore::new();
    store.insert(MapTemplate::from_layout("corridor", "Corridor", CORRIDOR).unwrap());

    Runtime::builder()
        .config(RuntimeConfig {
            game_config: GameConfig::deterministic(),
            step_delay: Duration::from_millis(100),
            think_min: Duration::from_millis(200),
            think_max: Duration::from_millis(400),
            rng_seed: Some(11),
            ..RuntimeConfig::default()
        })
        .templates(Arc::new(store))
        .build()
}

fn human(id: u32, speed: u32) -> PlayerSpec {
    PlayerSpec::human(
        PlayerId(id),
        format!("human-{id}"),
        Attributes::new(4, 4, 4, speed, DiceKind::Attack),
    )
}

fn bot(id: u32, speed: u32) -> PlayerSpec {
    PlayerSpec::virtual_player(
        PlayerId(id),
        format!("bot-{id}"),
        Attributes::new(3, 4, 2, speed, DiceKind::Attack),
        AgentProfile::Aggressive,
    )
}

/// Opens a two-human room with player 1 at (1,1) holding the turn and player 2 at (3,1).
async fn duel(runtime: &Runtime, room: &str) -> RoomHandle {
    let (handle, outcome) = runtime
        .open_room(
            RoomId::from(room),
            TemplateId::from("corridor"),
            vec![human(1, 3), human(2, 2)],
        )
        .await
        .unwrap();
    assert_eq!(outcome, CommandOutcome::Applied);

    handle.toggle_debug().await.unwrap();
    handle.teleport(PlayerId(1), Position::new(1, 1)).await.unwrap();
    handle.teleport(PlayerId(2), Position::new(3, 1)).await.unwrap();
    handle.toggle_debug().await.unwrap();
    handle
}

async fn next_event<T>(
    rx: &mut broadcast::Receiver<Event>,
    select: impl Fn(&Event) -> Option<T>,
) -> T {
    let wait = async {
        loop {
            let event = rx.recv().await.expect("event bus closed");
            if let Some(found) = select(&event) {
                return found;
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(3600), wait)
        .await
        .expect("event not published")
}

#[tokio::test(start_paused = true)]
async fn turn_holder_moves_and_toggles_doors() {
    let runtime = runtime();
    let mut turns = runtime.subscribe(Topic::Turn);
    let handle = duel(&runtime, "alpha").await;

    // Player 2 does not hold the turn.
    assert_eq!(handle.start_turn(PlayerId(2)).await.unwrap(), CommandOutcome::Ignored);
    assert_eq!(
        handle.move_to(PlayerId(2), Position::new(4, 1)).await.unwrap(),
        CommandOutcome::Ignored
    );

    assert!(handle.start_turn(PlayerId(1)).await.unwrap().is_applied());
    let budget = next_event(&mut turns, |event| match event {
        Event::Turn {
            event: TurnEvent::TurnStarted { player, budget, .. },
            ..
        } if *player == PlayerId(1) => Some(*budget),
        _ => None,
    })
    .await;
    assert_eq!(budget, 3);

    assert!(
        handle
            .interact_door(PlayerId(1), Position::new(1, 2))
            .await
            .unwrap()
            .is_applied()
    );
    let kind = next_event(&mut turns, |event| match event {
        Event::Turn {
            event: TurnEvent::DoorToggled { kind, .. },
            ..
        } => Some(*kind),
        _ => None,
    })
    .await;
    assert_eq!(kind, TileKind::DoorOpen);

    // The only action point is spent.
    assert!(matches!(
        handle.interact_door(PlayerId(1), Position::new(1, 2)).await.unwrap(),
        CommandOutcome::Rejected { .. }
    ));

    assert!(handle.move_to(PlayerId(1), Position::new(1, 0)).await.unwrap().is_applied());
    let (position, remaining) = next_event(&mut turns, |event| match event {
        Event::Turn {
            event:
                TurnEvent::MoveCompleted {
                    position,
                    remaining_budget,
                    ..
                },
            ..
        } => Some((*position, *remaining_budget)),
        _ => None,
    })
    .await;
    assert_eq!(position, Position::new(1, 0));
    assert_eq!(remaining, 2);

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.position_of(PlayerId(1)), Some(Position::new(1, 0)));
    assert_eq!(snapshot.grid.kind(Position::new(1, 2)), Some(TileKind::DoorOpen));

    assert!(handle.end_turn(PlayerId(1), false).await.unwrap().is_applied());
    let next = next_event(&mut turns, |event| match event {
        Event::Turn {
            event: TurnEvent::TurnChanged { next, .. },
            ..
        } => Some(*next),
        _ => None,
    })
    .await;
    assert_eq!(next, Some(PlayerId(2)));
}

#[tokio::test(start_paused = true)]
async fn moves_replay_one_cell_per_step() {
    let runtime = runtime();
    let mut turns = runtime.subscribe(Topic::Turn);
    let handle = duel(&runtime, "steps").await;
    handle.start_turn(PlayerId(1)).await.unwrap();

    handle.move_to(PlayerId(1), Position::new(1, 0)).await.unwrap();
    handle.end_turn(PlayerId(1), false).await.unwrap();
    handle.start_turn(PlayerId(2)).await.unwrap();
    handle.move_to(PlayerId(2), Position::new(3, 2)).await.unwrap();
    handle.end_turn(PlayerId(2), false).await.unwrap();
    handle.start_turn(PlayerId(1)).await.unwrap();

    let started = tokio::time::Instant::now();
    handle.move_to(PlayerId(1), Position::new(4, 0)).await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(200));

    let mut steps = Vec::new();
    loop {
        match turns.recv().await.unwrap() {
            Event::Turn {
                event: TurnEvent::PositionUpdated {
                    player, position, ..
                },
                ..
            } if player == PlayerId(1) => steps.push(position),
            Event::Turn {
                event: TurnEvent::MoveCompleted { player, .. },
                ..
            } if player == PlayerId(1) && steps.len() >= 3 => break,
            _ => {}
        }
    }
    assert_eq!(
        &steps[steps.len() - 3..],
        &[Position::new(2, 0), Position::new(3, 0), Position::new(4, 0)]
    );
}

#[tokio::test(start_paused = true)]
async fn last_player_standing_closes_the_room() {
    let runtime = runtime();
    let registry = runtime.registry();
    let mut session = runtime.subscribe(Topic::Session);
    let handle = duel(&runtime, "bravo").await;

    assert!(registry.get_by_player_id(PlayerId(2)).is_some());
    assert!(handle.quit(PlayerId(2)).await.unwrap().is_applied());
    assert!(registry.get_by_player_id(PlayerId(2)).is_none());

    let (winner, reason) = next_event(&mut session, |event| match event {
        Event::Session {
            event: SessionEvent::GameEnded { winner, reason, .. },
            ..
        } => Some((*winner, *reason)),
        _ => None,
    })
    .await;
    assert_eq!(winner, Some(PlayerId(1)));
    assert_eq!(reason, GameOverReason::LastPlayerStanding);

    handle.closed().await;
    tokio::task::yield_now().await;
    assert!(registry.get_by_room(&RoomId::from("bravo")).is_none());
    assert!(registry.get_by_player_id(PlayerId(1)).is_none());

    let late = handle.end_turn(PlayerId(1), false).await.unwrap_err();
    assert!(late.is_room_gone());
}

#[tokio::test(start_paused = true)]
async fn rejected_setup_binds_no_players() {
    let runtime = runtime();
    let registry = runtime.registry();

    // The corridor has two starting points.
    let (_, outcome) = runtime
        .open_room(
            RoomId::from("crowded"),
            TemplateId::from("corridor"),
            vec![human(1, 3), human(2, 2), human(3, 1)],
        )
        .await
        .unwrap();

    assert!(matches!(outcome, CommandOutcome::Rejected { .. }));
    assert!(registry.get_by_room(&RoomId::from("crowded")).is_some());
    for id in 1..=3 {
        assert!(registry.get_by_player_id(PlayerId(id)).is_none());
    }
}

#[tokio::test(start_paused = true)]
async fn idle_turn_holder_times_out() {
    let runtime = runtime();
    let mut turns = runtime.subscribe(Topic::Turn);
    let handle = duel(&runtime, "charlie").await;
    handle.start_turn(PlayerId(1)).await.unwrap();

    let expired = next_event(&mut turns, |event| match event {
        Event::Turn {
            event: TurnEvent::TurnExpired { player },
            ..
        } => Some(*player),
        _ => None,
    })
    .await;
    assert_eq!(expired, PlayerId(1));

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.current_player(), Some(PlayerId(2)));
}

#[tokio::test(start_paused = true)]
async fn organizer_can_stop_an_engagement() {
    let runtime = runtime();
    let mut combat = runtime.subscribe(Topic::Combat);
    let handle = duel(&runtime, "golf").await;

    handle.start_turn(PlayerId(1)).await.unwrap();
    handle.move_to(PlayerId(1), Position::new(2, 1)).await.unwrap();
    assert!(
        handle
            .start_combat(PlayerId(1), PlayerId(2))
            .await
            .unwrap()
            .is_applied()
    );
    assert!(handle.end_combat().await.unwrap().is_applied());

    let fighters = next_event(&mut combat, |event| match event {
        Event::Combat {
            event: CombatEvent::Ended { fighters },
            ..
        } => Some(*fighters),
        _ => None,
    })
    .await;
    assert_eq!(fighters, [PlayerId(1), PlayerId(2)]);

    let snapshot = handle.snapshot().await.unwrap();
    assert!(snapshot.combat.is_none());
    assert_eq!(snapshot.current_player(), Some(PlayerId(1)));
    assert!(matches!(
        handle.end_combat().await.unwrap(),
        CommandOutcome::Rejected { .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn rooms_from_one_template_do_not_share_state() {
    let runtime = runtime();
    let registry = runtime.registry();
    let first = duel(&runtime, "left").await;
    let second = duel(&runtime, "right").await;

    first.start_turn(PlayerId(1)).await.unwrap();
    first
        .interact_door(PlayerId(1), Position::new(1, 2))
        .await
        .unwrap();

    let left = first.snapshot().await.unwrap();
    let right = second.snapshot().await.unwrap();
    assert_eq!(left.grid.kind(Position::new(1, 2)), Some(TileKind::DoorOpen));
    assert_eq!(right.grid.kind(Position::new(1, 2)), Some(TileKind::DoorClosed));
    assert_eq!(registry.room_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn ensure_instance_is_idempotent() {
    let runtime = runtime();
    let registry = runtime.registry();

    let first = registry
        .ensure_instance(RoomId::from("delta"), TemplateId::from("corridor"))
        .await
        .unwrap();
    first.setup(vec![human(1, 3), human(2, 2)]).await.unwrap();
    let again = registry
        .ensure_instance(RoomId::from("delta"), TemplateId::from("corridor"))
        .await
        .unwrap();

    // The second call reaches the already seated room.
    assert!(matches!(
        again.setup(vec![human(3, 1)]).await.unwrap(),
        CommandOutcome::Rejected { .. }
    ));
    assert_eq!(registry.room_count(), 1);

    let missing = registry
        .ensure_instance(RoomId::from("echo"), TemplateId::from("nowhere"))
        .await
        .unwrap_err();
    assert!(matches!(missing, RuntimeError::TemplateNotFound(_)));
}

#[tokio::test(start_paused = true)]
async fn virtual_players_play_to_the_end() {
    let runtime = runtime();
    let mut session = runtime.subscribe(Topic::Session);
    let (handle, outcome) = runtime
        .open_room(
            RoomId::from("bots"),
            TemplateId::from("corridor"),
            vec![bot(1, 3), bot(2, 2)],
        )
        .await
        .unwrap();
    assert_eq!(outcome, CommandOutcome::Applied);

    let (winner, statistics) = next_event(&mut session, |event| match event {
        Event::Session {
            event: SessionEvent::GameEnded {
                winner, statistics, ..
            },
            ..
        } => Some((*winner, statistics.clone())),
        _ => None,
    })
    .await;

    assert!(winner.is_some());
    assert!(statistics.turns > 0);
    assert!(statistics.players.iter().any(|player| player.victories > 0));
    handle.closed().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_every_room() {
    let runtime = runtime();
    let handle = duel(&runtime, "foxtrot").await;

    runtime.shutdown().await.unwrap();

    assert!(handle.is_closed());
    let error = handle.start_turn(PlayerId(1)).await.unwrap_err();
    assert!(error.is_room_gone());
}
