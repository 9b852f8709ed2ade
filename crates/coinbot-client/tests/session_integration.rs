//! End-to-end session tests: setup, listener, and turn loop wired over an
//! in-memory broker link.

#[allow(dead_code)]
mod common;

use coinbot_client::error::ClientError;
use coinbot_client::run_session;
use coinbot_client::turn_loop::StopReason;
use coinbot_core::grid::Direction;
use coinbot_core::state_buffer::GAME_OVER_MARKER;
use coinbot_core::test_helpers::make_snapshot;

use common::{test_config, test_link};

#[tokio::test(start_paused = true)]
async fn plays_until_game_over() {
    let config = test_config();
    let (link, mut broker) = test_link("Lobby1");
    let session = tokio::spawn(async move { run_session(&config, link).await });

    let players = broker.expect_setup().await;
    assert_eq!(players, vec!["Player1", "Player2", "Player3", "Player4"]);

    broker.send_lobby("Game Started");
    broker.send_state("Player1", &make_snapshot((5, 5), &[], &[(5, 6)]));
    broker.send_state("Player2", &make_snapshot((5, 5), &[(5, 6)], &[]));
    broker.send_raw("games/Lobby1/Player3/game_state", &b"{not json"[..]);
    broker.send_state("Stranger", &make_snapshot((1, 1), &[], &[]));

    let (p1, d1) = broker.next_move().await;
    assert_eq!((p1.as_str(), d1), ("Player1", Direction::Right));
    let (p2, d2) = broker.next_move().await;
    assert_eq!(p2, "Player2");
    assert_ne!(d2, Direction::Right, "Player2 must not walk into the wall");

    broker.send_lobby(&format!("{GAME_OVER_MARKER}. Team1 wins"));

    let report = session.await.unwrap().unwrap();
    assert_eq!(report.turn_loop.reason, StopReason::GameOver);
    assert_eq!(report.turn_loop.moves_sent, 2);
    assert_eq!(report.turn_loop.skipped, 1, "Stranger is outside the roster");
    assert_eq!(report.listener.snapshots, 3);
    assert_eq!(report.listener.lobby_updates, 2);
    assert_eq!(report.listener.dropped, 1);
    assert!(broker.commands.try_recv().is_err(), "no moves after game over");
}

#[tokio::test(start_paused = true)]
async fn newest_snapshot_per_tick_wins() {
    let config = test_config();
    let (link, mut broker) = test_link("Lobby1");
    let session = tokio::spawn(async move { run_session(&config, link).await });
    broker.expect_setup().await;

    // Two updates for the same player before the tick: only the newer one
    // is acted on.
    broker.send_state("Player4", &make_snapshot((5, 5), &[], &[(4, 5)]));
    broker.send_state("Player4", &make_snapshot((5, 5), &[], &[(6, 5)]));

    assert_eq!(
        broker.next_move().await,
        ("Player4".to_string(), Direction::Down)
    );

    broker.send_lobby(GAME_OVER_MARKER);
    let report = session.await.unwrap().unwrap();
    assert_eq!(report.turn_loop.moves_sent, 1);
}

#[tokio::test(start_paused = true)]
async fn boxed_in_player_gets_no_move() {
    let config = test_config();
    let (link, mut broker) = test_link("Lobby1");
    let session = tokio::spawn(async move { run_session(&config, link).await });
    broker.expect_setup().await;

    broker.send_state("Player1", &make_snapshot((0, 0), &[(0, 1), (1, 0)], &[]));
    broker.send_state("Player2", &make_snapshot((9, 9), &[(8, 9)], &[]));

    assert_eq!(
        broker.next_move().await,
        ("Player2".to_string(), Direction::Left)
    );

    broker.send_lobby(GAME_OVER_MARKER);
    let report = session.await.unwrap().unwrap();
    assert_eq!(report.turn_loop.moves_sent, 1);
    assert_eq!(report.turn_loop.skipped, 1);
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_session() {
    let config = test_config();
    let (link, mut broker) = test_link("Lobby1");
    let session = tokio::spawn(async move { run_session(&config, link).await });
    broker.expect_setup().await;

    tokio::time::sleep(std::time::Duration::from_millis(2500)).await;
    broker.shutdown.send(true).unwrap();

    let report = session.await.unwrap().unwrap();
    assert_eq!(report.turn_loop.reason, StopReason::Shutdown);
    assert_eq!(report.turn_loop.moves_sent, 0);
}

#[tokio::test(start_paused = true)]
async fn game_over_before_first_tick() {
    let config = test_config();
    let (link, mut broker) = test_link("Lobby1");
    let session = tokio::spawn(async move { run_session(&config, link).await });
    broker.expect_setup().await;

    broker.send_state("Player1", &make_snapshot((5, 5), &[], &[]));
    broker.send_lobby(GAME_OVER_MARKER);

    let report = session.await.unwrap().unwrap();
    assert_eq!(report.turn_loop.reason, StopReason::GameOver);
    assert_eq!(report.turn_loop.ticks, 0);
    assert_eq!(report.turn_loop.moves_sent, 0);
}

#[tokio::test(start_paused = true)]
async fn transport_failure_ends_session() {
    let config = test_config();
    let (link, mut broker) = test_link("Lobby1");
    let session = tokio::spawn(async move { run_session(&config, link).await });
    broker.expect_setup().await;

    broker.send_state("Player1", &make_snapshot((5, 5), &[], &[]));
    broker.fail_transport("connection reset by peer");

    let err = session.await.unwrap().unwrap_err();
    assert!(
        matches!(&err, ClientError::Transport(reason) if reason.contains("connection reset")),
        "got {err:?}"
    );
    assert!(*broker.shutdown.borrow(), "session signals shutdown on the way out");
}

#[tokio::test(start_paused = true)]
async fn transport_failure_during_setup() {
    let mut config = test_config();
    config.game.start_delay_ms = 60_000;
    let (link, mut broker) = test_link("Lobby1");
    let session = tokio::spawn(async move { run_session(&config, link).await });

    for _ in 0..3 {
        broker.next_command().await;
    }
    broker.fail_transport("could not connect");

    let err = session.await.unwrap().unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)), "got {err:?}");
}
