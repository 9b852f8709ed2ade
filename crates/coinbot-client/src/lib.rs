pub mod broker;
pub mod config;
pub mod error;
pub mod listener;
pub mod mqtt;
pub mod session;
pub mod turn_loop;

use std::sync::Arc;

use coinbot_core::net::topics::{Router, Topics};

use broker::{BrokerLink, shared_state_buffer, transport_failure};
use config::ClientConfig;
use error::ClientError;
use listener::{ListenerStats, spawn_listener};
use turn_loop::{TurnLoop, TurnLoopReport};

/// Outcome of a full game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    pub turn_loop: TurnLoopReport,
    pub listener: ListenerStats,
}

/// Drive one game over an already-connected broker link: set up the lobby,
/// start listening, and run the turn loop until it terminates or the link
/// reports a transport failure.
pub async fn run_session(
    config: &ClientConfig,
    link: BrokerLink,
) -> Result<SessionReport, ClientError> {
    let BrokerLink {
        handle,
        inbound,
        shutdown,
        failure,
    } = link;
    let topics = Topics::new(config.game.lobby.clone());
    let buffer = shared_state_buffer();

    // Listen before registering so no early state is missed.
    let listener = spawn_listener(
        inbound,
        Router::new(topics.clone()),
        Arc::clone(&buffer),
        shutdown.subscribe(),
    );

    let play = async {
        let roster = session::setup(&handle, &topics, &config.game).await?;
        TurnLoop::new(
            Arc::clone(&buffer),
            handle.clone(),
            topics.clone(),
            config.turn.tick(),
            roster,
            config.turn.rng_seed,
        )
        .run(shutdown.subscribe())
        .await
    };
    let result = tokio::select! {
        result = play => result,
        err = transport_failure(failure) => Err(err),
    };

    // Stops the listener and the broker tasks.
    let _ = shutdown.send(true);
    let listener_stats = listener.await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Listener task failed");
        ListenerStats::default()
    });

    Ok(SessionReport {
        turn_loop: result?,
        listener: listener_stats,
    })
}

/// Connect to the configured broker and play one game.
pub async fn run_client(config: ClientConfig) -> Result<SessionReport, ClientError> {
    config.ensure_valid()?;
    let (link, tasks) = mqtt::connect(&config.broker);

    let shutdown = Arc::clone(&link.shutdown);
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, shutting down");
            let _ = shutdown.send(true);
        }
    });

    let report = run_session(&config, link).await;
    interrupt.abort();
    let mut task_failure = None;
    for task in tasks {
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "Broker task ended abnormally");
            task_failure.get_or_insert_with(|| e.to_string());
        }
    }
    match task_failure {
        Some(reason) if report.is_ok() => Err(ClientError::Transport(reason)),
        _ => report,
    }
}
