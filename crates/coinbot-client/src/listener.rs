use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use coinbot_core::net::topics::{InboundMessage, RouteError, Router};

use crate::broker::{InboundPublish, SharedStateBuffer};

/// Counters reported when the listener stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerStats {
    pub snapshots: u64,
    pub lobby_updates: u64,
    pub dropped: u64,
}

/// Route one inbound publish into the shared buffer.
pub async fn handle_inbound(
    router: &Router,
    buffer: &SharedStateBuffer,
    publish: &InboundPublish,
    stats: &mut ListenerStats,
) {
    match router.route(&publish.topic, &publish.payload) {
        Ok(InboundMessage::GameState { player, snapshot }) => {
            tracing::debug!(player = %player, position = %snapshot.current_position, "Game state buffered");
            buffer.lock().await.record_snapshot(player, snapshot);
            stats.snapshots += 1;
        },
        Ok(InboundMessage::Lobby(status)) => {
            tracing::info!(status = %status, "Lobby update");
            buffer.lock().await.set_lobby_status(status);
            stats.lobby_updates += 1;
        },
        Ok(InboundMessage::Scores(scores)) => {
            tracing::info!(scores = %scores, "Scores update");
        },
        Err(e @ RouteError::MalformedSnapshot { .. }) => {
            tracing::warn!(topic = %publish.topic, error = %e, "Dropping malformed game state");
            stats.dropped += 1;
        },
        Err(e @ RouteError::UnknownTopic(_)) => {
            tracing::debug!(error = %e, "Ignoring message");
            stats.dropped += 1;
        },
    }
}

/// Spawn the inbound listener. It stops when `shutdown` flips to true or
/// the inbound channel closes.
pub fn spawn_listener(
    mut inbound: mpsc::UnboundedReceiver<InboundPublish>,
    router: Router,
    buffer: SharedStateBuffer,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<ListenerStats> {
    tokio::spawn(async move {
        let mut stats = ListenerStats::default();
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                msg = inbound.recv() => match msg {
                    Some(publish) => handle_inbound(&router, &buffer, &publish, &mut stats).await,
                    None => break,
                },
            }
        }
        tracing::info!(
            snapshots = stats.snapshots,
            lobby_updates = stats.lobby_updates,
            dropped = stats.dropped,
            "Listener stopped"
        );
        stats
    })
}
