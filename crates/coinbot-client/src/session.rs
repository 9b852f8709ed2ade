use coinbot_core::net::messages::{NewGameMsg, OutboundMessage};
use coinbot_core::net::topics::Topics;
use coinbot_core::snapshot::PlayerId;

use crate::broker::BrokerHandle;
use crate::config::GameConfig;
use crate::error::ClientError;

/// Subscribe to the lobby feeds, register every configured player, wait the
/// start delay, then start the game. Returns the registered roster.
pub async fn setup(
    broker: &BrokerHandle,
    topics: &Topics,
    game: &GameConfig,
) -> Result<Vec<PlayerId>, ClientError> {
    for filter in topics.subscriptions() {
        broker.subscribe(filter)?;
    }

    for (team, player) in game.registrations() {
        let msg = NewGameMsg {
            lobby_name: topics.lobby_name().to_string(),
            team_name: team.to_string(),
            player_name: player.to_string(),
        };
        broker.publish(OutboundMessage::new_game(&msg)?)?;
        tracing::info!(lobby = %msg.lobby_name, team = %msg.team_name, player = %msg.player_name, "Registered player");
    }
    let roster = game.roster();

    tokio::time::sleep(game.start_delay()).await;
    broker.publish(OutboundMessage::start(topics))?;
    tracing::info!(lobby = topics.lobby_name(), players = roster.len(), "Game start requested");

    Ok(roster)
}
