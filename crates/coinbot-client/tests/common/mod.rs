use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot, watch};

use coinbot_client::broker::{BrokerCommand, BrokerHandle, BrokerLink, InboundPublish};
use coinbot_client::config::ClientConfig;
use coinbot_client::error::ClientError;
use coinbot_core::grid::Direction;
use coinbot_core::net::messages::OutboundMessage;
use coinbot_core::snapshot::GameStateSnapshot;
use coinbot_core::test_helpers::snapshot_json;

/// In-memory stand-in for the MQTT adapter: the test side of a `BrokerLink`.
pub struct TestBroker {
    pub lobby: String,
    pub commands: mpsc::UnboundedReceiver<BrokerCommand>,
    pub inbound: mpsc::UnboundedSender<InboundPublish>,
    pub shutdown: Arc<watch::Sender<bool>>,
    pub failure: Option<oneshot::Sender<ClientError>>,
}

/// Create a linked pair: hand the `BrokerLink` to the client, drive it
/// with the `TestBroker`.
pub fn test_link(lobby: &str) -> (BrokerLink, TestBroker) {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, _) = watch::channel(false);
    let shutdown = Arc::new(shutdown_tx);
    let (failure_tx, failure_rx) = oneshot::channel();
    let link = BrokerLink {
        handle: BrokerHandle::new(cmd_tx),
        inbound: inbound_rx,
        shutdown: Arc::clone(&shutdown),
        failure: failure_rx,
    };
    let broker = TestBroker {
        lobby: lobby.to_string(),
        commands: cmd_rx,
        inbound: inbound_tx,
        shutdown,
        failure: Some(failure_tx),
    };
    (link, broker)
}

/// Default config with a fixed seed, for a lobby named `Lobby1`.
pub fn test_config() -> ClientConfig {
    let mut config = ClientConfig::default();
    config.turn.rng_seed = Some(3);
    config
}

impl TestBroker {
    pub fn send_raw(&self, topic: &str, payload: impl Into<Bytes>) {
        self.inbound
            .send(InboundPublish {
                topic: topic.to_string(),
                payload: payload.into(),
            })
            .expect("client listener should be running");
    }

    pub fn send_state(&self, player: &str, snapshot: &GameStateSnapshot) {
        let topic = format!("games/{}/{player}/game_state", self.lobby);
        self.send_raw(&topic, snapshot_json(snapshot));
    }

    /// Report a dead connection the way the MQTT adapter does.
    pub fn fail_transport(&mut self, reason: &str) {
        self.failure
            .take()
            .expect("transport failure already reported")
            .send(ClientError::Transport(reason.to_string()))
            .expect("client should be watching for transport failure");
    }

    pub fn send_lobby(&self, status: &str) {
        let topic = format!("games/{}/lobby", self.lobby);
        self.send_raw(&topic, status.to_string());
    }

    /// Next command from the client, failing the test after a (virtual)
    /// timeout.
    pub async fn next_command(&mut self) -> BrokerCommand {
        tokio::time::timeout(Duration::from_secs(30), self.commands.recv())
            .await
            .expect("timed out waiting for broker command")
            .expect("client dropped its broker handle")
    }

    pub async fn next_publish(&mut self) -> OutboundMessage {
        match self.next_command().await {
            BrokerCommand::Publish(msg) => msg,
            other => panic!("expected publish, got {other:?}"),
        }
    }

    /// Consume the subscribe/register/start sequence; returns the
    /// registered player names.
    pub async fn expect_setup(&mut self) -> Vec<String> {
        for _ in 0..3 {
            assert!(matches!(
                self.next_command().await,
                BrokerCommand::Subscribe(_)
            ));
        }
        let mut players = Vec::new();
        loop {
            let msg = self.next_publish().await;
            if msg.topic == "new_game" {
                let value: serde_json::Value = serde_json::from_slice(&msg.payload).unwrap();
                players.push(value["player_name"].as_str().unwrap().to_string());
                continue;
            }
            assert_eq!(msg.topic, format!("games/{}/start", self.lobby));
            assert_eq!(msg.payload_str(), "START");
            return players;
        }
    }

    /// Read one move command, returning (player, direction).
    pub async fn next_move(&mut self) -> (String, Direction) {
        let msg = self.next_publish().await;
        let player = msg
            .topic
            .strip_prefix(&format!("games/{}/", self.lobby))
            .and_then(|rest| rest.strip_suffix("/move"))
            .unwrap_or_else(|| panic!("not a move topic: {}", msg.topic))
            .to_string();
        let direction: Direction =
            serde_json::from_value(serde_json::Value::String(msg.payload_str().into_owned()))
                .unwrap();
        (player, direction)
    }
}
