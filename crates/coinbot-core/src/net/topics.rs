use crate::snapshot::{GameStateSnapshot, PlayerId};

/// Topic every lobby registration is published to.
pub const NEW_GAME_TOPIC: &str = "new_game";

/// Topic names for one lobby.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    lobby: String,
}

impl Topics {
    pub fn new(lobby: impl Into<String>) -> Self {
        Self {
            lobby: lobby.into(),
        }
    }

    pub fn lobby_name(&self) -> &str {
        &self.lobby
    }

    pub fn lobby(&self) -> String {
        format!("games/{}/lobby", self.lobby)
    }

    /// Wildcard filter matching every player's state topic.
    pub fn game_state_filter(&self) -> String {
        format!("games/{}/+/game_state", self.lobby)
    }

    pub fn scores(&self) -> String {
        format!("games/{}/scores", self.lobby)
    }

    pub fn start(&self) -> String {
        format!("games/{}/start", self.lobby)
    }

    pub fn player_move(&self, player: &str) -> String {
        format!("games/{}/{player}/move", self.lobby)
    }

    /// Filters to subscribe to before the game starts.
    pub fn subscriptions(&self) -> [String; 3] {
        [self.lobby(), self.game_state_filter(), self.scores()]
    }
}

/// Topic shapes this client reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicKind {
    Lobby,
    GameState,
    Scores,
}

/// A typed inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Lobby(String),
    GameState {
        player: PlayerId,
        snapshot: GameStateSnapshot,
    },
    Scores(String),
}

#[derive(Debug)]
pub enum RouteError {
    /// Topic is outside this lobby or has an unknown shape.
    UnknownTopic(String),
    /// Game state payload did not deserialize into a snapshot.
    MalformedSnapshot { player: PlayerId, reason: String },
}

impl std::fmt::Display for RouteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownTopic(t) => write!(f, "unknown topic: {t}"),
            Self::MalformedSnapshot { player, reason } => {
                write!(f, "malformed game state for {player}: {reason}")
            },
        }
    }
}

impl std::error::Error for RouteError {}

/// Splits inbound topics into [`TopicKind`]s and decodes payloads.
#[derive(Debug, Clone)]
pub struct Router {
    topics: Topics,
}

impl Router {
    pub fn new(topics: Topics) -> Self {
        Self { topics }
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    /// Classify a topic. For `GameState` the player segment is returned too.
    pub fn classify<'a>(&self, topic: &'a str) -> Option<(TopicKind, Option<&'a str>)> {
        let rest = topic
            .strip_prefix("games/")?
            .strip_prefix(self.topics.lobby_name())?
            .strip_prefix('/')?;
        let segments: Vec<&str> = rest.split('/').collect();
        match segments.as_slice() {
            ["lobby"] => Some((TopicKind::Lobby, None)),
            ["scores"] => Some((TopicKind::Scores, None)),
            [player, "game_state"] if !player.is_empty() => {
                Some((TopicKind::GameState, Some(*player)))
            },
            _ => None,
        }
    }

    pub fn route(&self, topic: &str, payload: &[u8]) -> Result<InboundMessage, RouteError> {
        let Some((kind, player)) = self.classify(topic) else {
            return Err(RouteError::UnknownTopic(topic.to_string()));
        };
        match (kind, player) {
            (TopicKind::Lobby, _) => Ok(InboundMessage::Lobby(
                String::from_utf8_lossy(payload).into_owned(),
            )),
            (TopicKind::Scores, _) => Ok(InboundMessage::Scores(
                String::from_utf8_lossy(payload).into_owned(),
            )),
            (TopicKind::GameState, Some(player)) => {
                let snapshot = GameStateSnapshot::from_json(payload).map_err(|e| {
                    RouteError::MalformedSnapshot {
                        player: player.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                Ok(InboundMessage::GameState {
                    player: player.to_string(),
                    snapshot,
                })
            },
            (TopicKind::GameState, None) => Err(RouteError::UnknownTopic(topic.to_string())),
        }
    }
}
