use serde::{Deserialize, Serialize};

use crate::grid::Direction;
use crate::net::topics::{NEW_GAME_TOPIC, Topics};

/// Literal payload that starts a lobby's game.
pub const START_PAYLOAD: &str = "START";

/// Registration of one player into a lobby, published on `new_game`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGameMsg {
    pub lobby_name: String,
    pub team_name: String,
    pub player_name: String,
}

/// A message ready for the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl OutboundMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    pub fn new_game(msg: &NewGameMsg) -> Result<Self, serde_json::Error> {
        Ok(Self::new(NEW_GAME_TOPIC, serde_json::to_vec(msg)?))
    }

    pub fn start(topics: &Topics) -> Self {
        Self::new(topics.start(), START_PAYLOAD)
    }

    /// Move command for `player`; the payload is the bare direction name.
    pub fn player_move(topics: &Topics, player: &str, direction: Direction) -> Self {
        Self::new(topics.player_move(player), direction.as_str())
    }

    pub fn payload_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}
