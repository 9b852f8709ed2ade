use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::grid::Position;

/// Player name as it appears in topic paths (e.g. `Player1`).
pub type PlayerId = String;

/// One player's view of the board for a single tick.
///
/// Field names follow the game server's JSON. Extra fields the server sends
/// (teammate names, enemy positions) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateSnapshot {
    pub current_position: Position,
    #[serde(default)]
    pub walls: HashSet<Position>,
    #[serde(default)]
    pub coin1: HashSet<Position>,
    #[serde(default)]
    pub coin2: HashSet<Position>,
    #[serde(default)]
    pub coin3: HashSet<Position>,
}

impl GameStateSnapshot {
    pub fn new(current_position: Position) -> Self {
        Self {
            current_position,
            ..Self::default()
        }
    }

    /// All coins regardless of pool.
    pub fn coins(&self) -> impl Iterator<Item = Position> + '_ {
        self.coin1
            .iter()
            .chain(&self.coin2)
            .chain(&self.coin3)
            .copied()
    }

    pub fn coin_count(&self) -> usize {
        self.coin1.len() + self.coin2.len() + self.coin3.len()
    }

    pub fn from_json(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }
}
