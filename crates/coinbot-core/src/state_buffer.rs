use crate::snapshot::{GameStateSnapshot, PlayerId};

/// Substring of the lobby status that ends the game.
pub const GAME_OVER_MARKER: &str = "Game Over: All coins have been collected";

/// Snapshots received since the last tick, plus the lobby status.
///
/// Holds at most one snapshot per player; a newer arrival replaces the
/// older one but keeps the player's original arrival slot.
#[derive(Debug, Default)]
pub struct StateBuffer {
    pending: Vec<(PlayerId, GameStateSnapshot)>,
    lobby_status: String,
    game_over: bool,
}

impl StateBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_snapshot(&mut self, player_id: PlayerId, snapshot: GameStateSnapshot) {
        match self.pending.iter_mut().find(|(id, _)| *id == player_id) {
            Some(slot) => slot.1 = snapshot,
            None => self.pending.push((player_id, snapshot)),
        }
    }

    /// Take every buffered snapshot in arrival order, leaving the buffer empty.
    pub fn drain_all(&mut self) -> Vec<(PlayerId, GameStateSnapshot)> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Store the latest lobby status. Game-over latches: a later status
    /// without the marker does not clear it.
    pub fn set_lobby_status(&mut self, text: impl Into<String>) {
        let text = text.into();
        if !self.game_over && text.contains(GAME_OVER_MARKER) {
            tracing::info!(status = %text, "Lobby reported game over");
            self.game_over = true;
        }
        self.lobby_status = text;
    }

    pub fn lobby_status(&self) -> &str {
        &self.lobby_status
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }
}
