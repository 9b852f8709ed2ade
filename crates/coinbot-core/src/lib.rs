pub mod decision;
pub mod grid;
pub mod net;
pub mod snapshot;
pub mod state_buffer;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::grid::Position;
    use crate::snapshot::GameStateSnapshot;

    /// Build a snapshot with all coins in the first pool.
    pub fn make_snapshot(
        player: (i32, i32),
        walls: &[(i32, i32)],
        coins: &[(i32, i32)],
    ) -> GameStateSnapshot {
        let mut snap = GameStateSnapshot::new(Position::new(player.0, player.1));
        snap.walls = walls.iter().map(|&(r, c)| Position::new(r, c)).collect();
        snap.coin1 = coins.iter().map(|&(r, c)| Position::new(r, c)).collect();
        snap
    }

    /// Serialize a snapshot the way the game server does.
    pub fn snapshot_json(snap: &GameStateSnapshot) -> Vec<u8> {
        serde_json::to_vec(snap).expect("snapshot serialization must succeed")
    }

    /// `n` player names, `Player1..=Playern`.
    pub fn make_player_names(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("Player{i}")).collect()
    }
}
