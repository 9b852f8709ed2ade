use rand::Rng;
use rand::seq::IndexedRandom;

use crate::grid::{Direction, Position};
use crate::snapshot::GameStateSnapshot;

/// Failure to produce a move for a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionError {
    /// Every direction is walled off or leaves the board.
    NoLegalMove { position: Position },
}

impl std::fmt::Display for DecisionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoLegalMove { position } => {
                write!(f, "no legal move from {position}: boxed in by walls and edges")
            },
        }
    }
}

impl std::error::Error for DecisionError {}

/// The set a move is drawn from, before the random pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveCandidates {
    /// At least one coin sits in an adjacent cell.
    GrabCoin(Vec<Direction>),
    /// No adjacent coin: every direction that is neither walled nor off-board.
    Wander(Vec<Direction>),
}

impl MoveCandidates {
    pub fn directions(&self) -> &[Direction] {
        match self {
            Self::GrabCoin(d) | Self::Wander(d) => d,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.directions().is_empty()
    }
}

/// Directions from `origin` toward every adjacent item, in `Direction::ALL`
/// order with duplicates removed.
pub fn find_nearby(items: impl IntoIterator<Item = Position>, origin: Position) -> Vec<Direction> {
    let mut hits = [false; 4];
    for item in items {
        let offset = item.offset_from(origin);
        if !offset.is_adjacent() {
            continue;
        }
        // Adjacent offsets are exactly the four unit vectors.
        if let Some(dir) = Direction::from_offset(offset) {
            hits[dir as usize] = true;
        }
    }
    Direction::ALL
        .into_iter()
        .filter(|d| hits[*d as usize])
        .collect()
}

/// Compute the deterministic candidate set for a snapshot.
pub fn candidate_moves(snapshot: &GameStateSnapshot) -> MoveCandidates {
    let player = snapshot.current_position;

    let coin_dirs = find_nearby(snapshot.coins(), player);
    if !coin_dirs.is_empty() {
        return MoveCandidates::GrabCoin(coin_dirs);
    }

    let blocked = find_nearby(snapshot.walls.iter().copied(), player);
    let open = Direction::ALL
        .into_iter()
        .filter(|d| !blocked.contains(d))
        .filter(|d| !player.at_edge(*d))
        .collect();
    MoveCandidates::Wander(open)
}

/// Pick the next move using the supplied RNG.
pub fn decide_move_with<R: Rng + ?Sized>(
    snapshot: &GameStateSnapshot,
    rng: &mut R,
) -> Result<Direction, DecisionError> {
    let candidates = candidate_moves(snapshot);
    candidates
        .directions()
        .choose(rng)
        .copied()
        .ok_or(DecisionError::NoLegalMove {
            position: snapshot.current_position,
        })
}

/// Pick the next move using the thread-local RNG.
pub fn decide_move(snapshot: &GameStateSnapshot) -> Result<Direction, DecisionError> {
    decide_move_with(snapshot, &mut rand::rng())
}
