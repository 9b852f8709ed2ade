use std::collections::HashSet;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::watch;

use coinbot_core::decision::decide_move_with;
use coinbot_core::net::messages::OutboundMessage;
use coinbot_core::net::topics::Topics;
use coinbot_core::snapshot::PlayerId;

use crate::broker::{BrokerHandle, SharedStateBuffer};
use crate::error::ClientError;

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    GameOver,
    Shutdown,
}

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Moved { moves: usize, skipped: usize },
    GameOver,
}

/// Totals over the loop's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnLoopReport {
    pub ticks: u64,
    pub moves_sent: u64,
    pub skipped: u64,
    pub reason: StopReason,
}

/// Drains the state buffer once per tick and publishes one move per
/// buffered snapshot.
pub struct TurnLoop {
    buffer: SharedStateBuffer,
    broker: BrokerHandle,
    topics: Topics,
    tick: Duration,
    /// Players we are allowed to move. Empty means no filtering.
    roster: HashSet<PlayerId>,
    rng: StdRng,
    ticks: u64,
    moves_sent: u64,
    skipped: u64,
}

impl TurnLoop {
    pub fn new(
        buffer: SharedStateBuffer,
        broker: BrokerHandle,
        topics: Topics,
        tick: Duration,
        roster: impl IntoIterator<Item = PlayerId>,
        rng_seed: Option<u64>,
    ) -> Self {
        let rng = match rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            buffer,
            broker,
            topics,
            tick,
            roster: roster.into_iter().collect(),
            rng,
            ticks: 0,
            moves_sent: 0,
            skipped: 0,
        }
    }

    /// Run one tick: stop if the game is over, otherwise drain the buffer
    /// and publish a move for every snapshot that yields one.
    pub async fn tick_once(&mut self) -> Result<TickOutcome, ClientError> {
        let drained = {
            let mut buffer = self.buffer.lock().await;
            if buffer.is_game_over() {
                return Ok(TickOutcome::GameOver);
            }
            buffer.drain_all()
        };
        self.ticks += 1;

        let mut moves = 0;
        let mut skipped = 0;
        for (player, snapshot) in drained {
            if !self.roster.is_empty() && !self.roster.contains(&player) {
                tracing::debug!(player = %player, "Skipping snapshot for player outside roster");
                skipped += 1;
                continue;
            }
            match decide_move_with(&snapshot, &mut self.rng) {
                Ok(direction) => {
                    self.broker.publish(OutboundMessage::player_move(
                        &self.topics,
                        &player,
                        direction,
                    ))?;
                    tracing::debug!(
                        tick = self.ticks,
                        player = %player,
                        position = %snapshot.current_position,
                        direction = %direction,
                        "Move sent"
                    );
                    moves += 1;
                },
                Err(e) => {
                    tracing::warn!(tick = self.ticks, player = %player, error = %e, "No move this tick");
                    skipped += 1;
                },
            }
        }

        self.moves_sent += moves as u64;
        self.skipped += skipped as u64;
        Ok(TickOutcome::Moved { moves, skipped })
    }

    /// Tick until the lobby reports game over or `shutdown` fires.
    pub async fn run(
        mut self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<TurnLoopReport, ClientError> {
        tracing::info!(tick_ms = self.tick.as_millis() as u64, "Turn loop running");

        let mut interval = tokio::time::interval(self.tick);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick completes immediately; wait a full period before
        // the first drain so the server has time to publish state.
        interval.tick().await;

        let reason = loop {
            // A shutdown sent before this receiver was polled is not seen
            // by `changed()`.
            if *shutdown.borrow_and_update() {
                break StopReason::Shutdown;
            }
            tokio::select! {
                _ = interval.tick() => {
                    match self.tick_once().await {
                        Ok(TickOutcome::GameOver) => break StopReason::GameOver,
                        Ok(TickOutcome::Moved { .. }) => {},
                        Err(e) => return Err(e),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break StopReason::Shutdown;
                    }
                }
            }
        };

        let report = TurnLoopReport {
            ticks: self.ticks,
            moves_sent: self.moves_sent,
            skipped: self.skipped,
            reason,
        };
        tracing::info!(
            ticks = report.ticks,
            moves = report.moves_sent,
            skipped = report.skipped,
            reason = ?report.reason,
            "Turn loop terminated"
        );
        Ok(report)
    }
}
