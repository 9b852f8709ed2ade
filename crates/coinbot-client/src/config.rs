use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ClientError;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "coinbot.toml";

/// Top-level client configuration, loaded from `coinbot.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub broker: BrokerConfig,
    pub game: GameConfig,
    pub turn: TurnConfig,
}

/// Broker connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub tls: bool,
    pub keep_alive_secs: u64,
    /// Capacity of the MQTT client's request queue.
    pub request_capacity: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8883,
            client_id: "Player1".to_string(),
            username: None,
            password: None,
            tls: true,
            keep_alive_secs: 30,
            request_capacity: 64,
        }
    }
}

/// One team and the players registered into it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TeamConfig {
    pub name: String,
    pub players: Vec<String>,
}

/// Lobby setup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub lobby: String,
    pub teams: Vec<TeamConfig>,
    /// Pause between the last registration and `START`.
    pub start_delay_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            lobby: "Lobby1".to_string(),
            teams: vec![
                TeamConfig {
                    name: "Team1".to_string(),
                    players: vec!["Player1".to_string(), "Player2".to_string()],
                },
                TeamConfig {
                    name: "Team2".to_string(),
                    players: vec!["Player3".to_string(), "Player4".to_string()],
                },
            ],
            start_delay_ms: 1000,
        }
    }
}

impl GameConfig {
    /// `(team, player)` pairs in registration order.
    pub fn registrations(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.teams.iter().flat_map(|t| {
            t.players
                .iter()
                .map(move |p| (t.name.as_str(), p.as_str()))
        })
    }

    /// Every configured player, in registration order.
    pub fn roster(&self) -> Vec<String> {
        self.registrations()
            .map(|(_, player)| player.to_string())
            .collect()
    }

    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }
}

/// Turn loop cadence.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TurnConfig {
    pub tick_ms: u64,
    /// Fixed seed for move selection; random when unset.
    pub rng_seed: Option<u64>,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            tick_ms: 1000,
            rng_seed: None,
        }
    }
}

impl TurnConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl ClientConfig {
    /// Check the config, returning one message per problem found.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.broker.host.is_empty() {
            problems.push("broker.host must not be empty".to_string());
        }
        if self.broker.port == 0 {
            problems.push("broker.port must be > 0".to_string());
        }
        if self.broker.client_id.is_empty() {
            problems.push("broker.client_id must not be empty".to_string());
        }
        if self.broker.request_capacity == 0 {
            problems.push("broker.request_capacity must be > 0".to_string());
        }
        if self.game.lobby.is_empty() || self.game.lobby.contains(['/', '+', '#']) {
            problems.push("game.lobby must be a non-empty topic segment".to_string());
        }
        if self.game.teams.is_empty() {
            problems.push("game.teams must list at least one team".to_string());
        }
        for team in &self.game.teams {
            if team.players.is_empty() {
                problems.push(format!("team {} has no players", team.name));
            }
        }
        let roster = self.game.roster();
        for (i, name) in roster.iter().enumerate() {
            if roster[..i].contains(name) {
                problems.push(format!("player {name} is listed more than once"));
            }
        }
        if self.turn.tick_ms == 0 {
            problems.push("turn.tick_ms must be > 0".to_string());
        }

        if !self.broker.tls {
            tracing::warn!("TLS is disabled, credentials are sent in clear text");
        }
        if self.broker.password.is_some() && self.broker.username.is_none() {
            tracing::warn!("broker.password is set without broker.username");
        }

        problems
    }

    /// Like [`validate`](Self::validate) but folds the problems into an error.
    pub fn ensure_valid(&self) -> Result<(), ClientError> {
        let problems = self.validate();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ClientError::Config(problems))
        }
    }

    /// Load config from `path` if it exists, falling back to defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<ClientConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!(path = %path.display(), "Loaded configuration");
                    cfg
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Failed to parse config: {e}, using defaults");
                    ClientConfig::default()
                },
            },
            Err(_) => {
                tracing::info!(path = %path.display(), "No config file found, using defaults");
                ClientConfig::default()
            },
        }
    }

    /// Load from `COINBOT_CONFIG` (or `coinbot.toml`) and apply environment
    /// overrides.
    pub fn load() -> Self {
        let path = std::env::var("COINBOT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let mut config = Self::load_from(path);
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply overrides from a key lookup (normally the process environment).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(addr) = get("BROKER_ADDRESS") {
            self.broker.host = addr;
        }
        if let Some(val) = get("BROKER_PORT") {
            match val.parse::<u16>() {
                Ok(port) => self.broker.port = port,
                Err(_) => tracing::warn!(value = %val, "Ignoring unparsable BROKER_PORT"),
            }
        }
        if let Some(user) = get("USER_NAME") {
            self.broker.username = Some(user);
        }
        if let Some(pass) = get("PASSWORD") {
            self.broker.password = Some(pass);
        }
        if let Some(id) = get("COINBOT_CLIENT_ID") {
            self.broker.client_id = id;
        }
        if let Some(lobby) = get("COINBOT_LOBBY") {
            self.game.lobby = lobby;
        }
        if let Some(val) = get("COINBOT_TICK_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            self.turn.tick_ms = ms;
        }
    }
}
