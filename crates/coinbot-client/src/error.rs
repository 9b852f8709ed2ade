#[derive(Debug)]
pub enum ClientError {
    /// A broker adapter task died instead of shutting down cleanly.
    Transport(String),
    /// The broker adapter's command channel is gone.
    ChannelClosed,
    Encode(String),
    Config(Vec<String>),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(m) => write!(f, "transport error: {m}"),
            Self::ChannelClosed => write!(f, "broker command channel closed"),
            Self::Encode(m) => write!(f, "encode error: {m}"),
            Self::Config(problems) => write!(f, "invalid config: {}", problems.join("; ")),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        Self::Encode(e.to_string())
    }
}
