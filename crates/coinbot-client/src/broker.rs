use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{Mutex, mpsc, oneshot, watch};

use coinbot_core::net::messages::OutboundMessage;
use coinbot_core::state_buffer::StateBuffer;

use crate::error::ClientError;

/// State buffer shared by the listener and the turn loop.
pub type SharedStateBuffer = Arc<Mutex<StateBuffer>>;

pub fn shared_state_buffer() -> SharedStateBuffer {
    Arc::new(Mutex::new(StateBuffer::new()))
}

/// Requests sent to the broker adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerCommand {
    Subscribe(String),
    Publish(OutboundMessage),
}

/// A publish received from the broker.
#[derive(Debug, Clone)]
pub struct InboundPublish {
    pub topic: String,
    pub payload: Bytes,
}

/// Sending half used by session setup and the turn loop.
#[derive(Debug, Clone)]
pub struct BrokerHandle {
    commands: mpsc::UnboundedSender<BrokerCommand>,
}

impl BrokerHandle {
    pub fn new(commands: mpsc::UnboundedSender<BrokerCommand>) -> Self {
        Self { commands }
    }

    pub fn subscribe(&self, filter: impl Into<String>) -> Result<(), ClientError> {
        self.send(BrokerCommand::Subscribe(filter.into()))
    }

    pub fn publish(&self, msg: OutboundMessage) -> Result<(), ClientError> {
        self.send(BrokerCommand::Publish(msg))
    }

    fn send(&self, cmd: BrokerCommand) -> Result<(), ClientError> {
        self.commands
            .send(cmd)
            .map_err(|_| ClientError::ChannelClosed)
    }
}

/// Both halves of a broker connection plus the shutdown switch its tasks
/// watch.
pub struct BrokerLink {
    pub handle: BrokerHandle,
    pub inbound: mpsc::UnboundedReceiver<InboundPublish>,
    pub shutdown: Arc<watch::Sender<bool>>,
    /// Fires once if the connection dies. Dropping the sender without a
    /// value means the adapter stopped cleanly.
    pub failure: oneshot::Receiver<ClientError>,
}

/// Resolve with the adapter's reported failure, or never if it stopped
/// without one.
pub async fn transport_failure(failure: oneshot::Receiver<ClientError>) -> ClientError {
    match failure.await {
        Ok(e) => e,
        Err(_) => std::future::pending().await,
    }
}
