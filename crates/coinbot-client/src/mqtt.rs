//! rumqttc-backed broker adapter.
//!
//! Two tasks per connection: a pump that drives the MQTT event loop and
//! forwards incoming publishes, and a writer that turns [`BrokerCommand`]s
//! into subscribe/publish requests. A connection error stops the pump and
//! is reported once through the link's `failure` channel; there is no
//! reconnect.

use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS, Transport};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::broker::{BrokerCommand, BrokerHandle, BrokerLink, InboundPublish};
use crate::config::BrokerConfig;
use crate::error::ClientError;

/// How long the pump keeps polling after shutdown so queued requests and
/// the DISCONNECT reach the broker.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

pub fn mqtt_options(config: &BrokerConfig) -> MqttOptions {
    let mut opts = MqttOptions::new(&config.client_id, &config.host, config.port);
    opts.set_keep_alive(Duration::from_secs(config.keep_alive_secs.max(5)));
    if let Some(user) = &config.username {
        opts.set_credentials(user, config.password.as_deref().unwrap_or_default());
    }
    if config.tls {
        opts.set_transport(Transport::tls_with_default_config());
    }
    opts
}

/// Open a broker connection and spawn its pump and writer tasks.
pub fn connect(config: &BrokerConfig) -> (BrokerLink, Vec<JoinHandle<()>>) {
    let (client, eventloop) = AsyncClient::new(mqtt_options(config), config.request_capacity);
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (failure_tx, failure_rx) = oneshot::channel();

    tracing::info!(
        host = %config.host,
        port = config.port,
        client_id = %config.client_id,
        tls = config.tls,
        "Connecting to broker"
    );

    let pump = tokio::spawn(run_event_pump(
        eventloop,
        inbound_tx,
        failure_tx,
        shutdown_rx.clone(),
    ));
    let writer = tokio::spawn(run_command_writer(client, cmd_rx, shutdown_rx));

    let link = BrokerLink {
        handle: BrokerHandle::new(cmd_tx),
        inbound: inbound_rx,
        shutdown: Arc::new(shutdown_tx),
        failure: failure_rx,
    };
    (link, vec![pump, writer])
}

async fn run_event_pump(
    mut eventloop: EventLoop,
    inbound_tx: mpsc::UnboundedSender<InboundPublish>,
    failure_tx: oneshot::Sender<ClientError>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut connected = false;
    let failure = loop {
        tokio::select! {
            _ = shutdown.changed() => break None,
            event = eventloop.poll() => match event {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    tracing::debug!(topic = %publish.topic, bytes = publish.payload.len(), "Message received");
                    let msg = InboundPublish {
                        topic: publish.topic,
                        payload: publish.payload,
                    };
                    if inbound_tx.send(msg).is_err() {
                        tracing::debug!("Inbound receiver dropped, stopping event pump");
                        break None;
                    }
                },
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    connected = true;
                    tracing::info!(code = ?ack.code, "CONNACK received");
                },
                Ok(Event::Incoming(Packet::SubAck(ack))) => {
                    tracing::debug!(pkid = ack.pkid, codes = ?ack.return_codes, "Subscribed");
                },
                Ok(Event::Incoming(Packet::PubAck(ack))) => {
                    tracing::trace!(pkid = ack.pkid, "Publish acknowledged");
                },
                Ok(_) => {},
                Err(e) => break Some(e),
            }
        }
    };

    match failure {
        Some(e) => {
            let reason = if connected {
                format!("connection lost: {e}")
            } else {
                format!("could not connect: {e}")
            };
            tracing::error!(error = %e, connected, "Broker connection failed");
            let _ = failure_tx.send(ClientError::Transport(reason));
        },
        None => flush_until_disconnect(&mut eventloop).await,
    }
    tracing::info!("Event pump stopped");
}

/// Keep the event loop turning until the writer's DISCONNECT has gone out.
async fn flush_until_disconnect(eventloop: &mut EventLoop) {
    let flush = async {
        loop {
            match eventloop.poll().await {
                Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
                Ok(_) => {},
                Err(e) => {
                    tracing::debug!(error = %e, "Connection closed while flushing");
                    break;
                },
            }
        }
    };
    if tokio::time::timeout(FLUSH_TIMEOUT, flush).await.is_err() {
        tracing::warn!("Timed out flushing outgoing requests");
    }
}

async fn run_command_writer(
    client: AsyncClient,
    mut cmd_rx: mpsc::UnboundedReceiver<BrokerCommand>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let cmd = tokio::select! {
            _ = shutdown.changed() => break,
            cmd = cmd_rx.recv() => match cmd {
                Some(cmd) => cmd,
                None => break,
            },
        };
        forward(&client, cmd).await;
    }

    let queued = take_queued(&mut cmd_rx);
    if !queued.is_empty() {
        tracing::debug!(count = queued.len(), "Flushing queued commands before disconnect");
    }
    for cmd in queued {
        forward(&client, cmd).await;
    }
    if let Err(e) = client.disconnect().await {
        tracing::debug!(error = %e, "Disconnect request not delivered");
    }
    tracing::info!("Command writer stopped");
}

async fn forward(client: &AsyncClient, cmd: BrokerCommand) {
    let result = match cmd {
        BrokerCommand::Subscribe(filter) => {
            tracing::debug!(filter = %filter, "Subscribing");
            client.subscribe(filter, QoS::AtLeastOnce).await
        },
        BrokerCommand::Publish(msg) => {
            tracing::debug!(topic = %msg.topic, payload = %msg.payload_str(), "Publishing");
            client
                .publish(msg.topic, QoS::AtLeastOnce, false, msg.payload)
                .await
        },
    };
    if let Err(e) = result {
        tracing::warn!(error = %e, "Broker request failed");
    }
}

/// Commands already sitting in the channel when shutdown fired.
fn take_queued(cmd_rx: &mut mpsc::UnboundedReceiver<BrokerCommand>) -> Vec<BrokerCommand> {
    std::iter::from_fn(|| cmd_rx.try_recv().ok()).collect()
}
