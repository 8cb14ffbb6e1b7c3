//! Broker connection supervision.
//!
//! The supervisor runs the `rumqttc` event loop on its own task, flips the
//! shared session flag on connect and disconnect, re-subscribes to the
//! control topics after every reconnect, and hands inbound control
//! messages to the registered [`ControlHandler`]. Failed connections are
//! retried on a fixed delay for as long as the service runs.

use crate::control::{ControlHandler, ControlTopics};
use crate::error::MqttError;
use crate::publisher::MessageSink;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use nfcbridge_core::config::MqttConfig;
use nfcbridge_core::constants::RECONNECT_DELAY;

/// Connection parameters distilled from [`MqttConfig`].
#[derive(Debug, Clone)]
pub struct BrokerSettings {
    pub host: String,
    pub port: u16,
    pub keepalive: std::time::Duration,
    pub credentials: Option<(String, String)>,
    pub client_id: String,
    /// Consecutive connection failures tolerated before giving up.
    /// `None` retries forever.
    pub max_retries: Option<u32>,
}

impl BrokerSettings {
    pub fn from_config(config: &MqttConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            keepalive: std::time::Duration::from_secs(config.keepalive_secs),
            // A username without a password connects with an empty one.
            credentials: config
                .username
                .clone()
                .map(|username| (username, config.password.clone().unwrap_or_default())),
            client_id: format!("nfcbridge-{}", std::process::id()),
            max_retries: None,
        }
    }

    fn mqtt_options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(&self.client_id, &self.host, self.port);
        options.set_keep_alive(self.keepalive);
        options.set_clean_session(true);
        if let Some((username, password)) = &self.credentials {
            options.set_credentials(username, password);
        }
        options
    }
}

/// Session lifecycle as seen by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Connected,
}

/// Publish handle shared with the scan loop. Cheap to clone; all clones
/// observe the same session flag.
#[derive(Debug, Clone)]
pub struct MqttSink {
    client: AsyncClient,
    connected: Arc<AtomicBool>,
}

impl MqttSink {
    pub fn state(&self) -> SessionState {
        if self.is_connected() {
            SessionState::Connected
        } else {
            SessionState::Connecting
        }
    }
}

impl MessageSink for MqttSink {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn send(&mut self, topic: &str, payload: &[u8]) -> Result<(), MqttError> {
        self.client
            .publish(topic, QoS::AtLeastOnce, false, payload.to_vec())
            .await
            .map_err(|e| MqttError::Send(e.to_string()))
    }
}

/// Owns the broker event loop and the inbound side of the session.
pub struct Supervisor<H> {
    client: AsyncClient,
    eventloop: EventLoop,
    topics: ControlTopics,
    handler: H,
    connected: Arc<AtomicBool>,
    max_retries: Option<u32>,
}

impl<H: ControlHandler> Supervisor<H> {
    /// Build the client and split off the publish handle. The session is
    /// not live until [`run`](Self::run) is driving the event loop.
    pub fn new(settings: &BrokerSettings, topics: ControlTopics, handler: H) -> (Self, MqttSink) {
        let (client, eventloop) = AsyncClient::new(settings.mqtt_options(), 32);
        let connected = Arc::new(AtomicBool::new(false));
        let sink = MqttSink {
            client: client.clone(),
            connected: Arc::clone(&connected),
        };
        let supervisor = Self {
            client,
            eventloop,
            topics,
            handler,
            connected,
            max_retries: settings.max_retries,
        };
        (supervisor, sink)
    }

    /// Drive the session until cancelled. Connection failures are retried
    /// after [`RECONNECT_DELAY`] until the retry budget is spent; a
    /// successful connect resets the budget. The default budget is
    /// unlimited.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!("starting broker supervisor");
        let mut failures: u32 = 0;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("shutdown signal received, closing broker session");
                    self.connected.store(false, Ordering::SeqCst);
                    let _ = self.client.disconnect().await;
                    break;
                }
                event = self.eventloop.poll() => match event {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("connected to broker");
                        failures = 0;
                        self.connected.store(true, Ordering::SeqCst);
                        if let Err(e) =
                            Self::subscribe_control_topics(&self.client, &self.topics).await
                        {
                            // The session will drop and the next poll
                            // reports the failure.
                            error!(error = %e, "subscribe after connect failed");
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        self.dispatch(&publish.topic, &publish.payload);
                    }
                    Ok(Event::Incoming(Packet::SubAck(_))) => {
                        debug!("subscription acknowledged");
                    }
                    Ok(Event::Incoming(Packet::Disconnect)) => {
                        warn!("broker closed the session");
                        self.connected.store(false, Ordering::SeqCst);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        self.connected.store(false, Ordering::SeqCst);
                        failures += 1;
                        if let Some(budget) = self.max_retries
                            && failures > budget
                        {
                            error!(attempts = failures, "retry budget exhausted, stopping supervisor");
                            break;
                        }
                        error!(error = %e, attempt = failures, delay = ?RECONNECT_DELAY, "broker connection lost, retrying");
                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                        }
                    }
                },
            }
        }
        info!("broker supervisor stopped");
    }

    // Borrows only `Sync` fields so the `run` future stays `Send` despite
    // the non-`Sync` `EventLoop` held by `self`.
    async fn subscribe_control_topics(
        client: &AsyncClient,
        topics: &ControlTopics,
    ) -> Result<(), MqttError> {
        for topic in topics.subscriptions() {
            client
                .subscribe(topic, QoS::AtLeastOnce)
                .await
                .map_err(|e| MqttError::Subscribe(e.to_string()))?;
            info!(topic, "subscribed to control topic");
        }
        Ok(())
    }

    fn dispatch(&self, topic: &str, payload: &[u8]) {
        match self.topics.route(topic, payload) {
            Some(command) => {
                debug!(topic, "control message received");
                self.handler.handle(command);
            }
            None => debug!(topic, "ignoring message on unexpected topic"),
        }
    }
}
