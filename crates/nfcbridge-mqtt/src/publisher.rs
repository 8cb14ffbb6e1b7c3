//! Publish reliability queue.
//!
//! `publish` is always non-blocking and always succeeds from the caller's
//! perspective: a message that cannot be sent right now is buffered and
//! replayed by `flush` at the start of every scan cycle until the queue
//! drains or the process exits. Nothing is persisted across restarts.

use crate::error::MqttError;
use serde_json::Value;
use std::collections::VecDeque;
use tracing::{debug, error, warn};

/// A not-yet-acknowledged outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// The transport seam the publisher sends through. The supervisor's
/// [`MqttSink`](crate::supervisor::MqttSink) is the production
/// implementation; tests use [`MockSink`](crate::testing::MockSink).
pub trait MessageSink: Send {
    /// Whether a broker session is currently usable.
    fn is_connected(&self) -> bool;

    /// Hand one message to the transport.
    ///
    /// # Errors
    /// Returns an error when the transport rejects the message; the caller
    /// queues it for a later flush.
    async fn send(&mut self, topic: &str, payload: &[u8]) -> Result<(), MqttError>;
}

/// Ordered buffer of outbound messages in front of a [`MessageSink`].
#[derive(Debug)]
pub struct Publisher<S> {
    sink: S,
    queue: VecDeque<OutboundMessage>,
}

impl<S: MessageSink> Publisher<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            queue: VecDeque::new(),
        }
    }

    /// Serialize a structured value to JSON and publish it.
    pub async fn publish_json(&mut self, topic: &str, value: &Value) {
        match serde_json::to_vec(value) {
            Ok(payload) => self.publish(topic, payload).await,
            // Unreachable for Value, but a dropped event must leave a trace.
            Err(e) => error!(topic, error = %e, "failed to serialize event, dropping"),
        }
    }

    /// Publish raw bytes. Never fails: on a dead session or a rejected
    /// send the message goes to the back of the queue.
    pub async fn publish(&mut self, topic: &str, payload: Vec<u8>) {
        if !self.sink.is_connected() {
            warn!(topic, "not connected to broker, queueing message");
            self.enqueue(topic, payload);
            return;
        }
        if let Err(e) = self.sink.send(topic, &payload).await {
            error!(topic, error = %e, "unable to publish message, queueing");
            self.enqueue(topic, payload);
        }
    }

    /// Replay the currently queued messages, oldest first, each attempted
    /// at most once per invocation. A send the transport rejects is
    /// re-appended at the tail; a dead session ends the pass immediately so
    /// the remaining messages keep their order.
    pub async fn flush(&mut self) {
        let pending = self.queue.len();
        if pending == 0 {
            return;
        }
        debug!(pending, "resending publish queue");

        for _ in 0..pending {
            if !self.sink.is_connected() {
                break;
            }
            let Some(message) = self.queue.pop_front() else {
                break;
            };
            if let Err(e) = self.sink.send(&message.topic, &message.payload).await {
                warn!(topic = %message.topic, error = %e, "resend failed, keeping message queued");
                self.queue.push_back(message);
            }
        }
    }

    /// Number of messages waiting for a successful flush.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    fn enqueue(&mut self, topic: &str, payload: Vec<u8>) {
        self.queue.push_back(OutboundMessage {
            topic: topic.to_string(),
            payload,
        });
    }
}
