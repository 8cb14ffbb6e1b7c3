//! In-memory [`MessageSink`] for exercising publish behavior without a
//! broker. Clones share state, so a test keeps one clone for assertions
//! while the publisher owns the other.

use crate::error::MqttError;
use crate::publisher::{MessageSink, OutboundMessage};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
pub struct MockSink {
    inner: Arc<MockSinkState>,
}

#[derive(Debug, Default)]
struct MockSinkState {
    connected: AtomicBool,
    fail_sends: AtomicBool,
    attempts: AtomicUsize,
    sent: Mutex<Vec<OutboundMessage>>,
}

impl MockSink {
    pub fn connected() -> Self {
        let sink = Self::default();
        sink.set_connected(true);
        sink
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn set_connected(&self, connected: bool) {
        self.inner.connected.store(connected, Ordering::SeqCst);
    }

    /// When set, `send` rejects every message with [`MqttError::Send`].
    pub fn fail_sends(&self, fail: bool) {
        self.inner.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Messages accepted so far, in send order.
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.inner.sent.lock().unwrap().clone()
    }

    /// Total `send` calls, accepted or rejected.
    pub fn attempts(&self) -> usize {
        self.inner.attempts.load(Ordering::SeqCst)
    }
}

impl MessageSink for MockSink {
    fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    async fn send(&mut self, topic: &str, payload: &[u8]) -> Result<(), MqttError> {
        self.inner.attempts.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_sends.load(Ordering::SeqCst) {
            return Err(MqttError::Send("mock sink rejected send".to_string()));
        }
        self.inner.sent.lock().unwrap().push(OutboundMessage {
            topic: topic.to_string(),
            payload: payload.to_vec(),
        });
        Ok(())
    }
}
