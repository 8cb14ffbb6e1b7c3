//! Recording feedback device.

use crate::traits::FeedbackDevice;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One recorded feedback signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    pub pulses: u8,
    pub hold: Duration,
}

/// Feedback device that records signals instead of driving hardware.
/// Clones share the same log, so tests keep one clone to assert on.
#[derive(Debug, Clone, Default)]
pub struct MockFeedback {
    signals: Arc<Mutex<Vec<Signal>>>,
}

impl MockFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    /// All signals recorded so far, in order.
    pub fn signals(&self) -> Vec<Signal> {
        self.signals.lock().unwrap().clone()
    }

    /// Pulse counts only, for terse assertions.
    pub fn pulse_counts(&self) -> Vec<u8> {
        self.signals.lock().unwrap().iter().map(|s| s.pulses).collect()
    }
}

impl FeedbackDevice for MockFeedback {
    async fn signal(&mut self, pulses: u8, hold: Duration) {
        self.signals.lock().unwrap().push(Signal { pulses, hold });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signals_are_recorded_in_order() {
        let mut feedback = MockFeedback::new();
        let log = feedback.clone();

        feedback.signal(1, Duration::from_secs(5)).await;
        feedback.signal(5, Duration::from_secs(3)).await;

        assert_eq!(log.pulse_counts(), vec![1, 5]);
        assert_eq!(
            log.signals()[0],
            Signal {
                pulses: 1,
                hold: Duration::from_secs(5)
            }
        );
    }
}
