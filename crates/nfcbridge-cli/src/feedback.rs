//! Log-only feedback backend.

use nfcbridge_reader::FeedbackDevice;
use std::time::Duration;
use tracing::info;

/// Feedback for deployments without a buzzer or LED: logs the signal and
/// holds the scan loop quiet for the hold period, matching the pacing a
/// physical device would impose.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleFeedback;

impl FeedbackDevice for ConsoleFeedback {
    async fn signal(&mut self, pulses: u8, hold: Duration) {
        info!(pulses, hold = ?hold, "feedback signal");
        tokio::time::sleep(hold).await;
    }
}
