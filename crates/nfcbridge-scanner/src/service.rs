//! The scan-cycle service loop.

use crate::classify::classify_tag;
use crate::commands::process_command;
use crate::queue::CommandQueue;
use chrono::Utc;
use nfcbridge_core::ScanReport;
use nfcbridge_core::config::BridgeConfig;
use nfcbridge_core::constants::TAG_WAIT_TIMEOUT;
use nfcbridge_payload::PayloadCipher;
use nfcbridge_reader::{FeedbackDevice, NfcReader, NfcTag, ReaderError};
use nfcbridge_mqtt::{MessageSink, Publisher};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Feedback after a command cycle: 1 pulse for success, 5 for failure.
const COMMAND_OK_PULSES: u8 = 1;
const COMMAND_FAILED_PULSES: u8 = 5;
const COMMAND_FEEDBACK_HOLD: Duration = Duration::from_secs(3);

/// Loop settings pulled out of the full configuration.
#[derive(Debug, Clone)]
pub struct ScannerSettings {
    pub base_topic: String,
    pub auth_secret: Option<String>,
}

impl ScannerSettings {
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            base_topic: config.mqtt.topic.clone(),
            auth_secret: config.nfc.authenticate_password.clone(),
        }
    }
}

/// The bridge's single scan task: flush, wait for a tag, then run exactly
/// one pending command or classify and publish.
pub struct Scanner<R, F, S> {
    reader: R,
    feedback: F,
    publisher: Publisher<S>,
    queue: CommandQueue,
    cipher: PayloadCipher,
    settings: ScannerSettings,
}

impl<R, F, S> Scanner<R, F, S>
where
    R: NfcReader,
    F: FeedbackDevice,
    S: MessageSink,
{
    pub fn new(
        reader: R,
        feedback: F,
        sink: S,
        queue: CommandQueue,
        cipher: PayloadCipher,
        settings: ScannerSettings,
    ) -> Self {
        Self {
            reader,
            feedback,
            publisher: Publisher::new(sink),
            queue,
            cipher,
            settings,
        }
    }

    /// Run cycles until cancelled. Cancellation is checked between cycles,
    /// so the current cycle always completes. A reader failure ends the
    /// loop; everything else is handled inside the cycle.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(base_topic = %self.settings.base_topic, "starting scan loop");
        while !cancel.is_cancelled() {
            if let Err(e) = self.run_cycle().await {
                error!(error = %e, "reader failed, stopping scan loop");
                break;
            }
        }
        info!("scan loop stopped");
    }

    /// One full cycle.
    ///
    /// # Errors
    /// Returns an error only when the reader itself went away; an idle
    /// cycle (no tag) is `Ok`.
    pub async fn run_cycle(&mut self) -> Result<(), ReaderError> {
        self.publisher.flush().await;

        let Some(mut tag) = self.reader.wait_for_tag(TAG_WAIT_TIMEOUT).await? else {
            return Ok(());
        };
        let info = tag.info();
        debug!(tag = %info.id, product = %info.product, "tag entered the field");

        // A pending command consumes the tag; no event is published for
        // a command cycle.
        if let Some(command) = self.queue.try_dequeue() {
            let ok = process_command(
                &mut tag,
                command,
                &self.cipher,
                self.settings.auth_secret.as_deref(),
            )
            .await;
            let pulses = if ok { COMMAND_OK_PULSES } else { COMMAND_FAILED_PULSES };
            self.feedback.signal(pulses, COMMAND_FEEDBACK_HOLD).await;
            return Ok(());
        }

        let outcome = classify_tag(
            &mut tag,
            &self.cipher,
            self.settings.auth_secret.as_deref(),
            Utc::now(),
        )
        .await;
        info!(tag = %info.id, status = outcome.status(), "scan classified");

        let report = ScanReport::new(info, outcome);
        let pulses = report.outcome.pulse_count();
        let hold = report.outcome.feedback_hold();
        self.publisher
            .publish_json(&report.event_topic(&self.settings.base_topic), &report.to_event_json())
            .await;
        self.feedback.signal(pulses, hold).await;
        Ok(())
    }

    /// Messages still waiting in the publish queue.
    pub fn pending_publishes(&self) -> usize {
        self.publisher.queued()
    }
}
