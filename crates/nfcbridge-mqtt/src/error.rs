use thiserror::Error;

/// Errors crossing the broker transport boundary.
///
/// None of these reach the scan loop: sends that fail are queued by the
/// publisher and connection errors are retried by the supervisor.
#[derive(Debug, Error)]
pub enum MqttError {
    #[error("Broker connection failed: {0}")]
    Connection(String),

    #[error("Publish failed: {0}")]
    Send(String),

    #[error("Subscribe failed: {0}")]
    Subscribe(String),
}
