//! nfcbridge: NFC tag ⇄ MQTT bridge daemon.

mod feedback;
mod settings;

use anyhow::{Context, Result, bail};
use clap::Parser;
use feedback::ConsoleFeedback;
use nfcbridge_mqtt::{BrokerSettings, ControlTopics, Supervisor};
use nfcbridge_payload::PayloadCipher;
use nfcbridge_reader::mock::MockReader;
use nfcbridge_scanner::{CommandEnqueuer, CommandQueue, Scanner, ScannerSettings};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Parser)]
#[command(name = "nfcbridge", version, about = "NFC tag to MQTT bridge")]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = "nfcbridge.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = settings::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    config.validate().context("invalid configuration")?;

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!(version = nfcbridge_core::VERSION, "starting nfcbridge");

    let cipher = PayloadCipher::new(&config.nfc.encrypt_key)
        .context("nfc.encrypt_key is not a valid payload key")?;

    // The mock backend idles until tags are presented programmatically;
    // it exists so the full pipeline runs without reader hardware. The
    // handle must outlive the loop or the reader counts as unplugged.
    let (reader, _reader_handle) = match config.nfc.reader.as_str() {
        "mock" => MockReader::new(),
        other => bail!("unknown reader backend: {other}"),
    };

    let queue = CommandQueue::new();
    let enqueuer = CommandEnqueuer::new(queue.clone(), config.nfc.id_length);
    let topics = ControlTopics::new(&config.mqtt.topic);
    let broker = BrokerSettings::from_config(&config.mqtt);
    info!(host = %broker.host, port = broker.port, client_id = %broker.client_id, "broker configured");
    let (supervisor, sink) = Supervisor::new(&broker, topics, enqueuer);

    let cancel = CancellationToken::new();
    let supervisor_task = tokio::spawn(supervisor.run(cancel.clone()));

    let scanner = Scanner::new(
        reader,
        ConsoleFeedback,
        sink,
        queue,
        cipher,
        ScannerSettings::from_config(&config),
    );
    let mut scanner_task = tokio::spawn(scanner.run(cancel.clone()));

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("listening for shutdown signal")?;
            info!("shutdown signal received");
            cancel.cancel();
            let _ = (&mut scanner_task).await;
        }
        _ = &mut scanner_task => {
            error!("scan loop exited unexpectedly, shutting down");
            cancel.cancel();
        }
    }
    let _ = supervisor_task.await;

    info!("nfcbridge stopped");
    Ok(())
}
