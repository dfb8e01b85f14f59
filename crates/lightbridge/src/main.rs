use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use lightbridge::Config;
use lightbridge::Dispatcher;
use lightbridge::MappingTable;
use lightbridge::dispatch::event_queue;
use lightbridge::mqtt::RumqttcClient;
use tokio::sync::watch;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// How long to wait for the DISCONNECT to reach the broker on exit
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Bridge Zigbee2MQTT switch presses to light commands
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "lightbridge.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(config.logging.targets())
        .init();

    if let Err(errors) = config.validate() {
        for e in &errors {
            tracing::error!("Invalid config: {}", e);
        }
        anyhow::bail!("{} configuration error(s)", errors.len());
    }

    tracing::info!("Loaded config from: {}", args.config.display());

    let mappings = MappingTable::new(config.mappings);
    tracing::info!("Loaded {} switch mappings", mappings.len());

    let (events_tx, events_rx) = event_queue();
    let shutdown_tx = Arc::new(watch::channel(false).0);

    tracing::info!(
        "Connecting to MQTT broker at {}:{}",
        config.mqtt.broker,
        config.mqtt.port
    );
    let mut client = RumqttcClient::new(&config.mqtt);
    client.connect(events_tx);

    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("Received termination signal");
        signal_tx.send_replace(true);
    });

    tracing::info!("Service started");

    let mut dispatcher = Dispatcher::new(mappings, client);
    let result = dispatcher.run(events_rx, &shutdown_tx).await;

    if let Err(e) = dispatcher.client_mut().close(DISCONNECT_TIMEOUT).await {
        tracing::debug!("Error disconnecting from broker: {}", e);
    }

    result.context("Dispatcher stopped on an unrecoverable error")?;

    tracing::info!("lightbridge shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
