//! relaywatch entry point.

use std::{fs::File, io, sync::Arc};

use clap::Parser;
use relaywatch_core::{NotificationOptions, Transport};
use relaywatch_tui::{Args, Runtime, SystemEnv, TerminalDriver, WsTransport, spawn_heartbeat};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = args.config();

    if args.print_config {
        serde_json::to_writer_pretty(io::stdout().lock(), &config)?;
        return Ok(());
    }

    let log_file = File::create(&args.log_file)?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::sync::Mutex::new(log_file)).with_ansi(false))
        .with(filter)
        .init();

    let transport = args
        .url
        .as_deref()
        .map(|url| WsTransport::spawn(url, config.reconnect.clone()))
        .transpose()?
        .map(Arc::new);

    let heartbeat = match (&transport, config.heartbeat) {
        (Some(transport), Some(every)) => Some(spawn_heartbeat(Arc::downgrade(transport), every)),
        _ => None,
    };

    tracing::info!(url = ?args.url, "relaywatch starting");

    let attached = transport.clone().map(|transport| transport as Arc<dyn Transport>);
    let runtime = Runtime::new(TerminalDriver::new()?, SystemEnv::new(), attached, config.runtime);

    let greeting = transport.as_ref().map_or_else(
        || "Соединение не задано".to_owned(),
        |transport| format!("Наблюдение за {}", transport.url()),
    );
    runtime.notifications().show_info(greeting, NotificationOptions::default());

    let result = runtime.run().await;

    if let Some(heartbeat) = heartbeat {
        heartbeat.abort();
    }
    result?;
    Ok(())
}
