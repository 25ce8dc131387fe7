//! Interaction gatekeeper demo server.
//!
//! Loads the gatekeeper config and action manifest, builds an in-memory world
//! and replays a short scripted session through the dispatch pipeline.
//!
//! # Environment
//!
//! - `GATEKEEPER_CONFIG`: TOML config path (embedded defaults otherwise)
//! - `GATEKEEPER_MANIFEST`: RON action manifest path (embedded otherwise)
//! - `GATEKEEPER_MAX_DISTANCE`: overrides the interaction distance
//! - `GATEKEEPER_JSON_EVENTS`: print gatekeeper events as JSON lines
//! - `RUST_LOG`: log filter, `info` by default

mod actions;
mod config;
mod demo;

use anyhow::Result;
use interaction_runtime::{EventBus, Gatekeeper, GatekeeperEvent, OracleManager};
use tokio::sync::broadcast;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::ServerConfig;
use crate::demo::DemoWorld;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    setup_logging();

    let server_config = ServerConfig::from_env();
    let config = server_config.gatekeeper_config()?;
    let manifest = server_config.manifest()?;

    tracing::info!(
        max_distance = config.max_interaction_distance,
        manifest_entries = manifest.actions.len(),
        "starting interaction gatekeeper"
    );

    let events = EventBus::new(config.event_buffer_size);
    let printer = server_config
        .json_events
        .then(|| tokio::spawn(print_events(events.subscribe())));

    let demo = DemoWorld::new();
    let gatekeeper = Gatekeeper::builder()
        .config(config)
        .events(events)
        .oracles(OracleManager::new(
            demo.world.clone(),
            demo.actors.clone(),
            demo.ranks.clone(),
        ))
        .manifest(&actions::catalog(), &manifest)
        .build()
        .await?;

    demo::run_script(&gatekeeper).await;
    gatekeeper.shutdown().await?;

    if let Some(printer) = printer {
        printer.await?;
    }
    Ok(())
}

fn setup_logging() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Writes every event as one JSON line until the bus closes.
async fn print_events(mut rx: broadcast::Receiver<GatekeeperEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(err) => tracing::warn!(error = %err, "failed to encode event"),
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event printer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
