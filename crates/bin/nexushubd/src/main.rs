//! # nexushubd: nexushub daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Construct the device store (REST client or in-memory catalogue)
//! - Construct the engine, injecting the store and the alert bus via ports
//! - Start the poll, timer and write-back tasks
//! - Build the axum router and serve until SIGINT/SIGTERM
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context as _;
use tracing_subscriber::EnvFilter;

use nexushub_adapter_http_axum::state::AppState;
use nexushub_adapter_store_http::HttpDeviceStore;
use nexushub_adapter_virtual::VirtualStore;
use nexushub_app::alert_bus::InProcessAlertBus;
use nexushub_app::config::EngineConfig;
use nexushub_app::engine::Engine;
use nexushub_app::ports::DeviceStore;

use crate::config::{Config, StoreKind};

/// Alerts buffered per SSE subscriber before it starts lagging.
const ALERT_BUS_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let engine_config = config.engine_config()?;
    let bind_addr = config.bind_addr();

    match config.store.kind {
        StoreKind::Http => {
            let store_config = config
                .http_store()
                .context("store.base_url is required for the http store")?;
            let store = HttpDeviceStore::new(&store_config).context("building store client")?;
            tracing::info!(base_url = %store.base_url(), "using http store");
            serve(store, engine_config, &bind_addr).await
        }
        StoreKind::Virtual => {
            tracing::info!("using virtual store");
            serve(VirtualStore::seeded(), engine_config, &bind_addr).await
        }
    }
}

async fn serve<S>(store: S, engine_config: EngineConfig, bind_addr: &str) -> anyhow::Result<()>
where
    S: DeviceStore + Send + Sync + 'static,
{
    let alerts = InProcessAlertBus::new(ALERT_BUS_CAPACITY);
    let engine = Arc::new(Engine::new(store, alerts.clone(), engine_config));
    let handle = engine.start().await;

    let app = nexushub_adapter_http_axum::router::build(AppState::new(engine, alerts));

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    tracing::info!("nexushubd listening on http://{bind_addr}");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    handle.stop();
    served.context("serving http")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
