pub mod api;
pub mod config;
pub mod constants;
pub mod db;
pub mod dispatch;
pub mod domain;
pub mod entities;
pub mod kill_switch;
pub mod library;
pub mod services;

use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;

pub use config::Config;
use db::Store;
use dispatch::{EventDispatcher, SyncDelHandler};
use domain::events::OutboundEvent;
use kill_switch::KillSwitch;
use services::{
    LogNotifier, NoArtworkService, Notifier, SeaOrmSyncDelService, SyncDelService, WebhookNotifier,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let mut config = Config::load()?;
    config.validate()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    info!(
        "Mediasweep v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    // One-shot: wipe the deletion log if asked, then put the flag back.
    if config.sync.del_history {
        let removed = store.deletion_log().clear().await?;
        info!("Cleared {removed} deletion log entries");
        config.sync.del_history = false;
        if let Err(e) = config.save() {
            warn!("Could not persist del_history reset: {e}");
        }
    }

    let kill_switch = KillSwitch::new(&config.general.data_path);
    if kill_switch.is_tripped() {
        warn!(
            "Deletion sync is disabled by a previous safety fault; remove {}/sync_disabled to re-enable",
            config.general.data_path
        );
    }

    let (event_bus, _) =
        tokio::sync::broadcast::channel::<OutboundEvent>(config.general.event_bus_buffer_size);

    // Until a downloader manager subscribes, outbound events just get logged.
    let mut outbound_rx = event_bus.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = outbound_rx.recv().await {
            match &event {
                OutboundEvent::DownloadFileDeleted { src, hash } => {
                    info!("Outbound DownloadFileDeleted: src {src}, hash {hash}");
                }
            }
        }
    });

    let notifier: Arc<dyn Notifier> = if config.notifications.webhook_url.is_empty() {
        Arc::new(LogNotifier)
    } else {
        Arc::new(WebhookNotifier::new(&config.notifications.webhook_url))
    };

    let service: Arc<dyn SyncDelService> = Arc::new(SeaOrmSyncDelService::new(
        config.sync.clone(),
        store.transfer_history(),
        store.deletion_log(),
        kill_switch,
        Arc::new(NoArtworkService),
        notifier,
        event_bus.clone(),
    ));

    let mut dispatcher = EventDispatcher::new();
    let handler = Arc::new(SyncDelHandler::new(service.clone()));
    for kind in SyncDelHandler::kinds() {
        dispatcher.register(kind, handler.clone());
    }

    let (ingest_tx, ingest_rx) = mpsc::channel(config.general.event_bus_buffer_size);
    let dispatcher_handle = tokio::spawn(dispatcher.run(ingest_rx));

    let server_handle: Option<tokio::task::JoinHandle<()>> = if config.server.enabled {
        let port = config.server.port;
        info!("Starting Web API on port {}", port);

        let state = Arc::new(api::AppState {
            service,
            ingest: ingest_tx.clone(),
        });
        let app = api::router(state, &config.server.cors_allowed_origins);
        let addr = format!("0.0.0.0:{port}");
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        Some(tokio::spawn(async move {
            info!("Web Server running at http://0.0.0.0:{port}");
            if let Err(e) = axum::serve(listener, app).await {
                error!("Web server error: {}", e);
            }
        }))
    } else {
        None
    };

    info!("Mediasweep running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    // Closing the ingest sender lets the dispatcher drain and stop.
    drop(ingest_tx);
    if let Some(handle) = server_handle {
        handle.abort();
    }
    dispatcher_handle.abort();
    info!("Mediasweep stopped");

    Ok(())
}
