// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{error::Error, fs, net::SocketAddr, sync::Arc};

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use personal_notes_server::{
    api::router,
    audit_writer::{AuditLogger, AuditWorker},
    config::{LogFormat, ServerConfig, DEFAULT_LOG_FILTER},
    encryption::{EncryptionGate, KeyStore},
    integrity::sweep_notes,
    settings::{SettingsStore, DEFAULT_NOTES_LIMIT},
    state::AppState,
    storage::NotesDatabase,
};

fn init_tracing(format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C");
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = ServerConfig::from_env();
    init_tracing(config.log_format);

    fs::create_dir_all(config.paths.root())?;
    let settings = SettingsStore::new(config.paths.settings_file());

    // Gate first: it generates the key (and the settings record) if missing.
    let mut gate = EncryptionGate::new();
    if let Err(e) = gate.initialize(&KeyStore::new(settings.clone())) {
        warn!(error = %e, "Encryption unavailable, running in read-only mode");
    }
    let gate = Arc::new(gate);

    let notes_limit = match settings.load() {
        Ok(Some(record)) => record.notes_limit(),
        Ok(None) => DEFAULT_NOTES_LIMIT,
        Err(e) => {
            warn!(error = %e, "Could not read settings, using default notes limit");
            DEFAULT_NOTES_LIMIT
        }
    };

    let db = Arc::new(NotesDatabase::open(&config.paths.database_file())?);
    info!(path = %config.paths.database_file().display(), "Database opened");

    let (audit, audit_rx) = AuditLogger::channel(config.audit_queue_capacity);
    let state = AppState::new(Arc::clone(&db), gate, audit).with_notes_limit(notes_limit);

    if let Err(e) = sweep_notes(&db, &state.codec, config.purge_unreadable_notes) {
        error!(error = %e, "Note integrity sweep failed");
    }

    let shutdown = CancellationToken::new();
    let worker = tokio::spawn(AuditWorker::new(Arc::clone(&db), audit_rx).run(shutdown.clone()));

    let encryption_valid = state.gate().is_valid();
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(
        addr = %config.bind_addr,
        encryption_valid,
        "Personal notes server listening (docs at /docs)"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    shutdown.cancel();
    if let Err(e) = worker.await {
        error!(error = %e, "Audit worker task failed");
    }
    info!("Server stopped");
    Ok(())
}
