// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, process::ExitCode, sync::Arc, time::Duration};

use axum_server::{tls_rustls::RustlsConfig, Handle};
use keeper_server::{
    api::router,
    config::ServerConfig,
    logging,
    state::AppState,
    storage::RedbStore,
};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> ExitCode {
    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("failed to install rustls crypto provider");
        return ExitCode::FAILURE;
    }

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };
    logging::init(config.log_format);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.bind_addr()?;

    let store = RedbStore::open(&config.database_path)?;
    tracing::info!(path = %config.database_path.display(), "Record store opened");

    // TLS is mandatory; there is no plaintext fallback.
    let tls_config = RustlsConfig::from_pem_file(&config.tls_cert_path, &config.tls_key_path).await?;

    let state = AppState::new(
        Arc::new(store),
        config.master_key,
        config.jwt_secret.as_bytes(),
    );
    let app = router(state);

    let handle = Handle::new();
    tokio::spawn(shutdown_on_signal(handle.clone()));

    tracing::info!(%addr, "Keeper listening (docs at /docs)");
    axum_server::bind_rustls(addr, tls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_on_signal(handle: Handle<SocketAddr>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, draining connections");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}
