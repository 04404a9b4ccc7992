// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;
use std::sync::Arc;

use portfolio_server::{
    api::router,
    assets::{AssetError, AssetTree},
    auth::{AuthError, AuthGate, FirebaseVerifier, JwksManager},
    config::{Config, ConfigError},
    state::AppState,
    storage::{PgHoldingsStore, StorageError},
    telemetry::{init_tracing, LogFormat},
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("identity provider: {0}")]
    Auth(#[from] AuthError),
    #[error("database: {0}")]
    Storage(#[from] StorageError),
    #[error("assets: {0}")]
    Assets(#[from] AssetError),
    #[error("server: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing(LogFormat::from_env());

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    let config = Config::from_env()?;

    let jwks = JwksManager::new(config.jwks_url.clone())?;
    let verifier = FirebaseVerifier::new(config.service_account.project_id.clone(), jwks);
    tracing::info!(project_id = verifier.project_id(), "Firebase verification configured");
    let gate = AuthGate::new(Arc::new(verifier)).with_timeout(config.verify_timeout);

    let holdings = PgHoldingsStore::connect(&config.database_url).await?;
    tracing::info!("Connected to database");

    let assets = if config.web_dist_dir.is_dir() {
        let tree = AssetTree::load(&config.web_dist_dir)?;
        tracing::info!(
            dir = %config.web_dist_dir.display(),
            files = tree.len(),
            "Loaded web assets"
        );
        tree
    } else {
        tracing::warn!(
            dir = %config.web_dist_dir.display(),
            "Web asset directory not found, serving API only"
        );
        AssetTree::default()
    };

    let state = AppState::new(gate, Arc::new(holdings), assets);
    let app = router(state, config.allowed_origins.clone());

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "Portfolio server listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Cancel `shutdown` on Ctrl-C or SIGTERM.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl-C, shutting down"),
        _ = terminate => tracing::info!("Received terminate signal, shutting down"),
    }
    shutdown.cancel();
}
