//! User Service Library
//!
//! User account management over HTTP/JSON, backed by PostgreSQL.
//! The binary in `main.rs` is a thin CLI around [`run_server`] and
//! [`run_migrations`].

pub mod config;
pub mod http;
pub mod infra;
pub mod repository;
pub mod service;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use domain::Argon2Hasher;

use crate::config::UserServiceConfig;
use crate::http::{create_router, AppState};
use crate::infra::{Database, Persistence};
use crate::service::UserManager;

/// Migration action type.
#[derive(Debug, Clone, Copy)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(
    config: &UserServiceConfig,
    action: MigrateAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::connect_without_migrations(&config.database).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await?;
            for (name, applied) in status {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            if config.is_production() {
                return Err("refusing to reset the database in production".into());
            }
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    db.close().await?;
    Ok(())
}

/// Run the HTTP server until a shutdown signal arrives.
///
/// In-flight requests get `shutdown_timeout` to finish; after that the
/// server task is aborted and the pool closed anyway.
pub async fn run_server(config: UserServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize database
    let db = Database::connect(&config.database).await?;

    // Wire the service graph
    let uow = Arc::new(Persistence::new(db.get_connection()));
    let user_service = Arc::new(UserManager::new(uow, Arc::new(Argon2Hasher::new())));
    let state = AppState::new(user_service, Arc::new(db.clone()));

    let app = create_router(state, &config.server);

    // Build address
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        environment = %config.environment,
        "User service listening on {}",
        addr
    );

    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                let _ = signalled_tx.send(());
            })
            .await
    });

    tokio::select! {
        result = &mut server => result??,
        _ = signalled_rx => {
            let grace = config.server.shutdown_timeout();
            match tokio::time::timeout(grace, &mut server).await {
                Ok(result) => result??,
                Err(_) => {
                    warn!(
                        timeout_secs = grace.as_secs(),
                        "In-flight requests did not finish in time, aborting"
                    );
                    server.abort();
                }
            }
        }
    }

    if let Err(e) = db.close().await {
        error!("Failed to close database pool: {}", e);
    }
    info!("User service stopped");

    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, starting graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, starting graceful shutdown"),
    }
}
