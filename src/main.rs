//! # Waaed API Main Entry Point
//!
//! Boots the platform: configuration, telemetry, database, seed data,
//! the background notification dispatcher, and the HTTP server.

use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use tokio_util::sync::CancellationToken;
use waaed::{
    config::ConfigLoader, db, dispatcher::Dispatcher, seeds, server::run_server, telemetry,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from layered env files and variables
    let config = ConfigLoader::new().load()?;
    telemetry::init_tracing(&config)?;

    tracing::info!(profile = %config.profile, "Configuration loaded");
    if let Ok(redacted) = config.redacted_json() {
        tracing::debug!(config = %redacted, "Effective configuration");
    }

    let db = db::init_pool(&config).await?;
    Migrator::up(&db, None).await?;

    // Idempotent bootstrap: permission catalogue plus per-tenant defaults.
    seeds::seed_permission_catalogue(&db).await?;
    for tenant in waaed::repositories::TenantRepository::new(&db)
        .list_tenants()
        .await?
    {
        seeds::seed_tenant_defaults(&db, tenant.id).await?;
    }

    let config = Arc::new(config);
    let shutdown = CancellationToken::new();

    let dispatcher = Dispatcher::new(db.clone(), config.dispatcher.clone());
    let dispatcher_handle = tokio::spawn(dispatcher.run(shutdown.clone()));

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            signal_token.cancel();
        }
    });

    run_server(Arc::clone(&config), db, shutdown.clone()).await?;

    // The server has drained; stop the dispatcher before exiting.
    shutdown.cancel();
    let _ = dispatcher_handle.await;

    Ok(())
}
