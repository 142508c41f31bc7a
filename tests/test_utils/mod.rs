//! Test utilities for integration tests.
//!
//! Sets up in-memory SQLite databases with migrations applied and provides
//! helpers for building an in-process router and seeding fixture rows.

use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;
use waaed::config::AppConfig;
use waaed::repositories::tenant::{CreateTenantRequest, TenantRepository};
use waaed::repositories::user::{CreateUserRequest, UserRepository};

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Configuration suitable for in-process tests.
#[allow(dead_code)]
pub fn test_config() -> AppConfig {
    AppConfig {
        profile: "test".to_string(),
        database_url: "sqlite::memory:".to_string(),
        operator_tokens: vec!["test-token".to_string()],
        ..Default::default()
    }
}

/// Builds the full application router over a fresh in-memory database.
#[allow(dead_code)]
pub async fn setup_test_app() -> Result<(axum::Router, DatabaseConnection)> {
    let db = setup_test_db().await?;
    let state = waaed::server::create_test_app_state(test_config(), db.clone());
    Ok((waaed::server::create_app(state), db))
}

/// Request builder with the operator and tenant headers pre-set.
#[allow(dead_code)]
pub fn request_builder(
    method: &str,
    uri: String,
    tenant_id: Uuid,
) -> axum::http::request::Builder {
    axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", "Bearer test-token")
        .header("X-Tenant-Id", tenant_id.to_string())
        .header("Content-Type", "application/json")
}

/// Creates a tenant fixture, returning its ID.
#[allow(dead_code)]
pub async fn create_test_tenant(db: &DatabaseConnection, subdomain: &str) -> Result<Uuid> {
    let tenant = TenantRepository::new(db)
        .create_tenant(CreateTenantRequest {
            name: format!("{} Inc", subdomain),
            subdomain: subdomain.to_string(),
        })
        .await?;
    Ok(tenant.id)
}

/// Creates a user fixture in a tenant, returning its ID.
#[allow(dead_code)]
pub async fn create_test_user(
    db: &DatabaseConnection,
    tenant_id: Uuid,
    email: &str,
) -> Result<Uuid> {
    let user = UserRepository::new(db)
        .create_user(
            tenant_id,
            CreateUserRequest {
                email: email.to_string(),
                display_name: email.split('@').next().unwrap_or(email).to_string(),
                manager_id: None,
            },
        )
        .await?;
    Ok(user.id)
}
