use super::*;
use crate::config::AppConfig;
use axum::{body::Body, http::Request};
use migration::{Migrator, MigratorTrait};
use tower::ServiceExt;

async fn setup_test_app() -> axum::Router {
    let config = AppConfig {
        profile: "test".to_string(),
        database_url: "sqlite::memory:".to_string(),
        operator_tokens: vec!["test-token".to_string()],
        ..Default::default()
    };

    let db = sea_orm::Database::connect(&config.database_url)
        .await
        .expect("Failed to init test DB");
    Migrator::up(&db, None).await.expect("Failed to migrate");

    let state = crate::server::create_test_app_state(config, db);
    crate::server::create_app(state)
}

#[tokio::test]
async fn test_root_returns_service_info() {
    let app = setup_test_app().await;

    let request = Request::builder()
        .uri("/")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let info: ServiceInfo = serde_json::from_slice(&body).unwrap();
    assert_eq!(info.service, ServiceInfo::default().service);
    assert!(!info.version.is_empty());
}

#[tokio::test]
async fn test_healthz_reports_ok() {
    let app = setup_test_app().await;

    let request = Request::builder()
        .uri("/healthz")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(payload["status"], "ok");
}

#[tokio::test]
async fn test_protected_routes_require_bearer_token() {
    let app = setup_test_app().await;

    let request = Request::builder()
        .uri("/api/v1/tenants")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_trace_id_header_is_echoed() {
    let app = setup_test_app().await;

    let request = Request::builder()
        .uri("/healthz")
        .header("X-Trace-Id", "trace-abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response
            .headers()
            .get("X-Trace-Id")
            .and_then(|v| v.to_str().ok()),
        Some("trace-abc-123")
    );
}
