//! # Audit API Handlers
//!
//! Read-only listing over the append-only audit trail.

use crate::auth::{OperatorAuth, TenantExtension};
use crate::error::ApiError;
use crate::handlers::types::{ApiResponse, Page};
use crate::models::audit_log::Model as AuditLogModel;
use crate::repositories::AuditRepository;
use crate::server::AppState;
use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for audit log listing
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListAuditParams {
    /// Restrict to one entity type, e.g. "user" or "leave_request"
    pub entity_type: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// Audit entry representation returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuditLogDto {
    pub id: String,
    pub actor_id: Option<String>,
    #[schema(example = "leave_request.approved")]
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub details: Option<serde_json::Value>,
    pub created_at: String,
}

impl From<AuditLogModel> for AuditLogDto {
    fn from(entry: AuditLogModel) -> Self {
        Self {
            id: entry.id.to_string(),
            actor_id: entry.actor_id.map(|id| id.to_string()),
            action: entry.action,
            entity_type: entry.entity_type,
            entity_id: entry.entity_id.map(|id| id.to_string()),
            details: entry.details,
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}

/// List the tenant's audit entries, newest first
#[utoipa::path(
    get,
    path = "/api/v1/audit-logs",
    security(("bearer_auth" = [])),
    params(ListAuditParams),
    responses(
        (status = 200, description = "Audit entries retrieved", body = ApiResponse<Page<AuditLogDto>>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "audit"
)]
pub async fn list_audit_logs(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Query(params): Query<ListAuditParams>,
) -> Result<Json<ApiResponse<Page<AuditLogDto>>>, ApiError> {
    let page = params.page.unwrap_or(0);
    let per_page = params.per_page.unwrap_or(20).clamp(1, 100);

    let (entries, total) = AuditRepository::new(&state.db)
        .list(tenant.0, params.entity_type.as_deref(), page, per_page)
        .await?;

    Ok(Json(ApiResponse::new(Page {
        items: entries.into_iter().map(AuditLogDto::from).collect(),
        page,
        per_page,
        total,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::repositories::tenant::{CreateTenantRequest, TenantRepository};
    use crate::server::AppState;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use migration::{Migrator, MigratorTrait};
    use serde_json::json;
    use tower::ServiceExt;
    use uuid::Uuid;

    async fn setup_test_app() -> (AppState, axum::Router, Uuid) {
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

        let tenant = TenantRepository::new(&db)
            .create_tenant(CreateTenantRequest {
                name: "Acme".to_string(),
                subdomain: "acme".to_string(),
            })
            .await
            .unwrap();

        let state = crate::server::create_test_app_state(config, db);
        let app = crate::server::create_app(state.clone());
        (state, app, tenant.id)
    }

    fn request_builder(method: &str, uri: String, tenant_id: Uuid) -> axum::http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", "Bearer test-token")
            .header("X-Tenant-Id", tenant_id.to_string())
            .header("Content-Type", "application/json")
    }

    #[tokio::test]
    async fn test_mutations_leave_audit_trail() {
        let (_state, app, tenant_id) = setup_test_app().await;

        // A user creation writes a "user.created" entry.
        let body = json!({"email": "alice@example.com", "display_name": "Alice"});
        let request = request_builder("POST", "/api/v1/users".to_string(), tenant_id)
            .body(Body::from(body.to_string()))
            .unwrap();
        assert_eq!(
            app.clone().oneshot(request).await.unwrap().status(),
            StatusCode::CREATED
        );

        let request = request_builder(
            "GET",
            "/api/v1/audit-logs?entity_type=user".to_string(),
            tenant_id,
        )
        .body(Body::empty())
        .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let page: ApiResponse<Page<AuditLogDto>> = serde_json::from_slice(&body).unwrap();
        assert_eq!(page.data.total, 1);
        assert_eq!(page.data.items[0].action, "user.created");
    }

    #[tokio::test]
    async fn test_filter_excludes_other_entity_types() {
        let (state, app, tenant_id) = setup_test_app().await;

        AuditRepository::new(&state.db)
            .record(tenant_id, None, "role.created", "role", None, None)
            .await
            .unwrap();

        let request = request_builder(
            "GET",
            "/api/v1/audit-logs?entity_type=geofence".to_string(),
            tenant_id,
        )
        .body(Body::empty())
        .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let page: ApiResponse<Page<AuditLogDto>> = serde_json::from_slice(&body).unwrap();
        assert_eq!(page.data.total, 0);
    }
}
