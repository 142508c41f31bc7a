//! # RBAC API Handlers
//!
//! Role, permission, and assignment endpoints. Roles are tenant-scoped;
//! the permission catalogue is global.

use crate::auth::{OperatorAuth, TenantExtension};
use crate::error::ApiError;
use crate::handlers::types::{created_headers, ApiResponse};
use crate::models::permission::Model as PermissionModel;
use crate::models::role::Model as RoleModel;
use crate::repositories::{AuditRepository, RbacRepository};
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Request payload for creating a role
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateRoleRequestDto {
    #[schema(example = "manager")]
    pub name: String,
    pub description: Option<String>,
}

/// Request payload for granting a permission to a role
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GrantPermissionRequestDto {
    pub permission_id: Uuid,
}

/// Request payload for assigning a role to a user
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AssignRoleRequestDto {
    pub role_id: Uuid,
}

/// Role representation returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoleDto {
    pub id: String,
    #[schema(example = "manager")]
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
}

impl From<RoleModel> for RoleDto {
    fn from(role: RoleModel) -> Self {
        Self {
            id: role.id.to_string(),
            name: role.name,
            description: role.description,
            created_at: role.created_at.to_rfc3339(),
        }
    }
}

/// Permission representation returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PermissionDto {
    pub id: String,
    #[schema(example = "attendance")]
    pub resource: String,
    #[schema(example = "approve")]
    pub action: String,
    pub description: Option<String>,
}

impl From<PermissionModel> for PermissionDto {
    fn from(permission: PermissionModel) -> Self {
        Self {
            id: permission.id.to_string(),
            resource: permission.resource,
            action: permission.action,
            description: permission.description,
        }
    }
}

/// Create a role in the request's tenant
#[utoipa::path(
    post,
    path = "/api/v1/roles",
    security(("bearer_auth" = [])),
    request_body = CreateRoleRequestDto,
    responses(
        (status = 201, description = "Role created successfully", body = ApiResponse<RoleDto>, headers(
            ("Location", description = "URL of the created role"),
            ("X-Trace-Id", description = "Trace identifier for request correlation")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 409, description = "Role name already exists in this tenant", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "rbac"
)]
pub async fn create_role(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Json(request): Json<CreateRoleRequestDto>,
) -> Result<
    (
        StatusCode,
        [(&'static str, String); 2],
        Json<ApiResponse<RoleDto>>,
    ),
    ApiError,
> {
    let role = RbacRepository::new(&state.db)
        .create_role(tenant.0, &request.name, request.description)
        .await?;

    AuditRepository::new(&state.db)
        .record(tenant.0, None, "role.created", "role", Some(role.id), None)
        .await?;

    let location = format!("/api/v1/roles/{}", role.id);
    Ok((
        StatusCode::CREATED,
        created_headers(location),
        Json(ApiResponse::new(RoleDto::from(role))),
    ))
}

/// List the tenant's roles
#[utoipa::path(
    get,
    path = "/api/v1/roles",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Roles retrieved successfully", body = ApiResponse<Vec<RoleDto>>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "rbac"
)]
pub async fn list_roles(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
) -> Result<Json<ApiResponse<Vec<RoleDto>>>, ApiError> {
    let roles = RbacRepository::new(&state.db).list_roles(tenant.0).await?;
    Ok(Json(ApiResponse::new(
        roles.into_iter().map(RoleDto::from).collect(),
    )))
}

/// List the global permission catalogue
#[utoipa::path(
    get,
    path = "/api/v1/permissions",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Permissions retrieved successfully", body = ApiResponse<Vec<PermissionDto>>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "rbac"
)]
pub async fn list_permissions(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(_tenant): TenantExtension,
) -> Result<Json<ApiResponse<Vec<PermissionDto>>>, ApiError> {
    let permissions = RbacRepository::new(&state.db).list_permissions().await?;
    Ok(Json(ApiResponse::new(
        permissions.into_iter().map(PermissionDto::from).collect(),
    )))
}

/// Grant a permission to a role
#[utoipa::path(
    post,
    path = "/api/v1/roles/{id}/permissions",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Role UUID")
    ),
    request_body = GrantPermissionRequestDto,
    responses(
        (status = 204, description = "Permission granted"),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Role or permission not found", body = ApiError),
        (status = 409, description = "Permission already granted", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "rbac"
)]
pub async fn grant_permission(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(role_id): Path<Uuid>,
    Json(request): Json<GrantPermissionRequestDto>,
) -> Result<StatusCode, ApiError> {
    RbacRepository::new(&state.db)
        .grant_permission_to_role(tenant.0, role_id, request.permission_id)
        .await?;

    AuditRepository::new(&state.db)
        .record(
            tenant.0,
            None,
            "role.permission_granted",
            "role",
            Some(role_id),
            Some(serde_json::json!({"permission_id": request.permission_id})),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Revoke a permission from a role
#[utoipa::path(
    delete,
    path = "/api/v1/roles/{id}/permissions/{permission_id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Role UUID"),
        ("permission_id" = Uuid, Path, description = "Permission UUID")
    ),
    responses(
        (status = 204, description = "Permission revoked"),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Role or grant not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "rbac"
)]
pub async fn revoke_permission(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path((role_id, permission_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    RbacRepository::new(&state.db)
        .revoke_permission_from_role(tenant.0, role_id, permission_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Assign a role to a user
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/roles",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User UUID")
    ),
    request_body = AssignRoleRequestDto,
    responses(
        (status = 204, description = "Role assigned"),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "User or role not found", body = ApiError),
        (status = 409, description = "Role already assigned", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "rbac"
)]
pub async fn assign_role(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(user_id): Path<Uuid>,
    Json(request): Json<AssignRoleRequestDto>,
) -> Result<StatusCode, ApiError> {
    RbacRepository::new(&state.db)
        .assign_role_to_user(tenant.0, user_id, request.role_id)
        .await?;

    AuditRepository::new(&state.db)
        .record(
            tenant.0,
            None,
            "user.role_assigned",
            "user",
            Some(user_id),
            Some(serde_json::json!({"role_id": request.role_id})),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Remove a role from a user
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}/roles/{role_id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User UUID"),
        ("role_id" = Uuid, Path, description = "Role UUID")
    ),
    responses(
        (status = 204, description = "Role removed"),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Assignment not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "rbac"
)]
pub async fn remove_role(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(_tenant): TenantExtension,
    Path((user_id, role_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    RbacRepository::new(&state.db)
        .remove_role_from_user(user_id, role_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// List a user's roles
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/roles",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User UUID")
    ),
    responses(
        (status = 200, description = "Roles retrieved successfully", body = ApiResponse<Vec<RoleDto>>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "rbac"
)]
pub async fn list_user_roles(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(_tenant): TenantExtension,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<RoleDto>>>, ApiError> {
    let roles = RbacRepository::new(&state.db)
        .list_user_roles(user_id)
        .await?;
    Ok(Json(ApiResponse::new(
        roles.into_iter().map(RoleDto::from).collect(),
    )))
}

/// List a user's effective permissions across all assigned roles
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/permissions",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User UUID")
    ),
    responses(
        (status = 200, description = "Permissions retrieved successfully", body = ApiResponse<Vec<PermissionDto>>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "rbac"
)]
pub async fn list_user_permissions(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(_tenant): TenantExtension,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<PermissionDto>>>, ApiError> {
    let permissions = RbacRepository::new(&state.db)
        .list_effective_permissions(user_id)
        .await?;
    Ok(Json(ApiResponse::new(
        permissions.into_iter().map(PermissionDto::from).collect(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::repositories::tenant::{CreateTenantRequest, TenantRepository};
    use crate::repositories::user::{CreateUserRequest, UserRepository};
    use crate::server::AppState;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use migration::{Migrator, MigratorTrait};
    use serde_json::json;
    use tower::ServiceExt;

    async fn setup_test_app() -> (AppState, axum::Router, Uuid, Uuid) {
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
        let user = UserRepository::new(&db)
            .create_user(
                tenant.id,
                CreateUserRequest {
                    email: "alice@example.com".to_string(),
                    display_name: "Alice".to_string(),
                    manager_id: None,
                },
            )
            .await
            .unwrap();

        let state = crate::server::create_test_app_state(config, db);
        let app = crate::server::create_app(state.clone());
        (state, app, tenant.id, user.id)
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
    async fn test_role_assignment_flow() {
        let (state, app, tenant_id, user_id) = setup_test_app().await;

        let request = request_builder("POST", "/api/v1/roles".to_string(), tenant_id)
            .body(Body::from(json!({"name": "manager"}).to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let role: ApiResponse<RoleDto> = serde_json::from_slice(&body).unwrap();

        let request = request_builder(
            "POST",
            format!("/api/v1/users/{}/roles", user_id),
            tenant_id,
        )
        .body(Body::from(json!({"role_id": role.data.id}).to_string()))
        .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let roles = RbacRepository::new(&state.db)
            .list_user_roles(user_id)
            .await
            .unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].name, "manager");
    }

    #[tokio::test]
    async fn test_effective_permissions_endpoint() {
        let (state, app, tenant_id, user_id) = setup_test_app().await;
        let rbac = RbacRepository::new(&state.db);

        let role = rbac.create_role(tenant_id, "approver", None).await.unwrap();
        let permission = rbac
            .ensure_permission("leave", "approve", None)
            .await
            .unwrap();
        rbac.grant_permission_to_role(tenant_id, role.id, permission.id)
            .await
            .unwrap();
        rbac.assign_role_to_user(tenant_id, user_id, role.id)
            .await
            .unwrap();

        let request = request_builder(
            "GET",
            format!("/api/v1/users/{}/permissions", user_id),
            tenant_id,
        )
        .body(Body::empty())
        .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let permissions: ApiResponse<Vec<PermissionDto>> = serde_json::from_slice(&body).unwrap();
        assert_eq!(permissions.data.len(), 1);
        assert_eq!(permissions.data[0].resource, "leave");
        assert_eq!(permissions.data[0].action, "approve");
    }

    #[tokio::test]
    async fn test_duplicate_role_name_conflicts() {
        let (_state, app, tenant_id, _user_id) = setup_test_app().await;

        let request = request_builder("POST", "/api/v1/roles".to_string(), tenant_id)
            .body(Body::from(json!({"name": "manager"}).to_string()))
            .unwrap();
        assert_eq!(
            app.clone().oneshot(request).await.unwrap().status(),
            StatusCode::CREATED
        );

        let request = request_builder("POST", "/api/v1/roles".to_string(), tenant_id)
            .body(Body::from(json!({"name": "manager"}).to_string()))
            .unwrap();
        assert_eq!(
            app.oneshot(request).await.unwrap().status(),
            StatusCode::CONFLICT
        );
    }
}
