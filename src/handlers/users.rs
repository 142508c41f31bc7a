//! # Users API Handlers
//!
//! Tenant-scoped user management endpoints.

use crate::auth::{OperatorAuth, TenantExtension};
use crate::error::{self, ApiError};
use crate::handlers::types::{created_headers, ApiResponse, Page, PageParams};
use crate::models::user::Model as UserModel;
use crate::repositories::user::{CreateUserRequest, UpdateUserRequest, UserRepository};
use crate::repositories::AuditRepository;
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Request payload for creating a user
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateUserRequestDto {
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "Alice Example")]
    pub display_name: String,
    /// Optional manager; must belong to the same tenant
    pub manager_id: Option<Uuid>,
}

/// Request payload for updating a user.
///
/// `manager_id` distinguishes absent (leave unchanged) from explicit null
/// (clear the manager).
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequestDto {
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub manager_id: Option<Option<Uuid>>,
    pub is_active: Option<bool>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// User representation returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
    pub display_name: String,
    pub manager_id: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

impl From<UserModel> for UserDto {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email,
            display_name: user.display_name,
            manager_id: user.manager_id.map(|id| id.to_string()),
            is_active: user.is_active,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Create a user in the request's tenant
#[utoipa::path(
    post,
    path = "/api/v1/users",
    security(("bearer_auth" = [])),
    request_body = CreateUserRequestDto,
    responses(
        (status = 201, description = "User created successfully", body = ApiResponse<UserDto>, headers(
            ("Location", description = "URL of the created user"),
            ("X-Trace-Id", description = "Trace identifier for request correlation")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 409, description = "Email already registered in this tenant", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Json(request): Json<CreateUserRequestDto>,
) -> Result<
    (
        StatusCode,
        [(&'static str, String); 2],
        Json<ApiResponse<UserDto>>,
    ),
    ApiError,
> {
    let user = UserRepository::new(&state.db)
        .create_user(
            tenant.0,
            CreateUserRequest {
                email: request.email,
                display_name: request.display_name,
                manager_id: request.manager_id,
            },
        )
        .await?;

    AuditRepository::new(&state.db)
        .record(
            tenant.0,
            None,
            "user.created",
            "user",
            Some(user.id),
            Some(serde_json::json!({"email": user.email})),
        )
        .await?;

    let location = format!("/api/v1/users/{}", user.id);
    Ok((
        StatusCode::CREATED,
        created_headers(location),
        Json(ApiResponse::new(UserDto::from(user))),
    ))
}

/// List the tenant's users, paginated
#[utoipa::path(
    get,
    path = "/api/v1/users",
    security(("bearer_auth" = [])),
    params(PageParams),
    responses(
        (status = 200, description = "Users retrieved successfully", body = ApiResponse<Page<UserDto>>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Query(params): Query<PageParams>,
) -> Result<Json<ApiResponse<Page<UserDto>>>, ApiError> {
    let (users, total) = UserRepository::new(&state.db)
        .list_users(tenant.0, params.page(), params.per_page())
        .await?;

    let page = Page {
        items: users.into_iter().map(UserDto::from).collect(),
        page: params.page(),
        per_page: params.per_page(),
        total,
    };
    Ok(Json(ApiResponse::new(page)))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User UUID")
    ),
    responses(
        (status = 200, description = "User retrieved successfully", body = ApiResponse<UserDto>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "User not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = UserRepository::new(&state.db)
        .get_user_by_id(tenant.0, user_id)
        .await?
        .ok_or_else(|| error::not_found("User"))?;

    Ok(Json(ApiResponse::new(UserDto::from(user))))
}

/// Update a user
#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User UUID")
    ),
    request_body = UpdateUserRequestDto,
    responses(
        (status = 200, description = "User updated successfully", body = ApiResponse<UserDto>),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "User not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateUserRequestDto>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = UserRepository::new(&state.db)
        .update_user(
            tenant.0,
            user_id,
            UpdateUserRequest {
                display_name: request.display_name,
                manager_id: request.manager_id,
                is_active: request.is_active,
            },
        )
        .await?;

    AuditRepository::new(&state.db)
        .record(tenant.0, None, "user.updated", "user", Some(user.id), None)
        .await?;

    Ok(Json(ApiResponse::new(UserDto::from(user))))
}

/// Soft-delete a user.
///
/// Refused with 409 while the user is still referenced as a manager or as a
/// leave approver/rejecter.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User UUID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "User not found", body = ApiError),
        (status = 409, description = "User is still referenced", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    UserRepository::new(&state.db)
        .soft_delete_user(tenant.0, user_id)
        .await?;

    AuditRepository::new(&state.db)
        .record(tenant.0, None, "user.deleted", "user", Some(user_id), None)
        .await?;

    Ok(StatusCode::NO_CONTENT)
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
    async fn test_create_and_get_user() {
        let (_state, app, tenant_id) = setup_test_app().await;

        let body = json!({"email": "Alice@Example.com", "display_name": "Alice"});
        let request = request_builder("POST", "/api/v1/users".to_string(), tenant_id)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let created: ApiResponse<UserDto> = serde_json::from_slice(&body).unwrap();
        // Email is normalized to lowercase.
        assert_eq!(created.data.email, "alice@example.com");

        let request = request_builder(
            "GET",
            format!("/api/v1/users/{}", created.data.id),
            tenant_id,
        )
        .body(Body::empty())
        .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let (_state, app, tenant_id) = setup_test_app().await;

        let body = json!({"email": "dup@example.com", "display_name": "First"});
        let request = request_builder("POST", "/api/v1/users".to_string(), tenant_id)
            .body(Body::from(body.to_string()))
            .unwrap();
        assert_eq!(
            app.clone().oneshot(request).await.unwrap().status(),
            StatusCode::CREATED
        );

        let body = json!({"email": "DUP@example.com", "display_name": "Second"});
        let request = request_builder("POST", "/api/v1/users".to_string(), tenant_id)
            .body(Body::from(body.to_string()))
            .unwrap();
        assert_eq!(
            app.oneshot(request).await.unwrap().status(),
            StatusCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn test_users_are_tenant_scoped() {
        let (state, app, tenant_id) = setup_test_app().await;

        let other = TenantRepository::new(&state.db)
            .create_tenant(CreateTenantRequest {
                name: "Globex".to_string(),
                subdomain: "globex".to_string(),
            })
            .await
            .unwrap();

        let body = json!({"email": "alice@example.com", "display_name": "Alice"});
        let request = request_builder("POST", "/api/v1/users".to_string(), tenant_id)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let created: ApiResponse<UserDto> = serde_json::from_slice(&body).unwrap();

        // The other tenant cannot see the user.
        let request = request_builder(
            "GET",
            format!("/api/v1/users/{}", created.data.id),
            other.id,
        )
        .body(Body::empty())
        .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_users_paginates() {
        let (_state, app, tenant_id) = setup_test_app().await;

        for i in 0..3 {
            let body = json!({
                "email": format!("user{i}@example.com"),
                "display_name": format!("User {i}")
            });
            let request = request_builder("POST", "/api/v1/users".to_string(), tenant_id)
                .body(Body::from(body.to_string()))
                .unwrap();
            app.clone().oneshot(request).await.unwrap();
        }

        let request = request_builder(
            "GET",
            "/api/v1/users?page=0&per_page=2".to_string(),
            tenant_id,
        )
        .body(Body::empty())
        .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let page: ApiResponse<Page<UserDto>> = serde_json::from_slice(&body).unwrap();
        assert_eq!(page.data.total, 3);
        assert_eq!(page.data.items.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_manager_conflicts() {
        let (state, app, tenant_id) = setup_test_app().await;

        let users = UserRepository::new(&state.db);
        let manager = users
            .create_user(
                tenant_id,
                CreateUserRequest {
                    email: "boss@example.com".to_string(),
                    display_name: "Boss".to_string(),
                    manager_id: None,
                },
            )
            .await
            .unwrap();
        users
            .create_user(
                tenant_id,
                CreateUserRequest {
                    email: "report@example.com".to_string(),
                    display_name: "Report".to_string(),
                    manager_id: Some(manager.id),
                },
            )
            .await
            .unwrap();

        let request = request_builder(
            "DELETE",
            format!("/api/v1/users/{}", manager.id),
            tenant_id,
        )
        .body(Body::empty())
        .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
