//! # Tenants API Handlers
//!
//! This module contains handlers for tenant creation and management endpoints.

use crate::auth::{OperatorAuth, TenantExtension};
use crate::error::{self, ApiError};
use crate::handlers::types::{created_headers, ApiResponse};
use crate::models::tenant::Model as TenantModel;
use crate::repositories::tenant::{CreateTenantRequest, TenantRepository};
use crate::repositories::AuditRepository;
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Request payload for creating a new tenant
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTenantRequestDto {
    /// Display name for the tenant (required, max 255 characters)
    #[schema(example = "Acme Corp")]
    pub name: String,
    /// Globally unique subdomain (DNS label rules)
    #[schema(example = "acme")]
    pub subdomain: String,
}

/// Request payload for updating a tenant
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateTenantRequestDto {
    pub name: Option<String>,
    /// "active" or "suspended"
    pub status: Option<String>,
}

/// Tenant representation returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TenantDto {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: String,
    #[schema(example = "Acme Corp")]
    pub name: String,
    #[schema(example = "acme")]
    pub subdomain: String,
    #[schema(example = "active")]
    pub status: String,
    /// Timestamp when the tenant was created (ISO 8601)
    pub created_at: String,
}

impl From<TenantModel> for TenantDto {
    fn from(tenant: TenantModel) -> Self {
        Self {
            id: tenant.id.to_string(),
            name: tenant.name,
            subdomain: tenant.subdomain,
            status: tenant.status,
            created_at: tenant.created_at.to_rfc3339(),
        }
    }
}

/// Create a new tenant
#[utoipa::path(
    post,
    path = "/api/v1/tenants",
    security(("bearer_auth" = [])),
    request_body = CreateTenantRequestDto,
    responses(
        (status = 201, description = "Tenant created successfully", body = ApiResponse<TenantDto>, headers(
            ("Location", description = "URL of the created tenant"),
            ("X-Trace-Id", description = "Trace identifier for request correlation")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 409, description = "Subdomain already taken", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "tenants"
)]
pub async fn create_tenant(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(_tenant): TenantExtension,
    Json(request): Json<CreateTenantRequestDto>,
) -> Result<
    (
        StatusCode,
        [(&'static str, String); 2],
        Json<ApiResponse<TenantDto>>,
    ),
    ApiError,
> {
    let repo = TenantRepository::new(&state.db);
    let tenant = repo
        .create_tenant(CreateTenantRequest {
            name: request.name,
            subdomain: request.subdomain,
        })
        .await?;

    // Provision the default roles and leave types for the new tenant.
    crate::seeds::seed_tenant_defaults(&state.db, tenant.id).await?;

    AuditRepository::new(&state.db)
        .record(
            tenant.id,
            None,
            "tenant.created",
            "tenant",
            Some(tenant.id),
            Some(serde_json::json!({"subdomain": tenant.subdomain})),
        )
        .await?;

    let location = format!("/api/v1/tenants/{}", tenant.id);
    Ok((
        StatusCode::CREATED,
        created_headers(location),
        Json(ApiResponse::new(TenantDto::from(tenant))),
    ))
}

/// List all live tenants
#[utoipa::path(
    get,
    path = "/api/v1/tenants",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Tenants retrieved successfully", body = ApiResponse<Vec<TenantDto>>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "tenants"
)]
pub async fn list_tenants(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(_tenant): TenantExtension,
) -> Result<Json<ApiResponse<Vec<TenantDto>>>, ApiError> {
    let tenants = TenantRepository::new(&state.db).list_tenants().await?;
    let dtos = tenants.into_iter().map(TenantDto::from).collect();
    Ok(Json(ApiResponse::new(dtos)))
}

/// Get a tenant by ID
#[utoipa::path(
    get,
    path = "/api/v1/tenants/{id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Tenant UUID")
    ),
    responses(
        (status = 200, description = "Tenant retrieved successfully", body = ApiResponse<TenantDto>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Tenant not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "tenants"
)]
pub async fn get_tenant(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(_tenant): TenantExtension,
    Path(tenant_id): Path<Uuid>,
) -> Result<Json<ApiResponse<TenantDto>>, ApiError> {
    let tenant = TenantRepository::new(&state.db)
        .get_tenant_by_id(tenant_id)
        .await?
        .ok_or_else(|| error::not_found("Tenant"))?;

    Ok(Json(ApiResponse::new(TenantDto::from(tenant))))
}

/// Update a tenant's name or status
#[utoipa::path(
    patch,
    path = "/api/v1/tenants/{id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Tenant UUID")
    ),
    request_body = UpdateTenantRequestDto,
    responses(
        (status = 200, description = "Tenant updated successfully", body = ApiResponse<TenantDto>),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Tenant not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "tenants"
)]
pub async fn update_tenant(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(_tenant): TenantExtension,
    Path(tenant_id): Path<Uuid>,
    Json(request): Json<UpdateTenantRequestDto>,
) -> Result<Json<ApiResponse<TenantDto>>, ApiError> {
    let tenant = TenantRepository::new(&state.db)
        .update_tenant(tenant_id, request.name, request.status)
        .await?;

    AuditRepository::new(&state.db)
        .record(
            tenant.id,
            None,
            "tenant.updated",
            "tenant",
            Some(tenant.id),
            None,
        )
        .await?;

    Ok(Json(ApiResponse::new(TenantDto::from(tenant))))
}

/// Soft-delete a tenant
#[utoipa::path(
    delete,
    path = "/api/v1/tenants/{id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Tenant UUID")
    ),
    responses(
        (status = 204, description = "Tenant deleted"),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Tenant not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "tenants"
)]
pub async fn delete_tenant(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(_tenant): TenantExtension,
    Path(tenant_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    TenantRepository::new(&state.db)
        .soft_delete_tenant(tenant_id)
        .await?;

    AuditRepository::new(&state.db)
        .record(
            tenant_id,
            None,
            "tenant.deleted",
            "tenant",
            Some(tenant_id),
            None,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
