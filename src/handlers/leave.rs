//! # Leave API Handlers
//!
//! Leave type catalogue, request lifecycle (approve/reject/cancel), and
//! per-year balance endpoints.

use crate::auth::{OperatorAuth, TenantExtension};
use crate::error::{self, ApiError};
use crate::handlers::types::{created_headers, ApiResponse, Page, PageParams};
use crate::models::leave_request::Model as LeaveRequestModel;
use crate::models::leave_type::Model as LeaveTypeModel;
use crate::models::user_leave_balance::Model as BalanceModel;
use crate::repositories::leave::{CreateLeaveRequest, LeaveRepository};
use crate::repositories::AuditRepository;
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Request payload for creating a leave type
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateLeaveTypeRequestDto {
    #[schema(example = "Annual")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = 21)]
    pub max_days_per_year: i32,
    pub requires_approval: bool,
}

/// Request payload for creating a leave request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateLeaveRequestDto {
    pub user_id: Uuid,
    pub leave_type_id: Uuid,
    #[schema(example = "2026-09-01")]
    pub start_date: NaiveDate,
    #[schema(example = "2026-09-05")]
    pub end_date: NaiveDate,
    pub reason: Option<String>,
}

/// Request payload for an approve/reject decision
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LeaveDecisionRequestDto {
    /// User making the decision
    pub decided_by: Uuid,
    /// Approval chain level (1-based)
    #[schema(example = 1)]
    pub approval_level: i32,
    pub comments: Option<String>,
}

/// Request payload for cancelling a leave request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CancelLeaveRequestDto {
    /// Must be the requester
    pub user_id: Uuid,
}

/// Request payload for setting a leave balance allocation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetBalanceRequestDto {
    pub user_id: Uuid,
    pub leave_type_id: Uuid,
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 21)]
    pub allocated_days: i32,
}

/// Leave type representation returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LeaveTypeDto {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub max_days_per_year: i32,
    pub requires_approval: bool,
}

impl From<LeaveTypeModel> for LeaveTypeDto {
    fn from(leave_type: LeaveTypeModel) -> Self {
        Self {
            id: leave_type.id.to_string(),
            name: leave_type.name,
            description: leave_type.description,
            max_days_per_year: leave_type.max_days_per_year,
            requires_approval: leave_type.requires_approval,
        }
    }
}

/// Leave request representation returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LeaveRequestDto {
    pub id: String,
    pub user_id: String,
    pub leave_type_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_days: i32,
    pub reason: Option<String>,
    /// "pending", "approved", "rejected", or "cancelled"
    pub status: String,
    pub approved_by: Option<String>,
    pub rejected_by: Option<String>,
    pub created_at: String,
}

impl From<LeaveRequestModel> for LeaveRequestDto {
    fn from(request: LeaveRequestModel) -> Self {
        Self {
            id: request.id.to_string(),
            user_id: request.user_id.to_string(),
            leave_type_id: request.leave_type_id.to_string(),
            start_date: request.start_date,
            end_date: request.end_date,
            total_days: request.total_days,
            reason: request.reason,
            status: request.status,
            approved_by: request.approved_by.map(|id| id.to_string()),
            rejected_by: request.rejected_by.map(|id| id.to_string()),
            created_at: request.created_at.to_rfc3339(),
        }
    }
}

/// Leave balance representation returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LeaveBalanceDto {
    pub id: String,
    pub user_id: String,
    pub leave_type_id: String,
    pub year: i32,
    pub allocated_days: i32,
    pub used_days: i32,
}

impl From<BalanceModel> for LeaveBalanceDto {
    fn from(balance: BalanceModel) -> Self {
        Self {
            id: balance.id.to_string(),
            user_id: balance.user_id.to_string(),
            leave_type_id: balance.leave_type_id.to_string(),
            year: balance.year,
            allocated_days: balance.allocated_days,
            used_days: balance.used_days,
        }
    }
}

/// Create a leave type
#[utoipa::path(
    post,
    path = "/api/v1/leave/types",
    security(("bearer_auth" = [])),
    request_body = CreateLeaveTypeRequestDto,
    responses(
        (status = 201, description = "Leave type created", body = ApiResponse<LeaveTypeDto>, headers(
            ("Location", description = "URL of the created leave type"),
            ("X-Trace-Id", description = "Trace identifier for request correlation")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 409, description = "Leave type name already exists", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "leave"
)]
pub async fn create_leave_type(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Json(request): Json<CreateLeaveTypeRequestDto>,
) -> Result<
    (
        StatusCode,
        [(&'static str, String); 2],
        Json<ApiResponse<LeaveTypeDto>>,
    ),
    ApiError,
> {
    let leave_type = LeaveRepository::new(&state.db)
        .create_leave_type(
            tenant.0,
            &request.name,
            request.description,
            request.max_days_per_year,
            request.requires_approval,
        )
        .await?;

    AuditRepository::new(&state.db)
        .record(
            tenant.0,
            None,
            "leave_type.created",
            "leave_type",
            Some(leave_type.id),
            None,
        )
        .await?;

    let location = format!("/api/v1/leave/types/{}", leave_type.id);
    Ok((
        StatusCode::CREATED,
        created_headers(location),
        Json(ApiResponse::new(LeaveTypeDto::from(leave_type))),
    ))
}

/// List the tenant's leave types
#[utoipa::path(
    get,
    path = "/api/v1/leave/types",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Leave types retrieved", body = ApiResponse<Vec<LeaveTypeDto>>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "leave"
)]
pub async fn list_leave_types(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
) -> Result<Json<ApiResponse<Vec<LeaveTypeDto>>>, ApiError> {
    let types = LeaveRepository::new(&state.db)
        .list_leave_types(tenant.0)
        .await?;
    Ok(Json(ApiResponse::new(
        types.into_iter().map(LeaveTypeDto::from).collect(),
    )))
}

/// Create a leave request
#[utoipa::path(
    post,
    path = "/api/v1/leave/requests",
    security(("bearer_auth" = [])),
    request_body = CreateLeaveRequestDto,
    responses(
        (status = 201, description = "Leave request created", body = ApiResponse<LeaveRequestDto>, headers(
            ("Location", description = "URL of the created request"),
            ("X-Trace-Id", description = "Trace identifier for request correlation")
        )),
        (status = 400, description = "Invalid date range", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Leave type not found", body = ApiError),
        (status = 409, description = "Insufficient leave balance", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "leave"
)]
pub async fn create_leave_request(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Json(request): Json<CreateLeaveRequestDto>,
) -> Result<
    (
        StatusCode,
        [(&'static str, String); 2],
        Json<ApiResponse<LeaveRequestDto>>,
    ),
    ApiError,
> {
    let user_id = request.user_id;
    let leave_request = LeaveRepository::new(&state.db)
        .create_leave_request(
            tenant.0,
            user_id,
            CreateLeaveRequest {
                leave_type_id: request.leave_type_id,
                start_date: request.start_date,
                end_date: request.end_date,
                reason: request.reason,
            },
        )
        .await?;

    AuditRepository::new(&state.db)
        .record(
            tenant.0,
            Some(user_id),
            "leave_request.created",
            "leave_request",
            Some(leave_request.id),
            Some(serde_json::json!({"total_days": leave_request.total_days})),
        )
        .await?;

    let location = format!("/api/v1/leave/requests/{}", leave_request.id);
    Ok((
        StatusCode::CREATED,
        created_headers(location),
        Json(ApiResponse::new(LeaveRequestDto::from(leave_request))),
    ))
}

/// Get a leave request by ID
#[utoipa::path(
    get,
    path = "/api/v1/leave/requests/{id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Leave request UUID")
    ),
    responses(
        (status = 200, description = "Leave request retrieved", body = ApiResponse<LeaveRequestDto>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Leave request not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "leave"
)]
pub async fn get_leave_request(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(request_id): Path<Uuid>,
) -> Result<Json<ApiResponse<LeaveRequestDto>>, ApiError> {
    let request = LeaveRepository::new(&state.db)
        .get_leave_request(tenant.0, request_id)
        .await?
        .ok_or_else(|| error::not_found("Leave request"))?;

    Ok(Json(ApiResponse::new(LeaveRequestDto::from(request))))
}

/// Query parameters for leave request listing
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListLeaveRequestsParams {
    /// List requests for this user; omit to list the tenant's pending queue
    pub user_id: Option<Uuid>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// List leave requests, either per user or the pending queue
#[utoipa::path(
    get,
    path = "/api/v1/leave/requests",
    security(("bearer_auth" = [])),
    params(ListLeaveRequestsParams),
    responses(
        (status = 200, description = "Leave requests retrieved", body = ApiResponse<Page<LeaveRequestDto>>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "leave"
)]
pub async fn list_leave_requests(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Query(params): Query<ListLeaveRequestsParams>,
) -> Result<Json<ApiResponse<Page<LeaveRequestDto>>>, ApiError> {
    let page = params.page.unwrap_or(0);
    let per_page = params.per_page.unwrap_or(20).clamp(1, 100);
    let repo = LeaveRepository::new(&state.db);

    let (requests, total) = match params.user_id {
        Some(user_id) => {
            repo.list_user_requests(tenant.0, user_id, page, per_page)
                .await?
        }
        None => repo.list_pending_requests(tenant.0, page, per_page).await?,
    };

    Ok(Json(ApiResponse::new(Page {
        items: requests.into_iter().map(LeaveRequestDto::from).collect(),
        page,
        per_page,
        total,
    })))
}

/// Approve a pending leave request
#[utoipa::path(
    post,
    path = "/api/v1/leave/requests/{id}/approve",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Leave request UUID")
    ),
    request_body = LeaveDecisionRequestDto,
    responses(
        (status = 200, description = "Leave request approved", body = ApiResponse<LeaveRequestDto>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Leave request not found", body = ApiError),
        (status = 409, description = "Request is not pending", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "leave"
)]
pub async fn approve_leave_request(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(request_id): Path<Uuid>,
    Json(decision): Json<LeaveDecisionRequestDto>,
) -> Result<Json<ApiResponse<LeaveRequestDto>>, ApiError> {
    let request = LeaveRepository::new(&state.db)
        .approve_request(
            tenant.0,
            request_id,
            decision.decided_by,
            decision.approval_level,
            decision.comments,
        )
        .await?;

    AuditRepository::new(&state.db)
        .record(
            tenant.0,
            Some(decision.decided_by),
            "leave_request.approved",
            "leave_request",
            Some(request.id),
            None,
        )
        .await?;

    Ok(Json(ApiResponse::new(LeaveRequestDto::from(request))))
}

/// Reject a pending leave request
#[utoipa::path(
    post,
    path = "/api/v1/leave/requests/{id}/reject",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Leave request UUID")
    ),
    request_body = LeaveDecisionRequestDto,
    responses(
        (status = 200, description = "Leave request rejected", body = ApiResponse<LeaveRequestDto>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Leave request not found", body = ApiError),
        (status = 409, description = "Request is not pending", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "leave"
)]
pub async fn reject_leave_request(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(request_id): Path<Uuid>,
    Json(decision): Json<LeaveDecisionRequestDto>,
) -> Result<Json<ApiResponse<LeaveRequestDto>>, ApiError> {
    let request = LeaveRepository::new(&state.db)
        .reject_request(
            tenant.0,
            request_id,
            decision.decided_by,
            decision.approval_level,
            decision.comments,
        )
        .await?;

    AuditRepository::new(&state.db)
        .record(
            tenant.0,
            Some(decision.decided_by),
            "leave_request.rejected",
            "leave_request",
            Some(request.id),
            None,
        )
        .await?;

    Ok(Json(ApiResponse::new(LeaveRequestDto::from(request))))
}

/// Cancel a pending leave request (requester only)
#[utoipa::path(
    post,
    path = "/api/v1/leave/requests/{id}/cancel",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Leave request UUID")
    ),
    request_body = CancelLeaveRequestDto,
    responses(
        (status = 200, description = "Leave request cancelled", body = ApiResponse<LeaveRequestDto>),
        (status = 400, description = "Caller is not the requester", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Leave request not found", body = ApiError),
        (status = 409, description = "Request is not pending", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "leave"
)]
pub async fn cancel_leave_request(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(request_id): Path<Uuid>,
    Json(request): Json<CancelLeaveRequestDto>,
) -> Result<Json<ApiResponse<LeaveRequestDto>>, ApiError> {
    let cancelled = LeaveRepository::new(&state.db)
        .cancel_request(tenant.0, request_id, request.user_id)
        .await?;

    AuditRepository::new(&state.db)
        .record(
            tenant.0,
            Some(request.user_id),
            "leave_request.cancelled",
            "leave_request",
            Some(cancelled.id),
            None,
        )
        .await?;

    Ok(Json(ApiResponse::new(LeaveRequestDto::from(cancelled))))
}

/// List a user's leave balances
#[utoipa::path(
    get,
    path = "/api/v1/leave/balances/{user_id}",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = Uuid, Path, description = "User UUID")
    ),
    responses(
        (status = 200, description = "Balances retrieved", body = ApiResponse<Vec<LeaveBalanceDto>>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "leave"
)]
pub async fn list_leave_balances(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(_tenant): TenantExtension,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<LeaveBalanceDto>>>, ApiError> {
    let balances = LeaveRepository::new(&state.db)
        .list_balances(user_id)
        .await?;
    Ok(Json(ApiResponse::new(
        balances.into_iter().map(LeaveBalanceDto::from).collect(),
    )))
}

/// Create or update a leave balance allocation
#[utoipa::path(
    put,
    path = "/api/v1/leave/balances",
    security(("bearer_auth" = [])),
    request_body = SetBalanceRequestDto,
    responses(
        (status = 200, description = "Balance set", body = ApiResponse<LeaveBalanceDto>),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "leave"
)]
pub async fn set_leave_balance(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Json(request): Json<SetBalanceRequestDto>,
) -> Result<Json<ApiResponse<LeaveBalanceDto>>, ApiError> {
    let balance = LeaveRepository::new(&state.db)
        .set_balance(
            request.user_id,
            request.leave_type_id,
            request.year,
            request.allocated_days,
        )
        .await?;

    AuditRepository::new(&state.db)
        .record(
            tenant.0,
            None,
            "leave_balance.set",
            "user_leave_balance",
            Some(balance.id),
            Some(serde_json::json!({
                "year": balance.year,
                "allocated_days": balance.allocated_days
            })),
        )
        .await?;

    Ok(Json(ApiResponse::new(LeaveBalanceDto::from(balance))))
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

    struct Fixture {
        state: AppState,
        app: axum::Router,
        tenant_id: Uuid,
        user_id: Uuid,
        manager_id: Uuid,
        leave_type_id: Uuid,
    }

    async fn setup_test_app() -> Fixture {
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
        let users = UserRepository::new(&db);
        let user = users
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
        let manager = users
            .create_user(
                tenant.id,
                CreateUserRequest {
                    email: "boss@example.com".to_string(),
                    display_name: "Boss".to_string(),
                    manager_id: None,
                },
            )
            .await
            .unwrap();
        let leave_type = LeaveRepository::new(&db)
            .create_leave_type(tenant.id, "Annual", None, 21, true)
            .await
            .unwrap();

        let state = crate::server::create_test_app_state(config, db);
        let app = crate::server::create_app(state.clone());
        Fixture {
            state,
            app,
            tenant_id: tenant.id,
            user_id: user.id,
            manager_id: manager.id,
            leave_type_id: leave_type.id,
        }
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
    async fn test_leave_request_approval_flow() {
        let f = setup_test_app().await;

        let body = json!({
            "user_id": f.user_id,
            "leave_type_id": f.leave_type_id,
            "start_date": "2026-09-01",
            "end_date": "2026-09-05"
        });
        let request = request_builder("POST", "/api/v1/leave/requests".to_string(), f.tenant_id)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = f.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let created: ApiResponse<LeaveRequestDto> = serde_json::from_slice(&body).unwrap();
        assert_eq!(created.data.total_days, 5);
        assert_eq!(created.data.status, "pending");

        let body = json!({"decided_by": f.manager_id, "approval_level": 1});
        let request = request_builder(
            "POST",
            format!("/api/v1/leave/requests/{}/approve", created.data.id),
            f.tenant_id,
        )
        .body(Body::from(body.to_string()))
        .unwrap();
        let response = f.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let approved: ApiResponse<LeaveRequestDto> = serde_json::from_slice(&body).unwrap();
        assert_eq!(approved.data.status, "approved");
        assert_eq!(approved.data.approved_by, Some(f.manager_id.to_string()));
    }

    #[tokio::test]
    async fn test_inverted_range_is_bad_request() {
        let f = setup_test_app().await;

        let body = json!({
            "user_id": f.user_id,
            "leave_type_id": f.leave_type_id,
            "start_date": "2026-09-05",
            "end_date": "2026-09-01"
        });
        let request = request_builder("POST", "/api/v1/leave/requests".to_string(), f.tenant_id)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = f.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_insufficient_balance_is_conflict() {
        let f = setup_test_app().await;

        let body = json!({
            "user_id": f.user_id,
            "leave_type_id": f.leave_type_id,
            "year": 2026,
            "allocated_days": 2
        });
        let request = request_builder("PUT", "/api/v1/leave/balances".to_string(), f.tenant_id)
            .body(Body::from(body.to_string()))
            .unwrap();
        assert_eq!(
            f.app.clone().oneshot(request).await.unwrap().status(),
            StatusCode::OK
        );

        let body = json!({
            "user_id": f.user_id,
            "leave_type_id": f.leave_type_id,
            "start_date": "2026-09-01",
            "end_date": "2026-09-05"
        });
        let request = request_builder("POST", "/api/v1/leave/requests".to_string(), f.tenant_id)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = f.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_pending_queue_listing() {
        let f = setup_test_app().await;

        let repo = LeaveRepository::new(&f.state.db);
        repo.create_leave_request(
            f.tenant_id,
            f.user_id,
            CreateLeaveRequest {
                leave_type_id: f.leave_type_id,
                start_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2026, 9, 2).unwrap(),
                reason: None,
            },
        )
        .await
        .unwrap();

        let request = request_builder("GET", "/api/v1/leave/requests".to_string(), f.tenant_id)
            .body(Body::empty())
            .unwrap();
        let response = f.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let page: ApiResponse<Page<LeaveRequestDto>> = serde_json::from_slice(&body).unwrap();
        assert_eq!(page.data.total, 1);
        assert_eq!(page.data.items[0].status, "pending");
    }
}
