//! # Attendance API Handlers
//!
//! Check-in/check-out capture with geofence and beacon validation, today's
//! status, record listing, and manual approval.

use crate::auth::{OperatorAuth, TenantExtension};
use crate::error::ApiError;
use crate::handlers::types::{created_headers, ApiResponse, Page, PageParams};
use crate::models::attendance_record::Model as AttendanceModel;
use crate::repositories::attendance::{AttendanceRepository, RecordAttendanceRequest};
use crate::repositories::AuditRepository;
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Request payload for a check-in or check-out event
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct AttendanceEventRequestDto {
    /// User recording the event
    pub user_id: Uuid,
    #[schema(example = 24.7136)]
    pub latitude: Option<f64>,
    #[schema(example = 46.6753)]
    pub longitude: Option<f64>,
    /// Beacon seen by the device, if any
    pub beacon_uuid: Option<String>,
    pub notes: Option<String>,
}

/// Query parameters for attendance record listing
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListRecordsParams {
    pub user_id: Uuid,
    /// Inclusive range start (RFC 3339)
    pub from: Option<DateTime<Utc>>,
    /// Exclusive range end (RFC 3339)
    pub to: Option<DateTime<Utc>>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// Query parameters for the today-status endpoint
#[derive(Debug, Deserialize, IntoParams)]
pub struct TodayParams {
    pub user_id: Uuid,
}

/// Attendance record representation returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AttendanceRecordDto {
    pub id: String,
    pub user_id: String,
    /// "check_in" or "check_out"
    pub record_type: String,
    pub recorded_at: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub geofence_id: Option<String>,
    pub beacon_uuid: Option<String>,
    pub is_within_geofence: bool,
    pub is_beacon_verified: bool,
    pub is_approved: bool,
    pub notes: Option<String>,
}

impl From<AttendanceModel> for AttendanceRecordDto {
    fn from(record: AttendanceModel) -> Self {
        Self {
            id: record.id.to_string(),
            user_id: record.user_id.to_string(),
            record_type: record.record_type,
            recorded_at: record.recorded_at.to_rfc3339(),
            latitude: record.latitude,
            longitude: record.longitude,
            geofence_id: record.geofence_id.map(|id| id.to_string()),
            beacon_uuid: record.beacon_uuid,
            is_within_geofence: record.is_within_geofence,
            is_beacon_verified: record.is_beacon_verified,
            is_approved: record.is_approved,
            notes: record.notes,
        }
    }
}

/// Today's open/closed attendance state for a user
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TodayStatusDto {
    pub checked_in: bool,
    pub open_since: Option<String>,
    pub records: Vec<AttendanceRecordDto>,
}

fn to_repo_request(dto: AttendanceEventRequestDto) -> (Uuid, RecordAttendanceRequest) {
    (
        dto.user_id,
        RecordAttendanceRequest {
            latitude: dto.latitude,
            longitude: dto.longitude,
            beacon_uuid: dto.beacon_uuid,
            notes: dto.notes,
        },
    )
}

/// Record a check-in.
///
/// The event is validated against the user's assigned active geofences and
/// registered beacons; a record is auto-approved when either validation
/// passes. A second check-in on the same day without an intervening
/// check-out is rejected with 409.
#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-in",
    security(("bearer_auth" = [])),
    request_body = AttendanceEventRequestDto,
    responses(
        (status = 201, description = "Check-in recorded", body = ApiResponse<AttendanceRecordDto>, headers(
            ("Location", description = "URL of the created record"),
            ("X-Trace-Id", description = "Trace identifier for request correlation")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 409, description = "Already checked in today", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "attendance"
)]
pub async fn check_in(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Json(request): Json<AttendanceEventRequestDto>,
) -> Result<
    (
        StatusCode,
        [(&'static str, String); 2],
        Json<ApiResponse<AttendanceRecordDto>>,
    ),
    ApiError,
> {
    let (user_id, repo_request) = to_repo_request(request);
    let record = AttendanceRepository::new(&state.db, &state.config.attendance)
        .check_in(tenant.0, user_id, repo_request)
        .await?;

    AuditRepository::new(&state.db)
        .record(
            tenant.0,
            Some(user_id),
            "attendance.check_in",
            "attendance_record",
            Some(record.id),
            Some(serde_json::json!({"approved": record.is_approved})),
        )
        .await?;

    let location = format!("/api/v1/attendance/records/{}", record.id);
    Ok((
        StatusCode::CREATED,
        created_headers(location),
        Json(ApiResponse::new(AttendanceRecordDto::from(record))),
    ))
}

/// Record a check-out.
///
/// Rejected with 409 when there is no open check-in for the current day.
#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-out",
    security(("bearer_auth" = [])),
    request_body = AttendanceEventRequestDto,
    responses(
        (status = 201, description = "Check-out recorded", body = ApiResponse<AttendanceRecordDto>, headers(
            ("Location", description = "URL of the created record"),
            ("X-Trace-Id", description = "Trace identifier for request correlation")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 409, description = "No open check-in", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "attendance"
)]
pub async fn check_out(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Json(request): Json<AttendanceEventRequestDto>,
) -> Result<
    (
        StatusCode,
        [(&'static str, String); 2],
        Json<ApiResponse<AttendanceRecordDto>>,
    ),
    ApiError,
> {
    let (user_id, repo_request) = to_repo_request(request);
    let record = AttendanceRepository::new(&state.db, &state.config.attendance)
        .check_out(tenant.0, user_id, repo_request)
        .await?;

    AuditRepository::new(&state.db)
        .record(
            tenant.0,
            Some(user_id),
            "attendance.check_out",
            "attendance_record",
            Some(record.id),
            None,
        )
        .await?;

    let location = format!("/api/v1/attendance/records/{}", record.id);
    Ok((
        StatusCode::CREATED,
        created_headers(location),
        Json(ApiResponse::new(AttendanceRecordDto::from(record))),
    ))
}

/// Get a user's open/closed state for the current day
#[utoipa::path(
    get,
    path = "/api/v1/attendance/today",
    security(("bearer_auth" = [])),
    params(TodayParams),
    responses(
        (status = 200, description = "Today's status", body = ApiResponse<TodayStatusDto>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "attendance"
)]
pub async fn today_status(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Query(params): Query<TodayParams>,
) -> Result<Json<ApiResponse<TodayStatusDto>>, ApiError> {
    let status = AttendanceRepository::new(&state.db, &state.config.attendance)
        .today_status(tenant.0, params.user_id)
        .await?;

    Ok(Json(ApiResponse::new(TodayStatusDto {
        checked_in: status.checked_in,
        open_since: status.open_since.map(|at| at.to_rfc3339()),
        records: status
            .records
            .into_iter()
            .map(AttendanceRecordDto::from)
            .collect(),
    })))
}

/// List a user's attendance records in a time range, paginated
#[utoipa::path(
    get,
    path = "/api/v1/attendance/records",
    security(("bearer_auth" = [])),
    params(ListRecordsParams),
    responses(
        (status = 200, description = "Records retrieved successfully", body = ApiResponse<Page<AttendanceRecordDto>>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "attendance"
)]
pub async fn list_records(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Query(params): Query<ListRecordsParams>,
) -> Result<Json<ApiResponse<Page<AttendanceRecordDto>>>, ApiError> {
    let page = params.page.unwrap_or(0);
    let per_page = params.per_page.unwrap_or(20).clamp(1, 100);

    let (records, total) = AttendanceRepository::new(&state.db, &state.config.attendance)
        .list_records(tenant.0, params.user_id, params.from, params.to, page, per_page)
        .await?;

    Ok(Json(ApiResponse::new(Page {
        items: records
            .into_iter()
            .map(AttendanceRecordDto::from)
            .collect(),
        page,
        per_page,
        total,
    })))
}

/// Manually approve an attendance record
#[utoipa::path(
    post,
    path = "/api/v1/attendance/records/{id}/approve",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Attendance record UUID")
    ),
    responses(
        (status = 200, description = "Record approved", body = ApiResponse<AttendanceRecordDto>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Record not found", body = ApiError),
        (status = 409, description = "Record already approved", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "attendance"
)]
pub async fn approve_record(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(record_id): Path<Uuid>,
) -> Result<Json<ApiResponse<AttendanceRecordDto>>, ApiError> {
    let record = AttendanceRepository::new(&state.db, &state.config.attendance)
        .approve_record(tenant.0, record_id)
        .await?;

    AuditRepository::new(&state.db)
        .record(
            tenant.0,
            None,
            "attendance.approved",
            "attendance_record",
            Some(record.id),
            None,
        )
        .await?;

    Ok(Json(ApiResponse::new(AttendanceRecordDto::from(record))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::repositories::geofence::{CreateGeofenceRequest, GeofenceRepository};
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

    async fn assign_fence(state: &AppState, tenant_id: Uuid, user_id: Uuid) {
        let repo = GeofenceRepository::new(&state.db);
        let fence = repo
            .create_geofence(
                tenant_id,
                CreateGeofenceRequest {
                    name: "HQ".to_string(),
                    description: None,
                    latitude: 24.7136,
                    longitude: 46.6753,
                    radius_meters: 100.0,
                    accuracy_tolerance_meters: None,
                },
            )
            .await
            .unwrap();
        repo.assign_user(tenant_id, user_id, fence.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_check_in_inside_fence_is_approved() {
        let (state, app, tenant_id, user_id) = setup_test_app().await;
        assign_fence(&state, tenant_id, user_id).await;

        let body = json!({
            "user_id": user_id,
            "latitude": 24.7136,
            "longitude": 46.6753
        });
        let request = request_builder("POST", "/api/v1/attendance/check-in".to_string(), tenant_id)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let record: ApiResponse<AttendanceRecordDto> = serde_json::from_slice(&body).unwrap();
        assert!(record.data.is_within_geofence);
        assert!(record.data.is_approved);
        assert_eq!(record.data.record_type, "check_in");
    }

    #[tokio::test]
    async fn test_double_check_in_conflicts() {
        let (state, app, tenant_id, user_id) = setup_test_app().await;
        assign_fence(&state, tenant_id, user_id).await;

        let body = json!({"user_id": user_id});
        let request = request_builder("POST", "/api/v1/attendance/check-in".to_string(), tenant_id)
            .body(Body::from(body.to_string()))
            .unwrap();
        assert_eq!(
            app.clone().oneshot(request).await.unwrap().status(),
            StatusCode::CREATED
        );

        let body = json!({"user_id": user_id});
        let request = request_builder("POST", "/api/v1/attendance/check-in".to_string(), tenant_id)
            .body(Body::from(body.to_string()))
            .unwrap();
        assert_eq!(
            app.oneshot(request).await.unwrap().status(),
            StatusCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn test_check_out_without_check_in_conflicts() {
        let (_state, app, tenant_id, user_id) = setup_test_app().await;

        let body = json!({"user_id": user_id});
        let request = request_builder(
            "POST",
            "/api/v1/attendance/check-out".to_string(),
            tenant_id,
        )
        .body(Body::from(body.to_string()))
        .unwrap();
        assert_eq!(
            app.oneshot(request).await.unwrap().status(),
            StatusCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn test_today_status_cycle() {
        let (_state, app, tenant_id, user_id) = setup_test_app().await;

        let body = json!({"user_id": user_id});
        let request = request_builder("POST", "/api/v1/attendance/check-in".to_string(), tenant_id)
            .body(Body::from(body.to_string()))
            .unwrap();
        app.clone().oneshot(request).await.unwrap();

        let request = request_builder(
            "GET",
            format!("/api/v1/attendance/today?user_id={}", user_id),
            tenant_id,
        )
        .body(Body::empty())
        .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let status: ApiResponse<TodayStatusDto> = serde_json::from_slice(&body).unwrap();
        assert!(status.data.checked_in);
        assert!(status.data.open_since.is_some());
        assert_eq!(status.data.records.len(), 1);

        let body = json!({"user_id": user_id});
        let request = request_builder(
            "POST",
            "/api/v1/attendance/check-out".to_string(),
            tenant_id,
        )
        .body(Body::from(body.to_string()))
        .unwrap();
        app.clone().oneshot(request).await.unwrap();

        let request = request_builder(
            "GET",
            format!("/api/v1/attendance/today?user_id={}", user_id),
            tenant_id,
        )
        .body(Body::empty())
        .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let status: ApiResponse<TodayStatusDto> = serde_json::from_slice(&body).unwrap();
        assert!(!status.data.checked_in);
        assert_eq!(status.data.records.len(), 2);
    }

    #[tokio::test]
    async fn test_manual_approval_endpoint() {
        let (_state, app, tenant_id, user_id) = setup_test_app().await;

        // No fence and no beacon, so the record lands pending.
        let body = json!({"user_id": user_id, "latitude": 10.0, "longitude": 10.0});
        let request = request_builder("POST", "/api/v1/attendance/check-in".to_string(), tenant_id)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let record: ApiResponse<AttendanceRecordDto> = serde_json::from_slice(&body).unwrap();
        assert!(!record.data.is_approved);

        let request = request_builder(
            "POST",
            format!("/api/v1/attendance/records/{}/approve", record.data.id),
            tenant_id,
        )
        .body(Body::empty())
        .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let approved: ApiResponse<AttendanceRecordDto> = serde_json::from_slice(&body).unwrap();
        assert!(approved.data.is_approved);
    }
}
