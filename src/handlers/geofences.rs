//! # Geofences and Beacons API Handlers
//!
//! Circular geofence CRUD, beacon registration, and user-to-geofence
//! assignment endpoints.

use crate::auth::{OperatorAuth, TenantExtension};
use crate::error::{self, ApiError};
use crate::handlers::types::{created_headers, ApiResponse};
use crate::models::beacon::Model as BeaconModel;
use crate::models::geofence::Model as GeofenceModel;
use crate::repositories::geofence::{
    CreateBeaconRequest, CreateGeofenceRequest, GeofenceRepository,
};
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

/// Request payload for creating or updating a geofence
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GeofenceRequestDto {
    #[schema(example = "Headquarters")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = 24.7136)]
    pub latitude: f64,
    #[schema(example = 46.6753)]
    pub longitude: f64,
    #[schema(example = 100.0)]
    pub radius_meters: f64,
    /// Per-fence GPS accuracy tolerance; falls back to the configured default
    pub accuracy_tolerance_meters: Option<f64>,
    /// Only honored on update
    pub is_active: Option<bool>,
}

/// Request payload for registering a beacon
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateBeaconRequestDto {
    #[schema(example = "Lobby beacon")]
    pub name: String,
    #[schema(example = "f7826da6-4fa2-4e98-8024-bc5b71e0893e")]
    pub beacon_uuid: String,
    pub major: i32,
    pub minor: i32,
    /// Optional geofence the beacon is attached to
    pub geofence_id: Option<Uuid>,
}

/// Request payload for assigning a user to a geofence
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AssignUserRequestDto {
    pub user_id: Uuid,
}

/// Geofence representation returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GeofenceDto {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
    pub accuracy_tolerance_meters: Option<f64>,
    pub is_active: bool,
    pub created_at: String,
}

impl From<GeofenceModel> for GeofenceDto {
    fn from(geofence: GeofenceModel) -> Self {
        Self {
            id: geofence.id.to_string(),
            name: geofence.name,
            description: geofence.description,
            latitude: geofence.latitude,
            longitude: geofence.longitude,
            radius_meters: geofence.radius_meters,
            accuracy_tolerance_meters: geofence.accuracy_tolerance_meters,
            is_active: geofence.is_active,
            created_at: geofence.created_at.to_rfc3339(),
        }
    }
}

/// Beacon representation returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BeaconDto {
    pub id: String,
    pub name: String,
    pub beacon_uuid: String,
    pub major: i32,
    pub minor: i32,
    pub geofence_id: Option<String>,
    pub is_active: bool,
}

impl From<BeaconModel> for BeaconDto {
    fn from(beacon: BeaconModel) -> Self {
        Self {
            id: beacon.id.to_string(),
            name: beacon.name,
            beacon_uuid: beacon.beacon_uuid,
            major: beacon.major,
            minor: beacon.minor,
            geofence_id: beacon.geofence_id.map(|id| id.to_string()),
            is_active: beacon.is_active,
        }
    }
}

impl From<GeofenceRequestDto> for CreateGeofenceRequest {
    fn from(dto: GeofenceRequestDto) -> Self {
        Self {
            name: dto.name,
            description: dto.description,
            latitude: dto.latitude,
            longitude: dto.longitude,
            radius_meters: dto.radius_meters,
            accuracy_tolerance_meters: dto.accuracy_tolerance_meters,
        }
    }
}

/// Create a geofence
#[utoipa::path(
    post,
    path = "/api/v1/geofences",
    security(("bearer_auth" = [])),
    request_body = GeofenceRequestDto,
    responses(
        (status = 201, description = "Geofence created successfully", body = ApiResponse<GeofenceDto>, headers(
            ("Location", description = "URL of the created geofence"),
            ("X-Trace-Id", description = "Trace identifier for request correlation")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "geofences"
)]
pub async fn create_geofence(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Json(request): Json<GeofenceRequestDto>,
) -> Result<
    (
        StatusCode,
        [(&'static str, String); 2],
        Json<ApiResponse<GeofenceDto>>,
    ),
    ApiError,
> {
    let geofence = GeofenceRepository::new(&state.db)
        .create_geofence(tenant.0, request.into())
        .await?;

    AuditRepository::new(&state.db)
        .record(
            tenant.0,
            None,
            "geofence.created",
            "geofence",
            Some(geofence.id),
            Some(serde_json::json!({"name": geofence.name})),
        )
        .await?;

    let location = format!("/api/v1/geofences/{}", geofence.id);
    Ok((
        StatusCode::CREATED,
        created_headers(location),
        Json(ApiResponse::new(GeofenceDto::from(geofence))),
    ))
}

/// List the tenant's geofences
#[utoipa::path(
    get,
    path = "/api/v1/geofences",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Geofences retrieved successfully", body = ApiResponse<Vec<GeofenceDto>>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "geofences"
)]
pub async fn list_geofences(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
) -> Result<Json<ApiResponse<Vec<GeofenceDto>>>, ApiError> {
    let geofences = GeofenceRepository::new(&state.db)
        .list_geofences(tenant.0)
        .await?;
    Ok(Json(ApiResponse::new(
        geofences.into_iter().map(GeofenceDto::from).collect(),
    )))
}

/// Get a geofence by ID
#[utoipa::path(
    get,
    path = "/api/v1/geofences/{id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Geofence UUID")
    ),
    responses(
        (status = 200, description = "Geofence retrieved successfully", body = ApiResponse<GeofenceDto>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Geofence not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "geofences"
)]
pub async fn get_geofence(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(geofence_id): Path<Uuid>,
) -> Result<Json<ApiResponse<GeofenceDto>>, ApiError> {
    let geofence = GeofenceRepository::new(&state.db)
        .get_geofence(tenant.0, geofence_id)
        .await?
        .ok_or_else(|| error::not_found("Geofence"))?;

    Ok(Json(ApiResponse::new(GeofenceDto::from(geofence))))
}

/// Replace a geofence's attributes
#[utoipa::path(
    put,
    path = "/api/v1/geofences/{id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Geofence UUID")
    ),
    request_body = GeofenceRequestDto,
    responses(
        (status = 200, description = "Geofence updated successfully", body = ApiResponse<GeofenceDto>),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Geofence not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "geofences"
)]
pub async fn update_geofence(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(geofence_id): Path<Uuid>,
    Json(request): Json<GeofenceRequestDto>,
) -> Result<Json<ApiResponse<GeofenceDto>>, ApiError> {
    let is_active = request.is_active;
    let geofence = GeofenceRepository::new(&state.db)
        .update_geofence(tenant.0, geofence_id, request.into(), is_active)
        .await?;

    AuditRepository::new(&state.db)
        .record(
            tenant.0,
            None,
            "geofence.updated",
            "geofence",
            Some(geofence.id),
            None,
        )
        .await?;

    Ok(Json(ApiResponse::new(GeofenceDto::from(geofence))))
}

/// Soft-delete a geofence, detaching its beacons
#[utoipa::path(
    delete,
    path = "/api/v1/geofences/{id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Geofence UUID")
    ),
    responses(
        (status = 204, description = "Geofence deleted"),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Geofence not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "geofences"
)]
pub async fn delete_geofence(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(geofence_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    GeofenceRepository::new(&state.db)
        .soft_delete_geofence(tenant.0, geofence_id)
        .await?;

    AuditRepository::new(&state.db)
        .record(
            tenant.0,
            None,
            "geofence.deleted",
            "geofence",
            Some(geofence_id),
            None,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Register a beacon
#[utoipa::path(
    post,
    path = "/api/v1/beacons",
    security(("bearer_auth" = [])),
    request_body = CreateBeaconRequestDto,
    responses(
        (status = 201, description = "Beacon registered successfully", body = ApiResponse<BeaconDto>, headers(
            ("Location", description = "URL of the created beacon"),
            ("X-Trace-Id", description = "Trace identifier for request correlation")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 409, description = "Beacon UUID already registered", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "geofences"
)]
pub async fn create_beacon(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Json(request): Json<CreateBeaconRequestDto>,
) -> Result<
    (
        StatusCode,
        [(&'static str, String); 2],
        Json<ApiResponse<BeaconDto>>,
    ),
    ApiError,
> {
    let beacon = GeofenceRepository::new(&state.db)
        .create_beacon(
            tenant.0,
            CreateBeaconRequest {
                name: request.name,
                beacon_uuid: request.beacon_uuid,
                major: request.major,
                minor: request.minor,
                geofence_id: request.geofence_id,
            },
        )
        .await?;

    AuditRepository::new(&state.db)
        .record(
            tenant.0,
            None,
            "beacon.created",
            "beacon",
            Some(beacon.id),
            Some(serde_json::json!({"beacon_uuid": beacon.beacon_uuid})),
        )
        .await?;

    let location = format!("/api/v1/beacons/{}", beacon.id);
    Ok((
        StatusCode::CREATED,
        created_headers(location),
        Json(ApiResponse::new(BeaconDto::from(beacon))),
    ))
}

/// List the tenant's beacons
#[utoipa::path(
    get,
    path = "/api/v1/beacons",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Beacons retrieved successfully", body = ApiResponse<Vec<BeaconDto>>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "geofences"
)]
pub async fn list_beacons(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
) -> Result<Json<ApiResponse<Vec<BeaconDto>>>, ApiError> {
    let beacons = GeofenceRepository::new(&state.db)
        .list_beacons(tenant.0)
        .await?;
    Ok(Json(ApiResponse::new(
        beacons.into_iter().map(BeaconDto::from).collect(),
    )))
}

/// Assign a user to a geofence
#[utoipa::path(
    post,
    path = "/api/v1/geofences/{id}/assignments",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Geofence UUID")
    ),
    request_body = AssignUserRequestDto,
    responses(
        (status = 204, description = "User assigned"),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Geofence or user not found", body = ApiError),
        (status = 409, description = "User already assigned", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "geofences"
)]
pub async fn assign_user(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(geofence_id): Path<Uuid>,
    Json(request): Json<AssignUserRequestDto>,
) -> Result<StatusCode, ApiError> {
    GeofenceRepository::new(&state.db)
        .assign_user(tenant.0, request.user_id, geofence_id)
        .await?;

    AuditRepository::new(&state.db)
        .record(
            tenant.0,
            None,
            "geofence.user_assigned",
            "geofence",
            Some(geofence_id),
            Some(serde_json::json!({"user_id": request.user_id})),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Unassign a user from a geofence
#[utoipa::path(
    delete,
    path = "/api/v1/geofences/{id}/assignments/{user_id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Geofence UUID"),
        ("user_id" = Uuid, Path, description = "User UUID")
    ),
    responses(
        (status = 204, description = "User unassigned"),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Assignment not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "geofences"
)]
pub async fn unassign_user(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(_tenant): TenantExtension,
    Path((geofence_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    GeofenceRepository::new(&state.db)
        .unassign_user(user_id, geofence_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// List a user's assigned active geofences
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/geofences",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User UUID")
    ),
    responses(
        (status = 200, description = "Geofences retrieved successfully", body = ApiResponse<Vec<GeofenceDto>>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "geofences"
)]
pub async fn list_user_geofences(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<GeofenceDto>>>, ApiError> {
    let geofences = GeofenceRepository::new(&state.db)
        .list_assigned_active_geofences(tenant.0, user_id)
        .await?;
    Ok(Json(ApiResponse::new(
        geofences.into_iter().map(GeofenceDto::from).collect(),
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
    async fn test_create_geofence_and_assign_user() {
        let (_state, app, tenant_id, user_id) = setup_test_app().await;

        let body = json!({
            "name": "HQ",
            "latitude": 24.7136,
            "longitude": 46.6753,
            "radius_meters": 100.0
        });
        let request = request_builder("POST", "/api/v1/geofences".to_string(), tenant_id)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let geofence: ApiResponse<GeofenceDto> = serde_json::from_slice(&body).unwrap();

        let request = request_builder(
            "POST",
            format!("/api/v1/geofences/{}/assignments", geofence.data.id),
            tenant_id,
        )
        .body(Body::from(json!({"user_id": user_id}).to_string()))
        .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let request = request_builder(
            "GET",
            format!("/api/v1/users/{}/geofences", user_id),
            tenant_id,
        )
        .body(Body::empty())
        .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let assigned: ApiResponse<Vec<GeofenceDto>> = serde_json::from_slice(&body).unwrap();
        assert_eq!(assigned.data.len(), 1);
        assert_eq!(assigned.data[0].name, "HQ");
    }

    #[tokio::test]
    async fn test_invalid_coordinates_rejected() {
        let (_state, app, tenant_id, _user_id) = setup_test_app().await;

        let body = json!({
            "name": "Broken",
            "latitude": 95.0,
            "longitude": 46.6753,
            "radius_meters": 100.0
        });
        let request = request_builder("POST", "/api/v1/geofences".to_string(), tenant_id)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_duplicate_beacon_uuid_conflicts() {
        let (_state, app, tenant_id, _user_id) = setup_test_app().await;

        let body = json!({
            "name": "Lobby",
            "beacon_uuid": "F7826DA6-4FA2-4E98-8024-BC5B71E0893E",
            "major": 1,
            "minor": 1
        });
        let request = request_builder("POST", "/api/v1/beacons".to_string(), tenant_id)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let beacon: ApiResponse<BeaconDto> = serde_json::from_slice(&body_bytes).unwrap();
        // Beacon UUIDs are normalized to lowercase.
        assert_eq!(
            beacon.data.beacon_uuid,
            "f7826da6-4fa2-4e98-8024-bc5b71e0893e"
        );

        let body = json!({
            "name": "Lobby again",
            "beacon_uuid": "f7826da6-4fa2-4e98-8024-bc5b71e0893e",
            "major": 1,
            "minor": 2
        });
        let request = request_builder("POST", "/api/v1/beacons".to_string(), tenant_id)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
