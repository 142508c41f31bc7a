//! # Notifications API Handlers
//!
//! Enqueue, list, and mark-read endpoints. Delivery itself is handled by
//! the background dispatcher.

use crate::auth::{OperatorAuth, TenantExtension};
use crate::error::ApiError;
use crate::handlers::types::{created_headers, ApiResponse, Page};
use crate::models::notification::Model as NotificationModel;
use crate::repositories::notification::{EnqueueNotificationRequest, NotificationRepository};
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Request payload for enqueueing a notification
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateNotificationRequestDto {
    pub user_id: Uuid,
    #[schema(example = "Leave request approved")]
    pub title: String,
    pub body: String,
    /// Delivery channel label (default "in_app")
    pub channel: Option<String>,
    /// Retry budget for the dispatcher (default 3)
    pub max_retries: Option<i32>,
}

/// Query parameters for notification listing
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListNotificationsParams {
    pub user_id: Uuid,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// Request payload for marking a notification read
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MarkReadRequestDto {
    /// Must be the recipient
    pub user_id: Uuid,
}

/// Notification representation returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationDto {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub body: String,
    pub channel: String,
    /// "pending", "sent", or "failed"
    pub status: String,
    pub is_read: bool,
    pub created_at: String,
    pub sent_at: Option<String>,
}

impl From<NotificationModel> for NotificationDto {
    fn from(notification: NotificationModel) -> Self {
        Self {
            id: notification.id.to_string(),
            user_id: notification.user_id.to_string(),
            title: notification.title,
            body: notification.body,
            channel: notification.channel,
            status: notification.status,
            is_read: notification.is_read,
            created_at: notification.created_at.to_rfc3339(),
            sent_at: notification.sent_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// Enqueue a notification for delivery
#[utoipa::path(
    post,
    path = "/api/v1/notifications",
    security(("bearer_auth" = [])),
    request_body = CreateNotificationRequestDto,
    responses(
        (status = 201, description = "Notification queued", body = ApiResponse<NotificationDto>, headers(
            ("Location", description = "URL of the created notification"),
            ("X-Trace-Id", description = "Trace identifier for request correlation")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "notifications"
)]
pub async fn create_notification(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Json(request): Json<CreateNotificationRequestDto>,
) -> Result<
    (
        StatusCode,
        [(&'static str, String); 2],
        Json<ApiResponse<NotificationDto>>,
    ),
    ApiError,
> {
    let notification = NotificationRepository::new(&state.db)
        .enqueue(
            tenant.0,
            EnqueueNotificationRequest {
                user_id: request.user_id,
                title: request.title,
                body: request.body,
                channel: request.channel.unwrap_or_else(|| "in_app".to_string()),
                max_retries: request.max_retries.unwrap_or(3),
            },
        )
        .await?;

    let location = format!("/api/v1/notifications/{}", notification.id);
    Ok((
        StatusCode::CREATED,
        created_headers(location),
        Json(ApiResponse::new(NotificationDto::from(notification))),
    ))
}

/// List a user's notifications, newest first
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    security(("bearer_auth" = [])),
    params(ListNotificationsParams),
    responses(
        (status = 200, description = "Notifications retrieved", body = ApiResponse<Page<NotificationDto>>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "notifications"
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Query(params): Query<ListNotificationsParams>,
) -> Result<Json<ApiResponse<Page<NotificationDto>>>, ApiError> {
    let page = params.page.unwrap_or(0);
    let per_page = params.per_page.unwrap_or(20).clamp(1, 100);

    let (notifications, total) = NotificationRepository::new(&state.db)
        .list_for_user(tenant.0, params.user_id, page, per_page)
        .await?;

    Ok(Json(ApiResponse::new(Page {
        items: notifications
            .into_iter()
            .map(NotificationDto::from)
            .collect(),
        page,
        per_page,
        total,
    })))
}

/// Mark a notification as read
#[utoipa::path(
    post,
    path = "/api/v1/notifications/{id}/read",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Notification UUID")
    ),
    request_body = MarkReadRequestDto,
    responses(
        (status = 200, description = "Notification marked read", body = ApiResponse<NotificationDto>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Notification not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "notifications"
)]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(notification_id): Path<Uuid>,
    Json(request): Json<MarkReadRequestDto>,
) -> Result<Json<ApiResponse<NotificationDto>>, ApiError> {
    let notification = NotificationRepository::new(&state.db)
        .mark_read(tenant.0, notification_id, request.user_id)
        .await?;

    Ok(Json(ApiResponse::new(NotificationDto::from(notification))))
}
