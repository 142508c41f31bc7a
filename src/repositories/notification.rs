//! # Notification Repository
//!
//! Durable notification rows with retry bookkeeping. Enqueued rows start
//! as "pending" and are picked up by the background dispatcher, which
//! transitions them to "sent" or "failed".

use crate::error::RepositoryError;
use crate::models::notification::{
    ActiveModel as NotificationActiveModel, Column as NotificationColumn, Entity as Notification,
    Model as NotificationModel,
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

/// Request data for enqueueing a notification
#[derive(Debug, Clone)]
pub struct EnqueueNotificationRequest {
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
    pub channel: String,
    pub max_retries: i32,
}

impl EnqueueNotificationRequest {
    pub fn in_app(user_id: Uuid, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            user_id,
            title: title.into(),
            body: body.into(),
            channel: "in_app".to_string(),
            max_retries: 3,
        }
    }
}

/// Repository for notification operations
pub struct NotificationRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> NotificationRepository<'a> {
    /// Create a new NotificationRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Enqueue a pending notification, due immediately
    pub async fn enqueue(
        &self,
        tenant_id: Uuid,
        request: EnqueueNotificationRequest,
    ) -> Result<NotificationModel, RepositoryError> {
        if request.title.trim().is_empty() {
            return Err(RepositoryError::validation_error(
                "Notification title cannot be empty",
            ));
        }
        if request.max_retries < 0 {
            return Err(RepositoryError::validation_error(
                "Max retries cannot be negative",
            ));
        }

        let now = Utc::now();
        let notification = NotificationActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            user_id: Set(request.user_id),
            title: Set(request.title),
            body: Set(request.body),
            channel: Set(request.channel),
            status: Set("pending".to_string()),
            retry_count: Set(0),
            max_retries: Set(request.max_retries),
            next_attempt_at: Set(now.into()),
            last_error: Set(None),
            is_read: Set(false),
            sent_at: Set(None),
            is_deleted: Set(false),
            deleted_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        notification
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// List a user's notifications, newest first
    pub async fn list_for_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<NotificationModel>, u64), RepositoryError> {
        let paginator = Notification::find()
            .filter(NotificationColumn::TenantId.eq(tenant_id))
            .filter(NotificationColumn::UserId.eq(user_id))
            .filter(NotificationColumn::IsDeleted.eq(false))
            .order_by_desc(NotificationColumn::CreatedAt)
            .paginate(self.db, per_page.max(1));

        let total = paginator
            .num_items()
            .await
            .map_err(RepositoryError::database_error)?;
        let notifications = paginator
            .fetch_page(page)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok((notifications, total))
    }

    /// Mark a notification as read by its recipient
    pub async fn mark_read(
        &self,
        tenant_id: Uuid,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<NotificationModel, RepositoryError> {
        let notification = Notification::find_by_id(notification_id)
            .filter(NotificationColumn::TenantId.eq(tenant_id))
            .filter(NotificationColumn::IsDeleted.eq(false))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .ok_or_else(|| RepositoryError::not_found("Notification not found"))?;

        if notification.user_id != user_id {
            return Err(RepositoryError::not_found("Notification not found"));
        }

        if notification.is_read {
            return Ok(notification);
        }

        let mut active = notification.into_active_model();
        active.is_read = Set(true);
        active.updated_at = Set(Utc::now().into());

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    // Dispatcher operations

    /// Fetch up to `limit` pending notifications due at or before `now`,
    /// oldest due first
    pub async fn claim_due_batch(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<NotificationModel>, RepositoryError> {
        let due = Notification::find()
            .filter(NotificationColumn::Status.eq("pending"))
            .filter(NotificationColumn::NextAttemptAt.lte(now))
            .filter(NotificationColumn::IsDeleted.eq(false))
            .order_by_asc(NotificationColumn::NextAttemptAt)
            .limit(limit)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(due)
    }

    /// Count pending notifications; used for the backlog gauge
    pub async fn count_pending(&self) -> Result<u64, RepositoryError> {
        Notification::find()
            .filter(NotificationColumn::Status.eq("pending"))
            .filter(NotificationColumn::IsDeleted.eq(false))
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Mark a notification as successfully delivered
    pub async fn mark_sent(
        &self,
        notification: NotificationModel,
    ) -> Result<NotificationModel, RepositoryError> {
        let now = Utc::now();
        let mut active = notification.into_active_model();
        active.status = Set("sent".to_string());
        active.sent_at = Set(Some(now.into()));
        active.last_error = Set(None);
        active.updated_at = Set(now.into());

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Record a delivery failure.
    ///
    /// While retries remain the row stays "pending" with `next_attempt_at`
    /// pushed out by `backoff`; once `max_retries` is exhausted it becomes
    /// "failed" with the error preserved.
    pub async fn mark_failed_or_requeue(
        &self,
        notification: NotificationModel,
        error: &str,
        backoff: Duration,
    ) -> Result<NotificationModel, RepositoryError> {
        let now = Utc::now();
        let attempts = notification.retry_count + 1;
        let exhausted = attempts >= notification.max_retries;

        let mut active = notification.into_active_model();
        active.retry_count = Set(attempts);
        active.last_error = Set(Some(error.to_string()));
        active.updated_at = Set(now.into());
        if exhausted {
            active.status = Set("failed".to_string());
        } else {
            active.next_attempt_at = Set((now + backoff).into());
        }

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
