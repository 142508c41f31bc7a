//! Notification entity model
//!
//! Rows carry their own retry bookkeeping; the background dispatcher
//! polls pending rows and transitions them to sent or failed.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub tenant_id: Uuid,
    pub user_id: Uuid,

    pub title: String,
    pub body: String,

    /// Delivery channel label (e.g. "in_app")
    pub channel: String,

    /// "pending", "sent", or "failed"
    pub status: String,

    pub retry_count: i32,
    pub max_retries: i32,

    /// Earliest time the dispatcher may (re)attempt delivery
    pub next_attempt_at: DateTimeWithTimeZone,

    pub last_error: Option<String>,

    pub is_read: bool,
    pub sent_at: Option<DateTimeWithTimeZone>,

    pub is_deleted: bool,
    pub deleted_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl ActiveModelBehavior for ActiveModel {}
