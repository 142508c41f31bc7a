//! LeaveRequest entity model
//!
//! Approver and rejecter are two separate nullable user references, both
//! restrict-on-delete in the schema: a user cannot be removed while
//! either column points at them.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Leave request with a pending → approved/rejected/cancelled lifecycle
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "leave_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub leave_type_id: Uuid,

    pub start_date: Date,
    pub end_date: Date,

    /// Inclusive day count, computed from the date range at creation
    pub total_days: i32,

    pub reason: Option<String>,

    /// "pending", "approved", "rejected", or "cancelled"
    pub status: String,

    pub approved_by: Option<Uuid>,
    pub rejected_by: Option<Uuid>,

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
    #[sea_orm(
        belongs_to = "super::leave_type::Entity",
        from = "Column::LeaveTypeId",
        to = "super::leave_type::Column::Id"
    )]
    LeaveType,
}

impl ActiveModelBehavior for ActiveModel {}
