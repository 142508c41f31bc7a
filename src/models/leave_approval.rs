//! LeaveApproval entity model

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// One decision in a multi-level approval chain;
/// (leave_request_id, approval_level) is unique.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "leave_approvals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub leave_request_id: Uuid,
    pub approver_id: Uuid,
    pub approval_level: i32,
    pub is_approved: bool,
    pub comments: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::leave_request::Entity",
        from = "Column::LeaveRequestId",
        to = "super::leave_request::Column::Id"
    )]
    LeaveRequest,
}

impl ActiveModelBehavior for ActiveModel {}
