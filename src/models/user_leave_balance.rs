//! UserLeaveBalance entity model

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Per-year balance for a (user, leave type) pair
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_leave_balances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,
    pub leave_type_id: Uuid,
    pub year: i32,
    pub allocated_days: i32,
    pub used_days: i32,

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
