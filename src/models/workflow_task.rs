//! WorkflowTask entity model

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;

/// Human task attached to a workflow instance
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "workflow_tasks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub instance_id: Uuid,
    pub name: String,
    pub assignee_id: Option<Uuid>,

    /// "open" or "completed"
    pub status: String,

    #[sea_orm(column_type = "JsonBinary")]
    pub payload: Option<JsonValue>,

    pub created_at: DateTimeWithTimeZone,
    pub completed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::workflow_instance::Entity",
        from = "Column::InstanceId",
        to = "super::workflow_instance::Column::Id"
    )]
    Instance,
}

impl ActiveModelBehavior for ActiveModel {}
