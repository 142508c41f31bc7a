//! AuditLog entity model

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;

/// Append-only audit entry written by mutating operations
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub tenant_id: Uuid,

    /// User who performed the action, when known
    pub actor_id: Option<Uuid>,

    /// Verb, e.g. "tenant.created", "leave_request.approved"
    pub action: String,

    pub entity_type: String,
    pub entity_id: Option<Uuid>,

    #[sea_orm(column_type = "JsonBinary")]
    pub details: Option<JsonValue>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
