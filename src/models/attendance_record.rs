//! AttendanceRecord entity model
//!
//! This module contains the SeaORM entity model for the
//! attendance_records table. The geofence/beacon validation flags are
//! computed by the service at write time and stored on the row.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Attendance record representing a single check-in or check-out event
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    /// Unique identifier for the record (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Tenant identifier for multi-tenancy
    pub tenant_id: Uuid,

    /// User who produced the event
    pub user_id: Uuid,

    /// Nearest containing geofence, when GPS validation succeeded
    pub geofence_id: Option<Uuid>,

    /// Event kind: "check_in" or "check_out"
    pub record_type: String,

    /// Timestamp of the event itself (indexed together with user_id)
    pub recorded_at: DateTimeWithTimeZone,

    /// Reported GPS latitude, when provided
    pub latitude: Option<f64>,

    /// Reported GPS longitude, when provided
    pub longitude: Option<f64>,

    /// Reported beacon UUID, when provided
    pub beacon_uuid: Option<String>,

    /// Whether the reported position fell inside an assigned geofence
    pub is_within_geofence: bool,

    /// Whether the reported beacon matched an active registered beacon
    pub is_beacon_verified: bool,

    /// Auto-approved when either validation passed
    pub is_approved: bool,

    /// Free-form notes attached at capture time
    pub notes: Option<String>,

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
        belongs_to = "super::geofence::Entity",
        from = "Column::GeofenceId",
        to = "super::geofence::Column::Id"
    )]
    Geofence,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
