//! Beacon entity model
//!
//! Bluetooth proximity transmitter, optionally attached to a geofence.
//! The geofence FK is SET NULL on delete so a beacon can exist unattached.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "beacons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub tenant_id: Uuid,
    pub geofence_id: Option<Uuid>,
    pub name: String,

    /// Advertised beacon UUID, unique per tenant
    pub beacon_uuid: String,

    pub major: i32,
    pub minor: i32,

    pub is_active: bool,

    pub is_deleted: bool,
    pub deleted_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::geofence::Entity",
        from = "Column::GeofenceId",
        to = "super::geofence::Column::Id"
    )]
    Geofence,
}

impl ActiveModelBehavior for ActiveModel {}
