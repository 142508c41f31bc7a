//! Geofence entity model
//!
//! A named circular region (latitude/longitude/radius in meters) used to
//! validate that a check-in occurred within an allowed area.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "geofences")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub tenant_id: Uuid,
    pub name: String,
    pub description: Option<String>,

    /// Center latitude in decimal degrees
    pub latitude: f64,

    /// Center longitude in decimal degrees
    pub longitude: f64,

    /// Region radius in meters
    pub radius_meters: f64,

    /// Extra slack added to the radius for low-accuracy GPS fixes
    pub accuracy_tolerance_meters: Option<f64>,

    pub is_active: bool,

    pub is_deleted: bool,
    pub deleted_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tenant::Entity",
        from = "Column::TenantId",
        to = "super::tenant::Column::Id"
    )]
    Tenant,
}

impl ActiveModelBehavior for ActiveModel {}
