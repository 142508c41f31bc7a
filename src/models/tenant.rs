//! Tenant entity model
//!
//! This module contains the SeaORM entity model for the tenants table,
//! the root of multi-tenancy; every business table references it.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Tenant entity representing an isolated customer organization
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tenants")]
pub struct Model {
    /// Unique identifier for the tenant (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Display name for the tenant
    pub name: String,

    /// Globally unique subdomain identifying the tenant
    pub subdomain: String,

    /// Lifecycle status (active, suspended)
    pub status: String,

    /// Soft-delete tombstone flag
    pub is_deleted: bool,

    /// Timestamp when the tenant was soft-deleted
    pub deleted_at: Option<DateTimeWithTimeZone>,

    /// Timestamp when the tenant was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the tenant was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
