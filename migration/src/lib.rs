//! Database migrations for the Waaed platform API.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2024_06_01_000001_create_tenants;
mod m2024_06_01_000100_create_users;
mod m2024_06_01_000200_create_rbac;
mod m2024_06_01_000300_create_geofences;
mod m2024_06_01_000400_create_attendance_records;
mod m2024_06_01_000500_create_leave;
mod m2024_06_01_000600_create_notifications;
mod m2024_06_01_000700_create_audit_logs;
mod m2024_06_01_000800_create_workflows;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2024_06_01_000001_create_tenants::Migration),
            Box::new(m2024_06_01_000100_create_users::Migration),
            Box::new(m2024_06_01_000200_create_rbac::Migration),
            Box::new(m2024_06_01_000300_create_geofences::Migration),
            Box::new(m2024_06_01_000400_create_attendance_records::Migration),
            Box::new(m2024_06_01_000500_create_leave::Migration),
            Box::new(m2024_06_01_000600_create_notifications::Migration),
            Box::new(m2024_06_01_000700_create_audit_logs::Migration),
            Box::new(m2024_06_01_000800_create_workflows::Migration),
        ]
    }
}
