//! Migration to create the location-validation tables.
//!
//! Geofences are circular regions (lat/lon/radius in meters). Beacons may
//! be attached to a geofence via a nullable FK with SET NULL on delete, so
//! a beacon can outlive the geofence it was mounted in. user_geofences is
//! the assignment join used by attendance validation.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Geofences::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Geofences::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Geofences::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Geofences::Name).text().not_null())
                    .col(ColumnDef::new(Geofences::Description).text().null())
                    .col(ColumnDef::new(Geofences::Latitude).double().not_null())
                    .col(ColumnDef::new(Geofences::Longitude).double().not_null())
                    .col(ColumnDef::new(Geofences::RadiusMeters).double().not_null())
                    .col(
                        ColumnDef::new(Geofences::AccuracyToleranceMeters)
                            .double()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Geofences::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Geofences::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Geofences::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Geofences::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Geofences::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_geofences_tenant_id")
                            .from(Geofences::Table, Geofences::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_geofences_tenant_id")
                    .table(Geofences::Table)
                    .col(Geofences::TenantId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Beacons::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Beacons::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Beacons::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Beacons::GeofenceId).uuid().null())
                    .col(ColumnDef::new(Beacons::Name).text().not_null())
                    .col(ColumnDef::new(Beacons::BeaconUuid).text().not_null())
                    .col(ColumnDef::new(Beacons::Major).integer().not_null())
                    .col(ColumnDef::new(Beacons::Minor).integer().not_null())
                    .col(
                        ColumnDef::new(Beacons::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Beacons::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Beacons::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Beacons::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Beacons::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_beacons_tenant_id")
                            .from(Beacons::Table, Beacons::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_beacons_geofence_id")
                            .from(Beacons::Table, Beacons::GeofenceId)
                            .to(Geofences::Table, Geofences::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_beacons_tenant_uuid")
                    .table(Beacons::Table)
                    .col(Beacons::TenantId)
                    .col(Beacons::BeaconUuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserGeofences::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserGeofences::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserGeofences::UserId).uuid().not_null())
                    .col(ColumnDef::new(UserGeofences::GeofenceId).uuid().not_null())
                    .col(
                        ColumnDef::new(UserGeofences::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(UserGeofences::AssignedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_geofences_user_id")
                            .from(UserGeofences::Table, UserGeofences::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_geofences_geofence_id")
                            .from(UserGeofences::Table, UserGeofences::GeofenceId)
                            .to(Geofences::Table, Geofences::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_geofences_user_geofence")
                    .table(UserGeofences::Table)
                    .col(UserGeofences::UserId)
                    .col(UserGeofences::GeofenceId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserGeofences::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Beacons::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Geofences::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Geofences {
    Table,
    Id,
    TenantId,
    Name,
    Description,
    Latitude,
    Longitude,
    RadiusMeters,
    AccuracyToleranceMeters,
    IsActive,
    IsDeleted,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Beacons {
    Table,
    Id,
    TenantId,
    GeofenceId,
    Name,
    BeaconUuid,
    Major,
    Minor,
    IsActive,
    IsDeleted,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum UserGeofences {
    Table,
    Id,
    UserId,
    GeofenceId,
    IsActive,
    AssignedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
