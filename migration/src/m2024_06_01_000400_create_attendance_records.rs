//! Migration to create the attendance_records table.
//!
//! Validation flags (is_within_geofence, is_beacon_verified) are computed
//! by the service at write time and stored redundantly on the row. The
//! composite (user_id, recorded_at) index serves time-range report
//! queries.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AttendanceRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AttendanceRecords::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AttendanceRecords::TenantId).uuid().not_null())
                    .col(ColumnDef::new(AttendanceRecords::UserId).uuid().not_null())
                    .col(ColumnDef::new(AttendanceRecords::GeofenceId).uuid().null())
                    .col(
                        ColumnDef::new(AttendanceRecords::RecordType)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AttendanceRecords::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AttendanceRecords::Latitude).double().null())
                    .col(ColumnDef::new(AttendanceRecords::Longitude).double().null())
                    .col(
                        ColumnDef::new(AttendanceRecords::BeaconUuid)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(AttendanceRecords::IsWithinGeofence)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AttendanceRecords::IsBeaconVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AttendanceRecords::IsApproved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(AttendanceRecords::Notes).text().null())
                    .col(
                        ColumnDef::new(AttendanceRecords::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AttendanceRecords::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(AttendanceRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(AttendanceRecords::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attendance_records_tenant_id")
                            .from(AttendanceRecords::Table, AttendanceRecords::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attendance_records_user_id")
                            .from(AttendanceRecords::Table, AttendanceRecords::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attendance_records_geofence_id")
                            .from(AttendanceRecords::Table, AttendanceRecords::GeofenceId)
                            .to(Geofences::Table, Geofences::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_attendance_records_user_recorded_at")
                    .table(AttendanceRecords::Table)
                    .col(AttendanceRecords::UserId)
                    .col(AttendanceRecords::RecordedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_attendance_records_tenant_id")
                    .table(AttendanceRecords::Table)
                    .col(AttendanceRecords::TenantId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_attendance_records_user_recorded_at")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_attendance_records_tenant_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(AttendanceRecords::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AttendanceRecords {
    Table,
    Id,
    TenantId,
    UserId,
    GeofenceId,
    RecordType,
    RecordedAt,
    Latitude,
    Longitude,
    BeaconUuid,
    IsWithinGeofence,
    IsBeaconVerified,
    IsApproved,
    Notes,
    IsDeleted,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
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

#[derive(DeriveIden)]
enum Geofences {
    Table,
    Id,
}
