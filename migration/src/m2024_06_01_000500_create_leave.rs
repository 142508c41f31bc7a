//! Migration to create the leave-management tables.
//!
//! leave_requests reference the approver and rejecter as two separate
//! nullable user FKs, both restrict-on-delete: a user cannot be removed
//! while referenced by either column. leave_approvals supports multi-level
//! approval chains via (leave_request_id, approval_level).

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LeaveTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LeaveTypes::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LeaveTypes::TenantId).uuid().not_null())
                    .col(ColumnDef::new(LeaveTypes::Name).text().not_null())
                    .col(ColumnDef::new(LeaveTypes::Description).text().null())
                    .col(
                        ColumnDef::new(LeaveTypes::MaxDaysPerYear)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LeaveTypes::RequiresApproval)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(LeaveTypes::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(LeaveTypes::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LeaveTypes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(LeaveTypes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_leave_types_tenant_id")
                            .from(LeaveTypes::Table, LeaveTypes::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_leave_types_tenant_name")
                    .table(LeaveTypes::Table)
                    .col(LeaveTypes::TenantId)
                    .col(LeaveTypes::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LeaveRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LeaveRequests::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LeaveRequests::TenantId).uuid().not_null())
                    .col(ColumnDef::new(LeaveRequests::UserId).uuid().not_null())
                    .col(ColumnDef::new(LeaveRequests::LeaveTypeId).uuid().not_null())
                    .col(ColumnDef::new(LeaveRequests::StartDate).date().not_null())
                    .col(ColumnDef::new(LeaveRequests::EndDate).date().not_null())
                    .col(ColumnDef::new(LeaveRequests::TotalDays).integer().not_null())
                    .col(ColumnDef::new(LeaveRequests::Reason).text().null())
                    .col(
                        ColumnDef::new(LeaveRequests::Status)
                            .text()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(LeaveRequests::ApprovedBy).uuid().null())
                    .col(ColumnDef::new(LeaveRequests::RejectedBy).uuid().null())
                    .col(
                        ColumnDef::new(LeaveRequests::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(LeaveRequests::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LeaveRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(LeaveRequests::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_leave_requests_tenant_id")
                            .from(LeaveRequests::Table, LeaveRequests::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_leave_requests_user_id")
                            .from(LeaveRequests::Table, LeaveRequests::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_leave_requests_leave_type_id")
                            .from(LeaveRequests::Table, LeaveRequests::LeaveTypeId)
                            .to(LeaveTypes::Table, LeaveTypes::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_leave_requests_approved_by")
                            .from(LeaveRequests::Table, LeaveRequests::ApprovedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_leave_requests_rejected_by")
                            .from(LeaveRequests::Table, LeaveRequests::RejectedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_leave_requests_user_id")
                    .table(LeaveRequests::Table)
                    .col(LeaveRequests::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LeaveApprovals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LeaveApprovals::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LeaveApprovals::LeaveRequestId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LeaveApprovals::ApproverId).uuid().not_null())
                    .col(
                        ColumnDef::new(LeaveApprovals::ApprovalLevel)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LeaveApprovals::IsApproved).boolean().not_null())
                    .col(ColumnDef::new(LeaveApprovals::Comments).text().null())
                    .col(
                        ColumnDef::new(LeaveApprovals::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_leave_approvals_leave_request_id")
                            .from(LeaveApprovals::Table, LeaveApprovals::LeaveRequestId)
                            .to(LeaveRequests::Table, LeaveRequests::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_leave_approvals_approver_id")
                            .from(LeaveApprovals::Table, LeaveApprovals::ApproverId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_leave_approvals_request_level")
                    .table(LeaveApprovals::Table)
                    .col(LeaveApprovals::LeaveRequestId)
                    .col(LeaveApprovals::ApprovalLevel)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserLeaveBalances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserLeaveBalances::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserLeaveBalances::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(UserLeaveBalances::LeaveTypeId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(UserLeaveBalances::Year).integer().not_null())
                    .col(
                        ColumnDef::new(UserLeaveBalances::AllocatedDays)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserLeaveBalances::UsedDays)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UserLeaveBalances::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_leave_balances_user_id")
                            .from(UserLeaveBalances::Table, UserLeaveBalances::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_leave_balances_leave_type_id")
                            .from(UserLeaveBalances::Table, UserLeaveBalances::LeaveTypeId)
                            .to(LeaveTypes::Table, LeaveTypes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_leave_balances_user_type_year")
                    .table(UserLeaveBalances::Table)
                    .col(UserLeaveBalances::UserId)
                    .col(UserLeaveBalances::LeaveTypeId)
                    .col(UserLeaveBalances::Year)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserLeaveBalances::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(LeaveApprovals::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(LeaveRequests::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(LeaveTypes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LeaveTypes {
    Table,
    Id,
    TenantId,
    Name,
    Description,
    MaxDaysPerYear,
    RequiresApproval,
    IsDeleted,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum LeaveRequests {
    Table,
    Id,
    TenantId,
    UserId,
    LeaveTypeId,
    StartDate,
    EndDate,
    TotalDays,
    Reason,
    Status,
    ApprovedBy,
    RejectedBy,
    IsDeleted,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum LeaveApprovals {
    Table,
    Id,
    LeaveRequestId,
    ApproverId,
    ApprovalLevel,
    IsApproved,
    Comments,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UserLeaveBalances {
    Table,
    Id,
    UserId,
    LeaveTypeId,
    Year,
    AllocatedDays,
    UsedDays,
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
