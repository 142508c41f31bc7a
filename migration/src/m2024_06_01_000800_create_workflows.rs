//! Migration to create the workflow-engine tables.
//!
//! Steps, triggers, and variables are opaque jsonb columns; no
//! state-machine evaluation happens inside this service.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WorkflowDefinitions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WorkflowDefinitions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(WorkflowDefinitions::TenantId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WorkflowDefinitions::Name).text().not_null())
                    .col(
                        ColumnDef::new(WorkflowDefinitions::Description)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WorkflowDefinitions::Steps)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WorkflowDefinitions::Triggers)
                            .json_binary()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WorkflowDefinitions::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(WorkflowDefinitions::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(WorkflowDefinitions::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WorkflowDefinitions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(WorkflowDefinitions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_workflow_definitions_tenant_id")
                            .from(WorkflowDefinitions::Table, WorkflowDefinitions::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WorkflowInstances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WorkflowInstances::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WorkflowInstances::TenantId).uuid().not_null())
                    .col(
                        ColumnDef::new(WorkflowInstances::DefinitionId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WorkflowInstances::Status)
                            .text()
                            .not_null()
                            .default("running"),
                    )
                    .col(
                        ColumnDef::new(WorkflowInstances::Variables)
                            .json_binary()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WorkflowInstances::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(WorkflowInstances::FinishedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_workflow_instances_tenant_id")
                            .from(WorkflowInstances::Table, WorkflowInstances::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_workflow_instances_definition_id")
                            .from(WorkflowInstances::Table, WorkflowInstances::DefinitionId)
                            .to(WorkflowDefinitions::Table, WorkflowDefinitions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WorkflowTasks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WorkflowTasks::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WorkflowTasks::InstanceId).uuid().not_null())
                    .col(ColumnDef::new(WorkflowTasks::Name).text().not_null())
                    .col(ColumnDef::new(WorkflowTasks::AssigneeId).uuid().null())
                    .col(
                        ColumnDef::new(WorkflowTasks::Status)
                            .text()
                            .not_null()
                            .default("open"),
                    )
                    .col(ColumnDef::new(WorkflowTasks::Payload).json_binary().null())
                    .col(
                        ColumnDef::new(WorkflowTasks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(WorkflowTasks::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_workflow_tasks_instance_id")
                            .from(WorkflowTasks::Table, WorkflowTasks::InstanceId)
                            .to(WorkflowInstances::Table, WorkflowInstances::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WorkflowExecutionLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WorkflowExecutionLogs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(WorkflowExecutionLogs::InstanceId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WorkflowExecutionLogs::Event)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WorkflowExecutionLogs::Detail)
                            .json_binary()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WorkflowExecutionLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_workflow_execution_logs_instance_id")
                            .from(
                                WorkflowExecutionLogs::Table,
                                WorkflowExecutionLogs::InstanceId,
                            )
                            .to(WorkflowInstances::Table, WorkflowInstances::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_workflow_instances_definition_id")
                    .table(WorkflowInstances::Table)
                    .col(WorkflowInstances::DefinitionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WorkflowExecutionLogs::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(WorkflowTasks::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(WorkflowInstances::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(WorkflowDefinitions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum WorkflowDefinitions {
    Table,
    Id,
    TenantId,
    Name,
    Description,
    Steps,
    Triggers,
    IsActive,
    IsDeleted,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum WorkflowInstances {
    Table,
    Id,
    TenantId,
    DefinitionId,
    Status,
    Variables,
    StartedAt,
    FinishedAt,
}

#[derive(DeriveIden)]
enum WorkflowTasks {
    Table,
    Id,
    InstanceId,
    Name,
    AssigneeId,
    Status,
    Payload,
    CreatedAt,
    CompletedAt,
}

#[derive(DeriveIden)]
enum WorkflowExecutionLogs {
    Table,
    Id,
    InstanceId,
    Event,
    Detail,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}
