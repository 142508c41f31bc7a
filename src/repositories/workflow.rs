//! # Workflow Repository
//!
//! Workflow definitions with opaque JSON steps, runtime instances with a
//! running → completed/cancelled lifecycle, human tasks, and an
//! append-only execution log.

use crate::error::RepositoryError;
use crate::models::workflow_definition::{
    ActiveModel as DefinitionActiveModel, Column as DefinitionColumn, Entity as WorkflowDefinition,
    Model as DefinitionModel,
};
use crate::models::workflow_execution_log::{
    ActiveModel as ExecutionLogActiveModel, Column as ExecutionLogColumn,
    Entity as WorkflowExecutionLog, Model as ExecutionLogModel,
};
use crate::models::workflow_instance::{
    ActiveModel as InstanceActiveModel, Column as InstanceColumn, Entity as WorkflowInstance,
    Model as InstanceModel,
};
use crate::models::workflow_task::{
    ActiveModel as TaskActiveModel, Column as TaskColumn, Entity as WorkflowTask,
    Model as TaskModel,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Request data for creating a workflow definition
#[derive(Debug, Clone)]
pub struct CreateWorkflowDefinitionRequest {
    pub name: String,
    pub description: Option<String>,
    pub steps: JsonValue,
    pub triggers: Option<JsonValue>,
}

/// Repository for workflow operations
pub struct WorkflowRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> WorkflowRepository<'a> {
    /// Create a new WorkflowRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    // Definitions

    /// Create a workflow definition. Steps must be a non-empty JSON array.
    pub async fn create_definition(
        &self,
        tenant_id: Uuid,
        request: CreateWorkflowDefinitionRequest,
    ) -> Result<DefinitionModel, RepositoryError> {
        if request.name.trim().is_empty() {
            return Err(RepositoryError::validation_error(
                "Workflow name cannot be empty",
            ));
        }
        match &request.steps {
            JsonValue::Array(steps) if !steps.is_empty() => {}
            _ => {
                return Err(RepositoryError::validation_error(
                    "Workflow steps must be a non-empty array",
                ));
            }
        }

        let existing = WorkflowDefinition::find()
            .filter(DefinitionColumn::TenantId.eq(tenant_id))
            .filter(DefinitionColumn::Name.eq(request.name.trim()))
            .filter(DefinitionColumn::IsDeleted.eq(false))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if existing.is_some() {
            return Err(RepositoryError::conflict(format!(
                "Workflow '{}' already exists in this tenant",
                request.name.trim()
            )));
        }

        let now = Utc::now();
        let definition = DefinitionActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            name: Set(request.name.trim().to_string()),
            description: Set(request.description),
            steps: Set(request.steps),
            triggers: Set(request.triggers),
            is_active: Set(true),
            is_deleted: Set(false),
            deleted_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        definition
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Get a live workflow definition within a tenant
    pub async fn get_definition(
        &self,
        tenant_id: Uuid,
        definition_id: Uuid,
    ) -> Result<Option<DefinitionModel>, RepositoryError> {
        let definition = WorkflowDefinition::find_by_id(definition_id)
            .filter(DefinitionColumn::TenantId.eq(tenant_id))
            .filter(DefinitionColumn::IsDeleted.eq(false))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(definition)
    }

    /// List a tenant's workflow definitions
    pub async fn list_definitions(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<DefinitionModel>, RepositoryError> {
        let definitions = WorkflowDefinition::find()
            .filter(DefinitionColumn::TenantId.eq(tenant_id))
            .filter(DefinitionColumn::IsDeleted.eq(false))
            .order_by_asc(DefinitionColumn::Name)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(definitions)
    }

    /// Soft-delete a workflow definition; running instances are unaffected
    pub async fn soft_delete_definition(
        &self,
        tenant_id: Uuid,
        definition_id: Uuid,
    ) -> Result<(), RepositoryError> {
        let definition = self
            .get_definition(tenant_id, definition_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Workflow definition not found"))?;

        let now = Utc::now();
        let mut active = definition.into_active_model();
        active.is_deleted = Set(true);
        active.is_active = Set(false);
        active.deleted_at = Set(Some(now.into()));
        active.updated_at = Set(now.into());

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(())
    }

    // Instances

    /// Start an instance of an active definition, logging the start event
    pub async fn start_instance(
        &self,
        tenant_id: Uuid,
        definition_id: Uuid,
        variables: Option<JsonValue>,
    ) -> Result<InstanceModel, RepositoryError> {
        let definition = self
            .get_definition(tenant_id, definition_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Workflow definition not found"))?;

        if !definition.is_active {
            return Err(RepositoryError::conflict(
                "Workflow definition is not active",
            ));
        }

        let now = Utc::now();
        let instance = InstanceActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            definition_id: Set(definition.id),
            status: Set("running".to_string()),
            variables: Set(variables),
            started_at: Set(now.into()),
            finished_at: Set(None),
        };

        let instance = instance
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        self.log_event(instance.id, "instance.started", None).await?;

        Ok(instance)
    }

    /// Get an instance within a tenant
    pub async fn get_instance(
        &self,
        tenant_id: Uuid,
        instance_id: Uuid,
    ) -> Result<Option<InstanceModel>, RepositoryError> {
        let instance = WorkflowInstance::find_by_id(instance_id)
            .filter(InstanceColumn::TenantId.eq(tenant_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(instance)
    }

    /// List a tenant's instances, newest first, optionally by status
    pub async fn list_instances(
        &self,
        tenant_id: Uuid,
        status: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<InstanceModel>, u64), RepositoryError> {
        let mut query = WorkflowInstance::find().filter(InstanceColumn::TenantId.eq(tenant_id));
        if let Some(status) = status {
            query = query.filter(InstanceColumn::Status.eq(status));
        }

        let paginator = query
            .order_by_desc(InstanceColumn::StartedAt)
            .paginate(self.db, per_page.max(1));

        let total = paginator
            .num_items()
            .await
            .map_err(RepositoryError::database_error)?;
        let instances = paginator
            .fetch_page(page)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok((instances, total))
    }

    /// Complete a running instance; open tasks must be resolved first
    pub async fn complete_instance(
        &self,
        tenant_id: Uuid,
        instance_id: Uuid,
    ) -> Result<InstanceModel, RepositoryError> {
        let instance = self.require_running(tenant_id, instance_id).await?;

        let open_tasks = WorkflowTask::find()
            .filter(TaskColumn::InstanceId.eq(instance.id))
            .filter(TaskColumn::Status.eq("open"))
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if open_tasks > 0 {
            return Err(RepositoryError::conflict(format!(
                "Instance has {} open task(s)",
                open_tasks
            )));
        }

        let instance = self
            .finish_instance(instance, "completed")
            .await?;
        self.log_event(instance.id, "instance.completed", None)
            .await?;

        Ok(instance)
    }

    /// Cancel a running instance
    pub async fn cancel_instance(
        &self,
        tenant_id: Uuid,
        instance_id: Uuid,
    ) -> Result<InstanceModel, RepositoryError> {
        let instance = self.require_running(tenant_id, instance_id).await?;
        let instance = self.finish_instance(instance, "cancelled").await?;
        self.log_event(instance.id, "instance.cancelled", None)
            .await?;

        Ok(instance)
    }

    // Tasks

    /// Create an open task on a running instance, logging the event
    pub async fn create_task(
        &self,
        tenant_id: Uuid,
        instance_id: Uuid,
        name: &str,
        assignee_id: Option<Uuid>,
        payload: Option<JsonValue>,
    ) -> Result<TaskModel, RepositoryError> {
        if name.trim().is_empty() {
            return Err(RepositoryError::validation_error(
                "Task name cannot be empty",
            ));
        }

        let instance = self.require_running(tenant_id, instance_id).await?;

        let task = TaskActiveModel {
            id: Set(Uuid::new_v4()),
            instance_id: Set(instance.id),
            name: Set(name.trim().to_string()),
            assignee_id: Set(assignee_id),
            status: Set("open".to_string()),
            payload: Set(payload),
            created_at: Set(Utc::now().into()),
            completed_at: Set(None),
        };

        let task = task
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        self.log_event(
            instance.id,
            "task.created",
            Some(serde_json::json!({"task_id": task.id, "name": task.name})),
        )
        .await?;

        Ok(task)
    }

    /// List an instance's tasks in creation order
    pub async fn list_tasks(
        &self,
        tenant_id: Uuid,
        instance_id: Uuid,
    ) -> Result<Vec<TaskModel>, RepositoryError> {
        self.get_instance(tenant_id, instance_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Workflow instance not found"))?;

        let tasks = WorkflowTask::find()
            .filter(TaskColumn::InstanceId.eq(instance_id))
            .order_by_asc(TaskColumn::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(tasks)
    }

    /// Complete an open task, logging the event
    pub async fn complete_task(
        &self,
        tenant_id: Uuid,
        instance_id: Uuid,
        task_id: Uuid,
    ) -> Result<TaskModel, RepositoryError> {
        self.get_instance(tenant_id, instance_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Workflow instance not found"))?;

        let task = WorkflowTask::find_by_id(task_id)
            .filter(TaskColumn::InstanceId.eq(instance_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .ok_or_else(|| RepositoryError::not_found("Workflow task not found"))?;

        if task.status != "open" {
            return Err(RepositoryError::conflict("Task is already completed"));
        }

        let mut active = task.into_active_model();
        active.status = Set("completed".to_string());
        active.completed_at = Set(Some(Utc::now().into()));

        let task = active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        self.log_event(
            instance_id,
            "task.completed",
            Some(serde_json::json!({"task_id": task.id})),
        )
        .await?;

        Ok(task)
    }

    /// Read an instance's execution log in event order
    pub async fn list_execution_log(
        &self,
        tenant_id: Uuid,
        instance_id: Uuid,
    ) -> Result<Vec<ExecutionLogModel>, RepositoryError> {
        self.get_instance(tenant_id, instance_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Workflow instance not found"))?;

        let events = WorkflowExecutionLog::find()
            .filter(ExecutionLogColumn::InstanceId.eq(instance_id))
            .order_by_asc(ExecutionLogColumn::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(events)
    }

    async fn require_running(
        &self,
        tenant_id: Uuid,
        instance_id: Uuid,
    ) -> Result<InstanceModel, RepositoryError> {
        let instance = self
            .get_instance(tenant_id, instance_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Workflow instance not found"))?;

        if instance.status != "running" {
            return Err(RepositoryError::conflict(format!(
                "Workflow instance is already {}",
                instance.status
            )));
        }

        Ok(instance)
    }

    async fn finish_instance(
        &self,
        instance: InstanceModel,
        status: &str,
    ) -> Result<InstanceModel, RepositoryError> {
        let mut active = instance.into_active_model();
        active.status = Set(status.to_string());
        active.finished_at = Set(Some(Utc::now().into()));

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    async fn log_event(
        &self,
        instance_id: Uuid,
        event: &str,
        detail: Option<JsonValue>,
    ) -> Result<(), RepositoryError> {
        let entry = ExecutionLogActiveModel {
            id: Set(Uuid::new_v4()),
            instance_id: Set(instance_id),
            event: Set(event.to_string()),
            detail: Set(detail),
            created_at: Set(Utc::now().into()),
        };

        entry
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(())
    }
}
