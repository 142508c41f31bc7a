//! # Workflows API Handlers
//!
//! Definition CRUD, instance lifecycle, task completion, and the execution
//! log. Steps and variables are stored and served as opaque JSON.

use crate::auth::{OperatorAuth, TenantExtension};
use crate::error::{self, ApiError};
use crate::handlers::types::{created_headers, ApiResponse, Page};
use crate::models::workflow_definition::Model as DefinitionModel;
use crate::models::workflow_execution_log::Model as ExecutionLogModel;
use crate::models::workflow_instance::Model as InstanceModel;
use crate::models::workflow_task::Model as TaskModel;
use crate::repositories::workflow::{CreateWorkflowDefinitionRequest, WorkflowRepository};
use crate::repositories::AuditRepository;
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Request payload for creating a workflow definition
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateWorkflowRequestDto {
    #[schema(example = "Onboarding")]
    pub name: String,
    pub description: Option<String>,
    /// Opaque, non-empty JSON array of steps
    pub steps: serde_json::Value,
    pub triggers: Option<serde_json::Value>,
}

/// Request payload for starting a workflow instance
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct StartInstanceRequestDto {
    pub variables: Option<serde_json::Value>,
}

/// Request payload for creating a workflow task
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTaskRequestDto {
    #[schema(example = "collect-documents")]
    pub name: String,
    pub assignee_id: Option<Uuid>,
    pub payload: Option<serde_json::Value>,
}

/// Query parameters for instance listing
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListInstancesParams {
    /// "running", "completed", or "cancelled"
    pub status: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// Workflow definition representation returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WorkflowDefinitionDto {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub steps: serde_json::Value,
    pub triggers: Option<serde_json::Value>,
    pub is_active: bool,
    pub created_at: String,
}

impl From<DefinitionModel> for WorkflowDefinitionDto {
    fn from(definition: DefinitionModel) -> Self {
        Self {
            id: definition.id.to_string(),
            name: definition.name,
            description: definition.description,
            steps: definition.steps,
            triggers: definition.triggers,
            is_active: definition.is_active,
            created_at: definition.created_at.to_rfc3339(),
        }
    }
}

/// Workflow instance representation returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WorkflowInstanceDto {
    pub id: String,
    pub definition_id: String,
    pub status: String,
    pub variables: Option<serde_json::Value>,
    pub started_at: String,
    pub finished_at: Option<String>,
}

impl From<InstanceModel> for WorkflowInstanceDto {
    fn from(instance: InstanceModel) -> Self {
        Self {
            id: instance.id.to_string(),
            definition_id: instance.definition_id.to_string(),
            status: instance.status,
            variables: instance.variables,
            started_at: instance.started_at.to_rfc3339(),
            finished_at: instance.finished_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// Workflow task representation returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WorkflowTaskDto {
    pub id: String,
    pub name: String,
    pub assignee_id: Option<String>,
    pub status: String,
    pub payload: Option<serde_json::Value>,
    pub created_at: String,
    pub completed_at: Option<String>,
}

impl From<TaskModel> for WorkflowTaskDto {
    fn from(task: TaskModel) -> Self {
        Self {
            id: task.id.to_string(),
            name: task.name,
            assignee_id: task.assignee_id.map(|id| id.to_string()),
            status: task.status,
            payload: task.payload,
            created_at: task.created_at.to_rfc3339(),
            completed_at: task.completed_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// Execution log entry representation returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExecutionLogDto {
    pub id: String,
    #[schema(example = "instance.started")]
    pub event: String,
    pub detail: Option<serde_json::Value>,
    pub created_at: String,
}

impl From<ExecutionLogModel> for ExecutionLogDto {
    fn from(entry: ExecutionLogModel) -> Self {
        Self {
            id: entry.id.to_string(),
            event: entry.event,
            detail: entry.detail,
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}

/// Create a workflow definition
#[utoipa::path(
    post,
    path = "/api/v1/workflows",
    security(("bearer_auth" = [])),
    request_body = CreateWorkflowRequestDto,
    responses(
        (status = 201, description = "Workflow created", body = ApiResponse<WorkflowDefinitionDto>, headers(
            ("Location", description = "URL of the created workflow"),
            ("X-Trace-Id", description = "Trace identifier for request correlation")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 409, description = "Workflow name already exists", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "workflows"
)]
pub async fn create_workflow(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Json(request): Json<CreateWorkflowRequestDto>,
) -> Result<
    (
        StatusCode,
        [(&'static str, String); 2],
        Json<ApiResponse<WorkflowDefinitionDto>>,
    ),
    ApiError,
> {
    let definition = WorkflowRepository::new(&state.db)
        .create_definition(
            tenant.0,
            CreateWorkflowDefinitionRequest {
                name: request.name,
                description: request.description,
                steps: request.steps,
                triggers: request.triggers,
            },
        )
        .await?;

    AuditRepository::new(&state.db)
        .record(
            tenant.0,
            None,
            "workflow.created",
            "workflow_definition",
            Some(definition.id),
            None,
        )
        .await?;

    let location = format!("/api/v1/workflows/{}", definition.id);
    Ok((
        StatusCode::CREATED,
        created_headers(location),
        Json(ApiResponse::new(WorkflowDefinitionDto::from(definition))),
    ))
}

/// List the tenant's workflow definitions
#[utoipa::path(
    get,
    path = "/api/v1/workflows",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Workflows retrieved", body = ApiResponse<Vec<WorkflowDefinitionDto>>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "workflows"
)]
pub async fn list_workflows(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
) -> Result<Json<ApiResponse<Vec<WorkflowDefinitionDto>>>, ApiError> {
    let definitions = WorkflowRepository::new(&state.db)
        .list_definitions(tenant.0)
        .await?;
    Ok(Json(ApiResponse::new(
        definitions
            .into_iter()
            .map(WorkflowDefinitionDto::from)
            .collect(),
    )))
}

/// Get a workflow definition by ID
#[utoipa::path(
    get,
    path = "/api/v1/workflows/{id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Workflow definition UUID")
    ),
    responses(
        (status = 200, description = "Workflow retrieved", body = ApiResponse<WorkflowDefinitionDto>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Workflow not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "workflows"
)]
pub async fn get_workflow(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(definition_id): Path<Uuid>,
) -> Result<Json<ApiResponse<WorkflowDefinitionDto>>, ApiError> {
    let definition = WorkflowRepository::new(&state.db)
        .get_definition(tenant.0, definition_id)
        .await?
        .ok_or_else(|| error::not_found("Workflow definition"))?;

    Ok(Json(ApiResponse::new(WorkflowDefinitionDto::from(
        definition,
    ))))
}

/// Soft-delete a workflow definition
#[utoipa::path(
    delete,
    path = "/api/v1/workflows/{id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Workflow definition UUID")
    ),
    responses(
        (status = 204, description = "Workflow deleted"),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Workflow not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "workflows"
)]
pub async fn delete_workflow(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(definition_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    WorkflowRepository::new(&state.db)
        .soft_delete_definition(tenant.0, definition_id)
        .await?;

    AuditRepository::new(&state.db)
        .record(
            tenant.0,
            None,
            "workflow.deleted",
            "workflow_definition",
            Some(definition_id),
            None,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Start an instance of a workflow definition
#[utoipa::path(
    post,
    path = "/api/v1/workflows/{id}/instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Workflow definition UUID")
    ),
    request_body = StartInstanceRequestDto,
    responses(
        (status = 201, description = "Instance started", body = ApiResponse<WorkflowInstanceDto>, headers(
            ("Location", description = "URL of the created instance"),
            ("X-Trace-Id", description = "Trace identifier for request correlation")
        )),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Workflow not found", body = ApiError),
        (status = 409, description = "Workflow is not active", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "workflows"
)]
pub async fn start_instance(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(definition_id): Path<Uuid>,
    Json(request): Json<StartInstanceRequestDto>,
) -> Result<
    (
        StatusCode,
        [(&'static str, String); 2],
        Json<ApiResponse<WorkflowInstanceDto>>,
    ),
    ApiError,
> {
    let instance = WorkflowRepository::new(&state.db)
        .start_instance(tenant.0, definition_id, request.variables)
        .await?;

    AuditRepository::new(&state.db)
        .record(
            tenant.0,
            None,
            "workflow_instance.started",
            "workflow_instance",
            Some(instance.id),
            None,
        )
        .await?;

    let location = format!("/api/v1/workflow-instances/{}", instance.id);
    Ok((
        StatusCode::CREATED,
        created_headers(location),
        Json(ApiResponse::new(WorkflowInstanceDto::from(instance))),
    ))
}

/// List the tenant's workflow instances
#[utoipa::path(
    get,
    path = "/api/v1/workflow-instances",
    security(("bearer_auth" = [])),
    params(ListInstancesParams),
    responses(
        (status = 200, description = "Instances retrieved", body = ApiResponse<Page<WorkflowInstanceDto>>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "workflows"
)]
pub async fn list_instances(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Query(params): Query<ListInstancesParams>,
) -> Result<Json<ApiResponse<Page<WorkflowInstanceDto>>>, ApiError> {
    let page = params.page.unwrap_or(0);
    let per_page = params.per_page.unwrap_or(20).clamp(1, 100);

    let (instances, total) = WorkflowRepository::new(&state.db)
        .list_instances(tenant.0, params.status.as_deref(), page, per_page)
        .await?;

    Ok(Json(ApiResponse::new(Page {
        items: instances
            .into_iter()
            .map(WorkflowInstanceDto::from)
            .collect(),
        page,
        per_page,
        total,
    })))
}

/// Get a workflow instance by ID
#[utoipa::path(
    get,
    path = "/api/v1/workflow-instances/{id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Workflow instance UUID")
    ),
    responses(
        (status = 200, description = "Instance retrieved", body = ApiResponse<WorkflowInstanceDto>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Instance not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "workflows"
)]
pub async fn get_instance(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(instance_id): Path<Uuid>,
) -> Result<Json<ApiResponse<WorkflowInstanceDto>>, ApiError> {
    let instance = WorkflowRepository::new(&state.db)
        .get_instance(tenant.0, instance_id)
        .await?
        .ok_or_else(|| error::not_found("Workflow instance"))?;

    Ok(Json(ApiResponse::new(WorkflowInstanceDto::from(instance))))
}

/// Complete a running instance (all tasks must be resolved)
#[utoipa::path(
    post,
    path = "/api/v1/workflow-instances/{id}/complete",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Workflow instance UUID")
    ),
    responses(
        (status = 200, description = "Instance completed", body = ApiResponse<WorkflowInstanceDto>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Instance not found", body = ApiError),
        (status = 409, description = "Instance is not running or has open tasks", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "workflows"
)]
pub async fn complete_instance(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(instance_id): Path<Uuid>,
) -> Result<Json<ApiResponse<WorkflowInstanceDto>>, ApiError> {
    let instance = WorkflowRepository::new(&state.db)
        .complete_instance(tenant.0, instance_id)
        .await?;

    Ok(Json(ApiResponse::new(WorkflowInstanceDto::from(instance))))
}

/// Cancel a running instance
#[utoipa::path(
    post,
    path = "/api/v1/workflow-instances/{id}/cancel",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Workflow instance UUID")
    ),
    responses(
        (status = 200, description = "Instance cancelled", body = ApiResponse<WorkflowInstanceDto>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Instance not found", body = ApiError),
        (status = 409, description = "Instance is not running", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "workflows"
)]
pub async fn cancel_instance(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(instance_id): Path<Uuid>,
) -> Result<Json<ApiResponse<WorkflowInstanceDto>>, ApiError> {
    let instance = WorkflowRepository::new(&state.db)
        .cancel_instance(tenant.0, instance_id)
        .await?;

    Ok(Json(ApiResponse::new(WorkflowInstanceDto::from(instance))))
}

/// Create a task on a running instance
#[utoipa::path(
    post,
    path = "/api/v1/workflow-instances/{id}/tasks",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Workflow instance UUID")
    ),
    request_body = CreateTaskRequestDto,
    responses(
        (status = 201, description = "Task created", body = ApiResponse<WorkflowTaskDto>, headers(
            ("Location", description = "URL of the instance's task list"),
            ("X-Trace-Id", description = "Trace identifier for request correlation")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Instance not found", body = ApiError),
        (status = 409, description = "Instance is not running", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "workflows"
)]
pub async fn create_task(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(instance_id): Path<Uuid>,
    Json(request): Json<CreateTaskRequestDto>,
) -> Result<
    (
        StatusCode,
        [(&'static str, String); 2],
        Json<ApiResponse<WorkflowTaskDto>>,
    ),
    ApiError,
> {
    let task = WorkflowRepository::new(&state.db)
        .create_task(
            tenant.0,
            instance_id,
            &request.name,
            request.assignee_id,
            request.payload,
        )
        .await?;

    let location = format!("/api/v1/workflow-instances/{}/tasks", instance_id);
    Ok((
        StatusCode::CREATED,
        created_headers(location),
        Json(ApiResponse::new(WorkflowTaskDto::from(task))),
    ))
}

/// List an instance's tasks
#[utoipa::path(
    get,
    path = "/api/v1/workflow-instances/{id}/tasks",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Workflow instance UUID")
    ),
    responses(
        (status = 200, description = "Tasks retrieved", body = ApiResponse<Vec<WorkflowTaskDto>>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Instance not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "workflows"
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(instance_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<WorkflowTaskDto>>>, ApiError> {
    let tasks = WorkflowRepository::new(&state.db)
        .list_tasks(tenant.0, instance_id)
        .await?;
    Ok(Json(ApiResponse::new(
        tasks.into_iter().map(WorkflowTaskDto::from).collect(),
    )))
}

/// Complete an open task
#[utoipa::path(
    post,
    path = "/api/v1/workflow-instances/{id}/tasks/{task_id}/complete",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Workflow instance UUID"),
        ("task_id" = Uuid, Path, description = "Task UUID")
    ),
    responses(
        (status = 200, description = "Task completed", body = ApiResponse<WorkflowTaskDto>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Instance or task not found", body = ApiError),
        (status = 409, description = "Task is already completed", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "workflows"
)]
pub async fn complete_task(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path((instance_id, task_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<WorkflowTaskDto>>, ApiError> {
    let task = WorkflowRepository::new(&state.db)
        .complete_task(tenant.0, instance_id, task_id)
        .await?;

    Ok(Json(ApiResponse::new(WorkflowTaskDto::from(task))))
}

/// Read an instance's execution log
#[utoipa::path(
    get,
    path = "/api/v1/workflow-instances/{id}/log",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Workflow instance UUID")
    ),
    responses(
        (status = 200, description = "Execution log retrieved", body = ApiResponse<Vec<ExecutionLogDto>>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Instance not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "workflows"
)]
pub async fn list_execution_log(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(instance_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<ExecutionLogDto>>>, ApiError> {
    let events = WorkflowRepository::new(&state.db)
        .list_execution_log(tenant.0, instance_id)
        .await?;
    Ok(Json(ApiResponse::new(
        events.into_iter().map(ExecutionLogDto::from).collect(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::repositories::tenant::{CreateTenantRequest, TenantRepository};
    use crate::server::AppState;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use migration::{Migrator, MigratorTrait};
    use serde_json::json;
    use tower::ServiceExt;

    async fn setup_test_app() -> (AppState, axum::Router, Uuid) {
        let config = AppConfig {
            profile: "test".to_string(),
            database_url: "sqlite::memory:".to_string(),
            operator_tokens: vec!["test-token".to_string()],
            ..Default::default()
        };

        let db = sea_orm::Database::connect(&config.database_url)
            .await
            .expect("Failed to init test DB");
        Migrator::up(&db, None).await.expect("Failed to migrate");

        let tenant = TenantRepository::new(&db)
            .create_tenant(CreateTenantRequest {
                name: "Acme".to_string(),
                subdomain: "acme".to_string(),
            })
            .await
            .unwrap();

        let state = crate::server::create_test_app_state(config, db);
        let app = crate::server::create_app(state.clone());
        (state, app, tenant.id)
    }

    fn request_builder(method: &str, uri: String, tenant_id: Uuid) -> axum::http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", "Bearer test-token")
            .header("X-Tenant-Id", tenant_id.to_string())
            .header("Content-Type", "application/json")
    }

    #[tokio::test]
    async fn test_definition_instance_task_flow() {
        let (_state, app, tenant_id) = setup_test_app().await;

        let body = json!({
            "name": "Onboarding",
            "steps": [{"name": "collect-documents"}]
        });
        let request = request_builder("POST", "/api/v1/workflows".to_string(), tenant_id)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let definition: ApiResponse<WorkflowDefinitionDto> =
            serde_json::from_slice(&body).unwrap();

        let request = request_builder(
            "POST",
            format!("/api/v1/workflows/{}/instances", definition.data.id),
            tenant_id,
        )
        .body(Body::from(json!({"variables": {"k": "v"}}).to_string()))
        .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let instance: ApiResponse<WorkflowInstanceDto> = serde_json::from_slice(&body).unwrap();
        assert_eq!(instance.data.status, "running");

        let request = request_builder(
            "POST",
            format!("/api/v1/workflow-instances/{}/tasks", instance.data.id),
            tenant_id,
        )
        .body(Body::from(json!({"name": "collect-documents"}).to_string()))
        .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let task: ApiResponse<WorkflowTaskDto> = serde_json::from_slice(&body).unwrap();

        let request = request_builder(
            "POST",
            format!(
                "/api/v1/workflow-instances/{}/tasks/{}/complete",
                instance.data.id, task.data.id
            ),
            tenant_id,
        )
        .body(Body::empty())
        .unwrap();
        assert_eq!(
            app.clone().oneshot(request).await.unwrap().status(),
            StatusCode::OK
        );

        let request = request_builder(
            "POST",
            format!("/api/v1/workflow-instances/{}/complete", instance.data.id),
            tenant_id,
        )
        .body(Body::empty())
        .unwrap();
        assert_eq!(
            app.clone().oneshot(request).await.unwrap().status(),
            StatusCode::OK
        );

        let request = request_builder(
            "GET",
            format!("/api/v1/workflow-instances/{}/log", instance.data.id),
            tenant_id,
        )
        .body(Body::empty())
        .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let log: ApiResponse<Vec<ExecutionLogDto>> = serde_json::from_slice(&body).unwrap();
        assert_eq!(log.data.len(), 4);
        assert_eq!(log.data[0].event, "instance.started");
        assert_eq!(log.data[3].event, "instance.completed");
    }

    #[tokio::test]
    async fn test_empty_steps_rejected() {
        let (_state, app, tenant_id) = setup_test_app().await;

        let body = json!({"name": "Broken", "steps": []});
        let request = request_builder("POST", "/api/v1/workflows".to_string(), tenant_id)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
