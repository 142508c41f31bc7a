//! # Server Configuration
//!
//! This module contains the server setup and configuration for the Waaed API:
//! application state, the router with its middleware stack, and the OpenAPI
//! document.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth;
use crate::config::AppConfig;
use crate::handlers;
use crate::telemetry;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        // Tenants
        .route(
            "/tenants",
            post(handlers::tenants::create_tenant).get(handlers::tenants::list_tenants),
        )
        .route(
            "/tenants/{id}",
            get(handlers::tenants::get_tenant)
                .patch(handlers::tenants::update_tenant)
                .delete(handlers::tenants::delete_tenant),
        )
        // Users
        .route(
            "/users",
            post(handlers::users::create_user).get(handlers::users::list_users),
        )
        .route(
            "/users/{id}",
            get(handlers::users::get_user)
                .patch(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        // Roles and permissions
        .route(
            "/roles",
            post(handlers::rbac::create_role).get(handlers::rbac::list_roles),
        )
        .route("/permissions", get(handlers::rbac::list_permissions))
        .route(
            "/roles/{id}/permissions",
            post(handlers::rbac::grant_permission),
        )
        .route(
            "/roles/{id}/permissions/{permission_id}",
            delete(handlers::rbac::revoke_permission),
        )
        .route(
            "/users/{id}/roles",
            post(handlers::rbac::assign_role).get(handlers::rbac::list_user_roles),
        )
        .route(
            "/users/{id}/roles/{role_id}",
            delete(handlers::rbac::remove_role),
        )
        .route(
            "/users/{id}/permissions",
            get(handlers::rbac::list_user_permissions),
        )
        // Geofences and beacons
        .route(
            "/geofences",
            post(handlers::geofences::create_geofence).get(handlers::geofences::list_geofences),
        )
        .route(
            "/geofences/{id}",
            get(handlers::geofences::get_geofence)
                .put(handlers::geofences::update_geofence)
                .delete(handlers::geofences::delete_geofence),
        )
        .route(
            "/geofences/{id}/assignments",
            post(handlers::geofences::assign_user),
        )
        .route(
            "/geofences/{id}/assignments/{user_id}",
            delete(handlers::geofences::unassign_user),
        )
        .route(
            "/users/{id}/geofences",
            get(handlers::geofences::list_user_geofences),
        )
        .route(
            "/beacons",
            post(handlers::geofences::create_beacon).get(handlers::geofences::list_beacons),
        )
        // Attendance
        .route("/attendance/check-in", post(handlers::attendance::check_in))
        .route(
            "/attendance/check-out",
            post(handlers::attendance::check_out),
        )
        .route("/attendance/today", get(handlers::attendance::today_status))
        .route(
            "/attendance/records",
            get(handlers::attendance::list_records),
        )
        .route(
            "/attendance/records/{id}/approve",
            post(handlers::attendance::approve_record),
        )
        // Leave
        .route(
            "/leave/types",
            post(handlers::leave::create_leave_type).get(handlers::leave::list_leave_types),
        )
        .route(
            "/leave/requests",
            post(handlers::leave::create_leave_request).get(handlers::leave::list_leave_requests),
        )
        .route(
            "/leave/requests/{id}",
            get(handlers::leave::get_leave_request),
        )
        .route(
            "/leave/requests/{id}/approve",
            post(handlers::leave::approve_leave_request),
        )
        .route(
            "/leave/requests/{id}/reject",
            post(handlers::leave::reject_leave_request),
        )
        .route(
            "/leave/requests/{id}/cancel",
            post(handlers::leave::cancel_leave_request),
        )
        .route("/leave/balances", put(handlers::leave::set_leave_balance))
        .route(
            "/leave/balances/{user_id}",
            get(handlers::leave::list_leave_balances),
        )
        // Notifications
        .route(
            "/notifications",
            post(handlers::notifications::create_notification)
                .get(handlers::notifications::list_notifications),
        )
        .route(
            "/notifications/{id}/read",
            post(handlers::notifications::mark_notification_read),
        )
        // Audit
        .route("/audit-logs", get(handlers::audit::list_audit_logs))
        // Workflows
        .route(
            "/workflows",
            post(handlers::workflows::create_workflow).get(handlers::workflows::list_workflows),
        )
        .route(
            "/workflows/{id}",
            get(handlers::workflows::get_workflow).delete(handlers::workflows::delete_workflow),
        )
        .route(
            "/workflows/{id}/instances",
            post(handlers::workflows::start_instance),
        )
        .route(
            "/workflow-instances",
            get(handlers::workflows::list_instances),
        )
        .route(
            "/workflow-instances/{id}",
            get(handlers::workflows::get_instance),
        )
        .route(
            "/workflow-instances/{id}/complete",
            post(handlers::workflows::complete_instance),
        )
        .route(
            "/workflow-instances/{id}/cancel",
            post(handlers::workflows::cancel_instance),
        )
        .route(
            "/workflow-instances/{id}/tasks",
            post(handlers::workflows::create_task).get(handlers::workflows::list_tasks),
        )
        .route(
            "/workflow-instances/{id}/tasks/{task_id}/complete",
            post(handlers::workflows::complete_task),
        )
        .route(
            "/workflow-instances/{id}/log",
            get(handlers::workflows::list_execution_log),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .nest("/api/v1", protected)
        .layer(middleware::from_fn(telemetry::trace_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Builds an application state for in-process handler tests
pub fn create_test_app_state(config: AppConfig, db: DatabaseConnection) -> AppState {
    AppState {
        config: Arc::new(config),
        db,
    }
}

/// Starts the server with the given configuration, draining when the
/// cancellation token fires
pub async fn run_server(
    config: Arc<AppConfig>,
    db: DatabaseConnection,
    shutdown: CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    // Resolve the configured bind address
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;

    let state = AppState {
        config: Arc::clone(&config),
        db,
    };
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, profile = %config.profile, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    Ok(())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some("Operator bearer token"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::tenants::create_tenant,
        crate::handlers::tenants::list_tenants,
        crate::handlers::tenants::get_tenant,
        crate::handlers::tenants::update_tenant,
        crate::handlers::tenants::delete_tenant,
        crate::handlers::users::create_user,
        crate::handlers::users::list_users,
        crate::handlers::users::get_user,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,
        crate::handlers::rbac::create_role,
        crate::handlers::rbac::list_roles,
        crate::handlers::rbac::list_permissions,
        crate::handlers::rbac::grant_permission,
        crate::handlers::rbac::revoke_permission,
        crate::handlers::rbac::assign_role,
        crate::handlers::rbac::remove_role,
        crate::handlers::rbac::list_user_roles,
        crate::handlers::rbac::list_user_permissions,
        crate::handlers::geofences::create_geofence,
        crate::handlers::geofences::list_geofences,
        crate::handlers::geofences::get_geofence,
        crate::handlers::geofences::update_geofence,
        crate::handlers::geofences::delete_geofence,
        crate::handlers::geofences::create_beacon,
        crate::handlers::geofences::list_beacons,
        crate::handlers::geofences::assign_user,
        crate::handlers::geofences::unassign_user,
        crate::handlers::geofences::list_user_geofences,
        crate::handlers::attendance::check_in,
        crate::handlers::attendance::check_out,
        crate::handlers::attendance::today_status,
        crate::handlers::attendance::list_records,
        crate::handlers::attendance::approve_record,
        crate::handlers::leave::create_leave_type,
        crate::handlers::leave::list_leave_types,
        crate::handlers::leave::create_leave_request,
        crate::handlers::leave::get_leave_request,
        crate::handlers::leave::list_leave_requests,
        crate::handlers::leave::approve_leave_request,
        crate::handlers::leave::reject_leave_request,
        crate::handlers::leave::cancel_leave_request,
        crate::handlers::leave::list_leave_balances,
        crate::handlers::leave::set_leave_balance,
        crate::handlers::notifications::create_notification,
        crate::handlers::notifications::list_notifications,
        crate::handlers::notifications::mark_notification_read,
        crate::handlers::audit::list_audit_logs,
        crate::handlers::workflows::create_workflow,
        crate::handlers::workflows::list_workflows,
        crate::handlers::workflows::get_workflow,
        crate::handlers::workflows::delete_workflow,
        crate::handlers::workflows::start_instance,
        crate::handlers::workflows::list_instances,
        crate::handlers::workflows::get_instance,
        crate::handlers::workflows::complete_instance,
        crate::handlers::workflows::cancel_instance,
        crate::handlers::workflows::create_task,
        crate::handlers::workflows::list_tasks,
        crate::handlers::workflows::complete_task,
        crate::handlers::workflows::list_execution_log,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::handlers::types::ResponseMeta,
            crate::handlers::tenants::CreateTenantRequestDto,
            crate::handlers::tenants::UpdateTenantRequestDto,
            crate::handlers::tenants::TenantDto,
            crate::handlers::users::CreateUserRequestDto,
            crate::handlers::users::UpdateUserRequestDto,
            crate::handlers::users::UserDto,
            crate::handlers::rbac::CreateRoleRequestDto,
            crate::handlers::rbac::GrantPermissionRequestDto,
            crate::handlers::rbac::AssignRoleRequestDto,
            crate::handlers::rbac::RoleDto,
            crate::handlers::rbac::PermissionDto,
            crate::handlers::geofences::GeofenceRequestDto,
            crate::handlers::geofences::CreateBeaconRequestDto,
            crate::handlers::geofences::AssignUserRequestDto,
            crate::handlers::geofences::GeofenceDto,
            crate::handlers::geofences::BeaconDto,
            crate::handlers::attendance::AttendanceEventRequestDto,
            crate::handlers::attendance::AttendanceRecordDto,
            crate::handlers::attendance::TodayStatusDto,
            crate::handlers::leave::CreateLeaveTypeRequestDto,
            crate::handlers::leave::CreateLeaveRequestDto,
            crate::handlers::leave::LeaveDecisionRequestDto,
            crate::handlers::leave::CancelLeaveRequestDto,
            crate::handlers::leave::SetBalanceRequestDto,
            crate::handlers::leave::LeaveTypeDto,
            crate::handlers::leave::LeaveRequestDto,
            crate::handlers::leave::LeaveBalanceDto,
            crate::handlers::notifications::CreateNotificationRequestDto,
            crate::handlers::notifications::MarkReadRequestDto,
            crate::handlers::notifications::NotificationDto,
            crate::handlers::audit::AuditLogDto,
            crate::handlers::workflows::CreateWorkflowRequestDto,
            crate::handlers::workflows::StartInstanceRequestDto,
            crate::handlers::workflows::CreateTaskRequestDto,
            crate::handlers::workflows::WorkflowDefinitionDto,
            crate::handlers::workflows::WorkflowInstanceDto,
            crate::handlers::workflows::WorkflowTaskDto,
            crate::handlers::workflows::ExecutionLogDto,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Waaed Platform API",
        description = "Multi-tenant workforce attendance and leave management API",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
