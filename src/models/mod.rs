//! # Data Models
//!
//! This module contains all the SeaORM entity models used throughout the
//! Waaed platform API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod attendance_record;
pub mod audit_log;
pub mod beacon;
pub mod geofence;
pub mod leave_approval;
pub mod leave_request;
pub mod leave_type;
pub mod notification;
pub mod permission;
pub mod role;
pub mod role_permission;
pub mod tenant;
pub mod user;
pub mod user_geofence;
pub mod user_leave_balance;
pub mod user_role;
pub mod workflow_definition;
pub mod workflow_execution_log;
pub mod workflow_instance;
pub mod workflow_task;

pub use attendance_record::Entity as AttendanceRecord;
pub use audit_log::Entity as AuditLog;
pub use beacon::Entity as Beacon;
pub use geofence::Entity as Geofence;
pub use leave_approval::Entity as LeaveApproval;
pub use leave_request::Entity as LeaveRequest;
pub use leave_type::Entity as LeaveType;
pub use notification::Entity as Notification;
pub use permission::Entity as Permission;
pub use role::Entity as Role;
pub use role_permission::Entity as RolePermission;
pub use tenant::Entity as Tenant;
pub use user::Entity as User;
pub use user_geofence::Entity as UserGeofence;
pub use user_leave_balance::Entity as UserLeaveBalance;
pub use user_role::Entity as UserRole;
pub use workflow_definition::Entity as WorkflowDefinition;
pub use workflow_execution_log::Entity as WorkflowExecutionLog;
pub use workflow_instance::Entity as WorkflowInstance;
pub use workflow_task::Entity as WorkflowTask;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "waaed".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
