//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM
//! operations for database entities, providing a clean API for data access
//! with tenant-aware methods.

pub mod attendance;
pub mod audit;
pub mod geofence;
pub mod leave;
pub mod notification;
pub mod rbac;
pub mod tenant;
pub mod user;
pub mod workflow;

pub use attendance::AttendanceRepository;
pub use audit::AuditRepository;
pub use geofence::GeofenceRepository;
pub use leave::LeaveRepository;
pub use notification::NotificationRepository;
pub use rbac::RbacRepository;
pub use tenant::TenantRepository;
pub use user::UserRepository;
pub use workflow::WorkflowRepository;
