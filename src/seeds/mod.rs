//! # Seed Data
//!
//! Idempotent bootstrap data: the global permission catalogue and the
//! per-tenant defaults (roles and leave types). Safe to run on every
//! startup and whenever a tenant is provisioned.

use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::repositories::{LeaveRepository, RbacRepository};

/// The permission catalogue, as (resource, action, description).
const PERMISSION_CATALOGUE: &[(&str, &str, &str)] = &[
    ("tenants", "manage", "Create, update, and delete tenants"),
    ("users", "read", "View users"),
    ("users", "manage", "Create, update, and delete users"),
    ("roles", "manage", "Manage roles and grants"),
    ("geofences", "read", "View geofences and beacons"),
    ("geofences", "manage", "Create, update, and delete geofences and beacons"),
    ("attendance", "record", "Check in and out"),
    ("attendance", "read", "View attendance records"),
    ("attendance", "approve", "Approve attendance records"),
    ("leave", "request", "Submit and cancel leave requests"),
    ("leave", "read", "View leave requests and balances"),
    ("leave", "approve", "Approve or reject leave requests"),
    ("leave", "manage", "Manage leave types and balances"),
    ("notifications", "read", "View notifications"),
    ("audit", "read", "View audit logs"),
    ("workflows", "manage", "Manage workflow definitions"),
    ("workflows", "execute", "Start and drive workflow instances"),
];

/// Default roles created for every tenant, with their permission grants.
const DEFAULT_ROLES: &[(&str, &str, &[(&str, &str)])] = &[
    (
        "admin",
        "Full administrative access",
        &[
            ("users", "read"),
            ("users", "manage"),
            ("roles", "manage"),
            ("geofences", "read"),
            ("geofences", "manage"),
            ("attendance", "record"),
            ("attendance", "read"),
            ("attendance", "approve"),
            ("leave", "request"),
            ("leave", "read"),
            ("leave", "approve"),
            ("leave", "manage"),
            ("notifications", "read"),
            ("audit", "read"),
            ("workflows", "manage"),
            ("workflows", "execute"),
        ],
    ),
    (
        "manager",
        "Team management: approvals and reporting",
        &[
            ("users", "read"),
            ("geofences", "read"),
            ("attendance", "record"),
            ("attendance", "read"),
            ("attendance", "approve"),
            ("leave", "request"),
            ("leave", "read"),
            ("leave", "approve"),
            ("notifications", "read"),
            ("workflows", "execute"),
        ],
    ),
    (
        "employee",
        "Self-service attendance and leave",
        &[
            ("geofences", "read"),
            ("attendance", "record"),
            ("leave", "request"),
            ("leave", "read"),
            ("notifications", "read"),
        ],
    ),
];

/// Default leave types created for every tenant, as
/// (name, description, max_days_per_year, requires_approval).
const DEFAULT_LEAVE_TYPES: &[(&str, &str, i32, bool)] = &[
    ("Annual", "Paid annual leave", 25, true),
    ("Sick", "Sick leave", 10, false),
    ("Unpaid", "Unpaid leave", 30, true),
];

/// Ensure the global permission catalogue exists.
pub async fn seed_permission_catalogue(db: &DatabaseConnection) -> Result<(), RepositoryError> {
    let rbac = RbacRepository::new(db);

    for (resource, action, description) in PERMISSION_CATALOGUE {
        rbac.ensure_permission(resource, action, Some(description.to_string()))
            .await?;
    }

    tracing::debug!(
        count = PERMISSION_CATALOGUE.len(),
        "Permission catalogue seeded"
    );
    Ok(())
}

fn catalogue_description(resource: &str, action: &str) -> Option<String> {
    PERMISSION_CATALOGUE
        .iter()
        .find(|(r, a, _)| *r == resource && *a == action)
        .map(|(_, _, d)| d.to_string())
}

/// Ensure a tenant has the default roles (with grants) and leave types.
/// Existing rows are left untouched.
pub async fn seed_tenant_defaults(
    db: &DatabaseConnection,
    tenant_id: Uuid,
) -> Result<(), RepositoryError> {
    let rbac = RbacRepository::new(db);
    let leave = LeaveRepository::new(db);

    let existing_roles = rbac.list_roles(tenant_id).await?;

    for (name, description, grants) in DEFAULT_ROLES {
        let role = match existing_roles.iter().find(|r| r.name == *name) {
            Some(role) => role.clone(),
            None => {
                rbac.create_role(tenant_id, name, Some(description.to_string()))
                    .await?
            }
        };

        for (resource, action) in *grants {
            let permission = rbac
                .ensure_permission(resource, action, catalogue_description(resource, action))
                .await?;

            match rbac
                .grant_permission_to_role(tenant_id, role.id, permission.id)
                .await
            {
                Ok(()) => {}
                Err(RepositoryError::Conflict(_)) => {}
                Err(e) => return Err(e),
            }
        }
    }

    let existing_types = leave.list_leave_types(tenant_id).await?;
    for (name, description, max_days, requires_approval) in DEFAULT_LEAVE_TYPES {
        if existing_types.iter().any(|t| t.name == *name) {
            continue;
        }
        leave
            .create_leave_type(
                tenant_id,
                name,
                Some(description.to_string()),
                *max_days,
                *requires_approval,
            )
            .await?;
    }

    tracing::debug!(%tenant_id, "Tenant defaults seeded");
    Ok(())
}
