//! # RBAC Repository
//!
//! Roles are tenant-scoped; permissions form a global catalogue keyed by
//! (resource, action). Grants flow through the role_permissions and
//! user_roles join tables.

use crate::error::RepositoryError;
use crate::models::permission::{
    ActiveModel as PermissionActiveModel, Column as PermissionColumn, Entity as Permission,
    Model as PermissionModel,
};
use crate::models::role::{
    ActiveModel as RoleActiveModel, Column as RoleColumn, Entity as Role, Model as RoleModel,
};
use crate::models::role_permission::{
    ActiveModel as RolePermissionActiveModel, Column as RolePermissionColumn,
    Entity as RolePermission,
};
use crate::models::user_role::{
    ActiveModel as UserRoleActiveModel, Column as UserRoleColumn, Entity as UserRole,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

/// Repository for role, permission, and grant operations
pub struct RbacRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> RbacRepository<'a> {
    /// Create a new RbacRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a tenant-scoped role
    pub async fn create_role(
        &self,
        tenant_id: Uuid,
        name: &str,
        description: Option<String>,
    ) -> Result<RoleModel, RepositoryError> {
        if name.trim().is_empty() {
            return Err(RepositoryError::validation_error(
                "Role name cannot be empty",
            ));
        }

        let existing = Role::find()
            .filter(RoleColumn::TenantId.eq(tenant_id))
            .filter(RoleColumn::Name.eq(name.trim()))
            .filter(RoleColumn::IsDeleted.eq(false))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if existing.is_some() {
            return Err(RepositoryError::conflict(format!(
                "Role '{}' already exists in this tenant",
                name.trim()
            )));
        }

        let now = Utc::now();
        let role = RoleActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            name: Set(name.trim().to_string()),
            description: Set(description),
            is_deleted: Set(false),
            deleted_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        role.insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Get a live role within a tenant
    pub async fn get_role(
        &self,
        tenant_id: Uuid,
        role_id: Uuid,
    ) -> Result<Option<RoleModel>, RepositoryError> {
        let role = Role::find_by_id(role_id)
            .filter(RoleColumn::TenantId.eq(tenant_id))
            .filter(RoleColumn::IsDeleted.eq(false))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(role)
    }

    /// List a tenant's roles
    pub async fn list_roles(&self, tenant_id: Uuid) -> Result<Vec<RoleModel>, RepositoryError> {
        let roles = Role::find()
            .filter(RoleColumn::TenantId.eq(tenant_id))
            .filter(RoleColumn::IsDeleted.eq(false))
            .order_by_asc(RoleColumn::Name)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(roles)
    }

    /// Register a permission in the global catalogue, returning the
    /// existing row if (resource, action) is already present.
    pub async fn ensure_permission(
        &self,
        resource: &str,
        action: &str,
        description: Option<String>,
    ) -> Result<PermissionModel, RepositoryError> {
        if resource.trim().is_empty() || action.trim().is_empty() {
            return Err(RepositoryError::validation_error(
                "Permission resource and action cannot be empty",
            ));
        }

        if let Some(existing) = self.find_permission(resource, action).await? {
            return Ok(existing);
        }

        let permission = PermissionActiveModel {
            id: Set(Uuid::new_v4()),
            resource: Set(resource.trim().to_string()),
            action: Set(action.trim().to_string()),
            description: Set(description),
            created_at: Set(Utc::now().into()),
        };

        permission
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Look up a permission by (resource, action)
    pub async fn find_permission(
        &self,
        resource: &str,
        action: &str,
    ) -> Result<Option<PermissionModel>, RepositoryError> {
        let permission = Permission::find()
            .filter(PermissionColumn::Resource.eq(resource.trim()))
            .filter(PermissionColumn::Action.eq(action.trim()))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(permission)
    }

    /// List the full permission catalogue
    pub async fn list_permissions(&self) -> Result<Vec<PermissionModel>, RepositoryError> {
        let permissions = Permission::find()
            .order_by_asc(PermissionColumn::Resource)
            .order_by_asc(PermissionColumn::Action)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(permissions)
    }

    /// Grant a permission to a role
    pub async fn grant_permission_to_role(
        &self,
        tenant_id: Uuid,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> Result<(), RepositoryError> {
        self.get_role(tenant_id, role_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Role not found"))?;

        Permission::find_by_id(permission_id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .ok_or_else(|| RepositoryError::not_found("Permission not found"))?;

        let existing = RolePermission::find()
            .filter(RolePermissionColumn::RoleId.eq(role_id))
            .filter(RolePermissionColumn::PermissionId.eq(permission_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if existing.is_some() {
            return Err(RepositoryError::conflict(
                "Permission is already granted to this role",
            ));
        }

        let grant = RolePermissionActiveModel {
            id: Set(Uuid::new_v4()),
            role_id: Set(role_id),
            permission_id: Set(permission_id),
            created_at: Set(Utc::now().into()),
        };

        grant
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(())
    }

    /// Revoke a permission from a role
    pub async fn revoke_permission_from_role(
        &self,
        tenant_id: Uuid,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> Result<(), RepositoryError> {
        self.get_role(tenant_id, role_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Role not found"))?;

        let grant = RolePermission::find()
            .filter(RolePermissionColumn::RoleId.eq(role_id))
            .filter(RolePermissionColumn::PermissionId.eq(permission_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .ok_or_else(|| RepositoryError::not_found("Grant not found"))?;

        grant
            .delete(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(())
    }

    /// Assign a role to a user
    pub async fn assign_role_to_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> Result<(), RepositoryError> {
        self.get_role(tenant_id, role_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Role not found"))?;

        let existing = UserRole::find()
            .filter(UserRoleColumn::UserId.eq(user_id))
            .filter(UserRoleColumn::RoleId.eq(role_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if existing.is_some() {
            return Err(RepositoryError::conflict(
                "Role is already assigned to this user",
            ));
        }

        let assignment = UserRoleActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            role_id: Set(role_id),
            created_at: Set(Utc::now().into()),
        };

        assignment
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(())
    }

    /// Remove a role from a user
    pub async fn remove_role_from_user(
        &self,
        user_id: Uuid,
        role_id: Uuid,
    ) -> Result<(), RepositoryError> {
        let assignment = UserRole::find()
            .filter(UserRoleColumn::UserId.eq(user_id))
            .filter(UserRoleColumn::RoleId.eq(role_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .ok_or_else(|| RepositoryError::not_found("Role assignment not found"))?;

        assignment
            .delete(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(())
    }

    /// List the permissions granted to a role
    pub async fn list_role_permissions(
        &self,
        role_id: Uuid,
    ) -> Result<Vec<PermissionModel>, RepositoryError> {
        let grants = RolePermission::find()
            .filter(RolePermissionColumn::RoleId.eq(role_id))
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        let permission_ids: Vec<Uuid> = grants.iter().map(|g| g.permission_id).collect();
        if permission_ids.is_empty() {
            return Ok(Vec::new());
        }

        let permissions = Permission::find()
            .filter(PermissionColumn::Id.is_in(permission_ids))
            .order_by_asc(PermissionColumn::Resource)
            .order_by_asc(PermissionColumn::Action)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(permissions)
    }

    /// List roles assigned to a user
    pub async fn list_user_roles(&self, user_id: Uuid) -> Result<Vec<RoleModel>, RepositoryError> {
        let assignments = UserRole::find()
            .filter(UserRoleColumn::UserId.eq(user_id))
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        let role_ids: Vec<Uuid> = assignments.iter().map(|a| a.role_id).collect();
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }

        let roles = Role::find()
            .filter(RoleColumn::Id.is_in(role_ids))
            .filter(RoleColumn::IsDeleted.eq(false))
            .order_by_asc(RoleColumn::Name)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(roles)
    }

    /// List a user's effective permissions: the distinct permissions
    /// granted through any of the user's roles.
    pub async fn list_effective_permissions(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<PermissionModel>, RepositoryError> {
        let assignments = UserRole::find()
            .filter(UserRoleColumn::UserId.eq(user_id))
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        let role_ids: Vec<Uuid> = assignments.iter().map(|a| a.role_id).collect();
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }

        let grants = RolePermission::find()
            .filter(RolePermissionColumn::RoleId.is_in(role_ids))
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        let mut permission_ids: Vec<Uuid> = grants.iter().map(|g| g.permission_id).collect();
        permission_ids.sort();
        permission_ids.dedup();
        if permission_ids.is_empty() {
            return Ok(Vec::new());
        }

        let permissions = Permission::find()
            .filter(PermissionColumn::Id.is_in(permission_ids))
            .order_by_asc(PermissionColumn::Resource)
            .order_by_asc(PermissionColumn::Action)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(permissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::tenant::{CreateTenantRequest, TenantRepository};
    use crate::repositories::user::{CreateUserRequest, UserRepository};
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;

    async fn setup() -> (DatabaseConnection, Uuid, Uuid) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let tenant = TenantRepository::new(&db)
            .create_tenant(CreateTenantRequest {
                name: "Acme".to_string(),
                subdomain: "acme".to_string(),
            })
            .await
            .unwrap();

        let user = UserRepository::new(&db)
            .create_user(
                tenant.id,
                CreateUserRequest {
                    email: "alice@example.com".to_string(),
                    display_name: "Alice".to_string(),
                    manager_id: None,
                },
            )
            .await
            .unwrap();

        (db, tenant.id, user.id)
    }

    #[tokio::test]
    async fn test_role_name_unique_per_tenant() {
        let (db, tenant_id, _) = setup().await;
        let repo = RbacRepository::new(&db);

        repo.create_role(tenant_id, "admin", None).await.unwrap();
        let duplicate = repo.create_role(tenant_id, "admin", None).await;
        assert!(matches!(duplicate, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_ensure_permission_idempotent() {
        let (db, _, _) = setup().await;
        let repo = RbacRepository::new(&db);

        let first = repo
            .ensure_permission("attendance", "read", None)
            .await
            .unwrap();
        let second = repo
            .ensure_permission("attendance", "read", None)
            .await
            .unwrap();
        assert_eq!(first.id, second.id);

        assert_eq!(repo.list_permissions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_grant_and_revoke_permission() {
        let (db, tenant_id, _) = setup().await;
        let repo = RbacRepository::new(&db);

        let role = repo.create_role(tenant_id, "admin", None).await.unwrap();
        let permission = repo
            .ensure_permission("attendance", "approve", None)
            .await
            .unwrap();

        repo.grant_permission_to_role(tenant_id, role.id, permission.id)
            .await
            .unwrap();

        let again = repo
            .grant_permission_to_role(tenant_id, role.id, permission.id)
            .await;
        assert!(matches!(again, Err(RepositoryError::Conflict(_))));

        repo.revoke_permission_from_role(tenant_id, role.id, permission.id)
            .await
            .unwrap();

        let missing = repo
            .revoke_permission_from_role(tenant_id, role.id, permission.id)
            .await;
        assert!(matches!(missing, Err(RepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_effective_permissions_deduplicated() {
        let (db, tenant_id, user_id) = setup().await;
        let repo = RbacRepository::new(&db);

        let admin = repo.create_role(tenant_id, "admin", None).await.unwrap();
        let manager = repo.create_role(tenant_id, "manager", None).await.unwrap();
        let shared = repo
            .ensure_permission("leave", "approve", None)
            .await
            .unwrap();
        let admin_only = repo
            .ensure_permission("tenant", "manage", None)
            .await
            .unwrap();

        repo.grant_permission_to_role(tenant_id, admin.id, shared.id)
            .await
            .unwrap();
        repo.grant_permission_to_role(tenant_id, manager.id, shared.id)
            .await
            .unwrap();
        repo.grant_permission_to_role(tenant_id, admin.id, admin_only.id)
            .await
            .unwrap();

        repo.assign_role_to_user(tenant_id, user_id, admin.id)
            .await
            .unwrap();
        repo.assign_role_to_user(tenant_id, user_id, manager.id)
            .await
            .unwrap();

        // Shared grant appears once despite two granting roles.
        let effective = repo.list_effective_permissions(user_id).await.unwrap();
        assert_eq!(effective.len(), 2);

        let roles = repo.list_user_roles(user_id).await.unwrap();
        assert_eq!(roles.len(), 2);
    }

    #[tokio::test]
    async fn test_assign_role_twice_conflicts() {
        let (db, tenant_id, user_id) = setup().await;
        let repo = RbacRepository::new(&db);

        let role = repo.create_role(tenant_id, "employee", None).await.unwrap();
        repo.assign_role_to_user(tenant_id, user_id, role.id)
            .await
            .unwrap();

        let again = repo.assign_role_to_user(tenant_id, user_id, role.id).await;
        assert!(matches!(again, Err(RepositoryError::Conflict(_))));

        repo.remove_role_from_user(user_id, role.id).await.unwrap();
        assert!(repo.list_user_roles(user_id).await.unwrap().is_empty());
    }
}
