//! # User Repository
//!
//! Tenant-scoped user management. Email uniqueness is enforced per tenant,
//! and soft deletion is refused while the user is still referenced as a
//! manager or as a leave approver/rejecter.

use crate::error::RepositoryError;
use crate::models::leave_request::{Column as LeaveRequestColumn, Entity as LeaveRequest};
use crate::models::user::{
    ActiveModel as UserActiveModel, Column as UserColumn, Entity as User, Model as UserModel,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

/// Request data for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub email: String,
    pub display_name: String,
    pub manager_id: Option<Uuid>,
}

/// Request data for updating a user
#[derive(Debug, Clone, Default)]
pub struct UpdateUserRequest {
    pub display_name: Option<String>,
    pub manager_id: Option<Option<Uuid>>,
    pub is_active: Option<bool>,
}

/// Repository for User database operations
pub struct UserRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a new user within a tenant
    pub async fn create_user(
        &self,
        tenant_id: Uuid,
        request: CreateUserRequest,
    ) -> Result<UserModel, RepositoryError> {
        let email = self.normalize_email(&request.email)?;
        self.validate_display_name(&request.display_name)?;

        let existing = User::find()
            .filter(UserColumn::TenantId.eq(tenant_id))
            .filter(UserColumn::Email.eq(email.clone()))
            .filter(UserColumn::IsDeleted.eq(false))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if existing.is_some() {
            return Err(RepositoryError::conflict(format!(
                "A user with email '{}' already exists in this tenant",
                email
            )));
        }

        if let Some(manager_id) = request.manager_id {
            self.require_user_in_tenant(tenant_id, manager_id, "Manager")
                .await?;
        }

        let now = Utc::now();
        let user = UserActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            email: Set(email),
            display_name: Set(request.display_name.trim().to_string()),
            manager_id: Set(request.manager_id),
            is_active: Set(true),
            is_deleted: Set(false),
            deleted_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        user.insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Get a live user by ID within a tenant
    pub async fn get_user_by_id(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<UserModel>, RepositoryError> {
        let user = User::find_by_id(user_id)
            .filter(UserColumn::TenantId.eq(tenant_id))
            .filter(UserColumn::IsDeleted.eq(false))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(user)
    }

    /// List users for a tenant with offset pagination
    pub async fn list_users(
        &self,
        tenant_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<UserModel>, u64), RepositoryError> {
        let paginator = User::find()
            .filter(UserColumn::TenantId.eq(tenant_id))
            .filter(UserColumn::IsDeleted.eq(false))
            .order_by_asc(UserColumn::CreatedAt)
            .paginate(self.db, per_page.max(1));

        let total = paginator
            .num_items()
            .await
            .map_err(RepositoryError::database_error)?;
        let users = paginator
            .fetch_page(page)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok((users, total))
    }

    /// Update a user's mutable fields
    pub async fn update_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        request: UpdateUserRequest,
    ) -> Result<UserModel, RepositoryError> {
        let user = self
            .get_user_by_id(tenant_id, user_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("User not found"))?;

        let mut active_user = user.into_active_model();

        if let Some(display_name) = request.display_name {
            self.validate_display_name(&display_name)?;
            active_user.display_name = Set(display_name.trim().to_string());
        }

        if let Some(manager_id) = request.manager_id {
            if let Some(manager_id) = manager_id {
                if manager_id == user_id {
                    return Err(RepositoryError::validation_error(
                        "A user cannot be their own manager",
                    ));
                }
                self.require_user_in_tenant(tenant_id, manager_id, "Manager")
                    .await?;
            }
            active_user.manager_id = Set(manager_id);
        }

        if let Some(is_active) = request.is_active {
            active_user.is_active = Set(is_active);
        }

        active_user.updated_at = Set(Utc::now().into());

        active_user
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Soft-delete a user.
    ///
    /// Refused while other live rows still reference the user as a manager
    /// or as a leave approver/rejecter, mirroring the restrict FKs.
    pub async fn soft_delete_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), RepositoryError> {
        let user = self
            .get_user_by_id(tenant_id, user_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("User not found"))?;

        let managed_count = User::find()
            .filter(UserColumn::ManagerId.eq(user_id))
            .filter(UserColumn::IsDeleted.eq(false))
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if managed_count > 0 {
            return Err(RepositoryError::conflict(
                "User is still referenced as a manager",
            ));
        }

        let decision_count = LeaveRequest::find()
            .filter(
                Condition::any()
                    .add(LeaveRequestColumn::ApprovedBy.eq(user_id))
                    .add(LeaveRequestColumn::RejectedBy.eq(user_id)),
            )
            .filter(LeaveRequestColumn::IsDeleted.eq(false))
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if decision_count > 0 {
            return Err(RepositoryError::conflict(
                "User is still referenced as a leave approver or rejecter",
            ));
        }

        let now = Utc::now();
        let mut active_user = user.into_active_model();
        active_user.is_deleted = Set(true);
        active_user.deleted_at = Set(Some(now.into()));
        active_user.updated_at = Set(now.into());

        active_user
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(())
    }

    /// Require a live user in the tenant, with a role-specific error label
    async fn require_user_in_tenant(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        label: &str,
    ) -> Result<UserModel, RepositoryError> {
        self.get_user_by_id(tenant_id, user_id)
            .await?
            .ok_or_else(|| {
                RepositoryError::validation_error(format!("{} not found in this tenant", label))
            })
    }

    fn normalize_email(&self, email: &str) -> Result<String, RepositoryError> {
        let email = email.trim().to_lowercase();

        if email.is_empty() {
            return Err(RepositoryError::validation_error("Email cannot be empty"));
        }

        let parts: Vec<&str> = email.split('@').collect();
        if parts.len() != 2 || parts[0].is_empty() || !parts[1].contains('.') {
            return Err(RepositoryError::validation_error(
                "Email must be a valid address",
            ));
        }

        Ok(email)
    }

    fn validate_display_name(&self, name: &str) -> Result<(), RepositoryError> {
        if name.trim().is_empty() {
            return Err(RepositoryError::validation_error(
                "Display name cannot be empty",
            ));
        }

        if name.len() > 255 {
            return Err(RepositoryError::validation_error(
                "Display name cannot exceed 255 characters",
            ));
        }

        Ok(())
    }
}
