//! # Tenant Repository
//!
//! This module contains the repository implementation for Tenant entities,
//! providing CRUD operations for tenant management.

use crate::error::RepositoryError;
use crate::models::tenant::{
    ActiveModel as TenantActiveModel, Column as TenantColumn, Entity as Tenant,
    Model as TenantModel,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

/// Request data for creating a new tenant
#[derive(Debug, Clone)]
pub struct CreateTenantRequest {
    /// Display name for the tenant
    pub name: String,
    /// Globally unique subdomain
    pub subdomain: String,
}

/// Repository for Tenant database operations
pub struct TenantRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> TenantRepository<'a> {
    /// Create a new TenantRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a new tenant
    pub async fn create_tenant(
        &self,
        request: CreateTenantRequest,
    ) -> Result<TenantModel, RepositoryError> {
        self.validate_tenant_name(&request.name)?;
        self.validate_subdomain(&request.subdomain)?;

        let existing = Tenant::find()
            .filter(TenantColumn::Subdomain.eq(request.subdomain.clone()))
            .filter(TenantColumn::IsDeleted.eq(false))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if existing.is_some() {
            return Err(RepositoryError::conflict(format!(
                "Subdomain '{}' is already taken",
                request.subdomain
            )));
        }

        let now = Utc::now();
        let tenant = TenantActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            subdomain: Set(request.subdomain.to_lowercase()),
            status: Set("active".to_string()),
            is_deleted: Set(false),
            deleted_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        tenant
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Get tenant by ID (soft-deleted tenants are not returned)
    pub async fn get_tenant_by_id(
        &self,
        tenant_id: Uuid,
    ) -> Result<Option<TenantModel>, RepositoryError> {
        let tenant = Tenant::find_by_id(tenant_id)
            .filter(TenantColumn::IsDeleted.eq(false))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(tenant)
    }

    /// Look a tenant up by its subdomain
    pub async fn get_tenant_by_subdomain(
        &self,
        subdomain: &str,
    ) -> Result<Option<TenantModel>, RepositoryError> {
        let tenant = Tenant::find()
            .filter(TenantColumn::Subdomain.eq(subdomain.to_lowercase()))
            .filter(TenantColumn::IsDeleted.eq(false))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(tenant)
    }

    /// List all live tenants
    pub async fn list_tenants(&self) -> Result<Vec<TenantModel>, RepositoryError> {
        let tenants = Tenant::find()
            .filter(TenantColumn::IsDeleted.eq(false))
            .order_by_asc(TenantColumn::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(tenants)
    }

    /// Update tenant name and/or status
    pub async fn update_tenant(
        &self,
        tenant_id: Uuid,
        name: Option<String>,
        status: Option<String>,
    ) -> Result<TenantModel, RepositoryError> {
        let tenant = self
            .get_tenant_by_id(tenant_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Tenant not found"))?;

        let mut active_tenant = tenant.into_active_model();

        if let Some(name) = name {
            self.validate_tenant_name(&name)?;
            active_tenant.name = Set(name.trim().to_string());
        }

        if let Some(status) = status {
            if !matches!(status.as_str(), "active" | "suspended") {
                return Err(RepositoryError::validation_error(
                    "Tenant status must be 'active' or 'suspended'",
                ));
            }
            active_tenant.status = Set(status);
        }

        active_tenant.updated_at = Set(Utc::now().into());

        active_tenant
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Soft-delete a tenant. The row remains for cascade semantics; child
    /// rows are removed physically only when the tenant row itself is.
    pub async fn soft_delete_tenant(&self, tenant_id: Uuid) -> Result<(), RepositoryError> {
        let tenant = self
            .get_tenant_by_id(tenant_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Tenant not found"))?;

        let now = Utc::now();
        let mut active_tenant = tenant.into_active_model();
        active_tenant.is_deleted = Set(true);
        active_tenant.deleted_at = Set(Some(now.into()));
        active_tenant.updated_at = Set(now.into());

        active_tenant
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(())
    }

    /// Check if a live tenant exists
    pub async fn tenant_exists(&self, tenant_id: Uuid) -> Result<bool, RepositoryError> {
        Ok(self.get_tenant_by_id(tenant_id).await?.is_some())
    }

    /// Get live tenant count
    pub async fn get_tenant_count(&self) -> Result<u64, RepositoryError> {
        Tenant::find()
            .filter(TenantColumn::IsDeleted.eq(false))
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    fn validate_tenant_name(&self, name: &str) -> Result<(), RepositoryError> {
        if name.trim().is_empty() {
            return Err(RepositoryError::validation_error(
                "Tenant name cannot be empty",
            ));
        }

        if name.len() > 255 {
            return Err(RepositoryError::validation_error(
                "Tenant name cannot exceed 255 characters",
            ));
        }

        Ok(())
    }

    fn validate_subdomain(&self, subdomain: &str) -> Result<(), RepositoryError> {
        if subdomain.is_empty() {
            return Err(RepositoryError::validation_error(
                "Subdomain cannot be empty",
            ));
        }

        if subdomain.len() > 63 {
            return Err(RepositoryError::validation_error(
                "Subdomain cannot exceed 63 characters",
            ));
        }

        // DNS label rules: alphanumeric and hyphens, no leading/trailing hyphen
        let valid_chars = subdomain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !valid_chars || subdomain.starts_with('-') || subdomain.ends_with('-') {
            return Err(RepositoryError::validation_error(
                "Subdomain must contain only letters, digits, and inner hyphens",
            ));
        }

        Ok(())
    }
}
