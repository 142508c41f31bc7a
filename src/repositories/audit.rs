//! # Audit Repository
//!
//! Append-only audit trail. Mutating handlers record entries here; the
//! listing endpoint supports filtering by entity type.

use crate::error::RepositoryError;
use crate::models::audit_log::{
    ActiveModel as AuditLogActiveModel, Column as AuditLogColumn, Entity as AuditLog,
    Model as AuditLogModel,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Repository for audit log operations
pub struct AuditRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> AuditRepository<'a> {
    /// Create a new AuditRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Append an audit entry
    pub async fn record(
        &self,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
        action: &str,
        entity_type: &str,
        entity_id: Option<Uuid>,
        details: Option<JsonValue>,
    ) -> Result<AuditLogModel, RepositoryError> {
        if action.trim().is_empty() {
            return Err(RepositoryError::validation_error(
                "Audit action cannot be empty",
            ));
        }

        let entry = AuditLogActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            actor_id: Set(actor_id),
            action: Set(action.to_string()),
            entity_type: Set(entity_type.to_string()),
            entity_id: Set(entity_id),
            details: Set(details),
            created_at: Set(Utc::now().into()),
        };

        entry
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// List a tenant's audit entries, newest first, optionally filtered by
    /// entity type
    pub async fn list(
        &self,
        tenant_id: Uuid,
        entity_type: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<AuditLogModel>, u64), RepositoryError> {
        let mut query = AuditLog::find().filter(AuditLogColumn::TenantId.eq(tenant_id));
        if let Some(entity_type) = entity_type {
            query = query.filter(AuditLogColumn::EntityType.eq(entity_type));
        }

        let paginator = query
            .order_by_desc(AuditLogColumn::CreatedAt)
            .paginate(self.db, per_page.max(1));

        let total = paginator
            .num_items()
            .await
            .map_err(RepositoryError::database_error)?;
        let entries = paginator
            .fetch_page(page)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok((entries, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::tenant::{CreateTenantRequest, TenantRepository};
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;
    use serde_json::json;

    async fn setup() -> (DatabaseConnection, Uuid) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let tenant = TenantRepository::new(&db)
            .create_tenant(CreateTenantRequest {
                name: "Acme".to_string(),
                subdomain: "acme".to_string(),
            })
            .await
            .unwrap();

        (db, tenant.id)
    }

    #[tokio::test]
    async fn test_record_and_list() {
        let (db, tenant_id) = setup().await;
        let repo = AuditRepository::new(&db);

        let entity_id = Uuid::new_v4();
        let entry = repo
            .record(
                tenant_id,
                None,
                "geofence.created",
                "geofence",
                Some(entity_id),
                Some(json!({"name": "HQ"})),
            )
            .await
            .unwrap();
        assert_eq!(entry.action, "geofence.created");
        assert_eq!(entry.entity_id, Some(entity_id));

        repo.record(tenant_id, None, "user.created", "user", None, None)
            .await
            .unwrap();

        let (all, total) = repo.list(tenant_id, None, 0, 10).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(all.len(), 2);

        let (geofences, geofence_total) = repo
            .list(tenant_id, Some("geofence"), 0, 10)
            .await
            .unwrap();
        assert_eq!(geofence_total, 1);
        assert_eq!(geofences[0].entity_type, "geofence");
    }

    #[tokio::test]
    async fn test_empty_action_rejected() {
        let (db, tenant_id) = setup().await;
        let repo = AuditRepository::new(&db);

        let result = repo.record(tenant_id, None, "  ", "user", None, None).await;
        assert!(matches!(result, Err(RepositoryError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_is_tenant_scoped() {
        let (db, tenant_id) = setup().await;
        let repo = AuditRepository::new(&db);

        repo.record(tenant_id, None, "user.created", "user", None, None)
            .await
            .unwrap();

        let other = TenantRepository::new(&db)
            .create_tenant(CreateTenantRequest {
                name: "Globex".to_string(),
                subdomain: "globex".to_string(),
            })
            .await
            .unwrap();

        let (entries, total) = repo.list(other.id, None, 0, 10).await.unwrap();
        assert_eq!(total, 0);
        assert!(entries.is_empty());
    }
}
