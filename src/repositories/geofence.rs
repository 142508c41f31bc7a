//! # Geofence Repository
//!
//! Geofence and beacon management plus user-to-geofence assignments.
//! Attendance validation consumes the active geofences assigned to a user
//! and the tenant's active beacons.

use crate::error::RepositoryError;
use crate::models::beacon::{
    ActiveModel as BeaconActiveModel, Column as BeaconColumn, Entity as Beacon,
    Model as BeaconModel,
};
use crate::models::geofence::{
    ActiveModel as GeofenceActiveModel, Column as GeofenceColumn, Entity as Geofence,
    Model as GeofenceModel,
};
use crate::models::user_geofence::{
    ActiveModel as UserGeofenceActiveModel, Column as UserGeofenceColumn, Entity as UserGeofence,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

/// Request data for creating a geofence
#[derive(Debug, Clone)]
pub struct CreateGeofenceRequest {
    pub name: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
    pub accuracy_tolerance_meters: Option<f64>,
}

/// Request data for registering a beacon
#[derive(Debug, Clone)]
pub struct CreateBeaconRequest {
    pub name: String,
    pub beacon_uuid: String,
    pub major: i32,
    pub minor: i32,
    pub geofence_id: Option<Uuid>,
}

/// Repository for geofence, beacon, and assignment operations
pub struct GeofenceRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> GeofenceRepository<'a> {
    /// Create a new GeofenceRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a geofence for a tenant
    pub async fn create_geofence(
        &self,
        tenant_id: Uuid,
        request: CreateGeofenceRequest,
    ) -> Result<GeofenceModel, RepositoryError> {
        self.validate_geofence(&request)?;

        let now = Utc::now();
        let geofence = GeofenceActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            name: Set(request.name.trim().to_string()),
            description: Set(request.description),
            latitude: Set(request.latitude),
            longitude: Set(request.longitude),
            radius_meters: Set(request.radius_meters),
            accuracy_tolerance_meters: Set(request.accuracy_tolerance_meters),
            is_active: Set(true),
            is_deleted: Set(false),
            deleted_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        geofence
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Get a live geofence within a tenant
    pub async fn get_geofence(
        &self,
        tenant_id: Uuid,
        geofence_id: Uuid,
    ) -> Result<Option<GeofenceModel>, RepositoryError> {
        let geofence = Geofence::find_by_id(geofence_id)
            .filter(GeofenceColumn::TenantId.eq(tenant_id))
            .filter(GeofenceColumn::IsDeleted.eq(false))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(geofence)
    }

    /// List a tenant's geofences
    pub async fn list_geofences(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<GeofenceModel>, RepositoryError> {
        let geofences = Geofence::find()
            .filter(GeofenceColumn::TenantId.eq(tenant_id))
            .filter(GeofenceColumn::IsDeleted.eq(false))
            .order_by_asc(GeofenceColumn::Name)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(geofences)
    }

    /// Update a geofence's region or activation flag
    pub async fn update_geofence(
        &self,
        tenant_id: Uuid,
        geofence_id: Uuid,
        request: CreateGeofenceRequest,
        is_active: Option<bool>,
    ) -> Result<GeofenceModel, RepositoryError> {
        self.validate_geofence(&request)?;

        let geofence = self
            .get_geofence(tenant_id, geofence_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Geofence not found"))?;

        let mut active = geofence.into_active_model();
        active.name = Set(request.name.trim().to_string());
        active.description = Set(request.description);
        active.latitude = Set(request.latitude);
        active.longitude = Set(request.longitude);
        active.radius_meters = Set(request.radius_meters);
        active.accuracy_tolerance_meters = Set(request.accuracy_tolerance_meters);
        if let Some(is_active_flag) = is_active {
            active.is_active = Set(is_active_flag);
        }
        active.updated_at = Set(Utc::now().into());

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Soft-delete a geofence. Beacons keep their rows; the schema clears
    /// their geofence reference only on physical delete, so detach here.
    pub async fn soft_delete_geofence(
        &self,
        tenant_id: Uuid,
        geofence_id: Uuid,
    ) -> Result<(), RepositoryError> {
        let geofence = self
            .get_geofence(tenant_id, geofence_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Geofence not found"))?;

        let attached = Beacon::find()
            .filter(BeaconColumn::GeofenceId.eq(geofence_id))
            .filter(BeaconColumn::IsDeleted.eq(false))
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        for beacon in attached {
            let mut active = beacon.into_active_model();
            active.geofence_id = Set(None);
            active.updated_at = Set(Utc::now().into());
            active
                .update(self.db)
                .await
                .map_err(RepositoryError::database_error)?;
        }

        let now = Utc::now();
        let mut active = geofence.into_active_model();
        active.is_deleted = Set(true);
        active.deleted_at = Set(Some(now.into()));
        active.updated_at = Set(now.into());

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(())
    }

    /// Register a beacon, optionally attached to a geofence in the same tenant
    pub async fn create_beacon(
        &self,
        tenant_id: Uuid,
        request: CreateBeaconRequest,
    ) -> Result<BeaconModel, RepositoryError> {
        if request.name.trim().is_empty() {
            return Err(RepositoryError::validation_error(
                "Beacon name cannot be empty",
            ));
        }
        if request.beacon_uuid.trim().is_empty() {
            return Err(RepositoryError::validation_error(
                "Beacon UUID cannot be empty",
            ));
        }

        if let Some(geofence_id) = request.geofence_id {
            self.get_geofence(tenant_id, geofence_id)
                .await?
                .ok_or_else(|| {
                    RepositoryError::validation_error("Geofence not found in this tenant")
                })?;
        }

        let beacon_uuid = request.beacon_uuid.trim().to_lowercase();
        let existing = Beacon::find()
            .filter(BeaconColumn::TenantId.eq(tenant_id))
            .filter(BeaconColumn::BeaconUuid.eq(beacon_uuid.clone()))
            .filter(BeaconColumn::IsDeleted.eq(false))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if existing.is_some() {
            return Err(RepositoryError::conflict(format!(
                "Beacon UUID '{}' is already registered in this tenant",
                beacon_uuid
            )));
        }

        let now = Utc::now();
        let beacon = BeaconActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            geofence_id: Set(request.geofence_id),
            name: Set(request.name.trim().to_string()),
            beacon_uuid: Set(beacon_uuid),
            major: Set(request.major),
            minor: Set(request.minor),
            is_active: Set(true),
            is_deleted: Set(false),
            deleted_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        beacon
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// List a tenant's beacons
    pub async fn list_beacons(&self, tenant_id: Uuid) -> Result<Vec<BeaconModel>, RepositoryError> {
        let beacons = Beacon::find()
            .filter(BeaconColumn::TenantId.eq(tenant_id))
            .filter(BeaconColumn::IsDeleted.eq(false))
            .order_by_asc(BeaconColumn::Name)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(beacons)
    }

    /// Find an active beacon by its advertised UUID within a tenant
    pub async fn find_active_beacon(
        &self,
        tenant_id: Uuid,
        beacon_uuid: &str,
    ) -> Result<Option<BeaconModel>, RepositoryError> {
        let beacon = Beacon::find()
            .filter(BeaconColumn::TenantId.eq(tenant_id))
            .filter(BeaconColumn::BeaconUuid.eq(beacon_uuid.trim().to_lowercase()))
            .filter(BeaconColumn::IsActive.eq(true))
            .filter(BeaconColumn::IsDeleted.eq(false))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(beacon)
    }

    /// Assign a user to a geofence
    pub async fn assign_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        geofence_id: Uuid,
    ) -> Result<(), RepositoryError> {
        self.get_geofence(tenant_id, geofence_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Geofence not found"))?;

        let existing = UserGeofence::find()
            .filter(UserGeofenceColumn::UserId.eq(user_id))
            .filter(UserGeofenceColumn::GeofenceId.eq(geofence_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if existing.is_some() {
            return Err(RepositoryError::conflict(
                "User is already assigned to this geofence",
            ));
        }

        let assignment = UserGeofenceActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            geofence_id: Set(geofence_id),
            is_active: Set(true),
            assigned_at: Set(Utc::now().into()),
        };

        assignment
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(())
    }

    /// Remove a user's geofence assignment
    pub async fn unassign_user(
        &self,
        user_id: Uuid,
        geofence_id: Uuid,
    ) -> Result<(), RepositoryError> {
        let assignment = UserGeofence::find()
            .filter(UserGeofenceColumn::UserId.eq(user_id))
            .filter(UserGeofenceColumn::GeofenceId.eq(geofence_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .ok_or_else(|| RepositoryError::not_found("Assignment not found"))?;

        assignment
            .delete(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(())
    }

    /// Active geofences assigned to a user, the input to attendance
    /// validation.
    pub async fn list_assigned_active_geofences(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<GeofenceModel>, RepositoryError> {
        let assignments = UserGeofence::find()
            .filter(UserGeofenceColumn::UserId.eq(user_id))
            .filter(UserGeofenceColumn::IsActive.eq(true))
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        let geofence_ids: Vec<Uuid> = assignments.iter().map(|a| a.geofence_id).collect();
        if geofence_ids.is_empty() {
            return Ok(Vec::new());
        }

        let geofences = Geofence::find()
            .filter(GeofenceColumn::Id.is_in(geofence_ids))
            .filter(GeofenceColumn::TenantId.eq(tenant_id))
            .filter(GeofenceColumn::IsActive.eq(true))
            .filter(GeofenceColumn::IsDeleted.eq(false))
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(geofences)
    }

    fn validate_geofence(&self, request: &CreateGeofenceRequest) -> Result<(), RepositoryError> {
        if request.name.trim().is_empty() {
            return Err(RepositoryError::validation_error(
                "Geofence name cannot be empty",
            ));
        }

        if !(-90.0..=90.0).contains(&request.latitude) {
            return Err(RepositoryError::validation_error(
                "Latitude must be between -90 and 90",
            ));
        }

        if !(-180.0..=180.0).contains(&request.longitude) {
            return Err(RepositoryError::validation_error(
                "Longitude must be between -180 and 180",
            ));
        }

        if !request.radius_meters.is_finite() || request.radius_meters <= 0.0 {
            return Err(RepositoryError::validation_error(
                "Radius must be a positive number of meters",
            ));
        }

        if let Some(tolerance) = request.accuracy_tolerance_meters {
            if !tolerance.is_finite() || tolerance < 0.0 {
                return Err(RepositoryError::validation_error(
                    "Accuracy tolerance must be a non-negative number of meters",
                ));
            }
        }

        Ok(())
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

    fn office_fence() -> CreateGeofenceRequest {
        CreateGeofenceRequest {
            name: "HQ".to_string(),
            description: None,
            latitude: 24.7136,
            longitude: 46.6753,
            radius_meters: 100.0,
            accuracy_tolerance_meters: Some(20.0),
        }
    }

    #[tokio::test]
    async fn test_create_and_list_geofences() {
        let (db, tenant_id, _) = setup().await;
        let repo = GeofenceRepository::new(&db);

        let fence = repo
            .create_geofence(tenant_id, office_fence())
            .await
            .unwrap();
        assert!(fence.is_active);

        let listed = repo.list_geofences(tenant_id).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_geofence_validation() {
        let (db, tenant_id, _) = setup().await;
        let repo = GeofenceRepository::new(&db);

        let mut bad = office_fence();
        bad.latitude = 123.0;
        assert!(matches!(
            repo.create_geofence(tenant_id, bad).await,
            Err(RepositoryError::Validation(_))
        ));

        let mut bad = office_fence();
        bad.radius_meters = -5.0;
        assert!(matches!(
            repo.create_geofence(tenant_id, bad).await,
            Err(RepositoryError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_beacon_uuid_unique_per_tenant() {
        let (db, tenant_id, _) = setup().await;
        let repo = GeofenceRepository::new(&db);

        let request = CreateBeaconRequest {
            name: "Lobby".to_string(),
            beacon_uuid: "F7826DA6-4FA2-4E98-8024-BC5B71E0893E".to_string(),
            major: 1,
            minor: 1,
            geofence_id: None,
        };

        let beacon = repo.create_beacon(tenant_id, request.clone()).await.unwrap();
        assert_eq!(beacon.beacon_uuid, "f7826da6-4fa2-4e98-8024-bc5b71e0893e");

        let duplicate = repo.create_beacon(tenant_id, request).await;
        assert!(matches!(duplicate, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_find_active_beacon_case_insensitive() {
        let (db, tenant_id, _) = setup().await;
        let repo = GeofenceRepository::new(&db);

        repo.create_beacon(
            tenant_id,
            CreateBeaconRequest {
                name: "Lobby".to_string(),
                beacon_uuid: "abc-123".to_string(),
                major: 1,
                minor: 2,
                geofence_id: None,
            },
        )
        .await
        .unwrap();

        let found = repo.find_active_beacon(tenant_id, "ABC-123").await.unwrap();
        assert!(found.is_some());

        let missing = repo.find_active_beacon(tenant_id, "zzz").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_soft_delete_geofence_detaches_beacons() {
        let (db, tenant_id, _) = setup().await;
        let repo = GeofenceRepository::new(&db);

        let fence = repo
            .create_geofence(tenant_id, office_fence())
            .await
            .unwrap();
        repo.create_beacon(
            tenant_id,
            CreateBeaconRequest {
                name: "Lobby".to_string(),
                beacon_uuid: "abc-123".to_string(),
                major: 1,
                minor: 2,
                geofence_id: Some(fence.id),
            },
        )
        .await
        .unwrap();

        repo.soft_delete_geofence(tenant_id, fence.id).await.unwrap();

        assert!(repo.get_geofence(tenant_id, fence.id).await.unwrap().is_none());
        let beacons = repo.list_beacons(tenant_id).await.unwrap();
        assert_eq!(beacons.len(), 1);
        assert_eq!(beacons[0].geofence_id, None);
    }

    #[tokio::test]
    async fn test_assignments() {
        let (db, tenant_id, user_id) = setup().await;
        let repo = GeofenceRepository::new(&db);

        let fence = repo
            .create_geofence(tenant_id, office_fence())
            .await
            .unwrap();

        repo.assign_user(tenant_id, user_id, fence.id).await.unwrap();
        let again = repo.assign_user(tenant_id, user_id, fence.id).await;
        assert!(matches!(again, Err(RepositoryError::Conflict(_))));

        let assigned = repo
            .list_assigned_active_geofences(tenant_id, user_id)
            .await
            .unwrap();
        assert_eq!(assigned.len(), 1);

        repo.unassign_user(user_id, fence.id).await.unwrap();
        let assigned = repo
            .list_assigned_active_geofences(tenant_id, user_id)
            .await
            .unwrap();
        assert!(assigned.is_empty());
    }
}
