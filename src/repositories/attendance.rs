//! # Attendance Repository
//!
//! Check-in/check-out capture with geofence and beacon validation.
//! Validation results are computed once at write time and stored on the
//! record; a record is auto-approved when either validation passed.

use crate::config::AttendanceConfig;
use crate::error::RepositoryError;
use crate::location;
use crate::models::attendance_record::{
    ActiveModel as AttendanceActiveModel, Column as AttendanceColumn, Entity as AttendanceRecord,
    Model as AttendanceModel,
};
use crate::repositories::geofence::GeofenceRepository;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

/// Request data for a check-in or check-out event
#[derive(Debug, Clone, Default)]
pub struct RecordAttendanceRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub beacon_uuid: Option<String>,
    pub notes: Option<String>,
}

/// Outcome of location/beacon validation for an attendance event
#[derive(Debug, Clone)]
struct ValidationOutcome {
    geofence_id: Option<Uuid>,
    is_within_geofence: bool,
    is_beacon_verified: bool,
}

/// A user's attendance state for the current day
#[derive(Debug, Clone)]
pub struct TodayStatus {
    pub checked_in: bool,
    pub open_since: Option<DateTime<Utc>>,
    pub records: Vec<AttendanceModel>,
}

/// Repository for attendance capture and queries
pub struct AttendanceRepository<'a> {
    db: &'a DatabaseConnection,
    attendance_config: &'a AttendanceConfig,
}

impl<'a> AttendanceRepository<'a> {
    /// Create a new AttendanceRepository with the given connection and
    /// validation configuration
    pub fn new(db: &'a DatabaseConnection, attendance_config: &'a AttendanceConfig) -> Self {
        Self {
            db,
            attendance_config,
        }
    }

    /// Record a check-in for a user.
    ///
    /// Rejected with a conflict when the user already has an open check-in
    /// today (no intervening check-out).
    pub async fn check_in(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        request: RecordAttendanceRequest,
    ) -> Result<AttendanceModel, RepositoryError> {
        self.validate_coordinates(&request)?;

        if self.open_check_in(tenant_id, user_id).await?.is_some() {
            return Err(RepositoryError::conflict(
                "User already has an open check-in today",
            ));
        }

        let outcome = self.validate_location(tenant_id, user_id, &request).await?;
        self.insert_record(tenant_id, user_id, "check_in", request, outcome)
            .await
    }

    /// Record a check-out for a user.
    ///
    /// Rejected with a conflict when there is no open check-in today.
    pub async fn check_out(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        request: RecordAttendanceRequest,
    ) -> Result<AttendanceModel, RepositoryError> {
        self.validate_coordinates(&request)?;

        if self.open_check_in(tenant_id, user_id).await?.is_none() {
            return Err(RepositoryError::conflict(
                "No open check-in to check out from",
            ));
        }

        let outcome = self.validate_location(tenant_id, user_id, &request).await?;
        self.insert_record(tenant_id, user_id, "check_out", request, outcome)
            .await
    }

    /// The user's open/closed state and records for the current day
    pub async fn today_status(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<TodayStatus, RepositoryError> {
        let records = self.today_records(tenant_id, user_id).await?;

        let open = last_open_check_in(&records);
        Ok(TodayStatus {
            checked_in: open.is_some(),
            open_since: open.map(|r| r.recorded_at.to_utc()),
            records,
        })
    }

    /// Paginated time-range listing of a user's records, newest first.
    /// Served by the (user_id, recorded_at) index.
    pub async fn list_records(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<AttendanceModel>, u64), RepositoryError> {
        let mut query = AttendanceRecord::find()
            .filter(AttendanceColumn::TenantId.eq(tenant_id))
            .filter(AttendanceColumn::UserId.eq(user_id))
            .filter(AttendanceColumn::IsDeleted.eq(false));

        if let Some(from) = from {
            query = query.filter(AttendanceColumn::RecordedAt.gte(from));
        }
        if let Some(to) = to {
            query = query.filter(AttendanceColumn::RecordedAt.lte(to));
        }

        let paginator = query
            .order_by_desc(AttendanceColumn::RecordedAt)
            .paginate(self.db, per_page.max(1));

        let total = paginator
            .num_items()
            .await
            .map_err(RepositoryError::database_error)?;
        let records = paginator
            .fetch_page(page)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok((records, total))
    }

    /// Manually approve a record that failed both validations
    pub async fn approve_record(
        &self,
        tenant_id: Uuid,
        record_id: Uuid,
    ) -> Result<AttendanceModel, RepositoryError> {
        let record = AttendanceRecord::find_by_id(record_id)
            .filter(AttendanceColumn::TenantId.eq(tenant_id))
            .filter(AttendanceColumn::IsDeleted.eq(false))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .ok_or_else(|| RepositoryError::not_found("Attendance record not found"))?;

        if record.is_approved {
            return Err(RepositoryError::conflict("Record is already approved"));
        }

        use sea_orm::IntoActiveModel;
        let mut active = record.into_active_model();
        active.is_approved = Set(true);
        active.updated_at = Set(Utc::now().into());

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    async fn today_records(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<AttendanceModel>, RepositoryError> {
        let now = Utc::now();
        let day_start = Utc
            .with_ymd_and_hms(now.year(), now.month(), now.day(), 0, 0, 0)
            .single()
            .unwrap_or(now);

        let records = AttendanceRecord::find()
            .filter(AttendanceColumn::TenantId.eq(tenant_id))
            .filter(AttendanceColumn::UserId.eq(user_id))
            .filter(AttendanceColumn::IsDeleted.eq(false))
            .filter(AttendanceColumn::RecordedAt.gte(day_start))
            .order_by_asc(AttendanceColumn::RecordedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(records)
    }

    async fn open_check_in(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<AttendanceModel>, RepositoryError> {
        let records = self.today_records(tenant_id, user_id).await?;
        Ok(last_open_check_in(&records).cloned())
    }

    async fn validate_location(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        request: &RecordAttendanceRequest,
    ) -> Result<ValidationOutcome, RepositoryError> {
        let geofence_repo = GeofenceRepository::new(self.db);

        let mut outcome = ValidationOutcome {
            geofence_id: None,
            is_within_geofence: false,
            is_beacon_verified: false,
        };

        if let (Some(lat), Some(lon)) = (request.latitude, request.longitude) {
            let fences = geofence_repo
                .list_assigned_active_geofences(tenant_id, user_id)
                .await?;
            if let Some(hit) = location::nearest_containing_geofence(
                &fences,
                lat,
                lon,
                self.attendance_config.accuracy_tolerance_meters,
            ) {
                outcome.geofence_id = Some(hit.id);
                outcome.is_within_geofence = true;
            }
        }

        if let Some(beacon_uuid) = &request.beacon_uuid {
            outcome.is_beacon_verified = geofence_repo
                .find_active_beacon(tenant_id, beacon_uuid)
                .await?
                .is_some();
        }

        Ok(outcome)
    }

    async fn insert_record(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        record_type: &str,
        request: RecordAttendanceRequest,
        outcome: ValidationOutcome,
    ) -> Result<AttendanceModel, RepositoryError> {
        let is_approved = outcome.is_within_geofence || outcome.is_beacon_verified;
        let now = Utc::now();

        metrics::counter!(
            "attendance_records_total",
            "type" => record_type.to_string(),
            "approved" => is_approved.to_string(),
        )
        .increment(1);

        let record = AttendanceActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            user_id: Set(user_id),
            geofence_id: Set(outcome.geofence_id),
            record_type: Set(record_type.to_string()),
            recorded_at: Set(now.into()),
            latitude: Set(request.latitude),
            longitude: Set(request.longitude),
            beacon_uuid: Set(request.beacon_uuid.map(|b| b.trim().to_lowercase())),
            is_within_geofence: Set(outcome.is_within_geofence),
            is_beacon_verified: Set(outcome.is_beacon_verified),
            is_approved: Set(is_approved),
            notes: Set(request.notes),
            is_deleted: Set(false),
            deleted_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        record
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    fn validate_coordinates(
        &self,
        request: &RecordAttendanceRequest,
    ) -> Result<(), RepositoryError> {
        match (request.latitude, request.longitude) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    return Err(RepositoryError::validation_error(
                        "Latitude must be between -90 and 90",
                    ));
                }
                if !(-180.0..=180.0).contains(&lon) {
                    return Err(RepositoryError::validation_error(
                        "Longitude must be between -180 and 180",
                    ));
                }
                Ok(())
            }
            (None, None) => Ok(()),
            _ => Err(RepositoryError::validation_error(
                "Latitude and longitude must be provided together",
            )),
        }
    }
}

/// The most recent check-in with no later check-out, if any.
fn last_open_check_in(records: &[AttendanceModel]) -> Option<&AttendanceModel> {
    let mut open: Option<&AttendanceModel> = None;
    for record in records {
        match record.record_type.as_str() {
            "check_in" => open = Some(record),
            "check_out" => open = None,
            _ => {}
        }
    }
    open
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AttendanceConfig;
    use crate::repositories::geofence::{
        CreateBeaconRequest, CreateGeofenceRequest, GeofenceRepository,
    };
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

    async fn assign_hq_fence(db: &DatabaseConnection, tenant_id: Uuid, user_id: Uuid) -> Uuid {
        let repo = GeofenceRepository::new(db);
        let fence = repo
            .create_geofence(
                tenant_id,
                CreateGeofenceRequest {
                    name: "HQ".to_string(),
                    description: None,
                    latitude: 24.7136,
                    longitude: 46.6753,
                    radius_meters: 100.0,
                    accuracy_tolerance_meters: Some(0.0),
                },
            )
            .await
            .unwrap();
        repo.assign_user(tenant_id, user_id, fence.id).await.unwrap();
        fence.id
    }

    fn config() -> AttendanceConfig {
        AttendanceConfig::default()
    }

    #[tokio::test]
    async fn test_check_in_inside_geofence_auto_approved() {
        let (db, tenant_id, user_id) = setup().await;
        let fence_id = assign_hq_fence(&db, tenant_id, user_id).await;
        let cfg = config();
        let repo = AttendanceRepository::new(&db, &cfg);

        let record = repo
            .check_in(
                tenant_id,
                user_id,
                RecordAttendanceRequest {
                    latitude: Some(24.7136),
                    longitude: Some(46.6753),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(record.is_within_geofence);
        assert!(record.is_approved);
        assert_eq!(record.geofence_id, Some(fence_id));
        assert!(!record.is_beacon_verified);
    }

    #[tokio::test]
    async fn test_check_in_outside_geofence_pending() {
        let (db, tenant_id, user_id) = setup().await;
        assign_hq_fence(&db, tenant_id, user_id).await;
        let cfg = AttendanceConfig {
            accuracy_tolerance_meters: 0.0,
        };
        let repo = AttendanceRepository::new(&db, &cfg);

        let record = repo
            .check_in(
                tenant_id,
                user_id,
                RecordAttendanceRequest {
                    latitude: Some(25.0),
                    longitude: Some(47.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(!record.is_within_geofence);
        assert!(!record.is_approved);
        assert_eq!(record.geofence_id, None);
    }

    #[tokio::test]
    async fn test_valid_beacon_approves_without_gps() {
        let (db, tenant_id, user_id) = setup().await;
        GeofenceRepository::new(&db)
            .create_beacon(
                tenant_id,
                CreateBeaconRequest {
                    name: "Lobby".to_string(),
                    beacon_uuid: "abc-123".to_string(),
                    major: 1,
                    minor: 1,
                    geofence_id: None,
                },
            )
            .await
            .unwrap();

        let cfg = config();
        let repo = AttendanceRepository::new(&db, &cfg);

        let record = repo
            .check_in(
                tenant_id,
                user_id,
                RecordAttendanceRequest {
                    beacon_uuid: Some("ABC-123".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(record.is_beacon_verified);
        assert!(record.is_approved);
        assert!(!record.is_within_geofence);
    }

    #[tokio::test]
    async fn test_double_check_in_conflicts() {
        let (db, tenant_id, user_id) = setup().await;
        let cfg = config();
        let repo = AttendanceRepository::new(&db, &cfg);

        repo.check_in(tenant_id, user_id, RecordAttendanceRequest::default())
            .await
            .unwrap();

        let second = repo
            .check_in(tenant_id, user_id, RecordAttendanceRequest::default())
            .await;
        assert!(matches!(second, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_check_out_without_open_check_in_conflicts() {
        let (db, tenant_id, user_id) = setup().await;
        let cfg = config();
        let repo = AttendanceRepository::new(&db, &cfg);

        let orphan = repo
            .check_out(tenant_id, user_id, RecordAttendanceRequest::default())
            .await;
        assert!(matches!(orphan, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_check_in_out_cycle_and_today_status() {
        let (db, tenant_id, user_id) = setup().await;
        let cfg = config();
        let repo = AttendanceRepository::new(&db, &cfg);

        repo.check_in(tenant_id, user_id, RecordAttendanceRequest::default())
            .await
            .unwrap();

        let status = repo.today_status(tenant_id, user_id).await.unwrap();
        assert!(status.checked_in);
        assert!(status.open_since.is_some());

        repo.check_out(tenant_id, user_id, RecordAttendanceRequest::default())
            .await
            .unwrap();

        let status = repo.today_status(tenant_id, user_id).await.unwrap();
        assert!(!status.checked_in);
        assert_eq!(status.records.len(), 2);

        // A fresh cycle may start after checking out.
        repo.check_in(tenant_id, user_id, RecordAttendanceRequest::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_partial_coordinates_rejected() {
        let (db, tenant_id, user_id) = setup().await;
        let cfg = config();
        let repo = AttendanceRepository::new(&db, &cfg);

        let result = repo
            .check_in(
                tenant_id,
                user_id,
                RecordAttendanceRequest {
                    latitude: Some(24.7),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(RepositoryError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_records_pagination() {
        let (db, tenant_id, user_id) = setup().await;
        let cfg = config();
        let repo = AttendanceRepository::new(&db, &cfg);

        for _ in 0..3 {
            repo.check_in(tenant_id, user_id, RecordAttendanceRequest::default())
                .await
                .unwrap();
            repo.check_out(tenant_id, user_id, RecordAttendanceRequest::default())
                .await
                .unwrap();
        }

        let (page0, total) = repo
            .list_records(tenant_id, user_id, None, None, 0, 4)
            .await
            .unwrap();
        assert_eq!(total, 6);
        assert_eq!(page0.len(), 4);

        let future = Utc::now() + chrono::Duration::hours(1);
        let (none, _) = repo
            .list_records(tenant_id, user_id, Some(future), None, 0, 10)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_manual_approval() {
        let (db, tenant_id, user_id) = setup().await;
        let cfg = config();
        let repo = AttendanceRepository::new(&db, &cfg);

        let record = repo
            .check_in(tenant_id, user_id, RecordAttendanceRequest::default())
            .await
            .unwrap();
        assert!(!record.is_approved);

        let approved = repo.approve_record(tenant_id, record.id).await.unwrap();
        assert!(approved.is_approved);

        let again = repo.approve_record(tenant_id, record.id).await;
        assert!(matches!(again, Err(RepositoryError::Conflict(_))));
    }
}
