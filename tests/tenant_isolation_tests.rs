//! Tests ensuring data stays scoped to its tenant across repositories.

use anyhow::Result;
use waaed::error::RepositoryError;
use waaed::repositories::geofence::CreateGeofenceRequest;
use waaed::repositories::notification::EnqueueNotificationRequest;
use waaed::repositories::{
    AuditRepository, GeofenceRepository, LeaveRepository, NotificationRepository, UserRepository,
};

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{create_test_tenant, create_test_user, setup_test_db};

#[tokio::test]
async fn email_uniqueness_scoped_to_tenant() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant_a = create_test_tenant(&db, "alpha").await?;
    let tenant_b = create_test_tenant(&db, "beta").await?;

    create_test_user(&db, tenant_a, "shared@example.com").await?;
    // The same address is fine in a different tenant.
    create_test_user(&db, tenant_b, "shared@example.com").await?;

    let duplicate = create_test_user(&db, tenant_a, "Shared@Example.com").await;
    assert!(duplicate.is_err());
    Ok(())
}

#[tokio::test]
async fn users_invisible_across_tenants() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant_a = create_test_tenant(&db, "alpha").await?;
    let tenant_b = create_test_tenant(&db, "beta").await?;
    let user_a = create_test_user(&db, tenant_a, "alice@example.com").await?;

    let repo = UserRepository::new(&db);
    assert!(repo.get_user_by_id(tenant_a, user_a).await?.is_some());
    assert!(repo.get_user_by_id(tenant_b, user_a).await?.is_none());

    let (users_b, total_b) = repo.list_users(tenant_b, 0, 20).await?;
    assert!(users_b.is_empty());
    assert_eq!(total_b, 0);
    Ok(())
}

#[tokio::test]
async fn geofences_scoped_to_tenant() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant_a = create_test_tenant(&db, "alpha").await?;
    let tenant_b = create_test_tenant(&db, "beta").await?;

    let repo = GeofenceRepository::new(&db);
    let fence = repo
        .create_geofence(
            tenant_a,
            CreateGeofenceRequest {
                name: "HQ".to_string(),
                description: None,
                latitude: 24.7136,
                longitude: 46.6753,
                radius_meters: 100.0,
                accuracy_tolerance_meters: None,
            },
        )
        .await?;

    assert!(repo.get_geofence(tenant_a, fence.id).await?.is_some());
    assert!(repo.get_geofence(tenant_b, fence.id).await?.is_none());
    assert!(repo.list_geofences(tenant_b).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn leave_type_names_scoped_to_tenant() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant_a = create_test_tenant(&db, "alpha").await?;
    let tenant_b = create_test_tenant(&db, "beta").await?;

    let repo = LeaveRepository::new(&db);
    repo.create_leave_type(tenant_a, "Annual", None, 25, true)
        .await?;
    // Same name in another tenant is allowed.
    repo.create_leave_type(tenant_b, "Annual", None, 30, false)
        .await?;

    let duplicate = repo.create_leave_type(tenant_a, "Annual", None, 20, true).await;
    assert!(matches!(duplicate, Err(RepositoryError::Conflict(_))));

    assert_eq!(repo.list_leave_types(tenant_a).await?.len(), 1);
    assert_eq!(repo.list_leave_types(tenant_b).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn notifications_unreachable_from_other_tenant() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant_a = create_test_tenant(&db, "alpha").await?;
    let tenant_b = create_test_tenant(&db, "beta").await?;
    let user_a = create_test_user(&db, tenant_a, "alice@example.com").await?;

    let repo = NotificationRepository::new(&db);
    let notification = repo
        .enqueue(
            tenant_a,
            EnqueueNotificationRequest::in_app(user_a, "Hello", "Body"),
        )
        .await?;

    let cross_tenant = repo.mark_read(tenant_b, notification.id, user_a).await;
    assert!(matches!(cross_tenant, Err(RepositoryError::NotFound(_))));

    let (items, total) = repo.list_for_user(tenant_b, user_a, 0, 20).await?;
    assert!(items.is_empty());
    assert_eq!(total, 0);
    Ok(())
}

#[tokio::test]
async fn audit_trail_scoped_to_tenant() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant_a = create_test_tenant(&db, "alpha").await?;
    let tenant_b = create_test_tenant(&db, "beta").await?;

    let repo = AuditRepository::new(&db);
    repo.record(tenant_a, None, "user.created", "user", None, None)
        .await?;

    let (entries_a, total_a) = repo.list(tenant_a, None, 0, 20).await?;
    assert_eq!(total_a, 1);
    assert_eq!(entries_a[0].action, "user.created");

    let (entries_b, total_b) = repo.list(tenant_b, None, 0, 20).await?;
    assert!(entries_b.is_empty());
    assert_eq!(total_b, 0);
    Ok(())
}
