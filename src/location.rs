//! Geodesic distance helpers for geofence validation.

use crate::models::geofence::Model as GeofenceModel;

/// Mean Earth radius in meters.
const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance between two WGS84 coordinates in meters, using the
/// haversine formula.
pub fn haversine_distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Whether a coordinate falls inside a geofence, allowing for GPS accuracy.
///
/// The effective radius is the geofence radius plus its accuracy tolerance
/// (or `default_tolerance_meters` when the geofence does not define one).
pub fn is_within_geofence(
    geofence: &GeofenceModel,
    latitude: f64,
    longitude: f64,
    default_tolerance_meters: f64,
) -> bool {
    let distance =
        haversine_distance_meters(geofence.latitude, geofence.longitude, latitude, longitude);

    let tolerance = geofence
        .accuracy_tolerance_meters
        .unwrap_or(default_tolerance_meters);

    distance <= geofence.radius_meters + tolerance
}

/// Find the geofence containing the coordinate, preferring the one whose
/// center is nearest when several overlap.
pub fn nearest_containing_geofence<'a>(
    geofences: &'a [GeofenceModel],
    latitude: f64,
    longitude: f64,
    default_tolerance_meters: f64,
) -> Option<&'a GeofenceModel> {
    geofences
        .iter()
        .filter(|g| is_within_geofence(g, latitude, longitude, default_tolerance_meters))
        .min_by(|a, b| {
            let da = haversine_distance_meters(a.latitude, a.longitude, latitude, longitude);
            let db = haversine_distance_meters(b.latitude, b.longitude, latitude, longitude);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn test_geofence(lat: f64, lon: f64, radius: f64, tolerance: Option<f64>) -> GeofenceModel {
        let now = Utc::now();
        GeofenceModel {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: "Office".to_string(),
            description: None,
            latitude: lat,
            longitude: lon,
            radius_meters: radius,
            accuracy_tolerance_meters: tolerance,
            is_active: true,
            is_deleted: false,
            deleted_at: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[test]
    fn test_zero_distance() {
        let d = haversine_distance_meters(24.7136, 46.6753, 24.7136, 46.6753);
        assert!(d.abs() < 1e-6);
    }

    #[test]
    fn test_known_distance() {
        // Riyadh to Jeddah is roughly 849 km great-circle.
        let d = haversine_distance_meters(24.7136, 46.6753, 21.4858, 39.1925);
        assert!((d - 849_000.0).abs() < 10_000.0, "got {}", d);
    }

    #[test]
    fn test_short_distance_precision() {
        // ~111 meters per 0.001 degree of latitude.
        let d = haversine_distance_meters(24.7136, 46.6753, 24.7146, 46.6753);
        assert!((d - 111.0).abs() < 1.0, "got {}", d);
    }

    #[test]
    fn test_within_geofence_inside() {
        let fence = test_geofence(24.7136, 46.6753, 100.0, Some(0.0));
        assert!(is_within_geofence(&fence, 24.7136, 46.6753, 50.0));
    }

    #[test]
    fn test_within_geofence_outside() {
        let fence = test_geofence(24.7136, 46.6753, 100.0, Some(0.0));
        // ~1.1 km north of the fence center.
        assert!(!is_within_geofence(&fence, 24.7236, 46.6753, 50.0));
    }

    #[test]
    fn test_tolerance_extends_radius() {
        // Point ~111m away from a 100m fence: outside without tolerance,
        // inside with 20m tolerance.
        let strict = test_geofence(24.7136, 46.6753, 100.0, Some(0.0));
        assert!(!is_within_geofence(&strict, 24.7146, 46.6753, 0.0));

        let tolerant = test_geofence(24.7136, 46.6753, 100.0, Some(20.0));
        assert!(is_within_geofence(&tolerant, 24.7146, 46.6753, 0.0));
    }

    #[test]
    fn test_default_tolerance_applied_when_unset() {
        let fence = test_geofence(24.7136, 46.6753, 100.0, None);
        assert!(is_within_geofence(&fence, 24.7146, 46.6753, 20.0));
        assert!(!is_within_geofence(&fence, 24.7146, 46.6753, 0.0));
    }

    #[test]
    fn test_nearest_containing_prefers_closest_center() {
        let near = test_geofence(24.7136, 46.6753, 200.0, Some(0.0));
        let far = test_geofence(24.7150, 46.6753, 500.0, Some(0.0));
        let fences = vec![far.clone(), near.clone()];

        let hit = nearest_containing_geofence(&fences, 24.7137, 46.6753, 0.0).unwrap();
        assert_eq!(hit.id, near.id);
    }

    #[test]
    fn test_nearest_containing_none_when_outside_all() {
        let fences = vec![test_geofence(24.7136, 46.6753, 50.0, Some(0.0))];
        assert!(nearest_containing_geofence(&fences, 25.0, 47.0, 0.0).is_none());
    }
}
