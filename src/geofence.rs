// src/geofence.rs
//
// Great-circle distance on a spherical-Earth approximation, used to
// gate the upload action on a circular target zone.

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in meters between two (latitude, longitude)
/// points in degrees. `None` when any coordinate is not a finite number.
pub fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Option<f64> {
    if ![lat1, lon1, lat2, lon2].iter().all(|v| v.is_finite()) {
        return None;
    }

    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    Some(EARTH_RADIUS_M * c)
}

/// Radius membership test. Fails closed: malformed coordinates or a
/// non-finite radius yield `false`, never an error.
pub fn within_radius(lat1: f64, lon1: f64, lat2: f64, lon2: f64, radius_meters: f64) -> bool {
    if !radius_meters.is_finite() {
        return false;
    }
    match haversine_distance_m(lat1, lon1, lat2, lon2) {
        Some(distance) => distance <= radius_meters,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_to_self_is_zero() {
        let distance = haversine_distance_m(12.971598, 77.594566, 12.971598, 77.594566).unwrap();
        assert!(distance.abs() < 1e-6);
        assert!(within_radius(12.971598, 77.594566, 12.971598, 77.594566, 0.0));
    }

    #[test]
    fn test_one_degree_of_latitude() {
        // One degree of latitude is ~111.19 km on the mean sphere.
        let distance = haversine_distance_m(0.0, 0.0, 1.0, 0.0).unwrap();
        assert!((distance - 111_195.0).abs() < 100.0, "got {}", distance);

        assert!(!within_radius(0.0, 0.0, 1.0, 0.0, 100_000.0));
        assert!(within_radius(0.0, 0.0, 1.0, 0.0, 120_000.0));
    }

    #[test]
    fn test_fails_closed_on_malformed_input() {
        assert_eq!(haversine_distance_m(f64::NAN, 0.0, 0.0, 0.0), None);
        assert!(!within_radius(f64::NAN, 0.0, 0.0, 0.0, 1_000.0));
        assert!(!within_radius(0.0, f64::INFINITY, 0.0, 0.0, 1_000.0));
        assert!(!within_radius(0.0, 0.0, 0.0, 0.0, f64::NAN));
    }

    #[test]
    fn test_antimeridian_pair() {
        // Same physical point expressed on either side of the antimeridian.
        let distance = haversine_distance_m(0.0, 179.999, 0.0, -179.999).unwrap();
        assert!(distance < 1_000.0, "got {}", distance);
    }
}
