// src/geo.rs
//! Great-circle distance and bearing helpers.
//!
//! All inputs are WGS84 degrees. Distances are kilometres on a sphere of
//! radius [`EARTH_RADIUS_KM`].

use crate::route::GeoPoint;

/// Mean Earth radius in kilometres
pub const EARTH_RADIUS_KM: f64 = 6371.0;

const COMPASS_POINTS: [&str; 8] = [
    "North",
    "North-East",
    "East",
    "South-East",
    "South",
    "South-West",
    "West",
    "North-West",
];

/// Haversine distance between two coordinates in kilometres
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlon / 2.0).sin().powi(2);

    // Rounding can push h slightly outside [0, 1] near identical or antipodal points
    2.0 * EARTH_RADIUS_KM * h.clamp(0.0, 1.0).sqrt().asin()
}

/// Great-circle distance between two points in kilometres
pub fn distance_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    haversine_km(a.latitude, a.longitude, b.latitude, b.longitude)
}

/// Initial bearing from `a` to `b`, normalized into [0, 360)
pub fn bearing_degrees(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let y = dlon.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlon.cos();

    let bearing = y.atan2(x).to_degrees().rem_euclid(360.0);
    // rem_euclid may return exactly 360.0 for tiny negative inputs
    if bearing >= 360.0 {
        0.0
    } else {
        bearing
    }
}

/// Sum of consecutive pairwise distances; 0 for fewer than two points
pub fn total_distance_km(points: &[GeoPoint]) -> f64 {
    points.windows(2).map(|w| distance_km(&w[0], &w[1])).sum()
}

/// Eight-point compass name for a bearing in degrees
pub fn compass_direction(bearing: f64) -> &'static str {
    let index = (bearing.rem_euclid(360.0) / 45.0).round() as usize % COMPASS_POINTS.len();
    COMPASS_POINTS[index]
}

/// Format a duration in seconds as `1h 2m 3s`, `2m 3s` or `3s`
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon, 0, None).unwrap()
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        for (lat, lon) in [(0.0, 0.0), (48.117, 11.517), (-89.9, 179.9), (90.0, -180.0)] {
            let p = pt(lat, lon);
            assert_eq!(distance_km(&p, &p), 0.0);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = pt(42.438878, -71.119277);
        let b = pt(48.117, 11.517);
        assert_eq!(distance_km(&a, &b), distance_km(&b, &a));
    }

    #[test]
    fn test_one_degree_of_longitude_at_equator() {
        let d = distance_km(&pt(0.0, 0.0), &pt(0.0, 1.0));
        assert!((d - 111.195).abs() < 0.01, "got {d}");
    }

    #[test]
    fn test_antipodal_points_are_finite() {
        let d = distance_km(&pt(0.0, 0.0), &pt(0.0, 180.0));
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn test_collinear_points_add_up() {
        let p1 = pt(10.0, 20.0);
        let p2 = pt(10.5, 20.0);
        let p3 = pt(11.0, 20.0);
        let direct = distance_km(&p1, &p3);
        let via = distance_km(&p1, &p2) + distance_km(&p2, &p3);
        assert!((direct - via).abs() < 1e-9);
    }

    #[test]
    fn test_total_distance_degenerate() {
        assert_eq!(total_distance_km(&[]), 0.0);
        assert_eq!(total_distance_km(&[pt(1.0, 2.0)]), 0.0);
    }

    #[test]
    fn test_total_distance_sums_segments() {
        let points = [pt(0.0, 0.0), pt(0.0, 1.0), pt(0.0, 2.0)];
        let expected = distance_km(&points[0], &points[1]) + distance_km(&points[1], &points[2]);
        assert!((total_distance_km(&points) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_bearing_cardinals() {
        let origin = pt(0.0, 0.0);
        assert!(bearing_degrees(&origin, &pt(1.0, 0.0)).abs() < 0.1);
        assert!((bearing_degrees(&origin, &pt(0.0, 1.0)) - 90.0).abs() < 0.1);
        assert!((bearing_degrees(&origin, &pt(-1.0, 0.0)) - 180.0).abs() < 0.1);
        assert!((bearing_degrees(&origin, &pt(0.0, -1.0)) - 270.0).abs() < 0.1);
    }

    #[test]
    fn test_bearing_range() {
        let b = bearing_degrees(&pt(10.0, 10.0), &pt(9.0, 9.0));
        assert!((0.0..360.0).contains(&b));
    }

    #[test]
    fn test_compass_direction() {
        assert_eq!(compass_direction(0.0), "North");
        assert_eq!(compass_direction(44.0), "North-East");
        assert_eq!(compass_direction(180.0), "South");
        assert_eq!(compass_direction(350.0), "North");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(3723), "1h 2m 3s");
        assert_eq!(format_duration(123), "2m 3s");
        assert_eq!(format_duration(7), "7s");
    }
}
