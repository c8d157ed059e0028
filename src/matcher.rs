// src/matcher.rs
//! Matching a live position against a stored route.
//!
//! The nearest-point search is a linear scan over the route vertices. Routes
//! are bounded by recording duration (thousands of points at one fix per
//! second), so O(n) per fix is an accepted limit rather than a defect.

use crate::{
    error::{Result, RouteError},
    geo,
    route::{GeoPoint, Route},
};
use serde::Serialize;

/// Geometric facts about a fix relative to a route
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchResult {
    /// Index of the nearest route point; ties resolve to the earliest point
    pub closest_index: usize,
    /// Distance to the nearest route vertex in meters
    pub off_route_meters: f64,
    /// Along-route distance from the nearest point to the end
    pub remaining_distance_km: f64,
    pub progress_percent: u32,
}

/// Match `fix` against `route`. Pure: the route is only read.
pub fn match_position(route: &Route, fix: &GeoPoint) -> Result<MatchResult> {
    let (closest_index, min_distance_km) = nearest_point(&route.points, fix)?;

    let remaining_distance_km = geo::total_distance_km(&route.points[closest_index..]);
    let progress_percent =
        (100.0 * closest_index as f64 / route.points.len() as f64).round() as u32;

    Ok(MatchResult {
        closest_index,
        off_route_meters: min_distance_km * 1000.0,
        remaining_distance_km,
        progress_percent,
    })
}

/// Index and distance (km) of the route point nearest to `fix`
pub fn nearest_point(points: &[GeoPoint], fix: &GeoPoint) -> Result<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;

    for (i, point) in points.iter().enumerate() {
        let distance = geo::distance_km(fix, point);
        // Strict comparison keeps the earliest index on ties
        let is_better = match best {
            Some((_, min)) => distance < min,
            None => true,
        };
        if is_better {
            best = Some((i, distance));
        }
    }

    best.ok_or(RouteError::EmptyRoute)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lat: f64, lon: f64, t: i64) -> GeoPoint {
        GeoPoint::new(lat, lon, t, None).unwrap()
    }

    fn route(points: Vec<GeoPoint>) -> Route {
        Route::new("test", points, 0).unwrap()
    }

    fn three_point_route() -> Route {
        let t0 = 1_700_000_000_000;
        route(vec![pt(0.0, 0.0, t0), pt(0.0, 1.0, t0 + 1), pt(0.0, 2.0, t0 + 2)])
    }

    #[test]
    fn test_fix_near_middle_point() {
        let result = match_position(&three_point_route(), &pt(0.0, 1.0001, 0)).unwrap();
        assert_eq!(result.closest_index, 1);
        assert!(result.off_route_meters < 15.0, "got {}", result.off_route_meters);
        assert_eq!(result.progress_percent, 33);

        let expected = geo::distance_km(&pt(0.0, 1.0, 0), &pt(0.0, 2.0, 0));
        assert!((result.remaining_distance_km - expected).abs() < 1e-9);
    }

    #[test]
    fn test_far_fix_is_off_route() {
        let result = match_position(&three_point_route(), &pt(10.0, 10.0, 0)).unwrap();
        assert!(result.off_route_meters > 50.0);
        assert_eq!(result.closest_index, 2);
        assert_eq!(result.remaining_distance_km, 0.0);
    }

    #[test]
    fn test_equidistant_points_pick_smaller_index() {
        let r = route(vec![pt(0.0, -1.0, 0), pt(0.0, 1.0, 1)]);
        let result = match_position(&r, &pt(0.0, 0.0, 0)).unwrap();
        assert_eq!(result.closest_index, 0);
    }

    #[test]
    fn test_duplicate_points_pick_first() {
        let r = route(vec![pt(5.0, 5.0, 0), pt(6.0, 6.0, 1), pt(5.0, 5.0, 2)]);
        let result = match_position(&r, &pt(5.0, 5.0, 0)).unwrap();
        assert_eq!(result.closest_index, 0);
        assert_eq!(result.off_route_meters, 0.0);
    }

    #[test]
    fn test_start_and_end_progress() {
        let r = three_point_route();
        assert_eq!(match_position(&r, &pt(0.0, 0.0, 0)).unwrap().progress_percent, 0);
        assert_eq!(match_position(&r, &pt(0.0, 2.0, 0)).unwrap().progress_percent, 67);
    }

    #[test]
    fn test_empty_route_is_an_error() {
        let mut r = three_point_route();
        r.points.clear();
        assert!(matches!(
            match_position(&r, &pt(0.0, 0.0, 0)),
            Err(RouteError::EmptyRoute)
        ));
    }
}
