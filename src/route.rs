// src/route.rs
//! Route data model: geo points, live fixes and saved routes

use crate::error::{Result, RouteError};
use crate::geo;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// A single position as delivered by a live position source.
///
/// Coordinates are optional because sources can report a fix event
/// before they have a position; [`GeoPoint::from_fix`] rejects those.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    #[serde(alias = "lat")]
    pub latitude: Option<f64>,
    #[serde(alias = "lon")]
    pub longitude: Option<f64>,
    /// Epoch milliseconds
    pub timestamp: i64,
    /// Horizontal accuracy in meters
    #[serde(default)]
    pub accuracy: Option<f64>,
}

impl Fix {
    pub fn new(latitude: f64, longitude: f64, timestamp: i64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            timestamp,
            accuracy: None,
        }
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }
}

/// Validated, immutable geographic point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
    pub timestamp: i64,
    #[serde(default)]
    pub accuracy: Option<f64>,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64, timestamp: i64, accuracy: Option<f64>) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(RouteError::InvalidFix(format!(
                "latitude {} outside [-90, 90]",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(RouteError::InvalidFix(format!(
                "longitude {} outside [-180, 180]",
                longitude
            )));
        }

        Ok(Self {
            latitude,
            longitude,
            timestamp,
            accuracy,
        })
    }

    pub fn from_fix(fix: &Fix) -> Result<Self> {
        let latitude = fix
            .latitude
            .ok_or_else(|| RouteError::InvalidFix("missing latitude".to_string()))?;
        let longitude = fix
            .longitude
            .ok_or_else(|| RouteError::InvalidFix("missing longitude".to_string()))?;
        Self::new(latitude, longitude, fix.timestamp, fix.accuracy)
    }
}

/// A saved recording. Points keep their recorded order and are never reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: i64,
    pub name: String,
    pub points: Vec<GeoPoint>,
    #[serde(rename = "distance")]
    pub total_distance_km: f64,
    #[serde(rename = "duration")]
    pub duration_seconds: u64,
    #[serde(rename = "created")]
    pub created_at: DateTime<Utc>,
}

impl Route {
    /// Build a route from recorded points, caching the total distance.
    ///
    /// The id is derived from the creation time in epoch milliseconds; the
    /// store bumps it if it collides with an existing route.
    pub fn new(name: &str, points: Vec<GeoPoint>, duration_seconds: u64) -> Result<Self> {
        if points.is_empty() {
            return Err(RouteError::EmptyRoute);
        }

        let created_at = Utc::now();
        let name = name.trim();
        let name = if name.is_empty() {
            Self::default_name(created_at)
        } else {
            name.to_string()
        };

        Ok(Self {
            id: created_at.timestamp_millis(),
            name,
            total_distance_km: geo::total_distance_km(&points),
            points,
            duration_seconds,
            created_at,
        })
    }

    /// `Route <local date time>`, used when the user leaves the name blank
    pub fn default_name(created_at: DateTime<Utc>) -> String {
        format!(
            "Route {}",
            created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        )
    }

    /// Check a route that arrived from outside, e.g. an import.
    ///
    /// Deserialized points skip [`GeoPoint::new`], so each one is re-checked.
    pub fn validate(&self) -> Result<()> {
        if self.points.is_empty() {
            return Err(RouteError::EmptyRoute);
        }
        for point in &self.points {
            GeoPoint::new(point.latitude, point.longitude, point.timestamp, point.accuracy)?;
        }
        Ok(())
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn last_index(&self) -> Option<usize> {
        self.points.len().checked_sub(1)
    }

    pub fn start(&self) -> Option<&GeoPoint> {
        self.points.first()
    }

    pub fn end(&self) -> Option<&GeoPoint> {
        self.points.last()
    }
}
