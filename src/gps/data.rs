// src/gps/data.rs
//! Receiver state accumulated from NMEA sentences or gpsd reports

use crate::route::Fix;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default)]
pub struct GpsData {
    pub timestamp: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub fix_quality: Option<u8>, // NMEA GGA quality, 0 = invalid
    pub mode: Option<u8>,        // gpsd TPV mode, 2 = 2D, 3 = 3D
    pub accuracy: Option<f64>,   // meters
}

impl GpsData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the GPS data represents a valid position fix
    pub fn has_fix(&self) -> bool {
        let position = self.latitude.is_some() && self.longitude.is_some();
        let quality_ok = self.fix_quality.map_or(true, |q| q > 0);
        let mode_ok = self.mode.map_or(true, |m| m >= 2);
        position && quality_ok && mode_ok
    }

    /// Update the timestamp to now
    pub fn update_timestamp(&mut self) {
        self.timestamp = Some(Utc::now());
    }

    /// Snapshot the current position as a fix, if there is one
    pub fn to_fix(&self) -> Option<Fix> {
        if !self.has_fix() {
            return None;
        }

        Some(Fix {
            latitude: self.latitude,
            longitude: self.longitude,
            timestamp: self.timestamp.unwrap_or_else(Utc::now).timestamp_millis(),
            accuracy: self.accuracy,
        })
    }
}
