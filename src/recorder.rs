// src/recorder.rs
//! Route recording from live fixes

use crate::{
    clock::{Clock, SystemClock},
    error::{Result, RouteError},
    geo,
    route::{Fix, GeoPoint, Route},
};
use log::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
}

/// Read-only view of the recording buffer
#[derive(Debug, Clone, Copy)]
pub struct RecordingSnapshot<'a> {
    pub points: &'a [GeoPoint],
    pub distance_km: f64,
    pub elapsed_seconds: u64,
}

impl RecordingSnapshot<'_> {
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn format_elapsed(&self) -> String {
        geo::format_duration(self.elapsed_seconds)
    }
}

/// Accumulates live fixes into a point buffer while recording is active.
///
/// `Idle -> Recording -> Idle`. The buffer survives `stop()` so the caller can
/// save it; `reset()` clears it.
pub struct Recorder<C: Clock = SystemClock> {
    clock: C,
    state: RecorderState,
    points: Vec<GeoPoint>,
    distance_km: f64,
    start_ms: Option<i64>,
    elapsed_seconds: u64,
}

impl Recorder<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for Recorder<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Recorder<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            state: RecorderState::Idle,
            points: Vec::new(),
            distance_km: 0.0,
            start_ms: None,
            elapsed_seconds: 0,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    pub fn start(&mut self) -> Result<()> {
        if self.is_recording() {
            return Err(RouteError::InvalidState("recording already in progress".to_string()));
        }

        self.clear_buffer();
        self.start_ms = Some(self.clock.now_ms());
        self.state = RecorderState::Recording;
        info!("Recording started");
        Ok(())
    }

    /// Append a fix to the buffer, updating the running distance in O(1)
    pub fn on_fix(&mut self, fix: &Fix) -> Result<GeoPoint> {
        if !self.is_recording() {
            return Err(RouteError::InvalidState("not recording".to_string()));
        }

        let point = GeoPoint::from_fix(fix)?;
        if let Some(last) = self.points.last() {
            self.distance_km += geo::distance_km(last, &point);
        }
        self.points.push(point);
        debug!(
            "Recorded point {} ({:.6}, {:.6}), {:.3} km so far",
            self.points.len(),
            point.latitude,
            point.longitude,
            self.distance_km
        );

        Ok(point)
    }

    /// Freeze the buffer and elapsed time. A no-op when already idle.
    pub fn stop(&mut self) {
        if !self.is_recording() {
            debug!("Recorder stop ignored, already idle");
            return;
        }

        self.elapsed_seconds = self.elapsed_now();
        self.state = RecorderState::Idle;
        info!(
            "Recording stopped: {} points, {:.2} km, {}",
            self.points.len(),
            self.distance_km,
            geo::format_duration(self.elapsed_seconds)
        );
    }

    pub fn snapshot(&self) -> RecordingSnapshot<'_> {
        let elapsed_seconds = match self.state {
            RecorderState::Recording => self.elapsed_now(),
            RecorderState::Idle => self.elapsed_seconds,
        };

        RecordingSnapshot {
            points: &self.points,
            distance_km: self.distance_km,
            elapsed_seconds,
        }
    }

    pub fn reset(&mut self) -> Result<()> {
        if self.is_recording() {
            return Err(RouteError::InvalidState(
                "stop recording before resetting".to_string(),
            ));
        }

        self.clear_buffer();
        Ok(())
    }

    /// Build a route from the stopped buffer. The buffer is left intact.
    pub fn to_route(&self, name: &str) -> Result<Route> {
        if self.is_recording() {
            return Err(RouteError::InvalidState(
                "stop recording before saving".to_string(),
            ));
        }

        Route::new(name, self.points.clone(), self.elapsed_seconds)
    }

    fn elapsed_now(&self) -> u64 {
        match self.start_ms {
            Some(start) => ((self.clock.now_ms() - start).max(0) / 1000) as u64,
            None => 0,
        }
    }

    fn clear_buffer(&mut self) {
        self.points.clear();
        self.distance_km = 0.0;
        self.start_ms = None;
        self.elapsed_seconds = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn recorder() -> (Recorder<ManualClock>, ManualClock) {
        let clock = ManualClock::new(1_700_000_000_000);
        (Recorder::with_clock(clock.clone()), clock)
    }

    #[test]
    fn test_three_fixes_match_independent_total() {
        let (mut rec, clock) = recorder();
        rec.start().unwrap();

        let fixes = [
            Fix::new(48.1000, 11.5000, 1_000),
            Fix::new(48.1010, 11.5010, 2_000),
            Fix::new(48.1025, 11.5030, 3_000),
        ];
        for fix in &fixes {
            rec.on_fix(fix).unwrap();
            clock.advance_ms(1_000);
        }
        rec.stop();

        let snapshot = rec.snapshot();
        assert_eq!(snapshot.points.len(), 3);
        let expected = geo::total_distance_km(snapshot.points);
        assert!((snapshot.distance_km - expected).abs() < 1e-12);
        assert_eq!(snapshot.elapsed_seconds, 3);
    }

    #[test]
    fn test_double_start_is_rejected() {
        let (mut rec, _) = recorder();
        rec.start().unwrap();
        assert!(matches!(rec.start(), Err(RouteError::InvalidState(_))));
    }

    #[test]
    fn test_fix_outside_recording_is_rejected() {
        let (mut rec, _) = recorder();
        assert!(matches!(
            rec.on_fix(&Fix::new(0.0, 0.0, 0)),
            Err(RouteError::InvalidState(_))
        ));
    }

    #[test]
    fn test_invalid_fix_keeps_recording() {
        let (mut rec, _) = recorder();
        rec.start().unwrap();
        assert!(matches!(
            rec.on_fix(&Fix::new(123.0, 0.0, 0)),
            Err(RouteError::InvalidFix(_))
        ));
        assert!(rec.is_recording());
        assert!(rec.snapshot().points.is_empty());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (mut rec, clock) = recorder();
        rec.start().unwrap();
        clock.advance_ms(5_500);
        rec.stop();
        clock.advance_ms(10_000);
        rec.stop();
        assert_eq!(rec.state(), RecorderState::Idle);
        assert_eq!(rec.snapshot().elapsed_seconds, 5);
    }

    #[test]
    fn test_snapshot_while_recording_tracks_clock() {
        let (mut rec, clock) = recorder();
        rec.start().unwrap();
        clock.advance_ms(2_999);
        assert_eq!(rec.snapshot().elapsed_seconds, 2);
    }

    #[test]
    fn test_reset_requires_idle() {
        let (mut rec, _) = recorder();
        rec.start().unwrap();
        rec.on_fix(&Fix::new(1.0, 1.0, 0)).unwrap();
        assert!(matches!(rec.reset(), Err(RouteError::InvalidState(_))));

        rec.stop();
        assert_eq!(rec.snapshot().point_count(), 1);
        rec.reset().unwrap();
        assert_eq!(rec.snapshot().point_count(), 0);
        assert_eq!(rec.snapshot().distance_km, 0.0);
    }

    #[test]
    fn test_restart_clears_previous_buffer() {
        let (mut rec, _) = recorder();
        rec.start().unwrap();
        rec.on_fix(&Fix::new(1.0, 1.0, 0)).unwrap();
        rec.stop();
        rec.start().unwrap();
        assert!(rec.snapshot().points.is_empty());
    }

    #[test]
    fn test_to_route() {
        let (mut rec, clock) = recorder();
        assert!(matches!(rec.to_route("empty"), Err(RouteError::EmptyRoute)));

        rec.start().unwrap();
        rec.on_fix(&Fix::new(0.0, 0.0, 0)).unwrap();
        rec.on_fix(&Fix::new(0.0, 1.0, 1_000)).unwrap();
        assert!(matches!(rec.to_route("busy"), Err(RouteError::InvalidState(_))));

        clock.advance_ms(61_000);
        rec.stop();
        let route = rec.to_route("Morning loop").unwrap();
        assert_eq!(route.name, "Morning loop");
        assert_eq!(route.points.len(), 2);
        assert_eq!(route.duration_seconds, 61);
        assert!((route.total_distance_km - rec.snapshot().distance_km).abs() < 1e-12);
    }
}
