// src/navigation.rs
//! Navigation session state for replaying a saved route

use crate::{
    error::{Result, RouteError},
    geo,
    instruction::{GuidanceSettings, Instruction, InstructionEngine, InstructionState},
    matcher::{self, MatchResult},
    route::{Fix, GeoPoint, Route},
};
use log::debug;
use serde::Serialize;
use std::sync::Arc;

/// Everything the presentation layer needs after one fix
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigationUpdate {
    pub session_id: u64,
    pub position: GeoPoint,
    pub matched: MatchResult,
    pub instruction: Instruction,
    /// Compass direction from the position to the nearest route point
    pub heading_to_route: Option<String>,
}

/// One active replay of a route.
///
/// The session shares the route read-only; the matcher recomputes the global
/// nearest point on every fix, so `current_index` may move backwards.
#[derive(Debug)]
pub struct NavigationSession {
    id: u64,
    route: Arc<Route>,
    current_index: usize,
    engine: InstructionEngine,
    started: bool,
}

impl NavigationSession {
    pub fn new(id: u64, route: Arc<Route>, settings: GuidanceSettings) -> Result<Self> {
        if route.points.is_empty() {
            return Err(RouteError::EmptyRoute);
        }

        Ok(Self {
            id,
            route,
            current_index: 0,
            engine: InstructionEngine::new(settings),
            started: true,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn last_instruction_state(&self) -> Option<InstructionState> {
        self.engine.last_state()
    }

    pub fn on_fix(&mut self, fix: &Fix) -> Result<NavigationUpdate> {
        if !self.started {
            return Err(RouteError::InvalidState("navigation session has ended".to_string()));
        }

        let position = GeoPoint::from_fix(fix)?;
        let matched = matcher::match_position(&self.route, &position)?;
        self.current_index = matched.closest_index;

        let instruction = self.engine.evaluate(&matched, self.route.points.len());
        let heading_to_route = (matched.off_route_meters > 0.0).then(|| {
            let nearest = &self.route.points[matched.closest_index];
            geo::compass_direction(geo::bearing_degrees(&position, nearest)).to_string()
        });
        debug!(
            "Session {}: index {}, {:.0} m off route, {:.2} km remaining, {}",
            self.id,
            matched.closest_index,
            matched.off_route_meters,
            matched.remaining_distance_km,
            instruction.state
        );

        Ok(NavigationUpdate {
            session_id: self.id,
            position,
            matched,
            instruction,
            heading_to_route,
        })
    }

    pub fn finish(&mut self) {
        self.started = false;
        self.current_index = 0;
        self.engine.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_route(n: usize) -> Arc<Route> {
        let points = (0..n)
            .map(|i| GeoPoint::new(0.0, i as f64 * 0.001, i as i64 * 1_000, None).unwrap())
            .collect();
        Arc::new(Route::new("line", points, 0).unwrap())
    }

    #[test]
    fn test_empty_route_cannot_start() {
        let mut route = (*straight_route(2)).clone();
        route.points.clear();
        assert!(matches!(
            NavigationSession::new(1, Arc::new(route), GuidanceSettings::default()),
            Err(RouteError::EmptyRoute)
        ));
    }

    #[test]
    fn test_session_walks_to_arrival() {
        let route = straight_route(10);
        let mut session =
            NavigationSession::new(7, Arc::clone(&route), GuidanceSettings::default()).unwrap();

        let update = session.on_fix(&Fix::new(0.0, 0.001, 0)).unwrap();
        assert_eq!(update.session_id, 7);
        assert_eq!(update.instruction.state, InstructionState::OnRoute);
        assert!(update.instruction.should_announce);
        assert_eq!(session.current_index(), 1);

        let update = session.on_fix(&Fix::new(0.0, 0.002, 1)).unwrap();
        assert!(!update.instruction.should_announce);

        let update = session.on_fix(&Fix::new(0.01, 0.003, 1)).unwrap();
        assert_eq!(update.instruction.state, InstructionState::OffRoute);
        assert_eq!(update.heading_to_route.as_deref(), Some("South"));

        let update = session.on_fix(&Fix::new(0.0, 0.006, 2)).unwrap();
        assert_eq!(update.instruction.state, InstructionState::Approaching);
        assert!(update.instruction.should_announce);

        let update = session.on_fix(&Fix::new(0.0, 0.009, 3)).unwrap();
        assert!(update.instruction.is_arrived);
        assert_eq!(update.matched.remaining_distance_km, 0.0);
        assert_eq!(route.points.len(), 10);
    }

    #[test]
    fn test_index_can_move_backwards() {
        let mut session =
            NavigationSession::new(1, straight_route(10), GuidanceSettings::default()).unwrap();
        session.on_fix(&Fix::new(0.0, 0.005, 0)).unwrap();
        session.on_fix(&Fix::new(0.0, 0.002, 1)).unwrap();
        assert_eq!(session.current_index(), 2);
    }

    #[test]
    fn test_invalid_fix_leaves_state_untouched() {
        let mut session =
            NavigationSession::new(1, straight_route(10), GuidanceSettings::default()).unwrap();
        session.on_fix(&Fix::new(0.0, 0.003, 0)).unwrap();
        assert!(matches!(
            session.on_fix(&Fix::new(0.0, 200.0, 1)),
            Err(RouteError::InvalidFix(_))
        ));
        assert_eq!(session.current_index(), 3);
        assert_eq!(session.last_instruction_state(), Some(InstructionState::OnRoute));
    }

    #[test]
    fn test_finished_session_rejects_fixes() {
        let mut session =
            NavigationSession::new(1, straight_route(3), GuidanceSettings::default()).unwrap();
        session.finish();
        assert!(!session.is_started());
        assert!(matches!(
            session.on_fix(&Fix::new(0.0, 0.0, 0)),
            Err(RouteError::InvalidState(_))
        ));
    }
}
