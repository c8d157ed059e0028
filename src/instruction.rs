// src/instruction.rs
//! Debounced guidance instructions derived from match results

use crate::matcher::MatchResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Thresholds for choosing an instruction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuidanceSettings {
    /// Distance from the nearest route point beyond which the traveler is off route
    pub off_route_threshold_m: f64,
    /// Number of final route points that count as approaching the destination
    pub approach_window: usize,
    /// Delay between the arrival announcement and the automatic stop
    pub arrival_grace_secs: u64,
}

impl Default for GuidanceSettings {
    fn default() -> Self {
        Self {
            off_route_threshold_m: 50.0,
            approach_window: 5,
            arrival_grace_secs: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstructionState {
    OffRoute,
    Arrived,
    Approaching,
    OnRoute,
}

impl fmt::Display for InstructionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            InstructionState::OffRoute => "off-route",
            InstructionState::Arrived => "arrived",
            InstructionState::Approaching => "approaching",
            InstructionState::OnRoute => "continue",
        };
        f.write_str(tag)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instruction {
    pub state: InstructionState,
    pub text: String,
    pub should_announce: bool,
    pub is_arrived: bool,
}

/// Chooses an instruction per fix and decides whether it should be spoken.
///
/// An instruction is announced only when its state differs from the last
/// state seen, so an unchanged state is not repeated on every fix.
#[derive(Debug, Clone, Default)]
pub struct InstructionEngine {
    settings: GuidanceSettings,
    last_state: Option<InstructionState>,
}

impl InstructionEngine {
    pub fn new(settings: GuidanceSettings) -> Self {
        Self {
            settings,
            last_state: None,
        }
    }

    pub fn last_state(&self) -> Option<InstructionState> {
        self.last_state
    }

    pub fn reset(&mut self) {
        self.last_state = None;
    }

    /// Classify a match. Off route takes priority over nearing the destination.
    pub fn classify(&self, result: &MatchResult, route_len: usize) -> InstructionState {
        let last_index = route_len.saturating_sub(1);
        let approach_start = last_index.saturating_sub(self.settings.approach_window.saturating_sub(1));

        if result.off_route_meters > self.settings.off_route_threshold_m {
            InstructionState::OffRoute
        } else if result.closest_index >= last_index {
            InstructionState::Arrived
        } else if result.closest_index >= approach_start {
            InstructionState::Approaching
        } else {
            InstructionState::OnRoute
        }
    }

    pub fn evaluate(&mut self, result: &MatchResult, route_len: usize) -> Instruction {
        let state = self.classify(result, route_len);
        let should_announce = self.last_state != Some(state);
        self.last_state = Some(state);

        Instruction {
            state,
            text: instruction_text(state, result.off_route_meters),
            should_announce,
            is_arrived: state == InstructionState::Arrived,
        }
    }
}

pub fn instruction_text(state: InstructionState, off_route_meters: f64) -> String {
    match state {
        InstructionState::OffRoute => format!(
            "You are {} meters off route. Return to the route.",
            off_route_meters.round() as i64
        ),
        InstructionState::Arrived => "You have arrived at your destination!".to_string(),
        InstructionState::Approaching => "You are approaching your destination.".to_string(),
        InstructionState::OnRoute => "Continue along the route.".to_string(),
    }
}
