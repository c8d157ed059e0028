// src/lib.rs
//! Route Guide Library
//!
//! Records GPS paths into routes, stores them, and replays a stored route as
//! debounced turn-by-turn guidance against live position fixes.

pub mod clock;
pub mod config;
pub mod display;
pub mod error;
pub mod geo;
pub mod gps;
pub mod guide;
pub mod instruction;
pub mod matcher;
pub mod navigation;
pub mod recorder;
pub mod route;
pub mod scheduler;
pub mod store;

// Re-export main types for convenience
pub use error::{Result, RouteError};
pub use guide::{GuideEvent, RouteGuide};
pub use instruction::{GuidanceSettings, Instruction, InstructionEngine, InstructionState};
pub use matcher::{match_position, MatchResult};
pub use navigation::{NavigationSession, NavigationUpdate};
pub use recorder::{Recorder, RecordingSnapshot};
pub use route::{Fix, GeoPoint, Route};
pub use store::{FileStore, KeyValueStore, MemoryStore, RouteStore};
