// src/error.rs
//! Error types for route recording and guidance

use std::fmt;

pub type Result<T> = std::result::Result<T, RouteError>;

#[derive(Debug)]
pub enum RouteError {
    /// Fix with missing or out-of-range coordinates
    InvalidFix(String),
    /// Operation invoked in the wrong recorder or session state
    InvalidState(String),
    /// Navigation or save requested on a route with no points
    EmptyRoute,
    /// Route id absent from the store
    NotFound(i64),
    /// Store read/write failure
    Persistence(String),
    Io(std::io::Error),
    Serial(tokio_serial::Error),
    Json(serde_json::Error),
    Connection(String),
    Parse(String),
    Other(String),
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::InvalidFix(msg) => write!(f, "Invalid fix: {}", msg),
            RouteError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            RouteError::EmptyRoute => write!(f, "Route has no points"),
            RouteError::NotFound(id) => write!(f, "Route {} not found", id),
            RouteError::Persistence(msg) => write!(f, "Persistence error: {}", msg),
            RouteError::Io(e) => write!(f, "IO error: {}", e),
            RouteError::Serial(e) => write!(f, "Serial error: {}", e),
            RouteError::Json(e) => write!(f, "JSON error: {}", e),
            RouteError::Connection(msg) => write!(f, "Connection error: {}", msg),
            RouteError::Parse(msg) => write!(f, "Parse error: {}", msg),
            RouteError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for RouteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouteError::Io(e) => Some(e),
            RouteError::Serial(e) => Some(e),
            RouteError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RouteError {
    fn from(error: std::io::Error) -> Self {
        RouteError::Io(error)
    }
}

impl From<tokio_serial::Error> for RouteError {
    fn from(error: tokio_serial::Error) -> Self {
        RouteError::Serial(error)
    }
}

impl From<serde_json::Error> for RouteError {
    fn from(error: serde_json::Error) -> Self {
        RouteError::Json(error)
    }
}
