// src/gps/mod.rs
//! Live position sources and receiver protocol parsing

pub mod data;
pub mod gpsd;
pub mod nmea;
pub mod source;

pub use data::GpsData;
pub use source::{
    ErrorCallback, FixCallback, GpsdSource, PositionSource, ReplaySource, SerialSource,
    Subscription,
};
