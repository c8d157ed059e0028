// src/gps/gpsd.rs
//! GPSD client implementation

use super::data::GpsData;
use crate::error::{Result, RouteError};
use chrono::{DateTime, Utc};
use log::info;
use serde::Deserialize;
use std::collections::HashMap;
use tokio::{
    io::{AsyncWriteExt, BufReader},
    net::TcpStream,
};

#[derive(Debug, Deserialize)]
struct GpsdMessage {
    class: String,
    #[serde(flatten)]
    data: HashMap<String, serde_json::Value>,
}

/// Connect to a gpsd daemon and return a stream reader
pub async fn connect_gpsd(host: &str, port: u16) -> Result<BufReader<TcpStream>> {
    let mut stream = TcpStream::connect(format!("{}:{}", host, port))
        .await
        .map_err(|e| RouteError::Connection(format!("Failed to connect to gpsd at {}:{}: {}", host, port, e)))?;

    // Send WATCH command to start receiving JSON data
    let watch_cmd = "?WATCH={\"enable\":true,\"json\":true}\n";
    stream
        .write_all(watch_cmd.as_bytes())
        .await
        .map_err(|e| RouteError::Connection(format!("Failed to send WATCH command: {}", e)))?;

    Ok(BufReader::new(stream))
}

/// Parse a single line of gpsd JSON data.
///
/// Returns true when the line was a TPV report carrying a usable position.
pub fn parse_gpsd_json(data: &mut GpsData, line: &str) -> Result<bool> {
    let msg: GpsdMessage = serde_json::from_str(line)
        .map_err(|e| RouteError::Parse(format!("Failed to parse gpsd JSON: {}", e)))?;

    let has_position = match msg.class.as_str() {
        "TPV" => {
            parse_tpv_message(data, &msg.data);
            data.has_fix()
        }
        "VERSION" => {
            if let Some(version) = msg.data.get("release").and_then(|v| v.as_str()) {
                info!("Connected to gpsd version: {}", version);
            }
            false
        }
        "DEVICES" => {
            if let Some(devices) = msg.data.get("devices").and_then(|v| v.as_array()) {
                info!("gpsd managing {} device(s)", devices.len());
            }
            false
        }
        // SKY and the rest carry nothing a route needs
        _ => false,
    };

    Ok(has_position)
}

/// Parse TPV (Time Position Velocity) message
fn parse_tpv_message(data: &mut GpsData, msg_data: &HashMap<String, serde_json::Value>) {
    let get = |key: &str| msg_data.get(key).and_then(|v| v.as_f64());

    // A TPV without coordinates means the receiver lost its fix
    data.latitude = get("lat");
    data.longitude = get("lon");

    if let Some(mode) = msg_data.get("mode").and_then(|v| v.as_u64()) {
        data.mode = Some(mode as u8);
    }

    // Prefer the horizontal error estimate, fall back to the larger axis
    data.accuracy = get("eph").or_else(|| match (get("epx"), get("epy")) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, y) => x.or(y),
    });

    if let Some(time) = msg_data
        .get("time")
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
    {
        data.timestamp = Some(time.with_timezone(&Utc));
    }
}
