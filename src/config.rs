// src/config.rs
//! Configuration stored as JSON under the user's config directory

use crate::{
    error::{Result, RouteError},
    gps::{GpsdSource, PositionSource, SerialSource},
    instruction::GuidanceSettings,
    store::FileStore,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuideConfig {
    pub source_type: String, // "gpsd", "serial"
    pub serial_port: Option<String>,
    pub serial_baudrate: Option<u32>,
    pub gpsd_host: Option<String>,
    pub gpsd_port: Option<u16>,
    /// Directory for saved routes; defaults to the platform data directory
    pub storage_dir: Option<PathBuf>,
    pub guidance: GuidanceSettings,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            source_type: "gpsd".to_string(),
            serial_port: None,
            serial_baudrate: Some(9600),
            gpsd_host: Some("localhost".to_string()),
            gpsd_port: Some(2947),
            storage_dir: None,
            guidance: GuidanceSettings::default(),
        }
    }
}

impl GuideConfig {
    /// Load configuration, falling back to defaults when no file exists
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)
            .map_err(|e| RouteError::Other(format!("Failed to read config file: {}", e)))?;

        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents)
            .map_err(|e| RouteError::Other(format!("Failed to parse config file: {}", e)))
    }

    /// Save configuration, creating the config directory if needed
    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| RouteError::Other(format!("Failed to create config directory: {}", e)))?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| RouteError::Other(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&config_path, contents)
            .map_err(|e| RouteError::Other(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// `$HOME/.config/route-guide/config.json`
    pub fn get_config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| RouteError::Other("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home).join(".config").join("route-guide").join("config.json"))
    }

    pub fn storage_dir(&self) -> Result<PathBuf> {
        match &self.storage_dir {
            Some(dir) => Ok(dir.clone()),
            None => FileStore::default_dir(),
        }
    }

    /// Build the configured live position source
    pub fn position_source(&self) -> Result<Box<dyn PositionSource>> {
        match self.source_type.as_str() {
            "gpsd" => Ok(Box::new(GpsdSource {
                host: self.gpsd_host.clone().unwrap_or_else(|| "localhost".to_string()),
                port: self.gpsd_port.unwrap_or(2947),
            })),
            "serial" => {
                let port = self.serial_port.clone().ok_or_else(|| {
                    RouteError::Other("serial source selected but no serial_port configured".to_string())
                })?;
                Ok(Box::new(SerialSource {
                    port,
                    baudrate: self.serial_baudrate.unwrap_or(9600),
                }))
            }
            other => Err(RouteError::Other(format!("Unknown source type: {}", other))),
        }
    }

    /// Update serial port settings
    pub fn update_serial(&mut self, port: String, baudrate: u32) {
        self.source_type = "serial".to_string();
        self.serial_port = Some(port);
        self.serial_baudrate = Some(baudrate);
    }

    /// Update gpsd settings
    pub fn update_gpsd(&mut self, host: String, port: u16) {
        self.source_type = "gpsd".to_string();
        self.gpsd_host = Some(host);
        self.gpsd_port = Some(port);
    }
}
