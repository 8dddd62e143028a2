//! Configuration system using Figment.
//!
//! Strongly-typed configuration for the microscope rig, loaded from:
//! 1. a TOML file (base configuration)
//! 2. environment variables (prefixed with `LUMISCOPE_`)
//!
//! # Environment Variable Overrides
//!
//! Sections and fields are separated by a double underscore:
//!
//! ```text
//! LUMISCOPE_APPLICATION__LOG_LEVEL=debug
//! LUMISCOPE_LASER__PORT=/dev/ttyUSB3
//! LUMISCOPE_CAMERA__FRAME_TIMEOUT_MS=2000
//! ```
//!
//! Every field has a default, so `Settings::default()` is a working
//! configuration for a rig with the laser controller on the default port.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, ScopeError};

/// Serial port the laser controller is expected on when none is configured.
pub const DEFAULT_SERIAL_PORT: &str = "/dev/ttyUSB0";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Application settings
    #[serde(default)]
    pub application: ApplicationSettings,
    /// Laser controller link settings
    #[serde(default)]
    pub laser: LaserSettings,
    /// Camera acquisition settings
    #[serde(default)]
    pub camera: CameraSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            application: ApplicationSettings::default(),
            laser: LaserSettings::default(),
            camera: CameraSettings::default(),
        }
    }
}

/// Application-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSettings {
    /// Application name
    #[serde(default = "default_app_name")]
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            log_level: default_log_level(),
        }
    }
}

/// Laser controller serial link configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaserSettings {
    /// Serial port (e.g., "/dev/ttyUSB0", "COM3")
    #[serde(default = "default_laser_port")]
    pub port: String,
    /// Baud rate
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

impl Default for LaserSettings {
    fn default() -> Self {
        Self {
            port: default_laser_port(),
            baud_rate: default_baud_rate(),
        }
    }
}

/// Camera acquisition configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraSettings {
    /// Number of frame buffers the device should allocate
    #[serde(default = "default_buffer_depth")]
    pub buffer_depth: u32,
    /// Frames requested per grab session
    #[serde(default = "default_frame_count")]
    pub frame_count: usize,
    /// Per-frame wait timeout in milliseconds
    #[serde(default = "default_frame_timeout")]
    pub frame_timeout_ms: u64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            buffer_depth: default_buffer_depth(),
            frame_count: default_frame_count(),
            frame_timeout_ms: default_frame_timeout(),
        }
    }
}

fn default_app_name() -> String {
    "lumiscope".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_laser_port() -> String {
    DEFAULT_SERIAL_PORT.to_string()
}

fn default_baud_rate() -> u32 {
    115200
}

fn default_buffer_depth() -> u32 {
    5
}

fn default_frame_count() -> usize {
    1
}

fn default_frame_timeout() -> u64 {
    5000
}

impl Settings {
    /// Load configuration from `lumiscope.toml` and environment variables.
    ///
    /// Precedence (highest to lowest): environment variables with the
    /// `LUMISCOPE_` prefix, then the TOML file, then built-in defaults.
    /// The extracted configuration is validated before being returned.
    pub fn load() -> Result<Self> {
        Self::load_from("lumiscope.toml")
    }

    /// Load configuration from a specific TOML file path.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings: Self = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("LUMISCOPE_").split("__"))
            .extract()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration after loading.
    ///
    /// Checks that the log level is recognized, the serial link parameters are
    /// usable, and the camera acquisition parameters are non-degenerate.
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.as_str()) {
            return Err(ScopeError::Configuration(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.laser.port.is_empty() {
            return Err(ScopeError::Configuration(
                "Laser serial port cannot be empty".to_string(),
            ));
        }

        if self.laser.baud_rate == 0 {
            return Err(ScopeError::Configuration(
                "Laser baud_rate must be > 0".to_string(),
            ));
        }

        if self.camera.buffer_depth == 0 {
            return Err(ScopeError::Configuration(
                "Camera buffer_depth must be > 0".to_string(),
            ));
        }

        if self.camera.frame_count == 0 {
            return Err(ScopeError::Configuration(
                "Camera frame_count must be > 0".to_string(),
            ));
        }

        if self.camera.frame_timeout_ms == 0 {
            return Err(ScopeError::Configuration(
                "Camera frame_timeout_ms must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}
