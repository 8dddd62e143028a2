//! Custom error types for the instrument control layer.
//!
//! This module defines the primary error type, `ScopeError`, for the whole crate.
//! Using the `thiserror` crate, it provides a centralized and consistent way to
//! handle the different failure modes of the rig:
//!
//! - **`Validation`**: a caller-supplied value failed an invariant check, such as
//!   a laser power outside `[0, 100]` or a non-finite float. The driver state is
//!   unchanged and the caller may retry with a valid value.
//! - **`Configuration`**: semantically invalid configuration, such as an unknown
//!   laser name or a bad log level. Fatal to the call that produced it.
//! - **`DeviceNotFound`**: no serial port or camera device could be located.
//! - **`Timeout`**: a frame was not delivered within the per-frame grab timeout.
//!   This is the only per-frame failure that propagates out of a grab session.
//! - **`Io`** / **`Serial`**: wrapped transport errors from `std::io` and the
//!   `serialport` crate.
//!
//! By using `#[from]`, `ScopeError` can be seamlessly created from underlying
//! error types, simplifying error handling throughout the crate with `?`.

use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type Result<T> = std::result::Result<T, ScopeError>;

/// Crate-wide error type.
#[derive(Error, Debug)]
pub enum ScopeError {
    /// A caller-supplied value failed an invariant check.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Semantically invalid configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Failed to extract configuration from file or environment.
    #[error("Configuration load error: {0}")]
    ConfigLoad(#[from] figment::Error),

    /// A required device could not be located.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// A frame was not delivered within the per-frame grab timeout.
    #[error("Frame grab timed out after {0} ms")]
    Timeout(u64),

    /// General instrument failure (poisoned lock, unexpected device state).
    #[error("Instrument error: {0}")]
    Instrument(String),

    /// I/O error from the underlying transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port error.
    #[cfg(feature = "instrument_serial")]
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScopeError::Validation("laser power out of range".to_string());
        assert_eq!(err.to_string(), "Validation error: laser power out of range");
    }

    #[test]
    fn test_timeout_display() {
        let err = ScopeError::Timeout(5000);
        assert_eq!(err.to_string(), "Frame grab timed out after 5000 ms");
    }

    #[test]
    fn test_device_not_found_display() {
        let err = ScopeError::DeviceNotFound("no serial ports available".into());
        assert!(err.to_string().contains("Device not found"));
    }
}
