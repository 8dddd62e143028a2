//! Serial adapter for the laser controller RS-232 link.
//!
//! This adapter wraps the `serialport` crate and provides port discovery with
//! a preferred-port fallback: the configured default port is used when present,
//! otherwise the first enumerable port is taken, and an empty port list is a
//! [`ScopeError::DeviceNotFound`].

use log::{debug, info};
use once_cell::sync::Lazy;
use serialport::SerialPort;
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use crate::adapters::{share, SerialConnection, SharedSerial};
use crate::config::LaserSettings;
use crate::error::{Result, ScopeError};

/// Port names enumerated once at first use.
///
/// The controller link does not hot-plug during a session, so one enumeration
/// at startup matches how the rig is operated.
static AVAILABLE_PORT_NAMES: Lazy<Vec<String>> = Lazy::new(|| {
    serialport::available_ports()
        .map(|ports| ports.into_iter().map(|p| p.port_name).collect())
        .unwrap_or_default()
});

/// Names of the serial ports currently available on this machine.
pub fn available_port_names() -> &'static [String] {
    &AVAILABLE_PORT_NAMES
}

/// Serial connection backed by a real port.
pub struct SerialPortConnection {
    port_name: String,
    port: Box<dyn SerialPort>,
}

impl SerialPortConnection {
    /// Open `port_name` at `baud_rate`.
    ///
    /// A short internal read timeout is set so that [`read_available`]
    /// returns promptly when the device has nothing to say.
    ///
    /// [`read_available`]: SerialConnection::read_available
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(100))
            .open()?;

        debug!("Serial port '{}' opened at {} baud", port_name, baud_rate);
        Ok(Self {
            port_name: port_name.to_string(),
            port,
        })
    }

    /// Name of the underlying port.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl SerialConnection for SerialPortConnection {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(())
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

/// Open the laser controller link, preferring the configured port.
///
/// Falls back to the first available port when the preferred one is not
/// enumerable. Fails with [`ScopeError::DeviceNotFound`] when the machine has
/// no serial ports at all.
pub fn connect_serial_port(settings: &LaserSettings) -> Result<SharedSerial> {
    let names = available_port_names();

    let port_name = if names.iter().any(|n| n == &settings.port) {
        settings.port.as_str()
    } else {
        names
            .first()
            .map(String::as_str)
            .ok_or_else(|| ScopeError::DeviceNotFound("no serial ports available".to_string()))?
    };

    if port_name != settings.port {
        info!(
            "Preferred port '{}' not found, using '{}'",
            settings.port, port_name
        );
    }

    let connection = SerialPortConnection::open(port_name, settings.baud_rate)?;
    Ok(share(connection))
}
