//! Hardware adapter implementations.
//!
//! This module contains the low-level I/O abstractions the instrument drivers
//! sit on: a byte-oriented serial connection for the laser controller link,
//! and mock implementations used by the test suite.
//!
//! The serial connection is shared: all four laser lines talk over one port,
//! so the handle is wrapped in `Arc<Mutex<_>>` and each driver holds a clone.
//! Callers are still expected to serialize command sequences themselves;
//! the mutex only guarantees that individual command writes are not interleaved.

pub mod mock;
#[cfg(feature = "instrument_serial")]
pub mod serial;

#[cfg(feature = "instrument_serial")]
pub use serial::{available_port_names, connect_serial_port, SerialPortConnection};
pub use mock::{MockFrameGrabber, MockSerial};

use std::sync::{Arc, Mutex};

use crate::error::Result;

/// Byte-oriented connection to the laser controller.
///
/// The drivers only need "write bytes" and "read whatever is available";
/// framing and command syntax live in the instrument layer.
pub trait SerialConnection: Send {
    /// Write all bytes of a command to the device.
    fn write_all(&mut self, data: &[u8]) -> Result<()>;

    /// Read available bytes into `buf`, returning the number read (0 if none).
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize>;
}

/// Shared handle to one serial connection, cloned into each laser driver.
pub type SharedSerial = Arc<Mutex<dyn SerialConnection>>;

/// Wrap a concrete connection into a [`SharedSerial`] handle.
pub fn share<C: SerialConnection + 'static>(connection: C) -> SharedSerial {
    Arc::new(Mutex::new(connection))
}
