//! Laser light source driver.
//!
//! The rig carries four fixed laser lines driven by one controller box on a
//! shared serial link. The controller speaks a Scheme-like text protocol:
//!
//! ```text
//! (param-set! 'laser1:enable #t)\r
//! (param-set! 'laser1:cw #f)\r
//! ```
//!
//! Command text is consumed by the controller firmware and must be reproduced
//! byte-exact, including the apostrophe and the trailing `\r`.
//!
//! Emission pulses are timed on the calling thread: `emit` turns the line on,
//! sleeps for the requested duration, and turns it off again. The sleep is the
//! pulse-width control mechanism, so callers run acquisition sequences
//! serially (enable → emit → grab → disable).

use log::debug;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::adapters::SharedSerial;
use crate::error::{Result, ScopeError};

/// Power assigned to each line by [`initialize_lasers`].
pub const INITIAL_LASER_POWER: f64 = 1.0;

/// The four laser lines of the light source, with their fixed wavelengths.
///
/// The controller firmware addresses lines by the names `laser1`..`laser4`;
/// the wavelength is a physical property of the installed line, not a
/// configurable value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaserLine {
    /// 405 nm violet line (`laser1`)
    Violet,
    /// 488 nm blue line (`laser2`)
    Blue,
    /// 561 nm green line (`laser3`)
    Green,
    /// 640 nm red line (`laser4`)
    Red,
}

impl LaserLine {
    /// All lines in controller order.
    pub const ALL: [LaserLine; 4] = [
        LaserLine::Violet,
        LaserLine::Blue,
        LaserLine::Green,
        LaserLine::Red,
    ];

    /// Name the controller firmware knows this line by.
    pub fn name(self) -> &'static str {
        match self {
            LaserLine::Violet => "laser1",
            LaserLine::Blue => "laser2",
            LaserLine::Green => "laser3",
            LaserLine::Red => "laser4",
        }
    }

    /// Wavelength of the installed line in nanometers.
    pub fn wavelength_nm(self) -> u32 {
        match self {
            LaserLine::Violet => 405,
            LaserLine::Blue => 488,
            LaserLine::Green => 561,
            LaserLine::Red => 640,
        }
    }

    /// Look a line up by its controller name.
    pub fn from_name(name: &str) -> Result<Self> {
        LaserLine::ALL
            .into_iter()
            .find(|line| line.name() == name)
            .ok_or_else(|| {
                ScopeError::Configuration(format!(
                    "Unknown laser '{}'. Must be one of: laser1, laser2, laser3, laser4",
                    name
                ))
            })
    }
}

/// Controller attributes a command can toggle.
#[derive(Debug, Clone, Copy)]
enum LaserAttribute {
    /// Arm/disarm the line.
    Enable,
    /// Continuous-wave output on/off; toggled around an emission pulse.
    Cw,
}

impl LaserAttribute {
    fn as_str(self) -> &'static str {
        match self {
            LaserAttribute::Enable => "enable",
            LaserAttribute::Cw => "cw",
        }
    }
}

/// Driver for one laser line.
///
/// Holds a clone of the shared serial handle; the connection lifecycle is
/// owned by the caller. Enable/disable/emit are stateless passthroughs to the
/// controller; the only mutable driver state is the power setpoint.
pub struct Laser {
    line: LaserLine,
    serial: SharedSerial,
    power: f64,
}

impl Laser {
    /// Create a driver for the line named `name`.
    ///
    /// Fails with [`ScopeError::Configuration`] for an unrecognized name and
    /// with [`ScopeError::Validation`] for an invalid initial power.
    pub fn new(name: &str, serial: SharedSerial, laser_power: f64) -> Result<Self> {
        let line = LaserLine::from_name(name)?;
        validate_power(laser_power)?;

        Ok(Self {
            line,
            serial,
            power: laser_power,
        })
    }

    /// The line this driver controls.
    pub fn line(&self) -> LaserLine {
        self.line
    }

    /// Controller name of this line.
    pub fn name(&self) -> &'static str {
        self.line.name()
    }

    /// Wavelength of this line in nanometers.
    pub fn wavelength_nm(&self) -> u32 {
        self.line.wavelength_nm()
    }

    /// Current power setpoint (percent of full power).
    pub fn power(&self) -> f64 {
        self.power
    }

    /// Set the power setpoint.
    ///
    /// Accepts finite values in `[0, 100]`. On rejection the prior value is
    /// retained and nothing is written to the hardware.
    pub fn set_power(&mut self, value: f64) -> Result<()> {
        validate_power(value)?;
        self.power = value;
        Ok(())
    }

    /// Arm the line. Returns the exact command string sent.
    pub fn enable(&self) -> Result<String> {
        let command = self.command(LaserAttribute::Enable, true);
        self.send(&command)?;
        debug!("{}: enabled", self.name());
        Ok(command)
    }

    /// Disarm the line. Returns the exact command string sent.
    pub fn disable(&self) -> Result<String> {
        let command = self.command(LaserAttribute::Enable, false);
        self.send(&command)?;
        debug!("{}: disabled", self.name());
        Ok(command)
    }

    /// Emit a pulse of the given duration.
    ///
    /// Turns continuous-wave output on, blocks the calling thread for
    /// `duration`, then turns it off. The blocking sleep is the pulse-width
    /// control; elapsed wall-clock time tracks the requested duration to
    /// within about a millisecond. Returns the `(on, off)` command pair.
    pub fn emit(&self, duration: Duration) -> Result<(String, String)> {
        let on = self.command(LaserAttribute::Cw, true);
        self.send(&on)?;

        thread::sleep(duration);

        let off = self.command(LaserAttribute::Cw, false);
        self.send(&off)?;

        debug!("{}: emitted for {:?}", self.name(), duration);
        Ok((on, off))
    }

    /// Format a controller command for this line.
    fn command(&self, attribute: LaserAttribute, on: bool) -> String {
        format!(
            "(param-set! '{}:{} #{})\r",
            self.line.name(),
            attribute.as_str(),
            if on { 't' } else { 'f' }
        )
    }

    fn send(&self, command: &str) -> Result<()> {
        let mut port = self
            .serial
            .lock()
            .map_err(|_| ScopeError::Instrument("serial connection mutex poisoned".to_string()))?;
        port.write_all(command.as_bytes())
    }
}

fn validate_power(value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(ScopeError::Validation(format!(
            "Laser power must be finite, got {}",
            value
        )));
    }
    if !(0.0..=100.0).contains(&value) {
        return Err(ScopeError::Validation(format!(
            "Laser power must be in [0, 100], got {}",
            value
        )));
    }
    Ok(())
}

/// Construct drivers for all four lines, sharing one serial connection.
///
/// Lines are returned in controller order (laser1..laser4), each at
/// [`INITIAL_LASER_POWER`].
pub fn initialize_lasers(serial: &SharedSerial) -> Result<Vec<Laser>> {
    LaserLine::ALL
        .into_iter()
        .map(|line| Laser::new(line.name(), Arc::clone(serial), INITIAL_LASER_POWER))
        .collect()
}
