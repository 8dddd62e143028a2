//! Instrument drivers for the microscope rig.
//!
//! Two independent peripherals: the four-line laser light source (serial text
//! protocol) and the fluorescence camera (vendor frame-grabber boundary).

pub mod camera;
pub mod laser;

pub use camera::{Camera, Frame, FrameGrabber, GrabAttempt};
pub use laser::{initialize_lasers, Laser, LaserLine};
