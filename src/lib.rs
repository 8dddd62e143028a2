//! Instrument control layer for a fluorescence light-microscopy rig.
//!
//! This library drives the two peripherals of the light-microscopy side of the
//! rig: a four-line laser light source spoken to over a serial text protocol,
//! and a fluorescence camera wrapped behind a vendor frame-grabber boundary.
//! Both drivers are synchronous and single-threaded; acquisition sequences
//! (enable laser → emit → grab → disable) run serially on the calling thread.

pub mod adapters;
pub mod config;
pub mod error;
pub mod instrument;

pub use error::{Result, ScopeError};
