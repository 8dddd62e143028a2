//! Mock adapters for testing without hardware.
//!
//! `MockSerial` records every command written to it so tests can assert the
//! exact bytes that would have gone over the wire. `MockFrameGrabber` plays
//! back a scripted sequence of grab outcomes and records the device lifecycle
//! (open/grab/close) so tests can check the grab-session state machine.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::adapters::{SerialConnection, SharedSerial};
use crate::error::{Result, ScopeError};
use crate::instrument::camera::{Frame, FrameGrabber, GrabAttempt};

/// Test double for the laser controller serial link.
#[derive(Debug, Default)]
pub struct MockSerial {
    /// Every write, in order, as raw bytes.
    pub writes: Vec<Vec<u8>>,
    /// Queued responses returned one per read call.
    pub responses: VecDeque<Vec<u8>>,
}

impl MockSerial {
    /// Create an empty mock connection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded writes decoded as UTF-8 strings.
    pub fn written_commands(&self) -> Vec<String> {
        self.writes
            .iter()
            .map(|w| String::from_utf8_lossy(w).into_owned())
            .collect()
    }

    /// Create a mock and a [`SharedSerial`] handle to the same instance.
    ///
    /// The first element stays with the test for inspection; the second is
    /// handed to the drivers under test.
    pub fn shared() -> (Arc<Mutex<MockSerial>>, SharedSerial) {
        let mock = Arc::new(Mutex::new(MockSerial::new()));
        let shared: SharedSerial = mock.clone();
        (mock, shared)
    }
}

impl SerialConnection for MockSerial {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.writes.push(data.to_vec());
        Ok(())
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.responses.pop_front() {
            Some(response) => {
                let n = response.len().min(buf.len());
                buf[..n].copy_from_slice(&response[..n]);
                Ok(n)
            }
            None => Ok(0),
        }
    }
}

/// One step in a [`MockFrameGrabber`] script.
#[derive(Debug, Clone)]
pub enum MockGrab {
    /// Deliver a frame successfully.
    Frame(Frame),
    /// Report a per-frame device error (code, description).
    Error(i32, String),
    /// Exceed the per-frame timeout.
    Timeout,
}

/// Device lifecycle events recorded by [`MockFrameGrabber`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    /// Device opened with the given buffer depth.
    Opened(u32),
    /// One frame requested.
    Grabbed,
    /// Device closed.
    Closed,
}

/// Test double for the vendor frame-grabber boundary.
pub struct MockFrameGrabber {
    script: VecDeque<MockGrab>,
    events: Arc<Mutex<Vec<DeviceEvent>>>,
    open: bool,
}

impl MockFrameGrabber {
    /// Create a grabber that plays back `script`, one entry per grab call.
    /// Once the script is exhausted, further grabs report a generic error.
    pub fn new(script: Vec<MockGrab>) -> Self {
        Self {
            script: script.into(),
            events: Arc::new(Mutex::new(Vec::new())),
            open: false,
        }
    }

    /// Handle to the recorded lifecycle events, valid after the grabber has
    /// been moved into a `Camera`.
    pub fn event_log(&self) -> Arc<Mutex<Vec<DeviceEvent>>> {
        Arc::clone(&self.events)
    }

    fn record(&self, event: DeviceEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl FrameGrabber for MockFrameGrabber {
    fn open(&mut self, buffer_depth: u32) -> Result<()> {
        self.open = true;
        self.record(DeviceEvent::Opened(buffer_depth));
        Ok(())
    }

    fn grab_next(&mut self, timeout: Duration) -> Result<GrabAttempt> {
        if !self.open {
            return Err(ScopeError::Instrument(
                "grab on a closed device".to_string(),
            ));
        }
        self.record(DeviceEvent::Grabbed);

        match self.script.pop_front() {
            Some(MockGrab::Frame(frame)) => Ok(GrabAttempt::Frame(frame)),
            Some(MockGrab::Error(code, description)) => {
                Ok(GrabAttempt::Failed { code, description })
            }
            Some(MockGrab::Timeout) => Err(ScopeError::Timeout(timeout.as_millis() as u64)),
            None => Ok(GrabAttempt::Failed {
                code: -1,
                description: "script exhausted".to_string(),
            }),
        }
    }

    fn close(&mut self) {
        self.open = false;
        self.record(DeviceEvent::Closed);
    }
}
