//! Fluorescence camera driver.
//!
//! The vendor SDK is an opaque collaborator hidden behind the [`FrameGrabber`]
//! trait: enumerate-and-bind happens in the backend that constructs the
//! grabber (binding to the first detected device, or failing with
//! [`ScopeError::DeviceNotFound`](crate::error::ScopeError::DeviceNotFound)
//! when none is present), and the driver only needs open, grab-with-timeout
//! and close.
//!
//! A grab session is one full `open → acquire N frames → close` cycle. The
//! device is never left open on exit, whatever the per-frame outcomes were.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::time::Duration;

use crate::config::CameraSettings;
use crate::error::{Result, ScopeError};

/// One frame of pixel data with minimal acquisition metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major pixel values.
    pub pixels: Vec<u16>,
    /// Retrieval time.
    pub timestamp: DateTime<Utc>,
}

impl Frame {
    /// Create a frame stamped with the current time.
    pub fn new(width: u32, height: u32, pixels: Vec<u16>) -> Self {
        Self {
            width,
            height,
            pixels,
            timestamp: Utc::now(),
        }
    }

    /// The "no frame ever succeeded" value: zero-sized, no pixels.
    pub fn empty() -> Self {
        Self::new(0, 0, Vec::new())
    }

    /// Whether this frame holds any pixel data.
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// Outcome of one frame request that completed within the timeout.
#[derive(Debug, Clone)]
pub enum GrabAttempt {
    /// The frame was retrieved.
    Frame(Frame),
    /// The device reported an error for this frame.
    Failed {
        /// Vendor error code.
        code: i32,
        /// Vendor error description.
        description: String,
    },
}

/// Vendor frame-grabber boundary.
///
/// Implementations wrap a concrete SDK (or a test double) bound to one
/// physical device. `grab_next` blocks the calling thread until a result is
/// available or `timeout` elapses; exceeding the timeout is an `Err`, while a
/// device-reported frame error is an `Ok(GrabAttempt::Failed { .. })`.
pub trait FrameGrabber: Send {
    /// Open the device with `buffer_depth` frame buffers allocated.
    fn open(&mut self, buffer_depth: u32) -> Result<()>;

    /// Request the next frame, waiting at most `timeout`.
    fn grab_next(&mut self, timeout: Duration) -> Result<GrabAttempt>;

    /// Close the device. Infallible: the driver calls this on every exit path.
    fn close(&mut self);
}

/// Driver for the fluorescence camera.
///
/// Owns its grabber. Each [`grab`](Camera::grab) call runs one full session
/// and stores the last successfully retrieved frame; earlier frames of a
/// multi-frame session are overwritten.
pub struct Camera {
    grabber: Box<dyn FrameGrabber>,
    buffer_depth: u32,
    frame_count: usize,
    frame_timeout: Duration,
    image: Frame,
}

impl Camera {
    /// Create a driver with default acquisition settings
    /// (5 buffers, 1 frame per grab, 5000 ms per-frame timeout).
    pub fn new(grabber: Box<dyn FrameGrabber>) -> Self {
        Self::with_settings(grabber, &CameraSettings::default())
    }

    /// Create a driver with explicit acquisition settings.
    pub fn with_settings(grabber: Box<dyn FrameGrabber>, settings: &CameraSettings) -> Self {
        Self {
            grabber,
            buffer_depth: settings.buffer_depth,
            frame_count: settings.frame_count,
            frame_timeout: Duration::from_millis(settings.frame_timeout_ms),
            image: Frame::empty(),
        }
    }

    /// Run one grab session and return the retrieved frame.
    ///
    /// Opens the device, requests up to `frame_count` frames, closes the
    /// device, and returns the last successfully retrieved frame — an empty
    /// frame when every attempt failed, which is not an error.
    ///
    /// Per-frame device errors are logged and the session continues; a
    /// per-frame timeout closes the device and propagates
    /// [`ScopeError::Timeout`](crate::error::ScopeError::Timeout).
    pub fn grab(&mut self) -> Result<&Frame> {
        self.grabber.open(self.buffer_depth)?;
        self.image = Frame::empty();

        for attempt in 0..self.frame_count {
            match self.grabber.grab_next(self.frame_timeout) {
                Ok(GrabAttempt::Frame(frame)) => {
                    debug!(
                        "Frame {}/{} retrieved ({}x{})",
                        attempt + 1,
                        self.frame_count,
                        frame.width,
                        frame.height
                    );
                    self.image = frame;
                }
                Ok(GrabAttempt::Failed { code, description }) => {
                    warn!(
                        "Frame {}/{} failed: {} (code {})",
                        attempt + 1,
                        self.frame_count,
                        description,
                        code
                    );
                }
                Err(e) => {
                    self.grabber.close();
                    return Err(e);
                }
            }
        }

        self.grabber.close();
        Ok(&self.image)
    }

    /// The most recently retrieved frame; empty before the first successful
    /// grab.
    pub fn image(&self) -> &Frame {
        &self.image
    }

    /// Frames requested per grab session.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Change the number of frames requested per grab session.
    ///
    /// Zero is rejected with the same configuration error as
    /// [`Settings::validate`](crate::config::Settings::validate), leaving the
    /// current count unchanged.
    pub fn set_frame_count(&mut self, count: usize) -> Result<()> {
        if count == 0 {
            return Err(ScopeError::Configuration(
                "Camera frame_count must be > 0".to_string(),
            ));
        }
        self.frame_count = count;
        Ok(())
    }

    /// Number of frame buffers the device allocates when opened.
    pub fn buffer_depth(&self) -> u32 {
        self.buffer_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{DeviceEvent, MockFrameGrabber, MockGrab};
    use crate::error::ScopeError;

    fn frame(value: u16) -> Frame {
        Frame::new(2, 2, vec![value; 4])
    }

    #[test]
    fn test_grab_returns_frame() {
        let grabber = MockFrameGrabber::new(vec![MockGrab::Frame(frame(7))]);
        let mut camera = Camera::new(Box::new(grabber));

        let image = camera.grab().unwrap();
        assert_eq!(image.pixels, vec![7; 4]);
    }

    #[test]
    fn test_grab_with_no_successful_frame_returns_empty() {
        let grabber = MockFrameGrabber::new(vec![MockGrab::Error(42, "underrun".to_string())]);
        let mut camera = Camera::new(Box::new(grabber));

        let image = camera.grab().unwrap();
        assert!(image.is_empty());
    }

    #[test]
    fn test_multi_frame_grab_keeps_last_frame() {
        let grabber = MockFrameGrabber::new(vec![
            MockGrab::Frame(frame(1)),
            MockGrab::Frame(frame(2)),
            MockGrab::Frame(frame(3)),
        ]);
        let mut settings = CameraSettings::default();
        settings.frame_count = 3;
        let mut camera = Camera::with_settings(Box::new(grabber), &settings);

        let image = camera.grab().unwrap();
        assert_eq!(image.pixels, vec![3; 4]);
    }

    #[test]
    fn test_per_frame_error_does_not_abort_session() {
        let grabber = MockFrameGrabber::new(vec![
            MockGrab::Frame(frame(1)),
            MockGrab::Error(13, "bad transfer".to_string()),
        ]);
        let mut settings = CameraSettings::default();
        settings.frame_count = 2;
        let mut camera = Camera::with_settings(Box::new(grabber), &settings);

        // Last *successful* frame survives the trailing error
        let image = camera.grab().unwrap();
        assert_eq!(image.pixels, vec![1; 4]);
    }

    #[test]
    fn test_timeout_propagates() {
        let grabber = MockFrameGrabber::new(vec![MockGrab::Timeout]);
        let mut camera = Camera::new(Box::new(grabber));

        let result = camera.grab();
        assert!(matches!(result, Err(ScopeError::Timeout(_))));
    }

    #[test]
    fn test_device_closed_after_timeout() {
        let grabber = MockFrameGrabber::new(vec![MockGrab::Timeout]);
        let events = grabber.event_log();
        let mut camera = Camera::new(Box::new(grabber));

        let _ = camera.grab();

        let log = events.lock().unwrap();
        assert_eq!(log.last(), Some(&DeviceEvent::Closed));
    }

    #[test]
    fn test_grab_session_state_machine() {
        let grabber = MockFrameGrabber::new(vec![MockGrab::Frame(frame(1))]);
        let events = grabber.event_log();
        let mut camera = Camera::new(Box::new(grabber));

        camera.grab().unwrap();
        camera.grab().unwrap();

        let log = events.lock().unwrap();
        assert_eq!(
            *log,
            vec![
                DeviceEvent::Opened(5),
                DeviceEvent::Grabbed,
                DeviceEvent::Closed,
                DeviceEvent::Opened(5),
                DeviceEvent::Grabbed,
                DeviceEvent::Closed,
            ]
        );
    }

    #[test]
    fn test_image_empty_before_first_grab() {
        let grabber = MockFrameGrabber::new(vec![]);
        let camera = Camera::new(Box::new(grabber));
        assert!(camera.image().is_empty());
    }

    #[test]
    fn test_set_frame_count_rejects_zero() {
        let grabber = MockFrameGrabber::new(vec![]);
        let mut camera = Camera::new(Box::new(grabber));

        let result = camera.set_frame_count(0);
        assert!(matches!(result, Err(ScopeError::Configuration(_))));
        assert_eq!(camera.frame_count(), 1);

        camera.set_frame_count(3).unwrap();
        assert_eq!(camera.frame_count(), 3);
    }

    #[test]
    fn test_default_acquisition_settings() {
        let grabber = MockFrameGrabber::new(vec![]);
        let camera = Camera::new(Box::new(grabber));
        assert_eq!(camera.buffer_depth(), 5);
        assert_eq!(camera.frame_count(), 1);
    }
}
