//! Camera grab-session tests against the mock frame grabber.

use anyhow::Result;

use lumiscope::adapters::mock::{DeviceEvent, MockFrameGrabber, MockGrab};
use lumiscope::config::CameraSettings;
use lumiscope::instrument::camera::{Camera, Frame};
use lumiscope::ScopeError;

fn frame(value: u16) -> Frame {
    Frame::new(4, 4, vec![value; 16])
}

/// Per-frame failures are reported through the `log` facade; route them to the
/// test harness so `RUST_LOG=warn cargo test` shows them.
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn grab_session_opens_with_configured_buffer_depth() -> Result<()> {
    let grabber = MockFrameGrabber::new(vec![MockGrab::Frame(frame(1))]);
    let events = grabber.event_log();
    let mut camera = Camera::new(Box::new(grabber));

    camera.grab()?;

    let log = events.lock().unwrap();
    assert_eq!(log.first(), Some(&DeviceEvent::Opened(5)));
    Ok(())
}

#[test]
fn grab_with_zero_successes_returns_empty_frame() -> Result<()> {
    init_logging();
    let grabber = MockFrameGrabber::new(vec![
        MockGrab::Error(101, "buffer underrun".to_string()),
        MockGrab::Error(102, "transfer failed".to_string()),
    ]);
    let mut settings = CameraSettings::default();
    settings.frame_count = 2;
    let mut camera = Camera::with_settings(Box::new(grabber), &settings);

    let image = camera.grab()?;
    assert!(image.is_empty());
    Ok(())
}

#[test]
fn multi_frame_session_keeps_only_last_successful_frame() -> Result<()> {
    init_logging();
    let grabber = MockFrameGrabber::new(vec![
        MockGrab::Frame(frame(1)),
        MockGrab::Error(55, "dropped".to_string()),
        MockGrab::Frame(frame(9)),
    ]);
    let mut settings = CameraSettings::default();
    settings.frame_count = 3;
    let mut camera = Camera::with_settings(Box::new(grabber), &settings);

    let image = camera.grab()?;
    assert_eq!(image.pixels, vec![9; 16]);
    Ok(())
}

#[test]
fn timeout_propagates_and_device_is_closed() {
    let grabber = MockFrameGrabber::new(vec![MockGrab::Timeout]);
    let events = grabber.event_log();
    let mut camera = Camera::new(Box::new(grabber));

    let result = camera.grab();
    assert!(matches!(result, Err(ScopeError::Timeout(5000))));

    let log = events.lock().unwrap();
    assert_eq!(log.last(), Some(&DeviceEvent::Closed));
}

#[test]
fn sessions_are_reentrant_and_never_leave_the_device_open() -> Result<()> {
    let grabber = MockFrameGrabber::new(vec![
        MockGrab::Frame(frame(1)),
        MockGrab::Error(7, "glitch".to_string()),
        MockGrab::Frame(frame(2)),
    ]);
    let events = grabber.event_log();
    let mut camera = Camera::new(Box::new(grabber));

    camera.grab()?;
    camera.grab()?;
    camera.grab()?;

    let log = events.lock().unwrap();
    let opens = log.iter().filter(|e| matches!(e, DeviceEvent::Opened(_))).count();
    let closes = log.iter().filter(|e| matches!(e, DeviceEvent::Closed)).count();
    assert_eq!(opens, 3);
    assert_eq!(closes, 3);
    assert_eq!(log.last(), Some(&DeviceEvent::Closed));
    Ok(())
}
