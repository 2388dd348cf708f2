//! snapdoc-capture - screen capture backend
//!
//! Wraps `xcap` behind the [`ScreenCapture`] trait from snapdoc-core.
//! Monitor index 0 composites every monitor into one frame at their
//! virtual-desktop offsets; index N >= 1 captures the Nth monitor.

use image::{DynamicImage, RgbaImage};
use snapdoc_core::ScreenCapture;
use thiserror::Error;
use tracing::{debug, info};
use xcap::Monitor;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("no monitors available for capture")]
    NoMonitors,

    #[error("monitor index {index} out of range ({available} available)")]
    MonitorOutOfRange { index: usize, available: usize },

    #[error("capture backend error: {0}")]
    Backend(String),

    #[error("captured an empty frame (missing screen-recording permission?)")]
    EmptyFrame,
}

/// Result type for capture operations.
pub type Result<T> = std::result::Result<T, CaptureError>;

/// Screen capture backed by `xcap`.
///
/// Construction probes the backend: enumerating zero monitors is a
/// configuration error raised eagerly, not a pipeline outcome.
pub struct XcapCapture {
    monitor_count: usize,
}

impl XcapCapture {
    /// Probe the capture backend and fail fast when no monitor can be
    /// captured.
    pub fn probe() -> Result<Self> {
        let monitors = Monitor::all().map_err(|e| CaptureError::Backend(e.to_string()))?;
        if monitors.is_empty() {
            return Err(CaptureError::NoMonitors);
        }
        info!(monitors = monitors.len(), "capture backend ready");
        Ok(Self {
            monitor_count: monitors.len(),
        })
    }

    /// Number of monitors seen at probe time.
    pub fn monitor_count(&self) -> usize {
        self.monitor_count
    }

    fn capture(&self, monitor: usize) -> Result<DynamicImage> {
        let monitors = Monitor::all().map_err(|e| CaptureError::Backend(e.to_string()))?;
        if monitors.is_empty() {
            return Err(CaptureError::NoMonitors);
        }

        let image = if monitor == 0 {
            composite_all(&monitors)?
        } else {
            let selected = monitors
                .get(monitor - 1)
                .ok_or(CaptureError::MonitorOutOfRange {
                    index: monitor,
                    available: monitors.len(),
                })?;
            let frame = selected
                .capture_image()
                .map_err(|e| CaptureError::Backend(e.to_string()))?;
            DynamicImage::ImageRgba8(frame)
        };

        if image.width() == 0 || image.height() == 0 {
            return Err(CaptureError::EmptyFrame);
        }
        debug!(
            width = image.width(),
            height = image.height(),
            monitor,
            "captured frame"
        );
        Ok(image)
    }
}

impl ScreenCapture for XcapCapture {
    fn take_screenshot(&self, monitor: usize) -> anyhow::Result<DynamicImage> {
        Ok(self.capture(monitor)?)
    }
}

/// Composite every monitor into one frame covering the virtual desktop.
///
/// Each monitor's capture is blitted at its offset relative to the
/// top-left of the combined bounding box.
fn composite_all(monitors: &[Monitor]) -> Result<DynamicImage> {
    let min_x = monitors.iter().map(|m| m.x()).min().unwrap_or(0);
    let min_y = monitors.iter().map(|m| m.y()).min().unwrap_or(0);
    let max_x = monitors
        .iter()
        .map(|m| m.x() + m.width() as i32)
        .max()
        .unwrap_or(0);
    let max_y = monitors
        .iter()
        .map(|m| m.y() + m.height() as i32)
        .max()
        .unwrap_or(0);

    let total_width = (max_x - min_x).max(0) as u32;
    let total_height = (max_y - min_y).max(0) as u32;
    if total_width == 0 || total_height == 0 {
        return Err(CaptureError::EmptyFrame);
    }

    let mut combined = RgbaImage::new(total_width, total_height);
    for monitor in monitors {
        let frame = monitor
            .capture_image()
            .map_err(|e| CaptureError::Backend(e.to_string()))?;
        let offset_x = (monitor.x() - min_x) as u32;
        let offset_y = (monitor.y() - min_y) as u32;
        image::imageops::overlay(&mut combined, &frame, offset_x as i64, offset_y as i64);
    }

    Ok(DynamicImage::ImageRgba8(combined))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_error_message() {
        let err = CaptureError::MonitorOutOfRange {
            index: 3,
            available: 1,
        };
        assert_eq!(
            err.to_string(),
            "monitor index 3 out of range (1 available)"
        );
    }

    // Probing requires a display; running headless must yield a typed
    // error rather than a panic.
    #[test]
    fn test_probe_never_panics() {
        match XcapCapture::probe() {
            Ok(capture) => assert!(capture.monitor_count() >= 1),
            Err(CaptureError::NoMonitors | CaptureError::Backend(_)) => {}
            Err(other) => panic!("unexpected probe error: {other}"),
        }
    }
}
