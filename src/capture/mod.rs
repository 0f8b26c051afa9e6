//! Capture device seam.
//!
//! The attendance flow only ever asks a device for a stream and then asks the
//! stream whether it is producing frames. Pixel data never crosses this seam.

pub mod simulated;

pub use self::simulated::{CameraBehavior, SimulatedCamera};

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DeviceError {
    #[error("Camera permission denied. Please allow camera access and try again.")]
    PermissionDenied,
    #[error("No camera found. Please ensure a camera is connected.")]
    NotFound,
    #[error("Camera error: {0}")]
    Other(String),
}

/// What the verifier gets to see of the capture stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Frame {
    /// The device is delivering a non-empty picture.
    pub present: bool,
}

impl Frame {
    pub const EMPTY: Frame = Frame { present: false };
}

/// An acquired capture stream.
pub trait CaptureStream: Send + Sync {
    /// Current frame signal.
    fn frame(&self) -> Frame;

    /// Release the underlying device.
    fn stop(&mut self);
}

/// Something that can hand out capture streams (a camera).
#[async_trait::async_trait]
pub trait CaptureDevice: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn CaptureStream>, DeviceError>;
}

/// Owns an acquired stream and stops it exactly once, on `release` or drop.
pub struct DeviceGuard {
    stream: Option<Box<dyn CaptureStream>>,
}

impl DeviceGuard {
    pub fn new(stream: Box<dyn CaptureStream>) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    pub fn frame(&self) -> Frame {
        self.stream
            .as_ref()
            .map(|s| s.frame())
            .unwrap_or(Frame::EMPTY)
    }

    pub fn release(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            tracing::debug!("capture device released");
        }
    }
}

impl Drop for DeviceGuard {
    fn drop(&mut self) {
        self.stop();
    }
}
