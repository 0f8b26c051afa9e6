//! In-process camera used by the server, the simulator and the tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{info, warn};

use super::{CaptureDevice, CaptureStream, DeviceError, Frame};

/// How the next `acquire` call behaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraBehavior {
    Available,
    Denied,
    Missing,
    Broken(String),
}

#[derive(Default)]
struct Counters {
    acquired: AtomicUsize,
    released: AtomicUsize,
}

/// A camera whose availability and frame signal are set from outside.
#[derive(Clone)]
pub struct SimulatedCamera {
    behavior: Arc<Mutex<CameraBehavior>>,
    frames: Arc<AtomicBool>,
    counters: Arc<Counters>,
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedCamera {
    /// An available camera producing frames.
    pub fn new() -> Self {
        Self::with_behavior(CameraBehavior::Available)
    }

    pub fn with_behavior(behavior: CameraBehavior) -> Self {
        Self {
            behavior: Arc::new(Mutex::new(behavior)),
            frames: Arc::new(AtomicBool::new(true)),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn set_behavior(&self, behavior: CameraBehavior) {
        *self.behavior.lock().unwrap_or_else(PoisonError::into_inner) = behavior;
    }

    /// Toggle whether open streams report a present frame.
    pub fn set_frames(&self, present: bool) {
        self.frames.store(present, Ordering::SeqCst);
    }

    pub fn acquisitions(&self) -> usize {
        self.counters.acquired.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.counters.released.load(Ordering::SeqCst)
    }

    /// Streams handed out and not yet stopped.
    pub fn open_streams(&self) -> usize {
        self.acquisitions() - self.releases()
    }
}

#[async_trait::async_trait]
impl CaptureDevice for SimulatedCamera {
    async fn acquire(&self) -> Result<Box<dyn CaptureStream>, DeviceError> {
        let behavior = self
            .behavior
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match behavior {
            CameraBehavior::Available => {
                self.counters.acquired.fetch_add(1, Ordering::SeqCst);
                info!("camera started");
                Ok(Box::new(SimulatedStream {
                    frames: self.frames.clone(),
                    counters: self.counters.clone(),
                    stopped: false,
                }))
            }
            CameraBehavior::Denied => {
                warn!("camera access denied");
                Err(DeviceError::PermissionDenied)
            }
            CameraBehavior::Missing => {
                warn!("no camera found");
                Err(DeviceError::NotFound)
            }
            CameraBehavior::Broken(msg) => {
                warn!(error = %msg, "camera error");
                Err(DeviceError::Other(msg))
            }
        }
    }
}

struct SimulatedStream {
    frames: Arc<AtomicBool>,
    counters: Arc<Counters>,
    stopped: bool,
}

impl CaptureStream for SimulatedStream {
    fn frame(&self) -> Frame {
        Frame {
            present: !self.stopped && self.frames.load(Ordering::SeqCst),
        }
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.counters.released.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_denied_camera_reports_permission_error() {
        let camera = SimulatedCamera::with_behavior(CameraBehavior::Denied);
        let err = camera.acquire().await.err().unwrap();
        assert_eq!(err, DeviceError::PermissionDenied);
        assert_eq!(camera.acquisitions(), 0);
    }

    #[tokio::test]
    async fn test_frame_signal_follows_toggle() {
        let camera = SimulatedCamera::new();
        let stream = camera.acquire().await.unwrap();
        assert!(stream.frame().present);
        camera.set_frames(false);
        assert!(!stream.frame().present);
    }

    #[tokio::test]
    async fn test_behavior_can_recover() {
        let camera = SimulatedCamera::with_behavior(CameraBehavior::Missing);
        assert!(camera.acquire().await.is_err());
        camera.set_behavior(CameraBehavior::Available);
        assert!(camera.acquire().await.is_ok());
    }
}
