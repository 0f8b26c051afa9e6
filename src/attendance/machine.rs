//! Timer-free core of a capture session.
//!
//! `CaptureMachine` holds the state and countdown and decides which actions
//! are allowed. The async driver in `session` feeds it ticks, device results
//! and verifier decisions.

use serde::Serialize;

use super::{SessionError, SessionState};
use crate::capture::DeviceError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum DeviceStatus {
    Acquiring,
    Ready,
    Error(DeviceError),
}

/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Countdown is not running; nothing changed.
    Idle,
    /// Countdown decremented to the given value.
    Running(u32),
    /// Countdown hit zero and verification started.
    Expired,
}

/// Read-only snapshot of a session for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub target: String,
    pub state: SessionState,
    pub countdown: u32,
    pub device_ready: bool,
    pub device_error: Option<DeviceError>,
    /// Whether "Verify Now" is currently enabled.
    pub can_verify: bool,
}

#[derive(Debug, Clone)]
pub struct CaptureMachine {
    target: String,
    state: SessionState,
    countdown: u32,
    countdown_from: u32,
    device: DeviceStatus,
}

impl CaptureMachine {
    pub fn new(target: impl Into<String>, countdown_from: u32) -> Self {
        Self {
            target: target.into(),
            state: SessionState::Pending,
            countdown: countdown_from,
            countdown_from,
            device: DeviceStatus::Acquiring,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    pub fn device_ready(&mut self) {
        self.device = DeviceStatus::Ready;
    }

    pub fn device_failed(&mut self, err: DeviceError) {
        self.device = DeviceStatus::Error(err);
    }

    pub fn has_device_error(&self) -> bool {
        matches!(self.device, DeviceStatus::Error(_))
    }

    /// The countdown only runs while pending with a working device.
    pub fn countdown_running(&self) -> bool {
        self.state == SessionState::Pending
            && self.device == DeviceStatus::Ready
            && self.countdown > 0
    }

    pub fn tick(&mut self) -> Tick {
        if !self.countdown_running() {
            return Tick::Idle;
        }
        self.countdown -= 1;
        if self.countdown == 0 {
            self.state = SessionState::Verifying;
            Tick::Expired
        } else {
            Tick::Running(self.countdown)
        }
    }

    /// Manual "Verify Now".
    pub fn verify_now(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Pending => {}
            SessionState::Verifying => return Err(SessionError::Busy),
            other => return Err(SessionError::NotPending(other)),
        }
        if self.device != DeviceStatus::Ready {
            return Err(SessionError::DeviceUnavailable);
        }
        self.state = SessionState::Verifying;
        Ok(())
    }

    /// Apply the verifier's decision. Ignored unless a verification is running.
    pub fn complete(&mut self, verified: bool) -> SessionState {
        if self.state == SessionState::Verifying {
            self.state = if verified {
                SessionState::Success
            } else {
                SessionState::Failed
            };
        }
        self.state
    }

    /// Back to pending with a full countdown and the device error cleared.
    ///
    /// Returns `true` when the caller must re-acquire the device.
    pub fn retry(&mut self) -> Result<bool, SessionError> {
        match self.state {
            SessionState::Verifying => return Err(SessionError::Busy),
            SessionState::Success => return Err(SessionError::Finished),
            SessionState::Pending | SessionState::Failed => {}
        }
        self.state = SessionState::Pending;
        self.countdown = self.countdown_from;
        if self.has_device_error() {
            self.device = DeviceStatus::Acquiring;
            return Ok(true);
        }
        Ok(false)
    }

    /// Clear a device error ahead of a fresh acquisition attempt.
    pub fn retry_device(&mut self) -> Result<(), SessionError> {
        if !self.has_device_error() {
            return Err(SessionError::DeviceUnavailable);
        }
        self.device = DeviceStatus::Acquiring;
        Ok(())
    }

    /// Cancel is unavailable while processing and once the outcome is success.
    pub fn check_cancel(&self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Verifying => Err(SessionError::Busy),
            SessionState::Success => Err(SessionError::Finished),
            _ => Ok(()),
        }
    }

    pub fn view(&self) -> SessionView {
        let (device_ready, device_error) = match &self.device {
            DeviceStatus::Acquiring => (false, None),
            DeviceStatus::Ready => (true, None),
            DeviceStatus::Error(e) => (false, Some(e.clone())),
        };
        SessionView {
            target: self.target.clone(),
            state: self.state,
            countdown: self.countdown,
            device_ready,
            device_error,
            can_verify: self.state == SessionState::Pending && device_ready,
        }
    }
}
