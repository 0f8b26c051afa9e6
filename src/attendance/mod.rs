//! Attendance capture: the per-target verification flow and the record log.

pub mod machine;
pub mod record;
pub mod session;
pub mod verifier;

pub use self::machine::{CaptureMachine, SessionView};
pub use self::record::{AttendanceLog, AttendanceRecord};
pub use self::session::{CaptureSession, SessionHandle};
pub use self::verifier::{FaceVerifier, FixedVerifier, SimulatedVerifier};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where a capture session is in its flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Pending,
    Verifying,
    Success,
    Failed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Pending => write!(f, "pending"),
            SessionState::Verifying => write!(f, "verifying"),
            SessionState::Success => write!(f, "success"),
            SessionState::Failed => write!(f, "failed"),
        }
    }
}

/// Why a session closed without a verified result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// Verification failed and the failure notice ran out.
    Failed,
    /// The user cancelled.
    Cancelled,
    /// Another target took over the session slot.
    Replaced,
    /// The meeting view went away.
    Teardown,
}

/// Final result of a capture session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SessionOutcome {
    Verified { name: String, roll: String },
    Closed { target: String, reason: CloseReason },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session is {0}, expected pending")]
    NotPending(SessionState),
    #[error("capture device is not ready")]
    DeviceUnavailable,
    #[error("verification in progress")]
    Busy,
    #[error("session already decided")]
    Finished,
    #[error("session is closed")]
    Closed,
}
