//! Video/room transport seam.
//!
//! The real transport is a third-party conferencing SDK. Attendance logic
//! only needs two things from it: a way to join a room, and membership
//! callbacks carrying the full current user list.

pub mod loopback;

pub use self::loopback::LoopbackTransport;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::config::TransportConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("video transport connect failed: {0}")]
    ConnectFailed(String),
    #[error("video transport unreachable after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
}

/// A user as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub user_name: String,
}

impl User {
    pub fn new(user_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
        }
    }
}

/// Capabilities the local user joins with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoleFlags {
    pub host: bool,
}

/// Membership callbacks. User lists are full snapshots, not deltas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Joined,
    Left,
    UsersJoined(Vec<User>),
    UsersLeft(Vec<User>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Failed,
    Disconnected,
}

#[async_trait::async_trait]
pub trait VideoTransport: Send + Sync {
    /// Join `room`. Membership changes are delivered on `events`.
    async fn join(
        &self,
        room: &str,
        user: &User,
        role: RoleFlags,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<(), TransportError>;
}

/// Join with a bounded retry budget and a fixed delay between attempts.
///
/// `status` follows the connection: `Connecting` per attempt, `Failed` after
/// each failure, `Connected` on success. Once the budget is spent the
/// terminal `Failed` status stays until the caller tries again.
pub async fn connect_with_retry(
    transport: &dyn VideoTransport,
    room: &str,
    user: &User,
    role: RoleFlags,
    events: mpsc::Sender<TransportEvent>,
    policy: &TransportConfig,
    status: &watch::Sender<ConnectionStatus>,
) -> Result<(), TransportError> {
    let attempts = policy.max_retries + 1;

    for attempt in 1..=attempts {
        info!(room, attempt, attempts, "attempting video transport connection");
        status.send_replace(ConnectionStatus::Connecting);

        match transport.join(room, user, role, events.clone()).await {
            Ok(()) => {
                status.send_replace(ConnectionStatus::Connected);
                info!(room, "joined video room");
                return Ok(());
            }
            Err(e) => {
                status.send_replace(ConnectionStatus::Failed);
                if attempt < attempts {
                    warn!(
                        room,
                        error = %e,
                        retry = attempt,
                        max_retries = policy.max_retries,
                        delay_secs = policy.retry_delay_secs,
                        "video transport connect failed, retrying"
                    );
                    tokio::time::sleep(policy.retry_delay()).await;
                } else {
                    warn!(room, error = %e, "video transport connect failed, giving up");
                }
            }
        }
    }

    Err(TransportError::RetriesExhausted { attempts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_retries_then_connects() {
        let transport = LoopbackTransport::new(vec![]).failing_first(2);
        let (tx, mut rx) = mpsc::channel(16);
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Disconnected);
        let start = Instant::now();

        connect_with_retry(
            &transport,
            "ABC123",
            &User::new("u1", "Host"),
            RoleFlags { host: true },
            tx,
            &TransportConfig::default(),
            &status_tx,
        )
        .await
        .unwrap();

        assert_eq!(*status_rx.borrow(), ConnectionStatus::Connected);
        assert_eq!(start.elapsed(), Duration::from_secs(6));
        assert_eq!(transport.join_attempts(), 3);
        assert_eq!(rx.recv().await, Some(TransportEvent::Joined));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_budget() {
        let transport = LoopbackTransport::new(vec![]).failing_first(10);
        let (tx, _rx) = mpsc::channel(16);
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Disconnected);

        let err = connect_with_retry(
            &transport,
            "ABC123",
            &User::new("u1", "Host"),
            RoleFlags::default(),
            tx,
            &TransportConfig::default(),
            &status_tx,
        )
        .await
        .unwrap_err();

        assert_eq!(err, TransportError::RetriesExhausted { attempts: 4 });
        assert_eq!(transport.join_attempts(), 4);
        assert_eq!(*status_rx.borrow(), ConnectionStatus::Failed);
    }
}
