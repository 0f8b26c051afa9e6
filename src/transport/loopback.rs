//! In-process transport used by `rollcall simulate` and the tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::debug;

use super::{RoleFlags, TransportError, TransportEvent, User, VideoTransport};

struct Room {
    local: User,
    events: mpsc::Sender<TransportEvent>,
}

/// A room with a scripted set of remote users.
pub struct LoopbackTransport {
    remote: Mutex<Vec<User>>,
    room: Mutex<Option<Room>>,
    fail_remaining: AtomicU32,
    attempts: AtomicU32,
}

impl LoopbackTransport {
    pub fn new(remote: Vec<User>) -> Self {
        Self {
            remote: Mutex::new(remote),
            room: Mutex::new(None),
            fail_remaining: AtomicU32::new(0),
            attempts: AtomicU32::new(0),
        }
    }

    /// Make the next `n` joins fail.
    pub fn failing_first(self, n: u32) -> Self {
        self.fail_remaining.store(n, Ordering::SeqCst);
        self
    }

    pub fn join_attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Local user followed by every remote user.
    fn members(&self) -> Option<(Vec<User>, mpsc::Sender<TransportEvent>)> {
        let room = self.room.lock().unwrap_or_else(PoisonError::into_inner);
        let room = room.as_ref()?;
        let remote = self.remote.lock().unwrap_or_else(PoisonError::into_inner);
        let mut users = vec![room.local.clone()];
        users.extend(remote.iter().cloned());
        Some((users, room.events.clone()))
    }

    /// A remote user enters; emits the new member list.
    pub async fn user_joins(&self, user: User) {
        self.remote
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(user);
        if let Some((users, events)) = self.members() {
            let _ = events.send(TransportEvent::UsersJoined(users)).await;
        }
    }

    /// A remote user leaves; emits the remaining member list.
    pub async fn user_leaves(&self, user_id: &str) {
        self.remote
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|u| u.user_id != user_id);
        if let Some((users, events)) = self.members() {
            let _ = events.send(TransportEvent::UsersLeft(users)).await;
        }
    }

    /// The local user leaves the room.
    pub async fn leave(&self) {
        let room = self
            .room
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(room) = room {
            let _ = room.events.send(TransportEvent::Left).await;
        }
    }
}

#[async_trait::async_trait]
impl VideoTransport for LoopbackTransport {
    async fn join(
        &self,
        room: &str,
        user: &User,
        role: RoleFlags,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<(), TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let remaining = self.fail_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(TransportError::ConnectFailed("simulated outage".to_string()));
        }

        debug!(room, user = %user.user_name, host = role.host, "loopback join");
        *self.room.lock().unwrap_or_else(PoisonError::into_inner) = Some(Room {
            local: user.clone(),
            events: events.clone(),
        });

        let _ = events.send(TransportEvent::Joined).await;
        let has_remote = !self
            .remote
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty();
        if has_remote {
            if let Some((users, events)) = self.members() {
                let _ = events.send(TransportEvent::UsersJoined(users)).await;
            }
        }
        Ok(())
    }
}
