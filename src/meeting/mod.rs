//! Meeting view: owns the roster, the attendance log and the single
//! current-session slot.
//!
//! Manual triggers and the auto-scheduler both write the same slot. The last
//! write wins: opening a session while another is open closes the old one
//! with [`CloseReason::Replaced`], so at most one session is ever open.

pub mod join;
pub mod registry;

pub use self::join::{generate_meeting_id, JoinError, JoinRequest, Role};
pub use self::registry::{MeetingDeps, MeetingRegistry};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::attendance::{
    AttendanceLog, AttendanceRecord, CaptureSession, CloseReason, SessionError, SessionHandle,
    SessionOutcome, SessionView,
};
use crate::export;
use crate::roster::{is_valid_roll, Roster, RosterEntry, HOST_PREFIX, STUDENT_PREFIX};
use crate::scheduler::{AutoScheduler, SchedulerError, SchedulerStatus, Trigger};
use crate::storage;
use crate::transport::{
    connect_with_retry, ConnectionStatus, RoleFlags, TransportError, TransportEvent, User,
    VideoTransport,
};

#[derive(Debug, Error)]
pub enum MeetingError {
    #[error("no attendance session is open")]
    NoSession,
    #[error("attendance target name is empty")]
    EmptyTarget,
    #[error("only the host can {0}")]
    HostOnly(&'static str),
    #[error(transparent)]
    Join(#[from] JoinError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Who is running this meeting view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeetingInfo {
    pub meeting_id: String,
    pub user_name: String,
    pub role: Role,
    pub roll: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl MeetingInfo {
    pub fn from_request(req: JoinRequest, started_at: DateTime<Utc>) -> Self {
        Self {
            meeting_id: req.meeting_id,
            user_name: req.name,
            role: req.role,
            roll: req.roll,
            started_at,
        }
    }

    pub fn is_host(&self) -> bool {
        self.role == Role::Host
    }
}

/// Things that happened in the meeting, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MeetingEvent {
    SessionOpened { session: Uuid, target: String },
    SessionClosed { session: Uuid, outcome: SessionOutcome },
    RecordAdded { record: AttendanceRecord },
    RosterUpdated { roster: Vec<RosterEntry> },
    ConnectionChanged { status: ConnectionStatus },
}

struct MeetingInner {
    info: MeetingInfo,
    deps: MeetingDeps,
    roster: Roster,
    log: Mutex<AttendanceLog>,
    slot: Mutex<Option<SessionHandle>>,
    scheduler: AutoScheduler,
    events: broadcast::Sender<MeetingEvent>,
    connection: watch::Sender<ConnectionStatus>,
}

/// Shared handle to one meeting view.
#[derive(Clone)]
pub struct Meeting {
    inner: Arc<MeetingInner>,
}

fn locked<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Meeting {
    /// Open the meeting view: load the stored log and seed the roster with
    /// the local user.
    pub fn open(info: MeetingInfo, deps: MeetingDeps) -> Result<Self, MeetingError> {
        let log = storage::load_log(&deps.pool, &info.meeting_id)?;
        if !log.is_empty() {
            info!(meeting_id = %info.meeting_id, records = log.len(), "restored attendance log");
        }

        let (events, _) = broadcast::channel(256);
        let (connection, _) = watch::channel(ConnectionStatus::Disconnected);
        let scheduler = AutoScheduler::new(&deps.config.scheduler);

        let meeting = Self {
            inner: Arc::new(MeetingInner {
                info,
                roster: Roster::new(),
                log: Mutex::new(log),
                slot: Mutex::new(None),
                scheduler,
                events,
                connection,
                deps,
            }),
        };

        let local = meeting.local_entry();
        let roster = meeting.inner.roster.replace(vec![local]);
        info!(
            meeting_id = %meeting.inner.info.meeting_id,
            user = %meeting.inner.info.user_name,
            roll = %roster[0].roll,
            role = %meeting.inner.info.role,
            "meeting opened"
        );
        Ok(meeting)
    }

    fn from_weak(weak: &Weak<MeetingInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    pub fn info(&self) -> &MeetingInfo {
        &self.inner.info
    }

    pub fn id(&self) -> &str {
        &self.inner.info.meeting_id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MeetingEvent> {
        self.inner.events.subscribe()
    }

    fn emit(&self, event: MeetingEvent) {
        let _ = self.inner.events.send(event);
    }

    fn require_host(&self, action: &'static str) -> Result<(), MeetingError> {
        if self.inner.info.is_host() {
            Ok(())
        } else {
            Err(MeetingError::HostOnly(action))
        }
    }

    // -----------------------------------------------------------------------
    // Roster
    // -----------------------------------------------------------------------

    pub fn roster(&self) -> Vec<RosterEntry> {
        self.inner.roster.snapshot()
    }

    /// Replace the roster with a membership snapshot.
    pub fn update_roster(&self, snapshot: Vec<RosterEntry>) -> Vec<RosterEntry> {
        let roster = self.inner.roster.replace(snapshot);
        info!(meeting_id = %self.id(), participants = roster.len(), "participants updated");
        self.emit(MeetingEvent::RosterUpdated {
            roster: roster.clone(),
        });
        roster
    }

    fn local_entry(&self) -> RosterEntry {
        let info = &self.inner.info;
        let roll = if info.is_host() {
            HOST_PREFIX.to_string()
        } else {
            info.roll.clone().unwrap_or_default()
        };
        RosterEntry::new(info.user_name.clone(), roll)
    }

    /// Raw roster entry for a transport user, before normalization.
    fn entry_for(&self, user: &User) -> RosterEntry {
        if user.user_name == self.inner.info.user_name {
            return self.local_entry();
        }
        let roll = if is_valid_roll(STUDENT_PREFIX, &user.user_name) {
            user.user_name.clone()
        } else {
            String::new()
        };
        RosterEntry::new(user.user_name.clone(), roll)
    }

    pub fn handle_transport_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::Joined => {
                self.set_connection(ConnectionStatus::Connected);
                self.update_roster(vec![self.local_entry()]);
            }
            TransportEvent::Left => {
                info!(meeting_id = %self.id(), "left video room");
                self.set_connection(ConnectionStatus::Disconnected);
            }
            TransportEvent::UsersJoined(users) | TransportEvent::UsersLeft(users) => {
                let snapshot = users.iter().map(|u| self.entry_for(u)).collect();
                self.update_roster(snapshot);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    pub fn connection_status(&self) -> ConnectionStatus {
        *self.inner.connection.borrow()
    }

    fn set_connection(&self, status: ConnectionStatus) {
        let previous = self.inner.connection.send_replace(status);
        if previous != status {
            self.emit(MeetingEvent::ConnectionChanged { status });
        }
    }

    /// Join the video room and feed its membership callbacks into the roster.
    ///
    /// Returns the task pumping transport events; it ends when the transport
    /// drops its sender or the meeting goes away.
    pub async fn connect(
        &self,
        transport: Arc<dyn VideoTransport>,
    ) -> Result<JoinHandle<()>, MeetingError> {
        let (tx, mut rx) = mpsc::channel(64);
        let info = &self.inner.info;
        let user = User::new(Uuid::new_v4().to_string(), info.user_name.clone());
        let role = RoleFlags {
            host: info.is_host(),
        };

        let result = connect_with_retry(
            transport.as_ref(),
            &info.meeting_id,
            &user,
            role,
            tx,
            &self.inner.deps.config.transport,
            &self.inner.connection,
        )
        .await;
        self.emit(MeetingEvent::ConnectionChanged {
            status: self.connection_status(),
        });
        result?;

        let weak = Arc::downgrade(&self.inner);
        Ok(tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match Meeting::from_weak(&weak) {
                    Some(m) => m.handle_transport_event(event),
                    None => break,
                }
            }
        }))
    }

    // -----------------------------------------------------------------------
    // Attendance sessions
    // -----------------------------------------------------------------------

    /// Host action: open a capture session for `target`.
    pub fn take_attendance(&self, target: &str) -> Result<Uuid, MeetingError> {
        self.require_host("take attendance")?;
        info!(meeting_id = %self.id(), %target, "manual attendance check");
        self.open_session(target)
    }

    fn open_session(&self, target: &str) -> Result<Uuid, MeetingError> {
        let target = target.trim();
        if target.is_empty() {
            return Err(MeetingError::EmptyTarget);
        }

        let deps = &self.inner.deps;
        let (handle, task) = CaptureSession {
            target: target.to_string(),
            known_roll: self.inner.roster.find(target).map(|e| e.roll),
            device: deps.device.clone(),
            verifier: deps.verifier.clone(),
            config: deps.config.attendance.clone(),
        }
        .open();
        let id = handle.id();

        let previous = locked(&self.inner.slot).replace(handle);
        if let Some(previous) = previous {
            info!(meeting_id = %self.id(), replaced = %previous.target(), %target, "replacing open attendance session");
            previous.close(CloseReason::Replaced);
        }

        info!(meeting_id = %self.id(), %target, "taking attendance");
        self.emit(MeetingEvent::SessionOpened {
            session: id,
            target: target.to_string(),
        });

        let weak = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(session = %id, "attendance session task failed: {}", e);
                    return;
                }
            };
            if let Some(meeting) = Meeting::from_weak(&weak) {
                meeting.finish_session(id, outcome);
            }
        });

        Ok(id)
    }

    fn finish_session(&self, id: Uuid, outcome: SessionOutcome) {
        {
            let mut slot = locked(&self.inner.slot);
            if slot.as_ref().map(SessionHandle::id) == Some(id) {
                *slot = None;
            }
        }

        if let SessionOutcome::Verified { name, roll } = &outcome {
            let roll = self
                .inner
                .roster
                .find(name)
                .map(|e| e.roll)
                .unwrap_or_else(|| roll.clone());
            let record = AttendanceRecord::verified(name.clone(), roll, Utc::now());

            let snapshot = {
                let mut log = locked(&self.inner.log);
                log.append(record.clone());
                log.clone()
            };
            if let Err(e) = storage::save_log(&self.inner.deps.pool, self.id(), &snapshot) {
                error!(meeting_id = %self.id(), "Failed to persist attendance log: {:#}", e);
            }

            info!(meeting_id = %self.id(), name = %record.name, roll = %record.roll, "attendance verified");
            self.emit(MeetingEvent::RecordAdded { record });
        }

        self.emit(MeetingEvent::SessionClosed { session: id, outcome });
    }

    fn current(&self) -> Result<SessionHandle, MeetingError> {
        locked(&self.inner.slot).clone().ok_or(MeetingError::NoSession)
    }

    pub fn session_view(&self) -> Option<SessionView> {
        locked(&self.inner.slot).as_ref().map(SessionHandle::view)
    }

    pub async fn verify_now(&self) -> Result<(), MeetingError> {
        Ok(self.current()?.verify_now().await?)
    }

    pub async fn retry(&self) -> Result<(), MeetingError> {
        Ok(self.current()?.retry().await?)
    }

    pub async fn retry_device(&self) -> Result<(), MeetingError> {
        Ok(self.current()?.retry_device().await?)
    }

    pub async fn cancel(&self) -> Result<(), MeetingError> {
        Ok(self.current()?.cancel().await?)
    }

    pub fn records(&self) -> Vec<AttendanceRecord> {
        locked(&self.inner.log).records().to_vec()
    }

    // -----------------------------------------------------------------------
    // Auto-trigger
    // -----------------------------------------------------------------------

    /// Start the auto-trigger. Returns `false` if it was already running.
    pub fn start_auto(&self) -> Result<bool, MeetingError> {
        self.require_host("run automated attendance")?;
        let weak = Arc::downgrade(&self.inner);
        let trigger: Trigger = Arc::new(move |entry: RosterEntry| {
            if let Some(meeting) = Meeting::from_weak(&weak) {
                if let Err(e) = meeting.open_session(&entry.name) {
                    warn!(target = %entry.name, error = %e, "auto attendance trigger failed");
                }
            }
        });
        Ok(self
            .inner
            .scheduler
            .start(self.inner.roster.clone(), trigger))
    }

    pub fn stop_auto(&self) -> Result<(), MeetingError> {
        self.require_host("run automated attendance")?;
        self.inner.scheduler.stop();
        Ok(())
    }

    pub fn set_auto_interval(&self, secs: u64) -> Result<(), MeetingError> {
        self.require_host("change the attendance interval")?;
        Ok(self.inner.scheduler.set_interval(secs)?)
    }

    pub fn auto_status(&self) -> SchedulerStatus {
        self.inner.scheduler.status(&self.inner.roster)
    }

    // -----------------------------------------------------------------------
    // Export / teardown
    // -----------------------------------------------------------------------

    /// Export filename and CSV body for the current log and roster.
    pub fn export_csv(&self) -> Result<(String, String), MeetingError> {
        self.require_host("export attendance")?;
        let records = self.records();
        let roster = self.roster();
        let rows = export::build_rows(&records, &roster, self.id(), self.inner.info.started_at);
        let csv = export::render_csv(&rows);
        let filename = export::export_filename(self.id(), Utc::now().date_naive());
        info!(meeting_id = %self.id(), rows = rows.len(), "exported attendance CSV");
        Ok((filename, csv))
    }

    /// Leave the meeting: stop the auto-trigger and close any open session.
    pub fn leave(&self) {
        self.inner.scheduler.stop();
        if let Some(handle) = locked(&self.inner.slot).take() {
            handle.close(CloseReason::Teardown);
        }
        self.set_connection(ConnectionStatus::Disconnected);
        info!(meeting_id = %self.id(), "left meeting");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::{FixedVerifier, SessionState};
    use crate::capture::SimulatedCamera;
    use crate::config::RollcallConfig;
    use crate::transport::LoopbackTransport;
    use std::time::Duration;

    fn deps(camera: &SimulatedCamera, verified: bool) -> MeetingDeps {
        MeetingDeps {
            pool: storage::open_memory_pool().unwrap(),
            device: Arc::new(camera.clone()),
            verifier: Arc::new(FixedVerifier(verified)),
            config: Arc::new(RollcallConfig::default()),
        }
    }

    fn host_info() -> MeetingInfo {
        MeetingInfo {
            meeting_id: "ABC123".to_string(),
            user_name: "Host".to_string(),
            role: Role::Host,
            roll: None,
            started_at: Utc::now(),
        }
    }

    fn class_roster() -> Vec<RosterEntry> {
        vec![
            RosterEntry::new("Host", "HOST007"),
            RosterEntry::new("Alice", "ST001"),
            RosterEntry::new("Bob", "ST002"),
        ]
    }

    async fn next_closed(rx: &mut broadcast::Receiver<MeetingEvent>) -> (Uuid, SessionOutcome) {
        loop {
            if let MeetingEvent::SessionClosed { session, outcome } = rx.recv().await.unwrap() {
                return (session, outcome);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_host_seeded_with_host_roll() {
        let camera = SimulatedCamera::new();
        let meeting = Meeting::open(host_info(), deps(&camera, true)).unwrap();
        let roster = meeting.roster();
        assert_eq!(roster.len(), 1);
        assert!(is_valid_roll(HOST_PREFIX, &roster[0].roll));
    }

    #[tokio::test(start_paused = true)]
    async fn test_verified_session_appends_and_persists() {
        let camera = SimulatedCamera::new();
        let deps = deps(&camera, true);
        let pool = deps.pool.clone();
        let meeting = Meeting::open(host_info(), deps).unwrap();
        meeting.update_roster(class_roster());
        let mut events = meeting.subscribe();

        meeting.take_attendance("Alice").unwrap();
        meeting.verify_now().await.unwrap();
        let (_, outcome) = next_closed(&mut events).await;
        assert_eq!(
            outcome,
            SessionOutcome::Verified {
                name: "Alice".to_string(),
                roll: "ST001".to_string()
            }
        );

        let records = meeting.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].roll, "ST001");
        assert!(records[0].verified);
        assert!(meeting.session_view().is_none());
        assert_eq!(storage::load_log(&pool, "ABC123").unwrap().len(), 1);
        assert_eq!(camera.open_streams(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_session_records_nothing() {
        let camera = SimulatedCamera::new();
        let meeting = Meeting::open(host_info(), deps(&camera, false)).unwrap();
        meeting.update_roster(class_roster());
        let mut events = meeting.subscribe();

        meeting.take_attendance("Bob").unwrap();
        let (_, outcome) = next_closed(&mut events).await;
        assert!(matches!(
            outcome,
            SessionOutcome::Closed { reason: CloseReason::Failed, .. }
        ));
        assert!(meeting.records().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_trigger_replaces_open_session() {
        let camera = SimulatedCamera::new();
        let meeting = Meeting::open(host_info(), deps(&camera, true)).unwrap();
        meeting.update_roster(class_roster());
        let mut events = meeting.subscribe();

        let first = meeting.take_attendance("Alice").unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        meeting.take_attendance("Bob").unwrap();

        let (closed, outcome) = next_closed(&mut events).await;
        assert_eq!(closed, first);
        assert!(matches!(
            outcome,
            SessionOutcome::Closed { reason: CloseReason::Replaced, .. }
        ));
        let view = meeting.session_view().unwrap();
        assert_eq!(view.target, "Bob");
        assert_eq!(camera.open_streams(), 1);

        let (_, outcome) = next_closed(&mut events).await;
        assert!(matches!(outcome, SessionOutcome::Verified { ref name, .. } if name == "Bob"));
        assert_eq!(camera.open_streams(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_session_controls_without_open_session() {
        let camera = SimulatedCamera::new();
        let meeting = Meeting::open(host_info(), deps(&camera, true)).unwrap();
        assert!(matches!(meeting.verify_now().await, Err(MeetingError::NoSession)));
        assert!(matches!(meeting.take_attendance("  "), Err(MeetingError::EmptyTarget)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_participant_has_no_host_controls() {
        let camera = SimulatedCamera::new();
        let info = MeetingInfo {
            user_name: "Alice".to_string(),
            role: Role::Participant,
            roll: Some("ST001".to_string()),
            ..host_info()
        };
        let meeting = Meeting::open(info, deps(&camera, true)).unwrap();
        assert_eq!(meeting.roster()[0].roll, "ST001");
        assert!(matches!(meeting.take_attendance("Bob"), Err(MeetingError::HostOnly(_))));
        assert!(matches!(meeting.start_auto(), Err(MeetingError::HostOnly(_))));
        assert!(matches!(meeting.export_csv(), Err(MeetingError::HostOnly(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_trigger_picks_non_host() {
        let camera = SimulatedCamera::new();
        let meeting = Meeting::open(host_info(), deps(&camera, true)).unwrap();
        meeting.update_roster(class_roster());
        meeting.set_auto_interval(10).unwrap();
        let mut events = meeting.subscribe();

        assert!(meeting.start_auto().unwrap());
        assert!(matches!(
            meeting.set_auto_interval(20),
            Err(MeetingError::Scheduler(SchedulerError::ActiveIntervalChange))
        ));

        let target = loop {
            if let MeetingEvent::SessionOpened { target, .. } = events.recv().await.unwrap() {
                break target;
            }
        };
        assert!(target == "Alice" || target == "Bob");
        assert_eq!(meeting.auto_status().next_target, Some(target));

        meeting.stop_auto().unwrap();
        assert_eq!(meeting.auto_status().next_target, None);
        // Stopping leaves the open session alone.
        assert_eq!(meeting.session_view().unwrap().state, SessionState::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_log_restored_on_reopen() {
        let camera = SimulatedCamera::new();
        let deps = deps(&camera, true);
        let meeting = Meeting::open(host_info(), deps.clone()).unwrap();
        meeting.update_roster(class_roster());
        let mut events = meeting.subscribe();
        meeting.take_attendance("Alice").unwrap();
        next_closed(&mut events).await;
        drop(meeting);

        let reopened = Meeting::open(host_info(), deps).unwrap();
        assert_eq!(reopened.records().len(), 1);
        assert_eq!(reopened.records()[0].name, "Alice");
    }

    #[tokio::test(start_paused = true)]
    async fn test_export_includes_unverified_roster() {
        let camera = SimulatedCamera::new();
        let meeting = Meeting::open(host_info(), deps(&camera, true)).unwrap();
        meeting.update_roster(class_roster());
        let mut events = meeting.subscribe();
        meeting.take_attendance("Alice").unwrap();
        next_closed(&mut events).await;

        let (filename, csv) = meeting.export_csv().unwrap();
        assert!(filename.starts_with("attendance_ABC123_"));
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("ABC123,Alice,ST001,") && lines[1].ends_with(",Verified"));
        assert!(lines[2].starts_with("ABC123,Host,HOST007,") && lines[2].ends_with("Not Verified"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_membership_drives_roster() {
        let camera = SimulatedCamera::new();
        let meeting = Meeting::open(host_info(), deps(&camera, true)).unwrap();
        let transport = Arc::new(LoopbackTransport::new(vec![
            User::new("u2", "Alice"),
            User::new("u3", "ST042"),
        ]));

        let pump = meeting.connect(transport.clone()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(meeting.connection_status(), ConnectionStatus::Connected);

        let roster = meeting.roster();
        assert_eq!(roster.len(), 3);
        assert!(roster[0].is_host());
        assert!(is_valid_roll(STUDENT_PREFIX, &roster[1].roll));
        assert_eq!(roster[2].roll, "ST042");
        let host_roll = roster[0].roll.clone();
        let alice_roll = roster[1].roll.clone();

        transport.user_leaves("u3").await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        let roster = meeting.roster();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].roll, host_roll);
        assert_eq!(roster[1].roll, alice_roll);

        transport.leave().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(meeting.connection_status(), ConnectionStatus::Disconnected);
        pump.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_leave_releases_device_and_stops_auto() {
        let camera = SimulatedCamera::new();
        let meeting = Meeting::open(host_info(), deps(&camera, true)).unwrap();
        meeting.update_roster(class_roster());
        meeting.start_auto().unwrap();
        meeting.take_attendance("Alice").unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(camera.open_streams(), 1);

        meeting.leave();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(camera.open_streams(), 0);
        assert!(!meeting.auto_status().active);
        assert!(meeting.session_view().is_none());
    }
}
