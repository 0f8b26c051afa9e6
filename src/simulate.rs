//! Loopback meeting run: a host, a scripted set of participants, the
//! auto-trigger, and simulated camera and verifier.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::attendance::{AttendanceRecord, CloseReason, FaceVerifier, SessionOutcome, SimulatedVerifier};
use crate::capture::SimulatedCamera;
use crate::config::RollcallConfig;
use crate::meeting::{generate_meeting_id, Meeting, MeetingDeps, MeetingEvent, MeetingInfo, Role};
use crate::storage::Pool;
use crate::transport::{LoopbackTransport, User};

#[derive(Debug, Clone)]
pub struct SimulationOptions {
    pub meeting_id: Option<String>,
    pub host_name: String,
    pub participants: Vec<String>,
    pub duration: Duration,
    pub interval_secs: Option<u64>,
    pub seed: Option<u64>,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            meeting_id: None,
            host_name: "Host".to_string(),
            participants: vec!["Alice".to_string(), "Bob".to_string(), "ST042".to_string()],
            duration: Duration::from_secs(60),
            interval_secs: None,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulationReport {
    pub meeting_id: String,
    pub sessions_opened: usize,
    pub verified: usize,
    pub failed: usize,
    pub replaced: usize,
    pub records: Vec<AttendanceRecord>,
}

/// Run one simulated meeting for `opts.duration` and report what happened.
pub async fn run(config: Arc<RollcallConfig>, pool: Pool, opts: SimulationOptions) -> Result<SimulationReport> {
    let mut rng = match opts.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let meeting_id = opts
        .meeting_id
        .clone()
        .unwrap_or_else(|| generate_meeting_id(&mut rng));

    let threshold = config.attendance.failure_threshold;
    let verifier: Arc<dyn FaceVerifier> = match opts.seed {
        Some(seed) => Arc::new(SimulatedVerifier::seeded(threshold, seed)),
        None => Arc::new(SimulatedVerifier::new(threshold)),
    };
    let deps = MeetingDeps {
        pool,
        device: Arc::new(SimulatedCamera::new()),
        verifier,
        config,
    };

    let info = MeetingInfo {
        meeting_id: meeting_id.clone(),
        user_name: opts.host_name.clone(),
        role: Role::Host,
        roll: None,
        started_at: Utc::now(),
    };
    let meeting = Meeting::open(info, deps)?;
    let mut events = meeting.subscribe();

    let remote = opts
        .participants
        .iter()
        .enumerate()
        .map(|(i, name)| User::new(format!("user-{}", i + 1), name.clone()))
        .collect();
    let transport = Arc::new(LoopbackTransport::new(remote));
    let pump = meeting
        .connect(transport.clone())
        .await
        .context("failed to join the loopback room")?;

    if let Some(secs) = opts.interval_secs {
        meeting.set_auto_interval(secs)?;
    }
    meeting.start_auto()?;
    info!(%meeting_id, participants = opts.participants.len(), duration_secs = opts.duration.as_secs(), "simulation started");

    let mut report = SimulationReport {
        meeting_id: meeting_id.clone(),
        ..Default::default()
    };
    let deadline = Instant::now() + opts.duration;
    loop {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => break,
            event = events.recv() => match event {
                Ok(event) => tally(&mut report, event),
                Err(RecvError::Lagged(n)) => warn!(skipped = n, "simulation fell behind meeting events"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    meeting.leave();
    transport.leave().await;
    pump.abort();

    report.records = meeting.records();
    info!(
        %meeting_id,
        sessions = report.sessions_opened,
        verified = report.verified,
        failed = report.failed,
        "simulation finished"
    );
    Ok(report)
}

fn tally(report: &mut SimulationReport, event: MeetingEvent) {
    match event {
        MeetingEvent::SessionOpened { .. } => report.sessions_opened += 1,
        MeetingEvent::SessionClosed { outcome, .. } => match outcome {
            SessionOutcome::Verified { .. } => report.verified += 1,
            SessionOutcome::Closed { reason: CloseReason::Failed, .. } => report.failed += 1,
            SessionOutcome::Closed { reason: CloseReason::Replaced, .. } => report.replaced += 1,
            SessionOutcome::Closed { .. } => {}
        },
        _ => {}
    }
}
