//! Async driver for a single capture session.
//!
//! A session runs as its own task: it acquires the capture device, ticks the
//! countdown once per second, runs the simulated processing delay, holds the
//! success or failure notice, and resolves to a [`SessionOutcome`]. The
//! [`SessionHandle`] sends user actions in and exposes the current
//! [`SessionView`]. Dropping the last handle tears the session down.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::machine::{CaptureMachine, SessionView, Tick};
use super::verifier::FaceVerifier;
use super::{CloseReason, SessionError, SessionOutcome, SessionState};
use crate::capture::{CaptureDevice, DeviceGuard, Frame};
use crate::config::AttendanceConfig;
use crate::roster::{generate_roll, is_valid_roll, STUDENT_PREFIX};

type Reply = oneshot::Sender<Result<(), SessionError>>;

enum Command {
    VerifyNow(Reply),
    Retry(Reply),
    RetryDevice(Reply),
    Cancel(Reply),
    Close(CloseReason),
}

// ---------------------------------------------------------------------------
// SessionHandle
// ---------------------------------------------------------------------------

/// Control handle for a running capture session. Clones control the same
/// session; the session tears down once every clone is gone.
#[derive(Clone)]
pub struct SessionHandle {
    id: Uuid,
    target: String,
    commands: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<SessionView>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    /// "Verify Now": skip the rest of the countdown.
    pub async fn verify_now(&self) -> Result<(), SessionError> {
        self.request(Command::VerifyNow).await
    }

    /// Return to pending with a fresh countdown, re-acquiring the device if
    /// it is not held.
    pub async fn retry(&self) -> Result<(), SessionError> {
        self.request(Command::Retry).await
    }

    /// Try the capture device again after an error.
    pub async fn retry_device(&self) -> Result<(), SessionError> {
        self.request(Command::RetryDevice).await
    }

    pub async fn cancel(&self) -> Result<(), SessionError> {
        self.request(Command::Cancel).await
    }

    /// Close unconditionally. Used when the slot is taken over or the meeting
    /// ends.
    pub fn close(&self, reason: CloseReason) {
        let _ = self.commands.send(Command::Close(reason));
    }

    async fn request(&self, make: fn(Reply) -> Command) -> Result<(), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)?
    }
}

// ---------------------------------------------------------------------------
// CaptureSession
// ---------------------------------------------------------------------------

/// Everything a session needs to run.
pub struct CaptureSession {
    pub target: String,
    /// Roll already known from the roster, if any.
    pub known_roll: Option<String>,
    pub device: Arc<dyn CaptureDevice>,
    pub verifier: Arc<dyn FaceVerifier>,
    pub config: AttendanceConfig,
}

impl CaptureSession {
    /// Spawn the session task.
    ///
    /// Returns the control handle and a [`JoinHandle`] resolving to the
    /// outcome. The capture device is released before the outcome resolves.
    pub fn open(self) -> (SessionHandle, JoinHandle<SessionOutcome>) {
        let id = Uuid::new_v4();
        let machine = CaptureMachine::new(self.target.clone(), self.config.countdown_secs);
        let (view_tx, view_rx) = watch::channel(machine.view());
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let driver = Driver {
            id,
            machine,
            known_roll: self.known_roll,
            device: self.device,
            verifier: self.verifier,
            config: self.config,
            guard: None,
            view_tx,
            rng: StdRng::from_entropy(),
        };

        let task = tokio::spawn(driver.run(cmd_rx));

        let handle = SessionHandle {
            id,
            target: self.target,
            commands: cmd_tx,
            view: view_rx,
        };
        (handle, task)
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    Processing(Instant),
    Holding(Instant),
}

struct Driver {
    id: Uuid,
    machine: CaptureMachine,
    known_roll: Option<String>,
    device: Arc<dyn CaptureDevice>,
    verifier: Arc<dyn FaceVerifier>,
    config: AttendanceConfig,
    guard: Option<DeviceGuard>,
    view_tx: watch::Sender<SessionView>,
    rng: StdRng,
}

impl Driver {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) -> SessionOutcome {
        info!(session = %self.id, target = %self.machine.target(), "attendance session opened");

        self.acquire().await;
        self.publish();

        let period = Duration::from_secs(1);
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut phase = Phase::Idle;

        let outcome = loop {
            let deadline = match phase {
                Phase::Processing(at) | Phase::Holding(at) => Some(at),
                Phase::Idle => None,
            };

            tokio::select! {
                cmd = commands.recv() => {
                    match cmd {
                        None => break self.closed(CloseReason::Teardown),
                        Some(Command::Close(reason)) => break self.closed(reason),
                        Some(Command::Cancel(reply)) => {
                            let res = self.machine.check_cancel();
                            let cancelled = res.is_ok();
                            let _ = reply.send(res);
                            if cancelled {
                                break self.closed(CloseReason::Cancelled);
                            }
                        }
                        Some(Command::VerifyNow(reply)) => {
                            let res = self.machine.verify_now();
                            if res.is_ok() {
                                phase = self.start_processing();
                            }
                            self.reply(reply, res);
                        }
                        Some(Command::Retry(reply)) => {
                            let res = match self.machine.retry() {
                                Ok(reacquire) => {
                                    phase = Phase::Idle;
                                    if reacquire || self.guard.is_none() {
                                        self.acquire().await;
                                    }
                                    ticker.reset();
                                    Ok(())
                                }
                                Err(e) => Err(e),
                            };
                            self.reply(reply, res);
                        }
                        Some(Command::RetryDevice(reply)) => {
                            let res = match self.machine.retry_device() {
                                Ok(()) => {
                                    self.acquire().await;
                                    ticker.reset();
                                    Ok(())
                                }
                                Err(e) => Err(e),
                            };
                            self.reply(reply, res);
                        }
                    }
                }
                _ = ticker.tick(), if self.machine.countdown_running() => {
                    match self.machine.tick() {
                        Tick::Expired => {
                            debug!(session = %self.id, "countdown expired");
                            phase = self.start_processing();
                        }
                        Tick::Running(left) => debug!(session = %self.id, left, "countdown"),
                        Tick::Idle => {}
                    }
                    self.publish();
                }
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    match phase {
                        Phase::Processing(_) => phase = self.decide(),
                        Phase::Holding(_) => break self.finish(),
                        Phase::Idle => {}
                    }
                    self.publish();
                }
            }
        };

        if let Some(guard) = self.guard.take() {
            guard.release();
        }
        self.publish();
        outcome
    }

    async fn acquire(&mut self) {
        if let Some(old) = self.guard.take() {
            old.release();
        }
        match self.device.acquire().await {
            Ok(stream) => {
                self.guard = Some(DeviceGuard::new(stream));
                self.machine.device_ready();
            }
            Err(e) => {
                warn!(session = %self.id, error = %e, "capture device unavailable");
                self.machine.device_failed(e);
            }
        }
    }

    /// A stream without frames fails on the spot; otherwise the verdict
    /// lands after the processing delay.
    fn start_processing(&mut self) -> Phase {
        info!(session = %self.id, target = %self.machine.target(), "starting face verification");
        let present = self.guard.as_ref().is_some_and(|g| g.frame().present);
        if !present {
            return self.decide();
        }
        Phase::Processing(Instant::now() + self.config.processing_delay())
    }

    fn decide(&mut self) -> Phase {
        let frame = self
            .guard
            .as_ref()
            .map(DeviceGuard::frame)
            .unwrap_or(Frame::EMPTY);
        let verified = self.verifier.verify(&frame);
        self.machine.complete(verified);

        let hold = if verified {
            info!(session = %self.id, target = %self.machine.target(), "face verification successful");
            self.config.success_hold()
        } else {
            info!(session = %self.id, target = %self.machine.target(), frame_present = frame.present, "face verification failed");
            self.config.failure_hold()
        };
        Phase::Holding(Instant::now() + hold)
    }

    fn finish(&mut self) -> SessionOutcome {
        match self.machine.state() {
            SessionState::Success => {
                let roll = self.resolve_roll();
                SessionOutcome::Verified {
                    name: self.machine.target().to_string(),
                    roll,
                }
            }
            _ => self.closed(CloseReason::Failed),
        }
    }

    fn resolve_roll(&mut self) -> String {
        if let Some(roll) = &self.known_roll {
            return roll.clone();
        }
        let target = self.machine.target();
        if is_valid_roll(STUDENT_PREFIX, target) {
            target.to_string()
        } else {
            generate_roll(STUDENT_PREFIX, &mut self.rng)
        }
    }

    fn closed(&self, reason: CloseReason) -> SessionOutcome {
        info!(session = %self.id, target = %self.machine.target(), ?reason, "attendance session closed");
        SessionOutcome::Closed {
            target: self.machine.target().to_string(),
            reason,
        }
    }

    /// Publish the new view before answering so callers see the effect.
    fn reply(&self, reply: Reply, res: Result<(), SessionError>) {
        self.publish();
        let _ = reply.send(res);
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.machine.view());
    }
}
