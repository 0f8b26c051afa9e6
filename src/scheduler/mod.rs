//! Host auto-trigger scheduler.
//!
//! While active, every `interval` seconds one non-host roster entry is picked
//! uniformly at random and handed to the trigger callback, which opens an
//! attendance session for it. Selection is memoryless.

pub mod engine;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::SchedulerConfig;
use crate::roster::{Roster, RosterEntry};

pub use self::engine::pick_target;

/// Called with the entry picked on each tick.
pub type Trigger = Arc<dyn Fn(RosterEntry) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("interval {value}s outside [{min}s, {max}s]")]
    IntervalOutOfRange { value: u64, min: u64, max: u64 },
    #[error("stop automated attendance before changing the interval")]
    ActiveIntervalChange,
}

/// Snapshot for the host control panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulerStatus {
    pub active: bool,
    pub interval_secs: u64,
    pub next_target: Option<String>,
    pub total_participants: usize,
    pub eligible_participants: usize,
}

pub(crate) struct SchedulerInner {
    interval_secs: u64,
    next_target: Option<String>,
    task: Option<JoinHandle<()>>,
}

impl Drop for SchedulerInner {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Recurring random-pick timer. Clones share state.
#[derive(Clone)]
pub struct AutoScheduler {
    inner: Arc<Mutex<SchedulerInner>>,
    rng: Arc<Mutex<StdRng>>,
    min_secs: u64,
    max_secs: u64,
}

impl AutoScheduler {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_rng(config: &SchedulerConfig, rng: StdRng) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SchedulerInner {
                interval_secs: config.interval_secs,
                next_target: None,
                task: None,
            })),
            rng: Arc::new(Mutex::new(rng)),
            min_secs: config.min_interval_secs,
            max_secs: config.max_interval_secs,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SchedulerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn interval_secs(&self) -> u64 {
        self.lock().interval_secs
    }

    /// Change the interval. Only allowed while stopped.
    pub fn set_interval(&self, secs: u64) -> Result<(), SchedulerError> {
        let mut inner = self.lock();
        if inner.task.is_some() {
            return Err(SchedulerError::ActiveIntervalChange);
        }
        if !(self.min_secs..=self.max_secs).contains(&secs) {
            return Err(SchedulerError::IntervalOutOfRange {
                value: secs,
                min: self.min_secs,
                max: self.max_secs,
            });
        }
        inner.interval_secs = secs;
        info!(interval_secs = secs, "attendance interval updated");
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.lock().task.is_some()
    }

    pub fn next_target(&self) -> Option<String> {
        self.lock().next_target.clone()
    }

    /// Start picking from `roster`. Returns `false` if already running.
    pub fn start(&self, roster: Roster, trigger: Trigger) -> bool {
        let mut inner = self.lock();
        if inner.task.is_some() {
            return false;
        }
        let period = Duration::from_secs(inner.interval_secs);
        let task = tokio::spawn(engine::run_auto_loop(
            period,
            roster,
            trigger,
            self.rng.clone(),
            Arc::downgrade(&self.inner),
        ));
        inner.task = Some(task);
        info!(interval_secs = period.as_secs(), "started automated attendance system");
        true
    }

    /// Stop the timer and clear the next-target indicator. An already open
    /// session is left alone.
    pub fn stop(&self) {
        let mut inner = self.lock();
        if let Some(task) = inner.task.take() {
            task.abort();
            info!("stopped automated attendance system");
        }
        inner.next_target = None;
    }

    pub fn status(&self, roster: &Roster) -> SchedulerStatus {
        let inner = self.lock();
        SchedulerStatus {
            active: inner.task.is_some(),
            interval_secs: inner.interval_secs,
            next_target: inner.next_target.clone(),
            total_participants: roster.len(),
            eligible_participants: roster.eligible().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn scenario_roster() -> Roster {
        let roster = Roster::with_rng(StdRng::seed_from_u64(1));
        roster.replace(vec![
            RosterEntry::new("Alice", "ST001"),
            RosterEntry::new("Bob", "ST002"),
            RosterEntry::new("Host", "HOST007"),
        ]);
        roster
    }

    fn recorder() -> (Trigger, Arc<Mutex<Vec<String>>>) {
        let picks = Arc::new(Mutex::new(Vec::new()));
        let sink = picks.clone();
        let trigger: Trigger = Arc::new(move |entry: RosterEntry| {
            sink.lock().unwrap().push(entry.name);
        });
        (trigger, picks)
    }

    fn scheduler(interval: u64) -> AutoScheduler {
        let sched = AutoScheduler::with_rng(&SchedulerConfig::default(), StdRng::seed_from_u64(9));
        sched.set_interval(interval).unwrap();
        sched
    }

    #[test]
    fn test_interval_bounds() {
        let sched = AutoScheduler::new(&SchedulerConfig::default());
        assert_eq!(sched.interval_secs(), 30);
        assert_eq!(
            sched.set_interval(9),
            Err(SchedulerError::IntervalOutOfRange { value: 9, min: 10, max: 300 })
        );
        assert!(sched.set_interval(301).is_err());
        sched.set_interval(10).unwrap();
        sched.set_interval(300).unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_host_never_selected() {
        let sched = scheduler(10);
        let (trigger, picks) = recorder();
        assert!(sched.start(scenario_roster(), trigger));

        tokio::time::sleep(Duration::from_secs(10 * 200 + 5)).await;
        sched.stop();

        let picks = picks.lock().unwrap().clone();
        assert_eq!(picks.len(), 200);
        let distinct: HashSet<&str> = picks.iter().map(String::as_str).collect();
        assert_eq!(distinct, HashSet::from(["Alice", "Bob"]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_pick_after_one_interval() {
        let sched = scheduler(30);
        let (trigger, picks) = recorder();
        sched.start(scenario_roster(), trigger);

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert!(picks.lock().unwrap().is_empty());
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(picks.lock().unwrap().len(), 1);
        assert!(sched.next_target().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_locked_while_active() {
        let sched = scheduler(10);
        let (trigger, _picks) = recorder();
        sched.start(scenario_roster(), trigger.clone());
        assert!(!sched.start(scenario_roster(), trigger));
        assert_eq!(sched.set_interval(60), Err(SchedulerError::ActiveIntervalChange));
        sched.stop();
        sched.set_interval(60).unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_eligible_set_is_noop() {
        let sched = scheduler(10);
        let roster = Roster::new();
        roster.replace(vec![RosterEntry::new("Host", "HOST001")]);
        let (trigger, picks) = recorder();
        sched.start(roster, trigger);

        tokio::time::sleep(Duration::from_secs(55)).await;
        assert!(picks.lock().unwrap().is_empty());
        assert!(sched.is_active());
        assert_eq!(sched.next_target(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_clears_next_target_and_halts() {
        let sched = scheduler(10);
        let (trigger, picks) = recorder();
        sched.start(scenario_roster(), trigger);
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(sched.next_target().is_some());

        sched.stop();
        assert_eq!(sched.next_target(), None);
        assert!(!sched.is_active());
        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(picks.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_counts() {
        let sched = scheduler(10);
        let roster = scenario_roster();
        let status = sched.status(&roster);
        assert_eq!(status.total_participants, 3);
        assert_eq!(status.eligible_participants, 2);
        assert!(!status.active);
        assert_eq!(status.interval_secs, 10);
    }
}
