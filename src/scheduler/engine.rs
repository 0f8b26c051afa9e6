use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, warn};

use super::{SchedulerInner, Trigger};
use crate::roster::{Roster, RosterEntry};

/// Pick one entry uniformly at random.
pub fn pick_target<R: Rng + ?Sized>(eligible: &[RosterEntry], rng: &mut R) -> Option<RosterEntry> {
    eligible.choose(rng).cloned()
}

/// Auto-trigger loop. Runs until aborted by `AutoScheduler::stop` or until
/// the scheduler is dropped.
pub(super) async fn run_auto_loop(
    period: Duration,
    roster: Roster,
    trigger: Trigger,
    rng: Arc<Mutex<StdRng>>,
    state: Weak<Mutex<SchedulerInner>>,
) {
    info!(interval_secs = period.as_secs(), "automated attendance loop running");

    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

    loop {
        interval.tick().await;

        let eligible = roster.eligible();
        debug!(count = eligible.len(), "participants available for attendance");

        let picked = {
            let mut rng = rng.lock().unwrap_or_else(PoisonError::into_inner);
            pick_target(&eligible, &mut *rng)
        };

        let Some(entry) = picked else {
            warn!("no non-host participants available for attendance check");
            continue;
        };

        match state.upgrade() {
            Some(inner) => {
                inner
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .next_target = Some(entry.name.clone());
            }
            None => return,
        }

        info!(target = %entry.name, roll = %entry.roll, "auto-selecting participant for attendance check");
        trigger(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_pick_from_empty_is_none() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(pick_target(&[], &mut rng).is_none());
    }

    #[test]
    fn test_pick_is_roughly_uniform() {
        let mut rng = StdRng::seed_from_u64(5);
        let entries = vec![
            RosterEntry::new("Alice", "ST001"),
            RosterEntry::new("Bob", "ST002"),
            RosterEntry::new("Carol", "ST003"),
        ];
        let mut counts = [0usize; 3];
        for _ in 0..3000 {
            let pick = pick_target(&entries, &mut rng).unwrap();
            let idx = entries.iter().position(|e| e == &pick).unwrap();
            counts[idx] += 1;
        }
        assert!(counts.iter().all(|&c| (850..1150).contains(&c)), "{counts:?}");
    }
}
