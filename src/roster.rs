//! Meeting roster and roll-number normalization.
//!
//! Rolls follow a two-prefix convention: hosts carry `HOST###`, everybody
//! else `ST###`. The roster is replaced wholesale on every membership
//! snapshot from the video layer and each entry's roll is normalized on the
//! way in.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const HOST_PREFIX: &str = "HOST";
pub const STUDENT_PREFIX: &str = "ST";

/// A participant as shown in the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub name: String,
    pub roll: String,
}

impl RosterEntry {
    pub fn new(name: impl Into<String>, roll: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roll: roll.into(),
        }
    }

    pub fn is_host(&self) -> bool {
        self.roll.starts_with(HOST_PREFIX)
    }
}

/// `true` if `roll` is `prefix` followed by one to three ASCII digits.
pub fn is_valid_roll(prefix: &str, roll: &str) -> bool {
    match roll.strip_prefix(prefix) {
        Some(digits) => {
            (1..=3).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// `true` if `roll` is a well-formed `HOST###` or `ST###`.
pub fn is_normalized(roll: &str) -> bool {
    is_valid_roll(HOST_PREFIX, roll) || is_valid_roll(STUDENT_PREFIX, roll)
}

/// Draw a fresh roll: `prefix` plus a zero-padded suffix in 000..=998.
pub fn generate_roll<R: Rng + ?Sized>(prefix: &str, rng: &mut R) -> String {
    format!("{}{:03}", prefix, rng.gen_range(0..999))
}

fn prefix_of(roll: &str) -> &'static str {
    if roll.starts_with(HOST_PREFIX) {
        HOST_PREFIX
    } else {
        STUDENT_PREFIX
    }
}

/// Normalize one roll with no memory of earlier snapshots: a well-formed
/// roll is kept, anything else gets a fresh roll under its prefix.
pub fn normalize_roll<R: Rng + ?Sized>(roll: &str, rng: &mut R) -> String {
    let prefix = prefix_of(roll);
    if is_valid_roll(prefix, roll) {
        roll.to_string()
    } else {
        generate_roll(prefix, rng)
    }
}

struct RosterInner {
    entries: Vec<RosterEntry>,
    /// Rolls synthesized for a name earlier in the session.
    assigned: HashMap<String, String>,
    rng: StdRng,
}

impl RosterInner {
    fn normalize(&mut self, raw: RosterEntry) -> RosterEntry {
        let prefix = prefix_of(&raw.roll);

        if is_valid_roll(prefix, &raw.roll) {
            self.assigned.insert(raw.name.clone(), raw.roll.clone());
            return raw;
        }

        let roll = match self.assigned.get(&raw.name) {
            Some(known) if is_valid_roll(prefix, known) => known.clone(),
            _ => {
                let fresh = normalize_roll(&raw.roll, &mut self.rng);
                debug!(name = %raw.name, from = %raw.roll, to = %fresh, "assigned roll");
                self.assigned.insert(raw.name.clone(), fresh.clone());
                fresh
            }
        };

        RosterEntry {
            name: raw.name,
            roll,
        }
    }
}

/// Shared roster handle. Cloning shares the same underlying list.
#[derive(Clone)]
pub struct Roster {
    inner: Arc<RwLock<RosterInner>>,
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}

impl Roster {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Build a roster whose synthesized rolls come from `rng`.
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            inner: Arc::new(RwLock::new(RosterInner {
                entries: Vec::new(),
                assigned: HashMap::new(),
                rng,
            })),
        }
    }

    /// Replace the whole roster with a normalized copy of `snapshot`.
    ///
    /// A host or participant whose roll had to be synthesized keeps that roll
    /// on later snapshots, so roll identity is stable for the meeting.
    pub fn replace(&self, snapshot: Vec<RosterEntry>) -> Vec<RosterEntry> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let normalized: Vec<RosterEntry> = snapshot
            .into_iter()
            .map(|entry| inner.normalize(entry))
            .collect();
        inner.entries = normalized.clone();
        normalized
    }

    /// Normalize a single entry without touching the list.
    pub fn normalize(&self, entry: RosterEntry) -> RosterEntry {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.normalize(entry)
    }

    pub fn snapshot(&self) -> Vec<RosterEntry> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.entries.clone()
    }

    pub fn find(&self, name: &str) -> Option<RosterEntry> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.entries.iter().find(|e| e.name == name).cloned()
    }

    /// Entries that may be picked for an attendance check (non-hosts).
    pub fn eligible(&self) -> Vec<RosterEntry> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .entries
            .iter()
            .filter(|e| !e.is_host())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
