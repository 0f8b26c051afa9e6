//! Face verification seam.
//!
//! No image analysis happens here. `SimulatedVerifier` passes a frame that is
//! present with probability `1 - failure_threshold`; a real recognizer can be
//! dropped in behind `FaceVerifier` without touching the session flow.

use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::capture::Frame;

pub trait FaceVerifier: Send + Sync {
    /// Decide whether `frame` shows the expected participant.
    fn verify(&self, frame: &Frame) -> bool;
}

pub struct SimulatedVerifier {
    rng: Mutex<StdRng>,
    failure_threshold: f64,
}

impl SimulatedVerifier {
    pub fn new(failure_threshold: f64) -> Self {
        Self::with_rng(failure_threshold, StdRng::from_entropy())
    }

    pub fn with_rng(failure_threshold: f64, rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            failure_threshold,
        }
    }

    pub fn seeded(failure_threshold: f64, seed: u64) -> Self {
        Self::with_rng(failure_threshold, StdRng::seed_from_u64(seed))
    }
}

impl FaceVerifier for SimulatedVerifier {
    fn verify(&self, frame: &Frame) -> bool {
        if !frame.present {
            return false;
        }
        let draw: f64 = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen();
        draw > self.failure_threshold
    }
}

/// Verifier with a fixed answer, for tests and demos.
pub struct FixedVerifier(pub bool);

impl FaceVerifier for FixedVerifier {
    fn verify(&self, frame: &Frame) -> bool {
        self.0 && frame.present
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_frame_never_verifies() {
        let v = SimulatedVerifier::seeded(0.0, 3);
        assert!((0..100).all(|_| !v.verify(&Frame::EMPTY)));
    }

    #[test]
    fn test_success_rate_near_ninety_percent() {
        let v = SimulatedVerifier::seeded(0.1, 42);
        let frame = Frame { present: true };
        let trials = 10_000;
        let passed = (0..trials).filter(|_| v.verify(&frame)).count();
        let rate = passed as f64 / trials as f64;
        assert!((0.87..0.93).contains(&rate), "rate {rate}");
    }

    #[test]
    fn test_fixed_verifier_requires_frame() {
        assert!(FixedVerifier(true).verify(&Frame { present: true }));
        assert!(!FixedVerifier(true).verify(&Frame::EMPTY));
        assert!(!FixedVerifier(false).verify(&Frame { present: true }));
    }
}
