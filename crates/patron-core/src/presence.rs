//! Presence tracker — periodic continuity check for a fixed identity.
//!
//! Once a person is recognized or enrolled, the kiosk only needs to know
//! that the *same* person is still standing there. Checks run on the full
//! frame (the person may shift out of the acquisition ROI), use plain
//! cosine with a loose threshold, and are throttled to a fixed wall-clock
//! interval to bound CPU. Loss tolerance is counted in checks, not raw
//! frames, so it stays correct under any frame rate.

use crate::types::Embedding;
use std::time::{Duration, Instant};

/// Result of one presence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// The target was seen; the loss counter reset.
    Confirmed,
    /// No face met the threshold this check.
    Missing { consecutive: u32 },
    /// The loss tolerance was exhausted. Emitted exactly once; the tracker
    /// is terminal afterwards and the caller should end the session.
    SessionLost,
}

impl Presence {
    pub fn is_present(&self) -> bool {
        matches!(self, Presence::Confirmed)
    }
}

/// Tracks whether the enrolled/matched person is still in front of the kiosk.
///
/// State machine: `TRACKING --(present)--> TRACKING`,
/// `TRACKING --(absent, counter <= max)--> TRACKING`,
/// `TRACKING --(absent, counter at max)--> LOST` (terminal).
pub struct PresenceTracker {
    target: Embedding,
    similarity_threshold: f32,
    max_lost_checks: u32,
    check_interval: Duration,
    lost_count: u32,
    last_check: Option<Instant>,
    lost: bool,
}

impl PresenceTracker {
    pub fn new(
        target: Embedding,
        similarity_threshold: f32,
        max_lost_checks: u32,
        check_interval: Duration,
    ) -> Self {
        Self {
            target,
            similarity_threshold,
            max_lost_checks,
            check_interval,
            lost_count: 0,
            last_check: None,
            lost: false,
        }
    }

    /// True once the session has been lost; the tracker stays lost.
    pub fn is_lost(&self) -> bool {
        self.lost
    }

    /// Consecutive failed checks so far.
    pub fn lost_count(&self) -> u32 {
        self.lost_count
    }

    /// True when enough wall-clock time has passed for the next check.
    /// Callers use this to skip face detection entirely on throttled frames.
    pub fn is_ready(&self, now: Instant) -> bool {
        match self.last_check {
            Some(last) => now.duration_since(last) >= self.check_interval,
            None => true,
        }
    }

    /// One presence check at `now` over the embeddings of every face
    /// detected in the full frame.
    ///
    /// Returns `None` when called before the throttle interval has elapsed;
    /// throttled calls do not count toward the loss tolerance.
    pub fn check_at(&mut self, now: Instant, frame_faces: &[Embedding]) -> Option<Presence> {
        if let Some(last) = self.last_check {
            if now.duration_since(last) < self.check_interval {
                return None;
            }
        }
        self.last_check = Some(now);

        // Terminal: once the session is lost it stays lost, even if the
        // person steps back into view. SessionLost fired on the transition.
        if self.lost {
            return Some(Presence::Missing { consecutive: self.lost_count });
        }

        let present = frame_faces
            .iter()
            .any(|e| e.similarity(&self.target) >= self.similarity_threshold);

        if present {
            self.lost_count = 0;
            return Some(Presence::Confirmed);
        }

        self.lost_count += 1;
        // Lost once the tolerance is exhausted: the counter must pass
        // `max_lost_checks`, so MAX misses are forgiven and the MAX+1'th
        // ends the session.
        if self.lost_count > self.max_lost_checks {
            self.lost = true;
            tracing::info!(checks = self.lost_count, "presence lost, session over");
            return Some(Presence::SessionLost);
        }

        Some(Presence::Missing { consecutive: self.lost_count })
    }

    /// Convenience wrapper over [`check_at`](Self::check_at) using the
    /// current wall-clock time.
    pub fn check(&mut self, frame_faces: &[Embedding]) -> Option<Presence> {
        self.check_at(Instant::now(), frame_faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_secs(3);

    fn target() -> Embedding {
        Embedding::new(vec![1.0, 0.0, 0.0])
    }

    fn stranger() -> Embedding {
        Embedding::new(vec![0.0, 1.0, 0.0])
    }

    fn tracker(max_lost: u32) -> (PresenceTracker, Instant) {
        (
            PresenceTracker::new(target(), 0.45, max_lost, INTERVAL),
            Instant::now(),
        )
    }

    #[test]
    fn test_target_face_confirms() {
        let (mut t, now) = tracker(3);
        let r = t.check_at(now, &[stranger(), target()]);
        assert_eq!(r, Some(Presence::Confirmed));
        assert_eq!(t.lost_count(), 0);
    }

    #[test]
    fn test_stranger_only_is_missing() {
        let (mut t, now) = tracker(3);
        let r = t.check_at(now, &[stranger()]);
        assert_eq!(r, Some(Presence::Missing { consecutive: 1 }));
        assert!(!t.is_lost());
    }

    #[test]
    fn test_lost_after_exactly_max_checks() {
        let (mut t, start) = tracker(2);
        let mut lost_signals = 0;

        for i in 0..6u32 {
            let now = start + INTERVAL * i;
            let r = t.check_at(now, &[]).unwrap();
            assert!(!r.is_present());
            if r == Presence::SessionLost {
                lost_signals += 1;
                // Tolerance of 2: the third consecutive miss ends the session.
                assert_eq!(i, 2);
            }
        }

        assert_eq!(lost_signals, 1);
        assert!(t.is_lost());
    }

    #[test]
    fn test_success_resets_counter() {
        let (mut t, start) = tracker(3);
        assert_eq!(
            t.check_at(start, &[]),
            Some(Presence::Missing { consecutive: 1 })
        );
        assert_eq!(
            t.check_at(start + INTERVAL, &[]),
            Some(Presence::Missing { consecutive: 2 })
        );
        assert_eq!(
            t.check_at(start + INTERVAL * 2, &[target()]),
            Some(Presence::Confirmed)
        );
        // Counter restarted: two more misses still don't lose the session.
        assert_eq!(
            t.check_at(start + INTERVAL * 3, &[]),
            Some(Presence::Missing { consecutive: 1 })
        );
        assert!(!t.is_lost());
    }

    #[test]
    fn test_lost_is_terminal_even_if_face_returns() {
        let (mut t, start) = tracker(1);
        assert_eq!(
            t.check_at(start, &[]),
            Some(Presence::Missing { consecutive: 1 })
        );
        assert_eq!(
            t.check_at(start + INTERVAL, &[]),
            Some(Presence::SessionLost)
        );

        // The person stepping back into view does not revive the session.
        let r = t.check_at(start + INTERVAL * 2, &[target()]);
        assert_eq!(r, Some(Presence::Missing { consecutive: 2 }));
        assert!(t.is_lost());
        assert_eq!(t.lost_count(), 2);
    }

    #[test]
    fn test_throttled_calls_not_counted() {
        let (mut t, start) = tracker(2);
        assert!(t.check_at(start, &[]).is_some());
        // A hair under the interval later: ignored.
        assert!(t
            .check_at(start + INTERVAL - Duration::from_millis(1), &[])
            .is_none());
        assert_eq!(t.lost_count(), 1);
    }

    #[test]
    fn test_loose_threshold_accepts_near_match() {
        let (mut t, now) = tracker(3);
        // Cosine ~0.707 against the target: above the 0.45 continuity floor
        // even though it would fail the 0.8 identity threshold.
        let near = Embedding::new(vec![1.0, 1.0, 0.0]);
        assert_eq!(t.check_at(now, &[near]), Some(Presence::Confirmed));
    }
}
