//! Pointer and keyboard activity tracking
//!
//! The heartbeat producer reports whether the participant has interacted with
//! pointer or keyboard recently. Any pointer-move, pointer-press, or
//! key-press event resets the idle clock; the participant counts as active
//! while the idle time is strictly below [`IDLE_THRESHOLD_MS`].

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Idle boundary in milliseconds. The boundary itself is idle:
/// `idle_ms == 1500` reports inactive.
pub const IDLE_THRESHOLD_MS: u64 = 1500;

/// Input event kinds that qualify as interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    PointerMove,
    PointerPress,
    KeyPress,
}

/// A timestamped qualifying input event
#[derive(Debug, Clone, Copy)]
pub struct InputMark {
    pub kind: InputKind,
    pub at: Instant,
}

impl InputMark {
    pub fn now(kind: InputKind) -> Self {
        Self {
            kind,
            at: Instant::now(),
        }
    }
}

/// Snapshot of the activity state at one heartbeat tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatSample {
    pub active: bool,
    pub idle_ms: u64,
}

/// Tracks the timestamp of the most recent qualifying interaction
#[derive(Debug, Clone)]
pub struct PointerActivity {
    last_interaction: Instant,
}

impl PointerActivity {
    /// Start tracking; the creation time counts as the first interaction
    pub fn new(now: Instant) -> Self {
        Self {
            last_interaction: now,
        }
    }

    /// Record a qualifying interaction. Marks drained out of order never
    /// move the clock backwards.
    pub fn mark(&mut self, at: Instant) {
        if at > self.last_interaction {
            self.last_interaction = at;
        }
    }

    /// Derive the activity state for the current instant
    pub fn sample(&self, now: Instant) -> HeartbeatSample {
        let idle_ms = now
            .saturating_duration_since(self.last_interaction)
            .as_millis() as u64;
        HeartbeatSample {
            active: idle_ms < IDLE_THRESHOLD_MS,
            idle_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn test_idle_boundary_is_exclusive() {
        let start = Instant::now();
        let activity = PointerActivity::new(start);

        let just_under = activity.sample(start + Duration::from_millis(1499));
        assert_eq!(
            just_under,
            HeartbeatSample {
                active: true,
                idle_ms: 1499
            }
        );

        let at_boundary = activity.sample(start + Duration::from_millis(1500));
        assert_eq!(
            at_boundary,
            HeartbeatSample {
                active: false,
                idle_ms: 1500
            }
        );
    }

    #[test]
    fn test_mark_resets_idle_clock() {
        let start = Instant::now();
        let mut activity = PointerActivity::new(start);

        activity.mark(start + Duration::from_secs(10));
        let sample = activity.sample(start + Duration::from_millis(10_200));
        assert_eq!(sample.idle_ms, 200);
        assert!(sample.active);
    }

    #[test]
    fn test_out_of_order_marks_keep_latest() {
        let start = Instant::now();
        let mut activity = PointerActivity::new(start);

        activity.mark(start + Duration::from_secs(5));
        activity.mark(start + Duration::from_secs(2));

        let sample = activity.sample(start + Duration::from_secs(6));
        assert_eq!(sample.idle_ms, 1000);
    }

    #[test]
    fn test_sample_before_last_interaction_saturates() {
        let start = Instant::now();
        let mut activity = PointerActivity::new(start);
        activity.mark(start + Duration::from_secs(3));

        let sample = activity.sample(start + Duration::from_secs(1));
        assert_eq!(sample.idle_ms, 0);
        assert!(sample.active);
    }
}
