//! Countdown state machine.
//!
//! The countdown is a pure state machine: it holds elapsed/limit seconds and
//! advances by exactly one second per `tick()` call. It does not read the
//! wall clock and does not own a thread -- [`SessionTimer`](super::SessionTimer)
//! delivers one tick per second while the game is live, and tests drive ticks
//! directly. Pause/resume therefore cannot lose or gain time regardless of
//! how long the machine sits paused.
//!
//! ## State Transitions
//!
//! ```text
//! Running -> Paused -> Running -> ... -> Expired
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountdownState {
    Running,
    Paused,
    Expired,
}

/// One delivered tick. All listeners of a tick round observe this same pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub elapsed_secs: u64,
    pub remaining_secs: u64,
    /// True exactly once, on the tick that consumed the last second.
    pub expired: bool,
}

/// Core countdown state: elapsed seconds against a fixed limit.
///
/// `limit_secs` and the starting elapsed value are fixed at construction;
/// there is no path that changes the limit afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Countdown {
    limit_secs: u64,
    elapsed_secs: u64,
    state: CountdownState,
}

impl Countdown {
    /// Create a running countdown with `start_elapsed` seconds already spent.
    ///
    /// A limit of zero (or a start at or past the limit) expires on the very
    /// first tick rather than being rejected.
    pub fn new(limit_secs: u64, start_elapsed: u64) -> Self {
        Self {
            limit_secs,
            elapsed_secs: start_elapsed,
            state: CountdownState::Running,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn limit_secs(&self) -> u64 {
        self.limit_secs
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    /// Seconds left, clamped at zero.
    pub fn remaining_secs(&self) -> u64 {
        self.limit_secs.saturating_sub(self.elapsed_secs)
    }

    pub fn is_time_up(&self) -> bool {
        self.state == CountdownState::Expired
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Overwrite the elapsed counter (used when rebuilding from a snapshot).
    pub fn set_elapsed_secs(&mut self, secs: u64) {
        self.elapsed_secs = secs;
    }

    /// Suspend ticking. Returns false unless the countdown was running.
    pub fn pause(&mut self) -> bool {
        if self.state == CountdownState::Running {
            self.state = CountdownState::Paused;
            true
        } else {
            false
        }
    }

    /// Continue ticking after a pause. Elapsed time is untouched.
    pub fn resume(&mut self) -> bool {
        if self.state == CountdownState::Paused {
            self.state = CountdownState::Running;
            true
        } else {
            false
        }
    }

    /// Advance one second. Returns `None` while paused or expired.
    pub fn tick(&mut self) -> Option<Tick> {
        if self.state != CountdownState::Running {
            return None;
        }
        self.elapsed_secs += 1;
        let remaining = self.remaining_secs();
        if remaining == 0 {
            self.state = CountdownState::Expired;
        }
        Some(Tick {
            elapsed_secs: self.elapsed_secs,
            remaining_secs: remaining,
            expired: remaining == 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_down_to_expiry() {
        let mut c = Countdown::new(3, 0);
        assert_eq!(c.remaining_secs(), 3);

        let t = c.tick().unwrap();
        assert_eq!(t.remaining_secs, 2);
        assert!(!t.expired);

        c.tick().unwrap();
        let last = c.tick().unwrap();
        assert!(last.expired);
        assert_eq!(last.remaining_secs, 0);
        assert!(c.is_time_up());
        assert!(c.tick().is_none());
    }

    #[test]
    fn zero_limit_expires_on_first_tick() {
        let mut c = Countdown::new(0, 0);
        assert_eq!(c.remaining_secs(), 0);
        let t = c.tick().unwrap();
        assert!(t.expired);
        assert!(c.is_time_up());
    }

    #[test]
    fn start_elapsed_counts_against_limit() {
        let mut c = Countdown::new(10, 8);
        assert_eq!(c.remaining_secs(), 2);
        c.tick().unwrap();
        let t = c.tick().unwrap();
        assert!(t.expired);
        assert_eq!(t.elapsed_secs, 10);
    }

    #[test]
    fn pause_blocks_ticks_and_keeps_elapsed() {
        let mut c = Countdown::new(10, 0);
        c.tick().unwrap();
        assert!(c.pause());
        assert!(c.tick().is_none());
        assert_eq!(c.elapsed_secs(), 1);
        assert!(c.resume());
        c.tick().unwrap();
        assert_eq!(c.elapsed_secs(), 2);
    }

    #[test]
    fn pause_and_resume_are_state_checked() {
        let mut c = Countdown::new(10, 0);
        assert!(!c.resume());
        assert!(c.pause());
        assert!(!c.pause());
    }
}
