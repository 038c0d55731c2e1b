use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::puzzle::Difficulty;

/// Every externally significant state change produces an Event.
/// The CLI prints them; tests assert on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        limit_secs: u64,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// The countdown reached zero; the session is lost.
    TimeExpired {
        limit_secs: u64,
        at: DateTime<Utc>,
    },
    DoorOpened {
        door: u8,
        puzzle_id: String,
        /// True when the puzzle was rebuilt from a paused save rather
        /// than initialized fresh.
        resumed: bool,
        at: DateTime<Utc>,
    },
    DoorCompleted {
        door: u8,
        puzzle_id: String,
        won: bool,
        score: u32,
        at: DateTime<Utc>,
    },
    PuzzleSaved {
        door: u8,
        puzzle_id: String,
        at: DateTime<Utc>,
    },
    SessionSaved {
        completed_doors: u8,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    SessionWon {
        difficulty: Difficulty,
        score: u32,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// Session state was destroyed (victory, timeout or abandonment).
    SessionCleared {
        at: DateTime<Utc>,
    },
}
