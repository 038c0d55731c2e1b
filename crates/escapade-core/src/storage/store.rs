//! The persistence gateway seam.
//!
//! Game logic saves and loads through [`SaveStore`] and never cares what sits
//! behind it. [`Database`](super::Database) is the shipped SQLite
//! implementation; tests may substitute an in-memory database. An operation
//! is only considered saved once the store call returned `Ok` -- callers never
//! mark state completed optimistically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::doors::SessionSnapshot;
use crate::error::DatabaseError;
use crate::puzzle::{Difficulty, PuzzleSave};
use crate::session::UserId;

/// The single in-flight paused puzzle of a player.
///
/// At most one record exists per player; its existence implies the
/// associated door is not yet completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PausedPuzzle {
    pub puzzle_id: String,
    pub state: PuzzleSave,
}

/// One finished session, as recorded on victory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub difficulty: Difficulty,
    pub score: u32,
    pub elapsed_secs: u64,
    pub completed_at: DateTime<Utc>,
}

/// Durable store for session snapshots, paused puzzles and completion
/// records, keyed by player.
pub trait SaveStore {
    fn save_paused_puzzle(
        &self,
        user: UserId,
        puzzle_id: &str,
        state: &PuzzleSave,
    ) -> Result<(), DatabaseError>;

    fn load_paused_puzzle(&self, user: UserId) -> Result<Option<PausedPuzzle>, DatabaseError>;

    fn clear_paused_puzzle(&self, user: UserId) -> Result<(), DatabaseError>;

    fn save_session_snapshot(
        &self,
        user: UserId,
        snapshot: &SessionSnapshot,
    ) -> Result<(), DatabaseError>;

    fn load_session_snapshot(&self, user: UserId)
        -> Result<Option<SessionSnapshot>, DatabaseError>;

    fn clear_session_snapshot(&self, user: UserId) -> Result<(), DatabaseError>;

    /// Record a won puzzle. Keeps the best score across repeat completions.
    fn record_puzzle_completion(
        &self,
        user: UserId,
        puzzle_id: &str,
        score: u32,
    ) -> Result<(), DatabaseError>;

    fn record_session_completion(
        &self,
        user: UserId,
        difficulty: Difficulty,
        score: u32,
        elapsed_secs: u64,
    ) -> Result<(), DatabaseError>;

    /// Best recorded score for a puzzle; zero if never completed.
    fn best_score(&self, user: UserId, puzzle_id: &str) -> Result<u32, DatabaseError>;

    fn is_puzzle_completed(&self, user: UserId, puzzle_id: &str) -> Result<bool, DatabaseError>;
}
