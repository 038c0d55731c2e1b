//! SQLite-based save storage.
//!
//! Provides persistent storage for:
//! - The per-player session snapshot and paused puzzle (kv table, JSON)
//! - Per-puzzle best scores
//! - Completed session records and aggregate stats

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::store::{PausedPuzzle, SaveStore, SessionRecord};
use super::data_dir;
use crate::doors::SessionSnapshot;
use crate::error::DatabaseError;
use crate::puzzle::{Difficulty, PuzzleSave};
use crate::session::UserId;

/// Aggregate play statistics for one player.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlayerStats {
    pub sessions_won: u64,
    pub best_session_score: u32,
    pub fastest_escape_secs: Option<u64>,
    pub puzzles_completed: u64,
}

/// SQLite database implementing [`SaveStore`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at the data dir (`escapade.db`).
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, DatabaseError> {
        let dir = data_dir()
            .map_err(|e| DatabaseError::QueryFailed(format!("data dir unavailable: {e}")))?;
        Self::open_at(&dir.join("escapade.db"))
    }

    /// Open a database at an explicit path.
    pub fn open_at(path: &std::path::Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (tests, throwaway sessions).
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory().map_err(|source| DatabaseError::OpenFailed {
            path: ":memory:".into(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS puzzle_scores (
                    user_id      TEXT NOT NULL,
                    puzzle_id    TEXT NOT NULL,
                    best_score   INTEGER NOT NULL,
                    completed_at TEXT NOT NULL,
                    PRIMARY KEY (user_id, puzzle_id)
                );

                CREATE TABLE IF NOT EXISTS session_records (
                    id           INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id      TEXT NOT NULL,
                    difficulty   TEXT NOT NULL,
                    score        INTEGER NOT NULL,
                    elapsed_secs INTEGER NOT NULL,
                    completed_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_session_records_user
                    ON session_records(user_id);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn kv_delete(&self, key: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn paused_key(user: UserId) -> String {
        format!("paused_puzzle:{user}")
    }

    fn session_key(user: UserId) -> String {
        format!("session:{user}")
    }

    /// Completed session history, newest first.
    pub fn session_history(&self, user: UserId) -> Result<Vec<SessionRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, difficulty, score, elapsed_secs, completed_at
             FROM session_records
             WHERE user_id = ?1
             ORDER BY completed_at DESC",
        )?;
        let rows = stmt.query_map(params![user.to_string()], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, u64>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, difficulty, score, elapsed_secs, completed_at) = row?;
            let difficulty = difficulty
                .parse::<Difficulty>()
                .map_err(DatabaseError::Serialization)?;
            let completed_at = completed_at
                .parse::<DateTime<Utc>>()
                .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
            records.push(SessionRecord {
                id,
                difficulty,
                score,
                elapsed_secs,
                completed_at,
            });
        }
        Ok(records)
    }

    /// Aggregate stats across all completed sessions and puzzles.
    pub fn stats(&self, user: UserId) -> Result<PlayerStats, DatabaseError> {
        let (sessions_won, best_session_score, fastest): (u64, u32, Option<u64>) =
            self.conn.query_row(
                "SELECT COUNT(*), COALESCE(MAX(score), 0), MIN(elapsed_secs)
                 FROM session_records
                 WHERE user_id = ?1",
                params![user.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;
        let puzzles_completed: u64 = self.conn.query_row(
            "SELECT COUNT(*) FROM puzzle_scores WHERE user_id = ?1",
            params![user.to_string()],
            |row| row.get(0),
        )?;
        Ok(PlayerStats {
            sessions_won,
            best_session_score,
            fastest_escape_secs: fastest,
            puzzles_completed,
        })
    }
}

impl SaveStore for Database {
    fn save_paused_puzzle(
        &self,
        user: UserId,
        puzzle_id: &str,
        state: &PuzzleSave,
    ) -> Result<(), DatabaseError> {
        let record = PausedPuzzle {
            puzzle_id: puzzle_id.to_string(),
            state: state.clone(),
        };
        let json = serde_json::to_string(&record)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
        self.kv_set(&Self::paused_key(user), &json)
    }

    fn load_paused_puzzle(&self, user: UserId) -> Result<Option<PausedPuzzle>, DatabaseError> {
        match self.kv_get(&Self::paused_key(user))? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| DatabaseError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    fn clear_paused_puzzle(&self, user: UserId) -> Result<(), DatabaseError> {
        self.kv_delete(&Self::paused_key(user))
    }

    fn save_session_snapshot(
        &self,
        user: UserId,
        snapshot: &SessionSnapshot,
    ) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(snapshot)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
        self.kv_set(&Self::session_key(user), &json)
    }

    fn load_session_snapshot(
        &self,
        user: UserId,
    ) -> Result<Option<SessionSnapshot>, DatabaseError> {
        match self.kv_get(&Self::session_key(user))? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| DatabaseError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    fn clear_session_snapshot(&self, user: UserId) -> Result<(), DatabaseError> {
        self.kv_delete(&Self::session_key(user))
    }

    fn record_puzzle_completion(
        &self,
        user: UserId,
        puzzle_id: &str,
        score: u32,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO puzzle_scores (user_id, puzzle_id, best_score, completed_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (user_id, puzzle_id)
             DO UPDATE SET best_score = MAX(best_score, excluded.best_score),
                           completed_at = excluded.completed_at",
            params![
                user.to_string(),
                puzzle_id,
                score,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn record_session_completion(
        &self,
        user: UserId,
        difficulty: Difficulty,
        score: u32,
        elapsed_secs: u64,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO session_records (user_id, difficulty, score, elapsed_secs, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.to_string(),
                difficulty.as_str(),
                score,
                elapsed_secs,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn best_score(&self, user: UserId, puzzle_id: &str) -> Result<u32, DatabaseError> {
        let score = self.conn.query_row(
            "SELECT COALESCE(MAX(best_score), 0) FROM puzzle_scores
             WHERE user_id = ?1 AND puzzle_id = ?2",
            params![user.to_string(), puzzle_id],
            |row| row.get(0),
        )?;
        Ok(score)
    }

    fn is_puzzle_completed(&self, user: UserId, puzzle_id: &str) -> Result<bool, DatabaseError> {
        let count: u64 = self.conn.query_row(
            "SELECT COUNT(*) FROM puzzle_scores WHERE user_id = ?1 AND puzzle_id = ?2",
            params![user.to_string(), puzzle_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::{MazeSave, PuzzleSave};

    fn maze_save() -> PuzzleSave {
        PuzzleSave::Maze(MazeSave {
            rows: vec!["S.".into(), ".E".into()],
            player: (0, 1),
            moves: 1,
        })
    }

    #[test]
    fn paused_puzzle_roundtrip_and_clear() {
        let db = Database::open_memory().unwrap();
        let user = UserId::new();
        assert!(db.load_paused_puzzle(user).unwrap().is_none());

        db.save_paused_puzzle(user, "easy-cellar-maze", &maze_save())
            .unwrap();
        let loaded = db.load_paused_puzzle(user).unwrap().unwrap();
        assert_eq!(loaded.puzzle_id, "easy-cellar-maze");

        db.clear_paused_puzzle(user).unwrap();
        assert!(db.load_paused_puzzle(user).unwrap().is_none());
        // Clearing again is harmless.
        db.clear_paused_puzzle(user).unwrap();
    }

    #[test]
    fn puzzle_completion_keeps_best_score() {
        let db = Database::open_memory().unwrap();
        let user = UserId::new();
        assert_eq!(db.best_score(user, "p1").unwrap(), 0);
        assert!(!db.is_puzzle_completed(user, "p1").unwrap());

        db.record_puzzle_completion(user, "p1", 80).unwrap();
        db.record_puzzle_completion(user, "p1", 60).unwrap();
        db.record_puzzle_completion(user, "p1", 95).unwrap();

        assert_eq!(db.best_score(user, "p1").unwrap(), 95);
        assert!(db.is_puzzle_completed(user, "p1").unwrap());
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("escapade.db");
        let user = UserId::new();
        {
            let db = Database::open_at(&path).unwrap();
            db.record_puzzle_completion(user, "p1", 42).unwrap();
            db.save_paused_puzzle(user, "p1", &maze_save()).unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.best_score(user, "p1").unwrap(), 42);
        assert_eq!(
            db.load_paused_puzzle(user).unwrap().unwrap().puzzle_id,
            "p1"
        );
    }

    #[test]
    fn session_records_feed_stats() {
        let db = Database::open_memory().unwrap();
        let user = UserId::new();
        db.record_session_completion(user, Difficulty::Easy, 310, 420)
            .unwrap();
        db.record_session_completion(user, Difficulty::Hard, 700, 280)
            .unwrap();
        db.record_puzzle_completion(user, "p1", 50).unwrap();

        let stats = db.stats(user).unwrap();
        assert_eq!(stats.sessions_won, 2);
        assert_eq!(stats.best_session_score, 700);
        assert_eq!(stats.fastest_escape_secs, Some(280));
        assert_eq!(stats.puzzles_completed, 1);

        let history = db.session_history(user).unwrap();
        assert_eq!(history.len(), 2);

        // Another player's stats stay empty.
        let other = UserId::new();
        assert_eq!(db.stats(other).unwrap().sessions_won, 0);
    }
}
