//! The five-door sequential state machine.
//!
//! Doors unlock strictly in order: door n+1 becomes available only once
//! doors 1..=n are completed, so the completion flags always form a prefix
//! of the sequence. The same transition rule drives forward play and
//! snapshot restoration, which is what makes `restore` equal to replaying
//! the completions from scratch.

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::puzzle::{Difficulty, Puzzle, DOOR_COUNT};
use crate::session::UserId;
use crate::storage::SaveStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorState {
    Locked,
    Available,
    Completed,
}

/// Presentation snapshot of the door board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoorBoard {
    pub door_states: Vec<DoorState>,
    pub completed_count: u8,
    /// Absent once the session is complete.
    pub next_available_door: Option<u8>,
}

/// Persisted form of a session: everything needed to rebuild the door board
/// and resume the countdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub user_id: UserId,
    pub difficulty: Difficulty,
    pub doors: Vec<DoorSnapshot>,
    pub elapsed_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoorSnapshot {
    pub puzzle_id: String,
    pub completed: bool,
}

#[derive(Debug, Clone)]
struct DoorSlot {
    puzzle_id: String,
    completed: bool,
}

/// The in-memory door session.
#[derive(Debug, Clone)]
pub struct DoorSession {
    user_id: UserId,
    difficulty: Difficulty,
    doors: Vec<DoorSlot>,
    /// Countdown seconds at the last sync point (save, quit, completion).
    elapsed_secs: u64,
}

impl DoorSession {
    /// Create a fresh session with one puzzle assigned per door.
    /// Assignments are fixed for the session's lifetime.
    pub fn new(
        user_id: UserId,
        difficulty: Difficulty,
        puzzles: &[Puzzle],
    ) -> Result<Self, SessionError> {
        if puzzles.len() != DOOR_COUNT {
            return Err(SessionError::InvalidPuzzleData(format!(
                "a session needs {DOOR_COUNT} puzzles, got {}",
                puzzles.len()
            )));
        }
        Ok(Self {
            user_id,
            difficulty,
            doors: puzzles
                .iter()
                .map(|p| DoorSlot {
                    puzzle_id: p.id.clone(),
                    completed: false,
                })
                .collect(),
            elapsed_secs: 0,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn completed_count(&self) -> u8 {
        self.doors.iter().filter(|d| d.completed).count() as u8
    }

    pub fn is_session_complete(&self) -> bool {
        usize::from(self.completed_count()) == DOOR_COUNT
    }

    /// The lowest door not yet completed; `None` after victory.
    pub fn next_available_door(&self) -> Option<u8> {
        let next = self.completed_count() + 1;
        (usize::from(next) <= DOOR_COUNT).then_some(next)
    }

    /// State of door `n` derived from the completion prefix.
    pub fn door_state(&self, door: u8) -> Result<DoorState, SessionError> {
        let slot = self.slot(door)?;
        if slot.completed {
            Ok(DoorState::Completed)
        } else if self.next_available_door() == Some(door) {
            Ok(DoorState::Available)
        } else {
            Ok(DoorState::Locked)
        }
    }

    pub fn state(&self) -> DoorBoard {
        DoorBoard {
            door_states: (1..=DOOR_COUNT as u8)
                .map(|n| {
                    // Door numbers come from the valid range.
                    self.door_state(n).unwrap_or(DoorState::Locked)
                })
                .collect(),
            completed_count: self.completed_count(),
            next_available_door: self.next_available_door(),
        }
    }

    pub fn puzzle_id_for_door(&self, door: u8) -> Result<&str, SessionError> {
        Ok(&self.slot(door)?.puzzle_id)
    }

    fn slot(&self, door: u8) -> Result<&DoorSlot, SessionError> {
        if door == 0 || usize::from(door) > DOOR_COUNT {
            return Err(SessionError::NoSuchDoor { door });
        }
        Ok(&self.doors[usize::from(door) - 1])
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Check whether the player may enter door `n` right now.
    /// Rejections carry the reason and mutate nothing.
    pub fn attempt_enter_door(&self, door: u8) -> Result<(), SessionError> {
        match self.door_state(door)? {
            DoorState::Completed => Err(SessionError::DoorAlreadyCompleted { door }),
            DoorState::Locked => Err(SessionError::DoorLocked {
                door,
                // A locked door implies an earlier one is still open.
                next: self.next_available_door().unwrap_or(DOOR_COUNT as u8),
            }),
            DoorState::Available => Ok(()),
        }
    }

    /// Mark door `n` completed. Idempotent: re-marking a completed door
    /// returns `Ok(false)`. Completing out of order is a logic bug and
    /// fails loudly.
    pub fn mark_door_completed(&mut self, door: u8) -> Result<bool, SessionError> {
        if self.slot(door)?.completed {
            return Ok(false);
        }
        match self.next_available_door() {
            Some(next) if next == door => {
                self.doors[usize::from(door) - 1].completed = true;
                Ok(true)
            }
            next => Err(SessionError::DoorOrdering {
                door,
                next: next.unwrap_or(DOOR_COUNT as u8),
            }),
        }
    }

    /// Sync the countdown's elapsed seconds into the session.
    pub fn set_elapsed_secs(&mut self, secs: u64) {
        self.elapsed_secs = secs;
    }

    /// Sum of per-door best scores over completed doors.
    pub fn session_score(&self, store: &dyn SaveStore) -> Result<u32, crate::error::DatabaseError> {
        let mut total: u32 = 0;
        for slot in self.doors.iter().filter(|d| d.completed) {
            let best = store.best_score(self.user_id, &slot.puzzle_id)?;
            total = total.saturating_add(best);
        }
        Ok(total)
    }

    // ── Persistence ──────────────────────────────────────────────────

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            user_id: self.user_id,
            difficulty: self.difficulty,
            doors: self
                .doors
                .iter()
                .map(|d| DoorSnapshot {
                    puzzle_id: d.puzzle_id.clone(),
                    completed: d.completed,
                })
                .collect(),
            elapsed_secs: self.elapsed_secs,
        }
    }

    /// Rebuild a session from its persisted form.
    ///
    /// The completion flags must form a prefix -- the only shape forward
    /// play can produce. Anything else is a corrupt snapshot.
    pub fn restore(snapshot: &SessionSnapshot) -> Result<Self, SessionError> {
        if snapshot.doors.len() != DOOR_COUNT {
            return Err(SessionError::CorruptSnapshot(format!(
                "expected {DOOR_COUNT} doors, found {}",
                snapshot.doors.len()
            )));
        }
        let mut boundary_seen = false;
        for (i, door) in snapshot.doors.iter().enumerate() {
            if door.completed && boundary_seen {
                return Err(SessionError::CorruptSnapshot(format!(
                    "door {} is completed after an open door",
                    i + 1
                )));
            }
            if !door.completed {
                boundary_seen = true;
            }
        }
        Ok(Self {
            user_id: snapshot.user_id,
            difficulty: snapshot.difficulty,
            doors: snapshot
                .doors
                .iter()
                .map(|d| DoorSlot {
                    puzzle_id: d.puzzle_id.clone(),
                    completed: d.completed,
                })
                .collect(),
            elapsed_secs: snapshot.elapsed_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BuiltinCatalog, PuzzleCatalog};

    fn session() -> DoorSession {
        let catalog = BuiltinCatalog::default();
        let puzzles = catalog.assign_doors(Difficulty::Easy, 7).unwrap();
        DoorSession::new(UserId::new(), Difficulty::Easy, &puzzles).unwrap()
    }

    #[test]
    fn starts_with_door_one_available() {
        let s = session();
        let board = s.state();
        assert_eq!(board.door_states[0], DoorState::Available);
        assert!(board.door_states[1..]
            .iter()
            .all(|d| *d == DoorState::Locked));
        assert_eq!(board.next_available_door, Some(1));
        assert_eq!(board.completed_count, 0);
    }

    #[test]
    fn completing_a_door_unlocks_the_next() {
        let mut s = session();
        assert!(s.mark_door_completed(1).unwrap());
        assert_eq!(s.door_state(1).unwrap(), DoorState::Completed);
        assert_eq!(s.door_state(2).unwrap(), DoorState::Available);
        assert_eq!(s.door_state(3).unwrap(), DoorState::Locked);
    }

    #[test]
    fn entry_is_gated_by_the_boundary() {
        let mut s = session();
        s.mark_door_completed(1).unwrap();
        s.mark_door_completed(2).unwrap();

        assert!(matches!(
            s.attempt_enter_door(1),
            Err(SessionError::DoorAlreadyCompleted { door: 1 })
        ));
        assert!(s.attempt_enter_door(3).is_ok());
        assert!(matches!(
            s.attempt_enter_door(5),
            Err(SessionError::DoorLocked { door: 5, next: 3 })
        ));
        assert!(matches!(
            s.attempt_enter_door(9),
            Err(SessionError::NoSuchDoor { door: 9 })
        ));
    }

    #[test]
    fn re_marking_a_completed_door_is_a_no_op() {
        let mut s = session();
        assert!(s.mark_door_completed(1).unwrap());
        assert!(!s.mark_door_completed(1).unwrap());
        assert_eq!(s.completed_count(), 1);
    }

    #[test]
    fn out_of_order_completion_fails_loudly() {
        let mut s = session();
        assert!(matches!(
            s.mark_door_completed(3),
            Err(SessionError::DoorOrdering { door: 3, next: 1 })
        ));
        assert_eq!(s.completed_count(), 0);
    }

    #[test]
    fn all_five_doors_complete_the_session() {
        let mut s = session();
        for door in 1..=5 {
            assert!(!s.is_session_complete());
            s.mark_door_completed(door).unwrap();
        }
        assert!(s.is_session_complete());
        assert_eq!(s.next_available_door(), None);
        assert!(matches!(
            s.attempt_enter_door(3),
            Err(SessionError::DoorAlreadyCompleted { door: 3 })
        ));
    }

    #[test]
    fn restore_equals_forward_play() {
        let mut forward = session();
        forward.mark_door_completed(1).unwrap();
        forward.mark_door_completed(2).unwrap();
        forward.set_elapsed_secs(123);

        let restored = DoorSession::restore(&forward.snapshot()).unwrap();
        assert_eq!(restored.state().door_states, forward.state().door_states);
        assert_eq!(restored.door_state(3).unwrap(), DoorState::Available);
        assert_eq!(restored.door_state(4).unwrap(), DoorState::Locked);
        assert_eq!(restored.elapsed_secs(), 123);

        // Restoring the restored snapshot changes nothing.
        let again = DoorSession::restore(&restored.snapshot()).unwrap();
        assert_eq!(again.state().door_states, restored.state().door_states);
    }

    #[test]
    fn corrupt_snapshots_are_refused() {
        let mut s = session();
        s.mark_door_completed(1).unwrap();
        let mut snapshot = s.snapshot();
        // Punch a hole in the prefix.
        snapshot.doors[3].completed = true;
        assert!(matches!(
            DoorSession::restore(&snapshot),
            Err(SessionError::CorruptSnapshot(_))
        ));

        let mut short = s.snapshot();
        short.doors.pop();
        assert!(DoorSession::restore(&short).is_err());
    }
}
