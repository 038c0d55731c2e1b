//! The game session façade.
//!
//! [`GameSession`] wires the door state machine, the shared countdown and
//! the persistence gateway into the surface the presentation layer drives:
//! start or resume a run, enter doors, feed puzzle input, save or quit, and
//! settle victory, timeout and abandonment. All mutation happens on the
//! caller's thread; the countdown's tick side effects reach the caller
//! through the listener channel it registers.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::PuzzleCatalog;
use crate::doors::{DoorBoard, DoorSession};
use crate::error::{CoreError, SessionError};
use crate::events::Event;
use crate::lifecycle::{CompletionReport, PuzzleLifecycle};
use crate::puzzle::{Difficulty, InputOutcome, PuzzleView};
use crate::storage::SaveStore;
use crate::timer::SessionTimer;

/// Stable player identity. Store records and snapshots are keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Transient marker that the next puzzle entry should restore from the
/// paused record. Carries no history: whichever path consumes it clears it.
#[derive(Debug, Default)]
struct ResumeFlag(bool);

impl ResumeFlag {
    fn set(&mut self) {
        self.0 = true;
    }

    fn take(&mut self) -> bool {
        std::mem::take(&mut self.0)
    }

    fn is_set(&self) -> bool {
        self.0
    }
}

/// What one submitted input produced, seen from the session level.
#[derive(Debug)]
pub enum TurnOutcome {
    /// The puzzle is still in play.
    Puzzle(InputOutcome),
    /// The puzzle ended and the player is back at the door view.
    DoorFinished {
        report: CompletionReport,
        events: Vec<Event>,
    },
    /// The fifth door fell: the session is won and cleared.
    Victory {
        report: VictoryReport,
        events: Vec<Event>,
    },
}

/// Session-level completion record.
#[derive(Debug, Clone, Serialize)]
pub struct VictoryReport {
    pub difficulty: Difficulty,
    pub score: u32,
    pub elapsed_secs: u64,
}

/// One player's run through the five doors.
pub struct GameSession<'a> {
    store: &'a dyn SaveStore,
    catalog: &'a dyn PuzzleCatalog,
    timer: SessionTimer,
    user: UserId,
    limit_secs: u64,
    doors: DoorSession,
    resuming: ResumeFlag,
    active: Option<PuzzleLifecycle<'a>>,
}

impl<'a> GameSession<'a> {
    /// Start a brand new run: assign puzzles, persist the initial snapshot.
    /// Any previous snapshot or paused record for this player is replaced.
    pub fn start_new(
        store: &'a dyn SaveStore,
        catalog: &'a dyn PuzzleCatalog,
        timer: SessionTimer,
        user: UserId,
        difficulty: Difficulty,
        limit_secs: u64,
        seed: u64,
    ) -> Result<Self, CoreError> {
        let puzzles = catalog.assign_doors(difficulty, seed)?;
        let doors = DoorSession::new(user, difficulty, &puzzles)?;
        store.clear_paused_puzzle(user)?;
        store.save_session_snapshot(user, &doors.snapshot())?;
        Ok(Self {
            store,
            catalog,
            timer,
            user,
            limit_secs,
            doors,
            resuming: ResumeFlag::default(),
            active: None,
        })
    }

    /// Rebuild a run from the persisted snapshot. The countdown limit is
    /// derived from the snapshot's difficulty via `limit_for`. A paused
    /// puzzle record arms the resuming flag for the next door entry.
    pub fn resume(
        store: &'a dyn SaveStore,
        catalog: &'a dyn PuzzleCatalog,
        timer: SessionTimer,
        user: UserId,
        limit_for: impl FnOnce(Difficulty) -> u64,
    ) -> Result<Self, CoreError> {
        let snapshot = store
            .load_session_snapshot(user)?
            .ok_or(SessionError::NoSavedSession)?;
        let doors = DoorSession::restore(&snapshot)?;
        let mut resuming = ResumeFlag::default();
        if store.load_paused_puzzle(user)?.is_some() {
            resuming.set();
        }
        let limit_secs = limit_for(doors.difficulty());
        Ok(Self {
            store,
            catalog,
            timer,
            user,
            limit_secs,
            doors,
            resuming,
            active: None,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn user(&self) -> UserId {
        self.user
    }

    pub fn difficulty(&self) -> Difficulty {
        self.doors.difficulty()
    }

    pub fn limit_secs(&self) -> u64 {
        self.limit_secs
    }

    pub fn board(&self) -> DoorBoard {
        self.doors.state()
    }

    pub fn is_resuming(&self) -> bool {
        self.resuming.is_set()
    }

    pub fn in_puzzle(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_door(&self) -> Option<u8> {
        self.active.as_ref().map(PuzzleLifecycle::door)
    }

    pub fn active_title(&self) -> Option<&str> {
        self.active.as_ref().map(PuzzleLifecycle::title)
    }

    /// View of the puzzle in play, if any.
    pub fn puzzle_view(&self) -> Result<Option<PuzzleView>, SessionError> {
        self.active.as_ref().map(PuzzleLifecycle::view).transpose()
    }

    /// Remaining countdown seconds: the coordinator's last-delivered tick
    /// while a puzzle is live, the timer while it runs, the snapshot
    /// otherwise.
    pub fn remaining_secs(&self) -> u64 {
        if let Some(lifecycle) = &self.active {
            lifecycle.remaining_secs()
        } else if self.timer.is_running() || self.timer.is_paused() {
            self.timer.remaining_secs()
        } else {
            self.limit_secs.saturating_sub(self.doors.elapsed_secs())
        }
    }

    // ── Door view ────────────────────────────────────────────────────

    /// Enter a door and start its puzzle. `on_time_up` becomes the
    /// countdown's terminal callback (replacing any previous one).
    pub fn enter_door(
        &mut self,
        door: u8,
        on_time_up: impl FnOnce() + Send + 'static,
    ) -> Result<Vec<Event>, CoreError> {
        if self.active.is_some() {
            return Err(SessionError::PuzzleInPlay.into());
        }
        self.doors.attempt_enter_door(door)?;
        let puzzle_id = self.doors.puzzle_id_for_door(door)?.to_string();
        let puzzle = self
            .catalog
            .puzzle(&puzzle_id)
            .ok_or(SessionError::UnknownPuzzle { id: puzzle_id })?
            .clone();

        let (lifecycle, events) = PuzzleLifecycle::enter(
            self.store,
            self.timer.clone(),
            self.user,
            door,
            puzzle,
            self.resuming.take(),
            self.limit_secs,
            self.doors.elapsed_secs(),
            on_time_up,
        )?;
        self.active = Some(lifecycle);
        Ok(events)
    }

    // ── Puzzle view ──────────────────────────────────────────────────

    /// Feed one player action into the puzzle in play. Terminal actions
    /// settle the door (and possibly the session) before returning.
    pub fn submit_input(&mut self, raw: &str) -> Result<TurnOutcome, CoreError> {
        let outcome = self
            .active
            .as_mut()
            .ok_or(SessionError::NoPuzzleSelected)?
            .submit_input(raw)?;

        let over = self.active.as_ref().is_some_and(PuzzleLifecycle::is_over);
        if !over {
            return Ok(TurnOutcome::Puzzle(outcome));
        }

        let Some(lifecycle) = self.active.take() else {
            return Err(SessionError::NoPuzzleSelected.into());
        };
        let (report, mut events) = lifecycle.complete(&mut self.doors)?;

        if report.won && self.doors.is_session_complete() {
            let (victory, victory_events) = self.settle_victory()?;
            events.extend(victory_events);
            return Ok(TurnOutcome::Victory {
                report: victory,
                events,
            });
        }
        Ok(TurnOutcome::DoorFinished { report, events })
    }

    /// Save-and-quit the puzzle in play; the player lands on the door view
    /// with a paused record waiting for resume.
    pub fn request_save(&mut self) -> Result<Vec<Event>, CoreError> {
        let lifecycle = self
            .active
            .take()
            .ok_or(SessionError::NoPuzzleSelected)?;
        lifecycle.save_and_quit(&mut self.doors)
    }

    /// Quit the puzzle in play without saving its state.
    pub fn request_quit(&mut self) -> Result<Vec<Event>, CoreError> {
        let lifecycle = self
            .active
            .take()
            .ok_or(SessionError::NoPuzzleSelected)?;
        lifecycle.quit(&mut self.doors)
    }

    // ── Session end ──────────────────────────────────────────────────

    /// Persist everything and pause the countdown, e.g. when the host shuts
    /// down from the door view. With a puzzle in play this is save-and-quit
    /// first.
    pub fn suspend(&mut self) -> Result<Vec<Event>, CoreError> {
        let mut events = match self.active.take() {
            Some(lifecycle) => lifecycle.save_and_quit(&mut self.doors)?,
            None => {
                self.sync_elapsed();
                self.store
                    .save_session_snapshot(self.user, &self.doors.snapshot())?;
                vec![Event::SessionSaved {
                    completed_doors: self.doors.completed_count(),
                    elapsed_secs: self.doors.elapsed_secs(),
                    at: Utc::now(),
                }]
            }
        };
        if self.timer.pause() {
            events.push(Event::TimerPaused {
                remaining_secs: self.timer.remaining_secs(),
                at: Utc::now(),
            });
        }
        Ok(events)
    }

    /// Settle a countdown expiry: the run is lost and all persisted session
    /// state is destroyed. The countdown has already stopped itself.
    pub fn expire(&mut self) -> Result<Vec<Event>, CoreError> {
        self.active = None;
        self.store.clear_paused_puzzle(self.user)?;
        self.store.clear_session_snapshot(self.user)?;
        Ok(vec![
            Event::TimeExpired {
                limit_secs: self.limit_secs,
                at: Utc::now(),
            },
            Event::SessionCleared { at: Utc::now() },
        ])
    }

    /// Explicit abandonment: stop the countdown and destroy the run.
    pub fn abandon(&mut self) -> Result<Vec<Event>, CoreError> {
        self.active = None;
        let mut events = Vec::new();
        if let Some(elapsed) = self.timer.stop() {
            events.push(Event::TimerStopped {
                elapsed_secs: elapsed,
                at: Utc::now(),
            });
        }
        self.store.clear_paused_puzzle(self.user)?;
        self.store.clear_session_snapshot(self.user)?;
        events.push(Event::SessionCleared { at: Utc::now() });
        Ok(events)
    }

    fn settle_victory(&mut self) -> Result<(VictoryReport, Vec<Event>), CoreError> {
        let elapsed = self.timer.stop().unwrap_or(self.doors.elapsed_secs());
        self.doors.set_elapsed_secs(elapsed);
        let score = self.doors.session_score(self.store)?;
        self.store.record_session_completion(
            self.user,
            self.doors.difficulty(),
            score,
            elapsed,
        )?;
        self.store.clear_session_snapshot(self.user)?;
        self.store.clear_paused_puzzle(self.user)?;

        let report = VictoryReport {
            difficulty: self.doors.difficulty(),
            score,
            elapsed_secs: elapsed,
        };
        let events = vec![
            Event::TimerStopped {
                elapsed_secs: elapsed,
                at: Utc::now(),
            },
            Event::SessionWon {
                difficulty: report.difficulty,
                score,
                elapsed_secs: elapsed,
                at: Utc::now(),
            },
            Event::SessionCleared { at: Utc::now() },
        ];
        Ok((report, events))
    }

    fn sync_elapsed(&mut self) {
        if self.timer.is_running() || self.timer.is_paused() {
            self.doors.set_elapsed_secs(self.timer.elapsed_secs());
        }
    }
}
