//! The puzzle lifecycle coordinator.
//!
//! One fixed workflow wraps every [`PuzzleSession`] implementation: decide
//! resume-or-initialize exactly once on entry, attach to the shared
//! countdown, then leave through exactly one of save-and-quit, quit or
//! completion. Whatever the exit path -- including drops on an error path --
//! the tick listener registered on entry is detached exactly once.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::doors::DoorSession;
use crate::error::{CoreError, DatabaseError, SessionError};
use crate::events::Event;
use crate::puzzle::{
    session_for, InputOutcome, Puzzle, PuzzleOutcome, PuzzleSession, PuzzleView,
};
use crate::scoring;
use crate::session::UserId;
use crate::storage::SaveStore;
use crate::timer::{SessionTimer, StartOutcome};

/// Listener key the coordinator registers on the shared timer. One fixed key
/// keeps double registration impossible across re-entries.
const TIMER_LISTENER_KEY: &str = "puzzle-lifecycle";

/// What a finished door produced.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionReport {
    pub door: u8,
    pub puzzle_id: String,
    pub won: bool,
    pub score: u32,
    pub outcome: PuzzleOutcome,
}

/// A live puzzle: the coordinator driving one contract implementation
/// between door entry and one of the exit paths.
pub struct PuzzleLifecycle<'a> {
    store: &'a dyn SaveStore,
    timer: SessionTimer,
    user: UserId,
    door: u8,
    puzzle: Puzzle,
    session: Box<dyn PuzzleSession>,
    /// Last remaining-seconds value delivered by the tick listener.
    remaining: Arc<AtomicU64>,
    detached: bool,
}

impl<'a> PuzzleLifecycle<'a> {
    /// Enter a puzzle: resume from the paused record if `resuming` is set
    /// and the record matches, otherwise initialize fresh, then attach to
    /// the countdown.
    ///
    /// The caller passes the already-consumed resuming flag; both branches
    /// leave it cleared. The paused record is consumed (cleared) when the
    /// restore path takes it. No timer listener is registered unless
    /// initialization succeeded, so an error here leaves nothing dangling.
    #[allow(clippy::too_many_arguments)]
    pub fn enter(
        store: &'a dyn SaveStore,
        timer: SessionTimer,
        user: UserId,
        door: u8,
        puzzle: Puzzle,
        resuming: bool,
        limit_secs: u64,
        start_elapsed: u64,
        on_time_up: impl FnOnce() + Send + 'static,
    ) -> Result<(Self, Vec<Event>), CoreError> {
        let mut session = session_for(puzzle.kind);
        let paused = store.load_paused_puzzle(user)?;
        let resumed = match paused {
            Some(record) if resuming && record.puzzle_id == puzzle.id => {
                session.restore(&record.state)?;
                store.clear_paused_puzzle(user)?;
                true
            }
            _ => {
                session.initialize(&puzzle.data)?;
                false
            }
        };

        // Attach to the countdown. A countdown already in flight keeps its
        // elapsed/limit; only the time-up handler is replaced.
        let started = timer.start(limit_secs, start_elapsed, on_time_up)?;

        let remaining = Arc::new(AtomicU64::new(timer.remaining_secs()));
        let remaining_in = Arc::clone(&remaining);
        timer.add_listener(TIMER_LISTENER_KEY, move |secs| {
            remaining_in.store(secs, Ordering::Relaxed);
        });

        let mut events = Vec::new();
        match started {
            StartOutcome::Started => events.push(Event::TimerStarted {
                limit_secs,
                elapsed_secs: start_elapsed,
                at: Utc::now(),
            }),
            StartOutcome::Resumed => events.push(Event::TimerResumed {
                remaining_secs: timer.remaining_secs(),
                at: Utc::now(),
            }),
            StartOutcome::Attached => {}
        }
        events.push(Event::DoorOpened {
            door,
            puzzle_id: puzzle.id.clone(),
            resumed,
            at: Utc::now(),
        });
        Ok((
            Self {
                store,
                timer,
                user,
                door,
                puzzle,
                session,
                remaining,
                detached: false,
            },
            events,
        ))
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn door(&self) -> u8 {
        self.door
    }

    pub fn puzzle_id(&self) -> &str {
        &self.puzzle.id
    }

    pub fn title(&self) -> &str {
        &self.puzzle.title
    }

    pub fn is_over(&self) -> bool {
        self.session.is_over()
    }

    pub fn view(&self) -> Result<PuzzleView, SessionError> {
        self.session.view()
    }

    /// Remaining seconds as of the last delivered tick.
    pub fn remaining_secs(&self) -> u64 {
        self.remaining.load(Ordering::Relaxed)
    }

    // ── Workflow ─────────────────────────────────────────────────────

    /// Apply one player action to the wrapped puzzle.
    pub fn submit_input(&mut self, raw: &str) -> Result<InputOutcome, CoreError> {
        if self.session.is_over() {
            return Err(SessionError::PuzzleOver.into());
        }
        Ok(self.session.process_input(raw)?)
    }

    /// Save-and-quit: persist the puzzle as the paused record, sync elapsed
    /// time into the session snapshot and persist it, then leave.
    pub fn save_and_quit(mut self, doors: &mut DoorSession) -> Result<Vec<Event>, CoreError> {
        let saved = self.session.save()?;
        self.store
            .save_paused_puzzle(self.user, &self.puzzle.id, &saved)?;
        let snapshot_event = self.sync_and_persist(doors)?;
        self.detach();
        Ok(vec![
            Event::PuzzleSaved {
                door: self.door,
                puzzle_id: self.puzzle.id.clone(),
                at: Utc::now(),
            },
            snapshot_event,
        ])
    }

    /// Quit without saving puzzle state. Any paused record is dropped; the
    /// session snapshot is still synced and persisted.
    pub fn quit(mut self, doors: &mut DoorSession) -> Result<Vec<Event>, CoreError> {
        self.store.clear_paused_puzzle(self.user)?;
        let snapshot_event = self.sync_and_persist(doors)?;
        self.detach();
        Ok(vec![snapshot_event])
    }

    /// Completion: score the result, record it, mark the door, clear the
    /// paused record and verify durability before reporting the outcome.
    ///
    /// A lost puzzle (word puzzles can run out of attempts) leaves the door
    /// open for another try and records nothing.
    pub fn complete(mut self, doors: &mut DoorSession) -> Result<(CompletionReport, Vec<Event>), CoreError> {
        let outcome = self.session.result().ok_or(SessionError::PuzzleInPlay)?;
        let score = scoring::puzzle_score(self.puzzle.difficulty, &outcome);

        if outcome.won {
            self.store
                .record_puzzle_completion(self.user, &self.puzzle.id, score)?;
            doors.mark_door_completed(self.door)?;
            self.store.clear_paused_puzzle(self.user)?;
            // The in-memory completion only stands if the store can read it
            // back.
            if !self.store.is_puzzle_completed(self.user, &self.puzzle.id)? {
                return Err(DatabaseError::QueryFailed(
                    "puzzle completion was not durably recorded".into(),
                )
                .into());
            }
        } else {
            self.store.clear_paused_puzzle(self.user)?;
        }

        let snapshot_event = self.sync_and_persist(doors)?;
        self.detach();

        let events = vec![
            Event::DoorCompleted {
                door: self.door,
                puzzle_id: self.puzzle.id.clone(),
                won: outcome.won,
                score,
                at: Utc::now(),
            },
            snapshot_event,
        ];
        let report = CompletionReport {
            door: self.door,
            puzzle_id: self.puzzle.id.clone(),
            won: outcome.won,
            score,
            outcome,
        };
        Ok((report, events))
    }

    fn sync_and_persist(&self, doors: &mut DoorSession) -> Result<Event, CoreError> {
        doors.set_elapsed_secs(self.timer.elapsed_secs());
        self.store
            .save_session_snapshot(self.user, &doors.snapshot())?;
        Ok(Event::SessionSaved {
            completed_doors: doors.completed_count(),
            elapsed_secs: doors.elapsed_secs(),
            at: Utc::now(),
        })
    }

    fn detach(&mut self) {
        if !self.detached {
            self.timer.remove_listener(TIMER_LISTENER_KEY);
            self.detached = true;
        }
    }
}

impl Drop for PuzzleLifecycle<'_> {
    fn drop(&mut self) {
        // Exit paths call detach() themselves; this covers error paths and
        // host teardown so the listener never outlives the coordinator.
        self.detach();
    }
}
