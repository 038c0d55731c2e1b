//! The shared ticking clock service.
//!
//! [`SessionTimer`] wraps one [`Countdown`] behind a handle that every game
//! component shares by cloning. Exactly one countdown may exist at a time:
//! `start` while a countdown is running never creates a second ticking
//! source, it only swaps the time-up callback. The handle replaces the
//! ambient global timer of a classic singleton design -- create one per
//! process and pass it down.
//!
//! Ticks are produced by a 1 Hz background thread (or by explicit `tick()`
//! calls on a [`SessionTimer::manual`] instance). Each tick advances the
//! state machine under the lock, then notifies subscribers outside the lock
//! with the tick's single `remaining` value, so every listener in a round
//! observes the same second and a slow or panicking listener cannot delay
//! the state machine itself. Consumers that need tick handling on their own
//! event loop subscribe with a channel-sending listener.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use super::countdown::{Countdown, CountdownState};

const TICK_INTERVAL: Duration = Duration::from_secs(1);

type TickListener = Arc<dyn Fn(u64) + Send + Sync + 'static>;
type TimeUpHandler = Box<dyn FnOnce() + Send + 'static>;

/// What a `start` call actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new countdown was created and began ticking.
    Started,
    /// A paused countdown resumed ticking.
    Resumed,
    /// A running countdown kept ticking; only the time-up handler changed.
    Attached,
}

struct Inner {
    countdown: Option<Countdown>,
    listeners: BTreeMap<String, TickListener>,
    on_time_up: Option<TimeUpHandler>,
    /// Sticky expiry marker for the current start..stop cycle.
    time_up: bool,
    /// Bumped whenever the live countdown is replaced or discarded; a ticker
    /// thread exits as soon as its generation goes stale.
    generation: u64,
    background: bool,
}

/// Handle to the process-wide countdown timer.
#[derive(Clone)]
pub struct SessionTimer {
    inner: Arc<Mutex<Inner>>,
}

impl SessionTimer {
    /// Timer whose ticks are delivered once per second by a background thread.
    pub fn new() -> Self {
        Self::with_background(true)
    }

    /// Timer driven by explicit [`tick`](Self::tick) calls. Used by tests and
    /// by hosts that already own a clock.
    pub fn manual() -> Self {
        Self::with_background(false)
    }

    fn with_background(background: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                countdown: None,
                listeners: BTreeMap::new(),
                on_time_up: None,
                time_up: false,
                generation: 0,
                background,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start the countdown, or attach to the one already in flight.
    ///
    /// * No countdown: creates one at `start_elapsed` of `limit_secs` and
    ///   begins ticking.
    /// * Countdown **running**: replaces only `on_time_up`; elapsed and limit
    ///   are untouched. Starting never resets an in-flight countdown.
    /// * Countdown **paused**: resumes ticking without resetting anything.
    ///
    /// # Errors
    /// Returns an error only if the ticker thread cannot be spawned.
    pub fn start(
        &self,
        limit_secs: u64,
        start_elapsed: u64,
        on_time_up: impl FnOnce() + Send + 'static,
    ) -> std::io::Result<StartOutcome> {
        let (outcome, spawn_generation) = {
            let mut inner = self.lock();
            match inner.countdown.as_ref().map(Countdown::state) {
                Some(CountdownState::Running) => {
                    inner.on_time_up = Some(Box::new(on_time_up));
                    (StartOutcome::Attached, None)
                }
                Some(CountdownState::Paused) => {
                    if let Some(c) = inner.countdown.as_mut() {
                        c.resume();
                    }
                    inner.on_time_up = Some(Box::new(on_time_up));
                    (StartOutcome::Resumed, None)
                }
                // Expired countdowns are discarded on the expiring tick, so
                // this arm is the fresh-start path.
                Some(CountdownState::Expired) | None => {
                    inner.countdown = Some(Countdown::new(limit_secs, start_elapsed));
                    inner.on_time_up = Some(Box::new(on_time_up));
                    inner.time_up = false;
                    inner.generation += 1;
                    (
                        StartOutcome::Started,
                        inner.background.then_some(inner.generation),
                    )
                }
            }
        };
        if let Some(generation) = spawn_generation {
            self.spawn_ticker(generation)?;
        }
        Ok(outcome)
    }

    /// Halt ticking, discard the countdown and clear all subscribers.
    /// Terminal: a later `start` creates a genuinely new countdown.
    ///
    /// Returns the elapsed seconds at the moment of the stop, if a countdown
    /// existed, so callers can sync it into a snapshot.
    pub fn stop(&self) -> Option<u64> {
        let mut inner = self.lock();
        let elapsed = inner.countdown.as_ref().map(Countdown::elapsed_secs);
        inner.countdown = None;
        inner.listeners.clear();
        inner.on_time_up = None;
        inner.time_up = false;
        inner.generation += 1;
        elapsed
    }

    /// Suspend ticking without losing elapsed time or subscribers.
    pub fn pause(&self) -> bool {
        self.lock().countdown.as_mut().map_or(false, Countdown::pause)
    }

    /// Continue ticking after a pause.
    pub fn resume(&self) -> bool {
        self.lock().countdown.as_mut().map_or(false, Countdown::resume)
    }

    /// Subscribe a tick callback under `key`. Adding a key that is already
    /// subscribed is a no-op (the original callback stays).
    pub fn add_listener(&self, key: impl Into<String>, listener: impl Fn(u64) + Send + Sync + 'static) {
        self.lock()
            .listeners
            .entry(key.into())
            .or_insert_with(|| Arc::new(listener));
    }

    /// Unsubscribe `key`. Removing an unknown key is a no-op.
    pub fn remove_listener(&self, key: &str) {
        self.lock().listeners.remove(key);
    }

    /// Overwrite the elapsed counter of the live countdown, if any.
    pub fn set_elapsed_secs(&self, secs: u64) {
        if let Some(c) = self.lock().countdown.as_mut() {
            c.set_elapsed_secs(secs);
        }
    }

    /// Advance the countdown by one second and notify listeners.
    ///
    /// The background ticker calls this once per second; manual instances are
    /// driven by calling it directly. A no-op while paused, expired or
    /// stopped.
    pub fn tick(&self) {
        let (tick, listeners, handler) = {
            let mut inner = self.lock();
            let Some(countdown) = inner.countdown.as_mut() else {
                return;
            };
            let Some(tick) = countdown.tick() else {
                return;
            };
            let listeners: Vec<TickListener> = inner.listeners.values().cloned().collect();
            let handler = if tick.expired {
                // Stop internally before anyone hears about expiry, so the
                // time-up handler observes is_running() == false.
                inner.countdown = None;
                inner.listeners.clear();
                inner.time_up = true;
                inner.generation += 1;
                inner.on_time_up.take()
            } else {
                None
            };
            (tick, listeners, handler)
        };

        for listener in &listeners {
            // A panicking subscriber must not starve its siblings or the
            // next tick.
            let _ = catch_unwind(AssertUnwindSafe(|| listener(tick.remaining_secs)));
        }
        if let Some(handler) = handler {
            let _ = catch_unwind(AssertUnwindSafe(handler));
        }
    }

    fn spawn_ticker(&self, generation: u64) -> std::io::Result<()> {
        let timer = self.clone();
        thread::Builder::new()
            .name("countdown-tick".into())
            .spawn(move || loop {
                thread::sleep(TICK_INTERVAL);
                {
                    let inner = timer.lock();
                    if inner.generation != generation || inner.countdown.is_none() {
                        return;
                    }
                }
                timer.tick();
            })?;
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_running(&self) -> bool {
        self.lock()
            .countdown
            .as_ref()
            .is_some_and(|c| c.state() == CountdownState::Running)
    }

    pub fn is_paused(&self) -> bool {
        self.lock()
            .countdown
            .as_ref()
            .is_some_and(|c| c.state() == CountdownState::Paused)
    }

    /// Elapsed seconds of the live countdown; zero when none exists.
    pub fn elapsed_secs(&self) -> u64 {
        self.lock().countdown.as_ref().map_or(0, Countdown::elapsed_secs)
    }

    /// Remaining seconds of the live countdown; zero when none exists.
    pub fn remaining_secs(&self) -> u64 {
        self.lock().countdown.as_ref().map_or(0, Countdown::remaining_secs)
    }

    /// True from the expiring tick until the next `start` or `stop`.
    pub fn is_time_up(&self) -> bool {
        self.lock().time_up
    }
}

impl Default for SessionTimer {
    fn default() -> Self {
        Self::new()
    }
}
