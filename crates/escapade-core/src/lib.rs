//! # Escapade Core Library
//!
//! Core logic for Escapade, an escape-room game: five sequentially unlocked
//! doors, each gated by a puzzle, under one shared countdown, with
//! save/resume that survives process restarts. The CLI binary is a thin
//! layer over this crate; any other front-end would be another thin layer.
//!
//! ## Architecture
//!
//! - **Countdown timer**: a pure per-second state machine behind a shared
//!   handle; a background ticker delivers ticks and fan-outs to listeners
//! - **Puzzle contract**: one trait across maze, matching and word puzzles,
//!   with tagged save/view/result payloads
//! - **Door session**: the sequential five-door state machine and its
//!   snapshot/restore contract
//! - **Storage**: SQLite-backed save store and TOML configuration
//!
//! ## Key Components
//!
//! - [`SessionTimer`]: shared countdown handle
//! - [`PuzzleSession`]: the contract every puzzle type implements
//! - [`GameSession`]: the façade the presentation layer drives
//! - [`Database`]: persistence gateway implementation

pub mod catalog;
pub mod doors;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod puzzle;
pub mod scoring;
pub mod session;
pub mod storage;
pub mod timer;

pub use catalog::{BuiltinCatalog, PuzzleCatalog};
pub use doors::{DoorBoard, DoorSession, DoorState, SessionSnapshot};
pub use error::{ConfigError, CoreError, DatabaseError, SessionError};
pub use events::Event;
pub use lifecycle::{CompletionReport, PuzzleLifecycle};
pub use puzzle::{
    Difficulty, InputOutcome, Puzzle, PuzzleKind, PuzzleOutcome, PuzzleSession, PuzzleView,
    DOOR_COUNT,
};
pub use session::{GameSession, TurnOutcome, UserId, VictoryReport};
pub use storage::{Config, Database, PausedPuzzle, PlayerStats, SaveStore};
pub use timer::SessionTimer;
