//! Core error types for escapade-core.
//!
//! Rejections that a player can trigger (locked doors, input after a puzzle
//! ended) live in [`SessionError`] and are never fatal. Storage and config
//! failures wrap their sources so callers can report the full chain.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for escapade-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Game-rule rejections and session misuse
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// A stored snapshot could not be encoded or decoded
    #[error("Snapshot serialization failed: {0}")]
    Serialization(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Game-rule rejections and session misuse.
///
/// Player-triggered variants (`DoorLocked`, `DoorAlreadyCompleted`,
/// `PuzzleOver`) carry the human-readable reason shown to the player and
/// never mutate state. `DoorOrdering` and `NotInitialized` indicate a logic
/// bug in the caller, not a user mistake.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Entering a door whose predecessors are not all completed
    #[error("Door {door} is locked: complete door {next} first")]
    DoorLocked { door: u8, next: u8 },

    /// Entering a door that was already completed
    #[error("Door {door} is already completed")]
    DoorAlreadyCompleted { door: u8 },

    /// Marking a door completed while an earlier door is still open.
    /// This is a programming error in the caller, not user input.
    #[error("Door {door} completed out of order (next available is {next})")]
    DoorOrdering { door: u8, next: u8 },

    /// Door number outside 1..=5
    #[error("No such door: {door}")]
    NoSuchDoor { door: u8 },

    /// An operation that needs a current puzzle found none
    #[error("No puzzle selected")]
    NoPuzzleSelected,

    /// A door references a puzzle id the catalog does not know
    #[error("Unknown puzzle: {id}")]
    UnknownPuzzle { id: String },

    /// Input submitted after the puzzle reached a terminal state
    #[error("The puzzle is already over")]
    PuzzleOver,

    /// A door-view operation attempted while a puzzle is still in play
    #[error("A puzzle is still in play")]
    PuzzleInPlay,

    /// A puzzle session method was called before initialize/restore
    #[error("Puzzle session is not initialized")]
    NotInitialized,

    /// Restoring a puzzle from a save of a different kind
    #[error("Saved state is for a different puzzle kind (expected {expected}, found {found})")]
    SaveMismatch { expected: String, found: String },

    /// Initializing a puzzle from a payload of a different kind
    #[error("Puzzle data is for a different puzzle kind (expected {expected}, found {found})")]
    DataMismatch { expected: String, found: String },

    /// A catalog payload that cannot produce a playable puzzle
    #[error("Invalid puzzle data: {0}")]
    InvalidPuzzleData(String),

    /// A persisted session snapshot violates the door-ordering invariant
    #[error("Corrupt session snapshot: {0}")]
    CorruptSnapshot(String),

    /// No saved session to resume
    #[error("No saved session for this player")]
    NoSavedSession,
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CoreError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CoreError::Custom(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
