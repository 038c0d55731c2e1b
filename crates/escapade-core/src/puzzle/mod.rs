//! The puzzle session contract and its implementations.
//!
//! Every puzzle type -- maze navigation, card matching, word puzzles -- plays
//! through the same [`PuzzleSession`] trait: initialize or restore, feed
//! player input, observe a view, and finally collect a result. The trait is
//! the seam that lets completely different mechanics share one lifecycle;
//! implementations own their full internal state independently.
//!
//! Save, view and result payloads are explicit tagged enums (one variant per
//! puzzle family) so snapshots stay type-safe end to end.

mod matching;
mod maze;
mod word;

pub use matching::{Card, CardFace, CardState, MatchingData, MatchingSave, MatchingSession, MatchingView};
pub use maze::{MazeData, MazeSave, MazeSession, MazeView};
pub use word::{WordData, WordSave, WordSession, WordView};

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Number of doors in a session, and therefore puzzles assigned per session.
pub const DOOR_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PuzzleKind {
    Maze,
    Matching,
    Cipher,
    Anagram,
    Riddle,
}

impl PuzzleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PuzzleKind::Maze => "maze",
            PuzzleKind::Matching => "matching",
            PuzzleKind::Cipher => "cipher",
            PuzzleKind::Anagram => "anagram",
            PuzzleKind::Riddle => "riddle",
        }
    }
}

impl std::fmt::Display for PuzzleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Default session countdown limit for this difficulty.
    /// Config may override these.
    pub fn default_time_limit_secs(self) -> u64 {
        match self {
            Difficulty::Easy => 900,
            Difficulty::Medium => 600,
            Difficulty::Hard => 300,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// One catalog puzzle. Immutable once loaded for a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Puzzle {
    pub id: String,
    pub kind: PuzzleKind,
    pub difficulty: Difficulty,
    pub title: String,
    pub data: PuzzleData,
}

/// Puzzle definition payload, consumed by the matching session type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "lowercase")]
pub enum PuzzleData {
    Maze(MazeData),
    Matching(MatchingData),
    Word(WordData),
}

impl PuzzleData {
    pub fn family(&self) -> &'static str {
        match self {
            PuzzleData::Maze(_) => "maze",
            PuzzleData::Matching(_) => "matching",
            PuzzleData::Word(_) => "word",
        }
    }
}

/// Serializable snapshot of an in-flight puzzle, sufficient for a later
/// restore to reproduce the same playable state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "lowercase")]
pub enum PuzzleSave {
    Maze(MazeSave),
    Matching(MatchingSave),
    Word(WordSave),
}

impl PuzzleSave {
    pub fn family(&self) -> &'static str {
        match self {
            PuzzleSave::Maze(_) => "maze",
            PuzzleSave::Matching(_) => "matching",
            PuzzleSave::Word(_) => "word",
        }
    }
}

/// Read-only snapshot sufficient to render the current puzzle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "lowercase")]
pub enum PuzzleView {
    Maze(MazeView),
    Matching(MatchingView),
    Word(WordView),
}

/// Final outcome of a finished puzzle: the win flag plus the metrics
/// scoring depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleOutcome {
    pub won: bool,
    pub moves: u32,
    pub attempts: u32,
    pub hints_used: u32,
}

/// Result of applying one player action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum InputOutcome {
    /// The action was valid and changed state.
    Applied {
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// The action was invalid; nothing changed.
    Rejected { reason: String },
    /// The action ended the puzzle.
    Finished { won: bool },
}

impl InputOutcome {
    pub fn applied() -> Self {
        InputOutcome::Applied { message: None }
    }

    pub fn applied_with(message: impl Into<String>) -> Self {
        InputOutcome::Applied {
            message: Some(message.into()),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        InputOutcome::Rejected {
            reason: reason.into(),
        }
    }
}

/// The uniform capability set every puzzle type implements.
///
/// A session is created empty by [`session_for`] and becomes playable after
/// exactly one of `initialize` (fresh state from catalog data) or `restore`
/// (state from a paused save). There is no shared base state.
pub trait PuzzleSession: Send {
    /// Build fresh internal state from a puzzle's data payload.
    fn initialize(&mut self, data: &PuzzleData) -> Result<(), SessionError>;

    /// Rebuild internal state from a previously produced save, reproducing
    /// move counters and partial progress.
    fn restore(&mut self, saved: &PuzzleSave) -> Result<(), SessionError>;

    /// Apply one player action. The input shape is puzzle-type specific:
    /// a direction name, a "row col" coordinate, a free-text answer or the
    /// literal `hint` token.
    fn process_input(&mut self, input: &str) -> Result<InputOutcome, SessionError>;

    /// True once the puzzle reached a win or loss terminal condition.
    fn is_over(&self) -> bool;

    /// Read-only snapshot for rendering.
    fn view(&self) -> Result<PuzzleView, SessionError>;

    /// Final outcome; `None` until the puzzle is over.
    fn result(&self) -> Option<PuzzleOutcome>;

    /// Serializable snapshot for a later `restore`.
    fn save(&self) -> Result<PuzzleSave, SessionError>;
}

/// Create the (uninitialized) session implementation for a puzzle kind.
/// The cipher, anagram and riddle kinds all play through the word session.
pub fn session_for(kind: PuzzleKind) -> Box<dyn PuzzleSession> {
    match kind {
        PuzzleKind::Maze => Box::new(MazeSession::default()),
        PuzzleKind::Matching => Box::new(MatchingSession::default()),
        PuzzleKind::Cipher | PuzzleKind::Anagram | PuzzleKind::Riddle => {
            Box::new(WordSession::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("nightmare".parse::<Difficulty>().is_err());
    }

    #[test]
    fn factory_maps_word_kinds_to_word_session() {
        for kind in [PuzzleKind::Cipher, PuzzleKind::Anagram, PuzzleKind::Riddle] {
            let session = session_for(kind);
            assert!(!session.is_over());
        }
    }

    #[test]
    fn save_payload_roundtrips_as_tagged_json() {
        let save = PuzzleSave::Maze(MazeSave {
            rows: vec!["S.".into(), ".E".into()],
            player: (0, 1),
            moves: 1,
        });
        let json = serde_json::to_string(&save).unwrap();
        let back: PuzzleSave = serde_json::from_str(&json).unwrap();
        assert_eq!(back.family(), "maze");
        assert!(json.contains("\"family\":\"maze\""));
    }
}
