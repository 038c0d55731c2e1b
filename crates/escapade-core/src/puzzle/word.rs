//! Word puzzles: ciphers, anagrams and riddles.
//!
//! All three kinds share one mechanic: a prompt, a free-text answer, a
//! bounded number of wrong guesses, and a ladder of hints revealed on
//! request. The literal input `hint` asks for the next hint; anything else
//! is treated as a guess. Answers are compared case- and
//! whitespace-insensitively.

use serde::{Deserialize, Serialize};

use super::{InputOutcome, PuzzleData, PuzzleOutcome, PuzzleSave, PuzzleSession, PuzzleView};
use crate::error::SessionError;

/// The hint-request token.
pub const HINT_TOKEN: &str = "hint";

/// Catalog payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordData {
    /// The encoded text, scrambled word or riddle shown to the player.
    pub prompt: String,
    pub answer: String,
    pub hints: Vec<String>,
    pub max_attempts: u32,
}

/// Paused-state snapshot. Carries the definition so a restore needs no
/// catalog lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordSave {
    pub data: WordData,
    pub attempts: u32,
    pub hints_used: u32,
    /// `Some(won)` once the puzzle ended.
    pub outcome: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordView {
    pub prompt: String,
    pub revealed_hints: Vec<String>,
    pub hints_left: u32,
    pub attempts: u32,
    pub max_attempts: u32,
    pub over: bool,
}

#[derive(Debug, Clone)]
struct WordState {
    data: WordData,
    attempts: u32,
    hints_used: u32,
    outcome: Option<bool>,
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Word implementation of the puzzle session contract.
#[derive(Default)]
pub struct WordSession {
    state: Option<WordState>,
}

impl WordSession {
    fn state(&self) -> Result<&WordState, SessionError> {
        self.state.as_ref().ok_or(SessionError::NotInitialized)
    }

    fn check(data: &WordData) -> Result<(), SessionError> {
        if normalize(&data.answer).is_empty() {
            return Err(SessionError::InvalidPuzzleData(
                "word puzzle has an empty answer".into(),
            ));
        }
        if data.max_attempts == 0 {
            return Err(SessionError::InvalidPuzzleData(
                "word puzzle allows zero attempts".into(),
            ));
        }
        Ok(())
    }
}

impl PuzzleSession for WordSession {
    fn initialize(&mut self, data: &PuzzleData) -> Result<(), SessionError> {
        let PuzzleData::Word(word) = data else {
            return Err(SessionError::DataMismatch {
                expected: "word".into(),
                found: data.family().into(),
            });
        };
        Self::check(word)?;
        self.state = Some(WordState {
            data: word.clone(),
            attempts: 0,
            hints_used: 0,
            outcome: None,
        });
        Ok(())
    }

    fn restore(&mut self, saved: &PuzzleSave) -> Result<(), SessionError> {
        let PuzzleSave::Word(save) = saved else {
            return Err(SessionError::SaveMismatch {
                expected: "word".into(),
                found: saved.family().into(),
            });
        };
        Self::check(&save.data)?;
        self.state = Some(WordState {
            data: save.data.clone(),
            attempts: save.attempts,
            hints_used: save.hints_used.min(save.data.hints.len() as u32),
            outcome: save.outcome,
        });
        Ok(())
    }

    fn process_input(&mut self, input: &str) -> Result<InputOutcome, SessionError> {
        let state = self.state.as_mut().ok_or(SessionError::NotInitialized)?;
        if state.outcome.is_some() {
            return Err(SessionError::PuzzleOver);
        }

        let guess = normalize(input);
        if guess.is_empty() {
            return Ok(InputOutcome::rejected("type an answer, or 'hint'"));
        }

        if guess == HINT_TOKEN {
            let Some(hint) = state.data.hints.get(state.hints_used as usize) else {
                return Ok(InputOutcome::rejected("no hints left"));
            };
            state.hints_used += 1;
            return Ok(InputOutcome::applied_with(format!("hint: {hint}")));
        }

        state.attempts += 1;
        if guess == normalize(&state.data.answer) {
            state.outcome = Some(true);
            return Ok(InputOutcome::Finished { won: true });
        }
        if state.attempts >= state.data.max_attempts {
            state.outcome = Some(false);
            return Ok(InputOutcome::Finished { won: false });
        }
        let left = state.data.max_attempts - state.attempts;
        Ok(InputOutcome::applied_with(format!(
            "not it -- {left} attempt{} left",
            if left == 1 { "" } else { "s" }
        )))
    }

    fn is_over(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.outcome.is_some())
    }

    fn view(&self) -> Result<PuzzleView, SessionError> {
        let state = self.state()?;
        Ok(PuzzleView::Word(WordView {
            prompt: state.data.prompt.clone(),
            revealed_hints: state.data.hints[..state.hints_used as usize].to_vec(),
            hints_left: state.data.hints.len() as u32 - state.hints_used,
            attempts: state.attempts,
            max_attempts: state.data.max_attempts,
            over: state.outcome.is_some(),
        }))
    }

    fn result(&self) -> Option<PuzzleOutcome> {
        let state = self.state.as_ref()?;
        let won = state.outcome?;
        Some(PuzzleOutcome {
            won,
            moves: state.attempts,
            attempts: state.attempts,
            hints_used: state.hints_used,
        })
    }

    fn save(&self) -> Result<PuzzleSave, SessionError> {
        let state = self.state()?;
        Ok(PuzzleSave::Word(WordSave {
            data: state.data.clone(),
            attempts: state.attempts,
            hints_used: state.hints_used,
            outcome: state.outcome,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> PuzzleData {
        PuzzleData::Word(WordData {
            prompt: "I speak without a mouth and hear without ears. What am I?".into(),
            answer: "An Echo".into(),
            hints: vec!["You find me in the mountains".into(), "I repeat you".into()],
            max_attempts: 3,
        })
    }

    fn session() -> WordSession {
        let mut s = WordSession::default();
        s.initialize(&data()).unwrap();
        s
    }

    #[test]
    fn answer_comparison_ignores_case_and_spacing() {
        let mut s = session();
        assert_eq!(
            s.process_input("  an   ECHO ").unwrap(),
            InputOutcome::Finished { won: true }
        );
        let result = s.result().unwrap();
        assert!(result.won);
        assert_eq!(result.attempts, 1);
    }

    #[test]
    fn wrong_guesses_exhaust_attempts_into_a_loss() {
        let mut s = session();
        assert!(matches!(
            s.process_input("wind").unwrap(),
            InputOutcome::Applied { .. }
        ));
        s.process_input("a ghost").unwrap();
        assert_eq!(
            s.process_input("silence").unwrap(),
            InputOutcome::Finished { won: false }
        );
        assert!(s.is_over());
        assert!(!s.result().unwrap().won);
    }

    #[test]
    fn hints_reveal_in_order_and_run_out() {
        let mut s = session();
        assert_eq!(
            s.process_input("hint").unwrap(),
            InputOutcome::applied_with("hint: You find me in the mountains")
        );
        assert_eq!(
            s.process_input("HINT").unwrap(),
            InputOutcome::applied_with("hint: I repeat you")
        );
        assert!(matches!(
            s.process_input("hint").unwrap(),
            InputOutcome::Rejected { .. }
        ));
        match s.view().unwrap() {
            PuzzleView::Word(v) => {
                assert_eq!(v.revealed_hints.len(), 2);
                assert_eq!(v.hints_left, 0);
                // Hints do not consume guess attempts.
                assert_eq!(v.attempts, 0);
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn save_restore_reproduces_attempts_and_hints() {
        let mut s = session();
        s.process_input("hint").unwrap();
        s.process_input("wind").unwrap();
        let saved = s.save().unwrap();

        let mut restored = WordSession::default();
        restored.restore(&saved).unwrap();
        match restored.view().unwrap() {
            PuzzleView::Word(v) => {
                assert_eq!(v.attempts, 1);
                assert_eq!(v.revealed_hints, vec!["You find me in the mountains"]);
            }
            other => panic!("unexpected view: {other:?}"),
        }
        // Two attempts remain after restore, exactly as before the save.
        restored.process_input("a ghost").unwrap();
        assert_eq!(
            restored.process_input("an echo").unwrap(),
            InputOutcome::Finished { won: true }
        );
    }

    #[test]
    fn input_after_the_end_is_an_error() {
        let mut s = session();
        s.process_input("an echo").unwrap();
        assert!(matches!(
            s.process_input("hint"),
            Err(SessionError::PuzzleOver)
        ));
    }

    #[test]
    fn blank_input_is_rejected() {
        let mut s = session();
        assert!(matches!(
            s.process_input("   ").unwrap(),
            InputOutcome::Rejected { .. }
        ));
    }

    #[test]
    fn refuses_unplayable_definitions() {
        let mut s = WordSession::default();
        assert!(s
            .initialize(&PuzzleData::Word(WordData {
                prompt: "p".into(),
                answer: "  ".into(),
                hints: vec![],
                max_attempts: 3,
            }))
            .is_err());
        assert!(s
            .initialize(&PuzzleData::Word(WordData {
                prompt: "p".into(),
                answer: "a".into(),
                hints: vec![],
                max_attempts: 0,
            }))
            .is_err());
    }
}
