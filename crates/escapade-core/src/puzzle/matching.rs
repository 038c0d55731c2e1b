//! Card matching.
//!
//! A board of face-down cards, each symbol present exactly twice. The player
//! flips two cards per attempt; a mismatch stays visible until the next
//! action so the player can read both cards. The flip-back is an explicit
//! pending state resolved at the start of the next processed input -- never a
//! blocking wait on the foreground sequence.

use serde::{Deserialize, Serialize};

use super::{InputOutcome, PuzzleData, PuzzleOutcome, PuzzleSave, PuzzleSession, PuzzleView};
use crate::error::SessionError;

/// Catalog payload: the full board layout, row-major. Pair placement is part
/// of the catalog data, so save/restore reproduces the exact same board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingData {
    pub cards: Vec<String>,
    pub columns: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardState {
    Down,
    Up,
    Matched,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub symbol: String,
    pub state: CardState,
}

/// Paused-state snapshot: the complete board plus selection bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingSave {
    pub cards: Vec<Card>,
    pub columns: usize,
    pub attempts: u32,
    pub flips: u32,
    pub selection: Option<usize>,
    pub pending_mismatch: Option<(usize, usize)>,
}

/// One cell as the renderer may see it: the symbol is hidden while face-down.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardFace {
    pub state: CardState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingView {
    pub columns: usize,
    pub cells: Vec<CardFace>,
    pub attempts: u32,
    pub matched_pairs: u32,
    pub pairs_total: u32,
}

#[derive(Debug, Clone)]
struct BoardState {
    cards: Vec<Card>,
    columns: usize,
    /// Completed two-card attempts.
    attempts: u32,
    /// Individual card flips.
    flips: u32,
    /// Index of a lone face-up card awaiting its partner.
    selection: Option<usize>,
    /// Mismatched pair left visible until the next action.
    pending_mismatch: Option<(usize, usize)>,
}

impl BoardState {
    fn validate(cards: &[Card], columns: usize) -> Result<(), SessionError> {
        if cards.is_empty() || columns == 0 {
            return Err(SessionError::InvalidPuzzleData(
                "matching board is empty".into(),
            ));
        }
        if cards.len() % 2 != 0 {
            return Err(SessionError::InvalidPuzzleData(
                "matching board needs an even number of cards".into(),
            ));
        }
        let mut counts = std::collections::HashMap::new();
        for card in cards {
            *counts.entry(card.symbol.as_str()).or_insert(0u32) += 1;
        }
        if let Some((symbol, n)) = counts.iter().find(|(_, n)| **n != 2) {
            return Err(SessionError::InvalidPuzzleData(format!(
                "symbol '{symbol}' appears {n} times, expected exactly 2"
            )));
        }
        Ok(())
    }

    fn matched_pairs(&self) -> u32 {
        self.cards
            .iter()
            .filter(|c| c.state == CardState::Matched)
            .count() as u32
            / 2
    }

    fn pairs_total(&self) -> u32 {
        self.cards.len() as u32 / 2
    }

    fn solved(&self) -> bool {
        self.cards.iter().all(|c| c.state == CardState::Matched)
    }

    /// Turn a stale mismatched pair face-down again.
    fn settle_pending(&mut self) {
        if let Some((a, b)) = self.pending_mismatch.take() {
            self.cards[a].state = CardState::Down;
            self.cards[b].state = CardState::Down;
        }
    }
}

/// Matching implementation of the puzzle session contract.
#[derive(Default)]
pub struct MatchingSession {
    board: Option<BoardState>,
}

impl MatchingSession {
    fn board(&self) -> Result<&BoardState, SessionError> {
        self.board.as_ref().ok_or(SessionError::NotInitialized)
    }
}

fn parse_cell(input: &str, rows: usize, columns: usize) -> Result<usize, String> {
    let mut parts = input.split_whitespace();
    let (Some(row), Some(col), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err("pick a card as: row col (1-based)".into());
    };
    let (Ok(row), Ok(col)) = (row.parse::<usize>(), col.parse::<usize>()) else {
        return Err("row and col must be numbers".into());
    };
    if row == 0 || col == 0 || row > rows || col > columns {
        return Err(format!("no card at {row} {col}"));
    }
    Ok((row - 1) * columns + (col - 1))
}

impl PuzzleSession for MatchingSession {
    fn initialize(&mut self, data: &PuzzleData) -> Result<(), SessionError> {
        let PuzzleData::Matching(matching) = data else {
            return Err(SessionError::DataMismatch {
                expected: "matching".into(),
                found: data.family().into(),
            });
        };
        let cards: Vec<Card> = matching
            .cards
            .iter()
            .map(|symbol| Card {
                symbol: symbol.clone(),
                state: CardState::Down,
            })
            .collect();
        BoardState::validate(&cards, matching.columns)?;
        self.board = Some(BoardState {
            cards,
            columns: matching.columns,
            attempts: 0,
            flips: 0,
            selection: None,
            pending_mismatch: None,
        });
        Ok(())
    }

    fn restore(&mut self, saved: &PuzzleSave) -> Result<(), SessionError> {
        let PuzzleSave::Matching(save) = saved else {
            return Err(SessionError::SaveMismatch {
                expected: "matching".into(),
                found: saved.family().into(),
            });
        };
        BoardState::validate(&save.cards, save.columns)?;
        let len = save.cards.len();
        let in_bounds = |i: usize| i < len;
        if save.selection.is_some_and(|i| !in_bounds(i))
            || save
                .pending_mismatch
                .is_some_and(|(a, b)| !in_bounds(a) || !in_bounds(b))
        {
            return Err(SessionError::InvalidPuzzleData(
                "saved selection is out of bounds".into(),
            ));
        }
        self.board = Some(BoardState {
            cards: save.cards.clone(),
            columns: save.columns,
            attempts: save.attempts,
            flips: save.flips,
            selection: save.selection,
            pending_mismatch: save.pending_mismatch,
        });
        Ok(())
    }

    fn process_input(&mut self, input: &str) -> Result<InputOutcome, SessionError> {
        let board = self.board.as_mut().ok_or(SessionError::NotInitialized)?;
        if board.solved() {
            return Err(SessionError::PuzzleOver);
        }

        let rows = board.cards.len().div_ceil(board.columns);
        let idx = match parse_cell(input, rows, board.columns) {
            Ok(idx) if idx < board.cards.len() => idx,
            Ok(_) => return Ok(InputOutcome::rejected("no card at that cell")),
            Err(reason) => return Ok(InputOutcome::rejected(reason)),
        };

        // Judge the pick against the state as it will be once the stale
        // mismatch flips back, so rejections stay mutation-free.
        let in_pending = board
            .pending_mismatch
            .is_some_and(|(a, b)| a == idx || b == idx);
        match board.cards[idx].state {
            CardState::Matched => return Ok(InputOutcome::rejected("that pair is already matched")),
            CardState::Up if !in_pending => {
                return Ok(InputOutcome::rejected("that card is already face up"))
            }
            _ => {}
        }

        // A stale mismatch flips back the moment the player acts again.
        board.settle_pending();

        board.cards[idx].state = CardState::Up;
        board.flips += 1;

        let Some(first) = board.selection.take() else {
            board.selection = Some(idx);
            return Ok(InputOutcome::applied_with(format!(
                "{} -- pick its pair",
                board.cards[idx].symbol
            )));
        };

        board.attempts += 1;
        if board.cards[first].symbol == board.cards[idx].symbol {
            board.cards[first].state = CardState::Matched;
            board.cards[idx].state = CardState::Matched;
            if board.solved() {
                return Ok(InputOutcome::Finished { won: true });
            }
            return Ok(InputOutcome::applied_with(format!(
                "{} matched!",
                board.cards[idx].symbol
            )));
        }

        board.pending_mismatch = Some((first, idx));
        Ok(InputOutcome::applied_with(format!(
            "{} and {} do not match",
            board.cards[first].symbol, board.cards[idx].symbol
        )))
    }

    fn is_over(&self) -> bool {
        self.board.as_ref().is_some_and(BoardState::solved)
    }

    fn view(&self) -> Result<PuzzleView, SessionError> {
        let board = self.board()?;
        let cells = board
            .cards
            .iter()
            .map(|card| CardFace {
                state: card.state,
                symbol: match card.state {
                    CardState::Down => None,
                    CardState::Up | CardState::Matched => Some(card.symbol.clone()),
                },
            })
            .collect();
        Ok(PuzzleView::Matching(MatchingView {
            columns: board.columns,
            cells,
            attempts: board.attempts,
            matched_pairs: board.matched_pairs(),
            pairs_total: board.pairs_total(),
        }))
    }

    fn result(&self) -> Option<PuzzleOutcome> {
        let board = self.board.as_ref()?;
        if !board.solved() {
            return None;
        }
        Some(PuzzleOutcome {
            won: true,
            moves: board.flips,
            attempts: board.attempts,
            hints_used: 0,
        })
    }

    fn save(&self) -> Result<PuzzleSave, SessionError> {
        let board = self.board()?;
        Ok(PuzzleSave::Matching(MatchingSave {
            cards: board.cards.clone(),
            columns: board.columns,
            attempts: board.attempts,
            flips: board.flips,
            selection: board.selection,
            pending_mismatch: board.pending_mismatch,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(cards: &[&str], columns: usize) -> MatchingSession {
        let mut s = MatchingSession::default();
        s.initialize(&PuzzleData::Matching(MatchingData {
            cards: cards.iter().map(|c| (*c).to_string()).collect(),
            columns,
        }))
        .unwrap();
        s
    }

    fn cell_state(s: &MatchingSession, idx: usize) -> CardState {
        match s.view().unwrap() {
            PuzzleView::Matching(v) => v.cells[idx].state,
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn matching_two_equal_cards_locks_them() {
        // key  key
        // lamp lamp
        let mut s = session(&["key", "key", "lamp", "lamp"], 2);
        s.process_input("1 1").unwrap();
        let out = s.process_input("1 2").unwrap();
        assert_eq!(out, InputOutcome::applied_with("key matched!"));
        assert_eq!(cell_state(&s, 0), CardState::Matched);
        assert_eq!(cell_state(&s, 1), CardState::Matched);
    }

    #[test]
    fn mismatch_stays_visible_until_next_action() {
        let mut s = session(&["key", "lamp", "key", "lamp"], 2);
        s.process_input("1 1").unwrap();
        s.process_input("1 2").unwrap();
        // Both still visible after the mismatched attempt.
        assert_eq!(cell_state(&s, 0), CardState::Up);
        assert_eq!(cell_state(&s, 1), CardState::Up);

        // The next pick settles the pending pair face-down.
        s.process_input("2 1").unwrap();
        assert_eq!(cell_state(&s, 0), CardState::Down);
        assert_eq!(cell_state(&s, 1), CardState::Down);
        assert_eq!(cell_state(&s, 2), CardState::Up);
    }

    #[test]
    fn solving_the_board_finishes_with_metrics() {
        let mut s = session(&["key", "key", "lamp", "lamp"], 2);
        s.process_input("1 1").unwrap();
        s.process_input("1 2").unwrap();
        s.process_input("2 1").unwrap();
        let out = s.process_input("2 2").unwrap();
        assert_eq!(out, InputOutcome::Finished { won: true });
        assert!(s.is_over());
        let result = s.result().unwrap();
        assert!(result.won);
        assert_eq!(result.attempts, 2);
        assert_eq!(result.moves, 4);
    }

    #[test]
    fn rejects_bad_cells_and_reflips() {
        let mut s = session(&["key", "key"], 2);
        assert!(matches!(
            s.process_input("pick one").unwrap(),
            InputOutcome::Rejected { .. }
        ));
        assert!(matches!(
            s.process_input("3 1").unwrap(),
            InputOutcome::Rejected { .. }
        ));
        s.process_input("1 1").unwrap();
        assert!(matches!(
            s.process_input("1 1").unwrap(),
            InputOutcome::Rejected { .. }
        ));
    }

    #[test]
    fn save_restore_keeps_selection_and_pending_state() {
        let mut s = session(&["key", "lamp", "key", "lamp"], 2);
        s.process_input("1 1").unwrap();
        s.process_input("1 2").unwrap(); // mismatch, pending
        let saved = s.save().unwrap();

        let mut restored = MatchingSession::default();
        restored.restore(&saved).unwrap();
        assert_eq!(cell_state(&restored, 0), CardState::Up);
        assert_eq!(cell_state(&restored, 1), CardState::Up);

        // Pending mismatch still settles on the next action after restore.
        restored.process_input("2 1").unwrap();
        assert_eq!(cell_state(&restored, 0), CardState::Down);
        match restored.view().unwrap() {
            PuzzleView::Matching(v) => assert_eq!(v.attempts, 1),
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn down_cards_hide_their_symbol_in_the_view() {
        let mut s = session(&["key", "key"], 2);
        s.process_input("1 1").unwrap();
        match s.view().unwrap() {
            PuzzleView::Matching(v) => {
                assert_eq!(v.cells[0].symbol.as_deref(), Some("key"));
                assert!(v.cells[1].symbol.is_none());
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn boards_must_hold_exact_pairs() {
        let mut s = MatchingSession::default();
        let data = |cards: &[&str]| {
            PuzzleData::Matching(MatchingData {
                cards: cards.iter().map(|c| (*c).to_string()).collect(),
                columns: 2,
            })
        };
        assert!(s.initialize(&data(&["key", "key", "lamp"])).is_err());
        assert!(s.initialize(&data(&["key", "key", "key", "key"])).is_err());
        assert!(s.initialize(&data(&[])).is_err());
    }
}
