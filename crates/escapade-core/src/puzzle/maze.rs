//! Grid maze navigation.
//!
//! The board is a rectangular character grid: `#` wall, `.` floor, `S` the
//! starting cell, `E` the exit. The player walks one cell per input; reaching
//! the exit wins. There is no losing condition inside the maze -- only the
//! session countdown ends it early.

use serde::{Deserialize, Serialize};

use super::{InputOutcome, PuzzleData, PuzzleOutcome, PuzzleSave, PuzzleSession, PuzzleView};
use crate::error::SessionError;

/// Catalog payload: the maze grid, row-major.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MazeData {
    pub rows: Vec<String>,
}

/// Paused-state snapshot. Carries the grid so a restore needs no catalog
/// lookup to reproduce the playable state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MazeSave {
    pub rows: Vec<String>,
    /// Player position as (row, col).
    pub player: (usize, usize),
    pub moves: u32,
}

/// Render snapshot: the grid with the player drawn in, plus progress counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MazeView {
    pub rows: Vec<String>,
    pub player: (usize, usize),
    pub exit: (usize, usize),
    pub moves: u32,
    pub solved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "up" | "w" => Some(Direction::Up),
            "down" | "s" => Some(Direction::Down),
            "left" | "a" => Some(Direction::Left),
            "right" | "d" => Some(Direction::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Board {
    rows: Vec<String>,
    walls: Vec<Vec<bool>>,
    width: usize,
    exit: (usize, usize),
    player: (usize, usize),
    moves: u32,
}

impl Board {
    fn parse(rows: &[String], player_override: Option<(usize, usize)>) -> Result<Self, SessionError> {
        if rows.is_empty() {
            return Err(SessionError::InvalidPuzzleData("maze grid is empty".into()));
        }
        let width = rows[0].chars().count();
        let mut walls = Vec::with_capacity(rows.len());
        let mut start = None;
        let mut exit = None;
        for (r, row) in rows.iter().enumerate() {
            if row.chars().count() != width {
                return Err(SessionError::InvalidPuzzleData(format!(
                    "maze row {r} is not {width} cells wide"
                )));
            }
            let mut wall_row = Vec::with_capacity(width);
            for (c, ch) in row.chars().enumerate() {
                match ch {
                    '#' => wall_row.push(true),
                    '.' => wall_row.push(false),
                    'S' => {
                        if start.replace((r, c)).is_some() {
                            return Err(SessionError::InvalidPuzzleData(
                                "maze has more than one start cell".into(),
                            ));
                        }
                        wall_row.push(false);
                    }
                    'E' => {
                        if exit.replace((r, c)).is_some() {
                            return Err(SessionError::InvalidPuzzleData(
                                "maze has more than one exit cell".into(),
                            ));
                        }
                        wall_row.push(false);
                    }
                    other => {
                        return Err(SessionError::InvalidPuzzleData(format!(
                            "unknown maze cell '{other}'"
                        )));
                    }
                }
            }
            walls.push(wall_row);
        }
        let start = start
            .ok_or_else(|| SessionError::InvalidPuzzleData("maze has no start cell".into()))?;
        let exit =
            exit.ok_or_else(|| SessionError::InvalidPuzzleData("maze has no exit cell".into()))?;

        let player = player_override.unwrap_or(start);
        if player.0 >= walls.len() || player.1 >= width || walls[player.0][player.1] {
            return Err(SessionError::InvalidPuzzleData(format!(
                "player position ({}, {}) is not an open cell",
                player.0, player.1
            )));
        }

        Ok(Self {
            rows: rows.to_vec(),
            walls,
            width,
            exit,
            player,
            moves: 0,
        })
    }

    fn step(&self, dir: Direction) -> Option<(usize, usize)> {
        let (r, c) = self.player;
        let target = match dir {
            Direction::Up => (r.checked_sub(1)?, c),
            Direction::Down => (r + 1, c),
            Direction::Left => (r, c.checked_sub(1)?),
            Direction::Right => (r, c + 1),
        };
        if target.0 >= self.walls.len() || target.1 >= self.width || self.walls[target.0][target.1] {
            return None;
        }
        Some(target)
    }

    fn solved(&self) -> bool {
        self.player == self.exit
    }

    fn render(&self) -> Vec<String> {
        self.rows
            .iter()
            .enumerate()
            .map(|(r, row)| {
                row.chars()
                    .enumerate()
                    .map(|(c, ch)| if (r, c) == self.player { '@' } else { ch })
                    .collect()
            })
            .collect()
    }
}

/// Maze implementation of the puzzle session contract.
#[derive(Default)]
pub struct MazeSession {
    board: Option<Board>,
}

impl MazeSession {
    fn board(&self) -> Result<&Board, SessionError> {
        self.board.as_ref().ok_or(SessionError::NotInitialized)
    }
}

impl PuzzleSession for MazeSession {
    fn initialize(&mut self, data: &PuzzleData) -> Result<(), SessionError> {
        let PuzzleData::Maze(maze) = data else {
            return Err(SessionError::DataMismatch {
                expected: "maze".into(),
                found: data.family().into(),
            });
        };
        self.board = Some(Board::parse(&maze.rows, None)?);
        Ok(())
    }

    fn restore(&mut self, saved: &PuzzleSave) -> Result<(), SessionError> {
        let PuzzleSave::Maze(save) = saved else {
            return Err(SessionError::SaveMismatch {
                expected: "maze".into(),
                found: saved.family().into(),
            });
        };
        let mut board = Board::parse(&save.rows, Some(save.player))?;
        board.moves = save.moves;
        self.board = Some(board);
        Ok(())
    }

    fn process_input(&mut self, input: &str) -> Result<InputOutcome, SessionError> {
        let board = self.board.as_mut().ok_or(SessionError::NotInitialized)?;
        if board.solved() {
            return Err(SessionError::PuzzleOver);
        }
        let Some(dir) = Direction::parse(input) else {
            return Ok(InputOutcome::rejected(
                "move with: up, down, left, right (or w/a/s/d)",
            ));
        };
        let Some(target) = board.step(dir) else {
            return Ok(InputOutcome::rejected("a wall blocks the way"));
        };
        board.player = target;
        board.moves += 1;
        if board.solved() {
            Ok(InputOutcome::Finished { won: true })
        } else {
            Ok(InputOutcome::applied())
        }
    }

    fn is_over(&self) -> bool {
        self.board.as_ref().is_some_and(Board::solved)
    }

    fn view(&self) -> Result<PuzzleView, SessionError> {
        let board = self.board()?;
        Ok(PuzzleView::Maze(MazeView {
            rows: board.render(),
            player: board.player,
            exit: board.exit,
            moves: board.moves,
            solved: board.solved(),
        }))
    }

    fn result(&self) -> Option<PuzzleOutcome> {
        let board = self.board.as_ref()?;
        if !board.solved() {
            return None;
        }
        Some(PuzzleOutcome {
            won: true,
            moves: board.moves,
            attempts: 0,
            hints_used: 0,
        })
    }

    fn save(&self) -> Result<PuzzleSave, SessionError> {
        let board = self.board()?;
        Ok(PuzzleSave::Maze(MazeSave {
            rows: board.rows.clone(),
            player: board.player,
            moves: board.moves,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(rows: &[&str]) -> PuzzleData {
        PuzzleData::Maze(MazeData {
            rows: rows.iter().map(|r| (*r).to_string()).collect(),
        })
    }

    fn session(rows: &[&str]) -> MazeSession {
        let mut s = MazeSession::default();
        s.initialize(&data(rows)).unwrap();
        s
    }

    #[test]
    fn walks_to_the_exit() {
        let mut s = session(&["S.#", ".#.", "..E"]);
        assert_eq!(s.process_input("down").unwrap(), InputOutcome::applied());
        assert_eq!(s.process_input("down").unwrap(), InputOutcome::applied());
        assert_eq!(s.process_input("right").unwrap(), InputOutcome::applied());
        assert_eq!(
            s.process_input("right").unwrap(),
            InputOutcome::Finished { won: true }
        );
        assert!(s.is_over());
        let result = s.result().unwrap();
        assert!(result.won);
        assert_eq!(result.moves, 4);
    }

    #[test]
    fn walls_and_edges_reject_without_counting_a_move() {
        let mut s = session(&["S#", ".E"]);
        assert!(matches!(
            s.process_input("right").unwrap(),
            InputOutcome::Rejected { .. }
        ));
        assert!(matches!(
            s.process_input("up").unwrap(),
            InputOutcome::Rejected { .. }
        ));
        match s.view().unwrap() {
            PuzzleView::Maze(v) => assert_eq!(v.moves, 0),
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn unknown_direction_is_rejected() {
        let mut s = session(&["SE"]);
        assert!(matches!(
            s.process_input("jump").unwrap(),
            InputOutcome::Rejected { .. }
        ));
    }

    #[test]
    fn input_after_solve_is_an_error() {
        let mut s = session(&["SE"]);
        s.process_input("right").unwrap();
        assert!(matches!(
            s.process_input("left"),
            Err(SessionError::PuzzleOver)
        ));
    }

    #[test]
    fn save_restore_reproduces_position_and_moves() {
        let mut s = session(&["S..", "..E"]);
        s.process_input("right").unwrap();
        s.process_input("down").unwrap();
        let saved = s.save().unwrap();

        let mut restored = MazeSession::default();
        restored.restore(&saved).unwrap();
        match restored.view().unwrap() {
            PuzzleView::Maze(v) => {
                assert_eq!(v.player, (1, 1));
                assert_eq!(v.moves, 2);
                assert!(!v.solved);
            }
            other => panic!("unexpected view: {other:?}"),
        }
        // Play on from the restored state.
        assert_eq!(
            restored.process_input("right").unwrap(),
            InputOutcome::Finished { won: true }
        );
    }

    #[test]
    fn bad_grids_are_refused() {
        let mut s = MazeSession::default();
        assert!(s.initialize(&data(&["S.", "."])).is_err());
        assert!(s.initialize(&data(&["..", ".E"])).is_err());
        assert!(s.initialize(&data(&["SS", ".E"])).is_err());
        assert!(s.initialize(&data(&["S?", ".E"])).is_err());
    }

    #[test]
    fn restore_rejects_player_inside_a_wall() {
        let save = PuzzleSave::Maze(MazeSave {
            rows: vec!["S#".into(), ".E".into()],
            player: (0, 1),
            moves: 3,
        });
        let mut s = MazeSession::default();
        assert!(s.restore(&save).is_err());
    }

    #[test]
    fn view_marks_player_position() {
        let s = session(&["S.", ".E"]);
        match s.view().unwrap() {
            PuzzleView::Maze(v) => assert_eq!(v.rows, vec!["@.", ".E"]),
            other => panic!("unexpected view: {other:?}"),
        }
    }
}
