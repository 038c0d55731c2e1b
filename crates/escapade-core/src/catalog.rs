//! Puzzle catalog.
//!
//! The catalog owns the immutable puzzle definitions and hands a session its
//! five door assignments, filtered by difficulty. Assignment is seeded so a
//! given session always reproduces the same pick order.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::error::SessionError;
use crate::puzzle::{
    Difficulty, MatchingData, MazeData, Puzzle, PuzzleData, PuzzleKind, WordData, DOOR_COUNT,
};

/// Source of puzzle definitions. The built-in catalog covers stock content;
/// hosts may supply their own.
pub trait PuzzleCatalog: Send + Sync {
    fn puzzle(&self, id: &str) -> Option<&Puzzle>;

    fn for_difficulty(&self, difficulty: Difficulty) -> Vec<&Puzzle>;

    /// Pick one puzzle per door for a new session. Deterministic per seed.
    fn assign_doors(&self, difficulty: Difficulty, seed: u64) -> Result<Vec<Puzzle>, SessionError> {
        let mut pool = self.for_difficulty(difficulty);
        if pool.len() < DOOR_COUNT {
            return Err(SessionError::InvalidPuzzleData(format!(
                "catalog holds {} {difficulty} puzzles, need {DOOR_COUNT}",
                pool.len()
            )));
        }
        let mut rng = Pcg64::seed_from_u64(seed);
        pool.shuffle(&mut rng);
        Ok(pool.into_iter().take(DOOR_COUNT).cloned().collect())
    }
}

/// The stock puzzle set: seven puzzles per difficulty across all five kinds.
pub struct BuiltinCatalog {
    puzzles: Vec<Puzzle>,
}

impl PuzzleCatalog for BuiltinCatalog {
    fn puzzle(&self, id: &str) -> Option<&Puzzle> {
        self.puzzles.iter().find(|p| p.id == id)
    }

    fn for_difficulty(&self, difficulty: Difficulty) -> Vec<&Puzzle> {
        self.puzzles
            .iter()
            .filter(|p| p.difficulty == difficulty)
            .collect()
    }
}

fn maze(id: &str, difficulty: Difficulty, title: &str, rows: &[&str]) -> Puzzle {
    Puzzle {
        id: id.into(),
        kind: PuzzleKind::Maze,
        difficulty,
        title: title.into(),
        data: PuzzleData::Maze(MazeData {
            rows: rows.iter().map(|r| (*r).to_string()).collect(),
        }),
    }
}

fn matching(id: &str, difficulty: Difficulty, title: &str, cards: &[&str], columns: usize) -> Puzzle {
    Puzzle {
        id: id.into(),
        kind: PuzzleKind::Matching,
        difficulty,
        title: title.into(),
        data: PuzzleData::Matching(MatchingData {
            cards: cards.iter().map(|c| (*c).to_string()).collect(),
            columns,
        }),
    }
}

#[allow(clippy::too_many_arguments)]
fn word(
    id: &str,
    kind: PuzzleKind,
    difficulty: Difficulty,
    title: &str,
    prompt: &str,
    answer: &str,
    hints: &[&str],
    max_attempts: u32,
) -> Puzzle {
    Puzzle {
        id: id.into(),
        kind,
        difficulty,
        title: title.into(),
        data: PuzzleData::Word(WordData {
            prompt: prompt.into(),
            answer: answer.into(),
            hints: hints.iter().map(|h| (*h).to_string()).collect(),
            max_attempts,
        }),
    }
}

impl Default for BuiltinCatalog {
    fn default() -> Self {
        use Difficulty::{Easy, Hard, Medium};
        use PuzzleKind::{Anagram, Cipher, Riddle};

        let puzzles = vec![
            // ── Easy ─────────────────────────────────────────────────
            maze(
                "easy-cellar-maze",
                Easy,
                "The Cellar",
                &["S....", ".###.", ".....", ".###.", "....E"],
            ),
            maze(
                "easy-garden-maze",
                Easy,
                "The Walled Garden",
                &["S.#..", "..#..", "..#..", ".....", "..#.E"],
            ),
            matching(
                "easy-keyring-cards",
                Easy,
                "The Keyring",
                &["key", "rope", "rope", "key"],
                2,
            ),
            matching(
                "easy-lantern-cards",
                Easy,
                "Lantern Light",
                &["torch", "bell", "map", "bell", "map", "torch"],
                3,
            ),
            word(
                "easy-note-cipher",
                Cipher,
                Easy,
                "The Crumpled Note",
                "A note reads 'IFMMP'. Every letter was shifted one step forward.",
                "hello",
                &["Shift each letter one step back", "I comes from H"],
                5,
            ),
            word(
                "easy-lock-anagram",
                Anagram,
                Easy,
                "Scrambled Brass",
                "Unscramble: CKOL",
                "lock",
                &["It keeps the door shut"],
                5,
            ),
            word(
                "easy-piano-riddle",
                Riddle,
                Easy,
                "The Music Room",
                "What has keys but cannot open a single lock?",
                "piano",
                &["It stands in the music room", "It has black and white keys"],
                4,
            ),
            // ── Medium ───────────────────────────────────────────────
            maze(
                "medium-library-maze",
                Medium,
                "The Library Stacks",
                &[
                    "S..#...",
                    "##.#.#.",
                    "...#.#.",
                    ".#...#.",
                    ".#..#.E",
                ],
            ),
            maze(
                "medium-attic-maze",
                Medium,
                "The Attic",
                &[
                    "S......",
                    ".#####.",
                    ".#...#.",
                    ".#.#.#.",
                    ".#.#.#.",
                    ".#.#...",
                    "...#..E",
                ],
            ),
            matching(
                "medium-study-cards",
                Medium,
                "The Study Drawer",
                &["gem", "coin", "book", "coin", "gem", "clock", "clock", "book"],
                4,
            ),
            matching(
                "medium-parlor-cards",
                Medium,
                "The Parlor Cabinet",
                &["candle", "chest", "crown", "chest", "candle", "quill", "quill", "crown"],
                4,
            ),
            word(
                "medium-ledger-cipher",
                Cipher,
                Medium,
                "The Ledger Margin",
                "Scrawled in the margin: 'WKH NHB LV UXVW'. Three steps too far.",
                "the key is rust",
                &["Shift each letter three steps back", "WKH is THE"],
                4,
            ),
            word(
                "medium-escape-anagram",
                Anagram,
                Medium,
                "Seven Loose Tiles",
                "Unscramble: PACESE",
                "escape",
                &["It is what you are trying to do"],
                4,
            ),
            word(
                "medium-map-riddle",
                Riddle,
                Medium,
                "The Chart Table",
                "I have cities but no houses, rivers but no water, and roads but no carts.",
                "map",
                &["It is pinned to the chart table"],
                3,
            ),
            // ── Hard ─────────────────────────────────────────────────
            maze(
                "hard-catacomb-maze",
                Hard,
                "The Catacombs",
                &[
                    "S.#...#..",
                    "..#.#.#.#",
                    "#...#....",
                    ".#.###.#.",
                    "...#...#.",
                    ".#...#.#.",
                    "..#..#..E",
                ],
            ),
            maze(
                "hard-rampart-maze",
                Hard,
                "The Ramparts",
                &[
                    "S#.......",
                    ".#.#####.",
                    ".#.#...#.",
                    ".#.#.#.#.",
                    "...#.#..E",
                ],
            ),
            matching(
                "hard-vault-cards",
                Hard,
                "The Vault Wall",
                &[
                    "key", "gem", "map", "coin", "bell", "gem", "coin", "torch", "map", "torch",
                    "bell", "key",
                ],
                4,
            ),
            matching(
                "hard-armory-cards",
                Hard,
                "The Armory Rack",
                &[
                    "dagger", "shield", "helm", "bow", "helm", "lance", "bow", "dagger", "lance",
                    "shield", "horn", "horn",
                ],
                4,
            ),
            word(
                "hard-crypt-cipher",
                Cipher,
                Hard,
                "The Crypt Inscription",
                "Carved above the arch: 'GUR QBBE VF BCRA'. Half the alphabet away.",
                "the door is open",
                &["Rotate each letter thirteen places"],
                3,
            ),
            word(
                "hard-lantern-anagram",
                Anagram,
                Hard,
                "Cold Iron Letters",
                "Unscramble: RENNALT",
                "lantern",
                &["You carry it through the dark"],
                3,
            ),
            word(
                "hard-footsteps-riddle",
                Riddle,
                Hard,
                "The Long Corridor",
                "The more you take, the more you leave behind. What am I?",
                "footsteps",
                &["Listen to the corridor floor"],
                3,
            ),
        ];
        Self { puzzles }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::session_for;
    use std::collections::{HashSet, VecDeque};

    #[test]
    fn every_difficulty_can_fill_five_doors() {
        let catalog = BuiltinCatalog::default();
        for d in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            assert!(catalog.for_difficulty(d).len() >= DOOR_COUNT);
        }
    }

    #[test]
    fn ids_are_unique() {
        let catalog = BuiltinCatalog::default();
        let ids: HashSet<_> = catalog.puzzles.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids.len(), catalog.puzzles.len());
    }

    #[test]
    fn every_builtin_puzzle_initializes() {
        let catalog = BuiltinCatalog::default();
        for puzzle in &catalog.puzzles {
            let mut session = session_for(puzzle.kind);
            session
                .initialize(&puzzle.data)
                .unwrap_or_else(|e| panic!("{} failed to initialize: {e}", puzzle.id));
            assert!(!session.is_over(), "{} starts already over", puzzle.id);
        }
    }

    #[test]
    fn every_builtin_maze_is_solvable() {
        let catalog = BuiltinCatalog::default();
        for puzzle in &catalog.puzzles {
            let PuzzleData::Maze(ref maze) = puzzle.data else {
                continue;
            };
            let grid: Vec<Vec<char>> = maze.rows.iter().map(|r| r.chars().collect()).collect();
            let find = |target: char| {
                grid.iter().enumerate().find_map(|(r, row)| {
                    row.iter()
                        .position(|&c| c == target)
                        .map(|c| (r, c))
                })
            };
            let start = find('S').unwrap();
            let exit = find('E').unwrap();

            let mut seen = HashSet::from([start]);
            let mut queue = VecDeque::from([start]);
            let mut reached = false;
            while let Some((r, c)) = queue.pop_front() {
                if (r, c) == exit {
                    reached = true;
                    break;
                }
                let neighbors = [
                    (r.wrapping_sub(1), c),
                    (r + 1, c),
                    (r, c.wrapping_sub(1)),
                    (r, c + 1),
                ];
                for (nr, nc) in neighbors {
                    if nr < grid.len()
                        && nc < grid[nr].len()
                        && grid[nr][nc] != '#'
                        && seen.insert((nr, nc))
                    {
                        queue.push_back((nr, nc));
                    }
                }
            }
            assert!(reached, "{} has no path to the exit", puzzle.id);
        }
    }

    #[test]
    fn assignment_is_deterministic_per_seed() {
        let catalog = BuiltinCatalog::default();
        let a = catalog.assign_doors(Difficulty::Medium, 42).unwrap();
        let b = catalog.assign_doors(Difficulty::Medium, 42).unwrap();
        assert_eq!(
            a.iter().map(|p| &p.id).collect::<Vec<_>>(),
            b.iter().map(|p| &p.id).collect::<Vec<_>>()
        );
        assert_eq!(a.len(), DOOR_COUNT);
        let unique: HashSet<_> = a.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(unique.len(), DOOR_COUNT);
        assert!(a.iter().all(|p| p.difficulty == Difficulty::Medium));
    }

    #[test]
    fn lookup_by_id() {
        let catalog = BuiltinCatalog::default();
        assert!(catalog.puzzle("easy-cellar-maze").is_some());
        assert!(catalog.puzzle("missing").is_none());
    }
}
