//! Plain-text rendering of puzzle views.

use escapade_core::puzzle::{CardState, MatchingView, MazeView, PuzzleView, WordView};

pub fn render_view(view: &PuzzleView) -> String {
    match view {
        PuzzleView::Maze(v) => render_maze(v),
        PuzzleView::Matching(v) => render_matching(v),
        PuzzleView::Word(v) => render_word(v),
    }
}

fn render_maze(view: &MazeView) -> String {
    let mut out = view.rows.join("\n");
    out.push_str(&format!(
        "\nyou are '@' -- reach 'E' ({} moves so far)",
        view.moves
    ));
    out
}

fn render_matching(view: &MatchingView) -> String {
    let width = view
        .cells
        .iter()
        .filter_map(|c| c.symbol.as_ref().map(String::len))
        .max()
        .unwrap_or(1)
        .max(1);

    let mut out = String::new();
    for (i, cell) in view.cells.iter().enumerate() {
        if i > 0 && i % view.columns == 0 {
            out.push('\n');
        }
        let text = match (&cell.state, &cell.symbol) {
            (CardState::Down, _) => "?".to_string(),
            (_, Some(symbol)) => symbol.clone(),
            (_, None) => "?".to_string(),
        };
        out.push_str(&format!("[{text:^width$}] "));
    }
    out.push_str(&format!(
        "\npairs {}/{} in {} attempts -- pick with: row col",
        view.matched_pairs, view.pairs_total, view.attempts
    ));
    out
}

fn render_word(view: &WordView) -> String {
    let mut out = view.prompt.clone();
    for hint in &view.revealed_hints {
        out.push_str(&format!("\nhint: {hint}"));
    }
    out.push_str(&format!(
        "\n{} of {} attempts used{}",
        view.attempts,
        view.max_attempts,
        if view.hints_left > 0 {
            format!(" -- {} hint(s) available, type 'hint'", view.hints_left)
        } else {
            String::new()
        }
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use escapade_core::puzzle::CardFace;

    #[test]
    fn maze_render_shows_grid_and_moves() {
        let out = render_view(&PuzzleView::Maze(MazeView {
            rows: vec!["@.".into(), ".E".into()],
            player: (0, 0),
            exit: (1, 1),
            moves: 3,
            solved: false,
        }));
        assert!(out.starts_with("@.\n.E"));
        assert!(out.contains("3 moves"));
    }

    #[test]
    fn matching_render_hides_down_cards() {
        let out = render_view(&PuzzleView::Matching(MatchingView {
            columns: 2,
            cells: vec![
                CardFace {
                    state: CardState::Up,
                    symbol: Some("key".into()),
                },
                CardFace {
                    state: CardState::Down,
                    symbol: None,
                },
            ],
            attempts: 1,
            matched_pairs: 0,
            pairs_total: 1,
        }));
        assert!(out.contains("key"));
        assert!(out.contains("[ ? ]"));
        assert!(out.contains("pairs 0/1"));
    }

    #[test]
    fn word_render_lists_revealed_hints() {
        let out = render_view(&PuzzleView::Word(WordView {
            prompt: "riddle me this".into(),
            revealed_hints: vec!["first hint".into()],
            hints_left: 1,
            attempts: 1,
            max_attempts: 3,
            over: false,
        }));
        assert!(out.contains("riddle me this"));
        assert!(out.contains("hint: first hint"));
        assert!(out.contains("1 of 3 attempts"));
    }
}
