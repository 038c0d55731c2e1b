use escapade_core::{Config, Database, UserId};
use serde::Serialize;

#[derive(Serialize)]
struct StatsOutput {
    player: String,
    sessions_won: u64,
    best_session_score: u32,
    fastest_escape_secs: Option<u64>,
    puzzles_completed: u64,
    recent_sessions: Vec<RecentSession>,
}

#[derive(Serialize)]
struct RecentSession {
    difficulty: String,
    score: u32,
    elapsed_secs: u64,
    completed_at: String,
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let user = UserId::from_uuid(config.player_id);

    let stats = db.stats(user)?;
    let recent = db
        .session_history(user)?
        .into_iter()
        .take(10)
        .map(|r| RecentSession {
            difficulty: r.difficulty.to_string(),
            score: r.score,
            elapsed_secs: r.elapsed_secs,
            completed_at: r.completed_at.to_rfc3339(),
        })
        .collect();

    let output = StatsOutput {
        player: config.player_name,
        sessions_won: stats.sessions_won,
        best_session_score: stats.best_session_score,
        fastest_escape_secs: stats.fastest_escape_secs,
        puzzles_completed: stats.puzzles_completed,
        recent_sessions: recent,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
