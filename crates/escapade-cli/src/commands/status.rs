use escapade_core::{Config, Database, DoorSession, SaveStore, UserId};
use serde::Serialize;

#[derive(Serialize)]
struct Status {
    difficulty: String,
    completed_doors: u8,
    next_door: Option<u8>,
    elapsed_secs: u64,
    remaining_secs: u64,
    paused_puzzle: Option<String>,
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let user = UserId::from_uuid(config.player_id);

    let Some(snapshot) = db.load_session_snapshot(user)? else {
        println!("{{\"saved_run\": false}}");
        return Ok(());
    };
    let doors = DoorSession::restore(&snapshot)?;
    let limit = config.time_limit_secs(doors.difficulty());
    let status = Status {
        difficulty: doors.difficulty().to_string(),
        completed_doors: doors.completed_count(),
        next_door: doors.next_available_door(),
        elapsed_secs: doors.elapsed_secs(),
        remaining_secs: limit.saturating_sub(doors.elapsed_secs()),
        paused_puzzle: db.load_paused_puzzle(user)?.map(|p| p.puzzle_id),
    };
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
