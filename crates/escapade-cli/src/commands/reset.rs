use escapade_core::{Config, Database, SaveStore, UserId};

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let user = UserId::from_uuid(config.player_id);

    let had_run = db.load_session_snapshot(user)?.is_some();
    db.clear_paused_puzzle(user)?;
    db.clear_session_snapshot(user)?;

    if had_run {
        println!("saved run abandoned");
    } else {
        println!("nothing to reset");
    }
    Ok(())
}
