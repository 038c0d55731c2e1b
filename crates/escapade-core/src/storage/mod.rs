mod config;
pub mod database;
mod store;

pub use config::{Config, TimeLimits};
pub use database::{Database, PlayerStats};
pub use store::{PausedPuzzle, SaveStore, SessionRecord};

use std::path::PathBuf;

/// Returns the escapade data directory, creating it if needed.
///
/// `ESCAPADE_DATA_DIR` overrides the default `~/.config/escapade/`
/// (useful for tests and throwaway profiles).
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("ESCAPADE_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("escapade"),
    };
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
