//! The interactive game loop.
//!
//! One foreground loop owns all game state. It consumes a single channel fed
//! by two producers: a stdin reader thread (one event per line) and the
//! countdown's tick listener. Timer callbacks never touch game state
//! directly -- they only enqueue events, so every mutation happens here.

use std::io::{BufRead, Write};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

use escapade_core::{
    BuiltinCatalog, Config, CoreError, Database, DoorState, GameSession, SaveStore, SessionTimer,
    TurnOutcome, UserId,
};

use crate::render;

enum LoopEvent {
    Line(String),
    Eof,
    Tick(u64),
    TimeUp,
}

const CLOCK_LISTENER_KEY: &str = "cli-clock";

pub fn run(difficulty: Option<String>, force_new: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let catalog = BuiltinCatalog::default();
    let timer = SessionTimer::new();
    let user = UserId::from_uuid(config.player_id);

    let has_save = db.load_session_snapshot(user)?.is_some();
    let mut game = if has_save && !force_new {
        let game = GameSession::resume(&db, &catalog, timer.clone(), user, |d| {
            config.time_limit_secs(d)
        })?;
        println!(
            "resuming a {} run: {} of 5 doors open, {} on the clock",
            game.difficulty(),
            game.board().completed_count,
            format_clock(game.remaining_secs()),
        );
        if game.is_resuming() {
            println!("a saved puzzle is waiting behind the next door");
        }
        game
    } else {
        let difficulty = match difficulty {
            Some(raw) => raw.parse()?,
            None => config.difficulty,
        };
        let limit = config.time_limit_secs(difficulty);
        let seed = uuid::Uuid::new_v4().as_u128() as u64;
        let game =
            GameSession::start_new(&db, &catalog, timer.clone(), user, difficulty, limit, seed)?;
        println!(
            "a new {} run: five locked doors, {} on the clock",
            difficulty,
            format_clock(limit)
        );
        game
    };

    let (tx, rx) = sync_channel::<LoopEvent>(64);
    spawn_stdin_reader(tx.clone());

    print_board(&game);
    prompt();
    drive(&mut game, &timer, &tx, &rx)
}

/// The foreground loop. Returns when the run ends or the player leaves.
fn drive(
    game: &mut GameSession<'_>,
    timer: &SessionTimer,
    tx: &SyncSender<LoopEvent>,
    rx: &Receiver<LoopEvent>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        let event = match rx.recv() {
            Ok(event) => event,
            Err(_) => LoopEvent::Eof,
        };
        match event {
            LoopEvent::Tick(remaining) => {
                if remaining > 0 && (remaining % 60 == 0 || remaining <= 10) {
                    println!("[clock] {} remaining", format_clock(remaining));
                    prompt();
                }
            }
            LoopEvent::TimeUp => {
                game.expire()?;
                println!("\ntime is up -- the room keeps you. Run abandoned.");
                return Ok(());
            }
            LoopEvent::Eof => {
                game.suspend()?;
                println!("\nprogress saved. See you back at the doors.");
                return Ok(());
            }
            LoopEvent::Line(line) => {
                let line = line.trim();
                if line.is_empty() {
                    prompt();
                    continue;
                }
                let outcome = if game.in_puzzle() {
                    puzzle_turn(game, line)?
                } else {
                    door_turn(game, timer, tx, line)?
                };
                match outcome {
                    Flow::Continue => prompt(),
                    Flow::Leave => return Ok(()),
                }
            }
        }
    }
}

enum Flow {
    Continue,
    Leave,
}

fn door_turn(
    game: &mut GameSession<'_>,
    timer: &SessionTimer,
    tx: &SyncSender<LoopEvent>,
    line: &str,
) -> Result<Flow, Box<dyn std::error::Error>> {
    let mut parts = line.split_whitespace();
    match (
        parts.next().map(str::to_ascii_lowercase).as_deref(),
        parts.next(),
    ) {
        (Some("enter"), Some(door)) => {
            let Ok(door) = door.parse::<u8>() else {
                println!("usage: enter <door number>");
                return Ok(Flow::Continue);
            };
            let time_up = tx.clone();
            match game.enter_door(door, move || {
                let _ = time_up.try_send(LoopEvent::TimeUp);
            }) {
                Ok(_) => {
                    // Keep the clock printing through this puzzle. The key is
                    // stable, so re-adding after a previous stop is harmless.
                    let clock = tx.clone();
                    timer.add_listener(CLOCK_LISTENER_KEY, move |remaining| {
                        let _ = clock.try_send(LoopEvent::Tick(remaining));
                    });
                    if let Some(title) = game.active_title() {
                        println!("door {door}: {title}");
                    }
                    print_puzzle(game);
                }
                Err(CoreError::Session(e)) => println!("{e}"),
                Err(e) => return Err(e.into()),
            }
            Ok(Flow::Continue)
        }
        (Some("doors"), None) => {
            print_board(game);
            Ok(Flow::Continue)
        }
        (Some("time"), None) => {
            println!("[clock] {} remaining", format_clock(game.remaining_secs()));
            Ok(Flow::Continue)
        }
        (Some("exit"), None) => {
            game.suspend()?;
            println!("progress saved. See you back at the doors.");
            Ok(Flow::Leave)
        }
        (Some("abandon"), None) => {
            game.abandon()?;
            println!("run abandoned.");
            Ok(Flow::Leave)
        }
        (Some("help"), None) => {
            println!("door view: enter <n> | doors | time | exit | abandon");
            Ok(Flow::Continue)
        }
        _ => {
            println!("unknown command (try 'help')");
            Ok(Flow::Continue)
        }
    }
}

fn puzzle_turn(
    game: &mut GameSession<'_>,
    line: &str,
) -> Result<Flow, Box<dyn std::error::Error>> {
    match line.to_ascii_lowercase().as_str() {
        "save" => {
            match game.request_save() {
                Ok(_) => {
                    println!("puzzle saved -- you are back at the doors.");
                    print_board(game);
                }
                Err(CoreError::Session(e)) => println!("{e}"),
                Err(e) => return Err(e.into()),
            }
            return Ok(Flow::Continue);
        }
        "quit" => {
            match game.request_quit() {
                Ok(_) => {
                    println!("puzzle left unsaved -- you are back at the doors.");
                    print_board(game);
                }
                Err(CoreError::Session(e)) => println!("{e}"),
                Err(e) => return Err(e.into()),
            }
            return Ok(Flow::Continue);
        }
        "look" => {
            print_puzzle(game);
            return Ok(Flow::Continue);
        }
        _ => {}
    }

    match game.submit_input(line) {
        Ok(TurnOutcome::Puzzle(outcome)) => {
            match outcome {
                escapade_core::InputOutcome::Applied { message } => {
                    if let Some(message) = message {
                        println!("{message}");
                    }
                    print_puzzle(game);
                }
                escapade_core::InputOutcome::Rejected { reason } => println!("{reason}"),
                escapade_core::InputOutcome::Finished { .. } => {}
            }
            Ok(Flow::Continue)
        }
        Ok(TurnOutcome::DoorFinished { report, .. }) => {
            if report.won {
                println!(
                    "door {} unlocked! +{} points ({} to go)",
                    report.door,
                    report.score,
                    5 - game.board().completed_count
                );
            } else {
                println!("the puzzle beat you -- door {} stays shut. Try it again.", report.door);
            }
            print_board(game);
            Ok(Flow::Continue)
        }
        Ok(TurnOutcome::Victory { report, .. }) => {
            println!(
                "\nall five doors stand open -- you escaped the {} room!",
                report.difficulty
            );
            println!(
                "score {} in {}",
                report.score,
                format_clock(report.elapsed_secs)
            );
            Ok(Flow::Leave)
        }
        Err(CoreError::Session(e)) => {
            println!("{e}");
            Ok(Flow::Continue)
        }
        Err(e) => Err(e.into()),
    }
}

fn spawn_stdin_reader(tx: SyncSender<LoopEvent>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(LoopEvent::Line(line)).is_err() {
                        return;
                    }
                }
                Err(_) => break,
            }
        }
        let _ = tx.send(LoopEvent::Eof);
    });
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

fn print_board(game: &GameSession<'_>) {
    let board = game.board();
    let line = board
        .door_states
        .iter()
        .enumerate()
        .map(|(i, state)| {
            let tag = match state {
                DoorState::Completed => "open",
                DoorState::Available => "ready",
                DoorState::Locked => "locked",
            };
            format!("[{}:{tag}]", i + 1)
        })
        .collect::<Vec<_>>()
        .join(" ");
    println!("{line}");
    if let Some(next) = board.next_available_door {
        println!("next door: {next} -- 'enter {next}' to play it");
    }
}

fn print_puzzle(game: &GameSession<'_>) {
    match game.puzzle_view() {
        Ok(Some(view)) => println!("{}", render::render_view(&view)),
        Ok(None) => {}
        Err(e) => println!("{e}"),
    }
}

fn format_clock(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_formats_minutes_and_hours() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(61), "1:01");
        assert_eq!(format_clock(600), "10:00");
        assert_eq!(format_clock(3725), "1:02:05");
    }
}
