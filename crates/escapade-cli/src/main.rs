use clap::{Parser, Subcommand};

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "escapade", version, about = "Escapade escape-room CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play: resume the saved run, or start a new one
    Play {
        /// Difficulty for a new run (easy, medium, hard)
        #[arg(long)]
        difficulty: Option<String>,
        /// Discard any saved run and start fresh
        #[arg(long)]
        new: bool,
    },
    /// Print the saved run as JSON
    Status,
    /// Player statistics
    Stats,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Abandon the saved run
    Reset,
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Play { difficulty, new } => commands::play::run(difficulty, new),
        Commands::Status => commands::status::run(),
        Commands::Stats => commands::stats::run(),
        Commands::Config { action } => commands::config::run(action),
        Commands::Reset => commands::reset::run(),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
