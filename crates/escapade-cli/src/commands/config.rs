use clap::Subcommand;
use escapade_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one config value
    Get { key: String },
    /// Set a config value and persist it
    Set { key: String, value: String },
    /// Print the whole config as JSON
    Show,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    match action {
        ConfigAction::Get { key } => match config.get(&key) {
            Some(value) => println!("{value}"),
            None => return Err(format!("unknown config key: {key}").into()),
        },
        ConfigAction::Set { key, value } => {
            config.set(&key, &value)?;
            println!("{key} = {value}");
        }
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }
    Ok(())
}
