mod config;
mod llm;
mod orchestrator;
mod prompts;
mod store;
mod ui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::Config;
use ui::ChatApp;

#[derive(Parser)]
#[command(name = "chirp")]
#[command(version)]
#[command(about = "Cheerful streaming LLM chat for your terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Store the API key in the config file
    SetKey { key: String },
    /// Print or set the default model
    Model { name: Option<String> },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => {
            let config = Config::load()?;
            ChatApp::new(config).run().await?;
        }
        Some(Commands::SetKey { key }) => {
            let mut config = Config::load()?;
            config.set_api_key(key);
            config.save()?;
            println!("API key saved to {}", config.chirp_home.join("config.toml").display());
        }
        Some(Commands::Model { name }) => {
            let mut config = Config::load()?;
            match name {
                Some(name) => {
                    config.model = name;
                    config.save()?;
                    println!("Default model set to {}", config.model);
                }
                None => println!("{}", config.model),
            }
        }
    }

    Ok(())
}
