//! Config command for managing CLI configuration

use clap::{Args, Subcommand};

use crate::config::{config_file_path, Config};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print one setting
    Get {
        /// Setting name: data_dir, default_graph or format
        key: String,
    },
    /// Change one setting and save the config file
    Set {
        /// Setting name: data_dir, default_graph or format
        key: String,
        /// New value
        value: String,
    },
    /// Restore one setting to its default
    Reset {
        /// Setting name: data_dir, default_graph or format
        key: String,
    },
    /// Print every setting as TOML
    List,
    /// Print the config file location
    Path,
    /// Write a config file holding the defaults
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(args: &ConfigArgs) -> anyhow::Result<()> {
    match &args.command {
        ConfigCommands::Get { key } => {
            let value = Config::load().get(key).ok_or_else(|| unknown_key(key))?;
            println!("{}", value);
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load();
            config.set(key, value)?;
            config.save()?;
            tracing::info!("Config {} set to {}", key, value);
            println!("{} = {}", key, value);
        }
        ConfigCommands::Reset { key } => {
            let default = Config::default().get(key).ok_or_else(|| unknown_key(key))?;
            let mut config = Config::load();
            config.set(key, &default)?;
            config.save()?;
            println!("{} = {}", key, default);
        }
        ConfigCommands::List => {
            println!("# {}", config_file_path().display());
            print!("{}", toml::to_string_pretty(&Config::load())?);
        }
        ConfigCommands::Path => println!("{}", config_file_path().display()),
        ConfigCommands::Init { force } => {
            let path = config_file_path();
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }
            Config::default().save()?;
            println!("Wrote default config to {}", path.display());
        }
    }
    Ok(())
}

fn unknown_key(key: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Unknown config key: {} (available: {})",
        key,
        Config::keys().join(", ")
    )
}
