//! Configuration management CLI commands.
//!
//! Provides `config get`, `config set`, `config list`, and `config path`
//! commands for viewing and modifying settings from the command line.

use clap::Subcommand;

use flowlayer::config::{ConfigFile, CONFIG_KEYS};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., animation.opacity)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key in format section.key (e.g., animation.opacity)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration settings
    List,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => run_get(&key),
        ConfigCommands::Set { key, value } => run_set(&key, &value),
        ConfigCommands::List => run_list(),
        ConfigCommands::Path => run_path(),
    }
}

fn run_get(key: &str) -> Result<(), CliError> {
    let config = ConfigFile::load().unwrap_or_default();
    let value = config.get(key).ok_or_else(|| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'flowlayer config list' to see available keys.",
            key
        ))
    })?;

    if value.is_empty() {
        println!("(not set)");
    } else {
        println!("{}", value);
    }
    Ok(())
}

fn run_set(key: &str, value: &str) -> Result<(), CliError> {
    let mut config = ConfigFile::load().unwrap_or_default();
    config.set(key, value)?;
    config.save()?;
    println!("{} = {}", key, value);
    Ok(())
}

fn run_list() -> Result<(), CliError> {
    let config = ConfigFile::load().unwrap_or_default();
    for key in CONFIG_KEYS {
        let value = config.get(key).unwrap_or_default();
        if value.is_empty() {
            println!("{} = (not set)", key);
        } else {
            println!("{} = {}", key, value);
        }
    }
    Ok(())
}

fn run_path() -> Result<(), CliError> {
    println!("{}", ConfigFile::path().display());
    Ok(())
}
