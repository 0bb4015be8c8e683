//! CLI module for Vigil
//!
//! Command-line interface definitions and handlers for the Vigil dashboard
//! client.
//!
//! # Commands
//!
//! - `watch` - Connect to an aggregator and render the fleet
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Watch a local aggregator
//! vigil watch
//!
//! # Watch a remote aggregator, machine-readable output
//! vigil watch --origin https://fleet.example.com --json
//!
//! # Generate shell completions
//! vigil completions bash > ~/.bash_completion.d/vigil
//! ```

pub mod completions;
pub mod config;
pub mod output;
pub mod watch;

pub use completions::handle_completions;
pub use config::handle_config_init;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Vigil - Real-time server fleet dashboard client
#[derive(Parser, Debug)]
#[command(
    name = "vigil",
    version,
    about = "Real-time server fleet dashboard client"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect to an aggregator and render the fleet
    Watch(WatchArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "vigil.toml")]
    pub config: PathBuf,

    /// Override the aggregator origin (e.g. https://fleet.example.com)
    #[arg(short, long, env = "VIGIL_ORIGIN")]
    pub origin: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "VIGIL_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Emit one JSON document per refresh instead of a table
    #[arg(long)]
    pub json: bool,

    /// Seconds between renders
    #[arg(short, long, default_value = "2")]
    pub refresh: u64,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write an example configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output path for the configuration file
    #[arg(short, long, default_value = "vigil.toml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
