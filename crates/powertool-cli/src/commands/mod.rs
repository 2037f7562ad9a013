//! CLI command definitions and dispatch.

pub mod config;
pub mod run;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use powertool_core::config::AppConfig;
use powertool_core::error::AppError;

/// Powertool plugin extension host
#[derive(Debug, Parser)]
#[command(name = "powertool", version, about, long_about = None)]
pub struct Cli {
    /// Directory holding `default.toml` and environment overlays
    #[arg(short, long, default_value = "config")]
    pub config_dir: String,

    /// Configuration environment overlay
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Boot a host, load the bundled plugin and drive one session against it
    Run(run::RunArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Run(args) => run::execute(args, self.load_config()?, self.format).await,
            Commands::Config(args) => config::execute(args, self, self.format),
        }
    }

    /// Load configuration from the selected directory and environment
    pub fn load_config(&self) -> Result<AppConfig, AppError> {
        AppConfig::load_from(&self.config_dir, &self.env)
    }
}
