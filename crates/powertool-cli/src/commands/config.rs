//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use super::Cli;
use crate::output::{self, OutputFormat};
use powertool_core::config::AppConfig;
use powertool_core::error::AppError;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Validate the configuration files and environment
    Validate,
    /// Print the built-in defaults
    Defaults,
}

/// Execute config commands
pub fn execute(args: &ConfigArgs, cli: &Cli, format: OutputFormat) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let config = cli.load_config()?;
            output::print_item(&config, format);
        }
        ConfigCommand::Validate => match cli.load_config() {
            Ok(config) => {
                output::print_success(&format!(
                    "Configuration in '{}' (env: {}) is valid",
                    cli.config_dir, cli.env
                ));
                output::print_kv("Host", &config.host.name);
                output::print_kv("Host node id", &config.host.node_id);
                output::print_kv("Startup nodes", &config.host.nodes.join(", "));
                output::print_kv("Inbox capacity", &config.messaging.inbox_capacity.to_string());
                output::print_kv(
                    "Max payload bytes",
                    &config.messaging.max_payload_bytes.to_string(),
                );
                output::print_kv("Max frame bytes", &config.messaging.max_frame_bytes.to_string());
                if !config.plugins.auto_load {
                    output::print_warning("Plugin auto-load is disabled");
                }
            }
            Err(e) => {
                output::print_error(&format!("Configuration invalid: {}", e));
                return Err(e);
            }
        },
        ConfigCommand::Defaults => {
            output::print_item(&AppConfig::default(), format);
        }
    }

    Ok(())
}
