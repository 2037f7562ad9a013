//! Host configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! TOML files plus environment variables. Each sub-module represents a
//! logical configuration section; every field has a default so an empty
//! configuration is valid.

pub mod host;
pub mod logging;
pub mod messaging;
pub mod plugin;

use serde::{Deserialize, Serialize};

pub use self::host::HostConfig;
pub use self::logging::LoggingConfig;
pub use self::messaging::MessagingConfig;
pub use self::plugin::PluginConfig;

use crate::error::AppError;

/// Root host configuration.
///
/// Top-level deserialization target for the merged configuration
/// (`config/default` + environment overlay + `POWERTOOL__*` variables).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Host identity and startup settings.
    #[serde(default)]
    pub host: HostConfig,
    /// Messaging channel settings.
    #[serde(default)]
    pub messaging: MessagingConfig,
    /// Plugin system settings.
    #[serde(default)]
    pub plugins: PluginConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from files and the environment.
    ///
    /// Merges `config/default` with an environment-specific overlay
    /// (`config/{env}`) and environment variables prefixed with
    /// `POWERTOOL__` (double underscore separates nesting, e.g.
    /// `POWERTOOL__MESSAGING__INBOX_CAPACITY=64`). Missing files are fine.
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::load_from("config", env)
    }

    /// Same as [`AppConfig::load`] but reads files from `dir`.
    pub fn load_from(dir: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(&format!("{dir}/default")).required(false))
            .add_source(config::File::with_name(&format!("{dir}/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("POWERTOOL")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("host.nodes")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let parsed: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        parsed.validate()?;
        Ok(parsed)
    }

    /// Rejects values the host cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.messaging.inbox_capacity == 0 {
            return Err(AppError::configuration(
                "messaging.inbox_capacity must be greater than zero",
            ));
        }
        if self.messaging.event_buffer_size == 0 {
            return Err(AppError::configuration(
                "messaging.event_buffer_size must be greater than zero",
            ));
        }
        if self.messaging.max_frame_bytes <= self.messaging.max_payload_bytes {
            return Err(AppError::configuration(
                "messaging.max_frame_bytes must be greater than messaging.max_payload_bytes",
            ));
        }
        if self.host.node_id.trim().is_empty() {
            return Err(AppError::configuration("host.node_id must not be empty"));
        }
        if self.host.nodes.iter().any(|n| *n == self.host.node_id) {
            return Err(AppError::configuration(format!(
                "host.nodes must not contain the host's own id '{}'",
                self.host.node_id
            )));
        }
        Ok(())
    }
}
