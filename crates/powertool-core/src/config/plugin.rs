//! Plugin system configuration.

use serde::{Deserialize, Serialize};

/// Plugin system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Whether bundled plugins are loaded automatically on startup.
    #[serde(default = "default_true")]
    pub auto_load: bool,
    /// Plugin ids that must not be loaded even when bundled.
    #[serde(default)]
    pub disabled: Vec<String>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            auto_load: true,
            disabled: Vec::new(),
        }
    }
}

impl PluginConfig {
    /// Whether the plugin with this id may be loaded.
    pub fn is_enabled(&self, plugin_id: &str) -> bool {
        !self.disabled.iter().any(|id| id == plugin_id)
    }
}

fn default_true() -> bool {
    true
}
