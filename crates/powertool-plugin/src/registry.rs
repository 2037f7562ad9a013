//! Plugin registry: loaded plugin instances, their contexts and metadata.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use powertool_core::error::AppError;
use powertool_core::types::id::PluginId;

use crate::api::context::PluginContext;

/// Metadata about a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    /// Unique plugin identifier.
    pub id: PluginId,
    /// Human-readable plugin name.
    pub name: String,
    /// Plugin version string.
    pub version: String,
    /// Plugin description.
    #[serde(default)]
    pub description: String,
    /// Author or maintainer.
    #[serde(default)]
    pub author: String,
}

impl PluginInfo {
    /// Creates metadata with an empty description and author.
    pub fn new(id: impl Into<PluginId>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
            description: String::new(),
            author: String::new(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }
}

/// Trait that all plugins must implement.
#[async_trait::async_trait]
pub trait Plugin: Send + Sync + std::fmt::Debug {
    /// Returns plugin metadata.
    fn info(&self) -> PluginInfo;

    /// Called once when the plugin is loaded. Register hooks, observers and
    /// listeners through `ctx` here.
    async fn on_load(&self, ctx: &PluginContext) -> Result<(), String>;

    /// Called when the plugin is unloaded, before its registrations are removed.
    async fn on_unload(&self, _ctx: &PluginContext) -> Result<(), String> {
        Ok(())
    }
}

/// A plugin as held by the registry.
#[derive(Debug, Clone)]
pub struct LoadedPlugin {
    /// The plugin instance.
    pub plugin: Arc<dyn Plugin>,
    /// Its context.
    pub context: PluginContext,
    /// When it was registered.
    pub loaded_at: DateTime<Utc>,
}

/// Registry of all loaded plugins, in load order.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: RwLock<Vec<LoadedPlugin>>,
}

impl PluginRegistry {
    /// Creates a new empty plugin registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin. Fails with `Conflict` if its id is taken.
    pub async fn register(&self, plugin: Arc<dyn Plugin>, context: PluginContext) -> Result<(), AppError> {
        let info = context.info().clone();
        let mut plugins = self.plugins.write().await;

        if plugins.iter().any(|p| p.context.id() == &info.id) {
            return Err(AppError::conflict(format!(
                "Plugin '{}' is already registered",
                info.id
            )));
        }

        info!(plugin_id = %info.id, name = %info.name, version = %info.version, "Registering plugin");

        plugins.push(LoadedPlugin {
            plugin,
            context,
            loaded_at: Utc::now(),
        });
        Ok(())
    }

    /// Unregisters a plugin by ID.
    pub async fn unregister(&self, plugin_id: &PluginId) -> Result<LoadedPlugin, AppError> {
        let mut plugins = self.plugins.write().await;
        let index = plugins
            .iter()
            .position(|p| p.context.id() == plugin_id)
            .ok_or_else(|| AppError::not_found(format!("Plugin '{}' not found", plugin_id)))?;

        let loaded = plugins.remove(index);
        info!(plugin_id = %plugin_id, "Plugin unregistered");
        Ok(loaded)
    }

    /// Gets a loaded plugin by ID.
    pub async fn get(&self, plugin_id: &PluginId) -> Option<LoadedPlugin> {
        let plugins = self.plugins.read().await;
        plugins.iter().find(|p| p.context.id() == plugin_id).cloned()
    }

    /// Gets a plugin's context by ID.
    pub async fn context(&self, plugin_id: &PluginId) -> Option<PluginContext> {
        self.get(plugin_id).await.map(|p| p.context)
    }

    /// Lists plugin metadata in load order.
    pub async fn list(&self) -> Vec<PluginInfo> {
        let plugins = self.plugins.read().await;
        plugins.iter().map(|p| p.context.info().clone()).collect()
    }

    /// Returns plugin count.
    pub async fn count(&self) -> usize {
        self.plugins.read().await.len()
    }

    /// Checks whether a plugin is registered.
    pub async fn contains(&self, plugin_id: &PluginId) -> bool {
        let plugins = self.plugins.read().await;
        plugins.iter().any(|p| p.context.id() == plugin_id)
    }
}
