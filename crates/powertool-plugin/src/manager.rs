//! Plugin manager: lifecycle management for all plugins.

use std::sync::Arc;

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tracing::{error, info, warn};

use powertool_core::config::PluginConfig;
use powertool_core::error::{AppError, ErrorKind};
use powertool_core::types::id::PluginId;

use crate::api::context::PluginContext;
use crate::api::services::{HostServices, ReleaseSummary};
use crate::registry::{Plugin, PluginInfo, PluginRegistry};

/// Manages the full lifecycle of plugins: load and unload.
#[derive(Debug)]
pub struct PluginManager {
    /// Plugin registry.
    plugin_registry: Arc<PluginRegistry>,
    /// Services contexts are built from.
    services: HostServices,
    /// Plugin settings.
    config: PluginConfig,
}

impl PluginManager {
    /// Creates a new plugin manager.
    pub fn new(services: HostServices, config: PluginConfig) -> Self {
        Self {
            plugin_registry: Arc::new(PluginRegistry::new()),
            services,
            config,
        }
    }

    /// Loads a compiled-in plugin.
    ///
    /// The plugin is registered first so its `on_load` can use the full
    /// context. If `on_load` fails or panics, everything it registered is
    /// removed again and the error is returned as `ErrorKind::Plugin`.
    pub async fn load_plugin(&self, plugin: Arc<dyn Plugin>) -> Result<PluginContext, AppError> {
        let info = plugin.info();
        let plugin_id = info.id.clone();

        if plugin_id.as_str().trim().is_empty() {
            return Err(AppError::validation("Plugin id must not be empty"));
        }
        if !self.config.is_enabled(plugin_id.as_str()) {
            return Err(AppError::plugin(format!(
                "Plugin '{}' is disabled by configuration",
                plugin_id
            )));
        }

        let context = self.services.context_for(info.clone());

        // Register
        self.plugin_registry
            .register(plugin.clone(), context.clone())
            .await?;

        // Load
        let outcome = AssertUnwindSafe(plugin.on_load(&context))
            .catch_unwind()
            .await;
        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(_) => Some("on_load panicked".to_string()),
        };

        if let Some(reason) = failure {
            error!(plugin_id = %plugin_id, error = %reason, "Plugin load failed, rolling back");
            self.services.release(&plugin_id);
            if let Err(e) = self.plugin_registry.unregister(&plugin_id).await {
                warn!(plugin_id = %plugin_id, error = %e, "Rollback could not unregister plugin");
            }
            return Err(AppError::plugin(format!(
                "Plugin '{}' load failed: {}",
                plugin_id, reason
            )));
        }

        info!(
            plugin_id = %plugin_id,
            name = %info.name,
            version = %info.version,
            hooks = ?self.services.hooks.registered_hooks(&plugin_id),
            "Plugin loaded"
        );

        Ok(context)
    }

    /// Unloads a plugin and removes its hooks, observers, listeners and toolbars.
    pub async fn unload_plugin(&self, plugin_id: &PluginId) -> Result<ReleaseSummary, AppError> {
        let loaded = self
            .plugin_registry
            .get(plugin_id)
            .await
            .ok_or_else(|| AppError::not_found(format!("Plugin '{}' not found", plugin_id)))?;

        // Unload
        match AssertUnwindSafe(loaded.plugin.on_unload(&loaded.context))
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(plugin_id = %plugin_id, error = %e, "Plugin unload returned error"),
            Err(_) => error!(plugin_id = %plugin_id, "Plugin unload panicked"),
        }

        let summary = self.services.release(plugin_id);
        self.plugin_registry.unregister(plugin_id).await?;

        info!(
            plugin_id = %plugin_id,
            observers = summary.observers,
            listeners = summary.listeners,
            toolbars = summary.toolbars,
            "Plugin unloaded"
        );

        Ok(summary)
    }

    /// Unloads all plugins, most recently loaded first.
    pub async fn unload_all(&self) -> Result<(), AppError> {
        let plugins = self.plugin_registry.list().await;

        for info in plugins.iter().rev() {
            match self.unload_plugin(&info.id).await {
                Err(e) if e.kind != ErrorKind::NotFound => {
                    error!(plugin_id = %info.id, error = %e, "Error unloading plugin");
                }
                _ => {}
            }
        }

        info!(count = plugins.len(), "All plugins unloaded");
        Ok(())
    }

    /// A loaded plugin's context.
    pub async fn context(&self, plugin_id: &PluginId) -> Option<PluginContext> {
        self.plugin_registry.context(plugin_id).await
    }

    /// Returns the plugin registry.
    pub fn plugin_registry(&self) -> &Arc<PluginRegistry> {
        &self.plugin_registry
    }

    /// Returns the shared services.
    pub fn services(&self) -> &HostServices {
        &self.services
    }

    /// Lists all loaded plugins.
    pub async fn list_plugins(&self) -> Vec<PluginInfo> {
        self.plugin_registry.list().await
    }
}
