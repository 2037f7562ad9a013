//! Host notifications raised by plugins.

use std::fmt;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use powertool_core::types::id::PluginId;

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    /// Informational.
    Info,
    /// Something worked.
    Success,
    /// Something may need attention.
    Warning,
    /// Something failed.
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// A notification as raised by a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Raising plugin.
    pub plugin_id: PluginId,
    /// Severity.
    pub level: NotificationLevel,
    /// Title line.
    pub title: String,
    /// Body.
    pub message: String,
    /// When it was raised.
    pub raised_at: DateTime<Utc>,
}

/// Where plugin notifications go.
pub trait Notifier: Send + Sync {
    /// Shows (or records) a notification.
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, n: Notification) {
        match n.level {
            NotificationLevel::Info | NotificationLevel::Success => info!(
                plugin_id = %n.plugin_id,
                level = %n.level,
                title = %n.title,
                "{}", n.message
            ),
            NotificationLevel::Warning => warn!(
                plugin_id = %n.plugin_id,
                title = %n.title,
                "{}", n.message
            ),
            NotificationLevel::Error => error!(
                plugin_id = %n.plugin_id,
                title = %n.title,
                "{}", n.message
            ),
        }
    }
}

/// Keeps notifications in memory and logs them.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    received: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    /// Creates an empty notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything received so far, oldest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.received.lock().clone()
    }

    /// Removes and returns everything received so far.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.received.lock())
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) {
        TracingNotifier.notify(notification.clone());
        self.received.lock().push(notification);
    }
}
