//! Drives one host session from the command line.
//!
//! Boots a host, connects the requested nodes with a scripted reply hook,
//! loads the bundled clear-tab plugin and exercises every surface it touches:
//! the tab context menu, the editor toolbar and a player request per node.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use serde::Serialize;
use tabled::Tabled;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::output::{self, OutputFormat};
use plugin_clear_tab::ClearTabPlugin;
use plugin_clear_tab::hooks::CLEAR_TAB_LABEL;
use plugin_clear_tab::packets::{GREETING_TOKEN, PlayerPacket};
use powertool_core::config::AppConfig;
use powertool_core::error::AppError;
use powertool_core::types::id::{NodeId, Token};
use powertool_plugin::PowertoolHost;
use powertool_plugin::notify::MemoryNotifier;
use powertool_realtime::Payload;

/// Arguments for the run command
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Nodes to connect (comma separated); defaults to `host.nodes`
    #[arg(short, long, value_delimiter = ',')]
    pub nodes: Vec<String>,

    /// Player name each node reports
    #[arg(short, long, default_value = "player")]
    pub player: String,

    /// Seconds to wait for node traffic to settle
    #[arg(short, long, default_value_t = 2)]
    pub timeout: u64,
}

/// What a scripted node saw during the session.
#[derive(Debug)]
enum NodeTraffic {
    Greeted(NodeId),
    Replied(NodeId, Payload),
}

#[derive(Debug, Default, Serialize, Tabled)]
struct NodeRow {
    #[tabled(rename = "Node")]
    node: String,
    #[tabled(rename = "Greeted")]
    greeted: bool,
    #[tabled(rename = "Reply")]
    reply: String,
}

#[derive(Debug, Serialize, Tabled)]
struct PluginRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Version")]
    version: String,
}

#[derive(Debug, Serialize, Tabled)]
struct NotificationRow {
    #[tabled(rename = "Plugin")]
    plugin: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Message")]
    message: String,
}

/// Execute the run command
pub async fn execute(args: &RunArgs, mut config: AppConfig, format: OutputFormat) -> Result<(), AppError> {
    if !args.nodes.is_empty() {
        config.host.nodes = args.nodes.clone();
    }
    config.validate()?;

    let auto_load = config.plugins.auto_load;
    let node_ids: Vec<NodeId> = config.host.nodes.iter().map(|n| NodeId::new(n.as_str())).collect();

    let notifier = Arc::new(MemoryNotifier::new());
    let host = PowertoolHost::with_notifier(config, notifier.clone())?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut runtimes = Vec::with_capacity(node_ids.len());
    for node_id in &node_ids {
        let events = tx.clone();
        let runtime = host.connect_node_with(node_id.clone(), move |runtime| {
            let me = runtime.node_id().clone();
            runtime.set_reply_hook(move |_from, receipt, reply| {
                if let Some(token) = &receipt.correlation {
                    tracing::debug!(node_id = %me, token = %token, "Reply received");
                    let _ = events.send(NodeTraffic::Replied(me.clone(), receipt.payload));
                } else if receipt.reply_token.as_ref().is_some_and(|t| *t == GREETING_TOKEN) {
                    let _ = events.send(NodeTraffic::Greeted(me.clone()));
                    reply.reply("Received!");
                }
                None
            });
        })?;
        runtimes.push(runtime);
    }
    drop(tx);

    if auto_load {
        host.load_plugin(Arc::new(ClearTabPlugin::new())).await?;
    } else {
        output::print_warning("Plugin auto-load is disabled; running without plugins");
    }

    let editor = host.create_editor();
    let tab = editor.open_tab("scratch.lua", "print('hello')");
    let menu = host.tab_context(&editor, tab.id)?;
    if menu.activate_label(CLEAR_TAB_LABEL) {
        tracing::info!(tab_id = %tab.id, "Tab cleared from the context menu");
    }
    for toolbar in host.toolbars().for_editor(editor.id()) {
        for entry in toolbar.entries() {
            toolbar.click(&entry.id);
        }
    }
    if let Some(report) = host.close_editor(editor.id()) {
        for failure in &report.failures {
            output::print_warning(&format!(
                "editor.onClose failed in {}: {}",
                failure.plugin_id, failure.message
            ));
        }
    }

    for runtime in &runtimes {
        let packet = PlayerPacket {
            local_player: format!("{}@{}", args.player, runtime.node_id()),
        };
        let payload = serde_json::to_value(&packet)
            .map_err(|e| AppError::serialization(format!("Failed to encode player packet: {e}")))?;
        runtime.send(Some(Token::from(format!("player-{}", runtime.node_id()))), payload);
    }

    let mut rows: Vec<NodeRow> = node_ids
        .iter()
        .map(|id| NodeRow {
            node: id.to_string(),
            ..NodeRow::default()
        })
        .collect();

    if auto_load && !node_ids.is_empty() {
        let deadline = Instant::now() + Duration::from_secs(args.timeout);
        let mut pending = node_ids.len() * 2;
        while pending > 0 {
            let event = match tokio::time::timeout_at(deadline, rx.recv()).await {
                Ok(Some(event)) => event,
                Ok(None) => break,
                Err(_) => {
                    output::print_warning("Timed out waiting for node traffic");
                    break;
                }
            };
            match event {
                NodeTraffic::Greeted(id) => {
                    if let Some(row) = rows.iter_mut().find(|r| id == r.node.as_str()) {
                        row.greeted = true;
                    }
                }
                NodeTraffic::Replied(id, payload) => {
                    if let Some(row) = rows.iter_mut().find(|r| id == r.node.as_str()) {
                        row.reply = payload
                            .as_str()
                            .map(str::to_string)
                            .unwrap_or_else(|| payload.to_string());
                    }
                }
            }
            pending -= 1;
        }
    }

    let plugins: Vec<PluginRow> = host
        .plugins()
        .await
        .into_iter()
        .map(|p| PluginRow {
            id: p.id.to_string(),
            name: p.name,
            version: p.version,
        })
        .collect();
    let notifications: Vec<NotificationRow> = notifier
        .drain()
        .into_iter()
        .map(|n| NotificationRow {
            plugin: n.plugin_id.to_string(),
            level: n.level.to_string(),
            title: n.title,
            message: n.message,
        })
        .collect();

    output::print_heading("Plugins", format);
    output::print_list(&plugins, format);
    output::print_heading("Nodes", format);
    output::print_list(&rows, format);
    output::print_heading("Notifications", format);
    output::print_list(&notifications, format);
    output::print_heading("Messaging", format);
    output::print_item(&host.metrics(), format);

    host.shutdown().await?;
    output::print_success("Session finished");
    Ok(())
}
