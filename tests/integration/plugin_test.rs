//! Plugin lifecycle: load, reject, roll back, unload.

mod helpers;

use std::sync::Arc;

use tokio::sync::mpsc;

use helpers::{ScriptedPlugin, TestHost, assert_silent, recv};
use plugin_clear_tab::ClearTabPlugin;
use plugin_clear_tab::plugin::PLUGIN_ID;
use powertool_core::config::AppConfig;
use powertool_core::error::ErrorKind;
use powertool_plugin::prelude::*;

#[tokio::test]
async fn test_context_reports_plugin_name() {
    let t = TestHost::new();
    let ctx = t
        .host
        .load_plugin(Arc::new(ClearTabPlugin::new()))
        .await
        .expect("load");

    assert_eq!(ctx.name(), "Clear Tab");
    assert_eq!(ctx.id(), &PluginId::from(PLUGIN_ID));
    assert_eq!(t.host.plugins().await.len(), 1);
}

#[tokio::test]
async fn test_loading_same_plugin_twice_conflicts() {
    let t = TestHost::new();
    t.host
        .load_plugin(Arc::new(ClearTabPlugin::new()))
        .await
        .expect("load");

    let err = t
        .host
        .load_plugin(Arc::new(ClearTabPlugin::new()))
        .await
        .expect_err("duplicate");
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(t.host.plugins().await.len(), 1);
}

#[tokio::test]
async fn test_disabled_plugin_is_refused() {
    let mut config = AppConfig::default();
    config.plugins.disabled = vec![PLUGIN_ID.to_string()];
    let t = TestHost::with_config(config);

    let err = t
        .host
        .load_plugin(Arc::new(ClearTabPlugin::new()))
        .await
        .expect_err("disabled");
    assert_eq!(err.kind, ErrorKind::Plugin);
    assert!(t.host.plugins().await.is_empty());
}

#[tokio::test]
async fn test_failed_load_rolls_back_registrations() {
    let t = TestHost::new();
    let (tx, mut rx) = mpsc::unbounded_channel::<NodeId>();

    let err = t
        .host
        .load_plugin(ScriptedPlugin::new("flaky", move |ctx| {
            ctx.register_hooks(HookSet::new().on_tab_context(|_ctx, _tab, menu| {
                menu.add("Ghost", || Ok(()));
                Ok(())
            }));
            let tx = tx.clone();
            ctx.node().on_mount(move |id| {
                let _ = tx.send(id.clone());
            });
            Err("missing dependency".to_string())
        }))
        .await
        .expect_err("failed load");
    assert_eq!(err.kind, ErrorKind::Plugin);

    assert!(t.host.plugins().await.is_empty());
    assert!(!t.host.dispatcher().registry().has_handlers(HookPoint::TabContext));

    t.host.connect_node("A").expect("connect");
    assert_silent(&mut rx).await;
}

#[tokio::test]
async fn test_panicking_load_is_reported_as_failure() {
    let t = TestHost::new();
    let err = t
        .host
        .load_plugin(ScriptedPlugin::new("explodes", |_ctx| -> Result<(), String> {
            panic!("kaboom")
        }))
        .await
        .expect_err("panicked load");

    assert_eq!(err.kind, ErrorKind::Plugin);
    assert!(t.host.plugins().await.is_empty());
}

#[tokio::test]
async fn test_unload_releases_listeners_and_toolbars() {
    let t = TestHost::new();
    t.host
        .load_plugin(Arc::new(ClearTabPlugin::new()))
        .await
        .expect("load");

    let (tx, mut rx) = mpsc::unbounded_channel();
    t.host
        .load_plugin(ScriptedPlugin::new("watcher", move |ctx| {
            let tx = tx.clone();
            ctx.lua()
                .listen(move |_from, receipt, _reply| {
                    let _ = tx.send(receipt);
                    None
                })
                .map_err(|e| e.to_string())?;
            Ok(())
        }))
        .await
        .expect("load");

    let editor = t.host.create_editor();
    assert_eq!(t.host.toolbars().for_editor(editor.id()).len(), 1);

    let summary = t
        .host
        .unload_plugin(&PluginId::from(PLUGIN_ID))
        .await
        .expect("unload");
    assert_eq!(summary.toolbars, 1);
    assert_eq!(summary.listeners, 1);
    assert!(t.host.toolbars().for_editor(editor.id()).is_empty());

    let watcher = t
        .host
        .unload_plugin(&PluginId::from("watcher"))
        .await
        .expect("unload");
    assert_eq!(watcher.listeners, 1);

    let runtime = t.host.connect_node("A").expect("connect");
    runtime.send(None, "anyone?");
    assert_silent(&mut rx).await;
}

#[tokio::test]
async fn test_unload_unknown_plugin_is_not_found() {
    let t = TestHost::new();
    let err = t
        .host
        .unload_plugin(&PluginId::from("nope"))
        .await
        .expect_err("unknown");
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_toolbar_clicks_raise_notifications() {
    let t = TestHost::new();
    t.host
        .load_plugin(Arc::new(ClearTabPlugin::new()))
        .await
        .expect("load");

    let editor = t.host.create_editor();
    let toolbar = t
        .host
        .toolbars()
        .get(editor.id(), &PluginId::from(PLUGIN_ID))
        .expect("toolbar");

    assert!(toolbar.click("smile"));
    assert!(!toolbar.click("frown"));

    let raised = t.notifier.drain();
    assert_eq!(raised.len(), 1);
    assert_eq!(raised[0].plugin_id, PluginId::from(PLUGIN_ID));
    assert_eq!(raised[0].level, NotificationLevel::Success);
    assert_eq!(raised[0].message, "Woohoo!");
}

#[tokio::test]
async fn test_clear_tab_greets_nodes_on_load() {
    let t = TestHost::new();
    let (_runtime, mut seen) = t.recording_node("A", Some("Received!"));

    t.host
        .load_plugin(Arc::new(ClearTabPlugin::new()))
        .await
        .expect("load");

    let greeting = recv(&mut seen).await;
    assert_eq!(
        greeting.reply_token,
        Some(Token::from(plugin_clear_tab::packets::GREETING_TOKEN))
    );
}
