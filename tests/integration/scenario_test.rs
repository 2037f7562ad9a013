//! End-to-end host session: mount, request/reply, unmount.

mod helpers;

use std::sync::Arc;

use serde_json::json;
use tokio::sync::mpsc;

use helpers::{ScriptedPlugin, TestHost, assert_silent, node, recv};
use powertool_core::types::id::{PluginId, Token};

#[tokio::test]
async fn test_mount_request_reply_unmount() {
    let t = TestHost::new();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let plugin = ScriptedPlugin::new("scenario", move |ctx| {
        let tx = tx.clone();
        ctx.lua()
            .listen(move |from, receipt, _reply| {
                let _ = tx.send((from, receipt));
                None
            })
            .map_err(|e| e.to_string())?;
        Ok(())
    });
    let ctx = t.host.load_plugin(plugin).await.expect("load");

    let (node_tx, mut node_rx) = mpsc::unbounded_channel();
    let runtime = t
        .host
        .connect_node_with("A", move |runtime| {
            runtime.set_reply_hook(move |from, receipt, reply| {
                if receipt.payload == json!("hello") {
                    reply.reply("world");
                }
                let _ = node_tx.send((from, receipt));
                None
            });
        })
        .expect("connect");

    assert_eq!(ctx.node().list(), vec![node("A")]);

    ctx.lua().send(&node("A"), "tok1", "hello");

    let (sender, packet) = recv(&mut node_rx).await;
    assert_eq!(sender, node("host"));
    assert_eq!(packet.reply_token, Some(Token::from("tok1")));
    assert_eq!(packet.payload, json!("hello"));
    assert_eq!(packet.plugin, Some(PluginId::from("scenario")));

    let (from, receipt) = recv(&mut rx).await;
    assert_eq!(from, node("A"));
    assert_eq!(receipt.correlation, Some(Token::from("tok1")));
    assert_eq!(receipt.payload, json!("world"));

    t.host.disconnect_node(&node("A")).expect("disconnect");
    assert!(ctx.node().list().is_empty());
    assert!(!runtime.is_connected());

    let dropped = t.host.metrics().dropped_undeliverable;
    ctx.lua().send(&node("A"), "tok2", "hello");
    assert_eq!(t.host.metrics().dropped_undeliverable, dropped + 1);
    assert_silent(&mut rx).await;
}

#[tokio::test]
async fn test_observers_see_mount_then_unmount() {
    let t = TestHost::new();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let plugin = ScriptedPlugin::new("observer", move |ctx| {
        let on_mount = tx.clone();
        ctx.node().on_mount(move |id| {
            let _ = on_mount.send(format!("mount:{id}"));
        });
        let on_unmount = tx.clone();
        ctx.node().on_unmount(move |id| {
            let _ = on_unmount.send(format!("unmount:{id}"));
        });
        Ok(())
    });
    t.host.load_plugin(plugin).await.expect("load");

    t.host.connect_node("A").expect("connect A");
    t.host.connect_node("B").expect("connect B");
    t.host.disconnect_node(&node("A")).expect("disconnect A");

    assert_eq!(recv(&mut rx).await, "mount:A");
    assert_eq!(recv(&mut rx).await, "mount:B");
    assert_eq!(recv(&mut rx).await, "unmount:A");
    assert_eq!(t.host.nodes(), vec![node("B")]);
}

#[tokio::test]
async fn test_late_observer_is_not_replayed_past_mounts() {
    let t = TestHost::new();
    t.host.connect_node("A").expect("connect");

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let plugin = ScriptedPlugin::new("late", move |ctx| {
        let tx = tx.clone();
        ctx.node().on_mount(move |id| {
            let _ = tx.send(id.to_string());
        });
        Ok(())
    });
    let ctx = t.host.load_plugin(plugin).await.expect("load");

    assert_eq!(ctx.node().list(), vec![node("A")]);
    assert_silent(&mut rx).await;

    t.host.connect_node("B").expect("connect B");
    assert_eq!(recv(&mut rx).await, "B");
}

#[tokio::test]
async fn test_node_can_answer_a_send_from_inside_a_mount_observer() {
    let t = TestHost::new();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let plugin = ScriptedPlugin::new("welcome", move |ctx| {
        let tx = tx.clone();
        ctx.lua()
            .listen(move |_from, receipt, _reply| {
                let _ = tx.send(receipt);
                None
            })
            .map_err(|e| e.to_string())?;

        let lua = ctx.lua().clone();
        ctx.node().on_mount(move |id| {
            lua.send(id, "welcome", "hi");
        });
        Ok(())
    });
    t.host.load_plugin(plugin).await.expect("load");

    let (_runtime, mut seen) = t.recording_node("A", Some("thanks"));

    let packet = recv(&mut seen).await;
    assert_eq!(packet.reply_token, Some(Token::from("welcome")));

    let reply = recv(&mut rx).await;
    assert_eq!(reply.correlation, Some(Token::from("welcome")));
    assert_eq!(reply.payload, json!("thanks"));
}

#[tokio::test]
async fn test_shutdown_unloads_plugins_and_unmounts_nodes() {
    let t = TestHost::new();
    t.host
        .load_plugin(Arc::new(plugin_clear_tab::ClearTabPlugin::new()))
        .await
        .expect("load");
    t.host.connect_node("A").expect("connect");

    t.host.shutdown().await.expect("shutdown");

    assert!(t.host.plugins().await.is_empty());
    assert!(t.host.nodes().is_empty());
}

#[tokio::test]
async fn test_plugin_event_stream_starts_at_subscription() {
    use powertool_core::events::node::NodeEvent;

    let t = TestHost::new();
    t.host.connect_node("early").expect("connect");

    let ctx = t
        .host
        .load_plugin(ScriptedPlugin::new("stream", |_ctx| Ok(())))
        .await
        .expect("load");
    let mut events = ctx.node().subscribe();

    t.host.connect_node("A").expect("connect");
    t.host.disconnect_node(&node("A")).expect("disconnect");

    match events.next().await {
        Some(NodeEvent::Mounted { node_id, .. }) => assert_eq!(node_id, node("A")),
        other => panic!("expected mount, got {:?}", other),
    }
    match events.next().await {
        Some(NodeEvent::Unmounted { node_id, .. }) => assert_eq!(node_id, node("A")),
        other => panic!("expected unmount, got {:?}", other),
    }
}
