//! Host/node messaging through the plugin API and the transport bridge.

mod helpers;

use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::mpsc;

use helpers::{ScriptedPlugin, TestHost, assert_silent, node, recv};
use powertool_core::config::AppConfig;
use powertool_core::error::ErrorKind;
use powertool_core::types::id::Token;

#[tokio::test]
async fn test_packets_from_one_node_arrive_in_order() {
    let t = TestHost::new();

    let (tx, mut rx) = mpsc::unbounded_channel();
    t.host
        .load_plugin(ScriptedPlugin::new("ordered", move |ctx| {
            let tx = tx.clone();
            ctx.lua()
                .listen(move |_from, receipt, _reply| {
                    let _ = tx.send(receipt.payload);
                    None
                })
                .map_err(|e| e.to_string())?;
            Ok(())
        }))
        .await
        .expect("load");

    let runtime = t.host.connect_node("A").expect("connect");
    for i in 0..20 {
        runtime.send(None, json!(i));
    }

    for i in 0..20 {
        assert_eq!(recv(&mut rx).await, json!(i));
    }
}

#[tokio::test]
async fn test_returned_value_is_an_implicit_reply() {
    let t = TestHost::new();
    t.host
        .load_plugin(ScriptedPlugin::new("echo", |ctx| {
            ctx.lua()
                .listen(|_from, receipt, _reply| Some(json!({ "echo": receipt.payload })))
                .map_err(|e| e.to_string())?;
            Ok(())
        }))
        .await
        .expect("load");

    let (runtime, mut seen) = t.recording_node("A", None);
    runtime.send(Some(Token::from("t-1")), "ping");

    let reply = recv(&mut seen).await;
    assert_eq!(reply.correlation, Some(Token::from("t-1")));
    assert_eq!(reply.payload, json!({ "echo": "ping" }));
}

#[tokio::test]
async fn test_only_first_reply_is_sent() {
    let t = TestHost::new();
    t.host
        .load_plugin(ScriptedPlugin::new("chatty", |ctx| {
            ctx.lua()
                .listen(|_from, _receipt, reply| {
                    assert!(reply.reply("first"));
                    assert!(!reply.reply("second"));
                    Some(json!("third"))
                })
                .map_err(|e| e.to_string())?;
            Ok(())
        }))
        .await
        .expect("load");

    let (runtime, mut seen) = t.recording_node("A", None);
    runtime.send(Some(Token::from("once")), "ping");

    assert_eq!(recv(&mut seen).await.payload, json!("first"));
    assert_silent(&mut seen).await;
    assert_eq!(t.host.metrics().replies_sent, 1);
}

#[tokio::test]
async fn test_reply_after_requester_unmounts_is_dropped() {
    let t = TestHost::new();

    let (tx, mut rx) = mpsc::unbounded_channel();
    t.host
        .load_plugin(ScriptedPlugin::new("slow", move |ctx| {
            let tx = tx.clone();
            ctx.lua()
                .listen(move |_from, _receipt, reply| {
                    let _ = tx.send(reply);
                    None
                })
                .map_err(|e| e.to_string())?;
            Ok(())
        }))
        .await
        .expect("load");

    let runtime = t.host.connect_node("A").expect("connect");
    runtime.send(Some(Token::from("later")), "ping");
    let handle = recv(&mut rx).await;

    t.host.disconnect_node(&node("A")).expect("disconnect");
    let dropped = t.host.metrics().dropped_undeliverable;

    assert!(handle.reply("too late"));
    assert_eq!(t.host.metrics().dropped_undeliverable, dropped + 1);
}

#[tokio::test]
async fn test_async_listener_can_await_before_replying() {
    let t = TestHost::new();
    t.host
        .load_plugin(ScriptedPlugin::new("async", |ctx| {
            ctx.lua()
                .listen_async(|_from, receipt, _reply| async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    receipt.as_str().map(|s| json!(s.to_uppercase()))
                })
                .map_err(|e| e.to_string())?;
            Ok(())
        }))
        .await
        .expect("load");

    let (runtime, mut seen) = t.recording_node("A", None);
    runtime.send(Some(Token::from("shout")), "quiet");

    assert_eq!(recv(&mut seen).await.payload, json!("QUIET"));
}

#[tokio::test]
async fn test_packets_without_listener_are_counted() {
    let t = TestHost::new();
    let runtime = t.host.connect_node("A").expect("connect");

    runtime.send(None, "nobody home");

    tokio::time::timeout(Duration::from_secs(2), async {
        while t.host.metrics().dropped_unhandled == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("drop not counted");
}

#[tokio::test]
async fn test_inbound_frames_reach_the_host_and_replies_are_bridged() {
    let t = TestHost::new();
    t.host
        .load_plugin(ScriptedPlugin::new("bridge", |ctx| {
            ctx.lua()
                .listen(|from, receipt, _reply| {
                    receipt
                        .wants_reply()
                        .then(|| json!(format!("hi {from}")))
                })
                .map_err(|e| e.to_string())?;
            Ok(())
        }))
        .await
        .expect("load");

    t.host.connect_node("A").expect("connect");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _bridge = t
        .host
        .engine()
        .connections
        .bridge_outbound(&node("A"), move |text| {
            let _ = tx.send(text);
        })
        .expect("bridge");

    t.host
        .handle_inbound(
            &node("A"),
            r#"{"type":"ipc","reply":"r-1","payload":"hello"}"#,
        )
        .expect("inbound");

    let frame: Value = serde_json::from_str(&recv(&mut rx).await).expect("json");
    assert_eq!(frame["type"], "reply");
    assert_eq!(frame["from"], "host");
    assert_eq!(frame["token"], "r-1");
    assert_eq!(frame["plugin"], "bridge");
    assert_eq!(frame["payload"], "hi A");
}

#[tokio::test]
async fn test_bridged_node_reply_returns_to_the_sending_plugin() {
    let t = TestHost::new();

    let mut inboxes = Vec::new();
    let mut contexts = Vec::new();
    for name in ["plugin-a", "plugin-b"] {
        let (tx, rx) = mpsc::unbounded_channel();
        let ctx = t
            .host
            .load_plugin(ScriptedPlugin::new(name, move |ctx| {
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
        inboxes.push(rx);
        contexts.push(ctx);
    }

    t.host.connect_node("A").expect("connect");
    let (tx, mut frames) = mpsc::unbounded_channel();
    let _bridge = t
        .host
        .engine()
        .connections
        .bridge_outbound(&node("A"), move |text| {
            let _ = tx.send(text);
        })
        .expect("bridge");

    contexts[1].lua().send(&node("A"), "tok1", "question");

    let packet: Value = serde_json::from_str(&recv(&mut frames).await).expect("json");
    assert_eq!(packet["type"], "packet");
    assert_eq!(packet["from"], "host");
    assert_eq!(packet["plugin"], "plugin-b");

    let answer = format!(
        r#"{{"type":"reply","token":"tok1","plugin":{},"payload":"answer"}}"#,
        packet["plugin"]
    );
    t.host.handle_inbound(&node("A"), &answer).expect("inbound");

    let reply = recv(&mut inboxes[1]).await;
    assert_eq!(reply.correlation, Some(Token::from("tok1")));
    assert_eq!(reply.payload, json!("answer"));
    assert_silent(&mut inboxes[0]).await;
}

#[tokio::test]
async fn test_inbound_from_unknown_node_is_rejected() {
    let t = TestHost::new();
    let err = t
        .host
        .handle_inbound(&node("ghost"), r#"{"type":"ipc","payload":1}"#)
        .expect_err("unknown node");
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_malformed_inbound_frame_is_rejected() {
    let t = TestHost::new();
    t.host.connect_node("A").expect("connect");

    assert!(t.host.handle_inbound(&node("A"), "not json").is_err());
}

#[tokio::test]
async fn test_oversized_payload_is_dropped() {
    let mut config = AppConfig::default();
    config.messaging.max_payload_bytes = 16;
    let t = TestHost::with_config(config);

    let (tx, mut rx) = mpsc::unbounded_channel();
    t.host
        .load_plugin(ScriptedPlugin::new("small", move |ctx| {
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

    let runtime = t.host.connect_node("A").expect("connect");
    runtime.send(None, "x".repeat(64));

    assert_silent(&mut rx).await;
    assert_eq!(t.host.metrics().dropped_oversize, 1);
}

#[tokio::test]
async fn test_inbound_frame_carrying_max_payload_is_accepted() {
    let mut config = AppConfig::default();
    config.messaging.max_payload_bytes = 16;
    let t = TestHost::with_config(config);

    let (tx, mut rx) = mpsc::unbounded_channel();
    t.host
        .load_plugin(ScriptedPlugin::new("edge", move |ctx| {
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
    t.host.connect_node("A").expect("connect");

    // 14 characters plus quotes encode to exactly 16 bytes.
    let payload = "x".repeat(14);
    let raw = format!(r#"{{"type":"ipc","reply":"tok-edge","payload":"{payload}"}}"#);
    assert!(raw.len() > 16);
    t.host.handle_inbound(&node("A"), &raw).expect("accepted");

    let receipt = recv(&mut rx).await;
    assert_eq!(receipt.payload, json!(payload));
    assert_eq!(t.host.metrics().dropped_oversize, 0);
}

#[tokio::test]
async fn test_broadcast_reaches_every_connected_node() {
    let t = TestHost::new();
    let (_a, mut seen_a) = t.recording_node("A", None);
    let (_b, mut seen_b) = t.recording_node("B", None);

    let ctx = t
        .host
        .load_plugin(ScriptedPlugin::new("shout", |_ctx| Ok(())))
        .await
        .expect("load");

    assert_eq!(ctx.lua().broadcast("all", "hey"), 2);
    assert_eq!(recv(&mut seen_a).await.payload, json!("hey"));
    assert_eq!(recv(&mut seen_b).await.payload, json!("hey"));
}

#[tokio::test]
async fn test_two_plugins_sharing_a_token_get_their_own_replies() {
    let t = TestHost::new();

    let mut inboxes = Vec::new();
    let mut contexts = Vec::new();
    for name in ["plugin-a", "plugin-b"] {
        let (tx, rx) = mpsc::unbounded_channel();
        let ctx = t
            .host
            .load_plugin(ScriptedPlugin::new(name, move |ctx| {
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
        inboxes.push(rx);
        contexts.push(ctx);
    }

    let (seen_tx, mut seen) = mpsc::unbounded_channel();
    t.host
        .connect_node_with("A", move |runtime| {
            runtime.set_reply_hook(move |from, receipt, reply| {
                let sender = receipt
                    .plugin
                    .as_ref()
                    .map(|p| p.to_string())
                    .unwrap_or_default();
                reply.reply(format!("secret-for-{sender}"));
                let _ = seen_tx.send((from, sender));
                None
            });
        })
        .expect("connect");

    let (a, b) = (contexts[0].lua().clone(), contexts[1].lua().clone());
    let sends = [
        tokio::spawn(async move { a.send(&node("A"), "tok1", "from a") }),
        tokio::spawn(async move { b.send(&node("A"), "tok1", "from b") }),
    ];
    for send in sends {
        send.await.expect("send task");
    }

    let mut senders = vec![recv(&mut seen).await, recv(&mut seen).await];
    senders.sort_by(|x, y| x.1.cmp(&y.1));
    assert_eq!(
        senders,
        vec![
            (node("host"), "plugin-a".to_string()),
            (node("host"), "plugin-b".to_string()),
        ]
    );

    for (inbox, name) in inboxes.iter_mut().zip(["plugin-a", "plugin-b"]) {
        let reply = recv(inbox).await;
        assert_eq!(reply.correlation, Some(Token::from("tok1")));
        assert_eq!(reply.payload, json!(format!("secret-for-{name}")));
        assert_silent(inbox).await;
    }
}
