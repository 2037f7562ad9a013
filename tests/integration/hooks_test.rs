//! Hook registration and dispatch across several plugins.

mod helpers;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use helpers::{ScriptedPlugin, TestHost};
use powertool_core::types::id::PluginId;
use powertool_plugin::prelude::*;

fn labelled(id: &str, label: &'static str) -> Arc<ScriptedPlugin> {
    ScriptedPlugin::new(id, move |ctx| {
        ctx.register_hooks(HookSet::new().on_tab_context(move |_ctx, _tab, menu| {
            menu.add(label, || Ok(()));
            Ok(())
        }));
        Ok(())
    })
}

#[tokio::test]
async fn test_menu_entries_follow_load_order() {
    let t = TestHost::new();
    t.host.load_plugin(labelled("first", "One")).await.expect("load");
    t.host.load_plugin(labelled("second", "Two")).await.expect("load");

    let editor = t.host.create_editor();
    let tab = editor.open_tab("a.lua", "");
    let menu = t.host.tab_context(&editor, tab.id).expect("menu");

    assert_eq!(menu.labels(), vec!["One", "Two"]);
    assert_eq!(menu.entries()[1].plugin_id, PluginId::from("second"));
}

#[tokio::test]
async fn test_failing_tab_hook_loses_its_entries_only() {
    let t = TestHost::new();
    t.host.load_plugin(labelled("first", "One")).await.expect("load");
    t.host
        .load_plugin(ScriptedPlugin::new("broken", |ctx| {
            ctx.register_hooks(HookSet::new().on_tab_context(|_ctx, _tab, menu| {
                menu.add("Half done", || Ok(()));
                Err("ran out of ideas".to_string())
            }));
            Ok(())
        }))
        .await
        .expect("load");
    t.host.load_plugin(labelled("third", "Three")).await.expect("load");

    let editor = t.host.create_editor();
    let tab = editor.open_tab("a.lua", "");
    let (menu, report) = t
        .host
        .dispatcher()
        .tab_context_with_report(&editor.tab(tab.id).expect("tab"));

    assert_eq!(menu.labels(), vec!["One", "Three"]);
    assert_eq!(report.invoked, 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].plugin_id, PluginId::from("broken"));
    assert_eq!(report.failures[0].message, "ran out of ideas");
}

#[tokio::test]
async fn test_panicking_create_hook_does_not_stop_others() {
    let t = TestHost::new();
    let calls = Arc::new(AtomicUsize::new(0));

    t.host
        .load_plugin(ScriptedPlugin::new("panics", |ctx| {
            ctx.register_hooks(HookSet::new().on_editor_create(|_ctx, _editor| -> HookResult {
                panic!("boom")
            }));
            Ok(())
        }))
        .await
        .expect("load");

    let counter = calls.clone();
    t.host
        .load_plugin(ScriptedPlugin::new("counts", move |ctx| {
            let counter = counter.clone();
            ctx.register_hooks(HookSet::new().on_editor_create(move |_ctx, _editor| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }));
            Ok(())
        }))
        .await
        .expect("load");

    let (_editor, report) = t.host.create_editor_with_report();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.invoked, 2);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].message.starts_with("panic"));
}

#[tokio::test]
async fn test_create_hook_sees_new_editor_as_current() {
    let t = TestHost::new();
    let matched = Arc::new(AtomicUsize::new(0));

    let seen = matched.clone();
    t.host
        .load_plugin(ScriptedPlugin::new("current", move |ctx| {
            let seen = seen.clone();
            ctx.register_hooks(HookSet::new().on_editor_create(move |ctx, editor| {
                if ctx.editor().as_ref() == Some(editor) {
                    seen.fetch_add(1, Ordering::SeqCst);
                }
                Ok(())
            }));
            Ok(())
        }))
        .await
        .expect("load");

    t.host.create_editor();
    t.host.create_editor();

    assert_eq!(matched.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_second_registration_replaces_first() {
    let t = TestHost::new();
    t.host
        .load_plugin(ScriptedPlugin::new("twice", |ctx| {
            ctx.register_hooks(HookSet::new().on_tab_context(|_ctx, _tab, menu| {
                menu.add("Old", || Ok(()));
                Ok(())
            }));
            ctx.register_hooks(HookSet::new().on_tab_context(|_ctx, _tab, menu| {
                menu.add("New", || Ok(()));
                Ok(())
            }));
            Ok(())
        }))
        .await
        .expect("load");

    let editor = t.host.create_editor();
    let tab = editor.open_tab("a.lua", "");
    let menu = t.host.tab_context(&editor, tab.id).expect("menu");

    assert_eq!(menu.labels(), vec!["New"]);
}

#[tokio::test]
async fn test_unknown_hook_points_are_ignored() {
    let t = TestHost::new();
    t.host
        .load_plugin(ScriptedPlugin::new("odd", |ctx| {
            ctx.register_hooks(HookSet::new().on(
                "window",
                "onResize",
                HookCallback::editor_create(|_ctx, _editor| Ok(())),
            ));
            Ok(())
        }))
        .await
        .expect("load");

    let registry = t.host.dispatcher().registry();
    assert!(registry.registered_hooks(&PluginId::from("odd")).is_empty());
    assert!(!registry.has_handlers(HookPoint::EditorCreate));
}

#[tokio::test]
async fn test_unload_removes_hooks() {
    let t = TestHost::new();
    t.host.load_plugin(labelled("first", "One")).await.expect("load");
    t.host.load_plugin(labelled("second", "Two")).await.expect("load");

    let summary = t
        .host
        .unload_plugin(&PluginId::from("first"))
        .await
        .expect("unload");
    assert!(summary.hooks);

    let editor = t.host.create_editor();
    let tab = editor.open_tab("a.lua", "");
    let menu = t.host.tab_context(&editor, tab.id).expect("menu");
    assert_eq!(menu.labels(), vec!["Two"]);
}

#[tokio::test]
async fn test_clear_tab_plugin_clears_contents() {
    let t = TestHost::new();
    t.host
        .load_plugin(Arc::new(plugin_clear_tab::ClearTabPlugin::new()))
        .await
        .expect("load");

    let editor = t.host.create_editor();
    let tab = editor.open_tab("main.lua", "local x = 1");
    let menu = t.host.tab_context(&editor, tab.id).expect("menu");

    assert!(menu.activate_label(plugin_clear_tab::hooks::CLEAR_TAB_LABEL));
    assert_eq!(editor.contents(tab.id).as_deref(), Some(""));
}

#[tokio::test]
async fn test_context_menu_for_unknown_tab_is_not_found() {
    let t = TestHost::new();
    let editor = t.host.create_editor();
    let other = t.host.create_editor();
    let tab = other.open_tab("elsewhere.lua", "");

    let err = t.host.tab_context(&editor, tab.id).expect_err("missing tab");
    assert_eq!(err.kind, powertool_core::error::ErrorKind::NotFound);
}

#[tokio::test]
async fn test_close_editor_fires_close_hooks_and_drops_toolbars() {
    let t = TestHost::new();
    let closed = Arc::new(AtomicUsize::new(0));
    let counter = closed.clone();
    t.host
        .load_plugin(ScriptedPlugin::new("tidy", move |ctx| {
            let counter = counter.clone();
            ctx.register_hooks(
                HookSet::new()
                    .on_editor_create(|ctx, editor| {
                        ctx.create_toolbar(editor, "bar", vec![])
                            .map(|_| ())
                            .map_err(|e| e.to_string())
                    })
                    .on(
                        "editor",
                        "onClose",
                        HookCallback::editor_close(move |_ctx, editor| {
                            assert!(!editor.is_closed());
                            counter.fetch_add(1, Ordering::SeqCst);
                            Ok(())
                        }),
                    ),
            );
            Ok(())
        }))
        .await
        .expect("load");

    let older = t.host.create_editor();
    let newer = t.host.create_editor();
    assert_eq!(t.host.toolbars().len(), 2);

    let report = t.host.close_editor(newer.id()).expect("open");
    assert_eq!(report.invoked, 1);
    assert!(report.is_clean());
    assert_eq!(closed.load(Ordering::SeqCst), 1);
    assert!(newer.is_closed());
    assert_eq!(t.host.toolbars().len(), 1);
    assert_eq!(t.host.editors().latest(), Some(older));

    assert!(t.host.close_editor(newer.id()).is_none());
    assert_eq!(closed.load(Ordering::SeqCst), 1);
}
