//! Reload and the channel-driven run loop.

use std::fs;
use std::sync::Arc;

use tabsort_config::FileConfigSource;
use tabsort_engine::{EventOutcome, ReconciliationEngine};
use tabsort_types::{Configuration, HostEvent, ReloadAck, Rule};
use tempfile::tempdir;
use tokio::sync::mpsc;

use crate::common::{W1, creates, engine, owner, rules, single_window, strings, tab, write_config};

#[tokio::test]
async fn reload_picks_up_edited_config_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let host = single_window(&["https://docs.rs/serde", "https://crates.io/"]);
    let mut engine = ReconciliationEngine::new(Arc::clone(&host), FileConfigSource::at(&path));

    engine.bootstrap().await.unwrap();
    assert_eq!(owner(&engine, W1, tab(10)).as_deref(), Some("docs.rs"));

    write_config(
        dir.path(),
        r#"
[[rules]]
group_title = "Docs"
group_color = "blue"
match_type = "domain"
match_content = "docs.rs"
"#,
    );
    let outcome = engine.handle(HostEvent::ReloadRequested).await.unwrap();
    assert_eq!(
        outcome,
        EventOutcome::Reloaded(ReloadAck {
            windows: 1,
            groups: 2,
            failures: 0,
        })
    );
    assert_eq!(owner(&engine, W1, tab(10)).as_deref(), Some("Docs"));
    assert_eq!(host.group_order(W1), strings(&["Docs", "crates.io"]));
}

#[tokio::test]
async fn broken_config_on_reload_falls_back_to_domains() {
    let dir = tempdir().unwrap();
    let path = write_config(
        dir.path(),
        r#"
[[rules]]
group_title = "Docs"
match_type = "domain"
match_content = "docs.rs"
"#,
    );
    let host = single_window(&["https://docs.rs/"]);
    let mut engine = ReconciliationEngine::new(Arc::clone(&host), FileConfigSource::at(&path));
    engine.bootstrap().await.unwrap();
    assert_eq!(owner(&engine, W1, tab(10)).as_deref(), Some("Docs"));

    fs::write(&path, "[[rules]\nnot toml").unwrap();
    let ack = engine.reload().await.unwrap();
    assert_eq!(ack.failures, 0);
    assert!(engine.configuration().rules.is_empty());
    assert_eq!(owner(&engine, W1, tab(10)).as_deref(), Some("docs.rs"));
}

#[tokio::test]
async fn rebuild_converges_after_outside_interference() {
    let host = single_window(&[
        "https://a.com/1",
        "https://b.com/",
        "https://a.com/2",
        "https://c.com/",
    ]);
    let mut engine = engine(
        &host,
        rules(vec![Rule::domain("A", "a.com").unwrap().with_sort_index(0)]),
    );
    engine.reload().await.unwrap();
    let settled = host.group_order(W1);
    assert_eq!(settled, strings(&["A", "b.com", "c.com"]));

    // Someone regroups a tab behind the engine's back.
    host.seed_group("Scratch", None, &[tab(11)]).unwrap();
    engine.reload().await.unwrap();
    assert_eq!(host.group_order(W1), settled);

    // A further rebuild against settled state issues no grouping calls.
    host.clear_calls();
    engine.reload().await.unwrap();
    assert_eq!(creates(&host.calls()), 0);
    assert_eq!(host.group_order(W1), settled);
}

#[tokio::test]
async fn run_loop_serves_reload_requests() {
    let host = single_window(&["https://a.com/"]);
    let engine = engine(&host, Configuration::default());
    let (events, rx) = mpsc::channel(8);
    let (ack_tx, mut acks) = mpsc::channel(8);
    let task = tokio::spawn(engine.run(rx, Some(ack_tx)));

    events.send(HostEvent::ReloadRequested).await.unwrap();
    let first = acks.recv().await.unwrap();
    assert_eq!(first.windows, 1);
    assert_eq!(first.groups, 1);

    let opened = host.open_tab(W1, "https://b.com/");
    events
        .send(HostEvent::TabAdded {
            tab_id: opened,
            url: Some("https://b.com/".to_string()),
        })
        .await
        .unwrap();
    events.send(HostEvent::ReloadRequested).await.unwrap();
    let second = acks.recv().await.unwrap();
    assert_eq!(second.groups, 2);

    drop(events);
    let engine = task.await.unwrap();
    assert_eq!(owner(&engine, W1, opened).as_deref(), Some("b.com"));
    assert_eq!(host.group_order(W1), strings(&["a.com", "b.com"]));
}
