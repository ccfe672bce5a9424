//! Notifications applied against live host state after bootstrap.

use tabsort_engine::{EventOutcome, HostSync, WindowPhase};
use tabsort_types::{Configuration, GroupColor, HostEvent, HostGroupId, Rank, Rule};

use crate::common::{W1, W2, engine, host, owner, rules, single_window, strings, tab};

#[tokio::test]
async fn add_then_remove_restores_membership() {
    let host = single_window(&["https://a.com/1", "https://a.com/2"]);
    let mut engine = engine(&host, rules(vec![Rule::domain("A", "a.com").unwrap()]));
    engine.bootstrap().await.unwrap();
    let before = engine.store().group(W1, "A").unwrap().tab_ids.clone();

    let placed = engine
        .add_tab(W1, tab(99), "https://a.com/3", HostSync::Deferred)
        .await
        .unwrap();
    assert_eq!(placed.as_deref(), Some("A"));
    assert_ne!(engine.store().group(W1, "A").unwrap().tab_ids, before);

    assert_eq!(engine.remove_tab(W1, tab(99)), vec!["A".to_string()]);
    assert_eq!(engine.store().group(W1, "A").unwrap().tab_ids, before);
}

#[tokio::test]
async fn removed_group_keeps_rank_and_is_reused() {
    let host = single_window(&["https://b.com/", "https://a.com/"]);
    let mut engine = engine(
        &host,
        rules(vec![Rule::domain("A", "a.com").unwrap().with_sort_index(3)]),
    );
    engine.bootstrap().await.unwrap();
    let old = engine.store().group(W1, "A").unwrap().host_id.unwrap();

    host.remove_group(old);
    engine
        .handle(HostEvent::GroupRemoved {
            window_id: W1,
            title: "A".to_string(),
        })
        .await
        .unwrap();
    let group = engine.store().group(W1, "A").unwrap();
    assert_eq!(group.rank, Rank::Fixed(3));
    assert!(group.host_id.is_none());
    assert!(group.tab_ids.is_empty());

    let opened = host.open_tab(W1, "https://a.com/again");
    engine
        .handle(HostEvent::TabAdded {
            tab_id: opened,
            url: Some("https://a.com/again".to_string()),
        })
        .await
        .unwrap();
    let group = engine.store().group(W1, "A").unwrap();
    assert!(group.host_id.is_some_and(|id| id != old));
    assert!(group.tab_ids.contains(&opened));
    assert_eq!(host.group_order(W1), strings(&["A", "b.com"]));
}

#[tokio::test]
async fn stale_reference_fails_one_event_only() {
    let host = single_window(&["https://a.com/"]);
    let mut engine = engine(&host, Configuration::default());
    engine.bootstrap().await.unwrap();

    let closed = host.open_tab(W1, "https://b.com/");
    host.close_tab(closed);
    let err = engine
        .handle(HostEvent::TabAdded {
            tab_id: closed,
            url: Some("https://b.com/".to_string()),
        })
        .await
        .unwrap_err();
    assert!(err.is_stale());

    let live = host.open_tab(W1, "https://b.com/");
    let outcome = engine
        .handle(HostEvent::TabAdded {
            tab_id: live,
            url: Some("https://b.com/".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(outcome, EventOutcome::Applied);
    assert_eq!(owner(&engine, W1, live).as_deref(), Some("b.com"));
    assert_eq!(host.group_order(W1), strings(&["a.com", "b.com"]));
}

#[tokio::test]
async fn late_removal_after_host_close_is_tolerated() {
    let host = single_window(&["https://a.com/1", "https://a.com/2"]);
    let mut engine = engine(&host, Configuration::default());
    engine.bootstrap().await.unwrap();

    // The host has already dropped the tab; its removal notice arrives later.
    host.close_tab(tab(10));
    let opened = host.open_tab(W1, "https://a.com/3");
    engine
        .handle(HostEvent::TabAdded {
            tab_id: opened,
            url: Some("https://a.com/3".to_string()),
        })
        .await
        .unwrap();
    let outcome = engine
        .handle(HostEvent::TabRemoved {
            tab_id: tab(10),
            window_id: W1,
        })
        .await
        .unwrap();
    assert_eq!(outcome, EventOutcome::Applied);

    let group = engine.store().group(W1, "a.com").unwrap();
    assert_eq!(group.tab_ids.iter().copied().collect::<Vec<_>>(), vec![tab(11), opened]);
}

#[tokio::test]
async fn windows_are_reconciled_independently() {
    let host = host(serde_json::json!({
        "windows": [
            { "id": 1, "tabs": [ { "id": 10, "url": "https://a.com/" } ] },
            { "id": 2, "tabs": [
                { "id": 20, "url": "https://a.com/" },
                { "id": 21, "url": "https://b.com/" }
            ] }
        ]
    }));
    let mut engine = engine(&host, Configuration::default());
    let report = engine.bootstrap().await.unwrap();
    assert_eq!(report.windows, 2);
    assert_eq!(report.groups, 3);

    let first = engine.store().group(W1, "a.com").unwrap().host_id;
    let second = engine.store().group(W2, "a.com").unwrap().host_id;
    assert_ne!(first, second);
    assert!(engine.store().group(W1, "b.com").is_none());

    engine
        .handle(HostEvent::TabRemoved {
            tab_id: tab(20),
            window_id: W2,
        })
        .await
        .unwrap();
    assert!(engine.store().group(W1, "a.com").unwrap().tab_ids.contains(&tab(10)));
    assert!(engine.store().group(W2, "a.com").unwrap().tab_ids.is_empty());
    assert_eq!(engine.phase(W2), WindowPhase::Ready);
}

#[tokio::test]
async fn scripted_events_deserialize_and_apply() {
    let host = host(serde_json::json!({
        "windows": [ {
            "id": 1,
            "tabs": [
                { "id": 10, "url": "https://a.com/", "group": 100 },
                { "id": 11, "url": "https://b.com/" }
            ],
            "groups": [ { "id": 100, "title": "A", "color": "blue" } ]
        } ]
    }));
    let mut engine = engine(&host, rules(vec![Rule::domain("A", "a.com").unwrap()]));
    engine.bootstrap().await.unwrap();
    assert_eq!(
        engine.store().group(W1, "A").unwrap().host_id,
        Some(HostGroupId::new(100))
    );

    let script: Vec<HostEvent> = serde_json::from_value(serde_json::json!([
        { "type": "group_updated", "window_id": 1, "title": "A",
          "color": "orange", "host_group_id": 100, "collapsed": true },
        { "type": "tab_added", "tab_id": 11 },
        { "type": "tab_removed", "tab_id": 11, "window_id": 1 }
    ]))
    .unwrap();

    let mut outcomes = Vec::new();
    for event in script {
        outcomes.push(engine.handle(event).await.unwrap());
    }
    assert_eq!(
        outcomes,
        vec![EventOutcome::Applied, EventOutcome::Ignored, EventOutcome::Applied]
    );

    let a = engine.store().group(W1, "A").unwrap();
    assert_eq!(a.color, Some(GroupColor::Orange));
    assert!(a.collapsed);
    assert!(engine.store().group(W1, "b.com").unwrap().tab_ids.is_empty());
}
