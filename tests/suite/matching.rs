//! Rule resolution and placement observed through a full bootstrap.

use tabsort_types::{Configuration, DomainAliasMap, Rank, Rule, Settings};

use crate::common::{W1, engine, owner, rules, single_window, strings, tab};

#[tokio::test]
async fn rule_group_precedes_domain_group() {
    let host = single_window(&["https://a.com/x", "https://b.com/y"]);
    let mut engine = engine(
        &host,
        rules(vec![
            Rule::domain("A", "a.com")
                .unwrap()
                .with_priority(5)
                .with_sort_index(0),
        ]),
    );

    engine.bootstrap().await.unwrap();

    assert_eq!(owner(&engine, W1, tab(10)).as_deref(), Some("A"));
    assert_eq!(owner(&engine, W1, tab(11)).as_deref(), Some("b.com"));
    assert_eq!(engine.store().group(W1, "A").unwrap().rank, Rank::Fixed(0));
    assert_eq!(engine.store().group(W1, "b.com").unwrap().rank, Rank::Unranked);
    assert_eq!(host.group_order(W1), strings(&["A", "b.com"]));
}

#[tokio::test]
async fn priority_decides_between_match_types() {
    let host = single_window(&["https://a.com/docs/intro", "https://a.com/blog"]);
    let mut engine = engine(
        &host,
        rules(vec![
            Rule::domain("Site", "a.com").unwrap().with_priority(1),
            Rule::regexp("Docs", r"a\.com/docs").unwrap().with_priority(5),
        ]),
    );
    engine.bootstrap().await.unwrap();
    assert_eq!(owner(&engine, W1, tab(10)).as_deref(), Some("Docs"));
    assert_eq!(owner(&engine, W1, tab(11)).as_deref(), Some("Site"));

    let mut flipped = crate::common::engine(
        &host,
        rules(vec![
            Rule::domain("Site", "a.com").unwrap().with_priority(5),
            Rule::regexp("Docs", r"a\.com/docs").unwrap().with_priority(1),
        ]),
    );
    flipped.bootstrap().await.unwrap();
    assert_eq!(owner(&flipped, W1, tab(10)).as_deref(), Some("Site"));
}

#[tokio::test]
async fn equal_priority_keeps_configured_order() {
    let host = single_window(&["https://a.com/"]);
    let mut engine = engine(
        &host,
        rules(vec![
            Rule::domain("First", "a.com").unwrap().with_priority(3),
            Rule::domain("Second", "a.com").unwrap().with_priority(3),
        ]),
    );
    engine.bootstrap().await.unwrap();
    assert_eq!(owner(&engine, W1, tab(10)).as_deref(), Some("First"));
}

#[tokio::test]
async fn fallback_titles_apply_aliases_and_keywords() {
    let host = single_window(&[
        "https://www.example.com/",
        "https://github.com/rust-lang",
        "http://localhost:8080/health",
    ]);
    let configuration = Configuration {
        rules: Vec::new(),
        settings: Settings::with_remove_keywords(["www."]),
        aliases: DomainAliasMap::from_iter([("github.com".to_string(), "GitHub".to_string())]),
    };
    let mut engine = engine(&host, configuration);
    engine.bootstrap().await.unwrap();

    assert_eq!(owner(&engine, W1, tab(10)).as_deref(), Some("example.com"));
    assert_eq!(owner(&engine, W1, tab(11)).as_deref(), Some("GitHub"));
    assert_eq!(owner(&engine, W1, tab(12)).as_deref(), Some("localhost:8080"));
}

#[tokio::test]
async fn fixed_groups_follow_sort_index() {
    let host = single_window(&[
        "https://x.com/",
        "https://y.com/",
        "https://z.com/",
        "https://d.com/",
    ]);
    let mut engine = engine(
        &host,
        rules(vec![
            Rule::domain("X", "x.com").unwrap().with_sort_index(2),
            Rule::domain("Y", "y.com").unwrap().with_sort_index(0),
            Rule::domain("Z", "z.com").unwrap().with_sort_index(1),
        ]),
    );
    engine.bootstrap().await.unwrap();
    assert_eq!(host.group_order(W1), strings(&["Y", "Z", "X", "d.com"]));
}

#[tokio::test]
async fn unranked_groups_sort_by_title() {
    let host = single_window(&["https://c.com/", "https://a.com/", "https://b.com/"]);
    let mut engine = engine(&host, Configuration::default());
    engine.bootstrap().await.unwrap();
    assert_eq!(host.group_order(W1), strings(&["a.com", "b.com", "c.com"]));

    let layout = engine.layout();
    let titles: Vec<&str> = layout[0].groups.iter().map(|g| g.title.as_str()).collect();
    assert_eq!(titles, vec!["a.com", "b.com", "c.com"]);
}
