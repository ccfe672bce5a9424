//! Configuration files feeding the engine.

use std::sync::Arc;

use tabsort_config::{ConfigError, FileConfigSource, TabsortConfig};
use tabsort_engine::{HostCall, ReconciliationEngine};
use tabsort_types::{GroupColor, Rank};
use tempfile::tempdir;

use crate::common::{W1, owner, single_window, strings, tab, write_config};

const CONFIG: &str = r#"
[app]
log_filter = "tabsort_engine=debug"

[settings]
remove_keywords = ["www."]

[domain_aliases]
"github.com" = "GitHub"

[[rules]]
id = "docs"
group_title = "Docs"
priority = 10
group_color = "cyan"
match_type = "regexp"
match_content = "^https://(docs\\.rs|doc\\.rust-lang\\.org)/"
sort_index = 0

[[rules]]
group_title = "Crates"
group_color = "orange"
match_type = "domain"
match_content = "crates.io"
sort_index = 1
"#;

#[tokio::test]
async fn config_file_drives_grouping() {
    let dir = tempdir().unwrap();
    let path = write_config(dir.path(), CONFIG);
    let host = single_window(&[
        "https://www.rust-lang.org/",
        "https://crates.io/crates/serde",
        "https://github.com/serde-rs",
        "https://docs.rs/serde",
    ]);
    let mut engine = ReconciliationEngine::new(Arc::clone(&host), FileConfigSource::at(&path));
    let report = engine.bootstrap().await.unwrap();
    assert!(report.failures.is_empty());

    assert_eq!(owner(&engine, W1, tab(10)).as_deref(), Some("rust-lang.org"));
    assert_eq!(owner(&engine, W1, tab(11)).as_deref(), Some("Crates"));
    assert_eq!(owner(&engine, W1, tab(12)).as_deref(), Some("GitHub"));
    assert_eq!(owner(&engine, W1, tab(13)).as_deref(), Some("Docs"));
    assert_eq!(engine.store().group(W1, "Crates").unwrap().rank, Rank::Fixed(1));
    assert_eq!(
        host.group_order(W1),
        strings(&["Docs", "Crates", "GitHub", "rust-lang.org"])
    );

    let docs = engine.store().group(W1, "Docs").unwrap().host_id.unwrap();
    assert!(host.calls().contains(&HostCall::UpdateGroupDisplay {
        group: docs,
        title: "Docs".to_string(),
        color: Some(GroupColor::Cyan),
        collapsed: None,
        ok: true,
    }));
}

#[tokio::test]
async fn missing_config_groups_by_domain() {
    let dir = tempdir().unwrap();
    let host = single_window(&["https://www.example.com/"]);
    let mut engine = ReconciliationEngine::new(
        Arc::clone(&host),
        FileConfigSource::at(dir.path().join("absent.toml")),
    );
    engine.bootstrap().await.unwrap();
    assert!(engine.configuration().rules.is_empty());
    assert_eq!(owner(&engine, W1, tab(10)).as_deref(), Some("www.example.com"));
}

#[test]
fn invalid_rule_is_reported_with_its_path() {
    let dir = tempdir().unwrap();
    let path = write_config(
        dir.path(),
        r#"
[[rules]]
group_title = ""
match_type = "domain"
match_content = "a.com"
"#,
    );
    let err = TabsortConfig::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert_eq!(err.path(), &path);
    assert!(FileConfigSource::at(&path).configuration().rules.is_empty());
}

#[test]
fn log_filter_is_read_from_app_section() {
    let dir = tempdir().unwrap();
    let path = write_config(dir.path(), CONFIG);
    let config = TabsortConfig::load_from(&path).unwrap().unwrap();
    assert_eq!(config.log_filter(), Some("tabsort_engine=debug"));
}
